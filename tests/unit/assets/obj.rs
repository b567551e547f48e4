use super::*;
use std::io::Cursor;

fn parse(text: &str) -> ClockworkResult<Model3D> {
    parse_obj(Cursor::new(text), "test", None)
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clockwork-obj-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn single_triangle_with_defaults() {
    let model = parse("# comment\nv 0 0 0\nv 1 0 0\nv 0 1 0\n\nf 1 2 3\n").unwrap();
    assert_eq!(model.positions().len(), 3);
    assert_eq!(model.face_count(), 1);
    let face = model.faces()[0];
    assert_eq!(face.indices, [0, 1, 2]);
    assert_eq!(face.normals, [Vector3::UNIT_Z; 3]);
    assert_eq!(face.uvs, [TexCoords::default(); 3]);
}

#[test]
fn quads_are_fan_triangulated() {
    let model = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 2 0\nf 1 2 3 4 5\n").unwrap();
    let indices: Vec<[u32; 3]> = model.faces().iter().map(|f| f.indices).collect();
    assert_eq!(indices, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
}

#[test]
fn negative_indices_are_relative() {
    let model = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
    assert_eq!(model.faces()[0].indices, [0, 1, 2]);
}

#[test]
fn texcoords_flip_v_and_normals_are_normalised() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.25 0.25\nvn 0 0 5\nf 1/1/1 2/1/1 3/1/1\n";
    let model = parse(text).unwrap();
    let face = model.faces()[0];
    assert_eq!(face.uvs[0], TexCoords::new(0.25, 0.75));
    assert_eq!(face.normals[2], Vector3::UNIT_Z);
}

#[test]
fn texcoords_take_one_to_three_values() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.25\nvt 0.5 0.25 0.0\nf 1/1 2/2 3/1\n";
    let model = parse(text).unwrap();
    let face = model.faces()[0];
    assert_eq!(face.uvs[0], TexCoords::new(0.25, 1.0));
    assert_eq!(face.uvs[1], TexCoords::new(0.5, 0.75));

    let err = parse("v 0 0 0\nvt\n").unwrap_err();
    assert!(matches!(err, ClockworkError::Parse { line: 2, .. }));
    let err = parse("v 0 0 0\nvt 0.5 x\n").unwrap_err();
    assert!(matches!(err, ClockworkError::Parse { line: 2, .. }));
}

#[test]
fn normals_without_texcoords() {
    let model = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nf 1//1 2//1 3//1\n").unwrap();
    let face = model.faces()[0];
    assert_eq!(face.normals, [Vector3::new(1.0, 0.0, 0.0); 3]);
    assert_eq!(face.uvs, [TexCoords::default(); 3]);
}

#[test]
fn mixed_corner_layouts_are_rejected() {
    let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2 3\n").unwrap_err();
    assert!(matches!(err, ClockworkError::Parse { line: 5, .. }));
}

#[test]
fn out_of_range_indices_are_rejected() {
    for face in ["f 1 2 4", "f 0 1 2", "f -4 1 2", "f 1/2 2/1 3/1"] {
        let text = format!("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\n{face}\n");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ClockworkError::Parse { line: 5, .. }), "{face}: {err}");
    }
}

#[test]
fn malformed_numbers_report_their_line() {
    let err = parse("v 0 0 0\nv 1 zero 0\n").unwrap_err();
    assert!(matches!(err, ClockworkError::Parse { line: 2, .. }));
    assert!(parse("v 0 0\n").is_err());
    assert!(parse("v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
}

#[test]
fn unsupported_directives_are_skipped() {
    let model = parse("o thing\ng group\ns off\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
    assert_eq!(model.face_count(), 1);
}

#[test]
fn material_block_is_selected_by_name() {
    let mtl = "newmtl other\nKd 0 0 1\nnewmtl shiny\nka 0.1 0.2 0.3\nKd 1 0 0\nKs 1 1 1\nNs 64\nTr 0.25\nmap_Kd tex.png\nnewmtl after\nKd 0 1 0\n";
    let parsed = parse_mtl(Cursor::new(mtl), "shiny").unwrap().unwrap();
    assert_eq!(parsed.material.ambient, Color::rgb(0.1, 0.2, 0.3));
    assert_eq!(parsed.material.diffuse, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(parsed.material.specular, Color::WHITE);
    assert_eq!(parsed.material.shininess, 64.0);
    assert_eq!(parsed.material.transparency, 0.25);
    assert_eq!(parsed.diffuse_map, Some(PathBuf::from("tex.png")));

    assert!(parse_mtl(Cursor::new(mtl), "missing").unwrap().is_none());
}

#[test]
fn load_obj_resolves_material_library_and_texture() {
    let dir = scratch_dir("mtl");
    let img = image::RgbaImage::from_raw(1, 1, vec![0, 255, 0, 255]).unwrap();
    img.save(dir.join("green.png")).unwrap();
    std::fs::write(dir.join("scene.mtl"), "newmtl green\nKd 0 1 0\nmap_Kd green.png\n").unwrap();
    std::fs::write(
        dir.join("tri.obj"),
        "mtllib scene.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl green\nf 1 2 3\n",
    )
    .unwrap();

    let model = load_obj(&dir.join("tri.obj")).unwrap();
    assert_eq!(model.name(), "tri");
    assert_eq!(model.material().diffuse, Color::rgb(0.0, 1.0, 0.0));
    assert_eq!(model.texture().map(|t| t.width()), Some(1));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_material_library_is_not_fatal() {
    let dir = scratch_dir("nomtl");
    std::fs::write(
        dir.join("tri.obj"),
        "mtllib absent.mtl\nusemtl x\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
    )
    .unwrap();
    let model = load_obj(&dir.join("tri.obj")).unwrap();
    assert_eq!(model.material(), &Material::default());
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_file_is_not_accessible() {
    let err = load_obj(Path::new("/definitely/not/here.obj")).unwrap_err();
    assert!(matches!(err, ClockworkError::FileNotAccessible { .. }));
}
