//! Wavefront OBJ/MTL ingestion.
//!
//! Supported directives: `v`, `vt` (V axis flipped to image row order), `vn` (normalised), `f`
//! (fan-triangulated, 1-based or negative relative indices), `mtllib` and `usemtl`. Material files
//! contribute `Ka`, `Kd`, `Ks`, `Tr`, `d`, `Ns` and `map_Kd`. Anything else is logged and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::assets::model::{Material, Model3D, Texture};
use crate::foundation::core::{Color, TexCoords};
use crate::foundation::error::{ClockworkError, ClockworkResult};
use crate::foundation::math::{Point3, Vector3};

/// Load a model from an OBJ file. Material libraries are resolved next to it.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_obj(path: &Path) -> ClockworkResult<Model3D> {
    let file = File::open(path).map_err(|e| ClockworkError::file_not_accessible(path, e))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let model = parse_obj(BufReader::new(file), name, path.parent())?;
    tracing::debug!(
        positions = model.positions().len(),
        faces = model.face_count(),
        "model loaded"
    );
    Ok(model)
}

#[derive(Clone, Copy)]
struct Corner {
    position: u32,
    uv: Option<usize>,
    normal: Option<usize>,
}

fn resolve_index(token: &str, count: usize, what: &str, line: usize) -> ClockworkResult<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| ClockworkError::parse(line, format!("invalid {what} index '{token}'")))?;
    let resolved = match raw {
        0 => None,
        i if i > 0 => Some(i - 1),
        i => Some(count as i64 + i),
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < count => Ok(i as usize),
        _ => Err(ClockworkError::parse(
            line,
            format!("{what} index {raw} out of range ({count} defined)"),
        )),
    }
}

fn parse_floats<const N: usize>(
    tokens: &[&str],
    directive: &str,
    line: usize,
) -> ClockworkResult<[f64; N]> {
    if tokens.len() < N {
        return Err(ClockworkError::parse(
            line,
            format!("'{directive}' expects {N} values, got {}", tokens.len()),
        ));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| ClockworkError::parse(line, format!("invalid number '{token}'")))?;
    }
    Ok(out)
}

/// Parse OBJ text. `base_dir` is where `mtllib` paths are looked up; without it materials are
/// ignored.
pub fn parse_obj<R: BufRead>(
    reader: R,
    name: impl Into<String>,
    base_dir: Option<&Path>,
) -> ClockworkResult<Model3D> {
    let mut model = Model3D::new(name);
    let mut uvs: Vec<TexCoords> = Vec::new();
    let mut normals: Vec<Vector3> = Vec::new();
    let mut material_lib: Option<PathBuf> = None;
    let mut active_material: Option<String> = None;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| ClockworkError::parse(line_no, e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(directive) = parts.next() else {
            continue;
        };
        let tokens: SmallVec<[&str; 8]> = parts.collect();

        match directive {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&tokens, directive, line_no)?;
                model.add_position(Point3::new(x, y, z));
            }
            "vt" => {
                let [u] = parse_floats::<1>(&tokens, directive, line_no)?;
                let v = match tokens.get(1) {
                    Some(_) => parse_floats::<1>(&tokens[1..], directive, line_no)?[0],
                    None => 0.0,
                };
                uvs.push(TexCoords::new(u, 1.0 - v));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&tokens, directive, line_no)?;
                normals.push(Vector3::new(x, y, z).normalise());
            }
            "f" => {
                let corners = tokens
                    .iter()
                    .map(|t| parse_corner(t, &model, uvs.len(), normals.len(), line_no))
                    .collect::<ClockworkResult<SmallVec<[Corner; 8]>>>()?;
                add_polygon(&mut model, &corners, &uvs, &normals, line_no)?;
            }
            "mtllib" => {
                let Some(file) = tokens.first() else {
                    return Err(ClockworkError::parse(line_no, "'mtllib' expects a file name"));
                };
                material_lib = base_dir.map(|dir| dir.join(file));
            }
            "usemtl" => {
                let Some(wanted) = tokens.first() else {
                    return Err(ClockworkError::parse(line_no, "'usemtl' expects a name"));
                };
                if let Some(previous) = &active_material
                    && previous != wanted
                {
                    tracing::warn!(
                        previous = %previous,
                        next = %wanted,
                        "model uses several materials; the last one applies to all faces"
                    );
                }
                active_material = Some((*wanted).to_owned());
                if let Some(lib) = &material_lib {
                    apply_material(&mut model, lib, wanted);
                }
            }
            other => {
                tracing::warn!(directive = other, line = line_no, "unsupported OBJ directive skipped");
            }
        }
    }
    Ok(model)
}

fn parse_corner(
    token: &str,
    model: &Model3D,
    uv_count: usize,
    normal_count: usize,
    line: usize,
) -> ClockworkResult<Corner> {
    let mut fields = token.split('/');
    let position = fields.next().unwrap_or_default();
    let position = resolve_index(position, model.positions().len(), "position", line)? as u32;
    let uv = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, uv_count, "texture coordinate", line)?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, normal_count, "normal", line)?),
        _ => None,
    };
    if fields.next().is_some() {
        return Err(ClockworkError::parse(line, format!("malformed face corner '{token}'")));
    }
    Ok(Corner {
        position,
        uv,
        normal,
    })
}

fn add_polygon(
    model: &mut Model3D,
    corners: &[Corner],
    uvs: &[TexCoords],
    normals: &[Vector3],
    line: usize,
) -> ClockworkResult<()> {
    if corners.len() < 3 {
        return Err(ClockworkError::parse(
            line,
            format!("face needs at least 3 corners, got {}", corners.len()),
        ));
    }
    let has_uv = corners[0].uv.is_some();
    let has_normal = corners[0].normal.is_some();
    if corners
        .iter()
        .any(|c| c.uv.is_some() != has_uv || c.normal.is_some() != has_normal)
    {
        return Err(ClockworkError::parse(
            line,
            "face corners disagree on texture coordinate or normal indices",
        ));
    }

    for k in 1..corners.len() - 1 {
        let tri = [corners[0], corners[k], corners[k + 1]];
        let tri_uvs = has_uv.then(|| tri.map(|c| c.uv.map_or_else(TexCoords::default, |i| uvs[i])));
        let tri_normals =
            has_normal.then(|| tri.map(|c| c.normal.map_or(Vector3::ZERO, |i| normals[i])));
        model
            .add_face(tri.map(|c| c.position), tri_normals, tri_uvs)
            .map_err(|e| ClockworkError::parse(line, e.to_string()))?;
    }
    Ok(())
}

fn apply_material(model: &mut Model3D, lib: &Path, name: &str) {
    let file = match File::open(lib) {
        Ok(f) => f,
        Err(err) => {
            tracing::warn!(path = %lib.display(), error = %err, "material library not accessible");
            return;
        }
    };
    match parse_mtl(BufReader::new(file), name) {
        Ok(Some(parsed)) => {
            model.set_material(parsed.material);
            if let Some(map) = parsed.diffuse_map {
                let path = lib.parent().map_or_else(|| map.clone(), |dir| dir.join(&map));
                match Texture::load(&path) {
                    Ok(texture) => model.set_texture(Some(Arc::new(texture))),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "texture not loaded")
                    }
                }
            }
        }
        Ok(None) => {
            tracing::warn!(material = name, path = %lib.display(), "material not found in library");
        }
        Err(err) => {
            tracing::warn!(material = name, error = %err, "could not load the material data");
        }
    }
}

/// One `newmtl` block from a material library.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedMaterial {
    pub material: Material,
    /// `map_Kd`, relative to the library file.
    pub diffuse_map: Option<PathBuf>,
}

fn parse_rgb(tokens: &[&str], directive: &str, line: usize) -> ClockworkResult<Color> {
    let [r, g, b] = parse_floats::<3>(tokens, directive, line)?;
    Ok(Color::rgb(r, g, b))
}

/// Extract the material called `name` from MTL text. Returns `Ok(None)` when no such block exists.
pub fn parse_mtl<R: BufRead>(reader: R, name: &str) -> ClockworkResult<Option<ParsedMaterial>> {
    let mut found: Option<ParsedMaterial> = None;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| ClockworkError::parse(line_no, e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(directive) = parts.next() else {
            continue;
        };
        let tokens: SmallVec<[&str; 4]> = parts.collect();

        if directive == "newmtl" {
            if found.is_some() {
                break;
            }
            if tokens.first() == Some(&name) {
                found = Some(ParsedMaterial {
                    material: Material::default(),
                    diffuse_map: None,
                });
            }
            continue;
        }
        let Some(current) = found.as_mut() else {
            continue;
        };
        let m = &mut current.material;
        match directive.to_ascii_lowercase().as_str() {
            "ka" => m.ambient = parse_rgb(&tokens, directive, line_no)?,
            "kd" => m.diffuse = parse_rgb(&tokens, directive, line_no)?,
            "ks" => m.specular = parse_rgb(&tokens, directive, line_no)?,
            "tr" => m.transparency = parse_floats::<1>(&tokens, directive, line_no)?[0],
            "d" => m.transparency = 1.0 - parse_floats::<1>(&tokens, directive, line_no)?[0],
            "ns" => m.shininess = parse_floats::<1>(&tokens, directive, line_no)?[0],
            "map_kd" => match tokens.last() {
                Some(file) => current.diffuse_map = Some(PathBuf::from(file)),
                None => return Err(ClockworkError::parse(line_no, "'map_Kd' expects a file name")),
            },
            _ => {
                tracing::warn!(directive, line = line_no, "unsupported MTL directive skipped");
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/obj.rs"]
mod tests;
