use super::*;

fn frag(x: f64, y: f64, z: f64, inv_w: f64, color: Color) -> Fragment {
    Fragment {
        position: Point4::new(x, y, z, inv_w),
        color,
        ..Fragment::default()
    }
}

#[test]
fn pixel_accessors_floor_window_coordinates() {
    let f = frag(3.9, -0.5, 0.25, 1.0, Color::WHITE);
    assert_eq!((f.x(), f.y()), (3, -1));
    assert_eq!(f.depth(), 0.25);
}

#[test]
fn lerp_with_equal_w_is_affine() {
    let a = frag(0.0, 0.0, 0.0, 1.0, Color::BLACK);
    let b = frag(10.0, 0.0, 1.0, 1.0, Color::WHITE);
    let m = Fragment::lerp(&a, &b, 0.5);
    assert_eq!(m.position.x, 5.0);
    assert_eq!(m.position.z, 0.5);
    assert!((m.color.red - 0.5).abs() < 1e-12);
    assert!((m.color.alpha - 1.0).abs() < 1e-12);
}

#[test]
fn blend_is_perspective_correct_for_attributes() {
    // The far endpoint (small 1/w) contributes less to attributes at the screen-space midpoint.
    let near = frag(0.0, 0.0, 0.0, 1.0, Color::BLACK);
    let far = frag(10.0, 0.0, 1.0, 0.25, Color::WHITE);
    let m = Fragment::lerp(&near, &far, 0.5);
    assert_eq!(m.position.z, 0.5);
    assert!((m.color.red - 0.2).abs() < 1e-12);
}

#[test]
fn discard_flag_propagates_through_interpolation() {
    let a = frag(0.0, 0.0, 0.0, 1.0, Color::BLACK);
    let mut b = a;
    b.discarded = true;
    assert!(Fragment::lerp(&a, &b, 0.1).discarded);
}

#[test]
fn vertex_array_collects_primitives() {
    let f = Fragment::default();
    let va: VertexArray = [Primitive::Point(f), Primitive::Triangle([f; 3])]
        .into_iter()
        .collect();
    assert_eq!(va.len(), 2);
    let counts: Vec<usize> = va.iter().map(|p| p.vertices().len()).collect();
    assert_eq!(counts, vec![1, 3]);
}

#[test]
fn display_includes_pixel_and_colour() {
    let f = frag(1.0, 2.0, 0.5, 1.0, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(f.to_string(), "Fragment(x=1, y=2, depth=0.5, color=#ffff0000)");
}
