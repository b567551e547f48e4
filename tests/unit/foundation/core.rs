use super::*;

#[test]
fn argb_packing_clamps_and_orders_channels() {
    assert_eq!(Color::WHITE.to_argb32(), 0xFFFF_FFFF);
    assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_argb32(), 0xFFFF_0000);
    assert_eq!(Color::new(2.0, -1.0, 0.0, 0.0).to_argb32(), 0x00FF_0000);
    assert_eq!(Color::new(f64::NAN, 0.0, 0.0, 1.0).to_argb32(), 0xFF00_0000);
}

#[test]
fn argb_unpacking_matches_packing() {
    let c = Color::from_argb32(0x80FF_0040);
    assert_eq!(c.to_argb32(), 0x80FF_0040);
    assert_eq!(c.red, 1.0);
    assert_eq!(c.green, 0.0);
}

#[test]
fn luminance_of_white_is_one() {
    assert!((Color::WHITE.luminance() - 1.0).abs() < 1e-12);
    assert_eq!(Color::BLACK.luminance(), 0.0);
}

#[test]
fn transform_identity_and_translation() {
    assert_eq!(Transform::default().to_matrix(), Matrix4::IDENTITY);

    let t = Transform {
        position: Vector3::new(10.0, -2.5, 1.0),
        ..Transform::default()
    };
    assert_eq!(
        t.to_matrix(),
        Matrix4::translation(Vector3::new(10.0, -2.5, 1.0))
    );
}

#[test]
fn transform_scales_before_translating() {
    let t = Transform {
        position: Vector3::new(1.0, 0.0, 0.0),
        scale: Vector3::new(3.0, 3.0, 3.0),
        ..Transform::default()
    };
    let p = t.to_matrix().transform_point(Vector3::new(1.0, 0.0, 0.0));
    assert!((p.x - 4.0).abs() < 1e-12);
}
