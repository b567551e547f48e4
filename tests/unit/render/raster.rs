use super::*;
use crate::foundation::math::Point4;

fn at(x: f64, y: f64) -> Fragment {
    Fragment {
        position: Point4::new(x, y, 0.5, 1.0),
        ..Fragment::default()
    }
}

fn collect(run: impl FnOnce(&mut Vec<(i64, i64)>) -> usize) -> (usize, Vec<(i64, i64)>) {
    let mut pixels = Vec::new();
    let n = run(&mut pixels);
    (n, pixels)
}

#[test]
fn point_outside_target_is_dropped() {
    for (x, y) in [(-1.0, 0.0), (0.0, -1.0), (10.0, 0.0), (0.0, 10.0)] {
        assert_eq!(rasterise_point(&at(x, y), 10, 10, |_| {}), 0);
    }
    assert_eq!(rasterise_point(&at(9.7, 9.2), 10, 10, |_| {}), 1);
}

#[test]
fn horizontal_line_covers_every_pixel_once() {
    let (n, px) = collect(|out| {
        rasterise_line(&at(0.5, 2.5), &at(6.5, 2.5), 10, 10, |f| out.push((f.x(), f.y())))
    });
    assert_eq!(n, 7);
    assert_eq!(px, (0..=6).map(|x| (x, 2)).collect::<Vec<_>>());
}

#[test]
fn line_is_clipped_to_target_bounds() {
    let (n, px) = collect(|out| {
        rasterise_line(&at(-50.0, 5.5), &at(50.0, 5.5), 10, 10, |f| {
            out.push((f.x(), f.y()))
        })
    });
    assert_eq!(n, 10);
    assert!(px.iter().all(|&(x, y)| (0..10).contains(&x) && y == 5));
}

#[test]
fn line_entirely_outside_emits_nothing() {
    assert_eq!(rasterise_line(&at(-5.0, -5.0), &at(-1.0, 20.0), 10, 10, |_| {}), 0);
}

#[test]
fn triangle_fills_interior_pixels() {
    let tri = [at(0.0, 0.0), at(4.0, 0.0), at(0.0, 4.0)];
    let (n, px) = collect(|out| rasterise_triangle(&tri, 10, 10, |f| out.push((f.x(), f.y()))));
    // Pixel centres with cx + cy <= 4.
    assert_eq!(n, 10);
    assert!(px.contains(&(0, 0)));
    assert!(px.contains(&(3, 0)));
    assert!(!px.contains(&(3, 1)));
}

#[test]
fn winding_order_does_not_matter() {
    let cw = [at(0.0, 0.0), at(0.0, 4.0), at(4.0, 0.0)];
    let ccw = [at(0.0, 0.0), at(4.0, 0.0), at(0.0, 4.0)];
    assert_eq!(
        rasterise_triangle(&cw, 10, 10, |_| {}),
        rasterise_triangle(&ccw, 10, 10, |_| {})
    );
}

#[test]
fn degenerate_triangles_emit_nothing() {
    let collinear = [at(0.0, 0.0), at(2.0, 2.0), at(5.0, 5.0)];
    let repeated = [at(3.0, 3.0), at(3.0, 3.0), at(3.0, 3.0)];
    let non_finite = [at(0.0, 0.0), at(f64::NAN, 2.0), at(5.0, 0.0)];
    for tri in [collinear, repeated, non_finite] {
        assert_eq!(rasterise_triangle(&tri, 10, 10, |_| {}), 0);
    }
}

#[test]
fn huge_triangle_is_clamped_to_target() {
    let tri = [at(-1e6, -1e6), at(1e6, -1e6), at(0.0, 1e6)];
    let (n, px) = collect(|out| rasterise_triangle(&tri, 8, 6, |f| out.push((f.x(), f.y()))));
    assert_eq!(n, 48);
    assert!(px.iter().all(|&(x, y)| (0..8).contains(&x) && (0..6).contains(&y)));
}

#[test]
fn triangle_interpolates_depth() {
    let mut tri = [at(0.0, 0.0), at(8.0, 0.0), at(0.0, 8.0)];
    tri[0].position.z = 0.0;
    tri[1].position.z = 1.0;
    tri[2].position.z = 0.0;
    let mut depths = Vec::new();
    rasterise_triangle(&tri, 8, 8, |f| {
        if f.y() == 0 {
            depths.push(f.position.z);
        }
    });
    assert!(depths.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn outline_walks_edges_only() {
    let tri = Primitive::Triangle([at(1.0, 1.0), at(8.0, 1.0), at(1.0, 8.0)]);
    let mut px = Vec::new();
    rasterise_outline(&tri, 10, 10, |f| px.push((f.x(), f.y())));
    assert!(!px.is_empty());
    assert!(!px.contains(&(3, 3)));
    assert!(px.contains(&(4, 1)));
}
