//! Scan conversion of points, lines and triangles into pixel fragments.
//!
//! Every function takes the target extent and never emits a fragment outside `[0, width) x
//! [0, height)`. Emitted fragments sit on integer pixel coordinates and carry interpolated
//! attributes. The return value is the number of fragments handed to `emit`.

use crate::foundation::math::EPSILON;
use crate::render::fragment::{Fragment, Primitive};

fn in_bounds(x: i64, y: i64, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && x < i64::from(width) && y < i64::from(height)
}

fn finite_xy(f: &Fragment) -> bool {
    f.position.x.is_finite() && f.position.y.is_finite() && f.position.z.is_finite()
}

pub fn rasterise_point<F>(point: &Fragment, width: u32, height: u32, mut emit: F) -> usize
where
    F: FnMut(Fragment),
{
    if !finite_xy(point) {
        return 0;
    }
    let (x, y) = (point.x(), point.y());
    if !in_bounds(x, y, width, height) {
        return 0;
    }
    emit(point.at_pixel(x, y));
    1
}

/// Clip the parametric segment `a + t (b - a)` against `[0, w] x [0, h]` (Liang-Barsky).
fn clip_segment(a: &Fragment, b: &Fragment, width: u32, height: u32) -> Option<(f64, f64)> {
    let (x0, y0) = (a.position.x, a.position.y);
    let dx = b.position.x - x0;
    let dy = b.position.y - y0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-dx, x0),
        (dx, f64::from(width) - x0),
        (-dy, y0),
        (dy, f64::from(height) - y0),
    ];
    for (p, q) in checks {
        if p.abs() < EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Digital differential analyser between two fragments, clipped to the target before stepping.
///
/// Steps one pixel at a time along the major axis, sampling the segment at pixel centres.
pub fn rasterise_line<F>(a: &Fragment, b: &Fragment, width: u32, height: u32, mut emit: F) -> usize
where
    F: FnMut(Fragment),
{
    if !finite_xy(a) || !finite_xy(b) {
        return 0;
    }
    let dx = b.position.x - a.position.x;
    let dy = b.position.y - a.position.y;
    if dx.abs().max(dy.abs()) < EPSILON {
        return rasterise_point(a, width, height, emit);
    }
    let Some((t0, t1)) = clip_segment(a, b, width, height) else {
        return 0;
    };

    let x_major = dx.abs() >= dy.abs();
    let (origin, delta) = if x_major {
        (a.position.x, dx)
    } else {
        (a.position.y, dy)
    };
    let from = origin + delta * t0;
    let to = origin + delta * t1;
    let lo = from.min(to).floor() as i64;
    let hi = from.max(to).floor() as i64;

    let mut emitted = 0;
    for step in lo..=hi {
        let centre = step as f64 + 0.5;
        let t = ((centre - origin) / delta).clamp(t0, t1);
        let f = Fragment::lerp(a, b, t);
        let (x, y) = if x_major { (step, f.y()) } else { (f.x(), step) };
        if !in_bounds(x, y, width, height) {
            continue;
        }
        emit(f.at_pixel(x, y));
        emitted += 1;
    }
    emitted
}

fn edge(ax: f64, ay: f64, bx: f64, by: f64, px: f64, py: f64) -> f64 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

/// Fill a triangle by testing pixel centres against its edge functions.
///
/// Attributes are interpolated with barycentric weights, perspective-corrected through
/// [`Fragment::blend`]. Zero-area and non-finite triangles emit nothing.
pub fn rasterise_triangle<F>(v: &[Fragment; 3], width: u32, height: u32, mut emit: F) -> usize
where
    F: FnMut(Fragment),
{
    if width == 0 || height == 0 || !v.iter().all(finite_xy) {
        return 0;
    }
    let [(x0, y0), (x1, y1), (x2, y2)] = v.each_ref().map(|f| (f.position.x, f.position.y));
    let area = edge(x0, y0, x1, y1, x2, y2);
    if !area.is_finite() || area.abs() < EPSILON {
        return 0;
    }

    let min_x = x0.min(x1).min(x2).floor().max(0.0) as i64;
    let min_y = y0.min(y1).min(y2).floor().max(0.0) as i64;
    let max_x = (x0.max(x1).max(x2).ceil() as i64).min(i64::from(width) - 1);
    let max_y = (y0.max(y1).max(y2).ceil() as i64).min(i64::from(height) - 1);

    let mut emitted = 0;
    for py in min_y..=max_y {
        let cy = py as f64 + 0.5;
        for px in min_x..=max_x {
            let cx = px as f64 + 0.5;
            let b0 = edge(x1, y1, x2, y2, cx, cy) / area;
            let b1 = edge(x2, y2, x0, y0, cx, cy) / area;
            let b2 = edge(x0, y0, x1, y1, cx, cy) / area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }
            let f = Fragment::blend(&[(&v[0], b0), (&v[1], b1), (&v[2], b2)]);
            emit(f.at_pixel(px, py));
            emitted += 1;
        }
    }
    emitted
}

/// Filled rasterisation of any primitive.
pub fn rasterise_filled<F>(primitive: &Primitive, width: u32, height: u32, emit: F) -> usize
where
    F: FnMut(Fragment),
{
    match primitive {
        Primitive::Point(p) => rasterise_point(p, width, height, emit),
        Primitive::Line([a, b]) => rasterise_line(a, b, width, height, emit),
        Primitive::Triangle(v) => rasterise_triangle(v, width, height, emit),
    }
}

/// Outline rasterisation: triangles contribute their three edges only.
pub fn rasterise_outline<F>(primitive: &Primitive, width: u32, height: u32, mut emit: F) -> usize
where
    F: FnMut(Fragment),
{
    match primitive {
        Primitive::Point(p) => rasterise_point(p, width, height, emit),
        Primitive::Line([a, b]) => rasterise_line(a, b, width, height, emit),
        Primitive::Triangle([a, b, c]) => {
            rasterise_line(a, b, width, height, &mut emit)
                + rasterise_line(b, c, width, height, &mut emit)
                + rasterise_line(c, a, width, height, &mut emit)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
