//! Scalar and segment helpers shared by the shape intersection tests

use std::f32::consts::TAU;

use super::Point2;

/// Tolerance used by [`super::VectorExt::is_epsilon_zero`]
pub const EPSILON: f32 = 1.110_223e-16;

/// Clamp `value` into the range spanned by `min` and `max`.
///
/// The bounds may be given in either order.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    let (lo, hi) = if min < max { (min, max) } else { (max, min) };
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn clamp_radian(radians: f32) -> f32 {
    let r = radians.rem_euclid(TAU);
    // rem_euclid may round up to TAU for tiny negative inputs
    if r >= TAU {
        0.0
    } else {
        r
    }
}

#[inline]
fn determinant(a: Point2, b: Point2) -> f32 {
    a.x * b.y - b.x * a.y
}

/// Factor along `[p3, p4]` where it crosses `[p1, p2]`.
///
/// Returns NaN when the segments are parallel or do not cross.
pub fn segment_intersection_factor(p1: Point2, p2: Point2, p3: Point2, p4: Point2) -> f32 {
    let v1 = p2 - p1;
    let v2 = p4 - p3;
    let det = determinant(v1, v2);
    if det == 0.0 {
        return f32::NAN;
    }
    let v3 = p1 - p3;
    let u = determinant(v1, v3) / det;
    if !(0.0..=1.0).contains(&u) {
        return f32::NAN;
    }
    let u = determinant(v2, v3) / det;
    if (0.0..=1.0).contains(&u) {
        u
    } else {
        f32::NAN
    }
}

/// Euclidean distance from `p` to the segment `[s1, s2]`
pub fn distance_point_to_segment(p: Point2, s1: Point2, s2: Point2) -> f32 {
    let seg = s2 - s1;
    let denominator = seg.length_squared();
    if denominator == 0.0 {
        return p.distance(s1);
    }
    let ratio = (p - s1).dot(seg) / denominator;
    if ratio <= 0.0 {
        return p.distance(s1);
    }
    if ratio >= 1.0 {
        return p.distance(s2);
    }
    let s = ((s1.y - p.y) * seg.x - (s1.x - p.x) * seg.y) / denominator;
    s.abs() * denominator.sqrt()
}

/// Smallest distance between segments `[s1, s2]` and `[s3, s4]`; zero when they cross
pub fn distance_segment_to_segment(s1: Point2, s2: Point2, s3: Point2, s4: Point2) -> f32 {
    if !segment_intersection_factor(s1, s2, s3, s4).is_nan() {
        return 0.0;
    }
    let d1 = distance_point_to_segment(s1, s3, s4);
    let d2 = distance_point_to_segment(s2, s3, s4);
    let d3 = distance_point_to_segment(s3, s1, s2);
    let d4 = distance_point_to_segment(s4, s1, s2);
    d1.min(d2).min(d3).min(d4)
}
