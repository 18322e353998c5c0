use super::{Point3d, Vector2d, Vector3d};
use cgmath::prelude::*;
use cgmath::{Basis3, Rad};

/// The world space "up" direction.
pub const UP: Vector3d = Vector3d::new(0.0, 0.0, 1.0);

/// Rotates a vector 90 degrees counter-clockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Drops the z component of a vector.
pub fn flatten(vec: Vector3d) -> Vector2d {
    Vector2d::new(vec.x, vec.y)
}

/// Lifts a ground plane vector back into 3D at the given height.
pub fn with_z(vec: Vector2d, z: f64) -> Point3d {
    Point3d::new(vec.x, vec.y, z)
}

/// Linearly interpolates between two scalars.
#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linearly interpolates between two points.
#[inline(always)]
pub fn lerp_point(a: Point3d, b: Point3d, t: f64) -> Point3d {
    a + (b - a) * t
}

/// Maps `value` from the range `[from_min, from_max]` onto `[to_min, to_max]`.
pub fn remap(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    lerp(to_min, to_max, (value - from_min) / (from_max - from_min))
}

/// Like [remap], but clamps the result to `[to_min, to_max]`.
pub fn remap_clamped(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    let (lo, hi) = if to_min < to_max {
        (to_min, to_max)
    } else {
        (to_max, to_min)
    };
    remap(value, from_min, from_max, to_min, to_max).clamp(lo, hi)
}

/// Rotates `vec` by `angle` radians about the unit vector `axis`.
pub fn rotate_about(vec: Vector3d, axis: Vector3d, angle: f64) -> Vector3d {
    Basis3::from_axis_angle(axis, Rad(angle)).rotate_vector(vec)
}

/// Normalises a vector, or returns `fallback` if it is too short to have a direction.
pub fn normalize_or(vec: Vector3d, fallback: Vector3d) -> Vector3d {
    let mag = vec.magnitude();
    if mag > 1e-9 {
        vec / mag
    } else {
        fallback
    }
}

/// The arcsine, with its argument clamped into the function's domain.
pub fn safe_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotation_about_up_is_counter_clockwise() {
        let v = rotate_about(Vector3d::unit_x(), UP, FRAC_PI_2);
        assert_approx_eq!(v.x, 0.0);
        assert_approx_eq!(v.y, 1.0);
        assert_approx_eq!(v.z, 0.0);
        let r = rot90(flatten(Vector3d::unit_x()));
        assert_approx_eq!(r.x, v.x);
        assert_approx_eq!(r.y, v.y);
    }

    #[test]
    fn remap_clamped_handles_descending_ranges() {
        assert_approx_eq!(remap_clamped(700.0, 0.0, 1400.0, 1600.0, 160.0), 880.0);
        assert_approx_eq!(remap_clamped(-5.0, 0.0, 1.0, 0.015, 1.0), 0.015);
        assert_approx_eq!(remap_clamped(9.0, 0.0, 1.0, 0.015, 1.0), 1.0);
    }

    #[test]
    fn degenerate_vectors_use_fallback() {
        let v = normalize_or(Vector3d::new(0.0, 0.0, 0.0), UP);
        assert_eq!(v, UP);
        assert_approx_eq!(safe_asin(1.0000001), FRAC_PI_2);
    }
}
