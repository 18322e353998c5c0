use super::{ParametricCurve3d, Point3d, Vector3d};
use crate::util::Interval;
use cgmath::prelude::*;

/// An "optimal geometric Hermite" cubic between two points.
///
/// The tangent magnitudes are chosen to minimise the curve's bending energy,
/// so only the tangent *directions* at each end need to be supplied.
#[derive(Clone, Copy, Debug)]
pub struct GeometricHermite3d {
    p0: Point3d,
    v0: Vector3d,
    p1: Point3d,
    v1: Vector3d,
    a0: f64,
    a1: f64,
}

impl GeometricHermite3d {
    /// Creates a new segment from two end points and their unit tangents.
    pub fn new(p0: Point3d, v0: Vector3d, p1: Point3d, v1: Vector3d) -> Self {
        let dp = p1 - p0;
        let v0dv1 = v0.dot(v1);
        let denom = 4.0 - v0dv1 * v0dv1;

        let a0 = (6.0 * dp.dot(v0) - 3.0 * dp.dot(v1) * v0dv1) / denom;
        let a1 = (6.0 * dp.dot(v1) - 3.0 * dp.dot(v0) * v0dv1) / denom;

        Self {
            p0,
            v0,
            p1,
            v1,
            a0,
            a1,
        }
    }

    /// The magnitudes applied to the start and end tangents.
    pub fn tangent_magnitudes(&self) -> (f64, f64) {
        (self.a0, self.a1)
    }
}

impl ParametricCurve3d for GeometricHermite3d {
    fn sample(&self, t: f64) -> Point3d {
        let p0 = self.p0.to_vec();
        let p1 = self.p1.to_vec();
        let pos = p0 * ((2.0 * t + 1.0) * (t - 1.0) * (t - 1.0))
            + self.v0 * ((t - 1.0) * (t - 1.0) * t * self.a0)
            + p1 * ((3.0 - 2.0 * t) * t * t)
            + self.v1 * ((t - 1.0) * t * t * self.a1);
        Point3d::from_vec(pos)
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, 1.0)
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        let p0 = self.p0.to_vec();
        let p1 = self.p1.to_vec();
        p0 * (6.0 * t * t - 6.0 * t)
            + self.v0 * ((1.0 - 4.0 * t + 3.0 * t * t) * self.a0)
            + p1 * (6.0 * t - 6.0 * t * t)
            + self.v1 * ((3.0 * t * t - 2.0 * t) * self.a1)
    }

    fn sample_dt2(&self, t: f64) -> Vector3d {
        let p0 = self.p0.to_vec();
        let p1 = self.p1.to_vec();
        p0 * (12.0 * t - 6.0) + self.v0 * ((6.0 * t - 4.0) * self.a0) - p1 * (12.0 * t - 6.0)
            + self.v1 * ((6.0 * t - 2.0) * self.a1)
    }
}
