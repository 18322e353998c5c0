use super::{Point3d, Vector3d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A parametric curve in 3D space.
pub trait ParametricCurve3d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point3d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector3d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }

    /// Samples the second derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt2(&self, t: f64) -> Vector3d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample_dt(t);
        let p2 = self.sample_dt(t + delta);
        (p2 - p1) / delta
    }

    /// Samples the signed curvature of the curve, measured about `normal`.
    ///
    /// Returns zero where the derivative vanishes.
    fn sample_curvature(&self, t: f64, normal: Vector3d) -> f64 {
        let dg = self.sample_dt(t);
        let d2g = self.sample_dt2(t);
        let mag = dg.magnitude();
        if mag < 1e-6 {
            return 0.0;
        }
        dg.cross(d2g).dot(normal) / (mag * mag * mag)
    }
}

impl<T: ParametricCurve3d + ?Sized> ParametricCurve3d for &T {
    fn sample(&self, t: f64) -> Point3d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        (**self).sample_dt(t)
    }

    fn sample_dt2(&self, t: f64) -> Vector3d {
        (**self).sample_dt2(t)
    }
}
