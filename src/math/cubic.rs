use super::Vector3d;

/// A cubic Hermite field over an arclength `s` in `[0, length]`.
///
/// Used as an additive correction: `value(0)` is `x0` with derivative `t0`,
/// and `value(length)` is `x1` with derivative `t1`.
#[derive(Clone, Copy, Debug)]
pub struct CubicHermite3d {
    x0: Vector3d,
    t0: Vector3d,
    x1: Vector3d,
    t1: Vector3d,
    length: f64,
}

impl CubicHermite3d {
    pub const fn fit(x0: Vector3d, t0: Vector3d, x1: Vector3d, t1: Vector3d, length: f64) -> Self {
        Self {
            x0,
            t0,
            x1,
            t1,
            length,
        }
    }

    pub fn value(&self, s: f64) -> Vector3d {
        if self.length <= 0.0 {
            return self.x0;
        }
        let l = self.length;
        let u = s / l;
        self.x0 * ((1.0 - u) * (1.0 - u) * (1.0 + 2.0 * u))
            + self.t0 * (l * (1.0 - u) * (1.0 - u) * u)
            + self.x1 * ((3.0 - 2.0 * u) * u * u)
            + self.t1 * (l * (u - 1.0) * u * u)
    }

    pub fn derivative(&self, s: f64) -> Vector3d {
        if self.length <= 0.0 {
            return self.t0;
        }
        let l = self.length;
        let u = s / l;
        (self.x1 - self.x0) * (6.0 * u * (1.0 - u) / l)
            + self.t0 * ((1.0 - u) * (1.0 - 3.0 * u))
            + self.t1 * (3.0 * u * u - 2.0 * u)
    }
}
