//! Mathematical structs and functions.

use cgmath::{Point3, Vector2, Vector3};
pub use cubic::CubicHermite3d;
pub use curve::ParametricCurve3d;
pub use hermite::GeometricHermite3d;
pub use lut::PiecewiseLinear;
pub use util::*;

mod cubic;
mod curve;
mod hermite;
mod lut;
mod util;

/// A 3D point
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;

/// A 2D vector, used for ground-plane geometry
pub type Vector2d = Vector2<f64>;
