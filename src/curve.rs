//! An arclength-sampled path through space.
//!
//! A [Curve] stores parallel arrays of points, tangents, curvatures and distances.
//! Distances are measured as the distance *remaining* to the end of the path,
//! so index 0 is the start of the path with `distance == length`, and the last
//! sample is the end of the path with `distance == 0`.

pub use self::build::{Correction, CurveSample, DEFAULT_SUBDIVISIONS};
pub use self::check::{ObstacleCollision, PathCheckStatus, PathStatus};
pub use self::profile::{ProfileParams, SpeedProfile};
use crate::math::{lerp, lerp_point, normalize_or, Point3d, Vector3d, UP};
use crate::util::Interval;
use cgmath::prelude::*;
use once_cell::sync::OnceCell;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod build;
mod check;
mod profile;

/// An input waypoint used to fit a [Curve].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlPoint {
    pub position: Point3d,
    /// Unit vector giving the direction of travel through the point.
    pub tangent: Vector3d,
    /// Unit vector normal to the driving surface at the point.
    pub normal: Vector3d,
}

impl ControlPoint {
    /// Creates a control point on flat ground.
    pub fn new(position: Point3d, tangent: Vector3d) -> Self {
        Self::with_normal(position, tangent, UP)
    }

    /// Creates a control point on a surface with the given normal.
    pub fn with_normal(position: Point3d, tangent: Vector3d, normal: Vector3d) -> Self {
        Self {
            position,
            tangent: normalize_or(tangent, Vector3d::unit_x()),
            normal: normalize_or(normal, UP),
        }
    }
}

/// A drivable path, sampled by arclength, with a lazily computed speed profile.
#[derive(Clone, Debug)]
pub struct Curve {
    points: Vec<Point3d>,
    tangents: Vec<Vector3d>,
    curvatures: Vec<f64>,
    distances: Vec<f64>,
    length: f64,
    control_points: Vec<ControlPoint>,
    subdivisions: usize,
    profile: OnceCell<SpeedProfile>,
}

impl Curve {
    /// The total length of the curve.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The number of samples along the curve.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`, a curve has at least two samples.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    pub fn tangents(&self) -> &[Vector3d] {
        &self.tangents
    }

    pub fn curvatures(&self) -> &[f64] {
        &self.curvatures
    }

    /// The distance remaining to the end of the curve at each sample.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// The control points the curve was fitted to, after tangent adjustment.
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    /// The number of samples per control point segment.
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// The start point of the curve.
    pub fn start(&self) -> Point3d {
        self.points[0]
    }

    /// The end point of the curve.
    pub fn end(&self) -> Point3d {
        self.points[self.points.len() - 1]
    }

    /// Finds the bracketing samples for the remaining distance `s`.
    ///
    /// Returns `(i, u)` such that the value at `s` is the value at sample `i + 1`
    /// interpolated towards sample `i` by `u`.
    fn bracket(&self, s: f64) -> (usize, f64) {
        let s = Interval::new(0.0, self.length).clamp(s);
        let last = self.distances.len() - 2;
        let idx = self.distances.partition_point(|d| *d >= s);
        let i = usize::min(idx.saturating_sub(1), last);
        let u = Interval::new(self.distances[i + 1], self.distances[i]).inv_lerp(s);
        (i, u)
    }

    /// The point on the curve with `s` distance remaining to the end.
    pub fn point_at(&self, s: f64) -> Point3d {
        let (i, u) = self.bracket(s);
        lerp_point(self.points[i + 1], self.points[i], u)
    }

    /// The unit tangent of the curve with `s` distance remaining to the end.
    pub fn tangent_at(&self, s: f64) -> Vector3d {
        let (i, u) = self.bracket(s);
        let tan = self.tangents[i + 1].lerp(self.tangents[i], u);
        normalize_or(tan, self.tangents[i + 1])
    }

    /// The unsigned curvature with `s` distance remaining to the end,
    /// estimated from the turn between the bracketing tangents.
    pub fn curvature_at(&self, s: f64) -> f64 {
        let (i, _) = self.bracket(s);
        let ds = self.distances[i] - self.distances[i + 1];
        if ds <= 0.0 {
            return 0.0;
        }
        self.tangents[i + 1].angle(self.tangents[i]).0 / ds
    }

    /// The fastest the vehicle can be going with `s` distance remaining to the end.
    ///
    /// Computes the speed profile with default parameters on first use.
    pub fn max_speed_at(&self, s: f64) -> f64 {
        let (i, u) = self.bracket(s);
        let speeds = self.speed_profile().max_speeds();
        lerp(speeds[i + 1], speeds[i], u)
    }

    /// Projects `position` onto the curve and returns the remaining distance at the nearest point.
    pub fn find_nearest(&self, position: Point3d) -> f64 {
        let mut s = self.length;
        let mut min_dist = (position - self.points[0]).magnitude();

        for (i, pair) in self.points.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let ab = b - a;
            let len2 = ab.magnitude2();
            let alpha = if len2 > 0.0 {
                (ab.dot(position - a) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist = (position - (a + ab * alpha)).magnitude();
            if dist < min_dist {
                min_dist = dist;
                s = lerp(self.distances[i], self.distances[i + 1], alpha);
            }
        }

        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn quarter_turn() -> Curve {
        Curve::new(vec![
            ControlPoint::new(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_x()),
            ControlPoint::new(Point3d::new(1000.0, 1000.0, 17.0), Vector3d::unit_y()),
        ])
    }

    #[test]
    fn endpoints_by_remaining_distance() {
        let curve = quarter_turn();
        let start = curve.point_at(curve.length());
        let end = curve.point_at(0.0);
        assert_approx_eq!(start.x, 0.0);
        assert_approx_eq!(end.x, 1000.0);
        assert_approx_eq!(end.y, 1000.0);
        assert_eq!(curve.point_at(-50.0), end);
        assert_eq!(curve.point_at(curve.length() + 50.0), start);
    }

    #[test]
    fn equal_distances_pick_later_sample() {
        let p = Point3d::new(0.0, 0.0, 0.0);
        let q = Point3d::new(100.0, 0.0, 0.0);
        let sample = |point| CurveSample {
            point,
            tangent: Vector3d::unit_x(),
            curvature: 0.0,
        };
        let curve = Curve::from_samples(
            vec![sample(p), sample(q), sample(q)],
            vec![
                ControlPoint::new(p, Vector3d::unit_x()),
                ControlPoint::new(q, Vector3d::unit_x()),
            ],
            2,
        );
        assert_eq!(curve.distances(), &[100.0, 0.0, 0.0]);
        assert_eq!(curve.point_at(0.0), q);
        assert_eq!(curve.curvature_at(0.0), 0.0);
        assert!(curve.tangent_at(0.0).x.is_finite());
    }

    #[test]
    fn curvature_matches_turn_rate() {
        let curve = quarter_turn();
        let mid = 0.5 * curve.length();
        // A quarter turn over the whole length averages to (pi/2) / length.
        let avg = std::f64::consts::FRAC_PI_2 / curve.length();
        assert!(curve.curvature_at(mid) > 0.5 * avg);
        assert!(curve.curvature_at(mid) < 3.0 * avg);
    }

    #[test]
    fn nearest_point_on_samples() {
        let curve = quarter_turn();
        for (i, point) in curve.points().iter().enumerate() {
            assert_approx_eq!(curve.find_nearest(*point), curve.distances()[i], 1e-6);
        }
    }
}
