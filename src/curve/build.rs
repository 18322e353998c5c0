use super::{ControlPoint, Curve};
use crate::math::{
    lerp, normalize_or, rotate_about, safe_asin, CubicHermite3d, GeometricHermite3d,
    ParametricCurve3d, Point3d, Vector3d,
};
use cgmath::prelude::*;
use once_cell::sync::OnceCell;

/// The number of samples per control point segment used by [Curve::new].
pub const DEFAULT_SUBDIVISIONS: usize = 20;

/// Steepness of the logistic bias applied to the first segment's samples.
const START_BIAS: f64 = 4.0;

/// The largest curvature the corrected constructor attributes to out-of-plane turning.
const MAX_OUT_OF_PLANE_CURVATURE: f64 = 0.004; // 1/uu

/// How much of the corrected curvature comes from in-plane turning.
const IN_PLANE_WEIGHT: f64 = 0.5;

/// Boundary endpoints further than this from the fitted curve are added as extra samples.
const ENDPOINT_TOLERANCE: f64 = 1.0; // uu

/// A single raw sample along a curve, before distances are known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSample {
    pub point: Point3d,
    pub tangent: Vector3d,
    pub curvature: f64,
}

/// Boundary mismatches removed by [Curve::corrected].
#[derive(Clone, Copy, Debug)]
pub struct Correction {
    /// Offset to apply at the start of the curve.
    pub dx0: Vector3d,
    /// Tangent change to apply at the start of the curve.
    pub dt0: Vector3d,
    /// Offset to apply at the end of the curve.
    pub dx1: Vector3d,
    /// Tangent change to apply at the end of the curve.
    pub dt1: Vector3d,
    /// The exact start point of the corrected curve.
    pub start: Point3d,
    /// The exact end point of the corrected curve.
    pub end: Point3d,
}

impl Curve {
    /// Fits a curve through the given control points with the default subdivision count.
    pub fn new(control_points: Vec<ControlPoint>) -> Self {
        Self::with_subdivisions(control_points, DEFAULT_SUBDIVISIONS)
    }

    /// Fits a curve through the given control points, sampling each segment `subdivisions` times.
    ///
    /// # Panics
    /// If there are fewer than two control points or `subdivisions` is zero.
    pub fn with_subdivisions(mut control_points: Vec<ControlPoint>, subdivisions: usize) -> Self {
        assert!(
            control_points.len() >= 2,
            "a curve needs at least two control points"
        );
        assert!(subdivisions > 0, "subdivisions must be positive");

        remove_inflections(&mut control_points);
        let samples = sample_segments(&control_points, subdivisions);
        Self::from_samples(samples, control_points, subdivisions)
    }

    /// Builds a curve from precomputed samples, deriving the distances.
    ///
    /// # Panics
    /// If there are fewer than two samples.
    pub fn from_samples(
        samples: Vec<CurveSample>,
        control_points: Vec<ControlPoint>,
        subdivisions: usize,
    ) -> Self {
        assert!(samples.len() >= 2, "a curve needs at least two samples");

        let points = samples.iter().map(|s| s.point).collect::<Vec<_>>();
        let tangents = samples.iter().map(|s| s.tangent).collect();
        let curvatures = samples.iter().map(|s| s.curvature).collect();
        let distances = remaining_distances(&points);

        Self {
            length: distances[0],
            points,
            tangents,
            curvatures,
            distances,
            control_points,
            subdivisions,
            profile: OnceCell::new(),
        }
    }

    /// Fits a curve through the control points, then bends it so that it starts
    /// and ends exactly at the points and tangents given by `correction`.
    ///
    /// # Panics
    /// If there are fewer than two control points or `subdivisions` is zero.
    pub fn corrected(
        control_points: Vec<ControlPoint>,
        correction: &Correction,
        subdivisions: usize,
    ) -> Self {
        assert!(
            control_points.len() >= 2,
            "a curve needs at least two control points"
        );
        assert!(subdivisions > 0, "subdivisions must be positive");

        // Raw geometric fit, clamped above the bounding control point planes
        let mut points = vec![];
        let mut normals = vec![];
        let segments = control_points.len() - 1;
        for (i, pair) in control_points.windows(2).enumerate() {
            let (cp0, cp1) = (pair[0], pair[1]);
            let piece = GeometricHermite3d::new(cp0.position, cp0.tangent, cp1.position, cp1.tangent);
            let count = subdivisions + usize::from(i == segments - 1);
            for j in 0..count {
                let t = j as f64 / subdivisions as f64;
                let mut p = piece.sample(t);
                let depth0 = (p - cp0.position).dot(cp0.normal);
                if depth0 < 0.0 {
                    p -= cp0.normal * depth0;
                }
                let depth1 = (p - cp1.position).dot(cp1.normal);
                if depth1 < 0.0 {
                    p -= cp1.normal * depth1;
                }
                points.push(p);
                normals.push(normalize_or(cp0.normal.lerp(cp1.normal, t), cp0.normal));
            }
        }

        // Apply the correction field within each sample's surface plane
        let distances = remaining_distances(&points);
        let length = distances[0];
        let field = CubicHermite3d::fit(
            correction.dx0,
            correction.dt0,
            correction.dx1,
            correction.dt1,
            length,
        );
        for ((p, n), d) in points.iter_mut().zip(&normals).zip(&distances) {
            let dx = field.value(length - d);
            *p += dx - *n * dx.dot(*n);
        }

        if (correction.start - points[0]).magnitude() > ENDPOINT_TOLERANCE {
            let n0 = normals[0];
            points.insert(0, correction.start);
            normals.insert(0, n0);
        }
        if (correction.end - points[points.len() - 1]).magnitude() > ENDPOINT_TOLERANCE {
            let n1 = normals[normals.len() - 1];
            points.push(correction.end);
            normals.push(n1);
        }

        let distances = remaining_distances(&points);
        let tangents = finite_difference_tangents(&points);
        let curvatures = blended_curvatures(&tangents, &normals, &distances);

        Self {
            length: distances[0],
            points,
            tangents,
            curvatures,
            distances,
            control_points,
            subdivisions,
            profile: OnceCell::new(),
        }
    }
}

/// Rotates interior tangents that would make the curve bend twice between neighbours.
fn remove_inflections(control_points: &mut [ControlPoint]) {
    for i in 1..control_points.len().saturating_sub(1) {
        let prev = control_points[i - 1].position;
        let next = control_points[i + 1].position;
        let cp = &mut control_points[i];

        let before = normalize_or(cp.position - prev, cp.tangent);
        let after = normalize_or(next - cp.position, cp.tangent);
        let phi_before = safe_asin(cp.tangent.cross(before).dot(cp.normal));
        let phi_after = safe_asin(cp.tangent.cross(after).dot(cp.normal));

        if phi_before * phi_after > 0.0 {
            let phi = if phi_before.abs() < phi_after.abs() {
                phi_before
            } else {
                phi_after
            };
            cp.tangent = rotate_about(cp.tangent, cp.normal, phi);
        }
    }
}

/// Maps `u` in `[0, 1]` onto itself, packing samples towards 0.
fn start_bias(u: f64) -> f64 {
    let sigmoid = |x: f64| 1.0 / (1.0 + (-x).exp());
    let lo = sigmoid(-START_BIAS);
    (sigmoid(START_BIAS * (u - 1.0)) - lo) / (sigmoid(0.0) - lo)
}

fn sample_segments(control_points: &[ControlPoint], subdivisions: usize) -> Vec<CurveSample> {
    let segments = control_points.len() - 1;
    let mut samples = Vec::with_capacity(subdivisions * segments + 1);

    for (i, pair) in control_points.windows(2).enumerate() {
        let (cp0, cp1) = (pair[0], pair[1]);
        let piece = GeometricHermite3d::new(cp0.position, cp0.tangent, cp1.position, cp1.tangent);
        let count = subdivisions + usize::from(i == segments - 1);

        for j in 0..count {
            let u = j as f64 / subdivisions as f64;
            let t = if i == 0 { start_bias(u) } else { u };

            let dg = piece.sample_dt(t);
            let normal = normalize_or(cp0.normal.lerp(cp1.normal, t), cp0.normal);
            let (tangent, curvature) = if dg.magnitude() > 1e-6 {
                (dg.normalize(), piece.sample_curvature(t, normal))
            } else {
                let fallback = if t < 0.5 { cp0.tangent } else { cp1.tangent };
                (fallback, 0.0)
            };

            samples.push(CurveSample {
                point: piece.sample(t),
                tangent,
                curvature,
            });
        }
    }

    samples
}

/// Integrates chord lengths backwards from the last point.
fn remaining_distances(points: &[Point3d]) -> Vec<f64> {
    let mut distances = vec![0.0; points.len()];
    for i in (0..points.len() - 1).rev() {
        distances[i] = distances[i + 1] + (points[i + 1] - points[i]).magnitude();
    }
    distances
}

fn finite_difference_tangents(points: &[Point3d]) -> Vec<Vector3d> {
    let last = points.len() - 1;
    let chord = normalize_or(points[last] - points[0], Vector3d::unit_x());
    if last < 2 {
        return vec![chord; points.len()];
    }

    let p = |i: usize| points[i].to_vec();
    let mut tangents = Vec::with_capacity(points.len());
    tangents.push(normalize_or(p(0) * -3.0 + p(1) * 4.0 - p(2), chord));
    for i in 1..last {
        tangents.push(normalize_or(points[i + 1] - points[i - 1], chord));
    }
    tangents.push(normalize_or(
        p(last) * 3.0 - p(last - 1) * 4.0 + p(last - 2),
        chord,
    ));
    tangents
}

/// Blends the full turn angle with the turn about the surface normal,
/// so banked geometry doesn't overstate curvature.
fn blended_curvatures(tangents: &[Vector3d], normals: &[Vector3d], distances: &[f64]) -> Vec<f64> {
    let last = tangents.len() - 1;
    (0..=last)
        .map(|i| {
            let (a, b) = match i {
                0 => (0, 1),
                i if i == last => (last - 1, last),
                i => (i - 1, i + 1),
            };
            let ds = distances[a] - distances[b];
            if ds <= 0.0 {
                return 0.0;
            }
            let m = tangents[b].cross(tangents[a]);
            let total = (safe_asin(m.magnitude()) / ds).clamp(0.0, MAX_OUT_OF_PLANE_CURVATURE);
            let in_plane = safe_asin(m.dot(normals[i]).abs()) / ds;
            lerp(total, in_plane, IN_PLANE_WEIGHT)
        })
        .collect()
}
