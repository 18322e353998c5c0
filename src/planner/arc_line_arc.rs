use super::Pose;
use crate::curve::{ControlPoint, Curve, CurveSample};
use crate::math::{flatten, rot90, with_z, Vector2d, Vector3d};
use crate::vehicle::max_turning_speed;
use cgmath::prelude::*;
use cgmath::{Basis2, Rad};
use itertools::iproduct;
use std::f64::consts::PI;

/// Circles closer than this fraction of their combined radius are shrunk.
const OVERLAP_RATIO: f64 = 0.97;

/// Both circles must be drivable at least this fast.
const MIN_ARC_SPEED: f64 = 100.0; // uu/s

/// Samples per requested subdivision, arcs need many more samples than splines.
const SAMPLE_DENSITY: usize = 10;

/// A path on the ground plane made of a circular arc, a straight line, and another arc.
///
/// Radii are signed: positive radii turn left (anticlockwise), negative radii turn right.
#[derive(Clone, Copy, Debug)]
pub struct ArcLineArc {
    p1: Vector2d,
    t1: Vector2d,
    p2: Vector2d,
    t2: Vector2d,
    c1: Vector2d,
    c2: Vector2d,
    r1: f64,
    r2: f64,
    q1: Vector2d,
    q2: Vector2d,
    phi1: f64,
    phi2: f64,
    lengths: [f64; 3],
}

impl ArcLineArc {
    /// Joins the start and end poses with circles of signed radii `r1` and `r2`.
    ///
    /// The result may be degenerate, see [ArcLineArc::is_valid].
    pub fn new(start: &Pose, end: &Pose, r1: f64, r2: f64) -> Self {
        let p1 = flatten(start.position.to_vec());
        let t1 = flatten(start.tangent).normalize();
        let n1 = rot90(t1);
        let p2 = flatten(end.position.to_vec());
        let t2 = flatten(end.tangent).normalize();
        let n2 = rot90(t2);

        let (mut r1, mut r2) = (r1, r2);
        let mut c1 = p1 + n1 * r1;
        let mut c2 = p2 + n2 * r2;
        let mut delta_o = c2 - c1;

        // Whether the path changes turning direction between the arcs
        let sign = -r1.signum() * r2.signum();
        let mut big_r = r1.abs() + sign * r2.abs();
        let mut o = delta_o.magnitude();

        if big_r * big_r / (o * o) > OVERLAP_RATIO {
            let delta_p = p2 - p1;
            let delta_n = n2 * r2 - n1 * r1;
            let a = OVERLAP_RATIO * delta_n.dot(delta_n) - big_r * big_r;
            let b = 2.0 * OVERLAP_RATIO * delta_n.dot(delta_p);
            let c = OVERLAP_RATIO * delta_p.dot(delta_p);
            let alpha = (-b - (b * b - 4.0 * a * c).sqrt()) / (2.0 * a);

            r1 *= alpha;
            r2 *= alpha;
            big_r *= alpha;
            c1 = p1 + n1 * r1;
            c2 = p2 + n2 * r2;
            delta_o = c2 - c1;
            o = delta_o.magnitude();
        }

        // Frame along the axis between the two centres
        let e1 = delta_o / o;
        let e2 = rot90(e1) * -r1.signum();
        let h = (o * o - big_r * big_r).sqrt();
        let offset = e1 * (big_r / o) + e2 * (h / o);

        let q1 = c1 + offset * r1.abs();
        let q2 = c2 - offset * (sign * r2.abs());

        let phi1 = wrap_positive(2.0 * half_chord_angle(q1 - p1, t1, n1));
        let phi2 = wrap_positive(-2.0 * half_chord_angle(q2 - p2, t2, n2));

        Self {
            p1,
            t1,
            p2,
            t2,
            c1,
            c2,
            r1,
            r2,
            q1,
            q2,
            phi1,
            phi2,
            lengths: [phi1 * r1.abs(), (q2 - q1).magnitude(), phi2 * r2.abs()],
        }
    }

    /// Tries both turning directions at each end and returns the shortest valid path.
    ///
    /// # Panics
    /// If either radius is zero.
    pub fn shortest(start: &Pose, end: &Pose, r1: f64, r2: f64) -> Option<Self> {
        assert!(r1 != 0.0 && r2 != 0.0, "turn radii must be non-zero");
        let (r1, r2) = (r1.abs(), r2.abs());
        iproduct!([r1, -r1], [r2, -r2])
            .map(|(r1, r2)| Self::new(start, end, r1, r2))
            .filter(|ala| ala.is_valid(MIN_ARC_SPEED))
            .min_by(|a, b| a.length().total_cmp(&b.length()))
    }

    /// Whether the path is well formed and both circles can be driven faster than `min_speed`.
    pub fn is_valid(&self, min_speed: f64) -> bool {
        self.length().is_finite()
            && self.q1.x.is_finite()
            && self.q2.x.is_finite()
            && max_turning_speed(1.0 / self.r1) > min_speed
            && max_turning_speed(1.0 / self.r2) > min_speed
    }

    pub fn length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    /// The signed radii after any shrinking.
    pub fn radii(&self) -> (f64, f64) {
        (self.r1, self.r2)
    }

    /// The angles turned through on each arc, in `[0, 2pi)`.
    pub fn turn_angles(&self) -> (f64, f64) {
        (self.phi1, self.phi2)
    }

    /// Samples the path into a [Curve] at height `z`.
    ///
    /// # Panics
    /// If `subdivisions` is zero.
    pub fn to_curve(&self, z: f64, subdivisions: usize) -> Curve {
        assert!(subdivisions > 0, "subdivisions must be positive");
        let ds = self.length() / (subdivisions * SAMPLE_DENSITY) as f64;
        let count = |len: f64| {
            if ds > 0.0 {
                (len / ds).ceil() as usize
            } else {
                0
            }
        };
        let mut samples = vec![];

        let arcs = [
            (self.p1, self.c1, self.r1, self.phi1, self.lengths[0]),
            (self.q2, self.c2, self.r2, self.phi2, self.lengths[2]),
        ];
        let [first, second] = arcs.map(|(from, centre, radius, phi, len)| {
            let n = count(len);
            let step = Basis2::from_angle(Rad(radius.signum() * phi / n.max(1) as f64));
            let mut r = from - centre;
            let mut arc = Vec::with_capacity(n);
            for _ in 0..n {
                arc.push(CurveSample {
                    point: with_z(centre + r, z),
                    tangent: flat_vector(rot90(r).normalize() * radius.signum()),
                    curvature: 1.0 / radius,
                });
                r = step.rotate_vector(r);
            }
            arc
        });

        samples.extend(first);
        let n = count(self.lengths[1]);
        let line_tangent = flat_vector((self.q2 - self.q1).normalize());
        samples.extend((0..n).map(|i| CurveSample {
            point: with_z(self.q1.lerp(self.q2, i as f64 / n as f64), z),
            tangent: line_tangent,
            curvature: 0.0,
        }));
        samples.extend(second);

        if samples.is_empty() {
            samples.push(CurveSample {
                point: with_z(self.p1, z),
                tangent: flat_vector(self.t1),
                curvature: 0.0,
            });
        }
        samples.push(CurveSample {
            point: with_z(self.p2, z),
            tangent: flat_vector(self.t2),
            curvature: 0.0,
        });

        let control_points = vec![
            ControlPoint::new(with_z(self.p1, z), flat_vector(self.t1)),
            ControlPoint::new(with_z(self.p2, z), flat_vector(self.t2)),
        ];
        Curve::from_samples(samples, control_points, subdivisions)
    }
}

/// Half the angle subtended by a chord leaving a point with the given tangent and normal.
fn half_chord_angle(chord: Vector2d, tangent: Vector2d, normal: Vector2d) -> f64 {
    let len = chord.magnitude();
    if len < 1e-9 {
        return 0.0;
    }
    let chord = chord / len;
    chord.dot(tangent).signum() * chord.dot(normal).abs().min(1.0).asin()
}

fn wrap_positive(angle: f64) -> f64 {
    if angle < 0.0 {
        angle + 2.0 * PI
    } else {
        angle
    }
}

fn flat_vector(vec: Vector2d) -> Vector3d {
    Vector3d::new(vec.x, vec.y, 0.0)
}
