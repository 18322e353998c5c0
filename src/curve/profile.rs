use super::Curve;
use crate::math::{normalize_or, Vector3d};
use crate::vehicle::{
    drive_force_forward, max_turning_speed, steering_drag, throttle_acceleration, DriveControls,
    SpeedController, BOOST_ACCELERATION, BOOST_CONSUMPTION, BRAKE_ACCELERATION, GRAVITY, MAX_VELOCITY,
    MIN_BOOST_TIME, MIN_SPEED,
};
use cgmath::prelude::*;
use once_cell::sync::OnceCell;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integration step of the throttle and braking passes.
const COARSE_DT: f64 = 1.0 / 60.0; // s

/// Integration step of the boost refinement pass.
const FINE_DT: f64 = 1.0 / 120.0; // s

const MAX_THROTTLE_STEPS: usize = 50;
const MAX_BRAKE_STEPS: usize = 100;
const MAX_REFINE_STEPS: usize = 4000;

/// Curvatures are inflated by this factor before looking up a cornering speed.
const CURVATURE_MARGIN: f64 = 1.1;

/// Boundary conditions for the speed profile.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileParams {
    /// The fastest the vehicle may be going at the start, in uu/s.
    pub start_speed: f64,
    /// The fastest the vehicle may be going at the end, if constrained.
    pub end_speed: Option<f64>,
    /// The boost charge available.
    pub boost: f64,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            start_speed: MAX_VELOCITY,
            end_speed: None,
            boost: 0.0,
        }
    }
}

/// The maximum achievable speed at each sample of a [Curve].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedProfile {
    max_speeds: Vec<f64>,
    time: f64,
    min_speed: f64,
}

impl SpeedProfile {
    /// The maximum speed at each sample, in uu/s.
    pub fn max_speeds(&self) -> &[f64] {
        &self.max_speeds
    }

    /// The estimated time to drive the curve at its maximum speeds, in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The lowest maximum speed anywhere inside the curve.
    pub fn min_speed(&self) -> f64 {
        self.min_speed
    }
}

impl Curve {
    /// The speed profile, computed with [ProfileParams::default] if not yet calculated.
    pub fn speed_profile(&self) -> &SpeedProfile {
        self.profile
            .get_or_init(|| self.solve_profile(&ProfileParams::default()))
    }

    /// Recomputes the speed profile with the given boundary conditions.
    /// Returns the estimated traversal time.
    pub fn calculate_max_speeds(&mut self, params: &ProfileParams) -> f64 {
        let profile = self.solve_profile(params);
        let time = profile.time;
        self.profile = OnceCell::with_value(profile);
        time
    }

    /// The lowest maximum speed inside the curve, useful for spotting turns too tight to drive.
    pub fn minimum_speed(&self) -> f64 {
        self.speed_profile().min_speed()
    }

    /// The estimated time to drive the curve.
    pub fn time_estimate(&self) -> f64 {
        self.speed_profile().time()
    }

    /// Solves for the maximum speeds along the curve.
    pub(crate) fn solve_profile(&self, params: &ProfileParams) -> SpeedProfile {
        let n = self.curvatures.len();
        let last = n - 1;

        // Cornering limit
        let mut max_speeds = (0..n)
            .map(|i| {
                let k = |j: usize| self.curvatures[j].abs();
                let smoothed =
                    0.25 * k(i.saturating_sub(1)) + 0.5 * k(i) + 0.25 * k(usize::min(i + 1, last));
                max_turning_speed(CURVATURE_MARGIN * smoothed)
            })
            .collect::<Vec<_>>();
        max_speeds[0] = f64::min(max_speeds[0], params.start_speed);
        max_speeds[last] = f64::min(max_speeds[last], params.end_speed.unwrap_or(MAX_VELOCITY));

        self.throttle_pass(&mut max_speeds, 0, params.boost);
        self.brake_pass(&mut max_speeds);

        if params.boost > 0.0 {
            self.refine_boost(&mut max_speeds, params.boost);
            self.brake_pass(&mut max_speeds);
        }

        let time = self
            .distances
            .windows(2)
            .zip(max_speeds.windows(2))
            .map(|(d, v)| (d[0] - d[1]) / f64::max(0.5 * (v[0] + v[1]), MIN_SPEED))
            .sum::<f64>();

        let interior = if n > 2 {
            &max_speeds[1..last]
        } else {
            &max_speeds[..]
        };
        let min_speed = interior.iter().copied().fold(f64::INFINITY, f64::min);

        log::trace!(
            "speed profile: {} samples, {:.3}s, min speed {:.0}",
            n,
            time,
            min_speed
        );

        SpeedProfile {
            max_speeds,
            time,
            min_speed,
        }
    }

    /// The averaged tangent of the segment between samples `i` and `j`.
    fn segment_tangent(&self, i: usize, j: usize) -> Vector3d {
        normalize_or(self.tangents[i] + self.tangents[j], self.tangents[j])
    }

    /// Limits speeds to what can be reached by accelerating forward from sample `from`.
    fn throttle_pass(&self, max_speeds: &mut [f64], from: usize, boost: f64) {
        let mut boost = boost;
        for i in from + 1..max_speeds.len() {
            let ds = self.distances[i - 1] - self.distances[i];
            let gravity = GRAVITY.dot(self.segment_tangent(i - 1, i));
            let (reachable, time) = accelerate(max_speeds[i - 1], ds, gravity, boost > 0.0);
            if boost > 0.0 {
                boost -= BOOST_CONSUMPTION * time;
            }
            max_speeds[i] = f64::min(max_speeds[i], reachable);
        }
    }

    /// Limits speeds to those from which the vehicle can brake in time for later samples.
    fn brake_pass(&self, max_speeds: &mut [f64]) {
        for i in (0..max_speeds.len() - 1).rev() {
            let ds = self.distances[i] - self.distances[i + 1];
            if ds <= 0.0 {
                continue;
            }
            let decel = BRAKE_ACCELERATION - GRAVITY.dot(self.segment_tangent(i, i + 1));
            let reachable = decelerate(max_speeds[i + 1], ds, decel);
            max_speeds[i] = f64::min(max_speeds[i], reachable);
        }
    }

    /// Drives the curve with the shared speed policy while boost lasts, lowering any
    /// speeds the policy can't actually reach. Once boost runs out the rest of the
    /// curve is limited to throttle alone.
    fn refine_boost(&self, max_speeds: &mut [f64], boost: f64) {
        let controller = SpeedController::default();
        let last = max_speeds.len() - 1;

        let mut boost = boost;
        let mut hold = BoostHold::default();
        let mut speed = max_speeds[0];
        let mut s = self.length;
        let mut i = 0;

        for _ in 0..MAX_REFINE_STEPS {
            if i >= last || boost <= 0.0 {
                break;
            }

            let gap = self.distances[i] - self.distances[i + 1];
            let u = if gap > 0.0 {
                (s - self.distances[i + 1]) / gap
            } else {
                0.0
            };
            let target = max_speeds[i + 1] + (max_speeds[i] - max_speeds[i + 1]) * u;
            let gravity = GRAVITY.dot(self.segment_tangent(i, i + 1));
            let drag = steering_drag(self.curvatures[i], speed);

            let mut controls = controller.control(speed, target, target, gravity + drag);
            hold.apply(&mut controls, FINE_DT);
            if controls.boost {
                boost -= BOOST_CONSUMPTION * FINE_DT;
            }

            let acc = drive_force_forward(&controls, speed) + gravity + drag;
            speed = (speed + acc * FINE_DT).clamp(0.0, MAX_VELOCITY);
            s -= speed * FINE_DT;

            while i < last && self.distances[i + 1] >= s {
                i += 1;
                max_speeds[i] = f64::min(max_speeds[i], speed);
            }
        }

        if boost <= 0.0 && i < last {
            self.throttle_pass(max_speeds, i, 0.0);
        }
    }
}

/// Keeps boost pressed for at least [MIN_BOOST_TIME] once it's been pressed.
#[derive(Clone, Copy, Debug, Default)]
struct BoostHold {
    remaining: f64,
}

impl BoostHold {
    fn apply(&mut self, controls: &mut DriveControls, dt: f64) {
        if self.remaining > 0.0 {
            controls.throttle = 1.0;
            controls.boost = true;
        } else if controls.boost {
            self.remaining = MIN_BOOST_TIME;
        }
        if controls.boost {
            self.remaining -= dt;
        }
    }
}

/// Accelerates at full throttle from `speed` over `distance`, adding boost if `boost` is set.
/// Returns the speed reached and the time it took.
fn accelerate(speed: f64, distance: f64, additional: f64, boost: bool) -> (f64, f64) {
    let boost_acc = if boost { BOOST_ACCELERATION } else { 0.0 };
    let mut v = speed;
    let mut travelled = 0.0;
    let mut time = 0.0;
    for _ in 0..MAX_THROTTLE_STEPS {
        let dv = (throttle_acceleration(v) + boost_acc + additional) * COARSE_DT;
        let ds = (v + 0.5 * dv) * COARSE_DT;
        v += dv;
        travelled += ds;
        time += COARSE_DT;
        if travelled > distance {
            v -= (travelled - distance) * (dv / ds);
            break;
        }
    }
    (v.clamp(0.0, MAX_VELOCITY), time)
}

/// The fastest speed from which braking at `decel` over `distance` slows to `speed`.
fn decelerate(speed: f64, distance: f64, decel: f64) -> f64 {
    let dv = decel * COARSE_DT;
    let mut v = speed;
    let mut travelled = 0.0;
    for _ in 0..MAX_BRAKE_STEPS {
        let ds = (v + 0.5 * dv) * COARSE_DT;
        v += dv;
        travelled += ds;
        if travelled > distance {
            v -= (travelled - distance) * (dv / ds);
            break;
        }
    }
    v.clamp(0.0, MAX_VELOCITY)
}
