//! Driving along a planned [Curve].

use crate::curve::Curve;
use crate::math::Point3d;
use crate::vehicle::{DriveControls, SpeedController, VehicleState};
use cgmath::prelude::*;

/// How far ahead of the vehicle to aim, in seconds of travel.
const LOOK_AHEAD_TIME: f64 = 0.3; // s

/// The slowest speed used to place the look-ahead point.
const MIN_LOOK_AHEAD_SPEED: f64 = 500.0; // uu/s

/// The maneuver is done once the vehicle is this close to the end of the curve.
const DONE_DISTANCE: f64 = 50.0; // uu

/// Steer per radian of heading error.
const STEER_GAIN: f64 = 3.0;

/// Whether a maneuver is still running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Done,
}

/// The output of one step of [FollowPath].
#[derive(Clone, Copy, Debug)]
pub struct DriveCommand {
    /// The point the vehicle should steer towards.
    pub target: Point3d,
    /// The speed the vehicle should be going.
    pub target_speed: f64,
    /// Controls that drive towards `target` at `target_speed`.
    /// Positive steer turns right.
    pub controls: DriveControls,
}

/// Follows a curve, optionally arriving at a given time.
///
/// The maneuver holds no mutable state, so a step can be previewed by
/// calling [FollowPath::step] with any substitute vehicle state.
#[derive(Clone, Debug)]
pub struct FollowPath {
    pub curve: Curve,
    /// The absolute time to arrive at the end of the curve, if any.
    pub arrival_time: Option<f64>,
    pub controller: SpeedController,
}

impl FollowPath {
    pub fn new(curve: Curve, arrival_time: Option<f64>) -> Self {
        Self {
            curve,
            arrival_time,
            controller: SpeedController::default(),
        }
    }

    /// Computes the drive command for the given vehicle state.
    pub fn step(&self, dt: f64, vehicle: &VehicleState) -> (DriveCommand, RunState) {
        let s = self.curve.find_nearest(vehicle.position);
        let speed = vehicle.forward_speed();

        let look_ahead = f64::max(speed, MIN_LOOK_AHEAD_SPEED) * LOOK_AHEAD_TIME;
        let target = self.curve.point_at(s - look_ahead);

        let max_speed = self.curve.max_speed_at(s);
        let target_speed = match self.arrival_time {
            Some(arrival) => {
                let remaining_time = f64::max(arrival - vehicle.time, dt);
                f64::min(s / remaining_time, max_speed)
            }
            None => max_speed,
        };

        let mut controls = self
            .controller
            .control(speed, target_speed, max_speed, 0.0);
        if vehicle.boost <= 0.0 {
            controls.boost = false;
        }

        let local = target - vehicle.position;
        let left = vehicle.up.cross(vehicle.forward);
        let heading_error = f64::atan2(local.dot(left), local.dot(vehicle.forward));
        controls.steer = (-STEER_GAIN * heading_error).clamp(-1.0, 1.0);

        let state = if s < DONE_DISTANCE {
            RunState::Done
        } else {
            RunState::Running
        };

        (
            DriveCommand {
                target,
                target_speed,
                controls,
            },
            state,
        )
    }
}
