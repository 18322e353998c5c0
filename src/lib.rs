//! Spline path planning, speed profiling and ball-collision checking for a simulated car.
//!
//! The core type is the [Curve], a path sampled by arclength. Curves are built by the
//! [PathPlanner], profiled lazily for the fastest speed the car can drive at each point,
//! and checked against a [BallPrediction] by simulating the drive.

pub use cgmath;
pub use curve::{
    ControlPoint, Curve, ObstacleCollision, PathCheckStatus, PathStatus, ProfileParams,
    SpeedProfile,
};
#[cfg(feature = "debug")]
pub use debug::take_debug_frame;
pub use follow::{DriveCommand, FollowPath, RunState};
pub use obstacle::{BallPrediction, PredictionFrame};
pub use planner::{PathPlanner, PlanError, Pose, Strategy};
pub use util::Interval;
pub use vehicle::{DriveControls, SpeedController, VehicleState};

pub mod curve;
mod debug;
mod follow;
pub mod math;
pub mod obstacle;
pub mod planner;
mod util;
pub mod vehicle;
