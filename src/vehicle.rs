pub use self::acceleration::{drive_force_forward, steering_drag, DriveControls, SpeedController};
pub use self::dynamics::*;
pub use self::hitbox::{CarHitbox, SphereHitbox};
use crate::math::{Point3d, Vector3d, UP};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod acceleration;
mod dynamics;
mod hitbox;

/// Below this speed the vehicle's heading is used instead of its velocity direction.
const HEADING_SPEED_THRESHOLD: f64 = 100.0; // uu/s

/// A snapshot of the vehicle, passed explicitly into every planning and checking call.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleState {
    /// World position of the vehicle origin.
    pub position: Point3d,
    /// Velocity in uu/s.
    pub velocity: Vector3d,
    /// Unit vector along the vehicle's nose.
    pub forward: Vector3d,
    /// Unit vector out of the vehicle's roof.
    pub up: Vector3d,
    /// Boost charge, 0 to 100.
    pub boost: f64,
    /// Absolute game time in s.
    pub time: f64,
    /// The vehicle's bounding box.
    pub hitbox: CarHitbox,
}

impl VehicleState {
    /// Creates a vehicle at rest on flat ground, facing `forward`.
    pub fn at_rest(position: Point3d, forward: Vector3d) -> Self {
        Self {
            position,
            velocity: Vector3d::zero(),
            forward: forward.normalize(),
            up: UP,
            boost: 0.0,
            time: 0.0,
            hitbox: CarHitbox::default(),
        }
    }

    /// Sets the velocity to `speed` along the vehicle's heading.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.velocity = self.forward * speed;
        self
    }

    /// Sets the boost charge.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Sets the absolute game time.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// The component of the velocity along the vehicle's heading.
    pub fn forward_speed(&self) -> f64 {
        self.velocity.dot(self.forward)
    }

    /// The direction a path starting at this vehicle should leave in.
    pub fn path_start_tangent(&self) -> Vector3d {
        if self.velocity.magnitude() > HEADING_SPEED_THRESHOLD {
            self.velocity.normalize()
        } else {
            self.forward
        }
    }
}
