use super::Curve;
use crate::math::Point3d;
use crate::obstacle::BallPrediction;
use crate::vehicle::{
    drive_force_forward, SpeedController, VehicleState, BOOST_CONSUMPTION, MAX_THROTTLE_SPEED,
    MAX_VELOCITY,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Simulation step of the checker.
const CHECK_DT: f64 = 1.0 / 60.0; // s

/// The longest stretch of time the checker will simulate.
const MAX_CHECK_STEPS: usize = 600;

/// Average speeds above the vehicle's top speed by more than these margins are infeasible.
const AVERAGE_SPEED_MARGIN: f64 = 25.0; // uu/s
const REMAINING_SPEED_MARGIN: f64 = 50.0; // uu/s

/// Simulated arrivals within this distance of the end count as on time.
const ARRIVAL_TOLERANCE: f64 = 150.0; // uu

/// The vehicle's bounding sphere is enlarged by this factor for obstacle checks.
const HITBOX_SCALE: f64 = 1.1;

/// Speeds below this are never used as the checker's lower speed target.
const MIN_CHECK_SPEED: f64 = 50.0; // uu/s

/// The outcome of checking a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathStatus {
    /// The path can be driven to arrive on time.
    Valid,
    /// The path can't be driven fast enough to arrive on time.
    SpeedExceeded,
    /// The path hasn't been checked.
    #[default]
    Unknown,
}

/// Where a simulated drive along a path first touches the obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleCollision {
    /// The remaining distance along the path at the moment of contact.
    pub distance: f64,
    /// The point on the vehicle's bounding sphere nearest the obstacle.
    pub contact_point: Point3d,
    /// The obstacle's centre at the moment of contact.
    pub obstacle_position: Point3d,
}

/// The result of [Curve::check_validity].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathCheckStatus {
    pub status: PathStatus,
    /// The first collision with the obstacle, if there was one.
    pub collision: Option<ObstacleCollision>,
    /// The speed the path requires, or the speed reached when the simulation ended.
    pub speed_needed: f64,
}

impl PathCheckStatus {
    fn speed_exceeded(speed_needed: f64) -> Self {
        Self {
            status: PathStatus::SpeedExceeded,
            collision: None,
            speed_needed,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == PathStatus::Valid
    }

    pub fn collided(&self) -> bool {
        self.collision.is_some()
    }
}

impl Curve {
    /// Simulates driving the curve to arrive at `arrival_time`, checking for collisions
    /// with the predicted obstacle along the way.
    ///
    /// # Parameters
    /// * `vehicle` - The vehicle that will drive the curve
    /// * `arrival_time` - The absolute time to arrive at the end, or `None` to arrive
    ///   as though driving at full throttle speed
    /// * `prediction` - The obstacle's predicted trajectory, possibly empty
    pub fn check_validity(
        &self,
        vehicle: &VehicleState,
        arrival_time: Option<f64>,
        prediction: &BallPrediction,
    ) -> PathCheckStatus {
        let arrival_time =
            arrival_time.unwrap_or(vehicle.time + self.length / MAX_THROTTLE_SPEED);
        let relative_arrival = arrival_time - vehicle.time;
        let average_speed = self.length / f64::max(relative_arrival, CHECK_DT);

        if average_speed > MAX_VELOCITY + AVERAGE_SPEED_MARGIN {
            return PathCheckStatus::speed_exceeded(average_speed);
        }

        let controller = SpeedController::default();
        let car_box = vehicle.hitbox.as_sphere(HITBOX_SCALE);
        let mut speed = vehicle.forward_speed();
        let start_remaining = self.find_nearest(vehicle.position);
        let mut remaining = start_remaining;
        let mut boost = vehicle.boost;
        let mut collision = None;

        let needed_steps = (relative_arrival / CHECK_DT).ceil().max(0.0) as usize;
        let steps = usize::min(needed_steps, MAX_CHECK_STEPS);
        for step in 0..steps {
            let t = step as f64 * CHECK_DT;
            let max_speed = f64::max(MIN_CHECK_SPEED, self.max_speed_at(remaining));
            let speed_ahead = remaining / f64::max(relative_arrival - t, CHECK_DT);

            if speed_ahead > MAX_VELOCITY + REMAINING_SPEED_MARGIN {
                return PathCheckStatus::speed_exceeded(speed_ahead);
            }

            // Contacts right at the start are meaningless, the vehicle is already committed
            let guard = f64::max(speed, 500.0) * 0.2 + 50.0;
            if collision.is_none() && remaining > guard {
                let frame = prediction
                    .frame_at_absolute_time(vehicle.time + t)
                    .filter(|f| f.time <= vehicle.time + t + prediction.tick_interval());
                if let Some(frame) = frame {
                    let car_pos = self.point_at(remaining);
                    if car_box.collides_with(car_pos, prediction.radius(), frame.position) {
                        log::trace!("obstacle contact at t={:.3} s={:.0}", t, remaining);
                        collision = Some(ObstacleCollision {
                            distance: remaining,
                            contact_point: car_box.closest_point(car_pos, frame.position),
                            obstacle_position: frame.position,
                        });
                    }
                }
            }

            let mut controls =
                controller.control(speed, f64::min(max_speed, speed_ahead), max_speed, 0.0);
            if boost <= 0.0 {
                controls.boost = false;
            } else if controls.boost {
                boost -= BOOST_CONSUMPTION * CHECK_DT;
            }
            speed += drive_force_forward(&controls, speed) * CHECK_DT;
            speed = f64::min(speed.abs(), MAX_VELOCITY);
            remaining -= speed * CHECK_DT;
        }

        let on_time = if steps < needed_steps {
            // The horizon was cut short, so compare against where the schedule says we should be
            let elapsed = steps as f64 * CHECK_DT;
            let scheduled = start_remaining * (1.0 - elapsed / relative_arrival);
            log::trace!(
                "check stopped after {:.1}s with {:.0} left, {:.0} scheduled",
                elapsed,
                remaining,
                scheduled
            );
            remaining < scheduled + ARRIVAL_TOLERANCE
        } else {
            remaining.abs() < ARRIVAL_TOLERANCE
        };
        let status = if on_time {
            PathStatus::Valid
        } else {
            PathStatus::SpeedExceeded
        };

        PathCheckStatus {
            status,
            collision,
            speed_needed: speed,
        }
    }
}
