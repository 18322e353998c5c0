use super::dynamics::*;
use crate::math::{lerp, remap_clamped};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coefficient of the drag caused by steering, per unit of steer and speed.
const STEERING_DRAG: f64 = -0.0719; // 1/s

/// Throttle magnitudes below this are treated as coasting.
const THROTTLE_DEADZONE: f64 = 0.05;

/// The ground controls of the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriveControls {
    /// Throttle in `[-1, 1]`, negative values brake or reverse.
    pub throttle: f64,
    /// Steer in `[-1, 1]`.
    pub steer: f64,
    /// Whether boost is held.
    pub boost: bool,
}

/// The speed control policy shared by the speed profile, the path checker and the path follower.
///
/// Given the current speed and a band of acceptable speeds it picks throttle and boost
/// the way a driver reacting within `reaction_time` would.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedController {
    /// How quickly the controller aims to reach the speed band, in s.
    pub reaction_time: f64,
    /// Whether boost may be used to accelerate.
    pub allow_boost: bool,
}

impl Default for SpeedController {
    fn default() -> Self {
        Self {
            reaction_time: 0.04,
            allow_boost: true,
        }
    }
}

impl SpeedController {
    /// Chooses controls to keep the speed within `[min_speed, max_speed]`.
    ///
    /// # Arguments
    /// * `speed` - The current forward speed (uu/s).
    /// * `min_speed` - The slowest acceptable speed (uu/s).
    /// * `max_speed` - The fastest acceptable speed (uu/s).
    /// * `additional_accel` - Acceleration already acting on the vehicle, such as gravity (uu/s^2).
    pub fn control(
        &self,
        speed: f64,
        min_speed: f64,
        max_speed: f64,
        additional_accel: f64,
    ) -> DriveControls {
        let max_speed = max_speed.min(MAX_VELOCITY);
        let min_speed = min_speed.min(max_speed);

        let min_acc = (min_speed - speed) / self.reaction_time - additional_accel;
        let max_acc = (max_speed - speed) / self.reaction_time - additional_accel;

        let throttle_acc = throttle_acceleration(speed);

        let brake_coast = lerp(-BRAKE_ACCELERATION, -COASTING_ACCELERATION, 0.7);
        let coast_throttle = -0.5 * COASTING_ACCELERATION;
        let throttle_boost = throttle_acc + 0.45 * BOOST_ACCELERATION;

        let (throttle, boost) = if max_acc <= brake_coast {
            (-1.0, false)
        } else if max_acc < coast_throttle {
            (0.0, false)
        } else if min_acc <= throttle_boost {
            let throttle = if throttle_acc > 0.0 {
                remap_clamped(min_acc / throttle_acc, 0.0, 1.0, 0.015, 1.0)
            } else {
                1.0
            };
            (throttle, false)
        } else {
            (1.0, self.allow_boost)
        };

        DriveControls {
            throttle,
            steer: 0.0,
            boost,
        }
    }
}

/// The forward acceleration produced by the given controls at the given forward speed.
pub fn drive_force_forward(controls: &DriveControls, speed: f64) -> f64 {
    let dir = if speed < 0.0 { -1.0 } else { 1.0 };
    if controls.boost {
        return throttle_acceleration(speed) + BOOST_ACCELERATION;
    }
    if controls.throttle * dir <= -0.001 && speed.abs() > MIN_SPEED {
        -BRAKE_ACCELERATION * dir
    } else if controls.throttle.abs() < THROTTLE_DEADZONE {
        -COASTING_ACCELERATION * dir
    } else {
        controls.throttle * throttle_acceleration(speed)
    }
}

/// The deceleration caused by turning along a path of the given curvature.
pub fn steering_drag(curvature: f64, speed: f64) -> f64 {
    let steer = f64::min(1.0, curvature.abs() / max_turning_curvature(speed));
    STEERING_DRAG * steer * speed
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn controller_bands() {
        let ctrl = SpeedController::default();

        // Far too fast: brake.
        let c = ctrl.control(2000.0, 0.0, 1000.0, 0.0);
        assert_eq!(c.throttle, -1.0);
        assert!(!c.boost);

        // Slightly too fast: coast.
        let c = ctrl.control(1020.0, 0.0, 1000.0, 0.0);
        assert_eq!(c.throttle, 0.0);

        // Holding speed: a sliver of throttle.
        let c = ctrl.control(1000.0, 1000.0, 1000.0, 0.0);
        assert_approx_eq!(c.throttle, 0.015);
        assert!(!c.boost);

        // Far too slow: full throttle and boost.
        let c = ctrl.control(500.0, 2300.0, 2300.0, 0.0);
        assert_eq!(c.throttle, 1.0);
        assert!(c.boost);

        let no_boost = SpeedController {
            allow_boost: false,
            ..ctrl
        };
        assert!(!no_boost.control(500.0, 2300.0, 2300.0, 0.0).boost);
    }

    #[test]
    fn forward_force_modes() {
        let boost = DriveControls {
            throttle: 1.0,
            steer: 0.0,
            boost: true,
        };
        assert_approx_eq!(drive_force_forward(&boost, 1500.0), BOOST_ACCELERATION);

        let brake = DriveControls {
            throttle: -1.0,
            ..Default::default()
        };
        assert_eq!(drive_force_forward(&brake, 1000.0), -BRAKE_ACCELERATION);
        // Too slow to brake, so it reverses with throttle.
        assert_approx_eq!(drive_force_forward(&brake, 5.0), -throttle_acceleration(5.0));

        let coast = DriveControls::default();
        assert_eq!(drive_force_forward(&coast, 1000.0), -COASTING_ACCELERATION);
        assert_eq!(drive_force_forward(&coast, -1000.0), COASTING_ACCELERATION);

        let half = DriveControls {
            throttle: 0.5,
            ..Default::default()
        };
        assert_approx_eq!(drive_force_forward(&half, 0.0), 800.0);
    }

    #[test]
    fn steering_drag_saturates() {
        assert_eq!(steering_drag(0.0, 1000.0), 0.0);
        let tight = steering_drag(1.0, 1000.0);
        assert_approx_eq!(tight, STEERING_DRAG * 1000.0);
        let half = steering_drag(0.5 * max_turning_curvature(1000.0), 1000.0);
        assert_approx_eq!(half, 0.5 * tight);
    }
}
