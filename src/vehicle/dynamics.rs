use crate::math::{remap, PiecewiseLinear, Vector3d};

/// The top speed of the vehicle.
pub const MAX_VELOCITY: f64 = 2300.0; // uu/s

/// The speed above which throttle alone no longer accelerates the vehicle.
pub const MAX_THROTTLE_SPEED: f64 = 1410.0; // uu/s

/// The acceleration added by holding boost.
pub const BOOST_ACCELERATION: f64 = 991.667; // uu/s^2

/// The magnitude of the braking deceleration.
pub const BRAKE_ACCELERATION: f64 = 3500.0; // uu/s^2

/// The magnitude of the coasting deceleration.
pub const COASTING_ACCELERATION: f64 = 525.0; // uu/s^2

/// Boost consumed per second while boosting.
pub const BOOST_CONSUMPTION: f64 = 33.3; // units/s

/// The shortest time boost can be held for once pressed.
pub const MIN_BOOST_TIME: f64 = 0.1; // s

/// Below this speed the vehicle is considered stationary.
pub const MIN_SPEED: f64 = 10.0; // uu/s

/// Radius of the ball.
pub const BALL_RADIUS: f64 = 92.75; // uu

/// Gravity.
pub const GRAVITY: Vector3d = Vector3d::new(0.0, 0.0, -650.0); // uu/s^2

/// Maps path curvature to the fastest speed the vehicle can hold through it.
const TURNING_SPEED: PiecewiseLinear<6> = PiecewiseLinear::new([
    (0.00088, 2300.0),
    (0.00110, 1750.0),
    (0.00138, 1500.0),
    (0.00235, 1000.0),
    (0.00398, 500.0),
    (0.00690, 0.0),
]);

/// Maps speed to the tightest curvature the vehicle can turn at.
const TURNING_CURVATURE: PiecewiseLinear<6> = PiecewiseLinear::new([
    (0.0, 0.00690),
    (500.0, 0.00398),
    (1000.0, 0.00235),
    (1500.0, 0.00138),
    (1750.0, 0.00110),
    (2300.0, 0.00088),
]);

/// The maximum speed at which the vehicle can follow a path of the given curvature.
pub fn max_turning_speed(curvature: f64) -> f64 {
    TURNING_SPEED.sample(curvature.abs())
}

/// The maximum curvature the vehicle can turn at, at the given speed.
pub fn max_turning_curvature(speed: f64) -> f64 {
    TURNING_CURVATURE.sample(speed.abs())
}

/// The acceleration available from full throttle at the given speed.
pub fn throttle_acceleration(speed: f64) -> f64 {
    let speed = speed.abs();
    if speed >= MAX_THROTTLE_SPEED {
        0.0
    } else if speed >= 1400.0 {
        remap(speed, 1400.0, MAX_THROTTLE_SPEED, 160.0, 0.0)
    } else {
        remap(speed, 0.0, 1400.0, 1600.0, 160.0)
    }
}
