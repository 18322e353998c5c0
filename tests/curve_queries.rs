//! Tests of the query interface and speed profile of a single curve.

use assert_approx_eq::assert_approx_eq;
use drive_path::cgmath::{Point3, Vector3};
use drive_path::vehicle::{max_turning_speed, MAX_THROTTLE_SPEED, MAX_VELOCITY};
use drive_path::{
    BallPrediction, ControlPoint, Curve, PathStatus, ProfileParams, VehicleState,
};
use rand::{Rng, SeedableRng};

fn straight(length: f64) -> Curve {
    Curve::new(vec![
        ControlPoint::new(Point3::new(0.0, 0.0, 17.0), Vector3::unit_x()),
        ControlPoint::new(Point3::new(length, 0.0, 17.0), Vector3::unit_x()),
    ])
}

fn random_curve(rng: &mut impl Rng) -> Curve {
    let n = rng.gen_range(2..5);
    let cps = (0..n)
        .map(|i| {
            let pos = Point3::new(
                1500.0 * i as f64,
                rng.gen_range(-1000.0..1000.0),
                17.0,
            );
            let angle: f64 = rng.gen_range(-1.2..1.2);
            ControlPoint::new(pos, Vector3::new(angle.cos(), angle.sin(), 0.0))
        })
        .collect();
    Curve::new(cps)
}

/// Test that the sample arrays line up and distances count down to zero.
#[test]
fn arrays_have_equal_lengths() {
    let mut rng = rand::rngs::StdRng::from_seed(*b"remaining distance is decreasing");
    for _ in 0..20 {
        let curve = random_curve(&mut rng);
        let n = curve.len();
        assert_eq!(curve.points().len(), n);
        assert_eq!(curve.tangents().len(), n);
        assert_eq!(curve.curvatures().len(), n);
        assert_eq!(curve.distances().len(), n);
        assert_eq!(curve.distances()[n - 1], 0.0);
        assert_eq!(curve.distances()[0], curve.length());
        assert!(curve.distances().windows(2).all(|w| w[0] >= w[1]));
    }
}

/// Test that distances are measured from the end of the curve.
#[test]
fn point_at_zero_is_the_end() {
    let curve = straight(2000.0);
    let end = curve.point_at(0.0);
    let start = curve.point_at(curve.length());
    assert_approx_eq!(end.x, 2000.0, 1e-9);
    assert_approx_eq!(start.x, 0.0, 1e-9);
    assert_approx_eq!(curve.tangent_at(1000.0).x, 1.0, 1e-9);
}

/// Test that a straight curve with matching boundary speeds is driven at that speed throughout.
#[test]
fn straight_line_at_uniform_speed() {
    for speed in [MAX_VELOCITY, MAX_THROTTLE_SPEED] {
        let mut curve = straight(2000.0);
        let time = curve.calculate_max_speeds(&ProfileParams {
            start_speed: speed,
            end_speed: Some(speed),
            boost: 0.0,
        });
        for i in 0..=20 {
            let s = curve.length() * i as f64 / 20.0;
            assert_approx_eq!(curve.max_speed_at(s), speed, 1e-6);
        }
        assert_approx_eq!(time, curve.length() / speed, 1e-6);
        assert_approx_eq!(curve.time_estimate(), time, 1e-12);
    }
}

/// Test that below the throttle ceiling a straight curve speeds up between its boundary speeds.
#[test]
fn straight_line_below_throttle_speed() {
    let speed = 1000.0;
    let mut curve = straight(2000.0);
    let time = curve.calculate_max_speeds(&ProfileParams {
        start_speed: speed,
        end_speed: Some(speed),
        boost: 0.0,
    });
    assert!(curve.max_speed_at(curve.length()) <= speed + 1e-9);
    assert!(curve.max_speed_at(0.0) <= speed + 1e-9);
    let middle = curve.max_speed_at(0.5 * curve.length());
    assert!(middle > speed && middle <= MAX_THROTTLE_SPEED + 1e-9);
    assert!(time < curve.length() / speed);
}

/// Test that tighter turns are never faster.
#[test]
fn cornering_speed_is_monotonic() {
    let mut last = f64::INFINITY;
    for i in 0..=1000 {
        let speed = max_turning_speed(i as f64 * 1e-5);
        assert!(speed <= last);
        last = speed;
    }
    assert_eq!(max_turning_speed(0.0), MAX_VELOCITY);
    assert_eq!(max_turning_speed(0.01), 0.0);
}

/// Test that the lazily computed profile is computed once and reused.
#[test]
fn max_speed_is_idempotent() {
    let mut rng = rand::rngs::StdRng::from_seed(*b"ask the same question two times!");
    let curve = random_curve(&mut rng);
    let s = 0.37 * curve.length();
    let first = curve.max_speed_at(s);
    assert_eq!(curve.max_speed_at(s), first);
    assert!(std::ptr::eq(curve.speed_profile(), curve.speed_profile()));
}

/// Test that the boundary speeds are respected.
#[test]
fn boundary_speeds_are_clamped() {
    let mut rng = rand::rngs::StdRng::from_seed(*b"clamp the start and the end speed");
    for _ in 0..10 {
        let mut curve = random_curve(&mut rng);
        let start_speed = rng.gen_range(0.0..2300.0);
        let end_speed = rng.gen_range(0.0..2300.0);
        curve.calculate_max_speeds(&ProfileParams {
            start_speed,
            end_speed: Some(end_speed),
            boost: rng.gen_range(0.0..100.0),
        });
        assert!(curve.max_speed_at(curve.length()) <= start_speed + 1e-9);
        assert!(curve.max_speed_at(0.0) <= end_speed + 1e-9);
        assert!(curve
            .speed_profile()
            .max_speeds()
            .iter()
            .all(|v| (0.0..=MAX_VELOCITY).contains(v)));
    }
}

/// Test that projecting a sample onto the curve recovers its distance.
#[test]
fn nearest_to_samples() {
    let mut rng = rand::rngs::StdRng::from_seed(*b"find the nearest point, any time");
    let curve = random_curve(&mut rng);
    for (point, distance) in curve.points().iter().zip(curve.distances()).step_by(7) {
        assert_approx_eq!(curve.find_nearest(*point), *distance, 1e-6);
    }
}

/// Test that asking for an impossible average speed fails fast.
#[test]
fn impossible_arrival_exceeds_speed() {
    let curve = straight(3000.0);
    let car = VehicleState::at_rest(Point3::new(0.0, 0.0, 17.0), Vector3::unit_x())
        .with_time(10.0);
    let status = curve.check_validity(&car, Some(11.0), &BallPrediction::empty());
    assert_eq!(status.status, PathStatus::SpeedExceeded);
    assert_approx_eq!(status.speed_needed, curve.length() / 1.0, 1e-9);
}
