use std::time::Instant;

use drive_path::cgmath::{Point3, Vector3};
use drive_path::{BallPrediction, PathPlanner, Pose, ProfileParams, Strategy, VehicleState};

fn main() {
    let car = VehicleState::at_rest(Point3::new(-2000.0, -3000.0, 17.0), Vector3::unit_y())
        .with_speed(1200.0)
        .with_boost(60.0);
    let ball = BallPrediction::extrapolate_linear(
        Point3::new(-1500.0, -1000.0, 300.0),
        Vector3::new(200.0, 100.0, 400.0),
        car.time,
        6.0,
        true,
    );
    let end = Pose::new(Point3::new(0.0, 0.0, 17.0), Vector3::new(1.0, 1.0, 0.0));
    let params = ProfileParams {
        start_speed: car.forward_speed(),
        end_speed: None,
        boost: car.boost,
    };

    println!("Planning...");
    let num_plans: u32 = 1000;
    for strategy in [Strategy::Simple, Strategy::ArcLineArc] {
        let start = Instant::now();
        let mut failures = 0;
        let mut length = 0.0;
        for _ in 0..num_plans {
            let mut planner = PathPlanner::from_vehicle(&car, 10.0, end).with_strategy(strategy);
            if strategy == Strategy::Simple {
                planner = planner.with_obstacle_avoidance(&car, None, &ball, false);
            }
            let planned = planner.plan();
            match planned {
                Ok(mut curve) => {
                    curve.calculate_max_speeds(&params);
                    let status = curve.check_validity(&car, None, &ball);
                    length = curve.length();
                    if !status.is_valid() {
                        failures += 1;
                    }
                }
                Err(_) => failures += 1,
            }
        }
        let per_plan = start.elapsed() / num_plans;
        println!(
            "{:?}: avg. plan {:?} ({:.0} uu path, {} of {} invalid)",
            strategy, per_plan, length, failures, num_plans
        );
    }
}
