use super::ObstacleAvoider;
use crate::curve::{ControlPoint, Curve};
use crate::math::{normalize_or, Point3d, UP};
use crate::obstacle::BallPrediction;
use crate::vehicle::VehicleState;
use cgmath::prelude::*;

/// How far past the obstacle's radius each detour pushes the path.
const DETOUR_SCALE: f64 = 1.2;

/// Pushes a detour control point away from the obstacle until the path is clear.
///
/// Each iteration places a detour right after the first control point, beside the
/// point of contact on the far side from the obstacle, a little further out each
/// time. Every other control point is kept, and the one after the detour is re-aimed
/// so the curve still passes through it coming from the detour.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetourAvoider;

impl ObstacleAvoider for DetourAvoider {
    fn avoid(
        &self,
        curve: &Curve,
        vehicle: &VehicleState,
        arrival_time: Option<f64>,
        prediction: &BallPrediction,
        max_iterations: usize,
    ) -> Option<Curve> {
        let status = curve.check_validity(vehicle, arrival_time, prediction);
        if !status.is_valid() {
            log::trace!("path to avoid is infeasible: {:?}", status.status);
            return None;
        }
        let mut collision = match status.collision {
            Some(collision) => collision,
            None => return Some(curve.clone()),
        };

        let cps = curve.control_points();
        let height = cps[0].position.z;

        for i in 0..max_iterations {
            let contact = Point3d::new(collision.contact_point.x, collision.contact_point.y, height);
            let s = curve.find_nearest(contact);
            let on_path = curve.point_at(s);
            let tangent = curve.tangent_at(s);

            // Direction from the path towards the obstacle, across the path
            let mut away = contact - on_path;
            away -= tangent * away.dot(tangent);
            away.z = 0.0;
            let across = normalize_or(away, normalize_or(UP.cross(tangent), UP));

            let push = -DETOUR_SCALE * prediction.radius() * push_factor(i);
            let mut detour = on_path + across * push;
            detour.z = height;

            let candidate = Curve::with_subdivisions(with_detour(cps, detour), curve.subdivisions());
            let status = candidate.check_validity(vehicle, arrival_time, prediction);
            log::trace!(
                "detour {} at ({:.0}, {:.0}): {:?}, collided: {}",
                i,
                detour.x,
                detour.y,
                status.status,
                status.collided()
            );
            match status.collision {
                None if status.is_valid() => return Some(candidate),
                Some(next) => collision = next,
                None => {}
            }
        }

        None
    }
}

/// How many detour widths the `i`th attempt pushes out, growing by half each time.
fn push_factor(i: usize) -> f64 {
    i as f64 / 2.0 + 1.0
}

/// Inserts `detour` after the first of `cps`, keeping the rest.
fn with_detour(cps: &[ControlPoint], detour: Point3d) -> Vec<ControlPoint> {
    let first = cps[0];
    let tangent = normalize_or(detour - first.position, first.tangent);
    let mut out = Vec::with_capacity(cps.len() + 1);
    out.push(first);
    out.push(ControlPoint::with_normal(detour, tangent, first.normal));
    out.extend_from_slice(&cps[1..]);
    out[2].tangent = normalize_or(out[2].position - detour, out[2].tangent);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Vector3d;
    use crate::vehicle::BALL_RADIUS;

    fn straight() -> (Curve, VehicleState) {
        let curve = Curve::new(vec![
            ControlPoint::new(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_y()),
            ControlPoint::new(Point3d::new(0.0, 2000.0, 17.0), Vector3d::unit_y()),
        ]);
        let car = VehicleState::at_rest(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_y())
            .with_speed(1400.0);
        (curve, car)
    }

    #[test]
    fn clear_path_is_unchanged() {
        let (curve, car) = straight();
        let avoided = DetourAvoider
            .avoid(&curve, &car, None, &BallPrediction::empty(), 7)
            .unwrap();
        assert_eq!(avoided.points(), curve.points());
    }

    #[test]
    fn infeasible_path_is_rejected() {
        let (curve, car) = straight();
        let avoided = DetourAvoider.avoid(&curve, &car, Some(0.1), &BallPrediction::empty(), 7);
        assert!(avoided.is_none());
    }

    #[test]
    fn detour_is_collision_free() {
        let (curve, car) = straight();
        let ball = BallPrediction::extrapolate_linear(
            Point3d::new(0.0, 1000.0, BALL_RADIUS),
            Vector3d::zero(),
            car.time,
            4.0,
            false,
        );
        let arrival = Some(car.time + 2.5);
        assert!(curve.check_validity(&car, arrival, &ball).collided());

        let avoided = DetourAvoider.avoid(&curve, &car, arrival, &ball, 7).unwrap();
        let status = avoided.check_validity(&car, arrival, &ball);
        assert!(status.is_valid());
        assert!(!status.collided());
        assert_eq!(avoided.control_points().len(), 3);
        assert!(avoided.control_points()[1].position.x.abs() > BALL_RADIUS);

        assert!(DetourAvoider.avoid(&curve, &car, arrival, &ball, 0).is_none());
    }

    #[test]
    fn pushes_grow_every_attempt() {
        let pushes: Vec<f64> = (0..5).map(push_factor).collect();
        assert_eq!(pushes, [1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn detour_keeps_every_waypoint() {
        let cps = [
            ControlPoint::new(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_y()),
            ControlPoint::new(Point3d::new(300.0, 1500.0, 17.0), Vector3d::unit_y()),
            ControlPoint::new(Point3d::new(0.0, 3000.0, 17.0), Vector3d::unit_y()),
        ];
        let detour = Point3d::new(-200.0, 800.0, 17.0);
        let out = with_detour(&cps, detour);

        assert_eq!(out.len(), 4);
        assert_eq!(out[0], cps[0]);
        assert_eq!(out[1].position, detour);
        assert_eq!(out[2].position, cps[1].position);
        assert_eq!(out[3], cps[2]);

        // The waypoint after the detour is approached from the detour
        let expected = (cps[1].position - detour).normalize();
        assert!(out[2].tangent.dot(expected) > 1.0 - 1e-9);
    }
}
