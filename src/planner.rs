//! Building a [Curve] between two poses.

pub use self::arc_line_arc::ArcLineArc;
pub use self::avoid::DetourAvoider;
pub use self::graph::{WaypointGraph, WaypointId};
use crate::curve::{ControlPoint, Curve, DEFAULT_SUBDIVISIONS};
use crate::debug::{debug_curve, debug_point};
use crate::math::{normalize_or, Point3d, Vector3d};
use crate::obstacle::BallPrediction;
use crate::vehicle::{max_turning_curvature, VehicleState};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

mod arc_line_arc;
mod avoid;
mod graph;

/// Start offsets must be below this.
const MAX_START_OFFSET: f64 = 50.0; // uu

/// Route nodes this close to either end are dropped by the router.
const ROUTER_OFFSET: f64 = 20.0; // uu

/// The default arc-line-arc radius is the tightest turn at no less than this speed.
const MIN_DEFAULT_TURN_SPEED: f64 = 500.0; // uu/s

/// The default number of detour attempts made by the obstacle avoider.
pub const DEFAULT_MAX_DETOUR_ITERATIONS: usize = 7;

/// A position and direction of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub position: Point3d,
    /// Unit vector giving the direction of travel.
    pub tangent: Vector3d,
}

impl Pose {
    pub fn new(position: Point3d, tangent: Vector3d) -> Self {
        Self {
            position,
            tangent: normalize_or(tangent, Vector3d::unit_x()),
        }
    }

    fn control_point(&self) -> ControlPoint {
        ControlPoint::new(self.position, self.tangent)
    }
}

/// How the planner constructs the curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// A direct fit through the start, any waypoints and the end.
    #[default]
    Simple,
    /// A route found by the configured [Router].
    GraphRouted,
    /// Two circular arcs joined by a straight line.
    ArcLineArc,
}

/// Why a plan could not be made.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("the router found no route between the poses")]
    NoRoute,
    #[error("the router returned a zero-length route")]
    DegenerateRoute,
    #[error("no arc-line-arc path joins the poses")]
    NoArcLineArc,
    #[error("no collision-free path around the obstacle was found")]
    AvoidanceFailed,
}

/// Finds a curve between two poses through a discrete network.
pub trait Router {
    /// Returns a curve from `start` to `end`, or `None` if there is no route.
    ///
    /// Network nodes within `offset` of either pose are skipped.
    fn route(&self, start: &Pose, end: &Pose, offset: f64, subdivisions: usize) -> Option<Curve>;
}

/// Reshapes a curve so that driving it doesn't hit an obstacle.
pub trait ObstacleAvoider {
    /// Returns a valid, collision-free replacement for `curve`, or `None`.
    fn avoid(
        &self,
        curve: &Curve,
        vehicle: &VehicleState,
        arrival_time: Option<f64>,
        prediction: &BallPrediction,
        max_iterations: usize,
    ) -> Option<Curve>;
}

/// Obstacle avoidance settings of a [PathPlanner].
struct Avoidance<'a> {
    vehicle: VehicleState,
    arrival_time: Option<f64>,
    prediction: &'a BallPrediction,
    required: bool,
}

/// Builds a curve from a start pose to an end pose.
///
/// ```
/// use drive_path::cgmath::{Point3, Vector3};
/// use drive_path::planner::{PathPlanner, Pose};
///
/// let start = Pose::new(Point3::new(0.0, 0.0, 17.0), Vector3::unit_x());
/// let end = Pose::new(Point3::new(0.0, 1000.0, 17.0), Vector3::unit_y());
/// let curve = PathPlanner::new(start, end).plan().unwrap();
/// assert!(curve.length() >= 1000.0);
/// ```
pub struct PathPlanner<'a> {
    start: Pose,
    end: Pose,
    waypoints: SmallVec<[ControlPoint; 4]>,
    strategy: Strategy,
    subdivisions: usize,
    turn_radii: Option<(f64, f64)>,
    start_speed: f64,
    router: Option<&'a dyn Router>,
    avoidance: Option<Avoidance<'a>>,
    avoider: &'a dyn ObstacleAvoider,
    max_detour_iterations: usize,
}

impl<'a> PathPlanner<'a> {
    /// Creates a planner between two poses.
    pub fn new(start: Pose, end: Pose) -> Self {
        Self {
            start,
            end,
            waypoints: SmallVec::new(),
            strategy: Strategy::Simple,
            subdivisions: DEFAULT_SUBDIVISIONS,
            turn_radii: None,
            start_speed: 0.0,
            router: None,
            avoidance: None,
            avoider: &DetourAvoider,
            max_detour_iterations: DEFAULT_MAX_DETOUR_ITERATIONS,
        }
    }

    /// Creates a planner starting from the vehicle, moved `offset` along its direction of travel.
    ///
    /// # Panics
    /// If `offset` is not in `[0, 50)`.
    pub fn from_vehicle(vehicle: &VehicleState, offset: f64, end: Pose) -> Self {
        assert!(
            (0.0..MAX_START_OFFSET).contains(&offset),
            "start offset must be in [0, {}), got {}",
            MAX_START_OFFSET,
            offset
        );
        let tangent = vehicle.path_start_tangent();
        let start = Pose::new(vehicle.position + tangent * offset, tangent);
        let mut planner = Self::new(start, end);
        planner.start_speed = vehicle.velocity.magnitude();
        planner
    }

    /// Adds an intermediate waypoint, passed through in insertion order.
    pub fn add_point(mut self, position: Point3d, tangent: Vector3d) -> Self {
        self.waypoints.push(ControlPoint::new(position, tangent));
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the router used by [Strategy::GraphRouted].
    pub fn with_router(mut self, router: &'a dyn Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the start and end circle radii used by [Strategy::ArcLineArc].
    pub fn with_turn_radii(mut self, start_radius: f64, end_radius: f64) -> Self {
        self.turn_radii = Some((start_radius, end_radius));
        self
    }

    /// Sets the number of samples per curve segment.
    pub fn with_subdivisions(mut self, subdivisions: usize) -> Self {
        self.subdivisions = subdivisions;
        self
    }

    /// Reshapes the planned curve around the predicted obstacle.
    ///
    /// If `required` is set, planning fails rather than return a curve that
    /// couldn't be made collision-free. Only the simple strategy can be reshaped,
    /// see [PathPlanner::plan].
    pub fn with_obstacle_avoidance(
        mut self,
        vehicle: &VehicleState,
        arrival_time: Option<f64>,
        prediction: &'a BallPrediction,
        required: bool,
    ) -> Self {
        self.avoidance = Some(Avoidance {
            vehicle: *vehicle,
            arrival_time,
            prediction,
            required,
        });
        self
    }

    /// Replaces the default [DetourAvoider].
    pub fn with_avoider(mut self, avoider: &'a dyn ObstacleAvoider) -> Self {
        self.avoider = avoider;
        self
    }

    pub fn with_max_detour_iterations(mut self, iterations: usize) -> Self {
        self.max_detour_iterations = iterations;
        self
    }

    /// Plans the curve.
    ///
    /// # Panics
    /// If the graph-routed strategy is combined with waypoints or has no router,
    /// or if obstacle avoidance is combined with any strategy but [Strategy::Simple].
    pub fn plan(&self) -> Result<Curve, PlanError> {
        assert!(
            self.avoidance.is_none() || self.strategy == Strategy::Simple,
            "obstacle avoidance requires the simple strategy"
        );
        let curve = match self.strategy {
            Strategy::Simple => self.plan_simple(),
            Strategy::GraphRouted => self.plan_routed()?,
            Strategy::ArcLineArc => self.plan_arc_line_arc()?,
        };
        log::debug!(
            "planned {:?} curve of length {:.0} with {} samples",
            self.strategy,
            curve.length(),
            curve.len()
        );

        let curve = match &self.avoidance {
            Some(avoidance) => self.avoid(curve, avoidance)?,
            None => curve,
        };

        debug_curve("planned", curve.points());
        for cp in curve.control_points() {
            debug_point("control point", cp.position);
        }
        Ok(curve)
    }

    fn plan_simple(&self) -> Curve {
        let mut cps = Vec::with_capacity(self.waypoints.len() + 2);
        cps.push(self.start.control_point());
        cps.extend_from_slice(&self.waypoints);
        cps.push(self.end.control_point());
        Curve::with_subdivisions(cps, self.subdivisions)
    }

    fn plan_routed(&self) -> Result<Curve, PlanError> {
        assert!(
            self.waypoints.is_empty(),
            "waypoints can't be combined with graph routing"
        );
        let router = self.router.expect("graph routing requires a router");

        let curve = router
            .route(&self.start, &self.end, ROUTER_OFFSET, self.subdivisions)
            .ok_or(PlanError::NoRoute)?;
        if curve.length() <= 0.0 {
            log::warn!("router returned a zero-length curve");
            return Err(PlanError::DegenerateRoute);
        }
        Ok(curve)
    }

    fn plan_arc_line_arc(&self) -> Result<Curve, PlanError> {
        let (r1, r2) = self.turn_radii.unwrap_or_else(|| {
            let speed = f64::max(self.start_speed, MIN_DEFAULT_TURN_SPEED);
            let r = 1.0 / max_turning_curvature(speed);
            (r, r)
        });
        let ala = ArcLineArc::shortest(&self.start, &self.end, r1, r2)
            .ok_or(PlanError::NoArcLineArc)?;
        let (r1, r2) = ala.radii();
        log::trace!("arc-line-arc with radii {:.0} and {:.0}", r1, r2);
        Ok(ala.to_curve(self.start.position.z, self.subdivisions))
    }

    fn avoid(&self, curve: Curve, avoidance: &Avoidance) -> Result<Curve, PlanError> {
        let avoided = self.avoider.avoid(
            &curve,
            &avoidance.vehicle,
            avoidance.arrival_time,
            avoidance.prediction,
            self.max_detour_iterations,
        );
        match avoided {
            Some(curve) => Ok(curve),
            None if avoidance.required => {
                log::debug!("obstacle avoidance failed, no plan");
                Err(PlanError::AvoidanceFailed)
            }
            None => {
                log::debug!("obstacle avoidance failed, keeping the unmodified curve");
                Ok(curve)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::BALL_RADIUS;
    use assert_approx_eq::assert_approx_eq;

    fn poses() -> (Pose, Pose) {
        (
            Pose::new(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_x()),
            Pose::new(Point3d::new(0.0, 1000.0, 17.0), Vector3d::unit_y()),
        )
    }

    #[test]
    fn simple_passes_through_waypoints() {
        let (start, end) = poses();
        let curve = PathPlanner::new(start, end)
            .add_point(Point3d::new(600.0, 500.0, 17.0), Vector3d::unit_y())
            .with_subdivisions(10)
            .plan()
            .unwrap();
        assert_eq!(curve.control_points().len(), 3);
        assert_eq!(curve.len(), 21);
        assert!(curve
            .points()
            .iter()
            .any(|p| (p - Point3d::new(600.0, 500.0, 17.0)).magnitude() < 1e-6));
    }

    #[test]
    fn start_offset_moves_along_velocity() {
        let (_, end) = poses();
        let car = VehicleState::at_rest(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_x())
            .with_speed(1000.0);
        let curve = PathPlanner::from_vehicle(&car, 30.0, end).plan().unwrap();
        assert_approx_eq!(curve.start().x, 30.0);
        assert_approx_eq!(curve.start().y, 0.0);
    }

    #[test]
    #[should_panic]
    fn start_offset_out_of_range() {
        let (_, end) = poses();
        let car = VehicleState::at_rest(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_x());
        PathPlanner::from_vehicle(&car, 50.0, end);
    }

    #[test]
    #[should_panic]
    fn routed_without_router() {
        let (start, end) = poses();
        let _ = PathPlanner::new(start, end)
            .with_strategy(Strategy::GraphRouted)
            .plan();
    }

    #[test]
    #[should_panic]
    fn avoidance_with_arc_line_arc() {
        let (start, end) = poses();
        let car = VehicleState::at_rest(start.position, start.tangent);
        let ball = BallPrediction::empty();
        let _ = PathPlanner::new(start, end)
            .with_strategy(Strategy::ArcLineArc)
            .with_obstacle_avoidance(&car, None, &ball, false)
            .plan();
    }

    #[test]
    fn avoidance_keeps_waypoints() {
        let car = VehicleState::at_rest(Point3d::new(0.0, 0.0, 17.0), Vector3d::unit_y())
            .with_speed(1400.0);
        let ball = BallPrediction::extrapolate_linear(
            Point3d::new(0.0, 1000.0, BALL_RADIUS),
            Vector3d::zero(),
            car.time,
            5.0,
            false,
        );
        let waypoint = Point3d::new(0.0, 2600.0, 17.0);
        let curve = PathPlanner::new(
            Pose::new(car.position, car.forward),
            Pose::new(Point3d::new(0.0, 4000.0, 17.0), Vector3d::unit_y()),
        )
        .add_point(waypoint, Vector3d::unit_y())
        .with_obstacle_avoidance(&car, Some(car.time + 4.0), &ball, false)
        .plan()
        .unwrap();

        let cps = curve.control_points();
        assert!(cps.len() == 3 || cps.len() == 4);
        assert_eq!(cps[cps.len() - 2].position, waypoint);
        assert_approx_eq!(curve.start().y, 0.0);
        assert_approx_eq!(curve.end().y, 4000.0);
    }

    struct NowhereRouter;

    impl Router for NowhereRouter {
        fn route(&self, _: &Pose, _: &Pose, _: f64, _: usize) -> Option<Curve> {
            None
        }
    }

    #[test]
    fn routed_without_route() {
        let (start, end) = poses();
        let result = PathPlanner::new(start, end)
            .with_strategy(Strategy::GraphRouted)
            .with_router(&NowhereRouter)
            .plan();
        assert_eq!(result.unwrap_err(), PlanError::NoRoute);
    }

    struct PointRouter;

    impl Router for PointRouter {
        fn route(&self, start: &Pose, _: &Pose, _: f64, subdivisions: usize) -> Option<Curve> {
            let cp = start.control_point();
            Some(Curve::with_subdivisions(vec![cp, cp], subdivisions))
        }
    }

    #[test]
    fn routed_zero_length() {
        let (start, end) = poses();
        let result = PathPlanner::new(start, end)
            .with_strategy(Strategy::GraphRouted)
            .with_router(&PointRouter)
            .plan();
        assert_eq!(result.unwrap_err(), PlanError::DegenerateRoute);
    }
}
