use super::{Pose, Router};
use crate::curve::{ControlPoint, Correction, Curve};
use crate::math::{normalize_or, Point3d, Vector3d, UP};
use cgmath::prelude::*;
use pathfinding::directed::dijkstra::dijkstra;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Unique ID of a node in a [WaypointGraph].
    pub struct WaypointId;
}

/// A node of a [WaypointGraph].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Waypoint {
    position: Point3d,
    normal: Vector3d,
    edges: SmallVec<[WaypointId; 4]>,
}

/// A directed network of waypoints on the driving surface, routed with Dijkstra's algorithm.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaypointGraph {
    nodes: SlotMap<WaypointId, Waypoint>,
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a waypoint on a surface with the given normal.
    pub fn add_node(&mut self, position: Point3d, normal: Vector3d) -> WaypointId {
        self.nodes.insert(Waypoint {
            position,
            normal: normalize_or(normal, UP),
            edges: SmallVec::new(),
        })
    }

    /// Adds a one way connection between two waypoints.
    pub fn add_edge(&mut self, from: WaypointId, to: WaypointId) {
        assert!(self.nodes.contains_key(to), "edge to a missing waypoint");
        self.nodes[from].edges.push(to);
    }

    /// The number of waypoints.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The waypoint closest to `position`.
    pub fn nearest(&self, position: Point3d) -> Option<WaypointId> {
        self.nodes
            .iter()
            .map(|(id, node)| (id, (node.position - position).magnitude2()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// The shortest chain of waypoints from `from` to `to`.
    pub fn shortest_path(&self, from: WaypointId, to: WaypointId) -> Option<Vec<WaypointId>> {
        let (route, _) = dijkstra(
            &from,
            |id| {
                let node = &self.nodes[*id];
                node.edges.iter().map(move |next| {
                    let dist = (self.nodes[*next].position - node.position).magnitude();
                    (*next, dist.round() as u64)
                })
            },
            |id| *id == to,
        )?;
        Some(route)
    }
}

impl Router for WaypointGraph {
    fn route(&self, start: &Pose, end: &Pose, offset: f64, subdivisions: usize) -> Option<Curve> {
        let route = self.shortest_path(self.nearest(start.position)?, self.nearest(end.position)?)?;

        let nodes = route
            .iter()
            .map(|id| &self.nodes[*id])
            .filter(|node| {
                (node.position - start.position).magnitude() > offset
                    && (node.position - end.position).magnitude() > offset
            })
            .collect::<Vec<_>>();

        if nodes.len() < 2 {
            let cps = vec![
                ControlPoint::new(start.position, start.tangent),
                ControlPoint::new(end.position, end.tangent),
            ];
            return Some(Curve::with_subdivisions(cps, subdivisions));
        }

        let last = nodes.len() - 1;
        let cps = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let prev = nodes[i.saturating_sub(1)].position;
                let next = nodes[usize::min(i + 1, last)].position;
                let tangent = normalize_or(next - prev, start.tangent);
                ControlPoint::with_normal(node.position, tangent, node.normal)
            })
            .collect::<Vec<_>>();

        let (first, final_cp) = (cps[0], cps[last]);
        let correction = Correction {
            dx0: start.position - first.position,
            dt0: start.tangent - first.tangent,
            dx1: end.position - final_cp.position,
            dt1: end.tangent - final_cp.tangent,
            start: start.position,
            end: end.position,
        };
        Some(Curve::corrected(cps, &correction, subdivisions))
    }
}
