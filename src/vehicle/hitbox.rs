use crate::math::{normalize_or, Point3d, Vector3d};
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The oriented bounding box of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CarHitbox {
    /// Full length, width and height of the box in uu.
    pub extents: Vector3d,
}

impl CarHitbox {
    /// The hitbox of the Octane body.
    pub const OCTANE: CarHitbox = CarHitbox {
        extents: Vector3d::new(118.01, 84.2, 36.16),
    };

    /// The smallest sphere centred on the vehicle's box that contains every corner,
    /// with its radius multiplied by `scale`.
    pub fn as_sphere(&self, scale: f64) -> SphereHitbox {
        SphereHitbox {
            radius: 0.5 * scale * self.extents.magnitude(),
        }
    }
}

impl Default for CarHitbox {
    fn default() -> Self {
        Self::OCTANE
    }
}

/// A spherical collision volume.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereHitbox {
    pub radius: f64,
}

impl SphereHitbox {
    /// The point on the sphere at `centre` nearest to `point`.
    pub fn closest_point(&self, centre: Point3d, point: Point3d) -> Point3d {
        let dir = normalize_or(point - centre, Vector3d::unit_z());
        centre + dir * self.radius
    }

    /// Whether this sphere at `centre` overlaps a sphere of `other_radius` at `other`.
    pub fn collides_with(&self, centre: Point3d, other_radius: f64, other: Point3d) -> bool {
        let reach = self.radius + other_radius;
        (centre - other).magnitude2() < reach * reach
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn octane_sphere() {
        let sphere = CarHitbox::OCTANE.as_sphere(1.0);
        assert_approx_eq!(sphere.radius, 74.705, 0.01);
        let scaled = CarHitbox::OCTANE.as_sphere(1.1);
        assert_approx_eq!(scaled.radius, 1.1 * sphere.radius);
    }

    #[test]
    fn sphere_overlap() {
        let sphere = SphereHitbox { radius: 50.0 };
        let origin = Point3d::new(0.0, 0.0, 0.0);
        assert!(sphere.collides_with(origin, 50.0, Point3d::new(99.0, 0.0, 0.0)));
        assert!(!sphere.collides_with(origin, 50.0, Point3d::new(101.0, 0.0, 0.0)));

        let contact = sphere.closest_point(origin, Point3d::new(0.0, 300.0, 0.0));
        assert_approx_eq!(contact.y, 50.0);
        assert_approx_eq!(contact.x, 0.0);
    }
}
