//! View frustum for visibility culling

use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::Aabb;

/// Plane defined by normal and distance from origin
///
/// Points with a non-negative signed distance are on the inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    ///
    /// The normal is normalized; `distance` is taken as-is.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Create a plane from the coefficients of `a*x + b*y + c*z + d = 0`
    ///
    /// All four coefficients are scaled so the normal has unit length.
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let length = normal.magnitude();
        if length > f32::EPSILON {
            Self { normal: normal / length, distance: d / length }
        } else {
            Self { normal, distance: d }
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Uses the Gribb-Hartmann method. Assumes a `[0, 1]` clip-space depth
    /// range (Vulkan / D3D convention), so the near plane is the third row on
    /// its own rather than `row3 + row2`.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| {
            let r = vp_matrix.row(i);
            [r[0], r[1], r[2], r[3]]
        };
        let combine = |a: [f32; 4], b: [f32; 4], sign: f32| {
            Plane::from_coefficients(
                a[0] + sign * b[0],
                a[1] + sign * b[1],
                a[2] + sign * b[2],
                a[3] + sign * b[3],
            )
        };

        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                combine(r3, r0, 1.0),
                combine(r3, r0, -1.0),
                combine(r3, r1, 1.0),
                combine(r3, r1, -1.0),
                Plane::from_coefficients(r2[0], r2[1], r2[2], r2[3]),
                combine(r3, r2, -1.0),
            ],
        }
    }

    /// Check if a point lies inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if an AABB is inside or intersects the frustum
    ///
    /// Conservative: a box outside the frustum but not fully behind any single
    /// plane (near a frustum corner) is still reported as intersecting.
    pub fn intersects_aabb(&self, aabb: &Aabb<3>) -> bool {
        // For each plane, check if the AABB is completely outside
        for plane in &self.planes {
            // Corner of the AABB furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            // If this point is outside the plane, the entire AABB is outside
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Axis-aligned box frustum `[-1, 1]^3` built from explicit planes
    fn box_frustum() -> Frustum {
        Frustum::new([
            Plane::new(Vec3::new(1.0, 0.0, 0.0), 1.0),
            Plane::new(Vec3::new(-1.0, 0.0, 0.0), 1.0),
            Plane::new(Vec3::new(0.0, 1.0, 0.0), 1.0),
            Plane::new(Vec3::new(0.0, -1.0, 0.0), 1.0),
            Plane::new(Vec3::new(0.0, 0.0, 1.0), 1.0),
            Plane::new(Vec3::new(0.0, 0.0, -1.0), 1.0),
        ])
    }

    #[test]
    fn test_plane_from_coefficients_normalizes() {
        let plane = Plane::from_coefficients(0.0, 2.0, 0.0, 4.0);
        assert_relative_eq!(plane.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(plane.distance, 2.0);
        assert_relative_eq!(plane.distance_to_point(Vec3::new(0.0, -2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_frustum_aabb_culling() {
        let frustum = box_frustum();

        let inside = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        let straddling = Aabb::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(3.0, 3.0, 3.0));
        let outside = Aabb::new(Vec3::new(2.0, -0.5, -0.5), Vec3::new(3.0, 0.5, 0.5));

        assert!(frustum.intersects_aabb(&inside));
        assert!(frustum.intersects_aabb(&straddling));
        assert!(!frustum.intersects_aabb(&outside));
        assert!(frustum.contains_point(Vec3::zeros()));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 1.5)));
    }

    #[test]
    fn test_from_identity_matrix_is_clip_cube() {
        // Identity view-projection: clip space is x,y in [-1, 1], z in [0, 1]
        let frustum = Frustum::from_matrix(&Mat4::identity());

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, 0.5)));
        assert!(frustum.contains_point(Vec3::new(1.0, -1.0, 1.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.1)));
        assert!(!frustum.contains_point(Vec3::new(1.5, 0.0, 0.5)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 1.5)));
    }
}
