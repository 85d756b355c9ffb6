//! Triangle primitive and Möller-Trumbore ray intersection.

use crate::{Aabb, Interval, Ray, Vec3};

/// Determinants smaller than this are treated as rays parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A triangle with a precomputed unit face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    /// Unit face normal following the counter-clockwise winding of v0, v1, v2.
    pub normal: Vec3,
}

/// Where a ray crosses a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    /// Barycentric coordinates of the hit relative to v1 and v2.
    pub u: f32,
    pub v: f32,
}

impl Triangle {
    /// Create a triangle, deriving the normal from the winding order.
    ///
    /// `fallback_normal` is used for degenerate triangles whose edges do
    /// not span a plane (mesh files carry a stored normal for this).
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, fallback_normal: Vec3) -> Self {
        let normal = (v1 - v0)
            .cross(v2 - v0)
            .try_normalize()
            .or_else(|| fallback_normal.try_normalize())
            .unwrap_or(Vec3::ZERO);

        Self { v0, v1, v2, normal }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.v0.min(self.v1).min(self.v2), self.v0.max(self.v1).max(self.v2))
            .inflated()
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Both faces are hit; the caller orients the normal against the ray.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(TriangleHit { t, u, v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle(z: f32) -> Triangle {
        Triangle::new(
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(0.0, 1.0, z),
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_normal_follows_winding() {
        let tri = xy_triangle(0.0);
        assert!((tri.normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_uses_fallback_normal() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(tri.normal, Vec3::Y);

        let ray = Ray::new(Vec3::new(0.5, 1.0, 0.0), -Vec3::Y);
        assert!(tri.intersect(&ray, Interval::new(0.0, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle(-1.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let hit = tri
            .intersect(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray through the centre should hit");
        assert!((hit.t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_back_face_is_hit() {
        let tri = xy_triangle(1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_some());
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle(-1.0);

        // Pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Outside the edges
        let ray = Ray::new(Vec3::new(2.0, 2.0, 0.0), -Vec3::Z);
        assert!(tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Beyond the allowed range
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(tri.intersect(&ray, Interval::new(0.001, 0.5)).is_none());
    }

    #[test]
    fn test_bounding_box_contains_vertices() {
        let tri = xy_triangle(2.0);
        let bbox = tri.bounding_box();
        for v in [tri.v0, tri.v1, tri.v2] {
            assert!(bbox.x.contains(v.x) && bbox.y.contains(v.y) && bbox.z.contains(v.z));
        }
    }
}
