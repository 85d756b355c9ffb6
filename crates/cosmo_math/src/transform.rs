// Transform utilities for Mat4
//
// Extends glam::Mat4 with the operations mesh instancing needs:
// moving rays into object space and boxes/normals back out.

use crate::{Aabb, Ray, Vec3};
use glam::Mat4;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Bounding box of the 8 transformed corners of `aabb`.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal with the inverse-transpose and renormalize.
    ///
    /// `self` must be the inverse of the object-to-world matrix.
    fn transform_normal_by_inverse(&self, normal: Vec3) -> Vec3;

    /// Transform a ray by this matrix.
    ///
    /// Returns the transformed (normalized) ray and the factor converting a
    /// distance along the original ray into a distance along the new one.
    fn transform_ray(&self, ray: &Ray) -> (Ray, f32);
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_point_cloud(aabb.corners().map(|corner| self.transform_point3(corner)))
    }

    fn transform_normal_by_inverse(&self, normal: Vec3) -> Vec3 {
        self.transpose()
            .transform_vector3(normal)
            .try_normalize()
            .unwrap_or(normal)
    }

    fn transform_ray(&self, ray: &Ray) -> (Ray, f32) {
        let origin = self.transform_point3(ray.origin());
        let direction = self.transform_vector3(ray.direction());
        let scale = direction.length();
        (Ray::new(origin, direction), scale)
    }
}
