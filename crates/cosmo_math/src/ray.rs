use crate::Vec3;

/// A ray with an origin and a unit direction.
///
/// The direction is normalized on construction, so the ray parameter `t`
/// is always a world-space distance. The componentwise inverse of the
/// direction is cached for slab tests against bounding boxes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    /// Zero components map to +infinity regardless of the sign of the zero.
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray. `direction` must be non-zero; it is normalized here.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        debug_assert!(
            direction.length_squared() > 0.0,
            "ray direction must be non-zero"
        );
        let direction = direction.normalize();
        let inv_direction = direction.map(|x| if x == 0.0 { f32::INFINITY } else { 1.0 / x });

        Self {
            origin,
            direction,
            inv_direction,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    /// Point along the ray at distance t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));

        assert!((ray.direction().length() - 1.0).abs() < 1e-6);
        assert!((ray.direction() - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -2.0));

        assert_eq!(ray.at(0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.at(2.5), Vec3::new(1.0, 0.0, -2.5));
    }

    #[test]
    fn test_inverse_direction_handles_zero_components() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(-0.0, 0.0, -1.0));
        let inv = ray.inv_direction();

        assert_eq!(inv.x, f32::INFINITY);
        assert_eq!(inv.y, f32::INFINITY);
        assert_eq!(inv.z, -1.0);
    }
}
