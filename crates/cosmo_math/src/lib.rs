//! Cosmo geometry kernel.
//!
//! Vectors and matrices come from `glam` (re-exported), everything else is
//! the small set of ray-casting primitives the renderer is built on.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod camera;
mod interval;
mod ray;
mod transform;
mod triangle;

pub use aabb::Aabb;
pub use camera::{Camera, DEFAULT_CHAR_ASPECT};
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
pub use triangle::{Triangle, TriangleHit};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_reexport() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
    }
}
