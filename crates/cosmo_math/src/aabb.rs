use crate::{Interval, Ray, Vec3};

/// Minimum extent of a box along any axis, so flat geometry keeps a volume.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-aligned bounding box used for culling and BVH nodes.
///
/// An AABB is defined by three intervals (one per axis). It is always derived
/// from geometry, never edited by hand.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a box from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// Smallest box containing every point, or `EMPTY` for no points.
    pub fn from_point_cloud(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }

        if min.x > max.x {
            Aabb::EMPTY
        } else {
            Aabb::from_points(min, max)
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Grow the box by a margin relative to its coordinates, so slab tests
    /// never reject a ray that hits geometry exactly on the boundary.
    pub fn inflated(&self) -> Self {
        if self.is_empty() {
            return *self;
        }
        let magnitude = self.min().abs().max(self.max().abs()).max_element();
        let margin = MIN_EXTENT * (1.0 + magnitude);
        Self {
            x: self.x.expand(margin),
            y: self.y.expand(margin),
            z: self.z.expand(margin),
        }
    }

    /// The eight corners, used when transforming the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min(), self.max());
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Slab test. Returns the parameter at which the ray enters the box,
    /// clamped to `ray_t`, or `None` when the ray misses it inside `ray_t`.
    pub fn hit_distance(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let origin = ray.origin();
        let inv = ray.inv_direction();
        let mut t = ray_t;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let mut t0 = (slab.min - origin[axis]) * inv[axis];
            let mut t1 = (slab.max - origin[axis]) * inv[axis];
            if inv[axis] < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t.min = t0.max(t.min);
            t.max = t1.min(t.max);
            if t.max < t.min {
                return None;
            }
        }

        Some(t.min)
    }

    /// Test if a ray intersects this AABB within the given interval.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.hit_distance(ray, ray_t).is_some()
    }

    /// Pad intervals to avoid zero-width boxes.
    fn pad_to_minimums(&mut self) {
        if self.x.size() < MIN_EXTENT {
            self.x = self.x.expand(MIN_EXTENT);
        }
        if self.y.size() < MIN_EXTENT {
            self.y = self.y.expand(MIN_EXTENT);
        }
        if self.z.size() < MIN_EXTENT {
            self.z = self.z.expand(MIN_EXTENT);
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Box of unbounded geometry such as planes.
    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points_orders_corners() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));

        assert_eq!(aabb.min(), Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(aabb.max(), Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_flat_box_is_padded() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(aabb.z.size() > 0.0);
        assert!(aabb.z.contains(0.0));
    }

    #[test]
    fn test_point_cloud() {
        let aabb = Aabb::from_point_cloud([
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::ZERO,
        ]);
        assert_eq!(aabb.min(), Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max(), Vec3::new(4.0, 5.0, 6.0));

        assert!(Aabb::from_point_cloud(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_aabb_hit_distance() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);

        let t = aabb.hit_distance(&ray, Interval::new(0.0, f32::INFINITY));
        assert_eq!(t, Some(4.0));

        // Range ends before the box
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_aabb_miss() {
        let aabb = unit_box();

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, f32::INFINITY)));

        // Parallel to an axis, outside the slab
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_ray_starting_inside_enters_at_range_start() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));

        assert_eq!(
            aabb.hit_distance(&ray, Interval::new(0.001, f32::INFINITY)),
            Some(0.001)
        );
    }

    #[test]
    fn test_universe_box_is_always_hit() {
        let ray = Ray::new(Vec3::new(3.0, -2.0, 1.0), Vec3::new(0.3, 0.1, -1.0));
        assert!(Aabb::UNIVERSE.hit(&ray, Interval::new(0.0, f32::INFINITY)));
    }

    #[test]
    fn test_aabb_longest_axis() {
        let aabb_x = Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(aabb_x.longest_axis(), 0);

        let aabb_y = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0));
        assert_eq!(aabb_y.longest_axis(), 1);

        let aabb_z = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(aabb_z.longest_axis(), 2);
    }

    #[test]
    fn test_inflated_grows_with_magnitude() {
        let near = Aabb::from_points(Vec3::ZERO, Vec3::ONE).inflated();
        let far = Aabb::from_points(Vec3::splat(1000.0), Vec3::splat(1001.0)).inflated();

        assert!(near.x.min < 0.0 && near.x.max > 1.0);
        assert!(far.x.size() - 1.0 > near.x.size() - 1.0);
        assert!(Aabb::EMPTY.inflated().is_empty());
    }
}
