//! Scene graph: placed objects, lights, camera and the nearest-hit query.
//!
//! The object set is fixed when the scene is parsed. Between frames only
//! animation moves objects; during a frame the world is read-only.

use std::sync::Arc;

use cosmo_math::{Aabb, Camera, Interval, Mat4, Mat4Ext, Quat, Ray, Vec3};

use crate::mesh::Mesh;

/// Determinants / denominators below this are treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Surface response used by shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Diffuse reflectance, 0 = black, 1 = white
    pub albedo: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { albedo: 1.0 }
    }
}

impl Material {
    pub fn new(albedo: f32) -> Self {
        Self { albedo }
    }
}

/// Point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

/// Rotation of an object about an axis through its own origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    /// Unit rotation axis
    pub axis: Vec3,
    pub degrees_per_sec: f32,
}

/// Angle in radians after `time` seconds, reduced to one turn before narrowing to `f32`.
fn angle_at(degrees_per_sec: f32, time: f64) -> f32 {
    (f64::from(degrees_per_sec) * time)
        .rem_euclid(360.0)
        .to_radians() as f32
}

impl Spin {
    pub fn rotation_at(&self, time: f64) -> Quat {
        Quat::from_axis_angle(self.axis, angle_at(self.degrees_per_sec, time))
    }
}

/// Revolution of an object's position about the vertical axis through `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub pivot: Vec3,
    pub degrees_per_sec: f32,
}

impl Orbit {
    /// Where `base` has travelled to after `time` seconds.
    pub fn position_at(&self, base: Vec3, time: f64) -> Vec3 {
        let rotation = Quat::from_rotation_y(angle_at(self.degrees_per_sec, time));
        self.pivot + rotation * (base - self.pivot)
    }
}

/// Which search strategy mesh instances use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Cull by the instance's world box, then walk the mesh BVH.
    Accelerated,
    /// Test every triangle of every mesh.
    Exhaustive,
}

impl Traversal {
    pub fn from_aabb_flag(enable_aabb: bool) -> Self {
        if enable_aabb {
            Traversal::Accelerated
        } else {
            Traversal::Exhaustive
        }
    }
}

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// World-space distance along the ray
    pub t: f32,
    pub point: Vec3,
    /// Unit surface normal, oriented against the incoming ray
    pub normal: Vec3,
    pub material: Material,
    /// Index of the object in declaration order
    pub object: usize,
}

impl Hit {
    fn new(ray: &Ray, t: f32, outward_normal: Vec3, material: Material) -> Self {
        // Normal always points against the ray
        let normal = if ray.direction().dot(outward_normal) > 0.0 {
            -outward_normal
        } else {
            outward_normal
        };
        Self {
            t,
            point: ray.at(t),
            normal,
            material,
            object: 0,
        }
    }
}

/// A sphere, optionally orbiting a pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Vec3,
    base_center: Vec3,
    radius: f32,
    material: Material,
    orbit: Option<Orbit>,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            base_center: center,
            radius: radius.max(0.0),
            material,
            orbit: None,
        }
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let oc = self.center - ray.origin();
        // Direction is unit length, so a = 1
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = h - sqrtd;
        if !ray_t.surrounds(root) {
            root = h + sqrtd;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Some(Hit::new(ray, root, outward_normal, self.material))
    }

    fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(self.center - r, self.center + r)
    }

    fn animate(&mut self, time: f64) {
        if let Some(orbit) = &self.orbit {
            self.center = orbit.position_at(self.base_center, time);
        }
    }
}

/// An infinite plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    point: Vec3,
    normal: Vec3,
    material: Material,
}

impl Plane {
    /// `normal` must be non-zero; it is normalized here.
    pub fn new(point: Vec3, normal: Vec3, material: Material) -> Self {
        Self {
            point,
            normal: normal.normalize(),
            material,
        }
    }

    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let denom = self.normal.dot(ray.direction());
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.point - ray.origin()).dot(self.normal) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }
        Some(Hit::new(ray, t, self.normal, self.material))
    }
}

/// A placement of a shared mesh: uniform scale, spin and position.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    mesh: Arc<Mesh>,
    translation: Vec3,
    scale: f32,
    material: Material,
    spin: Option<Spin>,
    orbit: Option<Orbit>,

    // Derived from the above at the current animation time
    to_local: Mat4,
    world_bounds: Aabb,
}

impl MeshInstance {
    pub fn new(mesh: Arc<Mesh>, translation: Vec3, scale: f32, material: Material) -> Self {
        let mut instance = Self {
            mesh,
            translation,
            scale,
            material,
            spin: None,
            orbit: None,
            to_local: Mat4::IDENTITY,
            world_bounds: Aabb::EMPTY,
        };
        instance.update_transform(0.0);
        instance
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = Some(spin);
        self.update_transform(0.0);
        self
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self.update_transform(0.0);
        self
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Object-to-world matrix at `time`.
    pub fn to_world_at(&self, time: f64) -> Mat4 {
        let rotation = self.spin.map_or(Quat::IDENTITY, |spin| spin.rotation_at(time));
        let translation = self
            .orbit
            .map_or(self.translation, |orbit| orbit.position_at(self.translation, time));
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, translation)
    }

    fn update_transform(&mut self, time: f64) {
        let to_world = self.to_world_at(time);
        self.to_local = to_world.inverse();
        self.world_bounds = to_world.transform_aabb(&self.mesh.bounds()).inflated();
    }

    fn intersect(&self, ray: &Ray, ray_t: Interval, traversal: Traversal) -> Option<Hit> {
        if traversal == Traversal::Accelerated && !self.world_bounds.hit(ray, ray_t) {
            return None;
        }

        // Local distances are world distances times `scale`
        let (local_ray, scale) = self.to_local.transform_ray(ray);
        let local_t = Interval::new(ray_t.min * scale, ray_t.max * scale);

        let (index, hit) = match traversal {
            Traversal::Accelerated => self.mesh.intersect_bvh(&local_ray, local_t),
            Traversal::Exhaustive => self.mesh.intersect_linear(&local_ray, local_t),
        }?;

        let triangle = &self.mesh.triangles()[index as usize];
        let outward_normal = self.to_local.transform_normal_by_inverse(triangle.normal);
        Some(Hit::new(ray, hit.t / scale, outward_normal, self.material))
    }
}

/// A placed scene element.
#[derive(Debug, Clone)]
pub enum Object {
    Sphere(Sphere),
    Plane(Plane),
    Mesh(MeshInstance),
}

impl Object {
    /// Nearest hit of this object within `ray_t`.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval, traversal: Traversal) -> Option<Hit> {
        match self {
            Object::Sphere(sphere) => sphere.intersect(ray, ray_t),
            Object::Plane(plane) => plane.intersect(ray, ray_t),
            Object::Mesh(instance) => instance.intersect(ray, ray_t, traversal),
        }
    }

    /// World-space bounds at the current animation time.
    pub fn bounding_box(&self) -> Aabb {
        match self {
            Object::Sphere(sphere) => sphere.bounding_box(),
            Object::Plane(_) => Aabb::UNIVERSE,
            Object::Mesh(instance) => instance.world_bounds,
        }
    }

    /// Move the object to where its animation puts it at `time` seconds.
    pub fn animate(&mut self, time: f64) {
        match self {
            Object::Sphere(sphere) => sphere.animate(time),
            Object::Plane(_) => {}
            Object::Mesh(instance) => {
                if instance.spin.is_some() || instance.orbit.is_some() {
                    instance.update_transform(time);
                }
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        match self {
            Object::Sphere(sphere) => sphere.orbit.is_some(),
            Object::Plane(_) => false,
            Object::Mesh(instance) => instance.spin.is_some() || instance.orbit.is_some(),
        }
    }
}

/// The complete scene: camera, lights and objects.
#[derive(Debug, Clone)]
pub struct World {
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub objects: Vec<Object>,
    /// Luminance added to every lit surface regardless of lights
    pub ambient: f32,
}

impl Default for World {
    fn default() -> Self {
        Self {
            camera: Camera::new(),
            lights: Vec::new(),
            objects: Vec::new(),
            ambient: 0.0,
        }
    }
}

impl World {
    /// Nearest hit over all objects.
    ///
    /// Objects are scanned in declaration order and a hit replaces the
    /// current one only when strictly closer, so the first declared object
    /// wins an exact tie.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval, traversal: Traversal) -> Option<Hit> {
        let mut closest: Option<Hit> = None;

        for (index, object) in self.objects.iter().enumerate() {
            let reach = closest.map_or(ray_t.max, |hit| hit.t);
            if let Some(mut hit) = object.intersect(ray, Interval::new(ray_t.min, reach), traversal)
            {
                if closest.map_or(true, |best| hit.t < best.t) {
                    hit.object = index;
                    closest = Some(hit);
                }
            }
        }

        closest
    }

    /// True if anything blocks the ray within `ray_t`.
    pub fn occluded(&self, ray: &Ray, ray_t: Interval, traversal: Traversal) -> bool {
        self.objects
            .iter()
            .any(|object| object.intersect(ray, ray_t, traversal).is_some())
    }

    /// Place every animated object at `time` seconds.
    pub fn animate(&mut self, time: f64) {
        for object in self.objects.iter_mut().filter(|o| o.is_animated()) {
            object.animate(time);
        }
    }

    /// Box around every object at the current animation time.
    pub fn bounding_box(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::EMPTY, |acc, object| Aabb::surrounding(&acc, &object.bounding_box()))
    }

    pub fn triangle_count(&self) -> usize {
        self.objects
            .iter()
            .map(|object| match object {
                Object::Mesh(instance) => instance.mesh.triangle_count(),
                _ => 0,
            })
            .sum()
    }
}
