//! Pinhole camera generating one ray per character cell.

use crate::{Ray, Vec3};

/// Terminal cells are roughly twice as tall as they are wide.
pub const DEFAULT_CHAR_ASPECT: f32 = 0.5;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    // Grid settings
    pub image_width: u32,
    pub image_height: u32,
    /// Width of a character cell divided by its height
    pub char_aspect: f32,

    // Camera positioning
    position: Vec3,
    direction: Vec3,
    vup: Vec3,
    /// Vertical field of view in degrees
    vfov: f32,

    // Cached computed values (set by initialize())
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    half_width: f32,
    half_height: f32,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 60 degree field of view.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 80,
            image_height: 24,
            char_aspect: DEFAULT_CHAR_ASPECT,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            vup: Vec3::Y,
            vfov: 60.0,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            half_width: 1.0,
            half_height: 1.0,
        };
        camera.initialize();
        camera
    }

    /// Set grid resolution in character cells.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set the character cell aspect (width / height).
    pub fn with_char_aspect(mut self, char_aspect: f32) -> Self {
        self.char_aspect = char_aspect;
        self
    }

    /// Set camera position, look direction and up vector.
    pub fn with_position(mut self, position: Vec3, direction: Vec3, vup: Vec3) -> Self {
        self.position = position;
        self.direction = direction;
        self.vup = vup;
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn fov(&self) -> f32 {
        self.vfov
    }

    /// Initialize the camera basis (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.forward = self.direction.try_normalize().unwrap_or(Vec3::NEG_Z);

        // An up vector parallel to the view direction gives no basis; pick any perpendicular.
        self.right = self
            .forward
            .cross(self.vup)
            .try_normalize()
            .unwrap_or_else(|| self.forward.any_orthonormal_vector());
        self.up = self.right.cross(self.forward);

        let width = self.image_width.max(1) as f32;
        let height = self.image_height.max(1) as f32;
        self.half_height = (self.vfov.to_radians() / 2.0).tan();
        self.half_width = self.half_height * (width / height) * self.char_aspect;
    }

    /// Generate the ray through the centre of cell (col, row); row 0 is the top.
    pub fn get_ray(&self, col: u32, row: u32) -> Ray {
        let width = self.image_width.max(1) as f32;
        let height = self.image_height.max(1) as f32;

        let u = ((col as f32 + 0.5) / width * 2.0 - 1.0) * self.half_width;
        let v = (1.0 - (row as f32 + 0.5) / height * 2.0) * self.half_height;

        Ray::new(self.position, self.forward + self.right * u + self.up * v)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
