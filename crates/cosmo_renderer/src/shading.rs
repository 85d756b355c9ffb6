//! Lambertian shading and luminance-to-character mapping.

use cosmo_core::{Hit, Traversal, World};
use cosmo_math::{Interval, Ray};

use crate::player::PlayerError;

/// Offset applied along the surface normal before casting shadow rays.
pub const SHADOW_EPSILON: f32 = 1e-3;

/// Characters from darkest to brightest.
pub const DEFAULT_RAMP: &str = ".,-~:;=!*#$@";

/// Glyphs used for background, flat hits and shaded hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadingTable {
    background: char,
    lit: char,
    ramp: Vec<char>,
}

impl Default for ShadingTable {
    fn default() -> Self {
        Self {
            background: ' ',
            lit: 'O',
            ramp: DEFAULT_RAMP.chars().collect(),
        }
    }
}

impl ShadingTable {
    /// Create a table. `ramp` lists characters darkest first and must not be empty.
    pub fn new(background: char, lit: char, ramp: &str) -> Result<Self, PlayerError> {
        let ramp: Vec<char> = ramp.chars().collect();
        if ramp.is_empty() {
            return Err(PlayerError::InvalidConfig(
                "shading ramp must contain at least one character".to_string(),
            ));
        }
        Ok(Self {
            background,
            lit,
            ramp,
        })
    }

    pub fn background(&self) -> char {
        self.background
    }

    pub fn lit(&self) -> char {
        self.lit
    }

    pub fn ramp(&self) -> &[char] {
        &self.ramp
    }

    /// Map a luminance to a ramp character. Out of range values are clamped.
    pub fn ramp_char(&self, luminance: f32) -> char {
        let len = self.ramp.len();
        let scaled = (luminance.clamp(0.0, 1.0) * len as f32).floor() as usize;
        self.ramp[scaled.min(len - 1)]
    }
}

/// Luminance of a hit: ambient plus the diffuse term of every light the
/// hit point can see, clamped to [0, 1].
pub fn luminance(world: &World, hit: &Hit, traversal: Traversal) -> f32 {
    let origin = hit.point + hit.normal * SHADOW_EPSILON;

    let diffuse: f32 = world
        .lights
        .iter()
        .filter_map(|light| {
            let to_light = light.position - origin;
            let distance = to_light.length();
            let direction = to_light.try_normalize()?;

            let cos_theta = hit.normal.dot(direction);
            if cos_theta <= 0.0 {
                return None;
            }

            let shadow_ray = Ray::new(origin, direction);
            if world.occluded(&shadow_ray, Interval::new(0.0, distance), traversal) {
                return None;
            }
            Some(hit.material.albedo * light.intensity * cos_theta)
        })
        .sum();

    (world.ambient + diffuse).clamp(0.0, 1.0)
}

/// Character for the cell whose primary ray is `ray`.
pub fn shade_cell(
    world: &World,
    ray: &Ray,
    table: &ShadingTable,
    traversal: Traversal,
    disable_shade: bool,
) -> char {
    match world.intersect(ray, Interval::new(0.0, f32::INFINITY), traversal) {
        None => table.background,
        Some(_) if disable_shade => table.lit,
        Some(hit) => table.ramp_char(luminance(world, &hit, traversal)),
    }
}
