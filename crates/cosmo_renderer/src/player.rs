//! Animation player: owns a scene and renders it frame by frame.
//!
//! The host builds a [`Player`] from scene text and mesh buffers, calls
//! [`Player::update`] on its own timer, and reads the latest frame with
//! [`Player::get_a`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use cosmo_core::{parse_scene, Mesh, MeshError, SceneError, World};
use cosmo_math::DEFAULT_CHAR_ASPECT;
use thiserror::Error;

use crate::framebuffer::FrameBuffer;
use crate::renderer::{RenderConfig, Renderer};
use crate::shading::ShadingTable;

/// Errors that can occur while constructing a player.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Player configuration.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Grid width in characters
    pub width: u32,
    /// Grid height in characters
    pub height: u32,
    /// Frames per second, used to turn frame numbers into animation time
    pub frame_rate: f32,
    pub enable_aabb: bool,
    pub disable_shade: bool,
    /// Render threads; 0 renders on the calling thread
    pub workers: usize,
    /// Width of a character cell divided by its height
    pub char_aspect: f32,
    pub shading: ShadingTable,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            frame_rate: 24.0,
            enable_aabb: false,
            disable_shade: false,
            workers: 0,
            char_aspect: DEFAULT_CHAR_ASPECT,
            shading: ShadingTable::default(),
        }
    }
}

impl PlayerConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_aabb(mut self, enable_aabb: bool) -> Self {
        self.enable_aabb = enable_aabb;
        self
    }

    pub fn with_shading_disabled(mut self, disable_shade: bool) -> Self {
        self.disable_shade = disable_shade;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_char_aspect(mut self, char_aspect: f32) -> Self {
        self.char_aspect = char_aspect;
        self
    }

    pub fn with_shading(mut self, shading: ShadingTable) -> Self {
        self.shading = shading;
        self
    }

    fn validate(&self) -> Result<(), PlayerError> {
        if self.width == 0 || self.height == 0 {
            return Err(PlayerError::InvalidConfig(format!(
                "grid size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(PlayerError::InvalidConfig(format!(
                "frame rate {} must be positive",
                self.frame_rate
            )));
        }
        if !(self.char_aspect.is_finite() && self.char_aspect > 0.0) {
            return Err(PlayerError::InvalidConfig(format!(
                "character aspect {} must be positive",
                self.char_aspect
            )));
        }
        if self.shading.ramp().is_empty() {
            return Err(PlayerError::InvalidConfig(
                "shading ramp must contain at least one character".to_string(),
            ));
        }
        Ok(())
    }
}

/// A running animation.
pub struct Player {
    world: World,
    buffer: FrameBuffer,
    renderer: Renderer,
    config: RenderConfig,
    frame_rate: f32,
    frame_index: u64,
}

impl Player {
    /// Decode meshes, parse the scene and render frame 0.
    ///
    /// `meshes` pairs each mesh name used by the scene with its binary STL bytes.
    pub fn new<I, S, N, B>(
        scene_lines: I,
        meshes: &[(N, B)],
        config: PlayerConfig,
    ) -> Result<Self, PlayerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        config.validate()?;

        let mut store: HashMap<String, Arc<Mesh>> = HashMap::with_capacity(meshes.len());
        for (name, bytes) in meshes {
            let name = name.as_ref();
            if store.contains_key(name) {
                return Err(PlayerError::InvalidConfig(format!(
                    "mesh '{name}' supplied more than once"
                )));
            }
            let mesh = Mesh::from_stl(name, bytes.as_ref())?;
            store.insert(name.to_string(), Arc::new(mesh));
        }

        let mut world = parse_scene(scene_lines, &store)?;
        world.camera = world
            .camera
            .with_resolution(config.width, config.height)
            .with_char_aspect(config.char_aspect);
        world.camera.initialize();

        let mut player = Self {
            buffer: FrameBuffer::new(config.width, config.height, config.shading.background()),
            renderer: Renderer::new(config.workers),
            config: RenderConfig {
                enable_aabb: config.enable_aabb,
                disable_shade: config.disable_shade,
                shading: config.shading,
            },
            frame_rate: config.frame_rate,
            frame_index: 0,
            world,
        };

        log::info!(
            "Player ready: {}x{} grid, {} fps, aabb {}, shading {}, {} workers",
            config.width,
            config.height,
            config.frame_rate,
            if player.config.enable_aabb { "on" } else { "off" },
            if player.config.disable_shade { "off" } else { "on" },
            player.renderer.workers()
        );

        player.render_current();
        Ok(player)
    }

    /// Advance one frame: animate, render, move to the next frame number.
    pub fn update(&mut self) {
        self.render_current();
    }

    /// Rows of the most recently rendered frame.
    pub fn get_a(&self) -> Vec<String> {
        self.buffer.rows()
    }

    /// Number of the frame the next `update` renders.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Release the scene, frame buffer and worker pool.
    pub fn free(self) {
        log::debug!("Player released after {} frames", self.frame_index);
    }

    fn render_current(&mut self) {
        let start = Instant::now();

        let time = self.frame_index as f64 / f64::from(self.frame_rate);
        self.world.animate(time);
        self.renderer.render(&self.world, &self.config, &mut self.buffer);

        log::debug!(
            "Frame {} (t = {:.3}s) rendered in {:.2?}",
            self.frame_index,
            time,
            start.elapsed()
        );
        self.frame_index += 1;
    }
}
