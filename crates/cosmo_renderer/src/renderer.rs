//! Frame renderer.
//!
//! Splits the grid into row chunks and renders them on a fixed-size rayon
//! pool. Every chunk writes into its own slice of the frame buffer, so the
//! scope join at the end of a frame is the only synchronization.

use cosmo_core::{Traversal, World};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::chunk::{generate_chunks, RowChunk};
use crate::framebuffer::FrameBuffer;
use crate::shading::{shade_cell, ShadingTable};

/// Render configuration.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Cull meshes by their world box and search them through the BVH
    pub enable_aabb: bool,
    /// Draw every hit with the lit character instead of shading it
    pub disable_shade: bool,
    pub shading: ShadingTable,
}

impl RenderConfig {
    pub fn traversal(&self) -> Traversal {
        Traversal::from_aabb_flag(self.enable_aabb)
    }
}

/// Renders worlds into frame buffers, optionally in parallel.
pub struct Renderer {
    pool: Option<ThreadPool>,
}

impl Renderer {
    /// Create a renderer with `workers` threads. Zero workers renders on the
    /// calling thread, as does a pool that fails to start.
    pub fn new(workers: usize) -> Self {
        if workers == 0 {
            return Self::sequential();
        }

        match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cosmo-render-{i}"))
            .build()
        {
            Ok(pool) => {
                log::debug!("Render pool started with {} workers", workers);
                Self { pool: Some(pool) }
            }
            Err(err) => {
                log::warn!("Failed to start render pool ({err}), rendering sequentially");
                Self::sequential()
            }
        }
    }

    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Number of pool threads, 0 when rendering sequentially.
    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, |pool| pool.current_num_threads())
    }

    /// Render `world` as seen by its camera into `buffer`.
    ///
    /// The camera must be initialized for the buffer's resolution.
    pub fn render(&self, world: &World, config: &RenderConfig, buffer: &mut FrameBuffer) {
        let width = buffer.width();
        let chunks = generate_chunks(buffer.height(), self.workers());

        // Hand each chunk its own rows of the buffer
        let mut rest = buffer.cells_mut();
        let mut work = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let (cells, tail) = std::mem::take(&mut rest).split_at_mut(chunk.cell_count(width));
            work.push((chunk, cells));
            rest = tail;
        }

        match &self.pool {
            Some(pool) => pool.scope(|scope| {
                for (chunk, cells) in work {
                    scope.spawn(move |_| render_chunk(world, config, chunk, width, cells));
                }
            }),
            None => {
                for (chunk, cells) in work {
                    render_chunk(world, config, chunk, width, cells);
                }
            }
        }
    }
}

/// Render the rows of `chunk` into `cells`, which hold exactly those rows.
pub fn render_chunk(
    world: &World,
    config: &RenderConfig,
    chunk: RowChunk,
    width: u32,
    cells: &mut [char],
) {
    debug_assert_eq!(cells.len(), chunk.cell_count(width));
    let traversal = config.traversal();

    for (local_row, row_cells) in cells.chunks_exact_mut(width.max(1) as usize).enumerate() {
        let row = chunk.start_row + local_row as u32;
        for (col, cell) in row_cells.iter_mut().enumerate() {
            let ray = world.camera.get_ray(col as u32, row);
            *cell = shade_cell(world, &ray, &config.shading, traversal, config.disable_shade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmo_core::{Light, Material, Object, Sphere};
    use cosmo_math::{Camera, Vec3};

    fn sphere_world(width: u32, height: u32) -> World {
        let mut camera = Camera::new()
            .with_resolution(width, height)
            .with_position(Vec3::new(0.0, 0.0, 4.0), -Vec3::Z, Vec3::Y);
        camera.initialize();

        let mut world = World {
            camera,
            ..World::default()
        };
        world.ambient = 0.05;
        world.lights.push(Light::new(Vec3::new(3.0, 4.0, 6.0), 1.0));
        world.objects.push(Object::Sphere(Sphere::new(Vec3::ZERO, 1.5, Material::default())));
        world
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let world = sphere_world(48, 20);
        let config = RenderConfig::default();

        let mut sequential = FrameBuffer::new(48, 20, '?');
        Renderer::sequential().render(&world, &config, &mut sequential);

        for workers in [1, 3, 4, 64] {
            let mut parallel = FrameBuffer::new(48, 20, '?');
            Renderer::new(workers).render(&world, &config, &mut parallel);
            assert_eq!(parallel, sequential, "{workers} workers differ from sequential");
        }
    }

    #[test]
    fn test_every_cell_is_written() {
        let world = sphere_world(31, 9);
        let mut buffer = FrameBuffer::new(31, 9, '?');
        Renderer::new(4).render(&world, &RenderConfig::default(), &mut buffer);

        assert!(!buffer.cells().contains(&'?'));
        // Centre hits the sphere, corners see nothing
        assert_ne!(buffer.get(15, 4), ' ');
        assert_eq!(buffer.get(0, 0), ' ');
    }

    #[test]
    fn test_zero_workers_is_sequential() {
        assert_eq!(Renderer::new(0).workers(), 0);
        assert_eq!(Renderer::new(2).workers(), 2);
    }
}
