//! Cosmo Renderer - parallel ASCII rendering of Cosmo scenes.
//!
//! This crate provides:
//!
//! - **Row-chunk scheduling** over a fixed-size rayon pool
//! - **Shading**: Lambertian luminance with shadows, mapped onto a character ramp
//! - **Player**: scene + frame buffer + animation clock driven by the host
//!
//! # Example
//!
//! ```ignore
//! use cosmo_renderer::{Player, PlayerConfig};
//!
//! let config = PlayerConfig::default().with_size(80, 24).with_workers(4);
//! let mut player = Player::new(scene_text.lines(), &[("cube", stl_bytes)], config)?;
//! loop {
//!     for row in player.get_a() {
//!         println!("{row}");
//!     }
//!     player.update();
//! }
//! ```

pub mod chunk;
pub mod framebuffer;
pub mod player;
pub mod renderer;
pub mod shading;

// Re-export commonly used types
pub use chunk::{generate_chunks, RowChunk};
pub use framebuffer::FrameBuffer;
pub use player::{Player, PlayerConfig, PlayerError};
pub use renderer::{RenderConfig, Renderer};
pub use shading::{ShadingTable, DEFAULT_RAMP, SHADOW_EPSILON};
