//! Cosmo Core - meshes, scene graph and scene parsing.
//!
//! This crate provides:
//!
//! - **Mesh store**: binary STL decoding into `Mesh`, with a per-mesh `Bvh`
//! - **Scene graph**: `World` with `Object`s, `Light`s and a camera
//! - **Scene parser**: text directives to `World`
//!
//! # Example
//!
//! ```ignore
//! use std::{collections::HashMap, sync::Arc};
//! use cosmo_core::{parse_scene, Mesh};
//!
//! let mesh = Mesh::from_stl("bunny", &std::fs::read("bunny.stl")?)?;
//! let meshes = HashMap::from([("bunny".to_string(), Arc::new(mesh))]);
//! let world = parse_scene(scene_text.lines(), &meshes)?;
//! println!("{} objects", world.objects.len());
//! ```

pub mod bvh;
pub mod mesh;
pub mod parser;
pub mod scene;

// Re-export commonly used types
pub use bvh::{Bvh, BvhNode};
pub use mesh::{Mesh, MeshError};
pub use parser::{parse_scene, SceneError};
pub use scene::{
    Hit, Light, Material, MeshInstance, Object, Orbit, Plane, Sphere, Spin, Traversal, World,
};
