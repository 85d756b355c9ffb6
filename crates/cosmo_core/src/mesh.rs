//! Triangle meshes decoded from binary STL buffers.
//!
//! A mesh is built once from the raw bytes the host supplies, gets its BVH
//! at load time, and is shared read-only by every instance that places it.

use bytemuck::{Pod, Zeroable};
use cosmo_math::{Aabb, Interval, Ray, Triangle, Vec3};
use thiserror::Error;

use crate::bvh::{intersect_linear, Bvh, TriangleQuery};

/// Size of the free-form STL header preceding the triangle count.
const STL_HEADER_LEN: usize = 80;
/// Header plus the little-endian `u32` triangle count.
const STL_PREAMBLE_LEN: usize = STL_HEADER_LEN + 4;
/// Normal, three vertices and a `u16` attribute word.
const STL_RECORD_LEN: usize = 50;

/// Errors that can occur while decoding a mesh buffer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("malformed mesh '{name}': {reason}")]
    Malformed { name: String, reason: String },
}

impl MeshError {
    fn malformed(name: &str, reason: impl Into<String>) -> Self {
        MeshError::Malformed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw facet record as stored on disk, minus the attribute word.
///
/// Fields are kept as bit patterns so decoding does not depend on host
/// endianness or alignment.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct StlFacet {
    normal: [u32; 3],
    vertices: [[u32; 3]; 3],
}

#[inline]
fn le_vec3(bits: [u32; 3]) -> Vec3 {
    let [x, y, z] = bits.map(|b| f32::from_bits(u32::from_le(b)));
    Vec3::new(x, y, z)
}

/// A named, immutable triangle mesh with its acceleration structure.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    /// Triangles in file order; the index is stable and used by the BVH.
    triangles: Vec<Triangle>,
    bvh: Bvh,
    bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from triangles, building its BVH.
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        let name = name.into();
        let bvh = Bvh::build(&triangles);
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bounding_box()));

        log::debug!(
            "Built BVH for mesh '{}': {} nodes, {} leaves, depth {}",
            name,
            bvh.nodes().len(),
            bvh.leaf_count(),
            bvh.depth()
        );

        Self {
            name,
            triangles,
            bvh,
            bounds,
        }
    }

    /// Decode a binary STL buffer.
    ///
    /// The buffer must be exactly `84 + 50 * count` bytes long, where `count`
    /// is the triangle count declared in the header.
    pub fn from_stl(name: &str, bytes: &[u8]) -> Result<Self, MeshError> {
        if bytes.len() < STL_PREAMBLE_LEN {
            return Err(MeshError::malformed(
                name,
                format!(
                    "buffer is {} bytes, shorter than the {}-byte STL header",
                    bytes.len(),
                    STL_PREAMBLE_LEN
                ),
            ));
        }

        let count =
            u32::from_le(bytemuck::pod_read_unaligned(&bytes[STL_HEADER_LEN..STL_PREAMBLE_LEN]))
                as usize;
        let expected = count
            .checked_mul(STL_RECORD_LEN)
            .and_then(|body| body.checked_add(STL_PREAMBLE_LEN))
            .ok_or_else(|| MeshError::malformed(name, format!("triangle count {count} overflows")))?;

        if bytes.len() != expected {
            let reason = if bytes.starts_with(b"solid") {
                "looks like an ASCII STL, only binary STL is supported".to_string()
            } else if bytes.len() < expected {
                let complete = (bytes.len() - STL_PREAMBLE_LEN) / STL_RECORD_LEN;
                format!(
                    "declares {count} triangles ({expected} bytes) but is truncated at {} bytes, inside record {complete}",
                    bytes.len()
                )
            } else {
                format!(
                    "declares {count} triangles ({expected} bytes) but has {} trailing bytes",
                    bytes.len() - expected
                )
            };
            return Err(MeshError::malformed(name, reason));
        }

        let mut triangles = Vec::with_capacity(count);
        for (index, record) in bytes[STL_PREAMBLE_LEN..]
            .chunks_exact(STL_RECORD_LEN)
            .enumerate()
        {
            let facet: StlFacet = bytemuck::pod_read_unaligned(&record[..std::mem::size_of::<StlFacet>()]);
            let [v0, v1, v2] = facet.vertices.map(le_vec3);
            if !(v0.is_finite() && v1.is_finite() && v2.is_finite()) {
                return Err(MeshError::malformed(
                    name,
                    format!("record {index} has a non-finite vertex"),
                ));
            }
            triangles.push(Triangle::new(v0, v1, v2, le_vec3(facet.normal)));
        }

        log::info!("Loaded mesh '{}': {} triangles", name, triangles.len());
        Ok(Self::new(name, triangles))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Object-space bounding box of the whole mesh.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Nearest triangle using the BVH.
    pub fn intersect_bvh(&self, ray: &Ray, ray_t: Interval) -> TriangleQuery {
        self.bvh.intersect(&self.triangles, ray, ray_t)
    }

    /// Nearest triangle by testing every triangle.
    pub fn intersect_linear(&self, ray: &Ray, ray_t: Interval) -> TriangleQuery {
        intersect_linear(&self.triangles, ray, ray_t)
    }
}

/// Encode triangles as a binary STL buffer. Used to build test fixtures.
pub fn encode_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(STL_PREAMBLE_LEN + triangles.len() * STL_RECORD_LEN);
    bytes.extend_from_slice(&[0u8; STL_HEADER_LEN]);
    bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for [v0, v1, v2] in triangles {
        let normal = (*v1 - *v0).cross(*v2 - *v0).normalize_or_zero();
        for v in [normal, *v0, *v1, *v2] {
            for c in v.to_array() {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }
    bytes
}
