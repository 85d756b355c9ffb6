//! Bounding Volume Hierarchy over a mesh's triangles.
//!
//! Nodes live in a flat arena and refer to their children by index. Leaves
//! cover a contiguous range of a triangle-index permutation, so triangles
//! themselves are never reordered and keep their file-order indices.

use cosmo_math::{Aabb, Interval, Ray, Triangle, TriangleHit};

/// Maximum triangles per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with triangles.
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Internal node; `left` and `right` index into the node arena.
    Branch { bbox: Aabb, left: u32, right: u32 },
    /// Leaf covering `indices[start..start + count]`.
    Leaf { bbox: Aabb, start: u32, count: u32 },
}

impl BvhNode {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => *bbox,
        }
    }
}

/// Nearest triangle found by a query: its index in the mesh and the hit.
pub type TriangleQuery = Option<(u32, TriangleHit)>;

/// Returns true if `candidate` should replace `best`.
///
/// Strictly closer hits win; on an exact tie the lower triangle index wins,
/// which makes the result independent of traversal order.
#[inline]
pub fn is_closer(candidate: (u32, TriangleHit), best: &TriangleQuery) -> bool {
    match best {
        None => true,
        Some((index, hit)) => {
            candidate.1.t < hit.t || (candidate.1.t == hit.t && candidate.0 < *index)
        }
    }
}

/// Immutable BVH built once per mesh.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

impl Bvh {
    /// Build a BVH over `triangles` using a spatial median split.
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(triangles.len().div_ceil(LEAF_MAX_SIZE) * 2),
            indices: (0..triangles.len() as u32).collect(),
        };
        if triangles.is_empty() {
            return bvh;
        }

        let boxes: Vec<Aabb> = triangles.iter().map(Triangle::bounding_box).collect();
        let centroids: Vec<_> = triangles.iter().map(Triangle::centroid).collect();
        bvh.build_range(&boxes, &centroids, 0, triangles.len());
        bvh
    }

    /// Recursively build the node covering `indices[start..end]`, returning its index.
    fn build_range(
        &mut self,
        boxes: &[Aabb],
        centroids: &[cosmo_math::Vec3],
        start: usize,
        end: usize,
    ) -> u32 {
        let range = &mut self.indices[start..end];
        let bbox = range
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &boxes[i as usize]));

        let node_index = self.nodes.len() as u32;
        if range.len() <= LEAF_MAX_SIZE {
            self.nodes.push(BvhNode::Leaf {
                bbox,
                start: start as u32,
                count: range.len() as u32,
            });
            return node_index;
        }

        // Split axis is the one with the widest spread of centroids
        let axis = Aabb::from_point_cloud(range.iter().map(|&i| centroids[i as usize]))
            .longest_axis();

        let mid = range.len() / 2;
        range.select_nth_unstable_by(mid, |&a, &b| {
            centroids[a as usize][axis]
                .total_cmp(&centroids[b as usize][axis])
                .then(a.cmp(&b))
        });

        // Reserve the slot, children are filled in after recursion
        self.nodes.push(BvhNode::Leaf {
            bbox,
            start: start as u32,
            count: 0,
        });
        let left = self.build_range(boxes, centroids, start, start + mid);
        let right = self.build_range(boxes, centroids, start + mid, end);
        self.nodes[node_index as usize] = BvhNode::Branch { bbox, left, right };

        node_index
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Triangle indices referenced by a leaf.
    pub fn leaf_indices(&self, start: u32, count: u32) -> &[u32] {
        &self.indices[start as usize..(start + count) as usize]
    }

    pub fn bounding_box(&self) -> Aabb {
        self.nodes
            .first()
            .map(BvhNode::bounding_box)
            .unwrap_or(Aabb::EMPTY)
    }

    /// Number of levels from the root to the deepest leaf.
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[BvhNode], index: u32) -> usize {
            match &nodes[index as usize] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Branch { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, BvhNode::Leaf { .. }))
            .count()
    }

    /// Nearest triangle hit within `ray_t`, skipping subtrees whose box the ray misses.
    pub fn intersect(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> TriangleQuery {
        let mut best = None;
        if !self.nodes.is_empty() {
            self.visit(0, triangles, ray, ray_t, &mut best);
        }
        best
    }

    fn visit(
        &self,
        node_index: u32,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
        best: &mut TriangleQuery,
    ) {
        let node = &self.nodes[node_index as usize];

        // Boxes entered exactly at the best distance are still visited, a
        // lower-indexed triangle there may win the tie.
        let reach = best.map_or(ray_t.max, |(_, hit)| hit.t);
        if node
            .bounding_box()
            .hit_distance(ray, Interval::new(ray_t.min, reach))
            .is_none()
        {
            return;
        }

        match *node {
            BvhNode::Leaf { start, count, .. } => {
                for &index in self.leaf_indices(start, count) {
                    if let Some(hit) = triangles[index as usize].intersect(ray, ray_t) {
                        if is_closer((index, hit), best) {
                            *best = Some((index, hit));
                        }
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                self.visit(left, triangles, ray, ray_t, best);
                self.visit(right, triangles, ray, ray_t, best);
            }
        }
    }
}

/// Brute-force nearest hit over every triangle, in index order.
pub fn intersect_linear(triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> TriangleQuery {
    let mut best = None;
    for (index, triangle) in triangles.iter().enumerate() {
        if let Some(hit) = triangle.intersect(ray, ray_t) {
            if is_closer((index as u32, hit), &best) {
                best = Some((index as u32, hit));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmo_math::Vec3;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A row of unit quads (two triangles each) along X at z = 0.
    fn quad_strip(count: usize) -> Vec<Triangle> {
        (0..count)
            .flat_map(|i| {
                let x = i as f32 * 2.0;
                [
                    Triangle::new(
                        Vec3::new(x, 0.0, 0.0),
                        Vec3::new(x + 1.0, 0.0, 0.0),
                        Vec3::new(x + 1.0, 1.0, 0.0),
                        Vec3::Z,
                    ),
                    Triangle::new(
                        Vec3::new(x, 0.0, 0.0),
                        Vec3::new(x + 1.0, 1.0, 0.0),
                        Vec3::new(x, 1.0, 0.0),
                        Vec3::Z,
                    ),
                ]
            })
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.nodes().is_empty());
        assert_eq!(bvh.depth(), 0);

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.intersect(&[], &ray, Interval::new(0.0, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_small_mesh_is_single_leaf() {
        let triangles = quad_strip(2);
        let bvh = Bvh::build(&triangles);

        assert_eq!(bvh.nodes().len(), 1);
        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { count: 4, .. }));
    }

    #[test]
    fn test_tree_is_balanced_and_covers_every_triangle() {
        init_logging();
        let triangles = quad_strip(64);
        let bvh = Bvh::build(&triangles);

        // 128 triangles with at most 4 per leaf, median split: 32 leaves, depth 6
        assert_eq!(bvh.leaf_count(), 32);
        assert_eq!(bvh.depth(), 6);

        let mut seen: Vec<u32> = bvh
            .nodes()
            .iter()
            .filter_map(|node| match *node {
                BvhNode::Leaf { start, count, .. } => Some(bvh.leaf_indices(start, count).to_vec()),
                BvhNode::Branch { .. } => None,
            })
            .flatten()
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..128).collect::<Vec<u32>>());
    }

    #[test]
    fn test_branch_boxes_contain_children() {
        let triangles = quad_strip(20);
        let bvh = Bvh::build(&triangles);

        for node in bvh.nodes() {
            if let BvhNode::Branch { bbox, left, right } = *node {
                for child in [left, right] {
                    let child_box = bvh.nodes()[child as usize].bounding_box();
                    assert!(bbox.min().cmple(child_box.min()).all());
                    assert!(bbox.max().cmpge(child_box.max()).all());
                }
            }
        }
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let triangles = quad_strip(32);
        let bvh = Bvh::build(&triangles);
        let ray_t = Interval::new(0.001, f32::INFINITY);

        for step in 0..200 {
            let x = step as f32 * 0.33 - 2.0;
            let y = (step % 7) as f32 * 0.2 - 0.1;
            let ray = Ray::new(Vec3::new(x, y, 5.0), Vec3::new(0.05, 0.01, -1.0));

            assert_eq!(
                bvh.intersect(&triangles, &ray, ray_t),
                intersect_linear(&triangles, &ray, ray_t),
                "mismatch for ray at x={x}, y={y}"
            );
        }
    }

    #[test]
    fn test_shared_edge_tie_goes_to_lower_index() {
        let triangles = quad_strip(1);
        // Straight down onto the shared diagonal of the first quad
        let ray = Ray::new(Vec3::new(0.5, 0.5, 1.0), -Vec3::Z);
        let ray_t = Interval::new(0.001, f32::INFINITY);

        let (index, hit) = intersect_linear(&triangles, &ray, ray_t).expect("should hit the quad");
        assert_eq!(index, 0);
        assert!((hit.t - 1.0).abs() < 1e-6);

        let bvh = Bvh::build(&triangles);
        assert_eq!(bvh.intersect(&triangles, &ray, ray_t).map(|(i, _)| i), Some(0));
    }
}
