use crate::primitive::Primitive;
use geometry::bbox::{self, BBox};
use geometry::ray::Ray;
use geometry::{BuildError, Interaction};
use math::hcm::Point3;
use partition::partition;
use shape::SurfacePoint;
use std::time::Instant;

/// How the primitives of an interior node are divided among its two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMethod {
    /// Splits at the median centroid.
    EqualCounts,
    /// Splits at the midpoint of the centroid bound.
    Middle,
    /// Bucketed surface area heuristic.
    Sah,
}

impl Default for SplitMethod {
    fn default() -> Self {
        SplitMethod::Sah
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BvhConfig {
    /// Upper limit of primitives in a leaf the SAH may choose to keep; 1 to 255.
    pub max_prims_in_node: usize,
    pub split_method: SplitMethod,
}

impl Default for BvhConfig {
    fn default() -> Self {
        BvhConfig {
            max_prims_in_node: 4,
            split_method: SplitMethod::default(),
        }
    }
}

impl BvhConfig {
    pub fn with_max_prims_in_node(self, max_prims_in_node: usize) -> Self {
        BvhConfig {
            max_prims_in_node,
            ..self
        }
    }
    pub fn with_split_method(self, split_method: SplitMethod) -> Self {
        BvhConfig {
            split_method,
            ..self
        }
    }
    fn validate(&self) -> Result<(), BuildError> {
        if (1..=255).contains(&self.max_prims_in_node) {
            Ok(())
        } else {
            Err(BuildError::InvalidConfig(format!(
                "max_prims_in_node must be within 1..=255, got {}",
                self.max_prims_in_node
            )))
        }
    }
}

/// Result of a nearest-hit query: the full interaction and the primitive that was hit.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceInteraction<'a> {
    pub hit: Interaction,
    pub primitive: &'a Primitive,
}

const NUM_BUCKETS: usize = 12;
/// Below this depth the configured split method is used; deeper nodes are split at the median,
/// which bounds the depth of the tree (and the traversal stack) by `32 + log2(n)`.
const MAX_UNBALANCED_DEPTH: usize = 32;
const STACK_SIZE: usize = 64;

// Build tree
// -------------------------------------------------------------------------------------------------

struct PrimInfo {
    index: usize,
    bbox: BBox,
    centroid: Point3,
}

enum BuildNode {
    Leaf {
        bbox: BBox,
        first: usize,
        count: usize,
    },
    Interior {
        bbox: BBox,
        axis: usize,
        children: [Box<BuildNode>; 2],
    },
}

impl BuildNode {
    fn bbox(&self) -> BBox {
        match self {
            BuildNode::Leaf { bbox, .. } | BuildNode::Interior { bbox, .. } => *bbox,
        }
    }
}

struct Builder {
    config: BvhConfig,
    ordered: Vec<usize>,
    node_count: usize,
    max_depth: usize,
    forced_median: bool,
}

impl Builder {
    fn leaf(&mut self, infos: &[PrimInfo], bbox: BBox) -> BuildNode {
        let first = self.ordered.len();
        self.ordered.extend(infos.iter().map(|p| p.index));
        BuildNode::Leaf {
            bbox,
            first,
            count: infos.len(),
        }
    }

    fn build(&mut self, infos: &mut [PrimInfo], depth: usize) -> BuildNode {
        self.node_count += 1;
        self.max_depth = self.max_depth.max(depth);
        let n = infos.len();
        let bbox = infos
            .iter()
            .fold(BBox::empty(), |b, p| bbox::union(b, p.bbox));
        if n == 1 {
            return self.leaf(infos, bbox);
        }
        let centroid_bound = infos
            .iter()
            .fold(BBox::empty(), |b, p| b.union(p.centroid));
        let axis = centroid_bound.max_extent();
        if centroid_bound.max()[axis] == centroid_bound.min()[axis] {
            return self.leaf(infos, bbox);
        }

        let method = if depth >= MAX_UNBALANCED_DEPTH {
            if !self.forced_median {
                log::warn!(
                    "BVH deeper than {} levels, splitting the rest at the median",
                    MAX_UNBALANCED_DEPTH
                );
                self.forced_median = true;
            }
            SplitMethod::EqualCounts
        } else {
            self.config.split_method
        };

        let mid = match method {
            SplitMethod::EqualCounts => split_equal_counts(infos, axis),
            SplitMethod::Middle => {
                let pivot = (centroid_bound.min()[axis] + centroid_bound.max()[axis]) * 0.5;
                let (left, _) = partition(infos, |p| p.centroid[axis] < pivot);
                match left.len() {
                    0 => split_equal_counts(infos, axis),
                    mid if mid == n => split_equal_counts(infos, axis),
                    mid => mid,
                }
            }
            SplitMethod::Sah if n <= 2 => split_equal_counts(infos, axis),
            SplitMethod::Sah => {
                match split_sah(infos, axis, &bbox, &centroid_bound, self.config.max_prims_in_node)
                {
                    Some(mid) => mid,
                    None => return self.leaf(infos, bbox),
                }
            }
        };
        debug_assert!(0 < mid && mid < n);

        let (left, right) = infos.split_at_mut(mid);
        let c0 = self.build(left, depth + 1);
        let c1 = self.build(right, depth + 1);
        BuildNode::Interior {
            bbox: bbox::union(c0.bbox(), c1.bbox()),
            axis,
            children: [Box::new(c0), Box::new(c1)],
        }
    }
}

/// Places the median (by centroid along `axis`) in the middle and returns its index.
fn split_equal_counts(infos: &mut [PrimInfo], axis: usize) -> usize {
    let mid = infos.len() / 2;
    infos.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    mid
}

/// Chooses the cheapest of the bucket boundaries by the surface area heuristic. Returns `None`
/// if keeping the range as a leaf is no more expensive and the leaf is small enough.
fn split_sah(
    infos: &mut [PrimInfo], axis: usize, bbox: &BBox, centroid_bound: &BBox,
    max_prims_in_node: usize,
) -> Option<usize> {
    let n = infos.len();
    let total_area = bbox.area();
    if !(total_area > 0.0) {
        return Some(split_equal_counts(infos, axis));
    }
    let bucket_of = |p: &PrimInfo| {
        let offset = centroid_bound.offset(p.centroid)[axis];
        ((offset * NUM_BUCKETS as f32) as usize).min(NUM_BUCKETS - 1)
    };

    let mut counts = [0usize; NUM_BUCKETS];
    let mut bounds = [BBox::empty(); NUM_BUCKETS];
    for p in infos.iter() {
        let b = bucket_of(p);
        counts[b] += 1;
        bounds[b] = bbox::union(bounds[b], p.bbox);
    }

    let side_cost = |range: std::ops::Range<usize>| {
        let count: usize = counts[range.clone()].iter().sum();
        if count == 0 {
            return 0.0;
        }
        let area = bounds[range].iter().fold(BBox::empty(), |a, b| bbox::union(a, *b)).area();
        count as f32 * area
    };
    let (min_bucket, min_cost) = (0..NUM_BUCKETS - 1)
        .map(|i| (i, 1.0 + (side_cost(0..i + 1) + side_cost(i + 1..NUM_BUCKETS)) / total_area))
        .fold((0, f32::INFINITY), |best, candidate| {
            if candidate.1 < best.1 {
                candidate
            } else {
                best
            }
        });

    if n <= max_prims_in_node && min_cost >= n as f32 {
        return None;
    }
    let (left, _) = partition(infos, |p| bucket_of(p) <= min_bucket);
    match left.len() {
        0 => Some(split_equal_counts(infos, axis)),
        mid if mid == n => Some(split_equal_counts(infos, axis)),
        mid => Some(mid),
    }
}

// Flattened tree
// -------------------------------------------------------------------------------------------------

/// A node of the depth-first flattened tree. The first child of an interior node immediately
/// follows it; `offset` is the index of the second child for interior nodes, and the index of
/// the first primitive for leaves.
#[derive(Debug, Clone, Copy)]
struct LinearNode {
    bbox: BBox,
    offset: u32,
    n_primitives: u32,
    axis: u8,
}

impl LinearNode {
    fn is_leaf(&self) -> bool {
        self.n_primitives > 0
    }
}

fn flatten(node: &BuildNode, nodes: &mut Vec<LinearNode>) -> usize {
    let index = nodes.len();
    nodes.push(LinearNode {
        bbox: node.bbox(),
        offset: 0,
        n_primitives: 0,
        axis: 0,
    });
    match node {
        BuildNode::Leaf { first, count, .. } => {
            nodes[index].offset = *first as u32;
            nodes[index].n_primitives = *count as u32;
        }
        BuildNode::Interior { axis, children, .. } => {
            flatten(&children[0], nodes);
            let second = flatten(&children[1], nodes);
            nodes[index].offset = second as u32;
            nodes[index].axis = *axis as u8;
        }
    }
    index
}

/// Bounding-volume hierarchy over the primitives of a scene, flattened into an array of nodes.
/// Read-only once built.
#[derive(Debug)]
pub struct Bvh {
    primitives: Vec<Primitive>,
    nodes: Vec<LinearNode>,
    depth: usize,
}

impl Bvh {
    pub fn build(primitives: Vec<Primitive>, config: BvhConfig) -> Result<Bvh, BuildError> {
        config.validate()?;
        if primitives.len() > u32::MAX as usize {
            return Err(BuildError::InvalidConfig(format!(
                "too many primitives: {}",
                primitives.len()
            )));
        }
        if primitives.is_empty() {
            log::info!("BVH built over no primitives");
            return Ok(Bvh {
                primitives,
                nodes: vec![],
                depth: 0,
            });
        }

        let start = Instant::now();
        let mut infos: Vec<_> = primitives
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let bbox = p.bbox();
                PrimInfo {
                    index,
                    bbox,
                    centroid: bbox.midpoint(),
                }
            })
            .collect();
        let mut builder = Builder {
            config,
            ordered: Vec::with_capacity(primitives.len()),
            node_count: 0,
            max_depth: 0,
            forced_median: false,
        };
        let root = builder.build(&mut infos, 0);
        assert!(builder.max_depth < STACK_SIZE);

        let mut nodes = Vec::with_capacity(builder.node_count);
        flatten(&root, &mut nodes);
        let primitives: Vec<_> = builder.ordered.iter().map(|&i| primitives[i].clone()).collect();

        log::info!(
            "BVH built over {} primitives: {} nodes, depth {}, {:?} split, took {:.2?}",
            primitives.len(),
            nodes.len(),
            builder.max_depth,
            config.split_method,
            start.elapsed()
        );
        Ok(Bvh {
            primitives,
            nodes,
            depth: builder.max_depth,
        })
    }

    pub fn bbox(&self) -> BBox {
        self.nodes.first().map_or(BBox::empty(), |root| root.bbox)
    }

    /// Primitives in traversal order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Walks the nodes whose boxes `ray` passes through, near child first, and calls `visit` on
    /// each primitive of the leaves reached. `visit` may shrink the extent of the ray, which prunes
    /// the boxes still to be tested. Stops early if `visit` returns true.
    fn traverse<F>(&self, ray: &mut Ray, mut visit: F)
    where
        F: FnMut(usize, &Primitive, &mut Ray) -> bool,
    {
        if self.nodes.is_empty() {
            return;
        }
        let dir_is_neg = [ray.dir.x < 0.0, ray.dir.y < 0.0, ray.dir.z < 0.0];
        let mut stack = [0usize; STACK_SIZE];
        let mut top = 0;
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.bbox.intersect(ray) {
                if node.is_leaf() {
                    let first = node.offset as usize;
                    for i in first..first + node.n_primitives as usize {
                        if visit(i, &self.primitives[i], ray) {
                            return;
                        }
                    }
                } else if dir_is_neg[node.axis as usize] {
                    stack[top] = current + 1;
                    top += 1;
                    current = node.offset as usize;
                    continue;
                } else {
                    stack[top] = node.offset as usize;
                    top += 1;
                    current += 1;
                    continue;
                }
            }
            if top == 0 {
                break;
            }
            top -= 1;
            current = stack[top];
        }
    }

    /// Finds the nearest hit along `ray` and shrinks `ray.t_max` to it.
    pub fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction<'_>> {
        let mut nearest: Option<(usize, SurfacePoint)> = None;
        self.traverse(ray, |i, prim, ray| {
            if let Some(hit) = prim.shape.intersect(ray) {
                ray.t_max = hit.t;
                nearest = Some((i, hit));
            }
            false
        });
        let (index, hit) = nearest?;
        let primitive = &self.primitives[index];
        Some(SurfaceInteraction {
            hit: primitive.shape.interaction(ray, &hit),
            primitive,
        })
    }

    /// Returns true if anything blocks `ray` within its extent.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        let mut occluded = false;
        self.traverse(&mut ray.clone(), |_, prim, ray| {
            occluded = prim.shape.occludes(ray);
            occluded
        });
        occluded
    }
}
