//! Regular octree over a bounding box.
//!
//! Nodes are addressed by integer ids: the root is 1, child `c` (0..8) of node `id` is
//! `id * 8 + c` and the parent is `id / 8`. The octal digits of an id below the leading 1
//! therefore spell the path from the root, one child index per level.
//! Child index bits: bit 0 selects the upper half in x, bit 1 in y, bit 2 in z.

use index_vec::IndexVec;

use crate::util::{Stats, bit_iter};

use super::{FloatType, WorldBox, WorldPoint};

pub type OctreeId = u64;

pub const ROOT_ID: OctreeId = 1;

/// Deepest level whose ids still fit into `OctreeId`.
pub const MAX_DEPTH: u32 = (OctreeId::BITS - 1) / 3;

/// Id of child `child` of node `id`.
pub fn lower(id: OctreeId, child: usize) -> OctreeId {
    debug_assert!(child < 8);
    id * 8 + child as OctreeId
}

/// Id of the parent of node `id`. The root's parent is 0, which is not a valid id.
pub fn super_id(id: OctreeId) -> OctreeId {
    id / 8
}

/// Level of a node, root is level 0.
pub fn level(id: OctreeId) -> u32 {
    debug_assert!(id >= ROOT_ID);
    (OctreeId::BITS - 1 - id.leading_zeros()) / 3
}

/// Child index taken at `depth` (0 = first step below the root) on the path to `id`.
fn path_digit(id: OctreeId, depth: u32) -> usize {
    let shift = 3 * (level(id) - 1 - depth);
    ((id >> shift) & 7) as usize
}

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
}

#[derive(Clone, Debug)]
pub struct OctreeNode<T> {
    pub id: OctreeId,
    pub bounds: WorldBox,
    pub children: Option<[NodeIdx; 8]>,
    pub items: Vec<T>,
}

impl<T> OctreeNode<T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct Octree<T> {
    nodes: IndexVec<NodeIdx, OctreeNode<T>>,
    depth: u32,
}

impl<T> Octree<T> {
    /// Subdivides `bounds` into 8 equal boxes recursively, `depth` levels deep.
    pub fn build(bounds: WorldBox, depth: u32) -> Octree<T> {
        assert2::assert!(depth <= MAX_DEPTH);
        let mut octree = Octree {
            nodes: IndexVec::new(),
            depth,
        };
        octree.build_recursive(ROOT_ID, bounds);
        octree
    }

    fn build_recursive(&mut self, id: OctreeId, bounds: WorldBox) -> NodeIdx {
        let node_index = self.nodes.push(OctreeNode {
            id,
            bounds: bounds.clone(),
            children: None,
            items: Vec::new(),
        });

        if level(id) < self.depth {
            let children = std::array::from_fn(|c| {
                self.build_recursive(lower(id, c), child_bounds(&bounds, c))
            });
            self.nodes[node_index].children = Some(children);
        }

        node_index
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bounds(&self) -> &WorldBox {
        &self.nodes[NodeIdx::from_raw(0)].bounds
    }

    fn root(&self) -> &OctreeNode<T> {
        &self.nodes[NodeIdx::from_raw(0)]
    }

    pub fn node_at(&self, index: NodeIdx) -> &OctreeNode<T> {
        &self.nodes[index]
    }

    /// Looks up a node by its id, walking the path encoded in the id's digits.
    pub fn node(&self, id: OctreeId) -> Option<&OctreeNode<T>> {
        if id < ROOT_ID || level(id) > self.depth {
            return None;
        }
        let mut node = self.root();
        for depth in 0..level(id) {
            let children = node.children.as_ref()?;
            node = &self.nodes[children[path_digit(id, depth)]];
        }
        debug_assert!(node.id == id);
        Some(node)
    }

    /// Id of the node containing the point, descending at most to `level_of_detail`
    /// or to a leaf, whichever comes first.
    pub fn find_leaf(
        &self,
        x: FloatType,
        y: FloatType,
        z: FloatType,
        level_of_detail: u32,
    ) -> Option<OctreeId> {
        let p = WorldPoint::new(x, y, z);
        let mut node = self.root();
        if !node.bounds.contains(&p) {
            return None;
        }

        while let Some(children) = node.children.as_ref() {
            if level(node.id) >= level_of_detail {
                break;
            }
            let mid = node.bounds.center();
            let c = (0..3)
                .filter(|axis| p[*axis] >= mid[*axis])
                .fold(0, |acc, axis| acc | (1 << axis));
            node = &self.nodes[children[c]];
        }

        Some(node.id)
    }

    /// Leaves whose boxes the segment from `p0` to `p1` passes through.
    pub fn segment_leaves(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        parallel_epsilon: FloatType,
    ) -> Vec<NodeIdx> {
        let mut ret = Vec::new();
        let mut stack = vec![NodeIdx::from_raw(0)];

        if !segment_touches(&self.root().bounds, p0, p1, parallel_epsilon) {
            return ret;
        }

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let Some(children) = node.children.as_ref() else {
                ret.push(index);
                continue;
            };

            let mask = children
                .iter()
                .enumerate()
                .filter(|(_, child)| {
                    segment_touches(&self.nodes[**child].bounds, p0, p1, parallel_epsilon)
                })
                .fold(0u8, |acc, (c, _)| acc | (1 << c));

            stack.extend(bit_iter(mask).map(|c| children[c]));
        }

        ret
    }

    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode<T>> {
        self.nodes.iter().filter(|node| node.is_leaf())
    }

    /// Statistics of leaf depth and of the number of items per leaf.
    pub fn statistics(&self) -> (Stats, Stats) {
        let mut depth = Stats::default();
        let mut fill = Stats::default();
        for leaf in self.leaves() {
            depth.add_sample(level(leaf.id));
            fill.add_sample(leaf.items.len() as FloatType);
        }
        (depth, fill)
    }
}

impl<T: Clone> Octree<T> {
    /// Adds the item to every leaf whose box overlaps `item_bounds`.
    pub fn insert(&mut self, item: T, item_bounds: &WorldBox) {
        let mut stack = vec![NodeIdx::from_raw(0)];
        while let Some(index) = stack.pop() {
            let overlap = self.nodes[index].bounds.clone() * item_bounds.clone();
            if overlap.is_empty() {
                continue;
            }
            let children = self.nodes[index].children;
            match children {
                Some(children) => stack.extend(children),
                None => self.nodes[index].items.push(item.clone()),
            }
        }
    }
}

fn child_bounds(bounds: &WorldBox, child: usize) -> WorldBox {
    let mid = bounds.center();
    let mut ret = bounds.clone();
    for axis in 0..3 {
        if child & (1 << axis) == 0 {
            ret.max[axis] = mid[axis];
        } else {
            ret.min[axis] = mid[axis];
        }
    }
    ret
}

fn segment_touches(
    bounds: &WorldBox,
    p0: &WorldPoint,
    p1: &WorldPoint,
    parallel_epsilon: FloatType,
) -> bool {
    if (p1 - p0).norm() < parallel_epsilon {
        return bounds.contains(p0);
    }
    bounds
        .tentry_texit(p0, p1, 0.0, 1.0, parallel_epsilon)
        .is_some_and(|hit| hit.t_exit >= 0.0 && hit.t_entry <= 1.0)
}
