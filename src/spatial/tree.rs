//! Arena-backed spatial partition tree
//!
//! Nodes live in a slot vector owned by the tree and refer to each other by
//! [`NodeId`]. A parent owns its children: collapsing a node frees their
//! slots. Parent links are plain indices used for upward walks only.
//!
//! Insertion pushes an item down only when exactly one child region
//! intersects its shape. Items straddling several children stay at the
//! current node, so every item is stored exactly once.

use crate::geometry::{Point2, Rectangle, Shape};

use super::factory::NodeFactory;
use super::iter::{
    Ancestors, BreadthFirstNodes, DataIter, DepthFirstNodes, FrustumCuller, TreeData,
};

/// Anything the tree can index by shape
pub trait ShapedObject {
    /// Shape in world coordinates
    fn shape(&self) -> Shape;
}

/// Index of a node slot in a [`SpatialTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One region of the partition
#[derive(Debug, Clone)]
pub struct TreeNode<D, P> {
    id: NodeId,
    bounds: Rectangle,
    partition: P,
    depth: u32,
    parent: Option<NodeId>,
    children: Option<Vec<NodeId>>,
    data: Vec<D>,
}

impl<D, P: Copy> TreeNode<D, P> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn bounds(&self) -> &Rectangle {
        &self.bounds
    }

    pub fn partition(&self) -> P {
        self.partition
    }

    /// Distance from the root (the root has depth 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Child ids, empty for a leaf
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// A leaf holding no data
    pub fn is_empty(&self) -> bool {
        self.is_leaf() && self.data.is_empty()
    }

    /// Items stored at this node (not including descendants)
    pub fn data(&self) -> &[D] {
        &self.data
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }
}

/// Hierarchical spatial partition over a fixed world rectangle
#[derive(Debug, Clone)]
pub struct SpatialTree<D, F: NodeFactory> {
    factory: F,
    nodes: Vec<Option<TreeNode<D, F::Partition>>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    len: usize,
}

impl<D, F: NodeFactory> SpatialTree<D, F> {
    /// Create an uninitialized tree; call [`Self::initialize`] before inserting
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Create a tree covering `bounds`
    pub fn with_bounds(factory: F, bounds: Rectangle) -> Self {
        let mut tree = Self::new(factory);
        tree.initialize(bounds);
        tree
    }

    /// Reset to a single empty root covering `world`
    pub fn initialize(&mut self, world: Rectangle) {
        self.nodes.clear();
        self.free.clear();
        self.len = 0;
        let partition = self.factory.partition_for(None);
        self.root = Some(self.alloc(world, partition, 0, None));
    }

    /// Remove every item, keeping the world bounds
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            let bounds = self.node(root).bounds;
            self.initialize(bounds);
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// World bounds; an empty rectangle before initialization
    pub fn bounds(&self) -> Rectangle {
        match self.root {
            Some(root) => self.node(root).bounds,
            None => Rectangle::new(Point2::ZERO, Point2::ZERO),
        }
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Look up a node; panics on a stale id
    pub fn node(&self, id: NodeId) -> &TreeNode<D, F::Partition> {
        match self.nodes.get(id.0).and_then(Option::as_ref) {
            Some(node) => node,
            None => panic!("stale spatial tree node {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode<D, F::Partition> {
        match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("stale spatial tree node {id:?}"),
        }
    }

    fn alloc(
        &mut self,
        bounds: Rectangle,
        partition: F::Partition,
        depth: u32,
        parent: Option<NodeId>,
    ) -> NodeId {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.nodes.push(None);
                self.nodes.len() - 1
            }
        };
        let id = NodeId(slot);
        self.nodes[slot] = Some(TreeNode {
            id,
            bounds,
            partition,
            depth,
            parent,
            children: None,
            data: Vec::new(),
        });
        id
    }

    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.nodes[id.0].take() {
            for child in node.children.into_iter().flatten() {
                self.release(child);
            }
            self.free.push(id.0);
        }
    }

    /// The only child whose region intersects `shape`, if exactly one does
    fn unique_child(&self, id: NodeId, shape: &Shape) -> Option<NodeId> {
        let mut selected = None;
        for &child in self.node(id).children() {
            if Shape::Rectangle(self.node(child).bounds).intersects(shape) {
                if selected.is_some() {
                    return None;
                }
                selected = Some(child);
            }
        }
        selected
    }

    fn create_children(&mut self, id: NodeId) {
        let (bounds, partition, depth) = {
            let node = self.node(id);
            (node.bounds, node.partition, node.depth)
        };
        let child_partition = self.factory.partition_for(Some(partition));
        let children = self
            .factory
            .split(&bounds, partition)
            .into_iter()
            .map(|region| self.alloc(region, child_partition, depth + 1, Some(id)))
            .collect();
        self.node_mut(id).children = Some(children);
    }

    /// Drop the children of `id` when all of them are empty leaves
    fn collapse_if_empty(&mut self, id: NodeId) -> bool {
        let Some(children) = self.node(id).children.clone() else {
            return false;
        };
        if !children.iter().all(|&c| self.node(c).is_empty()) {
            return false;
        }
        for child in children {
            self.release(child);
        }
        self.node_mut(id).children = None;
        true
    }

    /// Nodes in level order
    pub fn nodes(&self) -> BreadthFirstNodes<'_, D, F> {
        BreadthFirstNodes::new(self)
    }

    /// Nodes in pre-order
    pub fn depth_first_nodes(&self) -> DepthFirstNodes<'_, D, F> {
        DepthFirstNodes::new(self)
    }

    /// Leaf nodes in pre-order
    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode<D, F::Partition>> + '_ {
        self.depth_first_nodes().filter(|n| n.is_leaf())
    }

    /// Nodes from `id` up to the root, `id` included
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, D, F> {
        Ancestors::new(self, id)
    }

    /// Every item stored on the path from `id` up to the root
    pub fn data_to_root(&self, id: NodeId) -> impl Iterator<Item = &D> + '_ {
        self.ancestors(id).flat_map(|n| n.data.iter())
    }

    /// All items, depth-first
    pub fn data_iter(&self) -> DataIter<'_, D, F> {
        DataIter::new(self)
    }

    /// Items whose shape intersects `shape`, skipping subtrees outside it
    pub fn data_iter_in(&self, shape: &Shape) -> FrustumCuller<'_, D, F> {
        FrustumCuller::new(self, *shape)
    }

    /// Restartable view over all items
    pub fn data(&self) -> TreeData<'_, D, F> {
        TreeData::new(self)
    }
}

impl<D, F> SpatialTree<D, F>
where
    D: ShapedObject + PartialEq,
    F: NodeFactory,
{
    /// Insert an item. Returns false if the tree is uninitialized or the
    /// item is already stored at the node it lands on.
    pub fn add_data(&mut self, data: D) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let added = self.add_at(root, data);
        if added {
            self.len += 1;
        }
        added
    }

    fn add_at(&mut self, id: NodeId, data: D) -> bool {
        let node = self.node(id);
        if node.is_leaf() {
            let full = node.data.len() >= self.factory.max_data_count_per_node();
            if !full || node.depth >= self.factory.max_depth() {
                return self.store_local(id, data);
            }
            self.create_children(id);
            let existing = std::mem::take(&mut self.node_mut(id).data);
            let mut kept = Vec::with_capacity(existing.len());
            for item in existing {
                match self.unique_child(id, &item.shape()) {
                    Some(child) => {
                        self.add_at(child, item);
                    }
                    None => kept.push(item),
                }
            }
            self.node_mut(id).data = kept;
        }
        match self.unique_child(id, &data.shape()) {
            Some(child) => self.add_at(child, data),
            None => self.store_local(id, data),
        }
    }

    fn store_local(&mut self, id: NodeId, data: D) -> bool {
        let node = self.node_mut(id);
        if node.data.contains(&data) {
            return false;
        }
        node.data.push(data);
        true
    }

    /// Remove an item, collapsing subtrees left without data
    pub fn remove_data(&mut self, data: &D) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let removed = self.remove_at(root, data);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn remove_at(&mut self, id: NodeId, data: &D) -> bool {
        let removed = if self.node(id).is_leaf() {
            self.remove_local(id, data)
        } else {
            match self.unique_child(id, &data.shape()) {
                Some(child) if self.remove_at(child, data) => true,
                _ => self.remove_local(id, data),
            }
        };
        if removed {
            self.collapse_if_empty(id);
        }
        removed
    }

    fn remove_local(&mut self, id: NodeId, data: &D) -> bool {
        let node = self.node_mut(id);
        match node.data.iter().position(|d| d == data) {
            Some(index) => {
                node.data.remove(index);
                true
            }
            None => false,
        }
    }
}
