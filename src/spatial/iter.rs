//! Node and data iterators over a [`SpatialTree`]
//!
//! All iterators borrow the tree, so structural mutation during iteration
//! is ruled out by the borrow checker. Each call on the tree starts a fresh
//! walk.

use std::collections::VecDeque;

use crate::geometry::Shape;

use super::factory::NodeFactory;
use super::tree::{NodeId, ShapedObject, SpatialTree, TreeNode};

type Node<'a, D, F> = &'a TreeNode<D, <F as NodeFactory>::Partition>;

/// Level-order walk over nodes
pub struct BreadthFirstNodes<'a, D, F: NodeFactory> {
    tree: &'a SpatialTree<D, F>,
    queue: VecDeque<NodeId>,
}

impl<'a, D, F: NodeFactory> BreadthFirstNodes<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>) -> Self {
        Self {
            tree,
            queue: tree.root().into_iter().collect(),
        }
    }
}

impl<'a, D, F: NodeFactory> Iterator for BreadthFirstNodes<'a, D, F> {
    type Item = Node<'a, D, F>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let node = self.tree.node(id);
        self.queue.extend(node.children().iter().copied());
        Some(node)
    }
}

/// Pre-order walk over nodes
pub struct DepthFirstNodes<'a, D, F: NodeFactory> {
    tree: &'a SpatialTree<D, F>,
    stack: Vec<NodeId>,
}

impl<'a, D, F: NodeFactory> DepthFirstNodes<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>) -> Self {
        Self {
            tree,
            stack: tree.root().into_iter().collect(),
        }
    }
}

impl<'a, D, F: NodeFactory> Iterator for DepthFirstNodes<'a, D, F> {
    type Item = Node<'a, D, F>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        // Reversed so the first child is visited first
        self.stack.extend(node.children().iter().rev().copied());
        Some(node)
    }
}

/// Walk from a node up to the root
pub struct Ancestors<'a, D, F: NodeFactory> {
    tree: &'a SpatialTree<D, F>,
    next: Option<NodeId>,
}

impl<'a, D, F: NodeFactory> Ancestors<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>, from: NodeId) -> Self {
        Self {
            tree,
            next: Some(from),
        }
    }
}

impl<'a, D, F: NodeFactory> Iterator for Ancestors<'a, D, F> {
    type Item = Node<'a, D, F>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node(self.next?);
        self.next = node.parent();
        Some(node)
    }
}

/// Every stored item, flattened from a depth-first node walk
pub struct DataIter<'a, D, F: NodeFactory> {
    nodes: DepthFirstNodes<'a, D, F>,
    current: std::slice::Iter<'a, D>,
}

impl<'a, D, F: NodeFactory> DataIter<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>) -> Self {
        Self {
            nodes: DepthFirstNodes::new(tree),
            current: [].iter(),
        }
    }
}

impl<'a, D, F: NodeFactory> Iterator for DataIter<'a, D, F> {
    type Item = &'a D;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(item);
            }
            self.current = self.nodes.next()?.data().iter();
        }
    }
}

/// Branch-and-bound walk yielding items that intersect a query shape.
///
/// The root is always visited; a child subtree is entered only when the
/// child's bounds intersect the query.
pub struct FrustumCuller<'a, D, F: NodeFactory> {
    tree: &'a SpatialTree<D, F>,
    query: Shape,
    stack: Vec<NodeId>,
    current: std::slice::Iter<'a, D>,
}

impl<'a, D, F: NodeFactory> FrustumCuller<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>, query: Shape) -> Self {
        Self {
            tree,
            query,
            stack: tree.root().into_iter().collect(),
            current: [].iter(),
        }
    }
}

impl<'a, D: ShapedObject, F: NodeFactory> Iterator for FrustumCuller<'a, D, F> {
    type Item = &'a D;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            for item in self.current.by_ref() {
                if item.shape().intersects(&self.query) {
                    return Some(item);
                }
            }
            let node = self.tree.node(self.stack.pop()?);
            for &child in node.children().iter().rev() {
                let bounds = Shape::Rectangle(*self.tree.node(child).bounds());
                if bounds.intersects(&self.query) {
                    self.stack.push(child);
                }
            }
            self.current = node.data().iter();
        }
    }
}

/// Restartable sequence over all items; every iteration re-walks the tree
pub struct TreeData<'a, D, F: NodeFactory> {
    tree: &'a SpatialTree<D, F>,
}

impl<'a, D, F: NodeFactory> TreeData<'a, D, F> {
    pub(crate) fn new(tree: &'a SpatialTree<D, F>) -> Self {
        Self { tree }
    }

    pub fn iter(&self) -> DataIter<'a, D, F> {
        DataIter::new(self.tree)
    }
}

impl<D, F: NodeFactory> Clone for TreeData<'_, D, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, F: NodeFactory> Copy for TreeData<'_, D, F> {}

impl<'a, D, F: NodeFactory> IntoIterator for TreeData<'a, D, F> {
    type Item = &'a D;
    type IntoIter = DataIter<'a, D, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
