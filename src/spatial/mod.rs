//! Spatial indexing: generic partition tree with quad and binary branching

pub mod factory;
pub mod iter;
pub mod tree;

use crate::geometry::{Rectangle, Shape};

pub use factory::{
    BinaryTreeFactory, NodeFactory, QuadTreeFactory, Quadrants, SeparationLine, DEFAULT_MAX_DEPTH,
};
pub use iter::{Ancestors, BreadthFirstNodes, DataIter, DepthFirstNodes, FrustumCuller, TreeData};
pub use tree::{NodeId, ShapedObject, SpatialTree, TreeNode};

/// Four-way tree
pub type QuadTree<D> = SpatialTree<D, QuadTreeFactory>;

/// Two-way tree with alternating separation lines
pub type BinaryTree<D> = SpatialTree<D, BinaryTreeFactory>;

/// Object-safe view of a spatial index, so a world can pick its tree at run time
pub trait SpatialDataStructure<D> {
    /// Reset to an empty index over `world`
    fn initialize(&mut self, world: Rectangle);

    fn bounds(&self) -> Rectangle;

    fn add_data(&mut self, data: D) -> bool;

    fn remove_data(&mut self, data: &D) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items
    fn data_iter(&self) -> Box<dyn Iterator<Item = &D> + '_>;

    /// Items intersecting `shape`
    fn data_iter_in(&self, shape: &Shape) -> Box<dyn Iterator<Item = &D> + '_>;
}

impl<D, F> SpatialDataStructure<D> for SpatialTree<D, F>
where
    D: ShapedObject + PartialEq,
    F: NodeFactory,
{
    fn initialize(&mut self, world: Rectangle) {
        SpatialTree::initialize(self, world);
    }

    fn bounds(&self) -> Rectangle {
        SpatialTree::bounds(self)
    }

    fn add_data(&mut self, data: D) -> bool {
        SpatialTree::add_data(self, data)
    }

    fn remove_data(&mut self, data: &D) -> bool {
        SpatialTree::remove_data(self, data)
    }

    fn len(&self) -> usize {
        SpatialTree::len(self)
    }

    fn data_iter(&self) -> Box<dyn Iterator<Item = &D> + '_> {
        Box::new(SpatialTree::data_iter(self))
    }

    fn data_iter_in(&self, shape: &Shape) -> Box<dyn Iterator<Item = &D> + '_> {
        Box::new(SpatialTree::data_iter_in(self, shape))
    }
}
