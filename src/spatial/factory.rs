//! Node factories: branching strategy and capacity of a spatial tree
//!
//! A factory decides how a node region is split when it overflows and how
//! many items a leaf holds before splitting. The tree asks the factory for
//! the partition tag of every node it creates, passing the parent's tag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Rectangle};

/// Depth at which nodes stop splitting and keep items past capacity
pub const DEFAULT_MAX_DEPTH: u32 = 16;

/// Branching policy of a [`super::SpatialTree`]
pub trait NodeFactory {
    /// Per-node tag fixed at creation (e.g. the separation line of a binary node)
    type Partition: Copy + fmt::Debug;

    /// Items a leaf stores before it splits
    fn max_data_count_per_node(&self) -> usize;

    /// Nodes at this depth never split
    fn max_depth(&self) -> u32 {
        DEFAULT_MAX_DEPTH
    }

    /// Tag of a new node; `None` for the root
    fn partition_for(&self, parent: Option<Self::Partition>) -> Self::Partition;

    /// Child regions of `bounds`; together they cover `bounds` without overlap
    fn split(&self, bounds: &Rectangle, partition: Self::Partition) -> Vec<Rectangle>;
}

/// Quad-tree nodes carry no partition state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadrants;

/// Four-way split at the region center
#[derive(Debug, Clone, Copy)]
pub struct QuadTreeFactory {
    max_depth: u32,
}

impl QuadTreeFactory {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl Default for QuadTreeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeFactory for QuadTreeFactory {
    type Partition = Quadrants;

    fn max_data_count_per_node(&self) -> usize {
        1
    }

    fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn partition_for(&self, _parent: Option<Quadrants>) -> Quadrants {
        Quadrants
    }

    /// Children in order: lower-left, upper-left, lower-right, upper-right
    fn split(&self, bounds: &Rectangle, _partition: Quadrants) -> Vec<Rectangle> {
        let (lower, upper, center) = (bounds.lower(), bounds.upper(), bounds.center());
        vec![
            Rectangle::new(lower, center),
            Rectangle::new(Point2::new(lower.x, center.y), Point2::new(center.x, upper.y)),
            Rectangle::new(Point2::new(center.x, lower.y), Point2::new(upper.x, center.y)),
            Rectangle::new(center, upper),
        ]
    }
}

/// Axis of a binary split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeparationLine {
    /// Split at the center x into left and right halves
    Vertical,
    /// Split at the center y into lower and upper halves
    Horizontal,
}

impl SeparationLine {
    /// The other axis
    pub fn turn(self) -> Self {
        match self {
            SeparationLine::Vertical => SeparationLine::Horizontal,
            SeparationLine::Horizontal => SeparationLine::Vertical,
        }
    }

    pub fn split(self, bounds: &Rectangle) -> [Rectangle; 2] {
        let (lower, upper, center) = (bounds.lower(), bounds.upper(), bounds.center());
        match self {
            SeparationLine::Vertical => [
                Rectangle::new(lower, Point2::new(center.x, upper.y)),
                Rectangle::new(Point2::new(center.x, lower.y), upper),
            ],
            SeparationLine::Horizontal => [
                Rectangle::new(lower, Point2::new(upper.x, center.y)),
                Rectangle::new(Point2::new(lower.x, center.y), upper),
            ],
        }
    }
}

/// Two-way split alternating vertical and horizontal lines, starting vertical
#[derive(Debug, Clone, Copy)]
pub struct BinaryTreeFactory {
    max_depth: u32,
}

impl BinaryTreeFactory {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH * 2,
        }
    }

    pub fn with_max_depth(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl Default for BinaryTreeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeFactory for BinaryTreeFactory {
    type Partition = SeparationLine;

    fn max_data_count_per_node(&self) -> usize {
        1
    }

    fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn partition_for(&self, parent: Option<SeparationLine>) -> SeparationLine {
        parent.map_or(SeparationLine::Vertical, SeparationLine::turn)
    }

    fn split(&self, bounds: &Rectangle, partition: SeparationLine) -> Vec<Rectangle> {
        partition.split(bounds).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_split_order() {
        let f = QuadTreeFactory::new();
        let parts = f.split(&Rectangle::from_coords(0.0, 0.0, 100.0, 50.0), Quadrants);
        assert_eq!(parts[0], Rectangle::from_coords(0.0, 0.0, 50.0, 25.0));
        assert_eq!(parts[1], Rectangle::from_coords(0.0, 25.0, 50.0, 50.0));
        assert_eq!(parts[2], Rectangle::from_coords(50.0, 0.0, 100.0, 25.0));
        assert_eq!(parts[3], Rectangle::from_coords(50.0, 25.0, 100.0, 50.0));
    }

    #[test]
    fn test_binary_partition_alternates() {
        let f = BinaryTreeFactory::new();
        let root = f.partition_for(None);
        assert_eq!(root, SeparationLine::Vertical);
        assert_eq!(f.partition_for(Some(root)), SeparationLine::Horizontal);
        assert_eq!(
            f.partition_for(Some(SeparationLine::Horizontal)),
            SeparationLine::Vertical
        );
    }

    #[test]
    fn test_binary_split_halves() {
        let bounds = Rectangle::from_coords(0.0, 0.0, 10.0, 20.0);
        let [left, right] = SeparationLine::Vertical.split(&bounds);
        assert_eq!(left, Rectangle::from_coords(0.0, 0.0, 5.0, 20.0));
        assert_eq!(right, Rectangle::from_coords(5.0, 0.0, 10.0, 20.0));
        let [low, high] = SeparationLine::Horizontal.split(&bounds);
        assert_eq!(low, Rectangle::from_coords(0.0, 0.0, 10.0, 10.0));
        assert_eq!(high, Rectangle::from_coords(0.0, 10.0, 10.0, 20.0));
    }
}
