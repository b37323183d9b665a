//! Integration tests for the quad and binary spatial trees

use proptest::prelude::*;
use std::collections::BTreeSet;

use situated_env::geometry::{Circle, Point2, Rectangle, Shape};
use situated_env::spatial::{
    BinaryTree, BinaryTreeFactory, NodeFactory, QuadTree, QuadTreeFactory, ShapedObject,
    SpatialDataStructure, SpatialTree,
};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: usize,
    circle: Circle,
}

impl ShapedObject for Item {
    fn shape(&self) -> Shape {
        self.circle.into()
    }
}

fn world() -> Rectangle {
    Rectangle::from_coords(0.0, 0.0, 700.0, 700.0)
}

fn items(raw: &[(f32, f32, f32)]) -> Vec<Item> {
    raw.iter()
        .enumerate()
        .map(|(id, &(x, y, r))| Item {
            id,
            circle: Circle::new(Point2::new(x, y), r),
        })
        .collect()
}

/// Items kept fully inside the world
fn raw_items() -> impl Strategy<Value = Vec<(f32, f32, f32)>> {
    prop::collection::vec((10.0f32..690.0, 10.0f32..690.0, 1.0f32..10.0), 1..80)
}

fn round_trip<F: NodeFactory>(mut tree: SpatialTree<Item, F>, data: &[Item]) {
    for item in data {
        assert!(tree.add_data(item.clone()));
    }
    assert_eq!(tree.len(), data.len());
    let stored: BTreeSet<usize> = tree.data_iter().map(|i| i.id).collect();
    assert_eq!(stored, data.iter().map(|i| i.id).collect());

    for item in data {
        assert!(tree.remove_data(item), "item {} not removed", item.id);
    }
    assert!(tree.is_empty());
    assert_eq!(tree.data_iter().count(), 0);
    let root = tree.root().unwrap();
    assert!(tree.node(root).is_leaf());
    assert_eq!(tree.node_count(), 1);
}

fn query_matches_brute_force(index: &dyn SpatialDataStructure<Item>, data: &[Item], query: Shape) {
    let found: BTreeSet<usize> = index.data_iter_in(&query).map(|i| i.id).collect();
    let expected: BTreeSet<usize> = data
        .iter()
        .filter(|i| i.shape().intersects(&query))
        .map(|i| i.id)
        .collect();
    assert_eq!(found, expected);
}

proptest! {
    #[test]
    fn test_quad_tree_round_trip(raw in raw_items()) {
        round_trip(QuadTree::with_bounds(QuadTreeFactory::new(), world()), &items(&raw));
    }

    #[test]
    fn test_binary_tree_round_trip(raw in raw_items()) {
        round_trip(BinaryTree::with_bounds(BinaryTreeFactory::new(), world()), &items(&raw));
    }

    #[test]
    fn test_frustum_query_matches_brute_force(
        raw in raw_items(),
        qx in 0.0f32..700.0,
        qy in 0.0f32..700.0,
        qr in 1.0f32..300.0,
    ) {
        let data = items(&raw);
        let query: Shape = Circle::new(Point2::new(qx, qy), qr).into();

        let mut quad = QuadTree::with_bounds(QuadTreeFactory::new(), world());
        let mut binary = BinaryTree::with_bounds(BinaryTreeFactory::new(), world());
        for item in &data {
            quad.add_data(item.clone());
            binary.add_data(item.clone());
        }
        query_matches_brute_force(&quad, &data, query);
        query_matches_brute_force(&binary, &data, query);

        let rect: Shape = Rectangle::from_coords(qx, qy, qx + qr, qy + qr / 2.0).into();
        query_matches_brute_force(&quad, &data, rect);
    }
}

#[test]
fn test_identical_shapes_stop_at_max_depth() {
    let mut tree = QuadTree::with_bounds(QuadTreeFactory::with_max_depth(6), world());
    for id in 0..50 {
        assert!(tree.add_data(Item {
            id,
            circle: Circle::new(Point2::new(123.0, 456.0), 0.5),
        }));
    }
    assert_eq!(tree.len(), 50);
    assert!(tree.nodes().all(|n| n.depth() <= 6));
    assert_eq!(tree.data_iter().count(), 50);
}

#[test]
fn test_duplicate_item_is_rejected() {
    let mut tree = BinaryTree::with_bounds(BinaryTreeFactory::new(), world());
    let item = Item {
        id: 1,
        circle: Circle::new(Point2::new(50.0, 50.0), 2.0),
    };
    assert!(tree.add_data(item.clone()));
    assert!(!tree.add_data(item.clone()));
    assert_eq!(tree.len(), 1);
    assert!(tree.remove_data(&item));
    assert!(!tree.remove_data(&item));
}

#[test]
fn test_data_view_is_restartable() {
    let mut tree = QuadTree::with_bounds(QuadTreeFactory::new(), world());
    for (id, x) in [100.0, 300.0, 500.0].into_iter().enumerate() {
        tree.add_data(Item {
            id,
            circle: Circle::new(Point2::new(x, x), 3.0),
        });
    }
    let view = tree.data();
    assert_eq!(view.into_iter().count(), 3);
    assert_eq!(view.into_iter().count(), 3);
}

#[test]
fn test_reinitialize_drops_data() {
    let mut tree = QuadTree::with_bounds(QuadTreeFactory::new(), world());
    tree.add_data(Item {
        id: 0,
        circle: Circle::new(Point2::new(10.0, 10.0), 3.0),
    });
    SpatialDataStructure::initialize(&mut tree, Rectangle::from_coords(0.0, 0.0, 50.0, 50.0));
    assert!(SpatialDataStructure::is_empty(&tree));
    assert_eq!(SpatialDataStructure::bounds(&tree).upper(), Point2::new(50.0, 50.0));
}
