//! Whole-tree tests exercising the public API end to end


use crate::foundation::math::VecN;
use crate::spatial::{NodeKey, SpatialTree};

/// Walk every node and check the structural invariants of the tree
pub(super) fn assert_invariants<const D: usize, P>(tree: &SpatialTree<D, P>) {
    let mut leaf_entities = 0;
    let mut stack: Vec<NodeKey> = tree.root().children().collect();
    check_node(tree, tree.root(), true, &mut leaf_entities);

    while let Some(key) = stack.pop() {
        let node = tree.node(key).expect("child key must resolve");
        check_node(tree, node, false, &mut leaf_entities);
        stack.extend(node.children());
    }

    assert_eq!(leaf_entities, tree.len(), "every entity is held by exactly one leaf");

    for entity in tree.iter() {
        let owner = tree.node(entity.owner()).expect("owner must exist");
        assert!(owner.is_leaf());
        assert!(owner.region().contains_point(&entity.position()));
        assert!(owner
            .entity_keys()
            .iter()
            .any(|&key| tree.entity_by_key(key).map(|e| e.name()) == Some(entity.name())));
    }
}

fn check_node<const D: usize, P>(
    tree: &SpatialTree<D, P>,
    node: &crate::spatial::TreeNode<D>,
    is_root: bool,
    leaf_entities: &mut usize,
) {
    if node.has_children() {
        assert_eq!(node.entity_count(), 0, "internal nodes hold no entities");
        for octant in 0..(1 << D) {
            if let Some(child_key) = node.child(octant) {
                let child = tree.node(child_key).expect("child key must resolve");
                assert_eq!(*child.region(), node.region().child_region(octant));
                assert_eq!(child.depth(), node.depth() + 1);
            }
        }
    } else {
        if !is_root {
            assert!(node.entity_count() > 0, "empty non-root leaves are pruned");
        }
        if node.entity_count() > tree.config().capacity_per_node {
            assert_eq!(node.depth(), tree.node_depth_max());
        }
        *leaf_entities += node.entity_count();
    }
    assert!(node.depth() <= tree.node_depth_max());
}

/// Names of query results, sorted
pub(super) fn sorted_names<'a, const D: usize, P: 'a>(
    entities: impl IntoIterator<Item = &'a crate::spatial::TreeEntity<D, P>>,
) -> Vec<String> {
    let mut names: Vec<String> = entities.into_iter().map(|e| e.name().to_string()).collect();
    names.sort();
    names
}

pub(super) fn point<const D: usize>(coords: [f32; D]) -> VecN<D> {
    VecN::<D>::from(coords)
}
