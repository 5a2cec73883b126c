//! Tree nodes and the arena that owns them
//!
//! Nodes live in a `SlotMap` and refer to each other (and to entities) by
//! key only. A node is either a leaf holding entity keys, or an internal node
//! with at least one child and no entities. Children are created lazily the
//! first time an entity lands in their region and deleted again once their
//! whole subtree is empty.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::VecN;
use crate::geometry::Aabb;
use crate::spatial::entity::{EntityKey, TreeEntity};
use crate::spatial::query::BoundingTest;
use crate::spatial::{TreeError, TreeResult};

new_key_type! {
    /// Stable handle to a node inside a tree
    pub struct NodeKey;
}

/// Entity storage the arena updates owner links in
pub(crate) type EntityStore<const D: usize, P> = SlotMap<EntityKey, TreeEntity<D, P>>;

/// Single node in the tree hierarchy
#[derive(Debug, Clone)]
pub struct TreeNode<const D: usize> {
    region: Aabb<D>,
    depth: u32,
    parent: Option<NodeKey>,
    /// Empty until the first child is created, then one slot per orthant
    children: Vec<Option<NodeKey>>,
    entities: Vec<EntityKey>,
}

impl<const D: usize> TreeNode<D> {
    fn new(region: Aabb<D>, depth: u32, parent: Option<NodeKey>) -> Self {
        Self {
            region,
            depth,
            parent,
            children: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// World-space bounds of this node
    pub fn region(&self) -> &Aabb<D> {
        &self.region
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child at `octant`, if it exists
    pub fn child(&self, octant: usize) -> Option<NodeKey> {
        self.children.get(octant).copied().flatten()
    }

    /// Keys of the children that currently exist
    pub fn children(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.children.iter().filter_map(|child| *child)
    }

    /// Check if this node has at least one child
    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }

    /// Number of entities held directly by this node
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Keys of the entities held directly by this node
    pub fn entity_keys(&self) -> &[EntityKey] {
        &self.entities
    }
}

/// Index of the child region of `region` containing `point`
///
/// Every child region is tested in order and the first match wins, so a point
/// on a shared boundary always resolves to the same child. Both insertion and
/// splitting go through here. Returns `None` only if `point` lies outside
/// `region`.
pub fn resolve_octant<const D: usize>(region: &Aabb<D>, point: &VecN<D>) -> Option<usize> {
    (0..Aabb::<D>::CHILD_COUNT).find(|&octant| region.child_region(octant).contains_point(point))
}

/// Depth at which splitting stops for a root of this size
///
/// Halves the smallest dimension until it is no longer greater than 2.
pub fn compute_max_depth<const D: usize>(region: &Aabb<D>) -> u32 {
    let mut dimension = region.smallest_dimension();
    let mut depth = 0;
    while dimension > 2.0 {
        dimension *= 0.5;
        depth += 1;
    }
    depth
}

/// Arena owning every node of one tree
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<const D: usize> {
    nodes: SlotMap<NodeKey, TreeNode<D>>,
    root: NodeKey,
    capacity: usize,
    max_depth: u32,
    /// Deepest node created since this arena was built
    deepest: u32,
}

impl<const D: usize> NodeArena<D> {
    /// Create an arena holding a single empty root leaf
    pub(crate) fn new(root_region: Aabb<D>, capacity: usize) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode::new(root_region, 0, None));
        Self {
            nodes,
            root,
            capacity,
            max_depth: compute_max_depth(&root_region),
            deepest: 0,
        }
    }

    /// Drop every node and start over with an empty root covering `region`
    ///
    /// The slot map is reused, so keys handed out before the reset no longer
    /// resolve to any node.
    pub(crate) fn reset(&mut self, region: Aabb<D>) {
        self.nodes.clear();
        self.root = self.nodes.insert(TreeNode::new(region, 0, None));
        self.max_depth = compute_max_depth(&region);
        self.deepest = 0;
    }

    pub(crate) fn root(&self) -> NodeKey {
        self.root
    }

    pub(crate) fn root_region(&self) -> Aabb<D> {
        self.nodes[self.root].region
    }

    pub(crate) fn get(&self, key: NodeKey) -> Option<&TreeNode<D>> {
        self.nodes.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub(crate) fn deepest(&self) -> u32 {
        self.deepest
    }

    /// Insert `entity` into the subtree rooted at `key`
    ///
    /// The entity's position must lie inside the region of `key`.
    pub(crate) fn insert<P>(
        &mut self,
        key: NodeKey,
        entity: EntityKey,
        entities: &mut EntityStore<D, P>,
    ) -> TreeResult<()> {
        let position = entities[entity].position;
        let node = &self.nodes[key];

        if node.has_children() {
            let octant = self.resolve(key, &position)?;
            let child = self.child_or_create(key, octant);
            return self.insert(child, entity, entities);
        }

        // Depth cap wins over capacity
        let depth = node.depth;
        if node.entities.len() < self.capacity || depth >= self.max_depth {
            self.nodes[key].entities.push(entity);
            entities[entity].owner = key;
            log::trace!("Stored entity '{}' at depth {}", entities[entity].name(), depth);
            return Ok(());
        }

        self.split(key, entity, entities)
    }

    /// Turn a full leaf into an internal node, moving its entities plus `entity` down a level
    fn split<P>(
        &mut self,
        key: NodeKey,
        entity: EntityKey,
        entities: &mut EntityStore<D, P>,
    ) -> TreeResult<()> {
        let node = &mut self.nodes[key];
        node.entities.push(entity);
        let moving = std::mem::take(&mut node.entities);

        log::debug!(
            "Splitting node at depth {} ({} entities)",
            node.depth,
            moving.len()
        );

        for moved in moving {
            let position = entities[moved].position;
            let octant = self.resolve(key, &position)?;
            let child = self.child_or_create(key, octant);
            self.insert(child, moved, entities)?;
        }

        Ok(())
    }

    fn resolve(&self, key: NodeKey, point: &VecN<D>) -> TreeResult<usize> {
        let region = self.nodes[key].region;
        resolve_octant(&region, point).ok_or_else(|| {
            let error = TreeError::GeometricInvariantViolation {
                point: format!("{:?}", point.as_slice()),
                region: format!("{:?}..{:?}", region.min.as_slice(), region.max.as_slice()),
            };
            log::error!("{}", error);
            error
        })
    }

    fn child_or_create(&mut self, parent: NodeKey, octant: usize) -> NodeKey {
        if let Some(child) = self.nodes[parent].child(octant) {
            return child;
        }

        let (region, depth) = {
            let node = &self.nodes[parent];
            (node.region.child_region(octant), node.depth + 1)
        };
        let child = self.nodes.insert(TreeNode::new(region, depth, Some(parent)));

        let node = &mut self.nodes[parent];
        if node.children.is_empty() {
            node.children = vec![None; Aabb::<D>::CHILD_COUNT];
        }
        node.children[octant] = Some(child);
        self.deepest = self.deepest.max(depth);

        child
    }

    /// Remove `entity` from the leaf that owns it, returning that leaf
    ///
    /// The entity's owner link is cleared; the leaf is not pruned.
    pub(crate) fn detach<P>(
        &mut self,
        entity: EntityKey,
        entities: &mut EntityStore<D, P>,
    ) -> TreeResult<NodeKey> {
        let owner = entities[entity].owner;
        let index = self
            .nodes
            .get(owner)
            .and_then(|node| node.entities.iter().position(|&key| key == entity))
            .ok_or_else(|| TreeError::NameNotFound(entities[entity].name().to_string()))?;

        self.nodes[owner].entities.swap_remove(index);
        entities[entity].owner = NodeKey::default();
        Ok(owner)
    }

    /// Delete empty nodes from `key` upwards, returning how many were removed
    ///
    /// Stops at the first ancestor that still holds entities or other
    /// children. The root is never removed.
    pub(crate) fn prune_from(&mut self, mut key: NodeKey) -> usize {
        let mut removed = 0;

        while key != self.root {
            let Some(node) = self.nodes.get(key) else { break };
            if !node.entities.is_empty() || node.has_children() {
                break;
            }
            let Some(parent) = node.parent else { break };

            self.nodes.remove(key);
            if let Some(slot) = self.nodes[parent]
                .children
                .iter_mut()
                .find(|slot| **slot == Some(key))
            {
                *slot = None;
            }

            removed += 1;
            key = parent;
        }

        if removed > 0 {
            log::debug!("Pruned {} empty node(s)", removed);
        }
        removed
    }

    /// Collect non-empty leaves under `key` whose region passes `test`
    pub(crate) fn collect_intersecting<T: BoundingTest<D> + ?Sized>(
        &self,
        key: NodeKey,
        test: &T,
        out: &mut Vec<NodeKey>,
    ) {
        let node = &self.nodes[key];

        if node.is_leaf() {
            if !node.entities.is_empty() && test.overlaps(&node.region) {
                out.push(key);
            }
            return;
        }

        // Child regions are subsets of this one
        if !test.overlaps(&node.region) {
            return;
        }

        for child in node.children() {
            self.collect_intersecting(child, test, out);
        }
    }

    /// Get all leaf nodes (for visualization)
    pub(crate) fn leaves(&self) -> Vec<&TreeNode<D>> {
        self.nodes.values().filter(|node| node.is_leaf()).collect()
    }

    /// Get all nodes at a specific depth (for visualization)
    pub(crate) fn nodes_at_depth(&self, depth: u32) -> Vec<&TreeNode<D>> {
        self.nodes.values().filter(|node| node.depth == depth).collect()
    }
}

impl<const D: usize> std::ops::Index<NodeKey> for NodeArena<D> {
    type Output = TreeNode<D>;

    fn index(&self, key: NodeKey) -> &Self::Output {
        &self.nodes[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};

    fn cube(half: f32) -> Aabb<3> {
        Aabb::cube(Vec3::zeros(), half)
    }

    fn spawn(store: &mut EntityStore<3, ()>, name: &str, position: Vec3) -> EntityKey {
        store.insert(TreeEntity::new(name.to_string(), position, 0, ()))
    }

    #[test]
    fn test_resolve_octant_matches_bit_layout() {
        let region = cube(8.0);

        assert_eq!(resolve_octant(&region, &Vec3::new(-1.0, -1.0, -1.0)), Some(0));
        assert_eq!(resolve_octant(&region, &Vec3::new(1.0, -1.0, -1.0)), Some(1));
        assert_eq!(resolve_octant(&region, &Vec3::new(-1.0, 1.0, -1.0)), Some(2));
        assert_eq!(resolve_octant(&region, &Vec3::new(1.0, 1.0, 1.0)), Some(7));
        // Shared boundaries resolve to the lowest index
        assert_eq!(resolve_octant(&region, &Vec3::zeros()), Some(0));
        assert_eq!(resolve_octant(&region, &Vec3::new(9.0, 0.0, 0.0)), None);

        let square = Aabb::cube(Vec2::zeros(), 4.0);
        assert_eq!(resolve_octant(&square, &Vec2::new(1.0, 1.0)), Some(3));
    }

    #[test]
    fn test_compute_max_depth() {
        assert_eq!(compute_max_depth(&cube(8.0)), 3);
        assert_eq!(compute_max_depth(&cube(1.0)), 0);
        assert_eq!(compute_max_depth(&cube(128.0)), 7);

        // Smallest axis decides
        let slab = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(64.0, 64.0, 4.0));
        assert_eq!(compute_max_depth(&slab), 1);
    }

    #[test]
    fn test_split_moves_entities_to_children() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let root = arena.root();

        let a = spawn(&mut store, "a", Vec3::new(-1.0, -1.0, -1.0));
        let b = spawn(&mut store, "b", Vec3::new(1.0, 1.0, 1.0));
        arena.insert(root, a, &mut store).unwrap();
        assert_eq!(store[a].owner, root);

        arena.insert(root, b, &mut store).unwrap();
        assert!(arena[root].has_children());
        assert_eq!(arena[root].entity_count(), 0);
        assert_eq!(arena.len(), 3);

        let a_leaf = store[a].owner;
        let b_leaf = store[b].owner;
        assert_ne!(a_leaf, b_leaf);
        assert_eq!(arena[a_leaf].depth(), 1);
        assert_eq!(arena[root].child(0), Some(a_leaf));
        assert_eq!(arena[root].child(7), Some(b_leaf));
        assert_eq!(arena[b_leaf].parent(), Some(root));
        assert_eq!(arena.deepest(), 1);
    }

    #[test]
    fn test_depth_cap_collects_colocated_entities() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let root = arena.root();
        let position = Vec3::new(3.0, 3.0, 3.0);

        let keys: Vec<_> = (0..4)
            .map(|i| spawn(&mut store, &format!("e{i}"), position))
            .collect();
        for &key in &keys {
            arena.insert(root, key, &mut store).unwrap();
        }

        let leaf = store[keys[0]].owner;
        assert!(keys.iter().all(|&key| store[key].owner == leaf));
        assert_eq!(arena[leaf].depth(), arena.max_depth());
        assert_eq!(arena[leaf].entity_count(), 4);
        assert_eq!(arena.deepest(), 3);
    }

    #[test]
    fn test_detach_and_prune_keeps_root() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let root = arena.root();

        let a = spawn(&mut store, "a", Vec3::new(-5.0, -5.0, -5.0));
        let b = spawn(&mut store, "b", Vec3::new(5.0, 5.0, 5.0));
        arena.insert(root, a, &mut store).unwrap();
        arena.insert(root, b, &mut store).unwrap();

        let leaf = arena.detach(b, &mut store).unwrap();
        assert_eq!(arena.prune_from(leaf), 1);
        assert!(arena.get(leaf).is_none());
        assert_eq!(arena[root].child(7), None);

        let leaf = arena.detach(a, &mut store).unwrap();
        assert_eq!(arena.prune_from(leaf), 1);
        assert_eq!(arena.len(), 1);
        assert!(arena[root].is_leaf());

        // Already detached
        assert!(matches!(arena.detach(a, &mut store), Err(TreeError::NameNotFound(_))));
        assert_eq!(arena.prune_from(root), 0);
    }

    #[test]
    fn test_reset_invalidates_old_keys() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let old_root = arena.root();

        let a = spawn(&mut store, "a", Vec3::new(-5.0, -5.0, -5.0));
        let b = spawn(&mut store, "b", Vec3::new(5.0, 5.0, 5.0));
        arena.insert(old_root, a, &mut store).unwrap();
        arena.insert(old_root, b, &mut store).unwrap();
        let old_leaf = store[a].owner;

        arena.reset(cube(32.0));

        assert_eq!(arena.len(), 1);
        assert_ne!(arena.root(), old_root);
        assert!(arena.get(old_root).is_none());
        assert!(arena.get(old_leaf).is_none());
        assert_eq!(arena.max_depth(), 5);
        assert_eq!(arena.deepest(), 0);
        assert_eq!(arena.root_region(), cube(32.0));
    }

    #[test]
    fn test_insert_outside_region_is_reported() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let root = arena.root();

        let inside = spawn(&mut store, "inside", Vec3::new(1.0, 1.0, 1.0));
        let other = spawn(&mut store, "other", Vec3::new(2.0, 2.0, 2.0));
        arena.insert(root, inside, &mut store).unwrap();
        arena.insert(root, other, &mut store).unwrap();

        let stray = spawn(&mut store, "stray", Vec3::new(50.0, 0.0, 0.0));
        let result = arena.insert(root, stray, &mut store);
        assert!(matches!(result, Err(TreeError::GeometricInvariantViolation { .. })));
    }

    #[test]
    fn test_collect_intersecting_skips_empty_and_distant_leaves() {
        let mut store = EntityStore::<3, ()>::with_key();
        let mut arena = NodeArena::new(cube(8.0), 1);
        let root = arena.root();

        for (name, position) in [
            ("near", Vec3::new(-6.0, -6.0, -6.0)),
            ("far", Vec3::new(6.0, 6.0, 6.0)),
        ] {
            let key = spawn(&mut store, name, position);
            arena.insert(root, key, &mut store).unwrap();
        }

        let query = Aabb::cube(Vec3::new(-6.0, -6.0, -6.0), 0.5);
        let mut hits = Vec::new();
        arena.collect_intersecting(root, &query, &mut hits);

        assert_eq!(hits.len(), 1);
        let names: Vec<_> = arena[hits[0]]
            .entity_keys()
            .iter()
            .map(|&key| store[key].name().to_string())
            .collect();
        assert_eq!(names, vec!["near".to_string()]);

        assert_eq!(arena.leaves().len(), 2);
        assert_eq!(arena.nodes_at_depth(1).len(), 2);
    }
}
