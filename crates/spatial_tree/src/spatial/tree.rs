//! Spatial tree facade
//!
//! Owns the node arena and every entity, enforces name uniqueness and grows
//! the root region (by a full rebuild) whenever an entity lands outside it.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::foundation::math::{is_finite, VecN};
use crate::geometry::{Aabb, Frustum};
use crate::spatial::config::TreeConfig;
use crate::spatial::entity::{EntityKey, TreeEntity};
use crate::spatial::node::{NodeArena, NodeKey, TreeNode};
use crate::spatial::query::BoundingTest;
use crate::spatial::{TreeError, TreeResult};

/// Dynamic spatial tree over `D`-dimensional points
///
/// Each entity is a uniquely named point with a user tag and payload `P`.
/// The root region starts as the configured default box and doubles (by
/// `growth_multiplier`) whenever an entity is placed outside it; it never
/// shrinks except through [`SpatialTree::remove_all_entities`].
///
/// Queries are conservative: they return every entity of every leaf whose
/// region overlaps the query, so entities near the edge of a leaf may be
/// included even though their exact position lies outside the query.
#[derive(Debug, Clone)]
pub struct SpatialTree<const D: usize, P = ()> {
    config: TreeConfig,
    nodes: NodeArena<D>,
    entities: SlotMap<EntityKey, TreeEntity<D, P>>,
    names: HashMap<String, EntityKey>,
}

/// 3D spatial tree
pub type Octree<P = ()> = SpatialTree<3, P>;

/// 2D spatial tree
pub type QuadTree<P = ()> = SpatialTree<2, P>;

impl<const D: usize, P> SpatialTree<D, P> {
    /// Create an empty tree
    ///
    /// Fails with [`TreeError::InvalidConfiguration`] if `config` does not
    /// pass [`TreeConfig::check`].
    pub fn new(config: TreeConfig) -> TreeResult<Self> {
        config.check()?;
        let region = Self::default_region(&config);

        Ok(Self {
            nodes: NodeArena::new(region, config.capacity_per_node),
            config,
            entities: SlotMap::with_key(),
            names: HashMap::new(),
        })
    }

    fn default_region(config: &TreeConfig) -> Aabb<D> {
        Aabb::cube(VecN::<D>::zeros(), config.initial_half_extent)
    }

    /// Add a new entity
    ///
    /// If `position` lies outside the root region, the root is grown until it
    /// fits and the whole tree is rebuilt.
    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        position: VecN<D>,
        tag: i32,
        payload: P,
    ) -> TreeResult<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TreeError::DuplicateName(name));
        }
        check_position(&name, &position)?;

        // Resolve growth first so a failure leaves the tree untouched
        let grown = self.region_to_fit(&position)?;

        let key = self
            .entities
            .insert(TreeEntity::new(name.clone(), position, tag, payload));
        self.names.insert(name.clone(), key);

        if let Err(error) = self.place(key, grown) {
            if self.nodes.get(self.entities[key].owner).is_some() {
                let leaf = self.nodes.detach(key, &mut self.entities)?;
                self.nodes.prune_from(leaf);
            }
            self.names.remove(&name);
            self.entities.remove(key);
            return Err(error);
        }
        Ok(())
    }

    /// Remove an entity, returning it
    pub fn remove_entity(&mut self, name: &str) -> TreeResult<TreeEntity<D, P>> {
        let key = self.key_of(name)?;

        let leaf = self.nodes.detach(key, &mut self.entities)?;
        self.nodes.prune_from(leaf);

        self.names.remove(name);
        self.entities
            .remove(key)
            .ok_or_else(|| TreeError::NameNotFound(name.to_string()))
    }

    /// Check if an entity with this name exists
    pub fn entity_exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Move an entity
    ///
    /// Updates in place while the entity stays inside its current leaf;
    /// otherwise it is re-inserted, which may grow and rebuild the tree.
    pub fn set_entity_position(&mut self, name: &str, position: VecN<D>) -> TreeResult<()> {
        let key = self.key_of(name)?;
        check_position(name, &position)?;

        let owner = self.entities[key].owner;
        if self
            .nodes
            .get(owner)
            .is_some_and(|leaf| leaf.region().contains_point(&position))
        {
            self.entities[key].position = position;
            return Ok(());
        }

        let grown = self.region_to_fit(&position)?;

        let leaf = self.nodes.detach(key, &mut self.entities)?;
        self.nodes.prune_from(leaf);
        let previous = std::mem::replace(&mut self.entities[key].position, position);
        log::trace!("Moved entity '{}' out of its leaf", name);

        if let Err(error) = self.place(key, grown) {
            // Put the entity back where it was in the unchanged tree
            if self.nodes.get(self.entities[key].owner).is_some() {
                let leaf = self.nodes.detach(key, &mut self.entities)?;
                self.nodes.prune_from(leaf);
            }
            self.entities[key].position = previous;
            let root = self.nodes.root();
            self.nodes.insert(root, key, &mut self.entities)?;
            return Err(error);
        }
        Ok(())
    }

    /// Current position of an entity
    pub fn entity_position(&self, name: &str) -> TreeResult<VecN<D>> {
        let key = self.key_of(name)?;
        Ok(self.entities[key].position)
    }

    /// Remove every entity and node
    ///
    /// With `reset_tree` the root returns to the configured default region;
    /// otherwise the current (possibly grown) root region is kept.
    pub fn remove_all_entities(&mut self, reset_tree: bool) {
        let region = if reset_tree {
            Self::default_region(&self.config)
        } else {
            self.nodes.root_region()
        };

        log::info!(
            "Clearing {} entities (reset root region: {})",
            self.entities.len(),
            reset_tree
        );

        self.entities.clear();
        self.names.clear();
        self.nodes.reset(region);
    }

    /// Entities within `radius` of `position`
    ///
    /// Tests a cube of side `2 * radius`, not a sphere, and inherits the
    /// conservative leaf-level matching of every query. Returns nothing for a
    /// negative or NaN radius.
    pub fn entities_within_range(&self, position: VecN<D>, radius: f32) -> Vec<&TreeEntity<D, P>> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        self.entities_within_aabb(&Aabb::cube(position, radius))
    }

    /// Entities in leaves overlapping `aabb`
    pub fn entities_within_aabb(&self, aabb: &Aabb<D>) -> Vec<&TreeEntity<D, P>> {
        self.collect(aabb)
    }

    fn collect<T: BoundingTest<D> + ?Sized>(&self, test: &T) -> Vec<&TreeEntity<D, P>> {
        let mut leaves = Vec::new();
        self.nodes
            .collect_intersecting(self.nodes.root(), test, &mut leaves);

        leaves
            .into_iter()
            .flat_map(|leaf| self.nodes[leaf].entity_keys())
            .map(|&key| &self.entities[key])
            .collect()
    }

    /// Deepest node depth reached since the last rebuild or clear
    pub fn node_depth_current(&self) -> u32 {
        self.nodes.deepest()
    }

    /// Depth at which nodes stop splitting for the current root
    pub fn node_depth_max(&self) -> u32 {
        self.nodes.max_depth()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the tree holds no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&TreeEntity<D, P>> {
        self.names.get(name).map(|&key| &self.entities[key])
    }

    /// Look up an entity by the key a node holds it under
    pub fn entity_by_key(&self, key: EntityKey) -> Option<&TreeEntity<D, P>> {
        self.entities.get(key)
    }

    /// Look up an entity by name for payload access
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut TreeEntity<D, P>> {
        let key = *self.names.get(name)?;
        self.entities.get_mut(key)
    }

    /// Iterate over every entity
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntity<D, P>> {
        self.entities.values()
    }

    /// Names of every entity
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Active configuration
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Region currently covered by the root
    pub fn root_region(&self) -> Aabb<D> {
        self.nodes.root_region()
    }

    /// Total number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root node
    pub fn root(&self) -> &TreeNode<D> {
        &self.nodes[self.nodes.root()]
    }

    /// Node by key, if it still exists
    pub fn node(&self, key: NodeKey) -> Option<&TreeNode<D>> {
        self.nodes.get(key)
    }

    /// Leaf currently indexing the named entity
    pub fn owning_node(&self, name: &str) -> TreeResult<&TreeNode<D>> {
        let key = self.key_of(name)?;
        self.nodes
            .get(self.entities[key].owner)
            .ok_or_else(|| TreeError::NameNotFound(name.to_string()))
    }

    /// Get all leaf nodes (for visualization)
    pub fn leaves(&self) -> Vec<&TreeNode<D>> {
        self.nodes.leaves()
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<&TreeNode<D>> {
        self.nodes.nodes_at_depth(depth)
    }

    fn key_of(&self, name: &str) -> TreeResult<EntityKey> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| TreeError::NameNotFound(name.to_string()))
    }

    /// Grown root region if `position` lies outside the current one
    fn region_to_fit(&self, position: &VecN<D>) -> TreeResult<Option<Aabb<D>>> {
        let mut region = self.nodes.root_region();
        if region.contains_point(position) {
            return Ok(None);
        }

        let mut steps = 0;
        while !region.contains_point(position) {
            region.rescale(self.config.growth_multiplier);
            steps += 1;

            if !is_finite(&region.min) || !is_finite(&region.max) || !is_finite(&region.dimensions()) {
                return Err(TreeError::InvalidPosition(format!(
                    "{:?} is beyond the range the tree can grow to",
                    position.as_slice()
                )));
            }
        }

        log::info!(
            "Growing root region {} time(s) by {} to fit {:?}",
            steps,
            self.config.growth_multiplier,
            position.as_slice()
        );
        Ok(Some(region))
    }

    /// Index an entity that is already in the store but in no node
    fn place(&mut self, key: EntityKey, grown: Option<Aabb<D>>) -> TreeResult<()> {
        match grown {
            Some(region) => self.rebuild(region),
            None => {
                let root = self.nodes.root();
                self.nodes.insert(root, key, &mut self.entities)
            }
        }
    }

    /// Replace every node with a fresh tree over `region` and re-insert all entities
    ///
    /// Node keys from before the rebuild stop resolving. On failure the old
    /// nodes and every entity's owner link are restored.
    fn rebuild(&mut self, region: Aabb<D>) -> TreeResult<()> {
        let previous_nodes = self.nodes.clone();
        let previous_owners: Vec<(EntityKey, NodeKey)> = self
            .entities
            .iter()
            .map(|(key, entity)| (key, entity.owner))
            .collect();

        self.nodes.reset(region);
        let root = self.nodes.root();

        for &(key, _) in &previous_owners {
            if let Err(error) = self.nodes.insert(root, key, &mut self.entities) {
                log::error!("Rebuild failed, restoring previous tree: {}", error);
                self.nodes = previous_nodes;
                for (key, owner) in previous_owners {
                    self.entities[key].owner = owner;
                }
                return Err(error);
            }
        }

        log::info!(
            "Rebuilt tree over {:?}..{:?}: {} entities, {} nodes, max depth {}",
            region.min.as_slice(),
            region.max.as_slice(),
            self.entities.len(),
            self.nodes.len(),
            self.nodes.max_depth()
        );
        Ok(())
    }
}

impl<P> SpatialTree<3, P> {
    /// Entities in leaves overlapping `frustum`
    pub fn entities_within_frustum(&self, frustum: &Frustum) -> Vec<&TreeEntity<3, P>> {
        self.collect(frustum)
    }
}

fn check_position<const D: usize>(name: &str, position: &VecN<D>) -> TreeResult<()> {
    if is_finite(position) {
        Ok(())
    } else {
        Err(TreeError::InvalidPosition(format!(
            "entity '{}' at {:?}",
            name,
            position.as_slice()
        )))
    }
}
