//! Spatial partitioning data structures
//!
//! A dynamic oct-tree (and its 2D quad-tree reduction) indexing uniquely
//! named points for visibility culling, broad-phase collision and proximity
//! queries.
//!
//! ```text
//! SpatialTree (facade: names, growth, rebuild)
//!      ↓
//! NodeArena (split, prune, query traversal)
//!      ↓
//! Aabb / Frustum (geometric tests)
//! ```

mod config;
mod entity;
mod error;
mod node;
mod query;
mod tree;

#[cfg(test)]
mod tests;

pub use config::TreeConfig;
pub use entity::{EntityKey, TreeEntity};
pub use error::{TreeError, TreeResult};
pub use node::{compute_max_depth, resolve_octant, NodeKey, TreeNode};
pub use query::BoundingTest;
pub use tree::{Octree, QuadTree, SpatialTree};
