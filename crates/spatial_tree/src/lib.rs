//! # Spatial Tree
//!
//! Dynamic spatial index mapping uniquely named points to regions of space,
//! for real-time simulations: visibility culling, collision broad-phase and
//! proximity queries.
//!
//! ## Features
//!
//! - **Octree and quad-tree**: one implementation, generic over the dimension
//! - **Dynamic root growth**: entities outside the root region grow and rebuild the tree
//! - **Depth-capped splitting**: coincident points never recurse forever
//! - **Pruning**: empty subtrees are released as soon as their last entity leaves
//! - **Conservative queries**: range, AABB and frustum queries never miss an entity
//!
//! ## Quick Start
//!
//! ```rust
//! use spatial_tree::prelude::*;
//!
//! fn main() -> Result<(), TreeError> {
//!     let mut tree = Octree::<u32>::new(TreeConfig::default())?;
//!
//!     tree.add_entity("ship", Vec3::new(1.0, 2.0, 3.0), 0, 7)?;
//!     tree.add_entity("station", Vec3::new(500.0, 0.0, 0.0), 1, 9)?;
//!
//!     let nearby = tree.entities_within_range(Vec3::new(0.0, 0.0, 0.0), 5.0);
//!     assert!(nearby.iter().any(|entity| entity.name() == "ship"));
//!
//!     tree.set_entity_position("ship", Vec3::new(-40.0, 0.0, 0.0))?;
//!     tree.remove_entity("station")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod foundation;
pub mod geometry;
pub mod config;
pub mod spatial;

/// Common imports for tree users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::math::{Vec2, Vec3, VecN, Mat4},
        geometry::{Aabb, Frustum, Plane},
        spatial::{Octree, QuadTree, SpatialTree, TreeConfig, TreeEntity, TreeError, TreeResult},
    };
}
