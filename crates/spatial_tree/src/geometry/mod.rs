//! Geometric value types consumed by the spatial trees
//!
//! Pure arithmetic, no allocation and no failure modes.

mod aabb;
mod frustum;

pub use aabb::Aabb;
pub use frustum::{Frustum, Plane};
