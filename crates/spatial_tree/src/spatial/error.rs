//! Spatial tree errors

use thiserror::Error;

/// Errors reported by [`SpatialTree`](super::SpatialTree) and its nodes
///
/// All of these are contract violations detected at the call site. Only
/// `DuplicateName` and `NameNotFound` are meant to be probed for (see
/// [`SpatialTree::entity_exists`](super::SpatialTree::entity_exists)).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// An entity with this name is already indexed
    #[error("Entity already exists: {0}")]
    DuplicateName(String),

    /// No entity with this name is indexed
    #[error("Entity not found: {0}")]
    NameNotFound(String),

    /// Rejected tree configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A point fit none of a node's child regions
    #[error("Point {point} is outside every child region of node {region}")]
    GeometricInvariantViolation {
        /// The offending point
        point: String,
        /// Region of the node being descended
        region: String,
    },

    /// Position with a NaN or infinite component
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

/// Result alias for spatial tree operations
pub type TreeResult<T> = Result<T, TreeError>;
