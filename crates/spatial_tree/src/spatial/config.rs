//! Spatial tree configuration

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::spatial::{TreeError, TreeResult};

/// Configuration for spatial tree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum entities per node before subdivision (ignored at max depth)
    pub capacity_per_node: usize,

    /// Factor the root region is scaled by when an entity lands outside it
    pub growth_multiplier: f32,

    /// Half the edge length of the default root region, centered on the origin
    pub initial_half_extent: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            capacity_per_node: 8,
            growth_multiplier: 2.0,
            initial_half_extent: 64.0,
        }
    }
}

impl TreeConfig {
    /// Set maximum entities per node
    pub fn with_capacity_per_node(mut self, capacity: usize) -> Self {
        self.capacity_per_node = capacity;
        self
    }

    /// Set the root growth multiplier
    pub fn with_growth_multiplier(mut self, multiplier: f32) -> Self {
        self.growth_multiplier = multiplier;
        self
    }

    /// Set the half extent of the default root region
    pub fn with_initial_half_extent(mut self, half_extent: f32) -> Self {
        self.initial_half_extent = half_extent;
        self
    }

    /// Check the invariants the tree relies on
    ///
    /// Growth must at least double the root so rebuilding terminates, and the
    /// default root must have a positive size.
    pub fn check(&self) -> TreeResult<()> {
        if self.capacity_per_node < 1 {
            return Err(TreeError::InvalidConfiguration(format!(
                "capacity_per_node must be at least 1, got {}",
                self.capacity_per_node
            )));
        }
        if !self.growth_multiplier.is_finite() || self.growth_multiplier < 2.0 {
            return Err(TreeError::InvalidConfiguration(format!(
                "growth_multiplier must be a finite value >= 2, got {}",
                self.growth_multiplier
            )));
        }
        if !(self.initial_half_extent * 2.0).is_finite() || self.initial_half_extent <= 0.0 {
            return Err(TreeError::InvalidConfiguration(format!(
                "initial_half_extent must be a finite value > 0, got {}",
                self.initial_half_extent
            )));
        }
        Ok(())
    }
}

impl Config for TreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(ConfigError::from)
    }
}
