//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types shared by the geometry and the trees
//! - Logging setup

pub mod math;
pub mod logging;
