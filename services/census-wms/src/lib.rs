//! Census WMS service library.
//!
//! This module exposes the internal modules for testing purposes.

pub mod handlers;
pub mod layer_config;
pub mod metrics;
pub mod rendering;
pub mod state;
pub mod viewer;
