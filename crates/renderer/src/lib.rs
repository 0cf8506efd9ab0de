//! Map image rendering for census visualization.
//!
//! Implements the two census drawing styles:
//! - Density choropleth (banded polygon fills)
//! - Growth markers (centroid circles sized by density)
//!
//! plus stroke-only district boundaries. Output is RGBA, encoded as PNG
//! with automatic indexed/truecolor selection.

pub mod districts;
pub mod png;

pub use districts::{Canvas, MapTransform};
