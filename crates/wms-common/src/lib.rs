//! Common types and utilities shared across all census-wms crates.

pub mod bbox;
pub mod color;
pub mod crs;
pub mod error;
pub mod tile;

pub use bbox::BoundingBox;
pub use color::Rgba;
pub use crs::{AxisOrder, CrsCode};
pub use error::{WmsError, WmsResult};
pub use tile::TileCoord;
