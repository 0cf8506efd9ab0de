//! Census dataset handling: typed attribute records, threshold-band styling,
//! and spatially indexed GeoJSON feature collections.

pub mod dataset;
pub mod record;
pub mod style;

pub use dataset::{CensusDataset, CensusFeature};
pub use record::CensusRecord;
pub use style::{RenderMode, StyleSpec};
