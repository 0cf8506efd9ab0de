//! OGC WMS protocol implementation.
//!
//! Supports:
//! - WMS 1.3.0 KVP binding (GetCapabilities, GetMap, GetFeatureInfo,
//!   GetLegendGraphic)
//! - WMS 1.1.1 request parameters (SRS, X/Y) accepted as aliases

pub mod capabilities;
pub mod exceptions;
pub mod getfeatureinfo;
pub mod getmap;
pub mod kvp;
pub mod legend;
pub mod popup;

pub use capabilities::{WmsCapabilitiesBuilder, WmsLayerInfo, WmsStyleInfo};
pub use exceptions::{exception_for, wms_exception};
pub use getfeatureinfo::{
    pixel_to_geographic, FeatureInfo, FeatureInfoResponse, GetFeatureInfoRequest, InfoFormat,
};
pub use getmap::{GetMapRequest, MapFormat, MAX_DIMENSION};
pub use kvp::{WmsKvpParams, WmsRequest};
pub use legend::{legend_html, GetLegendGraphicRequest};
pub use popup::{format_number, popup_html, Anchor, InfoOverlay};
