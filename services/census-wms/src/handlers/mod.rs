//! HTTP request handlers for WMS, tile, and API endpoints.
//!
//! This module is organized into submodules:
//! - `wms`: WMS GetCapabilities, GetMap, GetFeatureInfo, GetLegendGraphic
//! - `tiles`: XYZ tile handler (Web Mercator, slippy-map URLs)
//! - `api`: REST API handlers (overlay state, district listing, status)
//! - `metrics`: Health checks, Prometheus metrics, and monitoring
//! - `common`: Shared utilities (exceptions, JPEG conversion)

pub mod common;
pub mod wms;
pub mod tiles;
pub mod api;
pub mod metrics;

// Re-export handlers and response types for the router
pub use common::{
    wms_exception,
    exception_response,
    convert_png_to_jpeg,
};

pub use wms::{
    wms_handler,
};

pub use tiles::{
    xyz_tile_handler,
};

pub use api::{
    ClickRequest,
    ClickResponse,
    DistrictsResponse,
    OverlayResponse,
    StatusResponse,
    overlay_handler,
    overlay_click_handler,
    overlay_close_handler,
    districts_handler,
    status_handler,
};

pub use metrics::{
    health_handler,
    ready_handler,
    metrics_handler,
    api_metrics_handler,
};
