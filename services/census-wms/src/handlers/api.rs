//! REST API handlers for the viewer: info overlay state, district listings,
//! and service status.

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use census_data::CensusRecord;
use wms_protocol::{popup_html, Anchor, InfoOverlay};

use crate::metrics::Timer;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Info overlay state as reported to the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayResponse {
    pub shown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    pub content: String,
}

impl OverlayResponse {
    fn from_overlay(overlay: &InfoOverlay) -> Self {
        Self {
            shown: overlay.is_shown(),
            anchor: overlay.anchor(),
            content: overlay.content().to_string(),
        }
    }
}

/// A map click sent by the viewer, in lon/lat degrees.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub lon: f64,
    pub lat: f64,
}

/// Result of a map click: whether a district was hit, and the overlay
/// state after the click.
#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub hit: bool,
    pub overlay: OverlayResponse,
}

/// One district in the listing.
#[derive(Debug, Serialize)]
pub struct DistrictSummary {
    #[serde(flatten)]
    pub record: CensusRecord,
    pub lon: f64,
    pub lat: f64,
}

/// District listing for the whole loaded collection.
#[derive(Debug, Serialize)]
pub struct DistrictsResponse {
    pub count: usize,
    pub districts: Vec<DistrictSummary>,
}

/// Service status summary.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub collections: usize,
    pub layers: usize,
    pub districts: usize,
    pub overlay_shown: bool,
}

// ============================================================================
// Overlay Handlers
// ============================================================================

/// GET /api/overlay - current overlay state
#[instrument(skip(state))]
pub async fn overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<OverlayResponse> {
    state.metrics.record_overlay_request();
    let overlay = state.overlay.read().await;
    Json(OverlayResponse::from_overlay(&overlay))
}

/// POST /api/overlay/click - resolve a map click against the districts.
///
/// A hit replaces the overlay's anchor and content. A click that lands
/// outside every district changes nothing; any popup already on screen
/// stays exactly where it was.
#[instrument(skip(state))]
pub async fn overlay_click_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(click): Json<ClickRequest>,
) -> Json<ClickResponse> {
    state.metrics.record_overlay_request();

    let timer = Timer::start();
    let mut record = None;
    for (_, layer) in state.registry.layer_entries() {
        if !layer.queryable {
            continue;
        }
        if let Some(feature) = state
            .dataset_for(layer)
            .and_then(|d| d.locate(click.lon, click.lat))
        {
            record = Some(feature.record.clone());
            break;
        }
    }
    state.metrics.record_feature_lookup(timer.elapsed_us()).await;

    info!(
        lon = click.lon,
        lat = click.lat,
        hit = record.is_some(),
        "Overlay click"
    );

    let mut overlay = state.overlay.write().await;
    if let Some(record) = &record {
        overlay.show(click.lon, click.lat, popup_html(record));
    }

    Json(ClickResponse {
        hit: record.is_some(),
        overlay: OverlayResponse::from_overlay(&overlay),
    })
}

/// POST /api/overlay/close - dismiss the popup
#[instrument(skip(state))]
pub async fn overlay_close_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<OverlayResponse> {
    state.metrics.record_overlay_request();
    let mut overlay = state.overlay.write().await;
    overlay.hide();
    Json(OverlayResponse::from_overlay(&overlay))
}

// ============================================================================
// Districts and Status
// ============================================================================

/// GET /api/districts - every loaded district with its resolved attributes
#[instrument(skip(state))]
pub async fn districts_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<DistrictsResponse>, StatusCode> {
    let mut districts: Vec<DistrictSummary> = state
        .datasets()
        .flat_map(|(_, dataset)| dataset.iter())
        .map(|feature| DistrictSummary {
            record: feature.record.clone(),
            lon: feature.centroid.x(),
            lat: feature.centroid.y(),
        })
        .collect();

    districts.sort_by(|a, b| a.record.name.cmp(&b.record.name));

    Ok(Json(DistrictsResponse {
        count: districts.len(),
        districts,
    }))
}

/// GET /api/status - service summary for dashboards
#[instrument(skip(state))]
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.metrics.snapshot().await;
    let overlay_shown = state.overlay.read().await.is_shown();

    Json(StatusResponse {
        service: "census-wms",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: snapshot.uptime_secs,
        collections: state.registry.collections().len(),
        layers: state.registry.total_layers(),
        districts: state.total_districts(),
        overlay_shown,
    })
}

// ============================================================================
// Tests
// ============================================================================
