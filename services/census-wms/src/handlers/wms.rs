//! WMS (Web Map Service) request handlers.
//!
//! This module handles WMS 1.3.0 protocol requests:
//! - GetCapabilities: Returns service metadata and available layers
//! - GetMap: Renders census districts as map images
//! - GetFeatureInfo: Returns district attributes at a specific point
//! - GetLegendGraphic: Returns the HTML legend for a layer style

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use wms_common::{crs::mercator_to_wgs84, BoundingBox, CrsCode, WmsError};
use wms_protocol::{
    legend_html, pixel_to_geographic, FeatureInfo, FeatureInfoResponse, GetFeatureInfoRequest,
    GetLegendGraphicRequest, GetMapRequest, InfoFormat, MapFormat, WmsCapabilitiesBuilder,
    WmsKvpParams, WmsLayerInfo, WmsRequest, WmsStyleInfo,
};

use super::common::{convert_png_to_jpeg, exception_response};
use crate::layer_config::LayerKind;
use crate::metrics::Timer;
use crate::rendering::render_map;
use crate::state::AppState;

/// Advertised extent for layers whose dataset is empty.
const FALLBACK_EXTENT: BoundingBox = BoundingBox {
    min_x: 29.5,
    min_y: -1.5,
    max_x: 35.0,
    max_y: 4.3,
};

// ============================================================================
// WMS Handler Entry Point
// ============================================================================

#[instrument(skip(state))]
pub async fn wms_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WmsKvpParams>,
) -> Response {
    state.metrics.record_wms_request();

    match params.into_request() {
        Ok(WmsRequest::GetCapabilities { version }) => get_capabilities(&state, &version),
        Ok(WmsRequest::GetMap(request)) => get_map(&state, request).await,
        Ok(WmsRequest::GetFeatureInfo(request)) => get_feature_info(&state, request).await,
        Ok(WmsRequest::GetLegendGraphic(request)) => get_legend_graphic(&state, &request),
        Err(e) => exception_response(&e),
    }
}

// ============================================================================
// GetCapabilities
// ============================================================================

fn get_capabilities(state: &AppState, version: &str) -> Response {
    let service_url =
        std::env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    let layers = state
        .registry
        .layer_entries()
        .into_iter()
        .map(|(collection, layer)| WmsLayerInfo {
            name: layer.name.clone(),
            title: layer.title.clone(),
            abstract_text: layer.abstract_text.clone(),
            queryable: layer.queryable,
            bounding_box: state
                .dataset_for(layer)
                .and_then(|d| d.bounds())
                .unwrap_or(FALLBACK_EXTENT),
            styles: layer
                .styles
                .iter()
                .map(|s| WmsStyleInfo {
                    name: s.name.clone(),
                    title: s.title.clone(),
                    is_default: s.default,
                })
                .collect(),
            attribution: collection.attribution.clone(),
        })
        .collect();

    let mut collections = state.registry.collections();
    collections.sort_unstable();
    let service_title = collections
        .first()
        .and_then(|id| state.registry.get_collection(id))
        .map(|c| c.display_name.clone())
        .unwrap_or_else(|| "Census WMS".to_string());

    let builder = WmsCapabilitiesBuilder {
        service_title,
        service_abstract: "District census attributes rendered as WMS map layers".to_string(),
        service_url,
        layers,
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/xml")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(builder.build(version).into())
        .unwrap()
}

// ============================================================================
// GetMap
// ============================================================================

async fn get_map(state: &AppState, request: GetMapRequest) -> Response {
    let style = style_label(&request.styles);

    info!(
        layers = ?request.layers,
        styles = ?request.styles,
        width = request.width,
        height = request.height,
        bbox = ?request.bbox,
        crs = ?request.crs,
        "GetMap request"
    );

    let timer = Timer::start();

    match render_map(state, &request).await {
        Ok(png_data) => {
            state
                .metrics
                .record_render_with_style(timer.elapsed_us(), true, &style)
                .await;

            let body = match request.format {
                MapFormat::Png => png_data,
                MapFormat::Jpeg => match convert_png_to_jpeg(&png_data) {
                    Ok(jpeg) => jpeg,
                    Err(e) => {
                        error!(error = %e, "JPEG conversion failed");
                        return exception_response(&WmsError::RenderError(e));
                    }
                },
            };

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, request.format.to_mime())
                .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                .body(body.into())
                .unwrap()
        }
        Err(e) => {
            state
                .metrics
                .record_render_with_style(timer.elapsed_us(), false, &style)
                .await;
            error!(
                layers = ?request.layers,
                styles = ?request.styles,
                bbox = ?request.bbox,
                error = %e,
                "GetMap rendering failed"
            );
            exception_response(&e)
        }
    }
}

/// Style name a render is attributed to in metrics: the first explicit
/// entry, or "default" when every entry asks for the layer default.
fn style_label(styles: &[String]) -> String {
    styles
        .iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "default".to_string())
}

// ============================================================================
// GetFeatureInfo
// ============================================================================

async fn get_feature_info(state: &AppState, request: GetFeatureInfoRequest) -> Response {
    let (lon, lat) = query_lonlat(&request);

    let timer = Timer::start();
    let mut features = Vec::new();
    for name in &request.query_layers {
        let layer = match state.registry.find_layer(name) {
            Some(l) => l,
            None => return exception_response(&WmsError::LayerNotFound(name.clone())),
        };
        if !layer.queryable {
            return exception_response(&WmsError::LayerNotQueryable(name.clone()));
        }
        let dataset = match state.dataset_for(layer) {
            Some(d) => d,
            None => return exception_response(&WmsError::LayerNotFound(name.clone())),
        };
        if let Some(feature) = dataset.locate(lon, lat) {
            features.push(FeatureInfo::new(&layer.name, feature.record.clone(), lon, lat));
        }
        if features.len() >= request.feature_count as usize {
            break;
        }
    }
    state.metrics.record_feature_lookup(timer.elapsed_us()).await;

    info!(
        query_layers = ?request.query_layers,
        lon = lon,
        lat = lat,
        hits = features.len(),
        "GetFeatureInfo request"
    );

    // A miss is an empty response, not an exception
    let response = FeatureInfoResponse::new(features);
    let body = match request.info_format {
        InfoFormat::Json => match response.to_json() {
            Ok(json) => json,
            Err(e) => return exception_response(&WmsError::InternalError(e.to_string())),
        },
        InfoFormat::Html => response.to_html(),
        InfoFormat::Xml => response.to_xml(),
        InfoFormat::Text => response.to_text(),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, request.info_format.to_mime())
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body.into())
        .unwrap()
}

/// The queried pixel as lon/lat degrees, whatever CRS the map was in.
fn query_lonlat(request: &GetFeatureInfoRequest) -> (f64, f64) {
    let (x, y) = pixel_to_geographic(
        request.i,
        request.j,
        request.width,
        request.height,
        &request.bbox,
    );
    match request.crs {
        CrsCode::Epsg4326 => (x, y),
        CrsCode::Epsg3857 => mercator_to_wgs84(x, y),
    }
}

// ============================================================================
// GetLegendGraphic
// ============================================================================

fn get_legend_graphic(state: &AppState, request: &GetLegendGraphicRequest) -> Response {
    let layer = match state.registry.find_layer(&request.layer) {
        Some(l) => l,
        None => return exception_response(&WmsError::LayerNotFound(request.layer.clone())),
    };
    if layer.kind == LayerKind::Boundary {
        return exception_response(&WmsError::StyleNotFound(format!(
            "layer {} has no styled legend",
            layer.name
        )));
    }
    let style = match layer.find_style(&request.style) {
        Some(s) => s,
        None => return exception_response(&WmsError::StyleNotFound(request.style.clone())),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(legend_html(style.mode).into())
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn info_request(crs: CrsCode, bbox: BoundingBox) -> GetFeatureInfoRequest {
        GetFeatureInfoRequest {
            layers: vec!["districts".to_string()],
            query_layers: vec!["districts".to_string()],
            crs,
            bbox,
            width: 256,
            height: 256,
            i: 128,
            j: 128,
            info_format: InfoFormat::Html,
            feature_count: 1,
        }
    }

    #[test]
    fn test_query_lonlat_geographic() {
        let request = info_request(CrsCode::Epsg4326, BoundingBox::new(30.0, 0.0, 34.0, 4.0));
        let (lon, lat) = query_lonlat(&request);
        // Center pixel lands on the bbox center, within half a pixel
        assert!((lon - 32.0).abs() < 0.01);
        assert!((lat - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_query_lonlat_mercator() {
        let half = 20037508.342789244;
        let request = info_request(CrsCode::Epsg3857, BoundingBox::new(-half, -half, half, half));
        let (lon, lat) = query_lonlat(&request);
        assert!(lon.abs() < 1.0);
        assert!(lat.abs() < 1.0);
    }

    #[test]
    fn test_style_label() {
        assert_eq!(style_label(&[]), "default");
        assert_eq!(style_label(&["".to_string(), "".to_string()]), "default");
        assert_eq!(
            style_label(&["".to_string(), "growth".to_string()]),
            "growth"
        );
    }
}
