//! Map rendering orchestration.
//!
//! Resolves requested layers and styles against the registry, culls districts
//! to the request extent, rasters each layer in request order, and encodes
//! the result as PNG. Format conversion for non-PNG output happens in the
//! handlers.

use census_data::RenderMode;
use renderer::{png, Canvas};
use tracing::debug;
use wms_common::{crs::mercator_to_wgs84, BoundingBox, CrsCode, Rgba, WmsError, WmsResult};
use wms_protocol::GetMapRequest;

use crate::layer_config::{LayerConfig, LayerKind};
use crate::metrics::Timer;
use crate::state::AppState;

/// WMS default background when TRANSPARENT=FALSE and no BGCOLOR is given.
const DEFAULT_BGCOLOR: Rgba = Rgba::opaque(0xff, 0xff, 0xff);

/// One resolved drawing pass over a layer's dataset.
enum Pass {
    Data(RenderMode),
    Boundary,
}

/// Render a validated GetMap request to PNG bytes.
///
/// Layers draw bottom to top in request order. All layer and style
/// resolution happens before any pixels are touched, so an invalid name
/// anywhere in the request produces an exception, not a partial map.
pub async fn render_map(state: &AppState, request: &GetMapRequest) -> WmsResult<Vec<u8>> {
    let mut passes = Vec::with_capacity(request.layers.len());
    for (index, name) in request.layers.iter().enumerate() {
        let layer = state
            .registry
            .find_layer(name)
            .ok_or_else(|| WmsError::LayerNotFound(name.clone()))?;
        let pass = resolve_pass(layer, request.style_for_layer(index))?;
        passes.push((layer, pass));
    }

    let background = if request.transparent {
        None
    } else {
        Some(request.bgcolor.unwrap_or(DEFAULT_BGCOLOR))
    };

    let mut canvas = Canvas::new(
        request.width,
        request.height,
        &request.bbox,
        request.crs,
        background,
    )
    .map_err(WmsError::RenderError)?;

    // Districts are indexed in lon/lat; cull with the extent mapped back
    // from the render CRS.
    let query = geographic_extent(&request.bbox, request.crs);

    for (layer, pass) in &passes {
        let dataset = state
            .dataset_for(layer)
            .ok_or_else(|| WmsError::LayerNotFound(layer.name.clone()))?;
        let features = dataset.in_bbox(&query);
        debug!(
            layer = %layer.name,
            districts = features.len(),
            "Drawing layer"
        );
        match pass {
            Pass::Data(mode) => canvas.draw_features(features, *mode),
            Pass::Boundary => canvas.draw_boundaries(features),
        }
    }

    let rgba = canvas.into_rgba();

    let encode_timer = Timer::start();
    let encoded = png::create_png_auto(&rgba, request.width as usize, request.height as usize)
        .map_err(WmsError::RenderError)?;
    state.metrics.record_png_encode(encode_timer.elapsed_us()).await;

    Ok(encoded)
}

/// Resolve the drawing pass for one layer from its kind and requested style.
fn resolve_pass(layer: &LayerConfig, requested_style: Option<&str>) -> WmsResult<Pass> {
    match layer.kind {
        LayerKind::Boundary => {
            // Boundary layers advertise no styles, so only the empty
            // (default) style is acceptable.
            if let Some(style) = requested_style {
                return Err(WmsError::StyleNotFound(format!(
                    "{} (layer {} has no styles)",
                    style, layer.name
                )));
            }
            Ok(Pass::Boundary)
        }
        LayerKind::Census => {
            let requested = requested_style.unwrap_or("");
            let style = layer.find_style(requested).ok_or_else(|| {
                if requested.is_empty() {
                    WmsError::StyleNotFound(format!("layer {} has no default style", layer.name))
                } else {
                    WmsError::StyleNotFound(requested.to_string())
                }
            })?;
            Ok(Pass::Data(style.mode))
        }
    }
}

/// The request extent in lon/lat degrees, for dataset culling.
fn geographic_extent(bbox: &BoundingBox, crs: CrsCode) -> BoundingBox {
    match crs {
        CrsCode::Epsg4326 => *bbox,
        CrsCode::Epsg3857 => {
            let (min_lon, min_lat) = mercator_to_wgs84(bbox.min_x, bbox.min_y);
            let (max_lon, max_lat) = mercator_to_wgs84(bbox.max_x, bbox.max_y);
            BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
        }
    }
}
