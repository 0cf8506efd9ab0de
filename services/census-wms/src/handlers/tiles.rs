//! XYZ tile handler for slippy-map clients.
//!
//! Tiles are GetMap requests in disguise: fixed 256px size, Web Mercator,
//! transparent PNG. The viewer page requests district layers this way.

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::{error, instrument};

use wms_common::{CrsCode, TileCoord, WmsError};
use wms_protocol::{GetMapRequest, MapFormat};

use super::common::exception_response;
use crate::metrics::Timer;
use crate::rendering::render_map;
use crate::state::AppState;

/// Tile edge length in pixels.
const TILE_SIZE: u32 = 256;

/// XYZ tile handler for Leaflet/OpenLayers
#[instrument(skip(state))]
pub async fn xyz_tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((layer, style, z, x, y)): Path<(String, String, u32, u32, String)>,
) -> Response {
    state.metrics.record_tile_request();

    // The y segment usually carries a ".png" suffix
    let (y_str, _) = y.rsplit_once('.').unwrap_or((&y, "png"));
    let y_val: u32 = match y_str.parse() {
        Ok(v) => v,
        Err(_) => {
            return exception_response(&WmsError::invalid_parameter(
                "Y",
                format!("not a tile row: {y_str}"),
            ))
        }
    };

    let coord = TileCoord::new(z, x, y_val);
    if !coord.is_valid() {
        return exception_response(&WmsError::invalid_parameter(
            "TILE",
            format!("{}/{}/{} outside the zoom {} grid", z, x, y_val, z),
        ));
    }

    let request = GetMapRequest {
        layers: vec![layer],
        // "default" in a tile URL selects the layer's default style
        styles: vec![if style.eq_ignore_ascii_case("default") {
            String::new()
        } else {
            style
        }],
        crs: CrsCode::Epsg3857,
        bbox: coord.mercator_bounds(),
        width: TILE_SIZE,
        height: TILE_SIZE,
        format: MapFormat::Png,
        transparent: true,
        bgcolor: None,
    };

    let timer = Timer::start();
    match render_map(&state, &request).await {
        Ok(png_data) => {
            state.metrics.record_render(timer.elapsed_us(), true).await;
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "image/png")
                .header(header::CACHE_CONTROL, "public, max-age=3600")
                .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                .body(png_data.into())
                .unwrap()
        }
        Err(e) => {
            state.metrics.record_render(timer.elapsed_us(), false).await;
            error!(
                layer = %request.layers[0],
                z = z,
                x = x,
                y = y_val,
                error = %e,
                "Tile rendering failed"
            );
            exception_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_bbox_is_square() {
        let bounds = TileCoord::new(7, 75, 63).mercator_bounds();
        assert!((bounds.width() - bounds.height()).abs() < 1e-6);
    }

    #[test]
    fn test_png_suffix_strip() {
        let y = "63.png".to_string();
        let (y_str, _) = y.rsplit_once('.').unwrap_or((&y, "png"));
        assert_eq!(y_str, "63");

        let bare = "63".to_string();
        let (y_str, _) = bare.rsplit_once('.').unwrap_or((&bare, "png"));
        assert_eq!(y_str, "63");
    }
}
