//! WMS KVP (key-value pair) request binding.
//!
//! Parameter keys are matched case-insensitively by listing upper and lower
//! spellings; WMS 1.1.1 names (`SRS`, `X`, `Y`) ride along as aliases.

use serde::Deserialize;

use wms_common::{CrsCode, WmsError, WmsResult};

use crate::getfeatureinfo::{GetFeatureInfoRequest, InfoFormat};
use crate::getmap::{
    parse_bbox, parse_bgcolor, validate_dimensions, GetMapRequest, MapFormat,
};
use crate::legend::GetLegendGraphicRequest;

pub const DEFAULT_VERSION: &str = "1.3.0";
pub const DEFAULT_CRS: &str = "EPSG:4326";
pub const DEFAULT_DIMENSION: u32 = 256;

/// Raw WMS query string parameters.
#[derive(Debug, Default, Deserialize)]
pub struct WmsKvpParams {
    #[serde(rename = "SERVICE", alias = "service")]
    pub service: Option<String>,
    #[serde(rename = "REQUEST", alias = "request")]
    pub request: Option<String>,
    #[serde(rename = "VERSION", alias = "version")]
    pub version: Option<String>,
    #[serde(rename = "LAYERS", alias = "layers", alias = "LAYER", alias = "layer")]
    pub layers: Option<String>,
    #[serde(rename = "STYLES", alias = "styles", alias = "STYLE", alias = "style")]
    pub styles: Option<String>,
    #[serde(rename = "CRS", alias = "SRS", alias = "crs", alias = "srs")]
    pub crs: Option<String>,
    #[serde(rename = "BBOX", alias = "bbox")]
    pub bbox: Option<String>,
    #[serde(rename = "WIDTH", alias = "width")]
    pub width: Option<u32>,
    #[serde(rename = "HEIGHT", alias = "height")]
    pub height: Option<u32>,
    #[serde(rename = "FORMAT", alias = "format")]
    pub format: Option<String>,
    #[serde(rename = "TRANSPARENT", alias = "transparent")]
    pub transparent: Option<String>,
    #[serde(rename = "BGCOLOR", alias = "bgcolor")]
    pub bgcolor: Option<String>,
    // GetFeatureInfo parameters
    #[serde(rename = "QUERY_LAYERS", alias = "query_layers")]
    pub query_layers: Option<String>,
    #[serde(rename = "INFO_FORMAT", alias = "info_format")]
    pub info_format: Option<String>,
    #[serde(rename = "I", alias = "i", alias = "X", alias = "x")]
    pub i: Option<u32>,
    #[serde(rename = "J", alias = "j", alias = "Y", alias = "y")]
    pub j: Option<u32>,
    #[serde(rename = "FEATURE_COUNT", alias = "feature_count")]
    pub feature_count: Option<u32>,
}

/// A parsed and validated WMS request.
#[derive(Debug, Clone)]
pub enum WmsRequest {
    GetCapabilities { version: String },
    GetMap(GetMapRequest),
    GetFeatureInfo(GetFeatureInfoRequest),
    GetLegendGraphic(GetLegendGraphicRequest),
}

impl WmsKvpParams {
    /// Parse into a typed request.
    pub fn into_request(self) -> WmsResult<WmsRequest> {
        let service = self.service.as_deref().map(str::to_uppercase);
        if service.as_deref() != Some("WMS") {
            return Err(WmsError::invalid_parameter("SERVICE", "must be WMS"));
        }

        let request = self
            .request
            .as_deref()
            .map(str::to_uppercase)
            .ok_or_else(|| WmsError::MissingParameter("REQUEST".to_string()))?;

        match request.as_str() {
            "GETCAPABILITIES" => Ok(WmsRequest::GetCapabilities {
                version: self
                    .version
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            }),
            "GETMAP" => self.into_get_map().map(WmsRequest::GetMap),
            "GETFEATUREINFO" => self.into_get_feature_info().map(WmsRequest::GetFeatureInfo),
            "GETLEGENDGRAPHIC" => self.into_legend_graphic().map(WmsRequest::GetLegendGraphic),
            other => Err(WmsError::OperationNotSupported(other.to_string())),
        }
    }

    fn into_get_map(self) -> WmsResult<GetMapRequest> {
        let layers = split_list(
            self.layers
                .as_deref()
                .ok_or_else(|| WmsError::MissingParameter("LAYERS".to_string()))?,
        );
        if layers.is_empty() {
            return Err(WmsError::invalid_parameter("LAYERS", "no layer given"));
        }

        // Style entries stay positional: an empty entry selects the layer
        // default.
        let styles: Vec<String> = self
            .styles
            .as_deref()
            .map(|s| s.split(',').map(|p| p.trim().to_string()).collect())
            .unwrap_or_default();

        let version = self
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let crs = CrsCode::from_wms_string(self.crs.as_deref().unwrap_or(DEFAULT_CRS))?;
        let bbox_str = self
            .bbox
            .as_deref()
            .ok_or_else(|| WmsError::MissingParameter("BBOX".to_string()))?;
        let bbox = parse_bbox(bbox_str, crs, &version)?;

        let width = self.width.unwrap_or(DEFAULT_DIMENSION);
        let height = self.height.unwrap_or(DEFAULT_DIMENSION);
        validate_dimensions(width, height)?;

        let format = match self.format.as_deref() {
            None => MapFormat::Png,
            Some(mime) => MapFormat::from_mime(mime)
                .ok_or_else(|| WmsError::UnsupportedFormat(mime.to_string()))?,
        };

        let transparent = self
            .transparent
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let bgcolor = match self.bgcolor.as_deref() {
            None => None,
            Some(s) => Some(parse_bgcolor(s).ok_or_else(|| {
                WmsError::invalid_parameter("BGCOLOR", format!("expected 0xRRGGBB, got {s}"))
            })?),
        };

        Ok(GetMapRequest {
            layers,
            styles,
            crs,
            bbox,
            width,
            height,
            format,
            transparent,
            bgcolor,
        })
    }

    fn into_get_feature_info(self) -> WmsResult<GetFeatureInfoRequest> {
        let layers = self.layers.as_deref().map(split_list).unwrap_or_default();
        let query_layers = split_list(
            self.query_layers
                .as_deref()
                .ok_or_else(|| WmsError::MissingParameter("QUERY_LAYERS".to_string()))?,
        );
        if query_layers.is_empty() {
            return Err(WmsError::invalid_parameter("QUERY_LAYERS", "no layer given"));
        }

        let version = self
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let crs = CrsCode::from_wms_string(self.crs.as_deref().unwrap_or(DEFAULT_CRS))?;
        let bbox_str = self
            .bbox
            .as_deref()
            .ok_or_else(|| WmsError::MissingParameter("BBOX".to_string()))?;
        let bbox = parse_bbox(bbox_str, crs, &version)?;

        let width = self.width.unwrap_or(DEFAULT_DIMENSION);
        let height = self.height.unwrap_or(DEFAULT_DIMENSION);
        validate_dimensions(width, height)?;

        let i = self
            .i
            .ok_or_else(|| WmsError::MissingParameter("I".to_string()))?;
        let j = self
            .j
            .ok_or_else(|| WmsError::MissingParameter("J".to_string()))?;
        if i >= width {
            return Err(WmsError::InvalidPoint(format!(
                "I={i} outside the {width} pixel wide map"
            )));
        }
        if j >= height {
            return Err(WmsError::InvalidPoint(format!(
                "J={j} outside the {height} pixel tall map"
            )));
        }

        let info_format = self
            .info_format
            .as_deref()
            .and_then(InfoFormat::from_mime)
            .unwrap_or(InfoFormat::Html);

        let feature_count = self.feature_count.unwrap_or(1).max(1);

        Ok(GetFeatureInfoRequest {
            layers,
            query_layers,
            crs,
            bbox,
            width,
            height,
            i,
            j,
            info_format,
            feature_count,
        })
    }

    fn into_legend_graphic(self) -> WmsResult<GetLegendGraphicRequest> {
        let layer = self
            .layers
            .as_deref()
            .and_then(|l| split_list(l).into_iter().next())
            .ok_or_else(|| WmsError::MissingParameter("LAYER".to_string()))?;

        // No raster legends; only the HTML form exists.
        if let Some(format) = self.format.as_deref() {
            if !format.eq_ignore_ascii_case("text/html") {
                return Err(WmsError::UnsupportedFormat(format.to_string()));
            }
        }

        Ok(GetLegendGraphicRequest {
            layer,
            style: self.styles.unwrap_or_default(),
        })
    }
}

/// Split a comma-separated list parameter, dropping empty entries.
fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> WmsKvpParams {
        WmsKvpParams {
            service: Some("WMS".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn service_must_be_wms() {
        let params = WmsKvpParams {
            service: Some("WCS".to_string()),
            request: Some("GetMap".to_string()),
            ..Default::default()
        };
        assert!(params.into_request().is_err());

        let params = WmsKvpParams::default();
        assert!(params.into_request().is_err());
    }

    #[test]
    fn request_is_matched_case_insensitively() {
        let params = WmsKvpParams {
            request: Some("getcapabilities".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Ok(WmsRequest::GetCapabilities { .. })
        ));
    }

    #[test]
    fn unknown_request_is_not_supported() {
        let params = WmsKvpParams {
            request: Some("GetTile".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Err(WmsError::OperationNotSupported(_))
        ));
    }

    #[test]
    fn lowercase_keys_deserialize() {
        let json = r#"{"service": "WMS", "request": "GetMap", "layers": "population"}"#;
        let params: WmsKvpParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.service.as_deref(), Some("WMS"));
        assert_eq!(params.layers.as_deref(), Some("population"));
    }

    #[test]
    fn wms_1_1_aliases_deserialize() {
        let json = r#"{"SERVICE": "WMS", "SRS": "EPSG:4326", "X": 10, "Y": 20}"#;
        let params: WmsKvpParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(params.i, Some(10));
        assert_eq!(params.j, Some(20));
    }

    #[test]
    fn get_map_parses_and_flips_geographic_bbox() {
        let params = WmsKvpParams {
            request: Some("GetMap".to_string()),
            layers: Some("population,boundary".to_string()),
            styles: Some(",".to_string()),
            crs: Some("EPSG:4326".to_string()),
            bbox: Some("-1.5,29.5,4.3,35.0".to_string()),
            width: Some(512),
            height: Some(512),
            transparent: Some("TRUE".to_string()),
            ..base_params()
        };

        let request = match params.into_request().unwrap() {
            WmsRequest::GetMap(r) => r,
            other => panic!("expected GetMap, got {other:?}"),
        };

        assert_eq!(request.layers, vec!["population", "boundary"]);
        assert_eq!(request.styles, vec!["", ""]);
        assert_eq!(request.bbox.min_x, 29.5);
        assert_eq!(request.bbox.max_y, 4.3);
        assert!(request.transparent);
        assert_eq!(request.format, MapFormat::Png);
    }

    #[test]
    fn get_map_requires_layers_and_bbox() {
        let params = WmsKvpParams {
            request: Some("GetMap".to_string()),
            bbox: Some("-1.5,29.5,4.3,35.0".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Err(WmsError::MissingParameter(p)) if p == "LAYERS"
        ));

        let params = WmsKvpParams {
            request: Some("GetMap".to_string()),
            layers: Some("population".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Err(WmsError::MissingParameter(p)) if p == "BBOX"
        ));
    }

    #[test]
    fn get_map_rejects_unknown_format() {
        let params = WmsKvpParams {
            request: Some("GetMap".to_string()),
            layers: Some("population".to_string()),
            bbox: Some("-1.5,29.5,4.3,35.0".to_string()),
            format: Some("image/webp".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Err(WmsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn feature_info_validates_pixel_position() {
        let make = |i: u32| WmsKvpParams {
            request: Some("GetFeatureInfo".to_string()),
            layers: Some("population".to_string()),
            query_layers: Some("population".to_string()),
            bbox: Some("-1.5,29.5,4.3,35.0".to_string()),
            width: Some(256),
            height: Some(256),
            i: Some(i),
            j: Some(128),
            ..base_params()
        };

        assert!(matches!(
            make(128).into_request(),
            Ok(WmsRequest::GetFeatureInfo(_))
        ));
        assert!(matches!(
            make(256).into_request(),
            Err(WmsError::InvalidPoint(_))
        ));
    }

    #[test]
    fn feature_info_defaults() {
        let params = WmsKvpParams {
            request: Some("GetFeatureInfo".to_string()),
            query_layers: Some("population".to_string()),
            bbox: Some("-1.5,29.5,4.3,35.0".to_string()),
            i: Some(0),
            j: Some(0),
            ..base_params()
        };

        let request = match params.into_request().unwrap() {
            WmsRequest::GetFeatureInfo(r) => r,
            other => panic!("expected GetFeatureInfo, got {other:?}"),
        };

        assert_eq!(request.info_format, InfoFormat::Html);
        assert_eq!(request.feature_count, 1);
        assert_eq!(request.width, DEFAULT_DIMENSION);
    }

    #[test]
    fn legend_graphic_accepts_only_html() {
        let params = WmsKvpParams {
            request: Some("GetLegendGraphic".to_string()),
            layers: Some("population".to_string()),
            format: Some("image/png".to_string()),
            ..base_params()
        };
        assert!(matches!(
            params.into_request(),
            Err(WmsError::UnsupportedFormat(_))
        ));

        let params = WmsKvpParams {
            request: Some("GetLegendGraphic".to_string()),
            layers: Some("population".to_string()),
            styles: Some("growth".to_string()),
            ..base_params()
        };
        let request = match params.into_request().unwrap() {
            WmsRequest::GetLegendGraphic(r) => r,
            other => panic!("expected GetLegendGraphic, got {other:?}"),
        };
        assert_eq!(request.layer, "population");
        assert_eq!(request.style, "growth");
    }
}
