//! WMS GetMap request types and parameter parsing.

use serde::{Deserialize, Serialize};

use wms_common::{AxisOrder, BoundingBox, CrsCode, Rgba, WmsError, WmsResult};

/// Largest map edge the renderer will produce.
pub const MAX_DIMENSION: u32 = 4096;

/// Supported GetMap output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum MapFormat {
    /// image/png - lossless, supports transparency
    #[serde(rename = "image/png")]
    #[default]
    Png,
    /// image/jpeg - lossy, opaque
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl MapFormat {
    /// Parse from MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(MapFormat::Png),
            "image/jpeg" | "image/jpg" => Some(MapFormat::Jpeg),
            _ => None,
        }
    }

    /// Get MIME type string.
    pub fn to_mime(&self) -> &'static str {
        match self {
            MapFormat::Png => "image/png",
            MapFormat::Jpeg => "image/jpeg",
        }
    }
}

/// GetMap request parameters, validated and in lon/lat axis order.
#[derive(Debug, Clone)]
pub struct GetMapRequest {
    /// Layers to draw, bottom to top
    pub layers: Vec<String>,
    /// One style per layer; empty string means the layer default
    pub styles: Vec<String>,
    /// Coordinate reference system of the bbox
    pub crs: CrsCode,
    /// Bounding box in CRS units, x/y order
    pub bbox: BoundingBox,
    /// Map width in pixels
    pub width: u32,
    /// Map height in pixels
    pub height: u32,
    /// Output format
    pub format: MapFormat,
    /// Transparent background (PNG only)
    pub transparent: bool,
    /// Background color when not transparent
    pub bgcolor: Option<Rgba>,
}

impl GetMapRequest {
    /// Style requested for the layer at `index`, if any non-empty entry
    /// was given.
    pub fn style_for_layer(&self, index: usize) -> Option<&str> {
        self.styles.get(index).map(String::as_str).filter(|s| !s.is_empty())
    }
}

/// Parse a WMS 1.3.0 BBOX parameter.
///
/// 1.3.0 with a geographic CRS uses lat/lon axis order on the wire; the
/// result is always x/y (lon/lat) order.
pub fn parse_bbox_1_3(bbox_str: &str, crs: CrsCode) -> WmsResult<BoundingBox> {
    let raw = BoundingBox::from_wms_string(bbox_str)?;

    let bbox = match crs.axis_order_wms_1_3() {
        AxisOrder::LatLon => BoundingBox::new(raw.min_y, raw.min_x, raw.max_y, raw.max_x),
        AxisOrder::XY => raw,
    };

    if bbox.is_degenerate() {
        return Err(WmsError::InvalidBbox(format!(
            "BBOX has zero or negative extent: {bbox_str}"
        )));
    }

    Ok(bbox)
}

/// Parse a BBOX parameter honoring the negotiated protocol version.
/// 1.1.x requests always use lon/lat axis order.
pub fn parse_bbox(bbox_str: &str, crs: CrsCode, version: &str) -> WmsResult<BoundingBox> {
    if version.starts_with("1.1") {
        let bbox = BoundingBox::from_wms_string(bbox_str)?;
        if bbox.is_degenerate() {
            return Err(WmsError::InvalidBbox(format!(
                "BBOX has zero or negative extent: {bbox_str}"
            )));
        }
        return Ok(bbox);
    }
    parse_bbox_1_3(bbox_str, crs)
}

/// Parse a WMS BGCOLOR parameter ("0xRRGGBB").
pub fn parse_bgcolor(s: &str) -> Option<Rgba> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if hex.len() != 6 {
        return None;
    }
    Rgba::from_hex(hex)
}

/// Validate requested image dimensions.
pub fn validate_dimensions(width: u32, height: u32) -> WmsResult<()> {
    if width == 0 || width > MAX_DIMENSION {
        return Err(WmsError::invalid_parameter(
            "WIDTH",
            format!("must be 1..={MAX_DIMENSION}, got {width}"),
        ));
    }
    if height == 0 || height > MAX_DIMENSION {
        return Err(WmsError::invalid_parameter(
            "HEIGHT",
            format!("must be 1..={MAX_DIMENSION}, got {height}"),
        ));
    }
    Ok(())
}
