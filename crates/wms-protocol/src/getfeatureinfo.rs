//! WMS GetFeatureInfo handling.
//!
//! Implements the OGC WMS 1.3.0 GetFeatureInfo operation for querying
//! district attributes at a map point.

use census_data::CensusRecord;
use serde::{Deserialize, Serialize};

use wms_common::{BoundingBox, CrsCode};

use crate::popup::{format_number, popup_html};

/// GetFeatureInfo request parameters, validated and in lon/lat axis order.
#[derive(Debug, Clone)]
pub struct GetFeatureInfoRequest {
    /// Layers to display (same as GetMap)
    pub layers: Vec<String>,
    /// Layers to query for information
    pub query_layers: Vec<String>,
    /// Coordinate reference system of the bbox
    pub crs: CrsCode,
    /// Bounding box in CRS units, x/y order
    pub bbox: BoundingBox,
    /// Map width in pixels
    pub width: u32,
    /// Map height in pixels
    pub height: u32,
    /// Pixel column (0-based from left)
    pub i: u32,
    /// Pixel row (0-based from top)
    pub j: u32,
    /// Response format
    pub info_format: InfoFormat,
    /// Maximum number of features to return
    pub feature_count: u32,
}

/// Supported GetFeatureInfo response formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum InfoFormat {
    /// application/json - Machine-readable JSON
    #[serde(rename = "application/json")]
    Json,
    /// text/html - Human-readable HTML for popups
    #[serde(rename = "text/html")]
    #[default]
    Html,
    /// text/xml - OGC-compliant XML
    #[serde(rename = "text/xml")]
    Xml,
    /// text/plain - Simple text format
    #[serde(rename = "text/plain")]
    Text,
}

impl InfoFormat {
    /// Parse from MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "application/json" => Some(InfoFormat::Json),
            "text/html" => Some(InfoFormat::Html),
            "text/xml" => Some(InfoFormat::Xml),
            "text/plain" => Some(InfoFormat::Text),
            _ => None,
        }
    }

    /// Get MIME type string.
    pub fn to_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Html => "text/html",
            InfoFormat::Xml => "text/xml",
            InfoFormat::Text => "text/plain",
        }
    }
}

/// Geographic location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

/// District information for a single layer at a point.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfo {
    /// Layer the hit came from
    pub layer_name: String,
    /// Resolved census attributes
    #[serde(flatten)]
    pub record: CensusRecord,
    /// Query location
    pub location: Location,
}

impl FeatureInfo {
    pub fn new(layer_name: &str, record: CensusRecord, lon: f64, lat: f64) -> Self {
        Self {
            layer_name: layer_name.to_string(),
            record,
            location: Location {
                longitude: lon,
                latitude: lat,
            },
        }
    }
}

/// GetFeatureInfo response container.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureInfoResponse {
    /// Response type identifier
    #[serde(rename = "type")]
    pub response_type: String,
    /// List of feature information
    pub features: Vec<FeatureInfo>,
}

impl FeatureInfoResponse {
    /// Create new response with features.
    pub fn new(features: Vec<FeatureInfo>) -> Self {
        Self {
            response_type: "FeatureInfoResponse".to_string(),
            features,
        }
    }

    /// Format as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format as HTML for popup display. A miss yields an empty container.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"feature-info\">");

        for feature in &self.features {
            html.push_str(&popup_html(&feature.record));
        }

        html.push_str("</div>");
        html
    }

    /// Format as plain text.
    pub fn to_text(&self) -> String {
        let mut text = String::new();

        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                text.push_str("\n---\n");
            }
            text.push_str(&format!("Layer: {}\n", feature.layer_name));
            if let Some(name) = feature.record.display_name() {
                text.push_str(&format!("Name: {}\n", name));
            }
            if let Some(v) = feature.record.total_2014 {
                text.push_str(&format!("Total 2014: {}\n", format_number(v)));
            }
            if let Some(v) = feature.record.total_2024 {
                text.push_str(&format!("Total 2024: {}\n", format_number(v)));
            }
            if let Some(v) = feature.record.growth_rate {
                text.push_str(&format!("Growth Rate: {}%\n", format_number(v)));
            }
            if let Some(v) = feature.record.density_2024 {
                text.push_str(&format!("Population Density 2024: {}\n", format_number(v)));
            }
            text.push_str(&format!(
                "Location: {:.4}°E, {:.4}°N\n",
                feature.location.longitude, feature.location.latitude
            ));
        }

        text
    }

    /// Format as XML.
    pub fn to_xml(&self) -> String {
        use crate::exceptions::xml_escape;

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<FeatureInfoResponse>\n");

        for feature in &self.features {
            xml.push_str("  <FeatureInfo>\n");
            xml.push_str(&format!(
                "    <LayerName>{}</LayerName>\n",
                xml_escape(&feature.layer_name)
            ));
            if let Some(name) = feature.record.display_name() {
                xml.push_str(&format!("    <Name>{}</Name>\n", xml_escape(name)));
            }
            if let Some(v) = feature.record.total_2014 {
                xml.push_str(&format!("    <Total2014>{}</Total2014>\n", format_number(v)));
            }
            if let Some(v) = feature.record.total_2024 {
                xml.push_str(&format!("    <Total2024>{}</Total2024>\n", format_number(v)));
            }
            if let Some(v) = feature.record.growth_rate {
                xml.push_str(&format!(
                    "    <GrowthRate>{}</GrowthRate>\n",
                    format_number(v)
                ));
            }
            if let Some(v) = feature.record.density_2024 {
                xml.push_str(&format!(
                    "    <PopulationDensity2024>{}</PopulationDensity2024>\n",
                    format_number(v)
                ));
            }
            xml.push_str(&format!(
                "    <Location longitude=\"{:.6}\" latitude=\"{:.6}\"/>\n",
                feature.location.longitude, feature.location.latitude
            ));
            xml.push_str("  </FeatureInfo>\n");
        }

        xml.push_str("</FeatureInfoResponse>");
        xml
    }
}

/// Convert pixel coordinates to positions in the request CRS.
///
/// Uses the pixel-center convention (a 0.5 offset); `j` counts down from
/// the top of the map, so the y axis is inverted relative to the bbox.
pub fn pixel_to_geographic(i: u32, j: u32, width: u32, height: u32, bbox: &BoundingBox) -> (f64, f64) {
    let x_ratio = (i as f64 + 0.5) / width as f64;
    let y_ratio = (j as f64 + 0.5) / height as f64;

    let x = bbox.min_x + x_ratio * bbox.width();
    let y = bbox.max_y - y_ratio * bbox.height();

    (x, y)
}
