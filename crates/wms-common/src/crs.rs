//! Coordinate Reference System handling and Web Mercator math.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Half the Web Mercator world extent in meters.
const MERCATOR_EXTENT: f64 = 20037508.342789244;

/// CRS codes supported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS string from a WMS request (SRS and CRS parameter forms).
    ///
    /// Accepts "EPSG:4326", "CRS:84" (lon/lat axis order), "EPSG:3857" and
    /// the legacy "EPSG:900913" alias, case-insensitively.
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        match s.to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Axis order of a BBOX in WMS 1.3.0: geographic CRS use lat/lon,
    /// projected CRS use x/y.
    pub fn axis_order_wms_1_3(&self) -> AxisOrder {
        match self {
            CrsCode::Epsg4326 => AxisOrder::LatLon,
            CrsCode::Epsg3857 => AxisOrder::XY,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Valid coordinate range for this CRS.
    pub fn valid_bounds(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            CrsCode::Epsg3857 => BoundingBox::new(
                -MERCATOR_EXTENT,
                -MERCATOR_EXTENT,
                MERCATOR_EXTENT,
                MERCATOR_EXTENT,
            ),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// Axis order for BBOX interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude), X (longitude)
    LatLon,
}

/// Convert WGS84 lon/lat degrees to Web Mercator meters.
pub fn wgs84_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon * MERCATOR_EXTENT / 180.0;
    // Clamp away from the poles where the projection diverges.
    let lat = lat.clamp(-85.06, 85.06);
    let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln() / std::f64::consts::PI
        * MERCATOR_EXTENT;
    (x, y)
}

/// Convert Web Mercator meters to WGS84 lon/lat degrees.
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x / MERCATOR_EXTENT * 180.0;
    let lat = y / MERCATOR_EXTENT * 180.0;
    let lat = 180.0 / std::f64::consts::PI
        * (2.0 * ((lat * std::f64::consts::PI / 180.0).exp()).atan() - std::f64::consts::PI / 2.0);
    (lon, lat)
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_crs() {
        assert_eq!(
            CrsCode::from_wms_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("crs:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("epsg:3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_wms_string("EPSG:900913").unwrap(),
            CrsCode::Epsg3857
        );
        assert!(CrsCode::from_wms_string("EPSG:32636").is_err());
    }

    #[test]
    fn axis_order() {
        assert_eq!(CrsCode::Epsg4326.axis_order_wms_1_3(), AxisOrder::LatLon);
        assert_eq!(CrsCode::Epsg3857.axis_order_wms_1_3(), AxisOrder::XY);
    }

    #[test]
    fn mercator_round_trip() {
        let (x, y) = wgs84_to_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        // Kampala
        let (x, y) = wgs84_to_mercator(32.5825, 0.3476);
        let (lon, lat) = mercator_to_wgs84(x, y);
        assert!((lon - 32.5825).abs() < 1e-6);
        assert!((lat - 0.3476).abs() < 1e-6);
    }

    #[test]
    fn mercator_known_point() {
        // 180°E maps to the mercator extent
        let (x, _) = wgs84_to_mercator(180.0, 0.0);
        assert!((x - 20037508.342789244).abs() < 1e-3);
    }
}
