//! Slippy-map (XYZ) tile coordinates and bounds.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Half the Web Mercator world extent in meters.
const MERCATOR_EXTENT: f64 = 20037508.342789244;

/// A tile coordinate (z/x/y), XYZ top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether x/y fall inside the 2^z grid for this zoom.
    pub fn is_valid(&self) -> bool {
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Tile bounds in Web Mercator meters (EPSG:3857).
    pub fn mercator_bounds(&self) -> BoundingBox {
        let n = (1u64 << self.z) as f64;
        let span = 2.0 * MERCATOR_EXTENT / n;

        let min_x = -MERCATOR_EXTENT + self.x as f64 * span;
        let max_y = MERCATOR_EXTENT - self.y as f64 * span;

        BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
    }

    /// Tile bounds in WGS84 lon/lat degrees.
    pub fn latlon_bounds(&self) -> BoundingBox {
        let n = (1u64 << self.z) as f64;

        let lon_min = self.x as f64 / n * 360.0 - 180.0;
        let lon_max = (self.x + 1) as f64 / n * 360.0 - 180.0;

        let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * self.y as f64 / n))
            .sinh()
            .atan()
            .to_degrees();
        let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (self.y + 1) as f64 / n))
            .sinh()
            .atan()
            .to_degrees();

        BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
    }
}

/// Tile containing a WGS84 coordinate at the given zoom.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let n = (1u64 << zoom) as f64;

    let x = ((lon + 180.0) / 360.0 * n).floor() as u32;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor() as u32;

    TileCoord { z: zoom, x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_zero_covers_world() {
        let bounds = TileCoord::new(0, 0, 0).mercator_bounds();
        assert!((bounds.min_x + MERCATOR_EXTENT).abs() < 1.0);
        assert!((bounds.max_x - MERCATOR_EXTENT).abs() < 1.0);
        assert!((bounds.min_y + MERCATOR_EXTENT).abs() < 1.0);
        assert!((bounds.max_y - MERCATOR_EXTENT).abs() < 1.0);
    }

    #[test]
    fn kampala_tile_at_default_zoom() {
        let tile = latlon_to_tile(0.3476, 32.5825, 7);
        assert_eq!(tile, TileCoord::new(7, 75, 63));

        let bounds = tile.latlon_bounds();
        assert!(bounds.contains_point(32.5825, 0.3476));
    }

    #[test]
    fn latlon_bounds_are_contiguous() {
        let a = TileCoord::new(7, 75, 63).latlon_bounds();
        let b = TileCoord::new(7, 76, 63).latlon_bounds();
        assert!((a.max_x - b.min_x).abs() < 1e-9);
    }

    #[test]
    fn validity_check() {
        assert!(TileCoord::new(0, 0, 0).is_valid());
        assert!(!TileCoord::new(0, 1, 0).is_valid());
        assert!(TileCoord::new(7, 127, 127).is_valid());
        assert!(!TileCoord::new(7, 128, 0).is_valid());
    }
}
