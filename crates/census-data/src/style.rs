//! Threshold-band styling for census features.
//!
//! Styling is a pure function of a feature's resolved attributes. Density
//! drives the choropleth fill and the marker radius; growth rate drives the
//! marker fill. All bands use strict `>` lower bounds evaluated highest
//! first, so a value sitting exactly on a threshold falls into the band
//! below it.

use crate::record::CensusRecord;
use wms_common::Rgba;

/// Fill for values that match no band, and for missing attributes.
pub const DEFAULT_FILL: Rgba = Rgba::opaque(0xff, 0xff, 0xb2);

/// Marker radius for densities that match no band, in pixels.
pub const DEFAULT_RADIUS: f64 = 10.0;

/// Density bands (strict lower bounds, descending) with choropleth fills.
pub const DENSITY_FILL_BANDS: [(f64, Rgba); 5] = [
    (3000.0, Rgba::opaque(0xbd, 0x00, 0x26)),
    (600.0, Rgba::opaque(0xce, 0x40, 0x49)),
    (400.0, Rgba::opaque(0xde, 0x80, 0x6c)),
    (200.0, Rgba::opaque(0xef, 0xbf, 0x8f)),
    (29.0, Rgba::opaque(0xff, 0xff, 0xb2)),
];

/// Density bands (strict lower bounds, descending) with marker radii.
pub const DENSITY_RADIUS_BANDS: [(f64, f64); 5] = [
    (3000.0, 50.0),
    (600.0, 20.0),
    (400.0, 15.0),
    (200.0, 10.0),
    (29.0, 5.0),
];

/// District boundary stroke. Fixed, not data-dependent.
pub const BOUNDARY_STROKE: Rgba = Rgba::opaque(0xa3, 0xb8, 0xba);
pub const BOUNDARY_STROKE_WIDTH: u32 = 2;

/// How a census layer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// District polygons filled by density band.
    PolygonFill,
    /// Centroid circles sized by density band, colored by growth band.
    PointMarker,
}

/// Resolved visual style for one feature. Data features draw with no
/// stroke; the radius is present only in point-marker mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSpec {
    pub fill: Rgba,
    pub radius: Option<f64>,
}

/// Select the style for a feature. Missing or unparseable attributes
/// land in the default band, never an error.
pub fn style_for(record: &CensusRecord, mode: RenderMode) -> StyleSpec {
    match mode {
        RenderMode::PolygonFill => StyleSpec {
            fill: density_fill(record.density_2024),
            radius: None,
        },
        RenderMode::PointMarker => StyleSpec {
            fill: growth_fill(record.growth_rate),
            radius: Some(marker_radius(record.density_2024)),
        },
    }
}

/// Choropleth fill color for a population density.
pub fn density_fill(density: Option<f64>) -> Rgba {
    if let Some(d) = density {
        for (threshold, color) in DENSITY_FILL_BANDS {
            if d > threshold {
                return color;
            }
        }
    }
    DEFAULT_FILL
}

/// Marker radius in pixels for a population density.
pub fn marker_radius(density: Option<f64>) -> f64 {
    if let Some(d) = density {
        for (threshold, radius) in DENSITY_RADIUS_BANDS {
            if d > threshold {
                return radius;
            }
        }
    }
    DEFAULT_RADIUS
}

/// Marker fill color for a signed growth-rate percentage.
pub fn growth_fill(growth: Option<f64>) -> Rgba {
    let g = match growth {
        Some(g) if !g.is_nan() => g,
        _ => return DEFAULT_FILL,
    };

    match g {
        g if g < -20.0 => DEFAULT_FILL, // below -20 keeps the default fill
        g if g < 0.0 => Rgba::opaque(0x2b, 0x83, 0xba),
        g if g < 20.0 => Rgba::opaque(0xff, 0xff, 0xb2),
        g if g < 40.0 => Rgba::opaque(0x59, 0x00, 0x01),
        g if g < 60.0 => Rgba::opaque(0xfd, 0x6b, 0x19),
        g if g < 80.0 => Rgba::opaque(0xbd, 0x00, 0x26),
        _ => Rgba::opaque(0x80, 0x00, 0x80),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn density_record(d: f64) -> CensusRecord {
        CensusRecord {
            density_2024: Some(d),
            ..Default::default()
        }
    }

    fn growth_record(g: f64) -> CensusRecord {
        CensusRecord {
            growth_rate: Some(g),
            ..Default::default()
        }
    }

    fn hex(s: &str) -> Rgba {
        Rgba::from_hex(s).unwrap()
    }

    #[test]
    fn density_fill_bands() {
        assert_eq!(density_fill(Some(3500.0)), hex("#bd0026"));
        assert_eq!(density_fill(Some(601.0)), hex("#ce4049"));
        assert_eq!(density_fill(Some(450.0)), hex("#de806c"));
        assert_eq!(density_fill(Some(250.0)), hex("#efbf8f"));
        assert_eq!(density_fill(Some(100.0)), hex("#ffffb2"));
        assert_eq!(density_fill(Some(10.0)), hex("#ffffb2"));
    }

    #[test]
    fn density_thresholds_are_strict() {
        // Exactly on a threshold falls into the band below it.
        assert_eq!(density_fill(Some(3000.0)), hex("#ce4049"));
        assert_eq!(density_fill(Some(600.0)), hex("#de806c"));
        assert_eq!(density_fill(Some(400.0)), hex("#efbf8f"));
        assert_eq!(density_fill(Some(200.0)), hex("#ffffb2"));

        assert_eq!(marker_radius(Some(3000.0)), 20.0);
        assert_eq!(marker_radius(Some(29.0)), DEFAULT_RADIUS);
        // Just above the lowest threshold lands in the lowest band.
        assert_eq!(marker_radius(Some(29.1)), 5.0);
    }

    #[test]
    fn radius_bands() {
        assert_eq!(marker_radius(Some(3500.0)), 50.0);
        assert_eq!(marker_radius(Some(1000.0)), 20.0);
        assert_eq!(marker_radius(Some(500.0)), 15.0);
        assert_eq!(marker_radius(Some(300.0)), 10.0);
        assert_eq!(marker_radius(Some(50.0)), 5.0);
        assert_eq!(marker_radius(Some(5.0)), DEFAULT_RADIUS);
        assert_eq!(marker_radius(None), DEFAULT_RADIUS);
    }

    #[test]
    fn growth_bands() {
        assert_eq!(growth_fill(Some(-5.0)), hex("#2b83ba"));
        assert_eq!(growth_fill(Some(-20.0)), hex("#2b83ba"));
        assert_eq!(growth_fill(Some(0.0)), hex("#ffffb2"));
        assert_eq!(growth_fill(Some(19.9)), hex("#ffffb2"));
        assert_eq!(growth_fill(Some(20.0)), hex("#590001"));
        assert_eq!(growth_fill(Some(45.0)), hex("#fd6b19"));
        assert_eq!(growth_fill(Some(60.0)), hex("#bd0026"));
        assert_eq!(growth_fill(Some(79.9)), hex("#bd0026"));
        assert_eq!(growth_fill(Some(80.0)), hex("#800080"));
        assert_eq!(growth_fill(Some(250.0)), hex("#800080"));
    }

    #[test]
    fn growth_below_negative_twenty_uses_default() {
        assert_eq!(growth_fill(Some(-20.1)), DEFAULT_FILL);
        assert_eq!(growth_fill(Some(-100.0)), DEFAULT_FILL);
    }

    #[test]
    fn missing_attributes_use_defaults() {
        let spec = style_for(&CensusRecord::default(), RenderMode::PolygonFill);
        assert_eq!(spec.fill, DEFAULT_FILL);
        assert_eq!(spec.radius, None);

        let spec = style_for(&CensusRecord::default(), RenderMode::PointMarker);
        assert_eq!(spec.fill, DEFAULT_FILL);
        assert_eq!(spec.radius, Some(DEFAULT_RADIUS));
    }

    #[test]
    fn style_for_is_idempotent() {
        let record = CensusRecord {
            density_2024: Some(742.0),
            growth_rate: Some(33.0),
            ..Default::default()
        };

        let first = style_for(&record, RenderMode::PointMarker);
        let second = style_for(&record, RenderMode::PointMarker);
        assert_eq!(first, second);
    }

    #[test]
    fn dense_district_scenario() {
        let record = density_record(3500.0);

        let polygon = style_for(&record, RenderMode::PolygonFill);
        assert_eq!(polygon.fill, hex("#bd0026"));

        let point = style_for(&record, RenderMode::PointMarker);
        assert_eq!(point.radius, Some(50.0));
    }

    #[test]
    fn growth_scenario() {
        let spec = style_for(&growth_record(45.0), RenderMode::PointMarker);
        assert_eq!(spec.fill, hex("#fd6b19"));
    }
}
