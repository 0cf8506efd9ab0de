//! Popup content composition and overlay state.
//!
//! Content is composed once per hit from the resolved census record; the
//! overlay itself is a two-state value (hidden, shown at an anchor).

use census_data::CensusRecord;
use serde::Serialize;

use crate::exceptions::xml_escape;

/// Format a numeric attribute for display. Integral values print without a
/// decimal point, fractional values as-is.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// A numeric attribute counts for the popup only when present and non-zero.
fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Compose the popup HTML fragment for a census record.
///
/// Lines appear in a fixed order and only for attributes that are present
/// and truthy; a record with no usable attributes yields an empty fragment.
pub fn popup_html(record: &CensusRecord) -> String {
    let mut html = String::new();

    if let Some(name) = record.display_name() {
        html.push_str(&format!(
            "<p><strong>Name:</strong> {}</p>",
            xml_escape(name)
        ));
    }
    if let Some(v) = truthy(record.total_2014) {
        html.push_str(&format!(
            "<p><strong>Total 2014:</strong> {}</p>",
            format_number(v)
        ));
    }
    if let Some(v) = truthy(record.total_2024) {
        html.push_str(&format!(
            "<p><strong>Total 2024:</strong> {}</p>",
            format_number(v)
        ));
    }
    if let Some(v) = truthy(record.growth_rate) {
        html.push_str(&format!(
            "<p><strong>Growth Rate:</strong> {}%</p>",
            format_number(v)
        ));
    }
    if let Some(v) = truthy(record.density_2024) {
        html.push_str(&format!(
            "<p><strong>Population Density 2024:</strong> {} people/km²</p>",
            format_number(v)
        ));
    }

    html
}

/// Anchor coordinate of a shown popup, in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub lon: f64,
    pub lat: f64,
}

/// The single process-wide info popup.
///
/// Two states: hidden (`anchor` is `None`) and shown. Showing replaces both
/// anchor and content; hiding clears the anchor and leaves the content in
/// place. A click that hits nothing is handled by the caller as no
/// transition at all.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InfoOverlay {
    anchor: Option<Anchor>,
    content: String,
}

impl InfoOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, lon: f64, lat: f64, content: String) {
        self.anchor = Some(Anchor { lon, lat });
        self.content = content;
    }

    /// Anchor only; the composed content stays as last shown.
    pub fn hide(&mut self) {
        self.anchor = None;
    }

    pub fn is_shown(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kampala() -> CensusRecord {
        CensusRecord {
            name: Some("Kampala".to_string()),
            density_2024: Some(1200.0),
            ..Default::default()
        }
    }

    #[test]
    fn lines_follow_fixed_order() {
        let record = CensusRecord {
            name: Some("Wakiso".to_string()),
            total_2014: Some(1_997_418.0),
            total_2024: Some(3_411_177.0),
            growth_rate: Some(5.5),
            density_2024: Some(1205.0),
        };

        let html = popup_html(&record);
        let name = html.find("Name:").unwrap();
        let t2014 = html.find("Total 2014:").unwrap();
        let t2024 = html.find("Total 2024:").unwrap();
        let growth = html.find("Growth Rate:").unwrap();
        let density = html.find("Population Density 2024:").unwrap();

        assert!(name < t2014 && t2014 < t2024 && t2024 < growth && growth < density);
    }

    #[test]
    fn missing_attributes_are_omitted() {
        let html = popup_html(&kampala());

        assert!(html.contains("<strong>Name:</strong> Kampala"));
        assert!(html.contains("Population Density 2024:"));
        assert!(!html.contains("Total 2014"));
        assert!(!html.contains("Total 2024"));
        assert!(!html.contains("Growth Rate"));
    }

    #[test]
    fn zero_values_are_omitted() {
        let record = CensusRecord {
            total_2014: Some(0.0),
            growth_rate: Some(0.0),
            density_2024: Some(42.0),
            ..Default::default()
        };

        let html = popup_html(&record);
        assert!(!html.contains("Total 2014"));
        assert!(!html.contains("Growth Rate"));
        assert!(html.contains("Population Density 2024:"));
    }

    #[test]
    fn growth_rate_gets_percent_suffix() {
        let record = CensusRecord {
            growth_rate: Some(12.5),
            ..Default::default()
        };

        assert!(popup_html(&record).contains("<strong>Growth Rate:</strong> 12.5%"));
    }

    #[test]
    fn integral_values_print_without_decimals() {
        assert_eq!(format_number(150_000.0), "150000");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-20.0), "-20");
    }

    #[test]
    fn empty_record_yields_empty_fragment() {
        assert_eq!(popup_html(&CensusRecord::default()), "");
    }

    #[test]
    fn name_markup_is_escaped() {
        let record = CensusRecord {
            name: Some("<b>bold</b>".to_string()),
            ..Default::default()
        };

        let html = popup_html(&record);
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn show_replaces_anchor_and_content() {
        let mut overlay = InfoOverlay::new();
        assert!(!overlay.is_shown());

        overlay.show(32.58, 0.32, "first".to_string());
        assert!(overlay.is_shown());
        assert_eq!(overlay.content(), "first");

        overlay.show(33.2, 0.44, "second".to_string());
        assert_eq!(overlay.anchor(), Some(Anchor { lon: 33.2, lat: 0.44 }));
        assert_eq!(overlay.content(), "second");
    }

    #[test]
    fn hide_clears_anchor_but_keeps_content() {
        let mut overlay = InfoOverlay::new();
        overlay.show(32.58, 0.32, popup_html(&kampala()));
        overlay.hide();

        assert!(!overlay.is_shown());
        assert!(overlay.anchor().is_none());
        assert!(overlay.content().contains("Kampala"));
    }
}
