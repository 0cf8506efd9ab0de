//! GetLegendGraphic: HTML legend fragments.
//!
//! Swatch colors are sampled from the style functions rather than written
//! out again, so the legend cannot drift from the classifier.

use census_data::style::{density_fill, growth_fill, RenderMode};
use wms_common::Rgba;

/// GetLegendGraphic request parameters.
#[derive(Debug, Clone)]
pub struct GetLegendGraphicRequest {
    pub layer: String,
    pub style: String,
}

fn row(color: Rgba, label: &str) -> String {
    format!(
        r#"<div class="legend-row"><span class="swatch" style="background:{}"></span>{}</div>"#,
        color.to_css_hex(),
        label
    )
}

/// Legend for the density choropleth: one row per fill band.
fn density_legend() -> String {
    let mut html = String::from(r#"<div class="legend"><h4>Population density (people/km²)</h4>"#);
    html.push_str(&row(density_fill(Some(3500.0)), "over 3000"));
    html.push_str(&row(density_fill(Some(1000.0)), "600 - 3000"));
    html.push_str(&row(density_fill(Some(500.0)), "400 - 600"));
    html.push_str(&row(density_fill(Some(300.0)), "200 - 400"));
    html.push_str(&row(density_fill(Some(100.0)), "0 - 200"));
    html.push_str("</div>");
    html
}

/// Legend for the growth-rate markers: one row per color band, plus a note
/// about the density-scaled marker size.
fn growth_legend() -> String {
    let mut html = String::from(r#"<div class="legend"><h4>Growth rate (%)</h4>"#);
    html.push_str(&row(growth_fill(Some(-30.0)), "below -20"));
    html.push_str(&row(growth_fill(Some(-10.0)), "-20 - 0"));
    html.push_str(&row(growth_fill(Some(10.0)), "0 - 20"));
    html.push_str(&row(growth_fill(Some(30.0)), "20 - 40"));
    html.push_str(&row(growth_fill(Some(50.0)), "40 - 60"));
    html.push_str(&row(growth_fill(Some(70.0)), "60 - 80"));
    html.push_str(&row(growth_fill(Some(90.0)), "80 and above"));
    html.push_str(r#"<p class="legend-note">Marker size scales with population density.</p>"#);
    html.push_str("</div>");
    html
}

/// Build the HTML legend fragment for a render mode.
pub fn legend_html(mode: RenderMode) -> String {
    match mode {
        RenderMode::PolygonFill => density_legend(),
        RenderMode::PointMarker => growth_legend(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_legend_shows_every_band_color() {
        let html = legend_html(RenderMode::PolygonFill);

        assert!(html.contains("#bd0026"));
        assert!(html.contains("#ce4049"));
        assert!(html.contains("#de806c"));
        assert!(html.contains("#efbf8f"));
        assert!(html.contains("#ffffb2"));
        assert!(html.contains("over 3000"));
    }

    #[test]
    fn growth_legend_shows_fall_through_band() {
        let html = legend_html(RenderMode::PointMarker);

        // Growth below -20 renders with the default fill, same as 0 - 20.
        assert!(html.contains("below -20"));
        assert!(html.contains("#2b83ba"));
        assert!(html.contains("#800080"));
        assert!(html.contains("Marker size"));
    }
}
