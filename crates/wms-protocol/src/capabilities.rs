//! WMS Capabilities XML generation.

use wms_common::BoundingBox;

use crate::exceptions::xml_escape;

/// Generate a WMS Capabilities XML document.
pub struct WmsCapabilitiesBuilder {
    pub service_title: String,
    pub service_abstract: String,
    pub service_url: String,
    pub layers: Vec<WmsLayerInfo>,
}

/// Layer information for capabilities.
#[derive(Debug, Clone)]
pub struct WmsLayerInfo {
    pub name: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub queryable: bool,
    /// Geographic extent in lon/lat degrees
    pub bounding_box: BoundingBox,
    pub styles: Vec<WmsStyleInfo>,
    pub attribution: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WmsStyleInfo {
    pub name: String,
    pub title: String,
    pub is_default: bool,
}

impl WmsCapabilitiesBuilder {
    pub fn build(&self, version: &str) -> String {
        let mut xml = String::new();

        xml.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="{}" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
"#,
            xml_escape(version)
        ));

        // Service
        xml.push_str(&format!(
            r#"  <Service>
    <Name>WMS</Name>
    <Title>{}</Title>
    <Abstract>{}</Abstract>
    <OnlineResource xlink:href="{}/wms"/>
  </Service>
"#,
            xml_escape(&self.service_title),
            xml_escape(&self.service_abstract),
            self.service_url
        ));

        // Capability / Request
        xml.push_str(&format!(
            r#"  <Capability>
    <Request>
      <GetCapabilities>
        <Format>text/xml</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="{0}/wms?"/></Get></HTTP></DCPType>
      </GetCapabilities>
      <GetMap>
        <Format>image/png</Format>
        <Format>image/jpeg</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="{0}/wms?"/></Get></HTTP></DCPType>
      </GetMap>
      <GetFeatureInfo>
        <Format>text/html</Format>
        <Format>application/json</Format>
        <Format>text/xml</Format>
        <Format>text/plain</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="{0}/wms?"/></Get></HTTP></DCPType>
      </GetFeatureInfo>
      <GetLegendGraphic>
        <Format>text/html</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="{0}/wms?"/></Get></HTTP></DCPType>
      </GetLegendGraphic>
    </Request>
    <Exception><Format>XML</Format></Exception>
"#,
            self.service_url
        ));

        // Root layer with shared CRS list
        xml.push_str(
            r#"    <Layer>
      <Title>Uganda Census</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>CRS:84</CRS>
      <CRS>EPSG:3857</CRS>
"#,
        );

        for layer in &self.layers {
            xml.push_str(&self.layer_xml(layer));
        }

        xml.push_str("    </Layer>\n  </Capability>\n</WMS_Capabilities>\n");
        xml
    }

    fn layer_xml(&self, layer: &WmsLayerInfo) -> String {
        let bbox = &layer.bounding_box;
        let mut xml = format!(
            r#"      <Layer queryable="{}">
        <Name>{}</Name>
        <Title>{}</Title>
"#,
            if layer.queryable { 1 } else { 0 },
            xml_escape(&layer.name),
            xml_escape(&layer.title)
        );

        if let Some(ref abstract_text) = layer.abstract_text {
            xml.push_str(&format!(
                "        <Abstract>{}</Abstract>\n",
                xml_escape(abstract_text)
            ));
        }

        xml.push_str(&format!(
            r#"        <EX_GeographicBoundingBox>
          <westBoundLongitude>{}</westBoundLongitude>
          <eastBoundLongitude>{}</eastBoundLongitude>
          <southBoundLatitude>{}</southBoundLatitude>
          <northBoundLatitude>{}</northBoundLatitude>
        </EX_GeographicBoundingBox>
        <BoundingBox CRS="EPSG:4326" minx="{}" miny="{}" maxx="{}" maxy="{}"/>
"#,
            bbox.min_x, bbox.max_x, bbox.min_y, bbox.max_y,
            bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
        ));

        if let Some(ref attribution) = layer.attribution {
            xml.push_str(&format!(
                "        <Attribution><Title>{}</Title></Attribution>\n",
                xml_escape(attribution)
            ));
        }

        // Default style first, WMS convention
        let mut styles: Vec<&WmsStyleInfo> = layer.styles.iter().collect();
        styles.sort_by_key(|s| !s.is_default);
        for style in styles {
            xml.push_str(&format!(
                r#"        <Style>
          <Name>{0}</Name>
          <Title>{1}</Title>
          <LegendURL>
            <Format>text/html</Format>
            <OnlineResource xlink:href="{2}/wms?SERVICE=WMS&amp;REQUEST=GetLegendGraphic&amp;LAYER={3}&amp;STYLE={0}&amp;FORMAT=text/html"/>
          </LegendURL>
        </Style>
"#,
                xml_escape(&style.name),
                xml_escape(&style.title),
                self.service_url,
                xml_escape(&layer.name)
            ));
        }

        xml.push_str("      </Layer>\n");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> WmsCapabilitiesBuilder {
        WmsCapabilitiesBuilder {
            service_title: "Uganda Census WMS".to_string(),
            service_abstract: "Population density and growth".to_string(),
            service_url: "http://localhost:8080".to_string(),
            layers: vec![WmsLayerInfo {
                name: "population".to_string(),
                title: "Population Density".to_string(),
                abstract_text: None,
                queryable: true,
                bounding_box: BoundingBox::new(29.5, -1.5, 35.0, 4.3),
                styles: vec![
                    WmsStyleInfo {
                        name: "growth".to_string(),
                        title: "Growth Rate Markers".to_string(),
                        is_default: false,
                    },
                    WmsStyleInfo {
                        name: "density".to_string(),
                        title: "Density Choropleth".to_string(),
                        is_default: true,
                    },
                ],
                attribution: Some("Uganda Bureau of Statistics".to_string()),
            }],
        }
    }

    #[test]
    fn capabilities_lists_layers_and_operations() {
        let xml = builder().build("1.3.0");

        assert!(xml.contains(r#"version="1.3.0""#));
        assert!(xml.contains("<Name>population</Name>"));
        assert!(xml.contains(r#"queryable="1""#));
        assert!(xml.contains("<GetLegendGraphic>"));
        assert!(xml.contains("<westBoundLongitude>29.5</westBoundLongitude>"));
        assert!(xml.contains("Uganda Bureau of Statistics"));
    }

    #[test]
    fn default_style_is_listed_first() {
        let xml = builder().build("1.3.0");

        let density = xml.find("<Name>density</Name>").unwrap();
        let growth = xml.find("<Name>growth</Name>").unwrap();
        assert!(density < growth);
    }
}
