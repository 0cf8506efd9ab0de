//! Layer configuration loader.
//!
//! Loads the layer catalog from YAML files in config/layers/. The catalog is
//! the single source of truth for which layers the WMS endpoint advertises,
//! which GeoJSON file backs each one, and which styles each layer accepts.

use census_data::RenderMode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// How a layer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// District features styled from their census attributes.
    Census,
    /// District outlines only, no data styling.
    Boundary,
}

impl LayerKind {
    /// Parse a layer kind from config
    pub fn from_str(s: &str) -> Self {
        match s {
            "boundary" => Self::Boundary,
            _ => Self::Census,
        }
    }
}

/// Parse a style mode name from config
fn mode_from_str(s: &str) -> RenderMode {
    match s {
        "marker" => RenderMode::PointMarker,
        _ => RenderMode::PolygonFill,
    }
}

/// Style configuration for a layer
#[derive(Debug, Clone)]
pub struct StyleConfig {
    /// Style name as advertised in capabilities (e.g., "population")
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Render mode this style selects
    pub mode: RenderMode,
    /// Whether this is the layer's default style
    pub default: bool,
}

/// Layer configuration loaded from YAML
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// Layer name (e.g., "districts")
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Description/abstract
    pub abstract_text: Option<String>,
    /// GeoJSON file backing this layer (relative to the data dir)
    pub source: String,
    /// How the layer is drawn
    pub kind: LayerKind,
    /// Whether GetFeatureInfo is allowed against this layer
    pub queryable: bool,
    /// Styles this layer accepts
    pub styles: Vec<StyleConfig>,
}

impl LayerConfig {
    /// Get the default style for this layer
    pub fn default_style(&self) -> Option<&StyleConfig> {
        self.styles
            .iter()
            .find(|s| s.default)
            .or_else(|| self.styles.first())
    }

    /// Resolve a requested style name. An empty name selects the default
    /// style; otherwise the match is case-insensitive.
    pub fn find_style(&self, name: &str) -> Option<&StyleConfig> {
        if name.is_empty() {
            return self.default_style();
        }
        self.styles
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Get all style names
    pub fn style_names(&self) -> Vec<String> {
        self.styles.iter().map(|s| s.name.clone()).collect()
    }
}

/// Collection configuration - all layers served from one census collection
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Collection ID (e.g., "uganda2024")
    pub collection: String,
    /// Display name (e.g., "Uganda 2024 Population Census")
    pub display_name: String,
    /// Attribution shown in capabilities
    pub attribution: Option<String>,
    /// Layers in this collection
    pub layers: Vec<LayerConfig>,
}

impl CollectionConfig {
    /// Find a layer by name (case-insensitive)
    pub fn get_layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// YAML Parsing Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct YamlLayerFile {
    collection: String,
    display_name: String,
    #[serde(default)]
    attribution: Option<String>,
    layers: Vec<YamlLayer>,
}

#[derive(Debug, Deserialize)]
struct YamlLayer {
    name: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    source: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    queryable: Option<bool>,
    #[serde(default)]
    styles: Vec<YamlStyle>,
}

#[derive(Debug, Deserialize)]
struct YamlStyle {
    name: String,
    title: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    default: bool,
}

// ============================================================================
// Registry
// ============================================================================

/// Registry of layer configurations for all collections.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    /// Configs keyed by collection ID
    collections: HashMap<String, CollectionConfig>,
}

impl LayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            collections: HashMap::new(),
        }
    }

    /// Load layer configurations from a directory (e.g., config/)
    pub fn load_from_directory<P: AsRef<Path>>(config_dir: P) -> Self {
        let mut registry = Self::new();
        registry.reload_from_directory(config_dir);
        registry
    }

    /// Reload layer configurations from a directory (hot reload support)
    /// Returns the number of collections loaded and total layers
    pub fn reload_from_directory<P: AsRef<Path>>(&mut self, config_dir: P) -> (usize, usize) {
        let layers_dir = config_dir.as_ref().join("layers");

        // Clear existing configs before reload
        self.collections.clear();

        if !layers_dir.exists() {
            warn!(path = ?layers_dir, "Layers config directory not found");
            return (0, 0);
        }

        let entries = match fs::read_dir(&layers_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, path = ?layers_dir, "Failed to read layers directory");
                return (0, 0);
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("yaml") {
                if let Some(config) = Self::load_layer_file(&path) {
                    info!(
                        collection = %config.collection,
                        layers = config.layers.len(),
                        "Loaded layer config"
                    );
                    self.collections.insert(config.collection.clone(), config);
                }
            }
        }

        let collections = self.collections.len();
        let layers = self.total_layers();

        info!(
            collections = collections,
            total_layers = layers,
            "Layer registry loaded"
        );

        (collections, layers)
    }

    /// Load a single layer config file
    fn load_layer_file<P: AsRef<Path>>(path: P) -> Option<CollectionConfig> {
        let contents = match fs::read_to_string(path.as_ref()) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, path = ?path.as_ref(), "Failed to read layer file");
                return None;
            }
        };

        let yaml: YamlLayerFile = match serde_yaml::from_str(&contents) {
            Ok(y) => y,
            Err(e) => {
                warn!(error = %e, path = ?path.as_ref(), "Failed to parse layer file");
                return None;
            }
        };

        let layers = yaml
            .layers
            .into_iter()
            .map(|l| LayerConfig {
                name: l.name,
                title: l.title,
                abstract_text: l.abstract_text,
                source: l.source,
                kind: l
                    .kind
                    .map(|k| LayerKind::from_str(&k))
                    .unwrap_or(LayerKind::Census),
                queryable: l.queryable.unwrap_or(true),
                styles: l
                    .styles
                    .into_iter()
                    .map(|s| StyleConfig {
                        name: s.name,
                        title: s.title,
                        mode: s.mode.map(|m| mode_from_str(&m)).unwrap_or(RenderMode::PolygonFill),
                        default: s.default,
                    })
                    .collect(),
            })
            .collect();

        Some(CollectionConfig {
            collection: yaml.collection,
            display_name: yaml.display_name,
            attribution: yaml.attribution,
            layers,
        })
    }

    /// Get total number of layers across all collections
    pub fn total_layers(&self) -> usize {
        self.collections.values().map(|c| c.layers.len()).sum()
    }

    /// Get config for a specific collection
    pub fn get_collection(&self, collection: &str) -> Option<&CollectionConfig> {
        self.collections.get(collection)
    }

    /// Get all collection IDs
    pub fn collections(&self) -> Vec<&str> {
        self.collections.keys().map(|s| s.as_str()).collect()
    }

    /// Find a layer across all collections by name (case-insensitive)
    pub fn find_layer(&self, name: &str) -> Option<&LayerConfig> {
        self.collections
            .values()
            .find_map(|c| c.get_layer(name))
    }

    /// Check if a layer exists
    pub fn has_layer(&self, name: &str) -> bool {
        self.find_layer(name).is_some()
    }

    /// All layers paired with their collection, sorted by layer name so
    /// generated capabilities documents are stable.
    pub fn layer_entries(&self) -> Vec<(&CollectionConfig, &LayerConfig)> {
        let mut entries: Vec<(&CollectionConfig, &LayerConfig)> = self
            .collections
            .values()
            .flat_map(|c| c.layers.iter().map(move |l| (c, l)))
            .collect();
        entries.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        entries
    }

    /// GeoJSON sources referenced by any layer, deduplicated.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .collections
            .values()
            .flat_map(|c| c.layers.iter().map(|l| l.source.clone()))
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(name: &str, mode: RenderMode, default: bool) -> StyleConfig {
        StyleConfig {
            name: name.to_string(),
            title: name.to_string(),
            mode,
            default,
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(mode_from_str("fill"), RenderMode::PolygonFill);
        assert_eq!(mode_from_str("marker"), RenderMode::PointMarker);
        assert_eq!(mode_from_str("unknown"), RenderMode::PolygonFill);
    }

    #[test]
    fn test_layer_kind_parsing() {
        assert_eq!(LayerKind::from_str("boundary"), LayerKind::Boundary);
        assert_eq!(LayerKind::from_str("census"), LayerKind::Census);
        assert_eq!(LayerKind::from_str("anything else"), LayerKind::Census);
    }

    #[test]
    fn test_layer_default_style() {
        let layer = LayerConfig {
            name: "districts".to_string(),
            title: "Districts".to_string(),
            abstract_text: None,
            source: "districts.geojson".to_string(),
            kind: LayerKind::Census,
            queryable: true,
            styles: vec![
                style("growth", RenderMode::PointMarker, false),
                style("population", RenderMode::PolygonFill, true),
            ],
        };

        assert_eq!(layer.default_style().map(|s| s.name.as_str()), Some("population"));
        // Empty style name resolves to the default
        assert_eq!(layer.find_style("").map(|s| s.name.as_str()), Some("population"));
        // Lookup is case-insensitive
        assert_eq!(layer.find_style("GROWTH").map(|s| s.mode), Some(RenderMode::PointMarker));
        assert!(layer.find_style("heatmap").is_none());
    }

    #[test]
    fn test_first_style_is_default_when_none_marked() {
        let layer = LayerConfig {
            name: "districts".to_string(),
            title: "Districts".to_string(),
            abstract_text: None,
            source: "districts.geojson".to_string(),
            kind: LayerKind::Census,
            queryable: true,
            styles: vec![
                style("growth", RenderMode::PointMarker, false),
                style("population", RenderMode::PolygonFill, false),
            ],
        };

        assert_eq!(layer.default_style().map(|s| s.name.as_str()), Some("growth"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = LayerRegistry::new();
        assert_eq!(registry.total_layers(), 0);
        assert!(registry.find_layer("districts").is_none());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layers_dir = dir.path().join("layers");
        fs::create_dir_all(&layers_dir).unwrap();
        fs::write(
            layers_dir.join("census.yaml"),
            r#"
collection: uganda2024
display_name: Uganda 2024 Population Census
attribution: Uganda Bureau of Statistics
layers:
  - name: districts
    title: District population density
    abstract: Choropleth of persons per square kilometre
    source: districts.geojson
    styles:
      - name: population
        title: Population density
        mode: fill
        default: true
      - name: growth
        title: Annual growth rate
        mode: marker
  - name: district-boundaries
    title: District boundaries
    source: districts.geojson
    kind: boundary
    queryable: false
"#,
        )
        .unwrap();

        let registry = LayerRegistry::load_from_directory(dir.path());
        assert_eq!(registry.collections().len(), 1);
        assert_eq!(registry.total_layers(), 2);

        let layer = registry.find_layer("DISTRICTS").unwrap();
        assert_eq!(layer.name, "districts");
        assert!(layer.queryable);
        assert_eq!(layer.styles.len(), 2);
        assert_eq!(layer.find_style("growth").map(|s| s.mode), Some(RenderMode::PointMarker));

        let boundaries = registry.find_layer("district-boundaries").unwrap();
        assert_eq!(boundaries.kind, LayerKind::Boundary);
        assert!(!boundaries.queryable);
        assert!(boundaries.styles.is_empty());

        // Both layers share one GeoJSON source
        assert_eq!(registry.sources(), vec!["districts.geojson".to_string()]);
    }

    #[test]
    fn test_bad_yaml_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let layers_dir = dir.path().join("layers");
        fs::create_dir_all(&layers_dir).unwrap();
        fs::write(layers_dir.join("broken.yaml"), "collection: [unclosed").unwrap();

        let registry = LayerRegistry::load_from_directory(dir.path());
        assert_eq!(registry.total_layers(), 0);
    }
}
