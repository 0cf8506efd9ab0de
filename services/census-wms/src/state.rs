//! Application state and shared resources.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use census_data::CensusDataset;
use wms_protocol::InfoOverlay;

use crate::layer_config::{LayerConfig, LayerRegistry};
use crate::metrics::MetricsCollector;

/// Shared application state.
pub struct AppState {
    pub registry: LayerRegistry,
    /// Datasets keyed by GeoJSON source path, as referenced from layer configs.
    /// Layers commonly share a source; they share the loaded dataset too.
    datasets: HashMap<String, Arc<CensusDataset>>,
    /// The process-wide info popup shown on the viewer map.
    pub overlay: RwLock<InfoOverlay>,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(config_dir: P, data_dir: Q) -> Result<Self> {
        let registry = LayerRegistry::load_from_directory(config_dir.as_ref());
        if registry.total_layers() == 0 {
            bail!(
                "no layers configured under {}/layers",
                config_dir.as_ref().display()
            );
        }

        let mut datasets = HashMap::new();
        for source in registry.sources() {
            let path = data_dir.as_ref().join(&source);
            let dataset = CensusDataset::from_geojson_file(&path)
                .with_context(|| format!("loading census data from {}", path.display()))?;
            info!(
                source = %source,
                districts = dataset.len(),
                "Loaded census dataset"
            );
            datasets.insert(source, Arc::new(dataset));
        }

        Ok(Self {
            registry,
            datasets,
            overlay: RwLock::new(InfoOverlay::new()),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Dataset backing a configured layer.
    pub fn dataset_for(&self, layer: &LayerConfig) -> Option<&Arc<CensusDataset>> {
        self.datasets.get(&layer.source)
    }

    /// Loaded datasets with their source names.
    pub fn datasets(&self) -> impl Iterator<Item = (&str, &Arc<CensusDataset>)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether any district data is actually loaded. Readiness gates on this.
    pub fn has_data(&self) -> bool {
        self.datasets.values().any(|d| !d.is_empty())
    }

    /// Total districts across all loaded datasets.
    pub fn total_districts(&self) -> usize {
        self.datasets.values().map(|d| d.len()).sum()
    }
}
