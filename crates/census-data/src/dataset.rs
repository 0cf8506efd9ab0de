//! District dataset: GeoJSON loading, centroids, and spatial queries.
//!
//! Features are kept in file order and addressed by index; the R-tree only
//! stores index + envelope so query results can be returned in a stable
//! order regardless of tree layout.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::centroid::Centroid;
use geo::algorithm::contains::Contains;
use geo::{Geometry, MultiPolygon, Point};
use geojson::GeoJson;
use rstar::{RTree, RTreeObject, AABB};
use tracing::warn;

use wms_common::{BoundingBox, WmsError, WmsResult};

use crate::record::CensusRecord;

/// One administrative area: resolved attributes plus geometry.
#[derive(Debug, Clone)]
pub struct CensusFeature {
    pub record: CensusRecord,
    /// District outline. Empty for features that arrived as bare points.
    pub geometry: MultiPolygon<f64>,
    /// Marker anchor in lon/lat degrees.
    pub centroid: Point<f64>,
    pub bbox: BoundingBox,
}

/// R-tree entry: envelope plus position in the feature vector.
struct FeatureEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// An immutable, spatially indexed collection of census features.
pub struct CensusDataset {
    features: Vec<CensusFeature>,
    index: RTree<FeatureEnvelope>,
    bounds: Option<BoundingBox>,
}

impl CensusDataset {
    pub fn from_geojson_file(path: &Path) -> WmsResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let geojson = GeoJson::from_reader(reader).map_err(|e| {
            WmsError::DataReadError(format!("invalid GeoJSON in {}: {e}", path.display()))
        })?;
        Self::from_geojson(geojson)
    }

    pub fn from_geojson_str(s: &str) -> WmsResult<Self> {
        let geojson: GeoJson = s
            .parse()
            .map_err(|e| WmsError::DataReadError(format!("invalid GeoJSON: {e}")))?;
        Self::from_geojson(geojson)
    }

    pub fn from_geojson(geojson: GeoJson) -> WmsResult<Self> {
        match geojson {
            GeoJson::FeatureCollection(fc) => Ok(Self::from_feature_collection(fc)),
            _ => Err(WmsError::DataReadError(
                "expected a GeoJSON FeatureCollection".to_string(),
            )),
        }
    }

    /// Build a dataset from a parsed collection. Features that cannot be
    /// converted are logged and skipped rather than failing the whole load;
    /// census exports routinely carry a few malformed rows.
    pub fn from_feature_collection(collection: geojson::FeatureCollection) -> Self {
        let mut features = Vec::with_capacity(collection.features.len());

        for (position, feature) in collection.features.into_iter().enumerate() {
            let record = feature
                .properties
                .as_ref()
                .map(CensusRecord::from_properties)
                .unwrap_or_default();

            let Some(geometry) = feature.geometry else {
                warn!(feature = position, "skipping feature without geometry");
                continue;
            };

            let geo_geom: Geometry<f64> = match geometry.value.try_into() {
                Ok(g) => g,
                Err(e) => {
                    warn!(feature = position, error = %e, "skipping unconvertible geometry");
                    continue;
                }
            };

            let (outline, centroid) = match geo_geom {
                Geometry::Polygon(p) => {
                    let mp = MultiPolygon::new(vec![p]);
                    match mp.centroid() {
                        Some(c) => (mp, c),
                        None => {
                            warn!(feature = position, "skipping polygon without centroid");
                            continue;
                        }
                    }
                }
                Geometry::MultiPolygon(mp) => match mp.centroid() {
                    Some(c) => (mp, c),
                    None => {
                        warn!(feature = position, "skipping polygon without centroid");
                        continue;
                    }
                },
                // Bare points keep their location but have no outline, so
                // point-in-polygon lookups never return them.
                Geometry::Point(p) => (MultiPolygon::new(Vec::new()), p),
                _ => {
                    warn!(feature = position, "skipping unsupported geometry type");
                    continue;
                }
            };

            let bbox = match outline.bounding_rect() {
                Some(rect) => {
                    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
                }
                None => BoundingBox::new(centroid.x(), centroid.y(), centroid.x(), centroid.y()),
            };

            features.push(CensusFeature {
                record,
                geometry: outline,
                centroid,
                bbox,
            });
        }

        let envelopes = features
            .iter()
            .enumerate()
            .map(|(index, f)| FeatureEnvelope {
                index,
                aabb: AABB::from_corners(
                    [f.bbox.min_x, f.bbox.min_y],
                    [f.bbox.max_x, f.bbox.max_y],
                ),
            })
            .collect();
        let index = RTree::bulk_load(envelopes);

        let bounds = if features.is_empty() {
            None
        } else {
            let mut acc = BoundingBox::empty();
            for f in &features {
                acc.extend_box(&f.bbox);
            }
            Some(acc)
        };

        Self {
            features,
            index,
            bounds,
        }
    }

    /// The feature whose outline contains the point. Overlapping districts
    /// resolve to the lowest feature index so repeated queries agree.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&CensusFeature> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.index
            .locate_in_envelope_intersecting(&envelope)
            .filter(|candidate| self.features[candidate.index].geometry.contains(&point))
            .map(|candidate| candidate.index)
            .min()
            .map(|index| &self.features[index])
    }

    /// Features whose bounding boxes intersect `bbox`, in dataset order.
    pub fn in_bbox(&self, bbox: &BoundingBox) -> Vec<&CensusFeature> {
        let envelope = AABB::from_corners(
            [bbox.min_x, bbox.min_y],
            [bbox.max_x, bbox.max_y],
        );

        let mut hits: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.index)
            .collect();
        hits.sort_unstable();
        hits.iter().map(|&index| &self.features[index]).collect()
    }

    pub fn features(&self) -> &[CensusFeature] {
        &self.features
    }

    pub fn get(&self, index: usize) -> Option<&CensusFeature> {
        self.features.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CensusFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Union of all feature boxes, `None` for an empty dataset.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}
