//! District rendering onto a raster canvas.
//!
//! Draws census features in two modes: density-banded polygon fills and
//! growth-banded centroid markers sized by density. District outlines are
//! drawn as a separate stroke-only pass. Paths are rasterized with
//! tiny-skia; marker radii are in screen pixels, independent of scale.

use census_data::style::{style_for, BOUNDARY_STROKE, BOUNDARY_STROKE_WIDTH};
use census_data::{CensusFeature, RenderMode};
use geo::{LineString, MultiPolygon};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};
use tracing::debug;
use wms_common::crs::wgs84_to_mercator;
use wms_common::{BoundingBox, CrsCode, Rgba};

/// Maps geographic coordinates into pixel space for one rendered image.
///
/// The bounding box is taken in the units of `crs` (degrees for EPSG:4326,
/// meters for EPSG:3857) with axes already in x/y order. Feature
/// coordinates are always WGS84 lon/lat and are reprojected on the fly.
#[derive(Debug, Clone, Copy)]
pub struct MapTransform {
    min_x: f64,
    min_y: f64,
    x_scale: f64,
    y_scale: f64,
    pixel_height: f64,
    crs: CrsCode,
}

impl MapTransform {
    pub fn new(bbox: &BoundingBox, crs: CrsCode, width: u32, height: u32) -> Self {
        Self {
            min_x: bbox.min_x,
            min_y: bbox.min_y,
            x_scale: width as f64 / bbox.width(),
            y_scale: height as f64 / bbox.height(),
            pixel_height: height as f64,
            crs,
        }
    }

    /// Project a WGS84 lon/lat position to pixel coordinates. Pixel y
    /// grows downward, so north ends up at the top of the image.
    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (x, y) = match self.crs {
            CrsCode::Epsg4326 => (lon, lat),
            CrsCode::Epsg3857 => wgs84_to_mercator(lon, lat),
        };
        let px = (x - self.min_x) * self.x_scale;
        let py = self.pixel_height - (y - self.min_y) * self.y_scale;
        (px as f32, py as f32)
    }
}

/// A single map image under construction. Layers composite in draw order.
pub struct Canvas {
    pixmap: Pixmap,
    transform: MapTransform,
}

impl Canvas {
    /// Create a canvas for the given pixel size and geographic extent.
    /// `background` of `None` leaves the canvas fully transparent.
    pub fn new(
        width: u32,
        height: u32,
        bbox: &BoundingBox,
        crs: CrsCode,
        background: Option<Rgba>,
    ) -> Result<Self, String> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| format!("invalid canvas dimensions {width}x{height}"))?;

        if let Some(bg) = background {
            pixmap.fill(to_skia_color(bg));
        }

        Ok(Self {
            pixmap,
            transform: MapTransform::new(bbox, crs, width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn transform(&self) -> &MapTransform {
        &self.transform
    }

    /// Draw census features as a data layer.
    ///
    /// Polygon-fill mode paints district shapes with no outline; marker
    /// mode paints a filled circle at each district centroid. Features
    /// without a polygon geometry are skipped in fill mode but still get
    /// a marker.
    pub fn draw_features<'a, I>(&mut self, features: I, mode: RenderMode)
    where
        I: IntoIterator<Item = &'a CensusFeature>,
    {
        let mut paint = Paint::default();
        paint.anti_alias = true;

        let mut drawn = 0usize;
        for feature in features {
            let spec = style_for(&feature.record, mode);
            paint.set_color_rgba8(spec.fill.r, spec.fill.g, spec.fill.b, spec.fill.a);

            match spec.radius {
                None => {
                    if let Some(path) = multipolygon_path(&feature.geometry, &self.transform) {
                        self.pixmap.fill_path(
                            &path,
                            &paint,
                            FillRule::EvenOdd,
                            Transform::identity(),
                            None,
                        );
                        drawn += 1;
                    }
                }
                Some(radius) => {
                    let (cx, cy) = self
                        .transform
                        .project(feature.centroid.x(), feature.centroid.y());
                    let mut pb = PathBuilder::new();
                    pb.push_circle(cx, cy, radius as f32);
                    if let Some(path) = pb.finish() {
                        self.pixmap.fill_path(
                            &path,
                            &paint,
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                        drawn += 1;
                    }
                }
            }
        }

        debug!(mode = ?mode, features_drawn = drawn, "rendered census layer");
    }

    /// Draw district outlines with the fixed boundary stroke, no fill.
    pub fn draw_boundaries<'a, I>(&mut self, features: I)
    where
        I: IntoIterator<Item = &'a CensusFeature>,
    {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(
            BOUNDARY_STROKE.r,
            BOUNDARY_STROKE.g,
            BOUNDARY_STROKE.b,
            BOUNDARY_STROKE.a,
        );

        let stroke = Stroke {
            width: BOUNDARY_STROKE_WIDTH as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        for feature in features {
            if let Some(path) = multipolygon_path(&feature.geometry, &self.transform) {
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Finish drawing and return straight-alpha RGBA bytes, row-major.
    pub fn into_rgba(self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        rgba
    }
}

fn to_skia_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Build one path from all rings of a multipolygon. Interior rings punch
/// holes under the even-odd fill rule. Returns `None` for empty geometry.
fn multipolygon_path(geometry: &MultiPolygon<f64>, transform: &MapTransform) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for polygon in geometry {
        append_ring(&mut pb, polygon.exterior(), transform);
        for interior in polygon.interiors() {
            append_ring(&mut pb, interior, transform);
        }
    }
    pb.finish()
}

fn append_ring(pb: &mut PathBuilder, ring: &LineString<f64>, transform: &MapTransform) {
    let mut coords = ring.coords();
    let first = match coords.next() {
        Some(c) => c,
        None => return,
    };

    let (x, y) = transform.project(first.x, first.y);
    pb.move_to(x, y);
    for coord in coords {
        let (x, y) = transform.project(coord.x, coord.y);
        pb.line_to(x, y);
    }
    pb.close();
}
