use geo::MultiPolygon;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The two boundary-file formats we accept. Selected once, at dispatch,
/// from the declared file name; nothing downstream re-inspects extensions.
/// `.kmz` inputs report as `kml` since the payload is the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Kml,
    Shapefile,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Kml => write!(f, "kml"),
            FileFormat::Shapefile => write!(f, "shapefile"),
        }
    }
}

/// One decoded feature: a polygonal geometry plus whatever attribute row
/// came with it (DBF record for shapefiles; KML carries none).
/// Single polygons are wrapped into a MultiPolygon so both decoders hand
/// the measurer the same shape.
#[derive(Debug, Clone)]
pub struct ParcelFeature {
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CentroidPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Derived metrics for one feature. `area` is the raw spherical area in m²;
/// the hectare/km² fields and all coordinates are rounded exactly once,
/// when the measurement is built, never re-derived from rounded values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub area: f64,
    pub area_hectares: f64,
    pub area_km2: f64,
    pub centroid: CentroidPoint,
    pub bbox: Bbox,
}

/// A measurement paired with the source feature's attributes, as it appears
/// in the report's `polygons` list.
#[derive(Debug, Clone, Serialize)]
pub struct MeasuredPolygon {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub properties: Map<String, Value>,
}

/// Aggregate result for one submitted file. `polygons` keeps decode order.
/// Totals are derived from the raw summed area, not from the rounded
/// per-polygon values, so rounding error never compounds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReport {
    pub format: FileFormat,
    pub total_area: f64,
    pub total_area_hectares: f64,
    pub total_area_km2: f64,
    pub polygon_count: usize,
    pub polygons: Vec<MeasuredPolygon>,
    /// Canonical geometry collection, kept for downstream reuse
    /// (persistence, rendering) outside this crate.
    pub geo_json: geojson::FeatureCollection,
}
