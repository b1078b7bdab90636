use crate::error::{ParcelError, Result};
use crate::measure::{measure, round_dp};
use crate::types::{FileFormat, MeasuredPolygon, ParcelFeature, PropertyReport};
use rayon::prelude::*;

/// Folds a decoded feature sequence into the aggregate report.
///
/// Each feature is measured independently (a pure function, so rayon can
/// fan the work out; the indexed collect keeps decode order). The totals
/// are derived from the raw summed area -- summing the already-rounded
/// per-polygon values would compound rounding error.
pub fn aggregate(features: Vec<ParcelFeature>, format: FileFormat) -> Result<PropertyReport> {
    // The decoders already reject polygon-free files; an empty set here is
    // an internal consistency failure, reported rather than papered over.
    if features.is_empty() {
        return Err(ParcelError::EmptyFeatureSet);
    }

    let measurements: Vec<_> = features
        .par_iter()
        .map(|feature| measure(&feature.geometry))
        .collect();

    let total_area: f64 = measurements.iter().map(|m| m.area).sum();
    let polygon_count = measurements.len();
    let geo_json = feature_collection(&features);

    let polygons = measurements
        .into_iter()
        .zip(features)
        .map(|(measurement, feature)| MeasuredPolygon {
            measurement,
            properties: feature.properties,
        })
        .collect();

    Ok(PropertyReport {
        format,
        total_area,
        total_area_hectares: round_dp(total_area / 10_000.0, 4),
        total_area_km2: round_dp(total_area / 1_000_000.0, 6),
        polygon_count,
        polygons,
        geo_json,
    })
}

/// The canonical geometry collection handed back for downstream reuse,
/// in the same order as the report's polygons.
fn feature_collection(features: &[ParcelFeature]) -> geojson::FeatureCollection {
    let features = features
        .iter()
        .map(|feature| geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(
                &feature.geometry,
            ))),
            id: None,
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
