//! Ingests land-parcel boundary files (Shapefile or KML/KMZ) and produces
//! normalized geometric metrics: per-polygon area, centroid, and bounding
//! box, plus an aggregate report across all polygons in the file.
//!
//! The pipeline is strictly sequential per call: dispatch on the declared
//! extension, decode into a canonical feature sequence, measure each
//! feature, aggregate, render. No state crosses calls.

pub mod aggregate;
pub mod config;
pub mod decode;
pub mod error;
pub mod measure;
pub mod report;
pub mod types;

pub use error::{ParcelError, Result};
pub use types::{
    Bbox, CentroidPoint, FileFormat, MeasuredPolygon, Measurement, ParcelFeature, PropertyReport,
};

use std::path::Path;

/// Core entry point: measure one submitted boundary file.
///
/// `declared_name` is the name the file was submitted under, which is
/// authoritative for format selection; `file_path` is where the bytes
/// actually live (an upload handler typically stores them under a
/// generated name).
pub fn process_property_file(file_path: &Path, declared_name: &str) -> Result<PropertyReport> {
    let (format, features) = decode::decode(file_path, declared_name)?;
    aggregate::aggregate(features, format)
}
