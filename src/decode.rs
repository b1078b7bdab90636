use crate::error::{ParcelError, Result};
use crate::types::{FileFormat, ParcelFeature};
use geo::{Geometry, MultiPolygon};
use kml::{quick_collection, Kml, KmlReader};
use serde_json::{Map, Number, Value};
use shapefile::dbase::FieldValue;
use std::path::Path;
use tracing::{debug, warn};

/// What the declared file name tells us to do with the stored file.
/// KMZ is the same document as KML inside a zip wrapper, so both funnel
/// into the KML decoder and report as `kml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceKind {
    Kml,
    Kmz,
    Shapefile,
}

impl SourceKind {
    /// Format selection is by declared extension only, case-insensitively.
    /// We never sniff file contents; a lying extension surfaces as a
    /// decode failure instead.
    pub(crate) fn detect(declared_name: &str) -> Result<Self> {
        let extension = Path::new(declared_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "kml" => Ok(SourceKind::Kml),
            "kmz" => Ok(SourceKind::Kmz),
            "shp" => Ok(SourceKind::Shapefile),
            "" => Err(ParcelError::UnsupportedFormat(format!(
                "{} (no extension)",
                declared_name
            ))),
            _ => Err(ParcelError::UnsupportedFormat(format!(".{}", extension))),
        }
    }

    pub(crate) fn format(self) -> FileFormat {
        match self {
            SourceKind::Kml | SourceKind::Kmz => FileFormat::Kml,
            SourceKind::Shapefile => FileFormat::Shapefile,
        }
    }
}

/// Dispatches to the right decoder and returns the features in decode order
/// together with the format the report should carry.
pub fn decode(path: &Path, declared_name: &str) -> Result<(FileFormat, Vec<ParcelFeature>)> {
    let kind = SourceKind::detect(declared_name)?;
    let features = match kind {
        SourceKind::Kml => decode_kml(path, false)?,
        SourceKind::Kmz => decode_kml(path, true)?,
        SourceKind::Shapefile => decode_shapefile(path)?,
    };
    Ok((kind.format(), features))
}

/// Decodes a KML or KMZ document into polygonal features, in document order.
/// Placemarks that are points, lines, or anything else without area are
/// silently dropped.
pub fn decode_kml(path: &Path, compressed: bool) -> Result<Vec<ParcelFeature>> {
    let document: Kml<f64> = if compressed {
        KmlReader::<_, f64>::from_kmz_path(path)
            .and_then(|mut reader| reader.read())
            .map_err(|e| ParcelError::decode(FileFormat::Kml, e))?
    } else {
        KmlReader::<_, f64>::from_path(path)
            .and_then(|mut reader| reader.read())
            .map_err(|e| ParcelError::decode(FileFormat::Kml, e))?
    };

    features_from_kml(document)
}

fn features_from_kml(document: Kml<f64>) -> Result<Vec<ParcelFeature>> {
    let collection =
        quick_collection(document).map_err(|e| ParcelError::decode(FileFormat::Kml, e))?;

    if collection.0.is_empty() {
        return Err(ParcelError::NoGeometryFound(FileFormat::Kml));
    }

    let features: Vec<ParcelFeature> = collection
        .into_iter()
        .filter_map(|geometry| match geometry {
            Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
            Geometry::MultiPolygon(multi) => Some(multi),
            _ => None,
        })
        .filter(|multi| !multi.0.is_empty())
        // KML placemarks carry no attribute row.
        .map(|geometry| ParcelFeature {
            geometry,
            properties: Map::new(),
        })
        .collect();

    if features.is_empty() {
        return Err(ParcelError::NoPolygonFound(FileFormat::Kml));
    }

    debug!("decoded {} polygonal features from kml", features.len());
    Ok(features)
}

/// Decodes a shapefile, reading `.shp` records sequentially until
/// exhaustion. The sibling `.dbf` supplies the attribute rows; if it is
/// missing or unreadable the features simply get empty attribute maps,
/// since attributes are optional and geometry is not.
pub fn decode_shapefile(shp_path: &Path) -> Result<Vec<ParcelFeature>> {
    if !shp_path.exists() {
        return Err(ParcelError::MissingFile(shp_path.to_path_buf()));
    }

    let mut shape_reader = shapefile::ShapeReader::from_path(shp_path)
        .map_err(|e| ParcelError::decode(FileFormat::Shapefile, e))?;

    // The .shp stream is the source of truth for geometry. Attribute rows
    // are paired with it positionally, best-effort: a bad .dbf can cost
    // attributes but never a record.
    let mut attributes = read_attribute_rows(&shp_path.with_extension("dbf")).into_iter();

    let mut record_count = 0usize;
    let mut features = Vec::new();

    for result in shape_reader.iter_shapes() {
        let shape = result.map_err(|e| ParcelError::decode(FileFormat::Shapefile, e))?;
        let properties = attributes.next().unwrap_or_default();
        record_count += 1;
        if let Some(geometry) = polygonal(shape)? {
            features.push(ParcelFeature { geometry, properties });
        }
    }

    if record_count == 0 {
        return Err(ParcelError::NoGeometryFound(FileFormat::Shapefile));
    }
    if features.is_empty() {
        return Err(ParcelError::NoPolygonFound(FileFormat::Shapefile));
    }

    debug!(
        "decoded {} polygonal features out of {} shapefile records",
        features.len(),
        record_count
    );
    Ok(features)
}

/// Reads as many attribute rows as the `.dbf` yields, in record order.
/// Attributes are optional: a missing file, an unreadable header, or a
/// truncated record degrades the affected rows to empty maps rather than
/// aborting the decode.
fn read_attribute_rows(dbf_path: &Path) -> Vec<Map<String, Value>> {
    let mut reader = match shapefile::dbase::Reader::from_path(dbf_path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(
                "could not read attributes from {:?}, continuing without them: {}",
                dbf_path, e
            );
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for result in reader.iter_records() {
        match result {
            Ok(record) => rows.push(record_to_properties(record)),
            Err(e) => {
                warn!(
                    "attribute row {} of {:?} unreadable, remaining rows degraded to empty: {}",
                    rows.len() + 1,
                    dbf_path,
                    e
                );
                break;
            }
        }
    }
    rows
}

/// Keeps only polygonal shapes; everything else has no area to measure.
fn polygonal(shape: shapefile::Shape) -> Result<Option<MultiPolygon<f64>>> {
    match shape {
        shapefile::Shape::Polygon(polygon) => to_multi_polygon(polygon),
        shapefile::Shape::PolygonM(polygon) => to_multi_polygon(polygon),
        shapefile::Shape::PolygonZ(polygon) => to_multi_polygon(polygon),
        _ => Ok(None),
    }
}

fn to_multi_polygon<S>(shape: S) -> Result<Option<MultiPolygon<f64>>>
where
    S: TryInto<MultiPolygon<f64>>,
    S::Error: std::fmt::Debug,
{
    let multi: MultiPolygon<f64> = shape.try_into().map_err(|e| ParcelError::Decode {
        format: FileFormat::Shapefile,
        message: format!("{:?}", e),
    })?;
    if multi.0.is_empty() {
        Ok(None)
    } else {
        Ok(Some(multi))
    }
}

fn record_to_properties(record: shapefile::dbase::Record) -> Map<String, Value> {
    let mut properties = Map::new();
    for (name, value) in record.into_iter() {
        let json = match value {
            FieldValue::Character(v) => v.map(Value::String).unwrap_or(Value::Null),
            FieldValue::Numeric(v) => v
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Float(v) => v
                .and_then(|f| Number::from_f64(f64::from(f)))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Integer(v) => Value::Number(v.into()),
            FieldValue::Double(v) => Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Logical(v) => v.map(Value::Bool).unwrap_or(Value::Null),
            other => Value::String(format!("{:?}", other)),
        };
        properties.insert(name, json);
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const POLYGON_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Talhao 1</name>
      <Polygon><outerBoundaryIs><LinearRing><coordinates>
        -47.0,-23.0,0 -46.99,-23.0,0 -46.99,-22.99,0 -47.0,-22.99,0 -47.0,-23.0,0
      </coordinates></LinearRing></outerBoundaryIs></Polygon>
    </Placemark>
    <Placemark>
      <name>Sede</name>
      <Point><coordinates>-46.995,-22.995,0</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#;

    const LINESTRING_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <LineString><coordinates>-47.0,-23.0,0 -46.99,-23.0,0</coordinates></LineString>
    </Placemark>
  </Document>
</kml>"#;

    const EMPTY_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document><name>nothing here</name></Document>
</kml>"#;

    fn parse(source: &str) -> Kml<f64> {
        Kml::from_str(source).expect("test kml should parse")
    }

    #[test]
    fn detect_is_case_insensitive() {
        assert_eq!(SourceKind::detect("Fazenda.KML").unwrap(), SourceKind::Kml);
        assert_eq!(SourceKind::detect("area.kmz").unwrap(), SourceKind::Kmz);
        assert_eq!(
            SourceKind::detect("limites.SHP").unwrap(),
            SourceKind::Shapefile
        );
    }

    #[test]
    fn detect_rejects_unknown_extensions() {
        match SourceKind::detect("boundary.txt") {
            Err(ParcelError::UnsupportedFormat(ext)) => assert_eq!(ext, ".txt"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
        match SourceKind::detect("no_extension") {
            Err(ParcelError::UnsupportedFormat(what)) => {
                assert_eq!(what, "no_extension (no extension)")
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn kmz_reports_as_kml() {
        assert_eq!(SourceKind::Kmz.format(), FileFormat::Kml);
    }

    #[test]
    fn kml_polygons_survive_and_points_are_dropped() {
        let features = features_from_kml(parse(POLYGON_KML)).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].properties.is_empty());
        assert_eq!(features[0].geometry.0.len(), 1);
    }

    #[test]
    fn kml_without_geometry_is_no_geometry_found() {
        assert!(matches!(
            features_from_kml(parse(EMPTY_KML)),
            Err(ParcelError::NoGeometryFound(FileFormat::Kml))
        ));
    }

    #[test]
    fn kml_with_only_linestring_is_no_polygon_found() {
        assert!(matches!(
            features_from_kml(parse(LINESTRING_KML)),
            Err(ParcelError::NoPolygonFound(FileFormat::Kml))
        ));
    }

    #[test]
    fn missing_shp_is_reported_as_missing_file() {
        let result = decode_shapefile(Path::new("/nonexistent/parcel.shp"));
        assert!(matches!(result, Err(ParcelError::MissingFile(_))));
    }
}
