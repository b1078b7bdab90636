use crate::types::{Bbox, CentroidPoint, FileFormat, PropertyReport};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Presentation of a finished report: a chat-friendly text summary plus a
/// structured object for JSON consumers. Pure projection -- nothing here
/// computes, it only reshapes what the aggregator produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    pub summary: String,
    pub structured: StructuredReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReport {
    pub format: FileFormat,
    pub file_name: String,
    pub total_area: AreaBreakdown,
    pub polygon_count: usize,
    pub polygons: Vec<StructuredPolygon>,
    pub geo_json: geojson::FeatureCollection,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaBreakdown {
    pub square_meters: f64,
    pub hectares: f64,
    pub square_kilometers: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuredPolygon {
    pub area: AreaBreakdown,
    pub centroid: CentroidPoint,
    pub bbox: Bbox,
    pub properties: Map<String, Value>,
}

pub fn render(report: &PropertyReport, file_name: &str) -> RenderedReport {
    RenderedReport {
        summary: summary(report, file_name),
        structured: structured(report, file_name),
    }
}

fn summary(report: &PropertyReport, file_name: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Property boundary report");
    let _ = writeln!(out, "  File: {}", file_name);
    let _ = writeln!(out, "  Format: {}", report.format.to_string().to_uppercase());
    let _ = writeln!(out, "  Polygons: {}", report.polygon_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Total area:");
    let _ = writeln!(out, "    {} hectares", report.total_area_hectares);
    let _ = writeln!(out, "    {} km2", report.total_area_km2);

    if let Some(first) = report.polygons.first() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Property center:");
        let _ = writeln!(out, "    Latitude: {}", first.measurement.centroid.latitude);
        let _ = writeln!(out, "    Longitude: {}", first.measurement.centroid.longitude);
    }

    // Per-polygon detail only adds signal when there is more than one.
    if report.polygon_count > 1 {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Per-polygon breakdown:");
        for (index, polygon) in report.polygons.iter().enumerate() {
            let _ = writeln!(
                out,
                "    Polygon {}: {} ha, center {}, {}",
                index + 1,
                polygon.measurement.area_hectares,
                polygon.measurement.centroid.latitude,
                polygon.measurement.centroid.longitude,
            );
        }
    }

    out
}

fn structured(report: &PropertyReport, file_name: &str) -> StructuredReport {
    StructuredReport {
        format: report.format,
        file_name: file_name.to_string(),
        total_area: AreaBreakdown {
            square_meters: report.total_area,
            hectares: report.total_area_hectares,
            square_kilometers: report.total_area_km2,
        },
        polygon_count: report.polygon_count,
        polygons: report
            .polygons
            .iter()
            .map(|polygon| StructuredPolygon {
                area: AreaBreakdown {
                    square_meters: polygon.measurement.area,
                    hectares: polygon.measurement.area_hectares,
                    square_kilometers: polygon.measurement.area_km2,
                },
                centroid: polygon.measurement.centroid,
                bbox: polygon.measurement.bbox,
                properties: polygon.properties.clone(),
            })
            .collect(),
        geo_json: report.geo_json.clone(),
    }
}
