use crate::types::{Bbox, CentroidPoint, Measurement};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::centroid::Centroid;
use geo::algorithm::chamberlain_duquette_area::ChamberlainDuquetteArea;
use geo::{Coord, MultiPolygon, Rect};

/// Computes the derived metrics for one feature.
///
/// Area is the Chamberlain-Duquette spherical area, evaluated directly on
/// longitude/latitude -- the same spherical-excess family of formulas turf
/// uses, so no planar projection error. Interior rings carry the opposite
/// winding and subtract, though in practice parcel inputs are
/// single-outer-ring. The centroid is the planar area-weighted centroid in
/// coordinate space, not a geodesic center of mass; at farm-parcel scales
/// the difference is well below the 6-decimal rounding.
pub fn measure(geometry: &MultiPolygon<f64>) -> Measurement {
    let area: f64 = geometry
        .0
        .iter()
        .map(|polygon| polygon.chamberlain_duquette_unsigned_area())
        .sum();

    let rect = geometry
        .bounding_rect()
        .unwrap_or(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));

    // A zero-area (degenerate) geometry has no area-weighted centroid;
    // fall back to the bbox midpoint.
    let (cx, cy) = geometry
        .centroid()
        .map(|p| (p.x(), p.y()))
        .unwrap_or((rect.center().x, rect.center().y));

    Measurement {
        area,
        area_hectares: round_dp(area / 10_000.0, 4),
        area_km2: round_dp(area / 1_000_000.0, 6),
        centroid: CentroidPoint {
            longitude: round_dp(cx, 6),
            latitude: round_dp(cy, 6),
        },
        bbox: Bbox {
            min_lon: round_dp(rect.min().x, 6),
            min_lat: round_dp(rect.min().y, 6),
            max_lon: round_dp(rect.max().x, 6),
            max_lat: round_dp(rect.max().y, 6),
        },
    }
}

/// Round to `dp` decimal places, half away from zero (same as JS `toFixed`).
pub(crate) fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    // One kilometre in degrees of longitude at the equator, using the same
    // equatorial radius (6378137 m) the area formula uses.
    const KM_DEG: f64 = 0.008983152841195214;

    fn square(origin: (f64, f64), size_deg: f64) -> Polygon<f64> {
        let (x, y) = origin;
        Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size_deg, y),
                (x + size_deg, y + size_deg),
                (x, y + size_deg),
                (x, y),
            ]),
            vec![],
        )
    }

    #[test]
    fn equatorial_square_km_area() {
        let geometry = MultiPolygon::new(vec![square((0.0, 0.0), KM_DEG)]);
        let m = measure(&geometry);
        let relative_error = (m.area - 1_000_000.0).abs() / 1_000_000.0;
        assert!(
            relative_error < 0.005,
            "expected ~1e6 m2, got {} (error {})",
            m.area,
            relative_error
        );
    }

    #[test]
    fn hole_subtracts_from_outer_ring() {
        let outer = square((0.0, 0.0), 3.0 * KM_DEG);
        let solid = measure(&MultiPolygon::new(vec![outer.clone()]));

        // Interior ring wound opposite to the exterior.
        let hole = LineString::from(vec![
            (KM_DEG, KM_DEG),
            (KM_DEG, 2.0 * KM_DEG),
            (2.0 * KM_DEG, 2.0 * KM_DEG),
            (2.0 * KM_DEG, KM_DEG),
            (KM_DEG, KM_DEG),
        ]);
        let punched = measure(&MultiPolygon::new(vec![Polygon::new(
            outer.exterior().clone(),
            vec![hole],
        )]));

        let expected = solid.area * 8.0 / 9.0;
        assert!((punched.area - expected).abs() / expected < 0.005);
    }

    #[test]
    fn derived_fields_rounded_from_raw_area() {
        let geometry = MultiPolygon::new(vec![square((-47.0, -23.0), KM_DEG)]);
        let m = measure(&geometry);
        assert_eq!(m.area_hectares, round_dp(m.area / 10_000.0, 4));
        assert_eq!(m.area_km2, round_dp(m.area / 1_000_000.0, 6));
    }

    #[test]
    fn centroid_sits_inside_bbox() {
        let geometry = MultiPolygon::new(vec![square((-47.0, -23.0), KM_DEG)]);
        let m = measure(&geometry);
        assert!(m.bbox.min_lon <= m.centroid.longitude && m.centroid.longitude <= m.bbox.max_lon);
        assert!(m.bbox.min_lat <= m.centroid.latitude && m.centroid.latitude <= m.bbox.max_lat);
        assert!((-180.0..=180.0).contains(&m.centroid.longitude));
        assert!((-90.0..=90.0).contains(&m.centroid.latitude));
    }

    #[test]
    fn round_dp_matches_to_fixed() {
        assert_eq!(round_dp(1.23456789, 4), 1.2346);
        assert_eq!(round_dp(1.23456749, 6), 1.234567);
        assert_eq!(round_dp(-0.00000051, 6), -0.000001);
    }
}
