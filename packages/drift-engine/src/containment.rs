//! containment.rs — Containment-probability polygons
//!
//! From the active cloud: centroid → sort by haversine distance → take the
//! 50/90/95% closest particles → Andrew monotone-chain convex hull over
//! (lat, lng) treated as Cartesian. Valid for the few-km extents the
//! simulation produces; the density grid shares the same approximation.

use drift_types::{ContainmentReport, ContainmentZone, GeoPoint};

use crate::geo::haversine_km;

pub const CONTAINMENT_LEVELS: [f64; 3] = [0.50, 0.90, 0.95];

/// Containment zones for the given active-particle positions. Fewer than
/// three particles yields empty zones and zero confidence.
pub fn containment_report(positions: &[GeoPoint]) -> ContainmentReport {
    if positions.len() < 3 {
        return ContainmentReport {
            centroid: None,
            zones: CONTAINMENT_LEVELS
                .iter()
                .map(|&level| ContainmentZone { level, polygon: Vec::new() })
                .collect(),
            confidence: 0.0,
        };
    }

    let n = positions.len() as f64;
    let centroid = GeoPoint::new(
        positions.iter().map(|p| p.lat).sum::<f64>() / n,
        positions.iter().map(|p| p.lng).sum::<f64>() / n,
    );

    let mut by_distance: Vec<(f64, GeoPoint)> = positions
        .iter()
        .map(|&p| (haversine_km(centroid, p), p))
        .collect();
    by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

    let zones = CONTAINMENT_LEVELS
        .iter()
        .map(|&level| {
            let take = ((level * n).ceil() as usize).max(3).min(by_distance.len());
            let prefix: Vec<GeoPoint> = by_distance[..take].iter().map(|(_, p)| *p).collect();
            ContainmentZone { level, polygon: convex_hull(&prefix) }
        })
        .collect();

    let mean = by_distance.iter().map(|(d, _)| d).sum::<f64>() / n;
    let var = by_distance.iter().map(|(d, _)| (d - mean).powi(2)).sum::<f64>() / n;
    let confidence = (1.0 - var.sqrt() / (mean + 1.0)).clamp(0.0, 1.0);

    ContainmentReport { centroid: Some(centroid), zones, confidence }
}

/// Andrew monotone-chain convex hull over (lat, lng) as Cartesian (x, y).
/// Output is counter-clockwise, first vertex not repeated, and strict turns
/// only — no three consecutive collinear vertices survive.
pub fn convex_hull(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut pts: Vec<(f64, f64)> = points.iter().map(|p| (p.lat, p.lng)).collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pts.dedup();

    if pts.len() < 3 {
        return pts.into_iter().map(|(lat, lng)| GeoPoint::new(lat, lng)).collect();
    }

    let cross = |o: (f64, f64), a: (f64, f64), b: (f64, f64)| -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain's last point is the other's first; drop both duplicates.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower.into_iter().map(|(lat, lng)| GeoPoint::new(lat, lng)).collect()
}

/// Ray-casting point-in-polygon over (lat, lng) as Cartesian.
pub fn point_in_polygon(point: GeoPoint, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let (x, y) = (point.lat, point.lng);
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].lat, polygon[i].lng);
        let (xj, yj) = (polygon[j].lat, polygon[j].lng);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_center() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.5, 0.5),
        ]
    }

    #[test]
    fn hull_of_square_is_ccw_square() {
        let hull = convex_hull(&square_with_center());
        let expected = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert_eq!(hull.len(), 4);
        for (v, (lat, lng)) in hull.iter().zip(expected) {
            assert_eq!((v.lat, v.lng), (lat, lng));
        }
    }

    #[test]
    fn ninety_percent_zone_of_five_keeps_the_square() {
        let report = containment_report(&square_with_center());
        let zone = report.zones.iter().find(|z| z.level == 0.90).unwrap();
        assert_eq!(zone.polygon.len(), 4, "ceil(0.9·5) = 5 particles → full square hull");
        assert!(report.confidence > 0.0 && report.confidence <= 1.0);
    }

    #[test]
    fn hull_is_idempotent() {
        let hull = convex_hull(&square_with_center());
        let again = convex_hull(&hull);
        assert_eq!(hull.len(), again.len());
        for (a, b) in hull.iter().zip(&again) {
            assert_eq!((a.lat, a.lng), (b.lat, b.lng));
        }
    }

    #[test]
    fn collinear_interior_points_are_dropped() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.5, 0.0), // on the bottom edge
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 1.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4, "edge midpoint must not survive");
    }

    #[test]
    fn under_three_particles_yields_empty_zones() {
        let report = containment_report(&[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.1, 0.1)]);
        assert!(report.centroid.is_none());
        assert_eq!(report.confidence, 0.0);
        assert!(report.zones.iter().all(|z| z.polygon.is_empty()));
    }

    #[test]
    fn ray_casting_classifies_center_and_exterior() {
        let hull = convex_hull(&square_with_center());
        assert!(point_in_polygon(GeoPoint::new(0.5, 0.5), &hull));
        assert!(!point_in_polygon(GeoPoint::new(1.5, 0.5), &hull));
    }
}
