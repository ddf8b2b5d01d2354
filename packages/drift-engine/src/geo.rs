//! geo.rs — Geodesic kernel
//!
//! Pure spherical-earth math shared by every other module: haversine
//! distances, bearings, destination points, and the flat small-displacement
//! projection the drift calculators feed into.
//!
//! Conventions:
//! - Directions are degrees true, 0 = north, measured "toward".
//! - A drift direction `d` maps to km offsets as north = cos(d)·r,
//!   east = sin(d)·r. Every calculator uses this same mapping.

use drift_types::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Meridian arc length of one degree of latitude.
pub const KM_PER_DEG: f64 = 111.32;
pub const KM_PER_NM: f64 = 1.852;

// ── Unit conversions ──────────────────────────────────────────────────────────

pub fn nm_to_km(nm: f64) -> f64 {
    nm * KM_PER_NM
}

pub fn km_to_nm(km: f64) -> f64 {
    km / KM_PER_NM
}

/// 1 knot = 1.852 km/h.
pub fn knots_to_kmh(kn: f64) -> f64 {
    kn * KM_PER_NM
}

pub fn kmh_to_knots(kmh: f64) -> f64 {
    kmh / KM_PER_NM
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

// ── Great-circle math ─────────────────────────────────────────────────────────

/// Haversine distance in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial great-circle bearing from `from` toward `to`, degrees in [0, 360).
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let dlng = (to.lng - from.lng).to_radians();
    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Point reached after traveling `distance_km` on bearing `bearing_deg`.
pub fn destination(from: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = from.lat.to_radians();
    let lng1 = from.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), ((lng2.to_degrees() + 540.0) % 360.0) - 180.0)
}

/// Great-circle midpoint.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let lng1 = a.lng.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let bx = lat2.cos() * dlng.cos();
    let by = lat2.cos() * dlng.sin();
    let lat3 = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by * by).sqrt());
    let lng3 = lng1 + by.atan2(lat1.cos() + bx);

    GeoPoint::new(lat3.to_degrees(), ((lng3.to_degrees() + 540.0) % 360.0) - 180.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Axis-aligned bounding box of a point set; `None` for an empty set.
pub fn bounding_box(points: &[GeoPoint]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bb = BoundingBox {
        min_lat: first.lat,
        max_lat: first.lat,
        min_lng: first.lng,
        max_lng: first.lng,
    };
    for p in &points[1..] {
        bb.min_lat = bb.min_lat.min(p.lat);
        bb.max_lat = bb.max_lat.max(p.lat);
        bb.min_lng = bb.min_lng.min(p.lng);
        bb.max_lng = bb.max_lng.max(p.lng);
    }
    Some(bb)
}

// ── Flat small-displacement projection ────────────────────────────────────────

/// Kilometer offsets in the local tangent plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KmVector {
    pub north: f64,
    pub east: f64,
}

impl KmVector {
    pub fn zero() -> Self {
        Self { north: 0.0, east: 0.0 }
    }

    /// Offset of magnitude `distance_km` toward `direction_deg`.
    pub fn toward(direction_deg: f64, distance_km: f64) -> Self {
        let rad = direction_deg.to_radians();
        Self {
            north: rad.cos() * distance_km,
            east: rad.sin() * distance_km,
        }
    }

    pub fn add(&self, other: &KmVector) -> KmVector {
        KmVector {
            north: self.north + other.north,
            east: self.east + other.east,
        }
    }

    pub fn scale(&self, s: f64) -> KmVector {
        KmVector {
            north: self.north * s,
            east: self.east * s,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.north * self.north + self.east * self.east).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.north.is_finite() && self.east.is_finite()
    }
}

/// How km offsets convert to degrees of longitude.
///
/// `Uniform` reproduces the historical behavior of treating one degree of
/// longitude as 111.32 km everywhere; `CosLat` applies the latitude
/// correction. The drift paths default to `Uniform` for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongitudeScale {
    #[default]
    Uniform,
    CosLat,
}

impl LongitudeScale {
    /// Convert a km offset at reference latitude `lat` to degree deltas.
    pub fn to_degrees(&self, v: KmVector, lat: f64) -> (f64, f64) {
        let dlat = v.north / KM_PER_DEG;
        let dlng = match self {
            LongitudeScale::Uniform => v.east / KM_PER_DEG,
            LongitudeScale::CosLat => v.east / (KM_PER_DEG * lat.to_radians().cos()),
        };
        (dlat, dlng)
    }
}

/// Latitude-aware degree offsets, used where longitudinal correctness
/// matters (initial particle disc, search-area measure).
pub fn km_to_deg_at(lat: f64, north_km: f64, east_km: f64) -> (f64, f64) {
    (
        north_km / KM_PER_DEG,
        east_km / (KM_PER_DEG * lat.to_radians().cos()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_haversine_round_trip() {
        let p = GeoPoint::new(29.3, -94.8);
        for (d, b) in [(0.5, 0.0), (12.0, 47.0), (99.0, 183.0), (3.3, 271.5)] {
            let q = destination(p, d, b);
            assert!(
                (haversine_km(p, q) - d).abs() < 1e-6,
                "round trip failed for d={d} b={b}"
            );
        }
    }

    #[test]
    fn bearing_cardinal_directions() {
        let p = GeoPoint::new(0.0, 0.0);
        assert!((bearing_deg(p, GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_deg(p, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(p, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn midpoint_on_equator() {
        let m = midpoint(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 10.0));
        assert!(m.lat.abs() < 1e-9);
        assert!((m.lng - 5.0).abs() < 1e-9);
    }

    #[test]
    fn toward_matches_direction_convention() {
        // 0° = north: all displacement in the lat component
        let v = KmVector::toward(0.0, 2.0);
        assert!((v.north - 2.0).abs() < 1e-12 && v.east.abs() < 1e-12);
        // 90° = east
        let v = KmVector::toward(90.0, 2.0);
        assert!(v.north.abs() < 1e-12 && (v.east - 2.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_scale_ignores_latitude() {
        let v = KmVector { north: 0.0, east: 111.32 };
        let (_, dlng_uniform) = LongitudeScale::Uniform.to_degrees(v, 60.0);
        let (_, dlng_cos) = LongitudeScale::CosLat.to_degrees(v, 60.0);
        assert!((dlng_uniform - 1.0).abs() < 1e-12);
        assert!(dlng_cos > 1.9); // cos 60° = 0.5 doubles the angular offset
    }

    #[test]
    fn knots_conversion() {
        assert!((knots_to_kmh(10.0) - 18.52).abs() < 1e-12);
        assert!((kmh_to_knots(18.52) - 10.0).abs() < 1e-12);
    }
}
