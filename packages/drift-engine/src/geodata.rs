//! geodata.rs — Unified geodata access with caching and graceful degradation
//!
//! Bathymetry, coastline, and rip-current sources are pluggable and flaky:
//! every [`GeoProvider`] method may miss. The [`GeodataAdapter`] sits between
//! the driver and the provider, caches depth and shore lookups on rounded
//! coordinates, and substitutes conservative synthetic values on a miss so a
//! provider outage degrades the simulation instead of failing it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use drift_types::{BathymetryGradient, RipCurrentReport, ShoreInfo, ShoreKind};
use tracing::warn;

use crate::geo::KM_PER_DEG;

/// Hard cap on cached depth entries.
pub const DEPTH_CACHE_CAP: usize = 10_000;

// ── Provider trait ────────────────────────────────────────────────────────────

/// Access to external geodata. Every method may return `None` on a miss;
/// the adapter supplies the fallback.
pub trait GeoProvider: Send + Sync {
    /// Water depth in meters, positive downward; ≤ 0 means land.
    fn depth(&self, lat: f64, lng: f64) -> Option<f64>;

    fn bathymetry_gradient(&self, lat: f64, lng: f64) -> Option<BathymetryGradient>;

    fn shore_info(&self, lat: f64, lng: f64) -> Option<ShoreInfo>;

    fn shore_type(&self, lat: f64, lng: f64) -> Option<ShoreKind>;

    fn rip_current(&self, lat: f64, lng: f64, t_seconds: f64) -> Option<RipCurrentReport>;
}

// ── Bounded cache ─────────────────────────────────────────────────────────────

/// Fixed-capacity map keyed on coordinates rounded to 1e-4°. Entries are
/// evicted in insertion order once the cap is reached.
struct BoundedCache<V> {
    map: HashMap<(i64, i64), V>,
    order: VecDeque<(i64, i64)>,
    cap: usize,
}

impl<V: Copy> BoundedCache<V> {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::with_capacity(cap.min(4096)),
            order: VecDeque::with_capacity(cap.min(4096)),
            cap,
        }
    }

    fn get(&self, key: (i64, i64)) -> Option<V> {
        self.map.get(&key).copied()
    }

    fn insert(&mut self, key: (i64, i64), value: V) {
        if self.map.contains_key(&key) {
            self.map.insert(key, value);
            return;
        }
        if self.map.len() >= self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.map.insert(key, value);
        self.order.push_back(key);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map.len()
    }
}

fn cache_key(lat: f64, lng: f64) -> (i64, i64) {
    ((lat * 1e4).round() as i64, (lng * 1e4).round() as i64)
}

// ── Adapter ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct DepthSample {
    pub depth_m: f64,
    /// True when the provider missed and a conservative value was used.
    pub synthetic: bool,
}

pub struct GeodataAdapter {
    provider: Arc<dyn GeoProvider>,
    depth_cache: BoundedCache<f64>,
    shore_cache: BoundedCache<ShoreKind>,
    synthetic_lookups: u64,
    warned_depth_miss: bool,
}

impl GeodataAdapter {
    pub fn new(provider: Arc<dyn GeoProvider>) -> Self {
        Self {
            provider,
            depth_cache: BoundedCache::new(DEPTH_CACHE_CAP),
            shore_cache: BoundedCache::new(DEPTH_CACHE_CAP),
            synthetic_lookups: 0,
            warned_depth_miss: false,
        }
    }

    /// Depth with caching; misses degrade to a deterministic 20–50 m value.
    pub fn depth(&mut self, lat: f64, lng: f64) -> DepthSample {
        let key = cache_key(lat, lng);
        if let Some(depth_m) = self.depth_cache.get(key) {
            return DepthSample { depth_m, synthetic: false };
        }
        match self.provider.depth(lat, lng) {
            Some(d) if d.is_finite() => {
                self.depth_cache.insert(key, d);
                DepthSample { depth_m: d, synthetic: false }
            }
            _ => {
                self.synthetic_lookups += 1;
                if !self.warned_depth_miss {
                    self.warned_depth_miss = true;
                    warn!("depth provider miss at ({lat:.4}, {lng:.4}); using synthetic bathymetry");
                }
                DepthSample { depth_m: synthetic_depth(key), synthetic: true }
            }
        }
    }

    pub fn bathymetry_gradient(&self, lat: f64, lng: f64) -> Option<BathymetryGradient> {
        // Conservative fallback is a zero gradient, i.e. no steering.
        self.provider.bathymetry_gradient(lat, lng)
    }

    pub fn shore_info(&self, lat: f64, lng: f64) -> Option<ShoreInfo> {
        self.provider.shore_info(lat, lng)
    }

    /// Shore substrate with caching; misses degrade to sandy.
    pub fn shore_type(&mut self, lat: f64, lng: f64) -> ShoreKind {
        let key = cache_key(lat, lng);
        if let Some(kind) = self.shore_cache.get(key) {
            return kind;
        }
        match self.provider.shore_type(lat, lng) {
            Some(kind) => {
                self.shore_cache.insert(key, kind);
                kind
            }
            None => {
                self.synthetic_lookups += 1;
                ShoreKind::Sandy
            }
        }
    }

    pub fn rip_current(&self, lat: f64, lng: f64, t_seconds: f64) -> Option<RipCurrentReport> {
        self.provider.rip_current(lat, lng, t_seconds)
    }

    /// Total lookups answered from synthetic defaults so far.
    pub fn synthetic_lookups(&self) -> u64 {
        self.synthetic_lookups
    }
}

/// Deterministic pseudo-depth in [20, 50) m derived from the rounded
/// coordinates, so repeated queries at one spot agree.
fn synthetic_depth(key: (i64, i64)) -> f64 {
    let mixed = (key.0.wrapping_mul(73_856_093) ^ key.1.wrapping_mul(19_349_663)) as u64;
    let unit = (mixed % 10_000) as f64 / 10_000.0;
    20.0 + unit * 30.0
}

// ── Synthetic provider ────────────────────────────────────────────────────────

/// A straight east-west shoreline with water to its south.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticShore {
    pub latitude_deg: f64,
    pub kind: ShoreKind,
}

/// Flat-bottomed basin, optionally bounded by a [`SyntheticShore`] to the
/// north. The backend default and the scenario-test workhorse.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticGeoProvider {
    pub basin_depth_m: f64,
    pub shore: Option<SyntheticShore>,
}

impl SyntheticGeoProvider {
    pub fn open_ocean(basin_depth_m: f64) -> Self {
        Self { basin_depth_m, shore: None }
    }

    pub fn with_shore(basin_depth_m: f64, shore: SyntheticShore) -> Self {
        Self { basin_depth_m, shore: Some(shore) }
    }
}

impl GeoProvider for SyntheticGeoProvider {
    fn depth(&self, lat: f64, _lng: f64) -> Option<f64> {
        match self.shore {
            Some(shore) if lat >= shore.latitude_deg => Some(-0.5),
            _ => Some(self.basin_depth_m),
        }
    }

    fn bathymetry_gradient(&self, _lat: f64, _lng: f64) -> Option<BathymetryGradient> {
        None
    }

    fn shore_info(&self, lat: f64, _lng: f64) -> Option<ShoreInfo> {
        let shore = self.shore?;
        Some(ShoreInfo {
            distance_km: (shore.latitude_deg - lat).abs() * KM_PER_DEG,
            direction_deg: if lat <= shore.latitude_deg { 0.0 } else { 180.0 },
            // Water lies south of the line, so the seaward normal points south.
            shore_normal_deg: 180.0,
        })
    }

    fn shore_type(&self, _lat: f64, _lng: f64) -> Option<ShoreKind> {
        self.shore.map(|s| s.kind)
    }

    fn rip_current(&self, _lat: f64, _lng: f64, _t_seconds: f64) -> Option<RipCurrentReport> {
        None
    }
}

/// Provider that always misses; exercises the degradation path.
pub struct NullGeoProvider;

impl GeoProvider for NullGeoProvider {
    fn depth(&self, _lat: f64, _lng: f64) -> Option<f64> {
        None
    }
    fn bathymetry_gradient(&self, _lat: f64, _lng: f64) -> Option<BathymetryGradient> {
        None
    }
    fn shore_info(&self, _lat: f64, _lng: f64) -> Option<ShoreInfo> {
        None
    }
    fn shore_type(&self, _lat: f64, _lng: f64) -> Option<ShoreKind> {
        None
    }
    fn rip_current(&self, _lat: f64, _lng: f64, _t_seconds: f64) -> Option<RipCurrentReport> {
        None
    }
}
