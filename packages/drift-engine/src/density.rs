//! density.rs — Particle density heat-map
//!
//! Bins active particles into a square lat/lng grid (0.01° ≈ 1.1 km cells)
//! and normalizes cell counts into heat-map weights for search planners.

use std::collections::HashMap;

use drift_types::{DensityCell, GeoPoint, HeatMap};

use crate::ensemble::ParticleEnsemble;
use crate::geo::{BoundingBox, KM_PER_DEG};

#[derive(Debug, Clone, Copy)]
pub struct DensityAnalyzer {
    pub cell_size_deg: f64,
}

impl Default for DensityAnalyzer {
    fn default() -> Self {
        Self { cell_size_deg: 0.01 }
    }
}

impl DensityAnalyzer {
    pub fn heat_map(&self, ensemble: &ParticleEnsemble) -> HeatMap {
        let mut bins: HashMap<(i64, i64), Vec<u32>> = HashMap::new();
        for p in ensemble.particles().iter().filter(|p| p.is_active()) {
            let key = (
                (p.lat / self.cell_size_deg).floor() as i64,
                (p.lng / self.cell_size_deg).floor() as i64,
            );
            bins.entry(key).or_default().push(p.id);
        }

        let max_count = bins.values().map(Vec::len).max().unwrap_or(0);
        let mut cells: Vec<DensityCell> = bins
            .into_iter()
            .map(|((row, col), particle_ids)| DensityCell {
                lat: (row as f64 + 0.5) * self.cell_size_deg,
                lng: (col as f64 + 0.5) * self.cell_size_deg,
                count: particle_ids.len(),
                weight: particle_ids.len() as f64 / max_count as f64,
                particle_ids,
            })
            .collect();
        cells.sort_by(|a, b| b.count.cmp(&a.count));

        HeatMap { cell_size_deg: self.cell_size_deg, max_count, cells }
    }

    /// Cells holding at least 10% of the densest cell's count.
    pub fn high_density<'a>(&self, map: &'a HeatMap) -> Vec<&'a DensityCell> {
        let threshold = 0.1 * map.max_count as f64;
        map.cells.iter().filter(|c| c.count as f64 >= threshold).collect()
    }
}

/// Flat-earth area of a bounding box in km², with the longitude span scaled
/// by cos of the mid-latitude.
pub fn search_area_km2(bb: &BoundingBox) -> f64 {
    let mid_lat = (bb.min_lat + bb.max_lat) / 2.0;
    let dlat_km = (bb.max_lat - bb.min_lat) * KM_PER_DEG;
    let dlng_km = (bb.max_lng - bb.min_lng) * KM_PER_DEG * mid_lat.to_radians().cos();
    dlat_km * dlng_km
}

/// Convenience: bounding-box search area of the active cloud.
pub fn active_search_area_km2(ensemble: &ParticleEnsemble) -> Option<f64> {
    let positions: Vec<GeoPoint> = ensemble.active_positions();
    crate::geo::bounding_box(&positions).map(|bb| search_area_km2(&bb))
}
