//! driver.rs — Time-stepping driver
//!
//! Runs one simulation: advances the environmental field, composes the
//! per-particle physics in a fixed order (wind + current + wave + leeway →
//! shallow-water augmentation → diffusion), applies land exclusion and the
//! shore-interaction decision, and records hourly snapshots plus run
//! statistics.
//!
//! Per-particle physics failures are contained: a non-finite displacement
//! skips that particle's step and increments a counter; geodata misses
//! degrade through the adapter. Nothing in the hot loop performs I/O.

use std::sync::Arc;

use drift_types::{
    BeachingRecord, DriftSnapshot, DriftStats, GeoPoint, ShoreKind, SimulationConfig, SurfEffect,
};
use rand::Rng;
use tracing::{debug, info};

use crate::drift::{CurrentDrift, Diffusion, LeewayDrift, WaveDrift, WindDrift};
use crate::ensemble::ParticleEnsemble;
use crate::environment::EnvironmentalProvider;
use crate::geo::{bearing_deg, KmVector, LongitudeScale};
use crate::geodata::{GeoProvider, GeodataAdapter};
use crate::shallow::{
    shore_interaction, shore_profile, ShallowWaterPhysics, ShoreOutcome, SHALLOW_DEPTH_M,
    SURF_ZONE_DEPTH_M,
};

pub struct DriftDriver {
    config: SimulationConfig,
    pub longitude_scale: LongitudeScale,
    ensemble: ParticleEnsemble,
    env: Box<dyn EnvironmentalProvider>,
    geodata: GeodataAdapter,

    pub wind: WindDrift,
    pub current: CurrentDrift,
    pub waves: WaveDrift,
    pub leeway: LeewayDrift,
    pub diffusion: Diffusion,
    pub shallow: ShallowWaterPhysics,

    current_time_s: f64,
    snapshots: Vec<DriftSnapshot>,
    stats: DriftStats,
    synthetic_at_last_snapshot: u64,
}

impl DriftDriver {
    pub fn new(
        config: SimulationConfig,
        env: Box<dyn EnvironmentalProvider>,
        provider: Arc<dyn GeoProvider>,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let ensemble = ParticleEnsemble::spawn_disc(
            config.lkp,
            config.initial_radius_km,
            config.particle_count,
            &mut rng,
        );
        let leeway = LeewayDrift::for_object(config.object_type);

        let mut driver = Self {
            config,
            longitude_scale: LongitudeScale::default(),
            ensemble,
            env,
            geodata: GeodataAdapter::new(provider),
            wind: WindDrift::default(),
            current: CurrentDrift::default(),
            waves: WaveDrift::default(),
            leeway,
            diffusion: Diffusion::default(),
            shallow: ShallowWaterPhysics::default(),
            current_time_s: 0.0,
            snapshots: Vec::new(),
            stats: DriftStats::default(),
            synthetic_at_last_snapshot: 0,
        };
        driver.record_snapshot(0);
        driver
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ensemble(&self) -> &ParticleEnsemble {
        &self.ensemble
    }

    pub fn snapshots(&self) -> &[DriftSnapshot] {
        &self.snapshots
    }

    pub fn stats(&self) -> &DriftStats {
        &self.stats
    }

    pub fn current_time_seconds(&self) -> f64 {
        self.current_time_s
    }

    /// The snapshot lying exactly on `hour`, if one was recorded there.
    pub fn snapshot_at_hour(&self, hour: u32) -> Option<&DriftSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.hour == hour && s.time_seconds == hour as u64 * 3600)
    }

    /// Advance the whole ensemble by `dt_seconds`.
    pub fn step(&mut self, dt_seconds: f64) {
        let dt_hours = dt_seconds / 3600.0;
        let t_next = self.current_time_s + dt_seconds;
        self.env.advance(t_next);

        let mut rng = rand::thread_rng();
        for id in 0..self.ensemble.len() as u32 {
            let (lat, lng) = match self.ensemble.get(id) {
                Some(p) if p.is_active() => (p.lat, p.lng),
                _ => continue,
            };
            self.step_particle(id, lat, lng, t_next, dt_seconds, dt_hours, &mut rng);
        }

        self.stats.synthetic_geo_lookups = self.geodata.synthetic_lookups();

        let hour_before = (self.current_time_s / 3600.0).floor() as u32;
        let hour_after = (t_next / 3600.0).floor() as u32;
        self.current_time_s = t_next;
        if hour_after > hour_before {
            self.record_snapshot(hour_after);
        }
    }

    /// Run every remaining step synchronously. The backend drives `step`
    /// itself so it can interleave scheduler yields.
    pub fn run_to_completion(&mut self) {
        let total = self.config.total_steps();
        let dt = self.config.time_step_seconds;
        let report_every = (total / 10).max(1);
        for n in 0..total {
            self.step(dt);
            if (n + 1) % report_every == 0 {
                let counts = self.ensemble.counts();
                info!(
                    "step {}/{} — active {} beached {}",
                    n + 1,
                    total,
                    counts.active,
                    counts.beached
                );
            }
        }
    }

    fn step_particle(
        &mut self,
        id: u32,
        lat: f64,
        lng: f64,
        t_next: f64,
        dt_seconds: f64,
        dt_hours: f64,
        rng: &mut impl Rng,
    ) {
        // 1. Field sample, enriched with local geodata.
        let mut sample = self.env.conditions_at(lat, lng, t_next);
        if sample.bathymetry.is_none() {
            sample.bathymetry = self.geodata.bathymetry_gradient(lat, lng);
        }
        if sample.rip_current.is_none() {
            sample.rip_current = self.geodata.rip_current(lat, lng, t_next);
        }
        let shore_here = self.geodata.shore_info(lat, lng);
        if let Some(si) = shore_here {
            if sample.waves.shore_normal_deg.is_none() {
                sample.waves.shore_normal_deg = Some(si.shore_normal_deg);
            }
            if let Some(tide) = sample.tide.as_mut() {
                tide.shore_direction_deg = si.direction_deg;
                tide.shore_normal_deg = si.shore_normal_deg;
            }
        }

        // 2. Local depth, cached.
        let depth = self.geodata.depth(lat, lng);
        self.ensemble.set_depth(id, depth.depth_m);

        // 3. Open-water forcings.
        let mut drift = self
            .wind
            .displacement(&sample.wind, dt_hours)
            .add(&self.current.displacement(&sample.current, dt_hours))
            .add(&self.waves.displacement(&sample.waves, dt_hours, rng))
            .add(&self.leeway.displacement(&sample.wind, dt_hours));

        // 4. Shallow-water augmentation and the beaching draw.
        let mut effects: Vec<SurfEffect> = Vec::new();
        if depth.depth_m > 0.0 && depth.depth_m < SHALLOW_DEPTH_M {
            self.stats.shallow_water_encounters += 1;
            if depth.depth_m <= SURF_ZONE_DEPTH_M {
                self.stats.surf_zone_encounters += 1;
            }
            let outcome = self.shallow.apply(depth.depth_m, &sample, dt_hours);
            drift = drift.add(&outcome.drift);
            if outcome.dispersion_fallback {
                self.stats.dispersion_fallbacks += 1;
            }
            effects = outcome.effects;
            if outcome.beaching_probability > 0.0
                && rng.gen_range(0.0..1.0) < outcome.beaching_probability
            {
                let kind = self.geodata.shore_type(lat, lng);
                self.beach_particle(id, kind, effects, depth.depth_m, t_next);
                return;
            }
        }

        // 5. Diffusion.
        drift = drift.add(&self.diffusion.displacement(dt_hours, rng));

        if !drift.is_finite() {
            self.stats.physics_incidents += 1;
            return;
        }

        // 6. Attempted position and land exclusion.
        let (dlat, dlng) = self.longitude_scale.to_degrees(drift, lat);
        let (new_lat, new_lng) = (lat + dlat, lng + dlng);
        let attempt_depth = self.geodata.depth(new_lat, new_lng);

        if attempt_depth.depth_m <= 0.0 {
            self.stats.land_exclusions += 1;
            let kind = self.geodata.shore_type(new_lat, new_lng);
            let normal = self
                .geodata
                .shore_info(new_lat, new_lng)
                .map(|s| s.shore_normal_deg)
                .or(sample.waves.shore_normal_deg)
                // Last resort: back along the approach direction.
                .unwrap_or_else(|| {
                    bearing_deg(GeoPoint::new(new_lat, new_lng), GeoPoint::new(lat, lng))
                });

            match shore_interaction(kind, normal, rng) {
                ShoreOutcome::Beach => {
                    self.beach_particle(id, kind, effects, depth.depth_m, t_next);
                    return;
                }
                ShoreOutcome::Reflect { distance_km, direction_deg } => {
                    let bounce = KmVector::toward(direction_deg, distance_km);
                    let (blat, blng) = self.longitude_scale.to_degrees(bounce, lat);
                    self.ensemble.set_position(id, lat + blat, lng + blng);
                    self.ensemble.record_reflection(id);
                    self.stats.reflections += 1;
                }
                ShoreOutcome::Hold => {} // move discarded, particle stays
            }
        } else {
            self.ensemble.set_position(id, new_lat, new_lng);
        }

        // 7. Age advances only for particles still active.
        self.ensemble.advance_age(id, dt_seconds);
    }

    fn beach_particle(
        &mut self,
        id: u32,
        kind: ShoreKind,
        effects: Vec<SurfEffect>,
        depth_m: f64,
        t_seconds: f64,
    ) {
        self.ensemble.beach(id, t_seconds as u64, kind, effects.clone());
        let p = match self.ensemble.get(id) {
            Some(p) => p,
            None => return,
        };
        self.stats.total_beached += 1;
        self.stats.beachings.push(BeachingRecord {
            lat: p.lat,
            lng: p.lng,
            time_seconds: t_seconds as u64,
            hour: (t_seconds / 3600.0) as u32,
            depth_m,
            shore_kind: kind,
            effects,
            permeability: shore_profile(kind).permeability,
        });
    }

    /// Aggregate analysis products for the run so far.
    pub fn results(&self) -> drift_types::SimulationResults {
        let positions = self.ensemble.active_positions();
        let survival = self.config.victim_profile.as_ref().map(|profile| {
            let sample = self.env.conditions_at(
                self.config.lkp.lat,
                self.config.lkp.lng,
                self.current_time_s,
            );
            crate::survival::estimate(profile, sample.water_temp_f, self.current_time_s / 3600.0)
        });
        drift_types::SimulationResults {
            survival,
            containment: crate::containment::containment_report(&positions),
            heat_map: crate::density::DensityAnalyzer::default().heat_map(&self.ensemble),
            stats: self.stats.clone(),
            snapshots: self.snapshots.clone(),
        }
    }

    fn record_snapshot(&mut self, hour: u32) {
        let synthetic_now = self.geodata.synthetic_lookups();
        let snapshot = DriftSnapshot {
            time_seconds: self.current_time_s.round() as u64,
            hour,
            counts: self.ensemble.counts(),
            centroid: self.ensemble.centroid_active(),
            particles: self.ensemble.fixes(),
            synthetic_geo: synthetic_now > self.synthetic_at_last_snapshot,
        };
        self.synthetic_at_last_snapshot = synthetic_now;
        debug!(
            "snapshot hour {hour}: active {} beached {}",
            snapshot.counts.active, snapshot.counts.beached
        );
        self.snapshots.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::CalmEnvironment;
    use crate::geodata::SyntheticGeoProvider;
    use drift_types::SimulationConfig;

    fn small_config() -> SimulationConfig {
        let mut cfg = SimulationConfig::new(GeoPoint::new(29.3, -94.8));
        cfg.particle_count = 50;
        cfg.duration_hours = 3.0;
        cfg.time_step_seconds = 600.0;
        cfg
    }

    fn calm_driver(cfg: SimulationConfig) -> DriftDriver {
        DriftDriver::new(
            cfg,
            Box::new(CalmEnvironment::default()),
            Arc::new(SyntheticGeoProvider::open_ocean(100.0)),
        )
    }

    #[test]
    fn snapshots_land_on_hour_marks() {
        let mut driver = calm_driver(small_config());
        driver.run_to_completion();
        // hour 0 at init plus one per simulated hour
        assert_eq!(driver.snapshots().len(), 4);
        for (expected_hour, snap) in driver.snapshots().iter().enumerate() {
            assert_eq!(snap.hour, expected_hour as u32);
            assert_eq!(snap.time_seconds, expected_hour as u64 * 3600);
        }
        assert!(driver.snapshot_at_hour(2).is_some());
        assert!(driver.snapshot_at_hour(7).is_none());
    }

    #[test]
    fn particle_count_never_changes() {
        let mut driver = calm_driver(small_config());
        for _ in 0..6 {
            driver.step(600.0);
            assert_eq!(driver.ensemble().counts().total, 50);
        }
    }

    #[test]
    fn ages_track_simulated_time() {
        let mut driver = calm_driver(small_config());
        for _ in 0..6 {
            driver.step(600.0);
        }
        for p in driver.ensemble().particles() {
            assert_eq!(p.age_seconds, 3600.0);
        }
    }

    #[test]
    fn synthetic_geodata_lookups_reach_the_stats() {
        let mut driver = DriftDriver::new(
            small_config(),
            Box::new(CalmEnvironment::default()),
            Arc::new(crate::geodata::NullGeoProvider),
        );
        assert_eq!(driver.stats().synthetic_geo_lookups, 0);
        driver.step(600.0);
        // Every particle triggered at least the local-depth fallback
        assert!(driver.stats().synthetic_geo_lookups >= 50);
        let results = driver.results();
        assert_eq!(
            results.stats.synthetic_geo_lookups,
            driver.stats().synthetic_geo_lookups
        );
    }

    #[test]
    fn calm_sea_with_zero_diffusion_is_a_fixed_point() {
        let mut driver = calm_driver(small_config());
        driver.diffusion.coefficient_km2_per_h = 0.0;
        let before: Vec<_> = driver.ensemble().active_positions();
        for _ in 0..12 {
            driver.step(600.0);
        }
        let after = driver.ensemble().active_positions();
        for (a, b) in before.iter().zip(&after) {
            assert!((a.lat - b.lat).abs() < 1e-12);
            assert!((a.lng - b.lng).abs() < 1e-12);
        }
    }
}
