//! ensemble.rs — The Monte-Carlo particle cloud
//!
//! Particles are allocated once at initialization and never removed. All
//! mutation funnels through the ensemble so the freeze invariants hold: a
//! particle that is no longer active keeps its position and status forever,
//! and age only advances while active.

use drift_types::{EnsembleCounts, GeoPoint, ParticleFix, ParticleStatus, ShoreKind, SurfEffect};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::geo::km_to_deg_at;

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub status: ParticleStatus,
    pub age_seconds: f64,
    pub beached_time: Option<u64>,
    pub beach_type: Option<ShoreKind>,
    pub beaching_effects: Vec<SurfEffect>,
    /// Depth sampled on the particle's last step; ≤ 0 means land.
    pub depth_at_last_step: Option<f64>,
    pub reflection_count: u32,
}

impl Particle {
    fn new(id: u32, lat: f64, lng: f64) -> Self {
        Self {
            id,
            lat,
            lng,
            status: ParticleStatus::Active,
            age_seconds: 0.0,
            beached_time: None,
            beach_type: None,
            beaching_effects: Vec::new(),
            depth_at_last_step: None,
            reflection_count: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticleStatus::Active
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

pub struct ParticleEnsemble {
    particles: Vec<Particle>,
}

impl ParticleEnsemble {
    /// Spawn `count` particles uniformly inside a disc of `radius_km` around
    /// the LKP: θ ~ U[0, 2π), ρ = √U·R, longitude scaled by cos(lat).
    pub fn spawn_disc(lkp: GeoPoint, radius_km: f64, count: usize, rng: &mut impl Rng) -> Self {
        let angle_dist = Uniform::new(0.0, std::f64::consts::TAU);
        let particles = (0..count)
            .map(|i| {
                let theta = angle_dist.sample(rng);
                let rho = rng.gen_range(0.0f64..1.0).sqrt() * radius_km;
                let (dlat, dlng) = km_to_deg_at(lkp.lat, theta.cos() * rho, theta.sin() * rho);
                Particle::new(i as u32, lkp.lat + dlat, lkp.lng + dlng)
            })
            .collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, id: u32) -> Option<&Particle> {
        self.particles.get(id as usize)
    }

    pub fn counts(&self) -> EnsembleCounts {
        let active = self.particles.iter().filter(|p| p.is_active()).count();
        let beached = self
            .particles
            .iter()
            .filter(|p| p.status == ParticleStatus::Beached)
            .count();
        EnsembleCounts { active, beached, total: self.particles.len() }
    }

    pub fn active_positions(&self) -> Vec<GeoPoint> {
        self.particles
            .iter()
            .filter(|p| p.is_active())
            .map(Particle::position)
            .collect()
    }

    /// Arithmetic-mean centroid of active particles.
    pub fn centroid_active(&self) -> Option<GeoPoint> {
        let mut n = 0usize;
        let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
        for p in self.particles.iter().filter(|p| p.is_active()) {
            lat_sum += p.lat;
            lng_sum += p.lng;
            n += 1;
        }
        (n > 0).then(|| GeoPoint::new(lat_sum / n as f64, lng_sum / n as f64))
    }

    pub fn fixes(&self) -> Vec<ParticleFix> {
        self.particles
            .iter()
            .map(|p| ParticleFix {
                id: p.id,
                lat: p.lat,
                lng: p.lng,
                status: p.status,
                depth: p.depth_at_last_step,
            })
            .collect()
    }

    // ── Driver-side mutation (frozen particles ignore all of these) ──────────

    pub fn set_position(&mut self, id: u32, lat: f64, lng: f64) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.lat = lat;
                p.lng = lng;
            }
        }
    }

    pub fn set_depth(&mut self, id: u32, depth_m: f64) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.depth_at_last_step = Some(depth_m);
            }
        }
    }

    pub fn advance_age(&mut self, id: u32, dt_seconds: f64) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.age_seconds += dt_seconds;
            }
        }
    }

    pub fn record_reflection(&mut self, id: u32) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.reflection_count += 1;
            }
        }
    }

    /// Freeze a particle where it is, stranded.
    pub fn beach(
        &mut self,
        id: u32,
        time_seconds: u64,
        kind: ShoreKind,
        effects: Vec<SurfEffect>,
    ) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.status = ParticleStatus::Beached;
                p.beached_time = Some(time_seconds);
                p.beach_type = Some(kind);
                p.beaching_effects = effects;
            }
        }
    }

    /// Freeze a particle as recovered (picked up by a search asset).
    pub fn mark_recovered(&mut self, id: u32) {
        if let Some(p) = self.particles.get_mut(id as usize) {
            if p.is_active() {
                p.status = ParticleStatus::Recovered;
            }
        }
    }
}
