//! # drift-types
//!
//! Shared data model for the SAR drift simulation suite.
//!
//! These types are used by:
//! - `drift-engine`: the Monte-Carlo particle drift core
//! - `backend-rust`: the simulation API (request/response payloads)
//! - `drift-sim`: the offline scenario runner
//!
//! ## Unit Conventions
//!
//! - Positions: decimal degrees (WGS-84 lat/lng)
//! - Speeds at the interface: knots; wave height: meters; period: seconds
//! - Temperatures: °F; depths: meters, positive downward (≤ 0 means land)
//! - Times: seconds since the start of the simulation
//! - Directions: degrees true, 0 = north; drift directions are "toward"

use serde::{Deserialize, Serialize};

// ── Geographic primitives ─────────────────────────────────────────────────────

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ── Drift object taxonomy ─────────────────────────────────────────────────────

/// Search-object categories with distinct leeway behavior.
/// Wire identifiers follow the operational taxonomy exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    #[default]
    PersonInWater,
    PersonWithPfd,
    PersonInDrysuit,
    #[serde(rename = "life-raft-4")]
    LifeRaft4,
    #[serde(rename = "life-raft-6")]
    LifeRaft6,
    #[serde(rename = "life-raft-10-plus")]
    LifeRaft10Plus,
    SmallVessel,
    MediumVessel,
    Sailboat,
    Kayak,
    Canoe,
    Surfboard,
    Paddleboard,
    WoodDebris,
    PlasticDebris,
    Cooler,
}

// ── Shore taxonomy ────────────────────────────────────────────────────────────

/// Shoreline substrate kinds, each with its own beach/reflect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShoreKind {
    Rocky,
    #[default]
    Sandy,
    Muddy,
    Marsh,
    Mangrove,
    Seawall,
    Riprap,
    Coral,
}

/// Nearest-shore geometry relative to a query point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoreInfo {
    pub distance_km: f64,
    /// Bearing from the query point toward the shore, degrees true.
    pub direction_deg: f64,
    /// Seaward-pointing shore normal, degrees true.
    pub shore_normal_deg: f64,
}

// ── Particle state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleStatus {
    #[default]
    Active,
    Beached,
    Recovered,
}

/// Shallow-water / surf-zone processes that acted on a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfEffect {
    BottomFriction,
    ShallowStokes,
    TopographicSteering,
    TidalAsymmetry,
    WaveBreaking,
    LongshoreCurrent,
    RipCurrent,
    Undertow,
    VeryShallowFriction,
}

/// Per-particle line in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleFix {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub status: ParticleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

// ── Environmental field ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindConditions {
    pub speed_kn: f64,
    pub direction_deg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gusts_kn: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub speed_kn: f64,
    pub direction_deg: f64,
    /// Short-term variation magnitude around the mean speed, knots.
    pub variation_kn: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveConditions {
    pub height_m: f64,
    pub period_s: f64,
    pub direction_deg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shore_normal_deg: Option<f64>,
}

/// Tidal state. Phase convention: 0 = low water (flood begins),
/// phase < 0.5 is the flood, ≥ 0.5 the ebb.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidalConditions {
    pub phase: f64,
    pub shore_direction_deg: f64,
    pub shore_normal_deg: f64,
}

/// Local seabed slope, ∂z/∂x and ∂z/∂y in m/degree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BathymetryGradient {
    pub dz_dx: f64,
    pub dz_dy: f64,
    pub magnitude: f64,
    pub direction_deg: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RipCurrentReport {
    /// Risk in [0, 1].
    pub risk: f64,
    pub strength_mps: f64,
    pub direction_deg: f64,
}

/// One sample of the environmental field at a position and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalSnapshot {
    pub wind: WindConditions,
    pub current: CurrentConditions,
    pub waves: WaveConditions,
    pub water_temp_f: f64,
    pub air_temp_f: f64,
    pub visibility_nm: f64,
    /// Douglas sea state, 0–8.
    pub sea_state: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tide: Option<TidalConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathymetry: Option<BathymetryGradient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rip_current: Option<RipCurrentReport>,
}

/// Seed conditions for the simulated environment, entered by the operator
/// from on-scene observations. Evolved stochastically once the run starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentSeed {
    pub wind_speed_kn: f64,
    pub wind_direction_deg: f64,
    pub current_speed_kn: f64,
    pub current_direction_deg: f64,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub wave_direction_deg: f64,
    pub water_temp_f: f64,
    pub air_temp_f: f64,
}

impl Default for EnvironmentSeed {
    fn default() -> Self {
        // Moderate open-ocean conditions
        Self {
            wind_speed_kn: 10.0,
            wind_direction_deg: 270.0,
            current_speed_kn: 0.8,
            current_direction_deg: 90.0,
            wave_height_m: 1.2,
            wave_period_s: 6.0,
            wave_direction_deg: 270.0,
            water_temp_f: 68.0,
            air_temp_f: 72.0,
        }
    }
}

// ── Victim profile & survival ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clothing {
    None,
    Light,
    Normal,
    Heavy,
    Wetsuit,
    Drysuit,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VictimProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub has_pfd: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing: Option<Clothing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Urgent,
    High,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HypothermiaStage {
    ColdShock,
    SwimFailure,
    MildHypothermia,
    SevereHypothermia,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalEstimate {
    /// Survival probability in [0, 1].
    pub probability: f64,
    pub time_remaining_hours: f64,
    pub urgency: Urgency,
    pub hypothermia_stage: HypothermiaStage,
}

// ── Simulation configuration ──────────────────────────────────────────────────

fn default_particle_count() -> usize { 10_000 }
fn default_duration_hours() -> f64 { 72.0 }
fn default_time_step_seconds() -> f64 { 600.0 }
fn default_initial_radius_km() -> f64 { 0.1 }

/// Recommended upper bound on `particle_count`.
pub const PARTICLE_COUNT_CAP: usize = 200_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Last Known Position — the only required field.
    pub lkp: GeoPoint,
    #[serde(default)]
    pub object_type: ObjectType,
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
    #[serde(default = "default_time_step_seconds")]
    pub time_step_seconds: f64,
    #[serde(default = "default_initial_radius_km")]
    pub initial_radius_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim_profile: Option<VictimProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentSeed>,
}

impl SimulationConfig {
    pub fn new(lkp: GeoPoint) -> Self {
        Self {
            lkp,
            object_type: ObjectType::default(),
            particle_count: default_particle_count(),
            duration_hours: default_duration_hours(),
            time_step_seconds: default_time_step_seconds(),
            initial_radius_km: default_initial_radius_km(),
            victim_profile: None,
            environment: None,
        }
    }

    pub fn total_steps(&self) -> u64 {
        (self.duration_hours * 3600.0 / self.time_step_seconds).round() as u64
    }
}

// ── Snapshots & run statistics ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct EnsembleCounts {
    pub active: usize,
    pub beached: usize,
    pub total: usize,
}

/// Hourly state of the particle cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSnapshot {
    pub time_seconds: u64,
    pub hour: u32,
    pub counts: EnsembleCounts,
    /// Centroid of active particles; absent when none remain active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
    pub particles: Vec<ParticleFix>,
    /// Set when any geodata for this step came from conservative fallbacks.
    #[serde(default)]
    pub synthetic_geo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeachingRecord {
    pub lat: f64,
    pub lng: f64,
    pub time_seconds: u64,
    pub hour: u32,
    pub depth_m: f64,
    pub shore_kind: ShoreKind,
    pub effects: Vec<SurfEffect>,
    /// Substrate permeability — high values mean the shore retains the object.
    pub permeability: f64,
}

/// Counters accumulated across the whole run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriftStats {
    pub total_beached: usize,
    pub shallow_water_encounters: u64,
    pub surf_zone_encounters: u64,
    pub land_exclusions: u64,
    pub reflections: u64,
    /// Dispersion-solver runs that fell back to the deep-water wavenumber.
    pub dispersion_fallbacks: u64,
    /// Per-particle steps skipped after a non-finite displacement.
    pub physics_incidents: u64,
    /// Geodata lookups answered from conservative synthetic defaults.
    pub synthetic_geo_lookups: u64,
    pub beachings: Vec<BeachingRecord>,
}

// ── Analysis products ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityCell {
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    /// count / max(count) over all occupied cells, in (0, 1].
    pub weight: f64,
    pub particle_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatMap {
    pub cell_size_deg: f64,
    pub max_count: usize,
    pub cells: Vec<DensityCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentZone {
    /// Containment level, e.g. 0.5, 0.9, 0.95.
    pub level: f64,
    /// Convex polygon, counter-clockwise, no closing repeat of the first vertex.
    pub polygon: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<GeoPoint>,
    pub zones: Vec<ContainmentZone>,
    /// clamp(0, 1, 1 − σ/(μ+1)) of the distance-to-centroid distribution.
    pub confidence: f64,
}

// ── API payloads ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Running,
    Completed,
    Stopped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    pub status: SimulationStatus,
    /// 0–100.
    pub progress: u8,
    pub start_time: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate results, available once a run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survival: Option<SurvivalEstimate>,
    pub containment: ContainmentReport,
    pub heat_map: HeatMap,
    pub stats: DriftStats,
    pub snapshots: Vec<DriftSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_wire_identifiers() {
        let cases = [
            (ObjectType::PersonInWater, "\"person-in-water\""),
            (ObjectType::PersonWithPfd, "\"person-with-pfd\""),
            (ObjectType::LifeRaft4, "\"life-raft-4\""),
            (ObjectType::LifeRaft10Plus, "\"life-raft-10-plus\""),
            (ObjectType::WoodDebris, "\"wood-debris\""),
        ];
        for (ty, wire) in cases {
            assert_eq!(serde_json::to_string(&ty).unwrap(), wire);
            assert_eq!(serde_json::from_str::<ObjectType>(wire).unwrap(), ty);
        }
    }

    #[test]
    fn config_defaults_fill_in() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"lkp": {"lat": 29.3, "lng": -94.8}}"#).unwrap();
        assert_eq!(cfg.particle_count, 10_000);
        assert_eq!(cfg.duration_hours, 72.0);
        assert_eq!(cfg.time_step_seconds, 600.0);
        assert_eq!(cfg.object_type, ObjectType::PersonInWater);
        assert_eq!(cfg.total_steps(), 432);
    }

    #[test]
    fn hypothermia_stage_wire_identifiers() {
        assert_eq!(
            serde_json::to_string(&HypothermiaStage::ColdShock).unwrap(),
            "\"cold-shock\""
        );
        assert_eq!(
            serde_json::to_string(&HypothermiaStage::SwimFailure).unwrap(),
            "\"swim-failure\""
        );
    }
}
