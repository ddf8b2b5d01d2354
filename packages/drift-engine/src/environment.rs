//! environment.rs — Environmental field sampling and evolution
//!
//! The driver samples wind, current, waves, and temperatures through the
//! [`EnvironmentalProvider`] trait. Operational deployments plug fetchers for
//! tide/current/buoy/weather services behind it; the bundled
//! [`SimulatedEnvironment`] evolves operator-entered seed conditions with the
//! same random-walk the live field exhibits between observations.

use drift_types::{
    CurrentConditions, EnvironmentSeed, EnvironmentalSnapshot, TidalConditions, WaveConditions,
    WindConditions,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Cache lifetimes for external providers, by feed kind. Fetch adapters are
/// expected to hold results at least this long before re-querying.
pub mod ttl {
    pub const TIDES_S: f64 = 15.0 * 60.0;
    pub const WATER_LEVEL_S: f64 = 3.0 * 60.0;
    pub const CURRENTS_S: f64 = 15.0 * 60.0;
    pub const BUOYS_S: f64 = 5.0 * 60.0;
    pub const WEATHER_S: f64 = 10.0 * 60.0;
}

/// A value refreshed at most once per TTL window of simulation time.
#[derive(Debug, Clone)]
pub struct TtlSlot<T> {
    value: Option<T>,
    refreshed_at_s: f64,
    ttl_s: f64,
}

impl<T> TtlSlot<T> {
    pub fn new(ttl_s: f64) -> Self {
        Self { value: None, refreshed_at_s: 0.0, ttl_s }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_stale(&self, now_s: f64) -> bool {
        self.value.is_none() || now_s - self.refreshed_at_s >= self.ttl_s
    }

    pub fn refresh(&mut self, now_s: f64, value: T) {
        self.value = Some(value);
        self.refreshed_at_s = now_s;
    }
}

// ── Provider trait ────────────────────────────────────────────────────────────

pub trait EnvironmentalProvider: Send {
    /// Field sample at a position and simulation time (seconds since start).
    fn conditions_at(&self, lat: f64, lng: f64, t_seconds: f64) -> EnvironmentalSnapshot;

    /// Evolve internal state up to `t_seconds`. Called once per time step,
    /// outside the per-particle hot loop.
    fn advance(&mut self, t_seconds: f64);
}

// ── Simulated environment ─────────────────────────────────────────────────────

/// Principal lunar semidiurnal (M2) tidal period.
const M2_PERIOD_S: f64 = 12.42 * 3600.0;

/// Stochastically evolving field seeded from observed conditions.
///
/// Per advance tick: wind direction walks ±5°, wind speed ±1 kn clamped to
/// [0, 40], current direction ±2.5°. Waves and temperatures hold their seed
/// values; the tidal phase follows the M2 period from phase 0 = low water.
pub struct SimulatedEnvironment {
    wind_speed_kn: f64,
    wind_direction_deg: f64,
    gusts_kn: f64,
    current_speed_kn: f64,
    current_direction_deg: f64,
    waves: WaveConditions,
    water_temp_f: f64,
    air_temp_f: f64,
    visibility_nm: f64,
    /// Shore orientation (direction toward shore, seaward normal), when the
    /// scenario has a coastline. Without it no tidal block is emitted.
    shore: Option<(f64, f64)>,
    tide: TtlSlot<TidalConditions>,
}

impl SimulatedEnvironment {
    pub fn new(seed: EnvironmentSeed) -> Self {
        Self {
            wind_speed_kn: seed.wind_speed_kn,
            wind_direction_deg: seed.wind_direction_deg,
            gusts_kn: seed.wind_speed_kn * 1.3,
            current_speed_kn: seed.current_speed_kn,
            current_direction_deg: seed.current_direction_deg,
            waves: WaveConditions {
                height_m: seed.wave_height_m,
                period_s: seed.wave_period_s,
                direction_deg: seed.wave_direction_deg,
                shore_normal_deg: None,
            },
            water_temp_f: seed.water_temp_f,
            air_temp_f: seed.air_temp_f,
            visibility_nm: 10.0,
            shore: None,
            tide: TtlSlot::new(ttl::TIDES_S),
        }
    }

    /// Attach a shoreline orientation so tidal conditions are reported.
    pub fn with_shore(mut self, shore_direction_deg: f64, shore_normal_deg: f64) -> Self {
        self.shore = Some((shore_direction_deg, shore_normal_deg));
        self.waves.shore_normal_deg = Some(shore_normal_deg);
        self
    }

    fn tidal_phase(t_seconds: f64) -> f64 {
        (t_seconds / M2_PERIOD_S).fract()
    }
}

impl EnvironmentalProvider for SimulatedEnvironment {
    fn conditions_at(&self, _lat: f64, _lng: f64, t_seconds: f64) -> EnvironmentalSnapshot {
        let tide = self.tide.get().copied().or_else(|| {
            self.shore.map(|(dir, normal)| TidalConditions {
                phase: Self::tidal_phase(t_seconds),
                shore_direction_deg: dir,
                shore_normal_deg: normal,
            })
        });

        EnvironmentalSnapshot {
            wind: WindConditions {
                speed_kn: self.wind_speed_kn,
                direction_deg: self.wind_direction_deg,
                gusts_kn: Some(self.gusts_kn),
            },
            current: CurrentConditions {
                speed_kn: self.current_speed_kn,
                direction_deg: self.current_direction_deg,
                variation_kn: self.current_speed_kn * 0.1,
            },
            waves: self.waves,
            water_temp_f: self.water_temp_f,
            air_temp_f: self.air_temp_f,
            visibility_nm: self.visibility_nm,
            sea_state: douglas_sea_state(self.waves.height_m),
            tide,
            bathymetry: None,
            rip_current: None,
        }
    }

    fn advance(&mut self, t_seconds: f64) {
        let mut rng = rand::thread_rng();

        self.wind_direction_deg =
            (self.wind_direction_deg + rng.gen_range(-5.0..=5.0)).rem_euclid(360.0);
        self.wind_speed_kn = (self.wind_speed_kn + rng.gen_range(-1.0..=1.0)).clamp(0.0, 40.0);
        let gust_noise = Normal::new(0.0, 1.5).unwrap();
        self.gusts_kn =
            (self.wind_speed_kn * 1.3 + gust_noise.sample(&mut rng)).max(self.wind_speed_kn);
        self.current_direction_deg =
            (self.current_direction_deg + rng.gen_range(-2.5..=2.5)).rem_euclid(360.0);

        if self.tide.is_stale(t_seconds) {
            if let Some((dir, normal)) = self.shore {
                self.tide.refresh(
                    t_seconds,
                    TidalConditions {
                        phase: Self::tidal_phase(t_seconds),
                        shore_direction_deg: dir,
                        shore_normal_deg: normal,
                    },
                );
            }
        }
    }
}

/// Douglas sea-state code (0–8) from significant wave height.
pub fn douglas_sea_state(height_m: f64) -> u8 {
    match height_m {
        h if h < 0.01 => 0,
        h if h < 0.1 => 1,
        h if h < 0.5 => 2,
        h if h < 1.25 => 3,
        h if h < 2.5 => 4,
        h if h < 4.0 => 5,
        h if h < 6.0 => 6,
        h if h < 9.0 => 7,
        _ => 8,
    }
}

/// A field with every forcing zeroed. Scenario baselines and tests.
pub struct CalmEnvironment {
    pub water_temp_f: f64,
}

impl Default for CalmEnvironment {
    fn default() -> Self {
        Self { water_temp_f: 68.0 }
    }
}

impl EnvironmentalProvider for CalmEnvironment {
    fn conditions_at(&self, _lat: f64, _lng: f64, _t_seconds: f64) -> EnvironmentalSnapshot {
        EnvironmentalSnapshot {
            wind: WindConditions { speed_kn: 0.0, direction_deg: 0.0, gusts_kn: None },
            current: CurrentConditions { speed_kn: 0.0, direction_deg: 0.0, variation_kn: 0.0 },
            waves: WaveConditions {
                height_m: 0.0,
                period_s: 8.0,
                direction_deg: 0.0,
                shore_normal_deg: None,
            },
            water_temp_f: self.water_temp_f,
            air_temp_f: self.water_temp_f,
            visibility_nm: 10.0,
            sea_state: 0,
            tide: None,
            bathymetry: None,
            rip_current: None,
        }
    }

    fn advance(&mut self, _t_seconds: f64) {}
}
