//! drift.rs — Per-step drift calculators
//!
//! Each calculator is a pure map from a field sample and a step length in
//! hours to a km displacement in the local tangent plane. The driver sums
//! them; none of them mutate shared state, so one instance is safely shared
//! across every particle in a step.

use crate::geo::{knots_to_kmh, KmVector};
use drift_types::{CurrentConditions, ObjectType, WaveConditions, WindConditions};
use rand::Rng;

// ── Wind ──────────────────────────────────────────────────────────────────────

/// Direct wind forcing: a fixed fraction of the wind speed, downwind.
#[derive(Debug, Clone, Copy)]
pub struct WindDrift {
    pub factor: f64,
}

impl Default for WindDrift {
    fn default() -> Self {
        Self { factor: 0.03 }
    }
}

impl WindDrift {
    pub fn displacement(&self, wind: &WindConditions, dt_hours: f64) -> KmVector {
        let speed_kmh = self.factor * knots_to_kmh(wind.speed_kn);
        KmVector::toward(wind.direction_deg, speed_kmh * dt_hours)
    }
}

// ── Current ───────────────────────────────────────────────────────────────────

/// Surface-current advection.
#[derive(Debug, Clone, Copy)]
pub struct CurrentDrift {
    pub factor: f64,
}

impl Default for CurrentDrift {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl CurrentDrift {
    pub fn displacement(&self, current: &CurrentConditions, dt_hours: f64) -> KmVector {
        let speed_kmh = self.factor * knots_to_kmh(current.speed_kn);
        KmVector::toward(current.direction_deg, speed_kmh * dt_hours)
    }

    /// Depth-averaged current proxy: exponential decay over 50 m and an
    /// Ekman-style veer of 0.5° per meter of depth. Returns (speed kn, dir°).
    pub fn depth_averaged(current: &CurrentConditions, depth_m: f64) -> (f64, f64) {
        let speed = current.speed_kn * (-depth_m / 50.0).exp();
        let direction = (current.direction_deg + 0.5 * depth_m).rem_euclid(360.0);
        (speed, direction)
    }
}

// ── Waves (Stokes drift, deep water) ──────────────────────────────────────────

/// Deep-water Stokes transport with directional spreading.
#[derive(Debug, Clone, Copy)]
pub struct WaveDrift {
    pub stokes_coefficient: f64,
    pub spread_deg: f64,
}

impl Default for WaveDrift {
    fn default() -> Self {
        Self { stokes_coefficient: 0.01, spread_deg: 15.0 }
    }
}

impl WaveDrift {
    pub fn displacement(
        &self,
        waves: &WaveConditions,
        dt_hours: f64,
        rng: &mut impl Rng,
    ) -> KmVector {
        if waves.height_m <= 0.0 || waves.period_s <= 0.0 {
            return KmVector::zero();
        }
        let speed_kmh =
            waves.height_m * waves.height_m / waves.period_s * self.stokes_coefficient;
        let jitter = rng.gen_range(-self.spread_deg..=self.spread_deg);
        KmVector::toward(waves.direction_deg + jitter, speed_kmh * dt_hours)
    }
}

// ── Leeway ────────────────────────────────────────────────────────────────────

/// Object-specific wind response: fraction of wind speed, offset from the
/// downwind axis by a crosswind angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeewayCoefficients {
    pub downwind_factor: f64,
    pub crosswind_deg: f64,
}

/// Empirical leeway table by object type. Unknown objects behave like a
/// person in the water.
pub fn leeway_coefficients(object: ObjectType) -> LeewayCoefficients {
    let (downwind_factor, crosswind_deg) = match object {
        ObjectType::PersonInWater => (0.03, 15.0),
        ObjectType::PersonWithPfd => (0.04, 20.0),
        ObjectType::PersonInDrysuit => (0.05, 25.0),
        ObjectType::LifeRaft4 => (0.06, 10.0),
        ObjectType::LifeRaft6 => (0.065, 12.0),
        ObjectType::LifeRaft10Plus => (0.07, 15.0),
        ObjectType::SmallVessel => (0.05, 5.0),
        ObjectType::MediumVessel => (0.04, 3.0),
        ObjectType::Sailboat => (0.08, 20.0),
        ObjectType::Kayak => (0.045, 18.0),
        ObjectType::Canoe => (0.05, 20.0),
        ObjectType::Surfboard => (0.035, 25.0),
        ObjectType::Paddleboard => (0.04, 22.0),
        ObjectType::WoodDebris => (0.02, 30.0),
        ObjectType::PlasticDebris => (0.045, 25.0),
        ObjectType::Cooler => (0.055, 15.0),
    };
    LeewayCoefficients { downwind_factor, crosswind_deg }
}

#[derive(Debug, Clone, Copy)]
pub struct LeewayDrift {
    pub coefficients: LeewayCoefficients,
}

impl LeewayDrift {
    pub fn for_object(object: ObjectType) -> Self {
        Self { coefficients: leeway_coefficients(object) }
    }

    pub fn displacement(&self, wind: &WindConditions, dt_hours: f64) -> KmVector {
        let speed_kmh = self.coefficients.downwind_factor * knots_to_kmh(wind.speed_kn);
        KmVector::toward(
            wind.direction_deg + self.coefficients.crosswind_deg,
            speed_kmh * dt_hours,
        )
    }
}

// ── Diffusion ─────────────────────────────────────────────────────────────────

/// Isotropic random-walk dispersion standing in for unresolved turbulence.
#[derive(Debug, Clone, Copy)]
pub struct Diffusion {
    pub coefficient_km2_per_h: f64,
}

impl Default for Diffusion {
    fn default() -> Self {
        Self { coefficient_km2_per_h: 0.001 }
    }
}

impl Diffusion {
    pub fn displacement(&self, dt_hours: f64, rng: &mut impl Rng) -> KmVector {
        if self.coefficient_km2_per_h <= 0.0 {
            return KmVector::zero();
        }
        let magnitude =
            (self.coefficient_km2_per_h * dt_hours).sqrt() * rng.gen_range(0.0..1.0);
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        KmVector {
            north: angle.cos() * magnitude,
            east: angle.sin() * magnitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wind(speed_kn: f64, direction_deg: f64) -> WindConditions {
        WindConditions { speed_kn, direction_deg, gusts_kn: None }
    }

    #[test]
    fn wind_drift_is_three_percent_downwind() {
        let d = WindDrift::default().displacement(&wind(20.0, 0.0), 1.0);
        // 3% of 20 kn over one hour, due north
        assert!((d.north - 0.03 * 20.0 * 1.852).abs() < 1e-12);
        assert!(d.east.abs() < 1e-12);
    }

    #[test]
    fn current_drift_full_speed() {
        let c = CurrentConditions { speed_kn: 2.0, direction_deg: 90.0, variation_kn: 0.0 };
        let d = CurrentDrift::default().displacement(&c, 0.5);
        assert!((d.east - 2.0 * 1.852 * 0.5).abs() < 1e-12);
        assert!(d.north.abs() < 1e-9);
    }

    #[test]
    fn depth_averaged_decays_and_veers() {
        let c = CurrentConditions { speed_kn: 2.0, direction_deg: 10.0, variation_kn: 0.0 };
        let (speed, dir) = CurrentDrift::depth_averaged(&c, 50.0);
        assert!((speed - 2.0 * (-1.0f64).exp()).abs() < 1e-12);
        assert!((dir - 35.0).abs() < 1e-12);
    }

    #[test]
    fn wave_drift_spreads_around_wave_direction() {
        let waves = WaveConditions {
            height_m: 2.0,
            period_s: 8.0,
            direction_deg: 180.0,
            shore_normal_deg: None,
        };
        let calc = WaveDrift::default();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let d = calc.displacement(&waves, 1.0, &mut rng);
            let heading = d.east.atan2(d.north).to_degrees().rem_euclid(360.0);
            assert!(
                (heading - 180.0).abs() <= 15.0 + 1e-9,
                "spread outside ±15°: {heading}"
            );
        }
    }

    #[test]
    fn leeway_table_covers_all_types_and_defaults() {
        let pw = leeway_coefficients(ObjectType::PersonInWater);
        assert_eq!(pw, LeewayCoefficients { downwind_factor: 0.03, crosswind_deg: 15.0 });
        let raft = leeway_coefficients(ObjectType::LifeRaft10Plus);
        assert_eq!(raft, LeewayCoefficients { downwind_factor: 0.07, crosswind_deg: 15.0 });
        let sail = leeway_coefficients(ObjectType::Sailboat);
        assert!(sail.downwind_factor > raft.downwind_factor);
    }

    #[test]
    fn zero_diffusion_moves_nothing() {
        let calm = Diffusion { coefficient_km2_per_h: 0.0 };
        let mut rng = rand::thread_rng();
        let d = calm.displacement(1.0, &mut rng);
        assert_eq!(d, KmVector::zero());
    }

    #[test]
    fn diffusion_bounded_by_step_scale() {
        let diff = Diffusion::default();
        let mut rng = rand::thread_rng();
        let bound = (0.001f64 * 1.0).sqrt();
        for _ in 0..500 {
            assert!(diff.displacement(1.0, &mut rng).magnitude() <= bound + 1e-12);
        }
    }
}
