//! error.rs — Configuration validation
//!
//! Physics failures never surface here: they are contained per particle and
//! counted in the run statistics. What can fail up front is the
//! configuration, and that refuses to start.

use drift_types::{SimulationConfig, PARTICLE_COUNT_CAP};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LKP latitude {0} outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("LKP longitude {0} outside [-180, 180]")]
    InvalidLongitude(f64),
    #[error("duration must be positive, got {0} h")]
    NonPositiveDuration(f64),
    #[error("time step must be positive, got {0} s")]
    NonPositiveTimeStep(f64),
    #[error("particle count must be within 1..={cap}, got {0}", cap = PARTICLE_COUNT_CAP)]
    ParticleCountOutOfRange(usize),
    #[error("initial spread radius must be positive, got {0} km")]
    NonPositiveRadius(f64),
}

pub fn validate_config(cfg: &SimulationConfig) -> Result<(), ConfigError> {
    if !cfg.lkp.lat.is_finite() || cfg.lkp.lat.abs() > 90.0 {
        return Err(ConfigError::InvalidLatitude(cfg.lkp.lat));
    }
    if !cfg.lkp.lng.is_finite() || cfg.lkp.lng.abs() > 180.0 {
        return Err(ConfigError::InvalidLongitude(cfg.lkp.lng));
    }
    if !(cfg.duration_hours > 0.0) {
        return Err(ConfigError::NonPositiveDuration(cfg.duration_hours));
    }
    if !(cfg.time_step_seconds > 0.0) {
        return Err(ConfigError::NonPositiveTimeStep(cfg.time_step_seconds));
    }
    if cfg.particle_count == 0 || cfg.particle_count > PARTICLE_COUNT_CAP {
        return Err(ConfigError::ParticleCountOutOfRange(cfg.particle_count));
    }
    if !(cfg.initial_radius_km > 0.0) {
        return Err(ConfigError::NonPositiveRadius(cfg.initial_radius_km));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_types::GeoPoint;

    #[test]
    fn rejects_out_of_range_lkp() {
        let cfg = SimulationConfig::new(GeoPoint::new(91.0, 0.0));
        assert!(matches!(validate_config(&cfg), Err(ConfigError::InvalidLatitude(_))));
        let cfg = SimulationConfig::new(GeoPoint::new(0.0, 200.0));
        assert!(matches!(validate_config(&cfg), Err(ConfigError::InvalidLongitude(_))));
    }

    #[test]
    fn rejects_nan_lkp() {
        let cfg = SimulationConfig::new(GeoPoint::new(f64::NAN, 0.0));
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_degenerate_run_parameters() {
        let mut cfg = SimulationConfig::new(GeoPoint::new(29.3, -94.8));
        cfg.duration_hours = 0.0;
        assert!(matches!(validate_config(&cfg), Err(ConfigError::NonPositiveDuration(_))));

        let mut cfg = SimulationConfig::new(GeoPoint::new(29.3, -94.8));
        cfg.particle_count = PARTICLE_COUNT_CAP + 1;
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::ParticleCountOutOfRange(_))
        ));
    }

    #[test]
    fn accepts_the_defaults() {
        let cfg = SimulationConfig::new(GeoPoint::new(29.3, -94.8));
        assert!(validate_config(&cfg).is_ok());
    }
}
