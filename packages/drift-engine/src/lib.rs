//! # drift-engine
//!
//! Monte-Carlo particle drift core for search-and-rescue planning.
//!
//! From a Last Known Position the engine evolves a cloud of particles under
//! wind, current, wave, and leeway forcing; below 20 m of water a
//! shallow-water sub-model adds bottom friction, finite-depth Stokes
//! transport, surf-zone processes, and shore interaction. The resulting
//! cloud feeds a density heat-map, containment-probability polygons, and a
//! survival assessment.
//!
//! The `drift-sim` binary in this package runs one scenario offline from a
//! TOML config; the HTTP backend drives the same [`driver::DriftDriver`]
//! cooperatively.

pub mod containment;
pub mod density;
pub mod drift;
pub mod driver;
pub mod ensemble;
pub mod environment;
pub mod error;
pub mod geo;
pub mod geodata;
pub mod shallow;
pub mod survival;

pub use driver::DriftDriver;
pub use ensemble::ParticleEnsemble;
pub use environment::{EnvironmentalProvider, SimulatedEnvironment};
pub use error::{validate_config, ConfigError};
pub use geodata::{GeoProvider, GeodataAdapter, SyntheticGeoProvider, SyntheticShore};
