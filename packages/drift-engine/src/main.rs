//! main.rs — Offline SAR drift scenario runner
//!
//! Runs one simulation to completion from a TOML scenario file and writes
//! the aggregate results (survival, containment polygons, heat-map, beaching
//! statistics, hourly snapshots) as JSON on stdout. The HTTP backend drives
//! the same engine cooperatively; this binary exists for planning drills and
//! scenario tuning without a server.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;

use drift_engine::{
    validate_config, DriftDriver, SimulatedEnvironment, SyntheticGeoProvider, SyntheticShore,
};
use drift_types::{
    Clothing, EnvironmentSeed, GeoPoint, ObjectType, ShoreKind, SimulationConfig, VictimProfile,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "drift-sim", about = "SAR drift Monte-Carlo scenario runner")]
struct Args {
    /// Scenario file path
    #[arg(short, long, default_value = "scenario.toml")]
    config: String,
    /// Override particle count
    #[arg(long)]
    particles: Option<usize>,
    /// Override duration in hours
    #[arg(long)]
    hours: Option<f64>,
    /// Pretty-print the result JSON
    #[arg(long)]
    pretty: bool,
}

// ── Scenario file ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenario: ScenarioSection,
    #[serde(default)]
    environment: EnvironmentSeed,
    geodata: GeodataSection,
    victim: Option<VictimSection>,
}

#[derive(Debug, Deserialize)]
struct ScenarioSection {
    lat: f64,
    lng: f64,
    object_type: ObjectType,
    particle_count: usize,
    duration_hours: f64,
    time_step_seconds: f64,
    initial_radius_km: f64,
}

#[derive(Debug, Deserialize)]
struct GeodataSection {
    basin_depth_m: f64,
    /// Straight east-west shoreline north of the water, if any.
    shore_latitude: Option<f64>,
    shore_kind: Option<ShoreKind>,
}

#[derive(Debug, Deserialize)]
struct VictimSection {
    age: Option<u32>,
    has_pfd: bool,
    clothing: Option<Clothing>,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drift_sim=info,drift_engine=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../scenario.toml").to_string());
    let file: ScenarioFile =
        toml::from_str(&config_str).with_context(|| format!("invalid scenario {}", args.config))?;

    let mut config = SimulationConfig::new(GeoPoint::new(file.scenario.lat, file.scenario.lng));
    config.object_type = file.scenario.object_type;
    config.particle_count = args.particles.unwrap_or(file.scenario.particle_count);
    config.duration_hours = args.hours.unwrap_or(file.scenario.duration_hours);
    config.time_step_seconds = file.scenario.time_step_seconds;
    config.initial_radius_km = file.scenario.initial_radius_km;
    config.victim_profile = file.victim.map(|v| VictimProfile {
        age: v.age,
        gender: None,
        has_pfd: v.has_pfd,
        clothing: v.clothing,
    });
    validate_config(&config)?;

    let provider = match file.geodata.shore_latitude {
        Some(shore_lat) => {
            if shore_lat <= file.scenario.lat {
                bail!("shore_latitude must lie north of the LKP");
            }
            SyntheticGeoProvider::with_shore(
                file.geodata.basin_depth_m,
                SyntheticShore {
                    latitude_deg: shore_lat,
                    kind: file.geodata.shore_kind.unwrap_or_default(),
                },
            )
        }
        None => SyntheticGeoProvider::open_ocean(file.geodata.basin_depth_m),
    };

    let mut env = SimulatedEnvironment::new(file.environment);
    if provider.shore.is_some() {
        // Shore north of the basin: onshore is 0°, seaward normal 180°.
        env = env.with_shore(0.0, 180.0);
    }

    info!(
        "drift-sim — {:?} at ({:.4}, {:.4}), {} particles, {} h in {} s steps",
        config.object_type,
        config.lkp.lat,
        config.lkp.lng,
        config.particle_count,
        config.duration_hours,
        config.time_step_seconds
    );

    let mut driver = DriftDriver::new(config, Box::new(env), std::sync::Arc::new(provider));
    driver.run_to_completion();

    let stats = driver.stats();
    info!(
        "complete — beached {} of {}, {} shallow encounters, {} reflections",
        stats.total_beached,
        driver.ensemble().len(),
        stats.shallow_water_encounters,
        stats.reflections
    );
    if let Some(area) = drift_engine::density::active_search_area_km2(driver.ensemble()) {
        info!("active cloud spans {area:.1} km²");
    }

    let results = driver.results();
    let json = if args.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{json}");
    Ok(())
}
