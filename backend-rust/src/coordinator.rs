//! coordinator.rs — Simulation registry and cooperative run loop
//!
//! Each started simulation gets a uuid, an entry in the shared registry, and
//! its own tokio task. The task owns the drift driver outright; the registry
//! entry only mirrors status, progress, snapshots, and final results, so API
//! reads never contend with the physics. The run loop yields to the
//! scheduler every ten steps and checks for a stop request before each step.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use drift_engine::{
    geodata::NullGeoProvider, validate_config, ConfigError, DriftDriver, SimulatedEnvironment,
};
use drift_types::{
    DriftSnapshot, SimulationConfig, SimulationResults, SimulationStatus, StatusReport,
};

/// Steps between scheduler yields in the run loop.
const YIELD_EVERY_STEPS: u64 = 10;

// ── Run state ─────────────────────────────────────────────────────────────────

pub struct SimulationRun {
    pub id: String,
    pub config: SimulationConfig,
    pub status: SimulationStatus,
    pub progress: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub snapshots: Vec<DriftSnapshot>,
    pub results: Option<SimulationResults>,
    stop_requested: bool,
}

impl SimulationRun {
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            start_time: self.start_time,
            end_time: self.end_time,
            error: self.error.clone(),
        }
    }

    /// The snapshot lying exactly on `hour`, if recorded.
    pub fn snapshot_at_hour(&self, hour: u32) -> Option<&DriftSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.hour == hour && s.time_seconds == hour as u64 * 3600)
    }
}

pub type SharedRun = Arc<RwLock<SimulationRun>>;

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SimulationRegistry {
    runs: Arc<RwLock<HashMap<String, SharedRun>>>,
}

pub struct StartReceipt {
    pub simulation_id: String,
    /// Coarse wall-clock estimate, seconds. Advisory only.
    pub estimated_duration_s: f64,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, register, and launch a simulation task.
    pub async fn start(&self, config: SimulationConfig) -> Result<StartReceipt, ConfigError> {
        validate_config(&config)?;

        let id = Uuid::new_v4().to_string();
        let run: SharedRun = Arc::new(RwLock::new(SimulationRun {
            id: id.clone(),
            config: config.clone(),
            status: SimulationStatus::Running,
            progress: 0,
            start_time: Utc::now(),
            end_time: None,
            error: None,
            snapshots: Vec::new(),
            results: None,
            stop_requested: false,
        }));
        self.runs.write().await.insert(id.clone(), run.clone());

        let total_steps = config.total_steps();
        let particle_steps = total_steps as f64 * config.particle_count as f64;

        let task_run = run.clone();
        let handle = tokio::spawn(run_simulation(task_run, config));

        // Supervisor: a panicked or aborted task must not leave the run
        // stuck in `running`.
        let watch_run = run.clone();
        tokio::spawn(async move {
            if let Err(join_err) = handle.await {
                let mut w = watch_run.write().await;
                if w.status == SimulationStatus::Running {
                    error!("simulation {} task died: {join_err}", w.id);
                    w.status = SimulationStatus::Failed;
                    w.error = Some(join_err.to_string());
                    w.end_time = Some(Utc::now());
                }
            }
        });

        info!("simulation {id} started — {total_steps} steps");
        Ok(StartReceipt {
            simulation_id: id,
            estimated_duration_s: (particle_steps / 5e7).max(1.0),
        })
    }

    pub async fn get(&self, id: &str) -> Option<SharedRun> {
        self.runs.read().await.get(id).cloned()
    }

    pub async fn status(&self, id: &str) -> Option<StatusReport> {
        let run = self.get(id).await?;
        let guard = run.read().await;
        Some(guard.status_report())
    }

    pub async fn list(&self) -> Vec<StatusReport> {
        let runs: Vec<SharedRun> = self.runs.read().await.values().cloned().collect();
        let mut reports = Vec::with_capacity(runs.len());
        for run in runs {
            reports.push(run.read().await.status_report());
        }
        reports.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        reports
    }

    /// Request a stop. Idempotent; a finished run is left untouched.
    pub async fn stop(&self, id: &str) -> Option<StatusReport> {
        let run = self.get(id).await?;
        let mut guard = run.write().await;
        if guard.status == SimulationStatus::Running {
            guard.stop_requested = true;
        }
        Some(guard.status_report())
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.runs.write().await.remove(id) {
            Some(run) => {
                // A still-running task will observe the stop flag and wind down.
                run.write().await.stop_requested = true;
                true
            }
            None => false,
        }
    }
}

// ── Run loop ──────────────────────────────────────────────────────────────────

async fn run_simulation(run: SharedRun, config: SimulationConfig) {
    let seed = config.environment.unwrap_or_default();
    let env = SimulatedEnvironment::new(seed);
    // No geodata source is wired by default: the adapter degrades every
    // lookup to conservative synthetic values and flags the snapshots.
    let mut driver = DriftDriver::new(config.clone(), Box::new(env), Arc::new(NullGeoProvider));

    let total_steps = config.total_steps().max(1);
    let dt = config.time_step_seconds;

    for n in 0..total_steps {
        // Cancellation is checked before each step.
        let stop_requested = run.read().await.stop_requested;
        if stop_requested {
            let mut w = run.write().await;
            w.status = SimulationStatus::Stopped;
            w.end_time = Some(Utc::now());
            info!("simulation {} stopped at step {n}/{total_steps}", w.id);
            return;
        }

        driver.step(dt);

        {
            let mut w = run.write().await;
            w.progress = (((n + 1) * 100) / total_steps) as u8;
            let published = w.snapshots.len();
            if driver.snapshots().len() > published {
                w.snapshots
                    .extend_from_slice(&driver.snapshots()[published..]);
            }
        }

        if (n + 1) % YIELD_EVERY_STEPS == 0 {
            tokio::task::yield_now().await;
        }
    }

    let results = driver.results();
    let mut w = run.write().await;
    w.progress = 100;
    w.status = SimulationStatus::Completed;
    w.end_time = Some(Utc::now());
    let published = w.snapshots.len();
    if driver.snapshots().len() > published {
        w.snapshots
            .extend_from_slice(&driver.snapshots()[published..]);
    }
    w.results = Some(results);
    info!(
        "simulation {} completed — {} beached of {}",
        w.id,
        driver.stats().total_beached,
        driver.ensemble().len()
    );
}
