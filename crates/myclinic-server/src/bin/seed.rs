#![forbid(unsafe_code)]

//! Populates a clinic database with deterministic demo data.
//!
//! `MYCLINIC_DB` selects the target database (a file path, or `:memory:` for
//! a dry run); `MYCLINIC_SEED_PATIENTS`, `MYCLINIC_SEED_APPOINTMENTS`, and
//! `MYCLINIC_SEED` control volume and determinism.

use myclinic_server::seed::seed_demo_data;
use myclinic_store::{ClinicStore, MemoryStore, SqliteStore};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_spec = env::var("MYCLINIC_DB").unwrap_or_else(|_| "myclinic.sqlite".to_string());
    let patients = env_usize("MYCLINIC_SEED_PATIENTS", 50);
    let appointments = env_usize("MYCLINIC_SEED_APPOINTMENTS", 100);
    let seed = env_u64("MYCLINIC_SEED", 1);

    let store: Arc<dyn ClinicStore> = match db_spec.as_str() {
        ":memory:" => Arc::new(MemoryStore::new()),
        path => Arc::new(
            SqliteStore::open(Path::new(path)).map_err(|e| format!("open {path}: {e}"))?,
        ),
    };

    let summary = seed_demo_data(store.as_ref(), patients, appointments, seed)
        .map_err(|e| format!("seeding failed: {e}"))?;
    info!(
        db = %db_spec,
        patients = summary.patients,
        appointments = summary.appointments,
        seed,
        "demo data inserted"
    );
    Ok(())
}
