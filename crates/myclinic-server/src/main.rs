#![forbid(unsafe_code)]

use myclinic_server::{build_router, validate_startup_config, ApiConfig, AppState, UserAccount};
use myclinic_store::{ClinicStore, MemoryStore, SqliteStore};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

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

/// `MYCLINIC_USERS=alice=pw1,bob=pw2` and the same shape for admin accounts.
fn env_accounts(name: &str, is_admin: bool) -> Vec<UserAccount> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .filter_map(|item| {
            let (username, password) = item.split_once('=')?;
            let username = username.trim();
            let password = password.trim();
            if username.is_empty() || password.is_empty() {
                return None;
            }
            Some(UserAccount {
                username: username.to_string(),
                password: password.to_string(),
                is_admin,
            })
        })
        .collect()
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("MYCLINIC_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_store(spec: &str) -> Result<Arc<dyn ClinicStore>, String> {
    match spec {
        ":memory:" => Ok(Arc::new(MemoryStore::new())),
        path => SqliteStore::open(Path::new(path))
            .map(|store| Arc::new(store) as Arc<dyn ClinicStore>)
            .map_err(|e| format!("open store at {path}: {e}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("MYCLINIC_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let db_spec = env::var("MYCLINIC_DB").unwrap_or_else(|_| "myclinic.sqlite".to_string());

    let mut users = env_accounts("MYCLINIC_USERS", false);
    users.extend(env_accounts("MYCLINIC_ADMIN_USERS", true));

    let api = ApiConfig {
        max_body_bytes: env_usize("MYCLINIC_MAX_BODY_BYTES", 16 * 1024),
        session_ttl: Duration::from_secs(env_u64("MYCLINIC_SESSION_TTL_SECS", 8 * 60 * 60)),
        users,
    };
    validate_startup_config(&api)?;

    let store = open_store(&db_spec)?;
    let state = AppState::new(store, api);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!(%bind_addr, db = %db_spec, "myclinic-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
