// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use myclinic_store::ClinicStore;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

mod auth;
mod config;
mod http;
pub mod seed;

pub use auth::{Session, SessionStore, UserAccount};
pub use config::{validate_startup_config, ApiConfig};

pub const CRATE_NAME: &str = "myclinic-server";
pub const SESSION_COOKIE: &str = "myclinic_session";
pub const LOGIN_PATH: &str = "/login";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClinicStore>,
    pub sessions: Arc<SessionStore>,
    pub api: ApiConfig,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ClinicStore>, api: ApiConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(api.session_ttl));
        Self {
            store,
            sessions,
            api,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::landing_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/version", get(http::handlers::version_handler))
        .route("/login", post(http::handlers::login_handler))
        .route("/logout", post(http::handlers::logout_handler))
        .route(
            "/patients",
            get(http::handlers::patient_list_handler).post(http::handlers::patient_create_handler),
        )
        .route(
            "/patients/:id",
            get(http::handlers::patient_detail_handler)
                .post(http::handlers::patient_update_handler),
        )
        .route(
            "/patients/:id/delete",
            get(http::handlers::patient_delete_confirm_handler)
                .post(http::handlers::patient_delete_handler),
        )
        .route(
            "/appointments",
            get(http::handlers::appointment_list_handler)
                .post(http::handlers::appointment_create_handler),
        )
        .route(
            "/appointments/:id",
            get(http::handlers::appointment_detail_handler)
                .post(http::handlers::appointment_update_handler),
        )
        .route(
            "/appointments/:id/delete",
            get(http::handlers::appointment_delete_confirm_handler)
                .post(http::handlers::appointment_delete_handler),
        )
        .route("/admin/patients", get(http::admin::patient_list_handler))
        .route(
            "/admin/patients/:id",
            get(http::admin::patient_detail_handler).post(http::admin::patient_update_handler),
        )
        .route(
            "/admin/appointments",
            get(http::admin::appointment_list_handler),
        )
        .route(
            "/admin/appointments/:id",
            get(http::admin::appointment_detail_handler)
                .post(http::admin::appointment_update_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
