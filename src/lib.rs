//! fleet-seeder
//!
//! Provisions and populates a transportation-management store with
//! internally consistent synthetic organizations, fleet assets, drivers and
//! loads.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod seeding;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::seeding::SeedingOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub orchestrator: Arc<SeedingOrchestrator>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config,
            orchestrator: Arc::new(SeedingOrchestrator::new()),
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/seed", post(handlers::seed::run_seed))
        .route("/seed/backfill", post(handlers::seed::run_backfill))
}

/// Full application router with tracing, and permissive CORS in development.
pub fn app_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http());

    if state.config.is_development() {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}
