use super::failure;
use crate::seeding::backfill::BackfillReport;
use crate::seeding::{SeedPlan, SeedSummary};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub success: bool,
    pub message: String,
    pub run_id: Uuid,
    pub rng_seed: u64,
    pub elapsed_ms: u64,
    pub summary: SeedSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub success: bool,
    pub message: String,
    pub updated: BackfillReport,
}

/// `POST /api/v1/seed`: reset the store and seed it with the configured volumes.
#[instrument(skip(state))]
pub async fn run_seed(State(state): State<AppState>) -> Response {
    let expose = state.config.expose_error_details;
    let plan = match SeedPlan::try_from(&state.config.seed) {
        Ok(plan) => plan,
        Err(err) => return failure(err, "Invalid seed configuration", expose),
    };

    match state.orchestrator.run(&state.db, &plan, Utc::now()).await {
        Ok(outcome) => {
            let s = &outcome.summary;
            let message = format!(
                "Seeded {} companies, {} terminals, {} trucks, {} drivers, {} trailers and {} loads",
                s.companies, s.terminals, s.trucks, s.drivers, s.trailers, s.loads
            );
            info!(run_id = %outcome.run_id, "{}", message);
            (
                StatusCode::OK,
                Json(SeedResponse {
                    success: true,
                    message,
                    run_id: outcome.run_id,
                    rng_seed: outcome.rng_seed,
                    elapsed_ms: outcome.elapsed_ms,
                    summary: outcome.summary,
                }),
            )
                .into_response()
        }
        Err(err) => failure(err, "Seeding failed", expose),
    }
}

/// `POST /api/v1/seed/backfill`: attach terminals to rows that have none.
#[instrument(skip(state))]
pub async fn run_backfill(State(state): State<AppState>) -> Response {
    match state.orchestrator.backfill(&state.db).await {
        Ok(report) => (
            StatusCode::OK,
            Json(BackfillResponse {
                success: true,
                message: format!("Backfilled {} rows", report.total()),
                updated: report,
            }),
        )
            .into_response(),
        Err(err) => failure(err, "Backfill failed", state.config.expose_error_details),
    }
}
