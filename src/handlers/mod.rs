pub mod health;
pub mod seed;

use crate::errors::ServiceError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

/// Renders a failure with the error's status, optionally exposing the cause chain.
pub(crate) fn failure(err: ServiceError, message: &str, expose_details: bool) -> Response {
    let status = err.status_code();
    (status, Json(err.to_error_response(message, expose_details))).into_response()
}
