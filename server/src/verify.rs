//! Public verification calls.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::info;

use crate::{AppState, internal_error};

pub(crate) async fn handle(state: Arc<AppState>, origin: String, key: Option<String>) -> Response {
    let verifier = state.verifier.clone();
    let outcome =
        tokio::task::spawn_blocking(move || verifier.verify(&origin, key.as_deref(), Utc::now()))
            .await;

    let verification = match outcome {
        Ok(Ok(verification)) => verification,
        Ok(Err(e)) => return internal_error(e),
        Err(e) => return internal_error(e),
    };

    info!(
        "Verify from {} -> {}",
        verification.log.source_url, verification.status_code
    );
    let status =
        StatusCode::from_u16(verification.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(verification.body)).into_response()
}
