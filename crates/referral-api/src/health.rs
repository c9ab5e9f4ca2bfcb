//! Handler for `GET /health`.

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use referral_core::{ReferralService, RequestId, uow::Database};
use serde_json::{Value, json};

use crate::error::ApiError;

/// `GET /health`: 200 when a unit of work can be opened, 503 otherwise.
pub async fn handler<D: Database>(
  State(service): State<Arc<ReferralService<D>>>,
  Extension(ctx): Extension<RequestId>,
) -> Result<Json<Value>, ApiError> {
  service.health().await.inspect_err(|err| {
    tracing::warn!(request_id = %ctx, error = %err, "health check failed");
  })?;
  Ok(Json(json!({ "status": "ok" })))
}
