//! Handlers for `/referrals` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/referrals` | Body: [`CreateBody`]; 201 when recorded, 200 on replay |
//! | `GET`  | `/referrals/{referrer_external_id}/summary` | Count plus newest five |
//!
//! `POST /referrals` upserts both users before recording the referral, all in
//! one unit of work.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use referral_core::{
  ReferralService, RequestId,
  referral::ReferralSummary,
  uow::Database,
  user::ExternalId,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub referrer_external_id: ExternalId,
  pub referred_external_id: ExternalId,
}

/// `POST /referrals` — returns the stored [`Referral`](referral_core::referral::Referral).
pub async fn create<D: Database>(
  State(service): State<Arc<ReferralService<D>>>,
  Extension(ctx): Extension<RequestId>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let outcome = service
    .register_referral(&ctx, body.referrer_external_id, body.referred_external_id)
    .await?;

  let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(outcome.referral)))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /referrals/{referrer_external_id}/summary`
pub async fn summary<D: Database>(
  State(service): State<Arc<ReferralService<D>>>,
  Extension(ctx): Extension<RequestId>,
  referrer: Result<Path<ExternalId>, PathRejection>,
) -> Result<Json<ReferralSummary>, ApiError> {
  let Path(referrer) = referrer?;
  let summary = service.get_referral_summary(&ctx, referrer).await?;
  Ok(Json(summary))
}
