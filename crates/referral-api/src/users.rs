//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/upsert` | Body: `{"external_id":42}` |
//! | `GET`  | `/users/{external_id}/status` | 404 if the user is unknown |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
};
use referral_core::{
  ReferralService, RequestId,
  uow::Database,
  user::{ExternalId, User, UserStatus},
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
  pub external_id: ExternalId,
}

/// `POST /users/upsert`. Returns the existing or newly created user.
pub async fn upsert<D: Database>(
  State(service): State<Arc<ReferralService<D>>>,
  Extension(ctx): Extension<RequestId>,
  body: Result<Json<UpsertBody>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
  let Json(body) = body?;
  let user = service.upsert_user(&ctx, body.external_id).await?;
  Ok(Json(user))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `GET /users/{external_id}/status`
pub async fn status<D: Database>(
  State(service): State<Arc<ReferralService<D>>>,
  Extension(ctx): Extension<RequestId>,
  external_id: Result<Path<ExternalId>, PathRejection>,
) -> Result<Json<UserStatus>, ApiError> {
  let Path(external_id) = external_id?;
  let status = service.get_user_status(&ctx, external_id).await?;
  Ok(Json(status))
}
