//! JSON REST API for the referral service.
//!
//! Exposes an axum [`Router`] backed by any [`referral_core::uow::Database`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", referral_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod health;
pub mod referrals;
pub mod request_id;
pub mod users;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, post},
};
use referral_core::{ReferralService, uow::Database};

pub use error::ApiError;
pub use request_id::REQUEST_ID_HEADER;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type. Every response carries an `x-request-id` header and
/// every request runs inside a span recording it.
pub fn api_router<D>(service: Arc<ReferralService<D>>) -> Router<()>
where
  D: Database + 'static,
{
  Router::new()
    // Users
    .route("/users/upsert", post(users::upsert::<D>))
    .route("/users/{external_id}/status", get(users::status::<D>))
    // Referrals
    .route("/referrals", post(referrals::create::<D>))
    .route("/referrals/{referrer_external_id}/summary", get(referrals::summary::<D>))
    // Health
    .route("/health", get(health::handler::<D>))
    // Requests pass these outermost first: discard, set, propagate, trace, attach.
    .layer(middleware::map_request(request_id::attach_context))
    .layer(request_id::trace_layer())
    .layer(request_id::propagate_request_id_layer())
    .layer(request_id::set_request_id_layer())
    .layer(middleware::map_request(request_id::discard_malformed))
    .with_state(service)
}
