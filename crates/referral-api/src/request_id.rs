//! `x-request-id` handling.
//!
//! tower-http sets the header when the caller sent none and copies it onto the
//! response. Around that, a malformed inbound id is dropped so a fresh one is
//! generated, and the final id is handed to handlers as an
//! [`Extension<RequestId>`](axum::Extension) and recorded on the request span.

use axum::{
  extract::Request,
  http::{self, HeaderName, HeaderValue},
};
use referral_core::RequestId;
use tower_http::{
  classify::{ServerErrorsAsFailures, SharedClassifier},
  request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId as HeaderRequestId, SetRequestIdLayer,
  },
  trace::{MakeSpan, TraceLayer},
};
use tracing::{Span, info_span};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Generates ids for requests that arrive without one.
#[derive(Clone, Default)]
pub struct GenerateRequestId;

impl MakeRequestId for GenerateRequestId {
  fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<HeaderRequestId> {
    let value = HeaderValue::from_str(RequestId::generate().as_str()).ok()?;
    Some(HeaderRequestId::new(value))
  }
}

pub fn set_request_id_layer() -> SetRequestIdLayer<GenerateRequestId> {
  SetRequestIdLayer::x_request_id(GenerateRequestId)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
  PropagateRequestIdLayer::x_request_id()
}

pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
  TraceLayer::new_for_http().make_span_with(RequestSpan)
}

#[derive(Clone, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
  fn make_span(&mut self, req: &http::Request<B>) -> Span {
    let request_id = req
      .headers()
      .get(&REQUEST_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .unwrap_or("-");
    info_span!(
      "http_request",
      method = %req.method(),
      uri = %req.uri(),
      request_id = %request_id
    )
  }
}

/// Remove an inbound id that [`RequestId::parse`] would not keep verbatim.
pub async fn discard_malformed(mut req: Request) -> Request {
  let malformed = req.headers().get(&REQUEST_ID_HEADER).is_some_and(|value| {
    !value
      .to_str()
      .ok()
      .and_then(|raw| RequestId::parse(raw).filter(|id| id.as_str() == raw))
      .is_some()
  });
  if malformed {
    req.headers_mut().remove(&REQUEST_ID_HEADER);
  }
  req
}

/// Expose the id set by [`SetRequestIdLayer`] as a [`RequestId`] extension.
pub async fn attach_context(mut req: Request) -> Request {
  let ctx = req
    .extensions()
    .get::<HeaderRequestId>()
    .and_then(|id| id.header_value().to_str().ok())
    .and_then(RequestId::parse)
    .unwrap_or_else(RequestId::generate);
  req.extensions_mut().insert(ctx);
  req
}
