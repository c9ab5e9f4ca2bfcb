use std::{path::PathBuf, sync::Arc};

use axum::{body::Body, http::{Request, StatusCode}};
use config::{File, FileFormat};
use referral_core::ReferralService;
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::ServerConfig;

#[test]
fn empty_file_yields_defaults() {
  let cfg = ServerConfig::load(File::from_str("", FileFormat::Toml)).unwrap();
  assert_eq!(cfg.host, "127.0.0.1");
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.database_path, PathBuf::from("referrals.db"));
  assert_eq!(cfg.busy_timeout_ms, 5_000);
}

#[test]
fn file_values_override_defaults() {
  let toml = r#"
    port = 9090
    database_path = "/var/lib/referrals/data.db"
  "#;
  let cfg = ServerConfig::load(File::from_str(toml, FileFormat::Toml)).unwrap();
  assert_eq!(cfg.port, 9090);
  assert_eq!(cfg.host, "127.0.0.1");
  assert_eq!(cfg.database_path, PathBuf::from("/var/lib/referrals/data.db"));
  assert_eq!(cfg.address(), "127.0.0.1:9090");
}

#[test]
fn missing_optional_file_is_fine() {
  let dir = TempDir::new().unwrap();
  let source = File::from(dir.path().join("absent.toml")).required(false);
  assert_eq!(ServerConfig::load(source).unwrap(), ServerConfig::default());
}

#[tokio::test]
async fn app_serves_health_from_configured_database() {
  let dir = TempDir::new().unwrap();
  let cfg = ServerConfig {
    database_path: dir.path().join("referrals.db"),
    busy_timeout_ms: 250,
    ..ServerConfig::default()
  };
  let db = cfg.open_database().await.unwrap();
  let router = referral_api::api_router(Arc::new(ReferralService::new(db)));

  let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
  let resp = router.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["status"], "ok");
}
