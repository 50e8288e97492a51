//! Test helper module for partner-service integration tests.
//!
//! Builds the full router over `MemoryStore` and a `FixedClock` so requests
//! can be driven with `oneshot` without any external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use partner_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, JwtConfig, PartnerApiConfig, PartnerConfig, SecurityConfig,
        SwaggerConfig, SwaggerMode,
    },
    models::{AuditEntry, MembershipStatus, WorkerRecord},
    services::{metrics::init_metrics, AuditRecorder, FixedClock, MemoryStore},
    utils::Password,
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "s3cure-Admin!";
pub const JWT_SECRET: &str = "integration-test-secret-long-enough-for-prod";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn test_config(swagger: SwaggerMode) -> PartnerConfig {
    PartnerConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "partner-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new(JWT_SECRET.to_string()),
            issuer: "partner-service".to_string(),
            admin_token_expiry_minutes: 60,
        },
        partner: PartnerApiConfig {
            api_key_header: API_KEY_HEADER.to_string(),
            audit_queue_capacity: 64,
            contract_utc_offset_hours: 7,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig { enabled: swagger },
        bootstrap_admin: None,
    }
}

/// Worker used across the checking scenarios.
pub fn ana() -> WorkerRecord {
    WorkerRecord {
        nik: "3174091201900001".to_string(),
        nama: "Ana".to_string(),
        tanggal_lahir: date(1990, 1, 12),
        alamat: Some("Jl. Melati No. 5, Jakarta".to_string()),
        status_kepesertaan: MembershipStatus::Aktif,
        updated_at: Utc::now(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub clock: FixedClock,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub async fn spawn(today: NaiveDate) -> Self {
        Self::spawn_with(today, SwaggerMode::Disabled).await
    }

    pub async fn spawn_with(today: NaiveDate, swagger: SwaggerMode) -> Self {
        init_metrics().expect("metrics");

        let store = MemoryStore::new();
        store.insert_worker(ana());
        let clock = FixedClock::on(today);
        let shutdown = CancellationToken::new();
        let (audit, _writer) = AuditRecorder::spawn(Arc::new(store.clone()), 64, shutdown.clone());

        let state = AppState::new(
            test_config(swagger),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            audit,
        )
        .expect("app state");

        state
            .sessions
            .ensure_superadmin(ADMIN_USERNAME, Password::new(ADMIN_PASSWORD.to_string()))
            .await
            .expect("bootstrap admin");

        let router = build_router(state).await.expect("router");

        Self {
            router,
            store,
            clock,
            shutdown,
        }
    }

    /// Send one request and decode the JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/auth/admin/login",
                &[],
                Some(serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub async fn admin(
        &self,
        token: &str,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = format!("Bearer {}", token);
        self.send(method, uri, &[("authorization", auth.as_str())], body)
            .await
    }

    /// Create a partner and return `(partner_id, api_key)`.
    pub async fn create_partner(&self, token: &str, body: Value) -> (String, String) {
        let (status, response) = self.admin(token, "POST", "/admin/partners", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", response);
        let data = &response["data"];
        (
            data["partner"]["id"].as_str().expect("id").to_string(),
            data["api_key"].as_str().expect("api_key").to_string(),
        )
    }

    pub async fn check(
        &self,
        api_key: Option<&str>,
        nik: &str,
        tanggal_lahir: &str,
    ) -> (StatusCode, Value) {
        let headers: Vec<(&str, &str)> = api_key
            .map(|key| vec![(API_KEY_HEADER, key)])
            .unwrap_or_default();
        self.send(
            "POST",
            "/api/checking",
            &headers,
            Some(serde_json::json!({ "nik": nik, "tanggal_lahir": tanggal_lahir })),
        )
        .await
    }

    /// Audit writes are asynchronous; poll until `count` entries exist.
    pub async fn wait_for_audit(&self, count: usize) -> Vec<AuditEntry> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let entries = self.store.audit_entries();
            if entries.len() >= count || tokio::time::Instant::now() >= deadline {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
