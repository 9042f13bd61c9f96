//! Common test utilities for integration tests
//!
//! Tests run against the in-memory document store and locally-signed
//! tokens, so no external services are needed. Gateway-facing tests point
//! the analysis base URL at a wiremock server; everything else uses an
//! unreachable address, which exercises the fallback paths.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use metrics_exporter_prometheus::PrometheusBuilder;
use nutrilens_backend::{
    auth::Claims,
    config::{AiConfig, AppConfig, AuthConfig, ServerConfig, StoreBackend, StoreConfig},
    gateway::FoodAnalysisGateway,
    routes,
    state::AppState,
    store::MemoryStore,
};
use secrecy::SecretString;
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
}

impl TestApp {
    /// App with no reachable analysis backend; summarization falls back
    pub fn new() -> Self {
        Self::with_gateway_url("http://127.0.0.1:1".to_string())
    }

    /// App whose analysis gateway talks to the given base URL
    pub fn with_gateway_url(base_url: String) -> Self {
        let config = test_config(base_url.clone());
        let gateway = Arc::new(FoodAnalysisGateway::new(
            base_url,
            SecretString::new("test-key".to_string()),
            "gemini-2.0-flash-exp".to_string(),
        ));
        // A per-test recorder handle; the global recorder is not installed
        let metrics = PrometheusBuilder::new().build_recorder().handle();

        let state = AppState::new(Arc::new(MemoryStore::new()), config, gateway, metrics);
        let app = routes::create_router(state);

        Self { app }
    }

    /// A signed token for the given uid
    pub fn token(&self, uid: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: uid.to_string(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::String(
                String::from_utf8_lossy(&body).into_owned(),
            ))
        };
        (status, json)
    }
}

fn test_config(ai_base_url: String) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            url: String::new(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
        },
        ai: AiConfig {
            base_url: ai_base_url,
            api_key: "test-key".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
        },
    }
}
