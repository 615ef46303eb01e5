//! Mock Google OAuth token endpoint and Cloud Text-to-Speech API
//!
//! The token endpoint hands out a fixed access token for any well-formed
//! JWT-bearer assertion; `text:synthesize` only accepts that token.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Form, Json, Router, routing};
use base64::Engine as _;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const ACCESS_TOKEN: &str = "ya29.mock-access-token";

const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/service_account_key.pem");

pub struct MockGoogle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    audio: &'static [u8],
    token_count: AtomicU32,
    synthesis_count: AtomicU32,
    last_body: Mutex<Option<serde_json::Value>>,
}

#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
    assertion: String,
}

impl MockGoogle {
    /// Start a mock that synthesizes `audio` for every valid request
    pub async fn start(audio: &'static [u8]) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            audio,
            token_count: AtomicU32::new(0),
            synthesis_count: AtomicU32::new(0),
            last_body: Mutex::new(None),
        });

        let app = Router::new()
            .route("/token", routing::post(handle_token))
            .route("/v1/text:synthesize", routing::post(handle_synthesize))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to put in the provider's `base_url` setting
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    /// Write a service-account key file whose `token_uri` points at this mock
    pub fn write_service_account(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join("service-account.json");
        let key = serde_json::json!({
            "type": "service_account",
            "project_id": "saythis-test",
            "private_key_id": "test-key-1",
            "private_key": PRIVATE_KEY_PEM,
            "client_email": "tts@saythis-test.iam.gserviceaccount.com",
            "token_uri": self.token_uri(),
        });

        std::fs::write(&path, serde_json::to_string_pretty(&key)?)?;

        Ok(path)
    }

    pub fn token_count(&self) -> u32 {
        self.state.token_count.load(Ordering::Relaxed)
    }

    pub fn synthesis_count(&self) -> u32 {
        self.state.synthesis_count.load(Ordering::Relaxed)
    }

    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

impl Drop for MockGoogle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_token(State(state): State<Arc<MockState>>, Form(request): Form<TokenRequest>) -> impl IntoResponse {
    state.token_count.fetch_add(1, Ordering::Relaxed);

    let well_formed = request.grant_type == "urn:ietf:params:oauth:grant-type:jwt-bearer"
        && request.assertion.split('.').count() == 3;

    if !well_formed {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid_grant", "error_description": "Invalid JWT Signature." })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer",
        })),
    )
}

async fn handle_synthesize(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.synthesis_count.fetch_add(1, Ordering::Relaxed);
    *state.last_body.lock().unwrap() = Some(body.clone());

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"));

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": { "code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED" }
            })),
        );
    }

    if body.pointer("/voice/name").and_then(serde_json::Value::as_str) == Some("en-US-Missing") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": { "code": 400, "message": "Voice 'en-US-Missing' does not exist.", "status": "INVALID_ARGUMENT" }
            })),
        );
    }

    let audio_content = base64::engine::general_purpose::STANDARD.encode(state.audio);

    (StatusCode::OK, Json(serde_json::json!({ "audioContent": audio_content })))
}
