//! Mock ElevenLabs API for integration tests
//!
//! Streams canned audio chunks from the text-to-speech endpoint and answers
//! the subscription endpoint with a fixed quota. Failure modes are chosen at
//! start-up.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// How the text-to-speech endpoint answers
#[derive(Clone)]
pub enum Behavior {
    /// Stream these chunks and finish cleanly
    Stream(Vec<&'static [u8]>),
    /// Stream these chunks, then abort the connection
    FailAfter(Vec<&'static [u8]>),
    /// Reply with this status and JSON body
    Reject(StatusCode, serde_json::Value),
}

/// What the last text-to-speech request carried
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub voice_id: String,
    pub output_format: Option<String>,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

pub struct MockElevenLabs {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    behavior: Behavior,
    request_count: AtomicU32,
    subscription_count: AtomicU32,
    last: Mutex<Option<Recorded>>,
}

#[derive(Deserialize)]
struct SynthesisQuery {
    output_format: Option<String>,
}

impl MockElevenLabs {
    /// Start a mock that streams `ab`, an empty chunk, then `cd`
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Behavior::Stream(vec![b"ab", b"", b"cd"])).await
    }

    pub async fn start_with(behavior: Behavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            behavior,
            request_count: AtomicU32::new(0),
            subscription_count: AtomicU32::new(0),
            last: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/text-to-speech/{voice_id}", routing::post(handle_synthesis))
            .route("/v1/user/subscription", routing::get(handle_subscription))
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

    /// Number of text-to-speech requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Number of subscription requests received
    pub fn subscription_count(&self) -> u32 {
        self.state.subscription_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<Recorded> {
        self.state.last.lock().unwrap().clone()
    }
}

impl Drop for MockElevenLabs {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_synthesis(
    State(state): State<Arc<MockState>>,
    Path(voice_id): Path<String>,
    Query(query): Query<SynthesisQuery>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    *state.last.lock().unwrap() = Some(Recorded {
        voice_id,
        output_format: query.output_format,
        api_key: headers
            .get("xi-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
    });

    match state.behavior.clone() {
        Behavior::Stream(chunks) => audio_response(chunks, false),
        Behavior::FailAfter(chunks) => audio_response(chunks, true),
        Behavior::Reject(status, body) => (status, Json(body)).into_response(),
    }
}

fn audio_response(chunks: Vec<&'static [u8]>, abort: bool) -> Response {
    let mut items: Vec<Result<Bytes, std::io::Error>> = chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();

    if abort {
        items.push(Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upstream went away")));
    }

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "audio/mpeg")
        .body(Body::from_stream(futures_util::stream::iter(items)))
        .unwrap()
}

async fn handle_subscription(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.subscription_count.fetch_add(1, Ordering::Relaxed);

    if headers.get("xi-api-key").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": { "status": "missing_api_key", "message": "Missing API key" } })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "tier": "starter",
            "character_count": 1200,
            "character_limit": 10000,
        })),
    )
}
