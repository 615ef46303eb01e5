pub mod elevenlabs;
pub mod google_cloud;
pub mod ibm_watson;

use std::path::PathBuf;

use async_trait::async_trait;
use saythis_config::ProviderSettings;

use crate::types::{ProviderState, Usage};

/// Trait for speech provider implementations
///
/// Providers are built from their settings and never fail construction: a
/// missing or unusable credential leaves the provider `Uninitialized`, and
/// `usage`/`synthesize` then return `TtsError::NotReady` without touching
/// the network or the output file.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Display name of the provider
    fn name(&self) -> &str;

    /// Result of the last initialization
    fn state(&self) -> &ProviderState;

    fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Settings the provider was initialized from
    fn settings(&self) -> &ProviderSettings;

    /// Path the next synthesis writes to
    fn output_path(&self) -> PathBuf;

    /// Character usage against the plan limit
    async fn usage(&self) -> crate::error::Result<Usage>;

    /// Synthesize `text` into the audio artifact and return its path
    async fn synthesize(&self, text: &str) -> crate::error::Result<PathBuf>;
}

/// Error returned when a non-ready provider is asked to do work
pub(crate) fn not_ready(name: &str, state: &ProviderState) -> crate::error::TtsError {
    let reason = match state {
        ProviderState::Uninitialized { reason } => reason.clone(),
        ProviderState::Ready => "provider is not initialized".to_owned(),
    };

    crate::error::TtsError::NotReady {
        provider: name.to_owned(),
        reason,
    }
}

/// Pull a human-readable message out of a vendor JSON error body
///
/// Looks for the common shapes (`detail.message`, `detail` as a string,
/// `detail[0].msg`, `error.message`, `error_description`) and falls back to
/// the raw body.
pub(crate) fn vendor_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback_message(body);
    };

    let candidates = [
        json.pointer("/detail/message"),
        json.get("detail"),
        json.pointer("/detail/0/msg"),
        json.pointer("/error/message"),
        json.get("error_description"),
        json.get("error"),
        json.get("message"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(serde_json::Value::as_str)
        .map_or_else(|| fallback_message(body), str::to_owned)
}

fn fallback_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_owned()
    } else {
        trimmed.to_owned()
    }
}
