#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod engine;
mod error;
mod http_client;
mod output;
mod provider;
mod types;

pub use engine::{TtsEngine, TtsEngineBuilder, build_provider};
pub use error::{ErrorCategory, Result, TtsError};
pub use output::AudioOutput;
pub use provider::{
    SpeechProvider, elevenlabs::ElevenLabsProvider, google_cloud::GoogleCloudProvider, ibm_watson::IbmWatsonProvider,
};
pub use types::{ProviderState, Usage};
