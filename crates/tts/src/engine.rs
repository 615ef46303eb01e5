use std::path::PathBuf;

use saythis_config::{ConfigError, ConfigStore, ProviderKind, ProviderSettings};
use tokio::sync::Mutex;

use crate::{
    error::{Result, TtsError},
    output::AudioOutput,
    provider::{
        SpeechProvider, elevenlabs::ElevenLabsProvider, google_cloud::GoogleCloudProvider,
        ibm_watson::IbmWatsonProvider,
    },
    types::{ProviderState, Usage},
};

/// Owns the active provider and routes work to it
///
/// Exactly one provider is live at a time. Selecting another one, or
/// reloading after a settings change, rebuilds it from the store.
pub struct TtsEngine {
    output: AudioOutput,
    kind: ProviderKind,
    provider: Box<dyn SpeechProvider>,
    /// Held for the whole of a synthesis so the shared artifact has one writer
    synthesis: Mutex<()>,
}

impl TtsEngine {
    /// Engine for the store's selected provider, writing into the data directory
    pub fn new(store: &ConfigStore) -> Result<Self> {
        TtsEngineBuilder::new(store).build()
    }

    /// Make `name` the active provider
    ///
    /// Fails with `UnsupportedProvider` when no implementation exists for the
    /// name, and leaves the current provider in place.
    pub fn select(&mut self, store: &ConfigStore, name: &str) -> Result<()> {
        let kind = ProviderKind::from_name(name).ok_or_else(|| TtsError::UnsupportedProvider(name.to_owned()))?;
        let settings = settings_for(store, kind)?;

        tracing::debug!(provider = kind.name(), "switching TTS provider");

        self.provider = build_provider(kind, settings, self.output.clone());
        self.kind = kind;

        Ok(())
    }

    /// Rebuild the active provider from the store's current settings
    pub fn reload(&mut self, store: &ConfigStore) -> Result<()> {
        let settings = settings_for(store, self.kind)?;

        self.provider = build_provider(self.kind, settings, self.output.clone());

        Ok(())
    }

    pub fn current(&self) -> &dyn SpeechProvider {
        self.provider.as_ref()
    }

    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub const fn output(&self) -> &AudioOutput {
        &self.output
    }

    /// Synthesize through the active provider
    ///
    /// Calls are serialized; a second caller waits for the first to finish.
    pub async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let _guard = self.synthesis.lock().await;

        tracing::debug!(provider = self.kind.name(), input_len = text.len(), "synthesizing");

        let path = self.provider.synthesize(text).await?;

        tracing::info!(provider = self.kind.name(), path = %path.display(), "audio written");

        Ok(path)
    }

    pub async fn usage(&self) -> Result<Usage> {
        self.provider.usage().await
    }
}

/// Builder for constructing the engine from a config store
pub struct TtsEngineBuilder<'a> {
    store: &'a ConfigStore,
    output: Option<AudioOutput>,
}

impl<'a> TtsEngineBuilder<'a> {
    pub const fn new(store: &'a ConfigStore) -> Self {
        Self { store, output: None }
    }

    /// Write audio somewhere other than the data directory
    #[must_use]
    pub fn output(mut self, output: AudioOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Result<TtsEngine> {
        let name = self.store.selected_provider();
        let kind = ProviderKind::from_name(name).ok_or_else(|| TtsError::UnsupportedProvider(name.to_owned()))?;
        let settings = settings_for(self.store, kind)?;
        let output = self
            .output
            .unwrap_or_else(|| AudioOutput::new(self.store.data_dir()));

        tracing::debug!(provider = kind.name(), dir = %output.dir().display(), "initializing TTS engine");

        let provider = build_provider(kind, settings, output.clone());

        if let ProviderState::Uninitialized { reason } = provider.state() {
            tracing::warn!(provider = kind.name(), %reason, "selected provider is not ready");
        }

        Ok(TtsEngine {
            output,
            kind,
            provider,
            synthesis: Mutex::new(()),
        })
    }
}

/// Construct the provider implementation for `kind`
pub fn build_provider(kind: ProviderKind, settings: &ProviderSettings, output: AudioOutput) -> Box<dyn SpeechProvider> {
    match kind {
        ProviderKind::ElevenLabs => Box::new(ElevenLabsProvider::initialize(settings, output)),
        ProviderKind::GoogleCloud => Box::new(GoogleCloudProvider::initialize(settings, output)),
        ProviderKind::IbmWatson => Box::new(IbmWatsonProvider::initialize(settings, output)),
    }
}

fn settings_for(store: &ConfigStore, kind: ProviderKind) -> Result<&ProviderSettings> {
    store
        .settings_for(kind.name())
        .ok_or_else(|| ConfigError::UnknownProvider(kind.name().to_owned()).into())
}
