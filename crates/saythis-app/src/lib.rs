//! Application facade
//!
//! Composes the [`ConfigStore`] and the [`TtsEngine`] behind the operations a
//! presentation needs: generate audio, report usage, pick a provider and edit
//! its settings.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;

use std::path::{Path, PathBuf};

use saythis_config::{ConfigStore, ProviderKind, ProviderSettings};
use tts::{TtsEngine, Usage};

pub use error::{AppError, Result};

pub struct Application {
    store: ConfigStore,
    engine: TtsEngine,
}

impl Application {
    /// Build the facade over an already opened store
    pub fn new(store: ConfigStore) -> Result<Self> {
        let engine = TtsEngine::new(&store)?;

        Ok(Self { store, engine })
    }

    /// Open the store in `data_dir` and build the facade over it
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(ConfigStore::open(data_dir)?)
    }

    /// Open the store in the default data directory
    pub fn open_default() -> Result<Self> {
        Self::new(ConfigStore::open_default()?)
    }

    /// Synthesize `text` with the selected provider and return the audio path
    ///
    /// Blank text and a provider without a credential are rejected before
    /// any vendor call.
    pub async fn generate_audio(&self, text: &str) -> Result<PathBuf> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyText);
        }

        let settings = self.store.provider_settings()?;
        if !settings.is_configured() {
            return Err(AppError::ConfigurationRequired {
                provider: self.store.selected_provider().to_owned(),
            });
        }

        Ok(self.engine.synthesize(text).await?)
    }

    /// Character usage of the selected provider
    pub async fn character_usage(&self) -> Result<Usage> {
        Ok(self.engine.usage().await?)
    }

    pub fn selected_service(&self) -> &str {
        self.store.selected_provider()
    }

    /// Persist the selection, then switch the live provider
    pub fn set_selected_service(&mut self, name: &str) -> Result<()> {
        if ProviderKind::from_name(name).is_none() {
            return Err(tts::TtsError::UnsupportedProvider(name.to_owned()).into());
        }

        self.store.set_selected_provider(name)?;
        self.engine.select(&self.store, name)?;

        tracing::info!(provider = name, "selected TTS provider");

        Ok(())
    }

    /// Settings of the selected provider
    pub fn service_config(&self) -> Result<&ProviderSettings> {
        Ok(self.store.provider_settings()?)
    }

    /// Persist new settings for the selected provider, then rebuild it
    pub fn set_service_config(&mut self, settings: ProviderSettings) -> Result<()> {
        self.store.set_provider_settings(settings)?;
        self.engine.reload(&self.store)?;

        Ok(())
    }

    /// Whether the selected provider initialized successfully
    pub fn is_service_ready(&self) -> bool {
        self.engine.current().is_ready()
    }

    /// Why the selected provider is not ready, if it isn't
    pub fn readiness_reason(&self) -> Option<&str> {
        match self.engine.current().state() {
            tts::ProviderState::Uninitialized { reason } => Some(reason.as_str()),
            tts::ProviderState::Ready => None,
        }
    }

    /// Names of every registered provider, in registry order
    pub fn providers(&self) -> Vec<&'static str> {
        ProviderKind::all().map(ProviderKind::name).collect()
    }

    /// Settings of any provider, selected or not
    pub fn settings_for(&self, name: &str) -> Option<&ProviderSettings> {
        self.store.settings_for(name)
    }

    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }

    pub fn config_path(&self) -> &Path {
        self.store.config_path()
    }

    /// Path the next synthesis will write to
    pub fn output_path(&self) -> PathBuf {
        self.engine.current().output_path()
    }

    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }
}
