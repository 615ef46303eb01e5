#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod env;
mod error;
mod merge;
pub mod provider;
pub mod settings;
mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use env::expand_env;
pub use error::{ConfigError, Result};
pub use merge::deep_merge;
pub use provider::ProviderKind;
pub use settings::{ProviderSettings, encoding_for_extension, extension_for_encoding};
pub use store::ConfigStore;

/// Top-level saythis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Display name of the active provider
    pub selected_provider: String,
    /// Settings for every provider, keyed by display name
    pub providers: IndexMap<String, ProviderSettings>,
    /// Unrecognised top-level keys, kept so a save does not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            selected_provider: ProviderKind::ElevenLabs.name().to_owned(),
            providers: ProviderKind::all()
                .map(|kind| (kind.name().to_owned(), kind.default_settings()))
                .collect(),
            extra: Map::new(),
        }
    }
}

impl Configuration {
    /// Settings stored for a provider
    pub fn settings(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.get(name)
    }

    /// Settings of the selected provider
    pub fn selected_settings(&self) -> Result<&ProviderSettings> {
        self.settings(&self.selected_provider)
            .ok_or_else(|| ConfigError::UnknownProvider(self.selected_provider.clone()))
    }

    /// Replace the settings of the selected provider
    pub fn set_selected_settings(&mut self, settings: ProviderSettings) -> Result<()> {
        let slot = self
            .providers
            .get_mut(&self.selected_provider)
            .ok_or_else(|| ConfigError::UnknownProvider(self.selected_provider.clone()))?;
        *slot = settings;
        Ok(())
    }

    /// Whether `name` is registered and has a settings entry
    pub fn is_selectable(&self, name: &str) -> bool {
        ProviderKind::from_name(name).is_some() && self.providers.contains_key(name)
    }

    /// Reset an invalid selection to the default provider
    ///
    /// Returns `true` when the selection had to be repaired.
    pub fn repair_selection(&mut self) -> bool {
        if self.is_selectable(&self.selected_provider) {
            return false;
        }

        let fallback = ProviderKind::ElevenLabs;
        self.providers
            .entry(fallback.name().to_owned())
            .or_insert_with(|| fallback.default_settings());
        fallback.name().clone_into(&mut self.selected_provider);

        true
    }

    /// Normalize the selected provider's settings ahead of a write
    pub fn normalize(&mut self) {
        if let Some(settings) = self.providers.get_mut(&self.selected_provider) {
            settings.normalize();
        }
    }
}
