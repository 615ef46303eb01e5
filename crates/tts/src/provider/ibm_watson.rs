use std::path::PathBuf;

use async_trait::async_trait;
use saythis_config::{ProviderKind, ProviderSettings};

use crate::{
    error::Result,
    output::AudioOutput,
    types::{ProviderState, Usage},
};

use super::SpeechProvider;

/// Fixed quota reported by the stub
const STUB_CHARACTER_LIMIT: u64 = 10_000;

/// IBM Watson placeholder
///
/// Always ready. Synthesis produces an empty artifact and usage reports a
/// fixed quota, so the selection and presentation paths can be exercised
/// without a vendor account.
pub struct IbmWatsonProvider {
    settings: ProviderSettings,
    output: AudioOutput,
    state: ProviderState,
}

impl IbmWatsonProvider {
    pub fn initialize(settings: &ProviderSettings, output: AudioOutput) -> Self {
        Self {
            settings: settings.clone(),
            output,
            state: ProviderState::Ready,
        }
    }
}

#[async_trait]
impl SpeechProvider for IbmWatsonProvider {
    fn name(&self) -> &str {
        ProviderKind::IbmWatson.name()
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn output_path(&self) -> PathBuf {
        self.output.path_for(&self.settings.file_extension)
    }

    async fn usage(&self) -> Result<Usage> {
        Ok(Usage::Quota {
            used: 0,
            limit: STUB_CHARACTER_LIMIT,
        })
    }

    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let path = self.output_path();

        tracing::debug!(input_len = text.len(), path = %path.display(), "IBM Watson stub synthesis");

        self.output.touch(&path).await?;

        Ok(path)
    }
}
