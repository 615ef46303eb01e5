use serde_json::json;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::ProviderSettings;

/// Supported speech providers
///
/// The string form is the display name, which is also the key used in the
/// persisted `providers` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum ProviderKind {
    /// `ElevenLabs`
    #[strum(serialize = "ElevenLabs")]
    ElevenLabs,
    /// Google Cloud Text-to-Speech
    #[strum(serialize = "Google Cloud")]
    GoogleCloud,
    /// IBM Watson (placeholder, performs no synthesis)
    #[strum(serialize = "IBM Watson")]
    IbmWatson,
}

impl ProviderKind {
    /// Display name, also the settings map key
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// All registered providers in presentation order
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Resolve a provider from its display name
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Default settings block used to back-fill missing configuration
    pub fn default_settings(self) -> ProviderSettings {
        let value = match self {
            Self::ElevenLabs => json!({
                "credential": "",
                "file_extension": ".mp3",
                "voice_id": "JBFqnCBsd6RMkjVDRZzb",
                "model_id": "eleven_multilingual_v2",
                "output_format": "mp3_22050_32",
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                    "style": 0.0,
                    "speed": 1.0,
                    "use_speaker_boost": true
                }
            }),
            Self::GoogleCloud => json!({
                "credential": "",
                "file_extension": ".mp3",
                "language_code": "en-US",
                "voice_name": "en-US-Wavenet-D",
                "voice_gender": "NEUTRAL",
                "audio_encoding": "MP3",
                "speaking_rate": 1.0,
                "pitch": 0.0,
                "volume_gain_db": 0.0
            }),
            Self::IbmWatson => json!({
                "credential": "",
                "file_extension": ".wav"
            }),
        };

        ProviderSettings::from_value(value)
    }
}
