use saythis_config::ConfigError;
use thiserror::Error;
use tts::{ErrorCategory, TtsError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Nothing to synthesize
    #[error("Please enter some text to synthesize")]
    EmptyText,

    /// The selected provider has no credential yet
    #[error("{provider} needs a credential before it can generate audio")]
    ConfigurationRequired { provider: String },

    #[error(transparent)]
    Tts(#[from] TtsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Category used to pick a remedy
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyText | Self::ConfigurationRequired { .. } => ErrorCategory::Configuration,
            Self::Tts(e) => e.category(),
            Self::Config(ConfigError::UnknownProvider(_)) => ErrorCategory::UnsupportedProvider,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Message to show a user; vendor text is passed through unchanged
    pub fn client_message(&self) -> String {
        match self {
            Self::Tts(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}
