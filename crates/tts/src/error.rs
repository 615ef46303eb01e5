use std::path::PathBuf;

use saythis_config::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Speech synthesis errors
#[derive(Debug, Error)]
pub enum TtsError {
    /// The provider could not be initialized, usually because no credential is set
    #[error("{provider} is not ready: {reason}")]
    NotReady { provider: String, reason: String },

    /// No provider implementation exists for this name
    #[error("Unsupported TTS provider: {0}")]
    UnsupportedProvider(String),

    /// Settings are missing or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (missing or invalid API key)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider API returned an error
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error, including an interrupted audio stream
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Writing the audio artifact failed
    #[error("Failed to write audio to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal error
    /// If Some(message), it came from a provider and can be shown
    /// If None, it's an internal error and should not leak details
    #[error("Internal error")]
    InternalError(Option<String>),
}

/// Broad class of an error, used to pick a remedy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix the settings (add a credential, correct a value)
    Configuration,
    /// The vendor rejected or failed the request
    Vendor,
    /// A provider name with no implementation was selected
    UnsupportedProvider,
    /// Local failure unrelated to configuration or the vendor
    Internal,
}

impl TtsError {
    /// Category of this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotReady { .. } | Self::Config(_) => ErrorCategory::Configuration,
            Self::InvalidRequest(_)
            | Self::AuthenticationFailed(_)
            | Self::ProviderApiError { .. }
            | Self::ConnectionError(_) => ErrorCategory::Vendor,
            Self::UnsupportedProvider(_) => ErrorCategory::UnsupportedProvider,
            Self::Output { .. } | Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Message to show a user
    ///
    /// Vendor errors yield the vendor's own text unchanged.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(message)
            | Self::AuthenticationFailed(message)
            | Self::ProviderApiError { message, .. }
            | Self::InternalError(Some(message)) => message.clone(),
            Self::InternalError(None) => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Map a non-success vendor response to an error
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed(message),
            400 | 422 => Self::InvalidRequest(message),
            _ => Self::ProviderApiError { status, message },
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            TtsError::from_status(401, "bad key".into()),
            TtsError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            TtsError::from_status(422, "bad voice".into()),
            TtsError::InvalidRequest(_)
        ));
        assert!(matches!(
            TtsError::from_status(429, "quota".into()),
            TtsError::ProviderApiError { status: 429, .. }
        ));
    }

    #[test]
    fn vendor_message_is_verbatim() {
        let err = TtsError::from_status(401, "Invalid API key".into());
        assert_eq!(err.client_message(), "Invalid API key");
        assert_eq!(err.category(), ErrorCategory::Vendor);
    }

    #[test]
    fn not_ready_is_a_configuration_problem() {
        let err = TtsError::NotReady {
            provider: "ElevenLabs".into(),
            reason: "no API key configured".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.client_message(), "ElevenLabs is not ready: no API key configured");
    }
}
