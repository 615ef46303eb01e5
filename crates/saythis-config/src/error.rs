use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading, validating, or persisting configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing a file under the data directory failed
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be converted to or from JSON
    #[error("invalid configuration data: {0}")]
    Json(#[from] serde_json::Error),

    /// A provider name that is not registered
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// A settings key that cannot be written
    #[error("invalid settings key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// `{{ env.VAR }}` expansion in a credential failed
    #[error("credential expansion failed: {0}")]
    Expansion(String),

    /// No home directory to place the default data directory in
    #[error("could not determine the home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
