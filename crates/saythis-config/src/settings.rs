use secrecy::SecretString;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

const DEFAULT_FILE_EXTENSION: &str = ".mp3";

/// Settings for a single speech provider
///
/// The credential and output extension are common to every provider. All
/// other keys are provider tunables; they are kept as raw JSON here and
/// validated by the provider when it is initialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key or path to a credential file; empty means "not configured"
    #[serde(default)]
    pub credential: String,
    /// Extension of the audio artifact, including the leading dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Provider-specific tunables
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn default_file_extension() -> String {
    DEFAULT_FILE_EXTENSION.to_owned()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            credential: String::new(),
            file_extension: default_file_extension(),
            options: Map::new(),
        }
    }
}

impl ProviderSettings {
    /// Split a JSON object into the common fields and the tunables
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut options) = value else {
            return Self::default();
        };

        let credential = take_string(&mut options, "credential").unwrap_or_default();
        let file_extension = take_string(&mut options, "file_extension").unwrap_or_else(default_file_extension);

        Self {
            credential,
            file_extension,
            options,
        }
    }

    /// Whether a credential has been entered
    pub fn is_configured(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    /// Credential with `{{ env.VAR }}` placeholders expanded
    pub fn resolved_credential(&self) -> Result<SecretString> {
        let expanded = crate::env::expand_env(self.credential.trim()).map_err(ConfigError::Expansion)?;
        Ok(SecretString::from(expanded))
    }

    /// Deserialize the tunables into a provider's typed view
    pub fn options_as<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.options.clone()))
    }

    /// A single string tunable, if present
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Set a value by dotted key, e.g. `voice_settings.stability`
    ///
    /// `credential` and `file_extension` must be strings; any other key is
    /// written into the tunables, creating intermediate objects as needed.
    /// Changing the extension of settings that carry an `audio_encoding`
    /// switches the encoding to match, since the encoding decides the
    /// extension on save.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let invalid = |reason: &str| ConfigError::InvalidKey {
            key: key.to_owned(),
            reason: reason.to_owned(),
        };

        match key {
            "credential" | "file_extension" => {
                let Value::String(text) = value else {
                    return Err(invalid("expected a string"));
                };
                if key == "credential" {
                    self.credential = text;
                    return Ok(());
                }

                if self.option_str("audio_encoding").is_some() {
                    let encoding = encoding_for_extension(&text)
                        .ok_or_else(|| invalid("no audio_encoding produces this extension"))?;
                    self.options
                        .insert("audio_encoding".to_owned(), Value::String(encoding.to_owned()));
                }

                self.file_extension = text;
                return Ok(());
            }
            "" => return Err(invalid("key is empty")),
            _ => {}
        }

        let mut segments = key.split('.').peekable();
        let mut target = &mut self.options;

        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }

            if segments.peek().is_none() {
                target.insert(segment.to_owned(), value);
                return Ok(());
            }

            let entry = target
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));

            target = match entry {
                Value::Object(map) => map,
                _ => return Err(invalid(&format!("'{segment}' is not an object"))),
            };
        }

        Ok(())
    }

    /// Normalize fields before the settings are persisted
    ///
    /// Trims the credential and canonicalizes the extension. Settings that
    /// carry an `audio_encoding` get the extension that encoding produces.
    pub fn normalize(&mut self) {
        self.credential = self.credential.trim().to_owned();

        if let Some(extension) = self.option_str("audio_encoding").and_then(extension_for_encoding) {
            extension.clone_into(&mut self.file_extension);
            return;
        }

        let extension = self.file_extension.trim().trim_start_matches('.').to_ascii_lowercase();
        self.file_extension = if extension.is_empty() {
            default_file_extension()
        } else {
            format!(".{extension}")
        };
    }
}

/// File extension produced by a Google Cloud audio encoding
pub fn extension_for_encoding(encoding: &str) -> Option<&'static str> {
    match encoding {
        "MP3" => Some(".mp3"),
        "LINEAR16" => Some(".wav"),
        "OGG_OPUS" => Some(".ogg"),
        _ => None,
    }
}

/// Audio encoding that produces a file extension, the inverse of
/// [`extension_for_encoding`]
pub fn encoding_for_extension(extension: &str) -> Option<&'static str> {
    match extension.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
        "mp3" => Some("MP3"),
        "wav" => Some("LINEAR16"),
        "ogg" => Some("OGG_OPUS"),
        _ => None,
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(value) => Some(value),
        _ => None,
    }
}
