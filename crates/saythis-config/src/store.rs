use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    Configuration, ProviderKind, ProviderSettings,
    error::{ConfigError, Result},
    merge::deep_merge,
};

/// Directory under the home directory holding config and audio output
const DATA_DIR_NAME: &str = ".saythis";

/// Keys of the flat single-provider layout that predates per-provider settings
const LEGACY_KEYS: [(&str, &str); 5] = [
    ("api_key", "credential"),
    ("voice_id", "voice_id"),
    ("model_id", "model_id"),
    ("output_format", "output_format"),
    ("file_extension", "file_extension"),
];

/// Persisted configuration with an in-memory copy
///
/// Every mutation is written through to `config.json` in the data directory.
#[derive(Debug)]
pub struct ConfigStore {
    data_dir: PathBuf,
    path: PathBuf,
    config: Configuration,
}

impl ConfigStore {
    /// Name of the configuration file inside the data directory
    pub const FILE_NAME: &'static str = "config.json";

    /// Open the store rooted at `data_dir`, creating the directory if needed
    ///
    /// A missing config file is created from the defaults. A corrupt one is
    /// logged and replaced by the defaults in memory only.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        std::fs::create_dir_all(&data_dir).map_err(|e| ConfigError::io(&data_dir, e))?;

        let path = data_dir.join(Self::FILE_NAME);
        let mut store = Self {
            data_dir,
            path,
            config: Configuration::default(),
        };
        store.load()?;

        Ok(store)
    }

    /// Open the store in `~/.saythis`
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_data_dir()?)
    }

    /// Default data directory, `~/.saythis`
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Re-read the configuration from disk
    ///
    /// Only fails when the defaults for a missing file cannot be written.
    pub fn load(&mut self) -> Result<&Configuration> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file missing, writing defaults");
            self.save(Configuration::default())?;
            return Ok(&self.config);
        }

        self.config = match read_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not load config file, using defaults");
                Configuration::default()
            }
        };

        Ok(&self.config)
    }

    /// Persist a full configuration, replacing the file atomically
    pub fn save(&mut self, mut config: Configuration) -> Result<()> {
        config.normalize();

        let contents = to_pretty_json(&config)?;
        write_atomically(&self.path, &contents)?;

        tracing::debug!(path = %self.path.display(), "config saved");

        self.config = config;
        Ok(())
    }

    /// Current in-memory configuration
    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    /// Display name of the selected provider
    pub fn selected_provider(&self) -> &str {
        &self.config.selected_provider
    }

    /// Select a provider and persist the choice
    pub fn set_selected_provider(&mut self, name: &str) -> Result<()> {
        if !self.config.is_selectable(name) {
            return Err(ConfigError::UnknownProvider(name.to_owned()));
        }

        let mut config = self.config.clone();
        name.clone_into(&mut config.selected_provider);
        self.save(config)
    }

    /// Settings of the selected provider
    pub fn provider_settings(&self) -> Result<&ProviderSettings> {
        self.config.selected_settings()
    }

    /// Settings of any provider by name
    pub fn settings_for(&self, name: &str) -> Option<&ProviderSettings> {
        self.config.settings(name)
    }

    /// Replace the selected provider's settings and persist
    pub fn set_provider_settings(&mut self, settings: ProviderSettings) -> Result<()> {
        let mut config = self.config.clone();
        config.set_selected_settings(settings)?;
        self.save(config)
    }

    /// Directory holding the config file and audio output
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the config file
    pub fn config_path(&self) -> &Path {
        &self.path
    }
}

/// Read, migrate, merge with defaults, and validate a config file
fn read_config(path: &Path) -> Result<Configuration> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let mut loaded: Value = serde_json::from_str(&raw)?;

    migrate_legacy(&mut loaded);

    let defaults = serde_json::to_value(Configuration::default())?;
    let mut config: Configuration = serde_json::from_value(deep_merge(&defaults, &loaded))?;

    if config.repair_selection() {
        tracing::warn!(
            path = %path.display(),
            selected = %config.selected_provider,
            "config selected an unknown provider, falling back to the default"
        );
    }

    Ok(config)
}

/// Move keys of the flat single-provider layout into the `ElevenLabs` block
fn migrate_legacy(loaded: &mut Value) {
    let Value::Object(root) = loaded else {
        return;
    };

    if root.contains_key("providers") || !root.contains_key("api_key") {
        return;
    }

    let mut settings = Map::new();
    for (legacy, current) in LEGACY_KEYS {
        if let Some(value) = root.remove(legacy) {
            settings.insert(current.to_owned(), value);
        }
    }

    tracing::debug!("migrating legacy flat config layout");

    let mut providers = Map::new();
    providers.insert(ProviderKind::ElevenLabs.name().to_owned(), Value::Object(settings));
    root.insert("providers".to_owned(), Value::Object(providers));
}

fn to_pretty_json(config: &Configuration) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write through a temporary file in the same directory, then rename over
/// the target so a reader never sees a partial file
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| ConfigError::io(dir, e))?;
    file.write_all(contents).map_err(|e| ConfigError::io(file.path(), e))?;
    file.as_file().sync_all().map_err(|e| ConfigError::io(file.path(), e))?;
    file.persist(path).map_err(|e| ConfigError::io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn open_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::open(dir.path()).unwrap()
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);

        assert!(store.config_path().exists());
        assert_eq!(store.config(), &Configuration::default());
        assert_eq!(store.selected_provider(), "ElevenLabs");
        assert_eq!(store.provider_settings().unwrap().credential, "");
    }

    #[test]
    fn data_dir_is_created_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = ConfigStore::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.data_dir(), nested);
    }

    #[test]
    fn corrupt_file_falls_back_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ConfigStore::FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let store = open_in(&dir);

        assert_eq!(store.config(), &Configuration::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn save_of_load_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let before = std::fs::read(store.config_path()).unwrap();

        let loaded = store.load().unwrap().clone();
        store.save(loaded).unwrap();

        assert_eq!(std::fs::read(store.config_path()).unwrap(), before);
    }

    #[test]
    fn partial_file_is_back_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ConfigStore::FILE_NAME);
        let partial = json!({
            "selected_provider": "Google Cloud",
            "providers": {
                "Google Cloud": { "credential": "/keys/sa.json", "speaking_rate": 1.5 }
            }
        });
        std::fs::write(&path, partial.to_string()).unwrap();

        let store = open_in(&dir);

        let google = store.provider_settings().unwrap();
        assert_eq!(store.selected_provider(), "Google Cloud");
        assert_eq!(google.credential, "/keys/sa.json");
        assert_eq!(google.options["speaking_rate"], json!(1.5));
        assert_eq!(google.option_str("voice_name"), Some("en-US-Wavenet-D"));
        assert_eq!(
            store.settings_for("ElevenLabs"),
            Some(&ProviderKind::ElevenLabs.default_settings())
        );
    }

    #[test]
    fn unknown_selection_is_repaired_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ConfigStore::FILE_NAME);
        std::fs::write(&path, r#"{ "selected_provider": "Polly" }"#).unwrap();

        let store = open_in(&dir);

        assert_eq!(store.selected_provider(), "ElevenLabs");
    }

    #[test]
    fn legacy_flat_layout_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ConfigStore::FILE_NAME);
        let legacy = json!({
            "api_key": "old-key",
            "voice_id": "voice",
            "model_id": "eleven_turbo_v2_5",
            "output_format": "mp3_44100_128",
            "file_extension": ".mp3"
        });
        std::fs::write(&path, legacy.to_string()).unwrap();

        let store = open_in(&dir);

        let settings = store.settings_for("ElevenLabs").unwrap();
        assert_eq!(settings.credential, "old-key");
        assert_eq!(settings.option_str("model_id"), Some("eleven_turbo_v2_5"));
        assert!(settings.options.contains_key("voice_settings"));
        assert!(store.config().extra.is_empty());
    }

    #[test]
    fn selection_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);

        store.set_selected_provider("IBM Watson").unwrap();

        let reopened = open_in(&dir);
        assert_eq!(reopened.selected_provider(), "IBM Watson");
    }

    #[test]
    fn selecting_unknown_provider_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);

        let err = store.set_selected_provider("Polly").unwrap_err();

        assert!(matches!(err, ConfigError::UnknownProvider(name) if name == "Polly"));
        assert_eq!(store.selected_provider(), "ElevenLabs");
    }

    #[test]
    fn settings_replace_only_selected_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.set_selected_provider("Google Cloud").unwrap();

        let mut settings = store.provider_settings().unwrap().clone();
        settings.credential = " /keys/sa.json ".to_owned();
        settings.set("audio_encoding", json!("LINEAR16")).unwrap();
        store.set_provider_settings(settings).unwrap();

        let reopened = open_in(&dir);
        let google = reopened.settings_for("Google Cloud").unwrap();
        assert_eq!(google.credential, "/keys/sa.json");
        assert_eq!(google.file_extension, ".wav");
        assert_eq!(
            reopened.settings_for("ElevenLabs"),
            Some(&ProviderKind::ElevenLabs.default_settings())
        );
    }

    #[test]
    fn unknown_top_level_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ConfigStore::FILE_NAME);
        std::fs::write(&path, r#"{ "window": { "width": 640 } }"#).unwrap();

        let mut store = open_in(&dir);
        store.set_selected_provider("Google Cloud").unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["window"], json!({ "width": 640 }));
    }
}
