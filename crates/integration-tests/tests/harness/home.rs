//! Scratch data directory with a config store pointed at mock vendors

use saythis_app::Application;
use saythis_config::ConfigStore;
use tempfile::TempDir;

/// A throwaway data directory; removed on drop
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::open(self.dir.path()).unwrap()
    }

    /// Select `provider` and apply `settings` on top of its defaults
    pub fn configure(&self, provider: &str, settings: &[(&str, serde_json::Value)]) {
        let mut store = self.store();
        store.set_selected_provider(provider).unwrap();

        let mut current = store.provider_settings().unwrap().clone();
        for (key, value) in settings {
            current.set(key, value.clone()).unwrap();
        }
        store.set_provider_settings(current).unwrap();
    }

    /// ElevenLabs selected, keyed, and pointed at `base_url`
    pub fn with_elevenlabs(self, base_url: &str, api_key: &str) -> Self {
        self.configure(
            "ElevenLabs",
            &[
                ("credential", serde_json::json!(api_key)),
                ("base_url", serde_json::json!(base_url)),
            ],
        );
        self
    }

    pub fn app(&self) -> Application {
        Application::open(self.dir.path()).unwrap()
    }
}
