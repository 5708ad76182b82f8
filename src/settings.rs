use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};
use uuid::Uuid;

use crate::{
    generation::DEFAULT_MODEL,
    llm::OPENROUTER_API_URL,
    persistence::{
        get_data_file_path,
        load_json,
        save_json,
    },
};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_STORE_FILE: &str = "flashcards.json";
pub const DEFAULT_ACTION_LOG_FILE: &str = "action_logs.json";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_MODEL: &str = "FISZKI_MODEL";
pub const ENV_API_URL: &str = "FISZKI_API_URL";
pub const ENV_FLASHCARDS_URL: &str = "FISZKI_FLASHCARDS_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    /// Base URL of a remote flashcard service; the local JSON store is used when unset.
    pub flashcards_api_url: Option<String>,
    pub store_file: String,
    pub action_log_file: String,
    pub user_id: Uuid,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: OPENROUTER_API_URL.to_string(),
            flashcards_api_url: None,
            store_file: DEFAULT_STORE_FILE.to_string(),
            action_log_file: DEFAULT_ACTION_LOG_FILE.to_string(),
            user_id: Uuid::new_v4(),
        }
    }
}

impl Settings {
    /// Settings file in the data directory, then environment overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_from(&get_data_file_path(SETTINGS_FILE));
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Writes the file back after a successful load so a generated user id sticks.
    pub fn load_from(path: &Path) -> Self {
        match load_json::<Settings>(path) {
            Ok(settings) => {
                if let Err(e) = save_json(&settings, path) {
                    warn!(path = %path.display(), error = %e, "Failed to write settings");
                }
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = var(ENV_API_KEY) {
            debug!("API key taken from environment");
            self.api_key = Some(api_key);
        }
        if let Some(model) = var(ENV_MODEL) {
            self.model = model;
        }
        if let Some(api_url) = var(ENV_API_URL) {
            self.api_url = api_url;
        }
        if let Some(url) = var(ENV_FLASHCARDS_URL) {
            self.flashcards_api_url = Some(url);
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn store_path(&self) -> PathBuf {
        resolve_data_path(&self.store_file)
    }

    pub fn action_log_path(&self) -> PathBuf {
        resolve_data_path(&self.action_log_file)
    }
}

fn resolve_data_path(file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        get_data_file_path(file)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        fs,
    };

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model, "google/gemini-2.0-flash-exp:free");
        assert_eq!(settings.api_url, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(settings.store_file, "flashcards.json");
        assert_eq!(settings.api_key(), None);
        assert_ne!(settings.user_id, Settings::default().user_id);
    }

    #[test]
    fn test_missing_file_keeps_generated_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let first = Settings::load_from(&path);
        assert!(path.exists());
        let second = Settings::load_from(&path);
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_file_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        fs::write(&path, r#"{"model":"openai/gpt-4o-mini","api_key":"sk-file"}"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.model, "openai/gpt-4o-mini");
        assert_eq!(settings.api_key(), Some("sk-file"));
        assert_eq!(settings.store_file, DEFAULT_STORE_FILE);

        fs::write(&path, "not json").unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_KEY, "sk-env"),
            (ENV_MODEL, "  "),
            (ENV_FLASHCARDS_URL, "http://localhost:3000"),
        ]);

        let mut settings = Settings { model: "custom/model".to_string(), ..Settings::default() };
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_key(), Some("sk-env"));
        assert_eq!(settings.model, "custom/model");
        assert_eq!(settings.api_url, OPENROUTER_API_URL);
        assert_eq!(settings.flashcards_api_url.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_store_path() {
        let settings = Settings { store_file: "/tmp/cards.json".to_string(), ..Settings::default() };
        assert_eq!(settings.store_path(), PathBuf::from("/tmp/cards.json"));

        let settings = Settings::default();
        assert!(settings.store_path().ends_with(DEFAULT_STORE_FILE));
        assert!(settings.action_log_path().ends_with(DEFAULT_ACTION_LOG_FILE));
    }
}
