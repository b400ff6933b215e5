pub mod languages;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub use languages::{Language, UnknownLanguage};

// --- Types ---

/// One code review submission.
///
/// `code` reaches the model verbatim. Callers must reject empty input
/// before building a request; nothing below checks for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub code: String,
    pub filename: String,
    pub language: String,
    pub model: String,
}

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Filename shown to the model when the input has no usable path (stdin).
pub const DEFAULT_FILENAME: &str = "main.py";

// --- Settings ---

pub const PROVIDER_ENV: &str = "REDLINE_PROVIDER";
pub const MODEL_ENV: &str = "REDLINE_MODEL";
pub const API_KEY_ENV: &str = "REDLINE_API_KEY";
/// Accepted as a fallback credential so existing OpenAI setups work unchanged.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

impl Settings {
    /// Settings file overlaid with environment variables, then defaults for
    /// whatever is still empty. Env wins over file; the api key may stay
    /// empty and is not validated here.
    pub fn load() -> Settings {
        read_settings().overlaid(|name| std::env::var(name).ok())
    }

    fn overlaid(mut self, lookup: impl Fn(&str) -> Option<String>) -> Settings {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(provider) = get(PROVIDER_ENV) {
            self.provider = provider;
        }
        if let Some(model) = get(MODEL_ENV) {
            self.model = model;
        }
        if let Some(key) = get(API_KEY_ENV).or_else(|| get(OPENAI_KEY_ENV)) {
            self.api_key = key;
        }
        if self.provider.is_empty() {
            self.provider = DEFAULT_PROVIDER.to_string();
        }
        if self.model.is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        self
    }

    /// True when the settings can plausibly reach a provider. Local ollama
    /// needs no key.
    pub fn configured(&self) -> bool {
        !self.provider.is_empty()
            && !self.model.is_empty()
            && (self.provider == "ollama" || !self.api_key.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolve the global config directory (~/.redline/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".redline")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Read settings from disk. Missing or unreadable files yield defaults.
pub fn read_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn write_settings(settings: &Settings) -> Result<(), ConfigError> {
    let dir = config_dir();
    fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_file_values() {
        let file = Settings {
            provider: "anthropic".to_string(),
            api_key: "file-key".to_string(),
            model: "claude-sonnet".to_string(),
        };
        let vars = env(&[(PROVIDER_ENV, "groq"), (API_KEY_ENV, "env-key")]);
        let merged = file.overlaid(|name| vars.get(name).cloned());
        assert_eq!(merged.provider, "groq");
        assert_eq!(merged.api_key, "env-key");
        assert_eq!(merged.model, "claude-sonnet");
    }

    #[test]
    fn defaults_fill_empty_fields() {
        let merged = Settings::default().overlaid(|_| None);
        assert_eq!(merged.provider, DEFAULT_PROVIDER);
        assert_eq!(merged.model, DEFAULT_MODEL);
        assert!(merged.api_key.is_empty());
    }

    #[test]
    fn openai_key_is_a_fallback() {
        let vars = env(&[(OPENAI_KEY_ENV, "sk-test")]);
        let merged = Settings::default().overlaid(|name| vars.get(name).cloned());
        assert_eq!(merged.api_key, "sk-test");
    }

    #[test]
    fn redline_key_beats_openai_key() {
        let vars = env(&[(API_KEY_ENV, "rl-key"), (OPENAI_KEY_ENV, "sk-test")]);
        let merged = Settings::default().overlaid(|name| vars.get(name).cloned());
        assert_eq!(merged.api_key, "rl-key");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let file = Settings {
            provider: "mistral".to_string(),
            ..Settings::default()
        };
        let vars = env(&[(PROVIDER_ENV, "   ")]);
        let merged = file.overlaid(|name| vars.get(name).cloned());
        assert_eq!(merged.provider, "mistral");
    }

    #[test]
    fn ollama_needs_no_key() {
        let local = Settings {
            provider: "ollama".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
        };
        assert!(local.configured());

        let remote = Settings {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
        };
        assert!(!remote.configured());
    }
}
