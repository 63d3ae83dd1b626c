use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SCENE_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_OVERLAY_MODEL: &str = "imagen-3.0-generate-001";
pub const DEFAULT_HISTORY_TURNS: usize = 5;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 120;

/// Runtime settings for the engine, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub gemini_api_base: String,
    pub imagen_api_base: String,
    pub text_model: String,
    pub scene_model: String,
    pub edit_model: String,
    pub overlay_model: String,
    pub request_timeout: Duration,
    pub history_turns: usize,
    pub static_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            imagen_api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            scene_model: DEFAULT_SCENE_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            overlay_model: DEFAULT_OVERLAY_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_turns: DEFAULT_HISTORY_TURNS,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let gemini_api_base = get("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.gemini_api_base);
        let imagen_api_base = get("IMAGEN_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| gemini_api_base.clone());

        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            gemini_api_base,
            imagen_api_base,
            text_model: get("DIRECTOR_TEXT_MODEL").unwrap_or(defaults.text_model),
            scene_model: get("DIRECTOR_SCENE_MODEL").unwrap_or(defaults.scene_model),
            edit_model: get("DIRECTOR_EDIT_MODEL").unwrap_or(defaults.edit_model),
            overlay_model: get("DIRECTOR_OVERLAY_MODEL").unwrap_or(defaults.overlay_model),
            request_timeout: get("DIRECTOR_REQUEST_TIMEOUT")
                .and_then(|value| value.parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)))
                .unwrap_or(defaults.request_timeout),
            history_turns: get("DIRECTOR_HISTORY_TURNS")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.history_turns),
            static_dir: defaults.static_dir,
        }
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config, EngineConfig::default());
        assert!(!config.has_credentials());
    }

    #[test]
    fn gemini_key_wins_over_google_key_and_blank_is_unset() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("GOOGLE_API_KEY", "g-key")]);
        assert_eq!(config.api_key.as_deref(), Some("g-key"));

        let config = config_from(&[("GEMINI_API_KEY", "a-key"), ("GOOGLE_API_KEY", "g-key")]);
        assert_eq!(config.api_key.as_deref(), Some("a-key"));
    }

    #[test]
    fn imagen_base_follows_gemini_base_unless_set() {
        let config = config_from(&[("GEMINI_API_BASE", "http://127.0.0.1:9000/v1beta/")]);
        assert_eq!(config.gemini_api_base, "http://127.0.0.1:9000/v1beta");
        assert_eq!(config.imagen_api_base, "http://127.0.0.1:9000/v1beta");

        let config = config_from(&[
            ("GEMINI_API_BASE", "http://a/v1beta"),
            ("IMAGEN_API_BASE", "http://b/v1beta"),
        ]);
        assert_eq!(config.imagen_api_base, "http://b/v1beta");
    }

    #[test]
    fn timeout_is_clamped() {
        let config = config_from(&[("DIRECTOR_REQUEST_TIMEOUT", "900")]);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        let config = config_from(&[("DIRECTOR_REQUEST_TIMEOUT", "0")]);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        let config = config_from(&[("DIRECTOR_REQUEST_TIMEOUT", "soon")]);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn model_overrides_are_read() {
        let config = config_from(&[
            ("DIRECTOR_TEXT_MODEL", "gemini-2.5-flash"),
            ("DIRECTOR_HISTORY_TURNS", "8"),
        ]);
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.scene_model, DEFAULT_SCENE_MODEL);
        assert_eq!(config.history_turns, 8);
    }
}
