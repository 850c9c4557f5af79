use serde::{Deserialize, Serialize};

use crate::model::view::SortKey;

/// Display theme, persisted as a bare `"dark"` / `"light"` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Theme> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Chat relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Upstream model candidates, tried in order
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Base URL of the hosted completion API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Address the relay server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            models: default_models(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
    ]
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_api_key_env() -> String {
    "TASKPAD_API_KEY".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

/// Hosted identity service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the identity service. Sign-in/sign-up are disabled when unset.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub default_sort: SortKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.relay.models.len(), 3);
        assert_eq!(config.relay.api_key_env, "TASKPAD_API_KEY");
        assert!(config.auth.base_url.is_none());
        assert_eq!(config.ui.default_sort, SortKey::Created);
    }

    #[test]
    fn partial_relay_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[relay]
models = ["my-model"]
"#,
        )
        .unwrap();
        assert_eq!(config.relay.models, vec!["my-model"]);
        assert_eq!(config.relay.bind_addr, "127.0.0.1:8787");
    }

    #[test]
    fn theme_parses_and_round_trips() {
        assert_eq!(Theme::parse("DARK"), Some(Theme::Dark));
        assert_eq!(Theme::parse("nope"), None);
        let json = serde_json::to_string(&Theme::Dark).unwrap();
        assert_eq!(json, r#""dark""#);
    }
}
