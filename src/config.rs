//! Target configuration
//!
//! Each scrape target is described by one YAML document with a reserved
//! `source_type` tag, an `id`, an optional `base_url`, and a bag of
//! strategy-specific keys. The extractors only ever see the materialized
//! [`TargetConfig`]; file loading lives here so the CLI can hand configs to
//! the engine already parsed.

use std::path::Path;

use eyre::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HarvestError;

fn default_id() -> String {
    "unknown".to_string()
}

/// One scrape target, owned by the caller and never mutated by an extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Becomes `Record.source` for every record the target produces
    #[serde(default = "default_id")]
    pub id: String,

    /// Tag selecting the extraction strategy (see the registry)
    #[serde(default)]
    pub source_type: String,

    /// Base for relative-link resolution
    #[serde(default)]
    pub base_url: String,

    /// Strategy-specific keys; each strategy deserializes only its own
    /// settings from this bag, with defaults for anything missing
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            source_type: String::new(),
            base_url: String::new(),
            settings: Map::new(),
        }
    }
}

impl TargetConfig {
    /// Read a target configuration from a YAML file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read target config {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse target config {}", path.display()))
    }

    /// Base URL without any trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Deserialize this target's strategy settings.
    ///
    /// Missing keys fall back to the settings type's defaults; keys with the
    /// wrong shape are a configuration defect, not a runtime condition.
    pub fn strategy_settings<T>(&self) -> Result<T, HarvestError>
    where
        T: DeserializeOwned + Default,
    {
        serde_json::from_value(Value::Object(self.settings.clone())).map_err(|error| {
            HarvestError::Configuration(format!(
                "invalid settings for target '{}': {error}",
                self.id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct DemoSettings {
        url: String,
        max_items: u32,
    }

    #[test]
    fn test_read_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.yaml");
        std::fs::write(
            &path,
            "id: demo\nsource_type: css_select\nbase_url: https://example.org/\nurl: https://example.org/people\n",
        )
        .unwrap();

        let config = TargetConfig::read(&path).unwrap();
        assert_eq!(config.id, "demo");
        assert_eq!(config.source_type, "css_select");
        assert_eq!(config.base_url(), "https://example.org");
        assert!(config.settings.contains_key("url"));
    }

    #[test]
    fn test_missing_id_defaults_to_unknown() {
        let config: TargetConfig = serde_yaml::from_str("source_type: json_api\n").unwrap();
        assert_eq!(config.id, "unknown");
    }

    #[test]
    fn test_strategy_settings_default_missing_keys() {
        let config: TargetConfig =
            serde_yaml::from_str("id: t\nsource_type: x\nurl: https://a.example\n").unwrap();
        let settings: DemoSettings = config.strategy_settings().unwrap();
        assert_eq!(settings.url, "https://a.example");
        assert_eq!(settings.max_items, 0);
    }

    #[test]
    fn test_strategy_settings_reject_wrong_shape() {
        let config: TargetConfig =
            serde_yaml::from_str("id: t\nsource_type: x\nmax_items: not-a-number\n").unwrap();
        let result: Result<DemoSettings, _> = config.strategy_settings();
        assert!(matches!(result, Err(HarvestError::Configuration(_))));
    }
}
