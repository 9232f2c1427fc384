//! Application configuration
//!
//! Values are layered: built-in defaults, then the YAML config file, then
//! `SELFHEAL__SECTION__KEY` environment overlays. CLI flags are applied last
//! by the individual commands.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use action_locator::{HealThresholds, HealerSettings, OllamaConfig};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info};

const ENV_PREFIX: &str = "SELFHEAL__";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Policy document; the built-in default policy is used when unset.
    pub rules_path: Option<PathBuf>,
    pub artifact_dir: PathBuf,
    pub tool: String,
    pub test_type: String,
    pub environment: String,
    pub component: Option<String>,
    pub validation_timeout_ms: u64,
    pub min_rank: f64,
    pub min_confidence: f64,
    pub suggester: SuggesterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = HealerSettings::default();
        Self {
            rules_path: None,
            artifact_dir: settings.artifact_dir,
            tool: settings.tool,
            test_type: settings.test_type,
            environment: settings.environment,
            component: settings.component,
            validation_timeout_ms: settings.validation_timeout.as_millis() as u64,
            min_rank: settings.thresholds.min_rank,
            min_confidence: settings.thresholds.min_confidence,
            suggester: SuggesterConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggesterConfig {
    pub enabled: bool,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        let ollama = OllamaConfig::default();
        Self {
            enabled: false,
            api_base: ollama.api_base,
            model: ollama.model,
            temperature: ollama.temperature,
            timeout_ms: ollama.timeout.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn healer_settings(&self) -> HealerSettings {
        HealerSettings {
            tool: self.tool.clone(),
            test_type: self.test_type.clone(),
            environment: self.environment.clone(),
            component: self.component.clone(),
            artifact_dir: self.artifact_dir.clone(),
            validation_timeout: Duration::from_millis(self.validation_timeout_ms),
            thresholds: HealThresholds {
                min_rank: self.min_rank,
                min_confidence: self.min_confidence,
            },
        }
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            api_base: self.suggester.api_base.clone(),
            model: self.suggester.model.clone(),
            temperature: self.suggester.temperature,
            timeout: Duration::from_millis(self.suggester.timeout_ms),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Env,
}

/// One dotted-path assignment applied on top of the defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigOverlay {
    pub path: String,
    pub value: Value,
    pub source: ConfigSource,
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
}

/// Resolves the config file, then applies file and environment overlays.
///
/// An explicit path must exist. Without one, `<config_dir>/selfheal/config.yaml`
/// is used when present.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        }
        None => default_config_path().filter(|path| path.exists()),
    };

    let mut overlays = Vec::new();
    match &path {
        Some(path) => {
            overlays.extend(overlays_from_file(path).await?);
            info!(path = %path.display(), "Loaded configuration");
        }
        None => debug!("No config file found, using defaults"),
    }
    overlays.extend(overlays_from_vars(env::vars()));

    let config = resolve(&overlays)?;
    Ok(LoadedConfig { config, path })
}

fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("selfheal");
    path.push("config.yaml");
    Some(path)
}

async fn overlays_from_file(path: &Path) -> Result<Vec<ConfigOverlay>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    let value = serde_json::to_value(yaml).context("Config file is not representable as JSON")?;
    match value {
        Value::Object(_) => Ok(flatten_value(value, None, ConfigSource::File)),
        Value::Null => Ok(Vec::new()),
        _ => bail!("Config file {} must contain a mapping", path.display()),
    }
}

/// Collects `SELFHEAL__A__B=value` pairs as `a.b` overlays.
pub fn overlays_from_vars<I>(vars: I) -> Vec<ConfigOverlay>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut overlays = Vec::new();
    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        if path.is_empty() {
            continue;
        }
        overlays.push(ConfigOverlay {
            path,
            value: parse_env_value(&raw),
            source: ConfigSource::Env,
        });
    }
    overlays
}

/// Applies overlays in order to the serialized defaults.
pub fn resolve(overlays: &[ConfigOverlay]) -> Result<AppConfig> {
    let mut root = serde_json::to_value(AppConfig::default())?;
    for overlay in overlays {
        debug!(path = %overlay.path, source = ?overlay.source, "applying config overlay");
        set_path(&mut root, &overlay.path, overlay.value.clone());
    }
    serde_json::from_value(root).context("Invalid configuration")
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: ConfigSource) -> Vec<ConfigOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let segment = key.trim().to_ascii_lowercase();
                let next = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, segment),
                    _ => segment,
                };
                result.extend(flatten_value(value, Some(next), source));
            }
            result
        }
        other => match prefix {
            Some(path) => vec![ConfigOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(map) = root {
        match rest {
            None => {
                map.insert(head.to_string(), value);
            }
            Some(rest) => set_path(
                map.entry(head.to_string()).or_insert(Value::Null),
                rest,
                value,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_mirror_healer_settings() {
        let config = AppConfig::default();
        assert_eq!(config.tool, "playwright");
        assert_eq!(config.test_type, "REGRESSION");
        assert_eq!(config.environment, "QA");
        assert_eq!(config.artifact_dir, PathBuf::from("test_artifacts"));
        assert_eq!(config.validation_timeout_ms, 2000);
        assert_eq!(config.min_rank, 100.0);
        assert_eq!(config.min_confidence, 0.9);
        assert!(!config.suggester.enabled);
        assert_eq!(config.suggester.api_base, "http://localhost:11434");
        assert_eq!(config.healer_settings(), HealerSettings::default());
    }

    #[test]
    fn env_values_are_typed() {
        assert_eq!(parse_env_value(""), Value::Null);
        assert_eq!(parse_env_value("true"), Value::Bool(true));
        assert_eq!(parse_env_value("80"), Value::from(80));
        assert_eq!(parse_env_value("0.75"), Value::from(0.75));
        assert_eq!(parse_env_value("STAGING"), Value::from("STAGING"));
    }

    #[test]
    fn env_overlays_use_double_underscore_sections() {
        let overlays = overlays_from_vars(vars(&[
            ("SELFHEAL__MIN_RANK", "80"),
            ("SELFHEAL__SUGGESTER__ENABLED", "true"),
            ("SELFHEAL__", "ignored"),
            ("PATH", "/usr/bin"),
        ]));
        let paths: Vec<_> = overlays.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["min_rank", "suggester.enabled"]);
        assert!(overlays.iter().all(|o| o.source == ConfigSource::Env));
    }

    #[test]
    fn later_overlays_win() {
        let mut overlays = flatten_value(
            serde_json::json!({
                "environment": "STAGING",
                "suggester": { "model": "qwen2.5:7b", "timeout_ms": 5000 }
            }),
            None,
            ConfigSource::File,
        );
        overlays.extend(overlays_from_vars(vars(&[
            ("SELFHEAL__ENVIRONMENT", "PROD"),
            ("SELFHEAL__MIN_CONFIDENCE", "0.75"),
        ])));

        let config = resolve(&overlays).unwrap();
        assert_eq!(config.environment, "PROD");
        assert_eq!(config.min_confidence, 0.75);
        assert_eq!(config.suggester.model, "qwen2.5:7b");
        assert_eq!(config.ollama_config().timeout, Duration::from_millis(5000));
        assert_eq!(config.tool, "playwright");
    }

    #[test]
    fn mistyped_overlay_is_rejected() {
        let overlays = overlays_from_vars(vars(&[("SELFHEAL__MIN_RANK", "high")]));
        assert!(resolve(&overlays).is_err());
    }

    #[tokio::test]
    async fn file_overlays_are_read_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "rules_path: rules/custom.yaml\nsuggester:\n  enabled: true\n",
        )
        .unwrap();

        let overlays = overlays_from_file(&path).await.unwrap();
        let config = resolve(&overlays).unwrap();
        assert_eq!(config.rules_path, Some(PathBuf::from("rules/custom.yaml")));
        assert!(config.suggester.enabled);
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let missing = PathBuf::from("/nonexistent/selfheal.yaml");
        assert!(load_config(Some(&missing)).await.is_err());
    }
}
