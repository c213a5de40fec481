// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::AppConfig;
use super::validation::ConfigValidator;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    /// Read, apply environment overrides, validate
    pub fn load_config(&self) -> Result<AppConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config: AppConfig = match self.format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(&content).context("Failed to parse YAML config")?
            }
            ConfigFormat::Toml => toml::from_str(&content).context("Failed to parse TOML config")?,
            ConfigFormat::Json => {
                serde_json::from_str(&content).context("Failed to parse JSON config")?
            }
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        ConfigValidator::validate_app_config(&config)?;

        Ok(config)
    }
}

impl AppConfig {
    /// Defaults plus environment overrides, no file
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        ConfigValidator::validate_app_config(&config)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => ConfigLoader::new(path)?.load_config(),
            None => Self::from_env(),
        }
    }
}

pub(crate) fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(redis_url) = lookup("REDIS_URL") {
        config.queue.redis_url = redis_url;
    }

    if let Some(db_url) = lookup("DATABASE_URL") {
        config.database.url = db_url;
        config.database.enabled = true;
    }

    if let Some(log_level) = lookup("LOG_LEVEL") {
        config.observability.log_level = log_level;
    }

    if let Some(language) = lookup("SCAN_LANGUAGE") {
        config.engine.language = language
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid SCAN_LANGUAGE")?;
    }

    if let Some(concurrency) = lookup("WORKER_CONCURRENCY") {
        config.queue.worker_concurrency = concurrency
            .parse()
            .context("Invalid WORKER_CONCURRENCY")?;
    }

    if let Some(name) = lookup("WORKER_NAME") {
        config.queue.worker_name = name;
    }

    if let Some(server) = lookup("DNS_SERVER") {
        config.engine.dns_server = Some(server);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ConfigLoader::detect_format(Path::new("config.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigLoader::detect_format(Path::new("config.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigLoader::detect_format(Path::new("config.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigLoader::detect_format(Path::new("config.ini")).is_err());
    }

    #[test]
    fn test_load_yaml_config_with_partial_sections() -> Result<()> {
        let yaml_content = r#"
engine:
  tcp_connect_timeout_secs: 2
  language: es
queue:
  queue_key: "scans"
retry:
  attempts: 5
"#;

        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(yaml_content.as_bytes())?;
        temp_file.flush()?;

        let config = ConfigLoader::with_format(temp_file.path(), ConfigFormat::Yaml).load_config()?;

        assert_eq!(config.engine.tcp_connect_timeout_secs, 2);
        assert_eq!(config.engine.dns_timeout_secs, 10);
        assert_eq!(config.queue.queue_key, "scans");
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.backoff_delay_ms, 5000);

        Ok(())
    }

    #[test]
    fn test_load_toml_config() -> Result<()> {
        let toml_content = r#"
[engine]
port_batch_size = 20
scanner_timeout_secs = 60
"#;

        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(toml_content.as_bytes())?;
        temp_file.flush()?;

        let config = ConfigLoader::with_format(temp_file.path(), ConfigFormat::Toml).load_config()?;
        assert_eq!(config.engine.port_batch_size, 20);
        assert_eq!(config.engine.scanner_timeout_secs, 60);

        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("REDIS_URL", "redis://queue.internal:6380"),
            ("SCAN_LANGUAGE", "es"),
            ("WORKER_CONCURRENCY", "8"),
            ("DATABASE_URL", "postgres://db/posture"),
            ("WORKER_NAME", "worker-7f9c"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.queue.redis_url, "redis://queue.internal:6380");
        assert_eq!(config.engine.language, Language::Es);
        assert_eq!(config.queue.worker_concurrency, 8);
        assert_eq!(config.queue.worker_name, "worker-7f9c");
        assert!(config.database.enabled);
    }

    #[test]
    fn test_invalid_env_override_is_rejected() {
        let mut config = AppConfig::default();
        let result = apply_env_overrides(&mut config, |k| {
            (k == "WORKER_CONCURRENCY").then(|| "many".to_string())
        });
        assert!(result.is_err());
    }
}
