// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use validator::Validate;

use super::core::AppConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config.validate().context("Configuration validation failed")?;

        Self::validate_queue_config(config)?;
        Self::validate_database_config(config)?;
        Self::validate_engine_config(config)?;

        Ok(())
    }

    fn validate_queue_config(config: &AppConfig) -> Result<()> {
        let url = &config.queue.redis_url;
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(anyhow::anyhow!(
                "Redis URL must start with redis:// or rediss://"
            ));
        }

        Ok(())
    }

    fn validate_database_config(config: &AppConfig) -> Result<()> {
        if !config.database.enabled {
            return Ok(());
        }

        if config.database.url.is_empty() {
            return Err(anyhow::anyhow!(
                "Database URL cannot be empty when database is enabled"
            ));
        }

        if !config.database.url.starts_with("postgresql://")
            && !config.database.url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "Database URL must start with postgresql:// or postgres://"
            ));
        }

        Ok(())
    }

    fn validate_engine_config(config: &AppConfig) -> Result<()> {
        if let Some(server) = &config.engine.dns_server {
            parse_dns_server(server)?;
        }

        if config.engine.dkim_selectors.iter().any(|s| s.trim().is_empty()) {
            return Err(anyhow::anyhow!("DKIM selectors cannot be blank"));
        }

        Ok(())
    }
}

/// Accepts `1.1.1.1` or `1.1.1.1:53`
pub fn parse_dns_server(value: &str) -> Result<SocketAddr> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let ip: IpAddr = value
        .parse()
        .with_context(|| format!("Invalid DNS server address: {}", value))?;
    Ok(SocketAddr::new(ip, 53))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate_app_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_redis_url() {
        let mut config = AppConfig::default();
        config.queue.redis_url = "http://localhost:6379".to_string();
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = AppConfig::default();
        config.engine.port_batch_size = 0;
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_database_url_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://localhost".to_string();
        assert!(ConfigValidator::validate_app_config(&config).is_ok());

        config.database.enabled = true;
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_dns_server_forms() {
        assert_eq!(parse_dns_server("1.1.1.1").unwrap().port(), 53);
        assert_eq!(parse_dns_server("8.8.8.8:5353").unwrap().port(), 5353);
        assert!(parse_dns_server("resolver.local").is_err());
    }
}
