//! Configuration file loading

use super::schema::EdgeConfig;
use crate::error::{Error, Result, ResultExt};
use std::path::Path;
use std::time::Duration;

impl EdgeConfig {
    /// Load configuration from a file path, a standard location, or defaults.
    ///
    /// An explicit path that does not exist is an error; a missing file in
    /// the standard locations is not.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                if !Path::new(p).exists() {
                    return Err(Error::config_not_found(p));
                }
                load_config_file(p)?
            }
            None => match find_config_file() {
                Some(p) => load_config_file(&p)?,
                None => EdgeConfig::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply `EDGEPIX_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `EDGEPIX_*` overrides using the given lookup.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("EDGEPIX_MAX_OUTPUT_BYTES") {
            self.transform.max_output_bytes = raw
                .trim()
                .parse()
                .map_err(|_| Error::invalid_config_value("EDGEPIX_MAX_OUTPUT_BYTES", raw.clone()))?;
        }

        if let Some(raw) = lookup("EDGEPIX_FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| Error::invalid_config_value("EDGEPIX_FETCH_TIMEOUT_SECS", raw.clone()))?;
        }

        if let Some(level) = lookup("EDGEPIX_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(raw) = lookup("EDGEPIX_LOG_JSON") {
            self.logging.json = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(Error::invalid_config_value("EDGEPIX_LOG_JSON", raw)),
            };
        }

        self.validate()
    }

    /// Semantic checks serde cannot express. Reports every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.transform.max_output_bytes == 0 {
            problems.push("transform.max_output_bytes must be greater than zero".to_string());
        }
        if self.transform.allowed_extensions.is_empty() {
            problems.push("transform.allowed_extensions cannot be empty".to_string());
        }
        for ext in &self.transform.allowed_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                problems.push(format!("transform.allowed_extensions entry {:?} must look like \".png\"", ext));
            }
        }
        if self.fetch.timeout_secs == 0 {
            problems.push("fetch.timeout_secs must be greater than zero".to_string());
        }
        if !(1..=10).contains(&self.encoding.avif_speed) {
            problems.push("encoding.avif_speed must be between 1 and 10".to_string());
        }
        if !(1..=100).contains(&self.encoding.avif_quality) {
            problems.push("encoding.avif_quality must be between 1 and 100".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::config_validation(&problems))
        }
    }

    /// Upstream fetch deadline as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = ["edgepix.toml", ".edgepix.toml", ".config/edgepix.toml"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }

    None
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<EdgeConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path))
}
