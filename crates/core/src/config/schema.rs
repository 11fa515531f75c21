//! Configuration schema definitions
//!
//! Every field has a default so an empty file (or no file) is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EdgeConfig {
    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Eligibility and response-size policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Largest body, in bytes, the interceptor may return
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// URI suffixes eligible for transformation (matched case-insensitively)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Point the `host` header at the origin when passing a request through
    #[serde(default = "default_true")]
    pub rewrite_host_on_pass_through: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: default_max_output_bytes(),
            allowed_extensions: default_allowed_extensions(),
            rewrite_host_on_pass_through: true,
        }
    }
}

fn default_max_output_bytes() -> usize {
    1_000_000
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".png", ".jpg", ".jpeg", ".jfif"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

/// Upstream fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Overall deadline for the single upstream GET
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent when the caller supplied none
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("edgepix/{}", env!("CARGO_PKG_VERSION"))
}

/// Encoder tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// AVIF encoder speed, 1 (slowest) to 10 (fastest)
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,

    /// AVIF quality, 1 to 100
    #[serde(default = "default_avif_quality")]
    pub avif_quality: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            avif_speed: default_avif_speed(),
            avif_quality: default_avif_quality(),
        }
    }
}

fn default_avif_speed() -> u8 {
    8
}

fn default_avif_quality() -> u8 {
    70
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per line
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
