//! Core utilities shared by the edgepix crates
//!
//! - **Error handling**: structured errors with codes, context and recovery suggestions
//! - **Configuration**: TOML-based configuration with env overrides and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use edgepix_core::config::EdgeConfig;
//!
//! let mut config = EdgeConfig::load(None).expect("invalid edgepix.toml");
//! config.apply_env_overrides().expect("invalid EDGEPIX_* override");
//! assert!(config.transform.max_output_bytes > 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use config::EdgeConfig;
pub use error::{Error, ErrorCode, Result, ResultExt};
