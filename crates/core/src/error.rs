//! Errors raised while assembling an edgepix runtime
//!
//! Each error carries a stable numeric code, grouped by hundreds:
//! `E2xxx` for I/O and `E3xxx` for configuration. The request path never
//! produces these; it degrades instead of failing.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Generic I/O failure
    IoError = 2000,
    /// File does not exist
    FileNotFound = 2001,
    /// File exists but cannot be read
    PermissionDenied = 2002,

    /// Explicitly requested config file is missing
    ConfigNotFound = 3001,
    /// Config file is not valid TOML for the schema
    ConfigParseError = 3002,
    /// Config parsed but fails semantic checks
    ConfigValidationError = 3003,
    /// A single override value could not be interpreted
    InvalidConfigValue = 3004,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Whether the code belongs to the configuration group
    pub fn is_config(&self) -> bool {
        self.code() / 1000 == 3
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error with a code, optional context and an optional hint for the operator
#[derive(Error, Debug)]
pub struct Error {
    /// What went wrong, as a code
    pub code: ErrorCode,
    /// What went wrong, in words
    pub message: String,
    /// Where it happened (file, field, phase)
    pub context: Option<String>,
    /// How to fix it
    pub hint: Option<String>,
    /// Underlying cause
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a bare error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
            source: None,
        }
    }

    /// Attach where the error happened
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a fix for the operator
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `--config` pointed at nothing
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_hint("Create edgepix.toml or pass --config with an existing path")
    }

    /// An override could not be parsed
    pub fn invalid_config_value(field: &str, value: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Invalid value for {}: {:?}", field, value.into()),
        )
    }

    /// Every semantic problem found in one pass
    pub fn config_validation(problems: &[String]) -> Self {
        Self::new(
            ErrorCode::ConfigValidationError,
            format!("Configuration validation failed: {}", problems.join("; ")),
        )
        .with_hint("Fix the listed fields or delete them to use the defaults")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, err.message().to_string()).with_source(err)
    }
}

/// Attach context to a failing `Result`
pub trait ResultExt<T> {
    /// Record where the error happened
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::InvalidConfigValue.to_string(), "E3004");
        assert!(ErrorCode::ConfigParseError.is_config());
        assert!(!ErrorCode::IoError.is_config());
    }

    #[test]
    fn test_not_found_has_hint() {
        let err = Error::config_not_found("/etc/edgepix.toml");
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
        assert!(err.hint.is_some());
        assert!(err.to_string().contains("/etc/edgepix.toml"));
    }

    #[test]
    fn test_validation_lists_problems() {
        let err = Error::config_validation(&["a".to_string(), "b".to_string()]);
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.ends_with("a; b"));
    }

    #[test]
    fn test_io_kind_maps_to_code() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_context() {
        let result: Result<()> = Err(Error::new(ErrorCode::IoError, "disk gone"));
        let err = result.context("reading edgepix.toml").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("reading edgepix.toml"));
        assert_eq!(err.to_string(), "[E2000] disk gone (reading edgepix.toml)");
    }
}
