//! Configuration for the origin client

use crate::error::{FetchError, FetchResult};
use edgepix_core::EdgeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginClientConfig {
    /// Overall deadline for one request, connect through last body byte
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// User-Agent sent when the forwarded headers carry none
    pub user_agent: String,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for OriginClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("edgepix/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&EdgeConfig> for OriginClientConfig {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            timeout: config.fetch_timeout(),
            user_agent: config.fetch.user_agent.clone(),
        }
    }
}

impl OriginClientConfig {
    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the User-Agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> FetchResult<()> {
        if self.timeout.is_zero() {
            return Err(FetchError::config("timeout cannot be zero"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(FetchError::config("user_agent cannot be empty"));
        }

        Ok(())
    }
}
