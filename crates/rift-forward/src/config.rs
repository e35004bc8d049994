//! Client configuration.

use crate::tls::TrustPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of redirect hops followed for one request.
pub const DEFAULT_MAX_REDIRECTS: usize = 50;

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

/// Settings fixed when the shared upstream client is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Secure mode: apply `trust_policy` to upstream TLS connections.
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub trust_policy: TrustPolicy,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// No connect timeout unless set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    /// No overall request timeout unless set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            secure: false,
            trust_policy: TrustPolicy::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn secure(secure: bool) -> Self {
        Self {
            secure,
            ..Default::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: ClientConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_redirects == 0 {
            anyhow::bail!("max_redirects must be at least 1");
        }
        if self.connect_timeout_secs == Some(0) || self.request_timeout_secs == Some(0) {
            anyhow::bail!("Timeouts must be greater than zero when set");
        }
        Ok(())
    }
}
