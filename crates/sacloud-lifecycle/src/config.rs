//! Configuration types
//!
//! Every section can be loaded from a JSON file; missing fields fall back to
//! the values in `sacloud_lifecycle_common::defaults`. CLI flags override the
//! file in `main.rs`.

use crate::error::ConfigError;
use sacloud_lifecycle_common::defaults::{
    self, DEFAULT_API_VERSION, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_PROVENANCE_DEPTH,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROGRESS_CAPACITY,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Control-plane connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Zone name such as "is1b" or "tk1a"
    #[serde(default = "defaults::default_zone")]
    pub zone: String,
    /// API root without the zone segment
    #[serde(default = "defaults::default_api_root")]
    pub api_root: String,
    /// Access token (basic auth user)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Access token secret (basic auth password)
    #[serde(default)]
    pub access_token_secret: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "defaults::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            zone: defaults::default_zone(),
            api_root: defaults::default_api_root(),
            access_token: None,
            access_token_secret: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Base URL for all resource collections in the configured zone
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.api_root.trim_end_matches('/'),
            self.zone,
            DEFAULT_API_VERSION
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Both credentials, or `None` when either is missing or blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (
            self.access_token.as_deref(),
            self.access_token_secret.as_deref(),
        ) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Some((token, secret))
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone.trim().is_empty() {
            return Err(ConfigError::EmptyZone);
        }
        if self.api_root.trim().is_empty() {
            return Err(ConfigError::EmptyApiRoot);
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidHttpTimeout);
        }
        if self.credentials().is_none() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}

/// Readiness monitor settings
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between polls
    #[serde(default = "defaults::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Progress events buffered by the streaming monitor before ticks are dropped
    #[serde(default = "defaults::default_progress_capacity")]
    pub progress_capacity: usize,
    /// Make the blocking wait stop on a failed resource instead of polling on
    #[serde(default)]
    pub fail_fast_on_failed: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            fail_fast_on_failed: false,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.progress_capacity == 0 {
            return Err(ConfigError::InvalidProgressCapacity);
        }
        Ok(())
    }
}

/// Disk edit policy used by the provenance resolver
#[derive(Debug, Clone, Deserialize)]
pub struct EditPolicy {
    /// Tags whose presence makes a resource editable
    #[serde(default = "defaults::default_allow_edit_tags")]
    pub allow_edit_tags: Vec<String>,
    /// Maximum number of ancestors followed
    #[serde(default = "defaults::default_max_provenance_depth")]
    pub max_depth: usize,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            allow_edit_tags: defaults::default_allow_edit_tags(),
            max_depth: DEFAULT_MAX_PROVENANCE_DEPTH,
        }
    }
}

impl EditPolicy {
    /// Policy with a custom tag set and the default depth cap
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_edit_tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// First allow-listed tag present in `tags`
    pub fn matching_tag<'a>(&self, tags: &'a [String]) -> Option<&'a str> {
        tags.iter()
            .find(|t| self.allow_edit_tags.iter().any(|allowed| allowed == *t))
            .map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allow_edit_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::EmptyAllowEditTag);
        }
        Ok(())
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub edit: EditPolicy,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the sections that do not depend on credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        self.edit.validate()
    }
}
