//! Default configuration values shared across sacloud-lifecycle components

/// Default API zone
pub const DEFAULT_ZONE: &str = "is1b";

/// Default API root; `{zone}` is substituted at client construction
pub const DEFAULT_API_ROOT: &str = "https://secure.sakura.ad.jp/cloud/zone";

/// Default API version path segment
pub const DEFAULT_API_VERSION: &str = "api/cloud/1.1";

/// Default interval between readiness polls in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default readiness timeout in seconds (0 = wait forever)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 0;

/// Default capacity of the streaming monitor's progress channel
pub const DEFAULT_PROGRESS_CAPACITY: usize = 16;

/// Default cap on provenance chain length
pub const DEFAULT_MAX_PROVENANCE_DEPTH: usize = 32;

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Serde default functions for struct field defaults

/// Returns the default zone
pub fn default_zone() -> String {
    DEFAULT_ZONE.to_string()
}

/// Returns the default API root
pub fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}

/// Returns the default poll interval
pub fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Returns the default progress channel capacity
pub fn default_progress_capacity() -> usize {
    DEFAULT_PROGRESS_CAPACITY
}

/// Returns the default provenance depth cap
pub fn default_max_provenance_depth() -> usize {
    DEFAULT_MAX_PROVENANCE_DEPTH
}

/// Returns the default HTTP timeout
pub fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Returns the default allow-edit tag set
pub fn default_allow_edit_tags() -> Vec<String> {
    crate::tags::ALLOW_EDIT_TAGS
        .iter()
        .map(|t| (*t).to_string())
        .collect()
}
