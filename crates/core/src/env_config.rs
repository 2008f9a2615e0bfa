//! Environment-driven client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS,
    MAX_PAGE_SIZE,
};

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently.
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Runtime settings shared by every client-side component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base path every request is issued against, without trailing slash.
    pub api_url: String,
    /// Directory holding the persisted session stores.
    pub state_dir: PathBuf,
    pub page_size: u32,
    pub search_debounce: Duration,
    pub idle_timeout: Duration,
    /// `None` leaves timeout behaviour to the transport defaults.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            state_dir: default_state_dir(),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Reads `RADMIN_*` variables, falling back to defaults for anything unset or invalid.
    pub fn from_env() -> Self {
        let api_url = std::env::var("RADMIN_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let state_dir = std::env::var("RADMIN_STATE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_state_dir, PathBuf::from);

        let mut page_size = env_parse_with_default("RADMIN_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            tracing::warn!(page_size, "RADMIN_PAGE_SIZE out of range, using default");
            page_size = DEFAULT_PAGE_SIZE;
        }

        let debounce_ms =
            env_parse_with_default("RADMIN_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS);
        let idle_ms = env_parse_with_default("RADMIN_IDLE_TIMEOUT_MS", DEFAULT_IDLE_TIMEOUT_MS);
        let timeout_secs = env_parse_with_default("RADMIN_REQUEST_TIMEOUT_SECS", 0_u64);

        Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            state_dir,
            page_size,
            search_debounce: Duration::from_millis(debounce_ms),
            idle_timeout: Duration::from_millis(idle_ms),
            request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("radmin")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(var: &str, value: &str) {
        // SAFETY: each test uses its own variable name, nothing else reads them concurrently.
        unsafe { std::env::set_var(var, value) };
    }

    fn unset(var: &str) {
        // SAFETY: see `set`.
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn test_env_parse_valid_value() {
        let var_name = "RADMIN_TEST_ENV_PARSE_VALID_41873";
        set(var_name, "42");
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 42);
        unset(var_name);
    }

    #[test]
    fn test_env_parse_invalid_value() {
        let var_name = "RADMIN_TEST_ENV_PARSE_INVALID_41874";
        set(var_name, "ten");
        let result: u64 = env_parse_with_default(var_name, 600_000);
        assert_eq!(result, 600_000);
        unset(var_name);
    }

    #[test]
    fn test_env_parse_missing_var() {
        let var_name = "RADMIN_TEST_ENV_PARSE_MISSING_41875";
        unset(var_name);
        let result: u32 = env_parse_with_default(var_name, 10);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.request_timeout, None);
        assert!(config.state_dir.ends_with("radmin"));
    }
}
