// Service configuration
//
// Read once from the environment at startup and passed explicitly to
// whatever needs it.

use anyhow::{anyhow, Result};
use std::time::Duration;

pub const ARGO_WATCHER_URL_VAR: &str = "ARGO_WATCHER_URL";
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";
pub const TIMEOUT_VAR: &str = "ARGO_WATCHER_TIMEOUT_SECS";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the argo-watcher API, without trailing slash.
    pub argo_watcher_url: String,
    pub bind_addr: String,
    /// Request timeout applied to every downstream call.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let argo_watcher_url = lookup(ARGO_WATCHER_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("{} environment variable is not set.", ARGO_WATCHER_URL_VAR))?;

        let bind_addr = lookup(BIND_ADDR_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow!("Invalid {} value '{}': {}", TIMEOUT_VAR, raw, e))?;
                if secs == 0 {
                    return Err(anyhow!("{} must be greater than zero", TIMEOUT_VAR));
                }
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            argo_watcher_url: argo_watcher_url.trim_end_matches('/').to_string(),
            bind_addr,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_argo_watcher_url() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err
            .to_string()
            .contains("ARGO_WATCHER_URL environment variable is not set."));

        let err = Config::from_lookup(lookup_from(&[(ARGO_WATCHER_URL_VAR, "  ")])).unwrap_err();
        assert!(err.to_string().contains(ARGO_WATCHER_URL_VAR));
    }

    #[test]
    fn test_config_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[(ARGO_WATCHER_URL_VAR, "http://test-url.com/")]))
                .unwrap();
        assert_eq!(config.argo_watcher_url, "http://test-url.com");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_config_timeout() {
        let config = Config::from_lookup(lookup_from(&[
            (ARGO_WATCHER_URL_VAR, "http://argo"),
            (TIMEOUT_VAR, "15"),
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");

        let err = Config::from_lookup(lookup_from(&[
            (ARGO_WATCHER_URL_VAR, "http://argo"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_VAR));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            (ARGO_WATCHER_URL_VAR, "http://argo"),
            (TIMEOUT_VAR, "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
