//! Service configuration
//!
//! All settings come from environment variables; secrets are never logged
//! and are redacted from `Debug` output.
//!
//! | Variable | Default |
//! |---|---|
//! | `SHOPIFY_WEBHOOK_SECRET` | required |
//! | `SHOPIFY_SHOP_DOMAIN` | required |
//! | `SHOPIFY_ACCESS_TOKEN` | required |
//! | `SHOPIFY_API_VERSION` | `2024-01` |
//! | `SHOPIFY_API_BASE_URL` | `https://{SHOPIFY_SHOP_DOMAIN}` |
//! | `PORT` | `3000` |
//! | `INVENTORY_MAX_RETRIES` | `3` |
//! | `INVENTORY_RETRY_BASE_DELAY_MS` | `500` |
//! | `INVENTORY_RETRY_MAX_DELAY_MS` | `10000` |
//! | `INVENTORY_REQUEST_TIMEOUT_SECS` | `30` |
//! | `INVENTORY_PRIMARY_LOCATION_ID` | unset (first returned location) |
//! | `ENABLE_TEST_ENDPOINTS` | `true` |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::inventory::{LocationStrategy, RetryPolicy};

/// Default admin API version
pub const DEFAULT_API_VERSION: &str = "2024-01";

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Runtime configuration for the service
#[derive(Clone)]
pub struct ServiceConfig {
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: String,
    /// Shop domain, e.g. `demo.myshopify.com`
    pub shop_domain: String,
    /// Admin API access token
    pub access_token: String,
    /// Admin API version segment, e.g. `2024-01`
    pub api_version: String,
    /// Base URL for admin API calls (always ends with `/`)
    pub api_base_url: Url,
    /// Port to listen on
    pub port: u16,
    /// Retry policy for platform calls
    pub retry: RetryPolicy,
    /// Timeout for a single platform request
    pub request_timeout: Duration,
    /// Which location receives adjustments
    pub location_strategy: LocationStrategy,
    /// Whether `/test/*` routes are mounted
    pub enable_test_endpoints: bool,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("webhook_secret", &"<redacted>")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("port", &self.port)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("location_strategy", &self.location_strategy)
            .field("enable_test_endpoints", &self.enable_test_endpoints)
            .finish()
    }
}

impl ServiceConfig {
    /// Configuration with defaults for everything but the three credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty credential and
    /// `ConfigError::Invalid` if the shop domain does not form a valid URL.
    pub fn new(
        webhook_secret: impl Into<String>,
        shop_domain: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let webhook_secret = non_empty("SHOPIFY_WEBHOOK_SECRET", webhook_secret.into())?;
        let shop_domain = non_empty("SHOPIFY_SHOP_DOMAIN", shop_domain.into())?;
        let access_token = non_empty("SHOPIFY_ACCESS_TOKEN", access_token.into())?;
        let api_base_url = parse_base_url("SHOPIFY_SHOP_DOMAIN", &format!("https://{shop_domain}"))?;

        Ok(Self {
            webhook_secret,
            shop_domain,
            access_token,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base_url,
            port: DEFAULT_PORT,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            location_strategy: LocationStrategy::FirstReturned,
            enable_test_endpoints: true,
        })
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if a required variable is unset and
    /// `ConfigError::Invalid` if any variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let mut config = Self::new(
            required("SHOPIFY_WEBHOOK_SECRET")?,
            required("SHOPIFY_SHOP_DOMAIN")?,
            required("SHOPIFY_ACCESS_TOKEN")?,
        )?;

        if config.webhook_secret.len() < 16 {
            warn!("SHOPIFY_WEBHOOK_SECRET is shorter than 16 characters");
        }

        if let Some(version) = get("SHOPIFY_API_VERSION") {
            config.api_version = version;
        }
        if let Some(base) = get("SHOPIFY_API_BASE_URL") {
            config.api_base_url = parse_base_url("SHOPIFY_API_BASE_URL", &base)?;
        }
        if let Some(port) = parse_opt::<u16>(&get, "PORT")? {
            config.port = port;
        }

        if let Some(max_retries) = parse_opt::<u32>(&get, "INVENTORY_MAX_RETRIES")? {
            config.retry.max_retries = max_retries;
        }
        if let Some(ms) = parse_opt::<u64>(&get, "INVENTORY_RETRY_BASE_DELAY_MS")? {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_opt::<u64>(&get, "INVENTORY_RETRY_MAX_DELAY_MS")? {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if config.retry.max_delay < config.retry.base_delay {
            return Err(ConfigError::Invalid {
                name: "INVENTORY_RETRY_MAX_DELAY_MS",
                reason: "must not be smaller than INVENTORY_RETRY_BASE_DELAY_MS".to_string(),
            });
        }

        if let Some(secs) = parse_opt::<u64>(&get, "INVENTORY_REQUEST_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "INVENTORY_REQUEST_TIMEOUT_SECS",
                    reason: "timeout cannot be 0".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(location_id) = parse_opt::<u64>(&get, "INVENTORY_PRIMARY_LOCATION_ID")? {
            config.location_strategy = LocationStrategy::Primary(location_id);
        }

        if let Some(enabled) = get("ENABLE_TEST_ENDPOINTS") {
            config.enable_test_endpoints = parse_bool("ENABLE_TEST_ENDPOINTS", &enabled)?;
        }

        Ok(config)
    }
}

fn non_empty(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(value)
    }
}

fn parse_base_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{raw} cannot be used as a base URL"),
        });
    }
    // Url::join replaces the last path segment unless the path ends in '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_opt<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    get(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SHOPIFY_WEBHOOK_SECRET", "whsec-test-secret-value"),
        ("SHOPIFY_SHOP_DOMAIN", "demo.myshopify.com"),
        ("SHOPIFY_ACCESS_TOKEN", "shpat_test"),
    ];

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.api_base_url.as_str(), "https://demo.myshopify.com/");
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.location_strategy, LocationStrategy::FirstReturned);
        assert!(config.enable_test_endpoints);
    }

    #[test]
    fn test_missing_required() {
        let err = ServiceConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SHOPIFY_ACCESS_TOKEN"));

        let mut empty_secret = REQUIRED;
        empty_secret[0] = ("SHOPIFY_WEBHOOK_SECRET", "  ");
        let err = ServiceConfig::from_lookup(lookup(&empty_secret)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SHOPIFY_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("SHOPIFY_API_VERSION", "2024-04"),
            ("SHOPIFY_API_BASE_URL", "http://127.0.0.1:9999/proxy"),
            ("INVENTORY_MAX_RETRIES", "0"),
            ("INVENTORY_RETRY_BASE_DELAY_MS", "10"),
            ("INVENTORY_RETRY_MAX_DELAY_MS", "100"),
            ("INVENTORY_REQUEST_TIMEOUT_SECS", "5"),
            ("INVENTORY_PRIMARY_LOCATION_ID", "42"),
            ("ENABLE_TEST_ENDPOINTS", "false"),
        ]);
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_version, "2024-04");
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9999/proxy/");
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.location_strategy, LocationStrategy::Primary(42));
        assert!(!config.enable_test_endpoints);
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "not-a-port"));
        let err = ServiceConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let mut vars = REQUIRED.to_vec();
        vars.push(("INVENTORY_REQUEST_TIMEOUT_SECS", "0"));
        assert!(ServiceConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("ENABLE_TEST_ENDPOINTS", "maybe"));
        assert!(ServiceConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("INVENTORY_RETRY_BASE_DELAY_MS", "5000"));
        vars.push(("INVENTORY_RETRY_MAX_DELAY_MS", "100"));
        assert!(ServiceConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServiceConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("whsec-test-secret-value"));
        assert!(!debug.contains("shpat_test"));
        assert!(debug.contains("demo.myshopify.com"));
    }
}
