//! Project configuration for conformance runs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::flags::{DEFAULT_RADIUS_MARGIN, Flags};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI document (local file). Unset uses the bundled carpooling document.
    #[serde(default)]
    pub spec: Option<PathBuf>,

    /// Base URL of the server under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP headers sent with every request (API keys, etc.)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Relative margin added to query radii (0.01 = 1%)
    #[serde(default = "default_radius_margin")]
    pub radius_margin: f64,

    /// Show passing assertions too
    #[serde(default)]
    pub verbose: bool,

    /// Requests to test with `ridecheck run`
    #[serde(default)]
    pub requests: Vec<RequestCase>,
}

/// One request to issue and check.
///
/// ```toml
/// [[requests]]
/// method = "GET"
/// path = "/driver_journeys"
/// query = { departureLat = "46.16", departureLng = "-1.22" }
/// expect = { non_empty = true }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCase {
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,

    /// Path relative to `base_url`, may carry a query string
    pub path: String,

    /// Extra query parameters
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// JSON request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// What the response must satisfy
    #[serde(default)]
    pub expect: Expectations,
}

/// Per-request expectations, mapped onto [`Flags`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    /// Exact status code (defaults to the endpoint's success code)
    #[serde(default)]
    pub status: Option<u16>,

    /// Response array must be non-empty
    #[serde(default)]
    pub non_empty: bool,

    /// Booking status the response must carry
    #[serde(default)]
    pub booking_status: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_radius_margin() -> f64 {
    DEFAULT_RADIUS_MARGIN
}

fn default_method() -> String {
    "GET".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: None,
            base_url: default_base_url(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            radius_margin: DEFAULT_RADIUS_MARGIN,
            verbose: false,
            requests: Vec::new(),
        }
    }
}

impl RequestCase {
    /// Full URL of this request against `base_url`, query values form-encoded.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        if self.query.is_empty() {
            return url;
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        url.push(if self.path.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
        url
    }

    /// Test flags for this request.
    #[must_use]
    pub fn flags(&self, radius_margin: f64) -> Flags {
        Flags {
            expect_non_empty: self.expect.non_empty,
            expected_response_code: self.expect.status,
            expected_booking_status: self.expect.booking_status.clone(),
            expect_deep_link_support: false,
            radius_margin,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from default location (.ridecheck.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be loaded
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".ridecheck.toml", ".ridecheck.json", "ridecheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Reject values no run can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got \"{}\"",
                self.base_url
            )));
        }
        if !self.radius_margin.is_finite() || self.radius_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "radius_margin must be a non-negative number, got {}",
                self.radius_margin
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        for (i, case) in self.requests.iter().enumerate() {
            if !case.path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "requests[{i}].path must start with '/', got \"{}\"",
                    case.path
                )));
            }
        }
        Ok(())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# ridecheck configuration

# OpenAPI document (defaults to the bundled carpooling API document)
# spec = "openapi.yaml"

# Server to test
base_url = "http://localhost:8080"

# Transport timeout in seconds
timeout_secs = 10

# Margin added to departureRadius/arrivalRadius before comparing distances
radius_margin = 0.01

# HTTP headers (auth, api keys)
[headers]
# X-API-KEY = "your-api-key"

[[requests]]
method = "GET"
path = "/status"

[[requests]]
method = "GET"
path = "/driver_journeys"
query = { departureLat = "46.1604", departureLng = "-1.2219", arrivalLat = "46.1589", arrivalLng = "-1.1524", departureDate = "1700000000" }
expect = { non_empty = true }

# [[requests]]
# method = "GET"
# path = "/bookings/5b9f2a04-7d7b-4c3b-9d36-0d1f0d6e1a11"
# expect = { booking_status = "CONFIRMED" }
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
