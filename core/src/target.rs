//! Request target descriptor

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Url;

use crate::config::ConfigError;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("hammer/", env!("CARGO_PKG_VERSION"));

/// What every worker requests: a URL plus a fixed header set
///
/// Immutable once built; workers share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    headers: HeaderMap,
}

impl Target {
    /// Parse and validate a target URL
    ///
    /// Only `http` and `https` URLs with a host are accepted. The default
    /// user agent is installed.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidTarget("target URL is empty".into()));
        }

        let url = Url::parse(url).map_err(|e| ConfigError::InvalidTarget(format!("{url}: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::InvalidTarget(format!(
                    "unsupported scheme '{other}', expected http or https"
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidTarget(format!("{url}: missing host")));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Ok(Self { url, headers })
    }

    /// Replace the user agent
    pub fn with_user_agent(self, user_agent: &str) -> Result<Self, ConfigError> {
        self.with_header(USER_AGENT.as_str(), user_agent)
    }

    /// Add or replace a header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a header given as `NAME:VALUE`
    pub fn with_header_line(self, line: &str) -> Result<Self, ConfigError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidHeader(format!("expected NAME:VALUE, got '{line}'")))?;
        self.with_header(name, value)
    }

    /// Target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
