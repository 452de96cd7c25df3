//! Configuration for the OCR HTTP client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default timeout for a single request: 60 seconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Configuration for [`OcrClient`].
///
/// The client copies the configuration at construction time, so changing a
/// config value afterwards never affects a live client.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use paddleocr_client::OcrConfig;
///
/// let config = OcrConfig::new("http://ocr.internal:8000/")
///     .unwrap()
///     .with_timeout(Duration::from_secs(120));
///
/// assert_eq!(config.base_url(), "http://ocr.internal:8000");
/// assert_eq!(config.timeout(), Duration::from_secs(120));
/// ```
///
/// [`OcrClient`]: crate::OcrClient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OcrConfig {
    /// Base URL of the OCR service
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-url", env = "OCR_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-timeout-ms", env = "OCR_TIMEOUT_MS", default_value = "60000")
    )]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(feature = "config", arg(long = "ocr-user-agent", env = "OCR_USER_AGENT"))]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: None,
        }
    }
}

impl OcrConfig {
    /// Creates a configuration for the given base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let config = Self {
            base_url: base_url.as_ref().trim().to_owned(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the base URL is usable.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.base_url()).map_err(|e| {
            Error::configuration(format!("invalid base URL '{}': {e}", self.base_url))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::configuration(format!(
                "unsupported URL scheme '{scheme}' in base URL '{}'",
                self.base_url
            ))),
        }
    }

    /// Returns the base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            self.timeout()
        }
    }

    /// Returns the effective user agent, using the default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|agent| !agent.is_empty())
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("paddleocr-client/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_default_config() {
        let config = OcrConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.user_agent.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slashes_are_removed() {
        let config = OcrConfig::new("http://localhost:8000///").unwrap();
        assert_eq!(config.base_url(), "http://localhost:8000");

        let config = OcrConfig::new("https://ocr.example.com/prefix/").unwrap();
        assert_eq!(config.base_url(), "https://ocr.example.com/prefix");
    }

    #[test]
    fn test_invalid_url() {
        let error = OcrConfig::new("not a valid url").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.is_input_error());

        let error = OcrConfig::new("ftp://files.example.com").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_builder_pattern() {
        let config = OcrConfig::new("http://localhost:9000")
            .unwrap()
            .with_timeout(Duration::from_millis(1500))
            .with_user_agent("custom-agent/1.0");

        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.effective_user_agent(), "custom-agent/1.0");
    }

    #[test]
    fn test_effective_defaults() {
        let config = OcrConfig {
            timeout_ms: 0,
            user_agent: Some(String::new()),
            ..OcrConfig::default()
        };

        assert_eq!(
            config.effective_timeout(),
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
        assert!(config.effective_user_agent().starts_with("paddleocr-client/"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: OcrConfig =
            serde_json::from_str(r#"{ "base_url": "http://ocr:8000/" }"#).unwrap();
        assert_eq!(config.base_url(), "http://ocr:8000");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
