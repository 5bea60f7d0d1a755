//! Client configuration and the base/per-call merge.
//!
//! An [`ApiConfig`] is built once per client and shared, immutable, by many
//! concurrent calls. A per-call override (carried on the request descriptor)
//! is merged over the base config by [`ApiConfig::merge`] before every call.

use crate::{body::BodyCodec, retry::RetryPolicy, Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Immutable configuration shared by every call made through one client.
///
/// # Examples
///
/// ```
/// use wirecall::{ApiConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = ApiConfig::builder()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .retry_policy(RetryPolicy::fixed_delay(
///         Duration::from_secs(10),
///         Duration::from_millis(100),
///         3,
///     ))
///     .build()?;
/// # Ok::<(), wirecall::Error>(())
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    /// The base URL all request paths are resolved against.
    pub base_url: String,
    /// Headers applied to every request; request headers override on collision.
    pub default_headers: HeaderMap,
    /// Per-attempt request timeout. When present, always positive.
    pub timeout: Option<Duration>,
    /// The retry policy for calls under this config.
    pub retry_policy: Option<RetryPolicy>,
    /// The codec used to serialize outbound bodies; `None` means the default
    /// handler chain.
    pub body_codec: Option<Arc<dyn BodyCodec>>,
    /// Whether the transport should follow redirects.
    pub follow_redirects: bool,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("body_codec", &self.body_codec.as_ref().map(|_| "custom"))
            .field("follow_redirects", &self.follow_redirects)
            .finish()
    }
}

impl ApiConfig {
    /// Creates a new [`ApiConfigBuilder`].
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::new()
    }

    /// Merges a per-call override over a base config into the effective
    /// configuration for one call.
    ///
    /// Field semantics:
    /// - `base_url`: the override replaces the base only when non-blank;
    /// - `default_headers`: union of both, override wins on key collision;
    /// - `timeout`, `retry_policy`, `body_codec`: override's value when
    ///   present, else the base's;
    /// - `follow_redirects`: taken **unconditionally from the override**.
    ///   This is a known asymmetry inherited from the runtime this crate
    ///   replaces, kept deliberately and pinned by tests rather than
    ///   silently changed.
    ///
    /// Pure: neither input is modified, and merging never fails.
    pub fn merge(base: &ApiConfig, overlay: Option<&ApiConfig>) -> ApiConfig {
        let Some(overlay) = overlay else {
            return base.clone();
        };

        let mut default_headers = base.default_headers.clone();
        for (name, value) in overlay.default_headers.iter() {
            default_headers.insert(name.clone(), value.clone());
        }

        ApiConfig {
            base_url: if overlay.base_url.trim().is_empty() {
                base.base_url.clone()
            } else {
                overlay.base_url.clone()
            },
            default_headers,
            timeout: overlay.timeout.or(base.timeout),
            retry_policy: overlay
                .retry_policy
                .clone()
                .or_else(|| base.retry_policy.clone()),
            body_codec: overlay
                .body_codec
                .clone()
                .or_else(|| base.body_codec.clone()),
            follow_redirects: overlay.follow_redirects,
        }
    }
}

/// Builder for [`ApiConfig`].
pub struct ApiConfigBuilder {
    base_url: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    body_codec: Option<Arc<dyn BodyCodec>>,
    follow_redirects: bool,
}

impl ApiConfigBuilder {
    /// Creates a builder with an empty base URL, no headers, no timeout, no
    /// retry policy, and redirect following enabled.
    pub fn new() -> Self {
        Self {
            base_url: String::new(),
            default_headers: HeaderMap::new(),
            timeout: None,
            retry_policy: None,
            body_codec: None,
            follow_redirects: true,
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// A per-call override config may leave this blank to inherit the base
    /// client's URL during the merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let parsed = Url::parse(url.as_ref())
            .map_err(|e| Error::Config(format!("Invalid base URL: {e}")))?;
        self.base_url = parsed.to_string();
        Ok(self)
    }

    /// Adds a default header included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Config(format!("Invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Config(format!("Invalid header value: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets a custom body codec replacing the default handler chain.
    pub fn body_codec(mut self, codec: Arc<dyn BodyCodec>) -> Self {
        self.body_codec = Some(codec);
        self
    }

    /// Sets whether the transport should follow redirects.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Builds the `ApiConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a zero timeout was configured.
    pub fn build(self) -> Result<ApiConfig> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config("timeout must be > 0".to_string()));
        }
        Ok(ApiConfig {
            base_url: self.base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            body_codec: self.body_codec,
            follow_redirects: self.follow_redirects,
        })
    }
}

impl Default for ApiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ApiConfig {
        ApiConfig::builder()
            .base_url("https://base.test")
            .unwrap()
            .default_header("X-Shared", "base")
            .unwrap()
            .default_header("X-Base-Only", "base")
            .unwrap()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_merge_without_override_returns_base() {
        let base = base();
        let merged = ApiConfig::merge(&base, None);
        assert_eq!(merged.base_url, base.base_url);
        assert_eq!(merged.default_headers, base.default_headers);
        assert_eq!(merged.timeout, base.timeout);
    }

    #[test]
    fn test_merge_headers_override_wins_on_collision() {
        let base = base();
        let overlay = ApiConfig::builder()
            .default_header("X-Shared", "override")
            .unwrap()
            .default_header("X-Override-Only", "override")
            .unwrap()
            .build()
            .unwrap();

        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert_eq!(merged.default_headers.get("X-Shared").unwrap(), "override");
        assert_eq!(merged.default_headers.get("X-Base-Only").unwrap(), "base");
        assert_eq!(
            merged.default_headers.get("X-Override-Only").unwrap(),
            "override"
        );
    }

    #[test]
    fn test_merge_blank_override_base_url_keeps_base() {
        let base = base();
        let overlay = ApiConfig::builder().build().unwrap();
        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert_eq!(merged.base_url, base.base_url);
    }

    #[test]
    fn test_merge_non_blank_override_base_url_replaces_base() {
        let base = base();
        let overlay = ApiConfig::builder()
            .base_url("https://override.test")
            .unwrap()
            .build()
            .unwrap();
        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert_eq!(merged.base_url, "https://override.test/");
    }

    #[test]
    fn test_merge_optionals_fall_back_to_base() {
        let base = base();
        let overlay = ApiConfig::builder().build().unwrap();
        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_merge_optionals_prefer_override_when_present() {
        let base = base();
        let overlay = ApiConfig::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));
    }

    // Pins the documented asymmetry: follow_redirects always comes from the
    // override, even when the override never set it explicitly.
    #[test]
    fn test_merge_follow_redirects_taken_unconditionally_from_override() {
        let mut base = base();
        base.follow_redirects = false;

        let overlay = ApiConfig::builder().build().unwrap();
        let merged = ApiConfig::merge(&base, Some(&overlay));
        assert!(merged.follow_redirects);

        let overlay = ApiConfig::builder().follow_redirects(false).build().unwrap();
        let base_with_true = self::base();
        let merged = ApiConfig::merge(&base_with_true, Some(&overlay));
        assert!(!merged.follow_redirects);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = ApiConfig::builder().timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = ApiConfig::builder().base_url("not a url");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
