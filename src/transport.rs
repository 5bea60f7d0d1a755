//! The boundary abstraction performing one physical exchange, plus the
//! bundled `reqwest` adapter.
//!
//! The runtime core never depends on a concrete HTTP engine: it hands a
//! fully-resolved [`TransportRequest`] and the effective [`ApiConfig`]
//! to whatever [`Transport`] was injected, once per retry attempt.

use crate::{
    body::Payload, config::ApiConfig, response::ResponseEnvelope, Error, Result,
};
use async_trait::async_trait;
use http::{HeaderMap, Method};
use std::sync::atomic::{AtomicBool, Ordering};

/// A fully-resolved request ready for one physical exchange: final URL,
/// final headers, serialized payload. No template or query maps survive to
/// this point.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute URL, placeholders resolved and query string attached.
    pub url: String,
    /// The final header set: config defaults, request headers, codec content
    /// type, already layered.
    pub headers: HeaderMap,
    /// The serialized body payload.
    pub payload: Payload,
}

/// Performs one physical exchange per invocation.
///
/// Implementations must be safe to share across concurrent calls. Errors
/// they raise are opaque to the runtime and pass through untouched except
/// for final [`Error::Call`](crate::Error::Call) wrapping.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes one exchange and returns the raw response envelope.
    ///
    /// Invoked once per retry attempt; the envelope is returned for every
    /// status code, success or not.
    async fn execute(
        &self,
        request: &TransportRequest,
        config: &ApiConfig,
    ) -> Result<ResponseEnvelope>;

    /// Releases underlying resources (connection pools, engines).
    ///
    /// Must be idempotent and safe while calls are still in flight; a close
    /// mid-flight makes in-progress attempts fail with a transport error.
    fn close(&self);
}

/// The bundled [`Transport`] backed by a pooled [`reqwest::Client`].
///
/// # Examples
///
/// ```no_run
/// use wirecall::transport::ReqwestTransport;
///
/// let transport = ReqwestTransport::new()?;
/// # Ok::<(), wirecall::Error>(())
/// ```
pub struct ReqwestTransport {
    client: reqwest::Client,
    closed: AtomicBool,
}

impl ReqwestTransport {
    /// Creates a transport that follows redirects.
    pub fn new() -> Result<Self> {
        Self::with_redirects(true)
    }

    /// Creates a transport with explicit redirect behavior.
    ///
    /// `reqwest` fixes the redirect policy at client construction, so this
    /// honors the base config's `follow_redirects` rather than any per-call
    /// override.
    pub fn with_redirects(follow: bool) -> Result<Self> {
        let policy = if follow {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };
        let client = reqwest::Client::builder()
            .redirect(policy)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
        config: &ApiConfig,
    ) -> Result<ResponseEnvelope> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::transport("transport is closed"));
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Executing HTTP request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.payload {
            Payload::None => builder,
            Payload::Bytes(bytes) => builder.body(bytes.clone()),
            Payload::Text(text) => builder.body(text.clone()),
        };

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            None
        } else {
            Some(bytes.to_vec())
        };

        tracing::info!(
            status = status.as_u16(),
            "Received HTTP response"
        );

        Ok(ResponseEnvelope::new(status, headers, body))
    }

    fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::debug!("Transport closed");
        }
    }
}
