//! The call orchestrator: merge config, build the URL, serialize the body,
//! execute under retry, map the response.
//!
//! [`ApiCaller`] is the entry point generated client stubs are handed. It is
//! cheap to clone and safe to share: configuration is immutable and all
//! per-call state lives on the call's own stack.

use crate::{
    body::{BodyCodec, DefaultBodyCodec},
    config::ApiConfig,
    mapper::ResponseMapper,
    request::RequestDescriptor,
    response::ResponseEnvelope,
    transport::{ReqwestTransport, Transport, TransportRequest},
    url::build_url,
    Error, Result,
};
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

fn default_codec() -> Arc<dyn BodyCodec> {
    static CODEC: OnceLock<Arc<DefaultBodyCodec>> = OnceLock::new();
    CODEC
        .get_or_init(|| Arc::new(DefaultBodyCodec::new()))
        .clone()
}

/// Wraps a surviving failure with its request context. Cancellation must
/// never reach this point.
fn wrap(request: RequestDescriptor, response: Option<ResponseEnvelope>, source: Error) -> Error {
    debug_assert!(!matches!(source, Error::Cancelled));
    Error::Call {
        request: Box::new(request),
        response,
        source: Box::new(source),
    }
}

/// Executes declaratively-described calls against an injected transport.
///
/// # Examples
///
/// ```no_run
/// use wirecall::{
///     ApiCaller, ApiConfig, JsonMapperFactory, RequestDescriptor, ResponseMapper, RetryPolicy,
///     TypeKey,
/// };
/// use std::time::Duration;
///
/// #[derive(serde::Deserialize)]
/// struct User { id: u64, name: String }
///
/// # async fn example() -> Result<(), wirecall::Error> {
/// let config = ApiConfig::builder()
///     .base_url("https://api.example.com")?
///     .retry_policy(RetryPolicy::exponential_backoff(
///         Duration::from_secs(30),
///         3,
///         Duration::from_millis(100),
///         2.0,
///         Duration::from_secs(10),
///         0.1,
///     ))
///     .build()?;
///
/// let caller = ApiCaller::builder().config(config).build()?;
/// let factory = JsonMapperFactory::new().with_shape::<User>();
/// let mapper: ResponseMapper<User> =
///     ResponseMapper::resolve(&factory, &TypeKey::single::<User>())?;
///
/// let request = RequestDescriptor::get("/users/{id}")
///     .path_param("id", "7")
///     .build();
/// let user = caller.call(request, &mapper).await?;
/// println!("User: {}", user.name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiCaller {
    inner: Arc<CallerInner>,
}

struct CallerInner {
    transport: Arc<dyn Transport>,
    base_config: ApiConfig,
    closed: AtomicBool,
}

impl ApiCaller {
    /// Creates a new [`ApiCallerBuilder`].
    pub fn builder() -> ApiCallerBuilder {
        ApiCallerBuilder::new()
    }

    /// The base configuration this caller was built with.
    pub fn config(&self) -> &ApiConfig {
        &self.inner.base_config
    }

    /// Executes one call without external cancellation.
    ///
    /// See [`ApiCaller::call_with_cancellation`] for the full contract.
    pub async fn call<T: 'static>(
        &self,
        request: RequestDescriptor,
        mapper: &ResponseMapper<T>,
    ) -> Result<T> {
        self.call_with_cancellation(&CancellationToken::new(), request, mapper)
            .await
    }

    /// Executes one call under the given cancellation token.
    ///
    /// Pipeline: merge base and per-call config, resolve the retry policy,
    /// build the URL, serialize the body, layer headers (config defaults,
    /// then request headers, then the codec content type only when none is
    /// set), and run the transport exchange under the retry policy. Only
    /// the exchange is re-attempted, never the earlier steps. The successful
    /// envelope is handed to `mapper` for the typed result.
    ///
    /// Any surviving failure is wrapped in [`Error::Call`] carrying the
    /// request and, for mapper failures, the response that failed to map.
    /// Cancellation is checked before any work, before every transport
    /// attempt, and before every backoff sleep; it propagates as
    /// [`Error::Cancelled`], never wrapped and never retried.
    pub async fn call_with_cancellation<T: 'static>(
        &self,
        cancel: &CancellationToken,
        request: RequestDescriptor,
        mapper: &ResponseMapper<T>,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let config = ApiConfig::merge(&self.inner.base_config, request.per_call_config.as_ref());

        let Some(retry_policy) = config.retry_policy.clone() else {
            return Err(wrap(
                request,
                None,
                Error::Config("no retry policy resolved".to_string()),
            ));
        };

        let url = match build_url(
            &config.base_url,
            &request.path_template,
            &request.path_params,
            &request.query_params,
        ) {
            Ok(url) => url,
            Err(e) => return Err(wrap(request, None, e)),
        };

        let codec = config.body_codec.clone().unwrap_or_else(default_codec);
        let serialized = match codec.serialize(&request.body, request.content_type.as_deref()) {
            Ok(serialized) => serialized,
            Err(e) => return Err(wrap(request, None, e)),
        };

        let mut headers = config.default_headers.clone();
        for (name, value) in request.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(content_type) = &serialized.content_type {
            if !headers.contains_key(CONTENT_TYPE) {
                match HeaderValue::try_from(content_type.as_str()) {
                    Ok(value) => {
                        headers.insert(CONTENT_TYPE, value);
                    }
                    Err(e) => {
                        return Err(wrap(
                            request,
                            None,
                            Error::Config(format!("Invalid content type `{content_type}`: {e}")),
                        ));
                    }
                }
            }
        }

        let transport_request = TransportRequest {
            method: request.method.clone(),
            url,
            headers,
            payload: serialized.payload.clone(),
        };

        let transport = Arc::clone(&self.inner.transport);
        let result = retry_policy
            .run(cancel, || {
                let transport = Arc::clone(&transport);
                let attempt_request = transport_request.clone();
                let attempt_config = config.clone();
                async move { transport.execute(&attempt_request, &attempt_config).await }
            })
            .await;

        let envelope = match result {
            Ok(envelope) => envelope,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => return Err(wrap(request, None, e)),
        };

        match mapper.map(&envelope) {
            Ok(value) => Ok(value),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => Err(wrap(request, Some(envelope), e)),
        }
    }

    /// Releases the underlying transport.
    ///
    /// Idempotent: the first close delegates to the transport, any later
    /// close is a silent no-op. Calls still in flight fail with a transport
    /// error rather than panicking.
    pub fn close(&self) {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.transport.close();
        }
    }
}

/// Builder for [`ApiCaller`] with explicitly named dependencies.
///
/// Generated client stubs receive their caller through here: no dynamic
/// constructor discovery, just a fixed wiring surface.
pub struct ApiCallerBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: Option<ApiConfig>,
}

impl ApiCallerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            transport: None,
            config: None,
        }
    }

    /// Injects the transport adapter.
    ///
    /// When omitted, [`ReqwestTransport`](crate::transport::ReqwestTransport)
    /// is built with the config's redirect behavior.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Injects an already-shared transport adapter.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the base configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration was provided, or if the default
    /// transport cannot be constructed.
    pub fn build(self) -> Result<ApiCaller> {
        let config = self
            .config
            .ok_or_else(|| Error::Config("Base configuration is required".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_redirects(config.follow_redirects)?),
        };

        Ok(ApiCaller {
            inner: Arc::new(CallerInner {
                transport,
                base_config: config,
                closed: AtomicBool::new(false),
            }),
        })
    }
}

impl Default for ApiCallerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
