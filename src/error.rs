//! Error taxonomy for the call runtime.
//!
//! Every failure mode has a dedicated variant so callers can distinguish
//! request-shape bugs (URL, codec, mapper errors) from transient transport
//! failures and retry exhaustion. [`Error::Call`] is the single top-level
//! wrapper produced by the API caller; it always carries the originating
//! [`RequestDescriptor`] and, when available, the response that failed to map.

use crate::{request::RequestDescriptor, response::ResponseEnvelope};

/// The main error type for the call runtime.
///
/// # Examples
///
/// ```no_run
/// use wirecall::{Error, ApiCaller};
///
/// # async fn example(caller: ApiCaller, request: wirecall::RequestDescriptor, mapper: wirecall::ResponseMapper<serde_json::Value>) {
/// match caller.call(request, &mapper).await {
///     Ok(value) => println!("Success: {:?}", value),
///     Err(Error::Call { request, response, source }) => {
///         eprintln!("Call to {} failed: {}", request.path_template, source);
///         if let Some(response) = response {
///             eprintln!("  last response status: {}", response.status);
///         }
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Required configuration was missing or invalid.
    ///
    /// Raised when a call resolves no retry policy, or when a builder is
    /// given an invalid base URL or header.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path template placeholder had no matching path parameter.
    ///
    /// Unresolved `{placeholder}` tokens must never reach the transport, so
    /// URL resolution fails fast before any network activity.
    #[error("Unresolved placeholder `{{{placeholder}}}` in path template `{template}`")]
    UrlResolution {
        /// The placeholder name that had no matching parameter.
        placeholder: String,
        /// The path template being resolved.
        template: String,
    },

    /// No codec handler accepted the outbound body shape.
    #[error("Failed to serialize request body: {0}")]
    Serialization(String),

    /// No mapper was registered for a [`TypeKey`](crate::TypeKey), or an
    /// empty body was mapped against a non-nullable target.
    #[error("No response mapper: {0}")]
    MapperNotFound(String),

    /// A resolved mapper failed to decode the response body.
    ///
    /// Preserves the target type name and the decoder's message, making
    /// decode failures debuggable without re-running the call.
    #[error("Failed to decode response body into `{target}`: {detail}")]
    Decode {
        /// The target type the body was decoded into.
        target: &'static str,
        /// The decoder error message.
        detail: String,
    },

    /// An opaque failure raised by the transport adapter.
    ///
    /// The runtime never inspects these beyond the retry predicate; they pass
    /// through untouched except for final [`Error::Call`] wrapping.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The retry deadline elapsed before any attempt recorded a failure.
    ///
    /// Distinct from [`Error::RetryExhausted`]: there is no underlying
    /// cause to report, because the budget ran out before the first
    /// attempt completed.
    #[error("Retry budget elapsed before any attempt completed")]
    RetryTimeout,

    /// The retry loop ran out of budget or attempts.
    ///
    /// Wraps the last underlying error recorded before giving up.
    #[error("Retry exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// The number of attempts made.
        attempts: usize,
        /// The last error recorded before giving up.
        #[source]
        last_error: Box<Error>,
    },

    /// Top-level wrapper produced by the API caller.
    ///
    /// Carries the originating request and, when the failure happened after a
    /// transport exchange, the response that failed to map.
    #[error("API call failed: {source}")]
    Call {
        /// The request descriptor that initiated the call.
        request: Box<RequestDescriptor>,
        /// The response that failed to map, when one was received.
        response: Option<ResponseEnvelope>,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The call was cancelled by its cancellation token.
    ///
    /// Cancellation is never wrapped and never retried; it propagates
    /// verbatim through every layer.
    #[error("Call cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error is potentially retryable.
    ///
    /// Only transport errors are: URL, codec and mapper errors represent
    /// request-shape bugs, and cancellation must never be retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirecall::Error;
    ///
    /// assert!(Error::transport("connection reset").is_retryable());
    /// assert!(!Error::Serialization("unsupported shape".to_string()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Constructs an opaque transport error from a message.
    ///
    /// Convenience for transport adapters that fail for reasons other than an
    /// underlying engine error (e.g. executing against a closed adapter).
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into().into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(Box::new(e))
    }
}

/// A specialized `Result` type for the call runtime.
pub type Result<T> = std::result::Result<T, Error>;
