//! # Wirecall - a typed HTTP call runtime
//!
//! Wirecall executes declaratively-described HTTP calls: it merges base and
//! per-call configuration, resolves a URL template, serializes the body
//! through a pluggable codec chain, runs the exchange under a retry/backoff
//! policy, and maps the raw response into a typed result. It is the runtime
//! half of a generated-client setup: code generators emit stubs that only
//! construct [`RequestDescriptor`]s and hand them to an [`ApiCaller`].
//!
//! The runtime is transport-agnostic: every physical exchange goes through
//! an injected [`Transport`](transport::Transport). A `reqwest`-backed
//! adapter ships in [`transport`], but nothing in the pipeline depends on it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wirecall::{
//!     ApiCaller, ApiConfig, JsonMapperFactory, RequestDescriptor, ResponseMapper, RetryPolicy,
//!     TypeKey,
//! };
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wirecall::Error> {
//!     let config = ApiConfig::builder()
//!         .base_url("https://api.example.com")?
//!         .timeout(Duration::from_secs(30))
//!         .default_header("User-Agent", "my-app/1.0")?
//!         .retry_policy(RetryPolicy::exponential_backoff(
//!             Duration::from_secs(30),
//!             3,
//!             Duration::from_millis(100),
//!             2.0,
//!             Duration::from_secs(10),
//!             0.1,
//!         ))
//!         .build()?;
//!
//!     let caller = ApiCaller::builder().config(config).build()?;
//!
//!     let factory = JsonMapperFactory::new().with_shape::<Post>();
//!     let post_mapper: ResponseMapper<Post> =
//!         ResponseMapper::resolve(&factory, &TypeKey::single::<Post>())?;
//!
//!     let request = RequestDescriptor::get("/posts/{id}")
//!         .path_param("id", "7")
//!         .query_param("expand", "comments")
//!         .build();
//!
//!     let post = caller.call(request, &post_mapper).await?;
//!     println!("Post {}: {}", post.id, post.title);
//!
//!     caller.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Retry behavior
//!
//! A [`RetryPolicy`] bounds one logical call by wall-clock budget and
//! attempt count. Only the transport exchange is re-attempted; URL and codec
//! errors are request-shape bugs and surface immediately. Cancellation
//! (via [`CancellationToken`]) is observed before every attempt and before
//! every backoff sleep, and always propagates unwrapped:
//!
//! ```
//! use wirecall::RetryPolicy;
//! use std::time::Duration;
//!
//! // Up to 5 attempts with jittered exponential backoff inside a 30s budget.
//! let policy = RetryPolicy::exponential_backoff(
//!     Duration::from_secs(30),
//!     5,
//!     Duration::from_millis(100),
//!     2.0,
//!     Duration::from_secs(10),
//!     0.1,
//! );
//! ```
//!
//! ## Error handling
//!
//! Every failure surfacing from a call is wrapped in [`Error::Call`], which
//! carries the originating request and, when one was received, the response
//! that failed to map:
//!
//! ```no_run
//! use wirecall::{ApiCaller, Error, RequestDescriptor, ResponseMapper};
//!
//! # async fn example(caller: ApiCaller, request: RequestDescriptor, mapper: ResponseMapper<serde_json::Value>) {
//! match caller.call(request, &mapper).await {
//!     Ok(value) => println!("Success: {value:?}"),
//!     Err(Error::Call { request, response, source }) => {
//!         eprintln!("{} {} failed: {source}", request.method, request.path_template);
//!         if let Some(response) = response {
//!             eprintln!("  status: {}", response.status);
//!         }
//!     }
//!     Err(Error::Cancelled) => eprintln!("cancelled"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # }
//! ```

pub mod body;
mod caller;
mod config;
mod error;
pub mod mapper;
mod request;
mod response;
pub mod retry;
pub mod transport;
mod url;

pub use body::{Body, BodyCodec, BodyHandler, DefaultBodyCodec, Payload, Scalar, SerializedBody};
pub use caller::{ApiCaller, ApiCallerBuilder};
pub use config::{ApiConfig, ApiConfigBuilder};
pub use error::{Error, Result};
pub use mapper::{
    DelegatingMapperFactory, ErasedMapper, JsonMapperFactory, ResponseMapper,
    ResponseMapperFactory, Shape, TypeKey,
};
pub use request::{RequestDescriptor, RequestDescriptorBuilder};
pub use response::ResponseEnvelope;
pub use retry::{RetryPolicy, RetryPredicate};
pub use transport::{Transport, TransportRequest};
pub use self::url::build_url;

pub use tokio_util::sync::CancellationToken;
