//! Example demonstrating custom retry predicates.
//!
//! This example shows how to:
//! - Create custom retry predicates
//! - Combine predicates with AND/OR logic
//! - Control retry behavior based on error details
//!
//! Run with: `cargo run --example custom_retry`

use std::time::Duration;
use wirecall::retry::{AndPredicate, OrPredicate, RetryOnRetryable};
use wirecall::{
    ApiCaller, ApiConfig, Error, JsonMapperFactory, RequestDescriptor, ResponseMapper,
    RetryPredicate, RetryPolicy, TypeKey,
};

/// Custom predicate: retry only while the error message contains one of the
/// given patterns.
struct RetryOnErrorMessage {
    patterns: Vec<String>,
}

impl RetryPredicate for RetryOnErrorMessage {
    fn should_retry(&self, error: &Error) -> bool {
        let message = error.to_string();
        self.patterns.iter().any(|pattern| message.contains(pattern))
    }
}

/// Custom predicate: never retry decode failures, whatever else says yes.
struct SkipDecodeFailures;

impl RetryPredicate for SkipDecodeFailures {
    fn should_retry(&self, error: &Error) -> bool {
        !matches!(error, Error::Decode { .. })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("wirecall=info,custom_retry=info")
        .init();

    let factory = JsonMapperFactory::new().with_shape::<serde_json::Value>();
    let mapper: ResponseMapper<serde_json::Value> =
        ResponseMapper::resolve(&factory, &TypeKey::single::<serde_json::Value>())?;

    println!("=== Example 1: Retry on Specific Error Messages ===");
    let message_predicate = RetryOnErrorMessage {
        patterns: vec![
            "timeout".to_string(),
            "connection reset".to_string(),
            "temporarily unavailable".to_string(),
        ],
    };

    let config = ApiConfig::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retry_policy(
            RetryPolicy::exponential_backoff(
                Duration::from_secs(30),
                3,
                Duration::from_millis(100),
                2.0,
                Duration::from_secs(5),
                0.1,
            )
            .with_predicate(message_predicate),
        )
        .build()?;
    let caller = ApiCaller::builder().config(config).build()?;

    println!("This caller retries when error messages contain specific patterns");
    let request = RequestDescriptor::get("/posts/{id}")
        .path_param("id", "1")
        .build();
    match caller.call(request, &mapper).await {
        Ok(value) => println!("Success! Fetched: {}", value["title"]),
        Err(e) => println!("Failed: {e}"),
    }
    println!();

    println!("=== Example 2: Combining Predicates with OR ===");
    // Retry on transport failures OR matching error messages
    let or_predicate = OrPredicate::new(vec![
        Box::new(RetryOnRetryable),
        Box::new(RetryOnErrorMessage {
            patterns: vec!["try again later".to_string()],
        }),
    ]);

    let config = ApiConfig::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retry_policy(
            RetryPolicy::fixed_delay(Duration::from_secs(10), Duration::from_millis(500), 3)
                .with_predicate(or_predicate),
        )
        .build()?;
    let caller_or = ApiCaller::builder().config(config).build()?;

    println!("This caller retries on: transport failures OR matching messages");
    let request = RequestDescriptor::get("/posts/{id}")
        .path_param("id", "2")
        .build();
    match caller_or.call(request, &mapper).await {
        Ok(value) => println!("Success! Fetched: {}", value["title"]),
        Err(e) => println!("Failed: {e}"),
    }
    println!();

    println!("=== Example 3: Combining Predicates with AND ===");
    // Retry on transport failures, but never for decode problems
    let and_predicate = AndPredicate::new(vec![
        Box::new(RetryOnRetryable),
        Box::new(SkipDecodeFailures),
    ]);

    let config = ApiConfig::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retry_policy(
            RetryPolicy::fixed_delay(Duration::from_secs(10), Duration::from_millis(500), 5)
                .with_predicate(and_predicate),
        )
        .build()?;
    let caller_and = ApiCaller::builder().config(config).build()?;

    println!("This caller retries transport failures, but never decode failures");
    let request = RequestDescriptor::get("/posts/{id}")
        .path_param("id", "3")
        .build();
    match caller_and.call(request, &mapper).await {
        Ok(value) => println!("Success! Fetched: {}", value["title"]),
        Err(e) => println!("Failed: {e}"),
    }

    Ok(())
}
