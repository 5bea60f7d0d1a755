//! Basic example demonstrating simple GET and POST calls.
//!
//! This example shows how to:
//! - Build a configuration with a base URL, timeout, and retry policy
//! - Register response shapes and resolve typed mappers
//! - Make GET requests to fetch data
//! - Make POST requests to create data
//!
//! Run with: `cargo run --example basic_call`

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wirecall::{
    ApiCaller, ApiConfig, Error, JsonMapperFactory, RequestDescriptor, ResponseMapper,
    RetryPolicy, TypeKey,
};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("wirecall=debug,basic_call=info")
        .init();

    // Create a caller for the JSONPlaceholder API
    let config = ApiConfig::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .timeout(Duration::from_secs(30))
        .retry_policy(RetryPolicy::fixed_delay(
            Duration::from_secs(10),
            Duration::from_millis(200),
            3,
        ))
        .build()?;
    let caller = ApiCaller::builder().config(config).build()?;

    // Register every shape this program decodes, up front
    let factory = JsonMapperFactory::new().with_shape::<Post>();
    let post_mapper: ResponseMapper<Post> =
        ResponseMapper::resolve(&factory, &TypeKey::single::<Post>())?;
    let posts_mapper: ResponseMapper<Vec<Post>> =
        ResponseMapper::resolve(&factory, &TypeKey::list::<Post>())?;

    println!("=== GET Request Example ===");
    let request = RequestDescriptor::get("/posts/{id}")
        .path_param("id", "1")
        .build();
    let post = caller.call(request, &post_mapper).await?;

    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Body: {}", post.body);
    println!();

    println!("=== GET List Example ===");
    let request = RequestDescriptor::get("/posts")
        .query_param("userId", "1")
        .build();
    let posts = caller.call(request, &posts_mapper).await?;
    println!("User 1 has {} posts", posts.len());
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let request = RequestDescriptor::post("/posts")
        .json_body(&new_post)?
        .build();
    let created = caller.call(request, &post_mapper).await?;

    println!("Created post ID: {}", created.id);
    println!("Title: {}", created.title);

    caller.close();
    Ok(())
}
