//! The immutable description of one API call before URL/body resolution.

use crate::{body::Body, config::ApiConfig, Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::collections::HashMap;

/// Everything needed to make one call: method, path template, parameters,
/// headers, body, and an optional per-call config override.
///
/// Built fresh per call via [`RequestDescriptor::builder`], immutable once
/// constructed, and consumed by the caller.
///
/// # Examples
///
/// ```
/// use wirecall::RequestDescriptor;
/// use http::Method;
///
/// let request = RequestDescriptor::builder(Method::GET, "/users/{id}/posts")
///     .path_param("id", "7")
///     .query_param("limit", "10")
///     .optional_query_param("expand", None::<String>)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: Method,
    /// The request path template, relative to the base URL; may contain
    /// `{name}` placeholders.
    pub path_template: String,
    /// Values substituted into the template's placeholders.
    pub path_params: HashMap<String, String>,
    /// Additional headers for this request; override config defaults on
    /// collision.
    pub headers: HeaderMap,
    /// Query parameters in insertion order; entries with an absent value are
    /// dropped from the URL entirely.
    pub query_params: Vec<(String, Option<String>)>,
    /// The outbound body.
    pub body: Body,
    /// The requested media type; overrides the codec's default.
    pub content_type: Option<String>,
    /// A per-call configuration merged over the client's base config.
    pub per_call_config: Option<ApiConfig>,
}

impl RequestDescriptor {
    /// Creates a new [`RequestDescriptorBuilder`] for the given method and
    /// path template.
    pub fn builder(method: Method, path_template: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            descriptor: RequestDescriptor {
                method,
                path_template: path_template.into(),
                path_params: HashMap::new(),
                headers: HeaderMap::new(),
                query_params: Vec::new(),
                body: Body::Empty,
                content_type: None,
                per_call_config: None,
            },
        }
    }

    /// A GET request for the given path template.
    pub fn get(path_template: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::GET, path_template)
    }

    /// A POST request for the given path template.
    pub fn post(path_template: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(Method::POST, path_template)
    }
}

/// Builder for [`RequestDescriptor`].
pub struct RequestDescriptorBuilder {
    descriptor: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    /// Adds a path parameter substituted into the matching `{name}`
    /// placeholder.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.path_params.insert(name.into(), value.into());
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Config(format!("Invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Config(format!("Invalid header value: {e}")))?;
        self.descriptor.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter with a present value.
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor
            .query_params
            .push((name.into(), Some(value.into())));
        self
    }

    /// Adds a query parameter whose value may be absent; absent values are
    /// dropped from the final URL.
    pub fn optional_query_param(
        mut self,
        name: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> Self {
        self.descriptor
            .query_params
            .push((name.into(), value.map(Into::into)));
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.descriptor.body = body.into();
        self
    }

    /// Serializes a value as a structured JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted to JSON.
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.descriptor.body = Body::json(value)?;
        Ok(self)
    }

    /// Sets the requested content type, overriding the codec default.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.descriptor.content_type = Some(content_type.into());
        self
    }

    /// Attaches a per-call configuration merged over the client's base
    /// config for this call only.
    pub fn per_call_config(mut self, config: ApiConfig) -> Self {
        self.descriptor.per_call_config = Some(config);
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> RequestDescriptor {
        self.descriptor
    }
}
