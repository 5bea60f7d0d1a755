//! Outbound body shapes and the codec that serializes them.
//!
//! Dispatch is an ordered chain of [`BodyHandler`]s, each declaring whether it
//! can serialize a given [`Body`] shape. The default chain handles empty
//! bodies, raw bytes, text, scalar primitives, and structured JSON values;
//! new shapes register independently via
//! [`DefaultBodyCodec::with_handler`] without touching the existing handlers.

use crate::{Error, Result};
use serde::Serialize;

/// A primitive body value serialized to its plain-text representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A single character.
    Char(char),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Char(v) => write!(f, "{v}"),
        }
    }
}

/// The opaque outbound value attached to a request.
///
/// # Examples
///
/// ```
/// use wirecall::Body;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct CreateUser { name: String }
///
/// let empty = Body::Empty;
/// let text = Body::from("raw text");
/// let number = Body::from(42i64);
/// let json = Body::json(&CreateUser { name: "Alice".to_string() }).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// No body; the request is sent without a payload.
    #[default]
    Empty,
    /// Raw bytes; passed through untouched.
    Bytes(Vec<u8>),
    /// Text; passed through untouched.
    Text(String),
    /// A primitive value; serialized to its string representation.
    Scalar(Scalar),
    /// A structured value; serialized by the registered structured codec.
    Json(serde_json::Value),
}

impl Body {
    /// Converts a serializable value into a structured JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Returns `true` for [`Body::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// A short name for the shape, used in serialization error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Body::Empty => "empty",
            Body::Bytes(_) => "bytes",
            Body::Text(_) => "text",
            Body::Scalar(_) => "scalar",
            Body::Json(_) => "json",
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value)
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::Bytes(value.to_vec())
    }
}

impl From<i64> for Body {
    fn from(value: i64) -> Self {
        Body::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for Body {
    fn from(value: i32) -> Self {
        Body::Scalar(Scalar::Int(value.into()))
    }
}

impl From<f64> for Body {
    fn from(value: f64) -> Self {
        Body::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for Body {
    fn from(value: bool) -> Self {
        Body::Scalar(Scalar::Bool(value))
    }
}

impl From<char> for Body {
    fn from(value: char) -> Self {
        Body::Scalar(Scalar::Char(value))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

/// A transport-ready payload produced by the codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No payload.
    #[default]
    None,
    /// A binary payload.
    Bytes(Vec<u8>),
    /// A textual payload.
    Text(String),
}

impl Payload {
    /// Returns `true` when there is no payload.
    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }

    /// Returns the payload bytes, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::None => None,
            Payload::Bytes(b) => Some(b),
            Payload::Text(t) => Some(t.as_bytes()),
        }
    }
}

/// The result of serializing a request body: the transport payload plus the
/// content type the codec chose for it (or the caller requested).
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedBody {
    /// The payload the transport adapter will send.
    pub payload: Payload,
    /// The media type for the payload, when one applies.
    pub content_type: Option<String>,
}

impl SerializedBody {
    /// A serialized body with no payload and no content type.
    pub fn empty() -> Self {
        Self {
            payload: Payload::None,
            content_type: None,
        }
    }
}

/// One link in the codec's dispatch chain.
///
/// A handler returns `None` when the shape is not its concern, letting the
/// codec consult the next handler in order.
pub trait BodyHandler: Send + Sync {
    /// Serializes `body` if this handler owns its shape.
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Option<Result<SerializedBody>>;
}

/// Turns outbound values into transport payloads and raw inbound payloads
/// back into bytes.
pub trait BodyCodec: Send + Sync {
    /// Serializes `body`, preferring `requested` over the shape's default
    /// content type.
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Result<SerializedBody>;

    /// The byte-level inverse of [`BodyCodec::serialize`] for untyped
    /// handling; typed decoding goes through the mapper factory instead.
    fn deserialize(&self, raw: &[u8], content_type: Option<&str>) -> Result<Vec<u8>>;
}

struct EmptyHandler;

impl BodyHandler for EmptyHandler {
    fn serialize(&self, body: &Body, _requested: Option<&str>) -> Option<Result<SerializedBody>> {
        match body {
            Body::Empty => Some(Ok(SerializedBody::empty())),
            _ => None,
        }
    }
}

struct BytesHandler;

impl BodyHandler for BytesHandler {
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Option<Result<SerializedBody>> {
        match body {
            Body::Bytes(bytes) => Some(Ok(SerializedBody {
                payload: Payload::Bytes(bytes.clone()),
                content_type: Some(requested.unwrap_or("application/octet-stream").to_string()),
            })),
            _ => None,
        }
    }
}

struct TextHandler;

impl BodyHandler for TextHandler {
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Option<Result<SerializedBody>> {
        match body {
            Body::Text(text) => Some(Ok(SerializedBody {
                payload: Payload::Text(text.clone()),
                content_type: Some(requested.unwrap_or("application/json").to_string()),
            })),
            _ => None,
        }
    }
}

struct ScalarHandler;

impl BodyHandler for ScalarHandler {
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Option<Result<SerializedBody>> {
        match body {
            Body::Scalar(scalar) => Some(Ok(SerializedBody {
                payload: Payload::Text(scalar.to_string()),
                content_type: Some(requested.unwrap_or("text/plain").to_string()),
            })),
            _ => None,
        }
    }
}

struct JsonHandler;

impl BodyHandler for JsonHandler {
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Option<Result<SerializedBody>> {
        match body {
            Body::Json(value) => Some(
                serde_json::to_string(value)
                    .map(|text| SerializedBody {
                        payload: Payload::Text(text),
                        content_type: Some(requested.unwrap_or("application/json").to_string()),
                    })
                    .map_err(|e| Error::Serialization(e.to_string())),
            ),
            _ => None,
        }
    }
}

/// The default codec: an ordered chain covering every built-in shape.
///
/// Dispatch order: empty, bytes, text, scalar, structured JSON. Custom
/// handlers registered via [`DefaultBodyCodec::with_handler`] are consulted
/// first.
pub struct DefaultBodyCodec {
    handlers: Vec<Box<dyn BodyHandler>>,
}

impl DefaultBodyCodec {
    /// Creates the codec with the built-in handler chain.
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(EmptyHandler),
                Box::new(BytesHandler),
                Box::new(TextHandler),
                Box::new(ScalarHandler),
                Box::new(JsonHandler),
            ],
        }
    }

    /// Registers a handler ahead of the built-in chain.
    pub fn with_handler(mut self, handler: impl BodyHandler + 'static) -> Self {
        self.handlers.insert(0, Box::new(handler));
        self
    }
}

impl Default for DefaultBodyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyCodec for DefaultBodyCodec {
    fn serialize(&self, body: &Body, requested: Option<&str>) -> Result<SerializedBody> {
        for handler in &self.handlers {
            if let Some(result) = handler.serialize(body, requested) {
                return result;
            }
        }
        Err(Error::Serialization(format!(
            "no handler for body shape `{}`",
            body.shape_name()
        )))
    }

    fn deserialize(&self, raw: &[u8], _content_type: Option<&str>) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }
}
