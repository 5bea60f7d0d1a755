//! Resolving a neutral type descriptor into a typed response mapping.
//!
//! A [`TypeKey`] describes the desired result shape (a single value or a
//! list, nullable or not) without naming any serialization library. A
//! [`ResponseMapperFactory`] resolves a key into an erased byte-to-value
//! mapping; the typed [`ResponseMapper`] front door downcasts the result.
//! Multiple backends coexist behind a [`DelegatingMapperFactory`] with a
//! first-success-wins contract, so callers never carry switching logic.

use crate::{response::ResponseEnvelope, Error, Result};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Identity of a decoded element type: its `TypeId` plus a readable name for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    id: TypeId,
    name: &'static str,
}

impl Shape {
    /// The shape of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type name this shape was created from.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A neutral, serializer-agnostic description of the desired decoded shape.
///
/// # Examples
///
/// ```
/// use wirecall::TypeKey;
///
/// #[derive(serde::Deserialize)]
/// struct Post { id: u64 }
///
/// let one = TypeKey::single::<Post>();
/// let maybe = TypeKey::nullable::<Post>();
/// let many = TypeKey::list::<Post>();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKey {
    /// A single value of the element shape.
    Single {
        /// The element type.
        shape: Shape,
        /// Whether an empty body maps to an absent value instead of an error.
        nullable: bool,
    },
    /// A sequence of values of the element shape.
    List {
        /// The element type.
        element: Shape,
        /// Whether list elements may be null.
        element_nullable: bool,
    },
}

impl TypeKey {
    /// A single, required value of type `T`.
    pub fn single<T: 'static>() -> Self {
        TypeKey::Single {
            shape: Shape::of::<T>(),
            nullable: false,
        }
    }

    /// A single value of type `T` where an empty body maps to `None`.
    /// Resolves to a mapper producing `Option<T>`.
    pub fn nullable<T: 'static>() -> Self {
        TypeKey::Single {
            shape: Shape::of::<T>(),
            nullable: true,
        }
    }

    /// A list of values of type `T`. Resolves to a mapper producing `Vec<T>`.
    pub fn list<T: 'static>() -> Self {
        TypeKey::List {
            element: Shape::of::<T>(),
            element_nullable: false,
        }
    }

    /// A list of nullable values of type `T`. Resolves to a mapper producing
    /// `Vec<Option<T>>`.
    pub fn list_nullable<T: 'static>() -> Self {
        TypeKey::List {
            element: Shape::of::<T>(),
            element_nullable: true,
        }
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKey::Single { shape, nullable } => {
                write!(f, "Single({}{})", shape.name(), if *nullable { ", nullable" } else { "" })
            }
            TypeKey::List {
                element,
                element_nullable,
            } => write!(
                f,
                "List({}{})",
                element.name(),
                if *element_nullable { ", nullable elements" } else { "" }
            ),
        }
    }
}

type ErasedValue = Box<dyn Any + Send>;
type ErasedMapFn = dyn Fn(&ResponseEnvelope) -> Result<ErasedValue> + Send + Sync;

/// A resolved, type-erased mapping from a response envelope to a value.
///
/// Produced by factories; wrap it in a [`ResponseMapper`] to recover the
/// concrete type.
#[derive(Clone)]
pub struct ErasedMapper {
    map: Arc<ErasedMapFn>,
}

impl std::fmt::Debug for ErasedMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedMapper").finish_non_exhaustive()
    }
}

impl ErasedMapper {
    /// Creates an erased mapper from a mapping function.
    pub fn new<T, F>(map: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&ResponseEnvelope) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            map: Arc::new(move |response| map(response).map(|v| Box::new(v) as ErasedValue)),
        }
    }

    /// Applies the mapping to a response.
    pub fn map_erased(&self, response: &ResponseEnvelope) -> Result<ErasedValue> {
        (self.map)(response)
    }
}

/// The typed front door over an [`ErasedMapper`].
///
/// # Examples
///
/// ```
/// use wirecall::{JsonMapperFactory, ResponseMapper, TypeKey};
///
/// #[derive(serde::Deserialize)]
/// struct Post { id: u64 }
///
/// let factory = JsonMapperFactory::new().with_shape::<Post>();
/// let mapper: ResponseMapper<Post> =
///     ResponseMapper::resolve(&factory, &TypeKey::single::<Post>())?;
/// # Ok::<(), wirecall::Error>(())
/// ```
pub struct ResponseMapper<T> {
    inner: ErasedMapper,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ResponseMapper<T> {
    /// Wraps an erased mapper; `map` fails if it produces another type.
    pub fn new(inner: ErasedMapper) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Resolves a key against a factory and wraps the result.
    pub fn resolve(factory: &dyn ResponseMapperFactory, key: &TypeKey) -> Result<Self> {
        Ok(Self::new(factory.resolve(key)?))
    }

    /// Builds a mapper directly from a typed mapping function, bypassing
    /// factory resolution.
    pub fn from_fn<F>(map: F) -> Self
    where
        T: Send,
        F: Fn(&ResponseEnvelope) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(ErasedMapper::new(map))
    }

    /// Maps a response envelope into the typed result.
    pub fn map(&self, response: &ResponseEnvelope) -> Result<T> {
        let value = self.inner.map_erased(response)?;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            Error::MapperNotFound(format!(
                "mapper produced a value of unexpected type for `{}`",
                std::any::type_name::<T>()
            ))
        })
    }
}

/// Resolves [`TypeKey`]s into erased response mappings.
pub trait ResponseMapperFactory: Send + Sync {
    /// Returns a mapper for the key, or `None` when this factory does not
    /// know the shape.
    fn try_resolve(&self, key: &TypeKey) -> Option<ErasedMapper>;

    /// Like [`ResponseMapperFactory::try_resolve`], but failing with
    /// [`Error::MapperNotFound`] when the key is unknown.
    fn resolve(&self, key: &TypeKey) -> Result<ErasedMapper> {
        self.try_resolve(key)
            .ok_or_else(|| Error::MapperNotFound(format!("no mapper for key {key}")))
    }
}

struct Registration {
    single: ErasedMapper,
    nullable: ErasedMapper,
    list: ErasedMapper,
    list_nullable: ErasedMapper,
}

/// A `serde_json`-backed factory with explicit shape registration.
///
/// Each registered `T` resolves four keys: `Single` (required and nullable)
/// and `List` (required and nullable elements). Registration is explicit:
/// generated client stubs register every shape they decode at construction
/// time.
#[derive(Default)]
pub struct JsonMapperFactory {
    registrations: HashMap<TypeId, Registration>,
}

fn decode_json<T: DeserializeOwned + 'static>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode {
        target: std::any::type_name::<T>(),
        detail: e.to_string(),
    })
}

fn empty_body_error<T>() -> Error {
    Error::MapperNotFound(format!(
        "empty body for non-nullable target `{}`",
        std::any::type_name::<T>()
    ))
}

impl JsonMapperFactory {
    /// Creates a factory with no registered shapes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, enabling resolution of single, nullable, and list keys
    /// built from it.
    pub fn with_shape<T: DeserializeOwned + Send + 'static>(mut self) -> Self {
        let registration = Registration {
            single: ErasedMapper::new(|response: &ResponseEnvelope| {
                if response.body_is_empty() {
                    return Err(empty_body_error::<T>());
                }
                decode_json::<T>(response.body.as_deref().unwrap_or_default())
            }),
            nullable: ErasedMapper::new(|response: &ResponseEnvelope| {
                if response.body_is_empty() {
                    return Ok(None::<T>);
                }
                decode_json::<T>(response.body.as_deref().unwrap_or_default()).map(Some)
            }),
            list: ErasedMapper::new(|response: &ResponseEnvelope| {
                if response.body_is_empty() {
                    return Err(empty_body_error::<Vec<T>>());
                }
                decode_json::<Vec<T>>(response.body.as_deref().unwrap_or_default())
            }),
            list_nullable: ErasedMapper::new(|response: &ResponseEnvelope| {
                if response.body_is_empty() {
                    return Err(empty_body_error::<Vec<Option<T>>>());
                }
                decode_json::<Vec<Option<T>>>(response.body.as_deref().unwrap_or_default())
            }),
        };
        self.registrations.insert(TypeId::of::<T>(), registration);
        self
    }
}

impl ResponseMapperFactory for JsonMapperFactory {
    fn try_resolve(&self, key: &TypeKey) -> Option<ErasedMapper> {
        match key {
            TypeKey::Single { shape, nullable } => {
                let registration = self.registrations.get(&shape.id)?;
                Some(if *nullable {
                    registration.nullable.clone()
                } else {
                    registration.single.clone()
                })
            }
            TypeKey::List {
                element,
                element_nullable,
            } => {
                let registration = self.registrations.get(&element.id)?;
                Some(if *element_nullable {
                    registration.list_nullable.clone()
                } else {
                    registration.list.clone()
                })
            }
        }
    }
}

/// An ordered list of factories, resolved first-success-wins.
///
/// Lets several codec backends coexist without switching logic in callers.
pub struct DelegatingMapperFactory {
    factories: Vec<Box<dyn ResponseMapperFactory>>,
}

impl DelegatingMapperFactory {
    /// Creates a delegating factory over the given backends, consulted in
    /// order.
    pub fn new(factories: Vec<Box<dyn ResponseMapperFactory>>) -> Self {
        Self { factories }
    }
}

impl ResponseMapperFactory for DelegatingMapperFactory {
    fn try_resolve(&self, key: &TypeKey) -> Option<ErasedMapper> {
        self.factories.iter().find_map(|f| f.try_resolve(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        id: u64,
        title: String,
    }

    fn envelope(body: Option<&str>) -> ResponseEnvelope {
        ResponseEnvelope::new(
            StatusCode::OK,
            HeaderMap::new(),
            body.map(|b| b.as_bytes().to_vec()),
        )
    }

    fn factory() -> JsonMapperFactory {
        JsonMapperFactory::new().with_shape::<Post>()
    }

    #[test]
    fn test_single_key_decodes_body() {
        let mapper: ResponseMapper<Post> =
            ResponseMapper::resolve(&factory(), &TypeKey::single::<Post>()).unwrap();
        let post = mapper
            .map(&envelope(Some("{\"id\":1,\"title\":\"Hello\"}")))
            .unwrap();
        assert_eq!(
            post,
            Post {
                id: 1,
                title: "Hello".to_string()
            }
        );
    }

    #[test]
    fn test_nullable_single_returns_none_for_empty_body() {
        let mapper: ResponseMapper<Option<Post>> =
            ResponseMapper::resolve(&factory(), &TypeKey::nullable::<Post>()).unwrap();
        assert_eq!(mapper.map(&envelope(None)).unwrap(), None);
        assert_eq!(mapper.map(&envelope(Some(""))).unwrap(), None);
    }

    #[test]
    fn test_non_nullable_single_rejects_empty_body() {
        let mapper: ResponseMapper<Post> =
            ResponseMapper::resolve(&factory(), &TypeKey::single::<Post>()).unwrap();
        let result = mapper.map(&envelope(None));
        match result {
            Err(Error::MapperNotFound(message)) => {
                assert!(message.contains("empty body for non-nullable target"));
            }
            other => panic!("Expected MapperNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_key_decodes_sequence() {
        let mapper: ResponseMapper<Vec<Post>> =
            ResponseMapper::resolve(&factory(), &TypeKey::list::<Post>()).unwrap();
        let posts = mapper
            .map(&envelope(Some(
                "[{\"id\":1,\"title\":\"a\"},{\"id\":2,\"title\":\"b\"}]",
            )))
            .unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].id, 2);
    }

    #[test]
    fn test_unregistered_shape_is_mapper_not_found() {
        #[derive(Deserialize)]
        struct Unregistered;

        let result = factory().resolve(&TypeKey::single::<Unregistered>());
        assert!(matches!(result, Err(Error::MapperNotFound(_))));
    }

    #[test]
    fn test_decode_failure_preserves_target_and_detail() {
        let mapper: ResponseMapper<Post> =
            ResponseMapper::resolve(&factory(), &TypeKey::single::<Post>()).unwrap();
        let result = mapper.map(&envelope(Some("not json")));
        match result {
            Err(Error::Decode { target, detail }) => {
                assert!(target.contains("Post"));
                assert!(detail.contains("expected"));
            }
            other => panic!("Expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_delegating_factory_first_success_wins() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Comment {
            id: u64,
        }

        let delegating = DelegatingMapperFactory::new(vec![
            Box::new(JsonMapperFactory::new().with_shape::<Post>()),
            Box::new(JsonMapperFactory::new().with_shape::<Comment>()),
        ]);

        assert!(delegating.try_resolve(&TypeKey::single::<Post>()).is_some());
        assert!(delegating
            .try_resolve(&TypeKey::single::<Comment>())
            .is_some());
        assert!(delegating.try_resolve(&TypeKey::single::<i64>()).is_none());
    }

    #[test]
    fn test_delegating_factory_reports_no_mapper_for_key() {
        let delegating = DelegatingMapperFactory::new(vec![]);
        match delegating.resolve(&TypeKey::single::<Post>()) {
            Err(Error::MapperNotFound(message)) => {
                assert!(message.contains("no mapper for key"));
            }
            other => panic!("Expected MapperNotFound, got {other:?}"),
        }
    }
}
