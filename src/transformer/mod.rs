//! Transformers and the type registry
//!
//! Transformer types are registered at startup under their fully-qualified
//! name (see [`crate::resolver`]). A name may also be taken by a plain type
//! that does not implement [`Transformer`]; looking such a name up succeeds,
//! but the capability check rejects it.
//!
//! Authorization is an optional capability of a factory. An [`Authorizer`] is
//! produced without building the transformer itself, so a denied request
//! never pays for transformer construction.

pub mod mapped;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::request::RequestContext;

pub use mapped::{HeaderAuthorizer, MappedTransformer, MappedTransformerFactory};

/// Name of the base abstraction every servable type must implement
pub const TRANSFORMER_BASE: &str = "Transformer";

/// Turns a raw row into the shape sent to the client
pub trait Transformer: Send + Sync {
    /// Transform a single row
    fn transform(&self, row: &Value) -> Value;
}

/// Optional per-type authorization check
pub trait Authorizer: Send {
    /// Whether the current request may list this table
    fn authorize(&self) -> bool;
}

/// Builds transformers for one registered type
pub trait TransformerFactory: Send + Sync {
    /// Build a fully-initialized transformer for this request
    fn build(&self, request: &RequestContext) -> Box<dyn Transformer>;

    /// Authorization capability, if the type declares one
    fn authorizer(&self, _request: &RequestContext) -> Option<Box<dyn Authorizer>> {
        None
    }
}

/// Factory backed by a closure
pub struct FnFactory<F> {
    build: F,
}

impl<F, T> FnFactory<F>
where
    F: Fn(&RequestContext) -> T + Send + Sync,
    T: Transformer + 'static,
{
    /// Wrap a closure building a transformer
    pub fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F, T> TransformerFactory for FnFactory<F>
where
    F: Fn(&RequestContext) -> T + Send + Sync,
    T: Transformer + 'static,
{
    fn build(&self, request: &RequestContext) -> Box<dyn Transformer> {
        Box::new((self.build)(request))
    }
}

/// What is registered under a type name
pub enum TypeEntry {
    /// A type implementing the transformer base
    Transformer(Arc<dyn TransformerFactory>),
    /// A type that exists but is not a transformer
    Plain,
}

impl TypeEntry {
    /// The transformer factory, if this type is a transformer
    #[must_use]
    pub fn as_transformer(&self) -> Option<&Arc<dyn TransformerFactory>> {
        match self {
            Self::Transformer(factory) => Some(factory),
            Self::Plain => None,
        }
    }

    /// Whether this type implements the transformer base
    #[must_use]
    pub fn is_transformer(&self) -> bool {
        matches!(self, Self::Transformer(_))
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformer(_) => f.write_str("TypeEntry::Transformer"),
            Self::Plain => f.write_str("TypeEntry::Plain"),
        }
    }
}

/// Registry of types by fully-qualified name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: DashMap<String, Arc<TypeEntry>>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer type
    pub fn register_transformer(
        &self,
        type_name: impl Into<String>,
        factory: Arc<dyn TransformerFactory>,
    ) {
        self.types
            .insert(type_name.into(), Arc::new(TypeEntry::Transformer(factory)));
    }

    /// Register a type that is not a transformer
    pub fn register_type(&self, type_name: impl Into<String>) {
        self.types.insert(type_name.into(), Arc::new(TypeEntry::Plain));
    }

    /// Look up a type by name
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<Arc<TypeEntry>> {
        self.types.get(type_name).map(|e| Arc::clone(e.value()))
    }

    /// Whether a type is registered under this name
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Sorted names of all registered transformer types
    #[must_use]
    pub fn transformer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .iter()
            .filter(|e| e.value().is_transformer())
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
