//! Table rendering
//!
//! The bridge does not build table payloads itself. A [`RendererFactory`]
//! hands out a [`TableRenderer`] per request; the bridge gives it the
//! transformer and returns whatever JSON it produces.

pub mod collection;

use serde_json::Value;

use crate::Result;
use crate::request::RequestContext;
use crate::resolver::ResolvedTarget;
use crate::transformer::Transformer;

pub use collection::{
    CollectionRenderer, CollectionRendererFactory, DataTablesParams, DatasetStore,
};

/// Produces the JSON body for one table request
pub trait TableRenderer: Send {
    /// Use this transformer for every row
    fn set_transformer(
        self: Box<Self>,
        transformer: Box<dyn Transformer>,
    ) -> Box<dyn TableRenderer>;

    /// Render the response body
    fn to_json(&self) -> Result<Value>;
}

/// Creates a renderer for each request
pub trait RendererFactory: Send + Sync {
    /// Renderer for the resolved target
    fn renderer(&self, target: &ResolvedTarget, request: &RequestContext) -> Box<dyn TableRenderer>;
}
