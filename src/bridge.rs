//! Datatables request pipeline
//!
//! Each request passes, in order, through:
//!
//! 1. the AJAX gate,
//! 2. name resolution,
//! 3. the module check (present and enabled),
//! 4. the capability check (registered and a transformer),
//! 5. the optional authorization hook,
//! 6. delegation to the table renderer.
//!
//! Any stage may end the request with an [`Error`]; nothing is retried.

use std::cell::OnceCell;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::module::ModuleRegistry;
use crate::render::RendererFactory;
use crate::request::RequestContext;
use crate::resolver::{NameResolver, ResolvedTarget};
use crate::transformer::{TRANSFORMER_BASE, TransformerFactory, TypeEntry, TypeRegistry};
use crate::{Error, Result};

/// Routes datatables requests to registered transformers
pub struct Bridge {
    modules: Arc<dyn ModuleRegistry>,
    types: Arc<TypeRegistry>,
    resolver: NameResolver,
    renderers: Arc<dyn RendererFactory>,
}

impl Bridge {
    /// Create a bridge over the given collaborators
    #[must_use]
    pub fn new(
        modules: Arc<dyn ModuleRegistry>,
        types: Arc<TypeRegistry>,
        resolver: NameResolver,
        renderers: Arc<dyn RendererFactory>,
    ) -> Self {
        Self {
            modules,
            types,
            resolver,
            renderers,
        }
    }

    /// Module registry
    #[must_use]
    pub fn modules(&self) -> &Arc<dyn ModuleRegistry> {
        &self.modules
    }

    /// Type registry
    #[must_use]
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Name resolver
    #[must_use]
    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Run the full pipeline and return the rendered body
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that rejects the request.
    pub fn handle(&self, request: &RequestContext) -> Result<Value> {
        let pending = PendingRequest {
            target: self.resolver.resolve(&request.module, &request.transformer),
            types: &self.types,
            handle: OnceCell::new(),
        };

        Self::qualify_request(request)?;
        self.qualify_module(&pending.target)?;
        let factory = pending.qualify_transformer()?;
        Self::authorize(&pending.target, factory.as_ref(), request)?;

        debug!(
            module = %pending.target.module,
            type_name = %pending.target.type_name,
            "Rendering datatable"
        );

        self.renderers
            .renderer(&pending.target, request)
            .set_transformer(factory.build(request))
            .to_json()
    }

    fn qualify_request(request: &RequestContext) -> Result<()> {
        if request.is_ajax() {
            Ok(())
        } else {
            Err(Error::NotAjax)
        }
    }

    fn qualify_module(&self, target: &ResolvedTarget) -> Result<()> {
        let module = self
            .modules
            .find(&target.module)
            .ok_or_else(|| Error::ModuleNotFound(target.module.clone()))?;

        if module.is_enabled() {
            Ok(())
        } else {
            Err(Error::ModuleDisabled(module.name))
        }
    }

    fn authorize(
        target: &ResolvedTarget,
        factory: &dyn TransformerFactory,
        request: &RequestContext,
    ) -> Result<()> {
        match factory.authorizer(request) {
            Some(authorizer) if !authorizer.authorize() => {
                debug!(type_name = %target.type_name, "Transformer denied request");
                Err(Error::Forbidden)
            }
            _ => Ok(()),
        }
    }
}

/// State resolved once for a single request
struct PendingRequest<'a> {
    target: ResolvedTarget,
    types: &'a TypeRegistry,
    handle: OnceCell<Option<Arc<TypeEntry>>>,
}

impl PendingRequest<'_> {
    /// Registry entry for the resolved type, looked up on first use
    fn type_handle(&self) -> Option<&Arc<TypeEntry>> {
        self.handle
            .get_or_init(|| self.types.get(&self.target.type_name))
            .as_ref()
    }

    fn qualify_transformer(&self) -> Result<Arc<dyn TransformerFactory>> {
        let entry = self
            .type_handle()
            .ok_or_else(|| Error::TransformerNotFound(self.target.type_name.clone()))?;

        entry
            .as_transformer()
            .map(Arc::clone)
            .ok_or_else(|| Error::TransformerNotImplemented {
                type_name: self.target.type_name.clone(),
                base: TRANSFORMER_BASE,
            })
    }
}
