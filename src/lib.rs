//! Datatables Bridge Library
//!
//! Serves AJAX datatables requests of the form
//! `/datatables/{module}/{transformer}` by resolving the pair to a registered
//! transformer type and handing it to a table renderer.
//!
//! # Pipeline
//!
//! - **Request gate**: only AJAX (`X-Requested-With: XMLHttpRequest`) requests pass
//! - **Name resolution**: `blog`/`post` becomes `Modules.Blog.Transformers.PostTransformer`
//! - **Module check**: the module must be installed and enabled
//! - **Capability check**: the type must be registered and implement [`transformer::Transformer`]
//! - **Authorization**: optional per-type [`transformer::Authorizer`]
//! - **Delegation**: a [`render::TableRenderer`] produces the JSON body

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod module;
pub mod render;
pub mod request;
pub mod resolver;
pub mod transformer;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Failed to initialize tracing: {e}")))
}
