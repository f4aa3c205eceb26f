//! HTTP router and handlers

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use crate::Error;
use crate::bridge::Bridge;
use crate::module::ModuleRegistry;
use crate::request::{self, RequestContext};

/// Shared application state
pub struct AppState {
    /// Datatables pipeline
    pub bridge: Arc<Bridge>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/datatables/{module}/{transformer}",
            get(datatables_handler).post(datatables_handler),
        )
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "modules": state.bridge.modules().all().len(),
        "transformers": state.bridge.types().transformer_names().len()
    }))
}

/// GET|POST /datatables/{module}/{transformer}
///
/// The AJAX gate runs on the raw headers before any extraction result is
/// looked at, so a non-AJAX request is always a 405.
async fn datatables_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if !request::is_ajax(&headers) {
        debug!("Datatables request rejected: not an AJAX request");
        return Error::NotAjax.into_response();
    }

    let (module, transformer, mut params, body) = match extract(path, query, body) {
        Ok(parts) => parts,
        Err(e) => {
            debug!(status = e.status().as_u16(), "Datatables request rejected: {e}");
            return e.into_response();
        }
    };

    if is_form(&headers) && !body.is_empty() {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(&body) {
            Ok(form) => params.extend(form),
            Err(e) => debug!(error = %e, "Ignoring malformed form body"),
        }
    }

    let request = RequestContext::new(module, transformer)
        .with_headers(headers)
        .with_params(params);

    match state.bridge.handle(&request) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            log_rejection(&request, &e);
            e.into_response()
        }
    }
}

type Extracted = (String, String, HashMap<String, String>, Bytes);

/// Turn extractor rejections into bridge errors
fn extract(
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Extracted, Error> {
    let Path((module, transformer)) = path.map_err(|r| Error::InvalidRequest {
        status: r.status(),
        message: r.body_text(),
    })?;
    let Query(params) = query.map_err(|r| Error::InvalidRequest {
        status: r.status(),
        message: r.body_text(),
    })?;
    let body = body.map_err(|r| Error::InvalidRequest {
        status: r.status(),
        message: r.body_text(),
    })?;
    Ok((module, transformer, params, body))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

fn log_rejection(request: &RequestContext, e: &Error) {
    if e.is_client_error() {
        debug!(
            module = %request.module,
            transformer = %request.transformer,
            status = e.status().as_u16(),
            "Datatables request rejected: {e}"
        );
    } else if matches!(e, Error::TransformerNotImplemented { .. }) {
        error!(
            module = %request.module,
            transformer = %request.transformer,
            "{e}"
        );
    } else {
        warn!(
            module = %request.module,
            transformer = %request.transformer,
            error = %e,
            "Datatables request failed"
        );
    }
}
