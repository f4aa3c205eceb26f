//! Error types for the datatables bridge

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for the datatables bridge
pub type Result<T> = std::result::Result<T, Error>;

/// Datatables bridge errors
#[derive(Error, Debug)]
pub enum Error {
    /// Request was not sent as an AJAX request
    #[error("Only AJAX requests are accepted")]
    NotAjax,

    /// Module is not present in the module registry
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// Module is present but disabled
    #[error("Module `{0}` is Disabled!")]
    ModuleDisabled(String),

    /// No type is registered under the resolved name
    #[error("Transformer not found: {0}")]
    TransformerNotFound(String),

    /// A type is registered under the resolved name but is not a transformer
    #[error("Transformer {type_name} Should Extended from {base}!")]
    TransformerNotImplemented {
        /// Fully-qualified type name
        type_name: String,
        /// Required base abstraction
        base: &'static str,
    },

    /// Transformer refused the request
    #[error("This action is unauthorized")]
    Forbidden,

    /// Route parameters, query string or body could not be read
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Status the extraction failure maps to
        status: StatusCode,
        /// Rejection detail
        message: String,
    },

    /// Table renderer failed to produce a body
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error is reported with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAjax => StatusCode::METHOD_NOT_ALLOWED,
            Self::ModuleNotFound(_) | Self::TransformerNotFound(_) => StatusCode::NOT_FOUND,
            Self::ModuleDisabled(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidRequest { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code used in JSON error bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAjax => "MethodNotAllowed",
            Self::ModuleNotFound(_) => "ModuleNotFound",
            Self::ModuleDisabled(_) => "ModuleDisabled",
            Self::TransformerNotFound(_) => "TransformerNotFound",
            Self::TransformerNotImplemented { .. } => "TransformerNotImplemented",
            Self::Forbidden => "Forbidden",
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::Render(_) => "RenderError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) | Self::Internal(_) => "InternalError",
        }
    }

    /// Whether the error was caused by the client rather than the server setup
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({
                "error": {
                    "code": self.code(),
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::NotAjax.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            Error::ModuleNotFound("blog".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::ModuleDisabled("blog".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::TransformerNotFound("X".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::InvalidRequest {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: "too big".into(),
            }
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            Error::TransformerNotImplemented {
                type_name: "X".into(),
                base: "Transformer",
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::ModuleDisabled("Blog".into()).to_string(),
            "Module `Blog` is Disabled!"
        );
        assert_eq!(
            Error::TransformerNotImplemented {
                type_name: "Modules.Blog.Transformers.PostTransformer".into(),
                base: "Transformer",
            }
            .to_string(),
            "Transformer Modules.Blog.Transformers.PostTransformer Should Extended from Transformer!"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::NotAjax.is_client_error());
        assert!(Error::Forbidden.is_client_error());
        assert!(!Error::Render("boom".into()).is_client_error());
        assert!(
            !Error::TransformerNotImplemented {
                type_name: "X".into(),
                base: "Transformer",
            }
            .is_client_error()
        );
    }
}
