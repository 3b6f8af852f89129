//! Client-facing error taxonomy.
//!
//! Every failure that ends a request is reported as an [`HttpError`] at the boundary that
//! detected it (the dispatcher or a middleware). Each variant carries a stable string code and
//! an HTTP status, and renders into the same JSON envelope:
//!
//! ```json
//! { "status": "error", "data": { "code": 401, "error": "invalid_token", "message": "Invalid or expired token" } }
//! ```

use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::dispatcher::HandlerResponse;
use crate::registry::ResolutionError;

/// Errors that terminate a request with a structured response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// No registered route matches method + path.
    #[error("Not Found")]
    RouteNotFound {
        /// Upper-cased request method
        method: String,
        /// Normalized request path
        path: String,
    },

    /// The matched route references an unknown controller or method.
    #[error("{0}")]
    HandlerResolution(ResolutionError),

    /// No bearer token was presented.
    #[error("Authorization token is required")]
    MissingToken,

    /// The token failed signature, structure or expiry checks.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// The token's subject does not exist in the user repository.
    #[error("User not found")]
    UserNotFound,

    /// The token is valid but its role claim does not satisfy the route.
    #[error("Insufficient permissions: role '{required}' required")]
    InsufficientRole {
        /// Role the route requires
        required: String,
    },

    /// CORS preflight from an origin outside the policy.
    #[error("Origin not allowed")]
    OriginNotAllowed {
        /// Origin header as received (empty when absent)
        origin: String,
    },

    /// A middleware returned an error or panicked.
    #[error("Internal Server Error")]
    MiddlewareFailure {
        /// Name of the failing middleware
        middleware: String,
    },

    /// The handler panicked.
    #[error("Internal Server Error")]
    HandlerFailure {
        /// Handler label (descriptor or `<closure>`)
        handler: String,
    },

    /// A collaborator failed in a way the client cannot act on.
    #[error("Internal Server Error")]
    Internal,
}

impl HttpError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::RouteNotFound { .. } | HttpError::UserNotFound => StatusCode::NOT_FOUND,
            HttpError::MissingToken | HttpError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            HttpError::InsufficientRole { .. } | HttpError::OriginNotAllowed { .. } => {
                StatusCode::FORBIDDEN
            }
            HttpError::HandlerResolution(_)
            | HttpError::MiddlewareFailure { .. }
            | HttpError::HandlerFailure { .. }
            | HttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            HttpError::RouteNotFound { .. } => "route_not_found",
            HttpError::HandlerResolution(_) => "handler_resolution_failure",
            HttpError::MissingToken => "missing_token",
            HttpError::InvalidOrExpiredToken => "invalid_token",
            HttpError::UserNotFound => "user_not_found",
            HttpError::InsufficientRole { .. } => "insufficient_role",
            HttpError::OriginNotAllowed { .. } => "origin_not_allowed",
            HttpError::MiddlewareFailure { .. } => "middleware_failure",
            HttpError::HandlerFailure { .. } => "handler_failure",
            HttpError::Internal => "internal_error",
        }
    }

    /// Render into a JSON error response.
    #[must_use]
    pub fn to_response(&self) -> HandlerResponse {
        let status = self.status();
        let mut data = json!({
            "code": status.as_u16(),
            "error": self.code(),
            "message": self.to_string(),
        });
        if let HttpError::OriginNotAllowed { origin } = self {
            data["origin"] = json!(origin);
        }
        HandlerResponse::json(status.as_u16(), json!({ "status": "error", "data": data }))
    }

    /// Write status and body into `res`, keeping headers earlier middleware set.
    pub fn write_to(&self, res: &mut HandlerResponse) {
        let rendered = self.to_response();
        res.status = rendered.status;
        res.body = rendered.body;
        res.set_header("content-type", "application/json".to_string());
    }
}
