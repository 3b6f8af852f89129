mod builder;
mod config;
mod error;

pub use builder::CorsMiddlewareBuilder;
pub use config::CorsConfig;
pub use error::CorsConfigError;

use http::Method;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::HttpError;

/// Origin validation strategy
#[derive(Clone)]
pub enum OriginValidation {
    /// Exact string matching
    Exact(Vec<String>),
    /// Wildcard (allow all origins)
    Wildcard,
    /// Regex pattern matching
    Regex(Vec<Regex>),
}

impl std::fmt::Debug for OriginValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginValidation::Exact(origins) => f.debug_tuple("Exact").field(origins).finish(),
            OriginValidation::Wildcard => write!(f, "Wildcard"),
            OriginValidation::Regex(patterns) => f
                .debug_tuple("Regex")
                .field(&patterns.iter().map(Regex::as_str).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
            OriginValidation::Regex(patterns) => patterns.iter().any(|re| re.is_match(origin)),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// - **Preflight** (`OPTIONS`): a missing or disallowed `Origin` is answered with
///   `403 origin_not_allowed`; an allowed one with `204` and the full CORS header set. Either
///   way the chain halts, so the handler never runs.
/// - **Other methods**: the CORS headers are written and the chain continues.
///   `Access-Control-Allow-Origin` is only set when the origin is allowed; the browser then
///   enforces the policy.
///
/// Construct with [`CorsMiddlewareBuilder`].
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    pub(crate) origin_rules: Vec<OriginValidation>,
    pub(crate) allowed_headers: Vec<String>,
    pub(crate) allowed_methods: Vec<Method>,
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: Vec<String>,
    pub(crate) max_age: Option<u32>,
}

impl CorsMiddleware {
    /// Build from a deserialized policy.
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsConfigError> {
        CorsMiddlewareBuilder::from_config(config).build()
    }

    /// Allow every origin without credentials.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            origin_rules: vec![OriginValidation::Wildcard],
            ..CorsMiddleware::default()
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when the origin is not allowed.
    ///
    /// Wildcard policies answer `*`; everything else echoes the origin, since only one
    /// origin may be returned per response.
    fn validate_origin(&self, origin: &str) -> Option<String> {
        if origin.is_empty() {
            return None;
        }
        let rule = self.origin_rules.iter().find(|r| r.is_allowed(origin))?;
        match rule {
            OriginValidation::Wildcard => Some("*".to_string()),
            _ => Some(origin.to_string()),
        }
    }

    fn write_headers(&self, allowed_origin: Option<String>, res: &mut HandlerResponse) {
        if let Some(origin) = allowed_origin {
            res.set_header("access-control-allow-origin", origin);
        }
        if !self.allowed_methods.is_empty() {
            let methods = self
                .allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            res.set_header("access-control-allow-methods", methods);
        }
        if !self.allowed_headers.is_empty() {
            res.set_header("access-control-allow-headers", self.allowed_headers.join(", "));
        }
        if !self.expose_headers.is_empty() {
            res.set_header("access-control-expose-headers", self.expose_headers.join(", "));
        }
        if let Some(age) = self.max_age {
            res.set_header("access-control-max-age", age.to_string());
        }
        if self.allow_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
        res.set_header("vary", "Origin".to_string());
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            origin_rules: Vec::new(),
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::PATCH,
            ],
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &str {
        "cors"
    }

    fn handle(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        let origin = req.get_header("origin").unwrap_or_default();
        let allowed = self.validate_origin(origin);

        if req.method == Method::OPTIONS {
            if allowed.is_none() {
                warn!(origin = %origin, path = %req.path, "CORS preflight: origin not allowed");
                HttpError::OriginNotAllowed {
                    origin: origin.to_string(),
                }
                .write_to(res);
                return Ok(Flow::Halt);
            }
            self.write_headers(allowed, res);
            res.status = 204;
            res.body = Value::Null;
            debug!(origin = %origin, path = %req.path, "CORS preflight accepted");
            return Ok(Flow::Halt);
        }

        if allowed.is_none() && !origin.is_empty() {
            debug!(origin = %origin, "CORS: origin not allowed, omitting allow-origin");
        }
        self.write_headers(allowed, res);
        Ok(Flow::Continue)
    }
}
