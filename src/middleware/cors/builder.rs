use http::Method;
use regex::Regex;
use tracing::warn;
use url::Url;

use super::{CorsConfig, CorsConfigError, CorsMiddleware, OriginValidation};

pub(crate) const DEFAULT_ALLOWED_HEADERS: &[&str] = &[
    "Content-Type",
    "Authorization",
    "X-Requested-With",
    "Accept",
    "Origin",
    "Access-Control-Request-Method",
    "Access-Control-Request-Headers",
];

/// Builder for creating `CorsMiddleware` with a fluent API
///
/// # Example
///
/// ```rust
/// use tollgate::middleware::CorsMiddlewareBuilder;
/// use http::Method;
///
/// let cors = CorsMiddlewareBuilder::new()
///     .allowed_origins(&["https://example.com", "https://api.example.com"])
///     .allowed_methods(&[Method::GET, Method::POST, Method::PUT])
///     .allowed_headers(&["Content-Type", "Authorization", "X-Custom-Header"])
///     .allow_credentials(true)
///     .expose_headers(&["X-Total-Count"])
///     .max_age(3600)
///     .build()
///     .expect("Invalid CORS configuration");
/// ```
pub struct CorsMiddlewareBuilder {
    allowed_origins: Vec<String>,
    origin_patterns: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsMiddlewareBuilder {
    /// Create a new builder
    ///
    /// Default configuration:
    /// - No origins allowed (empty list)
    /// - Methods: `GET, POST, PUT, DELETE, OPTIONS, PATCH`
    /// - Headers: `Content-Type, Authorization, X-Requested-With, Accept, Origin` and the two
    ///   `Access-Control-Request-*` headers
    /// - Exposed headers: `Content-Length, Content-Range`
    /// - Max age: 24 hours
    /// - Credentials: `false`
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_origins: vec![],
            origin_patterns: vec![],
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|h| (*h).to_string())
                .collect(),
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::PATCH,
            ],
            allow_credentials: false,
            expose_headers: vec!["Content-Length".into(), "Content-Range".into()],
            max_age: Some(86_400),
        }
    }

    /// Start from a deserialized policy. Unparsable method names are skipped with a warning.
    #[must_use]
    pub fn from_config(config: &CorsConfig) -> Self {
        let allowed_methods = config
            .allowed_methods
            .iter()
            .filter_map(|m| match m.to_ascii_uppercase().parse::<Method>() {
                Ok(method) => Some(method),
                Err(_) => {
                    warn!(method = %m, "Ignoring invalid CORS method");
                    None
                }
            })
            .collect();
        Self {
            allowed_origins: config.allowed_origins.clone(),
            origin_patterns: config.allowed_origin_patterns.clone(),
            allowed_headers: config.allowed_headers.clone(),
            allowed_methods,
            allow_credentials: config.allow_credentials,
            expose_headers: config.exposed_headers.clone(),
            max_age: (config.max_age_secs > 0).then_some(config.max_age_secs),
        }
    }

    /// Set allowed origins
    ///
    /// Use `&["*"]` to allow all origins; cannot be combined with `allow_credentials(true)`.
    #[must_use]
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = origins.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Allow origins matching any of these regular expressions
    /// (e.g. `r"^https://.*\.example\.com$"`).
    #[must_use]
    pub fn allowed_origin_patterns(mut self, patterns: &[&str]) -> Self {
        self.origin_patterns = patterns.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn allowed_methods(mut self, methods: &[Method]) -> Self {
        self.allowed_methods = methods.to_vec();
        self
    }

    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// When enabled, sets `Access-Control-Allow-Credentials: true` header.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Set headers to expose to JavaScript
    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose_headers = headers.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set preflight cache duration in seconds
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Omit `Access-Control-Max-Age`
    #[must_use]
    pub fn no_max_age(mut self) -> Self {
        self.max_age = None;
        self
    }

    /// Build the CORS middleware
    ///
    /// # Errors
    ///
    /// - `WildcardWithCredentials` if credentials are enabled with origin `*`
    /// - `EmptyOriginsWithCredentials` if credentials are enabled without any origin
    /// - `InvalidOriginFormat` for an origin that is not a bare `scheme://host[:port]`
    /// - `InvalidOriginPattern` for a pattern that does not compile
    pub fn build(self) -> Result<CorsMiddleware, CorsConfigError> {
        let wildcard = self.allowed_origins.iter().any(|o| o == "*");

        if self.allow_credentials && wildcard {
            return Err(CorsConfigError::WildcardWithCredentials);
        }
        if self.allow_credentials
            && self.allowed_origins.is_empty()
            && self.origin_patterns.is_empty()
        {
            return Err(CorsConfigError::EmptyOriginsWithCredentials);
        }

        let mut rules = Vec::new();
        if wildcard {
            rules.push(OriginValidation::Wildcard);
        } else if !self.allowed_origins.is_empty() {
            if let Some(bad) = self.allowed_origins.iter().find(|o| !is_valid_origin(o)) {
                return Err(CorsConfigError::InvalidOriginFormat {
                    origin: bad.clone(),
                });
            }
            rules.push(OriginValidation::Exact(self.allowed_origins));
        }

        if !self.origin_patterns.is_empty() {
            let patterns = self
                .origin_patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| CorsConfigError::InvalidOriginPattern {
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(OriginValidation::Regex(patterns));
        }

        Ok(CorsMiddleware {
            origin_rules: rules,
            allowed_headers: self.allowed_headers,
            allowed_methods: self.allowed_methods,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: self.max_age,
        })
    }
}

impl Default for CorsMiddlewareBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An origin exactly as a browser sends it in the `Origin` header.
///
/// The value must parse as a URL with a host and serialize back unchanged as its origin, so
/// userinfo, paths (even a bare `/`), queries, fragments and default ports never pass.
fn is_valid_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let host_ok = url.host_str().is_some_and(|h| !h.is_empty());
    host_ok
        && url.username().is_empty()
        && url.password().is_none()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && url.origin().ascii_serialization() == origin
}
