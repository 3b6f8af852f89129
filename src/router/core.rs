//! Router core module - the immutable route table consulted on every request.

use std::sync::Arc;
use std::time::Instant;

use http::Method;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::pattern::{normalize_path, split_segments, PathPattern};
use crate::handler::Handler;
use crate::middleware::Middleware;
use crate::registry::ResolutionError;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the static route table;
/// values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// What a route invokes once its middleware chain completes.
#[derive(Clone)]
pub(crate) enum HandlerTarget {
    Resolved {
        label: String,
        handler: Arc<dyn Handler>,
    },
    /// Kept only by [`super::RouterBuilder::build_unchecked`]; answers 500 on every match.
    Unresolved {
        label: String,
        error: ResolutionError,
    },
}

impl HandlerTarget {
    fn label(&self) -> &str {
        match self {
            HandlerTarget::Resolved { label, .. } | HandlerTarget::Unresolved { label, .. } => {
                label
            }
        }
    }
}

/// A registered route.
#[derive(Clone)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Full, normalized pattern including every group prefix
    pub pattern: PathPattern,
    /// Accumulated chain: group middleware outer to inner, then the route's own
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) target: HandlerTarget,
}

impl Route {
    /// Descriptor for controller routes, `<closure>` for inline handlers.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.target.label()
    }

    /// Middleware names in execution order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// `true` when the handler descriptor failed to resolve.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self.target, HandlerTarget::Unresolved { .. })
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("handler", &self.handler_name())
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Path parameters extracted from the URL (e.g., `{id}` → `("id", "123")`), in pattern order
    pub path_params: ParamVec,
}

impl RouteMatch<'_> {
    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Route table built by [`super::RouterBuilder`].
///
/// Routes are scanned in registration order and the first match wins; there is no
/// specificity ranking. The table is immutable, so a `Router` can be shared across request
/// threads behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub(crate) fn from_routes(routes: Vec<Route>) -> Self {
        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.pattern.as_str()))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        Self { routes }
    }

    /// All routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// One line per route: `METHOD /pattern -> handler [middleware, ...]`.
    #[must_use]
    pub fn dump_routes(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| {
                format!(
                    "{} {} -> {} [{}]",
                    r.method,
                    r.pattern.as_str(),
                    r.handler_name(),
                    r.middleware_names().join(", ")
                )
            })
            .collect()
    }

    /// Match an HTTP request to a route.
    ///
    /// `path` is normalized first, so `/users/42/` and `/users/42` are equivalent. Any query
    /// string must already be stripped.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - first route in registration order whose method, segment count,
    ///   literals and placeholder constraints all match
    /// * `None` - no route matches (results in 404)
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(path);
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let segments = split_segments(&path);

        let found = self
            .routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| {
                r.pattern
                    .match_segments(&segments)
                    .map(|path_params| RouteMatch {
                        route: r,
                        path_params,
                    })
            });

        let duration_us = match_start.elapsed().as_micros();
        match &found {
            Some(m) => info!(
                method = %method,
                path = %path,
                handler_name = %m.route.handler_name(),
                route_pattern = %m.route.pattern.as_str(),
                path_params = ?m.path_params,
                duration_us = duration_us,
                "Route matched"
            ),
            None => warn!(
                method = %method,
                path = %path,
                duration_us = duration_us,
                "No route matched"
            ),
        }
        found
    }
}
