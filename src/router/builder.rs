//! Registration phase: route declarations with nested prefix/middleware groups.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use http::Method;
use thiserror::Error;
use tracing::error;

use super::core::{HandlerTarget, Route, Router};
use super::pattern::{normalize_path, normalize_prefix, PathPattern, PatternError};
use crate::handler::{self, HandlerRef};
use crate::middleware::Middleware;
use crate::registry::{ControllerRegistry, ResolutionError};

/// A problem with one route declaration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// `{name:type}` with a type other than `num` or `string`
    #[error("unsupported parameter type '{kind}' in route {method} {path}")]
    UnsupportedParamType {
        method: Method,
        path: String,
        kind: String,
    },
    /// Unbalanced braces or an empty/invalid placeholder name
    #[error("invalid placeholder '{segment}' in route {method} {path}")]
    InvalidPlaceholder {
        method: Method,
        path: String,
        segment: String,
    },
    /// The handler descriptor does not resolve against the registry
    #[error("route {method} {path}: {source}")]
    Unresolved {
        method: Method,
        path: String,
        #[source]
        source: ResolutionError,
    },
}

/// Every problem found while building the route table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("route table has {} invalid route(s): {}", .errors.len(), join_errors(.errors))]
pub struct BuildError {
    pub errors: Vec<RouteError>,
}

fn join_errors(errors: &[RouteError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

struct GroupFrame {
    prefix: String,
    middleware: Vec<Arc<dyn Middleware>>,
}

struct PendingRoute {
    method: Method,
    path: String,
    handler: HandlerRef,
    middleware: Vec<Arc<dyn Middleware>>,
}

/// Collects route declarations before the table is frozen into a [`Router`].
///
/// ```rust
/// use std::sync::Arc;
/// use http::Method;
/// use tollgate::{handler, dispatcher::HandlerResponse, registry::ControllerRegistry};
/// use tollgate::router::RouterBuilder;
///
/// let mut builder = RouterBuilder::new();
/// builder.group("/api", vec![], |api| {
///     api.group("/v1", vec![], |v1| {
///         v1.get("/x", handler(|_| HandlerResponse::empty(200)));
///     });
/// });
/// let router = builder.build(&ControllerRegistry::new()).unwrap();
/// assert!(router.route(&Method::GET, "/api/v1/x").is_some());
/// ```
#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<PendingRoute>,
    groups: Vec<GroupFrame>,
}

/// Scope guard for one group frame; pops the frame when dropped, including during unwinding.
pub struct GroupGuard<'a> {
    builder: &'a mut RouterBuilder,
}

impl Deref for GroupGuard<'_> {
    type Target = RouterBuilder;

    fn deref(&self) -> &RouterBuilder {
        self.builder
    }
}

impl DerefMut for GroupGuard<'_> {
    fn deref_mut(&mut self) -> &mut RouterBuilder {
        self.builder
    }
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        self.builder.groups.pop();
    }
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of routes declared so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Current nesting depth of groups.
    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.groups.len()
    }

    /// Push a group frame and return a guard that pops it.
    pub fn push_group(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> GroupGuard<'_> {
        self.groups.push(GroupFrame {
            prefix: normalize_prefix(prefix),
            middleware,
        });
        GroupGuard { builder: self }
    }

    /// Register the routes declared in `register` under `prefix`, with `middleware` prepended
    /// to each route's own chain.
    pub fn group<F>(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        register: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut RouterBuilder),
    {
        {
            let mut guard = self.push_group(prefix, middleware);
            register(&mut guard);
        }
        self
    }

    /// Fallible variant of [`RouterBuilder::group`]; the frame is popped on `Err` too.
    pub fn try_group<F, E>(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        register: F,
    ) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut RouterBuilder) -> Result<(), E>,
    {
        {
            let mut guard = self.push_group(prefix, middleware);
            register(&mut guard)?;
        }
        Ok(self)
    }

    /// Declare a route. The effective path is the concatenation of every enclosing group
    /// prefix and `path`, normalized.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Into<HandlerRef>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        let mut full = String::new();
        let mut chain = Vec::new();
        for frame in &self.groups {
            full.push_str(&frame.prefix);
            chain.extend(frame.middleware.iter().cloned());
        }
        if !path.starts_with('/') {
            full.push('/');
        }
        full.push_str(path);
        chain.extend(middleware);

        self.routes.push(PendingRoute {
            method,
            path: normalize_path(&full),
            handler: handler.into(),
            middleware: chain,
        });
        self
    }

    pub fn get(&mut self, path: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.route(Method::GET, path, handler, Vec::new())
    }

    pub fn post(&mut self, path: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.route(Method::POST, path, handler, Vec::new())
    }

    pub fn put(&mut self, path: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.route(Method::PUT, path, handler, Vec::new())
    }

    pub fn patch(&mut self, path: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.route(Method::PATCH, path, handler, Vec::new())
    }

    pub fn delete(&mut self, path: &str, handler: impl Into<HandlerRef>) -> &mut Self {
        self.route(Method::DELETE, path, handler, Vec::new())
    }

    /// Register an `OPTIONS` route for `path` so browser preflights reach the group's CORS
    /// middleware. The handler answers 204 if no middleware halts first.
    pub fn preflight(&mut self, path: &str) -> &mut Self {
        self.route(
            Method::OPTIONS,
            path,
            handler::handler(handler::no_content),
            Vec::new(),
        )
    }

    /// Freeze the table, failing if any route is invalid.
    ///
    /// All problems are reported together so a broken route file can be fixed in one pass.
    pub fn build(self, registry: &ControllerRegistry) -> Result<Router, BuildError> {
        let (routes, errors) = self.compile(registry);
        if errors.is_empty() {
            Ok(Router::from_routes(routes))
        } else {
            Err(BuildError { errors })
        }
    }

    /// Freeze the table, keeping routes whose descriptor did not resolve.
    ///
    /// Such routes answer `500 handler_resolution_failure` when matched. Routes with invalid
    /// patterns are dropped. Every problem is logged at `error` level.
    #[must_use]
    pub fn build_unchecked(self, registry: &ControllerRegistry) -> Router {
        let (routes, errors) = self.compile(registry);
        for e in &errors {
            error!(error = %e, "Invalid route registered");
        }
        Router::from_routes(routes)
    }

    fn compile(self, registry: &ControllerRegistry) -> (Vec<Route>, Vec<RouteError>) {
        let mut routes = Vec::with_capacity(self.routes.len());
        let mut errors = Vec::new();

        for pending in self.routes {
            let pattern = match PathPattern::parse(&pending.path) {
                Ok(p) => p,
                Err(PatternError::UnsupportedParamType(kind)) => {
                    errors.push(RouteError::UnsupportedParamType {
                        method: pending.method,
                        path: pending.path,
                        kind,
                    });
                    continue;
                }
                Err(PatternError::InvalidPlaceholder(segment)) => {
                    errors.push(RouteError::InvalidPlaceholder {
                        method: pending.method,
                        path: pending.path,
                        segment,
                    });
                    continue;
                }
            };

            let target = match pending.handler {
                HandlerRef::Callable(handler) => HandlerTarget::Resolved {
                    label: "<closure>".to_string(),
                    handler,
                },
                HandlerRef::Descriptor(descriptor) => match registry.resolve(&descriptor) {
                    Ok(handler) => HandlerTarget::Resolved {
                        label: descriptor,
                        handler,
                    },
                    Err(source) => {
                        errors.push(RouteError::Unresolved {
                            method: pending.method.clone(),
                            path: pending.path.clone(),
                            source: source.clone(),
                        });
                        HandlerTarget::Unresolved {
                            label: descriptor,
                            error: source,
                        }
                    }
                },
            };

            routes.push(Route {
                method: pending.method,
                pattern,
                middleware: pending.middleware,
                target,
            });
        }

        (routes, errors)
    }
}
