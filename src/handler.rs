//! The handler seam: anything that turns a [`HandlerRequest`] into a [`HandlerResponse`].

use std::sync::Arc;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// A request handler.
///
/// Implemented for every `Fn(&HandlerRequest) -> HandlerResponse + Send + Sync`, so plain
/// closures and functions can be registered directly. Controllers implement it for their
/// methods through [`crate::registry::Controller::method`].
pub trait Handler: Send + Sync {
    fn call(&self, req: &HandlerRequest) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync,
{
    fn call(&self, req: &HandlerRequest) -> HandlerResponse {
        self(req)
    }
}

/// How a route names its handler.
#[derive(Clone)]
pub enum HandlerRef {
    /// A callable registered inline
    Callable(Arc<dyn Handler>),
    /// A `"Controller.method"` descriptor resolved against a [`crate::registry::ControllerRegistry`]
    Descriptor(String),
}

impl std::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerRef::Callable(_) => write!(f, "Callable(<handler>)"),
            HandlerRef::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
        }
    }
}

impl From<&str> for HandlerRef {
    fn from(descriptor: &str) -> Self {
        HandlerRef::Descriptor(descriptor.to_string())
    }
}

impl From<String> for HandlerRef {
    fn from(descriptor: String) -> Self {
        HandlerRef::Descriptor(descriptor)
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(handler: Arc<dyn Handler>) -> Self {
        HandlerRef::Callable(handler)
    }
}

/// Wrap a closure as an inline handler.
///
/// ```rust
/// use tollgate::{handler, dispatcher::HandlerResponse};
///
/// let h = handler(|req| HandlerResponse::success(serde_json::json!({ "path": req.path })));
/// ```
pub fn handler<F>(f: F) -> HandlerRef
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    HandlerRef::Callable(Arc::new(f))
}

/// Handler that answers `204 No Content`; used for preflight routes whose CORS middleware
/// normally halts the chain first.
pub(crate) fn no_content(_req: &HandlerRequest) -> HandlerResponse {
    HandlerResponse::empty(204)
}
