//! # Dispatcher Module
//!
//! Turns a host-provided [`IncomingRequest`] into a [`HandlerResponse`].
//!
//! ## Request Flow
//!
//! 1. The method is upper-cased, the query string split off and the path normalized
//! 2. The router finds the first matching route, or the request ends with `404 route_not_found`
//! 3. A fresh [`HandlerRequest`] is built with path and query parameters
//! 4. The route's middleware chain runs in order; a halting middleware's response is returned
//! 5. The handler runs; headers written by middleware that continued are merged in
//!
//! ## Error Handling
//!
//! - Unmatched requests return `404 route_not_found`
//! - Unresolved handler descriptors return `500 handler_resolution_failure`
//! - Middleware errors and panics return `500 middleware_failure`
//! - Handler panics are caught and return `500 handler_failure`
//!
//! ```rust
//! use tollgate::dispatcher::{Dispatcher, HandlerResponse, IncomingRequest};
//! use tollgate::handler;
//! use tollgate::registry::ControllerRegistry;
//! use tollgate::router::RouterBuilder;
//!
//! let mut builder = RouterBuilder::new();
//! builder.post(
//!     "/users/{id}/like",
//!     handler(|req| HandlerResponse::success(serde_json::json!({ "liked": req.get_path_param("id") }))),
//! );
//! let dispatcher = Dispatcher::new(builder.build(&ControllerRegistry::new()).unwrap());
//!
//! let res = dispatcher.dispatch(IncomingRequest::new("post", "/users/42/like?src=feed"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["data"]["liked"], "42");
//! ```

mod core;
mod request;

pub use core::Dispatcher;
pub use request::{HandlerRequest, HandlerResponse, HeaderVec, IncomingRequest, MAX_INLINE_HEADERS};
