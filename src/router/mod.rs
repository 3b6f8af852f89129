//! # Router Module
//!
//! Route registration and path matching for tollgate.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Collecting route declarations, including nested prefix/middleware groups
//! - Resolving `"Controller.method"` descriptors against a [`crate::registry::ControllerRegistry`]
//! - Matching incoming requests to the first registered route that fits
//! - Extracting path parameters in pattern order
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: [`RouterBuilder`] accumulates routes. Groups push a frame holding a
//!    prefix and middleware onto a stack; every route declared inside inherits the
//!    concatenated prefix and the accumulated middleware. [`RouterBuilder::build`] compiles
//!    patterns into segments and resolves handler descriptors, reporting every problem at once.
//!
//! 2. **Matching**: [`Router::route`] normalizes the request path, splits it into segments
//!    and scans routes in registration order. A route matches when methods are equal,
//!    segment counts are equal, literal segments are equal and every placeholder accepts
//!    its segment.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use tollgate::dispatcher::HandlerResponse;
//! use tollgate::handler;
//! use tollgate::registry::ControllerRegistry;
//! use tollgate::router::RouterBuilder;
//!
//! let mut builder = RouterBuilder::new();
//! builder.get("/users/{id:num}", handler(|_| HandlerResponse::empty(200)));
//! let router = builder.build(&ControllerRegistry::new()).unwrap();
//!
//! let m = router.route(&Method::GET, "/users/42/").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! assert!(router.route(&Method::GET, "/users/abc").is_none());
//! ```

mod builder;
mod core;
mod pattern;

pub use builder::{BuildError, GroupGuard, RouteError, RouterBuilder};
pub use core::{ParamVec, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
pub(crate) use core::HandlerTarget;
pub use pattern::{normalize_path, ParamKind, PathPattern, Segment};
pub(crate) use pattern::{parse_query, split_uri};
