//! # tollgate
//!
//! **tollgate** is a small request-dispatch core for web applications: hierarchical routing,
//! ordered middleware and stateless bearer-token authentication. The host transport parses
//! HTTP; tollgate decides which handler runs, which gatekeepers it passes first, and what
//! the response looks like when anything fails.
//!
//! ## Architecture
//!
//! - **[`router`]** - route registration with nested prefix/middleware groups; first-match,
//!   segment-by-segment path matching with `{name}` / `{name:num}` / `{name:string}` placeholders
//! - **[`registry`]** - explicit `"Controller.method"` → callable map, validated when the route
//!   table is built
//! - **[`dispatcher`]** - the single `dispatch` entry point: match, run the chain, invoke
//! - **[`middleware`]** - CORS policy, bearer authentication, role requirement
//! - **[`security`]** - HS256 token service and the identity resolver
//! - **[`error`]** - client-facing error taxonomy and JSON envelopes
//! - **[`config`]** / **[`logging`]** - YAML configuration with env overrides, `tracing` setup
//!
//! ### Request Flow
//!
//! ```text
//! IncomingRequest ─▶ Dispatcher ─▶ Router::route ──none──▶ 404 route_not_found
//!                                      │
//!                                      ▼
//!                         middleware chain (in order) ──halt──▶ middleware's response
//!                                      │
//!                                      ▼
//!                                  handler ─▶ HandlerResponse (+ middleware headers)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tollgate::dispatcher::{Dispatcher, HandlerResponse, IncomingRequest};
//! use tollgate::handler;
//! use tollgate::middleware::{AuthMiddleware, Middleware};
//! use tollgate::registry::ControllerRegistry;
//! use tollgate::router::RouterBuilder;
//! use tollgate::security::{
//!     Claims, IdentityResolver, InMemoryUserRepository, SystemClock, TokenConfig, TokenService,
//!     UserRecord,
//! };
//!
//! let tokens = Arc::new(
//!     TokenService::new(TokenConfig::new("quick-start-secret-quick-start-secret"), Arc::new(SystemClock))
//!         .unwrap(),
//! );
//! let users = Arc::new(InMemoryUserRepository::new().with_user(UserRecord::new("42", "ada", "user")));
//! let resolver = Arc::new(IdentityResolver::new(tokens.clone(), users));
//! let auth: Arc<dyn Middleware> = Arc::new(AuthMiddleware::new(resolver));
//!
//! let mut builder = RouterBuilder::new();
//! builder.group("/api", vec![auth], |api| {
//!     api.get("/me", handler(|req| {
//!         let user = req.identity.as_ref().map(|i| i.user.username.clone());
//!         HandlerResponse::success(serde_json::json!({ "username": user }))
//!     }));
//! });
//! let dispatcher = Dispatcher::new(builder.build(&ControllerRegistry::new()).unwrap());
//!
//! let token = tokens.issue(Claims::for_user("42", "user")).unwrap();
//! let res = dispatcher.dispatch(IncomingRequest::new("GET", "/api/me").bearer(&token));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["data"]["username"], "ada");
//!
//! let res = dispatcher.dispatch(IncomingRequest::new("GET", "/api/me"));
//! assert_eq!(res.status, 401);
//! assert_eq!(res.body["data"]["error"], "missing_token");
//! ```

pub mod cli;
pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod security;

pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse, IncomingRequest};
pub use error::HttpError;
pub use handler::{handler, Handler, HandlerRef};
pub use ids::RequestId;
