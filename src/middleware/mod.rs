//! # Middleware Module
//!
//! Ordered request gatekeepers run by the dispatcher before a route's handler.
//!
//! Each [`Middleware`] returns [`Flow::Continue`] to pass the request on or [`Flow::Halt`]
//! after writing the response itself. Chains run strictly one after another within a request.
//!
//! - [`CorsMiddleware`] - origin policy and preflight answers
//! - [`AuthMiddleware`] - bearer token → identity
//! - [`RoleMiddleware`] - role claim requirement

mod auth;
mod core;
mod cors;
mod role;

pub use auth::AuthMiddleware;
pub use core::{Flow, Middleware};
pub(crate) use core::{panic_message, run_chain};
pub use cors::{CorsConfig, CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder, OriginValidation};
pub use role::RoleMiddleware;
