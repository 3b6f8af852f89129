//! # Security Module
//!
//! Token issue/verification and identity resolution.
//!
//! ## Overview
//!
//! - [`TokenService`] signs and verifies stateless HS256 tokens carrying [`Claims`]
//! - [`IdentityResolver`] turns an `Authorization` header into an [`Identity`] by verifying the
//!   token and looking its subject up in a [`UserRepository`]
//! - [`RevocationChecker`] is an optional hook consulted by the resolver; [`RevocationList`]
//!   remembers revoked `jti`s until their tokens expire
//!
//! Both services are plain values built once at start-up and shared by `Arc`; tests build
//! their own with distinct secrets, TTLs and a [`ManualClock`].
//!
//! ```rust
//! use std::sync::Arc;
//! use tollgate::security::{
//!     Claims, IdentityResolver, InMemoryUserRepository, SystemClock, TokenConfig, TokenService,
//!     UserRecord,
//! };
//!
//! let tokens = Arc::new(
//!     TokenService::new(TokenConfig::new("doc-secret-doc-secret-doc-secret!"), Arc::new(SystemClock))
//!         .unwrap(),
//! );
//! let users = Arc::new(InMemoryUserRepository::new().with_user(UserRecord::new("1", "ada", "admin")));
//! let resolver = IdentityResolver::new(tokens.clone(), users);
//!
//! let token = tokens.issue(Claims::for_user("1", "admin")).unwrap();
//! let header = format!("Bearer {token}");
//! assert!(resolver.is_authenticated(Some(&header)));
//! assert_eq!(resolver.has_role(Some(&header), "admin"), Ok(true));
//! ```

mod claims;
mod clock;
mod identity;
mod revocation;
mod token;
mod users;

pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::{AuthError, Identity, IdentityResolver};
pub use revocation::{RevocationChecker, RevocationList};
pub use token::{TokenConfig, TokenError, TokenService, DEFAULT_TTL_SECS};
pub use users::{InMemoryUserRepository, UserRecord, UserRepository};
