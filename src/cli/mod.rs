//! # CLI Module
//!
//! Command-line access to the bundled demo application.
//!
//! ## Commands
//!
//! ```bash
//! # Print the route table
//! tollgate routes
//!
//! # Issue a token and use it
//! export TOLLGATE_TOKEN_SECRET=change-me-to-32-or-more-bytes-of-entropy
//! TOKEN=$(tollgate token issue --user-id 2 --role user)
//! tollgate token verify "$TOKEN"
//! tollgate dispatch POST /api/users/42/like -H "Authorization: Bearer $TOKEN"
//!
//! # Preflight from a browser origin
//! tollgate dispatch OPTIONS /api/auth/login -H "Origin: http://localhost:5173"
//! ```
//!
//! All commands accept `--config <FILE>` (or `TOLLGATE_CONFIG`).

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, parse_header, run_cli, Cli, Commands, TokenCommand};
