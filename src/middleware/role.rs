use std::sync::Arc;

use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::HttpError;
use crate::security::IdentityResolver;

/// Requires the token's `role` claim to equal a fixed role.
///
/// Only the claim is checked; the user repository is not consulted. Token failures are
/// written by [`IdentityResolver::authorize_claims`], a role mismatch answers
/// `403 insufficient_role`.
pub struct RoleMiddleware {
    resolver: Arc<IdentityResolver>,
    role: String,
    name: String,
}

impl RoleMiddleware {
    #[must_use]
    pub fn new(resolver: Arc<IdentityResolver>, role: impl Into<String>) -> Self {
        let role = role.into();
        Self {
            resolver,
            name: format!("role:{role}"),
            role,
        }
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }
}

impl Middleware for RoleMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        let header = req.get_header("authorization");
        let Some(claims) = self.resolver.authorize_claims(header, res) else {
            return Ok(Flow::Halt);
        };

        if claims.role() != Some(self.role.as_str()) {
            debug!(
                request_id = %req.request_id,
                required = %self.role,
                actual = ?claims.role(),
                "Role requirement not met"
            );
            HttpError::InsufficientRole {
                required: self.role.clone(),
            }
            .write_to(res);
            return Ok(Flow::Halt);
        }

        req.jwt_claims = Some(claims);
        Ok(Flow::Continue)
    }
}
