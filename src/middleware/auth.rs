use std::sync::Arc;

use tracing::debug;

use super::{Flow, Middleware};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::security::IdentityResolver;

/// Requires a valid bearer token for an existing user.
///
/// On success the identity and its claims are attached to the request. On failure the
/// resolver has already written the error response; the middleware only halts.
pub struct AuthMiddleware {
    resolver: Arc<IdentityResolver>,
}

impl AuthMiddleware {
    #[must_use]
    pub fn new(resolver: Arc<IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &str {
        "auth"
    }

    fn handle(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        let header = req.get_header("authorization");
        let Some(identity) = self.resolver.authenticate(header, res) else {
            return Ok(Flow::Halt);
        };
        debug!(
            request_id = %req.request_id,
            user_id = %identity.user.id,
            "Request authenticated"
        );
        req.jwt_claims = Some(identity.claims.clone());
        req.identity = Some(identity);
        Ok(Flow::Continue)
    }
}
