//! Bearer token → authenticated identity.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use super::claims::Claims;
use super::revocation::RevocationChecker;
use super::token::TokenService;
use super::users::{UserRecord, UserRepository};
use crate::dispatcher::HandlerResponse;
use crate::error::HttpError;

/// An authenticated principal: the stored user plus the claims that proved it.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user: UserRecord,
    pub claims: Claims,
}

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization token is required")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("user not found")]
    UserNotFound,
    /// The user repository failed
    #[error("user repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Client-facing error for this failure.
    #[must_use]
    pub fn to_http(&self) -> HttpError {
        match self {
            AuthError::MissingToken => HttpError::MissingToken,
            AuthError::InvalidOrExpiredToken => HttpError::InvalidOrExpiredToken,
            AuthError::UserNotFound => HttpError::UserNotFound,
            AuthError::Repository(_) => HttpError::Internal,
        }
    }
}

/// Resolves bearer tokens into identities.
///
/// `header` arguments accept either a raw token or an `Authorization` value with the
/// `Bearer` scheme. Nothing is cached: every call verifies the token again.
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepository>,
    revocation: Option<Arc<dyn RevocationChecker>>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            tokens,
            users,
            revocation: None,
        }
    }

    /// Reject tokens whose `jti` the checker reports as revoked.
    #[must_use]
    pub fn with_revocation(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = Some(checker);
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verify the token and load its user.
    pub fn current_user(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let claims = self.verified_claims(header)?;
        let user_id = claims.user_id().ok_or_else(|| {
            debug!("Token carries no user_id claim");
            AuthError::InvalidOrExpiredToken
        })?;

        match self.users.find_user_by_id(&user_id) {
            Ok(Some(user)) => Ok(Identity { user, claims }),
            Ok(None) => {
                debug!(user_id = %user_id, "Token subject not found");
                Err(AuthError::UserNotFound)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %format!("{e:#}"), "User lookup failed");
                Err(AuthError::Repository(e.to_string()))
            }
        }
    }

    /// Resolve the identity, or write the matching error response into `res`.
    ///
    /// Authentication errors are rendered only here and in [`Self::authorize_claims`]; callers
    /// just halt on `None`.
    pub fn authenticate(
        &self,
        header: Option<&str>,
        res: &mut HandlerResponse,
    ) -> Option<Identity> {
        self.current_user(header).map_err(|e| e.to_http().write_to(res)).ok()
    }

    /// [`Self::verified_claims`], writing the error response into `res` on failure.
    pub fn authorize_claims(
        &self,
        header: Option<&str>,
        res: &mut HandlerResponse,
    ) -> Option<Claims> {
        self.verified_claims(header).map_err(|e| e.to_http().write_to(res)).ok()
    }

    /// `true` when [`Self::current_user`] would succeed. Never writes a response.
    #[must_use]
    pub fn is_authenticated(&self, header: Option<&str>) -> bool {
        self.current_user(header).is_ok()
    }

    /// Compare the token's `role` claim with `role`. The repository is not consulted.
    pub fn has_role(&self, header: Option<&str>, role: &str) -> Result<bool, AuthError> {
        let claims = self.verified_claims(header)?;
        Ok(claims.role() == Some(role))
    }

    /// Verified claims without a repository lookup.
    pub fn verified_claims(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_token(header).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(reason = %e, "Token rejected");
            AuthError::InvalidOrExpiredToken
        })?;

        if let Some(checker) = &self.revocation {
            if checker.is_revoked(&claims) {
                debug!(jti = ?claims.jti, "Token revoked");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        }
        Ok(claims)
    }
}

/// Strip an optional `Bearer` scheme (case-insensitive); blank values count as absent.
fn extract_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };
    (!token.is_empty() && !token.eq_ignore_ascii_case("bearer")).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::extract_token;

    #[test]
    fn bearer_scheme_is_optional() {
        assert_eq!(extract_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token(Some("bearer  abc ")), Some("abc"));
        assert_eq!(extract_token(Some("abc")), Some("abc"));
    }

    #[test]
    fn blank_header_is_missing() {
        assert_eq!(extract_token(None), None);
        assert_eq!(extract_token(Some("")), None);
        assert_eq!(extract_token(Some("Bearer ")), None);
        assert_eq!(extract_token(Some("   ")), None);
    }
}
