//! Session revocation.
//!
//! Tokens are stateless, so the only way to end a session before `exp` is to remember its
//! `jti` until that moment. [`RevocationList`] keeps each revoked `jti` with the token's expiry
//! and forgets it once the token would have been rejected as expired anyway.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::claims::Claims;

/// Decides whether an otherwise valid token has been withdrawn.
///
/// Called by [`super::IdentityResolver`] with claims whose signature and expiry already passed.
pub trait RevocationChecker: Send + Sync {
    fn is_revoked(&self, claims: &Claims) -> bool;
}

/// Process-local revocation list keyed by `jti`.
///
/// Clones share one list. Tokens without a `jti` cannot be revoked.
#[derive(Clone, Default)]
pub struct RevocationList {
    /// `jti` → `exp` of the revoked token
    entries: Arc<RwLock<HashMap<String, u64>>>,
}

impl RevocationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Withdraw the session these claims belong to.
    ///
    /// Returns `false` when the claims carry no `jti`. A missing `exp` keeps the entry until
    /// it is reinstated.
    pub fn revoke(&self, claims: &Claims) -> bool {
        let Some(jti) = claims.jti.as_deref() else {
            return false;
        };
        let exp = claims.exp.unwrap_or(u64::MAX);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(jti.to_string(), exp);
        debug!(jti = %jti, exp, "Session revoked");
        true
    }

    /// Accept the token with this `jti` again. Returns whether it was revoked.
    pub fn reinstate(&self, jti: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(jti)
            .is_some()
    }

    /// Forget entries whose token has expired at `now` and return how many were dropped.
    pub fn prune_expired(&self, now: u64) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, exp| *exp >= now);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevocationChecker for RevocationList {
    fn is_revoked(&self, claims: &Claims) -> bool {
        let Some(jti) = claims.jti.as_deref() else {
            return false;
        };
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(jti: &str, exp: u64) -> Claims {
        Claims {
            jti: Some(jti.to_string()),
            exp: Some(exp),
            ..Claims::for_user("42", "user")
        }
    }

    #[test]
    fn claims_without_jti_cannot_be_revoked() {
        let list = RevocationList::new();
        let anonymous = Claims::for_user("42", "user");
        assert!(!list.revoke(&anonymous));
        assert!(!list.is_revoked(&anonymous));
        assert!(list.is_empty());
    }

    #[test]
    fn prune_drops_only_expired_entries() {
        let list = RevocationList::new();
        list.revoke(&session("old", 100));
        list.revoke(&session("edge", 200));
        list.revoke(&session("new", 300));

        assert_eq!(list.prune_expired(200), 1);
        assert!(!list.is_revoked(&session("old", 100)));
        assert!(list.is_revoked(&session("edge", 200)));
        assert!(list.is_revoked(&session("new", 300)));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn poisoned_lock_keeps_rejecting_revoked_tokens() {
        let list = RevocationList::new();
        let claims = session("abc", 500);
        list.revoke(&claims);

        let shared = list.clone();
        let poisoner = std::thread::spawn(move || {
            let _guard = shared.entries.write().unwrap();
            panic!("poison the revocation lock");
        });
        assert!(poisoner.join().is_err());
        assert!(list.entries.is_poisoned());

        assert!(list.is_revoked(&claims));
        assert!(list.reinstate("abc"));
        assert!(!list.is_revoked(&claims));
    }
}
