//! User lookup collaborator consumed by the identity resolver.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user as stored by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub role: String,
    /// Application-specific fields (email, display name, ...)
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role: role.into(),
            profile: Map::new(),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(key.to_string(), value.into());
        self
    }
}

/// Synchronous lookup keyed by the token's `user_id` claim.
///
/// Implementations own their timeout policy; the resolver waits for the call to return.
pub trait UserRepository: Send + Sync {
    fn find_user_by_id(&self, id: &str) -> anyhow::Result<Option<UserRecord>>;
}

/// Repository backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(self, user: UserRecord) -> Self {
        self.insert(user);
        self
    }

    pub fn insert(&self, user: UserRecord) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id.clone(), user);
        }
    }

    pub fn remove(&self, id: &str) -> Option<UserRecord> {
        self.users.write().ok()?.remove(id)
    }

    /// All users, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self
            .users
            .read()
            .map(|u| u.values().cloned().collect())
            .unwrap_or_default();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_user_by_id(&self, id: &str) -> anyhow::Result<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(users.get(id).cloned())
    }
}
