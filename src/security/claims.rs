use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token payload.
///
/// The registered timestamps are typed; everything else the caller supplied (`user_id`,
/// `role`, custom data) lives in `extra` and is serialized alongside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Token ID used by revocation checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `user_id` / `role` pair every session token carries.
    #[must_use]
    pub fn for_user(user_id: &str, role: &str) -> Self {
        Self::new().with("user_id", user_id).with("role", role)
    }

    /// Add a custom claim.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Subject id. Numeric ids are accepted and rendered as strings.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        match self.extra.get("user_id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.extra.get("role").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_user_id_is_accepted() {
        let claims = Claims::new().with("user_id", 42);
        assert_eq!(claims.user_id().as_deref(), Some("42"));
    }

    #[test]
    fn custom_claims_flatten_into_payload() {
        let claims = Claims::for_user("7", "admin");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": "7", "role": "admin" }));
    }
}
