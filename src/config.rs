//! # Application Configuration
//!
//! Process-wide settings read once at start-up and never mutated afterwards.
//!
//! ## File format
//!
//! ```yaml
//! token:
//!   secret: "change-me-to-32-or-more-bytes-of-entropy"
//!   ttl_secs: 86400
//! cors:
//!   allowed_origins: ["https://app.example.com"]
//!   allow_credentials: true
//! ```
//!
//! Every section is optional; missing keys take their defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |---|---|
//! | `TOLLGATE_TOKEN_SECRET` | `token.secret` |
//! | `JWT_SECRET_KEY` | `token.secret`, when `TOLLGATE_TOKEN_SECRET` is unset |
//! | `TOLLGATE_TOKEN_TTL_SECS` | `token.ttl_secs` |

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::middleware::CorsConfig;
use crate::security::TokenConfig;

/// Default session token lifetime (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// `token:` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub ttl_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub token: TokenSettings,
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("invalid configuration document")
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("in config file {}", path.display()))
    }

    /// Load `path` if given (defaults otherwise), then apply process-environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(secret) = lookup("TOLLGATE_TOKEN_SECRET").or_else(|| lookup("JWT_SECRET_KEY"))
        {
            self.token.secret = Some(secret);
        }
        if let Some(ttl) = lookup("TOLLGATE_TOKEN_TTL_SECS") {
            self.token.ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("TOLLGATE_TOKEN_TTL_SECS is not a number: '{ttl}'"))?;
        }
        Ok(())
    }

    /// Token service settings; fails when no secret is configured.
    pub fn token_config(&self) -> Result<TokenConfig> {
        let secret = match self.token.secret.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => bail!(
                "no token secret configured: set token.secret or TOLLGATE_TOKEN_SECRET"
            ),
        };
        Ok(TokenConfig::new(secret).with_ttl_secs(self.token.ttl_secs))
    }
}
