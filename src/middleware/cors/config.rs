use serde::{Deserialize, Serialize};

/// Serializable CORS policy, as found under `cors:` in the application config.
///
/// Defaults describe a local development setup: the common dev-server origins, credentials
/// on, preflights cached for 24 hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins, or `["*"]` for any
    pub allowed_origins: Vec<String>,
    /// Regular expressions matched against the `Origin` header
    pub allowed_origin_patterns: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    /// Preflight cache duration; `0` omits `Access-Control-Max-Age`
    pub max_age_secs: u32,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".into(),
                "http://localhost:3000".into(),
                "http://localhost:8080".into(),
            ],
            allowed_origin_patterns: Vec::new(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS", "PATCH"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: super::builder::DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|h| (*h).to_string())
                .collect(),
            exposed_headers: vec!["Content-Length".into(), "Content-Range".into()],
            max_age_secs: 86_400,
            allow_credentials: true,
        }
    }
}
