use thiserror::Error;

/// CORS configuration error
///
/// Returned by `CorsMiddlewareBuilder::build()` when the configuration
/// is invalid or breaks the CORS credential rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorsConfigError {
    /// Wildcard origin (`*`) cannot be used with credentials
    #[error(
        "CORS configuration error: Cannot use wildcard origin (*) with credentials. \
         When allow_credentials is true, you must specify exact origins."
    )]
    WildcardWithCredentials,
    /// The origin string does not match `scheme://host[:port]`
    #[error(
        "CORS configuration error: Invalid origin format '{origin}'. \
         Expected format: scheme://host:port (e.g., https://example.com)"
    )]
    InvalidOriginFormat {
        /// The invalid origin string
        origin: String,
    },
    /// An origin pattern is not a valid regular expression
    #[error("CORS configuration error: Invalid origin pattern '{pattern}': {message}")]
    InvalidOriginPattern {
        /// The pattern as configured
        pattern: String,
        /// Regex compiler message
        message: String,
    },
    /// Credentials require at least one allowed origin
    #[error(
        "CORS configuration error: Cannot use credentials with empty origins list. \
         When allow_credentials is true, at least one origin must be specified."
    )]
    EmptyOriginsWithCredentials,
}
