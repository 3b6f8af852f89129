use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a client-supplied ID when it is a valid ULID; otherwise generate a new one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn as_ulid(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}
