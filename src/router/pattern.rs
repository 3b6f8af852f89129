//! Path normalization and segment-wise pattern matching.

use std::sync::Arc;

use smallvec::SmallVec;

use super::core::{ParamVec, MAX_INLINE_PARAMS};

/// Constraint carried by a `{name}` / `{name:type}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `{id}` - any non-empty segment
    Any,
    /// `{id:num}` - ASCII digits only
    Num,
    /// `{slug:string}` - ASCII letters and digits only
    Alnum,
}

impl ParamKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "num" => Some(ParamKind::Num),
            "string" => Some(ParamKind::Alnum),
            _ => None,
        }
    }

    #[inline]
    fn accepts(self, segment: &str) -> bool {
        match self {
            ParamKind::Any => true,
            ParamKind::Num => segment.bytes().all(|b| b.is_ascii_digit()),
            ParamKind::Alnum => segment.bytes().all(|b| b.is_ascii_alphanumeric()),
        }
    }
}

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: Arc<str>, kind: ParamKind },
}

/// Why a pattern failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternError {
    UnsupportedParamType(String),
    InvalidPlaceholder(String),
}

/// A compiled route pattern such as `/users/{id:num}/like`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub(crate) fn parse(path: &str) -> Result<Self, PatternError> {
        let raw = normalize_path(path);
        let segments = split_segments(&raw)
            .into_iter()
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { raw, segments })
    }

    /// The normalized pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Match already-split request segments, binding placeholders positionally.
    pub(crate) fn match_segments(&self, request: &[&str]) -> Option<ParamVec> {
        if request.len() != self.segments.len() {
            return None;
        }
        let mut params = ParamVec::new();
        for (segment, actual) in self.segments.iter().zip(request) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                Segment::Param { name, kind } => {
                    if actual.is_empty() || !kind.accepts(actual) {
                        return None;
                    }
                    params.push((Arc::clone(name), (*actual).to_string()));
                }
            }
        }
        Some(params)
    }
}

fn parse_segment(segment: &str) -> Result<Segment, PatternError> {
    let Some(inner) = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    else {
        if segment.contains('{') || segment.contains('}') {
            return Err(PatternError::InvalidPlaceholder(segment.to_string()));
        }
        return Ok(Segment::Literal(segment.to_string()));
    };

    let (name, kind) = match inner.split_once(':') {
        Some((name, tag)) => {
            let kind = ParamKind::parse(tag)
                .ok_or_else(|| PatternError::UnsupportedParamType(tag.to_string()))?;
            (name, kind)
        }
        None => (inner, ParamKind::Any),
    };

    let valid_name =
        !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid_name {
        return Err(PatternError::InvalidPlaceholder(segment.to_string()));
    }

    Ok(Segment::Param {
        name: Arc::from(name),
        kind,
    })
}

/// Normalize a request or pattern path.
///
/// Trailing slashes are removed, a leading slash is enforced and the empty path becomes `/`:
/// `"/x/"` → `"/x"`, `""` → `"/"`, `"x"` → `"/x"`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Normalize a group prefix: leading slash enforced, trailing slashes removed, `"/"` → `""`.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Split a normalized path into segments; `/` has none.
pub(crate) fn split_segments(path: &str) -> SmallVec<[&str; MAX_INLINE_PARAMS]> {
    let body = path.strip_prefix('/').unwrap_or(path);
    if body.is_empty() {
        return SmallVec::new();
    }
    body.split('/').collect()
}

/// Split a raw URI into `(path, query)`.
pub(crate) fn split_uri(uri: &str) -> (&str, &str) {
    let without_fragment = uri.split_once('#').map_or(uri, |(before, _)| before);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, query),
        None => (without_fragment, ""),
    }
}

/// Decode a query string as `key=value` pairs (form-urlencoded).
pub(crate) fn parse_query(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
