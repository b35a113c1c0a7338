use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::ApiGraphError;

/// HTTP method of an endpoint.
///
/// Parsing is case-insensitive; the canonical rendering is uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| ApiGraphError::ParseError {
                location: None,
                reason: format!("unknown HTTP method '{}'", s),
            })
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identity of an endpoint: method plus normalized path template.
///
/// Equality, hashing and ordering use the path *shape* (placeholder names
/// erased), so `/users/{id}` and `/users/{userId}` are the same endpoint.
/// The template as written is kept for display and dependency inference.
#[derive(Debug, Clone)]
pub struct EndpointKey {
    method: HttpMethod,
    template: String,
    shape: String,
}

impl EndpointKey {
    /// Build a key from a method and a raw path template.
    pub fn new(method: HttpMethod, path: &str) -> Self {
        let template = normalize_path(path);
        let shape = path_shape(&template);
        Self {
            method,
            template,
            shape,
        }
    }

    /// Parse the `"<METHOD> <path-template>"` rendering.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the method is unknown or the path is missing.
    pub fn parse(rendered: &str) -> Result<Self, ApiGraphError> {
        let mut parts = rendered.trim().splitn(2, char::is_whitespace);
        let method = parts.next().unwrap_or_default();
        let path = parts.next().map(str::trim).unwrap_or_default();
        if path.is_empty() {
            return Err(ApiGraphError::ParseError {
                location: None,
                reason: format!("endpoint key '{}' must be '<METHOD> <path>'", rendered),
            });
        }
        Ok(Self::new(method.parse()?, path))
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template as declared, after slash normalization.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Path with every placeholder rendered as `{}`.
    pub fn shape(&self) -> &str {
        &self.shape
    }

    /// Placeholder names in template order.
    pub fn path_params(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    names.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                None => break,
            }
        }
        names
    }

    /// Match a concrete request path against this template.
    ///
    /// Returns the number of literal segments matched (higher is more specific),
    /// or `None` when the path does not fit the template.
    pub fn match_concrete(&self, concrete: &str) -> Option<usize> {
        let concrete = normalize_path(concrete);
        let pattern: Vec<&str> = self.template.split('/').collect();
        let actual: Vec<&str> = concrete.split('/').collect();
        if pattern.len() != actual.len() {
            return None;
        }
        let mut literal = 0;
        for (p, a) in pattern.iter().zip(actual.iter()) {
            if !p.contains('{') {
                if p != a {
                    return None;
                }
                if !p.is_empty() {
                    literal += 1;
                }
            } else if !segment_matches(p, a) {
                return None;
            }
        }
        Some(literal)
    }
}

impl PartialEq for EndpointKey {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.shape == other.shape
    }
}

impl Eq for EndpointKey {}

impl Hash for EndpointKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.shape.hash(state);
    }
}

impl Ord for EndpointKey {
    /// Lexical by rendered key (`METHOD path`), placeholder names ignored.
    fn cmp(&self, other: &Self) -> Ordering {
        self.method
            .as_str()
            .cmp(other.method.as_str())
            .then_with(|| self.shape.cmp(&other.shape))
    }
}

impl PartialOrd for EndpointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

impl FromStr for EndpointKey {
    type Err = ApiGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EndpointKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EndpointKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Normalize slashes: leading `/`, no empty segments, no trailing `/`, no query string.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn path_shape(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut in_param = false;
    for c in template.chars() {
        match c {
            '{' if !in_param => {
                in_param = true;
                out.push_str("{}");
            }
            '}' if in_param => in_param = false,
            _ if in_param => {}
            _ => out.push(c),
        }
    }
    out
}

enum Piece<'a> {
    Literal(&'a str),
    Param,
}

/// Match one template segment that contains placeholders (e.g. `{name}.json`).
fn segment_matches(pattern: &str, actual: &str) -> bool {
    let mut pieces = Vec::new();
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        match rest[open..].find('}') {
            Some(close) => {
                pieces.push(Piece::Param);
                rest = &rest[open + close + 1..];
            }
            None => return pattern == actual,
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    match_pieces(&pieces, actual)
}

fn match_pieces(pieces: &[Piece<'_>], actual: &str) -> bool {
    match pieces.split_first() {
        None => actual.is_empty(),
        Some((Piece::Literal(lit), tail)) => actual
            .strip_prefix(lit)
            .is_some_and(|rest| match_pieces(tail, rest)),
        Some((Piece::Param, tail)) => {
            // A placeholder consumes at least one character.
            (1..=actual.len())
                .filter(|&i| actual.is_char_boundary(i))
                .any(|i| match_pieces(tail, &actual[i..]))
        }
    }
}
