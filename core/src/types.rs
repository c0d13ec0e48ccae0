//! Parameter types and the normalization that turns caller input into them.
//!
//! # Design
//! A resource accepts its query, body, and upload parameters either as an
//! already-structured list or as a single encoded string. Both shapes are
//! resolved once, at construction, into a `ParamList`: an `Arc<[T]>` that is
//! never mutated afterwards. Accessors hand out `&[T]` views, so callers can
//! read and clone freely but can never reach back into the stored identity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single query-string or form parameter.
///
/// `value` is `None` for a flag that appears without `=value`, as in
/// `?debug&id=3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Parameter {
    fn from((key, value): (K, V)) -> Self {
        Parameter::new(key, value)
    }
}

/// The file half of an upload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A multipart upload field: `key` plus the file sent under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileParameter {
    pub key: String,
    pub file: UploadFile,
}

impl FileParameter {
    pub fn new(key: impl Into<String>, filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            file: UploadFile {
                filename: filename.into(),
                content: content.into(),
            },
        }
    }

    pub fn filename(&self) -> &str {
        &self.file.filename
    }
}

/// The shapes a caller may hand in for one parameter kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParameterInput {
    /// Already split into ordered pairs.
    List(Vec<Parameter>),
    /// A raw `a=1&b=2` string.
    Encoded(String),
    #[default]
    Absent,
}

impl ParameterInput {
    pub fn is_absent(&self) -> bool {
        matches!(self, ParameterInput::Absent)
    }

    /// Resolve to a parameter list. `Absent` yields an empty list.
    pub fn into_params(self) -> Vec<Parameter> {
        match self {
            ParameterInput::List(params) => params,
            ParameterInput::Encoded(raw) => parse_query(&raw),
            ParameterInput::Absent => Vec::new(),
        }
    }
}

impl From<Vec<Parameter>> for ParameterInput {
    fn from(params: Vec<Parameter>) -> Self {
        ParameterInput::List(params)
    }
}

impl From<&str> for ParameterInput {
    fn from(raw: &str) -> Self {
        ParameterInput::Encoded(raw.to_string())
    }
}

impl From<String> for ParameterInput {
    fn from(raw: String) -> Self {
        ParameterInput::Encoded(raw)
    }
}

/// Split a raw query string into parameters.
///
/// Tokens are separated by `&` and split on their first `=`. A token with no
/// `=` (or whose only `=` comes first) becomes a flag. Never fails.
///
/// An empty query yields no parameters, so `http://h/a?` and `http://h/a`
/// name the same resource. A lone `""` flag would keep the trailing `?` and
/// split them into two.
pub fn parse_query(raw: &str) -> Vec<Parameter> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('&')
        .map(|token| match token.find('=') {
            Some(pos) if pos > 0 => Parameter::new(&token[..pos], &token[pos + 1..]),
            _ => Parameter::flag(token),
        })
        .collect()
}

/// Split `path` into its non-query prefix and the query string, if any.
pub(crate) fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once('?') {
        Some((base, rest)) => {
            // A fragment is never part of the query.
            let query = rest.split_once('#').map_or(rest, |(q, _)| q);
            (base, Some(query))
        }
        None => (path, None),
    }
}

/// Immutable, cheaply clonable parameter storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamList<T>(Arc<[T]>);

impl<T> ParamList<T> {
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<T> From<Vec<T>> for ParamList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items.into())
    }
}

impl<T> Default for ParamList<T> {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}
