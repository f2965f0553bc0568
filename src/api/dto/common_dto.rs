//! Shared DTO helpers used across multiple endpoints.

use serde::{Deserialize, Deserializer};

use crate::domain::labels;
use crate::error::MapError;

/// Deserializes a field so that "absent" and "null" can be told apart.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// a missing field stays `None`, `null` becomes `Some(None)`.
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Labels as accepted on the wire: a JSON array, or that array already
/// encoded as a string (`"[\"a\",\"b\"]"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LabelsInput {
    /// `["a", "b"]`
    List(Vec<String>),
    /// `"[\"a\",\"b\"]"`
    Encoded(String),
}

impl LabelsInput {
    /// Resolves the input to a label list.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] if an encoded string is not a
    /// JSON array of strings.
    pub fn into_labels(self) -> Result<Vec<String>, MapError> {
        match self {
            Self::List(list) => Ok(list),
            Self::Encoded(text) if text.trim().is_empty() => Ok(Vec::new()),
            Self::Encoded(text) => labels::decode(&text).map_err(|e| {
                MapError::InvalidRequest(format!("labels must be an array of strings: {e}"))
            }),
        }
    }
}
