//! # Initial Content Classification
//!
//! Callers hand the editor initial content in one of three wire shapes:
//!
//! - a JSON document snapshot (object)
//! - a list of base64-encoded binary updates, to be merged
//! - a single base64-encoded binary update (delta or whole-state)
//!
//! [`classify`] turns whatever arrived into the closed [`InitialContent`]
//! union. Classification never fails; a malformed string is treated as an
//! update blob and the decode failure surfaces later, when it is applied.

use crate::{CrdtDocument, EditorError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Initial content as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    /// A single string: base64 update, or serialized JSON
    Text(String),

    /// A list of base64 updates
    Texts(Vec<String>),

    /// Any other JSON value
    Json(Value),
}

/// Classified initial content
#[derive(Debug, Clone, PartialEq)]
pub enum InitialContent {
    /// Nothing to hydrate
    Empty,

    /// Structured JSON document snapshot
    JsonSnapshot(Value),

    /// Several base64 updates to merge before applying
    UpdateList(Vec<String>),

    /// One base64 update
    UpdateBlob(String),
}

/// Fieldless tag of an [`InitialContent`], for logs and display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Empty,
    JsonSnapshot,
    UpdateList,
    UpdateBlob,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentKind::Empty => "empty",
            ContentKind::JsonSnapshot => "json-snapshot",
            ContentKind::UpdateList => "update-list",
            ContentKind::UpdateBlob => "update-blob",
        };
        f.write_str(name)
    }
}

/// Classify raw initial content.
pub fn classify(input: Option<RawContent>) -> InitialContent {
    match input {
        None => InitialContent::Empty,
        Some(RawContent::Texts(updates)) => InitialContent::UpdateList(updates),
        Some(RawContent::Text(text)) => classify_text(text),
        Some(RawContent::Json(value)) => classify_value(value),
    }
}

/// Classify an arbitrary JSON value (e.g. a deserialized request body).
pub fn classify_value(value: Value) -> InitialContent {
    match value {
        Value::Null => InitialContent::Empty,
        Value::String(text) => classify_text(text),
        Value::Array(items) if items.iter().all(Value::is_string) => InitialContent::UpdateList(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect(),
        ),
        other => InitialContent::JsonSnapshot(other),
    }
}

fn classify_text(text: String) -> InitialContent {
    // Base64 can also be valid JSON ("1234"), so only structured JSON counts.
    match serde_json::from_str::<Value>(&text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => InitialContent::JsonSnapshot(value),
        _ => InitialContent::UpdateBlob(text),
    }
}

impl InitialContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            InitialContent::Empty => ContentKind::Empty,
            InitialContent::JsonSnapshot(_) => ContentKind::JsonSnapshot,
            InitialContent::UpdateList(_) => ContentKind::UpdateList,
            InitialContent::UpdateBlob(_) => ContentKind::UpdateBlob,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InitialContent::Empty)
    }

    /// Decode the binary shapes into a single v1 update.
    ///
    /// Returns `Ok(None)` for shapes that carry no binary update (empty,
    /// JSON snapshot, or an empty update list).
    pub fn decode_update(&self) -> Result<Option<Vec<u8>>, EditorError> {
        match self {
            InitialContent::Empty | InitialContent::JsonSnapshot(_) => Ok(None),
            InitialContent::UpdateBlob(encoded) => Ok(Some(decode_base64(encoded)?)),
            InitialContent::UpdateList(encoded) => {
                if encoded.is_empty() {
                    return Ok(None);
                }
                let updates = encoded
                    .iter()
                    .map(|update| decode_base64(update))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(CrdtDocument::merge_updates(&updates)?))
            }
        }
    }
}

impl From<Option<RawContent>> for InitialContent {
    fn from(input: Option<RawContent>) -> Self {
        classify(input)
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, EditorError> {
    Ok(STANDARD.decode(encoded.trim())?)
}

/// Encode a binary update the way callers ship it on the wire.
pub fn encode_update(update: &[u8]) -> String {
    STANDARD.encode(update)
}
