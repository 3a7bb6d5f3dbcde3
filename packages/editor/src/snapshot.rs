//! # JSON Snapshots
//!
//! Bridges JSON document snapshots and tab fragments.
//!
//! Snapshots use the rich-text editor's document shape:
//!
//! ```text
//! { "type": "doc", "content": [
//!     { "type": "paragraph", "attrs": { ... }, "content": [
//!         { "type": "text", "text": "Hi", "marks": [{ "type": "bold" }] }
//!     ] }
//! ] }
//! ```
//!
//! Elements map to XML elements named after `type`, with `attrs` as XML
//! attributes. Adjacent text nodes collapse into one XML text node whose
//! runs carry the marks as formatting attributes (`mark type -> mark attrs`).

use crate::node::{read_children, write_nodes, SharedNode, TextRun};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use yrs::{Any, ReadTxn, TransactionMut, XmlFragment};

/// Cleans a JSON snapshot before it is written into a tab.
///
/// The rich-text schema lives outside this crate, so the sanitizer is a
/// seam for the editor to drop or repair nodes its schema would reject.
pub trait ContentSanitizer: Send + Sync {
    fn sanitize(&self, snapshot: Value) -> Value;
}

/// Sanitizer that accepts every snapshot unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughSanitizer;

impl ContentSanitizer for PassthroughSanitizer {
    fn sanitize(&self, snapshot: Value) -> Value {
        snapshot
    }
}

/// Sanitizer that removes nodes whose `type` is not in an allow list
#[derive(Debug, Clone)]
pub struct AllowListSanitizer {
    node_types: HashSet<String>,
}

impl AllowListSanitizer {
    pub fn new<I, S>(node_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut node_types: HashSet<String> = node_types.into_iter().map(Into::into).collect();
        node_types.insert("doc".to_string());
        node_types.insert("text".to_string());
        Self { node_types }
    }

    fn retain(&self, node: &mut Value) {
        if let Some(Value::Array(children)) = node.get_mut("content") {
            children.retain(|child| {
                child
                    .get("type")
                    .and_then(Value::as_str)
                    .map(|kind| self.node_types.contains(kind))
                    .unwrap_or(false)
            });
            for child in children.iter_mut() {
                self.retain(child);
            }
        }
    }
}

impl ContentSanitizer for AllowListSanitizer {
    fn sanitize(&self, mut snapshot: Value) -> Value {
        self.retain(&mut snapshot);
        snapshot
    }
}

/// Replace the content of `fragment` with the given snapshot.
pub fn write_snapshot<F: XmlFragment>(txn: &mut TransactionMut, fragment: &F, snapshot: &Value) {
    let existing = fragment.len(txn);
    if existing > 0 {
        fragment.remove_range(txn, 0, existing);
    }
    write_nodes(txn, fragment, 0, &nodes_from_json(snapshot));
}

/// Read a fragment back as a JSON snapshot.
pub fn read_snapshot<T: ReadTxn, F: XmlFragment>(txn: &T, fragment: &F) -> Value {
    nodes_to_json(&read_children(txn, fragment))
}

/// Convert a snapshot's top-level content into shared nodes.
pub fn nodes_from_json(snapshot: &Value) -> Vec<SharedNode> {
    match snapshot {
        Value::Array(items) => children_from_json(items),
        Value::Object(object) => match object.get("content") {
            Some(Value::Array(items)) if is_root(object) => children_from_json(items),
            _ if is_root(object) => Vec::new(),
            _ => children_from_json(std::slice::from_ref(snapshot)),
        },
        _ => Vec::new(),
    }
}

/// Wrap shared nodes as a `doc` snapshot.
pub fn nodes_to_json(nodes: &[SharedNode]) -> Value {
    let mut doc = Map::new();
    doc.insert("type".to_string(), Value::String("doc".to_string()));
    doc.insert("content".to_string(), Value::Array(children_to_json(nodes)));
    Value::Object(doc)
}

fn is_root(object: &Map<String, Value>) -> bool {
    matches!(object.get("type").and_then(Value::as_str), Some("doc") | None)
}

fn children_from_json(items: &[Value]) -> Vec<SharedNode> {
    let mut nodes = Vec::new();
    let mut pending_runs: Vec<TextRun> = Vec::new();

    for item in items {
        let Some(object) = item.as_object() else {
            continue;
        };
        let kind = object.get("type").and_then(Value::as_str).unwrap_or_default();

        if kind == "text" {
            let text = object.get("text").and_then(Value::as_str).unwrap_or_default();
            pending_runs.push(TextRun {
                text: text.to_string(),
                attributes: marks_from_json(object.get("marks")),
            });
            continue;
        }

        if !pending_runs.is_empty() {
            nodes.push(SharedNode::Text {
                runs: std::mem::take(&mut pending_runs),
            });
        }
        if kind.is_empty() {
            continue;
        }

        let attributes = object
            .get("attrs")
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(name, value)| (name.clone(), attribute_to_string(value)))
                    .collect()
            })
            .unwrap_or_default();

        let children = match object.get("content") {
            Some(Value::Array(content)) => children_from_json(content),
            _ => Vec::new(),
        };

        nodes.push(SharedNode::Element {
            tag: kind.to_string(),
            attributes,
            children,
        });
    }

    if !pending_runs.is_empty() {
        nodes.push(SharedNode::Text { runs: pending_runs });
    }
    nodes
}

fn marks_from_json(marks: Option<&Value>) -> BTreeMap<String, Any> {
    let Some(Value::Array(marks)) = marks else {
        return BTreeMap::new();
    };
    marks
        .iter()
        .filter_map(|mark| {
            let kind = mark.get("type")?.as_str()?;
            let attrs = mark
                .get("attrs")
                .map(json_to_any)
                .unwrap_or_else(|| Any::Map(Arc::new(HashMap::new())));
            Some((kind.to_string(), attrs))
        })
        .collect()
}

fn children_to_json(nodes: &[SharedNode]) -> Vec<Value> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            SharedNode::Element {
                tag,
                attributes,
                children,
            } => {
                let mut object = Map::new();
                object.insert("type".to_string(), Value::String(tag.clone()));
                if !attributes.is_empty() {
                    let attrs = attributes
                        .iter()
                        .map(|(name, value)| (name.clone(), attribute_from_string(value)))
                        .collect();
                    object.insert("attrs".to_string(), Value::Object(attrs));
                }
                if !children.is_empty() {
                    object.insert("content".to_string(), Value::Array(children_to_json(children)));
                }
                out.push(Value::Object(object));
            }
            SharedNode::Text { runs } => {
                for run in runs.iter().filter(|run| !run.text.is_empty()) {
                    let mut object = Map::new();
                    object.insert("type".to_string(), Value::String("text".to_string()));
                    object.insert("text".to_string(), Value::String(run.text.clone()));
                    if !run.attributes.is_empty() {
                        let marks = run
                            .attributes
                            .iter()
                            .map(|(kind, attrs)| mark_to_json(kind, attrs))
                            .collect();
                        object.insert("marks".to_string(), Value::Array(marks));
                    }
                    out.push(Value::Object(object));
                }
            }
        }
    }
    out
}

fn mark_to_json(kind: &str, attrs: &Any) -> Value {
    let mut mark = Map::new();
    mark.insert("type".to_string(), Value::String(kind.to_string()));
    match attrs {
        Any::Map(map) if map.is_empty() => {}
        Any::Null | Any::Undefined | Any::Bool(true) => {}
        other => {
            mark.insert("attrs".to_string(), any_to_json(other));
        }
    }
    Value::Object(mark)
}

/// XML attributes hold strings; other JSON values are stored as JSON text.
fn attribute_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn attribute_from_string(value: &str) -> Value {
    match serde_json::from_str::<Value>(value) {
        Ok(parsed) if !parsed.is_string() => parsed,
        _ => Value::String(value.to_string()),
    }
}

fn json_to_any(value: &Value) -> Any {
    match value {
        Value::Null => Any::Null,
        Value::Bool(flag) => Any::Bool(*flag),
        Value::Number(number) => Any::Number(number.as_f64().unwrap_or_default()),
        Value::String(text) => Any::String(text.as_str().into()),
        Value::Array(items) => Any::Array(items.iter().map(json_to_any).collect::<Vec<_>>().into()),
        Value::Object(object) => Any::Map(Arc::new(
            object
                .iter()
                .map(|(key, value)| (key.clone(), json_to_any(value)))
                .collect(),
        )),
    }
}

fn any_to_json(value: &Any) -> Value {
    match value {
        Any::Null | Any::Undefined => Value::Null,
        Any::Bool(flag) => Value::Bool(*flag),
        Any::Number(number) => number_to_json(*number),
        Any::BigInt(number) => Value::Number((*number).into()),
        Any::String(text) => Value::String(text.to_string()),
        Any::Buffer(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        Any::Array(items) => Value::Array(items.iter().map(any_to_json).collect()),
        Any::Map(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), any_to_json(value)))
                .collect(),
        ),
    }
}

fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::Number((number as i64).into())
    } else {
        Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
    }
}
