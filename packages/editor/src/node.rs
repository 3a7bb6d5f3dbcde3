//! # Shared Node Visitor
//!
//! Owned, closed view over the XML nodes stored in a tab fragment.
//!
//! Only two node kinds are supported: elements and text. Reading a node of
//! any other kind yields `None` and a warning, so callers that copy trees
//! (legacy migration, snapshot hydration) drop that single node and carry on.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;
use yrs::types::text::YChange;
use yrs::{
    Any, Out, ReadTxn, Text, TransactionMut, Xml, XmlElementPrelim, XmlElementRef, XmlFragment,
    XmlOut, XmlTextPrelim, XmlTextRef,
};

/// A detached copy of one shared XML node
#[derive(Debug, Clone, PartialEq)]
pub enum SharedNode {
    Element {
        tag: String,
        /// XML attributes are plain strings
        attributes: BTreeMap<String, String>,
        children: Vec<SharedNode>,
    },
    Text {
        runs: Vec<TextRun>,
    },
}

/// A span of text sharing one set of formatting attributes
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub attributes: BTreeMap<String, Any>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }
}

impl SharedNode {
    pub fn element(tag: impl Into<String>, children: Vec<SharedNode>) -> Self {
        SharedNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        SharedNode::Text {
            runs: vec![TextRun::plain(text)],
        }
    }

    /// Concatenated text of this node and all descendants
    pub fn plain_text(&self) -> String {
        match self {
            SharedNode::Element { children, .. } => {
                children.iter().map(SharedNode::plain_text).collect()
            }
            SharedNode::Text { runs } => runs.iter().map(|run| run.text.as_str()).collect(),
        }
    }
}

/// Copy a shared node out of the document.
pub fn read_node<T: ReadTxn>(txn: &T, node: &XmlOut) -> Option<SharedNode> {
    match node {
        XmlOut::Element(element) => Some(read_element(txn, element)),
        XmlOut::Text(text) => read_text(txn, text),
        XmlOut::Fragment(_) => {
            warn!("Skipping unsupported nested fragment node");
            None
        }
    }
}

/// Copy every supported child of a fragment or element.
pub fn read_children<T: ReadTxn, F: XmlFragment>(txn: &T, parent: &F) -> Vec<SharedNode> {
    (0..parent.len(txn))
        .filter_map(|index| parent.get(txn, index))
        .filter_map(|child| read_node(txn, &child))
        .collect()
}

fn read_element<T: ReadTxn>(txn: &T, element: &XmlElementRef) -> SharedNode {
    let attributes = element
        .attributes(txn)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    SharedNode::Element {
        tag: element.tag().to_string(),
        attributes,
        children: read_children(txn, element),
    }
}

fn read_text<T: ReadTxn>(txn: &T, text: &XmlTextRef) -> Option<SharedNode> {
    let chunks = text.diff(txn, YChange::identity);
    let chunk_count = chunks.len();
    let runs: Vec<TextRun> = chunks
        .into_iter()
        .filter_map(|chunk| match chunk.insert {
            Out::Any(Any::String(value)) => Some(TextRun {
                text: value.to_string(),
                attributes: chunk
                    .attributes
                    .map(|attrs| {
                        attrs
                            .iter()
                            .map(|(name, value)| (name.to_string(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            _ => {
                warn!("Skipping embedded value inside text node");
                None
            }
        })
        .collect();

    // A text node made only of embeds has nothing left to copy
    if chunk_count > 0 && runs.is_empty() {
        return None;
    }
    Some(SharedNode::Text { runs })
}

/// Insert a fresh shared copy of `node` into `parent` at `index`.
pub fn write_node<F: XmlFragment>(
    txn: &mut TransactionMut,
    parent: &F,
    index: u32,
    node: &SharedNode,
) {
    match node {
        SharedNode::Element {
            tag,
            attributes,
            children,
        } => {
            let element = parent.insert(txn, index, XmlElementPrelim::empty(tag.as_str()));
            for (name, value) in attributes {
                element.insert_attribute(txn, name.as_str(), value.as_str());
            }
            for (offset, child) in children.iter().enumerate() {
                write_node(txn, &element, offset as u32, child);
            }
        }
        SharedNode::Text { runs } => {
            let text = parent.insert(txn, index, XmlTextPrelim::new(""));
            for run in runs.iter().filter(|run| !run.text.is_empty()) {
                let end = text.len(txn);
                if run.attributes.is_empty() {
                    text.insert(txn, end, &run.text);
                } else {
                    let attrs: HashMap<Arc<str>, Any> = run
                        .attributes
                        .iter()
                        .map(|(name, value)| (Arc::from(name.as_str()), value.clone()))
                        .collect();
                    text.insert_with_attributes(txn, end, &run.text, attrs);
                }
            }
        }
    }
}

/// Insert `nodes` into `parent`, starting at `index`, preserving order.
pub fn write_nodes<F: XmlFragment>(
    txn: &mut TransactionMut,
    parent: &F,
    index: u32,
    nodes: &[SharedNode],
) {
    for (offset, node) in nodes.iter().enumerate() {
        write_node(txn, parent, index + offset as u32, node);
    }
}
