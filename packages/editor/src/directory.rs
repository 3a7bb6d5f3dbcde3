//! # Tab Directory
//!
//! The replicated index of tabs in a document. It lives in the
//! [`DIRECTORY_ROOT`] map:
//!
//! - `order`: array of tab ids, in display order
//! - `tabsMeta`: map of tab id to `{ name, showOutline, emoji }`
//! - `activeTabId`: text register naming the active tab (solo sessions only)
//!
//! The three entries are created together, in one transaction, so a peer
//! never sees an order entry without metadata or the other way around.

use crate::migration::migrate_default_fragment_to_tab;
use crate::{CrdtDocument, DIRECTORY_ROOT};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use yrs::{
    Any, Array, ArrayPrelim, ArrayRef, GetString, Map, MapPrelim, MapRef, Out, ReadTxn, Text,
    TextPrelim, Transact, TransactionMut, WriteTxn,
};

/// Id of the tab every document starts with
pub const DEFAULT_TAB_ID: &str = "default-tab";

/// Name of the tab every document starts with
pub const DEFAULT_TAB_NAME: &str = "Tab 1";

const ORDER_KEY: &str = "order";
const META_KEY: &str = "tabsMeta";
const ACTIVE_KEY: &str = "activeTabId";

/// Replicated per-tab metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabMetadata {
    pub name: String,
    pub show_outline: bool,
    pub emoji: Option<String>,
}

impl TabMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            show_outline: true,
            emoji: None,
        }
    }

    fn to_any(&self) -> Any {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Any::String(self.name.as_str().into()));
        map.insert("showOutline".to_string(), Any::Bool(self.show_outline));
        map.insert(
            "emoji".to_string(),
            match &self.emoji {
                Some(emoji) => Any::String(emoji.as_str().into()),
                None => Any::Null,
            },
        );
        Any::Map(Arc::new(map))
    }

    /// Decode metadata written either as a plain value or as a nested map.
    fn from_out<T: ReadTxn>(txn: &T, value: &Out) -> Option<Self> {
        match value {
            Out::Any(Any::Map(map)) => Self::from_fields(|key| map.get(key).cloned()),
            Out::YMap(map) => Self::from_fields(|key| match map.get(txn, key) {
                Some(Out::Any(any)) => Some(any),
                _ => None,
            }),
            _ => None,
        }
    }

    fn from_fields(field: impl Fn(&str) -> Option<Any>) -> Option<Self> {
        let name = match field("name")? {
            Any::String(name) => name.to_string(),
            _ => return None,
        };
        let show_outline = match field("showOutline") {
            Some(Any::Bool(flag)) => flag,
            _ => true,
        };
        let emoji = match field("emoji") {
            Some(Any::String(emoji)) => Some(emoji.to_string()),
            _ => None,
        };
        Some(Self {
            name,
            show_outline,
            emoji,
        })
    }
}

/// Read projection of one directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub show_outline: bool,
    pub emoji: Option<String>,
}

impl Tab {
    fn new(id: String, metadata: TabMetadata) -> Self {
        Self {
            id,
            name: metadata.name,
            show_outline: metadata.show_outline,
            emoji: metadata.emoji,
        }
    }
}

/// Plain tab list for the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabList {
    pub tabs: Vec<Tab>,
    pub active_tab_id: String,
}

/// Handles to the shared structures of a bootstrapped directory
#[derive(Debug, Clone)]
pub struct TabDirectory {
    root: MapRef,
    order: ArrayRef,
    meta: MapRef,
}

impl TabDirectory {
    /// Look the directory up; `None` until `order` and `tabsMeta` exist.
    pub fn get<T: ReadTxn>(txn: &T) -> Option<Self> {
        let root = txn.get_map(DIRECTORY_ROOT)?;
        let order = match root.get(txn, ORDER_KEY)? {
            Out::YArray(order) => order,
            _ => return None,
        };
        let meta = match root.get(txn, META_KEY)? {
            Out::YMap(meta) => meta,
            _ => return None,
        };
        Some(Self { root, order, meta })
    }

    /// Whether the directory has been bootstrapped in this document
    pub fn exists(doc: &CrdtDocument) -> bool {
        let txn = doc.doc().transact();
        Self::get(&txn).is_some()
    }

    /// Bootstrap the directory if it is missing.
    ///
    /// Creates the missing shared structures and the default tab in one
    /// transaction, then migrates legacy content into the default tab.
    /// A directory that only lacks `activeTabId` gets that register alone.
    /// Returns whether a directory was created.
    pub fn ensure(doc: &CrdtDocument) -> bool {
        let created = {
            let mut txn = doc.transact_local();
            match Self::get(&txn) {
                Some(directory) => {
                    directory.repair_active_tab(&mut txn);
                    false
                }
                None => {
                    Self::bootstrap(&mut txn);
                    true
                }
            }
        };
        Self::touch_fragments(doc);

        if !created {
            debug!("Tab directory already present");
            return false;
        }
        info!(tab_id = DEFAULT_TAB_ID, "Bootstrapped tab directory");

        migrate_default_fragment_to_tab(doc, DEFAULT_TAB_ID);
        true
    }

    fn bootstrap(txn: &mut TransactionMut) {
        let root = txn.get_or_insert_map(DIRECTORY_ROOT);
        let order = match root.get(&*txn, ORDER_KEY) {
            Some(Out::YArray(order)) => order,
            _ => root.insert(txn, ORDER_KEY, ArrayPrelim::default()),
        };
        let meta = match root.get(&*txn, META_KEY) {
            Some(Out::YMap(meta)) => meta,
            _ => root.insert(txn, META_KEY, MapPrelim::default()),
        };
        let directory = Self { root, order, meta };

        if directory.len(&*txn) == 0 {
            directory.set_metadata(txn, DEFAULT_TAB_ID, &TabMetadata::new(DEFAULT_TAB_NAME));
            directory.push_tab(txn, DEFAULT_TAB_ID);
            directory.set_active_tab_id(txn, DEFAULT_TAB_ID);
        } else {
            directory.repair_active_tab(txn);
        }
        txn.get_or_insert_xml_fragment(DEFAULT_TAB_ID);
    }

    fn repair_active_tab(&self, txn: &mut TransactionMut) {
        if matches!(self.root.get(&*txn, ACTIVE_KEY), Some(Out::YText(_))) {
            return;
        }
        let first = self.ids(&*txn).into_iter().next().unwrap_or_default();
        warn!(tab_id = %first, "Restoring missing active tab register");
        self.root.insert(txn, ACTIVE_KEY, TextPrelim::new(first.as_str()));
    }

    /// Make sure every tab in `order` has its fragment in this replica.
    ///
    /// Empty root fragments carry no update data, so tabs that arrive from
    /// a peer or a stored update have no fragment until touched here.
    pub fn touch_fragments(doc: &CrdtDocument) {
        let mut txn = doc.transact_local();
        let Some(directory) = Self::get(&txn) else {
            return;
        };
        for id in directory.ids(&txn) {
            txn.get_or_insert_xml_fragment(id.as_str());
        }
    }

    /// Project the directory into a plain tab list.
    ///
    /// Ids without metadata (e.g. from a peer that has not finished
    /// syncing) are skipped.
    pub fn tab_list(doc: &CrdtDocument) -> TabList {
        let txn = doc.doc().transact();
        match Self::get(&txn) {
            Some(directory) => directory.project(&txn),
            None => TabList::default(),
        }
    }

    pub fn project<T: ReadTxn>(&self, txn: &T) -> TabList {
        let mut seen = HashSet::new();
        let tabs = self
            .ids(txn)
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .filter_map(|id| {
                let metadata = self.metadata(txn, &id)?;
                Some(Tab::new(id, metadata))
            })
            .collect();

        TabList {
            tabs,
            active_tab_id: self.active_tab_id(txn),
        }
    }

    /// Tab ids in display order
    pub fn ids<T: ReadTxn>(&self, txn: &T) -> Vec<String> {
        self.order
            .iter(txn)
            .filter_map(|value| match value {
                Out::Any(Any::String(id)) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn len<T: ReadTxn>(&self, txn: &T) -> u32 {
        self.order.len(txn)
    }

    pub fn metadata_len<T: ReadTxn>(&self, txn: &T) -> u32 {
        self.meta.len(txn)
    }

    pub fn contains<T: ReadTxn>(&self, txn: &T, tab_id: &str) -> bool {
        self.meta.contains_key(txn, tab_id)
    }

    pub fn metadata<T: ReadTxn>(&self, txn: &T, tab_id: &str) -> Option<TabMetadata> {
        let value = self.meta.get(txn, tab_id)?;
        TabMetadata::from_out(txn, &value)
    }

    pub fn set_metadata(&self, txn: &mut TransactionMut, tab_id: &str, metadata: &TabMetadata) {
        self.meta.insert(txn, tab_id, metadata.to_any());
    }

    /// Append a tab id to the display order
    pub fn push_tab(&self, txn: &mut TransactionMut, tab_id: &str) {
        self.order.push_back(txn, Any::String(tab_id.into()));
    }

    pub fn active_tab_id<T: ReadTxn>(&self, txn: &T) -> String {
        match self.root.get(txn, ACTIVE_KEY) {
            Some(Out::YText(active)) => active.get_string(txn),
            _ => String::new(),
        }
    }

    /// Overwrite the replicated active tab register
    pub fn set_active_tab_id(&self, txn: &mut TransactionMut, tab_id: &str) {
        match self.root.get(&*txn, ACTIVE_KEY) {
            Some(Out::YText(active)) => {
                let len = active.len(&*txn);
                if len > 0 {
                    active.remove_range(txn, 0, len);
                }
                active.insert(txn, 0, tab_id);
            }
            _ => {
                self.root.insert(txn, ACTIVE_KEY, TextPrelim::new(tab_id));
            }
        }
    }
}
