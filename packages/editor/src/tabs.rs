//! # Tab Lifecycle
//!
//! Creating tabs on top of the [`TabDirectory`]. Deleting and reordering
//! are not supported yet; renames go through [`crate::MetadataHistory`] so
//! they stay undoable.

use crate::{CrdtDocument, EditorError, TabDirectory, TabMetadata};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{info, warn};
use yrs::WriteTxn;

/// Random bytes behind every generated tab id
pub const TAB_ID_BYTES: usize = 16;

/// Generate a fresh tab id from the OS random source.
///
/// The id doubles as the name of the tab's root fragment, so it is encoded
/// as URL-safe base64 without padding.
pub fn generate_tab_id() -> String {
    let mut bytes = [0u8; TAB_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Creates tabs and owns the lifecycle rules for them
#[derive(Debug, Clone)]
pub struct TabManager {
    collaboration: bool,
}

impl TabManager {
    pub fn new(collaboration: bool) -> Self {
        Self { collaboration }
    }

    /// Whether the active tab is kept local to this peer
    pub fn is_collaborative(&self) -> bool {
        self.collaboration
    }

    /// Create a tab at the end of the directory and return its id.
    ///
    /// In solo sessions the new tab also becomes the replicated active
    /// tab. In collaborative sessions the caller switches its local
    /// active tab instead.
    pub fn create_tab(&self, doc: &CrdtDocument) -> String {
        TabDirectory::ensure(doc);

        let tab_id = generate_tab_id();
        let mut txn = doc.transact_local();
        // ensure() ran above, so the directory is present
        let Some(directory) = TabDirectory::get(&txn) else {
            warn!("Tab directory vanished before tab creation");
            return tab_id;
        };

        let metadata = TabMetadata::new(format!("Tab {}", directory.len(&txn) + 1));
        directory.set_metadata(&mut txn, &tab_id, &metadata);
        directory.push_tab(&mut txn, &tab_id);
        txn.get_or_insert_xml_fragment(tab_id.as_str());

        if !self.collaboration {
            directory.set_active_tab_id(&mut txn, &tab_id);
        }

        info!(tab_id = %tab_id, name = %metadata.name, "Created tab");
        tab_id
    }

    /// Not supported yet: no defined semantics for the active tab,
    /// fragment cleanup, or concurrent edits to a deleted tab.
    pub fn delete_tab(&self, _doc: &CrdtDocument, tab_id: &str) -> Result<(), EditorError> {
        warn!(tab_id = %tab_id, "Tab deletion is not supported");
        Err(EditorError::Unsupported("delete tab"))
    }

    /// Not supported yet: concurrent reorder semantics are undefined.
    pub fn order_tab(
        &self,
        _doc: &CrdtDocument,
        tab_id: &str,
        _index: u32,
    ) -> Result<(), EditorError> {
        warn!(tab_id = %tab_id, "Tab reordering is not supported");
        Err(EditorError::Unsupported("reorder tab"))
    }
}
