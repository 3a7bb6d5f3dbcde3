//! # Replicated Document
//!
//! Wraps a yrs `Doc` that holds the tab directory and one XML fragment
//! per tab. All local writes made by this crate are tagged with
//! [`LOCAL_ORIGIN`] so update observers can tell them apart from changes
//! replicated in from a remote peer.
//!
//! ## Shared roots
//!
//! ```text
//! "tabs"      Map  { order: Array<TabId>, tabsMeta: Map<TabId, meta>, activeTabId: Text }
//! "default"   XmlFragment  (legacy, pre-tab content)
//! "<TabId>"   XmlFragment  (one per tab)
//! ```

use crate::EditorError;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{Doc, ReadTxn, StateVector, Transact, TransactionMut, Update, XmlFragment};

/// Origin tag attached to every transaction this crate opens
pub const LOCAL_ORIGIN: &str = "folio-local";

/// Fragment holding content of documents created before tabs existed
pub const LEGACY_FRAGMENT: &str = "default";

/// Root map holding the tab directory
pub const DIRECTORY_ROOT: &str = "tabs";

/// CRDT document shared by every tab of one logical document
#[derive(Debug)]
pub struct CrdtDocument {
    doc: Doc,
}

impl CrdtDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { doc: Doc::new() }
    }

    /// Wrap an existing yrs document
    pub fn from_doc(doc: Doc) -> Self {
        Self { doc }
    }

    /// Underlying yrs document, for binding collaborators such as a sync
    /// provider or an update observer.
    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// Open a write transaction tagged with the local origin.
    ///
    /// The transaction commits when dropped. Do not call any other
    /// `CrdtDocument` method while it is alive.
    pub fn transact_local(&self) -> TransactionMut<'_> {
        self.doc.transact_mut_with(LOCAL_ORIGIN)
    }

    /// Number of top-level nodes in a fragment (0 when it was never created)
    pub fn fragment_len(&self, name: &str) -> u32 {
        let txn = self.doc.transact();
        txn.get_xml_fragment(name)
            .map(|fragment| fragment.len(&txn))
            .unwrap_or(0)
    }

    /// Whether a fragment with this name exists in the document
    pub fn has_fragment(&self, name: &str) -> bool {
        let txn = self.doc.transact();
        txn.get_xml_fragment(name).is_some()
    }

    /// Apply a v1-encoded update as a local change.
    pub fn apply_update(&self, update: &[u8]) -> Result<(), EditorError> {
        let update =
            Update::decode_v1(update).map_err(|e| EditorError::Decode(e.to_string()))?;

        let mut txn = self.transact_local();
        txn.apply_update(update)
            .map_err(|e| EditorError::Apply(e.to_string()))?;

        Ok(())
    }

    /// Merge several v1-encoded updates into a single update.
    pub fn merge_updates<T: AsRef<[u8]>>(updates: &[T]) -> Result<Vec<u8>, EditorError> {
        let decoded = updates
            .iter()
            .map(|update| Update::decode_v1(update.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EditorError::Decode(e.to_string()))?;

        Ok(Update::merge_updates(decoded).encode_v1())
    }

    /// Get the current state vector (for delta sync).
    pub fn state_vector(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.state_vector().encode_v1()
    }

    /// Encode the full document state.
    pub fn encode_state(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }

    /// Encode everything a peer with the given state vector is missing.
    pub fn encode_diff(&self, state_vector: &[u8]) -> Result<Vec<u8>, EditorError> {
        let sv = StateVector::decode_v1(state_vector)
            .map_err(|e| EditorError::Decode(e.to_string()))?;
        let txn = self.doc.transact();
        Ok(txn.encode_state_as_update_v1(&sv))
    }
}

impl Default for CrdtDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yrs::{Text, WriteTxn, XmlTextPrelim};

    fn write_text(doc: &CrdtDocument, root: &str, content: &str) {
        let mut txn = doc.transact_local();
        let text = txn.get_or_insert_text(root);
        text.insert(&mut txn, 0, content);
    }

    #[test]
    fn test_new_document_has_no_fragments() {
        let doc = CrdtDocument::new();
        assert!(!doc.has_fragment(LEGACY_FRAGMENT));
        assert_eq!(doc.fragment_len(LEGACY_FRAGMENT), 0);
    }

    #[test]
    fn test_fragment_len() {
        let doc = CrdtDocument::new();
        {
            let mut txn = doc.transact_local();
            let fragment = txn.get_or_insert_xml_fragment("t1");
            fragment.push_back(&mut txn, XmlTextPrelim::new("hello"));
        }
        assert!(doc.has_fragment("t1"));
        assert_eq!(doc.fragment_len("t1"), 1);
    }

    #[test]
    fn test_state_roundtrip() {
        let doc1 = CrdtDocument::new();
        write_text(&doc1, "note", "hello");

        let doc2 = CrdtDocument::new();
        doc2.apply_update(&doc1.encode_state()).unwrap();

        let txn = doc2.doc().transact();
        let text = txn.get_text("note").unwrap();
        assert_eq!(yrs::GetString::get_string(&text, &txn), "hello");
    }

    #[test]
    fn test_apply_garbage_update_fails() {
        let doc = CrdtDocument::new();
        let result = doc.apply_update(&[0xff, 0xff, 0xff]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_updates() {
        let doc1 = CrdtDocument::new();
        write_text(&doc1, "a", "first");
        let doc2 = CrdtDocument::new();
        write_text(&doc2, "b", "second");

        let merged =
            CrdtDocument::merge_updates(&[doc1.encode_state(), doc2.encode_state()]).unwrap();

        let target = CrdtDocument::new();
        target.apply_update(&merged).unwrap();

        let txn = target.doc().transact();
        assert!(txn.get_text("a").is_some());
        assert!(txn.get_text("b").is_some());
    }

    #[test]
    fn test_delta_sync() {
        let doc1 = CrdtDocument::new();
        write_text(&doc1, "note", "base");

        let doc2 = CrdtDocument::new();
        doc2.apply_update(&doc1.encode_state()).unwrap();
        let sv = doc2.state_vector();

        write_text(&doc1, "note", ">> ");
        let delta = doc1.encode_diff(&sv).unwrap();
        doc2.apply_update(&delta).unwrap();

        let txn = doc2.doc().transact();
        let text = txn.get_text("note").unwrap();
        assert_eq!(yrs::GetString::get_string(&text, &txn), ">> base");
    }
}
