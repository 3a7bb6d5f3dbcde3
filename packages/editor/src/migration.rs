//! # Legacy Migration
//!
//! Documents written before tabs existed keep all their content in the
//! [`LEGACY_FRAGMENT`]. Migration moves that content into a tab fragment
//! once, so everything downstream can address content by tab id only.
//!
//! Migration only runs when the legacy fragment has content and the target
//! fragment is empty. Running it again, or on a document that never had
//! legacy content, changes nothing.

use crate::node::{read_children, write_nodes};
use crate::{CrdtDocument, LEGACY_FRAGMENT};
use tracing::{debug, info};
use yrs::{WriteTxn, XmlFragment};

/// Move the legacy fragment's content to the head of `target_tab_id`'s
/// fragment. Returns whether anything moved.
pub fn migrate_default_fragment_to_tab(doc: &CrdtDocument, target_tab_id: &str) -> bool {
    let legacy_len = doc.fragment_len(LEGACY_FRAGMENT);
    let target_len = doc.fragment_len(target_tab_id);

    if legacy_len == 0 || target_len > 0 {
        debug!(
            tab_id = %target_tab_id,
            legacy_len,
            target_len,
            "Skipping legacy migration"
        );
        return false;
    }

    let mut txn = doc.transact_local();
    let legacy = txn.get_or_insert_xml_fragment(LEGACY_FRAGMENT);
    let target = txn.get_or_insert_xml_fragment(target_tab_id);

    let clones = read_children(&txn, &legacy);
    write_nodes(&mut txn, &target, 0, &clones);

    let len = legacy.len(&txn);
    legacy.remove_range(&mut txn, 0, len);

    info!(
        tab_id = %target_tab_id,
        moved = clones.len(),
        skipped = (legacy_len as usize).saturating_sub(clones.len()),
        "Migrated legacy content into tab"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SharedNode;
    use crate::snapshot::read_snapshot;
    use yrs::{Any, ReadTxn, Text, Transact, XmlElementPrelim, XmlTextPrelim};

    fn seed_legacy(doc: &CrdtDocument, paragraphs: &[&str]) {
        let nodes: Vec<SharedNode> = paragraphs
            .iter()
            .map(|text| SharedNode::element("paragraph", vec![SharedNode::text(*text)]))
            .collect();
        let mut txn = doc.transact_local();
        let legacy = txn.get_or_insert_xml_fragment(LEGACY_FRAGMENT);
        write_nodes(&mut txn, &legacy, 0, &nodes);
    }

    fn snapshot_of(doc: &CrdtDocument, name: &str) -> serde_json::Value {
        let txn = doc.doc().transact();
        match txn.get_xml_fragment(name) {
            Some(fragment) => read_snapshot(&txn, &fragment),
            None => serde_json::json!({ "type": "doc", "content": [] }),
        }
    }

    #[test]
    fn test_moves_legacy_content() {
        let doc = CrdtDocument::new();
        seed_legacy(&doc, &["first", "second"]);

        assert!(migrate_default_fragment_to_tab(&doc, "t1"));

        assert_eq!(doc.fragment_len(LEGACY_FRAGMENT), 0);
        assert_eq!(doc.fragment_len("t1"), 2);
    }

    #[test]
    fn test_is_idempotent() {
        let doc = CrdtDocument::new();
        seed_legacy(&doc, &["only"]);

        assert!(migrate_default_fragment_to_tab(&doc, "t1"));
        let once = snapshot_of(&doc, "t1");

        assert!(!migrate_default_fragment_to_tab(&doc, "t1"));
        assert_eq!(snapshot_of(&doc, "t1"), once);
        assert_eq!(doc.fragment_len(LEGACY_FRAGMENT), 0);
    }

    #[test]
    fn test_no_legacy_content_is_noop() {
        let doc = CrdtDocument::new();
        assert!(!migrate_default_fragment_to_tab(&doc, "t1"));
        assert!(!doc.has_fragment("t1"));
    }

    #[test]
    fn test_non_empty_target_is_left_alone() {
        let doc = CrdtDocument::new();
        seed_legacy(&doc, &["legacy"]);
        {
            let mut txn = doc.transact_local();
            let target = txn.get_or_insert_xml_fragment("t1");
            target.push_back(&mut txn, XmlTextPrelim::new("existing"));
        }

        assert!(!migrate_default_fragment_to_tab(&doc, "t1"));
        assert_eq!(doc.fragment_len(LEGACY_FRAGMENT), 1);
        assert_eq!(doc.fragment_len("t1"), 1);
    }

    #[test]
    fn test_embeds_are_dropped_and_migration_completes() {
        let doc = CrdtDocument::new();
        seed_legacy(&doc, &["first"]);
        {
            let mut txn = doc.transact_local();
            let legacy = txn.get_or_insert_xml_fragment(LEGACY_FRAGMENT);
            let paragraph = legacy.push_back(&mut txn, XmlElementPrelim::empty("paragraph"));
            let text = paragraph.push_back(&mut txn, XmlTextPrelim::new("before after"));
            text.insert_embed(&mut txn, 7, Any::Bool(true));
            let only_embed = legacy.push_back(&mut txn, XmlTextPrelim::new(""));
            only_embed.insert_embed(&mut txn, 0, Any::Bool(true));
        }

        assert!(migrate_default_fragment_to_tab(&doc, "t1"));

        assert_eq!(doc.fragment_len(LEGACY_FRAGMENT), 0);
        let txn = doc.doc().transact();
        let target = txn.get_xml_fragment("t1").unwrap();
        let texts: Vec<String> = read_children(&txn, &target)
            .iter()
            .map(SharedNode::plain_text)
            .collect();
        assert_eq!(texts, vec!["first", "before after"]);
    }
}
