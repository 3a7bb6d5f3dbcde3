//! Integration tests for editor crate

use folio_editor::{
    classify, classify_value, encode_update, write_snapshot, ContentKind, CrdtDocument,
    EditorOptions, EditorSession, HydrationOutcome, InitialContent, NoopPersistence,
    PassthroughSanitizer, RawContent, RenameRequest, TabDirectory, DEFAULT_TAB_ID,
    DEFAULT_TAB_NAME, LEGACY_FRAGMENT,
};
use serde_json::json;
use yrs::{ReadTxn, Transact, WriteTxn};

fn paragraph(text: &str) -> serde_json::Value {
    json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
}

/// Encode a pre-tab document whose content lives in the legacy fragment
fn legacy_blob(paragraphs: &[&str]) -> String {
    let legacy = CrdtDocument::new();
    {
        let mut txn = legacy.transact_local();
        let fragment = txn.get_or_insert_xml_fragment(LEGACY_FRAGMENT);
        let snapshot = json!({
            "type": "doc",
            "content": paragraphs.iter().map(|p| paragraph(p)).collect::<Vec<_>>(),
        });
        write_snapshot(&mut txn, &fragment, &snapshot);
    }
    encode_update(&legacy.encode_state())
}

fn sync(from: &EditorSession, to: &EditorSession) -> anyhow::Result<()> {
    let diff = from.document().encode_diff(&to.document().state_vector())?;
    to.apply_update(&diff)?;
    Ok(())
}

fn assert_directory_invariants(session: &EditorSession) {
    let doc = session.document();
    let txn = doc.doc().transact();
    let directory = TabDirectory::get(&txn).expect("directory bootstrapped");

    let ids = directory.ids(&txn);
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "order has duplicates");
    assert_eq!(directory.len(&txn), directory.metadata_len(&txn));
    assert!(ids.iter().all(|id| directory.contains(&txn, id)));
    assert!(ids.iter().all(|id| txn.get_xml_fragment(id.as_str()).is_some()));

    let active = directory.active_tab_id(&txn);
    assert!(active.is_empty() || ids.contains(&active));
}

#[tokio::test]
async fn test_legacy_document_end_to_end() {
    let content = classify(Some(RawContent::Text(legacy_blob(&["Hello", "World"]))));
    assert_eq!(content.kind(), ContentKind::UpdateBlob);

    let session = EditorSession::open(
        EditorOptions::solo(),
        content,
        &PassthroughSanitizer,
        &NoopPersistence,
    )
    .await;

    let list = session.tab_list();
    assert_eq!(
        serde_json::to_value(&list).unwrap(),
        json!({
            "tabs": [{ "id": DEFAULT_TAB_ID, "name": DEFAULT_TAB_NAME, "showOutline": true, "emoji": null }],
            "activeTabId": DEFAULT_TAB_ID,
        })
    );
    assert_eq!(session.document().fragment_len(LEGACY_FRAGMENT), 0);
    assert_eq!(
        session.fragment_json(DEFAULT_TAB_ID),
        Some(json!({ "type": "doc", "content": [paragraph("Hello"), paragraph("World")] }))
    );
    assert!(!session.is_content_loading());
}

#[tokio::test]
async fn test_json_snapshot_lands_in_default_tab() {
    let snapshot = json!({ "type": "doc", "content": [paragraph("From JSON")] });
    let content = classify(Some(RawContent::Text(snapshot.to_string())));
    assert_eq!(content.kind(), ContentKind::JsonSnapshot);

    let session = EditorSession::open(
        EditorOptions::solo(),
        content,
        &PassthroughSanitizer,
        &NoopPersistence,
    )
    .await;

    assert_eq!(session.fragment_json(DEFAULT_TAB_ID), Some(snapshot));
    assert_eq!(session.document().fragment_len(LEGACY_FRAGMENT), 0);
}

#[tokio::test]
async fn test_replicated_directory_is_not_shadowed() {
    let mut origin = EditorSession::new(EditorOptions::solo());
    origin.ensure_directory();
    let second = origin.create_tab();
    origin.apply_rename(RenameRequest::new(&second).name("Research").emoji(Some("🔬")));

    let blob = encode_update(&origin.document().encode_state());
    let reopened = EditorSession::open(
        EditorOptions::solo(),
        classify_value(json!(blob)),
        &PassthroughSanitizer,
        &NoopPersistence,
    )
    .await;

    assert_eq!(reopened.tabs(), origin.tabs());
    assert_eq!(reopened.active_tab_id(), second);
    assert_directory_invariants(&reopened);
}

#[tokio::test]
async fn test_update_list_is_merged_before_apply() {
    let mut origin = EditorSession::new(EditorOptions::solo());
    origin.ensure_directory();
    let first = origin.document().encode_state();
    let sv = origin.document().state_vector();
    origin.create_tab();
    let second = origin.document().encode_diff(&sv).unwrap();

    let content = classify(Some(RawContent::Texts(vec![
        encode_update(&first),
        encode_update(&second),
    ])));
    let session = EditorSession::open(
        EditorOptions::solo(),
        content,
        &PassthroughSanitizer,
        &NoopPersistence,
    )
    .await;

    assert_eq!(session.tabs().len(), 2);
    assert_eq!(session.tabs(), origin.tabs());
}

#[tokio::test]
async fn test_malformed_content_still_opens() {
    let content = classify(Some(RawContent::Text("not-json-not-b64!!".to_string())));
    assert_eq!(content.kind(), ContentKind::UpdateBlob);

    let session = EditorSession::open(
        EditorOptions::solo(),
        content,
        &PassthroughSanitizer,
        &NoopPersistence,
    )
    .await;

    assert_eq!(session.tabs().len(), 1);
    assert!(!session.is_content_loading());
}

#[test]
fn test_directory_invariant_over_mixed_sequence() {
    let mut session = EditorSession::new(EditorOptions::solo());

    for step in 0..20 {
        match step % 4 {
            0 => {
                session.ensure_directory();
            }
            1 | 2 => {
                session.create_tab();
            }
            _ => {
                let id = session.tabs()[0].id.clone();
                session.set_active_tab(&id).unwrap();
            }
        }
        assert_directory_invariants(&session);
    }
}

#[test]
fn test_peers_converge_after_concurrent_tab_creation() -> anyhow::Result<()> {
    let mut alice = EditorSession::new(EditorOptions::collaborative());
    alice.ensure_directory();
    let mut bob = EditorSession::new(EditorOptions::collaborative());
    sync(&alice, &bob)?;

    let alice_tab = alice.create_tab();
    let bob_tab = bob.create_tab();
    sync(&alice, &bob)?;
    sync(&bob, &alice)?;

    assert_eq!(alice.tabs(), bob.tabs());
    assert_eq!(alice.tabs().len(), 3);
    assert_directory_invariants(&alice);
    assert_directory_invariants(&bob);

    // Focus stays local to each peer
    assert_eq!(alice.active_tab_id(), alice_tab);
    assert_eq!(bob.active_tab_id(), bob_tab);
    Ok(())
}

#[test]
fn test_rename_replicates_but_history_stays_local() -> anyhow::Result<()> {
    let mut alice = EditorSession::new(EditorOptions::collaborative());
    alice.ensure_directory();
    let mut bob = EditorSession::new(EditorOptions::collaborative());
    sync(&alice, &bob)?;

    alice.apply_rename(RenameRequest::new(DEFAULT_TAB_ID).name("Plan"));
    sync(&alice, &bob)?;

    assert_eq!(bob.tabs()[0].name, "Plan");
    assert!(!bob.undo());
    assert!(alice.undo());
    sync(&alice, &bob)?;
    assert_eq!(bob.tabs()[0].name, DEFAULT_TAB_NAME);
    Ok(())
}

#[tokio::test]
async fn test_version_hydration_deduplicates_per_key() {
    let mut session = EditorSession::new(EditorOptions::solo());
    session.ensure_directory();
    let content = InitialContent::JsonSnapshot(json!({
        "type": "doc",
        "content": [paragraph("v1")],
    }));

    let first = session
        .hydrate_version(content.clone(), "v1", &PassthroughSanitizer, &NoopPersistence)
        .await;
    let second = session
        .hydrate_version(content.clone(), "v1", &PassthroughSanitizer, &NoopPersistence)
        .await;

    assert_eq!(first, HydrationOutcome::Applied);
    assert_eq!(second, HydrationOutcome::Skipped);

    let tab_id = session.create_tab();
    let third = session
        .hydrate_version(content, "v1", &PassthroughSanitizer, &NoopPersistence)
        .await;
    assert_eq!(third, HydrationOutcome::Applied);
    assert_eq!(
        session.fragment_json(&tab_id),
        Some(json!({ "type": "doc", "content": [paragraph("v1")] }))
    );
}

#[tokio::test]
async fn test_version_hydration_waits_for_directory() {
    let mut session = EditorSession::new(EditorOptions::solo());
    let content = InitialContent::JsonSnapshot(json!({ "type": "doc", "content": [] }));

    let outcome = session
        .hydrate_version(content, "v1", &PassthroughSanitizer, &NoopPersistence)
        .await;

    assert_eq!(outcome, HydrationOutcome::Waiting);
    assert!(session.is_content_loading());
}
