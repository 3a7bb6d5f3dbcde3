//! # Tab Metadata History
//!
//! Local undo/redo for tab name and emoji edits.
//!
//! ## Design
//!
//! - Tab metadata is directory state, not document content, so this history
//!   is independent of the content editing history and never touches it
//! - Each genuine edit records only the fields that changed
//! - Undo writes the recorded previous values and moves the record to redo
//! - Redo writes the recorded next values and moves it back
//! - A new edit clears the redo stack
//! - Replays (undo/redo) are never recorded
//!
//! ## Limitation
//!
//! Metadata entries are last-writer-wins registers. Undo and redo do not
//! account for interleaved remote edits and may restore a value that
//! overrides a peer's concurrent change.

use crate::{CrdtDocument, TabDirectory};
use tracing::{debug, warn};
use yrs::Transact;

/// One reversible metadata edit. `None` means the field did not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataChange {
    pub tab_id: String,
    pub previous_name: Option<String>,
    pub next_name: Option<String>,
    pub previous_emoji: Option<Option<String>>,
    pub next_emoji: Option<Option<String>>,
}

/// Requested metadata edit for one tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameRequest {
    pub tab_id: String,
    pub new_name: Option<String>,
    /// `Some(None)` clears the emoji
    pub emoji: Option<Option<String>>,
}

impl RenameRequest {
    pub fn new(tab_id: impl Into<String>) -> Self {
        Self {
            tab_id: tab_id.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }

    pub fn emoji(mut self, emoji: Option<impl Into<String>>) -> Self {
        self.emoji = Some(emoji.map(Into::into));
        self
    }
}

/// Result of [`MetadataHistory::apply_rename`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameOutcome {
    pub tab_not_found: bool,
}

/// Undo/redo stacks for tab metadata edits
#[derive(Debug)]
pub struct MetadataHistory {
    /// Applied edits (most recent last)
    undo_stack: Vec<MetadataChange>,

    /// Undone edits (most recent last)
    redo_stack: Vec<MetadataChange>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Set while undo/redo writes, so the write is not recorded again
    replaying: bool,
}

impl MetadataHistory {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create a history with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            replaying: false,
        }
    }

    /// Change a tab's name and/or emoji, recording the edit for undo.
    pub fn apply_rename(&mut self, doc: &CrdtDocument, request: RenameRequest) -> RenameOutcome {
        let mut txn = doc.transact_local();
        let current = TabDirectory::get(&txn)
            .and_then(|directory| Some((directory.metadata(&txn, &request.tab_id)?, directory)));
        let Some((mut metadata, directory)) = current else {
            warn!(tab_id = %request.tab_id, "Rename target not found");
            return RenameOutcome {
                tab_not_found: true,
            };
        };

        let next_name = request.new_name.filter(|name| *name != metadata.name);
        let next_emoji = request.emoji.filter(|emoji| *emoji != metadata.emoji);

        if next_name.is_none() && next_emoji.is_none() {
            debug!(tab_id = %request.tab_id, "Rename is a no-op");
            return RenameOutcome {
                tab_not_found: false,
            };
        }

        if !self.replaying {
            let change = MetadataChange {
                tab_id: request.tab_id.clone(),
                previous_name: next_name.as_ref().map(|_| metadata.name.clone()),
                next_name: next_name.clone(),
                previous_emoji: next_emoji.as_ref().map(|_| metadata.emoji.clone()),
                next_emoji: next_emoji.clone(),
            };
            self.push_change(change);
        }

        if let Some(name) = next_name {
            metadata.name = name;
        }
        if let Some(emoji) = next_emoji {
            metadata.emoji = emoji;
        }
        directory.set_metadata(&mut txn, &request.tab_id, &metadata);

        RenameOutcome {
            tab_not_found: false,
        }
    }

    fn push_change(&mut self, change: MetadataChange) {
        self.undo_stack.push(change);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Undo the most recent metadata edit
    pub fn undo(&mut self, doc: &CrdtDocument) -> bool {
        let Some(change) = self.undo_stack.last() else {
            return false;
        };
        if !tab_exists(doc, &change.tab_id) {
            warn!(tab_id = %change.tab_id, "Undo target no longer exists");
            return false;
        }
        let Some(change) = self.undo_stack.pop() else {
            return false;
        };

        self.replay(
            doc,
            RenameRequest {
                tab_id: change.tab_id.clone(),
                new_name: change.previous_name.clone(),
                emoji: change.previous_emoji.clone(),
            },
        );
        self.redo_stack.push(change);
        true
    }

    /// Redo the most recently undone metadata edit
    pub fn redo(&mut self, doc: &CrdtDocument) -> bool {
        let Some(change) = self.redo_stack.last() else {
            return false;
        };
        if !tab_exists(doc, &change.tab_id) {
            warn!(tab_id = %change.tab_id, "Redo target no longer exists");
            return false;
        }
        let Some(change) = self.redo_stack.pop() else {
            return false;
        };

        self.replay(
            doc,
            RenameRequest {
                tab_id: change.tab_id.clone(),
                new_name: change.next_name.clone(),
                emoji: change.next_emoji.clone(),
            },
        );
        self.undo_stack.push(change);
        true
    }

    fn replay(&mut self, doc: &CrdtDocument, request: RenameRequest) {
        self.replaying = true;
        self.apply_rename(doc, request);
        self.replaying = false;
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Most recent undoable edit
    pub fn peek_undo(&self) -> Option<&MetadataChange> {
        self.undo_stack.last()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for MetadataHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn tab_exists(doc: &CrdtDocument, tab_id: &str) -> bool {
    let txn = doc.doc().transact();
    TabDirectory::get(&txn)
        .map(|directory| directory.contains(&txn, tab_id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_TAB_ID, DEFAULT_TAB_NAME};

    fn setup() -> CrdtDocument {
        let doc = CrdtDocument::new();
        TabDirectory::ensure(&doc);
        doc
    }

    fn default_tab(doc: &CrdtDocument) -> crate::Tab {
        TabDirectory::tab_list(doc).tabs.remove(0)
    }

    #[test]
    fn test_history_creation() {
        let history = MetadataHistory::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_linearity() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("A"));
        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("B"));
        assert_eq!(default_tab(&doc).name, "B");

        assert!(history.undo(&doc));
        assert_eq!(default_tab(&doc).name, "A");
        assert!(history.undo(&doc));
        assert_eq!(default_tab(&doc).name, DEFAULT_TAB_NAME);
        assert!(!history.undo(&doc));

        assert!(history.redo(&doc));
        assert_eq!(default_tab(&doc).name, "A");
        assert!(history.redo(&doc));
        assert_eq!(default_tab(&doc).name, "B");
        assert!(!history.redo(&doc));
    }

    #[test]
    fn test_noop_rename_records_nothing() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        let outcome =
            history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name(DEFAULT_TAB_NAME));

        assert!(!outcome.tab_not_found);
        assert_eq!(history.undo_levels(), 0);
    }

    #[test]
    fn test_unknown_tab() {
        let doc = setup();
        let mut history = MetadataHistory::new();
        let state = doc.encode_state();

        let outcome = history.apply_rename(&doc, RenameRequest::new("missing").name("A"));

        assert!(outcome.tab_not_found);
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(doc.encode_state(), state);
    }

    #[test]
    fn test_records_only_changed_fields() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        history.apply_rename(
            &doc,
            RenameRequest::new(DEFAULT_TAB_ID)
                .name(DEFAULT_TAB_NAME)
                .emoji(Some("📝")),
        );

        let change = history.peek_undo().unwrap();
        assert_eq!(change.previous_name, None);
        assert_eq!(change.next_name, None);
        assert_eq!(change.previous_emoji, Some(None));
        assert_eq!(change.next_emoji, Some(Some("📝".to_string())));
    }

    #[test]
    fn test_emoji_undo_clears_emoji() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).emoji(Some("📝")));
        assert_eq!(default_tab(&doc).emoji.as_deref(), Some("📝"));

        assert!(history.undo(&doc));
        assert_eq!(default_tab(&doc).emoji, None);

        assert!(history.redo(&doc));
        assert_eq!(default_tab(&doc).emoji.as_deref(), Some("📝"));
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("A"));
        history.undo(&doc);
        assert_eq!(history.redo_levels(), 1);

        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("B"));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_replay_is_not_recorded() {
        let doc = setup();
        let mut history = MetadataHistory::new();

        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("A"));
        history.undo(&doc);

        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 1);
    }

    #[test]
    fn test_undo_for_missing_tab_keeps_stacks() {
        let doc = setup();
        let mut history = MetadataHistory::new();
        history.apply_rename(&doc, RenameRequest::new(DEFAULT_TAB_ID).name("A"));

        let other = CrdtDocument::new();
        assert!(!history.undo(&other));
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let doc = setup();
        let mut history = MetadataHistory::with_max_levels(2);

        for i in 0..3 {
            history.apply_rename(
                &doc,
                RenameRequest::new(DEFAULT_TAB_ID).name(format!("Name {}", i)),
            );
        }

        assert_eq!(history.undo_levels(), 2);
    }
}
