//! # Editor Session
//!
//! One client's view of a multi-tab document.
//!
//! A session owns the replicated document together with the local state
//! that must never replicate: metadata undo/redo stacks, hydration
//! progress, and (in collaborative sessions) which tab this peer is
//! looking at.

use crate::content::InitialContent;
use crate::history::{MetadataHistory, RenameOutcome, RenameRequest};
use crate::hydration::{
    HydrationController, HydrationOutcome, HydrationRequest, HydrationState, PersistenceProvider,
};
use crate::snapshot::{nodes_to_json, read_snapshot, ContentSanitizer};
use crate::{CrdtDocument, EditorError, EditorOptions, Tab, TabDirectory, TabList, TabManager};
use serde_json::Value;
use tracing::debug;
use yrs::{ReadTxn, Transact};

/// Single edit session over one document
#[derive(Debug)]
pub struct EditorSession {
    /// Document being edited
    document: CrdtDocument,

    options: EditorOptions,
    manager: TabManager,
    history: MetadataHistory,
    hydration: HydrationController,

    /// Active tab of this peer when collaborating (never replicated)
    local_active_tab: Option<String>,
}

impl EditorSession {
    /// Create a session over a fresh, empty document
    pub fn new(options: EditorOptions) -> Self {
        Self::with_document(CrdtDocument::new(), options)
    }

    /// Create a session over an existing document
    pub fn with_document(document: CrdtDocument, options: EditorOptions) -> Self {
        Self {
            document,
            manager: TabManager::new(options.collaboration),
            history: MetadataHistory::with_max_levels(options.history_limit),
            hydration: HydrationController::new(),
            local_active_tab: None,
            options,
        }
    }

    /// Open a document from initial content.
    ///
    /// Content is hydrated before the directory is bootstrapped, so a
    /// directory carried by the content wins over a locally created one and
    /// legacy snapshots are migrated into the default tab.
    pub async fn open(
        options: EditorOptions,
        content: InitialContent,
        sanitizer: &dyn ContentSanitizer,
        persistence: &dyn PersistenceProvider,
    ) -> Self {
        let mut session = Self::new(options);
        session
            .hydrate(HydrationRequest::live(content), sanitizer, persistence)
            .await;
        session.ensure_directory();
        session
    }

    pub fn document(&self) -> &CrdtDocument {
        &self.document
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn history(&self) -> &MetadataHistory {
        &self.history
    }

    pub fn hydration_state(&self) -> &HydrationState {
        self.hydration.state()
    }

    /// Apply an update from a peer or a store.
    ///
    /// Tabs carried by the update get their fragments before this returns.
    pub fn apply_update(&self, update: &[u8]) -> Result<(), EditorError> {
        self.document.apply_update(update)?;
        TabDirectory::touch_fragments(&self.document);
        Ok(())
    }

    /// Bootstrap the tab directory if the document lacks one
    pub fn ensure_directory(&self) -> bool {
        TabDirectory::ensure(&self.document)
    }

    /// Tabs in directory order
    pub fn tabs(&self) -> Vec<Tab> {
        TabDirectory::tab_list(&self.document).tabs
    }

    /// Tabs plus this session's active tab
    pub fn tab_list(&self) -> TabList {
        let mut list = TabDirectory::tab_list(&self.document);
        list.active_tab_id = self.active_tab_id();
        list
    }

    /// The tab this session shows.
    ///
    /// Collaborative sessions prefer their local choice and fall back to
    /// the replicated register.
    pub fn active_tab_id(&self) -> String {
        let txn = self.document.doc().transact();
        let Some(directory) = TabDirectory::get(&txn) else {
            return String::new();
        };

        if self.manager.is_collaborative() {
            if let Some(local) = &self.local_active_tab {
                if directory.contains(&txn, local) {
                    return local.clone();
                }
            }
        }
        directory.active_tab_id(&txn)
    }

    /// Switch the active tab.
    ///
    /// Solo sessions write the replicated register; collaborative sessions
    /// only change what this peer sees.
    pub fn set_active_tab(&mut self, tab_id: &str) -> Result<(), EditorError> {
        let exists = {
            let txn = self.document.doc().transact();
            TabDirectory::get(&txn)
                .map(|directory| directory.contains(&txn, tab_id))
                .unwrap_or(false)
        };
        if !exists {
            return Err(EditorError::TabNotFound(tab_id.to_string()));
        }

        if self.manager.is_collaborative() {
            self.local_active_tab = Some(tab_id.to_string());
        } else {
            let mut txn = self.document.transact_local();
            if let Some(directory) = TabDirectory::get(&txn) {
                directory.set_active_tab_id(&mut txn, tab_id);
            }
        }
        debug!(tab_id = %tab_id, "Switched active tab");
        Ok(())
    }

    pub fn is_content_loading(&self) -> bool {
        self.hydration.is_loading()
    }

    /// Create a tab and switch to it
    pub fn create_tab(&mut self) -> String {
        let tab_id = self.manager.create_tab(&self.document);
        if self.manager.is_collaborative() {
            self.local_active_tab = Some(tab_id.clone());
        }
        tab_id
    }

    pub fn delete_tab(&mut self, tab_id: &str) -> Result<(), EditorError> {
        self.manager.delete_tab(&self.document, tab_id)
    }

    pub fn order_tab(&mut self, tab_id: &str, index: u32) -> Result<(), EditorError> {
        self.manager.order_tab(&self.document, tab_id, index)
    }

    pub fn apply_rename(&mut self, request: RenameRequest) -> RenameOutcome {
        self.history.apply_rename(&self.document, request)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&self.document)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&self.document)
    }

    pub async fn hydrate(
        &mut self,
        request: HydrationRequest,
        sanitizer: &dyn ContentSanitizer,
        persistence: &dyn PersistenceProvider,
    ) -> HydrationOutcome {
        self.hydration
            .hydrate(&self.document, request, sanitizer, persistence)
            .await
    }

    /// Hydrate a historical version into the current tab
    pub async fn hydrate_version(
        &mut self,
        content: InitialContent,
        version_id: &str,
        sanitizer: &dyn ContentSanitizer,
        persistence: &dyn PersistenceProvider,
    ) -> HydrationOutcome {
        let has_tab_state = TabDirectory::exists(&self.document);
        let mut request =
            HydrationRequest::version(content, version_id).with_tab_state(has_tab_state);
        let active = self.active_tab_id();
        if !active.is_empty() {
            request = request.with_active_tab(active);
        }
        self.hydrate(request, sanitizer, persistence).await
    }

    /// Content of one fragment as a JSON snapshot.
    ///
    /// A known tab whose fragment has not been materialized yet reads as an
    /// empty document.
    pub fn fragment_json(&self, fragment: &str) -> Option<Value> {
        let txn = self.document.doc().transact();
        if let Some(shared) = txn.get_xml_fragment(fragment) {
            return Some(read_snapshot(&txn, &shared));
        }
        TabDirectory::get(&txn)
            .filter(|directory| directory.contains(&txn, fragment))
            .map(|_| nodes_to_json(&[]))
    }
}
