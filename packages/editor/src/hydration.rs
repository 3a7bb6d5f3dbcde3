//! # Hydration
//!
//! Loads caller-supplied initial content into the live document, at most
//! once per document (live mode) or once per `versionId:tabId` key
//! (version mode).
//!
//! ## State machine
//!
//! ```text
//! live:     Uninitialized → Applying → ContentApplied → InitializingPersistence → Ready
//!                                                                              ↘ PersistenceFailed
//! version:  WaitingForTabState → Applying → ContentApplied(key) → Ready(key) → …
//! ```
//!
//! Version mode re-enters the cycle whenever the key changes.

use crate::content::InitialContent;
use crate::snapshot::{write_snapshot, ContentSanitizer};
use crate::{CrdtDocument, EditorError, TabDirectory, LEGACY_FRAGMENT};
use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};
use yrs::WriteTxn;

/// Whether content is loaded into the live document or a historical version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationMode {
    Live,
    Version { version_id: String },
}

/// One hydration attempt
#[derive(Debug, Clone)]
pub struct HydrationRequest {
    pub content: InitialContent,
    pub mode: HydrationMode,
    /// Whether the tab directory has resolved
    pub has_tab_state: bool,
    pub active_tab_id: Option<String>,
}

impl HydrationRequest {
    pub fn live(content: InitialContent) -> Self {
        Self {
            content,
            mode: HydrationMode::Live,
            has_tab_state: true,
            active_tab_id: None,
        }
    }

    pub fn version(content: InitialContent, version_id: impl Into<String>) -> Self {
        Self {
            content,
            mode: HydrationMode::Version {
                version_id: version_id.into(),
            },
            has_tab_state: true,
            active_tab_id: None,
        }
    }

    pub fn with_active_tab(mut self, tab_id: impl Into<String>) -> Self {
        self.active_tab_id = Some(tab_id.into());
        self
    }

    pub fn with_tab_state(mut self, has_tab_state: bool) -> Self {
        self.has_tab_state = has_tab_state;
        self
    }

    /// Fragment the content is written into
    pub fn target_field(&self) -> &str {
        match self.active_tab_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => LEGACY_FRAGMENT,
        }
    }

    /// `versionId:tabId`
    pub fn key(&self) -> String {
        let version_id = match &self.mode {
            HydrationMode::Live => "",
            HydrationMode::Version { version_id } => version_id.as_str(),
        };
        format!("{}:{}", version_id, self.target_field())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationState {
    Uninitialized,
    WaitingForTabState,
    Applying,
    ContentApplied(Option<String>),
    InitializingPersistence,
    Ready(Option<String>),
    PersistenceFailed,
}

/// What a call to [`HydrationController::hydrate`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Nothing to apply, or already applied for this document/key
    Skipped,
    /// Tab state has not resolved yet; content stays pending
    Waiting,
    Applied,
}

/// Offline store or replication provider wired up after live hydration
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    async fn initialize(&self, doc: &CrdtDocument) -> Result<(), EditorError>;
}

/// Provider for sessions without persistence
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPersistence;

#[async_trait]
impl PersistenceProvider for NoopPersistence {
    async fn initialize(&self, _doc: &CrdtDocument) -> Result<(), EditorError> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct HydrationController {
    hydrated_once: bool,
    last_key: Option<String>,
    state: HydrationState,
    loading: bool,
}

impl HydrationController {
    pub fn new() -> Self {
        Self {
            hydrated_once: false,
            last_key: None,
            state: HydrationState::Uninitialized,
            loading: true,
        }
    }

    pub fn state(&self) -> &HydrationState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    #[instrument(skip_all, fields(kind = %request.content.kind(), key = %request.key()))]
    pub async fn hydrate(
        &mut self,
        doc: &CrdtDocument,
        request: HydrationRequest,
        sanitizer: &dyn ContentSanitizer,
        persistence: &dyn PersistenceProvider,
    ) -> HydrationOutcome {
        if request.content.is_empty() {
            debug!("No initial content");
            self.loading = false;
            return HydrationOutcome::Skipped;
        }

        let version_mode = matches!(request.mode, HydrationMode::Version { .. });

        if version_mode && !request.has_tab_state {
            debug!("Waiting for tab state");
            self.transition(HydrationState::WaitingForTabState);
            self.loading = true;
            return HydrationOutcome::Waiting;
        }

        let key = request.key();
        let already_applied = if version_mode {
            self.last_key.as_deref() == Some(key.as_str())
        } else {
            self.hydrated_once
        };
        if already_applied {
            debug!("Content already hydrated");
            self.loading = false;
            return HydrationOutcome::Skipped;
        }

        // Nothing is recorded as applied before this point, so an attempt
        // dropped while yielding is retried by the next call.
        self.transition(HydrationState::Applying);
        self.loading = true;

        // Let the editor finish mounting before content lands
        tokio::task::yield_now().await;

        apply_content(doc, &request, sanitizer);

        if version_mode {
            self.last_key = Some(key.clone());
            self.transition(HydrationState::ContentApplied(Some(key.clone())));
            self.transition(HydrationState::Ready(Some(key)));
            self.loading = false;
            info!("Hydrated version content");
            return HydrationOutcome::Applied;
        }

        self.hydrated_once = true;
        self.transition(HydrationState::ContentApplied(None));
        self.transition(HydrationState::InitializingPersistence);
        match persistence.initialize(doc).await {
            Ok(()) => {
                self.transition(HydrationState::Ready(None));
                info!("Hydrated live content");
            }
            Err(err) => {
                error!(error = %err, "Failed to initialize persistence");
                self.transition(HydrationState::PersistenceFailed);
            }
        }
        self.loading = false;
        HydrationOutcome::Applied
    }

    fn transition(&mut self, state: HydrationState) {
        debug!(from = ?self.state, to = ?state, "Hydration state");
        self.state = state;
    }
}

impl Default for HydrationController {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the classified content into the target fragment. Malformed
/// binary content is logged and dropped.
fn apply_content(doc: &CrdtDocument, request: &HydrationRequest, sanitizer: &dyn ContentSanitizer) {
    match &request.content {
        InitialContent::Empty => {}
        InitialContent::JsonSnapshot(snapshot) => {
            let snapshot = sanitizer.sanitize(snapshot.clone());
            let mut txn = doc.transact_local();
            let fragment = txn.get_or_insert_xml_fragment(request.target_field());
            write_snapshot(&mut txn, &fragment, &snapshot);
        }
        InitialContent::UpdateList(_) | InitialContent::UpdateBlob(_) => {
            let result = request
                .content
                .decode_update()
                .and_then(|update| match update {
                    Some(update) => doc.apply_update(&update),
                    None => Ok(()),
                });
            if let Err(err) = result {
                warn!(error = %err, "Discarding malformed initial content");
            }
            TabDirectory::touch_fragments(doc);
        }
    }
}
