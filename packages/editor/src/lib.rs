//! # Folio Editor
//!
//! Replicated state layer for multi-tab rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ content: wire shapes → InitialContent       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ hydration: apply content once per key       │
//! │  - JSON snapshots via a sanitizer           │
//! │  - binary updates merged and applied        │
//! │  - persistence wired up before "ready"      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ directory: order + metadata + active tab    │
//! │  - bootstrap + legacy migration             │
//! │  - tabs: create                             │
//! │  - history: rename undo/redo                │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One transaction per structural change**: peers never see a half-built directory
//! 2. **One fragment per tab**: content is addressed by tab id only
//! 3. **Never fail across the boundary**: bad data is logged and absorbed
//! 4. **Local state stays local**: history and collaborative focus never replicate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{
//!     classify_value, EditorOptions, EditorSession, NoopPersistence, PassthroughSanitizer,
//!     RenameRequest,
//! };
//!
//! let content = classify_value(serde_json::from_str(&initial)?);
//! let mut session = EditorSession::open(
//!     EditorOptions::solo(),
//!     content,
//!     &PassthroughSanitizer,
//!     &NoopPersistence,
//! )
//! .await;
//!
//! let tab_id = session.create_tab();
//! session.apply_rename(RenameRequest::new(&tab_id).name("Notes"));
//! session.undo();
//! ```

mod content;
mod crdt;
mod directory;
mod errors;
mod history;
mod hydration;
mod migration;
mod node;
mod options;
mod session;
mod snapshot;
mod tabs;

pub use content::{classify, classify_value, encode_update, ContentKind, InitialContent, RawContent};
pub use crdt::{CrdtDocument, DIRECTORY_ROOT, LEGACY_FRAGMENT, LOCAL_ORIGIN};
pub use directory::{Tab, TabDirectory, TabList, TabMetadata, DEFAULT_TAB_ID, DEFAULT_TAB_NAME};
pub use errors::EditorError;
pub use history::{MetadataChange, MetadataHistory, RenameOutcome, RenameRequest};
pub use hydration::{
    HydrationController, HydrationMode, HydrationOutcome, HydrationRequest, HydrationState,
    NoopPersistence, PersistenceProvider,
};
pub use migration::migrate_default_fragment_to_tab;
pub use node::{SharedNode, TextRun};
pub use options::EditorOptions;
pub use session::EditorSession;
pub use snapshot::{
    nodes_from_json, nodes_to_json, read_snapshot, write_snapshot, AllowListSanitizer,
    ContentSanitizer, PassthroughSanitizer,
};
pub use tabs::{generate_tab_id, TabManager, TAB_ID_BYTES};
