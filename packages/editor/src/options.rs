use serde::{Deserialize, Serialize};

/// Session-wide editor options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    /// Whether other peers edit this document concurrently.
    /// When true, the active tab is kept local to each peer and never
    /// written to the replicated directory.
    #[serde(default)]
    pub collaboration: bool,

    /// Maximum number of metadata undo levels (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    100
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            collaboration: false,
            history_limit: default_history_limit(),
        }
    }
}

impl EditorOptions {
    /// Options for a single-user session
    pub fn solo() -> Self {
        Self::default()
    }

    /// Options for a session shared with other peers
    pub fn collaborative() -> Self {
        Self {
            collaboration: true,
            ..Default::default()
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }
}
