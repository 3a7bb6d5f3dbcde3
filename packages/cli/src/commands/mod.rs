pub mod classify;
pub mod init;
pub mod inspect;

pub use classify::{classify, ClassifyArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};

use anyhow::{Context, Result};
use folio_editor::{InitialContent, RawContent};
use std::fs;
use std::path::Path;

/// Read an initial-content file in any of the accepted wire shapes.
///
/// Files that are not JSON, or hold a bare number or boolean, are taken as a
/// raw base64 update.
pub fn read_content(path: &Path) -> Result<InitialContent> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(InitialContent::Empty);
    }

    let raw = match serde_json::from_str::<RawContent>(trimmed) {
        Ok(RawContent::Json(value)) if value.is_number() || value.is_boolean() => {
            RawContent::Text(trimmed.to_string())
        }
        Ok(raw) => raw,
        Err(_) => RawContent::Text(trimmed.to_string()),
    };
    Ok(folio_editor::classify(Some(raw)))
}
