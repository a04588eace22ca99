//! Channel state persistence.
//!
//! Each channel with persisted state gets one small TOML document holding
//! its topic and join key. Writes are atomic: serialize to a temp file in
//! the same directory, then rename over the canonical path, so a crash
//! mid-write leaves the previous record intact and a reader never sees a
//! half-written record.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors from reading or writing a channel state file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed state file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unencodable state record: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// The persisted fields of a channel.
///
/// `key: None` (no join key) and `key: Some("")` are distinct states: an
/// absent key is an omitted field, an empty one is `key = ""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(default)]
    pub topic: String,
    pub key: Option<String>,
}

/// Map a channel name to its state file name.
///
/// `_` is doubled before `/` is substituted, so names that differ only in
/// filesystem-unsafe characters cannot collide ("#a_b" vs "#a/b").
pub fn file_name(channel_name: &str) -> String {
    channel_name.replace('_', "__").replace('/', "_")
}

/// Load a channel record from `path`.
pub fn load(path: &Path) -> Result<ChannelRecord, StateError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Atomically write a channel record to `path`.
pub fn save(path: &Path, record: &ChannelRecord) -> Result<(), StateError> {
    let dir = path.parent().ok_or_else(|| {
        StateError::Io(std::io::Error::other("state path has no parent directory"))
    })?;

    let content = toml::to_string(record)?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::fs::write(tmp.path(), content)?;
    tmp.persist(path).map_err(|e| StateError::Io(e.error))?;
    Ok(())
}

/// Load a record, degrading to the default on a missing or corrupt file.
pub fn load_or_default(path: &Path) -> ChannelRecord {
    if !path.exists() {
        return ChannelRecord::default();
    }
    match load(path) {
        Ok(record) => record,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable channel state");
            ChannelRecord::default()
        }
    }
}
