//! A channel: a named multicast group with a topic and an optional join key.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::state::persistence::{self, ChannelRecord};
use crate::state::ConnId;

/// An IRC channel.
///
/// Membership is tracked by connection id; the reverse direction lives in
/// each session's channel set, and the hub keeps the two sides consistent.
#[derive(Debug)]
pub struct Channel {
    /// Display name, original case retained. Registry keys use the folded form.
    pub name: String,
    /// Current members.
    pub members: HashSet<ConnId>,
    topic: String,
    key: Option<String>,
    /// Canonical state file, when a state directory is configured.
    state_path: Option<PathBuf>,
}

/// A state write captured under the registry lock, to be performed after
/// the lock is released.
#[derive(Debug)]
pub struct PendingState {
    path: PathBuf,
    record: ChannelRecord,
}

impl PendingState {
    /// Write the snapshot to disk.
    pub fn write(self) {
        if let Err(e) = persistence::save(&self.path, &self.record) {
            warn!(path = %self.path.display(), error = %e, "Failed to write channel state");
        }
    }
}

impl Channel {
    /// Create a channel, loading its persisted topic and key if a state
    /// directory is configured.
    pub fn new(name: &str, state_dir: Option<&Path>) -> Self {
        let state_path = state_dir.map(|dir| dir.join(persistence::file_name(name)));
        let record = match &state_path {
            Some(path) => persistence::load_or_default(path),
            None => ChannelRecord::default(),
        };

        Self {
            name: name.to_string(),
            members: HashSet::new(),
            topic: record.topic,
            key: record.key,
            state_path,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use = "the returned snapshot must be written after the lock is released"]
    pub fn set_topic(&mut self, topic: String) -> Option<PendingState> {
        self.topic = topic;
        self.pending_state()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use = "the returned snapshot must be written after the lock is released"]
    pub fn set_key(&mut self, key: Option<String>) -> Option<PendingState> {
        self.key = key;
        self.pending_state()
    }

    fn pending_state(&self) -> Option<PendingState> {
        self.state_path.as_ref().map(|path| PendingState {
            path: path.clone(),
            record: ChannelRecord {
                topic: self.topic.clone(),
                key: self.key.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(pending: Option<PendingState>) {
        if let Some(pending) = pending {
            pending.write();
        }
    }

    #[test]
    fn test_without_state_dir() {
        let mut channel = Channel::new("#fisk", None);
        assert_eq!(channel.topic(), "");
        assert_eq!(channel.key(), None);

        assert!(channel.set_topic("fish".to_string()).is_none());
        assert!(channel.set_key(Some("nors".to_string())).is_none());
        assert_eq!(channel.topic(), "fish");
        assert_eq!(channel.key(), Some("nors"));
    }

    #[test]
    fn test_state_survives_reconstruction() {
        let dir = tempfile::tempdir().unwrap();

        let mut channel = Channel::new("#fisk", Some(dir.path()));
        apply(channel.set_topic("fish of the day".to_string()));
        apply(channel.set_key(Some("nors".to_string())));

        let reloaded = Channel::new("#fisk", Some(dir.path()));
        assert_eq!(reloaded.topic(), "fish of the day");
        assert_eq!(reloaded.key(), Some("nors"));
        assert!(reloaded.members.is_empty());
    }

    #[test]
    fn test_key_removal_persists() {
        let dir = tempfile::tempdir().unwrap();

        let mut channel = Channel::new("#fisk", Some(dir.path()));
        apply(channel.set_key(Some("nors".to_string())));
        apply(channel.set_key(None));

        let reloaded = Channel::new("#fisk", Some(dir.path()));
        assert_eq!(reloaded.key(), None);
    }
}
