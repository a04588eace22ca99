//! The Hub - central shared state for the IRC server.
//!
//! The hub is the single authoritative registry of sessions, nicknames and
//! channels. All of it sits behind one mutex: handlers run their whole
//! mutation inside one critical section, so the bidirectional membership
//! link between sessions and channels can never be observed half-updated
//! and registry keys stay unique without any further locking discipline.
//! Nothing async and no file I/O happens under the lock: outbound delivery
//! is a synchronous append to each target's unbounded queue, activity log
//! lines go to a writer thread, and channel state writes are snapshotted
//! under the lock and flushed after it is released.

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tinyirc_proto::{irc_to_lower, Message};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{Config, LimitsConfig};
use crate::state::persistence;
use crate::state::{Channel, ConnId, Session};

/// Server version string, used in the 002/004 banners.
pub const VERSION: &str = concat!("tinyircd-", env!("CARGO_PKG_VERSION"));

/// Central shared state container.
pub struct Hub {
    /// This server's name.
    pub name: String,
    /// Shared connection password, if configured.
    pub password: Option<String>,
    /// Message-of-the-day file, if configured.
    pub motd_file: Option<PathBuf>,
    /// Channel state directory, if configured.
    pub state_dir: Option<PathBuf>,
    /// Channel activity log directory, if configured.
    pub log_dir: Option<PathBuf>,
    /// Liveness timers.
    pub limits: LimitsConfig,
    next_id: AtomicU64,
    /// Log lines are appended by a dedicated writer thread, so logging
    /// callers never block on disk while holding the registry lock.
    log_tx: Option<mpsc::UnboundedSender<(PathBuf, String)>>,
    inner: Mutex<HubInner>,
}

/// The mutable registries, guarded by the hub's mutex.
#[derive(Default)]
pub struct HubInner {
    /// All live connections, by connection id.
    pub sessions: HashMap<ConnId, Session>,
    /// Folded nickname -> connection id.
    pub nicks: HashMap<String, ConnId>,
    /// Folded channel name -> channel.
    pub channels: HashMap<String, Channel>,
}

impl Hub {
    pub fn new(config: &Config) -> Self {
        let log_tx = config.storage.log_dir.as_ref().map(|_| spawn_log_writer());
        Self {
            name: config.server.name.clone(),
            password: config.server.password.clone(),
            motd_file: config.server.motd_file.clone(),
            state_dir: config.storage.state_dir.clone(),
            log_dir: config.storage.log_dir.clone(),
            limits: config.limits.clone(),
            next_id: AtomicU64::new(1),
            log_tx,
            inner: Mutex::new(HubInner::default()),
        }
    }

    /// Allocate a connection id.
    pub fn next_id(&self) -> ConnId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Enter the registry critical section.
    pub fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock()
    }

    /// Read the MOTD file. An unconfigured or empty MOTD yields no lines
    /// (the caller replies 422); an unreadable file degrades to a single
    /// explanatory line.
    pub fn motd_lines(&self) -> Vec<String> {
        let Some(path) = &self.motd_file else {
            return Vec::new();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => vec![format!("Could not read MOTD file {:?}.", path.display().to_string())],
        }
    }

    /// Append a line to a channel's activity log, when logging is configured.
    ///
    /// Meta lines (joins, parts, topic changes) get a `* nick` marker, chat
    /// lines a `<nick>` one. The line is handed to the writer thread, which
    /// keeps per-channel order; callers may hold the registry lock.
    pub fn channel_log(&self, channel_name: &str, nick: &str, text: &str, meta: bool) {
        let (Some(dir), Some(tx)) = (&self.log_dir, &self.log_tx) else {
            return;
        };
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let line = if meta {
            format!("[{timestamp}] * {nick} {text}\n")
        } else {
            format!("[{timestamp}] <{nick}> {text}\n")
        };
        let path = dir.join(format!("{}.log", persistence::file_name(channel_name)));
        let _ = tx.send((path, line));
    }

    /// Tear a connection down: broadcast its QUIT to every connection that
    /// shares a channel with it, drop it from every channel (deleting any
    /// that empty), release its nickname and remove its session record.
    ///
    /// All of this happens in one critical section, before the caller
    /// closes the socket, so no other handler can observe a dangling peer.
    /// Returns the removed session, or `None` if it was already gone.
    pub fn remove_session(&self, id: ConnId, quitmsg: &str) -> Option<Session> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id)?;

        let quit = Message::from_user(session.prefix(), "QUIT", vec![]).with_trailing(quitmsg);
        let nick = session.nick_or_star().to_string();
        let channels: Vec<String> = session.channels.iter().cloned().collect();

        inner.broadcast_related(id, &quit, false);
        for folded in &channels {
            if let Some(channel) = inner.channels.get(folded) {
                self.channel_log(&channel.name, &nick, &format!("quit ({quitmsg})"), true);
            }
            inner.remove_member(id, folded);
        }

        if let Some(nick) = inner.sessions.get(&id).and_then(|s| s.nick.clone()) {
            inner.nicks.remove(&irc_to_lower(&nick));
        }
        let session = inner.sessions.remove(&id);
        info!(id, nick = %nick, reason = %quitmsg, "Session removed");
        session
    }
}

/// Start the log writer thread. It drains queued lines in FIFO order and
/// exits when the hub (and with it the sender) is dropped.
fn spawn_log_writer() -> mpsc::UnboundedSender<(PathBuf, String)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(PathBuf, String)>();
    std::thread::spawn(move || {
        while let Some((path, line)) = rx.blocking_recv() {
            let result = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut f| f.write_all(line.as_bytes()));
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Failed to write channel log");
            }
        }
    });
    tx
}

impl HubInner {
    pub fn session(&self, id: ConnId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn session_mut(&mut self, id: ConnId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// The reply-parameter nick for a connection; `*` when unknown.
    pub fn nick_of(&self, id: ConnId) -> String {
        self.sessions
            .get(&id)
            .map(|s| s.nick_or_star().to_string())
            .unwrap_or_else(|| "*".to_string())
    }

    /// Resolve a nickname under protocol case folding.
    pub fn lookup_nick(&self, nick: &str) -> Option<ConnId> {
        self.nicks.get(&irc_to_lower(nick)).copied()
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(&irc_to_lower(name))
    }

    pub fn channel(&self, folded: &str) -> Option<&Channel> {
        self.channels.get(folded)
    }

    pub fn channel_mut(&mut self, folded: &str) -> Option<&mut Channel> {
        self.channels.get_mut(folded)
    }

    /// Look a channel up by display name, creating it (and loading its
    /// persisted state) if it does not exist yet.
    pub fn get_or_create_channel(
        &mut self,
        name: &str,
        state_dir: Option<&Path>,
    ) -> &mut Channel {
        self.channels
            .entry(irc_to_lower(name))
            .or_insert_with(|| Channel::new(name, state_dir))
    }

    /// Record membership on both sides of the link. The channel must exist.
    pub fn add_member(&mut self, id: ConnId, folded: &str) {
        if let Some(channel) = self.channels.get_mut(folded) {
            channel.members.insert(id);
        }
        if let Some(session) = self.sessions.get_mut(&id) {
            session.channels.insert(folded.to_string());
        }
    }

    /// Remove membership on both sides of the link, deleting the channel
    /// the instant its member set becomes empty.
    pub fn remove_member(&mut self, id: ConnId, folded: &str) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.channels.remove(folded);
        }
        if let Some(channel) = self.channels.get_mut(folded) {
            channel.members.remove(&id);
            if channel.members.is_empty() {
                self.channels.remove(folded);
            }
        }
    }

    /// Queue a message for one connection.
    pub fn send_to(&self, id: ConnId, msg: Message) {
        if let Some(session) = self.sessions.get(&id) {
            session.send(msg);
        }
    }

    /// Queue a message for every member of a channel, optionally excluding
    /// one connection (usually the sender).
    pub fn broadcast_channel(&self, folded: &str, msg: &Message, exclude: Option<ConnId>) {
        let Some(channel) = self.channels.get(folded) else {
            return;
        };
        for &member in &channel.members {
            if exclude == Some(member) {
                continue;
            }
            self.send_to(member, msg.clone());
        }
    }

    /// Queue a message for every connection that shares at least one channel
    /// with `id`, each at most once.
    pub fn broadcast_related(&self, id: ConnId, msg: &Message, include_self: bool) {
        let mut targets: std::collections::HashSet<ConnId> = std::collections::HashSet::new();
        if include_self {
            targets.insert(id);
        }
        if let Some(session) = self.sessions.get(&id) {
            for folded in &session.channels {
                if let Some(channel) = self.channels.get(folded) {
                    targets.extend(channel.members.iter().copied());
                }
            }
        }
        if !include_self {
            targets.remove(&id);
        }
        for target in targets {
            self.send_to(target, msg.clone());
        }
    }

}
