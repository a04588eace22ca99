//! Per-connection session state held in the hub.

use std::collections::HashSet;
use tinyirc_proto::{Message, Prefix};
use tokio::sync::mpsc;

/// One client's registry-side state.
///
/// Transport state (socket, buffers, liveness timer) lives in the connection
/// task; this is the part other connections' handlers may read, plus the
/// outbound queue they append to.
#[derive(Debug)]
pub struct Session {
    /// Peer address, used in the user mask.
    pub host: String,
    /// Absent until registration.
    pub nick: Option<String>,
    pub user: Option<String>,
    pub realname: Option<String>,
    /// Away message, when marked away.
    pub away: Option<String>,
    /// True once the welcome burst has been sent.
    pub registered: bool,
    /// Folded names of joined channels. Mirrors `Channel::members`.
    pub channels: HashSet<String>,
    sender: mpsc::UnboundedSender<Message>,
}

impl Session {
    pub fn new(host: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            host,
            nick: None,
            user: None,
            realname: None,
            away: None,
            registered: false,
            channels: HashSet::new(),
            sender,
        }
    }

    /// The nick to use in reply parameters; `*` before registration.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// The `nick!user@host` source for messages originating from this client.
    pub fn prefix(&self) -> Prefix {
        Prefix::User {
            nick: self.nick.clone().unwrap_or_else(|| "*".to_string()),
            user: self.user.clone().unwrap_or_else(|| "*".to_string()),
            host: self.host.clone(),
        }
    }

    /// Append a message to this connection's outbound queue.
    ///
    /// Delivery order follows call order; the queue is drained FIFO by the
    /// connection task. A send to a task that is shutting down is a no-op.
    pub fn send(&self, msg: Message) {
        let _ = self.sender.send(msg);
    }
}
