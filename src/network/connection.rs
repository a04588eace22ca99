//! Connection - handles an individual client connection.
//!
//! Each connection runs in its own Tokio task: a `tokio::select!` loop over
//! the framed socket, the outbound queue, and a 10 second liveness tick.
//! Registration is a small state machine local to this task; once a client
//! is registered, lines go to the shared handler registry.
//!
//! The task is the only writer to its socket. On any disconnect path the
//! session is removed from the hub first, then the already-queued output is
//! drained and a final `ERROR` line is written.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use tinyirc_proto::{irc_to_lower, is_valid_nickname, Command, Line, LineCodec, Message, Response};

use crate::error::HandlerError;
use crate::handlers::{send_lusers, send_motd, server_reply, Context, Registry};
use crate::state::{ConnId, Hub, Session, VERSION};

/// Where a connection stands in the registration state machine.
enum Phase {
    /// A connection password is configured and not yet presented.
    AwaitingPassword,
    /// Waiting for both NICK and USER.
    AwaitingRegistration,
    Registered,
}

/// A client connection handler.
pub struct Connection<S> {
    id: ConnId,
    addr: SocketAddr,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
    framed: Framed<S, LineCodec>,
    outgoing: mpsc::UnboundedReceiver<Message>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Create a connection handler and its hub session.
    pub fn new(stream: S, addr: SocketAddr, hub: Arc<Hub>, registry: Arc<Registry>) -> Self {
        let id = hub.next_id();
        let (tx, outgoing) = mpsc::unbounded_channel();
        hub.lock()
            .sessions
            .insert(id, Session::new(addr.ip().to_string(), tx));

        Self {
            id,
            addr,
            hub,
            registry,
            framed: Framed::new(stream, LineCodec::new()),
            outgoing,
        }
    }

    /// Run the connection until it disconnects.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(id = self.id, addr = %self.addr, "Client connected");

        let mut phase = if self.hub.password.is_some() {
            Phase::AwaitingPassword
        } else {
            Phase::AwaitingRegistration
        };
        let limits = &self.hub.limits;
        let idle_timeout = Duration::from_secs(limits.idle_timeout_secs);
        let ping_after = Duration::from_secs(limits.ping_after_secs);

        let mut last_activity = Instant::now();
        let mut sent_ping = false;
        let mut sweep =
            tokio::time::interval(Duration::from_secs(limits.sweep_interval_secs));
        sweep.tick().await; // immediate first tick

        let reason = loop {
            tokio::select! {
                inbound = self.framed.next() => {
                    match inbound {
                        Some(Ok(raw)) => {
                            last_activity = Instant::now();
                            sent_ping = false;
                            debug!(id = self.id, line = %raw, "Received line");
                            let Some(line) = Line::parse(&raw) else {
                                continue;
                            };
                            let outcome = match phase {
                                Phase::AwaitingPassword => {
                                    self.handle_password(&line, &mut phase)
                                }
                                Phase::AwaitingRegistration => {
                                    self.handle_registration(&line, &mut phase)
                                }
                                Phase::Registered => self.handle_registered(&line).await,
                            };
                            if let Some(reason) = outcome {
                                break reason;
                            }
                        }
                        Some(Err(e)) => break e.to_string(),
                        None => break "EOF".to_string(),
                    }
                }
                outbound = self.outgoing.recv() => {
                    match outbound {
                        Some(msg) => self.framed.send(&msg).await?,
                        // Only session removal closes the sender side.
                        None => break "connection lost".to_string(),
                    }
                }
                _ = sweep.tick() => {
                    let idle = last_activity.elapsed();
                    if idle > idle_timeout {
                        break "ping timeout".to_string();
                    }
                    if idle > ping_after && !sent_ping {
                        if matches!(phase, Phase::Registered) {
                            let ping = Message::new("PING", vec![])
                                .with_trailing(self.hub.name.clone());
                            self.hub.lock().send_to(self.id, ping);
                            sent_ping = true;
                        } else {
                            // Unregistered clients get no grace PING.
                            break "ping timeout".to_string();
                        }
                    }
                }
            }
        };

        self.shutdown(&reason).await
    }

    /// Remove the session, flush pending output and say goodbye.
    async fn shutdown(mut self, reason: &str) -> anyhow::Result<()> {
        self.hub.remove_session(self.id, reason);
        self.outgoing.close();
        while let Ok(msg) = self.outgoing.try_recv() {
            let _ = self.framed.send(&msg).await;
        }
        let goodbye = Message::new("ERROR", vec![]).with_trailing(reason);
        let _ = self.framed.send(&goodbye).await;
        info!(id = self.id, addr = %self.addr, reason = %reason, "Client disconnected");
        Ok(())
    }

    /// Password phase: only PASS and QUIT are meaningful, everything else
    /// is ignored. Returns a disconnect reason when the connection should
    /// end.
    fn handle_password(&self, line: &Line, phase: &mut Phase) -> Option<String> {
        match line.command {
            Command::Pass => {
                let inner = self.hub.lock();
                let Some(attempt) = line.args.first() else {
                    let nick = inner.nick_of(self.id);
                    if let Some(reply) = HandlerError::NeedMoreParams
                        .to_irc_reply(&self.hub.name, &nick, "PASS")
                    {
                        inner.send_to(self.id, reply);
                    }
                    return None;
                };
                let expected = self.hub.password.as_deref().unwrap_or_default();
                if attempt.eq_ignore_ascii_case(expected) {
                    drop(inner);
                    *phase = Phase::AwaitingRegistration;
                } else {
                    inner.send_to(
                        self.id,
                        server_reply(
                            &self.hub.name,
                            Response::ERR_PASSWDMISMATCH,
                            vec!["Password incorrect".to_string()],
                        ),
                    );
                }
                None
            }
            Command::Quit => Some("Client quit".to_string()),
            _ => None,
        }
    }

    /// Registration phase: collect NICK and USER, ignore everything else.
    /// The nickname is reserved in the hub as soon as it is accepted.
    fn handle_registration(&self, line: &Line, phase: &mut Phase) -> Option<String> {
        match line.command {
            Command::Nick => {
                let mut inner = self.hub.lock();
                let Some(nick) = line.args.first() else {
                    inner.send_to(
                        self.id,
                        server_reply(
                            &self.hub.name,
                            Response::ERR_NONICKNAMEGIVEN,
                            vec!["No nickname given".to_string()],
                        ),
                    );
                    return None;
                };
                let holder = inner.lookup_nick(nick);
                if holder.is_some() && holder != Some(self.id) {
                    inner.send_to(
                        self.id,
                        server_reply(
                            &self.hub.name,
                            Response::ERR_NICKNAMEINUSE,
                            vec![
                                "*".to_string(),
                                nick.clone(),
                                "Nickname is already in use".to_string(),
                            ],
                        ),
                    );
                    return None;
                }
                if !is_valid_nickname(nick) {
                    inner.send_to(
                        self.id,
                        server_reply(
                            &self.hub.name,
                            Response::ERR_ERRONEUSNICKNAME,
                            vec![
                                "*".to_string(),
                                nick.clone(),
                                "Erroneous Nickname".to_string(),
                            ],
                        ),
                    );
                    return None;
                }
                if let Some(session) = inner.session(self.id) {
                    if let Some(old) = session.nick.clone() {
                        inner.nicks.remove(&irc_to_lower(&old));
                    }
                }
                inner.nicks.insert(irc_to_lower(nick), self.id);
                if let Some(session) = inner.session_mut(self.id) {
                    session.nick = Some(nick.clone());
                }
                drop(inner);
                self.try_register(phase);
                None
            }
            Command::User => {
                let mut inner = self.hub.lock();
                if line.args.len() < 4 {
                    let nick = inner.nick_of(self.id);
                    if let Some(reply) = HandlerError::NeedMoreParams
                        .to_irc_reply(&self.hub.name, &nick, "USER")
                    {
                        inner.send_to(self.id, reply);
                    }
                    return None;
                }
                if let Some(session) = inner.session_mut(self.id) {
                    session.user = Some(line.args[0].clone());
                    session.realname = Some(line.args[3].clone());
                }
                drop(inner);
                self.try_register(phase);
                None
            }
            Command::Quit => Some("Client quit".to_string()),
            _ => None,
        }
    }

    /// Complete registration once both NICK and USER have arrived: mark the
    /// session registered and send the welcome burst.
    fn try_register(&self, phase: &mut Phase) {
        let mut inner = self.hub.lock();
        let ready = inner
            .session(self.id)
            .is_some_and(|s| s.nick.is_some() && s.user.is_some() && !s.registered);
        if !ready {
            return;
        }
        if let Some(session) = inner.session_mut(self.id) {
            session.registered = true;
        }
        let nick = inner.nick_of(self.id);
        let server = &self.hub.name;

        inner.send_to(
            self.id,
            server_reply(
                server,
                Response::RPL_WELCOME,
                vec![nick.clone(), "Hi, welcome to IRC".to_string()],
            ),
        );
        inner.send_to(
            self.id,
            server_reply(
                server,
                Response::RPL_YOURHOST,
                vec![
                    nick.clone(),
                    format!("Your host is {server}, running version {VERSION}"),
                ],
            ),
        );
        inner.send_to(
            self.id,
            server_reply(
                server,
                Response::RPL_CREATED,
                vec![
                    nick.clone(),
                    "This server was created sometime".to_string(),
                ],
            ),
        );
        // 004 carries no trailing parameter.
        inner.send_to(
            self.id,
            Message::reply(
                server,
                Response::RPL_MYINFO,
                vec![
                    nick.clone(),
                    server.to_string(),
                    VERSION.to_string(),
                    "o".to_string(),
                    "o".to_string(),
                ],
            ),
        );
        send_lusers(&self.hub, &inner, self.id);
        send_motd(&self.hub, &inner, self.id);
        drop(inner);

        info!(id = self.id, nick = %nick, "Client registered");
        *phase = Phase::Registered;
    }

    /// Dispatch one line from a registered client. Returns a disconnect
    /// reason when the client quits.
    async fn handle_registered(&self, line: &Line) -> Option<String> {
        let ctx = Context {
            id: self.id,
            hub: &self.hub,
        };
        match self.registry.dispatch(&ctx, line).await {
            Ok(()) => None,
            Err(HandlerError::Quit(reason)) => Some(reason),
            Err(other) => {
                let inner = self.hub.lock();
                let nick = inner.nick_of(self.id);
                if let Some(reply) =
                    other.to_irc_reply(&self.hub.name, &nick, line.command.name())
                {
                    inner.send_to(self.id, reply);
                }
                None
            }
        }
    }
}
