//! IRC command handlers.
//!
//! This module contains the Handler trait and the command registry that
//! dispatches parsed lines from registered clients. Dispatch is a closed
//! `match` over [`Command`], so adding a command without wiring a handler
//! is a compile error rather than a silent 421.
//!
//! Handlers lock the hub themselves and perform their whole effect inside
//! one critical section; replies and broadcasts are synchronous appends to
//! the targets' outbound queues, so everything a single command emits is
//! ordered consistently for every observer.

mod channel;
mod connection;
mod messaging;
mod mode;
mod server_query;
mod user_query;
mod user_status;

pub use channel::{JoinHandler, ListHandler, PartHandler, TopicHandler};
pub use connection::{NickHandler, PingHandler, PongHandler, QuitHandler};
pub use messaging::{NoticeHandler, PrivmsgHandler, WallopsHandler};
pub use mode::ModeHandler;
pub use server_query::{send_lusers, send_motd, LusersHandler, MotdHandler};
pub use user_query::{IsonHandler, WhoHandler, WhoisHandler};
pub use user_status::AwayHandler;

use async_trait::async_trait;
use std::sync::Arc;
use tinyirc_proto::{Command, Line, Message, Response, MAX_LINE_LEN};

use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, Hub, HubInner, Session};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The connection this command came from.
    pub id: ConnId,
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
}

impl Context<'_> {
    pub fn server_name(&self) -> &str {
        &self.hub.name
    }
}

/// Build a numeric reply from the server. The final element of `params` is
/// sent as the trailing parameter, colon included.
///
/// The handful of numerics whose format has no trailing parameter (004,
/// 221, 324) are built with [`Message::reply`] directly.
pub fn server_reply(server_name: &str, code: Response, mut params: Vec<String>) -> Message {
    let trailing = params.pop().unwrap_or_default();
    Message::reply(server_name, code, params).with_trailing(trailing)
}

/// Queue a numeric reply to the issuing connection, with its nick prepended
/// as the first parameter.
pub fn numeric(ctx: &Context<'_>, inner: &HubInner, code: Response, tail: Vec<String>) {
    let mut params = vec![inner.nick_of(ctx.id)];
    params.extend(tail);
    inner.send_to(ctx.id, server_reply(ctx.server_name(), code, params));
}

/// Send the NAMES burst for a channel: one or more 353 replies listing the
/// members in sorted nick order, then 366.
///
/// Member lists can outgrow a single line, so the list is split greedily:
/// each 353 carries as many nicks as fit in the wire budget, and every 353
/// carries at least one nick even if that nick alone overflows the line.
pub fn send_names(ctx: &Context<'_>, inner: &HubInner, folded: &str) {
    let Some(channel) = inner.channel(folded) else {
        return;
    };
    let nick = inner.nick_of(ctx.id);

    let mut member_nicks: Vec<&str> = channel
        .members
        .iter()
        .filter_map(|id| inner.session(*id))
        .map(Session::nick_or_star)
        .collect();
    member_nicks.sort_unstable();

    let mut batch = String::new();
    for member in member_nicks {
        let candidate = if batch.is_empty() {
            member.to_string()
        } else {
            format!("{batch} {member}")
        };
        let msg = server_reply(
            ctx.server_name(),
            Response::RPL_NAMREPLY,
            vec![
                nick.clone(),
                "=".to_string(),
                channel.name.clone(),
                candidate.clone(),
            ],
        );
        if msg.wire_len() > MAX_LINE_LEN && !batch.is_empty() {
            flush_names(ctx, inner, &nick, &channel.name, &batch);
            batch = member.to_string();
        } else {
            batch = candidate;
        }
    }
    if !batch.is_empty() {
        flush_names(ctx, inner, &nick, &channel.name, &batch);
    }

    numeric(
        ctx,
        inner,
        Response::RPL_ENDOFNAMES,
        vec![channel.name.clone(), "End of NAMES list".to_string()],
    );
}

fn flush_names(ctx: &Context<'_>, inner: &HubInner, nick: &str, channel_name: &str, names: &str) {
    inner.send_to(
        ctx.id,
        server_reply(
            ctx.server_name(),
            Response::RPL_NAMREPLY,
            vec![
                nick.to_string(),
                "=".to_string(),
                channel_name.to_string(),
                names.to_string(),
            ],
        ),
    );
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle a command's arguments for a registered client.
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult;
}

/// Registry of command handlers for registered clients.
///
/// One field per command; `dispatch` routes by matching the parsed command
/// exhaustively.
pub struct Registry {
    away: AwayHandler,
    ison: IsonHandler,
    join: JoinHandler,
    list: ListHandler,
    lusers: LusersHandler,
    mode: ModeHandler,
    motd: MotdHandler,
    nick: NickHandler,
    notice: NoticeHandler,
    part: PartHandler,
    ping: PingHandler,
    pong: PongHandler,
    privmsg: PrivmsgHandler,
    quit: QuitHandler,
    topic: TopicHandler,
    wallops: WallopsHandler,
    who: WhoHandler,
    whois: WhoisHandler,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            away: AwayHandler,
            ison: IsonHandler,
            join: JoinHandler,
            list: ListHandler,
            lusers: LusersHandler,
            mode: ModeHandler,
            motd: MotdHandler,
            nick: NickHandler,
            notice: NoticeHandler,
            part: PartHandler,
            ping: PingHandler,
            pong: PongHandler,
            privmsg: PrivmsgHandler,
            quit: QuitHandler,
            topic: TopicHandler,
            wallops: WallopsHandler,
            who: WhoHandler,
            whois: WhoisHandler,
        }
    }

    /// Dispatch one parsed line from a registered client.
    ///
    /// PASS and USER are only meaningful before registration and fall
    /// through to the unknown-command reply here, as do unrecognized
    /// command words.
    pub async fn dispatch(&self, ctx: &Context<'_>, line: &Line) -> HandlerResult {
        match &line.command {
            Command::Away => self.away.handle(ctx, &line.args).await,
            Command::Ison => self.ison.handle(ctx, &line.args).await,
            Command::Join => self.join.handle(ctx, &line.args).await,
            Command::List => self.list.handle(ctx, &line.args).await,
            Command::Lusers => self.lusers.handle(ctx, &line.args).await,
            Command::Mode => self.mode.handle(ctx, &line.args).await,
            Command::Motd => self.motd.handle(ctx, &line.args).await,
            Command::Nick => self.nick.handle(ctx, &line.args).await,
            Command::Notice => self.notice.handle(ctx, &line.args).await,
            Command::Part => self.part.handle(ctx, &line.args).await,
            Command::Ping => self.ping.handle(ctx, &line.args).await,
            Command::Pong => self.pong.handle(ctx, &line.args).await,
            Command::Privmsg => self.privmsg.handle(ctx, &line.args).await,
            Command::Quit => self.quit.handle(ctx, &line.args).await,
            Command::Topic => self.topic.handle(ctx, &line.args).await,
            Command::Wallops => self.wallops.handle(ctx, &line.args).await,
            Command::Who => self.who.handle(ctx, &line.args).await,
            Command::Whois => self.whois.handle(ctx, &line.args).await,
            Command::Pass | Command::User => Err(HandlerError::UnknownCommand(
                line.command.name().to_string(),
            )),
            Command::Unknown(word) => Err(HandlerError::UnknownCommand(word.clone())),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tinyirc_proto::irc_to_lower;
    use tokio::sync::mpsc;

    fn test_hub() -> Arc<Hub> {
        let config: Config = toml::from_str(
            r#"
            [server]
            name = "irc.example.net"

            [listen]
            ports = [6667]
            "#,
        )
        .unwrap();
        Arc::new(Hub::new(&config))
    }

    #[test]
    fn test_names_burst_splits_long_member_lists() {
        let hub = test_hub();
        let mut observer = 0;
        let mut receivers = Vec::new();

        {
            let mut inner = hub.lock();
            inner.get_or_create_channel("#fisk", None);
            for i in 0..24 {
                let id = hub.next_id();
                let (tx, rx) = mpsc::unbounded_channel();
                let mut session = Session::new("127.0.0.1".to_string(), tx);
                let nick = format!("member_with_a_rather_long_nickname_{i:02}");
                session.nick = Some(nick.clone());
                session.registered = true;
                inner.sessions.insert(id, session);
                inner.nicks.insert(irc_to_lower(&nick), id);
                inner.add_member(id, "#fisk");
                if i == 0 {
                    observer = id;
                }
                receivers.push(rx);
            }
        }

        let ctx = Context {
            id: observer,
            hub: &hub,
        };
        let inner = hub.lock();
        send_names(&ctx, &inner, "#fisk");
        drop(inner);

        let rx = &mut receivers[0];
        let mut lines = 0;
        let mut collected: Vec<String> = Vec::new();
        loop {
            let msg = rx.try_recv().unwrap();
            if msg.command == "366" {
                break;
            }
            assert_eq!(msg.command, "353");
            assert!(msg.wire_len() <= MAX_LINE_LEN);
            lines += 1;
            let names = msg.trailing.clone().unwrap();
            collected.extend(names.split(' ').map(str::to_string));
        }
        assert!(lines > 1, "member list must not fit one line");

        // Every member appears exactly once, across the lines, in order.
        let mut expected: Vec<String> = (0..24)
            .map(|i| format!("member_with_a_rather_long_nickname_{i:02}"))
            .collect();
        expected.sort_unstable();
        assert_eq!(collected, expected);
    }
}
