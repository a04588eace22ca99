//! Connection lifecycle handlers for registered clients: NICK, PING, PONG,
//! QUIT.

use async_trait::async_trait;
use tinyirc_proto::{irc_to_lower, is_valid_nickname, Message, Response};
use tracing::debug;

use super::{numeric, Context, Handler};
use crate::error::{HandlerError, HandlerResult};

/// Handler for NICK after registration.
///
/// A successful change is announced once to every connection sharing a
/// channel with the client, and to the client itself, with the old nick in
/// the message source.
pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let mut inner = ctx.hub.lock();
        let Some(newnick) = args.first() else {
            numeric(
                ctx,
                &inner,
                Response::ERR_NONICKNAMEGIVEN,
                vec!["No nickname given".to_string()],
            );
            return Ok(());
        };

        let oldnick = inner.nick_of(ctx.id);
        if *newnick == oldnick {
            return Ok(());
        }
        let holder = inner.lookup_nick(newnick);
        if holder.is_some() && holder != Some(ctx.id) {
            numeric(
                ctx,
                &inner,
                Response::ERR_NICKNAMEINUSE,
                vec![newnick.clone(), "Nickname is already in use".to_string()],
            );
            return Ok(());
        }
        if !is_valid_nickname(newnick) {
            numeric(
                ctx,
                &inner,
                Response::ERR_ERRONEUSNICKNAME,
                vec![newnick.clone(), "Erroneous Nickname".to_string()],
            );
            return Ok(());
        }

        let Some(session) = inner.session(ctx.id) else {
            return Ok(());
        };
        let old_prefix = session.prefix();
        let channels: Vec<String> = session.channels.iter().cloned().collect();
        for folded in &channels {
            if let Some(channel) = inner.channel(folded) {
                ctx.hub.channel_log(
                    &channel.name,
                    &oldnick,
                    &format!("changed nickname to {newnick}"),
                    true,
                );
            }
        }

        inner.nicks.remove(&irc_to_lower(&oldnick));
        inner.nicks.insert(irc_to_lower(newnick), ctx.id);
        if let Some(session) = inner.session_mut(ctx.id) {
            session.nick = Some(newnick.clone());
        }

        let change = Message::from_user(old_prefix, "NICK", vec![newnick.clone()]);
        inner.broadcast_related(ctx.id, &change, true);
        debug!(old = %oldnick, new = %newnick, "Nickname changed");
        Ok(())
    }
}

/// Handler for PING.
///
/// `PING <origin>`: answered with `PONG <server> :<origin>`.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let inner = ctx.hub.lock();
        let Some(origin) = args.first() else {
            numeric(
                ctx,
                &inner,
                Response::ERR_NOORIGIN,
                vec!["No origin specified".to_string()],
            );
            return Ok(());
        };
        inner.send_to(
            ctx.id,
            Message::from_server(
                ctx.server_name(),
                "PONG",
                vec![ctx.server_name().to_string()],
            )
            .with_trailing(origin.clone()),
        );
        Ok(())
    }
}

/// Handler for PONG.
///
/// Any inbound line already refreshes the connection's liveness clock in
/// the transport task, so a PONG needs no further action here.
pub struct PongHandler;

#[async_trait]
impl Handler for PongHandler {
    async fn handle(&self, _ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        Ok(())
    }
}

/// Handler for QUIT.
///
/// The quit reason defaults to the client's own nick. Teardown itself is
/// driven by the connection task, which owns the socket.
pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let quitmsg = match args.first() {
            Some(msg) => msg.clone(),
            None => ctx.hub.lock().nick_of(ctx.id),
        };
        Err(HandlerError::Quit(quitmsg))
    }
}
