//! Messaging handlers: PRIVMSG, NOTICE, WALLOPS.

use async_trait::async_trait;
use tinyirc_proto::{irc_to_lower, Message, Response};

use super::{numeric, Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, HubInner};

/// Handler for PRIVMSG.
///
/// `PRIVMSG <target> <text>`. A channel target relays to every member
/// except the sender; a nick target delivers directly, preceded by the
/// target's away message if one is set.
pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        relay(ctx, args, "PRIVMSG")
    }
}

/// Handler for NOTICE.
///
/// Same routing as PRIVMSG.
pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        relay(ctx, args, "NOTICE")
    }
}

fn relay(ctx: &Context<'_>, args: &[String], command: &str) -> HandlerResult {
    let inner = ctx.hub.lock();
    if args.is_empty() {
        numeric(
            ctx,
            &inner,
            Response::ERR_NORECIPIENT,
            vec![format!("No recipient given ({command})")],
        );
        return Ok(());
    }
    if args.len() == 1 {
        numeric(
            ctx,
            &inner,
            Response::ERR_NOTEXTTOSEND,
            vec!["No text to send".to_string()],
        );
        return Ok(());
    }
    let target = &args[0];
    let text = &args[1];

    if let Some(target_id) = inner.lookup_nick(target) {
        deliver_to_user(ctx, &inner, target_id, target, text, command);
    } else {
        let folded = irc_to_lower(target);
        if let Some(channel) = inner.channel(&folded) {
            let canonical = channel.name.clone();
            let Some(sender) = inner.session(ctx.id) else {
                return Ok(());
            };
            let msg = Message::from_user(sender.prefix(), command, vec![canonical.clone()])
                .with_trailing(text.clone());
            let nick = sender.nick_or_star().to_string();
            inner.broadcast_channel(&folded, &msg, Some(ctx.id));
            ctx.hub.channel_log(&canonical, &nick, text, false);
        } else {
            numeric(
                ctx,
                &inner,
                Response::ERR_NOSUCHNICK,
                vec![target.clone(), "No such nick/channel".to_string()],
            );
        }
    }
    Ok(())
}

fn deliver_to_user(
    ctx: &Context<'_>,
    inner: &HubInner,
    target_id: ConnId,
    target: &str,
    text: &str,
    command: &str,
) {
    let away = inner.session(target_id).and_then(|s| {
        s.away
            .as_ref()
            .map(|msg| (s.nick_or_star().to_string(), msg.clone()))
    });
    if let Some((target_nick, away_msg)) = away {
        numeric(ctx, inner, Response::RPL_AWAY, vec![target_nick, away_msg]);
    }
    let Some(sender) = inner.session(ctx.id) else {
        return;
    };
    let msg = Message::from_user(sender.prefix(), command, vec![target.to_string()])
        .with_trailing(text);
    inner.send_to(target_id, msg);
}

/// Handler for WALLOPS.
///
/// `WALLOPS <text>`: delivers a global notice to every connection,
/// registered or not.
pub struct WallopsHandler;

#[async_trait]
impl Handler for WallopsHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let inner = ctx.hub.lock();
        let Some(sender) = inner.session(ctx.id) else {
            return Ok(());
        };
        let prefix = sender.prefix();
        let text = &args[0];

        for session in inner.sessions.values() {
            session.send(
                Message::from_user(
                    prefix.clone(),
                    "NOTICE",
                    vec![session.nick_or_star().to_string()],
                )
                .with_trailing(format!("Global notice: {text}")),
            );
        }
        Ok(())
    }
}
