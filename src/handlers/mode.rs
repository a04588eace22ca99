//! Handler for MODE.
//!
//! The only channel mode is `+k` (join key) and the only user mode string
//! is the empty `+`. Key changes require membership and are persisted with
//! the rest of the channel state.

use async_trait::async_trait;
use tinyirc_proto::{irc_to_lower, Message, Response};

use super::{numeric, server_reply, Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::{HubInner, PendingState};

pub struct ModeHandler;

#[async_trait]
impl Handler for ModeHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let mut inner = ctx.hub.lock();
        let target = &args[0];
        let folded = irc_to_lower(target);

        if inner.has_channel(target) {
            let pending = channel_mode(ctx, &mut inner, target, &folded, args)?;
            drop(inner);
            if let Some(pending) = pending {
                pending.write();
            }
            return Ok(());
        }

        let own_nick = inner
            .session(ctx.id)
            .and_then(|s| s.nick.clone())
            .unwrap_or_default();
        if *target == own_nick {
            if args.len() == 1 {
                // 221 carries no trailing parameter.
                inner.send_to(
                    ctx.id,
                    Message::reply(
                        ctx.server_name(),
                        Response::RPL_UMODEIS,
                        vec![inner.nick_of(ctx.id), "+".to_string()],
                    ),
                );
            } else {
                numeric(
                    ctx,
                    &inner,
                    Response::ERR_UMODEUNKNOWNFLAG,
                    vec!["Unknown MODE flag".to_string()],
                );
            }
        } else {
            numeric(
                ctx,
                &inner,
                Response::ERR_NOSUCHCHANNEL,
                vec![target.clone(), "No such channel".to_string()],
            );
        }
        Ok(())
    }
}

fn channel_mode(
    ctx: &Context<'_>,
    inner: &mut HubInner,
    target: &str,
    folded: &str,
    args: &[String],
) -> Result<Option<PendingState>, HandlerError> {
    let is_member = inner
        .session(ctx.id)
        .is_some_and(|s| s.channels.contains(folded));

    if args.len() < 2 {
        // Mode query, no trailing parameter. The key value is only
        // disclosed to members.
        let key = inner.channel(folded).and_then(|c| c.key().map(str::to_string));
        let mut params = vec![inner.nick_of(ctx.id), target.to_string()];
        match key {
            None => params.push("+".to_string()),
            Some(key) if is_member => {
                params.push("+k".to_string());
                params.push(key);
            }
            Some(_) => params.push("+k".to_string()),
        }
        inner.send_to(
            ctx.id,
            Message::reply(ctx.server_name(), Response::RPL_CHANNELMODEIS, params),
        );
        return Ok(None);
    }

    let flag = &args[1];
    match flag.as_str() {
        "+k" => {
            let Some(key) = args.get(2) else {
                return Err(HandlerError::NeedMoreParams);
            };
            if !is_member {
                not_on_channel(ctx, inner, target);
                return Ok(None);
            }
            let Some(channel) = inner.channel_mut(folded) else {
                return Ok(None);
            };
            let pending = channel.set_key(Some(key.clone()));
            let canonical = channel.name.clone();
            announce_mode(ctx, inner, folded, vec![
                canonical.clone(),
                "+k".to_string(),
                key.clone(),
            ]);
            let nick = inner.nick_of(ctx.id);
            ctx.hub
                .channel_log(&canonical, &nick, &format!("set channel key to {key}"), true);
            Ok(pending)
        }
        "-k" => {
            if !is_member {
                not_on_channel(ctx, inner, target);
                return Ok(None);
            }
            let Some(channel) = inner.channel_mut(folded) else {
                return Ok(None);
            };
            let pending = channel.set_key(None);
            let canonical = channel.name.clone();
            announce_mode(ctx, inner, folded, vec![canonical.clone(), "-k".to_string()]);
            let nick = inner.nick_of(ctx.id);
            ctx.hub
                .channel_log(&canonical, &nick, "removed channel key", true);
            Ok(pending)
        }
        _ => {
            numeric(
                ctx,
                inner,
                Response::ERR_UNKNOWNMODE,
                vec![flag.clone(), "Unknown MODE flag".to_string()],
            );
            Ok(None)
        }
    }
}

fn announce_mode(ctx: &Context<'_>, inner: &HubInner, folded: &str, params: Vec<String>) {
    let Some(session) = inner.session(ctx.id) else {
        return;
    };
    let msg = Message::from_user(session.prefix(), "MODE", params);
    inner.broadcast_channel(folded, &msg, None);
}

/// The channel name stands where the nick normally would.
fn not_on_channel(ctx: &Context<'_>, inner: &HubInner, target: &str) {
    inner.send_to(
        ctx.id,
        server_reply(
            ctx.server_name(),
            Response::ERR_NOTONCHANNEL,
            vec![target.to_string(), "You're not on that channel".to_string()],
        ),
    );
}
