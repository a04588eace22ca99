//! Channel membership handlers: JOIN, PART, TOPIC, LIST.

use async_trait::async_trait;
use tinyirc_proto::{irc_to_lower, is_valid_channel_name, Message, Response};
use tracing::debug;

use super::{numeric, send_names, server_reply, Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::HubInner;

/// Handler for JOIN.
///
/// `JOIN <channel>{,<channel>} [<key>{,<key>}]` or `JOIN 0` to leave every
/// channel. Channels are created on first join; a persisted key set in an
/// earlier incarnation of a channel is enforced from the moment it is
/// recreated.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let mut inner = ctx.hub.lock();

        if args[0] == "0" {
            part_all(ctx, &mut inner);
            return Ok(());
        }

        let names: Vec<String> = args[0].split(',').map(str::to_string).collect();
        let keys: Vec<String> = args
            .get(1)
            .map(|k| k.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        for (i, name) in names.iter().enumerate() {
            if !is_valid_channel_name(name) {
                numeric(
                    ctx,
                    &inner,
                    Response::ERR_NOSUCHCHANNEL,
                    vec![name.clone(), "No such channel".to_string()],
                );
                continue;
            }
            let folded = irc_to_lower(name);
            let already_joined = inner
                .session(ctx.id)
                .is_some_and(|s| s.channels.contains(&folded));
            if already_joined {
                continue;
            }

            let channel = inner.get_or_create_channel(name, ctx.hub.state_dir.as_deref());
            let canonical = channel.name.clone();
            let required_key = channel.key().map(str::to_string);
            if let Some(required) = required_key {
                if keys.get(i) != Some(&required) {
                    numeric(
                        ctx,
                        &inner,
                        Response::ERR_BADCHANNELKEY,
                        vec![
                            canonical,
                            "Cannot join channel (+k) - bad key".to_string(),
                        ],
                    );
                    // A channel materialized only for this check must not
                    // outlive the rejected join.
                    if inner.channel(&folded).is_some_and(|c| c.members.is_empty()) {
                        inner.channels.remove(&folded);
                    }
                    continue;
                }
            }

            inner.add_member(ctx.id, &folded);
            let Some(session) = inner.session(ctx.id) else {
                return Ok(());
            };
            let join = Message::from_user(session.prefix(), "JOIN", vec![name.clone()]);
            let nick = session.nick_or_star().to_string();
            inner.broadcast_channel(&folded, &join, None);
            ctx.hub.channel_log(&canonical, &nick, "joined", true);
            debug!(nick = %nick, channel = %canonical, "Joined channel");

            let topic = inner
                .channel(&folded)
                .map(|c| c.topic().to_string())
                .unwrap_or_default();
            if topic.is_empty() {
                numeric(
                    ctx,
                    &inner,
                    Response::RPL_NOTOPIC,
                    vec![canonical.clone(), "No topic is set".to_string()],
                );
            } else {
                numeric(ctx, &inner, Response::RPL_TOPIC, vec![canonical, topic]);
            }
            send_names(ctx, &inner, &folded);
        }
        Ok(())
    }
}

/// Leave every joined channel, announcing a plain PART for each.
fn part_all(ctx: &Context<'_>, inner: &mut HubInner) {
    let mut joined: Vec<String> = inner
        .session(ctx.id)
        .map(|s| s.channels.iter().cloned().collect())
        .unwrap_or_default();
    joined.sort_unstable();

    for folded in joined {
        let Some(channel) = inner.channel(&folded) else {
            continue;
        };
        let canonical = channel.name.clone();
        let Some(session) = inner.session(ctx.id) else {
            return;
        };
        let part = Message::from_user(session.prefix(), "PART", vec![canonical.clone()]);
        let nick = session.nick_or_star().to_string();
        inner.broadcast_channel(&folded, &part, None);
        ctx.hub.channel_log(&canonical, &nick, "left", true);
        inner.remove_member(ctx.id, &folded);
    }
}

/// Handler for PART.
///
/// `PART <channel>{,<channel>} [<message>]`; the part message defaults to
/// the client's own nick.
pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let mut inner = ctx.hub.lock();
        let partmsg = args
            .get(1)
            .cloned()
            .unwrap_or_else(|| inner.nick_of(ctx.id));

        for name in args[0].split(',') {
            if !is_valid_channel_name(name) {
                numeric(
                    ctx,
                    &inner,
                    Response::ERR_NOSUCHCHANNEL,
                    vec![name.to_string(), "No such channel".to_string()],
                );
                continue;
            }
            let folded = irc_to_lower(name);
            let is_member = inner
                .session(ctx.id)
                .is_some_and(|s| s.channels.contains(&folded));
            if !is_member {
                numeric(
                    ctx,
                    &inner,
                    Response::ERR_NOTONCHANNEL,
                    vec![name.to_string(), "You're not on that channel".to_string()],
                );
                continue;
            }

            let canonical = inner
                .channel(&folded)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| name.to_string());
            let Some(session) = inner.session(ctx.id) else {
                return Ok(());
            };
            let part = Message::from_user(session.prefix(), "PART", vec![name.to_string()])
                .with_trailing(partmsg.clone());
            let nick = session.nick_or_star().to_string();
            inner.broadcast_channel(&folded, &part, None);
            ctx.hub
                .channel_log(&canonical, &nick, &format!("left ({partmsg})"), true);
            inner.remove_member(ctx.id, &folded);
        }
        Ok(())
    }
}

/// Handler for TOPIC.
///
/// `TOPIC <channel> [<topic>]`. Both reading and setting require
/// membership; a set topic is persisted and echoed to the whole channel.
pub struct TopicHandler;

#[async_trait]
impl Handler for TopicHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let mut inner = ctx.hub.lock();
        let name = &args[0];
        let folded = irc_to_lower(name);

        let is_member = inner
            .session(ctx.id)
            .is_some_and(|s| s.channels.contains(&folded));
        if !is_member {
            // The channel name stands where the nick normally would.
            inner.send_to(
                ctx.id,
                server_reply(
                    ctx.server_name(),
                    Response::ERR_NOTONCHANNEL,
                    vec![name.clone(), "You're not on that channel".to_string()],
                ),
            );
            return Ok(());
        }

        if let Some(newtopic) = args.get(1) {
            let Some(channel) = inner.channel_mut(&folded) else {
                return Ok(());
            };
            let pending = channel.set_topic(newtopic.clone());
            let canonical = channel.name.clone();

            let Some(session) = inner.session(ctx.id) else {
                return Ok(());
            };
            let topic_msg = Message::from_user(session.prefix(), "TOPIC", vec![name.clone()])
                .with_trailing(newtopic.clone());
            let nick = session.nick_or_star().to_string();
            inner.broadcast_channel(&folded, &topic_msg, None);
            ctx.hub.channel_log(
                &canonical,
                &nick,
                &format!("set topic to {newtopic:?}"),
                true,
            );
            drop(inner);
            if let Some(pending) = pending {
                pending.write();
            }
        } else {
            let (canonical, topic) = match inner.channel(&folded) {
                Some(channel) => (channel.name.clone(), channel.topic().to_string()),
                None => return Ok(()),
            };
            if topic.is_empty() {
                numeric(
                    ctx,
                    &inner,
                    Response::RPL_NOTOPIC,
                    vec![canonical, "No topic is set".to_string()],
                );
            } else {
                numeric(ctx, &inner, Response::RPL_TOPIC, vec![canonical, topic]);
            }
        }
        Ok(())
    }
}

/// Handler for LIST.
///
/// `LIST [<channel>{,<channel>}]`; without arguments, lists every channel.
/// Unknown names in the filter are silently skipped.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let inner = ctx.hub.lock();

        let mut listed: Vec<(String, usize, String)> = match args.first() {
            None => inner
                .channels
                .values()
                .map(|c| (c.name.clone(), c.members.len(), c.topic().to_string()))
                .collect(),
            Some(filter) => filter
                .split(',')
                .filter_map(|name| inner.channel(&irc_to_lower(name)))
                .map(|c| (c.name.clone(), c.members.len(), c.topic().to_string()))
                .collect(),
        };
        listed.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        for (name, members, topic) in listed {
            numeric(
                ctx,
                &inner,
                Response::RPL_LIST,
                vec![name, members.to_string(), topic],
            );
        }
        numeric(
            ctx,
            &inner,
            Response::RPL_LISTEND,
            vec!["End of LIST".to_string()],
        );
        Ok(())
    }
}
