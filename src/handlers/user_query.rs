//! User query handlers: WHO, WHOIS, ISON.

use async_trait::async_trait;
use tinyirc_proto::{irc_to_lower, Response};

use super::{numeric, Context, Handler};
use crate::error::{HandlerError, HandlerResult};

/// Handler for WHO.
///
/// `WHO <target>`: lists members when the target is a known channel,
/// otherwise only the end marker is sent. A missing target is ignored
/// entirely.
pub struct WhoHandler;

#[async_trait]
impl Handler for WhoHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let Some(target) = args.first() else {
            return Ok(());
        };
        let inner = ctx.hub.lock();

        if let Some(channel) = inner.channel(&irc_to_lower(target)) {
            let mut members: Vec<_> = channel
                .members
                .iter()
                .filter_map(|id| inner.session(*id))
                .collect();
            members.sort_unstable_by_key(|s| s.nick_or_star());

            for member in members {
                numeric(
                    ctx,
                    &inner,
                    Response::RPL_WHOREPLY,
                    vec![
                        target.clone(),
                        member.user.clone().unwrap_or_default(),
                        member.host.clone(),
                        ctx.server_name().to_string(),
                        member.nick_or_star().to_string(),
                        "H".to_string(),
                        format!("0 {}", member.realname.clone().unwrap_or_default()),
                    ],
                );
            }
        }
        numeric(
            ctx,
            &inner,
            Response::RPL_ENDOFWHO,
            vec![target.clone(), "End of WHO list".to_string()],
        );
        Ok(())
    }
}

/// Handler for WHOIS.
///
/// `WHOIS <nick>`: user, server, away and channel information for one
/// nick. A missing argument is ignored entirely.
pub struct WhoisHandler;

#[async_trait]
impl Handler for WhoisHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let Some(target) = args.first() else {
            return Ok(());
        };
        let inner = ctx.hub.lock();

        let Some(user) = inner.lookup_nick(target).and_then(|id| inner.session(id)) else {
            numeric(
                ctx,
                &inner,
                Response::ERR_NOSUCHNICK,
                vec![target.clone(), "No such nick".to_string()],
            );
            return Ok(());
        };
        let unick = user.nick_or_star().to_string();

        numeric(
            ctx,
            &inner,
            Response::RPL_WHOISUSER,
            vec![
                unick.clone(),
                user.user.clone().unwrap_or_default(),
                user.host.clone(),
                "*".to_string(),
                user.realname.clone().unwrap_or_default(),
            ],
        );
        numeric(
            ctx,
            &inner,
            Response::RPL_WHOISSERVER,
            vec![
                unick.clone(),
                ctx.server_name().to_string(),
                ctx.server_name().to_string(),
            ],
        );
        if let Some(away) = &user.away {
            numeric(
                ctx,
                &inner,
                Response::RPL_AWAY,
                vec![unick.clone(), away.clone()],
            );
        }
        if !user.channels.is_empty() {
            // Display names, not the folded registry keys.
            let mut channels: Vec<String> = user
                .channels
                .iter()
                .filter_map(|folded| inner.channel(folded))
                .map(|c| c.name.clone())
                .collect();
            channels.sort_unstable();
            numeric(
                ctx,
                &inner,
                Response::RPL_WHOISCHANNELS,
                vec![unick.clone(), channels.join(" ")],
            );
        }
        numeric(
            ctx,
            &inner,
            Response::RPL_ENDOFWHOIS,
            vec![unick, "End of WHOIS list".to_string()],
        );
        Ok(())
    }
}

/// Handler for ISON.
///
/// `ISON <nick>{ <nick>}`: echoes back the subset of the given nicks that
/// are currently online, in their registered case.
pub struct IsonHandler;

#[async_trait]
impl Handler for IsonHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        if args.is_empty() {
            return Err(HandlerError::NeedMoreParams);
        }
        let inner = ctx.hub.lock();

        let online: Vec<String> = args
            .iter()
            .filter_map(|name| inner.lookup_nick(name))
            .filter_map(|id| inner.session(id))
            .map(|s| s.nick_or_star().to_string())
            .collect();
        numeric(ctx, &inner, Response::RPL_ISON, vec![online.join(" ")]);
        Ok(())
    }
}
