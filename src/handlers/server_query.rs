//! Server query handlers: MOTD, LUSERS.
//!
//! The burst helpers here are shared with the registration path, which
//! sends both as part of the welcome.

use async_trait::async_trait;
use tinyirc_proto::Response;

use super::{server_reply, Context, Handler};
use crate::error::HandlerResult;
use crate::state::{ConnId, Hub, HubInner};

/// Send the user count summary.
pub fn send_lusers(hub: &Hub, inner: &HubInner, id: ConnId) {
    let nick = inner.nick_of(id);
    inner.send_to(
        id,
        server_reply(
            &hub.name,
            Response::RPL_LUSERCLIENT,
            vec![
                nick,
                format!(
                    "There are {} users and 0 services on 1 server",
                    inner.nicks.len()
                ),
            ],
        ),
    );
}

/// Send the message of the day, or its absence marker.
pub fn send_motd(hub: &Hub, inner: &HubInner, id: ConnId) {
    let nick = inner.nick_of(id);
    let lines = hub.motd_lines();
    if lines.is_empty() {
        inner.send_to(
            id,
            server_reply(
                &hub.name,
                Response::ERR_NOMOTD,
                vec![nick, "MOTD File is missing".to_string()],
            ),
        );
        return;
    }

    inner.send_to(
        id,
        server_reply(
            &hub.name,
            Response::RPL_MOTDSTART,
            vec![
                nick.clone(),
                format!("- {} Message of the day -", hub.name),
            ],
        ),
    );
    for line in &lines {
        inner.send_to(
            id,
            server_reply(
                &hub.name,
                Response::RPL_MOTD,
                vec![nick.clone(), format!("- {}", line.trim_end())],
            ),
        );
    }
    inner.send_to(
        id,
        server_reply(
            &hub.name,
            Response::RPL_ENDOFMOTD,
            vec![nick, "End of /MOTD command".to_string()],
        ),
    );
}

/// Handler for MOTD.
pub struct MotdHandler;

#[async_trait]
impl Handler for MotdHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        let inner = ctx.hub.lock();
        send_motd(ctx.hub, &inner, ctx.id);
        Ok(())
    }
}

/// Handler for LUSERS.
pub struct LusersHandler;

#[async_trait]
impl Handler for LusersHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        let inner = ctx.hub.lock();
        send_lusers(ctx.hub, &inner, ctx.id);
        Ok(())
    }
}
