//! Handler for AWAY.

use async_trait::async_trait;
use tinyirc_proto::Response;
use tracing::debug;

use super::{numeric, Context, Handler};
use crate::error::HandlerResult;

/// `AWAY [<message>]`: with a message, marks the client away; without one,
/// clears the mark.
pub struct AwayHandler;

#[async_trait]
impl Handler for AwayHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let mut inner = ctx.hub.lock();

        if let Some(text) = args.first() {
            if let Some(session) = inner.session_mut(ctx.id) {
                session.away = Some(text.clone());
            }
            debug!(nick = %inner.nick_of(ctx.id), "User marked as away");
            numeric(
                ctx,
                &inner,
                Response::RPL_NOWAWAY,
                vec!["You have been marked as being away".to_string()],
            );
        } else {
            if let Some(session) = inner.session_mut(ctx.id) {
                session.away = None;
            }
            numeric(
                ctx,
                &inner,
                Response::RPL_UNAWAY,
                vec!["You are no longer marked as being away".to_string()],
            );
        }
        Ok(())
    }
}
