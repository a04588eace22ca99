//! Unified error handling for tinyircd.
//!
//! Protocol-level failures are answered with numeric replies and never tear
//! down a connection; only `Quit` crosses back into the connection task's
//! control flow.

use thiserror::Error;
use tinyirc_proto::{Message, Response};

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Client asked to quit; carries the quit reason.
    #[error("client quit: {0}")]
    Quit(String),
}

impl HandlerError {
    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        match self {
            Self::NeedMoreParams => Some(
                Message::reply(
                    server_name,
                    Response::ERR_NEEDMOREPARAMS,
                    vec![nick.to_string(), cmd_name.to_string()],
                )
                .with_trailing("Not enough parameters"),
            ),
            Self::UnknownCommand(cmd) => Some(
                Message::reply(
                    server_name,
                    Response::ERR_UNKNOWNCOMMAND,
                    vec![nick.to_string(), cmd.clone()],
                )
                .with_trailing("Unknown command"),
            ),
            Self::Quit(_) => None,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
