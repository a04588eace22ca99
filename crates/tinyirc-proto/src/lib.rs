//! tinyirc-proto - IRC protocol primitives for tinyircd.
//!
//! This crate holds the pure, state-free pieces of the protocol: the RFC 1459
//! case mapping, line framing and tokenization, the closed command set, the
//! outbound message model, numeric replies, and the nickname/channel-name
//! grammars. It knows nothing about server state.

pub mod casemap;
pub mod chan;
#[cfg(feature = "codec")]
pub mod codec;
pub mod command;
pub mod line;
pub mod message;
pub mod nick;
pub mod response;

pub use casemap::{irc_eq, irc_to_lower};
pub use chan::is_valid_channel_name;
#[cfg(feature = "codec")]
pub use codec::LineCodec;
pub use command::Command;
pub use line::Line;
pub use message::{Message, Prefix};
pub use nick::is_valid_nickname;
pub use response::Response;

/// Maximum length of a wire line in bytes, including the trailing CRLF.
pub const MAX_LINE_LEN: usize = 512;
