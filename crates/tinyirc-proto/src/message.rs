//! Outbound message model and wire serialization.

use std::fmt::{self, Display, Formatter};

use crate::response::Response;

/// The source of an outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prefix {
    /// `:server.name`
    Server(String),
    /// `:nick!user@host`
    User {
        nick: String,
        user: String,
        host: String,
    },
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(name) => write!(f, "{name}"),
            Self::User { nick, user, host } => write!(f, "{nick}!{user}@{host}"),
        }
    }
}

/// One outbound wire line, without its CRLF terminator.
///
/// Whether the final parameter carries a `:` marker is part of each reply's
/// format, not something that can be inferred from its content (`353`
/// colons a single nick, `324` never colons its key), so the trailing
/// parameter is an explicit field. Middle params must be non-empty and
/// space-free; trailing text may be anything, including empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<Prefix>,
    pub command: String,
    pub params: Vec<String>,
    /// Trailing parameter, always serialized behind a `:`.
    pub trailing: Option<String>,
}

impl Message {
    /// A message with no prefix.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
            trailing: None,
        }
    }

    /// A numeric reply prefixed with the server name.
    pub fn reply(server: &str, response: Response, params: Vec<String>) -> Self {
        Self {
            prefix: Some(Prefix::Server(server.to_string())),
            command: format!("{:03}", response.code()),
            params,
            trailing: None,
        }
    }

    /// A named command prefixed with the server name.
    pub fn from_server(server: &str, command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: Some(Prefix::Server(server.to_string())),
            command: command.into(),
            params,
            trailing: None,
        }
    }

    /// A named command prefixed with a user mask.
    pub fn from_user(prefix: Prefix, command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: Some(prefix),
            command: command.into(),
            params,
            trailing: None,
        }
    }

    /// Attach the trailing parameter.
    pub fn with_trailing(mut self, text: impl Into<String>) -> Self {
        self.trailing = Some(text.into());
        self
    }

    /// Serialized length in bytes, including the CRLF terminator.
    pub fn wire_len(&self) -> usize {
        self.to_string().len() + 2
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{prefix} ")?;
        }

        write!(f, "{}", self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(ref trailing) = self.trailing {
            write!(f, " :{trailing}")?;
        }

        Ok(())
    }
}
