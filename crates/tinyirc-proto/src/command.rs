//! The closed set of client commands this server understands.
//!
//! Dispatch matches on this enum explicitly, so a handler gap is a
//! compile-time hole rather than a silent fallthrough; genuinely
//! unrecognized wire tokens land in [`Command::Unknown`].

/// A client command token, uppercased on parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Away,
    Ison,
    Join,
    List,
    Lusers,
    Mode,
    Motd,
    Nick,
    Notice,
    Part,
    Pass,
    Ping,
    Pong,
    Privmsg,
    Quit,
    Topic,
    User,
    Wallops,
    Who,
    Whois,
    /// Anything else; carries the uppercased wire token for the 421 reply.
    Unknown(String),
}

impl Command {
    /// Parse an already-uppercased command token.
    pub fn from_token(token: &str) -> Self {
        match token {
            "AWAY" => Self::Away,
            "ISON" => Self::Ison,
            "JOIN" => Self::Join,
            "LIST" => Self::List,
            "LUSERS" => Self::Lusers,
            "MODE" => Self::Mode,
            "MOTD" => Self::Motd,
            "NICK" => Self::Nick,
            "NOTICE" => Self::Notice,
            "PART" => Self::Part,
            "PASS" => Self::Pass,
            "PING" => Self::Ping,
            "PONG" => Self::Pong,
            "PRIVMSG" => Self::Privmsg,
            "QUIT" => Self::Quit,
            "TOPIC" => Self::Topic,
            "USER" => Self::User,
            "WALLOPS" => Self::Wallops,
            "WHO" => Self::Who,
            "WHOIS" => Self::Whois,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire name of this command.
    pub fn name(&self) -> &str {
        match self {
            Self::Away => "AWAY",
            Self::Ison => "ISON",
            Self::Join => "JOIN",
            Self::List => "LIST",
            Self::Lusers => "LUSERS",
            Self::Mode => "MODE",
            Self::Motd => "MOTD",
            Self::Nick => "NICK",
            Self::Notice => "NOTICE",
            Self::Part => "PART",
            Self::Pass => "PASS",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Privmsg => "PRIVMSG",
            Self::Quit => "QUIT",
            Self::Topic => "TOPIC",
            Self::User => "USER",
            Self::Wallops => "WALLOPS",
            Self::Who => "WHO",
            Self::Whois => "WHOIS",
            Self::Unknown(token) => token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens_round_trip() {
        for token in [
            "AWAY", "ISON", "JOIN", "LIST", "LUSERS", "MODE", "MOTD", "NICK", "NOTICE", "PART",
            "PASS", "PING", "PONG", "PRIVMSG", "QUIT", "TOPIC", "USER", "WALLOPS", "WHO", "WHOIS",
        ] {
            let cmd = Command::from_token(token);
            assert!(!matches!(cmd, Command::Unknown(_)), "{token} parsed as unknown");
            assert_eq!(cmd.name(), token);
        }
    }

    #[test]
    fn test_unknown_token_preserved() {
        let cmd = Command::from_token("FROBNICATE");
        assert_eq!(cmd, Command::Unknown("FROBNICATE".to_string()));
        assert_eq!(cmd.name(), "FROBNICATE");
    }
}
