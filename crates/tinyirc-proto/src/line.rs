//! Tokenization of a single inbound line into a command and its arguments.
//!
//! The grammar is `COMMAND [arg1 [arg2 ...]] [:trailing arg with spaces]`:
//! if the remainder after the command starts with `:` it is one trailing
//! argument, otherwise arguments are space-split with a literal ` :`
//! marking the start of a final trailing argument.

use crate::command::Command;

/// One tokenized inbound line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub command: Command,
    pub args: Vec<String>,
}

impl Line {
    /// Tokenize a line that has already been stripped of its terminator.
    ///
    /// Returns `None` for empty lines, which are ignored. Malformed input
    /// degrades gracefully: the command token is always extracted and the
    /// argument list may come out empty, leaving arity checks to handlers.
    pub fn parse(line: &str) -> Option<Self> {
        if line.is_empty() {
            return None;
        }

        let (token, rest) = match line.split_once(' ') {
            Some((token, rest)) => (token, Some(rest)),
            None => (line, None),
        };
        let command = Command::from_token(&token.to_ascii_uppercase());

        let args = match rest {
            None => Vec::new(),
            Some(rest) if rest.starts_with(':') => vec![rest[1..].to_string()],
            Some(rest) => match rest.split_once(" :") {
                Some((head, trailing)) => {
                    let mut args: Vec<String> =
                        head.split_whitespace().map(str::to_string).collect();
                    args.push(trailing.to_string());
                    args
                }
                None => rest.split_whitespace().map(str::to_string).collect(),
            },
        };

        Some(Self { command, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line_ignored() {
        assert_eq!(Line::parse(""), None);
    }

    #[test]
    fn test_bare_command() {
        let line = Line::parse("QUIT").unwrap();
        assert_eq!(line.command, Command::Quit);
        assert!(line.args.is_empty());
    }

    #[test]
    fn test_command_lowercase() {
        let line = Line::parse("join #fisk").unwrap();
        assert_eq!(line.command, Command::Join);
        assert_eq!(line.args, vec!["#fisk"]);
    }

    #[test]
    fn test_trailing_argument() {
        let line = Line::parse("PRIVMSG #fisk :hello there world").unwrap();
        assert_eq!(line.command, Command::Privmsg);
        assert_eq!(line.args, vec!["#fisk", "hello there world"]);
    }

    #[test]
    fn test_immediate_trailing() {
        let line = Line::parse("QUIT :bye bye").unwrap();
        assert_eq!(line.args, vec!["bye bye"]);
    }

    #[test]
    fn test_multiple_arguments() {
        let line = Line::parse("MODE #fisk +k nors").unwrap();
        assert_eq!(line.args, vec!["#fisk", "+k", "nors"]);
    }

    #[test]
    fn test_empty_trailing() {
        let line = Line::parse("TOPIC #fisk :").unwrap();
        assert_eq!(line.args, vec!["#fisk", ""]);
    }

    #[test]
    fn test_extra_whitespace_collapsed() {
        let line = Line::parse("USER apa  *   * :Apa Apansson").unwrap();
        assert_eq!(line.args, vec!["apa", "*", "*", "Apa Apansson"]);
    }

    #[test]
    fn test_unknown_command_with_args() {
        let line = Line::parse("frobnicate a b").unwrap();
        assert_eq!(line.command, Command::Unknown("FROBNICATE".to_string()));
        assert_eq!(line.args, vec!["a", "b"]);
    }
}
