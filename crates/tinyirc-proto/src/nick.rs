//! Nickname grammar.

/// Maximum nickname length. The RFC limit is 9 characters, but what the heck.
pub const MAX_NICK_LEN: usize = 51;

fn is_nick_symbol(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '^' | '{' | '}' | '|' | '~' | '_')
}

/// Validate a proposed nickname.
///
/// Accepts ASCII letters, digits and the symbols `[]\^{}|~_`, 1 to 51
/// characters, with a non-digit first character.
pub fn is_valid_nickname(nick: &str) -> bool {
    if nick.is_empty() || nick.len() > MAX_NICK_LEN {
        return false;
    }

    let mut chars = nick.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !(first.is_ascii_alphabetic() || is_nick_symbol(first)) {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || is_nick_symbol(c))
}
