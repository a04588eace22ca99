//! Channel name grammar.

/// Maximum channel name length, including the leading sigil.
pub const MAX_CHANNEL_LEN: usize = 51;

/// Validate a channel name.
///
/// Channel names start with `&`, `#`, `+` or `!` and may not contain NUL,
/// BEL, CR, LF, space, comma or colon. Total length is 1 to 51 characters.
pub fn is_valid_channel_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CHANNEL_LEN {
        return false;
    }

    let mut chars = name.chars();
    if !matches!(chars.next(), Some('&' | '#' | '+' | '!')) {
        return false;
    }

    chars.all(|c| !matches!(c, '\0' | '\x07' | '\n' | '\r' | ' ' | ',' | ':'))
}
