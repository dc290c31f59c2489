use crate::error::ParseError;

/// Extracts the identifier the Telegram gateway can resolve out of free-form
/// input: a bare or `@`-prefixed username, a `t.me` URL, or an invite link
/// (`t.me/joinchat/<hash>` or `t.me/+<hash>`).
pub fn normalize_link(input: &str) -> Result<String, ParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseError::InvalidLink("empty link".to_string()));
    }

    if let Some(rest) = s.strip_prefix('@') {
        return if is_username(rest) {
            Ok(rest.to_string())
        } else {
            Err(ParseError::InvalidLink(input.to_string()))
        };
    }

    if s.contains("t.me/") {
        let path = s
            .split("t.me/")
            .last()
            .unwrap_or_default()
            .split('?')
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');

        // The invite rule keys on the `joinchat/` prefix, slash included;
        // a plain username that merely starts with "joinchat" is not one.
        if let Some(hash) = path.strip_prefix("joinchat/") {
            let hash = hash.trim_matches('/');
            return if hash.is_empty() {
                Err(ParseError::InvalidLink(input.to_string()))
            } else {
                Ok(hash.to_string())
            };
        }

        let path = path.trim_end_matches('/');
        if let Some(hash) = path.strip_prefix('+') {
            return if hash.is_empty() {
                Err(ParseError::InvalidLink(input.to_string()))
            } else {
                Ok(hash.to_string())
            };
        }
        return if is_username(path) {
            Ok(path.to_string())
        } else {
            Err(ParseError::InvalidLink(input.to_string()))
        };
    }

    if is_username(s) {
        return Ok(s.to_string());
    }

    Err(ParseError::InvalidLink(input.to_string()))
}

fn is_username(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
