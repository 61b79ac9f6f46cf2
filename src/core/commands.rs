//! Command detection

/// Name of the command carried by `body`, if it is one.
///
/// A body is a command when it starts with `/`. The name runs up to the first whitespace and
/// is lower-cased, so `/Help me` yields `help`. A lone `/` is a command with an empty name.
pub fn command_name(body: &str) -> Option<String> {
    let rest = body.strip_prefix('/')?;
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(rest[..end].to_lowercase())
}

pub fn is_command(body: &str) -> bool {
    body.starts_with('/')
}
