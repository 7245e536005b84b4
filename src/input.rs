//! Input line parsing
//!
//! Each line is one command, optionally prefixed by a client id:
//! ```text
//! 3 <Command Name="Echo" Text="hi"/>
//! <Command Name="Help"/>
//! ```
//! Blank lines and lines starting with `#` are ignored.

/// A command read from input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest<'a> {
    pub client_id: u32,
    pub text: &'a str,
}

/// Split a line into client id and command text
pub fn parse_line(line: &str, default_client: u32) -> Option<SubmitRequest<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if let Some((prefix, rest)) = line.split_once(char::is_whitespace) {
        if let Ok(client_id) = prefix.parse::<u32>() {
            let text = rest.trim_start();
            if text.is_empty() {
                return None;
            }
            return Some(SubmitRequest { client_id, text });
        }
    }

    // A client id with no command
    if line.parse::<u32>().is_ok() {
        return None;
    }

    Some(SubmitRequest {
        client_id: default_client,
        text: line,
    })
}
