//! Single-line encoding for line-oriented picker protocols.
//!
//! Pickers like fzf and rofi operate on one entry per line, so multi-line
//! text payloads are flattened before listing and restored when a selection
//! comes back. This is purely a presentation transform; stored payloads stay
//! byte-exact.
//!
//! The encoding is injective: backslash is escaped first, so a payload that
//! happens to contain a literal `\n` two-character sequence round-trips
//! unchanged. Carriage returns are folded into the newline escape so CRLF
//! text still becomes a single line.

/// Flatten a payload to one line: `\` -> `\\`, newline -> `\n`, CR -> `\r`.
pub fn encode(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for ch in payload.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`encode`]. Unknown escape sequences are passed through
/// verbatim so a hand-typed selection still resolves.
pub fn decode(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
