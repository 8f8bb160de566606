/// Rewrites every single- or double-quoted literal in `text` into double-quoted form.
///
/// Backslash escapes inside a literal are carried over untouched, so an escaped
/// quote never closes it. A bare `"` inside a single-quoted literal is escaped,
/// and an escaped `\'` loses its backslash because it no longer needs one.
/// Unterminated literals are copied through and left for the scanner to reject.
pub fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut open: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match open {
            None => {
                if c == '"' || c == '\'' {
                    open = Some(c);
                    out.push('"');
                } else {
                    out.push(c);
                }
            }
            Some(quote) => {
                if c == '\\' {
                    match chars.next() {
                        Some('\'') if quote == '\'' => out.push('\''),
                        Some(next) => {
                            out.push('\\');
                            out.push(next);
                        }
                        None => out.push('\\'),
                    }
                } else if c == quote {
                    open = None;
                    out.push('"');
                } else if c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
        }
    }

    out
}
