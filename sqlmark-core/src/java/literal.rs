//! Decoding of Java string and character literals.

/// Decode the source text of a `string_literal` (plain or text block).
pub fn decode_string_literal(raw: &str) -> Option<String> {
    if let Some(body) = raw
        .strip_prefix("\"\"\"")
        .and_then(|rest| rest.strip_suffix("\"\"\""))
    {
        return Some(unescape(&text_block_content(body)));
    }
    let body = raw.strip_prefix('"')?.strip_suffix('"')?;
    Some(unescape(body))
}

/// Decode the source text of a `character_literal`.
pub fn decode_char_literal(raw: &str) -> Option<char> {
    let body = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = unescape(body).chars().collect::<Vec<_>>();
    if chars.len() == 1 {
        chars.pop()
    } else {
        None
    }
}

/// Text block content after the opening line, with incidental
/// indentation and trailing spaces removed.
fn text_block_content(body: &str) -> String {
    let body = match body.find('\n') {
        Some(i) => &body[i + 1..],
        None => body,
    };
    let lines: Vec<&str> = body.split('\n').collect();
    let last = lines.len().saturating_sub(1);

    // The closing delimiter's line counts even when blank.
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| *i == last || !line.trim().is_empty())
        .map(|(_, line)| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            // line continuation inside text blocks
            Some('\n') => {}
            Some(first @ '0'..='7') => {
                // \0 - \377: three digits only when the first is 0-3
                let max_len = if first <= '3' { 3 } else { 2 };
                let mut value = first.to_digit(8).unwrap_or(0);
                let mut len = 1;
                while len < max_len {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                            len += 1;
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some('u') => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_literal() {
        assert_eq!(decode_string_literal("\"ns.sqlId\"").as_deref(), Some("ns.sqlId"));
        assert_eq!(decode_string_literal("\"\"").as_deref(), Some(""));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            decode_string_literal(r#""a\tb\n\"q\"\\""#).as_deref(),
            Some("a\tb\n\"q\"\\")
        );
        assert_eq!(decode_string_literal(r#""A\101\0""#).as_deref(), Some("AA\0"));
    }

    #[test]
    fn test_text_block() {
        let raw = "\"\"\"\n    ns.\n      sqlId\n    \"\"\"";
        assert_eq!(decode_string_literal(raw).as_deref(), Some("ns.\n  sqlId\n"));
    }

    #[test]
    fn test_text_block_line_continuation() {
        let raw = "\"\"\"\n    ns.\\\n    sqlId\"\"\"";
        assert_eq!(decode_string_literal(raw).as_deref(), Some("ns.sqlId"));
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(decode_char_literal("'.'"), Some('.'));
        assert_eq!(decode_char_literal("'\\n'"), Some('\n'));
        assert_eq!(decode_char_literal("'ab'"), None);
    }

    #[test]
    fn test_not_a_literal() {
        assert_eq!(decode_string_literal("sqlId"), None);
    }
}
