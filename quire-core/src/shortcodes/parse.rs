//! Tag scanning and argument parsing for `{% ... %}` shortcodes.

use super::{ShortcodeCall, ShortcodeError};

/// A `{% name args %}` tag found at the start of some text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTag<'a> {
    /// Byte length of the whole tag including delimiters
    pub len: usize,
    pub name: &'a str,
    pub args: &'a str,
}

/// Scan the tag opening `text`, which must start with `{%`.
///
/// Quoted strings may contain `%}`. Returns `None` when the tag never closes.
pub(crate) fn scan_tag(text: &str) -> Option<RawTag<'_>> {
    debug_assert!(text.starts_with("{%"));
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 2;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if b == b'%' && bytes.get(i + 1) == Some(&b'}') {
                    let inner = text[2..i].trim_start_matches('-').trim_end_matches('-').trim();
                    let (name, args) = match inner.find(char::is_whitespace) {
                        Some(split) => (&inner[..split], inner[split..].trim()),
                        None => (inner, ""),
                    };
                    return Some(RawTag {
                        len: i + 2,
                        name,
                        args,
                    });
                }
            }
        }
        i += 1;
    }
    None
}

/// Locate the end tag matching an opened paired shortcode `name`.
///
/// Returns the byte offset where the body ends and the length of the end
/// tag. Nested tags of the same name are balanced.
pub(crate) fn find_end(text: &str, name: &str) -> Option<(usize, usize)> {
    let end_name = format!("end{}", name);
    let mut depth = 0usize;
    let mut offset = 0;

    while let Some(found) = text[offset..].find("{%") {
        let start = offset + found;
        let Some(tag) = scan_tag(&text[start..]) else {
            offset = start + 2;
            continue;
        };
        if tag.name == name {
            depth += 1;
        } else if tag.name == end_name {
            if depth == 0 {
                return Some((start, tag.len));
            }
            depth -= 1;
        }
        offset = start + tag.len;
    }
    None
}

/// Split shortcode arguments into positional values and `key=value` pairs.
///
/// Values are double- or single-quoted strings (backslash escapes the next
/// character) or bare words. Commas between arguments are optional.
pub(crate) fn parse_call(name: &str, args: &str) -> Result<ShortcodeCall, ShortcodeError> {
    let mut call = ShortcodeCall::new(name);
    let mut chars = args.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let Some(&c) = chars.peek() else {
            break;
        };

        if c == '"' || c == '\'' {
            chars.next();
            call.args.push(quoted(&mut chars, c)?);
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == ',' || c == '=' {
                break;
            }
            word.push(c);
            chars.next();
        }

        if chars.peek() == Some(&'=') {
            chars.next();
            let value = match chars.peek() {
                Some(&q) if q == '"' || q == '\'' => {
                    chars.next();
                    quoted(&mut chars, q)?
                }
                _ => {
                    let mut value = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_whitespace() || c == ',' {
                            break;
                        }
                        value.push(c);
                        chars.next();
                    }
                    value
                }
            };
            if word.is_empty() {
                return Err(ShortcodeError::Parse(format!(
                    "missing name before '=' in `{}`",
                    args
                )));
            }
            call.kwargs.insert(word, value);
        } else {
            call.args.push(word);
        }
    }

    Ok(call)
}

fn quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
) -> Result<String, ShortcodeError> {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => value.push(next),
                None => break,
            },
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(ShortcodeError::Parse(format!(
        "unterminated string starting with {}{}",
        quote, value
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_simple_tag() {
        let tag = scan_tag(r#"{% math "x^2" %} tail"#).unwrap();
        assert_eq!(tag.name, "math");
        assert_eq!(tag.args, r#""x^2""#);
        assert_eq!(tag.len, 16);
    }

    #[test]
    fn quoted_close_delimiter_does_not_end_tag() {
        let text = r#"{% code "txt" "50%} off" %}"#;
        let tag = scan_tag(text).unwrap();
        assert_eq!(tag.len, text.len());
        assert_eq!(tag.args, r#""txt" "50%} off""#);
    }

    #[test]
    fn whitespace_control_markers_are_ignored() {
        let tag = scan_tag("{%- footnote -%}").unwrap();
        assert_eq!(tag.name, "footnote");
        assert_eq!(tag.args, "");
    }

    #[test]
    fn unclosed_tag() {
        assert_eq!(scan_tag("{% math \"x\""), None);
    }

    #[test]
    fn finds_balanced_end() {
        let body = "a {% footnote %}b{% endfootnote %} c{% endfootnote %} rest";
        let (end, len) = find_end(body, "footnote").unwrap();
        assert_eq!(&body[..end], "a {% footnote %}b{% endfootnote %} c");
        assert_eq!(len, "{% endfootnote %}".len());
        assert_eq!(find_end("no end here", "footnote"), None);
    }

    #[test]
    fn parses_positional_and_keyword_args() {
        let call = parse_call(
            "slider",
            r#""lr" min=0 max='1' step="any", value=0.5 ticks"#,
        )
        .unwrap();
        assert_eq!(call.args, vec!["lr", "ticks"]);
        assert_eq!(call.kwarg("min"), Some("0"));
        assert_eq!(call.kwarg("max"), Some("1"));
        assert_eq!(call.kwarg("step"), Some("any"));
        assert_eq!(call.kwarg("value"), Some("0.5"));
    }

    #[test]
    fn parses_escapes_and_commas() {
        let call = parse_call("code", r#""js", "const s = \"hi\";""#).unwrap();
        assert_eq!(call.args, vec!["js", r#"const s = "hi";"#]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(parse_call("cite", r#""smith"#).is_err());
        assert!(parse_call("slider", "=3").is_err());
    }
}
