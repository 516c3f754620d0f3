//! Comment stripping ahead of directive extraction
//!
//! Runs before the directive extractor so that keywords inside `//` line
//! comments or `/* */` block comments are never treated as statements.
//! Quoted regions are left untouched, including escaped quotes.

/// Remove comments from a template body. Pure function, no directive
/// knowledge.
pub fn strip_comments(input: &str) -> String {
    enum State {
        Code,
        SingleQuote,
        DoubleQuote,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '\'' => {
                    out.push(c);
                    state = State::SingleQuote;
                }
                '"' => {
                    out.push(c);
                    state = State::DoubleQuote;
                }
                _ => out.push(c),
            },
            State::SingleQuote => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '\'' => state = State::Code,
                    _ => {}
                }
            }
            State::DoubleQuote => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' => state = State::Code,
                    _ => {}
                }
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment_removed_to_newline() {
        assert_eq!(strip_comments("hello // comment\nworld"), "hello \nworld");
    }

    #[test]
    fn test_block_comment_removed() {
        assert_eq!(strip_comments("a /* gone */ b"), "a  b");
    }

    #[test]
    fn test_multiline_block_comment() {
        assert_eq!(strip_comments("a /* line\nline */ b"), "a  b");
    }

    #[test]
    fn test_comment_markers_inside_quotes_kept() {
        assert_eq!(strip_comments(r#"say "not // a comment""#), r#"say "not // a comment""#);
        assert_eq!(strip_comments("say 'not /* a */ comment'"), "say 'not /* a */ comment'");
    }

    #[test]
    fn test_escaped_quote_does_not_close_string() {
        assert_eq!(strip_comments(r#""a\"b // c""#), r#""a\"b // c""#);
    }

    #[test]
    fn test_directive_in_comment_is_stripped() {
        let stripped = strip_comments("body\n// include secret\nend");
        assert!(!stripped.contains("include"));
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_comments("a /* open"), "a ");
    }

    #[test]
    fn test_plain_slash_kept() {
        assert_eq!(strip_comments("a / b"), "a / b");
    }
}
