//! Heredoc lexing.
//!
//! Heredocs are the one place the lexer leaves strict left-to-right order:
//! the tokens for the rest of the starting line must come out before the
//! body, which physically sits after the newline. The body is captured here
//! by scanning ahead without moving the cursor, emitted as a single string
//! token, and `index_after_heredoc` records where tokenization must resume
//! once the starting line's newline is reached.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lex a heredoc; the cursor sits just past `<<`, on `-`/`~`/the name
    ///
    /// `<<-NAME` allows the terminator to be indented. `<<~NAME` also
    /// dedents the body by the minimum indent of its non-blank lines.
    /// A quoted name selects the literal kind: `'NAME'` raw, `"NAME"`
    /// interpolable (the default), `` `NAME` `` shell.
    pub(crate) fn consume_heredoc(&mut self) -> Token {
        let mut with_dash = false;
        let mut should_dedent = false;
        match self.cursor.current_char() {
            '-' => {
                self.cursor.advance();
                with_dash = true;
            },
            '~' => {
                self.cursor.advance();
                with_dash = true;
                should_dedent = true;
            },
            _ => {},
        }

        let mut kind = TokenKind::DoubleQuotedString;
        let mut heredoc_name = String::new();
        let delimiter = match self.cursor.current_char() {
            '"' => Some('"'),
            '\'' => {
                kind = TokenKind::String;
                Some('\'')
            },
            '`' => {
                kind = TokenKind::Shell;
                Some('`')
            },
            _ => {
                let name = self.consume_word(TokenKind::BareName);
                heredoc_name = name.literal_or_blank().to_string();
                None
            },
        };

        if let Some(delimiter) = delimiter {
            self.cursor.advance();
            loop {
                match self.cursor.current_char() {
                    '\n' | '\r' | '\0' => {
                        return self.unterminated_string("heredoc identifier");
                    },
                    c if c == delimiter => break,
                    c => {
                        self.cursor.advance();
                        heredoc_name.push(c);
                    },
                }
            }
            self.cursor.advance();
        }

        let source = self.cursor.source();
        let mut index = self.cursor.position();

        // the body starts on the next line
        loop {
            match source[index..].chars().next() {
                None => return self.unterminated_string("heredoc"),
                Some('\n') => {
                    index += 1;
                    break;
                },
                Some(c) => index += c.len_utf8(),
            }
        }

        // consume until a line holds the terminator: at column zero for
        // `<<`, or after optional indentation for `<<-`/`<<~`
        let mut doc = String::new();
        loop {
            match source[index..].chars().next() {
                None => {
                    if is_terminated(with_dash, &doc, &heredoc_name) {
                        break;
                    }
                    return self.unterminated_string(doc);
                },
                Some(c) => {
                    index += c.len_utf8();
                    if c == '\n' && is_terminated(with_dash, &doc, &heredoc_name) {
                        break;
                    }
                    doc.push(c);
                },
            }
        }

        // chop the terminator and its indentation off the body
        doc.truncate(doc.len() - heredoc_name.len());
        while doc.ends_with(' ') || doc.ends_with('\t') {
            doc.pop();
        }

        if should_dedent {
            doc = dedent(&doc);
        }

        // keep tokenizing on the starting line; the next newline jumps here
        self.index_after_heredoc = self.index_after_heredoc.max(index);

        self.literal_token(kind, doc)
    }
}

/// True when the captured text ends in a line holding only the terminator
fn is_terminated(with_dash: bool, doc: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if !doc.ends_with(name) {
        return false;
    }
    let line_start = doc.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let last_line = &doc[line_start..];
    if with_dash {
        last_line.trim_start_matches([' ', '\t']) == name
    } else {
        last_line == name
    }
}

/// Strip the minimum indent of non-blank lines from every line
fn dedent(doc: &str) -> String {
    let min_indent = doc
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').count())
        .min()
        .unwrap_or(0);
    if min_indent == 0 {
        return doc.to_string();
    }
    let mut out = String::with_capacity(doc.len());
    for line in doc.split_inclusive('\n') {
        let body = line.trim_end_matches('\n');
        // blank lines may be shorter than the indent; skip() just empties them
        let stripped: String = body.chars().skip(min_indent).collect();
        out.push_str(&stripped);
        if line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{dedent, is_terminated};

    #[test]
    fn test_is_terminated_plain() {
        assert!(is_terminated(false, "hello\nEOF", "EOF"));
        assert!(!is_terminated(false, "hello\n  EOF", "EOF"));
        assert!(!is_terminated(false, "hello EOF", "EOF"));
        assert!(is_terminated(false, "EOF", "EOF"));
    }

    #[test]
    fn test_is_terminated_with_dash() {
        assert!(is_terminated(true, "hello\n  EOF", "EOF"));
        assert!(is_terminated(true, "hello\nEOF", "EOF"));
        assert!(!is_terminated(true, "hello\n  xEOF", "EOF"));
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("  a\n    b\n"), "a\n  b\n");
        assert_eq!(dedent("a\n  b\n"), "a\n  b\n");
        assert_eq!(dedent("    a\n\n    b\n"), "a\n\nb\n");
    }
}
