//! String, percent-literal, word-array, and regexp lexing.
//!
//! Single-quoted strings recognize only `\\` and `\'` as escapes. The
//! double-quoted family translates `\n` and `\t` and passes every other
//! escaped character through verbatim; interpolation is not resolved here -
//! the raw contents are recorded and the post-lexical pass expands them.

use beryl_util::diagnostic::{Diagnostic, E_LEX_UNTERMINATED_REGEXP, E_LEX_UNTERMINATED_STRING};

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lex the body of a double-quoted (interpolable) string; the cursor is
    /// past the opening delimiter
    pub(crate) fn consume_double_quoted_string(&mut self, delimiter: char) -> Token {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();
        while c != '\0' {
            if c == '\\' {
                self.cursor.advance();
                c = self.cursor.current_char();
                match c {
                    'n' => buf.push('\n'),
                    't' => buf.push('\t'),
                    _ => buf.push(c),
                }
            } else if c == delimiter {
                self.cursor.advance();
                return self.literal_token(TokenKind::DoubleQuotedString, buf);
            } else {
                buf.push(c);
            }
            self.cursor.advance();
            c = self.cursor.current_char();
        }
        self.unterminated_string(buf)
    }

    /// Lex the body of a single-quoted (raw) string
    pub(crate) fn consume_single_quoted_string(&mut self, delimiter: char) -> Token {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();
        while c != '\0' {
            if c == '\\' {
                self.cursor.advance();
                c = self.cursor.current_char();
                if c == '\\' || c == delimiter {
                    buf.push(c);
                } else {
                    buf.push('\\');
                    buf.push(c);
                }
            } else if c == delimiter {
                self.cursor.advance();
                return self.literal_token(TokenKind::String, buf);
            } else {
                buf.push(c);
            }
            self.cursor.advance();
            c = self.cursor.current_char();
        }
        self.unterminated_string(buf)
    }

    /// Lex a regexp body, keeping escapes verbatim except for the delimiter,
    /// then collect trailing options (`imxo`)
    pub(crate) fn consume_regexp(&mut self, delimiter: char) -> Token {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();
        while c != '\0' {
            if c == '\\' {
                self.cursor.advance();
                c = self.cursor.current_char();
                if c == delimiter {
                    buf.push(c);
                } else {
                    buf.push('\\');
                    buf.push(c);
                }
            } else if c == delimiter {
                self.cursor.advance();
                let mut options = String::new();
                loop {
                    c = self.cursor.current_char();
                    if matches!(c, 'i' | 'm' | 'x' | 'o') {
                        options.push(c);
                        self.cursor.advance();
                    } else {
                        break;
                    }
                }
                let mut token = self.literal_token(TokenKind::Regexp, buf);
                if !options.is_empty() {
                    token.set_options(options);
                }
                return token;
            } else {
                buf.push(c);
            }
            self.cursor.advance();
            c = self.cursor.current_char();
        }
        self.handler.emit(
            Diagnostic::error("unterminated regexp", self.current_span())
                .with_code(E_LEX_UNTERMINATED_REGEXP),
        );
        self.literal_token(TokenKind::UnterminatedRegexp, buf)
    }

    /// Lex a `%w`/`%W`/`%i`/`%I` word array into a single space-separated
    /// payload; runs of whitespace (including newlines) collapse to one
    /// separator
    pub(crate) fn consume_quoted_array(&mut self, delimiter: char, kind: TokenKind) -> Token {
        let mut buf = String::new();
        let mut seen_space = false;
        let mut seen_start = false;
        loop {
            let c = self.cursor.current_char();
            if c == '\0' {
                return self.unterminated_string(buf);
            }
            if c == delimiter {
                self.cursor.advance();
                break;
            }
            match c {
                ' ' | '\t' | '\n' => {
                    if !seen_space && seen_start {
                        buf.push(' ');
                    }
                    seen_space = true;
                },
                _ => {
                    buf.push(c);
                    seen_space = false;
                    seen_start = true;
                },
            }
            self.cursor.advance();
        }
        if buf.ends_with(' ') {
            buf.pop();
        }
        self.literal_token(kind, buf)
    }

    /// Dispatch for `%`: modulus, `%=`, or a percent literal
    pub(crate) fn lex_percent(&mut self) -> Token {
        self.cursor.advance();
        match self.cursor.current_char() {
            '=' => {
                self.cursor.advance();
                self.token(TokenKind::ModulusEqual)
            },
            '/' | '|' => {
                let delimiter = self.cursor.current_char();
                self.cursor.advance();
                self.consume_single_quoted_string(delimiter)
            },
            '[' => {
                self.cursor.advance();
                self.consume_single_quoted_string(']')
            },
            '{' => {
                self.cursor.advance();
                self.consume_single_quoted_string('}')
            },
            '(' => {
                self.cursor.advance();
                self.consume_single_quoted_string(')')
            },
            'q' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_single_quoted_string(delimiter),
                None => self.token(TokenKind::Modulus),
            },
            'Q' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_double_quoted_string(delimiter),
                None => self.token(TokenKind::Modulus),
            },
            'r' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_regexp(delimiter),
                None => self.token(TokenKind::Modulus),
            },
            'x' => match self.percent_delimiter() {
                Some(delimiter) => {
                    let mut token = self.consume_double_quoted_string(delimiter);
                    if token.kind() == TokenKind::DoubleQuotedString {
                        token.set_kind(TokenKind::Shell);
                    }
                    token
                },
                None => self.token(TokenKind::Modulus),
            },
            'w' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_quoted_array(delimiter, TokenKind::PercentLowerW),
                None => self.token(TokenKind::Modulus),
            },
            'W' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_quoted_array(delimiter, TokenKind::PercentUpperW),
                None => self.token(TokenKind::Modulus),
            },
            'i' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_quoted_array(delimiter, TokenKind::PercentLowerI),
                None => self.token(TokenKind::Modulus),
            },
            'I' => match self.percent_delimiter() {
                Some(delimiter) => self.consume_quoted_array(delimiter, TokenKind::PercentUpperI),
                None => self.token(TokenKind::Modulus),
            },
            _ => self.token(TokenKind::Modulus),
        }
    }

    /// Consume the `%<letter><open>` prefix if the peeked character is a
    /// recognized delimiter, returning the matching closing delimiter
    fn percent_delimiter(&mut self) -> Option<char> {
        let close = match self.cursor.peek() {
            '/' => '/',
            '|' => '|',
            '[' => ']',
            '{' => '}',
            '(' => ')',
            _ => return None,
        };
        self.cursor.advance_by(2);
        Some(close)
    }

    pub(crate) fn unterminated_string(&mut self, partial: impl Into<String>) -> Token {
        self.handler.emit(
            Diagnostic::error("unterminated string", self.current_span())
                .with_code(E_LEX_UNTERMINATED_STRING),
        );
        self.literal_token(TokenKind::UnterminatedString, partial)
    }
}
