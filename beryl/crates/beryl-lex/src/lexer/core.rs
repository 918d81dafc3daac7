//! Core lexer implementation.
//!
//! The dispatch in `build_next_token` is a direct-coded state machine: one
//! big match on the current character, with single-character lookahead for
//! compound operators. Context sensitivity comes from three pieces of state:
//! the previously emitted token's kind, the whitespace flag set while
//! skipping, and the heredoc resume index.

use std::sync::Arc;

use beryl_util::diagnostic::{Diagnostic, Handler, E_LEX_INVALID_NUMBER};
use beryl_util::span::Span;

use crate::cursor::Cursor;
use crate::lexer::interpolation::InterpolatedStringLexer;
use crate::token::{Token, TokenKind};

/// Lexer for Beryl source text
pub struct Lexer<'a> {
    /// Character cursor over the source
    pub(crate) cursor: Cursor<'a>,

    /// File label attached to every token
    pub(crate) file: Arc<str>,

    /// Diagnostics recorded while lexing (recoverable problems; the token
    /// stream still carries dedicated invalid tokens)
    pub(crate) handler: Handler,

    /// If nonzero, the byte index to jump to at the next newline (set when a
    /// heredoc body was consumed out-of-band)
    pub(crate) index_after_heredoc: usize,

    /// Line where the current token starts (0-based)
    pub(crate) token_line: usize,

    /// Column where the current token starts (0-based)
    pub(crate) token_column: usize,

    /// Whether whitespace was skipped directly before the current token
    pub(crate) whitespace_precedes: bool,

    /// Kind of the previously produced token
    pub(crate) last_kind: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`, labelling tokens with `file`
    pub fn new(source: &'a str, file: impl Into<Arc<str>>) -> Self {
        Self {
            cursor: Cursor::new(source),
            file: file.into(),
            handler: Handler::new(),
            index_after_heredoc: 0,
            token_line: 0,
            token_column: 0,
            whitespace_precedes: false,
            last_kind: None,
        }
    }

    /// Diagnostics recorded so far
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Produce the next raw token
    pub fn next_token(&mut self) -> Token {
        self.whitespace_precedes = self.skip_whitespace();
        self.token_line = self.cursor.line();
        self.token_column = self.cursor.column();
        let mut token = self.build_next_token();
        token.set_whitespace_precedes(self.whitespace_precedes);
        self.last_kind = Some(token.kind());
        token
    }

    /// Produce the full post-processed token stream
    ///
    /// This runs the three post-lexical transforms on top of `next_token`:
    /// comments are dropped (along with newlines adjacent to continuation
    /// tokens), semicolons become end-of-line tokens, and interpolable
    /// literals are expanded into `Begin .. End` runs.
    pub fn tokens(&mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut skip_next_newline = false;
        loop {
            let mut token = self.next_token();
            if token.is_comment() {
                continue;
            }

            // get rid of newlines after certain tokens
            if skip_next_newline {
                if token.is_newline() {
                    continue;
                }
                skip_next_newline = false;
            }

            // get rid of newlines before certain tokens
            while token.can_follow_collapsible_newline()
                && tokens.last().is_some_and(|t| t.is_newline())
            {
                tokens.pop();
            }

            // convert semicolons to eol tokens
            if token.is_semicolon() {
                token = Token::new(
                    TokenKind::Eol,
                    token.file().clone(),
                    token.line(),
                    token.column(),
                );
            }

            // break apart interpolations in double-quoted strings, shell
            // strings, and regexps
            if token.can_have_interpolation() {
                self.expand_interpolation(&mut tokens, token);
                continue;
            }

            let is_eof = token.is_eof();
            let is_valid = token.is_valid();
            let precedes = token.can_precede_collapsible_newline();
            tokens.push(token);
            if is_eof || !is_valid {
                return tokens;
            }
            if precedes {
                skip_next_newline = true;
            }
        }
    }

    fn expand_interpolation(&mut self, tokens: &mut Vec<Token>, token: Token) {
        let (begin_kind, end_kind) = match token.kind() {
            TokenKind::Shell => (
                TokenKind::InterpolatedShellBegin,
                TokenKind::InterpolatedShellEnd,
            ),
            TokenKind::Regexp => (
                TokenKind::InterpolatedRegexpBegin,
                TokenKind::InterpolatedRegexpEnd,
            ),
            _ => (
                TokenKind::InterpolatedStringBegin,
                TokenKind::InterpolatedStringEnd,
            ),
        };
        tokens.push(Token::new(
            begin_kind,
            token.file().clone(),
            token.line(),
            token.column(),
        ));
        let string_lexer = InterpolatedStringLexer::new(&token);
        tokens.extend(string_lexer.tokens());
        let mut end_token = Token::new(
            end_kind,
            token.file().clone(),
            token.line(),
            token.column(),
        );
        if let Some(options) = token.options() {
            end_token.set_options(options);
        }
        tokens.push(end_token);
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut whitespace_found = false;
        while self.cursor.current_char() == ' ' || self.cursor.current_char() == '\t' {
            whitespace_found = true;
            self.cursor.advance();
        }
        whitespace_found
    }

    // ------------------------------------------------------------------
    // Token construction helpers
    // ------------------------------------------------------------------

    pub(crate) fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.file.clone(), self.token_line, self.token_column)
    }

    pub(crate) fn literal_token(&self, kind: TokenKind, literal: impl Into<String>) -> Token {
        Token::with_literal(
            kind,
            literal,
            self.file.clone(),
            self.token_line,
            self.token_column,
        )
    }

    /// An invalid token located at the *cursor* (not the token start), which
    /// is where the offending character physically sits
    pub(crate) fn invalid_token(&self, literal: impl Into<String>) -> Token {
        Token::with_literal(
            TokenKind::Invalid,
            literal,
            self.file.clone(),
            self.cursor.line(),
            self.cursor.column(),
        )
    }

    pub(crate) fn current_span(&self) -> Span {
        Span::new(
            self.cursor.position(),
            self.cursor.position(),
            self.cursor.line(),
            self.cursor.column(),
        )
    }

    /// Did the previous token end an expression? Decides whether `+`/`-`
    /// before a digit is a sign or an operator.
    fn after_expression(&self) -> bool {
        self.last_kind.is_some_and(|kind| kind.can_end_expression())
    }

    fn build_next_token(&mut self) -> Token {
        if self.cursor.is_at_end() {
            return self.token(TokenKind::Eof);
        }
        match self.cursor.current_char() {
            '=' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '=' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '=' => {
                                self.cursor.advance();
                                self.token(TokenKind::EqualEqualEqual)
                            },
                            _ => self.token(TokenKind::EqualEqual),
                        }
                    },
                    '>' => {
                        self.cursor.advance();
                        self.token(TokenKind::HashRocket)
                    },
                    '~' => {
                        self.cursor.advance();
                        self.token(TokenKind::Match)
                    },
                    _ => self.token(TokenKind::Equal),
                }
            },
            '+' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::PlusEqual)
                    },
                    c if c.is_ascii_digit() && !self.after_expression() => {
                        let mut token = self.consume_numeric(false);
                        if self.cursor.current_char().is_ascii_alphabetic() {
                            return self.invalid_number();
                        }
                        token.set_has_sign(true);
                        token
                    },
                    _ => self.token(TokenKind::Plus),
                }
            },
            '-' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '>' => {
                        self.cursor.advance();
                        self.token(TokenKind::Arrow)
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::MinusEqual)
                    },
                    c if c.is_ascii_digit() && !self.after_expression() => {
                        let mut token = self.consume_numeric(true);
                        if self.cursor.current_char().is_ascii_alphabetic() {
                            return self.invalid_number();
                        }
                        token.set_has_sign(true);
                        token
                    },
                    _ => self.token(TokenKind::Minus),
                }
            },
            '*' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '*' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '=' => {
                                self.cursor.advance();
                                self.token(TokenKind::ExponentEqual)
                            },
                            _ => self.token(TokenKind::Exponent),
                        }
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::MultiplyEqual)
                    },
                    _ => self.token(TokenKind::Multiply),
                }
            },
            '/' => self.lex_slash(),
            '%' => self.lex_percent(),
            '!' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::NotEqual)
                    },
                    '~' => {
                        self.cursor.advance();
                        self.token(TokenKind::NotMatch)
                    },
                    _ => self.token(TokenKind::Not),
                }
            },
            '<' => self.lex_less_than(),
            '>' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '>' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '=' => {
                                self.cursor.advance();
                                self.token(TokenKind::RightShiftEqual)
                            },
                            _ => self.token(TokenKind::RightShift),
                        }
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::GreaterThanOrEqual)
                    },
                    _ => self.token(TokenKind::GreaterThan),
                }
            },
            '&' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '&' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '=' => {
                                self.cursor.advance();
                                self.token(TokenKind::AndEqual)
                            },
                            _ => self.token(TokenKind::And),
                        }
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::BitwiseAndEqual)
                    },
                    '.' => {
                        self.cursor.advance();
                        self.token(TokenKind::SafeNavigation)
                    },
                    _ => self.token(TokenKind::BitwiseAnd),
                }
            },
            '|' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '|' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '=' => {
                                self.cursor.advance();
                                self.token(TokenKind::OrEqual)
                            },
                            _ => self.token(TokenKind::Or),
                        }
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::BitwiseOrEqual)
                    },
                    _ => self.token(TokenKind::BitwiseOr),
                }
            },
            '^' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::BitwiseXorEqual)
                    },
                    _ => self.token(TokenKind::BitwiseXor),
                }
            },
            '~' => {
                self.cursor.advance();
                self.token(TokenKind::Complement)
            },
            '?' => {
                self.cursor.advance();
                self.token(TokenKind::TernaryQuestion)
            },
            ':' => self.lex_colon(),
            '@' => {
                if self.cursor.peek() == '@' {
                    // skip the first '@' so consume_word picks up "@name",
                    // then put it back on the front
                    self.cursor.advance();
                    let mut token = self.consume_word(TokenKind::ClassVariable);
                    token.set_literal(format!("@{}", token.literal_or_blank()));
                    token
                } else {
                    self.consume_word(TokenKind::InstanceVariable)
                }
            },
            '$' => self.consume_global_variable(),
            '.' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '.' => {
                        self.cursor.advance();
                        match self.cursor.current_char() {
                            '.' => {
                                self.cursor.advance();
                                self.token(TokenKind::DotDotDot)
                            },
                            _ => self.token(TokenKind::DotDot),
                        }
                    },
                    _ => self.token(TokenKind::Dot),
                }
            },
            '{' => {
                self.cursor.advance();
                self.token(TokenKind::LCurlyBrace)
            },
            '[' => {
                self.cursor.advance();
                if self.cursor.current_char() == ']' {
                    self.cursor.advance();
                    if self.cursor.current_char() == '=' {
                        self.cursor.advance();
                        self.token(TokenKind::LBracketRBracketEqual)
                    } else {
                        let mut token = self.token(TokenKind::LBracketRBracket);
                        token.set_whitespace_precedes(self.whitespace_precedes);
                        token
                    }
                } else {
                    let mut token = self.token(TokenKind::LBracket);
                    token.set_whitespace_precedes(self.whitespace_precedes);
                    token
                }
            },
            '(' => {
                self.cursor.advance();
                self.token(TokenKind::LParen)
            },
            '}' => {
                self.cursor.advance();
                self.token(TokenKind::RCurlyBrace)
            },
            ']' => {
                self.cursor.advance();
                self.token(TokenKind::RBracket)
            },
            ')' => {
                self.cursor.advance();
                self.token(TokenKind::RParen)
            },
            '\n' => {
                self.cursor.advance();
                let token = self.token(TokenKind::Eol);
                // resume past any heredoc body consumed on this line
                if self.cursor.position() < self.index_after_heredoc {
                    let target = self.index_after_heredoc;
                    self.cursor.advance_to(target);
                }
                token
            },
            ';' => {
                self.cursor.advance();
                self.token(TokenKind::Semicolon)
            },
            ',' => {
                self.cursor.advance();
                self.token(TokenKind::Comma)
            },
            '"' => {
                self.cursor.advance();
                self.consume_double_quoted_string('"')
            },
            '\'' => {
                self.cursor.advance();
                self.consume_single_quoted_string('\'')
            },
            '`' => {
                self.cursor.advance();
                let mut token = self.consume_double_quoted_string('`');
                if token.kind() == TokenKind::DoubleQuotedString {
                    token.set_kind(TokenKind::Shell);
                }
                token
            },
            '#' => {
                loop {
                    self.cursor.advance();
                    let c = self.cursor.current_char();
                    if c == '\0' || c == '\n' || c == '\r' {
                        break;
                    }
                }
                self.token(TokenKind::Comment)
            },
            c if c.is_ascii_digit() => {
                let token = self.consume_numeric(false);
                if self.cursor.current_char().is_ascii_alphabetic() {
                    return self.invalid_number();
                }
                token
            },
            _ => self.lex_word(),
        }
    }

    fn lex_slash(&mut self) -> Token {
        self.cursor.advance();
        let last_kind = match self.last_kind {
            None => return self.consume_regexp('/'),
            Some(kind) => kind,
        };
        match last_kind {
            TokenKind::Comma
            | TokenKind::LBracket
            | TokenKind::LCurlyBrace
            | TokenKind::LParen
            | TokenKind::Match => self.consume_regexp('/'),
            TokenKind::DefKeyword => self.token(TokenKind::Divide),
            _ => match self.cursor.current_char() {
                ' ' => self.token(TokenKind::Divide),
                '=' => {
                    self.cursor.advance();
                    self.token(TokenKind::DivideEqual)
                },
                _ => {
                    if self.whitespace_precedes {
                        self.consume_regexp('/')
                    } else {
                        self.token(TokenKind::Divide)
                    }
                },
            },
        }
    }

    fn lex_less_than(&mut self) -> Token {
        self.cursor.advance();
        match self.cursor.current_char() {
            '<' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '~' | '-' => {
                        let next = self.cursor.peek();
                        if next.is_ascii_alphabetic()
                            || matches!(next, '_' | '"' | '`' | '\'')
                        {
                            self.consume_heredoc()
                        } else {
                            self.token(TokenKind::LeftShift)
                        }
                    },
                    '=' => {
                        self.cursor.advance();
                        self.token(TokenKind::LeftShiftEqual)
                    },
                    c => {
                        if c.is_ascii_alphabetic() || matches!(c, '_' | '"' | '`' | '\'') {
                            self.consume_heredoc()
                        } else {
                            self.token(TokenKind::LeftShift)
                        }
                    },
                }
            },
            '=' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '>' => {
                        self.cursor.advance();
                        self.token(TokenKind::Comparison)
                    },
                    _ => self.token(TokenKind::LessThanOrEqual),
                }
            },
            _ => self.token(TokenKind::LessThan),
        }
    }

    fn lex_colon(&mut self) -> Token {
        self.cursor.advance();
        let c = self.cursor.current_char();
        if c == ':' {
            self.cursor.advance();
            self.token(TokenKind::ConstantResolution)
        } else if c == '"' {
            self.cursor.advance();
            let string = self.consume_double_quoted_string('"');
            self.literal_token(TokenKind::Symbol, string.literal_or_blank())
        } else if c == '\'' {
            self.cursor.advance();
            let string = self.consume_single_quoted_string('\'');
            self.literal_token(TokenKind::Symbol, string.literal_or_blank())
        } else if c.is_whitespace() || c == '\0' {
            self.token(TokenKind::TernaryColon)
        } else {
            self.consume_symbol()
        }
    }

    fn invalid_number(&mut self) -> Token {
        let c = self.cursor.current_char();
        self.handler.emit(
            Diagnostic::error(
                format!("numeric literal followed by '{}'", c),
                self.current_span(),
            )
            .with_code(E_LEX_INVALID_NUMBER),
        );
        self.invalid_token(c.to_string())
    }
}
