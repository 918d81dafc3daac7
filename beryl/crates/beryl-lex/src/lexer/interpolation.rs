//! Interpolation sub-lexing.
//!
//! Double-quoted strings, shell strings, and regexps record their raw
//! contents during the main pass. This lexer breaks those contents apart:
//! plain chunks become `String` tokens and each `#{...}` becomes an
//! `EvaluateToStringBegin .. EvaluateToStringEnd` run holding the tokens of
//! the interpolated expression, produced by recursively lexing the text
//! between the braces.

use std::sync::Arc;

use crate::token::{Token, TokenKind};
use crate::Lexer;

/// Expands one interpolable token into its component tokens
pub struct InterpolatedStringLexer {
    input: String,
    file: Arc<str>,
    line: usize,
    column: usize,
    index: usize,
}

impl InterpolatedStringLexer {
    /// Create a sub-lexer over the raw contents of `token`
    pub fn new(token: &Token) -> Self {
        Self {
            input: token.literal_or_blank().to_string(),
            file: token.file().clone(),
            line: token.line(),
            column: token.column(),
            index: 0,
        }
    }

    /// Break the contents into raw chunks and interpolation runs
    ///
    /// A leading interpolation still produces an initial (empty) `String`
    /// token so downstream consumers always see string-shaped content
    /// first.
    pub fn tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut raw = String::new();
        while self.index < self.input.len() {
            let c = self.current_char();
            if c == '#' && self.peek() == '{' {
                if !raw.is_empty() || tokens.is_empty() {
                    tokens.push(self.string_token(std::mem::take(&mut raw)));
                }
                self.index += 2;
                self.tokenize_interpolation(&mut tokens);
            } else {
                raw.push(c);
                self.index += c.len_utf8();
            }
        }
        if !raw.is_empty() {
            tokens.push(self.string_token(raw));
        }
        tokens
    }

    fn tokenize_interpolation(&mut self, tokens: &mut Vec<Token>) {
        let start_index = self.index;
        let mut curly_brace_count = 1;
        while self.index < self.input.len() && curly_brace_count > 0 {
            let c = self.current_char();
            self.index += c.len_utf8();
            match c {
                '{' => curly_brace_count += 1,
                '}' => curly_brace_count -= 1,
                '\\' => {
                    let escaped = self.current_char();
                    if escaped != '\0' {
                        self.index += escaped.len_utf8();
                    }
                },
                _ => {},
            }
        }
        if curly_brace_count > 0 {
            // missing closing brace; surface the partial text as an
            // unterminated string rather than tearing the process down
            tokens.push(Token::with_literal(
                TokenKind::UnterminatedString,
                &self.input[start_index..],
                self.file.clone(),
                self.line,
                self.column,
            ));
            return;
        }

        // input = "#{:foo} bar"
        //                ^ index
        //           ^ start_index
        let part = &self.input[start_index..self.index - 1];
        let mut lexer = Lexer::new(part, self.file.clone());
        tokens.push(Token::new(
            TokenKind::EvaluateToStringBegin,
            self.file.clone(),
            self.line,
            self.column,
        ));
        for token in lexer.tokens() {
            if token.is_eof() {
                tokens.push(Token::new(
                    TokenKind::Eol,
                    self.file.clone(),
                    self.line,
                    self.column,
                ));
                break;
            }
            tokens.push(token);
        }
        tokens.push(Token::new(
            TokenKind::EvaluateToStringEnd,
            self.file.clone(),
            self.line,
            self.column,
        ));
    }

    fn string_token(&self, raw: String) -> Token {
        Token::with_literal(
            TokenKind::String,
            raw,
            self.file.clone(),
            self.line,
            self.column,
        )
    }

    fn current_char(&self) -> char {
        self.input[self.index..].chars().next().unwrap_or('\0')
    }

    fn peek(&self) -> char {
        let mut chars = self.input[self.index..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }
}
