//! Identifier, keyword, symbol, and global-variable lexing.

use crate::token::{Token, TokenKind};
use crate::Lexer;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    /// Lex a keyword, bare name, or constant starting at the current char
    ///
    /// Keywords are matched longest-first where prefixes overlap (`defined?`
    /// before `def`, `elsif` before `else` is irrelevant but kept in the
    /// original's order for easy diffing).
    pub(crate) fn lex_word(&mut self) -> Token {
        macro_rules! keyword {
            ($word:literal, $kind:ident) => {
                if self.cursor.match_keyword($word) {
                    return self.token(TokenKind::$kind);
                }
            };
        }

        keyword!("__ENCODING__", EncodingKeyword);
        keyword!("__LINE__", LineKeyword);
        keyword!("__FILE__", FileKeyword);
        keyword!("BEGIN", UpperBegin);
        keyword!("END", UpperEnd);
        keyword!("alias", AliasKeyword);
        keyword!("and", AndKeyword);
        keyword!("begin", BeginKeyword);
        keyword!("break", BreakKeyword);
        keyword!("case", CaseKeyword);
        keyword!("class", ClassKeyword);
        keyword!("defined?", DefinedKeyword);
        keyword!("def", DefKeyword);
        keyword!("do", DoKeyword);
        keyword!("else", ElseKeyword);
        keyword!("elsif", ElsifKeyword);
        keyword!("end", EndKeyword);
        keyword!("ensure", EnsureKeyword);
        keyword!("false", FalseKeyword);
        keyword!("for", ForKeyword);
        keyword!("if", IfKeyword);
        keyword!("in", InKeyword);
        keyword!("module", ModuleKeyword);
        keyword!("next", NextKeyword);
        keyword!("nil", NilKeyword);
        keyword!("not", NotKeyword);
        keyword!("or", OrKeyword);
        keyword!("redo", RedoKeyword);
        keyword!("rescue", RescueKeyword);
        keyword!("retry", RetryKeyword);
        keyword!("return", ReturnKeyword);
        keyword!("self", SelfKeyword);
        keyword!("super", SuperKeyword);
        keyword!("then", ThenKeyword);
        keyword!("true", TrueKeyword);
        keyword!("undef", UndefKeyword);
        keyword!("unless", UnlessKeyword);
        keyword!("until", UntilKeyword);
        keyword!("when", WhenKeyword);
        keyword!("while", WhileKeyword);
        keyword!("yield", YieldKeyword);

        let c = self.cursor.current_char();
        if c.is_ascii_lowercase() || c == '_' {
            self.consume_bare_name()
        } else if c.is_ascii_uppercase() {
            self.consume_constant()
        } else {
            let buf = self.consume_non_whitespace();
            self.literal_token(TokenKind::Invalid, buf)
        }
    }

    /// Consume an identifier-shaped word with an optional `?`/`!` suffix
    pub(crate) fn consume_word(&mut self, kind: TokenKind) -> Token {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();
        loop {
            buf.push(c);
            self.cursor.advance();
            c = self.cursor.current_char();
            if !is_identifier_char(c) {
                break;
            }
        }
        if c == '?' || c == '!' {
            self.cursor.advance();
            buf.push(c);
        }
        self.literal_token(kind, buf)
    }

    /// A lowercase-leading name; `name:` (not `name::`) becomes a symbol key
    pub(crate) fn consume_bare_name(&mut self) -> Token {
        let mut token = self.consume_word(TokenKind::BareName);
        if self.cursor.current_char() == ':' && self.cursor.peek() != ':' {
            self.cursor.advance();
            token.set_kind(TokenKind::SymbolKey);
        }
        token
    }

    /// An uppercase-leading name; `Name:` (not `Name::`) becomes a symbol key
    pub(crate) fn consume_constant(&mut self) -> Token {
        let mut token = self.consume_word(TokenKind::Constant);
        if self.cursor.current_char() == ':' && self.cursor.peek() != ':' {
            self.cursor.advance();
            token.set_kind(TokenKind::SymbolKey);
        }
        token
    }

    /// `$name`, plus the special one-character globals `$?`, `$!`, `$=`
    pub(crate) fn consume_global_variable(&mut self) -> Token {
        match self.cursor.peek() {
            '?' | '!' | '=' => {
                self.cursor.advance();
                let mut buf = String::from("$");
                buf.push(self.cursor.current_char());
                self.cursor.advance();
                self.literal_token(TokenKind::GlobalVariable, buf)
            },
            _ => self.consume_word(TokenKind::GlobalVariable),
        }
    }

    /// The body of a `:symbol` (cursor is past the colon)
    ///
    /// Accepts ivar/cvar/gvar shapes, a handful of operator names, and
    /// plain words with `?`/`!`/`=` suffixes. `:[]` and `:[]=` are the
    /// element accessor symbols.
    pub(crate) fn consume_symbol(&mut self) -> Token {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();

        macro_rules! gobble {
            () => {{
                buf.push(c);
                self.cursor.advance();
                c = self.cursor.current_char();
            }};
        }

        match c {
            '@' => {
                gobble!();
                if c == '@' {
                    gobble!();
                }
                while is_identifier_char(c) {
                    gobble!();
                }
            },
            '$' => {
                gobble!();
                while is_identifier_char(c) {
                    gobble!();
                }
            },
            '+' | '-' | '/' | '%' | '<' | '>' | '!' | '~' | '&' | '|' | '^' => {
                gobble!();
                match (buf.as_str(), c) {
                    ("<", '<') | (">", '>') | ("<", '=') | (">", '=') | ("!", '=') | ("!", '~') => {
                        gobble!();
                        if buf == "<=" && c == '>' {
                            gobble!();
                        }
                    },
                    _ => {},
                }
            },
            '*' => {
                gobble!();
                if c == '*' {
                    gobble!();
                }
            },
            '=' => {
                gobble!();
                if c == '=' {
                    gobble!();
                    if c == '=' {
                        gobble!();
                    }
                } else if c == '~' {
                    gobble!();
                }
            },
            '[' => {
                if self.cursor.peek() == ']' {
                    gobble!();
                    gobble!();
                    if c == '=' {
                        gobble!();
                    }
                } else {
                    return self.token(TokenKind::TernaryColon);
                }
            },
            _ => {
                loop {
                    gobble!();
                    if !is_identifier_char(c) {
                        break;
                    }
                }
                if c == '?' || c == '!' || c == '=' {
                    gobble!();
                }
            },
        }
        let _ = c;
        self.literal_token(TokenKind::Symbol, buf)
    }

    /// Capture a run of non-whitespace for an invalid-token payload
    pub(crate) fn consume_non_whitespace(&mut self) -> String {
        let mut buf = String::new();
        let mut c = self.cursor.current_char();
        loop {
            buf.push(c);
            self.cursor.advance();
            c = self.cursor.current_char();
            if c == '\0' || c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                break;
            }
        }
        buf
    }
}
