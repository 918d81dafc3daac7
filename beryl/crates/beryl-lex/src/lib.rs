//! beryl-lex - Lexical analyzer for the Beryl language.
//!
//! The lexer is a single-pass, single-character-lookahead state machine over
//! the raw source text. Beryl's grammar makes a handful of token decisions
//! context sensitive, and all of that context lives here so the parser never
//! has to re-scan text:
//!
//! - `/` starts a regexp or divides, depending on the previous token and
//!   whether whitespace preceded it
//! - `<<` starts a heredoc when an identifier or quote follows (with `-` and
//!   `~` indentation modifiers), otherwise it is a left shift
//! - `[` records whether whitespace preceded it; the parser uses the flag to
//!   separate element reference from an array literal argument
//! - `+`/`-` directly before a digit produce a signed numeric literal, but
//!   only when the previous token cannot end an expression
//!
//! [`Lexer::next_token`] produces raw tokens one at a time.
//! [`Lexer::tokens`] additionally runs the post-lexical pass: comments are
//! dropped, newlines around continuation tokens collapse, semicolons become
//! end-of-line tokens, and interpolable literals (double-quoted strings,
//! shell strings, regexps) are expanded into `Begin .. End` runs with nested
//! sub-token sequences for each `#{...}` interpolation.

pub mod cursor;
pub mod token;

mod lexer;

#[cfg(test)]
mod edge_cases;

pub use lexer::{InterpolatedStringLexer, Lexer};
pub use token::{Token, TokenKind, TokenValue};
