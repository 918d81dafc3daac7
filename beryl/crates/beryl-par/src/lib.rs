//! beryl-par - Pratt parser for the Beryl language.
//!
//! The parser pulls tokens one at a time from the post-processed stream and
//! climbs precedence: every token kind maps to at most one null-denotation
//! function (when it starts an expression) and at most one left-denotation
//! function (when it continues one), selected in [`Parser::null_denotation`]
//! and [`Parser::left_denotation`].
//!
//! Two pieces of context feed the dispatch beyond the token itself:
//!
//! - each lexical scope carries the set of names that have been assigned in
//!   it, so a bare identifier parses as a local-variable reference or a
//!   zero-argument method call depending on what came before (`def` bodies
//!   start a fresh set; blocks share their enclosing scope's set);
//! - a `[` after an expression is element reference or the start of an
//!   array-literal argument depending on the whitespace flag the lexer
//!   recorded and whether the receiver is a known local.
//!
//! Errors are fatal: the first unexpected token stops the parse with a
//! [`SyntaxError`] naming the file, line, and offending lexeme.

mod ast;
mod sexp;

mod expr;
mod items;
mod pattern;
mod stmt;

#[cfg(test)]
mod edge_cases;

pub use ast::{Node, NodeKind};
pub use sexp::{Sexp, SexpList};

use std::cell::RefCell;
use std::rc::Rc;

use beryl_lex::{Lexer, Token, TokenKind};
use beryl_util::FxHashSet;
use thiserror::Error;

/// A fatal parse error
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{file}#{line}: syntax error, {message}\n> {excerpt}")]
pub struct SyntaxError {
    /// File label of the offending token
    pub file: String,
    /// 1-based line of the offending token
    pub line: usize,
    /// What went wrong, including the offending lexeme
    pub message: String,
    /// The source line the error sits on
    pub excerpt: String,
}

/// Result type for parse operations
pub type ParseResult<T> = Result<T, Box<SyntaxError>>;

/// The set of local-variable names known in one lexical scope
///
/// Shared (`Rc`) because blocks reuse their enclosing scope's set while
/// method bodies start fresh.
pub type Locals = Rc<RefCell<FxHashSet<String>>>;

fn new_scope() -> Locals {
    Rc::new(RefCell::new(FxHashSet::default()))
}

/// Operator precedence, low to high
///
/// The discriminant order is the climbing order; assignment is made
/// right-associative by `higher_precedence`'s same-level exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[allow(clippy::upper_case_acronyms)]
pub enum Precedence {
    Lowest,
    /// `[` array literal
    Array,
    /// `{` hash literal
    Hash,
    /// trailing `if`/`unless`/`while`/`until`
    ExprModifier,
    /// `case`/`when`/`else`
    Case,
    /// `*args`
    Splat,
    /// `foo a, b`
    CallArgs,
    /// `and`/`or`
    Composition,
    /// `=`
    Assignment,
    /// `+=` and friends
    OpAssignment,
    /// `..` and `...`
    Range,
    /// `? :`
    Ternary,
    /// `do ... end` and `{ ... }` blocks
    Iter,
    /// `not`
    LogicalNot,
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `<=>` `==` `===` `!=` `=~` `!~`
    Equality,
    /// `<=` `<` `>` `>=`
    LessGreater,
    /// `^` `|`
    BitwiseOr,
    /// `&`
    BitwiseAnd,
    /// `<<` `>>`
    BitwiseShift,
    /// `def foo(a, b)` and `{ |a, b| ... }`
    DefArgs,
    /// `+` `-`
    Sum,
    /// `*` `/` `%`
    Product,
    /// signed literals
    Prefix,
    /// `::`
    ConstantResolution,
    /// `!` `~` unary `+` `-`
    Unary,
    /// `**`
    Exponent,
    /// `.` and `&.`
    Dot,
    /// `foo(...)`
    Call,
    /// `foo[...]`
    Ref,
}

type NullFn = fn(&mut Parser, &Locals) -> ParseResult<Node>;
type LeftFn = fn(&mut Parser, Node, &Locals) -> ParseResult<Node>;

/// Pratt parser over the post-processed token stream
pub struct Parser {
    code: String,
    file: String,
    tokens: Vec<Token>,
    index: usize,
    /// Inside a `while`/`until` condition a `do` closes the condition
    /// instead of opening a block
    no_do_block: bool,
}

impl Parser {
    /// Create a parser for `code` labelled `file`
    pub fn new(code: impl Into<String>, file: impl Into<String>) -> Self {
        let code = code.into();
        let file = file.into();
        let tokens = Lexer::new(&code, file.as_str()).tokens();
        Self {
            code,
            file,
            tokens,
            index: 0,
            no_do_block: false,
        }
    }

    /// Parse the whole input, returning the root block node
    pub fn tree(&mut self) -> ParseResult<Node> {
        let locals = new_scope();
        self.parse_body(&locals, Precedence::Lowest, &[TokenKind::Eof])
    }

    /// Parse the whole input and serialize it
    pub fn sexp(&mut self) -> ParseResult<Sexp> {
        Ok(self.tree()?.to_sexp())
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    pub(crate) fn current_token(&self) -> &Token {
        self.tokens
            .get(self.index)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always ends in EOF"))
    }

    pub(crate) fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.index + 1)
    }

    pub(crate) fn token_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    pub(crate) fn advance(&mut self) {
        self.index += 1;
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current_token().kind()
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.current_kind() == TokenKind::Eol {
            self.advance();
        }
    }

    /// After a statement: require an expression terminator, then skip past
    /// newlines to the next statement
    pub(crate) fn next_expression(&mut self) -> ParseResult<()> {
        if !self.current_token().is_end_of_expression() {
            return Err(self.unexpected("end-of-line"));
        }
        self.skip_newlines();
        Ok(())
    }

    /// Consume a token of the given kind or fail
    pub(crate) fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.current_kind() != kind {
            return Err(self.unexpected(expected));
        }
        let token = self.current_token().clone();
        self.advance();
        Ok(token)
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    pub(crate) fn unexpected(&self, expected: &str) -> Box<SyntaxError> {
        let token = self.current_token();
        let message = match token.kind() {
            TokenKind::UnterminatedString => {
                format!("unterminated string \"{}\"", token.literal_or_blank())
            },
            TokenKind::UnterminatedRegexp => {
                format!("unterminated regexp /{}", token.literal_or_blank())
            },
            TokenKind::Invalid => {
                format!("invalid character '{}'", token.literal_or_blank())
            },
            TokenKind::Eof => format!("unexpected end-of-input (expected: '{}')", expected),
            _ => format!(
                "unexpected {} '{}' (expected: '{}')",
                token.type_value(),
                token.display_value(),
                expected
            ),
        };
        self.error_at(token.line(), message)
    }

    pub(crate) fn error_at(&self, line: usize, message: String) -> Box<SyntaxError> {
        let excerpt = self
            .code
            .lines()
            .nth(line)
            .unwrap_or("")
            .trim_end()
            .to_string();
        Box::new(SyntaxError {
            file: self.file.clone(),
            line: line + 1,
            message,
            excerpt,
        })
    }

    // ------------------------------------------------------------------
    // Precedence
    // ------------------------------------------------------------------

    pub(crate) fn get_precedence(&self, left: Option<&Node>) -> Precedence {
        let token = self.current_token();
        match token.kind() {
            TokenKind::Plus | TokenKind::Minus => return Precedence::Sum,
            TokenKind::Integer | TokenKind::Float => {
                if token.has_sign() {
                    return Precedence::Sum;
                }
            },
            TokenKind::Equal => return Precedence::Assignment,
            TokenKind::AndEqual
            | TokenKind::BitwiseAndEqual
            | TokenKind::BitwiseOrEqual
            | TokenKind::BitwiseXorEqual
            | TokenKind::DivideEqual
            | TokenKind::ExponentEqual
            | TokenKind::LeftShiftEqual
            | TokenKind::MinusEqual
            | TokenKind::ModulusEqual
            | TokenKind::MultiplyEqual
            | TokenKind::OrEqual
            | TokenKind::PlusEqual
            | TokenKind::RightShiftEqual => return Precedence::OpAssignment,
            TokenKind::BitwiseAnd => return Precedence::BitwiseAnd,
            TokenKind::BitwiseOr | TokenKind::BitwiseXor => return Precedence::BitwiseOr,
            TokenKind::LeftShift | TokenKind::RightShift => return Precedence::BitwiseShift,
            TokenKind::LParen => return Precedence::Call,
            TokenKind::AndKeyword | TokenKind::OrKeyword => return Precedence::Composition,
            TokenKind::ConstantResolution => return Precedence::ConstantResolution,
            TokenKind::Dot | TokenKind::SafeNavigation => return Precedence::Dot,
            TokenKind::EqualEqual
            | TokenKind::EqualEqualEqual
            | TokenKind::NotEqual
            | TokenKind::Comparison
            | TokenKind::Match
            | TokenKind::NotMatch => return Precedence::Equality,
            TokenKind::Exponent => return Precedence::Exponent,
            TokenKind::IfKeyword
            | TokenKind::UnlessKeyword
            | TokenKind::WhileKeyword
            | TokenKind::UntilKeyword => return Precedence::ExprModifier,
            TokenKind::DoKeyword | TokenKind::LCurlyBrace => return Precedence::Iter,
            TokenKind::LessThan
            | TokenKind::LessThanOrEqual
            | TokenKind::GreaterThan
            | TokenKind::GreaterThanOrEqual => return Precedence::LessGreater,
            TokenKind::And => return Precedence::LogicalAnd,
            TokenKind::NotKeyword => return Precedence::LogicalNot,
            TokenKind::Or => return Precedence::LogicalOr,
            TokenKind::Divide | TokenKind::Modulus | TokenKind::Multiply => {
                return Precedence::Product
            },
            TokenKind::DotDot | TokenKind::DotDotDot => return Precedence::Range,
            TokenKind::LBracket => {
                if let Some(left) = left {
                    if self.treat_left_bracket_as_element_reference(left, token) {
                        return Precedence::Ref;
                    }
                }
            },
            TokenKind::TernaryQuestion | TokenKind::TernaryColon => return Precedence::Ternary,
            TokenKind::Not => return Precedence::Unary,
            TokenKind::RescueKeyword => return Precedence::Lowest,
            _ => {},
        }
        if let Some(left) = left {
            if self.is_first_arg_of_call_without_parens(left) {
                return Precedence::Call;
            }
        }
        Precedence::Lowest
    }

    fn higher_precedence(&self, left: &Node, current_precedence: Precedence) -> bool {
        let next_precedence = self.get_precedence(Some(left));
        // trick to make chained assignment right-to-left
        if current_precedence == Precedence::Assignment
            && next_precedence == Precedence::Assignment
        {
            return true;
        }
        next_precedence > current_precedence
    }

    pub(crate) fn treat_left_bracket_as_element_reference(
        &self,
        left: &Node,
        token: &Token,
    ) -> bool {
        !token.whitespace_precedes() || left.is_lvar()
    }

    pub(crate) fn is_first_arg_of_call_without_parens(&self, left: &Node) -> bool {
        left.is_callable() && self.current_token().can_be_first_arg_of_implicit_call()
    }

    /// Swap the `do`-suppression flag, returning the previous state
    pub(crate) fn set_no_do_block(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.no_do_block, value)
    }

    // ------------------------------------------------------------------
    // Pratt core
    // ------------------------------------------------------------------

    pub(crate) fn parse_expression(
        &mut self,
        precedence: Precedence,
        locals: &Locals,
    ) -> ParseResult<Node> {
        self.skip_newlines();

        let null_fn = match self.null_denotation(self.current_kind(), precedence) {
            Some(null_fn) => null_fn,
            None => return Err(self.unexpected("expression")),
        };
        let mut left = null_fn(self, locals)?;

        while self.current_token().is_valid() && self.higher_precedence(&left, precedence) {
            let left_fn = match self.left_denotation(&left) {
                Some(left_fn) => left_fn,
                None => break,
            };
            left = left_fn(self, left, locals)?;
        }
        Ok(left)
    }

    /// Parse statements until one of `stop` token kinds, producing a Block
    pub(crate) fn parse_body(
        &mut self,
        locals: &Locals,
        precedence: Precedence,
        stop: &[TokenKind],
    ) -> ParseResult<Node> {
        let start = self.current_token().clone();
        let mut nodes = Vec::new();
        loop {
            self.skip_newlines();
            if stop.contains(&self.current_kind()) {
                break;
            }
            if self.current_kind() == TokenKind::Eof {
                if stop.contains(&TokenKind::Eof) {
                    break;
                }
                return Err(self.unexpected("end"));
            }
            let node = self.parse_expression(precedence, locals)?;
            nodes.push(node);
            if stop.contains(&self.current_kind()) {
                break;
            }
            self.next_expression()?;
        }
        Ok(Node::new(start, NodeKind::Block { nodes }))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn null_denotation(&self, kind: TokenKind, precedence: Precedence) -> Option<NullFn> {
        match kind {
            TokenKind::AliasKeyword => Some(Self::parse_alias),
            TokenKind::Arrow => Some(Self::parse_stabby_proc),
            TokenKind::BareName | TokenKind::Constant => {
                if precedence == Precedence::Lowest && self.masgn_ahead() {
                    Some(Self::parse_multiple_assignment_targets)
                } else {
                    Some(Self::parse_identifier)
                }
            },
            TokenKind::ClassVariable | TokenKind::InstanceVariable | TokenKind::GlobalVariable => {
                Some(Self::parse_identifier)
            },
            TokenKind::BeginKeyword => Some(Self::parse_begin),
            TokenKind::BreakKeyword => Some(Self::parse_break),
            TokenKind::CaseKeyword => Some(Self::parse_case),
            TokenKind::ClassKeyword => Some(Self::parse_class),
            TokenKind::DefKeyword => Some(Self::parse_def),
            TokenKind::DefinedKeyword => Some(Self::parse_defined),
            TokenKind::DotDot | TokenKind::DotDotDot => Some(Self::parse_beginless_range),
            TokenKind::EncodingKeyword => Some(Self::parse_encoding_constant),
            TokenKind::FalseKeyword => Some(Self::parse_false),
            TokenKind::FileKeyword => Some(Self::parse_file_constant),
            TokenKind::Float | TokenKind::Integer => Some(Self::parse_lit),
            TokenKind::IfKeyword => Some(Self::parse_if),
            TokenKind::InterpolatedRegexpBegin => Some(Self::parse_interpolated_regexp),
            TokenKind::InterpolatedShellBegin => Some(Self::parse_interpolated_shell),
            TokenKind::InterpolatedStringBegin => Some(Self::parse_interpolated_string),
            TokenKind::LBracket | TokenKind::LBracketRBracket => Some(Self::parse_array),
            TokenKind::LCurlyBrace => Some(Self::parse_hash),
            TokenKind::LineKeyword => Some(Self::parse_line_constant),
            TokenKind::LParen => Some(Self::parse_group),
            TokenKind::Minus | TokenKind::Plus | TokenKind::Complement => {
                Some(Self::parse_unary)
            },
            TokenKind::ModuleKeyword => Some(Self::parse_module),
            TokenKind::Multiply => {
                if precedence == Precedence::Lowest && self.masgn_ahead() {
                    Some(Self::parse_multiple_assignment_targets)
                } else {
                    Some(Self::parse_splat)
                }
            },
            TokenKind::Exponent => Some(Self::parse_keyword_splat),
            TokenKind::BitwiseAnd => Some(Self::parse_block_pass),
            TokenKind::NextKeyword => Some(Self::parse_next),
            TokenKind::NilKeyword => Some(Self::parse_nil),
            TokenKind::Not | TokenKind::NotKeyword => Some(Self::parse_not),
            TokenKind::PercentLowerI | TokenKind::PercentUpperI => {
                Some(Self::parse_word_symbol_array)
            },
            TokenKind::PercentLowerW | TokenKind::PercentUpperW => Some(Self::parse_word_array),
            TokenKind::ReturnKeyword => Some(Self::parse_return),
            TokenKind::SelfKeyword => Some(Self::parse_self),
            TokenKind::String => Some(Self::parse_string),
            TokenKind::SuperKeyword => Some(Self::parse_super),
            TokenKind::Symbol => Some(Self::parse_symbol),
            TokenKind::SymbolKey => Some(Self::parse_keyword_args),
            TokenKind::TrueKeyword => Some(Self::parse_true),
            TokenKind::UndefKeyword => Some(Self::parse_undef),
            TokenKind::UnlessKeyword => Some(Self::parse_unless),
            TokenKind::UntilKeyword | TokenKind::WhileKeyword => Some(Self::parse_while),
            TokenKind::YieldKeyword => Some(Self::parse_yield),
            TokenKind::ConstantResolution => Some(Self::parse_top_level_constant),
            _ => None,
        }
    }

    fn left_denotation(&self, left: &Node) -> Option<LeftFn> {
        let token = self.current_token();
        match token.kind() {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Multiply
            | TokenKind::Divide
            | TokenKind::Modulus
            | TokenKind::Exponent
            | TokenKind::EqualEqual
            | TokenKind::EqualEqualEqual
            | TokenKind::NotEqual
            | TokenKind::Comparison
            | TokenKind::LessThan
            | TokenKind::LessThanOrEqual
            | TokenKind::GreaterThan
            | TokenKind::GreaterThanOrEqual
            | TokenKind::BitwiseAnd
            | TokenKind::BitwiseOr
            | TokenKind::BitwiseXor
            | TokenKind::LeftShift
            | TokenKind::RightShift => Some(Self::parse_infix_expression),
            TokenKind::And | TokenKind::Or | TokenKind::AndKeyword | TokenKind::OrKeyword => {
                Some(Self::parse_logical_expression)
            },
            TokenKind::Equal => Some(Self::parse_assignment_expression),
            TokenKind::AndEqual | TokenKind::OrEqual => Some(Self::parse_op_assign_expression),
            TokenKind::BitwiseAndEqual
            | TokenKind::BitwiseOrEqual
            | TokenKind::BitwiseXorEqual
            | TokenKind::DivideEqual
            | TokenKind::ExponentEqual
            | TokenKind::LeftShiftEqual
            | TokenKind::MinusEqual
            | TokenKind::ModulusEqual
            | TokenKind::MultiplyEqual
            | TokenKind::PlusEqual
            | TokenKind::RightShiftEqual => Some(Self::parse_op_assign_expression),
            TokenKind::LParen if left.is_callable() => {
                Some(Self::parse_call_expression_with_parens)
            },
            TokenKind::ConstantResolution => Some(Self::parse_constant_resolution_expression),
            TokenKind::Dot => Some(Self::parse_send_expression),
            TokenKind::SafeNavigation => Some(Self::parse_safe_send_expression),
            TokenKind::DoKeyword if self.no_do_block => None,
            TokenKind::DoKeyword | TokenKind::LCurlyBrace => Some(Self::parse_iter_expression),
            TokenKind::DotDot | TokenKind::DotDotDot => Some(Self::parse_range_expression),
            TokenKind::TernaryQuestion => Some(Self::parse_ternary_expression),
            TokenKind::Match => Some(Self::parse_match_expression),
            TokenKind::NotMatch => Some(Self::parse_not_match_expression),
            TokenKind::LBracket
                if self.treat_left_bracket_as_element_reference(left, token) =>
            {
                Some(Self::parse_ref_expression)
            },
            TokenKind::IfKeyword
            | TokenKind::UnlessKeyword
            | TokenKind::WhileKeyword
            | TokenKind::UntilKeyword => Some(Self::parse_modifier_expression),
            _ => {
                if self.is_first_arg_of_call_without_parens(left) {
                    Some(Self::parse_call_expression_without_parens)
                } else {
                    None
                }
            },
        }
    }

    /// Is the token run ahead of us a multiple-assignment left-hand side
    /// (`a, b = ...`, `a, *b = ...`, `*a, b = ...`)?
    fn masgn_ahead(&self) -> bool {
        let mut offset = 0;
        let mut seen_comma = false;
        loop {
            let token = match self.token_at(offset) {
                Some(token) => token,
                None => return false,
            };
            match token.kind() {
                TokenKind::BareName
                | TokenKind::Constant
                | TokenKind::InstanceVariable
                | TokenKind::ClassVariable
                | TokenKind::GlobalVariable
                | TokenKind::Multiply => offset += 1,
                TokenKind::Comma => {
                    seen_comma = true;
                    offset += 1;
                },
                TokenKind::Equal => return seen_comma,
                _ => return false,
            }
        }
    }
}
