//! Pattern parsing for `case ... in` clauses.
//!
//! Patterns reify to dedicated node variants: array patterns, hash
//! patterns, and pins. A bare lowercase name in pattern position is a
//! binding and registers a local, the same way an assignment would.

use beryl_lex::TokenKind;

use crate::ast::{Node, NodeKind};
use crate::{Locals, ParseResult, Parser, Precedence};

impl Parser {
    /// The pattern between `in` and `then`/newline
    pub(crate) fn parse_case_in_pattern(&mut self, locals: &Locals) -> ParseResult<Node> {
        let first = self.parse_pattern_element(locals)?;

        // a bare comma list is an array pattern without brackets
        if self.current_kind() != TokenKind::Comma {
            return Ok(first);
        }
        let token = first.token().clone();
        let mut nodes = vec![first];
        while self.current_kind() == TokenKind::Comma {
            self.advance();
            self.skip_newlines();
            nodes.push(self.parse_pattern_element(locals)?);
        }
        Ok(Node::new(token, NodeKind::ArrayPattern { nodes }))
    }

    fn parse_pattern_element(&mut self, locals: &Locals) -> ParseResult<Node> {
        match self.current_kind() {
            TokenKind::LBracket => self.parse_array_pattern(locals),
            TokenKind::LCurlyBrace => self.parse_hash_pattern(locals),
            TokenKind::BitwiseXor => self.parse_pin(locals),
            TokenKind::BareName => Ok(self.parse_pattern_binding(locals)),
            TokenKind::Multiply => {
                let token = self.current_token().clone();
                self.advance();
                let node = if self.current_kind() == TokenKind::BareName {
                    Some(Box::new(self.parse_pattern_binding(locals)))
                } else {
                    None
                };
                Ok(Node::new(token, NodeKind::Splat { node }))
            },
            _ => self.parse_expression(Precedence::CallArgs, locals),
        }
    }

    fn parse_array_pattern(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        self.skip_newlines();
        let mut nodes = Vec::new();
        while self.current_kind() != TokenKind::RBracket {
            nodes.push(self.parse_pattern_element(locals)?);
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "]")?;
        Ok(Node::new(token, NodeKind::ArrayPattern { nodes }))
    }

    fn parse_hash_pattern(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        self.skip_newlines();
        let mut nodes = Vec::new();
        while self.current_kind() != TokenKind::RCurlyBrace {
            let key_token = self.expect(TokenKind::SymbolKey, "key:")?;
            let name = key_token.literal_or_blank().to_string();
            nodes.push(Node::new(key_token.clone(), NodeKind::Symbol(name.clone())));

            if matches!(
                self.current_kind(),
                TokenKind::Comma | TokenKind::RCurlyBrace
            ) {
                // `{name:}` binds the key's value to a local of that name
                locals.borrow_mut().insert(name);
                nodes.push(Node::new(key_token, NodeKind::NilSexp));
            } else {
                nodes.push(self.parse_pattern_element(locals)?);
            }

            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RCurlyBrace, "}")?;
        Ok(Node::new(token, NodeKind::HashPattern { nodes }))
    }

    /// A bare name in pattern position binds the matched value, like the
    /// left-hand side of an assignment
    fn parse_pattern_binding(&mut self, locals: &Locals) -> Node {
        let token = self.current_token().clone();
        self.advance();
        locals
            .borrow_mut()
            .insert(token.literal_or_blank().to_string());
        Node::new(token, NodeKind::Identifier { is_lvar: true })
    }

    /// `^expr` pins the current value of a variable instead of binding
    fn parse_pin(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let identifier = match self.current_kind() {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest, locals)?;
                self.expect(TokenKind::RParen, ")")?;
                expr
            },
            _ => self.parse_identifier(locals)?,
        };
        Ok(Node::new(
            token,
            NodeKind::Pin {
                identifier: Box::new(identifier),
            },
        ))
    }
}
