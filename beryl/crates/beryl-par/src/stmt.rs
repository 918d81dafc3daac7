//! Control-flow parsing: conditionals, loops, case dispatch, begin/rescue,
//! and the jump keywords.

use beryl_lex::TokenKind;

use crate::ast::{Node, NodeKind};
use crate::expr::unwrap_block;
use crate::{Locals, ParseResult, Parser, Precedence};

const CASE_BODY_STOPS: &[TokenKind] = &[
    TokenKind::WhenKeyword,
    TokenKind::InKeyword,
    TokenKind::ElseKeyword,
    TokenKind::EndKeyword,
];

const BEGIN_BODY_STOPS: &[TokenKind] = &[
    TokenKind::RescueKeyword,
    TokenKind::ElseKeyword,
    TokenKind::EnsureKeyword,
    TokenKind::EndKeyword,
];

impl Parser {
    // ------------------------------------------------------------------
    // Conditionals
    // ------------------------------------------------------------------

    pub(crate) fn parse_if(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest, locals)?;
        self.accept_then()?;
        let true_body = self.parse_body(
            locals,
            Precedence::Lowest,
            &[
                TokenKind::ElsifKeyword,
                TokenKind::ElseKeyword,
                TokenKind::EndKeyword,
            ],
        )?;
        let false_expr = self.parse_if_rest(locals)?;
        Ok(Node::new(
            token,
            NodeKind::If {
                condition: Box::new(condition),
                true_expr: Box::new(unwrap_block(true_body)),
                false_expr: Box::new(false_expr),
            },
        ))
    }

    /// The `elsif`/`else`/`end` tail of an if expression
    fn parse_if_rest(&mut self, locals: &Locals) -> ParseResult<Node> {
        match self.current_kind() {
            TokenKind::ElsifKeyword => {
                let token = self.current_token().clone();
                self.advance();
                let condition = self.parse_expression(Precedence::Lowest, locals)?;
                self.accept_then()?;
                let true_body = self.parse_body(
                    locals,
                    Precedence::Lowest,
                    &[
                        TokenKind::ElsifKeyword,
                        TokenKind::ElseKeyword,
                        TokenKind::EndKeyword,
                    ],
                )?;
                let false_expr = self.parse_if_rest(locals)?;
                Ok(Node::new(
                    token,
                    NodeKind::If {
                        condition: Box::new(condition),
                        true_expr: Box::new(unwrap_block(true_body)),
                        false_expr: Box::new(false_expr),
                    },
                ))
            },
            TokenKind::ElseKeyword => {
                self.advance();
                let body = self.parse_body(locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
                self.expect(TokenKind::EndKeyword, "end")?;
                Ok(unwrap_block(body))
            },
            _ => {
                let token = self.expect(TokenKind::EndKeyword, "end")?;
                Ok(Node::new(token, NodeKind::NilSexp))
            },
        }
    }

    pub(crate) fn parse_unless(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest, locals)?;
        self.accept_then()?;
        let body = self.parse_body(
            locals,
            Precedence::Lowest,
            &[TokenKind::ElseKeyword, TokenKind::EndKeyword],
        )?;
        let else_expr = match self.current_kind() {
            TokenKind::ElseKeyword => {
                self.advance();
                let else_body =
                    self.parse_body(locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
                self.expect(TokenKind::EndKeyword, "end")?;
                unwrap_block(else_body)
            },
            _ => {
                let end = self.expect(TokenKind::EndKeyword, "end")?;
                Node::new(end, NodeKind::NilSexp)
            },
        };
        Ok(Node::new(
            token,
            NodeKind::If {
                condition: Box::new(condition),
                true_expr: Box::new(else_expr),
                false_expr: Box::new(unwrap_block(body)),
            },
        ))
    }

    /// Parse a `while`/`until` condition, where a `do` terminates the
    /// condition instead of opening a block
    fn parse_loop_condition(&mut self, locals: &Locals) -> ParseResult<Node> {
        let saved = self.set_no_do_block(true);
        let condition = self.parse_expression(Precedence::Lowest, locals);
        self.set_no_do_block(saved);
        condition
    }

    /// Consume a `then` (or nothing; the newline already separates)
    fn accept_then(&mut self) -> ParseResult<()> {
        if self.current_kind() == TokenKind::ThenKeyword {
            self.advance();
        }
        self.skip_newlines();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------

    pub(crate) fn parse_while(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let condition = self.parse_loop_condition(locals)?;
        if self.current_kind() == TokenKind::DoKeyword {
            self.advance();
        }
        self.skip_newlines();
        let body = self.parse_body(locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
        self.expect(TokenKind::EndKeyword, "end")?;
        let kind = match token.kind() {
            TokenKind::UntilKeyword => NodeKind::Until {
                condition: Box::new(condition),
                body: Box::new(body),
                pre: true,
            },
            _ => NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
                pre: true,
            },
        };
        Ok(Node::new(token, kind))
    }

    /// Trailing `if`/`unless`/`while`/`until`
    pub(crate) fn parse_modifier_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let condition = self.parse_expression(Precedence::ExprModifier, locals)?;
        // a modifier loop around a begin/end block runs the body first
        let pre = !matches!(left.kind(), NodeKind::Begin { .. });
        let kind = match token.kind() {
            TokenKind::IfKeyword => NodeKind::If {
                condition: Box::new(condition),
                true_expr: Box::new(left),
                false_expr: Box::new(Node::new(token.clone(), NodeKind::NilSexp)),
            },
            TokenKind::UnlessKeyword => NodeKind::If {
                condition: Box::new(condition),
                true_expr: Box::new(Node::new(token.clone(), NodeKind::NilSexp)),
                false_expr: Box::new(left),
            },
            TokenKind::WhileKeyword => NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(left),
                pre,
            },
            _ => NodeKind::Until {
                condition: Box::new(condition),
                body: Box::new(left),
                pre,
            },
        };
        Ok(Node::new(token, kind))
    }

    // ------------------------------------------------------------------
    // Case dispatch
    // ------------------------------------------------------------------

    pub(crate) fn parse_case(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let subject = match self.current_kind() {
            TokenKind::Eol | TokenKind::WhenKeyword | TokenKind::InKeyword => {
                Node::new(token.clone(), NodeKind::NilSexp)
            },
            _ => self.parse_expression(Precedence::Case, locals)?,
        };
        self.skip_newlines();

        let mut clauses = Vec::new();
        let mut else_body = None;
        loop {
            match self.current_kind() {
                TokenKind::WhenKeyword => {
                    let when_token = self.current_token().clone();
                    self.advance();
                    let mut conditions = Vec::new();
                    loop {
                        conditions.push(self.parse_expression(Precedence::Case, locals)?);
                        if self.current_kind() == TokenKind::Comma {
                            self.advance();
                            self.skip_newlines();
                        } else {
                            break;
                        }
                    }
                    self.accept_then()?;
                    let body = self.parse_body(locals, Precedence::Lowest, CASE_BODY_STOPS)?;
                    let condition =
                        Node::new(when_token.clone(), NodeKind::Array { nodes: conditions });
                    clauses.push(Node::new(
                        when_token,
                        NodeKind::CaseWhen {
                            condition: Box::new(condition),
                            body: Box::new(body),
                        },
                    ));
                },
                TokenKind::InKeyword => {
                    let in_token = self.current_token().clone();
                    self.advance();
                    let pattern = self.parse_case_in_pattern(locals)?;
                    self.accept_then()?;
                    let body = self.parse_body(locals, Precedence::Lowest, CASE_BODY_STOPS)?;
                    clauses.push(Node::new(
                        in_token,
                        NodeKind::CaseIn {
                            pattern: Box::new(pattern),
                            body: Box::new(body),
                        },
                    ));
                },
                TokenKind::ElseKeyword => {
                    self.advance();
                    let body =
                        self.parse_body(locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
                    else_body = Some(Box::new(body));
                },
                TokenKind::EndKeyword => {
                    self.advance();
                    break;
                },
                _ => return Err(self.unexpected("when, in, else, or end")),
            }
        }
        Ok(Node::new(
            token,
            NodeKind::Case {
                subject: Box::new(subject),
                clauses,
                else_body,
            },
        ))
    }

    // ------------------------------------------------------------------
    // begin/rescue/else/ensure
    // ------------------------------------------------------------------

    pub(crate) fn parse_begin(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let body = self.parse_body(locals, Precedence::Lowest, BEGIN_BODY_STOPS)?;

        let mut rescue_nodes = Vec::new();
        while self.current_kind() == TokenKind::RescueKeyword {
            rescue_nodes.push(self.parse_rescue_clause(locals)?);
        }

        let mut else_body = None;
        if self.current_kind() == TokenKind::ElseKeyword {
            self.advance();
            let body = self.parse_body(
                locals,
                Precedence::Lowest,
                &[TokenKind::EnsureKeyword, TokenKind::EndKeyword],
            )?;
            else_body = Some(Box::new(body));
        }

        let mut ensure_body = None;
        if self.current_kind() == TokenKind::EnsureKeyword {
            self.advance();
            let body = self.parse_body(locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
            ensure_body = Some(Box::new(body));
        }

        self.expect(TokenKind::EndKeyword, "end")?;
        Ok(Node::new(
            token,
            NodeKind::Begin {
                body: Box::new(body),
                rescue_nodes,
                else_body,
                ensure_body,
            },
        ))
    }

    fn parse_rescue_clause(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();

        let mut exceptions = Vec::new();
        while !matches!(
            self.current_kind(),
            TokenKind::Eol | TokenKind::HashRocket | TokenKind::ThenKeyword | TokenKind::Eof
        ) {
            exceptions.push(self.parse_expression(Precedence::CallArgs, locals)?);
            if self.current_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }

        let mut name = None;
        if self.current_kind() == TokenKind::HashRocket {
            self.advance();
            // the capture name is a binding, visible in the handler body
            let ident_token = self.expect(TokenKind::BareName, "exception variable")?;
            locals
                .borrow_mut()
                .insert(ident_token.literal_or_blank().to_string());
            name = Some(Box::new(Node::new(
                ident_token,
                NodeKind::Identifier { is_lvar: true },
            )));
        }

        self.accept_then()?;
        let body = self.parse_body(locals, Precedence::Lowest, BEGIN_BODY_STOPS)?;
        Ok(Node::new(
            token,
            NodeKind::BeginRescue {
                exceptions,
                name,
                body: Box::new(body),
            },
        ))
    }

    // ------------------------------------------------------------------
    // Jumps and friends
    // ------------------------------------------------------------------

    pub(crate) fn parse_break(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let arg = self.parse_optional_jump_arg(locals)?;
        Ok(Node::new(token, NodeKind::Break { arg }))
    }

    pub(crate) fn parse_next(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let arg = self.parse_optional_jump_arg(locals)?;
        Ok(Node::new(token, NodeKind::Next { arg }))
    }

    pub(crate) fn parse_return(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let value = self.parse_optional_jump_arg(locals)?;
        Ok(Node::new(token, NodeKind::Return { value }))
    }

    fn parse_optional_jump_arg(&mut self, locals: &Locals) -> ParseResult<Option<Box<Node>>> {
        if self.current_token().can_be_first_arg_of_implicit_call() {
            let arg = self.parse_expression(Precedence::CallArgs, locals)?;
            Ok(Some(Box::new(arg)))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn parse_yield(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let mut args = Vec::new();
        if self.current_kind() == TokenKind::LParen {
            self.advance();
            self.skip_newlines();
            if self.current_kind() != TokenKind::RParen {
                self.parse_call_args(&mut args, locals, TokenKind::RParen)?;
            }
            self.expect(TokenKind::RParen, ")")?;
        } else if self.current_token().can_be_first_arg_of_implicit_call() {
            self.parse_call_args(&mut args, locals, TokenKind::Eol)?;
        }
        Ok(Node::new(token, NodeKind::Yield { args }))
    }

    pub(crate) fn parse_super(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let mut args = Vec::new();
        let mut parens = false;
        if self.current_kind() == TokenKind::LParen {
            parens = true;
            self.advance();
            self.skip_newlines();
            if self.current_kind() != TokenKind::RParen {
                self.parse_call_args(&mut args, locals, TokenKind::RParen)?;
            }
            self.expect(TokenKind::RParen, ")")?;
        } else if self.current_token().can_be_first_arg_of_implicit_call() {
            self.parse_call_args(&mut args, locals, TokenKind::Eol)?;
        }
        Ok(Node::new(token, NodeKind::Super { args, parens }))
    }

    pub(crate) fn parse_defined(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let arg = if self.current_kind() == TokenKind::LParen {
            self.advance();
            let arg = self.parse_expression(Precedence::Lowest, locals)?;
            self.expect(TokenKind::RParen, ")")?;
            arg
        } else {
            self.parse_expression(Precedence::Unary, locals)?
        };
        Ok(Node::new(
            token,
            NodeKind::Defined {
                arg: Box::new(arg),
            },
        ))
    }
}
