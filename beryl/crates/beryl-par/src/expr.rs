//! Expression parsing: atoms, literals, collections, and the left
//! denotations (infix operators, calls, assignment, ranges, ternary).

use beryl_lex::{Token, TokenKind};

use crate::ast::{Node, NodeKind};
use crate::{Locals, ParseResult, Parser, Precedence};

impl Parser {
    // ------------------------------------------------------------------
    // Atoms and literals
    // ------------------------------------------------------------------

    pub(crate) fn parse_identifier(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        if token.kind() == TokenKind::Constant {
            return Ok(Node::new(token, NodeKind::Constant));
        }
        let is_lvar = token.kind() == TokenKind::BareName
            && locals.borrow().contains(token.literal_or_blank());
        Ok(Node::new(token, NodeKind::Identifier { is_lvar }))
    }

    pub(crate) fn parse_lit(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let kind = match token.kind() {
            TokenKind::Float => NodeKind::Float(token.float()),
            _ => NodeKind::Integer(token.integer()),
        };
        Ok(Node::new(token, kind))
    }

    pub(crate) fn parse_string(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let value = token.literal_or_blank().to_string();
        Ok(Node::new(token, NodeKind::String(value)))
    }

    pub(crate) fn parse_symbol(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let name = token.literal_or_blank().to_string();
        Ok(Node::new(token, NodeKind::Symbol(name)))
    }

    pub(crate) fn parse_nil(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        Ok(Node::new(token, NodeKind::Nil))
    }

    pub(crate) fn parse_true(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        Ok(Node::new(token, NodeKind::True))
    }

    pub(crate) fn parse_false(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        Ok(Node::new(token, NodeKind::False))
    }

    pub(crate) fn parse_self(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        Ok(Node::new(token, NodeKind::SelfNode))
    }

    pub(crate) fn parse_file_constant(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let file = token.file().to_string();
        Ok(Node::new(token, NodeKind::String(file)))
    }

    pub(crate) fn parse_line_constant(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let line = token.line() as i64 + 1;
        Ok(Node::new(token, NodeKind::Integer(line)))
    }

    pub(crate) fn parse_encoding_constant(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        Ok(Node::new(token, NodeKind::String("UTF-8".to_string())))
    }

    pub(crate) fn parse_top_level_constant(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let name_token = self.expect(TokenKind::Constant, "constant")?;
        let name = name_token.literal_or_blank().to_string();
        Ok(Node::new(token, NodeKind::Colon3 { name }))
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    pub(crate) fn parse_array(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        if token.kind() == TokenKind::LBracketRBracket {
            self.advance();
            return Ok(Node::new(token, NodeKind::Array { nodes: vec![] }));
        }
        self.advance();
        let mut nodes = Vec::new();
        self.skip_newlines();
        while self.current_kind() != TokenKind::RBracket {
            nodes.push(self.parse_expression(Precedence::Array, locals)?);
            self.skip_newlines();
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "]")?;
        Ok(Node::new(token, NodeKind::Array { nodes }))
    }

    pub(crate) fn parse_hash(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let mut nodes = Vec::new();
        self.skip_newlines();
        while self.current_kind() != TokenKind::RCurlyBrace {
            if self.current_kind() == TokenKind::SymbolKey {
                let key_token = self.current_token().clone();
                self.advance();
                let name = key_token.literal_or_blank().to_string();
                nodes.push(Node::new(key_token, NodeKind::Symbol(name)));
            } else {
                nodes.push(self.parse_expression(Precedence::Hash, locals)?);
                self.expect(TokenKind::HashRocket, "=>")?;
            }
            nodes.push(self.parse_expression(Precedence::Hash, locals)?);
            self.skip_newlines();
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RCurlyBrace, "}")?;
        Ok(Node::new(token, NodeKind::Hash { nodes }))
    }

    pub(crate) fn parse_group(&mut self, locals: &Locals) -> ParseResult<Node> {
        self.advance();
        // parens re-enable `do` blocks even inside a loop condition
        let saved = self.set_no_do_block(false);
        let expr = self.parse_expression(Precedence::Lowest, locals);
        self.set_no_do_block(saved);
        let expr = expr?;
        self.skip_newlines();
        self.expect(TokenKind::RParen, ")")?;
        Ok(expr)
    }

    pub(crate) fn parse_word_array(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let nodes = token
            .literal_or_blank()
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| Node::new(token.clone(), NodeKind::String(word.to_string())))
            .collect();
        Ok(Node::new(token, NodeKind::Array { nodes }))
    }

    pub(crate) fn parse_word_symbol_array(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let nodes = token
            .literal_or_blank()
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| Node::new(token.clone(), NodeKind::Symbol(word.to_string())))
            .collect();
        Ok(Node::new(token, NodeKind::Array { nodes }))
    }

    // ------------------------------------------------------------------
    // Splats, block pass, keyword args
    // ------------------------------------------------------------------

    pub(crate) fn parse_splat(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        if self.current_token().can_be_first_arg_of_implicit_call() {
            let node = self.parse_expression(Precedence::Splat, locals)?;
            Ok(Node::new(
                token,
                NodeKind::Splat {
                    node: Some(Box::new(node)),
                },
            ))
        } else {
            Ok(Node::new(token, NodeKind::Splat { node: None }))
        }
    }

    pub(crate) fn parse_keyword_splat(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let node = self.parse_expression(Precedence::Splat, locals)?;
        Ok(Node::new(
            token,
            NodeKind::KeywordSplat {
                node: Some(Box::new(node)),
            },
        ))
    }

    pub(crate) fn parse_block_pass(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let node = self.parse_expression(Precedence::Splat, locals)?;
        Ok(Node::new(
            token,
            NodeKind::BlockPass {
                node: Box::new(node),
            },
        ))
    }

    /// A run of bare keyword arguments (`a: 1, b: 2, **rest`) reified as a
    /// braceless hash
    pub(crate) fn parse_keyword_args(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let mut nodes = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::SymbolKey => {
                    let key_token = self.current_token().clone();
                    self.advance();
                    let name = key_token.literal_or_blank().to_string();
                    nodes.push(Node::new(key_token, NodeKind::Symbol(name)));
                    nodes.push(self.parse_expression(Precedence::CallArgs, locals)?);
                },
                TokenKind::Exponent => {
                    nodes.push(self.parse_keyword_splat(locals)?);
                },
                _ => break,
            }
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        Ok(Node::new(token, NodeKind::Hash { nodes }))
    }

    // ------------------------------------------------------------------
    // Unary, interpolation, ranges
    // ------------------------------------------------------------------

    pub(crate) fn parse_unary(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let receiver = self.parse_expression(Precedence::Unary, locals)?;
        let message = match token.kind() {
            TokenKind::Minus => "-@",
            TokenKind::Plus => "+@",
            _ => "~",
        };
        Ok(Node::new(
            token,
            NodeKind::Call {
                receiver: Box::new(receiver),
                message: message.to_string(),
                args: vec![],
            },
        ))
    }

    pub(crate) fn parse_not(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let precedence = if token.kind() == TokenKind::NotKeyword {
            Precedence::LogicalNot
        } else {
            Precedence::Unary
        };
        let expression = self.parse_expression(precedence, locals)?;
        Ok(Node::new(
            token,
            NodeKind::Not {
                expression: Box::new(expression),
            },
        ))
    }

    pub(crate) fn parse_beginless_range(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let exclude_end = token.kind() == TokenKind::DotDotDot;
        self.advance();
        let last = self.parse_expression(Precedence::Range, locals)?;
        let first = Node::new(token.clone(), NodeKind::NilSexp);
        Ok(Node::new(
            token,
            NodeKind::Range {
                first: Box::new(first),
                last: Box::new(last),
                exclude_end,
            },
        ))
    }

    pub(crate) fn parse_interpolated_string(&mut self, locals: &Locals) -> ParseResult<Node> {
        let (token, nodes, _) =
            self.parse_interpolated_body(locals, TokenKind::InterpolatedStringEnd)?;
        Ok(Node::new(token, NodeKind::InterpolatedString { nodes }))
    }

    pub(crate) fn parse_interpolated_shell(&mut self, locals: &Locals) -> ParseResult<Node> {
        let (token, nodes, _) =
            self.parse_interpolated_body(locals, TokenKind::InterpolatedShellEnd)?;
        Ok(Node::new(token, NodeKind::InterpolatedShell { nodes }))
    }

    pub(crate) fn parse_interpolated_regexp(&mut self, locals: &Locals) -> ParseResult<Node> {
        let (token, nodes, options) =
            self.parse_interpolated_body(locals, TokenKind::InterpolatedRegexpEnd)?;
        // a regexp with no interpolation collapses to a plain literal
        if let [node] = nodes.as_slice() {
            if let NodeKind::String(pattern) = node.kind() {
                return Ok(Node::new(
                    token,
                    NodeKind::Regexp {
                        pattern: pattern.clone(),
                        options,
                    },
                ));
            }
        }
        Ok(Node::new(token, NodeKind::InterpolatedRegexp { nodes, options }))
    }

    fn parse_interpolated_body(
        &mut self,
        locals: &Locals,
        end_kind: TokenKind,
    ) -> ParseResult<(Token, Vec<Node>, String)> {
        let token = self.current_token().clone();
        self.advance();
        let mut nodes = Vec::new();
        let options;
        loop {
            match self.current_kind() {
                TokenKind::String => {
                    let part = self.current_token().clone();
                    self.advance();
                    let value = part.literal_or_blank().to_string();
                    nodes.push(Node::new(part, NodeKind::String(value)));
                },
                TokenKind::EvaluateToStringBegin => {
                    let evstr_token = self.current_token().clone();
                    self.advance();
                    let body = self.parse_body(
                        locals,
                        Precedence::Lowest,
                        &[TokenKind::EvaluateToStringEnd],
                    )?;
                    self.expect(TokenKind::EvaluateToStringEnd, "end of interpolation")?;
                    nodes.push(Node::new(
                        evstr_token,
                        NodeKind::EvaluateToString {
                            node: Box::new(unwrap_block(body)),
                        },
                    ));
                },
                kind if kind == end_kind => {
                    options = self
                        .current_token()
                        .options()
                        .unwrap_or_default()
                        .to_string();
                    self.advance();
                    break;
                },
                _ => return Err(self.unexpected("interpolated string part")),
            }
        }
        Ok((token, nodes, options))
    }

    // ------------------------------------------------------------------
    // Left denotations
    // ------------------------------------------------------------------

    pub(crate) fn parse_infix_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let precedence = self.get_precedence(Some(&left));
        self.advance();
        let right = self.parse_expression(precedence, locals)?;
        Ok(Node::new(
            token.clone(),
            NodeKind::Call {
                receiver: Box::new(left),
                message: token.type_value().to_string(),
                args: vec![right],
            },
        ))
    }

    pub(crate) fn parse_logical_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let precedence = self.get_precedence(Some(&left));
        self.advance();
        let right = self.parse_expression(precedence, locals)?;
        let kind = match token.kind() {
            TokenKind::And | TokenKind::AndKeyword => NodeKind::LogicalAnd {
                left: Box::new(left),
                right: Box::new(right),
            },
            _ => NodeKind::LogicalOr {
                left: Box::new(left),
                right: Box::new(right),
            },
        };
        Ok(Node::new(token, kind))
    }

    pub(crate) fn parse_assignment_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();

        match left.kind() {
            NodeKind::Identifier { .. } | NodeKind::Constant => {
                if !left.token().is_assignable() {
                    return Err(self.error_at(
                        left.line(),
                        format!(
                            "cannot assign to {} '{}'",
                            left.token().type_value(),
                            left.token().display_value()
                        ),
                    ));
                }
                if left.token().kind() == TokenKind::BareName {
                    locals
                        .borrow_mut()
                        .insert(left.token().literal_or_blank().to_string());
                }
                let value = self.parse_assignment_value(locals)?;
                Ok(Node::new(
                    token,
                    NodeKind::Assignment {
                        identifier: Box::new(left),
                        value: Box::new(value),
                    },
                ))
            },
            NodeKind::Colon2 { .. } | NodeKind::Colon3 { .. } => {
                let value = self.parse_assignment_value(locals)?;
                Ok(Node::new(
                    token,
                    NodeKind::Assignment {
                        identifier: Box::new(left),
                        value: Box::new(value),
                    },
                ))
            },
            NodeKind::MultipleAssignment { nodes } => {
                for target in nodes {
                    register_masgn_local(target, locals);
                }
                let mut value = self.parse_expression(Precedence::Assignment, locals)?;
                if self.current_kind() == TokenKind::Comma {
                    let value_token = value.token().clone();
                    let mut values = vec![value];
                    while self.current_kind() == TokenKind::Comma {
                        self.advance();
                        self.skip_newlines();
                        values.push(self.parse_expression(Precedence::Assignment, locals)?);
                    }
                    value = Node::new(value_token, NodeKind::Array { nodes: values });
                }
                let value = Node::new(
                    token.clone(),
                    NodeKind::ToArray {
                        value: Box::new(value),
                    },
                );
                Ok(Node::new(
                    token,
                    NodeKind::Assignment {
                        identifier: Box::new(left),
                        value: Box::new(value),
                    },
                ))
            },
            NodeKind::Call {
                receiver,
                message,
                args,
            }
            | NodeKind::SafeCall {
                receiver,
                message,
                args,
            } => {
                let receiver = receiver.clone();
                let message = format!("{}=", message);
                let mut args = args.clone();
                let value = self.parse_assignment_value(locals)?;
                args.push(value);
                Ok(Node::new(
                    token,
                    NodeKind::AttrAssign {
                        receiver,
                        message,
                        args,
                    },
                ))
            },
            _ => Err(self.error_at(
                left.line(),
                "left-hand side of assignment is not assignable".to_string(),
            )),
        }
    }

    /// The right-hand side of an assignment: a single expression, a splat
    /// (`a = *b`), or a comma list (`a = 1, 2`)
    fn parse_assignment_value(&mut self, locals: &Locals) -> ParseResult<Node> {
        let value = self.parse_expression(Precedence::Assignment, locals)?;
        if matches!(value.kind(), NodeKind::Splat { .. }) {
            let token = value.token().clone();
            return Ok(Node::new(
                token,
                NodeKind::SplatValue {
                    value: Box::new(value),
                },
            ));
        }
        if self.current_kind() != TokenKind::Comma {
            return Ok(value);
        }
        let token = value.token().clone();
        let mut nodes = vec![value];
        while self.current_kind() == TokenKind::Comma {
            self.advance();
            self.skip_newlines();
            nodes.push(self.parse_expression(Precedence::Assignment, locals)?);
        }
        let array = Node::new(token.clone(), NodeKind::Array { nodes });
        Ok(Node::new(
            token,
            NodeKind::SplatValue {
                value: Box::new(array),
            },
        ))
    }

    pub(crate) fn parse_op_assign_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let value = self.parse_expression(Precedence::OpAssignment, locals)?;
        let op = token.type_value().trim_end_matches('=').to_string();

        match left.kind() {
            NodeKind::Identifier { .. } | NodeKind::Constant => {
                if left.token().kind() == TokenKind::BareName {
                    locals
                        .borrow_mut()
                        .insert(left.token().literal_or_blank().to_string());
                }
                let kind = match token.kind() {
                    TokenKind::AndEqual => NodeKind::OpAssignAnd {
                        name: Box::new(left),
                        value: Box::new(value),
                    },
                    TokenKind::OrEqual => NodeKind::OpAssignOr {
                        name: Box::new(left),
                        value: Box::new(value),
                    },
                    _ => NodeKind::OpAssign {
                        op,
                        name: Box::new(left),
                        value: Box::new(value),
                    },
                };
                Ok(Node::new(token, kind))
            },
            NodeKind::Call {
                receiver,
                message,
                args,
            }
            | NodeKind::SafeCall {
                receiver,
                message,
                args,
            } => Ok(Node::new(
                token.clone(),
                NodeKind::OpAssignAccessor {
                    op: match token.kind() {
                        TokenKind::AndEqual => "&&".to_string(),
                        TokenKind::OrEqual => "||".to_string(),
                        _ => op,
                    },
                    receiver: receiver.clone(),
                    message: message.clone(),
                    args: args.clone(),
                    value: Box::new(value),
                },
            )),
            _ => Err(self.error_at(
                left.line(),
                "left-hand side of operator assignment is not assignable".to_string(),
            )),
        }
    }

    pub(crate) fn parse_constant_resolution_expression(
        &mut self,
        left: Node,
        _locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        match self.current_kind() {
            TokenKind::Constant => {
                let name_token = self.current_token().clone();
                self.advance();
                Ok(Node::new(
                    token,
                    NodeKind::Colon2 {
                        left: Box::new(left),
                        name: name_token.literal_or_blank().to_string(),
                    },
                ))
            },
            TokenKind::BareName => {
                let name_token = self.current_token().clone();
                self.advance();
                Ok(Node::new(
                    token,
                    NodeKind::Call {
                        receiver: Box::new(left),
                        message: name_token.literal_or_blank().to_string(),
                        args: vec![],
                    },
                ))
            },
            _ => Err(self.unexpected("constant or method name")),
        }
    }

    pub(crate) fn parse_send_expression(
        &mut self,
        left: Node,
        _locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let message = self.parse_message_name()?;
        Ok(Node::new(
            token,
            NodeKind::Call {
                receiver: Box::new(left),
                message,
                args: vec![],
            },
        ))
    }

    pub(crate) fn parse_safe_send_expression(
        &mut self,
        left: Node,
        _locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let message = self.parse_message_name()?;
        Ok(Node::new(
            token,
            NodeKind::SafeCall {
                receiver: Box::new(left),
                message,
                args: vec![],
            },
        ))
    }

    /// The message position after `.` / `&.`: a name, a constant, an
    /// operator, or a keyword used as a method name (`1.class`)
    pub(crate) fn parse_message_name(&mut self) -> ParseResult<String> {
        let token = self.current_token().clone();
        let name = match token.kind() {
            TokenKind::BareName | TokenKind::Constant => {
                token.literal_or_blank().to_string()
            },
            kind if token.is_operator() => kind.type_value().to_string(),
            TokenKind::ClassKeyword => "class".to_string(),
            _ => return Err(self.unexpected("method name")),
        };
        self.advance();
        Ok(name)
    }

    pub(crate) fn parse_call_expression_with_parens(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let mut call = self.to_call(left)?;
        self.advance();
        self.skip_newlines();
        let mut args = Vec::new();
        if self.current_kind() != TokenKind::RParen {
            self.parse_call_args(&mut args, locals, TokenKind::RParen)?;
        }
        self.expect(TokenKind::RParen, ")")?;
        set_call_args(&mut call, args);
        Ok(call)
    }

    pub(crate) fn parse_call_expression_without_parens(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let mut call = self.to_call(left)?;
        let mut args = Vec::new();
        self.parse_call_args(&mut args, locals, TokenKind::Eol)?;
        set_call_args(&mut call, args);
        Ok(call)
    }

    /// Parse comma-separated call arguments, stopping before `stop` (which
    /// is not consumed)
    pub(crate) fn parse_call_args(
        &mut self,
        args: &mut Vec<Node>,
        locals: &Locals,
        stop: TokenKind,
    ) -> ParseResult<()> {
        loop {
            if self.current_kind() == stop {
                break;
            }
            let arg = match self.current_kind() {
                TokenKind::SymbolKey => self.parse_keyword_args(locals)?,
                _ => self.parse_expression(Precedence::CallArgs, locals)?,
            };
            args.push(arg);
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Turn a callable left-hand node into a call node awaiting args
    pub(crate) fn to_call(&self, left: Node) -> ParseResult<Node> {
        match left.kind() {
            NodeKind::Call { .. } | NodeKind::SafeCall { .. } | NodeKind::StabbyProc { .. } => {
                Ok(left)
            },
            NodeKind::Identifier { .. } | NodeKind::Constant => {
                let token = left.token().clone();
                let message = token.literal_or_blank().to_string();
                let receiver = Node::new(token.clone(), NodeKind::NilSexp);
                Ok(Node::new(
                    token,
                    NodeKind::Call {
                        receiver: Box::new(receiver),
                        message,
                        args: vec![],
                    },
                ))
            },
            _ => Err(self.error_at(left.line(), "expression is not callable".to_string())),
        }
    }

    pub(crate) fn parse_ref_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        self.skip_newlines();
        let mut args = Vec::new();
        if self.current_kind() != TokenKind::RBracket {
            self.parse_call_args(&mut args, locals, TokenKind::RBracket)?;
        }
        self.expect(TokenKind::RBracket, "]")?;
        Ok(Node::new(
            token,
            NodeKind::Call {
                receiver: Box::new(left),
                message: "[]".to_string(),
                args,
            },
        ))
    }

    pub(crate) fn parse_range_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let exclude_end = token.kind() == TokenKind::DotDotDot;
        self.advance();
        let last = if self.range_has_end() {
            self.parse_expression(Precedence::Range, locals)?
        } else {
            Node::new(token.clone(), NodeKind::NilSexp)
        };
        Ok(Node::new(
            token,
            NodeKind::Range {
                first: Box::new(left),
                last: Box::new(last),
                exclude_end,
            },
        ))
    }

    fn range_has_end(&self) -> bool {
        let token = self.current_token();
        !(token.is_end_of_expression()
            || token.is_closing_token()
            || token.is_comma())
    }

    pub(crate) fn parse_ternary_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let true_expr = self.parse_expression(Precedence::Ternary, locals)?;
        self.expect(TokenKind::TernaryColon, ":")?;
        let false_expr = self.parse_expression(Precedence::Ternary, locals)?;
        Ok(Node::new(
            token,
            NodeKind::If {
                condition: Box::new(left),
                true_expr: Box::new(true_expr),
                false_expr: Box::new(false_expr),
            },
        ))
    }

    pub(crate) fn parse_match_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let right = self.parse_expression(Precedence::Equality, locals)?;
        Ok(build_match(token, left, right))
    }

    pub(crate) fn parse_not_match_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let right = self.parse_expression(Precedence::Equality, locals)?;
        let matched = build_match(token.clone(), left, right);
        Ok(Node::new(
            token,
            NodeKind::Not {
                expression: Box::new(matched),
            },
        ))
    }

    pub(crate) fn parse_multiple_assignment_targets(
        &mut self,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let mut nodes = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Multiply => {
                    let splat_token = self.current_token().clone();
                    self.advance();
                    let node = if self.current_token().is_assignable() {
                        let target = self.parse_identifier(locals)?;
                        Some(Box::new(target))
                    } else {
                        None
                    };
                    nodes.push(Node::new(splat_token, NodeKind::Splat { node }));
                },
                kind if self.current_token().is_assignable() && kind != TokenKind::ConstantResolution => {
                    nodes.push(self.parse_identifier(locals)?);
                },
                _ => return Err(self.unexpected("assignment target")),
            }
            if self.current_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(Node::new(token, NodeKind::MultipleAssignment { nodes }))
    }
}

/// Build a `Match` node when either side is a regexp literal, otherwise a
/// plain `=~` call
fn build_match(token: Token, left: Node, right: Node) -> Node {
    let left_is_regexp = matches!(
        left.kind(),
        NodeKind::Regexp { .. } | NodeKind::InterpolatedRegexp { .. }
    );
    let right_is_regexp = matches!(
        right.kind(),
        NodeKind::Regexp { .. } | NodeKind::InterpolatedRegexp { .. }
    );
    if left_is_regexp {
        Node::new(
            token,
            NodeKind::Match {
                regexp: Box::new(left),
                arg: Box::new(right),
                regexp_on_left: true,
            },
        )
    } else if right_is_regexp {
        Node::new(
            token,
            NodeKind::Match {
                regexp: Box::new(right),
                arg: Box::new(left),
                regexp_on_left: false,
            },
        )
    } else {
        Node::new(
            token,
            NodeKind::Call {
                receiver: Box::new(left),
                message: "=~".to_string(),
                args: vec![right],
            },
        )
    }
}

/// Register the locals introduced by a masgn target
fn register_masgn_local(target: &Node, locals: &Locals) {
    match target.kind() {
        NodeKind::Identifier { .. } if target.token().kind() == TokenKind::BareName => {
            locals
                .borrow_mut()
                .insert(target.token().literal_or_blank().to_string());
        },
        NodeKind::Splat { node: Some(node) } => register_masgn_local(node, locals),
        _ => {},
    }
}

/// Replace a call node's argument list
fn set_call_args(call: &mut Node, args: Vec<Node>) {
    match call.kind_mut() {
        NodeKind::Call { args: slot, .. } | NodeKind::SafeCall { args: slot, .. } => {
            *slot = args;
        },
        _ => {},
    }
}

/// A single-statement block collapses to its statement
pub(crate) fn unwrap_block(node: Node) -> Node {
    let single = matches!(node.kind(), NodeKind::Block { nodes } if nodes.len() == 1);
    if !single {
        return node;
    }
    match node.into_kind() {
        NodeKind::Block { mut nodes } => nodes.remove(0),
        _ => unreachable!(),
    }
}
