//! Definition parsing: methods, classes, modules, singleton classes,
//! aliases, blocks, and stabby procs.

use beryl_lex::TokenKind;

use crate::ast::{Node, NodeKind};
use crate::{new_scope, Locals, ParseResult, Parser, Precedence};

impl Parser {
    // ------------------------------------------------------------------
    // def
    // ------------------------------------------------------------------

    pub(crate) fn parse_def(&mut self, _locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();

        // method bodies are a fresh lexical scope
        let def_locals = new_scope();

        let self_node = self.parse_def_receiver(&def_locals)?;
        let name = self.parse_def_name()?;

        let mut args = Vec::new();
        if self.current_kind() == TokenKind::LParen {
            self.advance();
            self.skip_newlines();
            if self.current_kind() != TokenKind::RParen {
                self.parse_def_args(&mut args, &def_locals)?;
            }
            self.expect(TokenKind::RParen, ")")?;
        } else if self.current_kind() != TokenKind::Eol {
            self.parse_def_args(&mut args, &def_locals)?;
        }

        let body = self.parse_body(&def_locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
        self.expect(TokenKind::EndKeyword, "end")?;
        Ok(Node::new(
            token,
            NodeKind::Def {
                self_node,
                name,
                args,
                body: Box::new(body),
            },
        ))
    }

    /// `def self.foo` / `def Foo.bar` receivers
    fn parse_def_receiver(&mut self, locals: &Locals) -> ParseResult<Option<Box<Node>>> {
        let dot_follows = self.peek_token().is_some_and(|t| t.kind() == TokenKind::Dot);
        if !dot_follows {
            return Ok(None);
        }
        let receiver = match self.current_kind() {
            TokenKind::SelfKeyword => self.parse_self(locals)?,
            TokenKind::Constant => self.parse_identifier(locals)?,
            _ => return Ok(None),
        };
        self.expect(TokenKind::Dot, ".")?;
        Ok(Some(Box::new(receiver)))
    }

    /// The definable-name position: a bare name (optionally with a `=`
    /// writer suffix), a constant, or an operator
    fn parse_def_name(&mut self) -> ParseResult<String> {
        let token = self.current_token().clone();
        let mut name = match token.kind() {
            TokenKind::BareName | TokenKind::Constant => {
                self.advance();
                token.literal_or_blank().to_string()
            },
            TokenKind::LBracketRBracket | TokenKind::LBracketRBracketEqual => {
                self.advance();
                token.type_value().to_string()
            },
            kind if token.is_operator() => {
                self.advance();
                kind.type_value().to_string()
            },
            _ => return Err(self.unexpected("method name")),
        };
        // `def foo=(value)` - the writer's `=` arrives as its own token
        if self.current_kind() == TokenKind::Equal && !self.current_token().whitespace_precedes()
        {
            self.advance();
            name.push('=');
        }
        Ok(name)
    }

    /// Comma-separated definition arguments (requireds, optionals, splat,
    /// keyword, keyword-splat, block)
    pub(crate) fn parse_def_args(
        &mut self,
        args: &mut Vec<Node>,
        locals: &Locals,
    ) -> ParseResult<()> {
        loop {
            args.push(self.parse_def_single_arg(locals)?);
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn parse_def_single_arg(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        match token.kind() {
            TokenKind::BareName => {
                self.advance();
                let name = token.literal_or_blank().to_string();
                locals.borrow_mut().insert(name.clone());
                let mut value = None;
                if self.current_kind() == TokenKind::Equal {
                    self.advance();
                    let default = self.parse_expression(Precedence::DefArgs, locals)?;
                    value = Some(Box::new(default));
                }
                Ok(Node::new(
                    token,
                    NodeKind::Arg {
                        name,
                        splat: false,
                        kwsplat: false,
                        block_arg: false,
                        value,
                    },
                ))
            },
            TokenKind::SymbolKey => {
                self.advance();
                let name = token.literal_or_blank().to_string();
                locals.borrow_mut().insert(name.clone());
                let mut value = None;
                if !matches!(
                    self.current_kind(),
                    TokenKind::Comma | TokenKind::RParen | TokenKind::Eol | TokenKind::BitwiseOr
                ) {
                    let default = self.parse_expression(Precedence::DefArgs, locals)?;
                    value = Some(Box::new(default));
                }
                Ok(Node::new(token, NodeKind::KeywordArg { name, value }))
            },
            TokenKind::Multiply => {
                self.advance();
                let name = self.optional_arg_name(locals);
                Ok(Node::new(
                    token,
                    NodeKind::Arg {
                        name,
                        splat: true,
                        kwsplat: false,
                        block_arg: false,
                        value: None,
                    },
                ))
            },
            TokenKind::Exponent => {
                self.advance();
                let name = self.optional_arg_name(locals);
                Ok(Node::new(
                    token,
                    NodeKind::Arg {
                        name,
                        splat: false,
                        kwsplat: true,
                        block_arg: false,
                        value: None,
                    },
                ))
            },
            TokenKind::BitwiseAnd => {
                self.advance();
                let name = self.optional_arg_name(locals);
                Ok(Node::new(
                    token,
                    NodeKind::Arg {
                        name,
                        splat: false,
                        kwsplat: false,
                        block_arg: true,
                        value: None,
                    },
                ))
            },
            _ => Err(self.unexpected("argument name")),
        }
    }

    fn optional_arg_name(&mut self, locals: &Locals) -> String {
        if self.current_kind() == TokenKind::BareName {
            let name = self.current_token().literal_or_blank().to_string();
            self.advance();
            locals.borrow_mut().insert(name.clone());
            name
        } else {
            String::new()
        }
    }

    // ------------------------------------------------------------------
    // class / module
    // ------------------------------------------------------------------

    pub(crate) fn parse_class(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();

        // `class << target` opens the singleton class
        if self.current_kind() == TokenKind::LeftShift {
            self.advance();
            let target = self.parse_expression(Precedence::CallArgs, locals)?;
            self.skip_newlines();
            let body_locals = new_scope();
            let body =
                self.parse_body(&body_locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
            self.expect(TokenKind::EndKeyword, "end")?;
            return Ok(Node::new(
                token,
                NodeKind::Sclass {
                    target: Box::new(target),
                    body: Box::new(body),
                },
            ));
        }

        let name = self.parse_namespaced_constant(locals)?;
        let mut superclass = None;
        if self.current_kind() == TokenKind::LessThan {
            self.advance();
            let node = self.parse_expression(Precedence::CallArgs, locals)?;
            superclass = Some(Box::new(node));
        }
        self.skip_newlines();

        // class bodies are their own scope
        let body_locals = new_scope();
        let body = self.parse_body(&body_locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
        self.expect(TokenKind::EndKeyword, "end")?;
        Ok(Node::new(
            token,
            NodeKind::Class {
                name: Box::new(name),
                superclass,
                body: Box::new(body),
            },
        ))
    }

    pub(crate) fn parse_module(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let name = self.parse_namespaced_constant(locals)?;
        self.skip_newlines();
        let body_locals = new_scope();
        let body = self.parse_body(&body_locals, Precedence::Lowest, &[TokenKind::EndKeyword])?;
        self.expect(TokenKind::EndKeyword, "end")?;
        Ok(Node::new(
            token,
            NodeKind::Module {
                name: Box::new(name),
                body: Box::new(body),
            },
        ))
    }

    /// `Foo`, `Foo::Bar`, `::Foo` in definition-name position
    fn parse_namespaced_constant(&mut self, locals: &Locals) -> ParseResult<Node> {
        let node = match self.current_kind() {
            TokenKind::Constant => self.parse_identifier(locals)?,
            TokenKind::ConstantResolution => self.parse_top_level_constant(locals)?,
            _ => return Err(self.unexpected("constant")),
        };
        let mut node = node;
        while self.current_kind() == TokenKind::ConstantResolution {
            node = self.parse_constant_resolution_expression(node, locals)?;
        }
        match node.kind() {
            NodeKind::Constant | NodeKind::Colon2 { .. } | NodeKind::Colon3 { .. } => Ok(node),
            _ => Err(self.error_at(node.line(), "class/module name must be a constant".into())),
        }
    }

    // ------------------------------------------------------------------
    // alias / undef
    // ------------------------------------------------------------------

    pub(crate) fn parse_alias(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let new_name = self.parse_alias_arg(locals, "alias new name")?;
        let existing_name = self.parse_alias_arg(locals, "alias existing name")?;
        Ok(Node::new(
            token,
            NodeKind::Alias {
                new_name: Box::new(new_name),
                existing_name: Box::new(existing_name),
            },
        ))
    }

    pub(crate) fn parse_undef(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let mut names = Vec::new();
        loop {
            names.push(self.parse_alias_arg(locals, "method name")?);
            if self.current_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(Node::new(token, NodeKind::Undef { names }))
    }

    /// A method name in alias/undef position: a symbol, a bare word, or an
    /// operator - always reified as a symbol node
    fn parse_alias_arg(&mut self, _locals: &Locals, expected: &str) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let name = match token.kind() {
            TokenKind::Symbol | TokenKind::BareName | TokenKind::Constant => {
                token.literal_or_blank().to_string()
            },
            kind if token.is_operator() => kind.type_value().to_string(),
            _ => return Err(self.unexpected(expected)),
        };
        self.advance();
        Ok(Node::new(token, NodeKind::Symbol(name)))
    }

    // ------------------------------------------------------------------
    // Blocks and stabby procs
    // ------------------------------------------------------------------

    pub(crate) fn parse_iter_expression(
        &mut self,
        left: Node,
        locals: &Locals,
    ) -> ParseResult<Node> {
        let token = self.current_token().clone();
        let end_kind = match token.kind() {
            TokenKind::DoKeyword => TokenKind::EndKeyword,
            _ => TokenKind::RCurlyBrace,
        };
        self.advance();

        let call = if left.is_callable() {
            self.to_call(left)?
        } else {
            return Err(self.error_at(
                left.line(),
                "block attached to a non-callable expression".to_string(),
            ));
        };

        // block arguments live in the enclosing scope (blocks close over
        // their environment; only def resets tracking)
        let mut args = Vec::new();
        match self.current_kind() {
            TokenKind::BitwiseOr => {
                self.advance();
                if self.current_kind() != TokenKind::BitwiseOr {
                    self.parse_def_args(&mut args, locals)?;
                }
                self.expect(TokenKind::BitwiseOr, "|")?;
            },
            TokenKind::Or => {
                // `||` - an empty parameter list lexed as one token
                self.advance();
            },
            _ => {},
        }

        let body = self.parse_body(locals, Precedence::Lowest, &[end_kind])?;
        self.expect(end_kind, end_kind.type_value())?;

        // a stabby proc brings its own parameter list
        let args = match (args.is_empty(), call.kind()) {
            (true, NodeKind::StabbyProc { args: proc_args }) => proc_args.clone(),
            _ => args,
        };

        Ok(Node::new(
            token,
            NodeKind::Iter {
                call: Box::new(call),
                args,
                body: Box::new(body),
            },
        ))
    }

    pub(crate) fn parse_stabby_proc(&mut self, locals: &Locals) -> ParseResult<Node> {
        let token = self.current_token().clone();
        self.advance();
        let mut args = Vec::new();
        if self.current_kind() == TokenKind::LParen {
            self.advance();
            self.skip_newlines();
            if self.current_kind() != TokenKind::RParen {
                self.parse_def_args(&mut args, locals)?;
            }
            self.expect(TokenKind::RParen, ")")?;
        } else if self.current_kind() == TokenKind::BareName {
            self.parse_def_args(&mut args, locals)?;
        }
        Ok(Node::new(token, NodeKind::StabbyProc { args }))
    }
}
