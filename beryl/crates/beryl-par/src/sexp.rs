//! S-expression conversion.
//!
//! The S-expression is the external format handed to downstream code
//! generators: a heterogeneous sequence whose first element is a symbol
//! naming the node variant. The shape for each variant is fixed and
//! one-to-one; location metadata rides along as side attributes on each
//! list, not as positional elements.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Node, NodeKind};

/// One S-expression element
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    /// Head or literal symbol, printed `:name`
    Symbol(String),
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Nil,
    List(SexpList),
}

/// A list-shaped S-expression with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct SexpList {
    pub items: Vec<Sexp>,
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl Sexp {
    /// Build a list tagged with `head`, located at `node`
    pub fn list(node: &Node, head: &str, rest: Vec<Sexp>) -> Sexp {
        let mut items = Vec::with_capacity(rest.len() + 1);
        items.push(Sexp::Symbol(head.to_string()));
        items.extend(rest);
        Sexp::List(SexpList {
            items,
            file: node.token().file().clone(),
            line: node.line(),
            column: node.column(),
        })
    }

    pub fn symbol(name: impl Into<String>) -> Sexp {
        Sexp::Symbol(name.into())
    }

    /// The head symbol, when this is a list
    pub fn head(&self) -> Option<&str> {
        match self {
            Sexp::List(list) => match list.items.first() {
                Some(Sexp::Symbol(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// The elements after the head, when this is a list
    pub fn rest(&self) -> &[Sexp] {
        match self {
            Sexp::List(list) if !list.items.is_empty() => &list.items[1..],
            _ => &[],
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(s) => write!(f, ":{}", s),
            Sexp::String(s) => write!(f, "{:?}", s),
            Sexp::Integer(i) => write!(f, "{}", i),
            Sexp::Float(x) => write!(f, "{:?}", x),
            Sexp::Bool(b) => write!(f, "{}", b),
            Sexp::Nil => write!(f, "nil"),
            Sexp::List(list) => {
                write!(f, "s(")?;
                for (i, item) in list.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            },
        }
    }
}

impl Node {
    /// Serialize this node to its fixed S-expression shape
    pub fn to_sexp(&self) -> Sexp {
        use beryl_lex::TokenKind;

        match self.kind() {
            NodeKind::Nil => Sexp::list(self, "nil", vec![]),
            // parser-made placeholders render as a bare nil element
            NodeKind::NilSexp => Sexp::Nil,
            NodeKind::True => Sexp::list(self, "true", vec![]),
            NodeKind::False => Sexp::list(self, "false", vec![]),
            NodeKind::SelfNode => Sexp::list(self, "self", vec![]),
            NodeKind::Integer(i) => Sexp::list(self, "lit", vec![Sexp::Integer(*i)]),
            NodeKind::Float(x) => Sexp::list(self, "lit", vec![Sexp::Float(*x)]),
            NodeKind::String(s) => Sexp::list(self, "str", vec![Sexp::String(s.clone())]),
            NodeKind::Symbol(s) => Sexp::list(self, "lit", vec![Sexp::symbol(s.clone())]),
            NodeKind::Regexp { pattern, options } => Sexp::list(
                self,
                "regexp",
                vec![Sexp::String(pattern.clone()), Sexp::String(options.clone())],
            ),

            NodeKind::Identifier { is_lvar } => {
                let name = self.token().literal_or_blank().to_string();
                match self.token().kind() {
                    TokenKind::BareName => {
                        if *is_lvar {
                            Sexp::list(self, "lvar", vec![Sexp::Symbol(name)])
                        } else {
                            Sexp::list(self, "call", vec![Sexp::Nil, Sexp::Symbol(name)])
                        }
                    },
                    TokenKind::InstanceVariable => {
                        Sexp::list(self, "ivar", vec![Sexp::Symbol(name)])
                    },
                    TokenKind::ClassVariable => Sexp::list(self, "cvar", vec![Sexp::Symbol(name)]),
                    TokenKind::GlobalVariable => {
                        Sexp::list(self, "gvar", vec![Sexp::Symbol(name)])
                    },
                    _ => Sexp::list(self, "lvar", vec![Sexp::Symbol(name)]),
                }
            },
            NodeKind::Constant => Sexp::list(
                self,
                "const",
                vec![Sexp::Symbol(self.token().literal_or_blank().to_string())],
            ),
            NodeKind::Colon2 { left, name } => Sexp::list(
                self,
                "colon2",
                vec![left.to_sexp(), Sexp::Symbol(name.clone())],
            ),
            NodeKind::Colon3 { name } => {
                Sexp::list(self, "colon3", vec![Sexp::Symbol(name.clone())])
            },

            NodeKind::Array { nodes } => {
                Sexp::list(self, "array", nodes.iter().map(Node::to_sexp).collect())
            },
            NodeKind::Hash { nodes } => {
                Sexp::list(self, "hash", nodes.iter().map(Node::to_sexp).collect())
            },
            NodeKind::Range {
                first,
                last,
                exclude_end,
            } => {
                let head = if *exclude_end { "dot3" } else { "dot2" };
                Sexp::list(self, head, vec![first.to_sexp(), last.to_sexp()])
            },

            NodeKind::Call {
                receiver,
                message,
                args,
            } => {
                let mut rest = vec![receiver.to_sexp(), Sexp::Symbol(message.clone())];
                rest.extend(args.iter().map(Node::to_sexp));
                Sexp::list(self, "call", rest)
            },
            NodeKind::SafeCall {
                receiver,
                message,
                args,
            } => {
                let mut rest = vec![receiver.to_sexp(), Sexp::Symbol(message.clone())];
                rest.extend(args.iter().map(Node::to_sexp));
                Sexp::list(self, "safe_call", rest)
            },
            NodeKind::AttrAssign {
                receiver,
                message,
                args,
            } => {
                let mut rest = vec![receiver.to_sexp(), Sexp::Symbol(message.clone())];
                rest.extend(args.iter().map(Node::to_sexp));
                Sexp::list(self, "attrasgn", rest)
            },
            NodeKind::Super { args, parens } => {
                if args.is_empty() && !parens {
                    Sexp::list(self, "zsuper", vec![])
                } else {
                    Sexp::list(self, "super", args.iter().map(Node::to_sexp).collect())
                }
            },
            NodeKind::Yield { args } => {
                Sexp::list(self, "yield", args.iter().map(Node::to_sexp).collect())
            },

            NodeKind::Assignment { identifier, value } => {
                assignment_sexp(self, identifier, Some(value.to_sexp()))
            },
            NodeKind::OpAssign { op, name, value } => Sexp::list(
                self,
                "op_asgn",
                vec![
                    name.to_sexp(),
                    Sexp::Symbol(op.clone()),
                    value.to_sexp(),
                ],
            ),
            NodeKind::OpAssignAnd { name, value } => Sexp::list(
                self,
                "op_asgn_and",
                vec![
                    name.to_sexp(),
                    assignment_sexp(self, name, Some(value.to_sexp())),
                ],
            ),
            NodeKind::OpAssignOr { name, value } => Sexp::list(
                self,
                "op_asgn_or",
                vec![
                    name.to_sexp(),
                    assignment_sexp(self, name, Some(value.to_sexp())),
                ],
            ),
            NodeKind::OpAssignAccessor {
                op,
                receiver,
                message,
                args,
                value,
            } => {
                let mut rest = vec![
                    receiver.to_sexp(),
                    Sexp::Symbol(message.clone()),
                    Sexp::Symbol(op.clone()),
                ];
                rest.extend(args.iter().map(Node::to_sexp));
                rest.push(value.to_sexp());
                Sexp::list(self, "op_asgn_accessor", rest)
            },
            NodeKind::MultipleAssignment { nodes } => {
                let targets = Sexp::list(
                    self,
                    "array",
                    nodes.iter().map(|n| masgn_target_sexp(self, n)).collect(),
                );
                Sexp::list(self, "masgn", vec![targets])
            },
            NodeKind::Splat { node } => match node {
                Some(node) => Sexp::list(self, "splat", vec![node.to_sexp()]),
                None => Sexp::list(self, "splat", vec![]),
            },
            NodeKind::SplatValue { value } => {
                Sexp::list(self, "svalue", vec![value.to_sexp()])
            },
            NodeKind::ToArray { value } => Sexp::list(self, "to_ary", vec![value.to_sexp()]),

            NodeKind::If {
                condition,
                true_expr,
                false_expr,
            } => Sexp::list(
                self,
                "if",
                vec![
                    condition.to_sexp(),
                    true_expr.to_sexp(),
                    false_expr.to_sexp(),
                ],
            ),
            NodeKind::While {
                condition,
                body,
                pre,
            } => Sexp::list(
                self,
                "while",
                vec![condition.to_sexp(), body.to_sexp(), Sexp::Bool(*pre)],
            ),
            NodeKind::Until {
                condition,
                body,
                pre,
            } => Sexp::list(
                self,
                "until",
                vec![condition.to_sexp(), body.to_sexp(), Sexp::Bool(*pre)],
            ),
            NodeKind::Case {
                subject,
                clauses,
                else_body,
            } => {
                let mut rest = vec![subject.to_sexp()];
                rest.extend(clauses.iter().map(Node::to_sexp));
                rest.push(match else_body {
                    Some(body) => body.to_sexp(),
                    None => Sexp::Nil,
                });
                Sexp::list(self, "case", rest)
            },
            NodeKind::CaseWhen { condition, body } => Sexp::list(
                self,
                "when",
                vec![condition.to_sexp(), body.to_sexp()],
            ),
            NodeKind::CaseIn { pattern, body } => {
                Sexp::list(self, "in", vec![pattern.to_sexp(), body.to_sexp()])
            },
            NodeKind::Begin {
                body,
                rescue_nodes,
                else_body,
                ensure_body,
            } => {
                let mut rest = vec![body.to_sexp()];
                rest.extend(rescue_nodes.iter().map(Node::to_sexp));
                rest.push(match else_body {
                    Some(body) => body.to_sexp(),
                    None => Sexp::Nil,
                });
                rest.push(match ensure_body {
                    Some(body) => body.to_sexp(),
                    None => Sexp::Nil,
                });
                Sexp::list(self, "begin", rest)
            },
            NodeKind::BeginRescue {
                exceptions,
                name,
                body,
            } => {
                let exceptions = Sexp::list(
                    self,
                    "array",
                    exceptions.iter().map(Node::to_sexp).collect(),
                );
                let name = match name {
                    Some(name) => name.to_sexp(),
                    None => Sexp::Nil,
                };
                Sexp::list(self, "resbody", vec![exceptions, name, body.to_sexp()])
            },
            NodeKind::Break { arg } => match arg {
                Some(arg) => Sexp::list(self, "break", vec![arg.to_sexp()]),
                None => Sexp::list(self, "break", vec![]),
            },
            NodeKind::Next { arg } => match arg {
                Some(arg) => Sexp::list(self, "next", vec![arg.to_sexp()]),
                None => Sexp::list(self, "next", vec![]),
            },
            NodeKind::Return { value } => match value {
                Some(value) => Sexp::list(self, "return", vec![value.to_sexp()]),
                None => Sexp::list(self, "return", vec![]),
            },
            NodeKind::LogicalAnd { left, right } => {
                Sexp::list(self, "and", vec![left.to_sexp(), right.to_sexp()])
            },
            NodeKind::LogicalOr { left, right } => {
                Sexp::list(self, "or", vec![left.to_sexp(), right.to_sexp()])
            },
            NodeKind::Not { expression } => Sexp::list(self, "not", vec![expression.to_sexp()]),
            NodeKind::Defined { arg } => Sexp::list(self, "defined", vec![arg.to_sexp()]),
            NodeKind::Block { nodes } => {
                Sexp::list(self, "block", nodes.iter().map(Node::to_sexp).collect())
            },

            NodeKind::Class {
                name,
                superclass,
                body,
            } => {
                let name = name_or_sexp(name);
                let superclass = match superclass {
                    Some(superclass) => superclass.to_sexp(),
                    None => Sexp::Nil,
                };
                Sexp::list(self, "class", vec![name, superclass, body.to_sexp()])
            },
            NodeKind::Sclass { target, body } => {
                Sexp::list(self, "sclass", vec![target.to_sexp(), body.to_sexp()])
            },
            NodeKind::Module { name, body } => {
                Sexp::list(self, "module", vec![name_or_sexp(name), body.to_sexp()])
            },
            NodeKind::Def {
                self_node,
                name,
                args,
                body,
            } => {
                let args_sexp = args_list_sexp(self, args);
                match self_node {
                    Some(self_node) => Sexp::list(
                        self,
                        "defs",
                        vec![
                            self_node.to_sexp(),
                            Sexp::Symbol(name.clone()),
                            args_sexp,
                            body.to_sexp(),
                        ],
                    ),
                    None => Sexp::list(
                        self,
                        "defn",
                        vec![Sexp::Symbol(name.clone()), args_sexp, body.to_sexp()],
                    ),
                }
            },
            NodeKind::Arg { .. } | NodeKind::KeywordArg { .. } => self.arg_sexp(),
            NodeKind::KeywordSplat { node } => match node {
                Some(node) => Sexp::list(self, "kwsplat", vec![node.to_sexp()]),
                None => Sexp::list(self, "kwsplat", vec![]),
            },
            NodeKind::BlockPass { node } => {
                Sexp::list(self, "block_pass", vec![node.to_sexp()])
            },
            NodeKind::Iter { call, args, body } => Sexp::list(
                self,
                "iter",
                vec![call.to_sexp(), args_list_sexp(self, args), body.to_sexp()],
            ),
            NodeKind::StabbyProc { .. } => Sexp::list(self, "lambda", vec![]),
            NodeKind::Alias {
                new_name,
                existing_name,
            } => Sexp::list(
                self,
                "alias",
                vec![new_name.to_sexp(), existing_name.to_sexp()],
            ),
            NodeKind::Undef { names } => {
                Sexp::list(self, "undef", names.iter().map(Node::to_sexp).collect())
            },

            NodeKind::InterpolatedString { nodes } => {
                Sexp::list(self, "dstr", interpolated_parts(nodes))
            },
            NodeKind::InterpolatedShell { nodes } => {
                Sexp::list(self, "dxstr", interpolated_parts(nodes))
            },
            NodeKind::InterpolatedRegexp { nodes, options } => {
                let mut rest = interpolated_parts(nodes);
                rest.push(Sexp::String(options.clone()));
                Sexp::list(self, "dregx", rest)
            },
            NodeKind::EvaluateToString { node } => {
                Sexp::list(self, "evstr", vec![node.to_sexp()])
            },

            NodeKind::ArrayPattern { nodes } => Sexp::list(
                self,
                "array_pat",
                nodes.iter().map(Node::to_sexp).collect(),
            ),
            NodeKind::HashPattern { nodes } => Sexp::list(
                self,
                "hash_pat",
                nodes.iter().map(Node::to_sexp).collect(),
            ),
            NodeKind::Pin { identifier } => {
                Sexp::list(self, "pin", vec![identifier.to_sexp()])
            },

            NodeKind::Match {
                regexp,
                arg,
                regexp_on_left,
            } => {
                let head = if *regexp_on_left { "match2" } else { "match3" };
                Sexp::list(self, head, vec![regexp.to_sexp(), arg.to_sexp()])
            },
        }
    }

    /// The shape of one argument inside an `(args ...)` list
    fn arg_sexp(&self) -> Sexp {
        match self.kind() {
            NodeKind::Arg {
                name,
                splat,
                kwsplat,
                block_arg,
                value,
            } => {
                if let Some(value) = value {
                    return Sexp::list(
                        self,
                        "optarg",
                        vec![Sexp::Symbol(name.clone()), value.to_sexp()],
                    );
                }
                let rendered = if *splat {
                    format!("*{}", name)
                } else if *kwsplat {
                    format!("**{}", name)
                } else if *block_arg {
                    format!("&{}", name)
                } else {
                    name.clone()
                };
                Sexp::Symbol(rendered)
            },
            NodeKind::KeywordArg { name, value } => match value {
                Some(value) => Sexp::list(
                    self,
                    "kwarg",
                    vec![Sexp::Symbol(name.clone()), value.to_sexp()],
                ),
                None => Sexp::list(self, "kwarg", vec![Sexp::Symbol(name.clone())]),
            },
            _ => self.to_sexp(),
        }
    }
}

/// `(args ...)` for a def/iter argument list
fn args_list_sexp(owner: &Node, args: &[Node]) -> Sexp {
    Sexp::list(owner, "args", args.iter().map(|a| a.arg_sexp()).collect())
}

/// Class/module names appear as bare symbols when simple, as their own
/// sexp when namespaced (`class Foo::Bar`)
fn name_or_sexp(name: &Node) -> Sexp {
    match name.kind() {
        NodeKind::Constant => Sexp::Symbol(name.token().literal_or_blank().to_string()),
        _ => name.to_sexp(),
    }
}

/// The assignment shape depends on the target kind; masgn targets pass no
/// value and get the bare `(lasgn :name)` form
fn assignment_sexp(owner: &Node, identifier: &Node, value: Option<Sexp>) -> Sexp {
    use beryl_lex::TokenKind;

    let with_value = |mut items: Vec<Sexp>, value: Option<Sexp>| {
        if let Some(value) = value {
            items.push(value);
        }
        items
    };

    match identifier.kind() {
        NodeKind::Identifier { .. } => {
            let name = identifier.token().literal_or_blank().to_string();
            let head = match identifier.token().kind() {
                TokenKind::InstanceVariable => "iasgn",
                TokenKind::ClassVariable => "cvdecl",
                TokenKind::GlobalVariable => "gasgn",
                _ => "lasgn",
            };
            Sexp::list(owner, head, with_value(vec![Sexp::Symbol(name)], value))
        },
        NodeKind::Constant => Sexp::list(
            owner,
            "cdecl",
            with_value(
                vec![Sexp::Symbol(
                    identifier.token().literal_or_blank().to_string(),
                )],
                value,
            ),
        ),
        NodeKind::Colon2 { .. } | NodeKind::Colon3 { .. } => {
            Sexp::list(owner, "cdecl", with_value(vec![identifier.to_sexp()], value))
        },
        NodeKind::MultipleAssignment { .. } => {
            // (masgn (array targets...) (to_ary value))
            match identifier.to_sexp() {
                Sexp::List(mut list) => {
                    if let Some(value) = value {
                        list.items.push(value);
                    }
                    Sexp::List(list)
                },
                other => other,
            }
        },
        _ => Sexp::list(owner, "lasgn", with_value(vec![identifier.to_sexp()], value)),
    }
}

/// The target shape inside a masgn `(array ...)`
fn masgn_target_sexp(owner: &Node, target: &Node) -> Sexp {
    match target.kind() {
        NodeKind::Splat { node } => match node {
            Some(node) => Sexp::list(
                owner,
                "splat",
                vec![assignment_sexp(owner, node, None)],
            ),
            None => Sexp::list(owner, "splat", vec![]),
        },
        _ => assignment_sexp(owner, target, None),
    }
}

/// dstr/dxstr/dregx element layout: a leading raw string, then
/// `(str ...)` / `(evstr ...)` parts
fn interpolated_parts(nodes: &[Node]) -> Vec<Sexp> {
    let mut parts = Vec::with_capacity(nodes.len());
    let mut rest = nodes;
    match nodes.first().map(Node::kind) {
        Some(NodeKind::String(s)) => {
            parts.push(Sexp::String(s.clone()));
            rest = &nodes[1..];
        },
        _ => parts.push(Sexp::String(String::new())),
    }
    for node in rest {
        parts.push(node.to_sexp());
    }
    parts
}
