//! AST node definitions.
//!
//! The node set is closed: one enum, one variant per syntactic form. Every
//! node owns its children and keeps the token it was built from, which is
//! where downstream consumers get file/line/column. Trees are strictly
//! owned - no sharing, no cycles - and are dropped after S-expression
//! conversion; the GC never sees them.

use beryl_lex::{Token, TokenKind};

/// One AST node: a source-location token plus the tagged form
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    token: Token,
    kind: NodeKind,
}

impl Node {
    pub fn new(token: Token, kind: NodeKind) -> Self {
        Self { token, kind }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    pub fn file(&self) -> &str {
        self.token.file()
    }

    pub fn line(&self) -> usize {
        self.token.line()
    }

    pub fn column(&self) -> usize {
        self.token.column()
    }

    /// Can this node be the target of a call-shaped postfix (parens,
    /// paren-less args, a block)?
    pub fn is_callable(&self) -> bool {
        match &self.kind {
            NodeKind::Call { .. } | NodeKind::SafeCall { .. } | NodeKind::StabbyProc { .. } => {
                true
            },
            NodeKind::Identifier { is_lvar } => {
                !is_lvar
                    && matches!(
                        self.token.kind(),
                        TokenKind::BareName | TokenKind::Constant
                    )
            },
            NodeKind::Constant => false,
            _ => false,
        }
    }

    /// True for a local-variable reference
    pub fn is_lvar(&self) -> bool {
        matches!(self.kind, NodeKind::Identifier { is_lvar: true })
    }

    /// The identifier/constant name, when this node carries one in its token
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { .. } | NodeKind::Constant => self.token.literal(),
            NodeKind::Colon3 { name } => Some(name),
            NodeKind::Colon2 { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// The closed set of node forms
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ------------------------------------------------------------------
    // Atoms
    // ------------------------------------------------------------------
    Nil,
    /// A literal `nil` produced by the parser itself as a placeholder (an
    /// omitted receiver, an absent else branch)
    NilSexp,
    True,
    False,
    SelfNode,
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Regexp {
        pattern: String,
        options: String,
    },

    // ------------------------------------------------------------------
    // Identifiers
    // ------------------------------------------------------------------
    /// A name whose token kind distinguishes bare name, ivar, cvar, gvar;
    /// `is_lvar` records the parse-time binding decision for bare names
    Identifier {
        is_lvar: bool,
    },
    Constant,
    Colon2 {
        left: Box<Node>,
        name: String,
    },
    Colon3 {
        name: String,
    },

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------
    Array {
        nodes: Vec<Node>,
    },
    /// Alternating key, value nodes
    Hash {
        nodes: Vec<Node>,
    },
    Range {
        first: Box<Node>,
        last: Box<Node>,
        exclude_end: bool,
    },

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------
    Call {
        receiver: Box<Node>,
        message: String,
        args: Vec<Node>,
    },
    /// `receiver&.message` - short-circuits on a nil receiver
    SafeCall {
        receiver: Box<Node>,
        message: String,
        args: Vec<Node>,
    },
    /// `receiver.message = value` / `receiver[index] = value`
    AttrAssign {
        receiver: Box<Node>,
        message: String,
        args: Vec<Node>,
    },
    Super {
        args: Vec<Node>,
        parens: bool,
    },
    Yield {
        args: Vec<Node>,
    },

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------
    Assignment {
        identifier: Box<Node>,
        value: Box<Node>,
    },
    OpAssign {
        op: String,
        name: Box<Node>,
        value: Box<Node>,
    },
    OpAssignAnd {
        name: Box<Node>,
        value: Box<Node>,
    },
    OpAssignOr {
        name: Box<Node>,
        value: Box<Node>,
    },
    /// `receiver.attr += value` / `receiver[index] += value`
    OpAssignAccessor {
        op: String,
        receiver: Box<Node>,
        message: String,
        args: Vec<Node>,
        value: Box<Node>,
    },
    MultipleAssignment {
        nodes: Vec<Node>,
    },
    Splat {
        node: Option<Box<Node>>,
    },
    /// A splat on the value side of an assignment
    SplatValue {
        value: Box<Node>,
    },
    /// Wraps the value of a multiple assignment
    ToArray {
        value: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------
    If {
        condition: Box<Node>,
        true_expr: Box<Node>,
        false_expr: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
        /// true when the condition is checked before the first iteration
        pre: bool,
    },
    Until {
        condition: Box<Node>,
        body: Box<Node>,
        pre: bool,
    },
    Case {
        subject: Box<Node>,
        clauses: Vec<Node>,
        else_body: Option<Box<Node>>,
    },
    CaseWhen {
        condition: Box<Node>,
        body: Box<Node>,
    },
    CaseIn {
        pattern: Box<Node>,
        body: Box<Node>,
    },
    Begin {
        body: Box<Node>,
        rescue_nodes: Vec<Node>,
        else_body: Option<Box<Node>>,
        ensure_body: Option<Box<Node>>,
    },
    BeginRescue {
        exceptions: Vec<Node>,
        name: Option<Box<Node>>,
        body: Box<Node>,
    },
    Break {
        arg: Option<Box<Node>>,
    },
    Next {
        arg: Option<Box<Node>>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    LogicalAnd {
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalOr {
        left: Box<Node>,
        right: Box<Node>,
    },
    Not {
        expression: Box<Node>,
    },
    Defined {
        arg: Box<Node>,
    },
    /// The statement sequence of a body (file, method, block arm)
    Block {
        nodes: Vec<Node>,
    },

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------
    Class {
        name: Box<Node>,
        superclass: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// `class << target`
    Sclass {
        target: Box<Node>,
        body: Box<Node>,
    },
    Module {
        name: Box<Node>,
        body: Box<Node>,
    },
    Def {
        self_node: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
        body: Box<Node>,
    },
    Arg {
        name: String,
        splat: bool,
        kwsplat: bool,
        block_arg: bool,
        value: Option<Box<Node>>,
    },
    KeywordArg {
        name: String,
        value: Option<Box<Node>>,
    },
    KeywordSplat {
        node: Option<Box<Node>>,
    },
    BlockPass {
        node: Box<Node>,
    },
    /// A call with an attached block
    Iter {
        call: Box<Node>,
        args: Vec<Node>,
        body: Box<Node>,
    },
    /// `-> (args) { ... }` without its body attached yet
    StabbyProc {
        args: Vec<Node>,
    },
    Alias {
        new_name: Box<Node>,
        existing_name: Box<Node>,
    },
    Undef {
        names: Vec<Node>,
    },

    // ------------------------------------------------------------------
    // Interpolated literals
    // ------------------------------------------------------------------
    InterpolatedString {
        nodes: Vec<Node>,
    },
    InterpolatedShell {
        nodes: Vec<Node>,
    },
    InterpolatedRegexp {
        nodes: Vec<Node>,
        options: String,
    },
    EvaluateToString {
        node: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Patterns (case/in)
    // ------------------------------------------------------------------
    ArrayPattern {
        nodes: Vec<Node>,
    },
    HashPattern {
        nodes: Vec<Node>,
    },
    Pin {
        identifier: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------
    Match {
        regexp: Box<Node>,
        arg: Box<Node>,
        regexp_on_left: bool,
    },
}

impl NodeKind {
    /// The statement list of a `Block`, or a single-element view of any
    /// other node (used where bodies are expected)
    pub fn block_nodes(&self) -> Option<&[Node]> {
        match self {
            NodeKind::Block { nodes } => Some(nodes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beryl_lex::TokenKind;

    fn token(kind: TokenKind) -> Token {
        Token::new(kind, "test.rbl".into(), 3, 7)
    }

    fn named_token(kind: TokenKind, name: &str) -> Token {
        Token::with_literal(kind, name, "test.rbl".into(), 0, 0)
    }

    #[test]
    fn node_carries_location() {
        let node = Node::new(token(TokenKind::NilKeyword), NodeKind::Nil);
        assert_eq!(node.file(), "test.rbl");
        assert_eq!(node.line(), 3);
        assert_eq!(node.column(), 7);
    }

    #[test]
    fn callable_depends_on_lvar_flag() {
        let call_shaped = Node::new(
            named_token(TokenKind::BareName, "foo"),
            NodeKind::Identifier { is_lvar: false },
        );
        assert!(call_shaped.is_callable());

        let lvar = Node::new(
            named_token(TokenKind::BareName, "foo"),
            NodeKind::Identifier { is_lvar: true },
        );
        assert!(!lvar.is_callable());
        assert!(lvar.is_lvar());

        let ivar = Node::new(
            named_token(TokenKind::InstanceVariable, "@foo"),
            NodeKind::Identifier { is_lvar: false },
        );
        assert!(!ivar.is_callable());
    }

    #[test]
    fn name_reads_from_token() {
        let node = Node::new(
            named_token(TokenKind::Constant, "Foo"),
            NodeKind::Constant,
        );
        assert_eq!(node.name(), Some("Foo"));
    }
}
