//! Parser behavior tests: precedence, local-variable tracking, call
//! shapes, control flow, definitions, patterns, and error reporting.

use crate::ast::NodeKind;
use crate::{Parser, SyntaxError};

/// Parse and render the whole program
fn parse(source: &str) -> String {
    Parser::new(source, "test.rbl")
        .sexp()
        .unwrap_or_else(|e| panic!("parse failed: {}", e))
        .to_string()
}

/// Parse and render the nth top-level statement
fn nth(source: &str, index: usize) -> String {
    let mut parser = Parser::new(source, "test.rbl");
    let tree = parser.tree().unwrap_or_else(|e| panic!("parse failed: {}", e));
    match tree.kind() {
        NodeKind::Block { nodes } => nodes[index].to_sexp().to_string(),
        _ => panic!("tree root is not a block"),
    }
}

/// Parse and render the first top-level statement
fn first(source: &str) -> String {
    nth(source, 0)
}

fn parse_err(source: &str) -> SyntaxError {
    *Parser::new(source, "test.rbl")
        .tree()
        .expect_err("expected a syntax error")
}

// ----------------------------------------------------------------------------
// Precedence
// ----------------------------------------------------------------------------

#[test]
fn simple_addition() {
    assert_eq!(first("1 + 2"), "s(:call, s(:lit, 1), :+, s(:lit, 2))");
}

#[test]
fn product_binds_tighter_than_sum() {
    assert_eq!(
        first("a + b * c"),
        "s(:call, s(:call, nil, :a), :+, s(:call, s(:call, nil, :b), :*, s(:call, nil, :c)))"
    );
}

#[test]
fn parens_override_precedence() {
    assert_eq!(
        first("(a + b) * c"),
        "s(:call, s(:call, s(:call, nil, :a), :+, s(:call, nil, :b)), :*, s(:call, nil, :c))"
    );
}

#[test]
fn same_precedence_is_left_associative() {
    assert_eq!(
        first("a - b - c"),
        "s(:call, s(:call, s(:call, nil, :a), :-, s(:call, nil, :b)), :-, s(:call, nil, :c))"
    );
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(
        first("x = y = 1"),
        "s(:lasgn, :x, s(:lasgn, :y, s(:lit, 1)))"
    );
}

#[test]
fn comparison_binds_tighter_than_logic() {
    assert_eq!(
        first("a < b && c > d"),
        "s(:and, s(:call, s(:call, nil, :a), :<, s(:call, nil, :b)), \
s(:call, s(:call, nil, :c), :>, s(:call, nil, :d)))"
    );
}

// ----------------------------------------------------------------------------
// Local-variable tracking
// ----------------------------------------------------------------------------

#[test]
fn assignment_makes_later_uses_lvars() {
    assert_eq!(
        parse("x = 1\nx"),
        "s(:block, s(:lasgn, :x, s(:lit, 1)), s(:lvar, :x))"
    );
}

#[test]
fn bare_name_without_assignment_is_a_call() {
    assert_eq!(first("x"), "s(:call, nil, :x)");
}

#[test]
fn def_resets_local_tracking() {
    assert_eq!(
        nth("x = 1\ndef f\nx\nend", 1),
        "s(:defn, :f, s(:args), s(:block, s(:call, nil, :x)))"
    );
}

#[test]
fn blocks_share_enclosing_scope() {
    assert_eq!(
        nth("x = 1\nfoo { x }", 1),
        "s(:iter, s(:call, nil, :foo), s(:args), s(:block, s(:lvar, :x)))"
    );
}

#[test]
fn or_assign_introduces_a_local() {
    assert_eq!(
        parse("x ||= 1\nx"),
        "s(:block, s(:op_asgn_or, s(:call, nil, :x), s(:lasgn, :x, s(:lit, 1))), s(:lvar, :x))"
    );
}

// ----------------------------------------------------------------------------
// Calls
// ----------------------------------------------------------------------------

#[test]
fn call_without_parens_takes_args() {
    assert_eq!(
        first("foo bar, baz"),
        "s(:call, nil, :foo, s(:call, nil, :bar), s(:call, nil, :baz))"
    );
}

#[test]
fn call_with_parens() {
    assert_eq!(first("foo(1, 2)"), "s(:call, nil, :foo, s(:lit, 1), s(:lit, 2))");
}

#[test]
fn method_chain() {
    assert_eq!(
        first("a.b.c"),
        "s(:call, s(:call, s(:call, nil, :a), :b), :c)"
    );
}

#[test]
fn safe_navigation() {
    assert_eq!(first("a&.b"), "s(:safe_call, s(:call, nil, :a), :b)");
}

#[test]
fn operator_method_call() {
    assert_eq!(first("a.+(1)"), "s(:call, s(:call, nil, :a), :+, s(:lit, 1))");
}

#[test]
fn splat_block_pass_and_kwargs() {
    assert_eq!(
        first("foo(*args)"),
        "s(:call, nil, :foo, s(:splat, s(:call, nil, :args)))"
    );
    assert_eq!(
        first("foo(&blk)"),
        "s(:call, nil, :foo, s(:block_pass, s(:call, nil, :blk)))"
    );
    assert_eq!(
        first("foo(a: 1)"),
        "s(:call, nil, :foo, s(:hash, s(:lit, :a), s(:lit, 1)))"
    );
}

#[test]
fn element_reference_vs_array_argument() {
    // no whitespace: element reference
    assert_eq!(first("a[0]"), "s(:call, s(:call, nil, :a), :[], s(:lit, 0))");
    // whitespace and unknown receiver: array literal argument
    assert_eq!(first("a [0]"), "s(:call, nil, :a, s(:array, s(:lit, 0)))");
    // whitespace but known local: still element reference
    assert_eq!(
        nth("a = [1]\na [0]", 1),
        "s(:call, s(:lvar, :a), :[], s(:lit, 0))"
    );
}

#[test]
fn attr_assignment() {
    assert_eq!(
        first("foo.bar = 1"),
        "s(:attrasgn, s(:call, nil, :foo), :bar=, s(:lit, 1))"
    );
    assert_eq!(
        first("a[0] = 1"),
        "s(:attrasgn, s(:call, nil, :a), :[]=, s(:lit, 0), s(:lit, 1))"
    );
}

#[test]
fn op_assign_accessor() {
    assert_eq!(
        first("h[:k] += 1"),
        "s(:op_asgn_accessor, s(:call, nil, :h), :[], :+, s(:lit, :k), s(:lit, 1))"
    );
}

#[test]
fn constant_resolution() {
    assert_eq!(first("Foo::Bar"), "s(:colon2, s(:const, :Foo), :Bar)");
    assert_eq!(first("::Foo"), "s(:colon3, :Foo)");
    assert_eq!(first("Foo::bar"), "s(:call, s(:const, :Foo), :bar)");
}

// ----------------------------------------------------------------------------
// Assignment forms
// ----------------------------------------------------------------------------

#[test]
fn op_assign() {
    assert_eq!(
        nth("x = 1\nx += 2", 1),
        "s(:op_asgn, s(:lvar, :x), :+, s(:lit, 2))"
    );
}

#[test]
fn multiple_assignment() {
    assert_eq!(
        first("a, b = 1, 2"),
        "s(:masgn, s(:array, s(:lasgn, :a), s(:lasgn, :b)), \
s(:to_ary, s(:array, s(:lit, 1), s(:lit, 2))))"
    );
}

#[test]
fn multiple_assignment_with_splat() {
    assert_eq!(
        first("a, *b = arr"),
        "s(:masgn, s(:array, s(:lasgn, :a), s(:splat, s(:lasgn, :b))), \
s(:to_ary, s(:call, nil, :arr)))"
    );
}

#[test]
fn masgn_registers_locals() {
    assert_eq!(
        nth("a, b = 1, 2\na", 1),
        "s(:lvar, :a)"
    );
}

#[test]
fn assignment_value_list_becomes_array() {
    assert_eq!(
        first("a = 1, 2"),
        "s(:lasgn, :a, s(:svalue, s(:array, s(:lit, 1), s(:lit, 2))))"
    );
}

#[test]
fn ivar_gvar_cvar_assignment() {
    assert_eq!(first("@a = 1"), "s(:iasgn, :@a, s(:lit, 1))");
    assert_eq!(first("$a = 1"), "s(:gasgn, :$a, s(:lit, 1))");
    assert_eq!(first("@@a = 1"), "s(:cvdecl, :@@a, s(:lit, 1))");
    assert_eq!(first("A = 1"), "s(:cdecl, :A, s(:lit, 1))");
}

// ----------------------------------------------------------------------------
// Control flow
// ----------------------------------------------------------------------------

#[test]
fn if_else() {
    assert_eq!(
        first("if a\nb\nelse\nc\nend"),
        "s(:if, s(:call, nil, :a), s(:call, nil, :b), s(:call, nil, :c))"
    );
}

#[test]
fn if_elsif_chain() {
    assert_eq!(
        first("if a then b elsif c then d end"),
        "s(:if, s(:call, nil, :a), s(:call, nil, :b), \
s(:if, s(:call, nil, :c), s(:call, nil, :d), nil))"
    );
}

#[test]
fn unless_swaps_branches() {
    assert_eq!(
        first("unless a\nb\nend"),
        "s(:if, s(:call, nil, :a), nil, s(:call, nil, :b))"
    );
}

#[test]
fn modifier_forms() {
    assert_eq!(
        first("a if b"),
        "s(:if, s(:call, nil, :b), s(:call, nil, :a), nil)"
    );
    assert_eq!(
        first("a unless b"),
        "s(:if, s(:call, nil, :b), nil, s(:call, nil, :a))"
    );
    assert_eq!(
        first("a while b"),
        "s(:while, s(:call, nil, :b), s(:call, nil, :a), true)"
    );
}

#[test]
fn while_loop() {
    assert_eq!(
        first("while x\ny\nend"),
        "s(:while, s(:call, nil, :x), s(:block, s(:call, nil, :y)), true)"
    );
    assert_eq!(
        first("until x\ny\nend"),
        "s(:until, s(:call, nil, :x), s(:block, s(:call, nil, :y)), true)"
    );
}

#[test]
fn while_with_do_keyword() {
    // `do` closes the loop condition instead of opening a block
    assert_eq!(
        first("while x do\ny\nend"),
        "s(:while, s(:call, nil, :x), s(:block, s(:call, nil, :y)), true)"
    );
}

#[test]
fn begin_end_while_is_post_checked() {
    assert_eq!(
        first("begin\na\nend while b"),
        "s(:while, s(:call, nil, :b), \
s(:begin, s(:block, s(:call, nil, :a)), nil, nil), false)"
    );
}

#[test]
fn ternary() {
    assert_eq!(
        first("a ? b : c"),
        "s(:if, s(:call, nil, :a), s(:call, nil, :b), s(:call, nil, :c))"
    );
}

#[test]
fn ranges() {
    assert_eq!(first("1..5"), "s(:dot2, s(:lit, 1), s(:lit, 5))");
    assert_eq!(first("1...5"), "s(:dot3, s(:lit, 1), s(:lit, 5))");
    assert_eq!(first("1.."), "s(:dot2, s(:lit, 1), nil)");
    assert_eq!(first("..5"), "s(:dot2, nil, s(:lit, 5))");
}

#[test]
fn case_when() {
    assert_eq!(
        first("case x\nwhen 1, 2\na\nelse\nc\nend"),
        "s(:case, s(:call, nil, :x), \
s(:when, s(:array, s(:lit, 1), s(:lit, 2)), s(:block, s(:call, nil, :a))), \
s(:block, s(:call, nil, :c)))"
    );
}

#[test]
fn case_in_array_pattern() {
    assert_eq!(
        first("case x\nin [1, y]\ny\nend"),
        "s(:case, s(:call, nil, :x), \
s(:in, s(:array_pat, s(:lit, 1), s(:lvar, :y)), s(:block, s(:lvar, :y))), nil)"
    );
}

#[test]
fn case_in_hash_pattern_and_pin() {
    assert_eq!(
        nth("z = 1\ncase x\nin {a: 1, b:}\nb\nin ^z\nz\nend", 1),
        "s(:case, s(:call, nil, :x), \
s(:in, s(:hash_pat, s(:lit, :a), s(:lit, 1), s(:lit, :b), nil), s(:block, s(:lvar, :b))), \
s(:in, s(:pin, s(:lvar, :z)), s(:block, s(:lvar, :z))), nil)"
    );
}

#[test]
fn begin_rescue_ensure() {
    assert_eq!(
        first("begin\na\nrescue Foo => e\ne\nensure\nb\nend"),
        "s(:begin, s(:block, s(:call, nil, :a)), \
s(:resbody, s(:array, s(:const, :Foo)), s(:lvar, :e), s(:block, s(:lvar, :e))), \
nil, s(:block, s(:call, nil, :b)))"
    );
}

#[test]
fn jumps() {
    assert_eq!(first("break"), "s(:break)");
    assert_eq!(first("next 1"), "s(:next, s(:lit, 1))");
    assert_eq!(first("return x"), "s(:return, s(:call, nil, :x))");
}

#[test]
fn logical_operators() {
    assert_eq!(
        first("a && b"),
        "s(:and, s(:call, nil, :a), s(:call, nil, :b))"
    );
    assert_eq!(
        first("a or b"),
        "s(:or, s(:call, nil, :a), s(:call, nil, :b))"
    );
    assert_eq!(first("not a"), "s(:not, s(:call, nil, :a))");
    assert_eq!(first("!a"), "s(:not, s(:call, nil, :a))");
}

#[test]
fn unary_operators() {
    assert_eq!(first("-a"), "s(:call, s(:call, nil, :a), :-@)");
    assert_eq!(first("~a"), "s(:call, s(:call, nil, :a), :~)");
}

#[test]
fn signed_literal() {
    assert_eq!(first("x = -3"), "s(:lasgn, :x, s(:lit, -3))");
}

// ----------------------------------------------------------------------------
// Definitions
// ----------------------------------------------------------------------------

#[test]
fn def_with_full_argument_list() {
    assert_eq!(
        first("def add(a, b = 1, *rest, key: 2, **opts, &blk)\na\nend"),
        "s(:defn, :add, s(:args, :a, s(:optarg, :b, s(:lit, 1)), :*rest, \
s(:kwarg, :key, s(:lit, 2)), :**opts, :&blk), s(:block, s(:lvar, :a)))"
    );
}

#[test]
fn def_self_and_writer() {
    assert_eq!(
        first("def self.run\nend"),
        "s(:defs, s(:self), :run, s(:args), s(:block))"
    );
    assert_eq!(
        first("def name=(value)\nend"),
        "s(:defn, :name=, s(:args, :value), s(:block))"
    );
    assert_eq!(
        first("def ==(other)\nend"),
        "s(:defn, :==, s(:args, :other), s(:block))"
    );
    assert_eq!(
        first("def [](index)\nend"),
        "s(:defn, :[], s(:args, :index), s(:block))"
    );
}

#[test]
fn class_with_superclass() {
    assert_eq!(
        first("class Foo < Bar\ndef baz\nend\nend"),
        "s(:class, :Foo, s(:const, :Bar), \
s(:block, s(:defn, :baz, s(:args), s(:block))))"
    );
}

#[test]
fn namespaced_class_and_module() {
    assert_eq!(
        first("class Foo::Bar\nend"),
        "s(:class, s(:colon2, s(:const, :Foo), :Bar), nil, s(:block))"
    );
    assert_eq!(
        first("module Baz\nend"),
        "s(:module, :Baz, s(:block))"
    );
}

#[test]
fn singleton_class() {
    assert_eq!(
        first("class << self\nend"),
        "s(:sclass, s(:self), s(:block))"
    );
}

#[test]
fn iter_with_do_end_and_braces() {
    assert_eq!(
        first("foo.each do |x|\nx\nend"),
        "s(:iter, s(:call, s(:call, nil, :foo), :each), s(:args, :x), s(:block, s(:lvar, :x)))"
    );
    assert_eq!(
        first("foo { |x, *rest| x }"),
        "s(:iter, s(:call, nil, :foo), s(:args, :x, :*rest), s(:block, s(:lvar, :x)))"
    );
}

#[test]
fn stabby_proc() {
    assert_eq!(
        first("-> (x) { x }"),
        "s(:iter, s(:lambda), s(:args, :x), s(:block, s(:lvar, :x)))"
    );
}

#[test]
fn super_forms() {
    assert_eq!(first("super"), "s(:zsuper)");
    assert_eq!(first("super()"), "s(:super)");
    assert_eq!(first("super a"), "s(:super, s(:call, nil, :a))");
}

#[test]
fn yield_forms() {
    assert_eq!(first("yield"), "s(:yield)");
    assert_eq!(first("yield 1, 2"), "s(:yield, s(:lit, 1), s(:lit, 2))");
}

#[test]
fn alias_and_undef() {
    assert_eq!(
        first("alias new_name old_name"),
        "s(:alias, s(:lit, :new_name), s(:lit, :old_name))"
    );
    assert_eq!(
        first("undef foo, bar"),
        "s(:undef, s(:lit, :foo), s(:lit, :bar))"
    );
}

#[test]
fn defined_keyword() {
    assert_eq!(first("defined?(a)"), "s(:defined, s(:call, nil, :a))");
}

// ----------------------------------------------------------------------------
// Literals
// ----------------------------------------------------------------------------

#[test]
fn string_literals() {
    assert_eq!(first("'raw'"), "s(:str, \"raw\")");
    assert_eq!(first("\"hi\""), "s(:dstr, \"hi\")");
    assert_eq!(
        first("\"a#{b}c\""),
        "s(:dstr, \"a\", s(:evstr, s(:call, nil, :b)), s(:str, \"c\"))"
    );
}

#[test]
fn word_and_symbol_arrays() {
    assert_eq!(
        first("%w[a b]"),
        "s(:array, s(:str, \"a\"), s(:str, \"b\"))"
    );
    assert_eq!(
        first("%i[a b]"),
        "s(:array, s(:lit, :a), s(:lit, :b))"
    );
}

#[test]
fn hash_literal() {
    assert_eq!(
        first("{ a: 1, \"b\" => 2 }"),
        "s(:hash, s(:lit, :a), s(:lit, 1), s(:dstr, \"b\"), s(:lit, 2))"
    );
}

#[test]
fn regexp_match_operators() {
    assert_eq!(
        first("a =~ /foo/i"),
        "s(:match3, s(:regexp, \"foo\", \"i\"), s(:call, nil, :a))"
    );
    assert_eq!(
        first("/foo/ =~ a"),
        "s(:match2, s(:regexp, \"foo\", \"\"), s(:call, nil, :a))"
    );
    assert_eq!(
        first("a !~ b"),
        "s(:not, s(:call, s(:call, nil, :a), :=~, s(:call, nil, :b)))"
    );
}

#[test]
fn file_and_line_keywords() {
    assert_eq!(first("__FILE__"), "s(:str, \"test.rbl\")");
    assert_eq!(first("x = __LINE__"), "s(:lasgn, :x, s(:lit, 1))");
}

#[test]
fn heredoc_through_the_parser() {
    assert_eq!(
        parse("x = <<~EOF\n  hi\nEOF\nx"),
        "s(:block, s(:lasgn, :x, s(:dstr, \"hi\\n\")), s(:lvar, :x))"
    );
}

// ----------------------------------------------------------------------------
// Determinism and locations
// ----------------------------------------------------------------------------

#[test]
fn parsing_is_deterministic() {
    let source = "def f(a)\n  a.map { |x| x * 2 }\nend\nf([1, 2])\n";
    assert_eq!(parse(source), parse(source));
}

#[test]
fn sexp_carries_location_metadata() {
    let mut parser = Parser::new("foo(1)\nbar(2)", "loc.rbl");
    let tree = parser.tree().unwrap();
    let nodes = match tree.kind() {
        NodeKind::Block { nodes } => nodes,
        _ => panic!(),
    };
    match nodes[1].to_sexp() {
        crate::Sexp::List(list) => {
            assert_eq!(&*list.file, "loc.rbl");
            assert_eq!(list.line, 1);
            assert_eq!(list.column, 0);
        },
        _ => panic!("expected a list"),
    }
}

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

#[test]
fn error_reports_file_and_line() {
    let err = parse_err("x = 1\ny = (2 +\n");
    assert_eq!(err.file, "test.rbl");
    assert!(err.message.contains("end-of-input"), "got: {}", err.message);
}

#[test]
fn error_names_the_offending_token() {
    let err = parse_err("def 1\nend");
    assert!(err.message.contains("integer"), "got: {}", err.message);
    assert!(err.message.contains("method name"), "got: {}", err.message);
    assert_eq!(err.line, 1);
    assert_eq!(err.excerpt, "def 1");
}

#[test]
fn unterminated_string_error() {
    let err = parse_err("'abc");
    assert!(err.message.contains("unterminated string"), "got: {}", err.message);
    assert!(err.message.contains("abc"), "got: {}", err.message);
}

#[test]
fn unterminated_regexp_error() {
    let err = parse_err("x = /abc");
    assert!(err.message.contains("unterminated regexp"), "got: {}", err.message);
}

#[test]
fn stray_end_is_an_error() {
    let err = parse_err("end");
    assert!(err.message.contains("unexpected"), "got: {}", err.message);
}

// ----------------------------------------------------------------------------
// Properties
// ----------------------------------------------------------------------------

mod props {
    use super::*;
    use proptest::prelude::*;

    fn expr_strategy() -> impl Strategy<Value = String> {
        let atom = prop_oneof![
            "[a-z][a-z0-9_]{0,4}".prop_map(|s| s),
            (0u32..1000).prop_map(|n| n.to_string()),
        ];
        (
            atom.clone(),
            proptest::collection::vec(
                (prop_oneof!["\\+", "\\-", "\\*", "==", "<", "&&", "\\|\\|"], atom),
                0..4,
            ),
        )
            .prop_map(|(first, rest)| {
                let mut out = first;
                for (op, operand) in rest {
                    out.push(' ');
                    out.push_str(&op);
                    out.push(' ');
                    out.push_str(&operand);
                }
                out
            })
    }

    proptest! {
        // parsing is a pure function of source bytes and file label
        #[test]
        fn parsing_is_a_pure_function(source in expr_strategy()) {
            let a = Parser::new(source.clone(), "prop.rbl").sexp();
            let b = Parser::new(source, "prop.rbl").sexp();
            match (a, b) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                _ => prop_assert!(false, "one parse failed, the other did not"),
            }
        }

        // `a op1 b op2 c` groups left iff op1 binds at least as tightly
        #[test]
        fn same_or_higher_precedence_groups_left(
            op1 in prop_oneof!["\\+", "\\*", "=="],
            op2 in prop_oneof!["\\+", "\\*", "=="],
        ) {
            fn prec(op: &str) -> u8 {
                match op {
                    "==" => 1,
                    "+" => 2,
                    _ => 3,
                }
            }
            let source = format!("a {} b {} c", op1, op2);
            let rendered = Parser::new(source, "prop.rbl").sexp().unwrap().to_string();
            let left_grouped_head =
                format!("s(:block, s(:call, s(:call, s(:call, nil, :a), :{},", op1);
            if prec(&op1) >= prec(&op2) {
                prop_assert!(rendered.starts_with(&left_grouped_head), "got {}", rendered);
            } else {
                prop_assert!(!rendered.starts_with(&left_grouped_head), "got {}", rendered);
            }
        }
    }
}
