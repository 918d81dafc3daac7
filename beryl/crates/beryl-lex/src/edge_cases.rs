//! Lexer behavior tests, including the context-sensitive corners.

use crate::token::{Token, TokenKind};
use crate::Lexer;

fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source, "test.rbl").tokens()
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).iter().map(|t| t.kind()).collect()
}

fn literals(source: &str) -> Vec<String> {
    lex(source)
        .iter()
        .filter_map(|t| t.literal().map(String::from))
        .collect()
}

#[test]
fn lexes_simple_arithmetic() {
    let tokens = lex("1 + 2");
    assert_eq!(
        tokens.iter().map(|t| t.kind()).collect::<Vec<_>>(),
        vec![
            TokenKind::Integer,
            TokenKind::Plus,
            TokenKind::Integer,
            TokenKind::Eof
        ]
    );
    assert_eq!(tokens[0].integer(), 1);
    assert_eq!(tokens[2].integer(), 2);
}

#[test]
fn tracks_lines_and_columns() {
    let tokens = lex("foo\n  bar");
    assert_eq!(tokens[0].line(), 0);
    assert_eq!(tokens[0].column(), 0);
    // tokens[1] is the newline
    assert_eq!(tokens[2].line(), 1);
    assert_eq!(tokens[2].column(), 2);
    assert_eq!(&**tokens[2].file(), "test.rbl");
}

// ----------------------------------------------------------------------------
// Numbers
// ----------------------------------------------------------------------------

#[test]
fn lexes_number_bases() {
    assert_eq!(lex("0x1F")[0].integer(), 31);
    assert_eq!(lex("0b1010")[0].integer(), 10);
    assert_eq!(lex("0o777")[0].integer(), 511);
    assert_eq!(lex("0d42")[0].integer(), 42);
    assert_eq!(lex("1_000_000")[0].integer(), 1_000_000);
}

#[test]
fn lexes_floats() {
    let tokens = lex("3.14");
    assert_eq!(tokens[0].kind(), TokenKind::Float);
    assert!((tokens[0].float() - 3.14).abs() < f64::EPSILON);
    // a bare trailing dot is a method-call dot, not a float
    assert_eq!(
        kinds("3.foo"),
        vec![
            TokenKind::Integer,
            TokenKind::Dot,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
}

#[test]
fn number_with_alpha_suffix_is_invalid() {
    let tokens = lex("123abc");
    assert_eq!(tokens[0].kind(), TokenKind::Invalid);
}

#[test]
fn signed_literal_only_after_non_expression() {
    // after `=` the minus is a sign
    let tokens = lex("x = -3");
    assert_eq!(tokens[2].kind(), TokenKind::Integer);
    assert_eq!(tokens[2].integer(), -3);
    assert!(tokens[2].has_sign());

    // after an identifier the minus is a binary operator... but since the
    // digit follows directly, the signed literal carries the sign flag so
    // the parser can treat it as a subtraction
    let tokens = lex("a -1");
    assert_eq!(tokens[0].kind(), TokenKind::BareName);
    assert_eq!(tokens[1].kind(), TokenKind::Minus);
    assert_eq!(tokens[2].kind(), TokenKind::Integer);
}

// ----------------------------------------------------------------------------
// Regexp vs. division
// ----------------------------------------------------------------------------

#[test]
fn slash_after_comma_is_regexp() {
    let tokens = lex("foo(a, /foo/i)");
    let regexp_end = tokens
        .iter()
        .find(|t| t.kind() == TokenKind::InterpolatedRegexpEnd)
        .expect("expected a regexp");
    assert_eq!(regexp_end.options(), Some("i"));
}

#[test]
fn slash_after_identifier_is_division() {
    assert_eq!(
        kinds("a / b"),
        vec![
            TokenKind::BareName,
            TokenKind::Divide,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
    // no space after the slash but whitespace before: still division when
    // the slash is directly followed by a space
    assert!(kinds("a/b").contains(&TokenKind::Divide));
}

#[test]
fn slash_at_start_is_regexp() {
    let tokens = lex("/foo/");
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedRegexpBegin);
}

#[test]
fn slash_after_def_is_division() {
    // `def /` would otherwise try to lex a regexp method name
    assert!(kinds("def /(other) end").contains(&TokenKind::Divide));
}

#[test]
fn percent_r_is_regexp() {
    let tokens = lex("%r{ab}x");
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedRegexpBegin);
    let end = tokens
        .iter()
        .find(|t| t.kind() == TokenKind::InterpolatedRegexpEnd)
        .unwrap();
    assert_eq!(end.options(), Some("x"));
}

// ----------------------------------------------------------------------------
// Strings
// ----------------------------------------------------------------------------

#[test]
fn single_quoted_string_is_raw() {
    let tokens = lex(r"'a\nb\'c'");
    assert_eq!(tokens[0].kind(), TokenKind::String);
    assert_eq!(tokens[0].literal(), Some(r"a\nb'c"));
}

#[test]
fn double_quoted_string_translates_escapes() {
    let tokens = lex("\"a\\nb\\tc\\\"d\"");
    // double-quoted strings expand to an interpolation run
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedStringBegin);
    assert_eq!(tokens[1].kind(), TokenKind::String);
    assert_eq!(tokens[1].literal(), Some("a\nb\tc\"d"));
    assert_eq!(tokens[2].kind(), TokenKind::InterpolatedStringEnd);
}

#[test]
fn interpolation_expands_to_nested_tokens() {
    let tokens = lex("\"a#{1 + 2}b\"");
    let expected = vec![
        TokenKind::InterpolatedStringBegin,
        TokenKind::String,
        TokenKind::EvaluateToStringBegin,
        TokenKind::Integer,
        TokenKind::Plus,
        TokenKind::Integer,
        TokenKind::Eol,
        TokenKind::EvaluateToStringEnd,
        TokenKind::String,
        TokenKind::InterpolatedStringEnd,
        TokenKind::Eof,
    ];
    assert_eq!(tokens.iter().map(|t| t.kind()).collect::<Vec<_>>(), expected);
}

#[test]
fn interpolation_at_start_emits_empty_chunk() {
    let tokens = lex("\"#{x}\"");
    assert_eq!(tokens[1].kind(), TokenKind::String);
    assert_eq!(tokens[1].literal(), Some(""));
}

#[test]
fn nested_interpolation() {
    let tokens = lex("\"#{\"#{x}\"}\"");
    let begins = tokens
        .iter()
        .filter(|t| t.kind() == TokenKind::EvaluateToStringBegin)
        .count();
    assert_eq!(begins, 2);
}

#[test]
fn shell_string_expands_like_a_string() {
    let tokens = lex("`ls #{dir}`");
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedShellBegin);
    assert!(tokens
        .iter()
        .any(|t| t.kind() == TokenKind::InterpolatedShellEnd));
}

#[test]
fn percent_q_strings() {
    assert_eq!(lex("%q{a b}")[0].literal(), Some("a b"));
    assert_eq!(lex("%(a b)")[0].kind(), TokenKind::String);
    // %Q is interpolable
    assert_eq!(lex("%Q{a}")[0].kind(), TokenKind::InterpolatedStringBegin);
}

#[test]
fn unterminated_string_carries_partial() {
    let tokens = lex("'abc");
    assert_eq!(tokens[0].kind(), TokenKind::UnterminatedString);
    assert_eq!(tokens[0].literal(), Some("abc"));
    // the stream stops at the invalid token
    assert_eq!(tokens.len(), 1);
}

// ----------------------------------------------------------------------------
// Word arrays
// ----------------------------------------------------------------------------

#[test]
fn word_arrays_collapse_whitespace() {
    assert_eq!(literals("%w[a  b\n c]"), vec!["a b c"]);
    assert_eq!(lex("%w[a b]")[0].kind(), TokenKind::PercentLowerW);
    assert_eq!(lex("%i[a b]")[0].kind(), TokenKind::PercentLowerI);
    assert_eq!(lex("%W[a b]")[0].kind(), TokenKind::PercentUpperW);
    assert_eq!(lex("%I[a b]")[0].kind(), TokenKind::PercentUpperI);
}

// ----------------------------------------------------------------------------
// Heredocs
// ----------------------------------------------------------------------------

#[test]
fn heredoc_with_dash_keeps_indent() {
    let tokens = lex("<<-HEREDOC\n  hello\n  HEREDOC\n");
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedStringBegin);
    assert_eq!(tokens[1].literal(), Some("  hello\n"));
}

#[test]
fn heredoc_plain_requires_terminator_at_column_zero() {
    let tokens = lex("<<EOF\nbody\nEOF\n");
    assert_eq!(tokens[1].literal(), Some("body\n"));

    let tokens = lex("<<EOF\nbody\n  EOF\n");
    assert_eq!(tokens[0].kind(), TokenKind::UnterminatedString);
}

#[test]
fn heredoc_squiggly_dedents() {
    let tokens = lex("<<~EOF\n    a\n      b\n    EOF\n");
    assert_eq!(tokens[1].literal(), Some("a\n  b\n"));
}

#[test]
fn heredoc_tokens_on_start_line_come_first() {
    let tokens = lex("foo(<<EOF, 2)\nbody\nEOF\nbar");
    let k: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
    // foo ( <<EOF , 2 ) \n ... bar
    assert_eq!(k[0], TokenKind::BareName);
    assert_eq!(k[1], TokenKind::LParen);
    assert_eq!(k[2], TokenKind::InterpolatedStringBegin);
    assert_eq!(k[5], TokenKind::Comma);
    assert_eq!(k[6], TokenKind::Integer);
    assert_eq!(k[7], TokenKind::RParen);
    // after the newline the lexer resumed past the heredoc body
    let bar = tokens.iter().find(|t| t.literal() == Some("bar"));
    assert!(bar.is_some());
}

#[test]
fn heredoc_quoted_names() {
    let tokens = lex("<<'EOF'\na#{b}\nEOF\n");
    // single-quoted heredoc is raw: no interpolation run
    assert_eq!(tokens[0].kind(), TokenKind::String);
    assert_eq!(tokens[0].literal(), Some("a#{b}\n"));

    let tokens = lex("<<\"EOF\"\nx\nEOF\n");
    assert_eq!(tokens[0].kind(), TokenKind::InterpolatedStringBegin);
}

#[test]
fn left_shift_is_not_a_heredoc() {
    assert_eq!(
        kinds("a << 1"),
        vec![
            TokenKind::BareName,
            TokenKind::LeftShift,
            TokenKind::Integer,
            TokenKind::Eof
        ]
    );
    assert!(kinds("a <<= 1").contains(&TokenKind::LeftShiftEqual));
}

// ----------------------------------------------------------------------------
// Symbols
// ----------------------------------------------------------------------------

#[test]
fn lexes_symbols() {
    assert_eq!(literals(":foo"), vec!["foo"]);
    assert_eq!(literals(":foo?"), vec!["foo?"]);
    assert_eq!(literals(":@ivar"), vec!["@ivar"]);
    assert_eq!(literals(":@@cvar"), vec!["@@cvar"]);
    assert_eq!(literals(":$gvar"), vec!["$gvar"]);
    assert_eq!(literals(":[]="), vec!["[]="]);
    assert_eq!(literals(":<=>"), vec!["<=>"]);
    assert_eq!(literals(":\"quoted sym\""), vec!["quoted sym"]);
}

#[test]
fn symbol_keys() {
    let tokens = lex("{ a: 1 }");
    assert_eq!(tokens[1].kind(), TokenKind::SymbolKey);
    assert_eq!(tokens[1].literal(), Some("a"));
}

#[test]
fn bare_colon_is_ternary_colon() {
    assert!(kinds("a ? b : c").contains(&TokenKind::TernaryColon));
}

// ----------------------------------------------------------------------------
// Identifiers and keywords
// ----------------------------------------------------------------------------

#[test]
fn keywords_and_names() {
    assert_eq!(
        kinds("def foo; end"),
        vec![
            TokenKind::DefKeyword,
            TokenKind::BareName,
            TokenKind::Eol,
            TokenKind::EndKeyword,
            TokenKind::Eof
        ]
    );
    // prefix of a keyword is a name
    assert_eq!(kinds("defx")[0], TokenKind::BareName);
    // `?`/`!` suffixes make message names
    assert_eq!(literals("empty?"), vec!["empty?"]);
    assert_eq!(literals("save!"), vec!["save!"]);
}

#[test]
fn variables_by_sigil() {
    assert_eq!(kinds("@a")[0], TokenKind::InstanceVariable);
    assert_eq!(kinds("@@a")[0], TokenKind::ClassVariable);
    assert_eq!(kinds("$a")[0], TokenKind::GlobalVariable);
    assert_eq!(kinds("Abc")[0], TokenKind::Constant);
    assert_eq!(literals("@@counter"), vec!["@@counter"]);
    assert_eq!(literals("$?"), vec!["$?"]);
}

// ----------------------------------------------------------------------------
// Post-lexical transforms
// ----------------------------------------------------------------------------

#[test]
fn comments_are_dropped() {
    assert_eq!(
        kinds("a # comment\nb"),
        vec![
            TokenKind::BareName,
            TokenKind::Eol,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
}

#[test]
fn semicolons_become_eol() {
    assert_eq!(
        kinds("a; b"),
        vec![
            TokenKind::BareName,
            TokenKind::Eol,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
}

#[test]
fn newline_after_operator_is_dropped() {
    assert_eq!(
        kinds("a +\nb"),
        vec![
            TokenKind::BareName,
            TokenKind::Plus,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
}

#[test]
fn newline_before_leading_dot_is_dropped() {
    assert_eq!(
        kinds("a\n.b"),
        vec![
            TokenKind::BareName,
            TokenKind::Dot,
            TokenKind::BareName,
            TokenKind::Eof
        ]
    );
}

#[test]
fn bracket_records_whitespace_flag() {
    let tokens = lex("a [1]");
    let bracket = tokens
        .iter()
        .find(|t| t.kind() == TokenKind::LBracket)
        .unwrap();
    assert!(bracket.whitespace_precedes());

    let tokens = lex("a[1]");
    let bracket = tokens
        .iter()
        .find(|t| t.kind() == TokenKind::LBracket)
        .unwrap();
    assert!(!bracket.whitespace_precedes());
}

#[test]
fn safe_navigation_and_compound_operators() {
    assert!(kinds("a&.b").contains(&TokenKind::SafeNavigation));
    assert!(kinds("a ||= b").contains(&TokenKind::OrEqual));
    assert!(kinds("a &&= b").contains(&TokenKind::AndEqual));
    assert!(kinds("a **= b").contains(&TokenKind::ExponentEqual));
    assert!(kinds("a <=> b").contains(&TokenKind::Comparison));
    assert!(kinds("a === b").contains(&TokenKind::EqualEqualEqual));
    assert!(kinds("a =~ b").contains(&TokenKind::Match));
    assert!(kinds("a !~ b").contains(&TokenKind::NotMatch));
    assert!(kinds("a ... b").contains(&TokenKind::DotDotDot));
    assert!(kinds("-> { }").contains(&TokenKind::Arrow));
}

#[test]
fn invalid_character_stops_the_stream() {
    let tokens = lex("a \u{1}");
    let last = tokens.last().unwrap();
    assert_eq!(last.kind(), TokenKind::Invalid);
}

// ----------------------------------------------------------------------------
// Re-lex property (kind sequence is stable under re-rendering)
// ----------------------------------------------------------------------------

#[cfg(test)]
mod relex {
    use super::*;
    use proptest::prelude::*;

    fn render(tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            if token.kind() == TokenKind::Eof {
                break;
            }
            match token.kind() {
                TokenKind::BareName | TokenKind::Constant => {
                    out.push_str(token.literal_or_blank())
                },
                TokenKind::Integer => out.push_str(&token.integer().to_string()),
                TokenKind::Eol => out.push('\n'),
                _ => out.push_str(token.type_value()),
            }
            out.push(' ');
        }
        out
    }

    proptest! {
        // Rendering a token stream of simple expressions and re-lexing it
        // yields the same kind sequence.
        #[test]
        fn relex_is_stable(source in "[a-z][a-z0-9_]{0,5}( (\\+|\\-|\\*|==|<|>|&&|\\|\\|) ([a-z][a-z0-9_]{0,4}|[0-9]{1,4})){0,4}") {
            let first = Lexer::new(&source, "prop.rbl").tokens();
            let rendered = render(&first);
            let second = Lexer::new(&rendered, "prop.rbl").tokens();
            let first_kinds: Vec<_> = first.iter().map(|t| t.kind()).collect();
            let second_kinds: Vec<_> = second.iter().map(|t| t.kind()).collect();
            prop_assert_eq!(first_kinds, second_kinds);
        }
    }
}
