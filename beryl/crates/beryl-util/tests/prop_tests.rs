//! Property tests for the util value types.

use beryl_util::span::{SourceMap, Span};
use beryl_util::symbol::Symbol;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn intern_is_idempotent(s: String) -> bool {
    let a = Symbol::intern(&s);
    let b = Symbol::intern(&s);
    a == b && a.as_str() == s
}

#[quickcheck]
fn intern_distinguishes_strings(a: String, b: String) -> bool {
    let sa = Symbol::intern(&a);
    let sb = Symbol::intern(&b);
    (sa == sb) == (a == b)
}

#[quickcheck]
fn span_merge_covers_both(s1: usize, e1: usize, s2: usize, e2: usize) -> bool {
    let (s1, e1) = (s1.min(e1), s1.max(e1));
    let (s2, e2) = (s2.min(e2), s2.max(e2));
    let merged = Span::new(s1, e1, 0, 0).merge(Span::new(s2, e2, 0, 0));
    merged.start <= s1 && merged.start <= s2 && merged.end >= e1 && merged.end >= e2
}

#[quickcheck]
fn line_of_offset_matches_line_starts(lines: Vec<String>) -> bool {
    // Build a file out of sanitized lines, then check that every offset maps
    // back to the line it physically sits on.
    let lines: Vec<String> = lines
        .into_iter()
        .take(20)
        .map(|l| l.replace('\n', " "))
        .collect();
    let source = lines.join("\n");
    let mut map = SourceMap::new();
    let id = map.add_file("prop.rbl", source);
    let file = map.get(id).unwrap();

    let mut offset = 0;
    for (lineno, line) in lines.iter().enumerate() {
        for i in 0..line.len() {
            if file.line_of_offset(offset + i) != lineno {
                return false;
            }
        }
        offset += line.len() + 1;
    }
    true
}
