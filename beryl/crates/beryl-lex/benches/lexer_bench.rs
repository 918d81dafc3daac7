//! Lexer throughput benchmark.

use beryl_lex::Lexer;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_source() -> String {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(
            "def method_{i}(a, b = {i}, *rest)\n  \
             total = a + b * {i} / 2\n  \
             name = \"item #{{a}} of #{{b}}\"\n  \
             items = %w[one two three]\n  \
             total > 10 ? name : items[0]\nend\n"
        ));
    }
    source
}

fn bench_lexer(c: &mut Criterion) {
    let source = sample_source();
    c.bench_function("lex_token_stream", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(&source), "bench.rbl");
            black_box(lexer.tokens())
        })
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
