//! Benchmarks for the Pascal-S front end.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pascals::frontend::{lower::lower_program, parser, Grammar, Lexer};
use pascals::semantic::{check, ErrorPolicy};

const SOURCE: &str = r#"
program Hitung;
konstanta N = 100;
variabel a: larik [1..N] dari integer;
    i, j, total: integer;

fungsi kuadrat(x: integer): integer;
mulai
    kuadrat := x * x
selesai;

mulai
    total := 0;
    untuk i := 1 ke N lakukan
        a[i] := kuadrat(i) mod 7;
    untuk i := 1 ke N lakukan
        untuk j := i ke N lakukan
            jika (a[i] > a[j]) dan (i <> j) maka
                total := total + a[i] - a[j]
            selain-itu
                total := total + 1
selesai.
"#;

/// Benchmark lexer speed.
fn bench_lexing(c: &mut Criterion) {
    c.bench_function("lex_program", |b| {
        b.iter(|| Lexer::new(black_box(SOURCE)).tokenize().unwrap())
    });
}

/// Benchmark the backtracking parser.
fn bench_parsing(c: &mut Criterion) {
    let grammar = Grammar::pascal_s().unwrap();
    let tokens = Lexer::new(SOURCE).tokenize().unwrap();

    c.bench_function("parse_program", |b| {
        b.iter(|| parser::parse("Program", &grammar, black_box(&tokens)).unwrap())
    });
}

/// Benchmark grammar loading.
fn bench_grammar(c: &mut Criterion) {
    c.bench_function("load_pascal_s_grammar", |b| b.iter(|| Grammar::pascal_s().unwrap()));
}

/// Benchmark lowering plus semantic checking.
fn bench_checking(c: &mut Criterion) {
    let grammar = Grammar::pascal_s().unwrap();
    let tokens = Lexer::new(SOURCE).tokenize().unwrap();
    let tree = parser::parse("Program", &grammar, &tokens).unwrap();

    c.bench_function("lower_and_check", |b| {
        b.iter(|| {
            let mut program = lower_program(black_box(&tree)).unwrap();
            check(&mut program, ErrorPolicy::CollectAll).unwrap()
        })
    });
}

criterion_group!(benches, bench_lexing, bench_parsing, bench_grammar, bench_checking);
criterion_main!(benches);
