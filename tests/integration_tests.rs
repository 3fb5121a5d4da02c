//! Integration tests for the Pascal-S pipeline.

use pascals::prelude::*;
use pascals::frontend::parser;
use pascals::semantic::symbol_table::GLOBAL_BLOCK;
use pascals::utils::pretty::{ast_tree, symbol_tables};
use pascals::utils::location::Span;

const BUBBLE_SORT: &str = r#"
program Urut;
konstanta N = 5;
tipe Data = larik [1..N] dari integer;
variabel a: Data;
    i, j: integer;
    selesai_urut: boolean;

prosedur tukar(variabel x, y: integer);
variabel t: integer;
mulai
    t := x;
    x := y;
    y := t
selesai;

fungsi maksimum(p, q: integer): integer;
mulai
    jika p > q maka maksimum := p selain-itu maksimum := q
selesai;

mulai
    untuk i := 1 ke N lakukan
        a[i] := N - i;
    ulangi
        selesai_urut := true;
        untuk j := 1 ke N - 1 lakukan
            jika a[j] > a[j + 1] maka
            mulai
                tukar(a[j], a[j + 1]);
                selesai_urut := false
            selesai
    sampai selesai_urut;
    { turun dan kasus }
    untuk i := N turun-ke 1 lakukan
        kasus i mod 2 dari
            0: writeln('genap', a[i]);
            1: writeln('ganjil', maksimum(a[i], 3))
        selesai
selesai.
"#;

fn compile_ok(source: &str) -> Compilation {
    compile(source, &CompilerConfig::default()).expect("pipeline failed")
}

#[test]
fn test_minimal_program_has_no_errors() {
    let compilation = compile_ok("program P; variabel x: integer; mulai x := 5 + 3 selesai.");
    assert!(compilation.analysis.is_ok());

    let table = &compilation.analysis.table;
    let x = table.entry(table.lookup("x")).unwrap();
    assert_eq!(x.class, ObjectClass::Variable);
    assert_eq!(x.base_type, TypeKind::Integer);
    assert_eq!(x.level, 0);
}

#[test]
fn test_full_program() {
    let compilation = compile_ok(BUBBLE_SORT);
    assert!(compilation.analysis.is_ok(), "{:?}", compilation.analysis.errors);

    let table = &compilation.analysis.table;
    let data = table.entry(table.lookup("Data")).unwrap();
    assert_eq!(data.class, ObjectClass::Type);
    let shape = table.array(data.composite_ref).unwrap();
    assert_eq!((shape.low, shape.high, shape.total_size), (1, 5, 5));

    let a = table.entry(table.lookup("a")).unwrap();
    assert_eq!(a.composite_ref, data.composite_ref);

    // globals: a (5 cells), i, j, selesai_urut
    assert_eq!(table.block(GLOBAL_BLOCK).unwrap().local_frame_size, 8);

    let tukar = table.entry(table.lookup("tukar")).unwrap();
    assert_eq!(tukar.class, ObjectClass::Procedure);
    let block = table.block(tukar.composite_ref).unwrap();
    assert_eq!(block.param_frame_size, 2);
    assert_eq!(block.local_frame_size, 1);

    let maksimum = table.entry(table.lookup("maksimum")).unwrap();
    assert_eq!(maksimum.class, ObjectClass::Function);
    assert_eq!(maksimum.base_type, TypeKind::Integer);
    assert_eq!(table.parameters(maksimum.composite_ref).len(), 2);
}

#[test]
fn test_boolean_assigned_to_integer() {
    let compilation = compile_ok("program P; variabel x: integer; mulai x := true selesai.");
    let errors = &compilation.analysis.errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemanticErrorKind::TypeMismatch);
    assert!(errors[0].message.contains("boolean"));
    assert!(errors[0].message.contains("integer"));
    assert_eq!(errors[0].span.start_line, 1);
}

#[test]
fn test_error_policies() {
    let source = "
        program P;
        variabel x: integer; b: boolean;
        mulai
            x := b;
            b := x;
            y := 0
        selesai.";

    let collected = compile_ok(source);
    let kinds: Vec<_> = collected.analysis.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SemanticErrorKind::TypeMismatch,
            SemanticErrorKind::TypeMismatch,
            SemanticErrorKind::UndeclaredIdentifier,
        ]
    );

    let config = CompilerConfig::default().with_error_policy(ErrorPolicy::FailFast);
    let err = compile(source, &config).unwrap_err();
    match err.downcast_ref::<PascalError>() {
        Some(PascalError::Semantic(e)) => {
            assert_eq!(e.kind, SemanticErrorKind::TypeMismatch);
            assert_eq!(e.span.start_line, 5);
        }
        other => panic!("expected a semantic error, got {:?}", other),
    }
}

#[test]
fn test_syntax_error_location() {
    let source = "program P;\nvariabel x: integer;\nmulai\n  x := 1\n  x := 2\nselesai.";
    let err = compile(source, &CompilerConfig::default()).unwrap_err();
    let Some(PascalError::Parse(parse)) = err.downcast_ref::<PascalError>() else {
        panic!("expected a parse error, got {}", err);
    };
    assert_eq!(parse.span.start_line, 5);
    assert_eq!(parse.span.start_column, 3);
    assert!(parse.message.starts_with("unexpected token `IDENTIFIER(x)` at line 5 col 3"));
    assert!(parse.expected.iter().any(|e| e.contains("selesai")));
}

#[test]
fn test_trailing_input_rejected() {
    let err = compile("program P; mulai selesai. x", &CompilerConfig::default()).unwrap_err();
    let Some(PascalError::Parse(parse)) = err.downcast_ref::<PascalError>() else {
        panic!("expected a parse error, got {}", err);
    };
    assert_eq!(parse.kind, ParseErrorKind::TrailingInput);
    assert!(parse.message.ends_with("expected end of input"));
}

#[test]
fn test_lexer_error_reported() {
    let err = compile("program P; mulai x := 1 ? 2 selesai.", &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err.downcast_ref::<PascalError>(), Some(PascalError::Lexer(_))));
}

#[test]
fn test_hand_built_grammar() {
    let tok = |kind, text: &str, col| Token::new(kind, Span::new(1, col, 1, col + text.len()), text);
    let grammar = Grammar::new().with_rule(
        "Start",
        vec![vec![Symbol::exact(TokenKind::Keyword, "begin"), Symbol::category(TokenKind::Identifier)]],
    );

    let good = vec![tok(TokenKind::Keyword, "begin", 1), tok(TokenKind::Identifier, "x", 7)];
    let tree = parser::parse("Start", &grammar, &good).unwrap();
    assert_eq!(tree.children.len(), 2);

    let bad = vec![tok(TokenKind::Keyword, "end", 1), tok(TokenKind::Identifier, "x", 5)];
    assert!(parser::parse("Start", &grammar, &bad).is_err());
}

#[test]
fn test_grammar_file() {
    let dir = std::env::temp_dir().join(format!("pascals-grammar-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("sum.bnf");
    std::fs::write(
        &path,
        "# sums of numbers\n<Sum> ::= NUMBER <More>\n<More> ::= ARITHMETIC_OPERATOR(+) NUMBER <More>\n    | EPSILON\n",
    )
    .unwrap();

    let config = CompilerConfig::default().with_grammar_path(&path);
    let grammar = config.grammar().unwrap();
    assert_eq!(config.start_for(&grammar), "Sum");

    let tokens = pascals::lex("1 + 2 + 3").unwrap();
    let tree = pascals::parse_tokens(&tokens, &grammar, &config).unwrap();
    assert!(tree.is("Sum"));
    assert_eq!(tree.leaves().len(), 5);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_recursion_limit_is_configurable() {
    let deep = format!("program P; variabel x: integer; mulai x := {}1{} selesai.", "(".repeat(40), ")".repeat(40));
    assert!(compile(&deep, &CompilerConfig::default()).is_ok());

    let config = CompilerConfig::default().with_max_depth(32);
    let err = compile(&deep, &config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PascalError>(),
        Some(PascalError::Grammar(GrammarError::RecursionLimit { limit: 32, .. }))
    ));
}

#[test]
fn test_presentation() {
    let compilation = compile_ok(BUBBLE_SORT);
    let tree = ast_tree(&compilation.program);
    assert!(tree.contains("Procedure tukar [idx: "));
    assert!(tree.contains("Call maksimum [idx: "));

    let tables = symbol_tables(&compilation.analysis.table);
    assert!(tables.contains("tukar"));
    assert!(tables.contains("atab:"));

    let text = compilation.program.pretty();
    assert!(text.starts_with("program Urut;"));
    let again = compile_ok(&text);
    assert!(again.analysis.is_ok(), "{:?}", again.analysis.errors);
}

#[test]
fn test_json_serialization() {
    let compilation = compile_ok("program P; variabel x: integer; mulai x := 5 + 3 selesai.");
    let json = serde_json::to_value(&compilation.analysis.table).unwrap();
    assert!(json["tab"].is_array());
    let program = serde_json::to_value(&compilation.program).unwrap();
    assert_eq!(program["name"], "P");
}
