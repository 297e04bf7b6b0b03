//! Tests for the CLI pipeline and listing renderers

use phase_cli::{display, pipeline};
use phase_common::ErrorKind;
use pretty_assertions::assert_eq;
use std::io::Write as _;
use std::path::Path;

fn run(source: &str) -> String {
    let mut out = Vec::new();
    pipeline::run(source, &mut out).expect("pipeline failed");
    String::from_utf8(out).unwrap()
}

#[test]
fn runs_a_source_string_end_to_end() {
    assert_eq!(run("entry { out(\"hello\") }"), "hello\n");
}

#[test]
fn load_source_reads_files_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("program.phase");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "entry {{ out(40 + 2) }}").unwrap();

    let source = pipeline::load_source(&path).expect("load failed");
    assert_eq!(run(&source), "42\n");
}

#[test]
fn missing_input_is_a_cli_diagnostic() {
    let err = pipeline::load_source(Path::new("no/such/file.phase")).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::InputNotFound { path: "no/such/file.phase".to_string() }
    );
    assert_eq!(err.kind.code(), 202);
}

#[test]
fn pipeline_surfaces_lexer_diagnostics() {
    let err = pipeline::run("entry { out(\"oops) }", Vec::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedString);
}

#[test]
fn pipeline_surfaces_parser_diagnostics() {
    let err = pipeline::run("entry { out(1) out(2) }", Vec::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExpectedSymbol { .. }));
}

#[test]
fn pipeline_surfaces_emitter_diagnostics() {
    let err = pipeline::run("entry { let x: int = \"hi\" }", Vec::new()).unwrap_err();
    assert_eq!(err.kind.code(), 108);
}

#[test]
fn pipeline_surfaces_runtime_diagnostics() {
    let err = pipeline::run("entry { out(1 / 0) }", Vec::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
}

#[test]
fn token_listing_shows_names_lines_and_lexemes() {
    let tokens = pipeline::tokenize("entry {\nout(1)\n}").unwrap();
    let listing = display::render_tokens(&tokens, false);

    assert!(listing.starts_with("1 | ENTRY 'entry'\n"));
    assert!(listing.contains("2 | OUT 'out'\n"));
    assert!(listing.contains("2 | INTEGER '1'\n"));
    assert!(listing.contains("3 | RBRACE '}'\n"));
    assert!(listing.contains("3 | EOF\n"));
}

#[test]
fn ast_listing_nests_nodes() {
    let program = pipeline::parse("entry { out(\"hello\") }").unwrap();
    let listing = display::render_program(&program, false);

    assert!(listing.starts_with("PROGRAM \u{256e}\n"));
    assert!(listing.contains("DECLARATION (ENTRY)"));
    assert!(listing.contains("BLOCK"));
    assert!(listing.contains("STATEMENT (OUT)"));
    assert!(listing.contains("EXPRESSION (STRING) [\"hello\"]"));
}

#[test]
fn ast_listing_shows_function_signatures() {
    let program =
        pipeline::parse("func add(a: int, b: int): int { return a + b }\nentry { }").unwrap();
    let listing = display::render_program(&program, false);

    assert!(listing.contains("DECLARATION (FUNC) [add(a: int, b: int): int]"));
    assert!(listing.contains("STATEMENT (RETURN)"));
    assert!(listing.contains("EXPRESSION (BINARY) [+]"));
}
