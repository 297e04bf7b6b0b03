//! Source-to-execution pipeline
//!
//! One process run takes a source file through lexing, parsing,
//! emission, and execution. Every stage fails with a fatal diagnostic;
//! the caller renders it and exits.

use phase_codegen::Emitter;
use phase_common::{Diagnostic, ErrorKind, PhaseResult};
use phase_lexer::{Lexer, Token};
use phase_parser::{Parser, Program};
use phase_vm::Vm;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read the source file, classifying failure as a CLI diagnostic.
pub fn load_source(path: &Path) -> PhaseResult<String> {
    fs::read_to_string(path).map_err(|_| {
        Diagnostic::unlocated(ErrorKind::InputNotFound {
            path: path.display().to_string(),
        })
    })
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> PhaseResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Tokenize and parse a source string.
pub fn parse(source: &str) -> PhaseResult<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}

/// Run the full pipeline, writing program output to `out`.
pub fn run<W: Write>(source: &str, out: W) -> PhaseResult<()> {
    let program = parse(source)?;
    let compiled = Emitter::compile(&program)?;
    let mut vm = Vm::with_output(compiled, out);
    vm.run()
}
