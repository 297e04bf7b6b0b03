//! Fatal diagnostic kinds and rendering for the Phase toolchain
//!
//! Every failure in the pipeline is classified by an [`ErrorKind`],
//! attached to an optional source [`Span`], and rendered once by the
//! [`Reporter`]. Diagnostics are always fatal: the binary renders the
//! first error and exits with a non-zero status.

use crate::colours;
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Classified failure kinds, each with a stable numeric code.
///
/// Internal kinds (lexer, parser, emitter, VM) number from 100 in
/// declaration order; CLI kinds number from 200.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Expected {expected}")]
    ExpectedSymbol { expected: String },

    #[error("Expected an expression")]
    ExpectedExpression,

    #[error("Expected a statement")]
    ExpectedStatement,

    #[error("Invalid top-level declaration")]
    InvalidTopLevel,

    #[error("Multiple 'entry' blocks declared")]
    DuplicateEntry,

    #[error("No 'entry' block declared")]
    NoEntry,

    #[error("Type mismatch for '{context}': expected '{expected}', found '{actual}'")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid opcode {opcode}")]
    InvalidOpcode { opcode: u16 },

    #[error("Variable index out of range (table holds {count})")]
    InvalidVarIndex { count: usize },

    #[error("Constant index out of range (pool holds {count})")]
    InvalidConstIndex { count: usize },

    #[error("Instruction pointer ran out of bounds")]
    IpOutOfBounds,

    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("Declared {names} variables but provided {inits} initializers")]
    WrongInitCount { names: usize, inits: usize },

    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },

    #[error("Function '{name}' is already defined")]
    DuplicateFunction { name: String },

    #[error("Function '{name}' takes {expected} arguments but {actual} were given")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Function '{name}' does not return a value on every path")]
    MissingReturn { name: String, return_type: String },

    #[error("Return type mismatch in '{name}': expected '{expected}', found '{actual}'")]
    ReturnTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Unexpected identifier '{name}'")]
    UnexpectedIdentifier { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Program exceeds the 16-bit bytecode size limit")]
    BytecodeTooLarge,

    #[error("Variable '{name}' is already declared in this scope")]
    DuplicateVariable { name: String },

    #[error("Too many {what} (limit is 65536)")]
    TableOverflow { what: String },

    #[error("Operand type does not match the executed operation")]
    TypeGuard,

    #[error("Missing required argument {name}")]
    MissingArgument { name: String },

    #[error("Unrecognized argument '{name}'")]
    UnknownArgument { name: String },

    #[error("Input file '{path}' not found")]
    InputNotFound { path: String },
}

impl ErrorKind {
    /// Stable numeric code used in the rendered banner.
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::OutOfMemory => 100,
            ErrorKind::UnterminatedString => 101,
            ErrorKind::ExpectedSymbol { .. } => 102,
            ErrorKind::ExpectedExpression => 103,
            ErrorKind::ExpectedStatement => 104,
            ErrorKind::InvalidTopLevel => 105,
            ErrorKind::DuplicateEntry => 106,
            ErrorKind::NoEntry => 107,
            ErrorKind::TypeMismatch { .. } => 108,
            ErrorKind::InvalidOpcode { .. } => 109,
            ErrorKind::InvalidVarIndex { .. } => 110,
            ErrorKind::InvalidConstIndex { .. } => 111,
            ErrorKind::IpOutOfBounds => 112,
            ErrorKind::UndefinedVariable { .. } => 113,
            ErrorKind::WrongInitCount { .. } => 114,
            ErrorKind::UndefinedFunction { .. } => 115,
            ErrorKind::DuplicateFunction { .. } => 116,
            ErrorKind::ArityMismatch { .. } => 117,
            ErrorKind::MissingReturn { .. } => 118,
            ErrorKind::ReturnTypeMismatch { .. } => 119,
            ErrorKind::UnexpectedIdentifier { .. } => 120,
            ErrorKind::DivisionByZero => 121,
            ErrorKind::BytecodeTooLarge => 122,
            ErrorKind::DuplicateVariable { .. } => 123,
            ErrorKind::TableOverflow { .. } => 124,
            ErrorKind::TypeGuard => 125,
            ErrorKind::MissingArgument { .. } => 200,
            ErrorKind::UnknownArgument { .. } => 201,
            ErrorKind::InputNotFound { .. } => 202,
        }
    }

    /// One-line hint rendered after the source snippet.
    pub fn help(&self) -> String {
        match self {
            ErrorKind::OutOfMemory => {
                "The interpreter could not allocate memory.".to_string()
            }
            ErrorKind::UnterminatedString => {
                "Close the string with '\"' before the end of the file.".to_string()
            }
            ErrorKind::ExpectedSymbol { expected } => {
                format!("Insert {expected} here to continue.")
            }
            ErrorKind::ExpectedExpression => {
                "A literal, variable, call, or parenthesised expression is required here."
                    .to_string()
            }
            ErrorKind::ExpectedStatement => {
                "Statements are 'out', 'let', 'return', 'if', 'while', an assignment, or a call."
                    .to_string()
            }
            ErrorKind::InvalidTopLevel => {
                "Only 'entry', 'func', and 'let' declarations may appear at the top level."
                    .to_string()
            }
            ErrorKind::DuplicateEntry => {
                "A program has exactly one 'entry' block; remove the extra one.".to_string()
            }
            ErrorKind::NoEntry => {
                "Add an 'entry { ... }' block; execution starts there.".to_string()
            }
            ErrorKind::TypeMismatch { expected, actual, .. } => {
                format!("A value of type '{expected}' is required here, but this is a '{actual}'.")
            }
            ErrorKind::InvalidOpcode { .. } => {
                "The bytecode stream is corrupted; this is an interpreter bug.".to_string()
            }
            ErrorKind::InvalidVarIndex { .. } | ErrorKind::InvalidConstIndex { .. } => {
                "An instruction referenced a slot past the end of its table; this is an interpreter bug."
                    .to_string()
            }
            ErrorKind::IpOutOfBounds => {
                "Execution ran past the end of the bytecode; this is an interpreter bug."
                    .to_string()
            }
            ErrorKind::UndefinedVariable { name } => {
                format!("Declare '{name}' with 'let {name}: <type>' before using it.")
            }
            ErrorKind::WrongInitCount { names, .. } => {
                format!("Provide either no initializers or exactly {names}.")
            }
            ErrorKind::UndefinedFunction { name } => {
                format!("Define 'func {name}(...)' at the top level before calling it.")
            }
            ErrorKind::DuplicateFunction { .. } => {
                "Function names must be unique across the program.".to_string()
            }
            ErrorKind::ArityMismatch { expected, .. } => {
                format!("Pass exactly {expected} arguments.")
            }
            ErrorKind::MissingReturn { return_type, .. } => {
                format!("Add a 'return <{return_type}>' before the end of the function.")
            }
            ErrorKind::ReturnTypeMismatch { expected, .. } => {
                format!("The returned value must have type '{expected}'.")
            }
            ErrorKind::UnexpectedIdentifier { name } => {
                format!("'{name}' is neither a keyword nor a declared name.")
            }
            ErrorKind::DivisionByZero => {
                "Guard the divisor with an 'if' before dividing.".to_string()
            }
            ErrorKind::BytecodeTooLarge => {
                "Emitted bytecode is limited to 65535 bytes; split the program up.".to_string()
            }
            ErrorKind::DuplicateVariable { name } => {
                format!("'{name}' already names a variable in this scope; pick another name.")
            }
            ErrorKind::TableOverflow { what } => {
                format!("Instruction operands are 16 bits wide, so at most 65536 {what} fit.")
            }
            ErrorKind::TypeGuard => {
                "An operand had an unexpected runtime type; this is an interpreter bug."
                    .to_string()
            }
            ErrorKind::MissingArgument { .. } => {
                "Usage: phase <input.phase> [--tokens | --ast | --ast-json]".to_string()
            }
            ErrorKind::UnknownArgument { .. } => {
                "Run 'phase --help' for the accepted flags.".to_string()
            }
            ErrorKind::InputNotFound { .. } => {
                "Check the path; it must point to a readable .phase source file.".to_string()
            }
        }
    }

    /// Per-kind rewrite of the offending source line, if one exists.
    ///
    /// Returns the transformed line to show as the `+` side of the
    /// suggestion diff, or `None` when no mechanical fix applies.
    pub fn suggestion(&self, line: &str) -> Option<String> {
        match self {
            ErrorKind::TypeMismatch { expected, actual, .. }
            | ErrorKind::ReturnTypeMismatch { expected, actual, .. } => {
                replace_word(line, expected, actual)
            }
            ErrorKind::UnterminatedString => Some(format!("{line}\"")),
            ErrorKind::ExpectedSymbol { expected } => {
                // Only symbols quoted like "')'" can be appended verbatim.
                let symbol = expected.strip_prefix('\'')?.strip_suffix('\'')?;
                Some(format!("{}{}", line.trim_end(), symbol))
            }
            _ => None,
        }
    }
}

/// Replace the first standalone occurrence of `from` in `line`.
///
/// Occurrences embedded in longer identifiers are skipped so that a
/// type named 'int' is not rewritten inside a variable called 'point'.
fn replace_word(line: &str, from: &str, to: &str) -> Option<String> {
    if from.is_empty() {
        return None;
    }

    let is_ident = |c: u8| c == b'_' || c.is_ascii_alphanumeric();
    let bytes = line.as_bytes();
    let mut search = 0;

    while let Some(found) = line[search..].find(from) {
        let at = search + found;
        let end = at + from.len();
        let before_ok = at == 0 || !is_ident(bytes[at - 1]);
        let after_ok = end >= line.len() || !is_ident(bytes[end]);

        if before_ok && after_ok {
            let mut result = String::with_capacity(line.len() + to.len());
            result.push_str(&line[..at]);
            result.push_str(to);
            result.push_str(&line[end..]);
            return Some(result);
        }

        search = end;
    }

    None
}

/// A fatal, kind-tagged failure report with an optional source span.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span: Some(span) }
    }

    /// A diagnostic with no source location (e.g. a missing 'entry'
    /// block, or a CLI failure before any file was read).
    pub fn unlocated(kind: ErrorKind) -> Self {
        Self { kind, span: None }
    }
}

/// Result type alias for all pipeline stages.
pub type PhaseResult<T> = Result<T, Diagnostic>;

/// Bar glyphs used down the left edge of a rendered diagnostic.
#[derive(Debug, Clone, Copy)]
struct Glyphs {
    head: &'static str,
    join: &'static str,
    bar: &'static str,
}

const UNICODE_GLYPHS: Glyphs = Glyphs { head: "\u{250f}", join: "\u{2523}", bar: "\u{2503}" };
const ASCII_GLYPHS: Glyphs = Glyphs { head: ">", join: ">", bar: "|" };

/// Pick box-drawing bars unless the terminal hints conclusively say the
/// locale cannot display them.
fn detect_glyphs() -> Glyphs {
    if std::env::var("TERM").map(|term| term == "dumb").unwrap_or(false) {
        return ASCII_GLYPHS;
    }

    for key in ["LC_CTYPE", "LANG"] {
        if let Ok(value) = std::env::var(key) {
            if !value.is_empty() {
                if value.to_lowercase().contains("utf") {
                    return UNICODE_GLYPHS;
                }
                return ASCII_GLYPHS;
            }
        }
    }

    UNICODE_GLYPHS
}

/// Renders diagnostics against the source file being interpreted.
///
/// The reporter is handed the source path once, up front, and every
/// later failure is rendered against it.
pub struct Reporter {
    source_path: Option<PathBuf>,
    glyphs: Glyphs,
    coloured: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            source_path: None,
            glyphs: detect_glyphs(),
            coloured: true,
        }
    }

    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        let mut reporter = Self::new();
        reporter.source_path = Some(path.into());
        reporter
    }

    /// Force the ASCII bar set and disable colour codes; used by tests
    /// and non-terminal consumers.
    pub fn plain(mut self) -> Self {
        self.glyphs = ASCII_GLYPHS;
        self.coloured = false;
        self
    }

    fn paint(&self, colour: &'static str) -> &'static str {
        if self.coloured { colour } else { "" }
    }

    fn source_line(&self, line: u32) -> Option<String> {
        let path = self.source_path.as_ref()?;
        let text = fs::read_to_string(path).ok()?;
        text.lines()
            .nth(line.checked_sub(1)? as usize)
            .map(str::to_string)
    }

    /// Write the full rendering of `diagnostic` to `out`.
    pub fn render(&self, diagnostic: &Diagnostic, out: &mut dyn Write) -> io::Result<()> {
        let Glyphs { head, join, bar } = self.glyphs;
        let red = self.paint(colours::FG_RED_BOLD);
        let blue = self.paint(colours::FG_BLUE);
        let reset = self.paint(colours::RESET);

        writeln!(
            out,
            "{head} {red}Fatal Error [{code}]:{reset} {message}",
            code = diagnostic.kind.code(),
            message = diagnostic.kind,
        )?;

        let mut snippet = None;

        // Rebuilding through the constructor re-applies its clamping for
        // spans that arrived by deserialization and bypassed it.
        if let Some(span) = diagnostic.span.map(|s| Span::new(s.start, s.end)) {
            if span.start.line > 0 {
                let path = self
                    .source_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());

                writeln!(out, "{join} {blue}-->{reset} {path}:{span}")?;

                if let Some(line) = self.source_line(span.start.line) {
                    let pad = " ".repeat(span.start.column as usize - 1);
                    // A span reaching onto later lines is marked to the
                    // end of its first line.
                    let width = if span.end.line == span.start.line {
                        (span.end.column - span.start.column + 1) as usize
                    } else {
                        line.len()
                            .saturating_sub(span.start.column as usize - 1)
                            .max(1)
                    };
                    let carets = "^".repeat(width);

                    writeln!(out, "{bar} {line}")?;
                    writeln!(
                        out,
                        "{bar} {pad}{colour}{carets}{reset}",
                        colour = self.paint(colours::FG_RED),
                    )?;

                    snippet = Some(line);
                }
            }
        }

        writeln!(
            out,
            "{join} {blue}Help:{reset} {help}",
            help = diagnostic.kind.help(),
        )?;

        if let Some(original) = snippet {
            if let Some(fixed) = diagnostic.kind.suggestion(&original) {
                let minus = self.paint(colours::FG_RED);
                let plus = self.paint(colours::FG_GREEN);
                writeln!(out, "{bar} {minus}- {original}{reset}")?;
                writeln!(out, "{bar} {plus}+ {fixed}{reset}")?;
            }
        }

        Ok(())
    }

    /// Render `diagnostic` to standard error and terminate the process.
    ///
    /// Control never returns to the caller; every diagnostic is fatal.
    pub fn report(&self, diagnostic: &Diagnostic) -> ! {
        let stderr = io::stderr();
        let _ = self.render(diagnostic, &mut stderr.lock());
        std::process::exit(1);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
