//! Shared utilities for the Phase interpreter
//!
//! This crate provides the pieces every stage of the pipeline needs:
//! source location tracking, the fatal diagnostic kinds with their
//! rendering, and the terminal colour palette.

pub mod colours;
pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, ErrorKind, PhaseResult, Reporter};
pub use span::{Position, Span, Spanned};
