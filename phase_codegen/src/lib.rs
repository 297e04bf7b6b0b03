//! Bytecode emission for the Phase language
//!
//! The emitter walks the parsed program twice: a first pass registers
//! functions and global variables, a second pass type-checks and emits
//! the flat instruction stream the VM executes.

pub mod bytecode;
pub mod emitter;

pub use bytecode::{CompiledProgram, FunctionDef, Opcode, Value};
pub use emitter::Emitter;
