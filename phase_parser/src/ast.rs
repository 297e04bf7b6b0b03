//! Abstract Syntax Tree definitions for the Phase language

use phase_common::{Span, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete Phase program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// The program entry block
    Entry(Block),
    /// Global variable declaration (no initializer at global scope)
    Global(GlobalDecl),
    /// Function definition
    Function(Function),
}

/// Global variable declaration: `let x: int` or `let (x, y): int`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub names: Vec<Spanned<String>>,
    pub ty: PrimitiveType,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: Spanned<String>,
    pub params: Vec<Parameter>,
    pub return_type: PrimitiveType,
    pub body: Block,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Spanned<String>,
    pub ty: PrimitiveType,
    pub span: Span,
}

/// Block of newline-separated statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `out(expr)`
    Out(Expr),
    /// `name = expr`
    Assign { name: Spanned<String>, value: Expr },
    /// `let x: int = 2` or `let (x, y): int = (1, 2)`
    Let(LetStmt),
    /// `return` / `return expr`
    Return(Option<Expr>),
    /// Call in statement position
    Expr(Expr),
    /// `if cond { ... } else { ... }`; else-if chains nest here
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// `while cond { ... }`
    While { condition: Expr, body: Block },
}

/// Local variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetStmt {
    pub names: Vec<Spanned<String>>,
    pub ty: PrimitiveType,
    /// Either empty or one initializer per declared name
    pub initializers: Vec<Expr>,
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: Box<ExprKind>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind: Box::new(kind), span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Literal value
    Literal(Literal),
    /// Variable reference
    Variable(String),
    /// Function call
    Call { name: Spanned<String>, args: Vec<Expr> },
    /// Unary operation
    Unary { op: UnaryOp, operand: Expr },
    /// Binary operation
    Binary { op: BinaryOp, left: Expr, right: Expr },
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i32),
    Float(f64),
    String(String),
    Boolean(bool),
}

/// The five primitive type tags of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Int,
    Float,
    Bool,
    Str,
    Void,
}

impl PrimitiveType {
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveType::Int | PrimitiveType::Float)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical (strict; both operands always evaluated)
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not, // !
    Neg, // -
}

// Display implementations for better error messages
impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Str => "str",
            PrimitiveType::Void => "void",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        };
        write!(f, "{}", op)
    }
}
