//! Token definitions for the Phase language

use phase_common::{Span, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token types in the Phase language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    // Literals
    IntegerLiteral(i32),
    FloatLiteral(String), // Store as written to avoid f64 Hash/Eq issues
    StringLiteral(String),
    BooleanLiteral(bool),

    // Identifiers
    Identifier(String),

    // Keywords
    KeywordEntry,
    KeywordOut,
    KeywordLet,
    KeywordFunc,
    KeywordReturn,
    KeywordIf,
    KeywordElse,
    KeywordWhile,

    // Type names
    TypeInt,
    TypeFloat,
    TypeBool,
    TypeStr,
    TypeVoid,

    // Operators
    Plus,         // +
    Minus,        // -
    Multiply,     // *
    Divide,       // /
    Assign,       // =
    Equal,        // ==
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    LogicalAnd,   // &&
    LogicalOr,    // ||
    LogicalNot,   // !

    // Delimiters
    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    Comma,      // ,
    Colon,      // :

    // Special
    Newline,
    EndOfFile,

    // Any unrecognized character
    Unknown(char),
}

impl TokenType {
    /// Upper-case tag used by the `--tokens` listing.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::IntegerLiteral(_) => "INTEGER",
            TokenType::FloatLiteral(_) => "FLOAT",
            TokenType::StringLiteral(_) => "STRING",
            TokenType::BooleanLiteral(_) => "BOOLEAN",
            TokenType::Identifier(_) => "IDENTIFIER",
            TokenType::KeywordEntry => "ENTRY",
            TokenType::KeywordOut => "OUT",
            TokenType::KeywordLet => "LET",
            TokenType::KeywordFunc => "FUNC",
            TokenType::KeywordReturn => "RETURN",
            TokenType::KeywordIf => "IF",
            TokenType::KeywordElse => "ELSE",
            TokenType::KeywordWhile => "WHILE",
            TokenType::TypeInt => "INT_TYPE",
            TokenType::TypeFloat => "FLOAT_TYPE",
            TokenType::TypeBool => "BOOL_TYPE",
            TokenType::TypeStr => "STR_TYPE",
            TokenType::TypeVoid => "VOID_TYPE",
            TokenType::Plus => "PLUS",
            TokenType::Minus => "MINUS",
            TokenType::Multiply => "MULTIPLY",
            TokenType::Divide => "DIVIDE",
            TokenType::Assign => "ASSIGN",
            TokenType::Equal => "EQUAL",
            TokenType::Less => "LESS",
            TokenType::LessEqual => "LESS_EQUAL",
            TokenType::Greater => "GREATER",
            TokenType::GreaterEqual => "GREATER_EQUAL",
            TokenType::LogicalAnd => "AND",
            TokenType::LogicalOr => "OR",
            TokenType::LogicalNot => "NOT",
            TokenType::LeftParen => "LPAREN",
            TokenType::RightParen => "RPAREN",
            TokenType::LeftBrace => "LBRACE",
            TokenType::RightBrace => "RBRACE",
            TokenType::Comma => "COMMA",
            TokenType::Colon => "COLON",
            TokenType::Newline => "NEWLINE",
            TokenType::EndOfFile => "EOF",
            TokenType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::IntegerLiteral(n) => write!(f, "{}", n),
            TokenType::FloatLiteral(n) => write!(f, "{}", n),
            TokenType::StringLiteral(s) => write!(f, "\"{}\"", s),
            TokenType::BooleanLiteral(b) => write!(f, "{}", b),
            TokenType::Identifier(name) => write!(f, "{}", name),
            TokenType::Unknown(c) => write!(f, "{}", c),
            _ => {
                let text = match self {
                    TokenType::KeywordEntry => "entry",
                    TokenType::KeywordOut => "out",
                    TokenType::KeywordLet => "let",
                    TokenType::KeywordFunc => "func",
                    TokenType::KeywordReturn => "return",
                    TokenType::KeywordIf => "if",
                    TokenType::KeywordElse => "else",
                    TokenType::KeywordWhile => "while",
                    TokenType::TypeInt => "int",
                    TokenType::TypeFloat => "float",
                    TokenType::TypeBool => "bool",
                    TokenType::TypeStr => "str",
                    TokenType::TypeVoid => "void",
                    TokenType::Plus => "+",
                    TokenType::Minus => "-",
                    TokenType::Multiply => "*",
                    TokenType::Divide => "/",
                    TokenType::Assign => "=",
                    TokenType::Equal => "==",
                    TokenType::Less => "<",
                    TokenType::LessEqual => "<=",
                    TokenType::Greater => ">",
                    TokenType::GreaterEqual => ">=",
                    TokenType::LogicalAnd => "&&",
                    TokenType::LogicalOr => "||",
                    TokenType::LogicalNot => "!",
                    TokenType::LeftParen => "(",
                    TokenType::RightParen => ")",
                    TokenType::LeftBrace => "{",
                    TokenType::RightBrace => "}",
                    TokenType::Comma => ",",
                    TokenType::Colon => ":",
                    TokenType::Newline => "\\n",
                    TokenType::EndOfFile => "EOF",
                    _ => unreachable!(),
                };
                write!(f, "{}", text)
            }
        }
    }
}

/// A token with source location information
pub type Token = Spanned<TokenType>;

/// Token utility trait
pub trait TokenUtils {
    fn new(token_type: TokenType, span: Span) -> Self;
    fn is_keyword(&self) -> bool;
    fn is_type_name(&self) -> bool;
    fn is_literal(&self) -> bool;
}

impl TokenUtils for Token {
    fn new(token_type: TokenType, span: Span) -> Self {
        Spanned::new(token_type, span)
    }

    fn is_keyword(&self) -> bool {
        matches!(
            self.value,
            TokenType::KeywordEntry
                | TokenType::KeywordOut
                | TokenType::KeywordLet
                | TokenType::KeywordFunc
                | TokenType::KeywordReturn
                | TokenType::KeywordIf
                | TokenType::KeywordElse
                | TokenType::KeywordWhile
        )
    }

    fn is_type_name(&self) -> bool {
        matches!(
            self.value,
            TokenType::TypeInt
                | TokenType::TypeFloat
                | TokenType::TypeBool
                | TokenType::TypeStr
                | TokenType::TypeVoid
        )
    }

    fn is_literal(&self) -> bool {
        matches!(
            self.value,
            TokenType::IntegerLiteral(_)
                | TokenType::FloatLiteral(_)
                | TokenType::StringLiteral(_)
                | TokenType::BooleanLiteral(_)
        )
    }
}
