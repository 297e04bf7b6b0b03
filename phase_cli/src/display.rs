//! Token and syntax-tree listings for the `--tokens` and `--ast` modes

use phase_common::colours::{FG_CYAN, FG_PURPLE, RESET};
use phase_lexer::{Token, TokenType};
use phase_parser::{
    Block, DeclarationKind, Expr, ExprKind, Literal, Program, Stmt, StmtKind,
};
use std::fmt::Write;

const INDENT: usize = 8;

struct Palette {
    tag: &'static str,
    payload: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(coloured: bool) -> Self {
        if coloured {
            Self { tag: FG_CYAN, payload: FG_PURPLE, reset: RESET }
        } else {
            Self { tag: "", payload: "", reset: "" }
        }
    }
}

/// Render the token stream, one token per line with its line number.
pub fn render_tokens(tokens: &[Token], coloured: bool) -> String {
    let palette = Palette::new(coloured);
    let mut out = String::new();

    for token in tokens {
        let _ = write!(
            out,
            "{} | {}{}{}",
            token.span.start.line,
            palette.tag,
            token.value.name(),
            palette.reset,
        );

        if !matches!(token.value, TokenType::Newline | TokenType::EndOfFile) {
            let _ = write!(
                out,
                " {}'{}'{}",
                palette.payload, token.value, palette.reset
            );
        }

        out.push('\n');
    }

    out
}

/// Render the program as an indented tree.
pub fn render_program(program: &Program, coloured: bool) -> String {
    let palette = Palette::new(coloured);
    let mut out = String::new();

    out.push_str("PROGRAM \u{256e}\n");

    for declaration in &program.declarations {
        render_declaration(&mut out, &palette, declaration, INDENT);
    }

    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push(' ');
    }
}

fn render_declaration(
    out: &mut String,
    palette: &Palette,
    declaration: &phase_parser::Declaration,
    depth: usize,
) {
    indent(out, depth);

    match &declaration.kind {
        DeclarationKind::Entry(block) => {
            let _ = writeln!(
                out,
                "\u{2570} DECLARATION ({}ENTRY{})",
                palette.tag, palette.reset
            );
            render_block(out, palette, block, depth + INDENT);
        }
        DeclarationKind::Global(global) => {
            let names: Vec<&str> = global.names.iter().map(|n| n.value.as_str()).collect();
            let _ = writeln!(
                out,
                "\u{2570} DECLARATION ({}GLOBAL{}) [{}{}: {}{}]",
                palette.tag,
                palette.reset,
                palette.payload,
                names.join(", "),
                global.ty,
                palette.reset,
            );
        }
        DeclarationKind::Function(function) => {
            let params: Vec<String> = function
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name.value, p.ty))
                .collect();
            let _ = writeln!(
                out,
                "\u{2570} DECLARATION ({}FUNC{}) [{}{}({}): {}{}]",
                palette.tag,
                palette.reset,
                palette.payload,
                function.name.value,
                params.join(", "),
                function.return_type,
                palette.reset,
            );
            render_block(out, palette, &function.body, depth + INDENT);
        }
    }
}

fn render_block(out: &mut String, palette: &Palette, block: &Block, depth: usize) {
    indent(out, depth);
    out.push_str("\u{2570} BLOCK \u{256e}\n");

    for statement in &block.statements {
        render_statement(out, palette, statement, depth + INDENT);
    }
}

fn render_statement(out: &mut String, palette: &Palette, statement: &Stmt, depth: usize) {
    indent(out, depth);

    match &statement.kind {
        StmtKind::Out(expression) => {
            let _ = writeln!(out, "\u{2570} STATEMENT ({}OUT{})", palette.tag, palette.reset);
            render_expression(out, palette, expression, depth + INDENT);
        }
        StmtKind::Assign { name, value } => {
            let _ = writeln!(
                out,
                "\u{2570} STATEMENT ({}ASSIGN{}) [{}{}{}]",
                palette.tag, palette.reset, palette.payload, name.value, palette.reset
            );
            render_expression(out, palette, value, depth + INDENT);
        }
        StmtKind::Let(let_stmt) => {
            let names: Vec<&str> = let_stmt.names.iter().map(|n| n.value.as_str()).collect();
            let _ = writeln!(
                out,
                "\u{2570} STATEMENT ({}LET{}) [{}{}: {}{}]",
                palette.tag,
                palette.reset,
                palette.payload,
                names.join(", "),
                let_stmt.ty,
                palette.reset,
            );
            for initializer in &let_stmt.initializers {
                render_expression(out, palette, initializer, depth + INDENT);
            }
        }
        StmtKind::Return(value) => {
            let _ = writeln!(
                out,
                "\u{2570} STATEMENT ({}RETURN{})",
                palette.tag, palette.reset
            );
            if let Some(expression) = value {
                render_expression(out, palette, expression, depth + INDENT);
            }
        }
        StmtKind::Expr(expression) => {
            let _ = writeln!(out, "\u{2570} STATEMENT ({}EXPR{})", palette.tag, palette.reset);
            render_expression(out, palette, expression, depth + INDENT);
        }
        StmtKind::If { condition, then_block, else_block } => {
            let _ = writeln!(out, "\u{2570} STATEMENT ({}IF{})", palette.tag, palette.reset);
            render_expression(out, palette, condition, depth + INDENT);
            render_block(out, palette, then_block, depth + INDENT);
            if let Some(else_block) = else_block {
                render_block(out, palette, else_block, depth + INDENT);
            }
        }
        StmtKind::While { condition, body } => {
            let _ = writeln!(
                out,
                "\u{2570} STATEMENT ({}WHILE{})",
                palette.tag, palette.reset
            );
            render_expression(out, palette, condition, depth + INDENT);
            render_block(out, palette, body, depth + INDENT);
        }
    }
}

fn render_expression(out: &mut String, palette: &Palette, expression: &Expr, depth: usize) {
    indent(out, depth);

    match expression.kind.as_ref() {
        ExprKind::Literal(literal) => {
            let (tag, payload) = match literal {
                Literal::Integer(value) => ("INTEGER", value.to_string()),
                Literal::Float(value) => ("FLOAT", value.to_string()),
                Literal::String(value) => ("STRING", format!("\"{value}\"")),
                Literal::Boolean(value) => ("BOOLEAN", value.to_string()),
            };
            let _ = writeln!(
                out,
                "\u{2570} EXPRESSION ({}{}{}) [{}{}{}]",
                palette.tag, tag, palette.reset, palette.payload, payload, palette.reset
            );
        }
        ExprKind::Variable(name) => {
            let _ = writeln!(
                out,
                "\u{2570} EXPRESSION ({}VARIABLE{}) [{}{}{}]",
                palette.tag, palette.reset, palette.payload, name, palette.reset
            );
        }
        ExprKind::Call { name, args } => {
            let _ = writeln!(
                out,
                "\u{2570} EXPRESSION ({}CALL{}) [{}{}{}]",
                palette.tag, palette.reset, palette.payload, name.value, palette.reset
            );
            for arg in args {
                render_expression(out, palette, arg, depth + INDENT);
            }
        }
        ExprKind::Unary { op, operand } => {
            let _ = writeln!(
                out,
                "\u{2570} EXPRESSION ({}UNARY{}) [{}{}{}]",
                palette.tag, palette.reset, palette.payload, op, palette.reset
            );
            render_expression(out, palette, operand, depth + INDENT);
        }
        ExprKind::Binary { op, left, right } => {
            let _ = writeln!(
                out,
                "\u{2570} EXPRESSION ({}BINARY{}) [{}{}{}]",
                palette.tag, palette.reset, palette.payload, op, palette.reset
            );
            render_expression(out, palette, left, depth + INDENT);
            render_expression(out, palette, right, depth + INDENT);
        }
    }
}
