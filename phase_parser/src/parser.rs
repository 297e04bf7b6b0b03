//! Recursive-descent parser for the Phase language
//!
//! Statements are newline-terminated; the parser consumes the newline
//! tokens the lexer leaves in the stream. The first syntax error aborts
//! the parse.

use crate::ast::*;
use phase_common::{Diagnostic, ErrorKind, PhaseResult, Position, Span, Spanned};
use phase_lexer::{Token, TokenType, TokenUtils};

/// Parser for the Phase language
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let needs_eof = tokens
            .last()
            .map(|t| t.value != TokenType::EndOfFile)
            .unwrap_or(true);

        if needs_eof {
            let span = Span::single(Position::origin());
            tokens.push(TokenUtils::new(TokenType::EndOfFile, span));
        }

        Self { tokens, current: 0 }
    }

    pub fn parse_program(&mut self) -> PhaseResult<Program> {
        let start_span = self.current_span();
        let mut declarations = Vec::new();

        self.skip_newlines();

        while !self.check(&TokenType::EndOfFile) {
            declarations.push(self.parse_declaration()?);
            self.skip_newlines();
        }

        let span = start_span.merge(self.previous_span());

        Ok(Program { declarations, span })
    }

    // === Declarations ===

    fn parse_declaration(&mut self) -> PhaseResult<Declaration> {
        match self.current().value {
            TokenType::KeywordEntry => self.parse_entry(),
            TokenType::KeywordFunc => self.parse_function(),
            TokenType::KeywordLet => self.parse_global(),
            _ => Err(Diagnostic::new(
                ErrorKind::InvalidTopLevel,
                self.current_span(),
            )),
        }
    }

    fn parse_entry(&mut self) -> PhaseResult<Declaration> {
        let start_span = self.current_span();
        self.advance(); // 'entry'

        let block = self.parse_block()?;

        Ok(Declaration {
            kind: DeclarationKind::Entry(block),
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_function(&mut self) -> PhaseResult<Declaration> {
        let start_span = self.current_span();
        self.advance(); // 'func'

        let name = self.expect_identifier("a function name")?;

        self.expect(TokenType::LeftParen, "'('")?;

        let mut params = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                let param_name = self.expect_identifier("a parameter name")?;
                self.expect(TokenType::Colon, "':'")?;
                let ty = self.parse_value_type()?;

                let span = param_name.span.merge(self.previous_span());
                params.push(Parameter { name: param_name, ty, span });

                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenType::RightParen, "')'")?;

        // The return type is optional; omitting it means 'void'.
        let return_type = if self.match_token(&TokenType::Colon) {
            self.parse_return_type()?
        } else {
            PrimitiveType::Void
        };

        let body = self.parse_block()?;

        Ok(Declaration {
            kind: DeclarationKind::Function(Function {
                name,
                params,
                return_type,
                body,
            }),
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_global(&mut self) -> PhaseResult<Declaration> {
        let start_span = self.current_span();
        self.advance(); // 'let'

        let names = self.parse_name_list()?;
        self.expect(TokenType::Colon, "':'")?;
        let ty = self.parse_value_type()?;

        if self.check(&TokenType::Assign) {
            return Err(Diagnostic::new(
                ErrorKind::ExpectedSymbol {
                    expected: "a newline; global variables take no initializer".to_string(),
                },
                self.current_span(),
            ));
        }

        Ok(Declaration {
            kind: DeclarationKind::Global(GlobalDecl { names, ty }),
            span: start_span.merge(self.previous_span()),
        })
    }

    // === Statements ===

    fn parse_block(&mut self) -> PhaseResult<Block> {
        let start_span = self.current_span();

        self.expect(TokenType::LeftBrace, "'{'")?;
        self.skip_newlines();

        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) {
            if self.check(&TokenType::EndOfFile) {
                return Err(Diagnostic::new(
                    ErrorKind::ExpectedSymbol { expected: "'}'".to_string() },
                    self.current_span(),
                ));
            }

            statements.push(self.parse_statement()?);

            if !self.check(&TokenType::RightBrace) {
                if self.check(&TokenType::Newline) {
                    self.skip_newlines();
                } else {
                    return Err(Diagnostic::new(
                        ErrorKind::ExpectedSymbol {
                            expected: "a newline or '}'".to_string(),
                        },
                        self.current_span(),
                    ));
                }
            }
        }

        self.expect(TokenType::RightBrace, "'}'")?;

        Ok(Block {
            statements,
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_statement(&mut self) -> PhaseResult<Stmt> {
        match self.current().value.clone() {
            TokenType::KeywordOut => self.parse_out_statement(),
            TokenType::KeywordLet => self.parse_let_statement(),
            TokenType::KeywordReturn => self.parse_return_statement(),
            TokenType::KeywordIf => self.parse_if_statement(),
            TokenType::KeywordWhile => self.parse_while_statement(),
            TokenType::Identifier(name) => {
                let start_span = self.current_span();
                self.advance();
                let name = Spanned::new(name, start_span);

                if self.match_token(&TokenType::Assign) {
                    let value = self.parse_expression()?;
                    Ok(Stmt {
                        span: start_span.merge(value.span),
                        kind: StmtKind::Assign { name, value },
                    })
                } else if self.check(&TokenType::LeftParen) {
                    // A call is the only expression accepted in
                    // statement position.
                    let call = self.parse_call(name)?;
                    Ok(Stmt {
                        span: call.span,
                        kind: StmtKind::Expr(call),
                    })
                } else {
                    Err(Diagnostic::new(
                        ErrorKind::ExpectedSymbol { expected: "'=' or '('".to_string() },
                        self.current_span(),
                    ))
                }
            }
            _ => Err(Diagnostic::new(
                ErrorKind::ExpectedStatement,
                self.current_span(),
            )),
        }
    }

    fn parse_out_statement(&mut self) -> PhaseResult<Stmt> {
        let start_span = self.current_span();
        self.advance(); // 'out'

        self.expect(TokenType::LeftParen, "'('")?;
        let expression = self.parse_expression()?;
        self.expect(TokenType::RightParen, "')'")?;

        Ok(Stmt {
            kind: StmtKind::Out(expression),
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_let_statement(&mut self) -> PhaseResult<Stmt> {
        let start_span = self.current_span();
        self.advance(); // 'let'

        let names = self.parse_name_list()?;
        self.expect(TokenType::Colon, "':'")?;
        let ty = self.parse_value_type()?;

        let initializers = if self.match_token(&TokenType::Assign) {
            if self.match_token(&TokenType::LeftParen) {
                // Grouped initializers: `let (x, y): int = (1, 2)`
                let mut exprs = vec![self.parse_expression()?];
                while self.match_token(&TokenType::Comma) {
                    exprs.push(self.parse_expression()?);
                }
                self.expect(TokenType::RightParen, "')'")?;
                exprs
            } else {
                vec![self.parse_expression()?]
            }
        } else {
            Vec::new()
        };

        Ok(Stmt {
            kind: StmtKind::Let(LetStmt { names, ty, initializers }),
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_return_statement(&mut self) -> PhaseResult<Stmt> {
        let start_span = self.current_span();
        self.advance(); // 'return'

        let value = if matches!(
            self.current().value,
            TokenType::Newline | TokenType::RightBrace | TokenType::EndOfFile
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        Ok(Stmt {
            kind: StmtKind::Return(value),
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_if_statement(&mut self) -> PhaseResult<Stmt> {
        let start_span = self.current_span();
        self.advance(); // 'if'

        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;

        let else_block = if self.match_token(&TokenType::KeywordElse) {
            if self.check(&TokenType::KeywordIf) {
                // `else if`: nest the chained branch as a one-statement block.
                let nested = self.parse_if_statement()?;
                let span = nested.span;
                Some(Block { statements: vec![nested], span })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If { condition, then_block, else_block },
            span: start_span.merge(self.previous_span()),
        })
    }

    fn parse_while_statement(&mut self) -> PhaseResult<Stmt> {
        let start_span = self.current_span();
        self.advance(); // 'while'

        let condition = self.parse_expression()?;
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span: start_span.merge(self.previous_span()),
        })
    }

    /// `x` or `(x, y, z)`
    fn parse_name_list(&mut self) -> PhaseResult<Vec<Spanned<String>>> {
        if self.match_token(&TokenType::LeftParen) {
            let mut names = vec![self.expect_identifier("a variable name")?];
            while self.match_token(&TokenType::Comma) {
                names.push(self.expect_identifier("a variable name")?);
            }
            self.expect(TokenType::RightParen, "')'")?;
            Ok(names)
        } else {
            Ok(vec![self.expect_identifier("a variable name or '('")?])
        }
    }

    /// A type a variable can hold; 'void' is only valid as a return type.
    fn parse_value_type(&mut self) -> PhaseResult<PrimitiveType> {
        let ty = match self.current().value {
            TokenType::TypeInt => PrimitiveType::Int,
            TokenType::TypeFloat => PrimitiveType::Float,
            TokenType::TypeBool => PrimitiveType::Bool,
            TokenType::TypeStr => PrimitiveType::Str,
            _ => {
                return Err(Diagnostic::new(
                    ErrorKind::ExpectedSymbol {
                        expected: "a value type ('int', 'float', 'bool', or 'str')".to_string(),
                    },
                    self.current_span(),
                ));
            }
        };
        self.advance();
        Ok(ty)
    }

    fn parse_return_type(&mut self) -> PhaseResult<PrimitiveType> {
        if self.match_token(&TokenType::TypeVoid) {
            return Ok(PrimitiveType::Void);
        }
        self.parse_value_type()
    }

    // === Expressions ===

    pub fn parse_expression(&mut self) -> PhaseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_and()?;

        while self.match_token(&TokenType::LogicalOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_equality()?;

        while self.match_token(&TokenType::LogicalAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_comparison()?;

        while self.match_token(&TokenType::Equal) {
            let right = self.parse_comparison()?;
            left = binary(BinaryOp::Eq, left, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current().value {
                TokenType::Less => BinaryOp::Lt,
                TokenType::LessEqual => BinaryOp::Le,
                TokenType::Greater => BinaryOp::Gt,
                TokenType::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current().value {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> PhaseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().value {
                TokenType::Multiply => BinaryOp::Mul,
                TokenType::Divide => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> PhaseResult<Expr> {
        let op = match self.current().value {
            TokenType::LogicalNot => Some(UnaryOp::Not),
            TokenType::Minus => Some(UnaryOp::Neg),
            _ => None,
        };

        if let Some(op) = op {
            let start_span = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start_span.merge(operand.span);
            return Ok(Expr::new(ExprKind::Unary { op, operand }, span));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PhaseResult<Expr> {
        let span = self.current_span();

        match self.current().value.clone() {
            TokenType::IntegerLiteral(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Integer(value)), span))
            }
            TokenType::FloatLiteral(text) => {
                self.advance();
                // The lexer guarantees the digits '.' digits shape.
                let value = text.parse::<f64>().unwrap_or_default();
                Ok(Expr::new(ExprKind::Literal(Literal::Float(value)), span))
            }
            TokenType::StringLiteral(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::String(value)), span))
            }
            TokenType::BooleanLiteral(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Boolean(value)), span))
            }
            TokenType::Identifier(name) => {
                self.advance();
                let name = Spanned::new(name, span);

                if self.check(&TokenType::LeftParen) {
                    self.parse_call(name)
                } else {
                    Ok(Expr::new(ExprKind::Variable(name.value), span))
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(TokenType::RightParen, "')'")?;
                Ok(expression)
            }
            _ => Err(Diagnostic::new(ErrorKind::ExpectedExpression, span)),
        }
    }

    /// Parse `(args...)` for a call whose name is already consumed.
    fn parse_call(&mut self, name: Spanned<String>) -> PhaseResult<Expr> {
        self.expect(TokenType::LeftParen, "'('")?;

        let mut args = Vec::new();

        if !self.check(&TokenType::RightParen) {
            args.push(self.parse_expression()?);
            while self.match_token(&TokenType::Comma) {
                args.push(self.parse_expression()?);
            }
        }

        self.expect(TokenType::RightParen, "')'")?;

        let span = name.span.merge(self.previous_span());
        Ok(Expr::new(ExprKind::Call { name, args }, span))
    }

    // === Token helpers ===

    fn current(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.current == 0 {
            self.current_span()
        } else {
            self.tokens[self.current - 1].span
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.current().value == *token_type
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if !self.check(&TokenType::EndOfFile) {
            self.current += 1;
        }
    }

    fn expect(&mut self, token_type: TokenType, label: &str) -> PhaseResult<()> {
        if self.match_token(&token_type) {
            Ok(())
        } else {
            Err(Diagnostic::new(
                ErrorKind::ExpectedSymbol { expected: label.to_string() },
                self.current_span(),
            ))
        }
    }

    fn expect_identifier(&mut self, label: &str) -> PhaseResult<Spanned<String>> {
        let span = self.current_span();

        if let TokenType::Identifier(name) = self.current().value.clone() {
            self.advance();
            Ok(Spanned::new(name, span))
        } else {
            Err(Diagnostic::new(
                ErrorKind::ExpectedSymbol { expected: label.to_string() },
                span,
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenType::Newline) {
            self.advance();
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(ExprKind::Binary { op, left, right }, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_lexer::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        let tokens = Lexer::new(source).tokenize().expect("lexing failed");
        Parser::new(tokens).parse_program().expect("parsing failed")
    }

    fn parse_err(source: &str) -> Diagnostic {
        let tokens = Lexer::new(source).tokenize().expect("lexing failed");
        Parser::new(tokens)
            .parse_program()
            .expect_err("expected a parse error")
    }

    fn entry_statements(program: &Program) -> &[Stmt] {
        for declaration in &program.declarations {
            if let DeclarationKind::Entry(block) = &declaration.kind {
                return &block.statements;
            }
        }
        panic!("program has no entry block");
    }

    #[test]
    fn empty_entry_block() {
        let program = parse("entry { }");
        assert_eq!(program.declarations.len(), 1);
        assert!(entry_statements(&program).is_empty());
    }

    #[test]
    fn out_statement_with_string() {
        let program = parse("entry { out(\"hello\") }");
        let statements = entry_statements(&program);
        assert_eq!(statements.len(), 1);

        match &statements[0].kind {
            StmtKind::Out(expr) => match expr.kind.as_ref() {
                ExprKind::Literal(Literal::String(s)) => assert_eq!(s, "hello"),
                other => panic!("expected string literal, got {other:?}"),
            },
            other => panic!("expected out statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse("entry { out(x + y * 4) }");
        let statements = entry_statements(&program);

        let StmtKind::Out(expr) = &statements[0].kind else {
            panic!("expected out statement");
        };
        let ExprKind::Binary { op: BinaryOp::Add, left, right } = expr.kind.as_ref() else {
            panic!("expected addition at the root, got {:?}", expr.kind);
        };
        assert!(matches!(left.kind.as_ref(), ExprKind::Variable(name) if name == "x"));
        assert!(matches!(
            right.kind.as_ref(),
            ExprKind::Binary { op: BinaryOp::Mul, .. }
        ));
    }

    #[test]
    fn comparison_binds_tighter_than_logic() {
        let program = parse("entry { out(a < b && c > d) }");
        let statements = entry_statements(&program);

        let StmtKind::Out(expr) = &statements[0].kind else {
            panic!("expected out statement");
        };
        assert!(matches!(
            expr.kind.as_ref(),
            ExprKind::Binary { op: BinaryOp::And, .. }
        ));
    }

    #[test]
    fn function_declaration() {
        let program = parse("func add(a: int, b: int): int { return a + b }");

        let DeclarationKind::Function(function) = &program.declarations[0].kind else {
            panic!("expected function declaration");
        };
        assert_eq!(function.name.value, "add");
        assert_eq!(function.params.len(), 2);
        assert_eq!(function.params[0].ty, PrimitiveType::Int);
        assert_eq!(function.return_type, PrimitiveType::Int);
        assert_eq!(function.body.statements.len(), 1);
    }

    #[test]
    fn function_without_return_type_is_void() {
        let program = parse("func greet() { out(\"hi\") }");

        let DeclarationKind::Function(function) = &program.declarations[0].kind else {
            panic!("expected function declaration");
        };
        assert_eq!(function.return_type, PrimitiveType::Void);
    }

    #[test]
    fn grouped_let_with_initializers() {
        let program = parse("entry { let (x, y): int = (1, 2) }");
        let statements = entry_statements(&program);

        let StmtKind::Let(let_stmt) = &statements[0].kind else {
            panic!("expected let statement");
        };
        assert_eq!(let_stmt.names.len(), 2);
        assert_eq!(let_stmt.names[0].value, "x");
        assert_eq!(let_stmt.ty, PrimitiveType::Int);
        assert_eq!(let_stmt.initializers.len(), 2);
    }

    #[test]
    fn let_without_initializer() {
        let program = parse("entry { let flag: bool }");
        let statements = entry_statements(&program);

        let StmtKind::Let(let_stmt) = &statements[0].kind else {
            panic!("expected let statement");
        };
        assert!(let_stmt.initializers.is_empty());
    }

    #[test]
    fn else_if_chain_nests() {
        let source = "entry {\n if a { } else if b { } else { }\n}";
        let program = parse(source);
        let statements = entry_statements(&program);

        let StmtKind::If { else_block: Some(else_block), .. } = &statements[0].kind else {
            panic!("expected if with else");
        };
        assert_eq!(else_block.statements.len(), 1);
        assert!(matches!(
            else_block.statements[0].kind,
            StmtKind::If { else_block: Some(_), .. }
        ));
    }

    #[test]
    fn while_statement() {
        let source = "entry {\n let i: int = 0\n while i < 3 { i = i + 1 }\n}";
        let program = parse(source);
        let statements = entry_statements(&program);

        assert!(matches!(statements[1].kind, StmtKind::While { .. }));
    }

    #[test]
    fn call_in_statement_position() {
        let program = parse("entry { tick() }");
        let statements = entry_statements(&program);

        let StmtKind::Expr(expr) = &statements[0].kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind.as_ref(), ExprKind::Call { .. }));
    }

    #[test]
    fn global_declarations() {
        let program = parse("let total: int\nentry { }");

        let DeclarationKind::Global(global) = &program.declarations[0].kind else {
            panic!("expected global declaration");
        };
        assert_eq!(global.names[0].value, "total");
        assert_eq!(global.ty, PrimitiveType::Int);
    }

    #[test]
    fn global_initializer_is_rejected() {
        let err = parse_err("let total: int = 5\nentry { }");
        assert!(matches!(err.kind, ErrorKind::ExpectedSymbol { .. }));
        assert_eq!(err.kind.code(), 102);
    }

    #[test]
    fn statements_require_newline_separation() {
        let err = parse_err("entry { out(1) out(2) }");
        assert!(matches!(err.kind, ErrorKind::ExpectedSymbol { .. }));
    }

    #[test]
    fn missing_expression_is_reported() {
        let err = parse_err("entry { out() }");
        assert_eq!(err.kind, ErrorKind::ExpectedExpression);
    }

    #[test]
    fn stray_token_at_top_level() {
        let err = parse_err("42");
        assert_eq!(err.kind, ErrorKind::InvalidTopLevel);
    }

    #[test]
    fn bare_identifier_statement_is_rejected() {
        let err = parse_err("entry { someword }");
        assert!(matches!(err.kind, ErrorKind::ExpectedSymbol { .. }));
    }

    #[test]
    fn let_with_void_type_is_rejected() {
        let err = parse_err("entry { let x: void }");
        assert!(matches!(err.kind, ErrorKind::ExpectedSymbol { .. }));
    }

    #[test]
    fn unary_minus_parses_into_negation() {
        let program = parse("entry { out(-x + 1) }");
        let statements = entry_statements(&program);

        let StmtKind::Out(expr) = &statements[0].kind else {
            panic!("expected out statement");
        };
        let ExprKind::Binary { op: BinaryOp::Add, left, .. } = expr.kind.as_ref() else {
            panic!("expected addition at the root");
        };
        assert!(matches!(
            left.kind.as_ref(),
            ExprKind::Unary { op: UnaryOp::Neg, .. }
        ));
    }

    #[test]
    fn ast_serializes_to_json_and_back() {
        let program = parse("func id(x: int): int { return x }\nentry { out(id(1)) }");
        let json = serde_json::to_string(&program).expect("serialization failed");
        let round_tripped: Program =
            serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(program, round_tripped);
    }

    #[test]
    fn spans_point_into_the_source() {
        let program = parse("entry {\n out(nope)\n}");
        let statements = entry_statements(&program);

        let StmtKind::Out(expr) = &statements[0].kind else {
            panic!("expected out statement");
        };
        assert_eq!(expr.span.start.line, 2);
        assert_eq!(expr.span.start.column, 6);
        assert_eq!(expr.span.end.column, 9);
    }
}
