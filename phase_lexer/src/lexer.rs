//! Hand-written lexer for the Phase language
//!
//! Newlines are significant (they terminate statements) and are kept in
//! the token stream; all other whitespace and `--` comments are skipped.

use crate::{Token, TokenType, TokenUtils};
use memchr::memchr;
use phase_common::{Diagnostic, ErrorKind, PhaseResult, Position, Span};
use unicode_xid::UnicodeXID;

/// Lexer for Phase source text
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    current_pos: Position,
    last_pos: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            current_pos: Position::origin(),
            last_pos: Position::origin(),
        }
    }

    /// Tokenize the entire input, ending with an EOF token.
    pub fn tokenize(&mut self) -> PhaseResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        let eof_span = Span::single(self.current_pos);
        tokens.push(TokenUtils::new(TokenType::EndOfFile, eof_span));

        Ok(tokens)
    }

    /// Get the next token from the input, or `None` at end of input.
    pub fn next_token(&mut self) -> PhaseResult<Option<Token>> {
        self.skip_whitespace_and_comments();

        let start_pos = self.current_pos;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token_type = match c {
            '\n' => {
                self.advance();
                TokenType::Newline
            }
            '{' => {
                self.advance();
                TokenType::LeftBrace
            }
            '}' => {
                self.advance();
                TokenType::RightBrace
            }
            '(' => {
                self.advance();
                TokenType::LeftParen
            }
            ')' => {
                self.advance();
                TokenType::RightParen
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ':' => {
                self.advance();
                TokenType::Colon
            }
            '+' => {
                self.advance();
                TokenType::Plus
            }
            '-' => {
                // '--' was already consumed as a comment above.
                self.advance();
                TokenType::Minus
            }
            '*' => {
                self.advance();
                TokenType::Multiply
            }
            '/' => {
                self.advance();
                TokenType::Divide
            }
            '!' => {
                self.advance();
                TokenType::LogicalNot
            }
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::Equal
                } else {
                    TokenType::Assign
                }
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                }
            }
            '&' => {
                self.advance();
                if self.peek() == Some('&') {
                    self.advance();
                    TokenType::LogicalAnd
                } else {
                    TokenType::Unknown('&')
                }
            }
            '|' => {
                self.advance();
                if self.peek() == Some('|') {
                    self.advance();
                    TokenType::LogicalOr
                } else {
                    TokenType::Unknown('|')
                }
            }
            '"' => return self.scan_string(start_pos).map(Some),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c == '_' || c.is_xid_start() => self.scan_identifier_or_keyword(),
            other => {
                self.advance();
                TokenType::Unknown(other)
            }
        };

        Ok(Some(TokenUtils::new(token_type, self.span_from(start_pos))))
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.last_pos)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;

        self.last_pos = self.current_pos;
        self.position += c.len_utf8();
        self.current_pos.offset = self.position as u32;

        if c == '\n' {
            self.current_pos.line += 1;
            self.current_pos.column = 1;
        } else {
            self.current_pos.column += 1;
        }

        Some(c)
    }

    /// Skip spaces, tabs, carriage returns, and `--` comments.
    /// Newlines stay in the stream; they separate statements.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('-') if self.peek_second() == Some('-') => {
                    let rest = &self.input[self.position..];
                    let skipped = match memchr(b'\n', rest.as_bytes()) {
                        Some(len) => &rest[..len],
                        None => rest,
                    };
                    self.current_pos.column += skipped.chars().count() as u32;
                    self.position += skipped.len();
                    self.current_pos.offset = self.position as u32;
                }
                _ => break,
            }
        }
    }

    fn scan_string(&mut self, start_pos: Position) -> PhaseResult<Token> {
        self.advance(); // opening quote

        let mut value = String::new();

        loop {
            let c = match self.peek() {
                Some(c) => c,
                None => {
                    return Err(Diagnostic::new(
                        ErrorKind::UnterminatedString,
                        self.span_from(start_pos),
                    ));
                }
            };

            if c == '"' {
                self.advance();
                break;
            }

            if c == '\\' {
                self.advance();
                match self.peek() {
                    Some('n') => {
                        self.advance();
                        value.push('\n');
                    }
                    Some('t') => {
                        self.advance();
                        value.push('\t');
                    }
                    Some('r') => {
                        self.advance();
                        value.push('\r');
                    }
                    Some('\\') => {
                        self.advance();
                        value.push('\\');
                    }
                    Some('"') => {
                        self.advance();
                        value.push('"');
                    }
                    // Unrecognized escape: keep the backslash and let the
                    // following character be processed normally.
                    Some(_) => value.push('\\'),
                    None => {
                        return Err(Diagnostic::new(
                            ErrorKind::UnterminatedString,
                            self.span_from(start_pos),
                        ));
                    }
                }
                continue;
            }

            self.advance();
            value.push(c);
        }

        Ok(TokenUtils::new(
            TokenType::StringLiteral(value),
            self.span_from(start_pos),
        ))
    }

    fn scan_number(&mut self) -> TokenType {
        let start = self.position;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A '.' followed by a digit turns the literal into a float.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            return TokenType::FloatLiteral(self.input[start..self.position].to_string());
        }

        // Fold digits with wrapping arithmetic; overflowing literals wrap
        // the same way runtime arithmetic does.
        let mut value: i32 = 0;
        for digit in self.input[start..self.position].bytes() {
            value = value.wrapping_mul(10).wrapping_add((digit - b'0') as i32);
        }

        TokenType::IntegerLiteral(value)
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenType {
        let start = self.position;

        self.advance(); // first char already validated

        while self
            .peek()
            .is_some_and(|c| c == '_' || c.is_xid_continue())
        {
            self.advance();
        }

        let lexeme = &self.input[start..self.position];

        match lexeme {
            "entry" => TokenType::KeywordEntry,
            "out" => TokenType::KeywordOut,
            "let" => TokenType::KeywordLet,
            "func" => TokenType::KeywordFunc,
            "return" => TokenType::KeywordReturn,
            "if" => TokenType::KeywordIf,
            "else" => TokenType::KeywordElse,
            "while" => TokenType::KeywordWhile,
            "true" => TokenType::BooleanLiteral(true),
            "false" => TokenType::BooleanLiteral(false),
            "int" => TokenType::TypeInt,
            "float" => TokenType::TypeFloat,
            "bool" => TokenType::TypeBool,
            "str" => TokenType::TypeStr,
            "void" => TokenType::TypeVoid,
            _ => TokenType::Identifier(lexeme.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn lex(source: &str) -> Vec<TokenType> {
        Lexer::new(source)
            .tokenize()
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn keywords_and_types() {
        assert_eq!(
            lex("entry out let func return if else while int float bool str void"),
            vec![
                TokenType::KeywordEntry,
                TokenType::KeywordOut,
                TokenType::KeywordLet,
                TokenType::KeywordFunc,
                TokenType::KeywordReturn,
                TokenType::KeywordIf,
                TokenType::KeywordElse,
                TokenType::KeywordWhile,
                TokenType::TypeInt,
                TokenType::TypeFloat,
                TokenType::TypeBool,
                TokenType::TypeStr,
                TokenType::TypeVoid,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex("+ * / = == < <= > >= && || !"),
            vec![
                TokenType::Plus,
                TokenType::Multiply,
                TokenType::Divide,
                TokenType::Assign,
                TokenType::Equal,
                TokenType::Less,
                TokenType::LessEqual,
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::LogicalAnd,
                TokenType::LogicalOr,
                TokenType::LogicalNot,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn minus_is_distinct_from_comment() {
        assert_eq!(
            lex("1 - 2"),
            vec![
                TokenType::IntegerLiteral(1),
                TokenType::Minus,
                TokenType::IntegerLiteral(2),
                TokenType::EndOfFile,
            ]
        );
        // Two adjacent dashes start a comment.
        assert_eq!(
            lex("1 -- 2"),
            vec![TokenType::IntegerLiteral(1), TokenType::EndOfFile]
        );
    }

    #[test]
    fn comments_preserve_newlines() {
        assert_eq!(
            lex("-- heading\nout"),
            vec![
                TokenType::Newline,
                TokenType::KeywordOut,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn call_statement_tokens() {
        assert_eq!(
            lex("out(add(40, 2))"),
            vec![
                TokenType::KeywordOut,
                TokenType::LeftParen,
                TokenType::Identifier("add".to_string()),
                TokenType::LeftParen,
                TokenType::IntegerLiteral(40),
                TokenType::Comma,
                TokenType::IntegerLiteral(2),
                TokenType::RightParen,
                TokenType::RightParen,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            lex(r#""a\nb\t\"c\"""#),
            vec![
                TokenType::StringLiteral("a\nb\t\"c\"".to_string()),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::new("out(\"oops").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        assert_eq!(err.kind.code(), 101);
        let span = err.span.unwrap();
        assert_eq!(span.start.column, 5);
    }

    #[test]
    fn float_literals_keep_their_text() {
        assert_eq!(
            lex("1.5 0.25"),
            vec![
                TokenType::FloatLiteral("1.5".to_string()),
                TokenType::FloatLiteral("0.25".to_string()),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn integer_literal_wraps_like_runtime_arithmetic() {
        assert_eq!(
            lex("2147483648"),
            vec![TokenType::IntegerLiteral(i32::MIN), TokenType::EndOfFile]
        );
    }

    #[test]
    fn spans_are_one_based_and_inclusive() {
        let tokens = Lexer::new("let x").tokenize().unwrap();

        let let_span = tokens[0].span;
        assert_eq!((let_span.start.line, let_span.start.column), (1, 1));
        assert_eq!((let_span.end.line, let_span.end.column), (1, 3));

        let x_span = tokens[1].span;
        assert_eq!((x_span.start.column, x_span.end.column), (5, 5));
    }

    #[test]
    fn newlines_advance_lines() {
        let tokens = Lexer::new("out\nout").tokenize().unwrap();
        assert_eq!(tokens[2].span.start.line, 2);
    }

    #[test]
    fn stray_ampersand_is_unknown() {
        assert_eq!(
            lex("a & b"),
            vec![
                TokenType::Identifier("a".to_string()),
                TokenType::Unknown('&'),
                TokenType::Identifier("b".to_string()),
                TokenType::EndOfFile,
            ]
        );
    }

    proptest! {
        #[test]
        fn integer_literals_round_trip(value in 0i32..=i32::MAX) {
            let source = value.to_string();
            prop_assert_eq!(
                lex(&source),
                vec![TokenType::IntegerLiteral(value), TokenType::EndOfFile]
            );
        }

        #[test]
        fn identifiers_round_trip(name in "[a-z][a-z0-9_]{0,12}") {
            prop_assume!(!matches!(
                name.as_str(),
                "entry" | "out" | "let" | "func" | "return" | "if" | "else"
                    | "while" | "true" | "false" | "int" | "float" | "bool"
                    | "str" | "void"
            ));
            prop_assert_eq!(
                lex(&name),
                vec![TokenType::Identifier(name.clone()), TokenType::EndOfFile]
            );
        }
    }
}
