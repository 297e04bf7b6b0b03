//! Two-pass type-checking bytecode emitter
//!
//! The first pass registers function signatures and global variables so
//! bodies can reference declarations that appear later in the source.
//! The second pass emits the entry block (so execution starts at offset
//! 0) followed by every function body in source order, enforcing the
//! type system as it walks. The first violation aborts emission.

use crate::bytecode::{CompiledProgram, FunctionDef, Opcode, Value};
use log::debug;
use phase_common::{Diagnostic, ErrorKind, PhaseResult};
use phase_parser::{
    BinaryOp, Block, DeclarationKind, Expr, ExprKind, Literal, PrimitiveType, Program, Stmt,
    StmtKind, UnaryOp,
};
use std::rc::Rc;

/// Jump targets are 16-bit absolute offsets, which caps the stream size.
const MAX_CODE_LEN: usize = u16::MAX as usize;
/// Constants, globals, locals, and functions are addressed by u16 operands.
const MAX_TABLE_LEN: usize = u16::MAX as usize + 1;

/// Where a resolved variable lives.
#[derive(Debug, Clone, Copy)]
enum VarSlot {
    Local(usize),
    Global(usize),
}

/// Mutable state for the function whose body is currently being emitted.
struct FuncState {
    name: String,
    return_type: PrimitiveType,
    locals: Vec<(String, PrimitiveType)>,
    has_return: bool,
}

impl FuncState {
    fn new(name: impl Into<String>, return_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            return_type,
            locals: Vec::new(),
            has_return: false,
        }
    }
}

/// Bytecode emitter
#[derive(Default)]
pub struct Emitter {
    code: Vec<u8>,
    constants: Vec<Value>,
    globals: Vec<(String, PrimitiveType)>,
    functions: Vec<FunctionDef>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a parsed program into bytecode and its side tables.
    pub fn compile(program: &Program) -> PhaseResult<CompiledProgram> {
        let mut emitter = Emitter::new();
        emitter.register_symbols(program)?;
        emitter.emit_program(program)
    }

    // === First pass: symbol registration ===

    fn register_symbols(&mut self, program: &Program) -> PhaseResult<()> {
        for declaration in &program.declarations {
            match &declaration.kind {
                DeclarationKind::Function(function) => {
                    if self.find_function(&function.name.value).is_some() {
                        return Err(Diagnostic::new(
                            ErrorKind::DuplicateFunction {
                                name: function.name.value.clone(),
                            },
                            function.name.span,
                        ));
                    }

                    if self.functions.len() >= MAX_TABLE_LEN {
                        return Err(Diagnostic::new(
                            ErrorKind::TableOverflow { what: "functions".to_string() },
                            declaration.span,
                        ));
                    }

                    let mut def =
                        FunctionDef::new(function.name.value.clone(), function.return_type);
                    def.param_types = function.params.iter().map(|p| p.ty).collect();
                    self.functions.push(def);
                }
                DeclarationKind::Global(global) => {
                    for name in &global.names {
                        if self.globals.iter().any(|(existing, _)| existing == &name.value) {
                            return Err(Diagnostic::new(
                                ErrorKind::DuplicateVariable { name: name.value.clone() },
                                name.span,
                            ));
                        }

                        if self.globals.len() >= MAX_TABLE_LEN {
                            return Err(Diagnostic::new(
                                ErrorKind::TableOverflow {
                                    what: "global variables".to_string(),
                                },
                                name.span,
                            ));
                        }

                        self.globals.push((name.value.clone(), global.ty));
                    }
                }
                DeclarationKind::Entry(_) => {}
            }
        }

        Ok(())
    }

    // === Second pass: emission ===

    fn emit_program(mut self, program: &Program) -> PhaseResult<CompiledProgram> {
        let mut entry: Option<FunctionDef> = None;

        // The entry block is emitted first so the VM starts at offset 0.
        for declaration in &program.declarations {
            if let DeclarationKind::Entry(block) = &declaration.kind {
                if entry.is_some() {
                    return Err(Diagnostic::new(ErrorKind::DuplicateEntry, declaration.span));
                }

                let mut state = FuncState::new("entry", PrimitiveType::Void);
                self.emit_block(&mut state, block)?;
                self.emit_op(Opcode::Halt)?;

                let mut def = FunctionDef::new("entry", PrimitiveType::Void);
                def.locals = state.locals;
                def.has_return = state.has_return;
                entry = Some(def);
            }
        }

        let entry = entry.ok_or_else(|| Diagnostic::unlocated(ErrorKind::NoEntry))?;

        // Function bodies follow, in source order.
        for declaration in &program.declarations {
            let DeclarationKind::Function(function) = &declaration.kind else {
                continue;
            };

            // Registered by the first pass; resolving by name again keeps
            // the table index authoritative.
            let index = match self.find_function(&function.name.value) {
                Some(index) => index,
                None => {
                    return Err(Diagnostic::new(
                        ErrorKind::UndefinedFunction {
                            name: function.name.value.clone(),
                        },
                        function.name.span,
                    ));
                }
            };

            let entry_ip = self.code.len();
            let mut state = FuncState::new(function.name.value.clone(), function.return_type);

            // Parameters become the first local slots.
            for param in &function.params {
                self.add_local(&mut state, &param.name.value, param.ty, param.span)?;
            }

            self.emit_block(&mut state, &function.body)?;

            if function.return_type == PrimitiveType::Void && !state.has_return {
                self.emit_op(Opcode::Ret)?;
            }

            if function.return_type != PrimitiveType::Void && !state.has_return {
                return Err(Diagnostic::new(
                    ErrorKind::MissingReturn {
                        name: function.name.value.clone(),
                        return_type: function.return_type.to_string(),
                    },
                    declaration.span,
                ));
            }

            let def = &mut self.functions[index];
            def.entry_ip = entry_ip;
            def.locals = state.locals;
            def.has_return = state.has_return;
        }

        debug!(
            "emitted {} bytecode bytes, {} constants, {} functions, {} globals",
            self.code.len(),
            self.constants.len(),
            self.functions.len(),
            self.globals.len()
        );

        Ok(CompiledProgram {
            code: self.code,
            constants: self.constants,
            functions: self.functions,
            globals: self.globals,
            entry,
        })
    }

    fn emit_block(&mut self, state: &mut FuncState, block: &Block) -> PhaseResult<()> {
        for statement in &block.statements {
            self.emit_statement(state, statement)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, state: &mut FuncState, statement: &Stmt) -> PhaseResult<()> {
        match &statement.kind {
            StmtKind::Out(expression) => {
                let ty = self.expr_type(state, expression)?;
                if ty == PrimitiveType::Void {
                    return Err(Diagnostic::new(
                        ErrorKind::TypeMismatch {
                            context: "out".to_string(),
                            expected: "a printable value".to_string(),
                            actual: "void".to_string(),
                        },
                        expression.span,
                    ));
                }

                self.emit_expression(state, expression)?;
                self.emit_op(Opcode::Print)?;
            }

            StmtKind::Assign { name, value } => {
                let (slot, var_type) =
                    self.resolve_variable(state, &name.value).ok_or_else(|| {
                        Diagnostic::new(
                            ErrorKind::UndefinedVariable { name: name.value.clone() },
                            name.span,
                        )
                    })?;

                let value_type = self.expr_type(state, value)?;
                if value_type != var_type {
                    return Err(Diagnostic::new(
                        ErrorKind::TypeMismatch {
                            context: name.value.clone(),
                            expected: var_type.to_string(),
                            actual: value_type.to_string(),
                        },
                        statement.span,
                    ));
                }

                self.emit_expression(state, value)?;
                self.emit_var_store(slot)?;
            }

            StmtKind::Let(let_stmt) => {
                let inits = let_stmt.initializers.len();
                if inits > 0 && inits != let_stmt.names.len() {
                    return Err(Diagnostic::new(
                        ErrorKind::WrongInitCount { names: let_stmt.names.len(), inits },
                        statement.span,
                    ));
                }

                for (i, name) in let_stmt.names.iter().enumerate() {
                    match let_stmt.initializers.get(i) {
                        Some(initializer) => {
                            // The initializer is checked before the name is
                            // in scope, so `let x: int = x` is undefined.
                            let init_type = self.expr_type(state, initializer)?;
                            if init_type != let_stmt.ty {
                                return Err(Diagnostic::new(
                                    ErrorKind::TypeMismatch {
                                        context: name.value.clone(),
                                        expected: let_stmt.ty.to_string(),
                                        actual: init_type.to_string(),
                                    },
                                    statement.span,
                                ));
                            }

                            let index =
                                self.add_local(state, &name.value, let_stmt.ty, name.span)?;
                            self.emit_expression(state, initializer)?;
                            self.emit_op(Opcode::SetLocal)?;
                            self.emit_u16(index as u16)?;
                        }
                        None => {
                            self.add_local(state, &name.value, let_stmt.ty, name.span)?;
                        }
                    }
                }
            }

            StmtKind::Return(value) => {
                if state.return_type == PrimitiveType::Void {
                    if let Some(expression) = value {
                        let actual = self.expr_type(state, expression)?;
                        return Err(Diagnostic::new(
                            ErrorKind::ReturnTypeMismatch {
                                name: state.name.clone(),
                                expected: "void".to_string(),
                                actual: actual.to_string(),
                            },
                            statement.span,
                        ));
                    }

                    self.emit_op(Opcode::Ret)?;
                    state.has_return = true;
                } else {
                    let expression = value.as_ref().ok_or_else(|| {
                        Diagnostic::new(
                            ErrorKind::ReturnTypeMismatch {
                                name: state.name.clone(),
                                expected: state.return_type.to_string(),
                                actual: "void".to_string(),
                            },
                            statement.span,
                        )
                    })?;

                    let actual = self.expr_type(state, expression)?;
                    if actual != state.return_type {
                        return Err(Diagnostic::new(
                            ErrorKind::ReturnTypeMismatch {
                                name: state.name.clone(),
                                expected: state.return_type.to_string(),
                                actual: actual.to_string(),
                            },
                            statement.span,
                        ));
                    }

                    self.emit_expression(state, expression)?;
                    self.emit_op(Opcode::Ret)?;
                    state.has_return = true;
                }
            }

            StmtKind::Expr(expression) => {
                let ty = self.expr_type(state, expression)?;
                self.emit_expression(state, expression)?;

                // Keep the stack balanced when the result is unused.
                if ty != PrimitiveType::Void {
                    self.emit_op(Opcode::Pop)?;
                }
            }

            StmtKind::If { condition, then_block, else_block } => {
                self.check_condition(state, condition)?;
                self.emit_expression(state, condition)?;

                let jump_false = self.emit_jump(Opcode::JumpIfFalse)?;
                self.emit_block(state, then_block)?;

                if let Some(else_block) = else_block {
                    let jump_end = self.emit_jump(Opcode::Jump)?;
                    self.patch_jump(jump_false);
                    self.emit_block(state, else_block)?;
                    self.patch_jump(jump_end);
                } else {
                    self.patch_jump(jump_false);
                }
            }

            StmtKind::While { condition, body } => {
                let loop_start = self.code.len();

                self.check_condition(state, condition)?;
                self.emit_expression(state, condition)?;

                let exit_jump = self.emit_jump(Opcode::JumpIfFalse)?;
                self.emit_block(state, body)?;

                self.emit_op(Opcode::Jump)?;
                self.emit_u16(loop_start as u16)?;

                self.patch_jump(exit_jump);
            }
        }

        Ok(())
    }

    fn check_condition(&self, state: &FuncState, condition: &Expr) -> PhaseResult<()> {
        let cond_type = self.expr_type(state, condition)?;
        if cond_type != PrimitiveType::Bool {
            return Err(Diagnostic::new(
                ErrorKind::TypeMismatch {
                    context: "condition".to_string(),
                    expected: "bool".to_string(),
                    actual: cond_type.to_string(),
                },
                condition.span,
            ));
        }
        Ok(())
    }

    // === Expressions ===

    /// Infer the type of an expression, enforcing the type rules on the
    /// way. Inference is total: every well-typed expression has exactly
    /// one type, and any disagreement is reported at its source span.
    fn expr_type(&self, state: &FuncState, expr: &Expr) -> PhaseResult<PrimitiveType> {
        match expr.kind.as_ref() {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Integer(_) => PrimitiveType::Int,
                Literal::Float(_) => PrimitiveType::Float,
                Literal::String(_) => PrimitiveType::Str,
                Literal::Boolean(_) => PrimitiveType::Bool,
            }),

            ExprKind::Variable(name) => self
                .resolve_variable(state, name)
                .map(|(_, ty)| ty)
                .ok_or_else(|| {
                    Diagnostic::new(
                        ErrorKind::UndefinedVariable { name: name.clone() },
                        expr.span,
                    )
                }),

            ExprKind::Call { name, args } => {
                let index = self.resolve_call(state, &name.value, name.span)?;
                let def = &self.functions[index];

                if args.len() != def.param_count() {
                    return Err(Diagnostic::new(
                        ErrorKind::ArityMismatch {
                            name: def.name.clone(),
                            expected: def.param_count(),
                            actual: args.len(),
                        },
                        expr.span,
                    ));
                }

                for (arg, &param_type) in args.iter().zip(def.param_types.iter()) {
                    let arg_type = self.expr_type(state, arg)?;
                    if arg_type != param_type {
                        return Err(Diagnostic::new(
                            ErrorKind::TypeMismatch {
                                context: def.name.clone(),
                                expected: param_type.to_string(),
                                actual: arg_type.to_string(),
                            },
                            arg.span,
                        ));
                    }
                }

                Ok(def.return_type)
            }

            ExprKind::Unary { op, operand } => {
                let inner = self.expr_type(state, operand)?;
                match op {
                    UnaryOp::Not => {
                        if inner != PrimitiveType::Bool {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: "'!'".to_string(),
                                    expected: "bool".to_string(),
                                    actual: inner.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(PrimitiveType::Bool)
                    }
                    UnaryOp::Neg => {
                        if !inner.is_numeric() {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: "negation".to_string(),
                                    expected: "number".to_string(),
                                    actual: inner.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(inner)
                    }
                }
            }

            ExprKind::Binary { op, left, right } => {
                let left_type = self.expr_type(state, left)?;
                let right_type = self.expr_type(state, right)?;

                if left_type != right_type {
                    return Err(Diagnostic::new(
                        ErrorKind::TypeMismatch {
                            context: op.to_string(),
                            expected: left_type.to_string(),
                            actual: right_type.to_string(),
                        },
                        expr.span,
                    ));
                }

                match op {
                    BinaryOp::And | BinaryOp::Or => {
                        if left_type != PrimitiveType::Bool {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: op.to_string(),
                                    expected: "bool".to_string(),
                                    actual: left_type.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(PrimitiveType::Bool)
                    }
                    BinaryOp::Eq => {
                        if left_type == PrimitiveType::Void {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: op.to_string(),
                                    expected: "a comparable value".to_string(),
                                    actual: left_type.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(PrimitiveType::Bool)
                    }
                    BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                        if !left_type.is_numeric() {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: op.to_string(),
                                    expected: "number".to_string(),
                                    actual: left_type.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(PrimitiveType::Bool)
                    }
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                        if !left_type.is_numeric() {
                            return Err(Diagnostic::new(
                                ErrorKind::TypeMismatch {
                                    context: op.to_string(),
                                    expected: "number".to_string(),
                                    actual: left_type.to_string(),
                                },
                                expr.span,
                            ));
                        }
                        Ok(left_type)
                    }
                }
            }
        }
    }

    /// Emit an already type-checked expression, post-order.
    fn emit_expression(&mut self, state: &FuncState, expr: &Expr) -> PhaseResult<()> {
        match expr.kind.as_ref() {
            ExprKind::Literal(literal) => {
                let value = match literal {
                    Literal::Integer(value) => Value::Int(*value),
                    Literal::Float(value) => Value::Float(*value),
                    Literal::String(value) => Value::Str(Rc::from(value.as_str())),
                    Literal::Boolean(value) => Value::Bool(*value),
                };
                let index = self.add_constant(value, expr)?;
                self.emit_op(Opcode::PushConst)?;
                self.emit_u16(index)?;
            }

            ExprKind::Variable(name) => {
                let (slot, _) = self.resolve_variable(state, name).ok_or_else(|| {
                    Diagnostic::new(
                        ErrorKind::UndefinedVariable { name: name.clone() },
                        expr.span,
                    )
                })?;
                self.emit_var_load(slot)?;
            }

            ExprKind::Call { name, args } => {
                let index = self.resolve_call(state, &name.value, name.span)?;

                for arg in args {
                    self.emit_expression(state, arg)?;
                }

                self.emit_op(Opcode::Call)?;
                self.emit_u16(index as u16)?;
            }

            ExprKind::Unary { op, operand } => {
                self.emit_expression(state, operand)?;
                self.emit_op(match op {
                    UnaryOp::Not => Opcode::Not,
                    UnaryOp::Neg => Opcode::Neg,
                })?;
            }

            ExprKind::Binary { op, left, right } => {
                self.emit_expression(state, left)?;
                self.emit_expression(state, right)?;
                self.emit_op(match op {
                    BinaryOp::Add => Opcode::Add,
                    BinaryOp::Sub => Opcode::Sub,
                    BinaryOp::Mul => Opcode::Mul,
                    BinaryOp::Div => Opcode::Div,
                    BinaryOp::Eq => Opcode::Equal,
                    BinaryOp::Lt => Opcode::Less,
                    BinaryOp::Le => Opcode::LessEqual,
                    BinaryOp::Gt => Opcode::Greater,
                    BinaryOp::Ge => Opcode::GreaterEqual,
                    BinaryOp::And => Opcode::And,
                    BinaryOp::Or => Opcode::Or,
                })?;
            }
        }

        Ok(())
    }

    // === Symbol helpers ===

    fn find_function(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|def| def.name == name)
    }

    /// Resolve a call target to its function-table index.
    ///
    /// A call to a name that is declared, just not as a function, is an
    /// undefined-function error; a bareword that resolves to nothing at
    /// all is reported as an unexpected identifier.
    fn resolve_call(
        &self,
        state: &FuncState,
        name: &str,
        span: phase_common::Span,
    ) -> PhaseResult<usize> {
        if let Some(index) = self.find_function(name) {
            return Ok(index);
        }

        let kind = if self.resolve_variable(state, name).is_some() {
            ErrorKind::UndefinedFunction { name: name.to_string() }
        } else {
            ErrorKind::UnexpectedIdentifier { name: name.to_string() }
        };

        Err(Diagnostic::new(kind, span))
    }

    /// Look a name up in the current function's locals first, then the
    /// global table.
    fn resolve_variable(
        &self,
        state: &FuncState,
        name: &str,
    ) -> Option<(VarSlot, PrimitiveType)> {
        if let Some(index) = state.locals.iter().position(|(local, _)| local == name) {
            return Some((VarSlot::Local(index), state.locals[index].1));
        }

        if let Some(index) = self.globals.iter().position(|(global, _)| global == name) {
            return Some((VarSlot::Global(index), self.globals[index].1));
        }

        None
    }

    /// Append a local slot; shadowing within a function is rejected.
    fn add_local(
        &self,
        state: &mut FuncState,
        name: &str,
        ty: PrimitiveType,
        span: phase_common::Span,
    ) -> PhaseResult<usize> {
        if state.locals.iter().any(|(local, _)| local == name) {
            return Err(Diagnostic::new(
                ErrorKind::DuplicateVariable { name: name.to_string() },
                span,
            ));
        }

        if state.locals.len() >= MAX_TABLE_LEN {
            return Err(Diagnostic::new(
                ErrorKind::TableOverflow { what: "local variables".to_string() },
                span,
            ));
        }

        state.locals.push((name.to_string(), ty));
        Ok(state.locals.len() - 1)
    }

    fn add_constant(&mut self, value: Value, expr: &Expr) -> PhaseResult<u16> {
        if self.constants.len() >= MAX_TABLE_LEN {
            return Err(Diagnostic::new(
                ErrorKind::TableOverflow { what: "constants".to_string() },
                expr.span,
            ));
        }

        self.constants.push(value);
        Ok((self.constants.len() - 1) as u16)
    }

    // === Instruction emission ===

    fn emit_byte(&mut self, byte: u8) -> PhaseResult<()> {
        if self.code.len() >= MAX_CODE_LEN {
            return Err(Diagnostic::unlocated(ErrorKind::BytecodeTooLarge));
        }
        self.code.push(byte);
        Ok(())
    }

    fn emit_op(&mut self, opcode: Opcode) -> PhaseResult<()> {
        self.emit_byte(opcode as u8)
    }

    fn emit_u16(&mut self, value: u16) -> PhaseResult<()> {
        self.emit_byte((value >> 8) as u8)?;
        self.emit_byte((value & 0xff) as u8)
    }

    fn emit_var_load(&mut self, slot: VarSlot) -> PhaseResult<()> {
        match slot {
            VarSlot::Local(index) => {
                self.emit_op(Opcode::GetLocal)?;
                self.emit_u16(index as u16)
            }
            VarSlot::Global(index) => {
                self.emit_op(Opcode::GetGlobal)?;
                self.emit_u16(index as u16)
            }
        }
    }

    fn emit_var_store(&mut self, slot: VarSlot) -> PhaseResult<()> {
        match slot {
            VarSlot::Local(index) => {
                self.emit_op(Opcode::SetLocal)?;
                self.emit_u16(index as u16)
            }
            VarSlot::Global(index) => {
                self.emit_op(Opcode::SetGlobal)?;
                self.emit_u16(index as u16)
            }
        }
    }

    /// Emit a jump with a two-byte placeholder; returns the placeholder
    /// offset to hand back to `patch_jump` once the target is known.
    fn emit_jump(&mut self, opcode: Opcode) -> PhaseResult<usize> {
        self.emit_op(opcode)?;
        let placeholder = self.code.len();
        self.emit_u16(0)?;
        Ok(placeholder)
    }

    /// Overwrite a placeholder with the current offset, big-endian.
    fn patch_jump(&mut self, placeholder: usize) {
        let target = self.code.len() as u16;
        self.code[placeholder] = (target >> 8) as u8;
        self.code[placeholder + 1] = (target & 0xff) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_lexer::Lexer;
    use phase_parser::Parser;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn compile(source: &str) -> CompiledProgram {
        try_compile(source).expect("compilation failed")
    }

    fn try_compile(source: &str) -> PhaseResult<CompiledProgram> {
        let tokens = Lexer::new(source).tokenize().expect("lexing failed");
        let program = Parser::new(tokens).parse_program().expect("parsing failed");
        Emitter::compile(&program)
    }

    fn compile_err(source: &str) -> Diagnostic {
        try_compile(source).expect_err("expected an emission error")
    }

    const PUSH_CONST: u8 = Opcode::PushConst as u8;
    const PRINT: u8 = Opcode::Print as u8;
    const SET_GLOBAL: u8 = Opcode::SetGlobal as u8;
    const GET_GLOBAL: u8 = Opcode::GetGlobal as u8;
    const SET_LOCAL: u8 = Opcode::SetLocal as u8;
    const GET_LOCAL: u8 = Opcode::GetLocal as u8;
    const CALL: u8 = Opcode::Call as u8;
    const RET: u8 = Opcode::Ret as u8;
    const JUMP: u8 = Opcode::Jump as u8;
    const JUMP_IF_FALSE: u8 = Opcode::JumpIfFalse as u8;
    const POP: u8 = Opcode::Pop as u8;
    const LESS: u8 = Opcode::Less as u8;
    const ADD: u8 = Opcode::Add as u8;
    const MUL: u8 = Opcode::Mul as u8;
    const HALT: u8 = Opcode::Halt as u8;

    #[test]
    fn hello_world_bytecode() {
        let program = compile("entry { out(\"hello\") }");

        assert_eq!(program.code, vec![PUSH_CONST, 0, 0, PRINT, HALT]);
        assert_eq!(
            program.constants,
            vec![Value::Str(std::rc::Rc::from("hello"))]
        );
        assert!(program.functions.is_empty());
        assert!(program.globals.is_empty());
    }

    #[test]
    fn empty_entry_emits_only_halt() {
        let program = compile("entry { }");
        assert_eq!(program.code, vec![HALT]);
        assert!(program.constants.is_empty());
    }

    #[test]
    fn arithmetic_is_emitted_post_order() {
        let program = compile("entry { out(2 + 3 * 4) }");

        assert_eq!(
            program.code,
            vec![
                PUSH_CONST, 0, 0, // 2
                PUSH_CONST, 0, 1, // 3
                PUSH_CONST, 0, 2, // 4
                MUL,
                ADD,
                PRINT,
                HALT,
            ]
        );
        assert_eq!(
            program.constants,
            vec![Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn while_loop_jump_targets() {
        let source = "entry {\nlet i: int = 0\nwhile i < 3 {\nout(i)\ni = i + 1\n}\n}";
        let program = compile(source);

        assert_eq!(
            program.code,
            vec![
                PUSH_CONST, 0, 0, // 0
                SET_LOCAL, 0, 0, // i = 0
                GET_LOCAL, 0, 0, // loop start, offset 6
                PUSH_CONST, 0, 1, // 3
                LESS,
                JUMP_IF_FALSE, 0, 33, // exit to the Halt
                GET_LOCAL, 0, 0,
                PRINT,
                GET_LOCAL, 0, 0,
                PUSH_CONST, 0, 2, // 1
                ADD,
                SET_LOCAL, 0, 0,
                JUMP, 0, 6, // back to the condition
                HALT,
            ]
        );
    }

    #[test]
    fn function_call_layout() {
        let program =
            compile("func add(a: int, b: int): int { return a + b }\nentry { out(add(40, 2)) }");

        // Entry first: push both arguments, call, print, halt.
        assert_eq!(
            program.code[..11],
            [
                PUSH_CONST, 0, 0, // 40
                PUSH_CONST, 0, 1, // 2
                CALL, 0, 0,
                PRINT,
                HALT,
            ]
        );

        // The body of `add` follows the entry block.
        let add = &program.functions[0];
        assert_eq!(add.entry_ip, 11);
        assert_eq!(add.param_count(), 2);
        assert_eq!(add.local_count(), 2);
        assert!(add.has_return);
        assert_eq!(
            program.code[11..],
            [GET_LOCAL, 0, 0, GET_LOCAL, 0, 1, ADD, RET]
        );
    }

    #[test]
    fn globals_are_assigned_in_declaration_order() {
        let program = compile("let a: int\nlet (b, c): bool\nentry { b = true }");

        assert_eq!(
            program.globals,
            vec![
                ("a".to_string(), PrimitiveType::Int),
                ("b".to_string(), PrimitiveType::Bool),
                ("c".to_string(), PrimitiveType::Bool),
            ]
        );
        assert_eq!(program.code, vec![PUSH_CONST, 0, 0, SET_GLOBAL, 0, 1, HALT]);
    }

    #[test]
    fn global_reads_use_get_global() {
        let program = compile("let g: int\nentry { g = 5\nout(g) }");
        assert_eq!(
            program.code,
            vec![
                PUSH_CONST, 0, 0,
                SET_GLOBAL, 0, 0,
                GET_GLOBAL, 0, 0,
                PRINT,
                HALT,
            ]
        );
    }

    #[test]
    fn non_void_call_statement_pops_its_result() {
        let program = compile("func f(): int { return 1 }\nentry { f() }");
        assert_eq!(program.code[..5], [CALL, 0, 0, POP, HALT]);
    }

    #[test]
    fn void_call_statement_leaves_stack_alone() {
        let program = compile("func f() { return }\nentry { f() }");
        assert_eq!(program.code[..4], [CALL, 0, 0, HALT]);
    }

    #[test]
    fn if_else_patches_both_jumps() {
        let program = compile("entry {\nif true {\nout(1)\n} else {\nout(2)\n}\n}");

        assert_eq!(
            program.code,
            vec![
                PUSH_CONST, 0, 0, // true
                JUMP_IF_FALSE, 0, 13, // to the else branch
                PUSH_CONST, 0, 1, // 1
                PRINT,
                JUMP, 0, 17, // over the else branch
                PUSH_CONST, 0, 2, // 2
                PRINT,
                HALT,
            ]
        );
    }

    #[test]
    fn emission_is_deterministic() {
        let source = "func f(x: int): int { return x * x }\nentry { out(f(9)) }";
        let first = compile(source);
        let second = compile(source);

        assert_eq!(first.code, second.code);
        assert_eq!(first.constants, second.constants);
        assert_eq!(first.globals, second.globals);
    }

    #[test_case("entry { let x: int = \"hi\" }" ; "string assigned to int")]
    #[test_case("entry { out(1 + 1.5) }" ; "mixed int and float arithmetic")]
    #[test_case("entry { out(!3) }" ; "logical not on int")]
    #[test_case("entry { if 1 { } }" ; "non bool condition")]
    #[test_case("entry { while 0 { } }" ; "non bool loop condition")]
    #[test_case("entry { out(true < false) }" ; "ordering on bools")]
    #[test_case("entry { out(-true) }" ; "negating a bool")]
    #[test_case("entry { out(1 && true) }" ; "logic on int")]
    #[test_case("let g: int\nentry { g = 1.5 }" ; "float assigned to int global")]
    fn type_mismatches_are_fatal(source: &str) {
        let err = compile_err(source);
        assert_eq!(err.kind.code(), 108, "unexpected kind: {:?}", err.kind);
    }

    #[test]
    fn scenario_type_mismatch_names_both_types() {
        let err = compile_err("entry { let x: int = \"hi\" }");
        assert_eq!(
            err.kind,
            ErrorKind::TypeMismatch {
                context: "x".to_string(),
                expected: "int".to_string(),
                actual: "str".to_string(),
            }
        );
        assert!(err.span.is_some());
    }

    #[test]
    fn printing_a_void_call_is_rejected() {
        let err = compile_err("func f() { }\nentry { out(f()) }");
        assert_eq!(err.kind.code(), 108);
    }

    #[test]
    fn undefined_variable() {
        let err = compile_err("entry { out(missing) }");
        assert_eq!(
            err.kind,
            ErrorKind::UndefinedVariable { name: "missing".to_string() }
        );
    }

    #[test]
    fn calling_an_unknown_bareword_is_an_unexpected_identifier() {
        let err = compile_err("entry { out(missing(1)) }");
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedIdentifier { name: "missing".to_string() }
        );
        assert_eq!(err.kind.code(), 120);
    }

    #[test]
    fn calling_a_variable_is_an_undefined_function() {
        let err = compile_err("entry { let f: int = 1\nout(f(2)) }");
        assert_eq!(
            err.kind,
            ErrorKind::UndefinedFunction { name: "f".to_string() }
        );
        assert_eq!(err.kind.code(), 115);
    }

    #[test]
    fn calling_a_global_is_an_undefined_function() {
        let err = compile_err("let handler: bool\nentry { handler() }");
        assert_eq!(
            err.kind,
            ErrorKind::UndefinedFunction { name: "handler".to_string() }
        );
    }

    #[test]
    fn duplicate_function() {
        let err = compile_err("func f() { }\nfunc f() { }\nentry { }");
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateFunction { name: "f".to_string() }
        );
    }

    #[test]
    fn arity_mismatch() {
        let err = compile_err("func add(a: int, b: int): int { return a + b }\nentry { out(add(1)) }");
        assert_eq!(
            err.kind,
            ErrorKind::ArityMismatch {
                name: "add".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn argument_type_mismatch_points_at_the_argument() {
        let err =
            compile_err("func add(a: int, b: int): int { return a + b }\nentry { out(add(1, true)) }");
        assert_eq!(err.kind.code(), 108);
        let span = err.span.unwrap();
        assert_eq!(span.start.column, 20);
    }

    #[test]
    fn missing_return_in_non_void_function() {
        let err = compile_err("func f(): int { out(1) }\nentry { }");
        assert_eq!(err.kind.code(), 118);
    }

    #[test]
    fn return_with_value_in_void_function() {
        let err = compile_err("func f() { return 1 }\nentry { }");
        assert_eq!(err.kind.code(), 119);
    }

    #[test]
    fn bare_return_in_int_function() {
        let err = compile_err("func f(): int { return }\nentry { }");
        assert_eq!(err.kind.code(), 119);
    }

    #[test]
    fn wrong_initializer_count() {
        let err = compile_err("entry { let (x, y): int = (1, 2, 3) }");
        assert_eq!(
            err.kind,
            ErrorKind::WrongInitCount { names: 2, inits: 3 }
        );
    }

    #[test]
    fn local_shadowing_is_rejected() {
        let err = compile_err("entry { let x: int\nlet x: int }");
        assert_eq!(err.kind.code(), 123);
    }

    #[test]
    fn parameter_shadowing_is_rejected() {
        let err = compile_err("func f(a: int) { let a: int }\nentry { }");
        assert_eq!(err.kind.code(), 123);
    }

    #[test]
    fn duplicate_global_names_are_rejected() {
        let err = compile_err("let g: int\nlet g: bool\nentry { }");
        assert_eq!(err.kind.code(), 123);
    }

    #[test]
    fn self_referential_initializer_is_undefined() {
        let err = compile_err("entry { let x: int = x }");
        assert_eq!(
            err.kind,
            ErrorKind::UndefinedVariable { name: "x".to_string() }
        );
    }

    #[test]
    fn no_entry_block() {
        let err = compile_err("func f() { }");
        assert_eq!(err.kind, ErrorKind::NoEntry);
        assert!(err.span.is_none());
    }

    #[test]
    fn duplicate_entry_blocks() {
        let err = compile_err("entry { }\nentry { }");
        assert_eq!(err.kind, ErrorKind::DuplicateEntry);
        assert!(err.span.is_some());
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut source = String::from("entry {\n");
        // Each statement emits four bytes; 17,000 of them blow the
        // 65,535-byte stream limit before any table overflows.
        for _ in 0..17_000 {
            source.push_str("out(1)\n");
        }
        source.push('}');

        let err = compile_err(&source);
        assert_eq!(err.kind, ErrorKind::BytecodeTooLarge);
    }

    #[test]
    fn recursion_type_checks_against_its_own_signature() {
        let program = compile(
            "func fib(n: int): int {\nif n < 2 {\nreturn n\n}\nreturn fib(n - 1) + fib(n - 2)\n}\nentry { out(fib(10)) }",
        );
        assert_eq!(program.functions.len(), 1);
        assert!(program.functions[0].has_return);
    }
}
