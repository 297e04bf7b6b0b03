//! Stack virtual machine
//!
//! Executes the flat instruction stream the emitter produced. State is
//! a value stack, a globals array, and a stack of call frames, each
//! owning its local slots. Execution is strictly single-threaded; one
//! instruction is decoded and dispatched at a time until `Halt`, the
//! outermost `Ret`, or a fatal runtime diagnostic.
//!
//! The per-opcode type checks are defensive guards: the emitter has
//! already type-checked the program, so none of them fire on bytecode
//! it produced.

use log::debug;
use phase_codegen::{CompiledProgram, Opcode, Value};
use phase_common::{Diagnostic, ErrorKind, PhaseResult};
use phase_parser::PrimitiveType;
use std::io::{self, Write};

/// Per-invocation record: the callee's locals and where to resume.
struct CallFrame {
    return_type: PrimitiveType,
    locals: Vec<Value>,
    return_ip: usize,
}

/// Virtual machine for Phase bytecode
pub struct Vm<W: Write> {
    program: CompiledProgram,
    stack: Vec<Value>,
    globals: Vec<Value>,
    frames: Vec<CallFrame>,
    ip: usize,
    output: W,
}

impl Vm<io::Stdout> {
    /// A VM that prints to standard output.
    pub fn new(program: CompiledProgram) -> Self {
        Self::with_output(program, io::stdout())
    }
}

impl<W: Write> Vm<W> {
    pub fn with_output(program: CompiledProgram, output: W) -> Self {
        let globals = vec![Value::Void; program.globals.len()];

        // The seed frame for the entry block resumes past the end of the
        // code, so a stray `Ret` in entry terminates cleanly; the normal
        // exit is `Halt`.
        let entry_frame = CallFrame {
            return_type: program.entry.return_type,
            locals: vec![Value::Void; program.entry.local_count()],
            return_ip: program.code.len(),
        };

        Self {
            program,
            stack: Vec::new(),
            globals,
            frames: vec![entry_frame],
            ip: 0,
            output,
        }
    }

    /// Number of values currently on the stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of live call frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Give back the output sink, e.g. to inspect captured output.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the dispatch loop to completion.
    pub fn run(&mut self) -> PhaseResult<()> {
        debug!(
            "executing {} bytecode bytes with {} globals",
            self.program.code.len(),
            self.globals.len()
        );

        loop {
            if self.ip >= self.program.code.len() {
                return Err(Diagnostic::unlocated(ErrorKind::IpOutOfBounds));
            }

            let byte = self.program.code[self.ip];
            self.ip += 1;

            let opcode = Opcode::try_from(byte).map_err(|byte| {
                Diagnostic::unlocated(ErrorKind::InvalidOpcode { opcode: byte as u16 })
            })?;

            match opcode {
                Opcode::PushConst => {
                    let index = self.read_u16()? as usize;
                    let value = self.program.constants.get(index).cloned().ok_or_else(|| {
                        Diagnostic::unlocated(ErrorKind::InvalidConstIndex {
                            count: self.program.constants.len(),
                        })
                    })?;
                    self.stack.push(value);
                }

                Opcode::Print => {
                    let value = self.pop()?;
                    let _ = writeln!(self.output, "{value}");
                }

                Opcode::SetGlobal => {
                    let index = self.read_u16()? as usize;
                    let value = self.pop()?;
                    if index >= self.globals.len() {
                        return Err(Diagnostic::unlocated(ErrorKind::InvalidVarIndex {
                            count: self.globals.len(),
                        }));
                    }
                    self.globals[index] = value;
                }

                Opcode::GetGlobal => {
                    let index = self.read_u16()? as usize;
                    let value = self.globals.get(index).cloned().ok_or_else(|| {
                        Diagnostic::unlocated(ErrorKind::InvalidVarIndex {
                            count: self.globals.len(),
                        })
                    })?;
                    self.stack.push(value);
                }

                Opcode::SetLocal => {
                    let index = self.read_u16()? as usize;
                    let value = self.pop()?;
                    let frame = self.current_frame_mut()?;
                    if index >= frame.locals.len() {
                        return Err(Diagnostic::unlocated(ErrorKind::InvalidVarIndex {
                            count: frame.locals.len(),
                        }));
                    }
                    frame.locals[index] = value;
                }

                Opcode::GetLocal => {
                    let index = self.read_u16()? as usize;
                    let frame = self.current_frame()?;
                    let value = frame.locals.get(index).cloned().ok_or_else(|| {
                        Diagnostic::unlocated(ErrorKind::InvalidVarIndex {
                            count: frame.locals.len(),
                        })
                    })?;
                    self.stack.push(value);
                }

                Opcode::Call => {
                    let index = self.read_u16()? as usize;
                    let function = self.program.functions.get(index).ok_or_else(|| {
                        Diagnostic::unlocated(ErrorKind::InvalidOpcode {
                            opcode: index as u16,
                        })
                    })?;

                    let entry_ip = function.entry_ip;
                    let return_type = function.return_type;
                    let param_count = function.param_count();
                    let mut locals = vec![Value::Void; function.local_count()];

                    // Arguments were pushed left to right, so the rightmost
                    // is popped first into the last parameter slot.
                    for slot in (0..param_count).rev() {
                        locals[slot] = self.pop()?;
                    }

                    self.frames.push(CallFrame {
                        return_type,
                        locals,
                        return_ip: self.ip,
                    });
                    self.ip = entry_ip;
                }

                Opcode::Ret => {
                    let result = if self.current_frame()?.return_type != PrimitiveType::Void {
                        Some(self.pop()?)
                    } else {
                        None
                    };

                    // Frames are destroyed strictly LIFO; the frame's
                    // locals are dropped here.
                    let frame = self.frames.pop().ok_or_else(|| {
                        Diagnostic::unlocated(ErrorKind::TypeGuard)
                    })?;

                    if self.frames.is_empty() {
                        return Ok(());
                    }

                    self.ip = frame.return_ip;

                    if let Some(value) = result {
                        self.stack.push(value);
                    }
                }

                Opcode::Pop => {
                    self.pop()?;
                }

                Opcode::Jump => {
                    let target = self.read_u16()? as usize;
                    self.ip = target;
                }

                Opcode::JumpIfFalse => {
                    let target = self.read_u16()? as usize;
                    match self.pop()? {
                        Value::Bool(condition) => {
                            if !condition {
                                self.ip = target;
                            }
                        }
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::Not => {
                    match self.pop()? {
                        Value::Bool(value) => self.stack.push(Value::Bool(!value)),
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::Neg => {
                    match self.pop()? {
                        Value::Int(value) => self.stack.push(Value::Int(value.wrapping_neg())),
                        Value::Float(value) => self.stack.push(Value::Float(-value)),
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::And => {
                    let (a, b) = self.pop_pair()?;
                    match (a, b) {
                        (Value::Bool(a), Value::Bool(b)) => self.stack.push(Value::Bool(a && b)),
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::Or => {
                    let (a, b) = self.pop_pair()?;
                    match (a, b) {
                        (Value::Bool(a), Value::Bool(b)) => self.stack.push(Value::Bool(a || b)),
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::Equal => {
                    let (a, b) = self.pop_pair()?;
                    let result = match (&a, &b) {
                        (Value::Int(a), Value::Int(b)) => a == b,
                        (Value::Float(a), Value::Float(b)) => a == b,
                        (Value::Bool(a), Value::Bool(b)) => a == b,
                        // Strings compare by byte sequence.
                        (Value::Str(a), Value::Str(b)) => a == b,
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    };
                    self.stack.push(Value::Bool(result));
                }

                Opcode::Less => self.comparison(|a, b| a < b, |a, b| a < b)?,
                Opcode::Greater => self.comparison(|a, b| a > b, |a, b| a > b)?,
                Opcode::LessEqual => self.comparison(|a, b| a <= b, |a, b| a <= b)?,
                Opcode::GreaterEqual => self.comparison(|a, b| a >= b, |a, b| a >= b)?,

                Opcode::Add => {
                    self.arithmetic(i32::wrapping_add, |a, b| a + b)?;
                }
                Opcode::Sub => {
                    self.arithmetic(i32::wrapping_sub, |a, b| a - b)?;
                }
                Opcode::Mul => {
                    self.arithmetic(i32::wrapping_mul, |a, b| a * b)?;
                }

                Opcode::Div => {
                    let (a, b) = self.pop_pair()?;
                    match (a, b) {
                        (Value::Int(a), Value::Int(b)) => {
                            if b == 0 {
                                return Err(Diagnostic::unlocated(ErrorKind::DivisionByZero));
                            }
                            // Truncates toward zero; i32::MIN / -1 wraps.
                            self.stack.push(Value::Int(a.wrapping_div(b)));
                        }
                        (Value::Float(a), Value::Float(b)) => {
                            // IEEE-754: division by zero yields inf/NaN.
                            self.stack.push(Value::Float(a / b));
                        }
                        _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
                    }
                }

                Opcode::Halt => {
                    // Normal termination releases every frame.
                    self.frames.clear();
                    return Ok(());
                }
            }
        }
    }

    fn read_u16(&mut self) -> PhaseResult<u16> {
        if self.ip + 2 > self.program.code.len() {
            return Err(Diagnostic::unlocated(ErrorKind::IpOutOfBounds));
        }
        let high = self.program.code[self.ip] as u16;
        let low = self.program.code[self.ip + 1] as u16;
        self.ip += 2;
        Ok((high << 8) | low)
    }

    fn pop(&mut self) -> PhaseResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Diagnostic::unlocated(ErrorKind::TypeGuard))
    }

    /// Pop two operands; the right-hand side is on top.
    fn pop_pair(&mut self) -> PhaseResult<(Value, Value)> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    fn current_frame(&self) -> PhaseResult<&CallFrame> {
        self.frames
            .last()
            .ok_or_else(|| Diagnostic::unlocated(ErrorKind::InvalidVarIndex { count: 0 }))
    }

    fn current_frame_mut(&mut self) -> PhaseResult<&mut CallFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| Diagnostic::unlocated(ErrorKind::InvalidVarIndex { count: 0 }))
    }

    fn comparison(
        &mut self,
        int_op: fn(i32, i32) -> bool,
        float_op: fn(f64, f64) -> bool,
    ) -> PhaseResult<()> {
        let (a, b) = self.pop_pair()?;
        match (a, b) {
            (Value::Int(a), Value::Int(b)) => self.stack.push(Value::Bool(int_op(a, b))),
            (Value::Float(a), Value::Float(b)) => self.stack.push(Value::Bool(float_op(a, b))),
            _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
        }
        Ok(())
    }

    fn arithmetic(
        &mut self,
        int_op: fn(i32, i32) -> i32,
        float_op: fn(f64, f64) -> f64,
    ) -> PhaseResult<()> {
        let (a, b) = self.pop_pair()?;
        match (a, b) {
            (Value::Int(a), Value::Int(b)) => self.stack.push(Value::Int(int_op(a, b))),
            (Value::Float(a), Value::Float(b)) => self.stack.push(Value::Float(float_op(a, b))),
            _ => return Err(Diagnostic::unlocated(ErrorKind::TypeGuard)),
        }
        Ok(())
    }
}
