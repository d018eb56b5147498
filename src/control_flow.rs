//! Errors and control-flow carriers
//!
//! `RunError` is the unified error type every fallible interpreter operation
//! returns, mirroring the teacher's `InterpreterError` enum. Unlike that
//! enum, the non-local control-flow carriers (`return`, `exit`, `exec`,
//! `code`) are not folded into the error variants directly — they live in
//! the separate `Signal` type, transported inside `RunError::Signal`, so the
//! execution loop can match on a dedicated tag (§9 Design Notes) rather than
//! infer intent from an error message.

use thiserror::Error;

use crate::ast::InstructionList;
use crate::value::Value;

/// A non-local control-flow request produced by a primitive's `Execute`.
/// These are not "genuine" errors — they are deliberately carried through
/// the error channel because primitives only have one way to short-circuit
/// the normal store-in-slot flow, but the execution loop treats them as a
/// distinct tagged union, never as failures to report to the user.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Produced by `return`; unwinds to the nearest enclosing block.
    Return { value: Value },
    /// Produced by `exit`; escapes all the way to the driver.
    Exit { code: i32 },
    /// Produced by `exec`/`code`'s success hook; requests that the engine
    /// run `routine` in a fresh child scope with `args` bound to `_`.
    Exec { routine: InstructionList, args: Vec<Value> },
    /// Produced by `code`; requests resolution of routine references into a
    /// concatenated instruction list.
    Code { targets: Vec<CodeTarget> },
}

/// A single target passed to `code`, prior to resolution.
#[derive(Debug, Clone)]
pub enum CodeTarget {
    /// The sentinel `@`: the instructions of the enclosing block.
    EnclosingBlock,
    /// A subroutine reference to resolve through the loader.
    Routine(String),
    /// An already-parsed instruction or instruction list, passed through.
    Instructions(InstructionList),
}

/// The unified error type for the interpreter.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("unbound slot '{0}'")]
    UnboundSlot(String),
    #[error("slot name must not be empty")]
    EmptySlotName,
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),
    #[error("failed to load '{path}': {cause}")]
    LoadFailure { path: String, cause: String },
    #[error("parse error at line {line}: {message}")]
    ParseFailure { line: u32, message: String },
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("fractional value not allowed: {0}")]
    FractionalNotAllowed(String),
    #[error("overflow: {0}")]
    Overflow(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("too many arguments to '{opcode}' (max {max})")]
    TooManyArguments { opcode: String, max: usize },
    #[error("missing argument to '{opcode}': {expected}")]
    MissingArgument { opcode: String, expected: String },
    #[error("task cannot complete: already in a terminal state")]
    TaskInvalidStateForCompletion,
    #[error("task cannot error: already in a terminal state")]
    TaskInvalidStateForError,
    #[error("prompt request failed: {0}")]
    PromptFailure(String),
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("authentication failure: {0}")]
    AuthFailure(String),
    #[error("{message}")]
    Thrown { message: String },
    /// A non-local control-flow carrier, transported through the error
    /// channel but never reported to the user as a failure.
    #[error("control-flow signal")]
    Signal(Signal),
    /// An opcode-scoped error re-raised while unwinding through a subroutine
    /// or primitive call, per §7's propagation policy.
    #[error("{source_id}:{line}: {opcode}: {source}")]
    Chained {
        source_id: String,
        line: u32,
        opcode: String,
        #[source]
        source: Box<RunError>,
    },
}

impl RunError {
    pub fn thrown(message: impl Into<String>) -> Self {
        RunError::Thrown { message: message.into() }
    }

    /// Wrap this error with call-site context, per §7's chained-message
    /// propagation policy (`source:line: opcode: message`).
    pub fn chain(self, source_id: impl Into<String>, line: u32, opcode: impl Into<String>) -> Self {
        RunError::Chained {
            source_id: source_id.into(),
            line,
            opcode: opcode.into(),
            source: Box::new(self),
        }
    }

    /// True if this error is actually a `Signal` carrying non-local control
    /// flow rather than a genuine failure.
    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            RunError::Signal(s) => Some(s),
            RunError::Chained { source, .. } => source.as_signal(),
            _ => None,
        }
    }

    pub fn into_signal(self) -> Result<Signal, RunError> {
        match self {
            RunError::Signal(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl From<Signal> for RunError {
    fn from(s: Signal) -> Self {
        RunError::Signal(s)
    }
}
