//! Instruction AST
//!
//! The canonical intermediate form the parser produces and the execution
//! engine consumes: one `Instruction` per source line, each carrying a
//! destination slot, an opcode name (still alias-unresolved), and an
//! ordered argument list. Instructions are immutable once parsed.

use crate::value::Value;

/// A reference to a named slot in the current scope.
///
/// `_` is the implicit "current value" slot; `@` is only meaningful to the
/// `code`/`exec` primitives, where it refers to the instructions of the
/// enclosing block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyRef(pub String);

impl PropertyRef {
    pub const CURRENT: &'static str = "_";
    pub const BLOCK: &'static str = "@";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn current() -> Self {
        Self(Self::CURRENT.to_string())
    }

    pub fn is_current(&self) -> bool {
        self.0 == Self::CURRENT
    }

    pub fn is_block(&self) -> bool {
        self.0 == Self::BLOCK
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// An instruction argument: either a literal value fixed at parse time, or a
/// property reference resolved against the current scope at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(Value),
    Ref(PropertyRef),
}

impl From<Value> for Argument {
    fn from(v: Value) -> Self {
        Argument::Literal(v)
    }
}

impl From<PropertyRef> for Argument {
    fn from(p: PropertyRef) -> Self {
        Argument::Ref(p)
    }
}

/// One parsed source line: `destination <- opcode arg...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub destination: PropertyRef,
    pub opcode: String,
    pub arguments: Vec<Argument>,
    /// 1-based line number in the originating source, used for diagnostics.
    pub line: u32,
}

impl Instruction {
    pub fn new(destination: PropertyRef, opcode: impl Into<String>, arguments: Vec<Argument>, line: u32) -> Self {
        Self { destination, opcode: opcode.into(), arguments, line }
    }
}

/// A finite ordered sequence of instructions executed under a single scope.
pub type InstructionList = Vec<Instruction>;
