//! gnd — a tree-walking interpreter for a line-oriented scripting language.
//!
//! This library provides the parser, opcode registry, built-in primitives,
//! and execution loop; the `gnd` binary (`main.rs`) is a thin CLI driver
//! over it.

pub mod ast;
pub mod control_flow;
pub mod driver;
pub mod embedded;
pub mod engine;
pub mod parser;
pub mod primitive;
pub mod primitives;
pub mod prompt_client;
pub mod registry;
pub mod scope;
pub mod subroutine;
pub mod task;
pub mod value;

/// Canonical-path prefix every built-in primitive and embedded subroutine
/// registers under, e.g. `/gnd/int`.
pub const OPCODE_PREFIX: &str = "/gnd";

/// File extension subroutine sources are resolved with.
pub const ROUTINE_EXTENSION: &str = "gnd";

pub use ast::{Argument, Instruction, InstructionList, PropertyRef};
pub use control_flow::{CodeTarget, RunError, Signal};
pub use registry::Registry;
pub use value::Value;
