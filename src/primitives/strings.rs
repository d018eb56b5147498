//! String primitives (§4.1): `concat`, `trim`, `uppercase`, `lowercase`.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::value::Value;

fn require_string(opcode: &str, args: &[Value]) -> Result<&str, RunError> {
    match args {
        [Value::String(s)] => Ok(s.as_str()),
        [single] => Err(RunError::TypeMismatch(format!("{} expects a string, got {}", opcode, single.type_name()))),
        [] => Err(RunError::MissingArgument { opcode: opcode.to_string(), expected: "1 string argument".to_string() }),
        _ => Err(RunError::TooManyArguments { opcode: opcode.to_string(), max: 1 }),
    }
}

/// Variadic string concatenation, using the same any→string canonical
/// coercion as `throw`, but with no separator between arguments.
pub struct ConcatPrimitive;

#[async_trait]
impl Primitive for ConcatPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/concat"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        Ok(Value::string(args.iter().map(|v| v.to_string()).collect::<String>()))
    }
}

pub struct TrimPrimitive;

#[async_trait]
impl Primitive for TrimPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/trim"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        Ok(Value::string(require_string(self.canonical_path(), &args)?.trim()))
    }
}

pub struct UppercasePrimitive;

#[async_trait]
impl Primitive for UppercasePrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/uppercase"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        Ok(Value::string(require_string(self.canonical_path(), &args)?.to_uppercase()))
    }
}

pub struct LowercasePrimitive;

#[async_trait]
impl Primitive for LowercasePrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/lowercase"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        Ok(Value::string(require_string(self.canonical_path(), &args)?.to_lowercase()))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(ConcatPrimitive));
    registry.register(Arc::new(TrimPrimitive));
    registry.register(Arc::new(UppercasePrimitive));
    registry.register(Arc::new(LowercasePrimitive));
}
