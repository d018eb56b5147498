//! `let` (§4.5): a typed no-op that exists so `x <- let 42` reads as an
//! assignment; it has no effect beyond handing its argument back.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::value::Value;

pub struct LetPrimitive;

#[async_trait]
impl Primitive for LetPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/let"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        match args.into_iter().next() {
            Some(value) => Ok(value),
            None => Ok(Value::Null),
        }
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(LetPrimitive));
}
