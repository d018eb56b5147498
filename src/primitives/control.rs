//! Non-local control flow (§4.5): `return`, `exit`, `throw`.
//!
//! `return` and `exit` both produce their carrier through the error
//! channel (§9 Design Notes): `Execute` fails with a tagged `Signal`, and
//! the execution loop (`engine::run_block`) recognises the tag rather than
//! inferring intent from the error's message.

use async_trait::async_trait;

use crate::control_flow::{RunError, Signal};
use crate::primitive::{ExecContext, Primitive};
use crate::value::coerce::{self, IntWidth};
use crate::value::Value;

pub struct ReturnPrimitive;

#[async_trait]
impl Primitive for ReturnPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/return"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        match args.as_slice() {
            [_] => {
                let value = args.into_iter().next().unwrap();
                Err(RunError::Signal(Signal::Return { value }))
            }
            [] => Err(RunError::MissingArgument { opcode: self.canonical_path().to_string(), expected: "1 argument".to_string() }),
            _ => Err(RunError::TooManyArguments { opcode: self.canonical_path().to_string(), max: 1 }),
        }
    }

    /// Converts the `Return` signal into a terminating success; the
    /// execution loop recognises the original error was tagged `Return`
    /// and unwinds the block with this value rather than storing it and
    /// continuing (§4.4 step 5).
    async fn on_error(&self, error: RunError, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        match error.as_signal() {
            Some(Signal::Return { value }) => Ok(value.clone()),
            _ => Err(error),
        }
    }
}

pub struct ExitPrimitive;

#[async_trait]
impl Primitive for ExitPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/exit"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let code = match args.as_slice() {
            [] => 1,
            [single] => coerce::to_signed(single, IntWidth::W32)? as i32,
            _ => return Err(RunError::TooManyArguments { opcode: self.canonical_path().to_string(), max: 1 }),
        };
        Err(RunError::Signal(Signal::Exit { code }))
    }

    // No `on_error` override: the default propagates the same `Exit`
    // signal unchanged, which is exactly "re-wraps ... so it continues to
    // propagate" (§4.5).
}

pub struct ThrowPrimitive;

#[async_trait]
impl Primitive for ThrowPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/throw"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let message = args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        Err(RunError::thrown(message))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(ReturnPrimitive));
    registry.register(Arc::new(ExitPrimitive));
    registry.register(Arc::new(ThrowPrimitive));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scope::Scope;
    use crate::subroutine::SubroutineCache;
    use std::sync::Arc;

    fn ctx<'a>(scope: &'a mut Scope, registry: Arc<Registry>, subs: &'a mut SubroutineCache, block: &'a crate::ast::InstructionList) -> ExecContext<'a> {
        ExecContext { scope, registry, subroutines: subs, block, source_id: Arc::from("test") }
    }

    #[tokio::test]
    async fn return_signal_is_unwrapped_by_its_own_hook() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = ReturnPrimitive.execute(vec![Value::string("hi")], &mut c).await.unwrap_err();
        assert!(matches!(err.as_signal(), Some(Signal::Return { .. })));
        let value = ReturnPrimitive.on_error(err, &mut c).await.unwrap();
        assert_eq!(value, Value::string("hi"));
    }

    #[tokio::test]
    async fn exit_default_code_is_one() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = ExitPrimitive.execute(vec![], &mut c).await.unwrap_err();
        assert!(matches!(err.as_signal(), Some(Signal::Exit { code: 1 })));
    }

    #[tokio::test]
    async fn throw_concatenates_with_spaces() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = ThrowPrimitive.execute(vec![Value::string("bad"), Value::Int(42)], &mut c).await.unwrap_err();
        match err {
            RunError::Thrown { message } => assert_eq!(message, "bad 42"),
            other => panic!("expected Thrown, got {:?}", other),
        }
    }
}
