//! Task primitives (§4.5, §5): `async`, `await`, `wait`, `status`.
//!
//! `async`'s `Execute` constructs the pending `Task` handle synchronously
//! (so the caller already has a `Value::Task` to hand around even before
//! the worker starts); its success hook is where the worker actually gets
//! spawned onto the runtime, since that is the one place in the primitive
//! interface that is allowed to outlive the instruction that triggered it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ast::{InstructionList, PropertyRef};
use crate::control_flow::RunError;
use crate::engine;
use crate::primitive::{ExecContext, Primitive};
use crate::subroutine::SubroutineCache;
use crate::task::{Task, TaskOutcome};
use crate::value::coerce::{self, FloatWidth};
use crate::value::Value;

fn as_instruction_list(value: &Value) -> Option<InstructionList> {
    match value {
        Value::InstructionList(list) => Some(list.clone()),
        Value::Instruction(instr) => Some(vec![(**instr).clone()]),
        _ => None,
    }
}

pub struct AsyncPrimitive;

#[async_trait]
impl Primitive for AsyncPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/async"
    }

    async fn execute(&self, mut args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.is_empty() {
            return Err(RunError::MissingArgument {
                opcode: self.canonical_path().to_string(),
                expected: "a routine (instruction list or instruction) followed by call arguments".to_string(),
            });
        }
        let routine_value = args.remove(0);
        let routine = as_instruction_list(&routine_value)
            .ok_or_else(|| RunError::TypeMismatch(format!("async expects an instruction list, got {}", routine_value.type_name())))?;
        Ok(Value::Task(Task::spawn_pending(routine, args)))
    }

    /// Spawns the worker: a fresh child scope (disjoint slots, chained
    /// aliases) and a fresh subroutine cache of its own (§5 — workers don't
    /// share their parent's cache), running under its own `tokio::spawn`
    /// task so the caller's `run_block` is free to move on.
    async fn on_success(&self, result: Value, _dest: &PropertyRef, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let handle = match &result {
            Value::Task(handle) => handle.clone(),
            _ => return Err(RunError::TypeMismatch("async success hook received a non-task result".to_string())),
        };

        let mut worker_scope = ctx.scope.child();
        worker_scope.set(PropertyRef::CURRENT, Value::List(handle.args.clone()))?;

        let registry = ctx.registry.clone();
        let source_id = ctx.source_id.clone();
        let routine = handle.routine.clone();
        let worker_handle = handle.clone();

        handle.mark_running();
        tokio::spawn(async move {
            let mut subroutines = SubroutineCache::new();
            let mut scope = worker_scope;
            let mut worker_ctx = ExecContext {
                scope: &mut scope,
                registry,
                subroutines: &mut subroutines,
                block: &routine,
                source_id,
            };
            match engine::run_block(&mut worker_ctx).await {
                Ok(value) => {
                    let _ = worker_handle.complete(value);
                }
                Err(err) => {
                    let _ = worker_handle.fail(err.to_string());
                }
            }
        });

        Ok(Value::Task(handle))
    }
}

fn require_task<'a>(opcode: &str, args: &'a [Value]) -> Result<&'a crate::task::TaskHandle, RunError> {
    match args {
        [Value::Task(handle)] => Ok(handle),
        [single] => Err(RunError::TypeMismatch(format!("{} expects a task, got {}", opcode, single.type_name()))),
        [] => Err(RunError::MissingArgument { opcode: opcode.to_string(), expected: "1 task argument".to_string() }),
        _ => Err(RunError::TooManyArguments { opcode: opcode.to_string(), max: 1 }),
    }
}

pub struct AwaitPrimitive;

#[async_trait]
impl Primitive for AwaitPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/await"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let handle = require_task(self.canonical_path(), &args)?;
        match handle.outcome().await {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Error(message) => Err(RunError::thrown(message)),
        }
    }
}

/// `wait duration` sleeps and returns `true`; `wait task` blocks until the
/// task reaches a terminal state and returns `[ok payload]`, where `ok` is
/// `true`/`false` and `payload` is the value or error message.
pub struct WaitPrimitive;

#[async_trait]
impl Primitive for WaitPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/wait"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        match args.as_slice() {
            [Value::Task(handle)] => match handle.outcome().await {
                TaskOutcome::Completed(value) => Ok(Value::List(vec![Value::Bool(true), value])),
                TaskOutcome::Error(message) => Ok(Value::List(vec![Value::Bool(false), Value::string(message)])),
            },
            [single @ (Value::Int(_) | Value::UInt(_) | Value::Float(_))] => {
                let millis = coerce::to_float(single, FloatWidth::W64)?;
                if millis < 0.0 {
                    return Err(RunError::InvalidArgument(format!("wait duration must not be negative, got {}", millis)));
                }
                tokio::time::sleep(std::time::Duration::from_secs_f64(millis / 1000.0)).await;
                Ok(Value::Bool(true))
            }
            [other] => Err(RunError::InvalidArgument(format!("wait expects a task or a finite non-negative number, got {}", other.type_name()))),
            [] => Err(RunError::MissingArgument { opcode: self.canonical_path().to_string(), expected: "1 argument (a duration or a task)".to_string() }),
            _ => Err(RunError::TooManyArguments { opcode: self.canonical_path().to_string(), max: 1 }),
        }
    }
}

pub struct StatusPrimitive;

#[async_trait]
impl Primitive for StatusPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/status"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let handle = require_task(self.canonical_path(), &args)?;
        Ok(Value::string(handle.status()))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    registry.register(Arc::new(AsyncPrimitive));
    registry.register(Arc::new(AwaitPrimitive));
    registry.register(Arc::new(WaitPrimitive));
    registry.register(Arc::new(StatusPrimitive));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scope::Scope;

    fn ctx<'a>(scope: &'a mut Scope, registry: Arc<Registry>, subs: &'a mut SubroutineCache, block: &'a InstructionList) -> ExecContext<'a> {
        ExecContext { scope, registry, subroutines: subs, block, source_id: Arc::from("test") }
    }

    #[tokio::test]
    async fn async_then_await_roundtrips_return_value() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);

        let routine = crate::parser::parse(r#"return "done""#).unwrap();
        let pending = AsyncPrimitive.execute(vec![Value::InstructionList(routine)], &mut c).await.unwrap();
        let task_value = AsyncPrimitive.on_success(pending, &PropertyRef::current(), &mut c).await.unwrap();

        let awaited = AwaitPrimitive.execute(vec![task_value], &mut c).await.unwrap();
        assert_eq!(awaited, Value::string("done"));
    }

    #[tokio::test]
    async fn status_reports_pending_before_any_worker_runs() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);

        let routine = crate::parser::parse(r#"return 1"#).unwrap();
        let pending = AsyncPrimitive.execute(vec![Value::InstructionList(routine)], &mut c).await.unwrap();
        let status = StatusPrimitive.execute(vec![pending], &mut c).await.unwrap();
        assert_eq!(status, Value::string("pending"));
    }

    #[tokio::test]
    async fn wait_on_a_number_sleeps_and_returns_true() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let result = WaitPrimitive.execute(vec![Value::Float(0.0)], &mut c).await.unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[tokio::test]
    async fn wait_rejects_non_numeric_arguments() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = WaitPrimitive.execute(vec![Value::Bool(true)], &mut c).await.unwrap_err();
        assert!(matches!(err, RunError::InvalidArgument(_)));
        let err = WaitPrimitive.execute(vec![Value::string("500")], &mut c).await.unwrap_err();
        assert!(matches!(err, RunError::InvalidArgument(_)));
    }
}
