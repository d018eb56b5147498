//! Runtime metaprogramming (§4.5): `exec`, `code`, `compile`.
//!
//! `exec` and `code` both hand a structured request back as the raw
//! `Execute` result, not through the error channel — they are not
//! control-flow escapes, only `return`/`exit` use that channel. The
//! request travels as a `Value::Opaque` carrier wrapping the matching
//! `Signal` variant; the primitive's own success hook immediately
//! downcasts and consumes it, so it is never observed by a script.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ast::{InstructionList, PropertyRef};
use crate::control_flow::{CodeTarget, RunError, Signal};
use crate::engine;
use crate::primitive::{ExecContext, Primitive};
use crate::value::Value;

fn as_instruction_list(value: &Value) -> Option<InstructionList> {
    match value {
        Value::InstructionList(list) => Some(list.clone()),
        Value::Instruction(instr) => Some(vec![(**instr).clone()]),
        _ => None,
    }
}

fn downcast_signal(result: &Value) -> Option<&Signal> {
    match result {
        Value::Opaque(carrier) => carrier.downcast_ref::<Signal>(),
        _ => None,
    }
}

pub struct ExecPrimitive;

#[async_trait]
impl Primitive for ExecPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/exec"
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
            .ok_or_else(|| RunError::TypeMismatch(format!("exec expects an instruction list, got {}", routine_value.type_name())))?;
        let carrier: Arc<dyn Any + Send + Sync> = Arc::new(Signal::Exec { routine, args });
        Ok(Value::Opaque(carrier))
    }

    async fn on_success(&self, result: Value, _dest: &PropertyRef, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        match downcast_signal(&result) {
            Some(Signal::Exec { routine, args }) => engine::run_routine_in_child_scope(routine, args.clone(), ctx).await,
            _ => Err(RunError::TypeMismatch("exec success hook received a foreign carrier".to_string())),
        }
    }
}

pub struct CodePrimitive;

#[async_trait]
impl Primitive for CodePrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/code"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let targets = if args.is_empty() {
            vec![CodeTarget::EnclosingBlock]
        } else {
            args.iter()
                .map(|v| match v {
                    Value::String(s) if s == PropertyRef::BLOCK => Ok(CodeTarget::EnclosingBlock),
                    Value::String(s) => Ok(CodeTarget::Routine(s.clone())),
                    other => as_instruction_list(other)
                        .map(CodeTarget::Instructions)
                        .ok_or_else(|| RunError::TypeMismatch(format!("code target must be a string or instruction list, got {}", other.type_name()))),
                })
                .collect::<Result<Vec<_>, RunError>>()?
        };
        let carrier: Arc<dyn Any + Send + Sync> = Arc::new(Signal::Code { targets });
        Ok(Value::Opaque(carrier))
    }

    async fn on_success(&self, result: Value, _dest: &PropertyRef, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let targets = match downcast_signal(&result) {
            Some(Signal::Code { targets }) => targets,
            _ => return Err(RunError::TypeMismatch("code success hook received a foreign carrier".to_string())),
        };

        let mut resolved = Vec::new();
        for target in targets {
            match target {
                CodeTarget::EnclosingBlock => resolved.extend(ctx.block.iter().cloned()),
                CodeTarget::Routine(name) => resolved.extend(ctx.subroutines.load(name, ctx.scope.script_dir())?.0),
                CodeTarget::Instructions(list) => resolved.extend(list.iter().cloned()),
            }
        }
        Ok(Value::InstructionList(resolved))
    }
}

/// Parses and concatenates its arguments into a single instruction list;
/// unlike `code` it needs no success hook since there is nothing dynamic
/// left to resolve once parsing succeeds.
pub struct CompilePrimitive;

#[async_trait]
impl Primitive for CompilePrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/compile"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.is_empty() {
            return Err(RunError::MissingArgument {
                opcode: self.canonical_path().to_string(),
                expected: "at least 1 argument".to_string(),
            });
        }
        let mut resolved: InstructionList = Vec::new();
        for arg in &args {
            match arg {
                Value::String(source) => resolved.extend(crate::parser::parse(source)?),
                other => {
                    let list = as_instruction_list(other)
                        .ok_or_else(|| RunError::TypeMismatch(format!("compile expects a string or instruction list, got {}", other.type_name())))?;
                    resolved.extend(list);
                }
            }
        }
        Ok(Value::InstructionList(resolved))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    registry.register(Arc::new(ExecPrimitive));
    registry.register(Arc::new(CodePrimitive));
    registry.register(Arc::new(CompilePrimitive));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scope::Scope;
    use crate::subroutine::SubroutineCache;

    fn ctx<'a>(scope: &'a mut Scope, registry: Arc<Registry>, subs: &'a mut SubroutineCache, block: &'a InstructionList) -> ExecContext<'a> {
        ExecContext { scope, registry, subroutines: subs, block, source_id: Arc::from("test") }
    }

    #[tokio::test]
    async fn exec_runs_routine_and_returns_its_result() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);

        let routine = crate::parser::parse(r#"return "ok""#).unwrap();
        let carrier = ExecPrimitive.execute(vec![Value::InstructionList(routine), Value::Int(1)], &mut c).await.unwrap();
        let result = ExecPrimitive.on_success(carrier, &PropertyRef::current(), &mut c).await.unwrap();
        assert_eq!(result, Value::string("ok"));
    }

    #[tokio::test]
    async fn code_with_no_args_captures_enclosing_block() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = crate::parser::parse("let 1\nlet 2").unwrap();
        let mut c = ctx(&mut scope, registry, &mut subs, &block);

        let carrier = CodePrimitive.execute(vec![], &mut c).await.unwrap();
        let result = CodePrimitive.on_success(carrier, &PropertyRef::current(), &mut c).await.unwrap();
        match result {
            Value::InstructionList(list) => assert_eq!(list.len(), 2),
            other => panic!("expected instruction list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn compile_parses_source_strings() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);

        let result = CompilePrimitive.execute(vec![Value::string("let _ 1")], &mut c).await.unwrap();
        match result {
            Value::InstructionList(list) => assert_eq!(list.len(), 1),
            other => panic!("expected instruction list, got {:?}", other),
        }
    }
}
