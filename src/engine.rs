//! The instruction-block evaluator (§4.4)
//!
//! `run_block` ties the opcode registry, scope, subroutine cache, and
//! primitive hooks together. It recurses into itself for subroutine calls,
//! which is why the public entry point returns a boxed future: an `async
//! fn` cannot call itself directly without producing an infinitely-sized
//! future type.

use std::sync::Arc;

use crate::ast::{Argument, InstructionList};
use crate::control_flow::{RunError, Signal};
use crate::primitive::{BoxFuture, ExecContext};
use crate::value::Value;

/// Execute `ctx.block` under `ctx.scope`, returning the block's final
/// result. See §4.4 for the six-step per-instruction algorithm.
pub fn run_block<'a, 'b>(ctx: &'b mut ExecContext<'a>) -> BoxFuture<'b, Result<Value, RunError>>
where
    'a: 'b,
{
    Box::pin(async move {
        let mut last_result = ctx.scope.get(crate::ast::PropertyRef::CURRENT).cloned().unwrap_or(Value::Null);

        for instruction in ctx.block.iter() {
            let resolved_opcode = ctx.scope.resolve_opcode(&instruction.opcode);

            let mut args = Vec::with_capacity(instruction.arguments.len());
            for argument in &instruction.arguments {
                let value = match argument {
                    Argument::Literal(v) => v.clone(),
                    Argument::Ref(slot) => ctx.scope.get_required(slot.as_str())?.clone(),
                };
                args.push(value);
            }

            let primitive = ctx.registry.get(&resolved_opcode).cloned();

            let dispatch_result: Result<Value, RunError> = match &primitive {
                Some(p) => p.execute(args, ctx).await,
                None => call_subroutine(&resolved_opcode, args, ctx).await,
            };

            match dispatch_result {
                Ok(raw) => {
                    let processed = match &primitive {
                        Some(p) => p.on_success(raw, &instruction.destination, ctx).await,
                        None => Ok(raw),
                    };
                    match processed {
                        Ok(value) => {
                            ctx.scope.set(instruction.destination.as_str(), value.clone())?;
                            last_result = value;
                        }
                        Err(err) => {
                            return Err(err.chain(ctx.source_id.as_ref(), instruction.line, instruction.opcode.clone()));
                        }
                    }
                }
                Err(err) => {
                    let is_return = matches!(err.as_signal(), Some(Signal::Return { .. }));
                    let hook_result = match &primitive {
                        Some(p) => p.on_error(err, ctx).await,
                        None => Err(err),
                    };
                    match hook_result {
                        Ok(value) => {
                            if is_return {
                                return Ok(value);
                            }
                            ctx.scope.set(instruction.destination.as_str(), value.clone())?;
                            last_result = value;
                        }
                        Err(err) => {
                            if matches!(err.as_signal(), Some(Signal::Exit { .. })) {
                                return Err(err);
                            }
                            return Err(err.chain(ctx.source_id.as_ref(), instruction.line, instruction.opcode.clone()));
                        }
                    }
                }
            }
        }

        Ok(last_result)
    })
}

/// §4.4 step 3's subroutine branch: load the callee, bind `_` to the
/// argument list in a fresh child scope, and recurse. Errors raised inside
/// the callee are chained against its own resolved path, not the caller's
/// (§7: "reported at the call site with the callee's path").
async fn call_subroutine(resolved_opcode: &str, args: Vec<Value>, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
    let (routine, callee_source_id) = ctx.subroutines.load(resolved_opcode, ctx.scope.script_dir())?;

    let mut child_scope = ctx.scope.child();
    child_scope.set(crate::ast::PropertyRef::CURRENT, Value::List(args))?;

    let mut child_ctx = ExecContext {
        scope: &mut child_scope,
        registry: ctx.registry.clone(),
        subroutines: &mut *ctx.subroutines,
        block: &routine,
        source_id: Arc::from(callee_source_id),
    };
    run_block(&mut child_ctx).await
}

/// Used by `exec`'s and `async`'s success hooks to run a dynamically
/// supplied routine in a fresh child scope (§4.5).
pub async fn run_routine_in_child_scope(
    routine: &InstructionList,
    args: Vec<Value>,
    ctx: &mut ExecContext<'_>,
) -> Result<Value, RunError> {
    let mut child_scope = ctx.scope.child();
    child_scope.set(crate::ast::PropertyRef::CURRENT, Value::List(args))?;

    let mut child_ctx = ExecContext {
        scope: &mut child_scope,
        registry: ctx.registry.clone(),
        subroutines: &mut *ctx.subroutines,
        block: routine,
        source_id: ctx.source_id.clone(),
    };
    run_block(&mut child_ctx).await
}
