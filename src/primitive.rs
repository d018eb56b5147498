//! Primitive interface (§2, §4.4)
//!
//! Each built-in opcode implements `Primitive`. `execute` is the ordinary
//! call; the two hooks are the mechanism by which `return`/`exit` (via
//! `on_error`) and `exec`/`code`/`async` (via `on_success`) hijack the
//! normal "store the result in the destination slot" flow described in
//! §4.4 step 4. Primitives that don't need a hook simply inherit the
//! identity/propagate defaults.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ast::{InstructionList, PropertyRef};
use crate::control_flow::RunError;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::subroutine::SubroutineCache;
use crate::value::Value;

/// A boxed, `Send` future — used for the handful of call sites that recurse
/// back into `crate::engine::run_block`, which would otherwise produce a
/// self-referential, infinitely-sized future type.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a primitive's `Execute`/hooks need beyond their own
/// arguments: the mutable current scope, the read-only opcode registry, the
/// subroutine cache to load callees into, the enclosing block (for the `@`
/// sentinel), and an identifier for the current source file (for chained
/// error messages, §7).
///
/// `registry` is an `Arc` and `source_id` an `Arc<str>` rather than borrows:
/// the `async` primitive's success hook spawns a worker that outlives the
/// instruction that created it, so both need to be cheaply cloned into a
/// `'static` task rather than borrowed from the spawning call's stack.
pub struct ExecContext<'a> {
    pub scope: &'a mut Scope,
    pub registry: Arc<Registry>,
    pub subroutines: &'a mut SubroutineCache,
    pub block: &'a InstructionList,
    pub source_id: Arc<str>,
}

#[async_trait]
pub trait Primitive: Send + Sync {
    /// The canonical path this primitive self-registers under, e.g. `/gnd/int`.
    fn canonical_path(&self) -> &'static str;

    async fn execute(&self, args: Vec<Value>, ctx: &mut ExecContext<'_>) -> Result<Value, RunError>;

    /// Block-success hook: default passes the raw result through unchanged.
    async fn on_success(
        &self,
        result: Value,
        _dest: &PropertyRef,
        _ctx: &mut ExecContext<'_>,
    ) -> Result<Value, RunError> {
        Ok(result)
    }

    /// Block-error hook: default propagates the error unchanged.
    async fn on_error(&self, error: RunError, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        Err(error)
    }
}
