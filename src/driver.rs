//! Top-level script driver (§6): wires the registry, subroutine cache, and
//! root scope together the way the teacher's `Bash` struct drives a whole
//! script through its interpreter, and translates the execution loop's
//! result into a process exit code.

use std::path::Path;
use std::sync::Arc;

use crate::control_flow::{RunError, Signal};
use crate::engine;
use crate::primitive::ExecContext;
use crate::registry::Registry;
use crate::scope::Scope;
use crate::subroutine::SubroutineCache;
use crate::value::Value;

/// The result of driving one script to completion: its final value (the
/// block's `lastResult`, or `Null` if it terminated via `exit` or an
/// uncaught error) and the process exit code it implies.
pub struct RunOutcome {
    pub value: Value,
    pub exit_code: i32,
}

/// Reads, parses, and runs the script at `path` to completion (§6's CLI
/// surface: one positional script path). Never returns an `Err` — read and
/// parse failures are reported exactly like an uncaught runtime error, at
/// `error` severity with exit code `2`, per §7's propagation policy.
pub async fn run_script(path: &Path) -> RunOutcome {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            let err = RunError::LoadFailure { path: path.display().to_string(), cause: e.to_string() };
            log::error!("{}", err);
            return RunOutcome { value: Value::Null, exit_code: 2 };
        }
    };

    let instructions = match crate::parser::parse(&source) {
        Ok(instructions) => instructions,
        Err(err) => {
            log::error!("{}", err);
            return RunOutcome { value: Value::Null, exit_code: 2 };
        }
    };

    let script_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let registry = Arc::new(Registry::with_builtins());
    let mut scope = Scope::root(script_dir, registry.global_aliases());
    let mut subroutines = SubroutineCache::new();
    let source_id: Arc<str> = Arc::from(path.display().to_string());

    let mut ctx = ExecContext {
        scope: &mut scope,
        registry,
        subroutines: &mut subroutines,
        block: &instructions,
        source_id,
    };

    match engine::run_block(&mut ctx).await {
        Ok(value) => RunOutcome { value, exit_code: 0 },
        Err(err) => match err.as_signal() {
            Some(Signal::Exit { code }) => RunOutcome { value: Value::Null, exit_code: *code },
            _ => {
                log::error!("{}", err);
                RunOutcome { value: Value::Null, exit_code: 2 }
            }
        },
    }
}
