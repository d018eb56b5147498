//! Output primitives (§4.1, §10.3): `print`, `println`, `log`.
//!
//! All three accept an optional leading severity word; the remaining
//! arguments are space-joined into the message. `print`/`println`
//! additionally write the composed message straight to stdout, since they
//! are the script's user-facing output channel, but every one of the three
//! also goes through the `log` crate so severity-based output shares a sink
//! with the interpreter's own diagnostics, configured by the driver's
//! `env_logger` setup.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::value::Value;

fn joined(args: &[Value]) -> String {
    args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

/// Splits an optional leading severity word (`error`/`warn`/`info`/`debug`/
/// `trace`) off `args`, defaulting to `info` if omitted or unrecognized.
fn split_level(args: &[Value]) -> (&'static str, &[Value]) {
    match args.split_first() {
        Some((Value::String(level), rest)) if level == "error" => ("error", rest),
        Some((Value::String(level), rest)) if level == "warn" => ("warn", rest),
        Some((Value::String(level), rest)) if level == "info" => ("info", rest),
        Some((Value::String(level), rest)) if level == "debug" => ("debug", rest),
        Some((Value::String(level), rest)) if level == "trace" => ("trace", rest),
        _ => ("info", args),
    }
}

fn emit_log(level: &str, indent: u32, message: &str) {
    let indent = "  ".repeat(indent as usize);
    match level {
        "error" => log::error!("{}{}", indent, message),
        "warn" => log::warn!("{}{}", indent, message),
        "debug" => log::debug!("{}{}", indent, message),
        "trace" => log::trace!("{}{}", indent, message),
        _ => log::info!("{}{}", indent, message),
    }
}

/// `print [level] message...`: writes the message to stdout with no
/// trailing newline, and also logs it at `level` (default `info`).
pub struct PrintPrimitive;

#[async_trait]
impl Primitive for PrintPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/print"
    }

    async fn execute(&self, args: Vec<Value>, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let (level, rest) = split_level(&args);
        let message = joined(rest);
        print!("{}", message);
        emit_log(level, ctx.scope.log_indent, &message);
        Ok(Value::Null)
    }
}

/// `println [level] message...`: writes the message to stdout followed by a
/// newline, and also logs it at `level` (default `info`).
pub struct PrintlnPrimitive;

#[async_trait]
impl Primitive for PrintlnPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/println"
    }

    async fn execute(&self, args: Vec<Value>, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let (level, rest) = split_level(&args);
        let message = joined(rest);
        println!("{}", message);
        emit_log(level, ctx.scope.log_indent, &message);
        Ok(Value::Null)
    }
}

/// `log level message...`: `level` is one of `error`/`warn`/`info`/`debug`/
/// `trace`, defaulting to `info` if omitted or unrecognized.
pub struct LogPrimitive;

#[async_trait]
impl Primitive for LogPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/log"
    }

    async fn execute(&self, args: Vec<Value>, ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let (level, rest) = split_level(&args);
        let message = joined(rest);
        emit_log(level, ctx.scope.log_indent, &message);
        Ok(Value::Null)
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(PrintPrimitive));
    registry.register(Arc::new(PrintlnPrimitive));
    registry.register(Arc::new(LogPrimitive));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scope::Scope;
    use crate::subroutine::SubroutineCache;
    use std::sync::Arc;

    #[tokio::test]
    async fn print_and_log_produce_null() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ExecContext { scope: &mut scope, registry, subroutines: &mut subs, block: &block, source_id: Arc::from("test") };
        assert_eq!(PrintPrimitive.execute(vec![Value::string("hi")], &mut c).await.unwrap(), Value::Null);
        assert_eq!(LogPrimitive.execute(vec![Value::string("warn"), Value::string("careful")], &mut c).await.unwrap(), Value::Null);
    }

    #[test]
    fn split_level_recognizes_a_leading_severity_word() {
        let args = vec![Value::string("warn"), Value::string("careful")];
        let (level, rest) = split_level(&args);
        assert_eq!(level, "warn");
        assert_eq!(rest.to_vec(), vec![Value::string("careful")]);
    }

    #[test]
    fn split_level_defaults_to_info_when_absent_or_unrecognized() {
        let args = vec![Value::string("hi"), Value::Int(1)];
        let (level, rest) = split_level(&args);
        assert_eq!(level, "info");
        assert_eq!(rest, args.as_slice());
    }
}
