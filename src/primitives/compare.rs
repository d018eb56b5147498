//! `eq`, `select`, `first` (§4.1): operate on the `Value` tag directly,
//! without the scalar coercion rules of §4.1's typed-primitive family.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::value::Value;

/// Variadic deep-equality: `true` only when every argument is structurally
/// equal to the first (§3 `eq` is "a variadic deep-equality test returning
/// true only when all arguments are structurally equal").
pub struct EqPrimitive;

#[async_trait]
impl Primitive for EqPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/eq"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.is_empty() {
            return Err(RunError::MissingArgument { opcode: self.canonical_path().to_string(), expected: "at least 1 argument".to_string() });
        }
        let first = &args[0];
        Ok(Value::Bool(args.iter().all(|v| v.deep_eq(first))))
    }
}

/// A ternary selector: `select cond then else` returns `then` if `cond` is
/// truthy, else `else`.
pub struct SelectPrimitive;

#[async_trait]
impl Primitive for SelectPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/select"
    }

    async fn execute(&self, mut args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.len() != 3 {
            return Err(RunError::MissingArgument {
                opcode: self.canonical_path().to_string(),
                expected: "exactly 3 arguments (condition, then, else)".to_string(),
            });
        }
        let otherwise = args.pop().unwrap();
        let then = args.pop().unwrap();
        let condition = args.pop().unwrap();
        Ok(if condition.truthy() { then } else { otherwise })
    }
}

/// `first list` returns the head element of a `List` argument.
pub struct FirstPrimitive;

#[async_trait]
impl Primitive for FirstPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/first"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        let value = match args.as_slice() {
            [single] => single,
            _ => {
                return Err(RunError::MissingArgument { opcode: self.canonical_path().to_string(), expected: "1 argument".to_string() })
            }
        };
        match value {
            Value::List(items) => items
                .first()
                .cloned()
                .ok_or_else(|| RunError::InvalidArgument("first of an empty list".to_string())),
            other => Err(RunError::TypeMismatch(format!("first expects a list, got {}", other.type_name()))),
        }
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(EqPrimitive));
    registry.register(Arc::new(SelectPrimitive));
    registry.register(Arc::new(FirstPrimitive));
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
    async fn eq_true_for_all_equal() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let result = EqPrimitive.execute(vec![Value::Int(1), Value::Int(1), Value::UInt(1)], &mut c).await.unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[tokio::test]
    async fn select_picks_branch_by_truthiness() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let result = SelectPrimitive
            .execute(vec![Value::Bool(false), Value::string("yes"), Value::string("no")], &mut c)
            .await
            .unwrap();
        assert_eq!(result, Value::string("no"));
    }

    #[tokio::test]
    async fn first_of_empty_list_is_invalid() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = FirstPrimitive.execute(vec![Value::List(vec![])], &mut c).await.unwrap_err();
        assert!(matches!(err, RunError::InvalidArgument(_)));
    }
}
