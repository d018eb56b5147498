//! Typed-scalar coercion primitives (§4.1, §4.5): `int`, `int8`..`int64`,
//! `uint`, `uint8`..`uint64`, `float32`, `float64`, `bool`, `string`.

use async_trait::async_trait;

use crate::control_flow::RunError;
use crate::primitive::{ExecContext, Primitive};
use crate::value::coerce::{self, FloatWidth, IntWidth, UIntWidth};
use crate::value::Value;

fn require_one(opcode: &str, args: &[Value]) -> Result<&Value, RunError> {
    match args {
        [single] => Ok(single),
        [] => Err(RunError::MissingArgument { opcode: opcode.to_string(), expected: "1 argument".to_string() }),
        _ => Err(RunError::TooManyArguments { opcode: opcode.to_string(), max: 1 }),
    }
}

macro_rules! signed_primitive {
    ($struct_name:ident, $opcode:expr, $width:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl Primitive for $struct_name {
            fn canonical_path(&self) -> &'static str {
                $opcode
            }

            async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
                let value = require_one(self.canonical_path(), &args)?;
                Ok(Value::Int(coerce::to_signed(value, $width)?))
            }
        }
    };
}

macro_rules! unsigned_primitive {
    ($struct_name:ident, $opcode:expr, $width:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl Primitive for $struct_name {
            fn canonical_path(&self) -> &'static str {
                $opcode
            }

            async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
                let value = require_one(self.canonical_path(), &args)?;
                Ok(Value::UInt(coerce::to_unsigned(value, $width)?))
            }
        }
    };
}

macro_rules! float_primitive {
    ($struct_name:ident, $opcode:expr, $width:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl Primitive for $struct_name {
            fn canonical_path(&self) -> &'static str {
                $opcode
            }

            async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
                let value = require_one(self.canonical_path(), &args)?;
                Ok(Value::Float(coerce::to_float(value, $width)?))
            }
        }
    };
}

signed_primitive!(IntPrimitive, "/gnd/int", IntWidth::W64);
signed_primitive!(Int8Primitive, "/gnd/int8", IntWidth::W8);
signed_primitive!(Int16Primitive, "/gnd/int16", IntWidth::W16);
signed_primitive!(Int32Primitive, "/gnd/int32", IntWidth::W32);
signed_primitive!(Int64Primitive, "/gnd/int64", IntWidth::W64);

unsigned_primitive!(UIntPrimitive, "/gnd/uint", UIntWidth::W64);
unsigned_primitive!(UInt8Primitive, "/gnd/uint8", UIntWidth::W8);
unsigned_primitive!(UInt16Primitive, "/gnd/uint16", UIntWidth::W16);
unsigned_primitive!(UInt32Primitive, "/gnd/uint32", UIntWidth::W32);
unsigned_primitive!(UInt64Primitive, "/gnd/uint64", UIntWidth::W64);

float_primitive!(Float32Primitive, "/gnd/float32", FloatWidth::W32);
float_primitive!(Float64Primitive, "/gnd/float64", FloatWidth::W64);

pub struct BoolPrimitive;

#[async_trait]
impl Primitive for BoolPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/bool"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.len() > 1 {
            return Err(RunError::TooManyArguments { opcode: self.canonical_path().to_string(), max: 1 });
        }
        Ok(Value::Bool(coerce::to_bool(args.first())))
    }
}

pub struct StringPrimitive;

#[async_trait]
impl Primitive for StringPrimitive {
    fn canonical_path(&self) -> &'static str {
        "/gnd/string"
    }

    async fn execute(&self, args: Vec<Value>, _ctx: &mut ExecContext<'_>) -> Result<Value, RunError> {
        if args.len() > 1 {
            return Err(RunError::TooManyArguments { opcode: self.canonical_path().to_string(), max: 1 });
        }
        Ok(Value::string(coerce::to_display_string(args.first())))
    }
}

pub fn register(registry: &mut crate::registry::Registry) {
    use std::sync::Arc;
    registry.register(Arc::new(IntPrimitive));
    registry.register(Arc::new(Int8Primitive));
    registry.register(Arc::new(Int16Primitive));
    registry.register(Arc::new(Int32Primitive));
    registry.register(Arc::new(Int64Primitive));
    registry.register(Arc::new(UIntPrimitive));
    registry.register(Arc::new(UInt8Primitive));
    registry.register(Arc::new(UInt16Primitive));
    registry.register(Arc::new(UInt32Primitive));
    registry.register(Arc::new(UInt64Primitive));
    registry.register(Arc::new(Float32Primitive));
    registry.register(Arc::new(Float64Primitive));
    registry.register(Arc::new(BoolPrimitive));
    registry.register(Arc::new(StringPrimitive));
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
    async fn int_coerces_hex_string() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let result = IntPrimitive.execute(vec![Value::string("0x2A")], &mut c).await.unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[tokio::test]
    async fn int8_overflow_rejected() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let err = Int8Primitive.execute(vec![Value::Int(1000)], &mut c).await.unwrap_err();
        assert!(matches!(err, RunError::Overflow(_)));
    }

    #[tokio::test]
    async fn zero_arg_bool_is_false() {
        let registry = Arc::new(Registry::with_builtins());
        let mut scope = Scope::root("/scripts", registry.global_aliases());
        let mut subs = SubroutineCache::new();
        let block = vec![];
        let mut c = ctx(&mut scope, registry, &mut subs, &block);
        let result = BoolPrimitive.execute(vec![], &mut c).await.unwrap();
        assert_eq!(result, Value::Bool(false));
    }
}
