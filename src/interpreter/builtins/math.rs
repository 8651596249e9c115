//! Mathematical intrinsics. All take Number arguments; results follow IEEE
//! semantics, so `sqrt(-1)` is NaN rather than an error.

use super::super::error::InterpreterError;
use super::with_number;
use crate::value::Value;

macro_rules! unary_math {
    ($name:ident, $op:ident) => {
        pub fn $name(args: &[Value]) -> Result<Value, InterpreterError> {
            with_number!(args, 0, stringify!($op), |n: f64| Ok(Value::Number(n.$op())))
        }
    };
}

unary_math!(builtin_sin, sin);
unary_math!(builtin_cos, cos);
unary_math!(builtin_tan, tan);
unary_math!(builtin_abs, abs);
unary_math!(builtin_sqrt, sqrt);
unary_math!(builtin_floor, floor);
unary_math!(builtin_ceil, ceil);

pub fn builtin_pow(args: &[Value]) -> Result<Value, InterpreterError> {
    match (&args[0], &args[1]) {
        (Value::Number(base), Value::Number(exp)) => Ok(Value::Number(base.powf(*exp))),
        _ => Err(InterpreterError::type_error("Arguments for pow must be numbers.")),
    }
}
