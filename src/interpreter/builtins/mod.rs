//! Intrinsic functions available to every Betty program.
//!
//! Intrinsics are organized into categories:
//! - **IO**: print, println, input
//! - **Conversion**: tostr, tonum, tobool, tochar, tolist
//! - **String**: concat, isdigit, isspace
//! - **List**: append, remove, removeat, range, clone, len
//! - **Math**: sin, cos, tan, abs, sqrt, floor, ceil, pow
//!
//! The table is built once and never changes. User code cannot define a
//! function whose name appears in it.

mod conversion;
mod io;
mod list;
mod math;
mod string;

use conversion::*;
use io::*;
use list::*;
use math::*;
use string::*;

use indexmap::IndexMap;
use std::fmt;
use std::sync::LazyLock;

use super::error::InterpreterError;
use super::evaluator::Interpreter;
use crate::value::Value;

type PureFn = fn(&[Value]) -> Result<Value, InterpreterError>;
type IoFn = fn(&mut Interpreter, &[Value]) -> Result<Value, InterpreterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

#[derive(Clone, Copy)]
enum Handler {
    Pure(PureFn),
    Io(IoFn),
}

#[derive(Clone, Copy)]
pub struct Intrinsic {
    pub name: &'static str,
    pub arity: Arity,
    handler: Handler,
}

impl fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Intrinsic")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Intrinsic {
    /// Runs before any argument is evaluated.
    pub fn check_arity(&self, count: usize) -> Result<(), InterpreterError> {
        if self.arity.accepts(count) {
            Ok(())
        } else {
            Err(InterpreterError::arity(self.name, self.arity.to_string(), count))
        }
    }

    pub fn execute(&self, interp: &mut Interpreter, args: &[Value]) -> Result<Value, InterpreterError> {
        match self.handler {
            Handler::Pure(f) => f(args),
            Handler::Io(f) => f(interp, args),
        }
    }
}

static INTRINSICS: LazyLock<IndexMap<&'static str, Intrinsic>> = LazyLock::new(|| {
    use Arity::*;
    use Handler::*;

    let table: [(&'static str, Arity, Handler); 25] = [
        // IO
        ("print", Variadic, Io(builtin_print)),
        ("println", Variadic, Io(builtin_println)),
        ("input", Between(0, 1), Io(builtin_input)),
        // Conversion
        ("tostr", Exactly(1), Pure(builtin_tostr)),
        ("tonum", Exactly(1), Pure(builtin_tonum)),
        ("tobool", Exactly(1), Pure(builtin_tobool)),
        ("tochar", Exactly(1), Pure(builtin_tochar)),
        ("tolist", Exactly(1), Pure(builtin_tolist)),
        // String
        ("concat", Variadic, Pure(builtin_concat)),
        ("isdigit", Exactly(1), Pure(builtin_isdigit)),
        ("isspace", Exactly(1), Pure(builtin_isspace)),
        // List
        ("append", Exactly(2), Pure(builtin_append)),
        ("remove", Exactly(2), Pure(builtin_remove)),
        ("removeat", Exactly(2), Pure(builtin_removeat)),
        ("range", Exactly(2), Pure(builtin_range)),
        ("clone", Exactly(1), Pure(builtin_clone)),
        ("len", Exactly(1), Pure(builtin_len)),
        // Math
        ("sin", Exactly(1), Pure(builtin_sin)),
        ("cos", Exactly(1), Pure(builtin_cos)),
        ("tan", Exactly(1), Pure(builtin_tan)),
        ("abs", Exactly(1), Pure(builtin_abs)),
        ("sqrt", Exactly(1), Pure(builtin_sqrt)),
        ("floor", Exactly(1), Pure(builtin_floor)),
        ("ceil", Exactly(1), Pure(builtin_ceil)),
        ("pow", Exactly(2), Pure(builtin_pow)),
    ];

    table
        .into_iter()
        .map(|(name, arity, handler)| (name, Intrinsic { name, arity, handler }))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.get(name)
}

pub fn is_reserved(name: &str) -> bool {
    INTRINSICS.contains_key(name)
}

macro_rules! with_number {
    ($args:expr, $idx:expr, $name:expr, $body:expr) => {
        match &$args[$idx] {
            Value::Number(n) => $body(*n),
            other => Err(InterpreterError::type_error(format!(
                "{} requires a number, got {}.",
                $name,
                other.type_name()
            ))),
        }
    };
}

macro_rules! with_list {
    ($args:expr, $name:expr, $body:expr) => {
        match &$args[0] {
            Value::List(items) => $body(items),
            other => Err(InterpreterError::type_error(format!(
                "The first argument of {} must be a list, got {}.",
                $name,
                other.type_name()
            ))),
        }
    };
}

macro_rules! with_char {
    ($args:expr, $name:expr, $body:expr) => {
        match &$args[0] {
            Value::Char(c) => $body(*c),
            other => Err(InterpreterError::type_error(format!(
                "{} requires a char, got {}.",
                $name,
                other.type_name()
            ))),
        }
    };
}

pub(crate) use with_char;
pub(crate) use with_list;
pub(crate) use with_number;
