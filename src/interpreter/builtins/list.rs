//! List intrinsics. `append`, `remove` and `removeat` mutate their argument
//! and return a shallow copy of the result.

use std::cell::RefCell;
use std::rc::Rc;

use super::super::error::InterpreterError;
use super::super::operators::{index_in, values_equal};
use super::{with_list, with_number};
use crate::value::Value;

type Items = Rc<RefCell<Vec<Value>>>;

fn snapshot(items: &Items) -> Value {
    Value::list(items.borrow().clone())
}

pub fn builtin_append(args: &[Value]) -> Result<Value, InterpreterError> {
    with_list!(args, "append", |items: &Items| {
        items.borrow_mut().push(args[1].clone());
        Ok(snapshot(items))
    })
}

pub fn builtin_remove(args: &[Value]) -> Result<Value, InterpreterError> {
    with_list!(args, "remove", |items: &Items| {
        let found = items.borrow().iter().position(|v| values_equal(v, &args[1]));
        if let Some(i) = found {
            items.borrow_mut().remove(i);
        }
        Ok(snapshot(items))
    })
}

pub fn builtin_removeat(args: &[Value]) -> Result<Value, InterpreterError> {
    with_list!(args, "removeat", |items: &Items| -> Result<Value, InterpreterError> {
        let len = items.borrow().len();
        let i = index_in(&args[1], len)?;
        items.borrow_mut().remove(i);
        Ok(snapshot(items))
    })
}

pub fn builtin_range(args: &[Value]) -> Result<Value, InterpreterError> {
    with_number!(args, 0, "range", |start: f64| {
        with_number!(args, 1, "range", |end: f64| {
            let mut items = Vec::new();
            let mut i = start;
            while i < end {
                items.push(Value::Number(i));
                i += 1.0;
            }
            Ok(Value::list(items))
        })
    })
}

pub fn builtin_clone(args: &[Value]) -> Result<Value, InterpreterError> {
    Ok(args[0].deep_clone())
}

pub fn builtin_len(args: &[Value]) -> Result<Value, InterpreterError> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.text().chars().count() as f64)),
        Value::List(items) => Ok(Value::Number(items.borrow().len() as f64)),
        other => Err(InterpreterError::type_error(format!(
            "len is not defined for {}.",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nums(ns: &[f64]) -> Value {
        Value::list(ns.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn test_append_mutates_and_copies() {
        let list = nums(&[1.0]);
        let copy = builtin_append(&[list.clone(), Value::Number(2.0)]).unwrap();
        assert_eq!(list.to_string(), "[1, 2]");
        assert_eq!(copy.to_string(), "[1, 2]");

        builtin_append(&[list.clone(), Value::Number(3.0)]).unwrap();
        assert_eq!(copy.to_string(), "[1, 2]");
    }

    #[test]
    fn test_remove_first_match() {
        let list = nums(&[1.0, 2.0, 1.0]);
        builtin_remove(&[list.clone(), Value::Number(1.0)]).unwrap();
        assert_eq!(list.to_string(), "[2, 1]");
    }

    #[test]
    fn test_removeat_bounds() {
        let list = nums(&[1.0, 2.0]);
        assert!(builtin_removeat(&[list.clone(), Value::Number(2.0)]).is_err());
        builtin_removeat(&[list.clone(), Value::Number(0.0)]).unwrap();
        assert_eq!(list.to_string(), "[2]");
    }

    #[test]
    fn test_range() {
        assert_eq!(builtin_range(&[Value::Number(1.0), Value::Number(4.0)]).unwrap(), nums(&[1.0, 2.0, 3.0]));
        assert_eq!(builtin_range(&[Value::Number(3.0), Value::Number(1.0)]).unwrap(), nums(&[]));
    }

    #[test]
    fn test_clone_is_deep() {
        let inner = nums(&[1.0]);
        let outer = Value::list(vec![inner.clone()]);
        let copy = builtin_clone(&[outer]).unwrap();
        builtin_append(&[inner, Value::Number(2.0)]).unwrap();
        assert_eq!(copy.to_string(), "[[1]]");
    }

    #[test]
    fn test_len() {
        assert_eq!(builtin_len(&[Value::string("héllo")]).unwrap(), Value::Number(5.0));
        assert_eq!(builtin_len(&[nums(&[1.0, 2.0])]).unwrap(), Value::Number(2.0));
        assert!(builtin_len(&[Value::Number(1.0)]).is_err());
    }
}
