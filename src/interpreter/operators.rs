//! Operator semantics shared by expressions, compound assignment and switches.

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;
use std::cmp::Ordering;

use super::error::InterpreterError;

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Mod
        | BinaryOp::Pow => arithmetic(op, left, right),
        BinaryOp::And | BinaryOp::Or => logical(op, left, right),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Less
        | BinaryOp::LessEq
        | BinaryOp::Greater
        | BinaryOp::GreaterEq => compare(op, left, right).map(Value::Boolean),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    match (left, right) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            Ok(Value::string(&format!("{}{}", left, right)))
        }
        (Value::List(items), _) => {
            let mut joined = items.borrow().clone();
            match right {
                Value::List(tail) => joined.extend(tail.borrow().iter().cloned()),
                other => joined.push(other.clone()),
            }
            Ok(Value::list(joined))
        }
        (_, Value::List(items)) => {
            let mut joined = Vec::with_capacity(items.borrow().len() + 1);
            joined.push(left.clone());
            joined.extend(items.borrow().iter().cloned());
            Ok(Value::list(joined))
        }
        _ => arithmetic(BinaryOp::Add, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
        return Err(InterpreterError::type_error(format!(
            "Operator '{}' requires numeric operands, got {} and {}.",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };

    let result = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::FloorDiv => (l / r).floor(),
        BinaryOp::Mod => l % r,
        BinaryOp::Pow => l.powf(r),
        _ => unreachable!("non-arithmetic operator {:?}", op),
    };
    Ok(Value::Number(result))
}

/// Both operands are always evaluated by the caller; there is no short circuit.
fn logical(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, InterpreterError> {
    let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) else {
        return Err(InterpreterError::type_error(format!(
            "Operator '{}' requires boolean operands, got {} and {}.",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    Ok(Value::Boolean(if op == BinaryOp::And { l && r } else { l || r }))
}

pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, InterpreterError> {
    let ordering = match (left, right) {
        (Value::Number(_) | Value::Char(_), Value::Number(_) | Value::Char(_)) => {
            let (l, r) = (left.as_number().unwrap_or(f64::NAN), right.as_number().unwrap_or(f64::NAN));
            return Ok(match op {
                BinaryOp::Eq => l == r,
                BinaryOp::NotEq => l != r,
                BinaryOp::Less => l < r,
                BinaryOp::LessEq => l <= r,
                BinaryOp::Greater => l > r,
                _ => l >= r,
            });
        }
        (Value::String(l), Value::String(r)) => Some(l.text().cmp(&r.text())),
        _ => None,
    };

    match (op, ordering) {
        (BinaryOp::Eq, _) => Ok(left == right),
        (BinaryOp::NotEq, _) => Ok(left != right),
        (BinaryOp::Less, Some(ord)) => Ok(ord == Ordering::Less),
        (BinaryOp::LessEq, Some(ord)) => Ok(ord != Ordering::Greater),
        (BinaryOp::Greater, Some(ord)) => Ok(ord == Ordering::Greater),
        (BinaryOp::GreaterEq, Some(ord)) => Ok(ord != Ordering::Less),
        _ => Err(InterpreterError::type_error(format!(
            "Operator '{}' is not supported between {} and {}.",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Equality as seen by `==`, used to match switch cases.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    compare(BinaryOp::Eq, left, right).unwrap_or(false)
}

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, InterpreterError> {
    match op {
        UnaryOp::Plus => Ok(operand.clone()),
        UnaryOp::Neg => operand
            .as_number()
            .map(|n| Value::Number(-n))
            .ok_or_else(|| {
                InterpreterError::type_error(format!("Cannot negate a value of type {}.", operand.type_name()))
            }),
        UnaryOp::Not => operand
            .as_bool()
            .map(|b| Value::Boolean(!b))
            .ok_or_else(|| {
                InterpreterError::type_error(format!("Operator '!' requires a boolean, got {}.", operand.type_name()))
            }),
        UnaryOp::Increment | UnaryOp::Decrement => step(op, operand),
    }
}

/// The value after `++`/`--`; a Char widens to a Number.
pub fn step(op: UnaryOp, operand: &Value) -> Result<Value, InterpreterError> {
    let n = operand.as_number().ok_or_else(|| {
        InterpreterError::type_error(format!(
            "Increment and decrement require a number or char, got {}.",
            operand.type_name()
        ))
    })?;
    Ok(Value::Number(if op == UnaryOp::Increment { n + 1.0 } else { n - 1.0 }))
}

/// Validate an index value against a collection length.
pub fn index_in(index: &Value, len: usize) -> Result<usize, InterpreterError> {
    let Value::Number(n) = index else {
        return Err(InterpreterError::type_error(format!(
            "Index must be an integer, got {}.",
            index.type_name()
        )));
    };
    if n.fract() != 0.0 {
        return Err(InterpreterError::type_error("Index must be an integer."));
    }
    if *n < 0.0 || *n >= len as f64 {
        return Err(InterpreterError::index_out_of_range(*n, len));
    }
    Ok(*n as usize)
}
