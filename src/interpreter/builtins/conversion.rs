//! Conversions between value types.

use super::super::error::InterpreterError;
use crate::value::Value;

pub fn builtin_tostr(args: &[Value]) -> Result<Value, InterpreterError> {
    Ok(Value::string(&args[0].to_string()))
}

pub fn builtin_tonum(args: &[Value]) -> Result<Value, InterpreterError> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Char(c) => Ok(Value::Number(*c as u32 as f64)),
        Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => {
            let text = s.text();
            text.trim().parse::<f64>().map(Value::Number).map_err(|_| {
                InterpreterError::invalid_operation(format!("Could not convert string '{}' to number.", text))
            })
        }
        other => Err(InterpreterError::type_error(format!(
            "Conversion to number not supported for type {}.",
            other.type_name()
        ))),
    }
}

pub fn builtin_tobool(args: &[Value]) -> Result<Value, InterpreterError> {
    let result = match &args[0] {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::Char(_) => true,
        Value::String(s) => {
            let text = s.text();
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                true
            } else if trimmed.eq_ignore_ascii_case("false") {
                false
            } else {
                !text.is_empty()
            }
        }
        other => {
            return Err(InterpreterError::type_error(format!(
                "Conversion to boolean not supported for type {}.",
                other.type_name()
            )))
        }
    };
    Ok(Value::Boolean(result))
}

pub fn builtin_tochar(args: &[Value]) -> Result<Value, InterpreterError> {
    match &args[0] {
        Value::Char(c) => Ok(Value::Char(*c)),
        Value::Boolean(b) => Ok(Value::Char(if *b { 'T' } else { 'F' })),
        Value::Number(n) => {
            let code = *n;
            if code < 0.0 || code > u32::MAX as f64 || code.fract() != 0.0 {
                return Err(InterpreterError::invalid_operation(format!(
                    "Number {} is outside the valid range for characters.",
                    code
                )));
            }
            char::from_u32(code as u32).map(Value::Char).ok_or_else(|| {
                InterpreterError::invalid_operation(format!(
                    "Number {} is outside the valid range for characters.",
                    code
                ))
            })
        }
        Value::String(s) => {
            let text = s.text();
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(InterpreterError::invalid_operation(format!(
                    "Could not convert string '{}' to char.",
                    text
                ))),
            }
        }
        other => Err(InterpreterError::type_error(format!(
            "Conversion to char not supported for type {}.",
            other.type_name()
        ))),
    }
}

pub fn builtin_tolist(args: &[Value]) -> Result<Value, InterpreterError> {
    match &args[0] {
        Value::String(_) => Ok(Value::list(args[0].as_list().unwrap_or_default())),
        other => Err(InterpreterError::type_error(format!(
            "Conversion to list not supported for type {}.",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tonum() {
        assert_eq!(builtin_tonum(&[Value::string("3.5")]).unwrap(), Value::Number(3.5));
        assert_eq!(builtin_tonum(&[Value::Char('A')]).unwrap(), Value::Number(65.0));
        assert_eq!(builtin_tonum(&[Value::Boolean(true)]).unwrap(), Value::Number(1.0));
        assert!(builtin_tonum(&[Value::string("abc")]).is_err());
        assert!(builtin_tonum(&[Value::None]).is_err());
    }

    #[test]
    fn test_tobool() {
        assert_eq!(builtin_tobool(&[Value::string("FALSE")]).unwrap(), Value::Boolean(false));
        assert_eq!(builtin_tobool(&[Value::string("x")]).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_tobool(&[Value::string("")]).unwrap(), Value::Boolean(false));
        assert_eq!(builtin_tobool(&[Value::Number(0.0)]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_tochar() {
        assert_eq!(builtin_tochar(&[Value::Number(97.0)]).unwrap(), Value::Char('a'));
        assert_eq!(builtin_tochar(&[Value::Boolean(false)]).unwrap(), Value::Char('F'));
        assert_eq!(builtin_tochar(&[Value::string("z")]).unwrap(), Value::Char('z'));
        assert!(builtin_tochar(&[Value::string("zz")]).is_err());
        assert!(builtin_tochar(&[Value::Number(-1.0)]).is_err());
    }

    #[test]
    fn test_tolist_splits_chars() {
        let list = builtin_tolist(&[Value::string("hi")]).unwrap();
        assert_eq!(list.to_string(), "[h, i]");
    }
}
