use super::super::error::InterpreterError;
use super::with_char;
use crate::value::Value;

pub fn builtin_concat(args: &[Value]) -> Result<Value, InterpreterError> {
    let joined: String = args.iter().map(|v| v.to_string()).collect();
    Ok(Value::string(&joined))
}

pub fn builtin_isdigit(args: &[Value]) -> Result<Value, InterpreterError> {
    with_char!(args, "isdigit", |c: char| Ok(Value::Boolean(c.is_ascii_digit())))
}

pub fn builtin_isspace(args: &[Value]) -> Result<Value, InterpreterError> {
    with_char!(args, "isspace", |c: char| Ok(Value::Boolean(c.is_whitespace())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_predicates() {
        assert_eq!(builtin_isdigit(&[Value::Char('7')]).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_isspace(&[Value::Char('\t')]).unwrap(), Value::Boolean(true));
        assert!(builtin_isdigit(&[Value::string("7")]).is_err());
    }

    #[test]
    fn test_isdigit_is_decimal_only() {
        for c in ['²', 'Ⅷ', '½', 'a'] {
            assert_eq!(builtin_isdigit(&[Value::Char(c)]).unwrap(), Value::Boolean(false), "{}", c);
        }
    }

    #[test]
    fn test_concat_uses_display_forms() {
        let args = [Value::string("n="), Value::Number(2.0), Value::Char('!')];
        assert_eq!(builtin_concat(&args).unwrap(), Value::string("n=2!"));
    }
}
