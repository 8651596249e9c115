//! Input/output intrinsics. These go through the interpreter's streams so a
//! host can capture output or script input.

use super::super::error::InterpreterError;
use super::super::evaluator::Interpreter;
use crate::value::Value;

fn render(args: &[Value]) -> String {
    args.iter().map(|v| v.to_string()).collect()
}

pub fn builtin_print(interp: &mut Interpreter, args: &[Value]) -> Result<Value, InterpreterError> {
    interp.write_output(&render(args))?;
    Ok(Value::None)
}

pub fn builtin_println(interp: &mut Interpreter, args: &[Value]) -> Result<Value, InterpreterError> {
    let mut line = render(args);
    line.push('\n');
    interp.write_output(&line)?;
    Ok(Value::None)
}

/// Reads one line with the trailing newline stripped. End of input yields "".
pub fn builtin_input(interp: &mut Interpreter, args: &[Value]) -> Result<Value, InterpreterError> {
    if let Some(prompt) = args.first() {
        interp.write_output(&prompt.to_string())?;
    }
    let line = interp.read_line()?;
    Ok(Value::string(line.trim_end_matches(['\n', '\r'])))
}
