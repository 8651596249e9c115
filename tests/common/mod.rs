#![allow(dead_code)]

use betty::{parse, Interpreter, InterpreterError, Value};
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

/// Output sink the test can read back after the interpreter is done with it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("program output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run a full program with `stdin` as its input; returns main's value and the output.
pub fn try_run_with_input(source: &str, stdin: &str) -> Result<(Value, String), InterpreterError> {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected syntax errors: {:#?}", errors);

    let output = SharedBuffer::default();
    let mut interp = Interpreter::with_io(
        Box::new(Cursor::new(stdin.as_bytes().to_vec())),
        Box::new(output.clone()),
    );
    let value = interp.run(&program)?;
    Ok((value, output.contents()))
}

pub fn run(source: &str) -> Value {
    try_run_with_input(source, "")
        .unwrap_or_else(|e| panic!("runtime error: {}", e))
        .0
}

/// Wrap `body` in `func main() { ... }` and run it.
pub fn run_main(body: &str) -> Value {
    run(&format!("func main() {{\n{}\n}}", body))
}

pub fn run_with_output(source: &str) -> String {
    try_run_with_input(source, "")
        .unwrap_or_else(|e| panic!("runtime error: {}", e))
        .1
}

pub fn run_err(source: &str) -> InterpreterError {
    match try_run_with_input(source, "") {
        Ok((value, _)) => panic!("expected a runtime error, got {}", value),
        Err(e) => e,
    }
}

pub fn run_main_err(body: &str) -> InterpreterError {
    run_err(&format!("func main() {{\n{}\n}}", body))
}

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn list(items: Vec<Value>) -> Value {
    Value::list(items)
}
