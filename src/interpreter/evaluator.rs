//! Tree-walking evaluator.
//!
//! Statements execute for effect and report `break`, `continue` and `return`
//! through [`ControlContext`] rather than through `Result`. Expressions
//! evaluate to a [`Value`]. Every error leaving [`Interpreter::evaluate`] is
//! stamped with the position of the innermost node that raised it.

use crate::ast::{
    AssignOp, BinaryOp, Callee, Expr, ExprKind, Fixity, FunctionDecl, Program, Stmt, SwitchArm,
    SwitchCase, UnaryOp,
};
use crate::diagnostic::Diagnostic;
use crate::value::{Function, Value};
use super::builtins;
use super::control_flow::{ControlContext, FlowState};
use super::environment::Environment;
use super::error::InterpreterError;
use super::operators;
use super::parser::parse;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use tracing::{debug, trace};

/// Runs one Betty program. Holds the scope chain, the flow state, the
/// top-level function registry and the streams used by the I/O intrinsics.
pub struct Interpreter {
    env: Environment,
    context: ControlContext,
    functions: HashMap<Rc<str>, Rc<FunctionDecl>>,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter reading from stdin and writing to stdout.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdin().lock()), Box::new(io::stdout()))
    }

    /// An interpreter with caller-supplied streams for `input` and `print`.
    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self {
            env: Environment::new(),
            context: ControlContext::new(),
            functions: HashMap::new(),
            input,
            output,
        }
    }

    /// Declare globals, register top-level functions and call `main`.
    ///
    /// Returns the value `main` returns. Fails before running anything on a
    /// duplicate global, a reserved function name, or a missing or
    /// parameterised `main`.
    pub fn run(&mut self, program: &Program) -> Result<Value, InterpreterError> {
        for (name, pos) in &program.globals {
            self.env
                .declare_global(name, Value::None)
                .map_err(|e| e.at(*pos))?;
        }

        for decl in &program.functions {
            let Some(name) = decl.name.clone() else {
                continue;
            };
            if builtins::is_reserved(&name) {
                return Err(InterpreterError::reserved_name_at(name.to_string(), decl.pos));
            }
            if self.functions.insert(name.clone(), decl.clone()).is_some() {
                debug!(function = %name, "later definition overrides earlier one");
            }
        }
        debug!(
            globals = program.globals.len(),
            functions = self.functions.len(),
            "program registered"
        );

        let main = program
            .function("main")
            .cloned()
            .ok_or(InterpreterError::MissingMain)?;
        if !main.params.is_empty() {
            return Err(InterpreterError::MainHasParameters { pos: main.pos });
        }

        debug!("calling main");
        let result = self.call_function(&Rc::new(Function::new(main, Vec::new())), Vec::new());
        self.output.flush().map_err(InterpreterError::io)?;
        result
    }

    /// Write and flush, so prompts show up before `input` blocks.
    pub(crate) fn write_output(&mut self, text: &str) -> Result<(), InterpreterError> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(InterpreterError::io)
    }

    /// One raw line including its terminator; empty at EOF.
    pub(crate) fn read_line(&mut self) -> Result<String, InterpreterError> {
        let mut line = String::new();
        self.input.read_line(&mut line).map_err(InterpreterError::io)?;
        Ok(line)
    }

    // ===== STATEMENTS =====

    /// Execute one statement. Control transfers are left in `self.context.flow`
    /// for the enclosing loop, switch or call to consume.
    fn execute(&mut self, statement: &Stmt) -> Result<(), InterpreterError> {
        match statement {
            Stmt::Expr(expr) => self.evaluate(expr).map(|_| ()),
            Stmt::Compound(stmts) => self.scoped(|this| this.execute_block(stmts)),
            Stmt::If {
                condition,
                then_branch,
                elifs,
                else_branch,
            } => {
                if self.condition(condition)? {
                    return self.execute(then_branch);
                }
                for (elif_condition, body) in elifs {
                    if self.condition(elif_condition)? {
                        return self.execute(body);
                    }
                }
                match else_branch {
                    Some(body) => self.execute(body),
                    None => Ok(()),
                }
            }
            Stmt::While { condition, body } => self.looping(|this| {
                while this.condition(condition)? {
                    this.execute(body)?;
                    if this.finish_iteration() {
                        break;
                    }
                }
                Ok(())
            }),
            Stmt::DoWhile { body, condition } => self.looping(|this| {
                loop {
                    this.execute(body)?;
                    if this.finish_iteration() || !this.condition(condition)? {
                        break;
                    }
                }
                Ok(())
            }),
            Stmt::For {
                init,
                condition,
                increment,
                body,
            } => self.looping(|this| {
                if let Some(init) = init {
                    this.evaluate(init)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !this.condition(condition)? {
                            break;
                        }
                    }
                    this.execute(body)?;
                    if this.finish_iteration() {
                        break;
                    }
                    if let Some(increment) = increment {
                        this.evaluate(increment)?;
                    }
                }
                Ok(())
            }),
            Stmt::ForEach {
                var,
                iterable,
                body,
            } => {
                let collection = self.evaluate(iterable)?;
                let items = collection.as_list().ok_or_else(|| {
                    InterpreterError::type_error(format!(
                        "Cannot iterate over a value of type {}.",
                        collection.type_name()
                    ))
                    .at(iterable.pos)
                })?;
                self.looping(|this| {
                    for item in items {
                        this.env.set(var, item, false);
                        this.execute(body)?;
                        if this.finish_iteration() {
                            break;
                        }
                    }
                    Ok(())
                })
            }
            Stmt::Switch { subject, cases } => self.execute_switch(subject, cases),
            Stmt::Break(pos) => {
                if !self.context.can_break() {
                    return Err(InterpreterError::invalid_control_flow_at("break", *pos));
                }
                self.context.flow = FlowState::Breaking;
                Ok(())
            }
            Stmt::Continue(pos) => {
                if !self.context.can_continue() {
                    return Err(InterpreterError::invalid_control_flow_at("continue", *pos));
                }
                self.context.flow = FlowState::Continuing;
                Ok(())
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };
                self.context.set_return(value);
                Ok(())
            }
            Stmt::Function(decl) => {
                let name = decl.name.clone().unwrap_or_else(|| Rc::from("<anonymous>"));
                if builtins::is_reserved(&name) {
                    return Err(InterpreterError::reserved_name_at(name.to_string(), decl.pos));
                }
                // Declared into a frame the closure itself captures, so it can recurse.
                // `environment::release` breaks the cycle once the frame is unreachable.
                let function = Function::new(decl.clone(), self.env.capture());
                self.env.declare_local(name, Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Empty => Ok(()),
            Stmt::Error { message, pos } => {
                Err(InterpreterError::syntax_node_at(message.as_str(), *pos))
            }
        }
    }

    /// Run statements in order, stopping as soon as the flow is not normal.
    fn execute_block(&mut self, stmts: &[Stmt]) -> Result<(), InterpreterError> {
        for stmt in stmts {
            self.execute(stmt)?;
            if !self.context.is_normal() {
                break;
            }
        }
        Ok(())
    }

    /// Run `body` inside a fresh block scope, popping it on every path.
    fn scoped<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, InterpreterError>,
    ) -> Result<T, InterpreterError> {
        self.env.push_scope();
        let result = body(self);
        self.env.pop_scope();
        result
    }

    /// One scope and one loop level around the whole loop.
    fn looping(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), InterpreterError>,
    ) -> Result<(), InterpreterError> {
        self.scoped(|this| {
            this.context.enter_loop();
            let result = body(this);
            this.context.exit_loop();
            result
        })
    }

    /// Consume a loop signal. Returns true when the loop must stop.
    fn finish_iteration(&mut self) -> bool {
        match self.context.flow {
            FlowState::Normal => false,
            FlowState::Continuing => {
                self.context.flow = FlowState::Normal;
                false
            }
            FlowState::Breaking => {
                self.context.flow = FlowState::Normal;
                true
            }
            FlowState::Returning => true,
        }
    }

    /// Start at the first equal case, else `default`, and fall through from
    /// there. A `break` ends the switch without touching an enclosing loop.
    fn execute_switch(&mut self, subject: &Expr, cases: &[SwitchCase]) -> Result<(), InterpreterError> {
        let subject = self.evaluate(subject)?;

        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(pattern) = &case.pattern {
                let candidate = self.evaluate(pattern)?;
                if operators::values_equal(&subject, &candidate) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|c| c.pattern.is_none())) else {
            return Ok(());
        };

        self.scoped(|this| {
            this.context.enter_switch();
            let result = this.fall_through(&cases[start..]);
            this.context.exit_switch();
            result
        })?;

        if self.context.flow == FlowState::Breaking {
            self.context.flow = FlowState::Normal;
        }
        Ok(())
    }

    fn fall_through(&mut self, cases: &[SwitchCase]) -> Result<(), InterpreterError> {
        for case in cases {
            self.execute_block(&case.body)?;
            if !self.context.is_normal() {
                break;
            }
        }
        Ok(())
    }

    /// Evaluate a condition that must produce a boolean.
    fn condition(&mut self, expr: &Expr) -> Result<bool, InterpreterError> {
        let value = self.evaluate(expr)?;
        value.as_bool().ok_or_else(|| {
            InterpreterError::type_error(format!(
                "Condition must be a boolean, got {}.",
                value.type_name()
            ))
            .at(expr.pos)
        })
    }

    // ===== EXPRESSIONS =====

    /// Evaluate an expression, attaching its position to any error that
    /// does not carry one yet.
    fn evaluate(&mut self, expr: &Expr) -> Result<Value, InterpreterError> {
        self.evaluate_kind(expr).map_err(|e| e.at(expr.pos))
    }

    fn evaluate_kind(&mut self, expr: &Expr) -> Result<Value, InterpreterError> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(symbol) => Ok(Value::String(*symbol)),
            ExprKind::Char(c) => Ok(Value::Char(*c)),
            ExprKind::Boolean(b) => Ok(Value::Boolean(*b)),
            ExprKind::Variable(name) => self.variable(name),
            ExprKind::List(elements) => {
                let items = elements
                    .iter()
                    .map(|e| self.evaluate(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Index { collection, index } => {
                let collection = self.evaluate(collection)?;
                let index = self.evaluate(index)?;
                self.index(&collection, &index)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                operators::binary(*op, &left, &right)
            }
            ExprKind::Unary { operand, op, fixity } => match op {
                UnaryOp::Increment | UnaryOp::Decrement => self.step(operand, *op, *fixity),
                _ => {
                    let value = self.evaluate(operand)?;
                    operators::unary(*op, &value)
                }
            },
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            ExprKind::Assignment { target, op, value } => self.assign(target, *op, value),
            ExprKind::Call { callee, args } => self.call(callee, args),
            ExprKind::Function(decl) => Ok(Value::Function(Rc::new(Function::new(
                decl.clone(),
                self.env.capture(),
            )))),
            ExprKind::If {
                condition,
                then_branch,
                elifs,
                else_branch,
            } => {
                if self.condition(condition)? {
                    return self.evaluate(then_branch);
                }
                for (elif_condition, result) in elifs {
                    if self.condition(elif_condition)? {
                        return self.evaluate(result);
                    }
                }
                self.evaluate(else_branch)
            }
            ExprKind::Switch { subject, arms } => self.switch_expression(subject, arms),
            ExprKind::Error(message) => Err(InterpreterError::syntax_node_at(message.as_str(), expr.pos)),
        }
    }

    /// Variables first, then top-level functions by bare name.
    fn variable(&self, name: &str) -> Result<Value, InterpreterError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        match self.functions.get(name) {
            Some(decl) => Ok(Value::Function(Rc::new(Function::new(decl.clone(), Vec::new())))),
            None => Err(InterpreterError::undefined_variable(name)),
        }
    }

    fn index(&self, collection: &Value, index: &Value) -> Result<Value, InterpreterError> {
        match collection {
            Value::List(items) => {
                let items = items.borrow();
                let i = operators::index_in(index, items.len())?;
                Ok(items[i].clone())
            }
            Value::String(s) => {
                let chars: Vec<char> = s.text().chars().collect();
                let i = operators::index_in(index, chars.len())?;
                Ok(Value::Char(chars[i]))
            }
            other => Err(InterpreterError::type_error(format!(
                "Cannot index into a value of type {}.",
                other.type_name()
            ))),
        }
    }

    /// Assignment and compound assignment. The right-hand side is evaluated
    /// first; only variables and list elements are valid targets.
    fn assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) -> Result<Value, InterpreterError> {
        let value = self.evaluate(value)?;

        match &target.kind {
            ExprKind::Variable(name) => {
                let updated = match op {
                    AssignOp::Assign => value,
                    AssignOp::Compound(binary) => {
                        let current = self.env.lookup(name).map_err(|e| e.at(target.pos))?;
                        combine(binary, current, value)?
                    }
                };
                self.env.set(name, updated.clone(), false);
                Ok(updated)
            }
            ExprKind::Index { collection, index } => {
                let collection = self.evaluate(collection)?;
                let index = self.evaluate(index)?;
                let Value::List(items) = &collection else {
                    return Err(InterpreterError::type_error(format!(
                        "Cannot assign to an element of a value of type {}.",
                        collection.type_name()
                    ))
                    .at(target.pos));
                };
                let i = operators::index_in(&index, items.borrow().len()).map_err(|e| e.at(target.pos))?;
                let updated = match op {
                    AssignOp::Assign => value,
                    AssignOp::Compound(binary) => {
                        let current = items.borrow()[i].clone();
                        combine(binary, current, value)?
                    }
                };
                items.borrow_mut()[i] = updated.clone();
                Ok(updated)
            }
            _ => Err(InterpreterError::invalid_target_at(target.pos)),
        }
    }

    /// `++`/`--`: prefix yields the new value, postfix the old one.
    fn step(&mut self, operand: &Expr, op: UnaryOp, fixity: Fixity) -> Result<Value, InterpreterError> {
        let (old, new) = match &operand.kind {
            ExprKind::Variable(name) => {
                let old = self.env.lookup(name).map_err(|e| e.at(operand.pos))?;
                let new = operators::step(op, &old)?;
                self.env.set(name, new.clone(), false);
                (old, new)
            }
            ExprKind::Index { collection, index } => {
                let collection = self.evaluate(collection)?;
                let index = self.evaluate(index)?;
                let Value::List(items) = &collection else {
                    return Err(InterpreterError::type_error(format!(
                        "Cannot modify an element of a value of type {}.",
                        collection.type_name()
                    )));
                };
                let i = operators::index_in(&index, items.borrow().len())?;
                let old = items.borrow()[i].clone();
                let new = operators::step(op, &old)?;
                items.borrow_mut()[i] = new.clone();
                (old, new)
            }
            _ => return Err(InterpreterError::invalid_target_at(operand.pos)),
        };
        Ok(match fixity {
            Fixity::Prefix => new,
            Fixity::Postfix => old,
        })
    }

    /// Only the chosen arm is evaluated.
    fn switch_expression(&mut self, subject: &Expr, arms: &[SwitchArm]) -> Result<Value, InterpreterError> {
        let value = self.evaluate(subject)?;

        for arm in arms {
            if let Some(pattern) = &arm.pattern {
                let candidate = self.evaluate(pattern)?;
                if operators::values_equal(&value, &candidate) {
                    return self.evaluate(&arm.result);
                }
            }
        }
        match arms.iter().find(|arm| arm.pattern.is_none()) {
            Some(fallback) => self.evaluate(&fallback.result),
            None => Err(InterpreterError::NoMatchingArm {
                value: value.to_string(),
                pos: subject.pos,
            }),
        }
    }

    // ===== CALLS =====

    /// Resolve and invoke a call. Intrinsic arity is checked before any
    /// argument is evaluated.
    fn call(&mut self, callee: &Callee, args: &[Expr]) -> Result<Value, InterpreterError> {
        let function = match callee {
            Callee::Named(name) => {
                if let Some(intrinsic) = builtins::lookup(name) {
                    intrinsic.check_arity(args.len())?;
                    let values = self.evaluate_args(args)?;
                    return intrinsic.execute(self, &values);
                }
                self.resolve_function(name)?
            }
            Callee::Expr(expr) => match self.evaluate(expr)? {
                Value::Function(function) => function,
                other => {
                    return Err(InterpreterError::type_error(format!(
                        "Cannot call a value of type {}.",
                        other.type_name()
                    )))
                }
            },
        };

        let values = self.evaluate_args(args)?;
        self.call_function(&function, values)
    }

    fn evaluate_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, InterpreterError> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    /// Local function bindings shadow top-level definitions; a global holding
    /// a function value is the last resort.
    fn resolve_function(&self, name: &str) -> Result<Rc<Function>, InterpreterError> {
        if let Some(Value::Function(function)) = self.env.get_local(name) {
            return Ok(function);
        }
        if let Some(decl) = self.functions.get(name) {
            return Ok(Rc::new(Function::new(decl.clone(), Vec::new())));
        }
        match self.env.get(name) {
            Some(Value::Function(function)) => Ok(function),
            Some(other) => Err(InterpreterError::type_error(format!(
                "'{}' is a {}, not a function.",
                name,
                other.type_name()
            ))),
            None => Err(InterpreterError::undefined_function(name)),
        }
    }

    /// Call a user function with already-evaluated arguments.
    ///
    /// The callee runs on its captured scope chain plus one fresh frame, with
    /// the caller's loop and flow state saved and restored around it.
    pub fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>) -> Result<Value, InterpreterError> {
        if args.len() != function.arity() {
            return Err(InterpreterError::arity(
                function.name(),
                function.arity().to_string(),
                args.len(),
            ));
        }
        trace!(function = function.name(), args = args.len(), "call");

        let saved_frames = self.env.enter_call(&function.captured);
        let snapshot = self.context.enter_function();

        for (param, arg) in function.decl.params.iter().zip(args) {
            self.env.set(param, arg, true);
        }
        let result = self.execute(&function.decl.body);
        let value = self.context.take_return_value();

        self.context.restore(snapshot);
        self.env.leave_call(saved_frames);
        result.map(|_| value)
    }
}

/// Compound assignment. `+=` on a list extends that same list.
fn combine(op: BinaryOp, current: Value, value: Value) -> Result<Value, InterpreterError> {
    match (&current, op) {
        (Value::List(items), BinaryOp::Add) => {
            let extra = match &value {
                Value::List(other) => other.borrow().clone(),
                single => vec![single.clone()],
            };
            items.borrow_mut().extend(extra);
            Ok(current)
        }
        _ => operators::binary(op, &current, &value),
    }
}

/// Run a parsed program against stdin/stdout.
pub fn interpret(program: &Program) -> Result<Value, InterpreterError> {
    Interpreter::new().run(program)
}

/// Parse and run `source`. Errors come back as display text: the first
/// syntax error, or the runtime error.
pub fn parse_and_run(source: &str) -> Result<Value, String> {
    let (program, errors) = parse(source);
    if let Some(first) = errors.first() {
        return Err(format!("Syntax error: {}", first));
    }

    Interpreter::new()
        .run(&program)
        .map_err(|e| format!("Runtime error: {}", e))
}

/// Like [`parse_and_run`], but returns renderable diagnostics for every
/// syntax error, or for the runtime error.
pub fn parse_and_run_with_diagnostics(source: &str) -> Result<Value, Vec<Diagnostic>> {
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        return Err(errors.iter().map(|e| e.to_diagnostic()).collect());
    }

    Interpreter::new()
        .run(&program)
        .map_err(|e| vec![e.to_diagnostic()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Position;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> Result<(Value, String), InterpreterError> {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected syntax errors: {:?}", errors);
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut interp = Interpreter::with_io(
            Box::new(io::Cursor::new(Vec::new())),
            Box::new(Sink(buffer.clone())),
        );
        let value = interp.run(&program)?;
        let output = String::from_utf8(buffer.borrow().clone()).unwrap();
        Ok((value, output))
    }

    #[test]
    fn test_main_result() {
        let (value, _) = run("func main() { return 1 + 2 * 3; }").unwrap();
        assert_eq!(value, Value::Number(7.0));
    }

    #[test]
    fn test_main_without_return_is_none() {
        let (value, _) = run("func main() { x = 1; }").unwrap();
        assert_eq!(value, Value::None);
    }

    #[test]
    fn test_print_goes_to_output() {
        let (_, output) = run(r#"func main() { print("a", 1); println('b'); }"#).unwrap();
        assert_eq!(output, "a1b\n");
    }

    #[test]
    fn test_recursion() {
        let source = "
            func fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }
            func main() { return fib(15); }
        ";
        assert_eq!(run(source).unwrap().0, Value::Number(610.0));
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(run("func helper() {}").unwrap_err(), InterpreterError::MissingMain);
    }

    #[test]
    fn test_break_outside_loop_is_error() {
        let err = run("func main() { break; }").unwrap_err();
        assert!(matches!(err, InterpreterError::InvalidControlFlow { keyword: "break", .. }));
        assert_eq!(err.position(), Position::new(1, 15));
    }

    #[test]
    fn test_error_position_comes_from_innermost_node() {
        let err = run("func main() {\n  x = 1 + true;\n}").unwrap_err();
        assert!(matches!(err, InterpreterError::TypeMismatch { .. }));
        assert_eq!(err.position().line, 2);
    }
}
