use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::error::InterpreterError;

/// Bindings introduced by one block, loop or call.
type Scope = HashMap<Rc<str>, Value>;

/// A scope that closures can keep alive after it leaves the active stack.
pub type Frame = Rc<RefCell<Scope>>;

/// The active scope chain plus the global map.
///
/// Frames are kept in an index-addressed stack, innermost last. Function values
/// capture the stack by cloning its frame handles, so a closure shares (not
/// copies) every frame that was active when it was created.
#[derive(Debug, Default)]
pub struct Environment {
    frames: Vec<Frame>,
    globals: Scope,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(16),
            globals: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Rc::new(RefCell::new(HashMap::new())));
    }

    pub fn pop_scope(&mut self) {
        if let Some(frame) = self.frames.pop() {
            release(frame);
        }
    }

    pub fn declare_global(&mut self, name: &Rc<str>, value: Value) -> Result<(), InterpreterError> {
        if self.globals.contains_key(name) {
            return Err(InterpreterError::DuplicateGlobal {
                name: name.to_string(),
                pos: crate::diagnostic::Position::unknown(),
            });
        }
        self.globals.insert(name.clone(), value);
        Ok(())
    }

    /// Bind `name` in the innermost scope, shadowing any outer binding.
    pub fn declare_local(&mut self, name: Rc<str>, value: Value) {
        match self.frames.last() {
            Some(frame) => {
                frame.borrow_mut().insert(name, value);
            }
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    /// Assign to the innermost existing binding, then a declared global,
    /// otherwise bind fresh in the innermost scope.
    ///
    /// Parameter introduction always binds fresh in the innermost scope.
    pub fn set(&mut self, name: &Rc<str>, value: Value, introduce_param: bool) {
        if !introduce_param {
            for frame in self.frames.iter().rev() {
                let mut frame = frame.borrow_mut();
                if let Some(slot) = frame.get_mut(name) {
                    *slot = value;
                    return;
                }
            }
            if let Some(slot) = self.globals.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.declare_local(name.clone(), value);
    }

    /// Search the active frames only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().get(name).cloned())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_local(name).or_else(|| self.globals.get(name).cloned())
    }

    pub fn lookup(&self, name: &str) -> Result<Value, InterpreterError> {
        self.get(name)
            .ok_or_else(|| InterpreterError::undefined_variable(name))
    }

    /// Handles to every active frame, for a new function value.
    pub fn capture(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    /// Switch to a callee's captured chain plus one fresh frame.
    /// Returns the caller's chain for `leave_call`.
    pub fn enter_call(&mut self, captured: &[Frame]) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(captured.len() + 1);
        frames.extend(captured.iter().cloned());
        let saved = std::mem::replace(&mut self.frames, frames);
        self.push_scope();
        saved
    }

    pub fn leave_call(&mut self, saved: Vec<Frame>) {
        let mut callee = std::mem::replace(&mut self.frames, saved);
        while let Some(frame) = callee.pop() {
            release(frame);
        }
    }
}

/// Give up one handle to `frame`.
///
/// A function stored in a frame it captures keeps that frame alive through
/// a reference cycle. When every other handle comes from such functions, the
/// frame is unreachable and its bindings are dropped to break the cycle.
pub(crate) fn release(frame: Frame) {
    let internal: usize = frame
        .borrow()
        .values()
        .map(|value| match value {
            Value::Function(function) if Rc::strong_count(function) == 1 => function
                .captured
                .iter()
                .filter(|captured| Rc::ptr_eq(captured, &frame))
                .count(),
            _ => 0,
        })
        .sum();

    if internal > 0 && Rc::strong_count(&frame) == internal + 1 {
        let bindings = std::mem::take(&mut *frame.borrow_mut());
        drop(bindings);
    }
}
