use indexmap::IndexSet;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::interpreter::environment::{self, Frame};

thread_local! {
    static STRINGS: RefCell<IndexSet<Rc<str>>> = RefCell::new(IndexSet::new());
}

/// Interned string id. Equal ids always mean equal text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn intern(text: &str) -> Self {
        STRINGS.with(|table| {
            let mut table = table.borrow_mut();
            let index = match table.get_index_of(text) {
                Some(index) => index,
                None => table.insert_full(Rc::from(text)).0,
            };
            Symbol(index as u32)
        })
    }

    pub fn text(&self) -> Rc<str> {
        STRINGS.with(|table| {
            table
                .borrow()
                .get_index(self.0 as usize)
                .cloned()
                .unwrap_or_else(|| Rc::from(""))
        })
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// A function value: a declaration plus the scope chain it closes over.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub captured: Vec<Frame>,
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, captured: Vec<Frame>) -> Self {
        Self { decl, captured }
    }

    pub fn name(&self) -> &str {
        self.decl.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

impl Drop for Function {
    fn drop(&mut self) {
        for frame in self.captured.drain(..).rev() {
            environment::release(frame);
        }
    }
}

// Captured frames may contain this very function, so never print them.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({}/{})", self.name(), self.arity())
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Symbol),
    Boolean(bool),
    Char(char),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    None,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.decl, &b.decl),
            (Value::None, Value::None) => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn string(text: &str) -> Self {
        Value::String(Symbol::intern(text))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::None => "none",
        }
    }

    /// Numeric view; a Char widens to its code point.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Char(c) => Some(*c as u32 as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Read-only sequence view: list elements, or the characters of a string.
    pub fn as_list(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.borrow().clone()),
            Value::String(s) => Some(s.text().chars().map(Value::Char).collect()),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Copy with fresh storage for every nested list.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_clone).collect()),
            other => other.clone(),
        }
    }
}

/// Shortest round-trip form. Decimal exponents of 15 and above, or -5 and
/// below, switch to `1.5E+20` / `1E-07` notation.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return format!("{}", n);
    }

    let scientific = format!("{:e}", n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return format!("{}", n),
    };
    if (-4..15).contains(&exponent) {
        return format!("{}", n);
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", mantissa, sign, exponent.abs())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Function(_) => f.write_str("<function>"),
            Value::None => f.write_str("none"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
