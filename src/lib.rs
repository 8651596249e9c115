pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod token;
pub mod value;

pub use ast::{Expr, ExprKind, Program, Stmt};
pub use interpreter::{
    interpret, parse, parse_and_run, parse_and_run_with_diagnostics, Interpreter, InterpreterError,
    ParseError,
};
pub use token::Token;
pub use value::Value;
