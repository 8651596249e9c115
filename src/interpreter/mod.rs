pub mod parser;
pub mod environment;
pub mod error;
pub mod control_flow;
pub mod operators;
pub mod builtins;
pub mod evaluator;

pub use error::InterpreterError;
pub use control_flow::{ControlContext, FlowState};
pub use environment::Environment;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use evaluator::{interpret, parse_and_run, parse_and_run_with_diagnostics, Interpreter};
