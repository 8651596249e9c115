use crate::diagnostic::{Diagnostic, Label, Position};
use thiserror::Error;

/// Fatal runtime errors. Any of these aborts the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpreterError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, pos: Position },

    #[error("Undefined function '{name}'.")]
    UndefinedFunction { name: String, pos: Position },

    #[error("{message}")]
    TypeMismatch { message: String, pos: Position },

    #[error("Function '{name}' expects {expected} argument(s) but got {found}.")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
        pos: Position,
    },

    #[error("Index {index} is out of range for length {length}.")]
    IndexOutOfRange { index: f64, length: usize, pos: Position },

    #[error("'{name}' is the name of an intrinsic function and cannot be redefined.")]
    ReservedName { name: String, pos: Position },

    #[error("Global variable '{name}' is already declared.")]
    DuplicateGlobal { name: String, pos: Position },

    #[error("'{keyword}' used outside of a loop.")]
    InvalidControlFlow { keyword: &'static str, pos: Position },

    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget { pos: Position },

    #[error("No main function found.")]
    MissingMain,

    #[error("main() function cannot have parameters.")]
    MainHasParameters { pos: Position },

    #[error("No switch arm matched the value {value}.")]
    NoMatchingArm { value: String, pos: Position },

    #[error("Cannot execute code containing a syntax error: {message}")]
    SyntaxNode { message: String, pos: Position },

    #[error("{message}")]
    InvalidOperation { message: String, pos: Position },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl InterpreterError {
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into(), pos: Position::unknown() }
    }

    pub fn undefined_function(name: impl Into<String>) -> Self {
        Self::UndefinedFunction { name: name.into(), pos: Position::unknown() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeMismatch { message: message.into(), pos: Position::unknown() }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, found: usize) -> Self {
        Self::ArityMismatch {
            name: name.into(),
            expected: expected.into(),
            found,
            pos: Position::unknown(),
        }
    }

    pub fn index_out_of_range(index: f64, length: usize) -> Self {
        Self::IndexOutOfRange { index, length, pos: Position::unknown() }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation { message: message.into(), pos: Position::unknown() }
    }

    pub fn reserved_name_at(name: impl Into<String>, pos: Position) -> Self {
        Self::ReservedName { name: name.into(), pos }
    }

    pub fn invalid_control_flow_at(keyword: &'static str, pos: Position) -> Self {
        Self::InvalidControlFlow { keyword, pos }
    }

    pub fn invalid_target_at(pos: Position) -> Self {
        Self::InvalidAssignmentTarget { pos }
    }

    pub fn syntax_node_at(message: impl Into<String>, pos: Position) -> Self {
        Self::SyntaxNode { message: message.into(), pos }
    }

    pub fn io(err: std::io::Error) -> Self {
        Self::Io { message: err.to_string() }
    }

    fn pos_mut(&mut self) -> Option<&mut Position> {
        match self {
            Self::UndefinedVariable { pos, .. }
            | Self::UndefinedFunction { pos, .. }
            | Self::TypeMismatch { pos, .. }
            | Self::ArityMismatch { pos, .. }
            | Self::IndexOutOfRange { pos, .. }
            | Self::ReservedName { pos, .. }
            | Self::DuplicateGlobal { pos, .. }
            | Self::InvalidControlFlow { pos, .. }
            | Self::InvalidAssignmentTarget { pos }
            | Self::MainHasParameters { pos }
            | Self::NoMatchingArm { pos, .. }
            | Self::SyntaxNode { pos, .. }
            | Self::InvalidOperation { pos, .. } => Some(pos),
            Self::MissingMain | Self::Io { .. } => None,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::UndefinedVariable { pos, .. }
            | Self::UndefinedFunction { pos, .. }
            | Self::TypeMismatch { pos, .. }
            | Self::ArityMismatch { pos, .. }
            | Self::IndexOutOfRange { pos, .. }
            | Self::ReservedName { pos, .. }
            | Self::DuplicateGlobal { pos, .. }
            | Self::InvalidControlFlow { pos, .. }
            | Self::InvalidAssignmentTarget { pos }
            | Self::MainHasParameters { pos }
            | Self::NoMatchingArm { pos, .. }
            | Self::SyntaxNode { pos, .. }
            | Self::InvalidOperation { pos, .. } => *pos,
            Self::MissingMain | Self::Io { .. } => Position::unknown(),
        }
    }

    /// Attach `pos` unless a more precise position is already recorded.
    pub fn at(mut self, pos: Position) -> Self {
        if let Some(slot) = self.pos_mut() {
            if slot.is_unknown() {
                *slot = pos;
            }
        }
        self
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UndefinedVariable { .. } => "E0201",
            Self::UndefinedFunction { .. } => "E0202",
            Self::TypeMismatch { .. } => "E0203",
            Self::ArityMismatch { .. } => "E0204",
            Self::IndexOutOfRange { .. } => "E0205",
            Self::ReservedName { .. } => "E0206",
            Self::DuplicateGlobal { .. } => "E0207",
            Self::InvalidControlFlow { .. } => "E0208",
            Self::InvalidAssignmentTarget { .. } => "E0209",
            Self::MissingMain | Self::MainHasParameters { .. } => "E0210",
            Self::NoMatchingArm { .. } => "E0211",
            Self::SyntaxNode { .. } => "E0212",
            Self::InvalidOperation { .. } => "E0213",
            Self::Io { .. } => "E0214",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = match self {
            Self::UndefinedVariable { .. } => "not found in this scope",
            Self::UndefinedFunction { .. } => "no intrinsic, function or variable with this name",
            Self::IndexOutOfRange { .. } => "index out of range",
            Self::InvalidControlFlow { .. } => "not inside a loop",
            Self::InvalidAssignmentTarget { .. } => "only variables and list elements can be assigned",
            _ => "",
        };
        let diagnostic = Diagnostic::error(self.to_string())
            .with_code(self.code())
            .with_label(Label::primary(self.position(), label));

        match self {
            Self::MissingMain => diagnostic.with_help("define `func main() { ... }`"),
            Self::ReservedName { .. } => diagnostic.with_help("pick a name that is not an intrinsic"),
            _ => diagnostic,
        }
    }
}
