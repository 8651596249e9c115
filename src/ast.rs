use std::rc::Rc;

use crate::diagnostic::Position;
use crate::value::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// `=` or a compound assignment carrying the binary operator it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Self { kind, pos }
    }

    pub fn error(message: impl Into<String>, pos: Position) -> Self {
        Self::new(ExprKind::Error(message.into()), pos)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Named(Rc<str>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    /// `None` for the `_` arm.
    pub pattern: Option<Expr>,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(Symbol),
    Char(char),
    Boolean(bool),
    Variable(Rc<str>),
    List(Vec<Expr>),
    Index {
        collection: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        operand: Box<Expr>,
        op: UnaryOp,
        fixity: Fixity,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Assignment {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    Function(Rc<FunctionDecl>),
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        elifs: Vec<(Expr, Expr)>,
        else_branch: Box<Expr>,
    },
    Switch {
        subject: Box<Expr>,
        arms: Vec<SwitchArm>,
    },
    Error(String),
}

/// Parameters and body shared by named definitions and function literals.
///
/// Function values compare equal when they point at the same declaration.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: Stmt,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub pattern: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Compound(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        elifs: Vec<(Expr, Stmt)>,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        init: Option<Expr>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        var: Rc<str>,
        iterable: Expr,
        body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
    },
    Break(Position),
    Continue(Position),
    Return(Option<Expr>),
    Function(Rc<FunctionDecl>),
    Empty,
    Error { message: String, pos: Position },
}

/// Root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub globals: Vec<(Rc<str>, Position)>,
    pub functions: Vec<Rc<FunctionDecl>>,
}

impl Program {
    /// The top-level function called `name`. A later definition wins.
    pub fn function(&self, name: &str) -> Option<&Rc<FunctionDecl>> {
        self.functions
            .iter()
            .rev()
            .find(|f| f.name.as_deref() == Some(name))
    }
}
