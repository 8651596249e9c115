use crate::diagnostic::Position;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    Char,
    Identifier,

    // Keywords
    True,
    False,
    If,
    Then,
    Elif,
    Else,
    For,
    ForEach,
    In,
    While,
    Do,
    Break,
    Continue,
    Return,
    Func,
    Global,
    Switch,
    Case,
    Default,
    Underscore,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Caret,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    DoubleSlashAssign,
    PercentAssign,
    CaretAssign,
    Increment,
    Decrement,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Question,
    Colon,
    Arrow,
    DotDot,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,

    Eof,
    Error,
}

impl TokenKind {
    /// Keywords match case-insensitively; `name` must already be lowercase.
    pub fn keyword(name: &str) -> Option<TokenKind> {
        let kind = match name {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "foreach" => TokenKind::ForEach,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "func" => TokenKind::Func,
            "global" => TokenKind::Global,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "_" => TokenKind::Underscore,
            _ => return None,
        };
        Some(kind)
    }

    /// Source spelling used in parser messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Char => "character",
            TokenKind::Identifier => "identifier",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::ForEach => "foreach",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Func => "func",
            TokenKind::Global => "global",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Underscore => "_",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::DoubleSlashAssign => "//=",
            TokenKind::PercentAssign => "%=",
            TokenKind::CaretAssign => "^=",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::DotDot => "..",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Payload carried by literal, identifier and error tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(Rc<str>),
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            literal: None,
            line: position.line,
            column: position.column,
        }
    }

    pub fn with_literal(kind: TokenKind, literal: Literal, position: Position) -> Self {
        Self {
            kind,
            literal: Some(literal),
            line: position.line,
            column: position.column,
        }
    }

    pub fn error(message: impl Into<Rc<str>>, position: Position) -> Self {
        Self::with_literal(TokenKind::Error, Literal::Text(message.into()), position)
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Identifier name, string contents or error message.
    pub fn text(&self) -> Option<&Rc<str>> {
        match &self.literal {
            Some(Literal::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self.literal {
            Some(Literal::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn char(&self) -> Option<char> {
        match self.literal {
            Some(Literal::Char(c)) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.literal) {
            (TokenKind::Identifier, Some(Literal::Text(name))) => write!(f, "'{}'", name),
            (TokenKind::String, Some(Literal::Text(s))) => write!(f, "\"{}\"", s),
            (TokenKind::Number, Some(Literal::Number(n))) => write!(f, "{}", n),
            (TokenKind::Char, Some(Literal::Char(c))) => write!(f, "'{}'", c),
            (TokenKind::Eof, _) => f.write_str("end of input"),
            (kind, _) => write!(f, "'{}'", kind.describe()),
        }
    }
}
