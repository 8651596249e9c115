use crate::ast::{
    AssignOp, BinaryOp, Callee, Expr, ExprKind, Fixity, FunctionDecl, Program, Stmt, SwitchArm,
    SwitchCase, UnaryOp,
};
use crate::diagnostic::{Diagnostic, Label, Position};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::Symbol;
use std::fmt;
use std::rc::Rc;

const TERNARY_PRECEDENCE: u8 = 1;

/// A recoverable lexical or syntax error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            line: pos.line,
            column: pos.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::primary(self.position(), ""))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Line {}, Column {}] {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

fn binary_operator(kind: TokenKind) -> Option<(u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::Equal => (2, BinaryOp::Eq),
        TokenKind::NotEqual => (2, BinaryOp::NotEq),
        TokenKind::Less => (2, BinaryOp::Less),
        TokenKind::LessEqual => (2, BinaryOp::LessEq),
        TokenKind::Greater => (2, BinaryOp::Greater),
        TokenKind::GreaterEqual => (2, BinaryOp::GreaterEq),
        TokenKind::And => (3, BinaryOp::And),
        TokenKind::Or => (4, BinaryOp::Or),
        TokenKind::Plus => (5, BinaryOp::Add),
        TokenKind::Minus => (5, BinaryOp::Sub),
        TokenKind::Star => (6, BinaryOp::Mul),
        TokenKind::Slash => (6, BinaryOp::Div),
        TokenKind::Percent => (6, BinaryOp::Mod),
        TokenKind::DoubleSlash => (6, BinaryOp::FloorDiv),
        TokenKind::Caret => (7, BinaryOp::Pow),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
        TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
        TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
        TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
        TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Mod),
        TokenKind::DoubleSlashAssign => AssignOp::Compound(BinaryOp::FloorDiv),
        TokenKind::CaretAssign => AssignOp::Compound(BinaryOp::Pow),
        _ => return None,
    };
    Some(op)
}

fn prefix_operator(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::Increment => Some(UnaryOp::Increment),
        TokenKind::Decrement => Some(UnaryOp::Decrement),
        _ => None,
    }
}

/// Parse a whole source file. Always yields a program; syntax problems are
/// returned alongside it.
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    Parser::new(source).parse()
}

/// Recursive-descent parser with precedence climbing for binary operators.
///
/// Recovery works on two levels: a failed statement becomes `Stmt::Error` and
/// the parser skips to the next synchronizing token; a failed top-level
/// function header skips its whole brace-balanced body.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    consumed: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            consumed: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Program, Vec<ParseError>) {
        let program = self.parse_program();
        tracing::debug!(
            globals = program.globals.len(),
            functions = program.functions.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (program, self.errors)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    fn position(&self) -> Position {
        self.current.position()
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        self.consumed += 1;
        std::mem::replace(&mut self.current, next)
    }

    fn report(&mut self, message: impl Into<String>, pos: Position) {
        self.errors.push(ParseError::new(message, pos));
    }

    /// Report the message carried by a lexical error token and consume it.
    fn absorb_error_token(&mut self) -> Expr {
        let token = self.advance();
        let message = token
            .text()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Invalid token.".to_string());
        self.report(message.clone(), token.position());
        Expr::error(message, token.position())
    }

    /// Consume `kind` or record an error. A mismatch leaves the cursor in
    /// place; only a lexical error token is consumed.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        if self.check(TokenKind::Error) {
            self.absorb_error_token();
        } else {
            let message = format!("Expected '{}' but found {}.", kind.describe(), self.current);
            self.report(message, self.position());
        }
        false
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<Rc<str>> {
        if self.check(TokenKind::Identifier) {
            if let Some(name) = self.current.text().cloned() {
                self.advance();
                return Ok(name);
            }
        }
        let found = match self.current.text() {
            Some(message) if self.check(TokenKind::Error) => message.to_string(),
            _ => self.current.to_string(),
        };
        Err(ParseError::new(
            format!("Expected identifier {} but found {}.", context, found),
            self.position(),
        ))
    }

    fn synchronize(&mut self) {
        tracing::trace!(line = self.current.line, column = self.current.column, "synchronizing");
        loop {
            match self.current.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::ForEach
                | TokenKind::Do
                | TokenKind::Switch
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Func
                | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip the body of a function whose header failed to parse.
    fn skip_function_body(&mut self) {
        while !matches!(self.current.kind, TokenKind::LBrace | TokenKind::Func | TokenKind::Eof) {
            self.advance();
        }
        if !self.check(TokenKind::LBrace) {
            return;
        }
        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ===== Program =====

    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while self.check(TokenKind::Global) {
            match self.parse_global_declaration() {
                Ok(names) => program.globals.extend(names),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        while !self.check(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::Func => match self.parse_function_definition() {
                    Ok(decl) => program.functions.push(decl),
                    Err(err) => {
                        self.errors.push(err);
                        self.skip_function_body();
                    }
                },
                TokenKind::Error => {
                    self.absorb_error_token();
                }
                _ => {
                    let message = format!(
                        "Unexpected token {} at top level; expected a function definition.",
                        self.current
                    );
                    self.report(message, self.position());
                    self.advance();
                }
            }
        }

        program
    }

    fn parse_global_declaration(&mut self) -> ParseResult<Vec<(Rc<str>, Position)>> {
        self.advance();
        let mut names = Vec::new();
        loop {
            let pos = self.position();
            names.push((self.expect_identifier("in global declaration")?, pos));
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::Semicolon);
        Ok(names)
    }

    fn parse_function_definition(&mut self) -> ParseResult<Rc<FunctionDecl>> {
        let pos = self.position();
        self.advance();
        let name = self.expect_identifier("after 'func'")?;
        let params = self.parse_parameters()?;
        let body = self.parse_function_body()?;
        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params,
            body,
            pos,
        }))
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Rc<str>>> {
        if !self.check(TokenKind::LParen) {
            return Err(ParseError::new(
                format!("Expected '(' to start a parameter list but found {}.", self.current),
                self.position(),
            ));
        }
        self.advance();

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier("in parameter list")?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }

        if !self.check(TokenKind::RParen) {
            return Err(ParseError::new(
                format!("Expected ')' after parameters but found {}.", self.current),
                self.position(),
            ));
        }
        self.advance();
        Ok(params)
    }

    fn parse_function_body(&mut self) -> ParseResult<Stmt> {
        if !self.check(TokenKind::LBrace) {
            return Err(ParseError::new(
                format!("Expected '{{' to start a function body but found {}.", self.current),
                self.position(),
            ));
        }
        Ok(Stmt::Compound(self.parse_block()))
    }

    // ===== Statements =====

    fn parse_block(&mut self) -> Vec<Stmt> {
        self.advance();
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            statements.push(self.parse_statement());
        }
        self.expect(TokenKind::RBrace);
        statements
    }

    fn parse_statement(&mut self) -> Stmt {
        let before = self.consumed;

        if self.check(TokenKind::Error) {
            let error = self.absorb_error_token();
            self.synchronize();
            return Stmt::Error {
                message: match error.kind {
                    ExprKind::Error(message) => message,
                    _ => String::new(),
                },
                pos: error.pos,
            };
        }

        match self.statement() {
            Ok(stmt) => stmt,
            Err(err) => {
                let pos = err.position();
                let message = err.message.clone();
                self.errors.push(err);
                if self.consumed == before {
                    self.advance();
                }
                self.synchronize();
                Stmt::Error { message, pos }
            }
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let kind = self.current.kind;
        match kind {
            TokenKind::LBrace => Ok(Stmt::Compound(self.parse_block())),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::ForEach => self.parse_foreach_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Break => {
                let pos = self.position();
                self.advance();
                self.expect(TokenKind::Semicolon);
                Ok(Stmt::Break(pos))
            }
            TokenKind::Continue => {
                let pos = self.position();
                self.advance();
                self.expect(TokenKind::Semicolon);
                Ok(Stmt::Continue(pos))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RBrace) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semicolon);
                Ok(Stmt::Return(value))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            // `func(...) {...}(...)` starts an expression statement
            TokenKind::Func if self.peek_kind() != TokenKind::LParen => {
                Ok(Stmt::Function(self.parse_function_definition()?))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon);
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_condition(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen);
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen);
        Ok(condition)
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.parse_condition()?;
        let then_branch = Box::new(self.parse_statement());

        let mut elifs = Vec::new();
        while self.check(TokenKind::Elif) {
            self.advance();
            let condition = self.parse_condition()?;
            elifs.push((condition, self.parse_statement()));
        }

        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            elifs,
            else_branch,
        })
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect(TokenKind::LParen);

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon);

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon);

        let increment = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen);

        let body = Box::new(self.parse_statement());
        Ok(Stmt::For {
            init,
            condition,
            increment,
            body,
        })
    }

    fn parse_foreach_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect(TokenKind::LParen);
        let var = self.expect_identifier("as the foreach variable")?;
        self.expect(TokenKind::In);
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_statement());
        Ok(Stmt::ForEach { var, iterable, body })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let condition = self.parse_condition()?;
        let body = Box::new(self.parse_statement());
        Ok(Stmt::While { condition, body })
    }

    fn parse_do_while_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let body = Box::new(self.parse_statement());
        self.expect(TokenKind::While);
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Semicolon);
        Ok(Stmt::DoWhile { body, condition })
    }

    fn parse_switch_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let subject = self.parse_condition()?;
        self.expect(TokenKind::LBrace);

        let mut cases: Vec<SwitchCase> = Vec::new();
        loop {
            let has_default = cases.iter().any(|c| c.pattern.is_none());
            if has_default && matches!(self.current.kind, TokenKind::Case | TokenKind::Default) {
                self.report("'default' must be the last case of a switch.", self.position());
            }
            let pattern = match self.current.kind {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_expression()?)
                }
                TokenKind::Default => {
                    self.advance();
                    None
                }
                TokenKind::RBrace | TokenKind::Eof => break,
                _ => {
                    let message = format!("Expected 'case' or 'default' but found {}.", self.current);
                    self.report(message, self.position());
                    self.advance();
                    continue;
                }
            };
            self.expect(TokenKind::Colon);

            let mut body = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement());
            }
            if !has_default {
                cases.push(SwitchCase { pattern, body });
            }
        }

        self.expect(TokenKind::RBrace);
        Ok(Stmt::Switch { subject, cases })
    }

    // ===== Expressions =====

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(0)
    }

    fn parse_precedence(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let kind = self.current.kind;

            if let Some(op) = assignment_operator(kind) {
                if min_precedence > 0 {
                    break;
                }
                self.advance();
                let value = self.parse_precedence(0)?;
                let pos = left.pos;
                left = Expr::new(
                    ExprKind::Assignment {
                        target: Box::new(left),
                        op,
                        value: Box::new(value),
                    },
                    pos,
                );
                continue;
            }

            if kind == TokenKind::Question {
                if min_precedence > TERNARY_PRECEDENCE {
                    break;
                }
                self.advance();
                let then_branch = self.parse_precedence(0)?;
                self.expect(TokenKind::Colon);
                let else_branch = self.parse_precedence(TERNARY_PRECEDENCE)?;
                let pos = left.pos;
                left = Expr::new(
                    ExprKind::Ternary {
                        condition: Box::new(left),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                    pos,
                );
                continue;
            }

            let Some((precedence, op)) = binary_operator(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.advance();

            // `^` recurses at its own level so that it groups to the right
            let next_min = if op == BinaryOp::Pow { precedence } else { precedence + 1 };
            let right = self.parse_precedence(next_min)?;
            let pos = left.pos;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                pos,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match prefix_operator(self.current.kind) {
            Some(op) => {
                let pos = self.position();
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        operand: Box::new(operand),
                        op,
                        fixity: Fixity::Prefix,
                    },
                    pos,
                ))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current.kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    let pos = expr.pos;
                    let callee = match expr.kind {
                        ExprKind::Variable(name) => Callee::Named(name),
                        _ => Callee::Expr(Box::new(expr)),
                    };
                    expr = Expr::new(ExprKind::Call { callee, args }, pos);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket);
                    let pos = expr.pos;
                    expr = Expr::new(
                        ExprKind::Index {
                            collection: Box::new(expr),
                            index: Box::new(index),
                        },
                        pos,
                    );
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let op = if self.check(TokenKind::Increment) {
                        UnaryOp::Increment
                    } else {
                        UnaryOp::Decrement
                    };
                    self.advance();
                    let pos = expr.pos;
                    expr = Expr::new(
                        ExprKind::Unary {
                            operand: Box::new(expr),
                            op,
                            fixity: Fixity::Postfix,
                        },
                        pos,
                    );
                }
                TokenKind::Switch => expr = self.parse_switch_expression(expr)?,
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen);
        Ok(args)
    }

    fn parse_switch_expression(&mut self, subject: Expr) -> ParseResult<Expr> {
        self.advance();
        self.expect(TokenKind::LBrace);

        let mut arms: Vec<SwitchArm> = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            let has_default = arms.iter().any(|a| a.pattern.is_none());
            if has_default {
                self.report("'_' must be the last arm of a switch expression.", self.position());
            }
            let pattern = if self.check(TokenKind::Underscore) {
                self.advance();
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenKind::Arrow);
            let result = self.parse_expression()?;
            if !has_default {
                arms.push(SwitchArm { pattern, result });
            }

            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(TokenKind::RBrace);

        let pos = subject.pos;
        Ok(Expr::new(
            ExprKind::Switch {
                subject: Box::new(subject),
                arms,
            },
            pos,
        ))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let pos = self.position();
        let kind = match self.current.kind {
            TokenKind::Number => ExprKind::Number(self.current.number().unwrap_or_default()),
            TokenKind::String => {
                let text = self.current.text().map(|s| s.to_string()).unwrap_or_default();
                ExprKind::String(Symbol::intern(&text))
            }
            TokenKind::Char => ExprKind::Char(self.current.char().unwrap_or_default()),
            TokenKind::True => ExprKind::Boolean(true),
            TokenKind::False => ExprKind::Boolean(false),
            TokenKind::Identifier => {
                ExprKind::Variable(self.current.text().cloned().unwrap_or_else(|| Rc::from("")))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen);
                return Ok(expr);
            }
            TokenKind::LBracket => return self.parse_list_or_range(),
            TokenKind::Func => return self.parse_function_literal(),
            TokenKind::If => return self.parse_if_expression(),
            TokenKind::Error => return Ok(self.absorb_error_token()),
            _ => {
                return Err(ParseError::new(
                    format!("Unexpected token {}.", self.current),
                    pos,
                ))
            }
        };
        self.advance();
        Ok(Expr::new(kind, pos))
    }

    /// `[a, b, c]` or `[start..end]`, the latter becoming `range(start, end)`.
    fn parse_list_or_range(&mut self) -> ParseResult<Expr> {
        let pos = self.position();
        self.advance();

        let mut items = Vec::new();
        if !self.check(TokenKind::RBracket) {
            let first = self.parse_expression()?;
            if self.check(TokenKind::DotDot) {
                self.advance();
                let end = self.parse_expression()?;
                self.expect(TokenKind::RBracket);
                return Ok(Expr::new(
                    ExprKind::Call {
                        callee: Callee::Named(Rc::from("range")),
                        args: vec![first, end],
                    },
                    pos,
                ));
            }
            items.push(first);
            while self.check(TokenKind::Comma) {
                self.advance();
                items.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RBracket);
        Ok(Expr::new(ExprKind::List(items), pos))
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expr> {
        let pos = self.position();
        self.advance();
        let params = self.parse_parameters()?;
        let body = self.parse_function_body()?;
        Ok(Expr::new(
            ExprKind::Function(Rc::new(FunctionDecl {
                name: None,
                params,
                body,
                pos,
            })),
            pos,
        ))
    }

    /// `if c then a elif c2 then b else d`; every branch is required.
    fn parse_if_expression(&mut self) -> ParseResult<Expr> {
        let pos = self.position();
        self.advance();
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then);
        let then_branch = self.parse_expression()?;

        let mut elifs = Vec::new();
        while self.check(TokenKind::Elif) {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Then);
            elifs.push((condition, self.parse_expression()?));
        }

        self.expect(TokenKind::Else);
        let else_branch = self.parse_expression()?;

        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                elifs,
                else_branch: Box::new(else_branch),
            },
            pos,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Parse `source` as the body of `main` and return its statements.
    fn parse_body(source: &str) -> Vec<Stmt> {
        let (program, errors) = parse(&format!("func main() {{ {} }}", source));
        assert_eq!(errors, vec![], "unexpected syntax errors");
        match &program.functions[0].body {
            Stmt::Compound(stmts) => stmts.clone(),
            other => panic!("expected compound body, got {:?}", other),
        }
    }

    fn expression(source: &str) -> Expr {
        match parse_body(&format!("{};", source)).remove(0) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn render(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Number(n) => n.to_string(),
            ExprKind::Variable(name) => name.to_string(),
            ExprKind::Boolean(b) => b.to_string(),
            ExprKind::Binary { left, op, right } => {
                format!("({} {} {})", render(left), op.symbol(), render(right))
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "({} ? {} : {})",
                render(condition),
                render(then_branch),
                render(else_branch)
            ),
            ExprKind::Assignment { target, value, .. } => {
                format!("({} = {})", render(target), render(value))
            }
            ExprKind::Unary { operand, op, fixity } => format!("({:?}{:?} {})", fixity, op, render(operand)),
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(render(&expression("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(render(&expression("1 < 2 == true")), "((1 < 2) == true)");
        assert_eq!(render(&expression("a || b && c")), "((a || b) && c)");
        assert_eq!(render(&expression("a == b && c")), "(a == (b && c))");
        assert_eq!(render(&expression("10 - 4 - 3")), "((10 - 4) - 3)");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(render(&expression("2 ^ 3 ^ 2")), "(2 ^ (3 ^ 2))");
    }

    #[test]
    fn test_assignment_and_ternary_group_right() {
        assert_eq!(render(&expression("a = b = 5")), "(a = (b = 5))");
        assert_eq!(render(&expression("a ? b : c ? d : e")), "(a ? b : (c ? d : e))");
        assert_eq!(render(&expression("x = a > b ? a : b")), "(x = ((a > b) ? a : b))");
    }

    #[test]
    fn test_range_desugars_to_call() {
        let expr = expression("[0..10]");
        match expr.kind {
            ExprKind::Call {
                callee: Callee::Named(name),
                args,
            } => {
                assert_eq!(&*name, "range");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected range call, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chaining() {
        let expr = expression("make()(1)[0]++");
        let ExprKind::Unary {
            operand,
            fixity: Fixity::Postfix,
            ..
        } = expr.kind
        else {
            panic!("expected postfix increment");
        };
        let ExprKind::Index { collection, .. } = operand.kind else {
            panic!("expected indexer");
        };
        assert!(matches!(
            collection.kind,
            ExprKind::Call {
                callee: Callee::Expr(_),
                ..
            }
        ));
    }

    #[test]
    fn test_globals_and_functions() {
        let (program, errors) = parse("global a, b;\nglobal c;\nfunc main() {}\nfunc helper(x, y) { return x; }");
        assert!(errors.is_empty());
        let names: Vec<_> = program.globals.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.function("helper").map(|f| f.params.len()), Some(2));
    }

    #[test]
    fn test_switch_statement_cases() {
        let stmts = parse_body("switch (x) { case 1: a = 1; case 2: a = 2; break; default: a = 0; }");
        let Stmt::Switch { cases, .. } = &stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[1].body.len(), 2);
        assert!(cases[2].pattern.is_none());
    }

    #[test]
    fn test_immediately_invoked_literal_statement() {
        let stmts = parse_body("func(x) { return x; }(5);");
        assert!(matches!(stmts[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_missing_semicolon_is_reported() {
        let (program, errors) = parse("func main() {\n x = 5\n y = 10;\n}");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].line, errors[0].column), (3, 2));
    }

    #[test]
    fn test_statement_errors_recover() {
        let source = "func main() {\n x = 5 + ;\n y = 10;\n z = * 3;\n return y;\n}";
        let (program, errors) = parse(source);
        assert_eq!(program.functions.len(), 1);
        assert!(errors.len() >= 2);
        let Stmt::Compound(body) = &program.functions[0].body else {
            panic!("expected compound body");
        };
        assert!(matches!(body[0], Stmt::Error { .. }));
        assert!(matches!(body[1], Stmt::Expr(_)));
        assert!(matches!(body[2], Stmt::Error { .. }));
        assert!(matches!(body[3], Stmt::Return(Some(_))));
    }

    #[test]
    fn test_bad_function_header_skips_its_body() {
        let source = "func add(a, , c) { return a + c; }\nfunc main() { return 1; }";
        let (program, errors) = parse(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(program.functions.len(), 1);
        assert!(program.function("main").is_some());
    }

    #[test]
    fn test_lexical_errors_become_error_nodes() {
        let (program, errors) = parse("func main() { s = \"abc; }");
        assert_eq!(program.functions.len(), 1);
        assert!(errors.iter().any(|e| e.message == "Unterminated string literal."));
    }

    #[test]
    fn test_stray_top_level_tokens() {
        let (program, errors) = parse("x = 1; func main() {}");
        assert_eq!(program.functions.len(), 1);
        assert!(!errors.is_empty());
    }
}
