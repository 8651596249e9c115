//! Hand-written, pull-based tokenizer.
//!
//! The lexer never fails: malformed input becomes `TokenKind::Error` tokens
//! carrying a message, and the cursor always moves past the offending text.

use crate::diagnostic::Position;
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

const THREE_CHAR_OPERATORS: &[(&str, TokenKind)] = &[("//=", TokenKind::DoubleSlashAssign)];

const TWO_CHAR_OPERATORS: &[(&str, TokenKind)] = &[
    ("..", TokenKind::DotDot),
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
    ("%=", TokenKind::PercentAssign),
    ("^=", TokenKind::CaretAssign),
    ("//", TokenKind::DoubleSlash),
    ("=>", TokenKind::Arrow),
];

const ONE_CHAR_OPERATORS: &[(&str, TokenKind)] = &[
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("^", TokenKind::Caret),
    ("!", TokenKind::Bang),
    ("=", TokenKind::Assign),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
];

#[derive(Debug, Clone, Copy)]
struct Cursor {
    pos: usize,
    line: usize,
    column: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    cursor: Cursor,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            cursor: Cursor {
                pos: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let saved = self.cursor;
        let token = self.next_token();
        self.cursor = saved;
        token
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.position();

        let Some(c) = self.current() else {
            return Token::new(TokenKind::Eof, start);
        };

        if c.is_alphabetic() || c == '_' {
            self.identifier(start)
        } else if c.is_ascii_digit() || (c == '.' && self.char_at(1).is_some_and(|d| d.is_ascii_digit())) {
            self.number(start)
        } else if c == '"' {
            self.string(start)
        } else if c == '\'' {
            self.character(start)
        } else {
            self.operator(start)
        }
    }

    fn position(&self) -> Position {
        Position::new(self.cursor.line, self.cursor.column)
    }

    fn current(&self) -> Option<char> {
        self.char_at(0)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.cursor.pos += 1;
        if c == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while self.current().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn identifier(&mut self, start: Position) -> Token {
        let mut name = String::new();
        while let Some(c) = self.current().filter(|c| c.is_alphanumeric() || *c == '_') {
            name.push(c);
            self.bump();
        }

        match TokenKind::keyword(&name.to_lowercase()) {
            Some(kind) => Token::new(kind, start),
            None => Token::with_literal(TokenKind::Identifier, Literal::Text(Rc::from(name)), start),
        }
    }

    fn number(&mut self, start: Position) -> Token {
        let mut text = String::new();
        let mut seen_dot = false;
        let mut malformed = false;

        if self.current() == Some('.') {
            text.push('0');
        }

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' {
                // `..` belongs to a range, not to this literal
                if self.char_at(1) == Some('.') {
                    break;
                }
                malformed |= seen_dot;
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }

        if malformed {
            return Token::error("Invalid numeric format with multiple dots.", start);
        }

        match text.parse::<f64>() {
            Ok(n) => Token::with_literal(TokenKind::Number, Literal::Number(n), start),
            Err(_) => Token::error(format!("Invalid numeric literal: {}", text), start),
        }
    }

    fn escape(c: char) -> Option<char> {
        match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            '"' => Some('"'),
            '\'' => Some('\''),
            '\\' => Some('\\'),
            '0' => Some('\0'),
            _ => None,
        }
    }

    fn string(&mut self, start: Position) -> Token {
        self.bump();
        let mut text = String::new();
        let mut error: Option<String> = None;

        loop {
            match self.bump() {
                None => return Token::error("Unterminated string literal.", start),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Token::error("Unterminated string literal.", start),
                    Some(e) => match Self::escape(e) {
                        Some(resolved) => text.push(resolved),
                        None => {
                            error.get_or_insert_with(|| format!("Unrecognized escape sequence: \\{}", e));
                        }
                    },
                },
                Some(c) => text.push(c),
            }
        }

        match error {
            Some(message) => Token::error(message, start),
            None => Token::with_literal(TokenKind::String, Literal::Text(Rc::from(text)), start),
        }
    }

    fn character(&mut self, start: Position) -> Token {
        self.bump();
        let value = match self.current() {
            None => return Token::error("Unterminated character literal.", start),
            Some('\'') => {
                self.bump();
                return Token::error("Empty character literal.", start);
            }
            Some('\\') => {
                self.bump();
                match self.bump() {
                    None => return Token::error("Unterminated character literal.", start),
                    Some(e) => match Self::escape(e) {
                        Some(resolved) => resolved,
                        None => {
                            if self.current() == Some('\'') {
                                self.bump();
                            }
                            return Token::error(format!("Unrecognized escape sequence: \\{}", e), start);
                        }
                    },
                }
            }
            Some(c) => {
                self.bump();
                c
            }
        };

        if self.current() != Some('\'') {
            return Token::error("Unterminated character literal.", start);
        }
        self.bump();
        Token::with_literal(TokenKind::Char, Literal::Char(value), start)
    }

    fn lookahead(&self, len: usize) -> Option<String> {
        let end = self.cursor.pos + len;
        (end <= self.chars.len()).then(|| self.chars[self.cursor.pos..end].iter().collect())
    }

    fn operator(&mut self, start: Position) -> Token {
        for (table, len) in [
            (THREE_CHAR_OPERATORS, 3),
            (TWO_CHAR_OPERATORS, 2),
            (ONE_CHAR_OPERATORS, 1),
        ] {
            let Some(text) = self.lookahead(len) else {
                continue;
            };
            if let Some((_, kind)) = table.iter().find(|(op, _)| *op == text) {
                for _ in 0..len {
                    self.bump();
                }
                return Token::new(*kind, start);
            }
        }

        let c = self.bump().unwrap_or_default();
        Token::error(format!("Unrecognized character: '{}'", c), start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Tokenize a whole source, including the trailing `Eof`.
    fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    fn error_message(source: &str) -> String {
        tokenize(source)
            .into_iter()
            .find(|t| t.kind == TokenKind::Error)
            .and_then(|t| t.text().map(|s| s.to_string()))
            .unwrap_or_default()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("IF Elif else FUNC foreach In _"),
            vec![
                TokenKind::If,
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::Func,
                TokenKind::ForEach,
                TokenKind::In,
                TokenKind::Underscore,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers_keep_case() {
        let tokens = tokenize("myVar _tmp x2");
        let names: Vec<_> = tokens.iter().filter_map(|t| t.text()).map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["myVar", "_tmp", "x2"]);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.5 .25");
        let values: Vec<_> = tokens.iter().filter_map(|t| t.number()).collect();
        assert_eq!(values, vec![42.0, 3.5, 0.25]);
    }

    #[test]
    fn test_range_stops_number_scan() {
        assert_eq!(
            kinds("[0..10]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Number,
                TokenKind::DotDot,
                TokenKind::Number,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multiple_dots_is_error() {
        assert_eq!(error_message("3.14.15"), "Invalid numeric format with multiple dots.");
        assert_eq!(kinds("3.14.15;"), vec![TokenKind::Error, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\tb\n\"q\"\\""#);
        assert_eq!(tokens[0].text().map(|s| s.to_string()), Some("a\tb\n\"q\"\\".to_string()));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(error_message("\"abc"), "Unterminated string literal.");
        assert_eq!(error_message(r#""bad \q escape""#), "Unrecognized escape sequence: \\q");
        // the whole literal is consumed
        assert_eq!(kinds(r#""bad \q" ;"#), vec![TokenKind::Error, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn test_char_literals() {
        let tokens = tokenize(r"'a' '\n'");
        assert_eq!(tokens[0].char(), Some('a'));
        assert_eq!(tokens[1].char(), Some('\n'));
        assert_eq!(error_message("''"), "Empty character literal.");
        assert_eq!(error_message("'ab'"), "Unterminated character literal.");
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            kinds("//= // / ++ += => == ="),
            vec![
                TokenKind::DoubleSlashAssign,
                TokenKind::DoubleSlash,
                TokenKind::Slash,
                TokenKind::Increment,
                TokenKind::PlusAssign,
                TokenKind::Arrow,
                TokenKind::Equal,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unrecognized_character_advances() {
        assert_eq!(kinds("@ x"), vec![TokenKind::Error, TokenKind::Identifier, TokenKind::Eof]);
        assert_eq!(error_message("@"), "Unrecognized character: '@'");
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = tokenize("# comment\n  x = 1;");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 7));
    }

    #[test]
    fn test_peek_restores_cursor() {
        let mut lexer = Lexer::new("a b");
        let peeked = lexer.peek();
        let next = lexer.next_token();
        assert_eq!(peeked, next);
        assert_eq!(lexer.next_token().text().map(|s| s.to_string()), Some("b".to_string()));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
