use super::token::{Token, TokenKind};
use crate::conv::{parse_float, parse_int};
use crate::error::{Error, Result};

/// Scanner for the expression grammar
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
}

impl Scanner {
    /// Creates a new scanner over an expression
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Scans all tokens and returns them, terminated by `Eof`
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, String::new(), self.current));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' | '\n' => {}

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),

            '.' => {
                if self.peek().is_ascii_digit() {
                    self.scan_number()?;
                } else {
                    self.add_token(TokenKind::Dot);
                }
            }

            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '%' => self.add_token(TokenKind::Percent),
            '^' => self.add_token(TokenKind::Caret),

            '&' => {
                let kind = if self.match_char('&') {
                    TokenKind::AndAnd
                } else if self.match_char('^') {
                    TokenKind::AmpCaret
                } else {
                    TokenKind::Amp
                };
                self.add_token(kind);
            }
            '|' => {
                let kind = if self.match_char('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('<') {
                    TokenKind::Shl
                } else if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('>') {
                    TokenKind::Shr
                } else if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::EqualEqual);
                } else {
                    return Err(self.error("assignment is not an expression"));
                }
            }

            '"' | '\'' => self.scan_string(c)?,

            _ => {
                if c.is_ascii_digit() {
                    self.scan_number()?;
                } else if c.is_alphabetic() || c == '_' {
                    self.scan_identifier();
                } else {
                    return Err(self.error(&format!("unexpected character '{}'", c)));
                }
            }
        }

        Ok(())
    }

    fn scan_string(&mut self, quote: char) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    _ => {
                        return Err(self.error(&format!("invalid escape sequence \\{}", escaped)));
                    }
                }
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(self.error("unterminated string"));
        }

        self.advance(); // Closing quote

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let mut radix = 10;
        let leading_dot = self.source[self.start] == '.';

        if !leading_dot && self.source[self.start] == '0' {
            radix = match self.peek() {
                'b' | 'B' => 2,
                'o' | 'O' => 8,
                'x' | 'X' => 16,
                _ => 10,
            };
            if radix != 10 {
                self.advance();
                if !self.peek().is_digit(radix) {
                    return Err(self.error("number prefix without digits"));
                }
            }
        }

        while self.peek().is_digit(radix) {
            self.advance();
        }

        let mut is_float = leading_dot;
        if !leading_dot && self.peek() == '.' && self.peek_next().is_digit(radix) {
            is_float = true;
            self.advance(); // consume .
            while self.peek().is_digit(radix) {
                self.advance();
            }
        }

        if self.peek().is_alphanumeric() || self.peek() == '_' {
            return Err(self.error(&format!("invalid digit '{}' in number", self.peek())));
        }

        let mut text: String = self.source[self.start..self.current].iter().collect();
        if leading_dot {
            text.insert(0, '0');
        }

        if is_float {
            self.add_token(TokenKind::Float(parse_float(&text)));
        } else {
            self.add_token(TokenKind::Integer(parse_int(&text)));
        }

        Ok(())
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(TokenKind::Identifier(text));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, lexeme, self.start));
    }

    fn error(&self, message: &str) -> Error {
        Error::SyntaxError {
            pos: self.start,
            message: message.to_string(),
        }
    }
}
