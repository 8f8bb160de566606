use super::ast::{BinaryOp, Expr, Precedence, UnaryOp};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Deepest expression tree the parser builds; deeper input is a syntax error
pub const MAX_NESTING: usize = 256;

/// Precedence-climbing parser for the expression grammar
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

/// A parsed subtree and the height of its tree
type Parsed = (Expr, usize);

impl Parser {
    /// Creates a new parser over a token stream terminated by `Eof`
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses exactly one expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Expr> {
        if self.is_at_end() {
            return Err(Error::EmptyExpression);
        }
        let (expr, _) = self.parse_binary(Precedence::Or)?;
        if !self.is_at_end() {
            let token = self.peek();
            return Err(Error::UnexpectedToken {
                expected: "end of expression".to_string(),
                got: token.lexeme.clone(),
            });
        }
        Ok(expr)
    }

    fn parse_binary(&mut self, min: Precedence) -> Result<Parsed> {
        let (mut left, mut height) = self.parse_unary()?;

        while let Some(op) = self.token_to_binary_op(self.peek()) {
            let precedence = op.precedence();
            if precedence < min {
                break;
            }
            self.advance();
            let (right, right_height) = self.parse_binary(tighter(precedence))?;
            height = self.grow(height.max(right_height))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok((left, height))
    }

    fn parse_unary(&mut self) -> Result<Parsed> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let parsed = self.parse_prefixed();
        self.depth -= 1;
        parsed
    }

    fn parse_prefixed(&mut self) -> Result<Parsed> {
        let op = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let (operand, height) = self.parse_unary()?;
                let height = self.grow(height)?;
                Ok((
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    height,
                ))
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Parsed> {
        let (mut expr, mut height) = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_identifier()?;
                    height = self.grow(height)?;
                    expr = Expr::Selector {
                        object: Box::new(expr),
                        field,
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let (index, index_height) = self.parse_binary(Precedence::Or)?;
                    self.consume(TokenKind::RightBracket, "]")?;
                    height = self.grow(height.max(index_height))?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let (args, args_height) = self.parse_arguments()?;
                    height = self.grow(height.max(args_height))?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }

        Ok((expr, height))
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, usize)> {
        let mut args = Vec::new();
        let mut height = 0;
        if self.check(&TokenKind::RightParen) {
            self.advance();
            return Ok((args, height));
        }
        loop {
            let (arg, arg_height) = self.parse_binary(Precedence::Or)?;
            args.push(arg);
            height = height.max(arg_height);
            if self.check(&TokenKind::Comma) {
                self.advance();
                // Trailing comma before ')'
                if self.check(&TokenKind::RightParen) {
                    self.advance();
                    break;
                }
            } else {
                self.consume(TokenKind::RightParen, ")")?;
                break;
            }
        }
        Ok((args, height))
    }

    fn parse_primary(&mut self) -> Result<Parsed> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Integer(n) => Expr::IntLiteral(n),
            TokenKind::Float(x) => Expr::FloatLiteral(x),
            TokenKind::String(s) => Expr::StringLiteral(s),
            TokenKind::Identifier(name) => Expr::Ident(name),
            TokenKind::LeftParen => {
                let (inner, height) = self.parse_binary(Precedence::Or)?;
                self.consume(TokenKind::RightParen, ")")?;
                let height = self.grow(height)?;
                return Ok((Expr::Paren(Box::new(inner)), height));
            }
            TokenKind::Eof => return Err(Error::UnexpectedEof),
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "operand".to_string(),
                    got: token.lexeme,
                })
            }
        };
        Ok((expr, 1))
    }

    /// Height of a node over children of height `child`, bounded by [`MAX_NESTING`]
    fn grow(&self, child: usize) -> Result<usize> {
        if child >= MAX_NESTING {
            return Err(self.too_deep());
        }
        Ok(child + 1)
    }

    fn too_deep(&self) -> Error {
        Error::SyntaxError {
            pos: self.peek().pos,
            message: format!("expression nested deeper than {} levels", MAX_NESTING),
        }
    }

    fn token_to_binary_op(&self, token: &Token) -> Option<BinaryOp> {
        let op = match token.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::NotEq,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::LessEqual => BinaryOp::LtEq,
            TokenKind::GreaterEqual => BinaryOp::GtEq,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::AmpCaret => BinaryOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else if self.is_at_end() {
            Err(Error::UnexpectedEof)
        } else {
            Err(Error::UnexpectedToken {
                expected: expected.to_string(),
                got: self.peek().lexeme.clone(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(Error::UnexpectedToken {
                expected: "field name".to_string(),
                got: self.peek().lexeme.clone(),
            }),
        }
    }
}

/// Next binding level up, so binary operators associate to the left
fn tighter(precedence: Precedence) -> Precedence {
    match precedence {
        Precedence::None => Precedence::Or,
        Precedence::Or => Precedence::And,
        Precedence::And => Precedence::Comparison,
        Precedence::Comparison => Precedence::Term,
        Precedence::Term => Precedence::Factor,
        Precedence::Factor => Precedence::Unary,
        Precedence::Unary | Precedence::Call => Precedence::Call,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> Result<Expr> {
        let tokens = Scanner::new(source).scan_tokens()?;
        Parser::new(tokens).parse()
    }

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_left_associative() {
        let expr = parse("a - b - c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: ident("a"),
                    right: ident("b"),
                }),
                right: ident("c"),
            }
        );
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a || b && c == d + e * f").unwrap();
        assert_eq!(expr.to_string(), "a || b && c == d + e * f");
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Or);
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_shift_binds_like_multiplication() {
        let expr = parse("1 + 2 << 3").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse("local.users[0]['user']['getName']()").unwrap();
        match expr {
            Expr::Call { callee, args } => {
                assert!(args.is_empty());
                assert!(matches!(*callee, Expr::Index { .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_unary_chain() {
        let expr = parse("!-x").unwrap();
        assert_eq!(
            expr,
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: ident("x"),
                }),
            }
        );
    }

    #[test]
    fn test_call_arguments() {
        let expr = parse("f(1, 'a', g(2),)").unwrap();
        match expr {
            Expr::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&ok).is_ok());

        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(parse(&parens), Err(Error::SyntaxError { .. })));

        let nots = format!("{}x", "!".repeat(100_000));
        assert!(matches!(parse(&nots), Err(Error::SyntaxError { .. })));

        let sum = vec!["1"; 100_000].join(" + ");
        assert!(matches!(parse(&sum), Err(Error::SyntaxError { .. })));

        let path = format!("a{}", ".b".repeat(100_000));
        assert!(matches!(parse(&path), Err(Error::SyntaxError { .. })));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Err(Error::EmptyExpression));
        assert_eq!(parse("a +"), Err(Error::UnexpectedEof));
        assert!(matches!(parse("(a"), Err(Error::UnexpectedEof)));
        assert!(matches!(parse("a b"), Err(Error::UnexpectedToken { .. })));
        assert!(matches!(parse("a.1"), Err(_)));
        assert!(matches!(parse("f(,)"), Err(Error::UnexpectedToken { .. })));
    }
}
