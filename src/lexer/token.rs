use serde::{Deserialize, Serialize};

/// A single token from an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Character offset where the token starts (0-indexed)
    pub pos: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, pos: usize) -> Self {
        Token { kind, lexeme, pos }
    }
}

/// All token types of the expression grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal in any supported base
    Integer(i64),
    /// Floating-point literal in any supported base
    Float(f64),
    /// String literal, escapes already resolved
    String(String),

    /// Identifier; `nil`, `null`, `true` and `false` are resolved at evaluation time
    Identifier(String),

    // Arithmetic
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,

    // Bitwise
    /// &
    Amp,
    /// |
    Pipe,
    /// ^
    Caret,
    /// <<
    Shl,
    /// >>
    Shr,
    /// &^
    AmpCaret,

    // Logical
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Bang,

    // Comparison
    /// ==
    EqualEqual,
    /// !=
    BangEqual,
    /// <
    Less,
    /// <=
    LessEqual,
    /// >
    Greater,
    /// >=
    GreaterEqual,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// .
    Dot,

    /// End of input
    Eof,
}
