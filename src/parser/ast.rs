use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression tree node
///
/// Trees are immutable once parsed and are shared through the expression
/// cache, so the same tree can be evaluated against many contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntLiteral(i64),
    /// Floating-point literal
    FloatLiteral(f64),
    /// String literal (single- and double-quoted forms alike)
    StringLiteral(String),

    /// Bare name; `nil`, `null`, `true` and `false` are recognized at evaluation time
    Ident(String),

    /// Member access: `object.field`
    Selector {
        /// Object expression
        object: Box<Expr>,
        /// Field or method name
        field: String,
    },

    /// Indexing: `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index or key expression
        index: Box<Expr>,
    },

    /// Call: `callee(args...)`
    Call {
        /// Callee expression
        callee: Box<Expr>,
        /// Arguments, evaluated left to right
        args: Vec<Expr>,
    },

    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },

    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Parenthesized expression
    Paren(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition or string concatenation (+)
    Add,
    /// Subtraction operator (-)
    Sub,
    /// Multiplication operator (*)
    Mul,
    /// Division operator (/)
    Div,
    /// Remainder operator (%)
    Rem,

    // Comparison
    /// Equality operator (==)
    Eq,
    /// Inequality operator (!=)
    NotEq,
    /// Less than operator (<)
    Lt,
    /// Greater than operator (>)
    Gt,
    /// Less than or equal operator (<=)
    LtEq,
    /// Greater than or equal operator (>=)
    GtEq,

    // Logical
    /// Logical AND operator (&&)
    And,
    /// Short-circuit OR operator (||)
    Or,

    // Bitwise
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Left shift (<<)
    Shl,
    /// Right shift (>>)
    Shr,
    /// Bit clear, `a & !b` (&^)
    AndNot,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation operator (-x)
    Neg,
    /// Logical NOT operator (!x)
    Not,
    /// Numeric identity (+x)
    Plus,
}

/// Operator precedence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// No precedence
    None,
    /// Logical OR operator
    Or,
    /// Logical AND operator
    And,
    /// Comparison operators (==, !=, <, >, <=, >=)
    Comparison,
    /// Additive operators (+, -, |, ^)
    Term,
    /// Multiplicative operators (*, /, %, <<, >>, &, &^)
    Factor,
    /// Unary operators (!, -, +)
    Unary,
    /// Call operators (., (), [])
    Call,
}

impl BinaryOp {
    /// Returns the precedence level of this binary operator
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::Or => Precedence::Or,
            BinaryOp::And => Precedence::And,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => Precedence::Comparison,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::BitOr | BinaryOp::BitXor => Precedence::Term,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::BitAnd
            | BinaryOp::AndNot => Precedence::Factor,
        }
    }

    /// Comparison operators
    pub fn is_comparison(&self) -> bool {
        self.precedence() == Precedence::Comparison
    }

    /// Bitwise operators
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::AndNot
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Rem => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::BitAnd => write!(f, "&"),
            BinaryOp::BitOr => write!(f, "|"),
            BinaryOp::BitXor => write!(f, "^"),
            BinaryOp::Shl => write!(f, "<<"),
            BinaryOp::Shr => write!(f, ">>"),
            BinaryOp::AndNot => write!(f, "&^"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Plus => write!(f, "+"),
        }
    }
}

/// Renders the expression back to source form
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::IntLiteral(n) => write!(f, "{}", n),
            Expr::FloatLiteral(x) => write!(f, "{:?}", x),
            Expr::StringLiteral(s) => write!(f, "{:?}", s),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Selector { object, field } => write!(f, "{}.{}", object, field),
            Expr::Index { object, index } => write!(f, "{}[{}]", object, index),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Unary { op, operand } => write!(f, "{}{}", op, operand),
            Expr::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Paren(inner) => write!(f, "({})", inner),
        }
    }
}
