//! Expression parser
//!
//! Parses scanned tokens into an immutable [`Expr`] tree.

mod ast;
mod expr_parser;

pub use ast::{BinaryOp, Expr, Precedence, UnaryOp};
pub use expr_parser::{Parser, MAX_NESTING};

use crate::error::Result;
use crate::lexer::Scanner;

/// Scans and parses `source` in one step; quotes must already be normalized
/// when the text may mix quoting styles
pub fn parse_expr(source: &str) -> Result<Expr> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens).parse()
}
