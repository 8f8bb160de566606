//! Lexical analysis for expressions
//!
//! Quote normalization runs first so every string literal reaches the scanner
//! in one quoting style, then the scanner converts text into a token stream.

mod quote;
mod scanner;
mod token;

pub use quote::normalize_quotes;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
