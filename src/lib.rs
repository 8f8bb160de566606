//! # dynexpr - Dynamic Values and Expression Evaluation
//!
//! A dynamic value layer with path-based access, plus a small expression
//! language evaluated against named scopes. Parsed expression trees are kept
//! in a bounded cache shared by every scope of the same [`Root`].
//!
//! ## Features
//!
//! - **Dynamic values** - ints and floats of every width, strings, lists,
//!   arrays, maps, declared records, callables, pointers and interface slots
//! - **Path access** - read, write, coerce, clone and merge through dotted
//!   paths such as `local.users.0.name`
//! - **Expressions** - literals, selectors, indexing, calls, unary and binary
//!   operators with Go-like semantics
//! - **Shared tree cache** - FIFO or LRU, reconfigurable at runtime
//!
//! ## Quick Start
//!
//! ```rust
//! use dynexpr::{Scope, Value};
//!
//! # fn main() -> dynexpr::Result<()> {
//! let mut scope = Scope::new();
//! scope.bind("a", 25i64);
//! scope.bind(
//!     "greet",
//!     Value::func("greet", |args| Ok(Value::from(format!("Allen{}", args[0])))),
//! );
//!
//! let result = scope.eval("greet(' is ' + a)")?;
//! assert_eq!(result, Value::from("Allen is 25"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Records
//!
//! Record types are declared once; exported fields and methods become
//! visible to expressions through a linked delegate.
//!
//! ```rust
//! use dynexpr::{RecordType, Scope, Type, Value};
//!
//! # fn main() -> dynexpr::Result<()> {
//! let person = RecordType::builder("Person")
//!     .field("Age", Type::INT)
//!     .method("IsAdult", |recv, _| {
//!         let age = dynexpr::prop_of_id(recv, "Age").unwrap_or(Value::Invalid);
//!         Ok(Value::Bool(age.as_i64()? >= 18))
//!     })
//!     .build();
//!
//! let allen = person.instance().with("Age", 25i64)?;
//! let scope = Scope::of([Value::from(allen)]);
//! assert_eq!(scope.eval("IsAdult() && Age > 20")?, Value::Bool(true));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Text → normalize_quotes → cache lookup → Scanner → Parser → Expr → Stack walk → Value
//! ```
//!
//! - [`lexer`] - quote normalization and tokenization
//! - [`parser`] - precedence-climbing parser producing [`Expr`]
//! - [`runtime`] - values, path access, scopes and the evaluator
//! - [`cache`] - bounded caches
//! - [`conv`] - numeric literal parsing and name-case helpers
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. Coercion and merge failures
//! are invariant violations and classify as
//! [`ErrorSeverity::Fatal`](error::ErrorSeverity::Fatal), but they are still
//! returned to the caller:
//!
//! ```rust
//! # use dynexpr::{Scope, Error};
//! let scope = Scope::new();
//! match scope.eval("1 / 0") {
//!     Ok(_) => panic!("should have failed"),
//!     Err(e) => assert_eq!(e, Error::DivisionByZero),
//! }
//! ```

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cache;
pub mod conv;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use cache::{new_cache, Cache, CachePolicy, LruCache, SimpleCache};
pub use error::{Error, ErrorSeverity, Result};
pub use lexer::{normalize_quotes, Scanner, Token, TokenKind};
pub use parser::{parse_expr, BinaryOp, Expr, Parser, UnaryOp};
pub use runtime::{
    eval, prop_of, prop_of_id, set_cache_size, Context, Func, Kind, Record, RecordType, Root,
    RootConfig, Scope, Type, Value,
};
