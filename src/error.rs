//! Error types for dynexpr

use thiserror::Error;

/// Dynamic access and evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered while scanning or parsing an expression
    ///
    /// **Triggered by:** Characters or token sequences outside the expression grammar
    /// **Example:** `a ? b` (no ternary operator), `"abc` (unterminated string)
    #[error("Syntax error at offset {pos}: {message}")]
    SyntaxError {
        /// Character offset where the error occurred
        pos: usize,
        /// Error description
        message: String,
    },

    /// Unexpected end of input during parsing
    #[error("Unexpected end of expression")]
    UnexpectedEof,

    /// Unexpected token encountered during parsing
    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        /// Expected token description
        expected: String,
        /// Actual token received
        got: String,
    },

    /// Expression text was empty after trimming
    #[error("Empty expression")]
    EmptyExpression,

    // Evaluation errors
    /// Call target could not be resolved to a callable
    ///
    /// **Triggered by:** Calling a name that is neither a bound function, a delegate
    /// method nor a function-valued field
    /// **Example:** `GetName0(' is ' + A)` when no `GetName0` exists
    #[error("Undefined method: {name}")]
    UndefinedMethod {
        /// Source form of the call target
        name: String,
    },

    /// Attempt to call a non-callable value
    #[error("Value is not callable: {type_name}")]
    NotCallable {
        /// Type of the non-callable value
        type_name: String,
    },

    /// Binary operator applied to incompatible operand kinds
    ///
    /// **Triggered by:** Bitwise operators on floats, `%` on floats, arithmetic on records
    /// **Example:** `1.5 & 2`, `2.5 % 2`
    #[error("Invalid operation: {op} on types {left_type} and {right_type}")]
    InvalidOperation {
        /// Operator
        op: String,
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    /// Unary operator applied to an incompatible operand kind
    #[error("Invalid operator '{op}' on {type_name}")]
    InvalidUnary {
        /// Operator
        op: String,
        /// Operand type
        type_name: String,
    },

    /// Integer division or remainder by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// A value could not be read as the requested kind
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Callable invoked with the wrong number of arguments
    #[error("Function {name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    // Invariant violations
    /// Write into a destination that has no declared type
    ///
    /// **Triggered by:** `assign`, `clone_into`, `merge` or `set` on `Value::Invalid`
    #[error("Destination is unaddressable")]
    Unaddressable,

    /// Source value cannot be coerced into the destination type
    ///
    /// **Triggered by:** Assigning a record into an integer, a bool into a list, etc.
    #[error("Can't assign {from} to {to}")]
    CannotAssign {
        /// Source type
        from: String,
        /// Destination type
        to: String,
    },

    /// Clone between values of different types
    #[error("Can't clone {from} into {to}")]
    CannotClone {
        /// Source type
        from: String,
        /// Destination type
        to: String,
    },

    /// Merge between incompatible structured types
    #[error("Can't merge {from} into {to}")]
    CannotMerge {
        /// Source type
        from: String,
        /// Destination type
        to: String,
    },

    /// General runtime error, usually raised by a host callable
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Programmer error; the caller must not retry with the same inputs
    Fatal,
    /// Recoverable error that may succeed with different inputs
    Recoverable,
    /// Warning that doesn't prevent further evaluation
    Warning,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Unaddressable
            | Error::CannotAssign { .. }
            | Error::CannotClone { .. }
            | Error::CannotMerge { .. } => ErrorSeverity::Fatal,

            Error::TypeError { .. } => ErrorSeverity::Warning,

            _ => ErrorSeverity::Recoverable,
        }
    }

    /// Returns true for coercion/merge invariant violations
    pub fn is_invariant_violation(&self) -> bool {
        self.classify() == ErrorSeverity::Fatal
    }
}

/// Result type for dynexpr operations
pub type Result<T> = std::result::Result<T, Error>;
