/*!
# Expression Error Handling

Bind-time error types for the expression engine.

There are two error channels in this crate and only one of them lives here.
Failures discovered while an expression is being bound (arity mismatches,
malformed literals, unknown function names) are fatal to query compilation
and are reported as structured [`ExprError`] values. Failures that occur while
rows are being evaluated (division by zero, unparseable runtime values) never
raise at all; they become [`Val::Err`](super::values::Val) cells that
propagate through the generator tree and are rendered as the cell's value.

All bind-time errors carry enough context to point the user at the offending
function or token, including the character position where one is known.
*/

use std::fmt;

/// Structured bind-time errors for expression compilation.
///
/// Each variant carries the context needed to report the failure against the
/// original expression text. These errors abort query compilation; they are
/// never produced during row evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// A token or literal could not be resolved into a parameter.
    ///
    /// Includes the offending token text and its character position in the
    /// source expression so the failure can be highlighted.
    Token {
        /// Description of the problem
        message: String,
        /// The raw token text that failed to bind
        text: String,
        /// Character position of the token in the expression text
        position: usize,
    },

    /// A function was constructed with an out-of-range parameter count.
    Arity {
        /// Name of the function as written in the expression
        function: String,
        /// Minimum number of parameters the function accepts
        min: usize,
        /// Maximum number of parameters the function accepts
        max: usize,
        /// Number of parameters actually supplied
        actual: usize,
    },

    /// A function argument was present but invalid at bind time.
    ///
    /// Covers statically-checkable argument problems such as a negative
    /// precision, a malformed regex literal or a non-constant argument where
    /// a constant is required.
    Argument {
        /// Name of the function the argument belongs to
        function: String,
        /// Description of the argument problem
        message: String,
    },

    /// The expression referenced a function name that does not exist.
    UnknownFunction {
        /// The unrecognised function name
        name: String,
    },

    /// General structural problems while assembling the function tree.
    Parse {
        /// Description of the structural problem
        message: String,
    },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Token {
                message,
                text,
                position,
            } => {
                write!(
                    f,
                    "Error binding token '{}' at position {}: {}",
                    text, position, message
                )
            }
            ExprError::Arity {
                function,
                min,
                max,
                actual,
            } => {
                if min == max {
                    write!(
                        f,
                        "Function '{}' expects {} parameter(s), but {} were supplied",
                        function, min, actual
                    )
                } else {
                    write!(
                        f,
                        "Function '{}' expects between {} and {} parameters, but {} were supplied",
                        function, min, max, actual
                    )
                }
            }
            ExprError::Argument { function, message } => {
                write!(f, "Invalid argument to '{}': {}", function, message)
            }
            ExprError::UnknownFunction { name } => {
                write!(f, "Unknown function '{}'", name)
            }
            ExprError::Parse { message } => {
                write!(f, "Expression error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExprError {}

impl ExprError {
    /// Create a token binding error
    pub fn token(message: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        ExprError::Token {
            message: message.into(),
            text: text.into(),
            position,
        }
    }

    /// Create an arity error for a function construction attempt
    pub fn arity(function: impl Into<String>, min: usize, max: usize, actual: usize) -> Self {
        ExprError::Arity {
            function: function.into(),
            min,
            max,
            actual,
        }
    }

    /// Create an invalid-argument error
    pub fn argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        ExprError::Argument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create an unknown-function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        ExprError::UnknownFunction { name: name.into() }
    }

    /// Create a general structural parse error
    pub fn parse(message: impl Into<String>) -> Self {
        ExprError::Parse {
            message: message.into(),
        }
    }
}

/// Result type for bind-time operations
pub type BindResult<T> = Result<T, ExprError>;
