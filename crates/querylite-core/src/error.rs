//! Error types for QueryLite.

use std::fmt;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed query text, clause order, or leading keyword
    Syntax,
    /// Unknown names, arity and type errors
    Semantic,
    /// Failures reported by the fetch collaborator
    Source,
    /// Errors raised while computing values (division by zero, overflow)
    Execution,
    /// Misuse of the API (bad table shape, invalid input)
    Usage,
}

/// The main error type for QueryLite operations.
#[derive(Debug)]
pub enum Error {
    /// Malformed query text
    Syntax(String),

    /// A leading keyword or operator the engine does not support
    NotImplemented(String),

    /// A bare identifier that does not name a field of the table in scope
    UnknownField(String),

    /// A call to a function the engine does not know
    UnknownFunction(String),

    /// A function called with the wrong number of arguments
    Arity {
        /// Function name as written
        function: String,
        /// Human readable description of the accepted argument count
        expected: String,
        /// Number of arguments supplied
        found: usize,
    },

    /// An operator or function applied to values of incompatible types
    TypeMismatch(String),

    /// A numeric domain error, such as division by zero
    Domain(String),

    /// Opaque failure from the fetch collaborator
    Fetch(Box<dyn std::error::Error + Send + Sync>),

    /// Invalid operation on a table or session
    InvalidOperation(String),

    /// Rejected input
    InvalidInput(String),
}

impl Error {
    /// Returns the broad category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Syntax(_) | Error::NotImplemented(_) => ErrorCategory::Syntax,
            Error::UnknownField(_)
            | Error::UnknownFunction(_)
            | Error::Arity { .. }
            | Error::TypeMismatch(_) => ErrorCategory::Semantic,
            Error::Fetch(_) => ErrorCategory::Source,
            Error::Domain(_) => ErrorCategory::Execution,
            Error::InvalidOperation(_) | Error::InvalidInput(_) => ErrorCategory::Usage,
        }
    }

    /// Wraps any error raised by a fetch collaborator.
    pub fn fetch<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Fetch(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(msg) => write!(f, "Syntax error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::UnknownField(name) => write!(f, "Unknown field: '{}'", name),
            Error::UnknownFunction(name) => write!(f, "Unknown function: '{}'", name),
            Error::Arity {
                function,
                expected,
                found,
            } => write!(
                f,
                "Function '{}' expects {} argument(s), got {}",
                function, expected, found
            ),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Error::Domain(msg) => write!(f, "Domain error: {}", msg),
            Error::Fetch(e) => write!(f, "Fetch error: {}", e),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fetch(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// A specialized `Result` type for QueryLite operations.
pub type Result<T> = std::result::Result<T, Error>;
