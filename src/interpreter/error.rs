use std::io;

use crate::parser::Location;

/// An error raised during evaluation. Every variant except I/O failure
/// carries the source position of the node that raised it.
#[derive(Debug)]
pub enum RuntimeError {
    UndefinedVariable { name: String, loc: Location },
    Redeclaration { name: String, loc: Location },
    AssignmentToUndeclared { name: String, loc: Location },
    UndefinedRecord { name: String, loc: Location },
    NotARecord { name: String, loc: Location },
    NotAFunction { name: String, loc: Location },
    ArgumentCount { name: String, expected: usize, found: usize, loc: Location },
    BadRefArgument { name: String, loc: Location },
    InvalidInput { name: String, loc: Location },
    IndexOutOfBounds { name: String, loc: Location },
    InvalidBounds { loc: Location },
    TypeMismatch { details: String, loc: Location },
    Io(io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndefinedVariable { name, loc } => {
                write!(f, "Runtime error at {loc}: '{name}' is not defined")
            }
            Self::Redeclaration { name, loc } => {
                write!(f, "Runtime error at {loc}: '{name}' is already declared in this scope")
            }
            Self::AssignmentToUndeclared { name, loc } => {
                write!(f, "Runtime error at {loc}: assignment to undeclared name '{name}'")
            }
            Self::UndefinedRecord { name, loc } => {
                write!(f, "Runtime error at {loc}: record type '{name}' is not defined")
            }
            Self::NotARecord { name, loc } => {
                write!(f, "Runtime error at {loc}: '{name}' is not a record")
            }
            Self::NotAFunction { name, loc } => {
                write!(f, "Runtime error at {loc}: '{name}' is not a function")
            }
            Self::ArgumentCount { name, expected, found, loc } => {
                write!(
                    f,
                    "Runtime error at {loc}: '{name}' takes {expected} argument(s), got {found}"
                )
            }
            Self::BadRefArgument { name, loc } => {
                write!(
                    f,
                    "Runtime error at {loc}: ref parameter '{name}' needs a plain variable argument"
                )
            }
            Self::InvalidInput { name, loc } => {
                write!(f, "Runtime error at {loc}: invalid input for '{name}'")
            }
            Self::IndexOutOfBounds { name, loc } => {
                write!(f, "Runtime error at {loc}: index out of bounds for '{name}'")
            }
            Self::InvalidBounds { loc } => {
                write!(f, "Runtime error at {loc}: upper bound below lower bound")
            }
            Self::TypeMismatch { details, loc } => {
                write!(f, "Runtime error at {loc}: {details}")
            }
            Self::Io(error) => write!(f, "Runtime error: {error}"),
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl std::error::Error for RuntimeError {}
