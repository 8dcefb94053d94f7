use std::fmt::Display;

/// Custom Result type for FlatDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for FlatDB
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// SQL lexing/parsing error, the statement is rejected as a whole
    Parse(String),
    /// Table or column does not exist, already exists, or type mismatch
    Schema(String),
    /// Primary key or unique constraint violation
    Constraint(String),
    /// No row matches a primary key lookup
    NotFound(String),
    /// Valid SQL outside the supported subset
    Unsupported(String),
    /// Persistence read/write failure or corrupt table file
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(value: tempfile::PersistError) -> Self {
        Error::Io(value.error.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error: {}", err),
            Error::Schema(err) => write!(f, "schema error: {}", err),
            Error::Constraint(err) => write!(f, "constraint error: {}", err),
            Error::NotFound(err) => write!(f, "not found: {}", err),
            Error::Unsupported(err) => write!(f, "unsupported: {}", err),
            Error::Io(err) => write!(f, "io error: {}", err),
        }
    }
}
