//! Typed error handling for sqlmark.
//!
//! Three layers of errors:
//! - [`SqlmarkError`]: host-side failures (I/O, parsing, mapper XML, configuration)
//! - [`ResolveError`]: the only outcomes of `resolve` that reach the caller
//! - [`TraceError`]: per-branch failures inside the core, swallowed and logged

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sqlmark operations.
///
/// This provides typed errors that library consumers can match on,
/// unlike opaque `anyhow::Error` types.
#[derive(Error, Debug)]
pub enum SqlmarkError {
    /// I/O error when reading files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Syntax error when parsing Java source
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Malformed MyBatis mapper document
    #[error("Mapper error in {path}: {message}")]
    Mapper { path: PathBuf, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Resolution outcome that is not a success
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SqlmarkError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error without location.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a parse error with line/column info.
    pub fn parse_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a mapper document error.
    pub fn mapper(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Mapper {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (can continue analysis).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Mapper { .. } | Self::Config { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Mapper { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for sqlmark results.
pub type SqlmarkResult<T> = Result<T, SqlmarkError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> SqlmarkResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> SqlmarkResult<T> {
        self.map_err(|e| SqlmarkError::io(path, e))
    }
}

/// Outcome of a resolution request that is not a result set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The target API class name is absent or blank.
    #[error("target API class is not configured")]
    NotConfigured,

    /// The caller cancelled the request.
    #[error("resolution was cancelled")]
    Cancelled,
}

/// Failure of a single occurrence or sub-search.
///
/// Everything except [`TraceError::Cancelled`] is local: the branch that
/// produced it contributes nothing and resolution moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// A concatenation chain contains a link that cannot be evaluated.
    #[error("concatenation chain cannot be evaluated: {reason}")]
    AmbiguousChain { reason: String },

    /// A declaration or call target can no longer be resolved.
    #[error("stale reference: {what}")]
    StaleReference { what: String },

    /// Cancellation observed while tracing.
    #[error("trace cancelled")]
    Cancelled,
}

impl TraceError {
    pub fn ambiguous_chain(reason: impl Into<String>) -> Self {
        Self::AmbiguousChain {
            reason: reason.into(),
        }
    }

    pub fn stale(what: impl Into<String>) -> Self {
        Self::StaleReference { what: what.into() }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = SqlmarkError::io(
            PathBuf::from("/test/Dao.java"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, SqlmarkError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/Dao.java")));
        assert!(err.to_string().contains("/test/Dao.java"));
    }

    #[test]
    fn test_parse_error_with_location() {
        let err = SqlmarkError::parse_at("/src/Dao.java", "unexpected token", 10, 5);
        if let SqlmarkError::Parse { line, column, .. } = &err {
            assert_eq!(*line, Some(10));
            assert_eq!(*column, Some(5));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SqlmarkError::parse("/Dao.java", "error").is_recoverable());
        assert!(SqlmarkError::mapper("/UserMapper.xml", "bad tag").is_recoverable());
        assert!(!SqlmarkError::invalid_argument("empty statement").is_recoverable());
        assert!(!SqlmarkError::from(ResolveError::Cancelled).is_recoverable());
    }

    #[test]
    fn test_resolve_error_is_transparent() {
        let err = SqlmarkError::from(ResolveError::NotConfigured);
        assert_eq!(err.to_string(), "target API class is not configured");
        assert!(err.path().is_none());
    }

    #[test]
    fn test_trace_error_cancellation() {
        assert!(TraceError::Cancelled.is_cancellation());
        assert!(!TraceError::stale("field ID").is_cancellation());
        assert!(TraceError::ambiguous_chain("argument is not a literal")
            .to_string()
            .contains("argument is not a literal"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let sqlmark_result = result.with_path("/missing/Dao.java");
        assert!(sqlmark_result.is_err());
    }
}
