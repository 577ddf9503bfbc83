//! Common error types used throughout the crate.

use std::fmt;

use anybytes::view::ViewError;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type covering build-time and open-time failures.
///
/// Queries on a successfully opened [`GolombSet`](crate::GolombSet) never
/// fail; every byte string is a legal probe. All failure paths are therefore
/// concentrated in construction and in file validation.
#[derive(Debug)]
pub enum Error {
    /// An argument violated preconditions (`p < 2`, empty input set, ...).
    InvalidArgument(String),
    /// An input line could not be turned into an item (hex mode).
    BadInputLine {
        /// 1-based line number of the offending line.
        line: u64,
        /// What was wrong with it.
        reason: String,
    },
    /// Wrapper around [`std::io::Error`] values, with the byte offset in the
    /// output or input file at which the failure occurred.
    Io {
        /// Byte offset at which the read or write failed.
        offset: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file does not start with the `GCS1` magic.
    BadMagic,
    /// The header names a hash identity this build does not recognize.
    UnsupportedHash(u8),
    /// The file is shorter than its header implies.
    Truncated(String),
    /// Header parameters are malformed or mutually inconsistent.
    InvalidMetadata(String),
    /// The anchor table disagrees with the payload.
    InconsistentIndex(String),
    /// The builder could not allocate room for the bucket array.
    OutOfMemory,
    /// Wrapper around [`anybytes::ViewError`] values.
    View(ViewError),
}

impl Error {
    /// Creates an [`Error::InvalidArgument`] with the provided message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`Error::InvalidMetadata`] with the provided message.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Creates an [`Error::Truncated`] with the provided message.
    pub fn truncated(msg: impl Into<String>) -> Self {
        Self::Truncated(msg.into())
    }

    /// Creates an [`Error::InconsistentIndex`] with the provided message.
    pub fn inconsistent_index(msg: impl Into<String>) -> Self {
        Self::InconsistentIndex(msg.into())
    }

    /// Creates an [`Error::Io`] at the given byte offset.
    pub fn io(source: std::io::Error, offset: u64) -> Self {
        Self::Io { offset, source }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "{msg}"),
            Error::BadInputLine { line, reason } => {
                write!(f, "bad input on line {line}: {reason}")
            }
            Error::Io { offset, source } => {
                write!(f, "I/O error at byte offset {offset}: {source}")
            }
            Error::BadMagic => write!(f, "not a GCS file (bad magic)"),
            Error::UnsupportedHash(id) => write!(f, "unsupported hash identity {id}"),
            Error::Truncated(msg) => write!(f, "truncated file: {msg}"),
            Error::InvalidMetadata(msg) => write!(f, "invalid header: {msg}"),
            Error::InconsistentIndex(msg) => write!(f, "inconsistent index: {msg}"),
            Error::OutOfMemory => write!(f, "out of memory while holding the bucket array"),
            Error::View(err) => write!(f, "view error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::View(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ViewError> for Error {
    fn from(err: ViewError) -> Self {
        Error::View(err)
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}
