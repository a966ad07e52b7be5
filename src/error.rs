//! Error types and handling infrastructure for filestream.
//!
//! This module provides a centralized error handling system using `thiserror`.
//! Every fallible stream operation returns [`Result`]; the handle layer
//! additionally records failures in its sticky error flag.
//!
//! ## Design Principles
//!
//! - **Actionable messages**: name the path or the offending offset
//! - **Context preservation**: keep the underlying `io::Error` as a source
//! - **Consistency**: one standardized Result type across all modules

use crate::stream::{AccessMode, Whence};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for filestream operations.
#[derive(Error, Debug)]
pub enum FileStreamError {
    /// File system related errors (permission denied, I/O failure, etc.)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The underlying open call failed
    #[error("Failed to open file: {path}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Seek-to-end/seek-to-start probe at open time failed
    #[error("Failed to determine size of file: {path}")]
    SizeProbeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fixed stream buffer could not be reserved
    #[error("Failed to allocate {size} byte stream buffer")]
    BufferAllocation { size: usize },

    /// Requested access mode has no implementation
    #[error("Access mode {mode:?} is not supported")]
    UnsupportedMode { mode: AccessMode },

    /// Memory mapping related errors
    #[error("Memory mapping failed: {message}")]
    MemoryMappingError { message: String },

    /// Write attempted on a read-only mapped handle
    #[error("Cannot write to a memory-mapped stream")]
    WriteWhileMapped,

    /// Seek arithmetic would leave the representable range
    #[error("Seek out of range: offset {offset} from {whence:?}")]
    SeekOutOfRange { offset: i64, whence: Whence },

    /// Cursor sits beyond the mapped window
    #[error("Cursor {position} is beyond the end of the {size} byte mapping")]
    CursorOutOfRange { position: u64, size: u64 },

    /// Fewer bytes were written than requested
    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for filestream operations.
pub type Result<T> = std::result::Result<T, FileStreamError>;

impl FileStreamError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a MemoryMappingError with a descriptive message
    pub fn memory_mapping(message: impl Into<String>) -> Self {
        Self::MemoryMappingError {
            message: message.into(),
        }
    }

    /// Create a SeekOutOfRange error for the rejected request
    pub fn seek_out_of_range(offset: i64, whence: Whence) -> Self {
        Self::SeekOutOfRange { offset, whence }
    }

    /// Create an InvalidArgument error with a descriptive message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Best matching `io::ErrorKind` for bridging into `std::io` traits
    pub fn kind(&self) -> std::io::ErrorKind {
        use std::io::ErrorKind;
        match self {
            Self::FileError { source, .. }
            | Self::OpenFailed { source, .. }
            | Self::SizeProbeFailed { source, .. } => source.kind(),
            Self::BufferAllocation { .. } => ErrorKind::OutOfMemory,
            Self::UnsupportedMode { .. } => ErrorKind::Unsupported,
            Self::SeekOutOfRange { .. } | Self::InvalidArgument { .. } => {
                ErrorKind::InvalidInput
            }
            Self::CursorOutOfRange { .. } => ErrorKind::UnexpectedEof,
            Self::WriteWhileMapped => ErrorKind::PermissionDenied,
            Self::ShortWrite { .. } => ErrorKind::WriteZero,
            Self::MemoryMappingError { .. } | Self::Other { .. } => ErrorKind::Other,
        }
    }
}

// Automatic conversion from io::Error to FileStreamError
impl From<std::io::Error> for FileStreamError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

impl From<FileStreamError> for std::io::Error {
    fn from(err: FileStreamError) -> Self {
        match err {
            FileStreamError::FileError { source, .. } => source,
            other => std::io::Error::new(other.kind(), other),
        }
    }
}
