//! # filestream - Platform-Neutral File Streams
//!
//! A single file handle type, [`FileStream`], with three selectable access
//! strategies and a pluggable virtual file system underneath.
//!
//! ## Features
//!
//! - **Buffered streams**: full buffering through a fixed 16 KiB buffer
//! - **Unbuffered descriptors**: direct OS calls with no coalescing
//! - **Memory mapping**: read-only mapped windows with bounds-checked cursors
//! - **VFS indirection**: redirect every operation to archives, network
//!   resources or sandboxed storage without touching call sites
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`stream`] - Strategy selection, the three backends and the handle
//! - [`vfs`] - Backend traits and the in-memory sandbox
//! - [`factory`] - Handle construction and whole-file helpers
//!
//! ```no_run
//! use filestream::{AccessHints, AccessMode, FileStream};
//!
//! let mut stream = FileStream::open("data.bin", AccessMode::Read, AccessHints::MEMORY_MAP)?;
//! let mut header = [0u8; 16];
//! let n = stream.read(&mut header)?;
//! assert!(n <= header.len());
//! # Ok::<(), filestream::FileStreamError>(())
//! ```

// Core modules
pub mod error;
pub mod stream;
pub mod vfs;

// Handle construction
pub mod factory;

#[cfg(feature = "config")]
pub mod config;

// Re-export commonly used types for convenience
pub use error::{FileStreamError, Result};

pub use factory::{delete, open, read_file, write_file, FileContents, FileStreamFactory};
pub use stream::{AccessHints, AccessMode, FileStream, Strategy, Whence};
pub use vfs::{MemoryVfs, Vfs, VfsFile};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
