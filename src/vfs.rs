//! Virtual file system indirection.
//!
//! A host redirects every stream operation by handing a [`Vfs`] to the
//! [`FileStreamFactory`](crate::FileStreamFactory) that builds its handles.
//! Callers keep using [`FileStream`](crate::FileStream) unchanged; the sticky
//! error flag, EOF test and line helpers are layered on top of whichever
//! backend is installed.

use crate::error::Result;
use crate::stream::{AccessHints, AccessMode, Strategy, Whence};
use std::path::Path;

pub mod memory;

pub use memory::MemoryVfs;

/// Minimum interface version a [`Vfs`] must report to be installed
pub const REQUIRED_VFS_VERSION: u32 = 1;

/// Per-handle operations a backend must provide
pub trait VfsFile: Send {
    /// Path the file was opened with
    fn path(&self) -> &Path;

    /// Total length in bytes
    fn size(&self) -> u64;

    /// Current position
    fn tell(&mut self) -> Result<u64>;

    /// Move the position, returning the new absolute position
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

    /// Read into `dest`; `Ok(0)` means end of file
    fn read(&mut self, dest: &mut [u8]) -> Result<usize>;

    fn write(&mut self, src: &[u8]) -> Result<usize>;

    fn flush(&mut self) -> Result<()>;

    /// Release every resource held by the file
    fn close(self: Box<Self>) -> Result<()>;

    /// Native strategy in use, if the backend has one
    fn strategy(&self) -> Option<Strategy> {
        None
    }
}

/// A file system that can open and delete files
pub trait Vfs: Send + Sync {
    /// Interface version implemented by this backend
    fn interface_version(&self) -> u32 {
        REQUIRED_VFS_VERSION
    }

    fn open(&self, path: &Path, mode: AccessMode, hints: AccessHints) -> Result<Box<dyn VfsFile>>;

    fn delete(&self, path: &Path) -> Result<()>;
}
