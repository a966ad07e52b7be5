//! Factory for creating [`FileStream`] instances.
//!
//! The factory owns the [`Vfs`] that every handle it builds is routed
//! through. Hosts that need archives, network resources or a sandbox install
//! their own backend with [`FileStreamFactory::with_vfs`]; everyone else uses
//! the native backend.

use crate::error::{FileStreamError, Result};
use crate::stream::{AccessHints, AccessMode, FileStream, NativeVfs};
use crate::vfs::{Vfs, REQUIRED_VFS_VERSION};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Builds file streams through an injected [`Vfs`]
#[derive(Clone)]
pub struct FileStreamFactory {
    vfs: Arc<dyn Vfs>,
}

impl FileStreamFactory {
    /// Factory backed by the operating system
    pub fn native() -> Self {
        Self {
            vfs: Arc::new(NativeVfs),
        }
    }

    /// Factory backed by `vfs`
    ///
    /// A backend reporting an interface version older than
    /// [`REQUIRED_VFS_VERSION`] is not installed; the factory keeps using the
    /// native backend instead.
    pub fn with_vfs(vfs: Arc<dyn Vfs>) -> Self {
        let version = vfs.interface_version();
        if version < REQUIRED_VFS_VERSION {
            log::warn!(
                "ignoring vfs with interface version {} (need {})",
                version,
                REQUIRED_VFS_VERSION
            );
            return Self::native();
        }
        Self { vfs }
    }

    /// The backend every handle from this factory is routed through
    pub fn vfs(&self) -> &Arc<dyn Vfs> {
        &self.vfs
    }

    /// Open a stream; fails without a handle if the file cannot be acquired
    pub fn open(
        &self,
        path: impl AsRef<Path>,
        mode: AccessMode,
        hints: AccessHints,
    ) -> Result<FileStream> {
        let file = self.vfs.open(path.as_ref(), mode, hints)?;
        Ok(FileStream::from_vfs_file(file))
    }

    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        self.vfs.delete(path.as_ref())
    }

    /// Read a whole file into a zero-terminated buffer
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<FileContents> {
        let mut stream = self.open(path, AccessMode::Read, AccessHints::NONE)?;

        let size = usize::try_from(stream.size()).map_err(|_| {
            FileStreamError::invalid_argument("file is larger than the address space")
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(size + 1)
            .map_err(|_| FileStreamError::BufferAllocation { size: size + 1 })?;
        data.resize(size + 1, 0);

        let read = stream.read(&mut data[..size])?;
        stream.close()?;

        data.truncate(read + 1);
        data[read] = 0;
        Ok(FileContents { data })
    }

    /// Create or truncate `path` and write `data` to it
    pub fn write_file(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let mut stream = self.open(path, AccessMode::Write, AccessHints::NONE)?;
        let written = stream.write(data)?;
        stream.close()?;

        if written != data.len() {
            return Err(FileStreamError::ShortWrite {
                expected: data.len(),
                written,
            });
        }
        Ok(())
    }
}

impl Default for FileStreamFactory {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Debug for FileStreamFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStreamFactory")
            .field("interface_version", &self.vfs.interface_version())
            .finish()
    }
}

/// Whole-file contents followed by a terminating zero byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    /// Always ends with the terminator
    data: Vec<u8>,
}

impl FileContents {
    /// Number of bytes read, excluding the terminator
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// The buffer including the terminator
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Open a stream directly against the operating system
pub fn open(path: impl AsRef<Path>, mode: AccessMode, hints: AccessHints) -> Result<FileStream> {
    FileStream::open(path, mode, hints)
}

/// Delete a file from the operating system's file system
pub fn delete(path: impl AsRef<Path>) -> Result<()> {
    FileStreamFactory::native().delete(path)
}

/// Read a whole file into a zero-terminated buffer
pub fn read_file(path: impl AsRef<Path>) -> Result<FileContents> {
    FileStreamFactory::native().read_file(path)
}

/// Create or truncate `path` and write `data` to it
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    FileStreamFactory::native().write_file(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Strategy, Whence};
    use crate::vfs::{MemoryVfs, VfsFile};
    use tempfile::TempDir;

    struct LegacyVfs;

    impl Vfs for LegacyVfs {
        fn interface_version(&self) -> u32 {
            0
        }

        fn open(&self, _: &Path, _: AccessMode, _: AccessHints) -> Result<Box<dyn VfsFile>> {
            Err(FileStreamError::other("legacy backend used"))
        }

        fn delete(&self, _: &Path) -> Result<()> {
            Err(FileStreamError::other("legacy backend used"))
        }
    }

    #[test]
    fn test_read_file_appends_terminator() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let contents = read_file(&path).unwrap();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents.as_bytes(), b"hello");
        assert_eq!(contents.as_bytes_with_nul(), b"hello\0");
    }

    #[test]
    fn test_read_file_missing_path_fails() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        assert!(read_file(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_write_file_then_delete() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("out.txt");

        write_file(&path, b"payload").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");

        delete(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_operations_redirect_through_installed_vfs() {
        let memory = MemoryVfs::new();
        let factory = FileStreamFactory::with_vfs(Arc::new(memory.clone()));

        factory.write_file("/virtual/a.txt", b"abcde").unwrap();
        assert_eq!(memory.contents("/virtual/a.txt").unwrap(), b"abcde");

        let mut stream = factory
            .open("/virtual/a.txt", AccessMode::Read, AccessHints::MEMORY_MAP)
            .unwrap();
        assert_eq!(stream.strategy(), None);
        assert_eq!(stream.size(), 5);

        let mut buf = [0u8; 10];
        stream.seek(3, Whence::Start).unwrap();
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert!(stream.is_eof().unwrap());
        assert!(stream.write(b"x").is_err());
        assert!(stream.has_error());
        stream.close().unwrap();

        let contents = factory.read_file("/virtual/a.txt").unwrap();
        assert_eq!(contents.as_bytes_with_nul(), b"abcde\0");

        factory.delete("/virtual/a.txt").unwrap();
        assert!(factory.open("/virtual/a.txt", AccessMode::Read, AccessHints::NONE).is_err());
    }

    #[test]
    fn test_outdated_vfs_is_not_installed() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("native.txt");
        std::fs::write(&path, b"native").unwrap();

        let factory = FileStreamFactory::with_vfs(Arc::new(LegacyVfs));
        assert_eq!(factory.vfs().interface_version(), REQUIRED_VFS_VERSION);
        let stream = factory
            .open(&path, AccessMode::Read, AccessHints::NONE)
            .unwrap();
        assert_eq!(stream.strategy(), Some(Strategy::Buffered));
    }
}
