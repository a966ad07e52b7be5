//! Native backend: strategy dispatch against the operating system.
//!
//! [`NativeFile`] is a tagged variant over the three strategies. Each
//! variant carries only the state its strategy needs, and every operation is
//! a single `match` over the variant.

use crate::error::{FileStreamError, Result};
use crate::stream::buffered::BufferedStream;
use crate::stream::descriptor::Descriptor;
use crate::stream::mapped::MappedWindow;
use crate::stream::mode::{resolve, AccessHints, AccessMode, Strategy, Whence};
use crate::vfs::{Vfs, VfsFile};
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum Backend {
    Buffered(BufferedStream),
    Unbuffered(Descriptor),
    /// Window first: the mapping is released before the descriptor
    Mapped {
        window: MappedWindow,
        descriptor: Descriptor,
    },
}

/// A file opened directly against the operating system
#[derive(Debug)]
pub struct NativeFile {
    backend: Backend,
    /// Captured once at open time and never refreshed
    logical_size: u64,
    path: PathBuf,
}

impl NativeFile {
    /// Open `path`, selecting the strategy from `mode` and `hints`
    ///
    /// A failed mapping attempt is not an error: the stream silently
    /// continues as an unbuffered descriptor. Anything acquired before a
    /// failure is released before the error is returned.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode, hints: AccessHints) -> Result<Self> {
        let path = path.as_ref();
        if mode == AccessMode::UpdateExisting {
            return Err(FileStreamError::UnsupportedMode { mode });
        }

        let plan = resolve(mode, hints);
        let backend = match plan.strategy {
            Strategy::Buffered => Backend::Buffered(BufferedStream::open(path, mode)?),
            _ => {
                let descriptor = Descriptor::open(path, mode)?;
                if plan.try_map {
                    Self::map_or_fallback(path, descriptor)?
                } else {
                    Backend::Unbuffered(descriptor)
                }
            }
        };

        let mut file = Self {
            backend,
            logical_size: 0,
            path: path.to_path_buf(),
        };
        file.logical_size = file.probe_size()?;

        log::debug!(
            "opened {} as {:?} ({} bytes)",
            path.display(),
            file.strategy(),
            file.logical_size
        );
        Ok(file)
    }

    fn map_or_fallback(path: &Path, mut descriptor: Descriptor) -> Result<Backend> {
        let mapped_size = descriptor
            .seek(0, Whence::End)
            .and_then(|size| descriptor.seek(0, Whence::Start).map(|_| size))
            .map_err(|e| FileStreamError::SizeProbeFailed {
                path: path.to_path_buf(),
                source: e.into(),
            })?;

        match MappedWindow::map(descriptor.file(), mapped_size) {
            Ok(window) => Ok(Backend::Mapped { window, descriptor }),
            Err(e) => {
                log::debug!(
                    "falling back to unbuffered access for {}: {}",
                    path.display(),
                    e
                );
                Ok(Backend::Unbuffered(descriptor))
            }
        }
    }

    /// Seek to the end and back to learn the file length
    fn probe_size(&mut self) -> Result<u64> {
        let probe = self
            .seek(0, Whence::End)
            .and_then(|size| self.seek(0, Whence::Start).map(|_| size));

        probe.map_err(|e| FileStreamError::SizeProbeFailed {
            path: self.path.clone(),
            source: e.into(),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self.backend {
            Backend::Buffered(_) => Strategy::Buffered,
            Backend::Unbuffered(_) => Strategy::Unbuffered,
            Backend::Mapped { .. } => Strategy::MemoryMapped,
        }
    }

    /// Size recorded at open time
    ///
    /// Stale once this handle (or anyone else) changes the file length.
    pub fn size(&self) -> u64 {
        self.logical_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        match &mut self.backend {
            Backend::Buffered(stream) => stream.read(dest),
            Backend::Unbuffered(descriptor) => descriptor.read(dest),
            Backend::Mapped { window, .. } => window.read(dest),
        }
    }

    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        match &mut self.backend {
            Backend::Buffered(stream) => stream.write(src),
            Backend::Unbuffered(descriptor) => descriptor.write(src),
            Backend::Mapped { window, .. } => window.write(src),
        }
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        match &mut self.backend {
            Backend::Buffered(stream) => stream.seek(offset, whence),
            Backend::Unbuffered(descriptor) => descriptor.seek(offset, whence),
            Backend::Mapped { window, .. } => window.seek(offset, whence),
        }
    }

    pub fn tell(&mut self) -> Result<u64> {
        match &mut self.backend {
            Backend::Buffered(stream) => stream.tell(),
            Backend::Unbuffered(descriptor) => descriptor.tell(),
            Backend::Mapped { window, .. } => Ok(window.position()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Buffered(stream) => stream.flush(),
            Backend::Unbuffered(_) | Backend::Mapped { .. } => Ok(()),
        }
    }

    pub fn close(self) -> Result<()> {
        match self.backend {
            Backend::Buffered(stream) => stream.close(),
            Backend::Unbuffered(descriptor) => {
                drop(descriptor);
                Ok(())
            }
            Backend::Mapped { window, descriptor } => {
                drop(window);
                drop(descriptor);
                Ok(())
            }
        }
    }
}

impl VfsFile for NativeFile {
    fn path(&self) -> &Path {
        NativeFile::path(self)
    }

    fn size(&self) -> u64 {
        NativeFile::size(self)
    }

    fn tell(&mut self) -> Result<u64> {
        NativeFile::tell(self)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        NativeFile::seek(self, offset, whence)
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        NativeFile::read(self, dest)
    }

    fn write(&mut self, src: &[u8]) -> Result<usize> {
        NativeFile::write(self, src)
    }

    fn flush(&mut self) -> Result<()> {
        NativeFile::flush(self)
    }

    fn close(self: Box<Self>) -> Result<()> {
        NativeFile::close(*self)
    }

    fn strategy(&self) -> Option<Strategy> {
        Some(NativeFile::strategy(self))
    }
}

/// The default [`Vfs`]: files opened directly against the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeVfs;

impl Vfs for NativeVfs {
    fn open(&self, path: &Path, mode: AccessMode, hints: AccessHints) -> Result<Box<dyn VfsFile>> {
        Ok(Box::new(NativeFile::open(path, mode, hints)?))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).map_err(|e| {
            FileStreamError::file_error(format!("Failed to delete file: {}", path.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    #[test]
    fn test_strategy_selection() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_fixture(&dir, "data.bin", b"some bytes");

        let buffered = NativeFile::open(&path, AccessMode::Read, AccessHints::NONE).unwrap();
        assert_eq!(buffered.strategy(), Strategy::Buffered);

        let raw = NativeFile::open(&path, AccessMode::Read, AccessHints::UNBUFFERED).unwrap();
        assert_eq!(raw.strategy(), Strategy::Unbuffered);

        let mapped = NativeFile::open(&path, AccessMode::Read, AccessHints::MEMORY_MAP).unwrap();
        assert_eq!(mapped.strategy(), Strategy::MemoryMapped);

        let written = NativeFile::open(&path, AccessMode::Write, AccessHints::MEMORY_MAP).unwrap();
        assert_eq!(written.strategy(), Strategy::Buffered);
    }

    #[test]
    fn test_size_probed_at_open_and_position_rewound() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_fixture(&dir, "sized.bin", b"0123456789");

        for hints in [
            AccessHints::NONE,
            AccessHints::UNBUFFERED,
            AccessHints::MEMORY_MAP,
        ] {
            let mut file = NativeFile::open(&path, AccessMode::Read, hints).unwrap();
            assert_eq!(file.size(), 10);
            assert_eq!(file.tell().unwrap(), 0);
        }
    }

    #[test]
    fn test_size_is_not_refreshed_after_writes() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("growing.bin");

        let mut file = NativeFile::open(&path, AccessMode::Write, AccessHints::UNBUFFERED).unwrap();
        file.write(b"grown").unwrap();
        assert_eq!(file.size(), 0);
        assert_eq!(file.tell().unwrap(), 5);
    }

    #[test]
    fn test_write_while_mapped_fails() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_fixture(&dir, "ro.bin", b"read only");

        let mut file = NativeFile::open(&path, AccessMode::Read, AccessHints::MEMORY_MAP).unwrap();
        assert!(matches!(
            file.write(b"x"),
            Err(FileStreamError::WriteWhileMapped)
        ));
        file.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"read only");
    }

    #[test]
    fn test_update_existing_is_rejected() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_fixture(&dir, "update.bin", b"x");

        let result = NativeFile::open(&path, AccessMode::UpdateExisting, AccessHints::NONE);
        assert!(matches!(result, Err(FileStreamError::UnsupportedMode { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_mapping_falls_back_to_descriptor() {
        let dir = TempDir::new().expect("Failed to create temp directory");

        // Directories open read-only but cannot be mapped
        let file = NativeFile::open(dir.path(), AccessMode::Read, AccessHints::MEMORY_MAP).unwrap();
        assert_eq!(file.strategy(), Strategy::Unbuffered);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let missing = dir.path().join("missing.bin");

        for hints in [
            AccessHints::NONE,
            AccessHints::UNBUFFERED,
            AccessHints::MEMORY_MAP,
        ] {
            let result = NativeFile::open(&missing, AccessMode::Read, hints);
            assert!(matches!(result, Err(FileStreamError::OpenFailed { .. })));
        }
    }

    #[test]
    fn test_directory_cannot_be_opened_for_writing() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let result = NativeFile::open(dir.path(), AccessMode::Write, AccessHints::NONE);
        assert!(result.is_err());
    }

    #[test]
    fn test_native_vfs_delete() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_fixture(&dir, "doomed.bin", b"bye");

        NativeVfs.delete(&path).unwrap();
        assert!(!path.exists());
        assert!(NativeVfs.delete(&path).is_err());
    }
}
