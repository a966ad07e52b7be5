//! In-memory sandbox file system.
//!
//! Every file lives in a shared map. An open handle works on a private copy
//! of the file and commits it back on flush and on close, so readers opened
//! earlier keep seeing the contents they opened.

use crate::error::{FileStreamError, Result};
use crate::stream::{AccessHints, AccessMode, Whence};
use crate::vfs::{Vfs, VfsFile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type FileTable = Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>;

/// A [`Vfs`] whose files never touch the disk
///
/// Clones share the same file table.
#[derive(Debug, Default, Clone)]
pub struct MemoryVfs {
    files: FileTable,
}

impl MemoryVfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), content.into());
    }

    /// Snapshot of a file's committed contents
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.lock().contains_key(path.as_ref())
    }
}

impl Vfs for MemoryVfs {
    fn open(&self, path: &Path, mode: AccessMode, _hints: AccessHints) -> Result<Box<dyn VfsFile>> {
        let not_found = || FileStreamError::OpenFailed {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::NotFound, "no such file in memory vfs"),
        };

        let data = {
            let mut files = self.files.lock();
            match mode {
                AccessMode::Read | AccessMode::ReadWrite => {
                    files.get(path).cloned().ok_or_else(not_found)?
                }
                AccessMode::Write => {
                    files.insert(path.to_path_buf(), Vec::new());
                    Vec::new()
                }
                AccessMode::UpdateExisting => {
                    return Err(FileStreamError::UnsupportedMode { mode });
                }
            }
        };

        Ok(Box::new(MemoryFile {
            files: Arc::clone(&self.files),
            path: path.to_path_buf(),
            size: data.len() as u64,
            data,
            position: 0,
            mode,
            dirty: false,
        }))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        match self.files.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(FileStreamError::file_error(
                format!("Failed to delete file: {}", path.display()),
                std::io::Error::new(ErrorKind::NotFound, "no such file in memory vfs"),
            )),
        }
    }
}

#[derive(Debug)]
struct MemoryFile {
    files: FileTable,
    path: PathBuf,
    data: Vec<u8>,
    position: u64,
    /// Length at open time
    size: u64,
    mode: AccessMode,
    dirty: bool,
}

impl MemoryFile {
    fn denied(operation: &str) -> FileStreamError {
        FileStreamError::file_error(
            format!("File not opened for {}", operation),
            std::io::Error::new(ErrorKind::PermissionDenied, "access mode mismatch"),
        )
    }

    fn commit(&mut self) {
        if self.dirty {
            self.files.lock().insert(self.path.clone(), self.data.clone());
            self.dirty = false;
        }
    }
}

impl VfsFile for MemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.position)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = match whence {
            Whence::Start => u64::try_from(offset).ok(),
            Whence::Current => self.position.checked_add_signed(offset),
            Whence::End => (self.data.len() as u64).checked_add_signed(offset),
        };

        self.position = target.ok_or_else(|| FileStreamError::seek_out_of_range(offset, whence))?;
        Ok(self.position)
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        if self.mode == AccessMode::Write {
            return Err(Self::denied("reading"));
        }

        let len = self.data.len() as u64;
        if self.position >= len {
            return Ok(0);
        }

        let start = self.position as usize;
        let n = dest.len().min(self.data.len() - start);
        dest[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> Result<usize> {
        if self.mode == AccessMode::Read {
            return Err(Self::denied("writing"));
        }

        let start = usize::try_from(self.position)
            .map_err(|_| FileStreamError::invalid_argument("position exceeds address space"))?;
        let end = start
            .checked_add(src.len())
            .ok_or_else(|| FileStreamError::invalid_argument("write extends past address space"))?;
        if self.data.len() < end {
            self.data
                .try_reserve(end - self.data.len())
                .map_err(|_| FileStreamError::BufferAllocation { size: end })?;
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(src);
        self.position = end as u64;
        self.dirty = true;
        Ok(src.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.commit();
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_commits_on_close() {
        let vfs = MemoryVfs::new();
        let mut file = vfs
            .open(Path::new("/notes"), AccessMode::Write, AccessHints::NONE)
            .unwrap();

        file.write(b"hello").unwrap();
        assert_eq!(vfs.contents("/notes").unwrap(), b"");

        file.close().unwrap();
        assert_eq!(vfs.contents("/notes").unwrap(), b"hello");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let vfs = MemoryVfs::new();
        let result = vfs.open(Path::new("/absent"), AccessMode::Read, AccessHints::NONE);
        assert!(matches!(result, Err(FileStreamError::OpenFailed { .. })));
    }

    #[test]
    fn test_mode_enforcement() {
        let vfs = MemoryVfs::new();
        vfs.insert("/ro", b"data".to_vec());

        let mut reader = vfs
            .open(Path::new("/ro"), AccessMode::Read, AccessHints::NONE)
            .unwrap();
        assert!(reader.write(b"x").is_err());

        let mut writer = vfs
            .open(Path::new("/wo"), AccessMode::Write, AccessHints::NONE)
            .unwrap();
        let mut buf = [0u8; 4];
        assert!(writer.read(&mut buf).is_err());
    }

    #[test]
    fn test_sparse_write_zero_fills() {
        let vfs = MemoryVfs::new();
        vfs.insert("/sparse", b"ab".to_vec());

        let mut file = vfs
            .open(Path::new("/sparse"), AccessMode::ReadWrite, AccessHints::NONE)
            .unwrap();
        file.seek(4, Whence::Start).unwrap();
        file.write(b"z").unwrap();
        file.flush().unwrap();

        assert_eq!(vfs.contents("/sparse").unwrap(), b"ab\0\0z");
        assert_eq!(file.size(), 2);
    }

    #[test]
    fn test_write_far_past_end_fails_cleanly() {
        let vfs = MemoryVfs::new();
        let mut file = vfs
            .open(Path::new("/huge"), AccessMode::Write, AccessHints::NONE)
            .unwrap();

        file.seek(i64::MAX, Whence::Start).unwrap();
        assert!(matches!(
            file.write(b"x"),
            Err(FileStreamError::BufferAllocation { .. } | FileStreamError::InvalidArgument { .. })
        ));
        assert_eq!(file.tell().unwrap(), i64::MAX as u64);

        file.seek(0, Whence::Start).unwrap();
        assert_eq!(file.write(b"ok").unwrap(), 2);
        file.close().unwrap();
        assert_eq!(vfs.contents("/huge").unwrap(), b"ok");
    }

    #[test]
    fn test_delete() {
        let vfs = MemoryVfs::new();
        vfs.insert("/gone", b"x".to_vec());

        vfs.delete(Path::new("/gone")).unwrap();
        assert!(!vfs.contains("/gone"));
        assert!(vfs.delete(Path::new("/gone")).is_err());
    }
}
