//! Unbuffered descriptor access.
//!
//! Every operation is a single call on the owned [`File`]. No bytes are held
//! in user space between calls, so short reads/writes come back as-is.

use crate::error::{FileStreamError, Result};
use crate::stream::mode::{AccessMode, Whence};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Raw descriptor owned exclusively by one stream
#[derive(Debug)]
pub struct Descriptor {
    file: File,
}

impl Descriptor {
    /// Open `path` with the descriptor flags for `mode`
    ///
    /// * Read: read-only, never truncates
    /// * Write: write-only, create, truncate (0600 on Unix)
    /// * ReadWrite: read-write on an existing file
    pub fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let file = open_options(mode)?
            .open(path)
            .map_err(|source| FileStreamError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        read_retrying(&mut self.file, dest)
            .map_err(|e| FileStreamError::file_error("Descriptor read failed", e))
    }

    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        loop {
            match self.file.write(src) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FileStreamError::file_error("Descriptor write failed", e)),
            }
        }
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = seek_from(offset, whence)?;
        self.file
            .seek(target)
            .map_err(|e| FileStreamError::file_error("Descriptor seek failed", e))
    }

    pub fn tell(&mut self) -> Result<u64> {
        self.file
            .stream_position()
            .map_err(|e| FileStreamError::file_error("Descriptor position query failed", e))
    }
}

fn open_options(mode: AccessMode) -> Result<OpenOptions> {
    let mut options = OpenOptions::new();
    match mode {
        AccessMode::Read => {
            options.read(true);
        }
        AccessMode::Write => {
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
        }
        AccessMode::ReadWrite => {
            options.read(true).write(true);
        }
        AccessMode::UpdateExisting => return Err(FileStreamError::UnsupportedMode { mode }),
    }
    Ok(options)
}

/// Translate a signed offset into `SeekFrom`, rejecting negative absolute offsets
pub(crate) fn seek_from(offset: i64, whence: Whence) -> Result<SeekFrom> {
    match whence {
        Whence::Start => u64::try_from(offset)
            .map(SeekFrom::Start)
            .map_err(|_| FileStreamError::seek_out_of_range(offset, whence)),
        Whence::Current => Ok(SeekFrom::Current(offset)),
        Whence::End => Ok(SeekFrom::End(offset)),
    }
}

/// One `read` call, retried only when interrupted by a signal
pub(crate) fn read_retrying(file: &mut File, dest: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match file.read(dest) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_mode_creates_and_truncates() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"previous contents").unwrap();

        let mut fd = Descriptor::open(&path, AccessMode::Write).unwrap();
        assert_eq!(fd.write(b"new").unwrap(), 3);
        drop(fd);

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_mode_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("private.bin");
        Descriptor::open(&path, AccessMode::Write).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_read_write_requires_existing_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("absent.bin");

        let result = Descriptor::open(&path, AccessMode::ReadWrite);
        assert!(matches!(result, Err(FileStreamError::OpenFailed { .. })));
    }

    #[test]
    fn test_read_write_keeps_contents() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("rw.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut fd = Descriptor::open(&path, AccessMode::ReadWrite).unwrap();
        assert_eq!(fd.seek(4, Whence::Start).unwrap(), 4);
        fd.write(b"xy").unwrap();
        assert_eq!(fd.tell().unwrap(), 6);

        let mut rest = [0u8; 8];
        let n = fd.read(&mut rest).unwrap();
        assert_eq!(&rest[..n], b"6789");
        drop(fd);

        assert_eq!(std::fs::read(&path).unwrap(), b"0123xy6789");
    }

    #[test]
    fn test_negative_seeks() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("seek.bin");
        std::fs::write(&path, b"abcdef").unwrap();

        let mut fd = Descriptor::open(&path, AccessMode::Read).unwrap();
        fd.seek(2, Whence::Start).unwrap();

        assert!(matches!(
            fd.seek(-1, Whence::Start),
            Err(FileStreamError::SeekOutOfRange { .. })
        ));
        assert!(fd.seek(-3, Whence::Current).is_err());
        assert_eq!(fd.tell().unwrap(), 2);

        assert_eq!(fd.seek(-2, Whence::End).unwrap(), 4);
        assert_eq!(fd.seek(-1, Whence::Current).unwrap(), 3);
    }

    #[test]
    fn test_update_existing_is_unsupported() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let result = Descriptor::open(&dir.path().join("x"), AccessMode::UpdateExisting);
        assert!(matches!(
            result,
            Err(FileStreamError::UnsupportedMode {
                mode: AccessMode::UpdateExisting
            })
        ));
    }
}
