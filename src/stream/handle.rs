//! The [`FileStream`] handle.
//!
//! Wraps whichever [`VfsFile`] backend opened the file and adds the sticky
//! advisory error flag plus the EOF, character and line helpers. Every
//! operation that returns `Err` sets the flag; only [`FileStream::rewind`]
//! clears it.

use crate::error::{FileStreamError, Result};
use crate::stream::mode::{Strategy, Whence};
use crate::stream::native::NativeFile;
use crate::stream::{AccessHints, AccessMode};
use crate::vfs::VfsFile;
use std::fmt;
use std::io::SeekFrom;
use std::path::Path;

/// An open file session
pub struct FileStream {
    inner: Box<dyn VfsFile>,
    error_flag: bool,
}

impl FileStream {
    /// Open `path` directly against the operating system
    pub fn open(path: impl AsRef<Path>, mode: AccessMode, hints: AccessHints) -> Result<Self> {
        let file = NativeFile::open(path, mode, hints)?;
        Ok(Self::from_vfs_file(Box::new(file)))
    }

    /// Wrap a file produced by any [`Vfs`](crate::vfs::Vfs) backend
    pub fn from_vfs_file(inner: Box<dyn VfsFile>) -> Self {
        Self {
            inner,
            error_flag: false,
        }
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.error_flag = true;
        }
        result
    }

    /// Read up to `dest.len()` bytes; `Ok(0)` at end of file
    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        let result = self.inner.read(dest);
        self.track(result)
    }

    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        let result = self.inner.write(src);
        self.track(result)
    }

    /// Move the position, returning the new absolute position
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let result = self.inner.seek(offset, whence);
        self.track(result)
    }

    pub fn tell(&mut self) -> Result<u64> {
        let result = self.inner.tell();
        self.track(result)
    }

    /// Size recorded when the file was opened
    ///
    /// Not refreshed by later writes, from this handle or anyone else.
    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    pub fn flush(&mut self) -> Result<()> {
        let result = self.inner.flush();
        self.track(result)
    }

    /// Whether the position has reached the size recorded at open time
    pub fn is_eof(&mut self) -> Result<bool> {
        let position = self.tell()?;
        Ok(position >= self.size())
    }

    /// Seek to the start and clear the error flag
    ///
    /// The flag is cleared even if the seek itself fails.
    pub fn rewind(&mut self) {
        if let Err(e) = self.seek(0, Whence::Start) {
            log::debug!("rewind of {} failed: {}", self.path().display(), e);
        }
        self.error_flag = false;
    }

    /// Whether any operation has failed since open or the last rewind
    pub fn has_error(&self) -> bool {
        self.error_flag
    }

    /// Read exactly one byte; `None` at end of stream or on failure
    pub fn getc(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    /// Write exactly one byte
    pub fn putc(&mut self, byte: u8) -> Result<()> {
        match self.write(&[byte])? {
            1 => Ok(()),
            written => {
                let result = Err(FileStreamError::ShortWrite {
                    expected: 1,
                    written,
                });
                self.track(result)
            }
        }
    }

    /// Read a line into `dest`, keeping the newline and terminating with a zero
    ///
    /// At most `dest.len() - 1` bytes are read. Returns the number of bytes
    /// placed before the terminator, or `None` if nothing was placed.
    pub fn gets(&mut self, dest: &mut [u8]) -> Option<usize> {
        let capacity = dest.len().checked_sub(1)?;

        let mut placed = 0;
        while placed < capacity {
            let Some(byte) = self.getc() else {
                break;
            };
            dest[placed] = byte;
            placed += 1;
            if byte == b'\n' {
                break;
            }
        }
        dest[placed] = 0;

        (placed > 0).then_some(placed)
    }

    /// Read one line of any length, without its newline
    ///
    /// Returns `Ok(None)` when the stream is already at its end.
    pub fn getline(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.read(&mut byte)? {
                0 if line.is_empty() => return Ok(None),
                0 => break,
                _ if byte[0] == b'\n' => break,
                _ => line.push(byte[0]),
            }
        }

        Ok(Some(line))
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Native strategy, or `None` for a non-native backend
    pub fn strategy(&self) -> Option<Strategy> {
        self.inner.strategy()
    }

    /// Release the file and every resource it holds
    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path())
            .field("strategy", &self.strategy())
            .field("size", &self.size())
            .field("error_flag", &self.error_flag)
            .finish()
    }
}

impl std::io::Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        FileStream::read(self, buf).map_err(Into::into)
    }
}

impl std::io::Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        FileStream::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        FileStream::flush(self).map_err(Into::into)
    }
}

impl std::io::Seek for FileStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => match i64::try_from(offset) {
                Ok(offset) => (offset, Whence::Start),
                Err(_) => {
                    self.error_flag = true;
                    return Err(FileStreamError::invalid_argument(format!(
                        "absolute offset {} exceeds i64::MAX",
                        offset
                    ))
                    .into());
                }
            },
            SeekFrom::Current(offset) => (offset, Whence::Current),
            SeekFrom::End(offset) => (offset, Whence::End),
        };
        FileStream::seek(self, offset, whence).map_err(Into::into)
    }
}
