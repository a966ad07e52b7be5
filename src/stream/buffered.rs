//! Fully buffered stream I/O over a fixed, owned buffer.
//!
//! The buffer is reserved once when the stream is opened and is never
//! grown, so memory use per stream is constant. It holds either read-ahead
//! or pending writes, never both; switching direction reconciles it with the
//! OS cursor first.

use crate::error::{FileStreamError, Result};
use crate::stream::descriptor::{read_retrying, seek_from};
use crate::stream::mode::{AccessMode, Whence};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Size of the stream buffer backing every buffered stream
pub const STREAM_BUFFER_SIZE: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    Idle,
    /// `buffer[pos..filled]` is read-ahead not yet handed to the caller
    Reading { pos: usize, filled: usize },
    /// `buffer[..len]` has not reached the file yet
    Writing { len: usize },
}

/// Buffered stream over an owned file
///
/// Field order is release order: the file is closed before the buffer is
/// freed.
pub struct BufferedStream {
    file: File,
    buffer: Box<[u8]>,
    state: BufferState,
}

impl BufferedStream {
    /// Open `path` with stream semantics for `mode`
    ///
    /// * Read: existing file, read only
    /// * Write: create or truncate, write only
    /// * ReadWrite: create or truncate, read and write
    pub fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let options = open_options(mode)?;
        let buffer = allocate_buffer()?;
        let file = options
            .open(path)
            .map_err(|source| FileStreamError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            file,
            buffer,
            state: BufferState::Idle,
        })
    }

    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.flush_buffer()?;

        let capacity = self.buffer.len();
        let mut copied = 0;

        while copied < dest.len() {
            if let BufferState::Reading { pos, filled } = &mut self.state {
                if *pos < *filled {
                    let n = (*filled - *pos).min(dest.len() - copied);
                    dest[copied..copied + n].copy_from_slice(&self.buffer[*pos..*pos + n]);
                    *pos += n;
                    copied += n;
                    continue;
                }
            }
            self.state = BufferState::Idle;

            let remaining = &mut dest[copied..];
            let result = if remaining.len() >= capacity {
                read_retrying(&mut self.file, remaining)
            } else {
                read_retrying(&mut self.file, &mut self.buffer).map(|n| {
                    if n > 0 {
                        self.state = BufferState::Reading { pos: 0, filled: n };
                    }
                    0
                })
            };

            match result {
                Ok(0) if self.state == BufferState::Idle => break,
                Ok(n) => copied += n,
                // Bytes already handed over are not lost to a later failure
                Err(e) if copied > 0 => {
                    log::trace!("buffered read stopped after {} bytes: {}", copied, e);
                    break;
                }
                Err(e) => return Err(FileStreamError::file_error("Buffered read failed", e)),
            }
        }

        Ok(copied)
    }

    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        if src.is_empty() {
            return Ok(0);
        }
        self.discard_read_ahead()?;

        let capacity = self.buffer.len();
        let mut len = match self.state {
            BufferState::Writing { len } => len,
            _ => 0,
        };

        if len + src.len() > capacity {
            self.flush_buffer()?;
            len = 0;
        }

        if src.len() >= capacity {
            self.file
                .write_all(src)
                .map_err(|e| FileStreamError::file_error("Buffered write failed", e))?;
            return Ok(src.len());
        }

        self.buffer[len..len + src.len()].copy_from_slice(src);
        self.state = BufferState::Writing {
            len: len + src.len(),
        };
        Ok(src.len())
    }

    pub fn tell(&mut self) -> Result<u64> {
        let os_position = self
            .file
            .stream_position()
            .map_err(|e| FileStreamError::file_error("Stream position query failed", e))?;

        Ok(match self.state {
            BufferState::Idle => os_position,
            BufferState::Reading { pos, filled } => os_position - (filled - pos) as u64,
            BufferState::Writing { len } => os_position + len as u64,
        })
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = seek_from(offset, whence)?;
        self.flush_buffer()?;
        self.discard_read_ahead()?;

        self.file
            .seek(target)
            .map_err(|e| FileStreamError::file_error("Stream seek failed", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.file
            .flush()
            .map_err(|e| FileStreamError::file_error("Stream flush failed", e))
    }

    /// Flush pending writes and release the file, then the buffer
    pub fn close(mut self) -> Result<()> {
        let result = self.flush_buffer();
        // Drop must not retry a flush that already failed
        self.state = BufferState::Idle;
        result
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Push pending writes to the file; leaves the state untouched on failure
    fn flush_buffer(&mut self) -> Result<()> {
        if let BufferState::Writing { len } = self.state {
            if len > 0 {
                self.file
                    .write_all(&self.buffer[..len])
                    .map_err(|e| FileStreamError::file_error("Stream flush failed", e))?;
            }
            self.state = BufferState::Idle;
        }
        Ok(())
    }

    /// Move the OS cursor back over unread read-ahead
    fn discard_read_ahead(&mut self) -> Result<()> {
        if let BufferState::Reading { pos, filled } = self.state {
            let unread = (filled - pos) as i64;
            if unread > 0 {
                log::trace!("discarding {} bytes of read-ahead", unread);
                self.file
                    .seek(SeekFrom::Current(-unread))
                    .map_err(|e| FileStreamError::file_error("Stream seek failed", e))?;
            }
            self.state = BufferState::Idle;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BufferedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedStream")
            .field("file", &self.file)
            .field("capacity", &self.buffer.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for BufferedStream {
    fn drop(&mut self) {
        if let Err(e) = self.flush_buffer() {
            log::warn!("dropping buffered stream with unflushed data: {}", e);
        }
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
        }
        AccessMode::ReadWrite => {
            options.read(true).write(true).create(true).truncate(true);
        }
        AccessMode::UpdateExisting => return Err(FileStreamError::UnsupportedMode { mode }),
    }
    Ok(options)
}

fn allocate_buffer() -> Result<Box<[u8]>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(STREAM_BUFFER_SIZE)
        .map_err(|_| FileStreamError::BufferAllocation {
            size: STREAM_BUFFER_SIZE,
        })?;
    buffer.resize(STREAM_BUFFER_SIZE, 0);
    Ok(buffer.into_boxed_slice())
}
