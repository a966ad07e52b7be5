//! Read-only memory-mapped byte window.
//!
//! The window keeps its own cursor, independent of the descriptor it was
//! mapped from. All cursor arithmetic is checked before the cursor moves,
//! so a rejected seek or read leaves the window exactly as it was.

use crate::error::{FileStreamError, Result};
use crate::stream::mode::Whence;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;

/// Memory-mapped view of a whole file plus a cursor into it
#[derive(Debug)]
pub struct MappedWindow {
    map: Mmap,
    position: u64,
}

impl MappedWindow {
    /// Map the first `size` bytes of `file` read-only
    ///
    /// The file is assumed not to grow or shrink while mapped.
    pub fn map(file: &File, size: u64) -> Result<Self> {
        let len = usize::try_from(size).map_err(|_| {
            FileStreamError::memory_mapping(format!("{} bytes exceed the address space", size))
        })?;

        let map = unsafe {
            MmapOptions::new()
                .len(len)
                .map(file)
                .map_err(|e| FileStreamError::memory_mapping(e.to_string()))?
        };

        #[cfg(unix)]
        {
            if let Err(e) = map.advise(memmap2::Advice::Sequential) {
                // Non-fatal
                log::debug!("failed to set mmap advice: {}", e);
            }
        }

        Ok(Self { map, position: 0 })
    }

    pub fn size(&self) -> u64 {
        self.map.len() as u64
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Copy from the cursor, truncating at the end of the window
    ///
    /// A cursor left past the end by a seek makes the read fail.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        let size = self.size();
        if self.position > size {
            return Err(FileStreamError::CursorOutOfRange {
                position: self.position,
                size,
            });
        }

        let start = self.position as usize;
        let n = dest.len().min(self.map.len() - start);
        dest[..n].copy_from_slice(&self.map[start..start + n]);
        self.position += n as u64;

        Ok(n)
    }

    /// The mapping is read-only; writes always fail
    pub fn write(&mut self, _src: &[u8]) -> Result<usize> {
        Err(FileStreamError::WriteWhileMapped)
    }

    /// Move the cursor, which may end up past the end of the window
    ///
    /// The cursor ranges over all of `u64`, so a Current seek is only
    /// rejected when it wraps; `Whence::Start` alone is capped at `i64::MAX`.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = match whence {
            Whence::Start => u64::try_from(offset).ok(),
            Whence::Current => self.position.checked_add_signed(offset),
            Whence::End => self.size().checked_add_signed(offset),
        };

        let target = target.ok_or_else(|| FileStreamError::seek_out_of_range(offset, whence))?;
        self.position = target;
        Ok(target)
    }
}
