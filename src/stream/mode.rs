//! Access modes, hints and strategy selection.
//!
//! A stream's strategy is decided once, at open time, from the requested
//! [`AccessMode`] and [`AccessHints`]. [`resolve`] owns that decision so the
//! backends never have to reinterpret the caller's flags.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// How the file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum AccessMode {
    /// Existing file, read only
    Read,
    /// Create or truncate, write only
    Write,
    /// Read and write
    ReadWrite,
    /// Open an existing file for in-place update (not implemented)
    UpdateExisting,
}

/// Caller-supplied flags influencing strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AccessHints {
    /// Bypass the stream buffer and talk to the descriptor directly
    pub unbuffered: bool,
    /// Map the file read-only when opened for reading
    pub memory_map: bool,
}

impl AccessHints {
    pub const NONE: Self = Self {
        unbuffered: false,
        memory_map: false,
    };

    pub const UNBUFFERED: Self = Self {
        unbuffered: true,
        memory_map: false,
    };

    pub const MEMORY_MAP: Self = Self {
        unbuffered: false,
        memory_map: true,
    };

    pub fn with_unbuffered(mut self, unbuffered: bool) -> Self {
        self.unbuffered = unbuffered;
        self
    }

    pub fn with_memory_map(mut self, memory_map: bool) -> Self {
        self.memory_map = memory_map;
        self
    }
}

/// Reference point for a seek offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// The I/O implementation bound to a native stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Stream I/O through a fixed user-space buffer
    Buffered,
    /// Raw descriptor calls, no buffering
    Unbuffered,
    /// Read-only byte window over a memory mapping
    MemoryMapped,
}

/// Outcome of strategy selection, before any resource is acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Whether a mapping should be attempted once the descriptor is open
    pub try_map: bool,
    /// Buffered or Unbuffered; MemoryMapped is only reached via `try_map`
    pub strategy: Strategy,
}

/// Decide how a stream should be opened
///
/// Mapping is only attempted for [`AccessMode::Read`] with the memory-map
/// hint, and forces unbuffered access since the mapping needs the raw
/// descriptor. For every other combination the memory-map hint is dropped
/// and the unbuffered hint alone picks the strategy.
pub fn resolve(mode: AccessMode, hints: AccessHints) -> Plan {
    let try_map = hints.memory_map && mode == AccessMode::Read;
    let strategy = if try_map || hints.unbuffered {
        Strategy::Unbuffered
    } else {
        Strategy::Buffered
    };

    Plan { try_map, strategy }
}
