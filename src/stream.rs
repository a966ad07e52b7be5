//! File streams with three mutually exclusive access strategies.
//!
//! - [`buffered`] - stream I/O through a fixed 16 KiB buffer
//! - [`descriptor`] - raw, unbuffered descriptor calls
//! - [`mapped`] - read-only memory-mapped byte window
//!
//! [`native`] picks one of them at open time and dispatches to it;
//! [`handle`] layers the sticky error flag and line helpers on top.

pub mod buffered;
pub mod descriptor;
pub mod handle;
pub mod mapped;
pub mod mode;
pub mod native;

pub use buffered::STREAM_BUFFER_SIZE;
pub use handle::FileStream;
pub use mode::{resolve, AccessHints, AccessMode, Plan, Strategy, Whence};
pub use native::{NativeFile, NativeVfs};
