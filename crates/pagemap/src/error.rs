//! Error types for pagemap access.

use thiserror::Error;

/// Errors raised while building or reading the address-space model.
///
/// Per-page and per-byte read failures are deliberately *not* represented
/// here: those are absorbed by [`crate::reader::AddressSpaceReader`] and
/// surfaced as unavailable markers instead.
#[derive(Debug, Error)]
pub enum PagemapError {
    /// The target process no longer exists.
    #[error("process {0} does not exist")]
    NoProcess(i32),

    /// The mapping source could not be opened or read.
    #[error("cannot read memory mappings for process {pid}: {msg}")]
    NoMapInfo { pid: i32, msg: String },

    /// The process-memory source could not be opened.
    #[error("cannot read memory of process {pid}: {msg}")]
    NoMemInfo { pid: i32, msg: String },

    /// The address space holds more pages than the configured ceiling.
    #[error("too many pages: {count} (ceiling {max})")]
    TooManyPages { count: u64, max: u64 },

    /// The address space holds no pages at all.
    #[error("no pages mapped")]
    TooFewPages,

    /// The page array could not be allocated.
    #[error("failed to allocate page array for {0} pages")]
    AllocFailed(u64),

    /// I/O error outside the per-page read paths.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PagemapError {
    /// Process exit status for a session aborted by this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PagemapError::NoProcess(_) => 2,
            PagemapError::NoMapInfo { .. } => 3,
            PagemapError::NoMemInfo { .. } => 4,
            PagemapError::TooManyPages { .. } => 5,
            PagemapError::TooFewPages => 6,
            PagemapError::AllocFailed(_) => 7,
            PagemapError::Io(_) => 1,
        }
    }
}

pub type PagemapResult<T> = Result<T, PagemapError>;
