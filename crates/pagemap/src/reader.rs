//! Per-page reads against the pagemap and process-memory sources.
//!
//! All failures here are per-request and non-fatal: a failed seek or read
//! yields unavailable markers for the affected pages, never an error that
//! aborts the tick. The presenter renders those as "unknown".

use crate::maps::Page;
use crate::pte::PageEntry;
use std::fs::File;
use std::os::unix::fs::FileExt;
use tracing::debug;

/// Size of one pagemap entry in bytes.
const ENTRY_SIZE: u64 = 8;

/// A byte-addressable source supporting offset reads.
///
/// Shaped after the positioned-read half of a memory layer; `/proc`
/// pseudo-files return promptly and may return short reads, which are
/// treated as partial data, not retried.
pub trait ByteSource: Send {
    /// Read into `buf` starting at `offset`, returning the bytes read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize>;
}

impl ByteSource for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        FileExt::read_at(self, buf, offset)
    }
}

/// Result of a process-memory read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemRead {
    /// Bytes read from the target; may be shorter than requested.
    Bytes(Vec<u8>),
    /// The range could not be read (EOF, permissions); shown as unknown.
    Unavailable,
    /// No data needed: the address lies past the known end of the range.
    PastEnd,
}

/// Reads page-table entries and raw memory for pages of one target process.
pub struct AddressSpaceReader {
    entries: Box<dyn ByteSource>,
    mem: Box<dyn ByteSource>,
    page_size: u64,
}

impl AddressSpaceReader {
    pub fn new(entries: Box<dyn ByteSource>, mem: Box<dyn ByteSource>, page_size: u64) -> Self {
        AddressSpaceReader {
            entries,
            mem,
            page_size,
        }
    }

    /// Fetch the pagemap entry for each page in `pages`.
    ///
    /// Consecutive pages of the same mapping form one bulk read; a mapping
    /// boundary (or a zoom gap) forces a re-seek. Failed or short reads
    /// leave `None` for the pages not covered.
    pub fn read_entries(&self, pages: &[Page]) -> Vec<Option<PageEntry>> {
        let mut out = vec![None; pages.len()];
        let mut start = 0;
        while start < pages.len() {
            let mut end = start + 1;
            while end < pages.len()
                && pages[end].mapping == pages[start].mapping
                && pages[end].addr == pages[end - 1].addr + self.page_size
            {
                end += 1;
            }

            let offset = ENTRY_SIZE * (pages[start].addr / self.page_size);
            let mut buf = vec![0u8; (end - start) * ENTRY_SIZE as usize];
            match self.entries.read_at(offset, &mut buf) {
                Ok(n) => {
                    let whole = n - n % ENTRY_SIZE as usize;
                    for (k, chunk) in buf[..whole].chunks_exact(ENTRY_SIZE as usize).enumerate() {
                        out[start + k] = Some(PageEntry::from_le_bytes(chunk.try_into().unwrap()));
                    }
                }
                Err(e) => {
                    debug!(
                        "pagemap read failed at {:#x} ({} pages): {}",
                        pages[start].addr,
                        end - start,
                        e
                    );
                }
            }
            start = end;
        }
        out
    }

    /// Read `count` bytes of target memory starting at virtual address
    /// `addr`, bounded by `limit` (exclusive end of the valid range).
    pub fn read_bytes(&self, addr: u64, count: usize, limit: u64) -> MemRead {
        if addr >= limit {
            return MemRead::PastEnd;
        }
        let count = count.min((limit - addr) as usize);
        let mut buf = vec![0u8; count];
        match self.mem.read_at(addr, &mut buf) {
            Ok(0) => MemRead::Unavailable,
            Ok(n) => {
                buf.truncate(n);
                MemRead::Bytes(buf)
            }
            Err(e) => {
                debug!("memory read failed at {:#x}+{}: {}", addr, count, e);
                MemRead::Unavailable
            }
        }
    }
}
