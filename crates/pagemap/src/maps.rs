//! Mapping model — parses `/proc/<pid>/maps` into a page-indexed address space.
//!
//! Each accepted mapping contributes one [`Page`] per page-aligned step of its
//! range to a single flat array ordered by ascending address. That array is
//! the coordinate space the viewport scrolls over. A 64-bit sample checksum
//! gates rebuilds: identical maps text leaves the existing array untouched,
//! which is the dominant fast path during idle polling.

use crate::error::{PagemapError, PagemapResult};
use rustc_hash::FxHasher;
use std::hash::Hasher;
use tracing::{debug, warn};

/// One contiguous virtual address range of the target process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    /// Start of the range (inclusive, page-aligned).
    pub begin: u64,
    /// End of the range (exclusive).
    pub end: u64,
    /// Permission string as written in maps, e.g. `rwxp`.
    pub perms: String,
    /// Device identifier, e.g. `08:01`.
    pub device: String,
    /// Backing path; `None` for anonymous mappings.
    pub path: Option<String>,
}

impl Mapping {
    /// Length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }

    /// Whether `addr` falls inside `[begin, end)`.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.begin && addr < self.end
    }

    /// Final component of the backing path, or `[Anonymous]`.
    pub fn display_name(&self) -> &str {
        match self.path.as_deref() {
            Some(p) => p.rsplit('/').next().unwrap_or(p),
            None => "[Anonymous]",
        }
    }
}

/// One fixed-size page. `mapping` is an index into the mapping array of the
/// same sample, not a reference, so the whole page array can be replaced
/// atomically without dangling back-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// Page-aligned virtual address.
    pub addr: u64,
    /// Index of the owning mapping within the sample's mapping array.
    pub mapping: u32,
}

/// Outcome of a model refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// The maps text matched the previous sample; nothing was rebuilt.
    Unchanged,
    /// The mapping and page arrays were rebuilt wholesale.
    Rebuilt { mappings: usize, pages: u64 },
}

/// The page-indexed model of one process address space.
pub struct AddressSpaceModel {
    page_size: u64,
    max_pages: u64,
    mappings: Vec<Mapping>,
    pages: Vec<Page>,
    checksum: u64,
}

impl AddressSpaceModel {
    /// Create an empty model.
    ///
    /// `max_pages` is the ceiling above which a refresh fails with
    /// [`PagemapError::TooManyPages`].
    pub fn new(page_size: u64, max_pages: u64) -> Self {
        assert!(page_size.is_power_of_two(), "page size must be a power of two");
        AddressSpaceModel {
            page_size,
            max_pages,
            mappings: Vec::new(),
            pages: Vec::new(),
            checksum: 0,
        }
    }

    /// Re-parse a maps text and rebuild the page array if it changed.
    ///
    /// Malformed lines and corrupt ranges (`end < begin`) are skipped, not
    /// fatal. When the sample checksum matches the previous accepted sample
    /// and `force` is false, returns [`Refresh::Unchanged`] without touching
    /// the existing arrays.
    pub fn refresh(&mut self, maps_text: &str, force: bool) -> PagemapResult<Refresh> {
        let mut mappings: Vec<Mapping> = Vec::new();
        let mut total: u64 = 0;

        for line in maps_text.lines() {
            let mapping = match parse_mapping_line(line) {
                Some(m) => m,
                None => {
                    if !line.trim().is_empty() {
                        debug!("skipping malformed maps line: {:?}", line);
                    }
                    continue;
                }
            };
            if mappings.len() > u32::MAX as usize {
                warn!("mapping count exceeds index range, ignoring remainder");
                break;
            }
            let span = mapping.len() / self.page_size;
            match total.checked_add(span) {
                Some(sum) => {
                    total = sum;
                    mappings.push(mapping);
                }
                None => {
                    // Soft data-quality issue: drop this mapping, keep going.
                    warn!(
                        "page count overflow at mapping {:#x}-{:#x}, skipping",
                        mapping.begin, mapping.end
                    );
                }
            }
        }

        let checksum = sample_checksum(&mappings);
        if !force && checksum == self.checksum && !self.pages.is_empty() {
            return Ok(Refresh::Unchanged);
        }

        if total == 0 {
            return Err(PagemapError::TooFewPages);
        }
        if total > self.max_pages {
            return Err(PagemapError::TooManyPages {
                count: total,
                max: self.max_pages,
            });
        }

        let mut pages: Vec<Page> = Vec::new();
        pages
            .try_reserve_exact(total as usize)
            .map_err(|_| PagemapError::AllocFailed(total))?;

        for (index, mapping) in mappings.iter().enumerate() {
            let mut addr = mapping.begin;
            while addr < mapping.end {
                pages.push(Page {
                    addr,
                    mapping: index as u32,
                });
                addr += self.page_size;
            }
        }
        debug_assert_eq!(pages.len() as u64, total);

        debug!(
            "rebuilt address space: {} mappings, {} pages",
            mappings.len(),
            total
        );
        self.mappings = mappings;
        self.pages = pages;
        self.checksum = checksum;
        Ok(Refresh::Rebuilt {
            mappings: self.mappings.len(),
            pages: total,
        })
    }

    /// The flat page array of the current sample, ordered by address.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The mapping records of the current sample, in source order.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Number of pages in the current sample.
    pub fn page_count(&self) -> u64 {
        self.pages.len() as u64
    }

    /// Configured page size in bytes.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Total addressable bytes across the packed page sequence.
    pub fn total_bytes(&self) -> u64 {
        self.page_count() * self.page_size
    }

    /// The mapping owning `page`, if the index is still in range.
    pub fn mapping_of(&self, page: &Page) -> Option<&Mapping> {
        self.mappings.get(page.mapping as usize)
    }
}

/// Parse one maps line:
/// `<begin>-<end> <perms> <offset> <dev> <inode> [<path>]`.
///
/// Only begin, end, the permission prefix, the device string, and the
/// optional trailing path are consumed. Returns `None` for anything that
/// does not parse or where `end < begin`.
fn parse_mapping_line(line: &str) -> Option<Mapping> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;
    let _offset = fields.next()?;
    let device = fields.next()?;
    let _inode = fields.next()?;

    let (begin_s, end_s) = range.split_once('-')?;
    let begin = u64::from_str_radix(begin_s, 16).ok()?;
    let end = u64::from_str_radix(end_s, 16).ok()?;
    if end < begin || perms.len() < 4 {
        return None;
    }

    // The path is everything after the inode column; it may contain spaces.
    let path = line
        .splitn(6, ' ')
        .nth(5)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned);

    Some(Mapping {
        begin,
        end,
        perms: perms[..4].to_owned(),
        device: device.to_owned(),
        path,
    })
}

/// Fold a sample into a 64-bit checksum.
///
/// Identical input must give an identical checksum; a changed input should be
/// overwhelmingly likely to differ. A collision shows a stale view for one
/// sample, never corruption, so a fast non-cryptographic fold is enough.
fn sample_checksum(mappings: &[Mapping]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(mappings.len());
    for m in mappings {
        hasher.write_u64(m.begin);
        hasher.write_u64(m.end);
        hasher.write(m.perms.as_bytes());
        hasher.write_u64(m.len());
    }
    hasher.finish()
}
