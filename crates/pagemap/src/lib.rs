//! Linux `/proc/<pid>/pagemap` access for live process introspection.
//!
//! This crate turns the kernel's page-table exposure interfaces into a
//! page-indexed model of one process address space:
//!
//! - Parsing of `/proc/<pid>/maps` into mapping records and a flat,
//!   densely packed page array ([`AddressSpaceModel`])
//! - Decoding of 64-bit pagemap entries into residency/dirty/swap flags
//!   ([`PageEntry`])
//! - Offset-seeked, per-page-fault-tolerant reads against the pagemap and
//!   mem pseudo-files ([`AddressSpaceReader`])
//! - Soft-dirty reset via `clear_refs` ([`ProcProcess`])
//!
//! # Example
//!
//! ```rust,ignore
//! use pagemap::{AddressSpaceModel, ProcProcess};
//!
//! let proc = ProcProcess::new(pid)?;
//! let mut model = AddressSpaceModel::new(pagemap::system_page_size(), 1 << 32);
//! model.refresh(&proc.read_maps()?, false)?;
//! let reader = proc.open_reader(model.page_size())?;
//! let entries = reader.read_entries(&model.pages()[..16]);
//! ```

pub mod error;
pub mod maps;
pub mod proc;
pub mod pte;
pub mod reader;

// Re-export key types at crate root.
pub use error::{PagemapError, PagemapResult};
pub use maps::{AddressSpaceModel, Mapping, Page, Refresh};
pub use proc::{system_page_size, ProcProcess};
pub use pte::{PageEntry, PageFlags};
pub use reader::{AddressSpaceReader, ByteSource, MemRead};
