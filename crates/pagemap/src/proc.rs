//! `/proc/<pid>` plumbing for one target process.

use crate::error::{PagemapError, PagemapResult};
use crate::reader::AddressSpaceReader;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Code written to `clear_refs` to reset soft-dirty tracking.
const CLEAR_SOFT_DIRTY: &[u8] = b"4";

/// Paths and liveness checks for one monitored process. Read-only access
/// throughout except for the soft-dirty reset sink.
pub struct ProcProcess {
    pid: i32,
    maps_path: PathBuf,
    pagemap_path: PathBuf,
    mem_path: PathBuf,
    clear_refs_path: PathBuf,
}

impl ProcProcess {
    /// Bind to a pid; fails if the process does not exist.
    pub fn new(pid: i32) -> PagemapResult<Self> {
        let proc = ProcProcess {
            pid,
            maps_path: PathBuf::from(format!("/proc/{pid}/maps")),
            pagemap_path: PathBuf::from(format!("/proc/{pid}/pagemap")),
            mem_path: PathBuf::from(format!("/proc/{pid}/mem")),
            clear_refs_path: PathBuf::from(format!("/proc/{pid}/clear_refs")),
        };
        if !proc.alive() {
            return Err(PagemapError::NoProcess(pid));
        }
        Ok(proc)
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Whether the target still exists. Signal 0 probes without delivering;
    /// EPERM still means the process is there.
    pub fn alive(&self) -> bool {
        let ret = unsafe { libc::kill(self.pid, 0) };
        ret == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    /// Read the full maps text for this sample.
    pub fn read_maps(&self) -> PagemapResult<String> {
        std::fs::read_to_string(&self.maps_path).map_err(|e| {
            if self.alive() {
                PagemapError::NoMapInfo {
                    pid: self.pid,
                    msg: e.to_string(),
                }
            } else {
                PagemapError::NoProcess(self.pid)
            }
        })
    }

    /// Open the pagemap and mem sources as an [`AddressSpaceReader`].
    pub fn open_reader(&self, page_size: u64) -> PagemapResult<AddressSpaceReader> {
        let entries = File::open(&self.pagemap_path).map_err(|e| PagemapError::NoMapInfo {
            pid: self.pid,
            msg: format!("pagemap: {e}"),
        })?;
        let mem = File::open(&self.mem_path).map_err(|e| PagemapError::NoMemInfo {
            pid: self.pid,
            msg: format!("mem: {e}"),
        })?;
        Ok(AddressSpaceReader::new(
            Box::new(entries),
            Box::new(mem),
            page_size,
        ))
    }

    /// Ask the kernel to clear soft-dirty bits for the target.
    /// Fire-and-forget: failures are logged and ignored.
    pub fn clear_soft_dirty(&self) {
        let result = OpenOptions::new()
            .write(true)
            .open(&self.clear_refs_path)
            .and_then(|mut f| f.write_all(CLEAR_SOFT_DIRTY));
        if let Err(e) = result {
            debug!("clear_refs write failed for pid {}: {}", self.pid, e);
        }
    }
}

/// The system page size, falling back to 4096 if sysconf misbehaves.
pub fn system_page_size() -> u64 {
    let sz = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if sz > 0 {
        sz as u64
    } else {
        4096
    }
}
