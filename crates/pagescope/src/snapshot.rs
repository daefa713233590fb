//! Render snapshots — one immutable view of model + viewport per tick.
//!
//! The presenter consumes only this; it never touches the model or the
//! reader directly. Pages whose entries could not be read come through as
//! [`PageState::Unknown`], bytes as `None`.

use crate::viewport::{View, Viewport};
use pagemap::{AddressSpaceModel, AddressSpaceReader, MemRead, Page, PageEntry};

/// Display state of one grid cell, derived from the pagemap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    /// The entry could not be read.
    Unknown,
    NotPresent,
    Present,
    Swapped,
    FileShared,
    SoftDirty,
}

impl PageState {
    /// Later checks win, so a dirty resident page shows as dirty.
    pub fn from_entry(entry: Option<PageEntry>) -> Self {
        let entry = match entry {
            Some(e) => e,
            None => return PageState::Unknown,
        };
        let flags = entry.flags();
        let mut state = PageState::NotPresent;
        if flags.present {
            state = PageState::Present;
        }
        if flags.swapped {
            state = PageState::Swapped;
        }
        if flags.file_or_shared_anon {
            state = PageState::FileShared;
        }
        if flags.soft_dirty {
            state = PageState::SoftDirty;
        }
        state
    }

    pub fn glyph(self) -> char {
        match self {
            PageState::Unknown => '?',
            PageState::NotPresent => '.',
            PageState::Present => 'R',
            PageState::Swapped => 'S',
            PageState::FileShared => 'M',
            PageState::SoftDirty => 'D',
        }
    }
}

/// One row of the grid view: gutter address plus cell states.
#[derive(Clone, Debug)]
pub struct GridRow {
    pub addr: u64,
    pub cells: Vec<PageState>,
}

/// One row of the hex view; unreadable bytes are `None`.
#[derive(Clone, Debug)]
pub struct HexRow {
    pub addr: u64,
    pub bytes: Vec<Option<u8>>,
}

impl HexRow {
    /// Printable rendering of a byte: the ASCII char itself, `.` for
    /// non-printable values, `?` for unread bytes.
    pub fn printable(byte: Option<u8>) -> char {
        match byte {
            Some(b) if (0x20..0x7f).contains(&b) => b as char,
            Some(_) => '.',
            None => '?',
        }
    }
}

#[derive(Clone, Debug)]
pub enum Rows {
    Grid(Vec<GridRow>),
    Hex(Vec<HexRow>),
}

/// The mapping under the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingSummary {
    pub addr: u64,
    pub perms: String,
    pub device: String,
    pub name: String,
}

/// Expanded per-page information for the detail panel.
#[derive(Clone, Debug)]
pub struct PageDetail {
    pub addr: u64,
    pub entry: Option<PageEntry>,
    pub begin: u64,
    pub end: u64,
    pub perms: String,
    pub device: String,
    pub name: String,
}

/// Everything the presenter needs for one frame.
pub struct Snapshot {
    pub view: View,
    pub zoom: u32,
    pub auto_zoom: bool,
    pub too_small: bool,
    pub cursor: (u16, u16),
    pub blink_on: bool,
    pub rows: Rows,
    /// `None` means the cursor resolves to no mapped page ("not mapped").
    pub summary: Option<MappingSummary>,
    /// Position through the address space, 0..=100.
    pub percent: f64,
    pub detail: Option<PageDetail>,
}

/// Build the snapshot for the current tick.
pub fn build(
    model: &AddressSpaceModel,
    reader: &AddressSpaceReader,
    viewport: &Viewport,
    show_detail: bool,
) -> Snapshot {
    let rows = match viewport.view() {
        View::Grid => Rows::Grid(grid_rows(model, reader, viewport)),
        View::Hex => Rows::Hex(hex_rows(model, reader, viewport)),
    };

    let index = viewport.cursor_page_index();
    let summary = cursor_summary(model, viewport, index);
    let percent = if model.page_count() == 0 {
        0.0
    } else {
        (index + 1) as f64 / model.page_count() as f64 * 100.0
    };
    let detail = if show_detail {
        page_detail(model, reader, index)
    } else {
        None
    };

    Snapshot {
        view: viewport.view(),
        zoom: viewport.zoom(),
        auto_zoom: viewport.auto_zoom(),
        too_small: viewport.too_small(),
        cursor: viewport.cursor(),
        blink_on: viewport.blink_on(),
        rows,
        summary,
        percent,
        detail,
    }
}

fn grid_rows(
    model: &AddressSpaceModel,
    reader: &AddressSpaceReader,
    viewport: &Viewport,
) -> Vec<GridRow> {
    let (width, height) = viewport.dims();
    let pages = model.pages();
    let count = model.page_count();
    let zoom = viewport.zoom() as u64;

    // Gather the visible pages row-major, then fetch all entries in one
    // pass so contiguous runs become bulk reads.
    let mut visible: Vec<Page> = Vec::new();
    let mut shape: Vec<(u64, usize)> = Vec::new(); // (row base addr, cell count)
    for row in 0..height as u64 {
        let base = viewport
            .page_offset()
            .saturating_add(zoom * row * width as u64);
        if base >= count {
            break;
        }
        let mut cells = 0;
        for col in 0..width as u64 {
            let index = base + zoom * col;
            if index >= count {
                break;
            }
            visible.push(pages[index as usize]);
            cells += 1;
        }
        shape.push((pages[base as usize].addr, cells));
    }

    let entries = reader.read_entries(&visible);
    let mut states = entries.into_iter().map(PageState::from_entry);
    shape
        .into_iter()
        .map(|(addr, cells)| GridRow {
            addr,
            cells: states.by_ref().take(cells).collect(),
        })
        .collect()
}

fn hex_rows(
    model: &AddressSpaceModel,
    reader: &AddressSpaceReader,
    viewport: &Viewport,
) -> Vec<HexRow> {
    let (width, height) = viewport.dims();
    let pages = model.pages();
    let page_size = model.page_size();
    let total = model.total_bytes();
    let base = viewport.page_offset() * page_size + viewport.byte_offset();

    let mut rows = Vec::new();
    for row in 0..height as u64 {
        let row_start = base.saturating_add(row * width as u64);
        if row_start >= total {
            break;
        }
        let row_len = (width as u64).min(total - row_start) as usize;
        let first_page = &pages[(row_start / page_size) as usize];
        let mut bytes: Vec<Option<u8>> = Vec::with_capacity(row_len);

        // A row may straddle a page boundary; read each page's slice
        // separately since adjacent pages need not be adjacent in memory.
        let mut linear = row_start;
        while bytes.len() < row_len {
            let page = &pages[(linear / page_size) as usize];
            let within = linear % page_size;
            let chunk = ((page_size - within) as usize).min(row_len - bytes.len());
            let addr = page.addr + within;
            let limit = model
                .mapping_of(page)
                .map(|m| m.end)
                .unwrap_or(addr + chunk as u64);
            match reader.read_bytes(addr, chunk, limit) {
                MemRead::Bytes(data) => {
                    bytes.extend(data.iter().copied().map(Some));
                    bytes.resize(bytes.len() + (chunk - data.len().min(chunk)), None);
                }
                MemRead::Unavailable | MemRead::PastEnd => {
                    bytes.resize(bytes.len() + chunk, None);
                }
            }
            linear += chunk as u64;
        }

        rows.push(HexRow {
            addr: first_page.addr + row_start % page_size,
            bytes,
        });
    }
    rows
}

fn cursor_summary(
    model: &AddressSpaceModel,
    viewport: &Viewport,
    index: u64,
) -> Option<MappingSummary> {
    if index >= model.page_count() {
        return None;
    }
    let page = &model.pages()[index as usize];
    let mapping = model.mapping_of(page)?;
    let addr = match viewport.view() {
        View::Grid => page.addr,
        View::Hex => page.addr + viewport.hex_linear() % model.page_size(),
    };
    Some(MappingSummary {
        addr,
        perms: mapping.perms.clone(),
        device: mapping.device.clone(),
        name: mapping.display_name().to_owned(),
    })
}

fn page_detail(
    model: &AddressSpaceModel,
    reader: &AddressSpaceReader,
    index: u64,
) -> Option<PageDetail> {
    if index >= model.page_count() {
        return None;
    }
    let page = model.pages()[index as usize];
    let mapping = model.mapping_of(&page)?;
    let entry = reader.read_entries(&[page]).pop().flatten();
    Some(PageDetail {
        addr: page.addr,
        entry,
        begin: mapping.begin,
        end: mapping.end,
        perms: mapping.perms.clone(),
        device: mapping.device.clone(),
        name: mapping.display_name().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Intent;
    use pagemap::pte::{PM_FILE, PM_PRESENT, PM_SOFT_DIRTY, PM_SWAP};
    use std::os::unix::fs::FileExt;
    use tempfile::NamedTempFile;

    const PAGE: u64 = 4096;

    type Fixture = (
        AddressSpaceModel,
        AddressSpaceReader,
        Viewport,
        (NamedTempFile, NamedTempFile),
    );

    fn fixture() -> Fixture {
        // Four pages at 0x400000..0x404000.
        let mut model = AddressSpaceModel::new(PAGE, 1 << 32);
        model
            .refresh("400000-404000 r-xp 00000000 08:01 123 /bin/x\n", false)
            .unwrap();

        // Pagemap entries live at offset 8 * (addr / page_size).
        let pagemap = NamedTempFile::new().unwrap();
        let states = [
            PM_PRESENT,
            PM_PRESENT | PM_SOFT_DIRTY,
            PM_SWAP | 2,
            0u64,
        ];
        for (i, s) in states.iter().enumerate() {
            let offset = 8 * (0x400000 / PAGE + i as u64);
            pagemap
                .as_file()
                .write_at(&s.to_le_bytes(), offset)
                .unwrap();
        }

        // Process memory: byte N of the stream is virtual address N.
        // Extend the file over the whole mapping so in-range reads succeed.
        let mem = NamedTempFile::new().unwrap();
        mem.as_file()
            .write_at(b"\xde\xad\xbe\xef", 0x400000)
            .unwrap();
        mem.as_file().write_at(b"\x00", 0x403fff).unwrap();

        let reader = AddressSpaceReader::new(
            Box::new(pagemap.reopen().unwrap()),
            Box::new(mem.reopen().unwrap()),
            PAGE,
        );

        let viewport = Viewport::new(PAGE, 57, 12, false);
        (model, reader, viewport, (pagemap, mem))
    }

    #[test]
    fn test_state_priority() {
        assert_eq!(PageState::from_entry(None), PageState::Unknown);
        assert_eq!(
            PageState::from_entry(Some(PageEntry(0))),
            PageState::NotPresent
        );
        assert_eq!(
            PageState::from_entry(Some(PageEntry(PM_PRESENT))),
            PageState::Present
        );
        // Soft-dirty wins over everything else.
        assert_eq!(
            PageState::from_entry(Some(PageEntry(PM_PRESENT | PM_FILE | PM_SOFT_DIRTY))),
            PageState::SoftDirty
        );
        assert_eq!(
            PageState::from_entry(Some(PageEntry(PM_PRESENT | PM_FILE))),
            PageState::FileShared
        );
    }

    #[test]
    fn test_printable_bytes() {
        assert_eq!(HexRow::printable(Some(b'A')), 'A');
        assert_eq!(HexRow::printable(Some(0x1f)), '.');
        assert_eq!(HexRow::printable(Some(0x7f)), '.');
        assert_eq!(HexRow::printable(None), '?');
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(PageState::NotPresent.glyph(), '.');
        assert_eq!(PageState::Present.glyph(), 'R');
        assert_eq!(PageState::Swapped.glyph(), 'S');
        assert_eq!(PageState::FileShared.glyph(), 'M');
        assert_eq!(PageState::SoftDirty.glyph(), 'D');
        assert_eq!(PageState::Unknown.glyph(), '?');
    }

    #[test]
    fn test_grid_snapshot() {
        let (model, reader, viewport, _files) = fixture();
        let snap = build(&model, &reader, &viewport, false);

        let rows = match snap.rows {
            Rows::Grid(rows) => rows,
            _ => panic!("expected grid rows"),
        };
        assert_eq!(rows.len(), 1); // 4 pages fit in one 40-cell row
        assert_eq!(rows[0].addr, 0x400000);
        assert_eq!(
            rows[0].cells,
            vec![
                PageState::Present,
                PageState::SoftDirty,
                PageState::Swapped,
                PageState::NotPresent,
            ]
        );
    }

    #[test]
    fn test_cursor_summary() {
        let (model, reader, viewport, _files) = fixture();
        let snap = build(&model, &reader, &viewport, false);
        let summary = snap.summary.unwrap();
        assert_eq!(summary.addr, 0x400000);
        assert_eq!(summary.perms, "r-xp");
        assert_eq!(summary.device, "08:01");
        assert_eq!(summary.name, "x");
        assert_eq!(snap.percent, 25.0);
    }

    #[test]
    fn test_hex_snapshot() {
        let (model, reader, mut viewport, _files) = fixture();
        viewport.apply(Intent::SwitchView, model.page_count());
        let snap = build(&model, &reader, &viewport, false);

        let rows = match snap.rows {
            Rows::Hex(rows) => rows,
            _ => panic!("expected hex rows"),
        };
        assert_eq!(rows[0].addr, 0x400000);
        assert_eq!(rows[0].bytes.len(), 13);
        assert_eq!(rows[0].bytes[0], Some(0xde));
        assert_eq!(rows[0].bytes[3], Some(0xef));
        // Rest of the fixture file reads as zeros within the mapping.
        assert_eq!(rows[0].bytes[4], Some(0x00));
    }

    #[test]
    fn test_detail_panel() {
        let (model, reader, viewport, _files) = fixture();
        let snap = build(&model, &reader, &viewport, true);
        let detail = snap.detail.unwrap();
        assert_eq!(detail.addr, 0x400000);
        assert_eq!(detail.begin, 0x400000);
        assert_eq!(detail.end, 0x404000);
        assert!(detail.entry.unwrap().flags().present);
    }

    #[test]
    fn test_grid_rows_stop_at_page_count() {
        let (model, reader, viewport, _files) = fixture();
        let snap = build(&model, &reader, &viewport, false);
        if let Rows::Grid(rows) = snap.rows {
            // Only 4 cells, not a full 40-cell row padded with garbage.
            assert_eq!(rows[0].cells.len(), 4);
        }
    }
}
