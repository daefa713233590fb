//! Viewport engine — cursor, scroll, and zoom state for the two views.
//!
//! The engine owns the coordinate system over the packed page sequence: a
//! grid view where one cell represents `zoom` consecutive pages, and a hex
//! view addressing individual bytes. Every intent is followed by the same
//! boundary pass, in order: horizontal wrap, vertical overflow into the
//! scroll offsets, negative-offset clamp, and an end-of-memory re-snap that
//! restores the previous valid position whenever a move would resolve past
//! the live address space. The re-snap is what keeps the cursor valid when
//! the target's mapping set shrinks between samples.

/// Zoom stride bounds.
pub const MIN_ZOOM: u32 = 1;
pub const MAX_ZOOM: u32 = 999;

/// Address gutter: 16 hex digits plus a space.
const ADDR_GUTTER: u16 = 17;
/// One hex byte cell: two digits plus a space.
const HEX_CELL_WIDTH: u16 = 3;
/// Title bar plus key legend.
const CHROME_ROWS: u16 = 2;
/// Below this geometry no view fits at all.
const MIN_COLS: u16 = 18;
const MIN_ROWS: u16 = 5;

/// The two coupled views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Grid,
    Hex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: i64,
    pub y: i64,
}

/// Per-view cursor and geometry.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub cursor: Cursor,
    pub width: i64,
    pub height: i64,
}

impl ViewState {
    fn new() -> Self {
        ViewState {
            cursor: Cursor::default(),
            width: 1,
            height: 1,
        }
    }
}

/// A discrete user navigation intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Move(i64, i64),
    PageUp,
    PageDown,
    Home,
    End,
    ZoomIn,
    ZoomOut,
    ZoomMin,
    ZoomMax,
    ToggleAutoZoom,
    SwitchView,
    Resize(u16, u16),
}

pub struct Viewport {
    page_size: u64,
    view: View,
    grid: ViewState,
    hex: ViewState,
    /// Index of the page shown at viewport row 0, column 0.
    page_offset: u64,
    /// Sub-page byte offset, hex view only; always `< page_size`.
    byte_offset: u64,
    zoom: u32,
    auto_zoom: bool,
    blink: u32,
    too_small: bool,
    /// Absolute page (grid) or byte (hex) index to put back under the
    /// cursor after a geometry change; stashed while the window is too
    /// small so recovery lands on the same position.
    anchor: Option<u64>,
}

impl Viewport {
    pub fn new(page_size: u64, cols: u16, rows: u16, auto_zoom: bool) -> Self {
        let mut vp = Viewport {
            page_size,
            view: View::Grid,
            grid: ViewState::new(),
            hex: ViewState::new(),
            page_offset: 0,
            byte_offset: 0,
            zoom: MIN_ZOOM,
            auto_zoom,
            blink: 0,
            too_small: false,
            anchor: None,
        };
        vp.set_geometry(cols, rows);
        vp
    }

    // -- Accessors --

    pub fn view(&self) -> View {
        self.view
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn auto_zoom(&self) -> bool {
        self.auto_zoom
    }

    pub fn too_small(&self) -> bool {
        self.too_small
    }

    pub fn page_offset(&self) -> u64 {
        self.page_offset
    }

    pub fn byte_offset(&self) -> u64 {
        self.byte_offset
    }

    /// Cursor position of the active view.
    pub fn cursor(&self) -> (u16, u16) {
        let st = self.active();
        (st.cursor.x as u16, st.cursor.y as u16)
    }

    /// Width and height of the active view in cells.
    pub fn dims(&self) -> (u16, u16) {
        let st = self.active();
        (st.width as u16, st.height as u16)
    }

    /// Whether the blinking cursor cell is currently lit.
    pub fn blink_on(&self) -> bool {
        self.blink & 1 == 0
    }

    pub fn tick_blink(&mut self) {
        self.blink = self.blink.wrapping_add(1);
    }

    /// Page index under the cursor in the grid view.
    pub fn grid_index(&self) -> u64 {
        let st = &self.grid;
        let cells = (st.cursor.y * st.width + st.cursor.x).max(0) as u64;
        self.page_offset
            .saturating_add((self.zoom as u64).saturating_mul(cells))
    }

    /// Linear byte index under the cursor in the hex view.
    pub fn hex_linear(&self) -> u64 {
        let st = &self.hex;
        let cells = (st.cursor.y * st.width + st.cursor.x).max(0) as u64;
        self.page_offset
            .saturating_mul(self.page_size)
            .saturating_add(self.byte_offset)
            .saturating_add(cells)
    }

    /// Page index under the cursor, whichever view is active.
    pub fn cursor_page_index(&self) -> u64 {
        match self.view {
            View::Grid => self.grid_index(),
            View::Hex => self.hex_linear() / self.page_size,
        }
    }

    // -- Intent handling --

    /// Apply one navigation intent against an address space of `page_count`
    /// pages. Intents other than resize are rejected while the terminal is
    /// too small or the address space is empty.
    pub fn apply(&mut self, intent: Intent, page_count: u64) {
        if let Intent::Resize(cols, rows) = intent {
            self.resize(cols, rows, page_count);
            return;
        }
        if self.too_small || page_count == 0 {
            return;
        }

        // The boundary pass rolls back to this tuple when a move resolves
        // past the end of the address space.
        let saved = (self.page_offset, self.byte_offset, self.active().cursor);

        match intent {
            Intent::Move(dx, dy) => {
                let st = self.active_mut();
                st.cursor.x += dx;
                st.cursor.y += dy;
            }
            Intent::PageUp => {
                let st = self.active_mut();
                st.cursor.y -= st.height / 2;
            }
            Intent::PageDown => {
                let st = self.active_mut();
                st.cursor.y += st.height / 2;
            }
            Intent::Home => {
                self.active_mut().cursor = Cursor::default();
                self.page_offset = 0;
                self.byte_offset = 0;
            }
            Intent::End => {
                self.snap_to_end(page_count);
            }
            Intent::ZoomIn => {
                if self.view == View::Grid && self.zoom < MAX_ZOOM {
                    self.zoom += 1;
                    self.reset_origin();
                }
            }
            Intent::ZoomOut => {
                if self.view == View::Grid && self.zoom > MIN_ZOOM {
                    self.zoom -= 1;
                    self.reset_origin();
                }
            }
            Intent::ZoomMin => {
                if self.view == View::Grid {
                    self.zoom = MIN_ZOOM;
                    self.auto_zoom = false;
                    self.reset_origin();
                }
            }
            Intent::ZoomMax => {
                if self.view == View::Grid {
                    self.zoom = MAX_ZOOM;
                    self.auto_zoom = false;
                    self.reset_origin();
                }
            }
            Intent::ToggleAutoZoom => {
                self.auto_zoom = !self.auto_zoom;
            }
            Intent::SwitchView => {
                self.view = match self.view {
                    View::Grid => View::Hex,
                    View::Hex => View::Grid,
                };
                // Prior spatial state keeps only the page offset; cursor and
                // blink restart, the hex view opens at the top of that page.
                self.grid.cursor = Cursor::default();
                self.hex.cursor = Cursor::default();
                self.byte_offset = 0;
                self.blink = 0;
            }
            Intent::Resize(..) => unreachable!(),
        }

        self.clamp(page_count, saved);
    }

    /// Re-check the cursor against a freshly sampled address space; a shrink
    /// that strands the cursor past the end snaps it back to the last valid
    /// position.
    pub fn revalidate(&mut self, page_count: u64) {
        if self.too_small || page_count == 0 {
            return;
        }
        if !self.in_range(page_count) {
            self.snap_to_end(page_count);
        }
    }

    /// Recompute the auto-zoom stride so the whole address space fits the
    /// grid. Enabled-state only; min/max snap intents disable it.
    pub fn apply_auto_zoom(&mut self, page_count: u64) {
        if !self.auto_zoom || self.view != View::Grid || self.too_small || page_count == 0 {
            return;
        }
        let cells = (self.grid.width * self.grid.height).max(1) as u64;
        let fit = page_count.div_ceil(cells).clamp(MIN_ZOOM as u64, MAX_ZOOM as u64) as u32;
        if fit != self.zoom {
            self.zoom = fit;
            if !self.in_range(page_count) {
                self.snap_to_end(page_count);
            }
        }
    }

    // -- Internal machinery --

    fn active(&self) -> &ViewState {
        match self.view {
            View::Grid => &self.grid,
            View::Hex => &self.hex,
        }
    }

    fn active_mut(&mut self) -> &mut ViewState {
        match self.view {
            View::Grid => &mut self.grid,
            View::Hex => &mut self.hex,
        }
    }

    fn reset_origin(&mut self) {
        self.grid.cursor = Cursor::default();
        self.hex.cursor = Cursor::default();
        self.page_offset = 0;
        self.byte_offset = 0;
    }

    fn set_geometry(&mut self, cols: u16, rows: u16) {
        self.too_small = cols < MIN_COLS || rows < MIN_ROWS;
        let usable = cols.saturating_sub(ADDR_GUTTER).max(1) as i64;
        let height = rows.saturating_sub(CHROME_ROWS).max(1) as i64;
        self.grid.width = usable;
        self.grid.height = height;
        self.hex.width = (usable / HEX_CELL_WIDTH as i64).max(1);
        self.hex.height = height;
    }

    /// Boundary pass, applied after every mutating intent.
    fn clamp(&mut self, page_count: u64, saved: (u64, u64, Cursor)) {
        // 1. horizontal wrap
        {
            let st = self.active_mut();
            while st.cursor.x >= st.width {
                st.cursor.x -= st.width;
                st.cursor.y += 1;
            }
            while st.cursor.x < 0 {
                st.cursor.x += st.width;
                st.cursor.y -= 1;
            }
        }

        // 2.-4. vertical overflow converts into the scroll offsets
        match self.view {
            View::Grid => self.scroll_grid(),
            View::Hex => self.scroll_hex(),
        }

        // 5. end-of-memory re-snap: roll back to the previous valid tuple,
        // or to the last valid position if that is gone too.
        if !self.in_range(page_count) {
            self.page_offset = saved.0;
            self.byte_offset = saved.1;
            self.active_mut().cursor = saved.2;
            if !self.in_range(page_count) {
                self.snap_to_end(page_count);
            }
        }
    }

    fn scroll_grid(&mut self) {
        let height = self.grid.height;
        let row_pages = (self.zoom as u64) * self.grid.width as u64;
        if self.grid.cursor.y >= height {
            let excess = (self.grid.cursor.y - (height - 1)) as u64;
            self.page_offset = self.page_offset.saturating_add(row_pages * excess);
            self.grid.cursor.y = height - 1;
        }
        if self.grid.cursor.y < 0 {
            let deficit = (-self.grid.cursor.y) as u64;
            let back = row_pages * deficit;
            if self.page_offset >= back {
                self.page_offset -= back;
                self.grid.cursor.y = 0;
            } else {
                // scrolled past the start: clamp to the origin
                self.page_offset = 0;
                self.grid.cursor = Cursor::default();
            }
        }
    }

    fn scroll_hex(&mut self) {
        let height = self.hex.height;
        let row_bytes = self.hex.width as u64;
        let mut linear = self.page_offset * self.page_size + self.byte_offset;
        if self.hex.cursor.y >= height {
            let excess = (self.hex.cursor.y - (height - 1)) as u64;
            linear = linear.saturating_add(row_bytes * excess);
            self.hex.cursor.y = height - 1;
        }
        if self.hex.cursor.y < 0 {
            let deficit = (-self.hex.cursor.y) as u64;
            let back = row_bytes * deficit;
            if linear >= back {
                linear -= back;
                self.hex.cursor.y = 0;
            } else {
                linear = 0;
                self.hex.cursor = Cursor::default();
            }
        }
        // byte_offset carries into page_offset at page boundaries
        self.page_offset = linear / self.page_size;
        self.byte_offset = linear % self.page_size;
    }

    fn in_range(&self, page_count: u64) -> bool {
        match self.view {
            View::Grid => self.grid_index() < page_count,
            View::Hex => self.hex_linear() < page_count.saturating_mul(self.page_size),
        }
    }

    /// Jump to the last addressable page (grid) or byte (hex).
    fn snap_to_end(&mut self, page_count: u64) {
        match self.view {
            View::Grid => {
                let width = self.grid.width as u64;
                let height = self.grid.height as u64;
                let cells = page_count.div_ceil(self.zoom as u64);
                let last = cells - 1;
                let row = last / width;
                let col = last % width;
                self.byte_offset = 0;
                if row < height {
                    self.page_offset = 0;
                    self.grid.cursor = Cursor {
                        x: col as i64,
                        y: row as i64,
                    };
                } else {
                    self.page_offset =
                        (self.zoom as u64) * width * (row - (height - 1));
                    self.grid.cursor = Cursor {
                        x: col as i64,
                        y: (height - 1) as i64,
                    };
                }
            }
            View::Hex => {
                let width = self.hex.width as u64;
                let height = self.hex.height as u64;
                let last = page_count * self.page_size - 1;
                let row = last / width;
                let col = last % width;
                if row < height {
                    self.page_offset = 0;
                    self.byte_offset = 0;
                    self.hex.cursor = Cursor {
                        x: col as i64,
                        y: row as i64,
                    };
                } else {
                    let linear = width * (row - (height - 1));
                    self.page_offset = linear / self.page_size;
                    self.byte_offset = linear % self.page_size;
                    self.hex.cursor = Cursor {
                        x: col as i64,
                        y: (height - 1) as i64,
                    };
                }
            }
        }
    }

    /// Recompute geometry, keeping the absolute page under the cursor as
    /// close to the cursor as the new shape allows. The anchor is stashed
    /// across a too-small excursion so that restoring the window puts the
    /// same position back under the cursor.
    fn resize(&mut self, cols: u16, rows: u16, page_count: u64) {
        if !self.too_small && page_count > 0 {
            self.anchor = Some(match self.view {
                View::Grid => self.grid_index().min(page_count - 1),
                View::Hex => self
                    .hex_linear()
                    .min(page_count * self.page_size - 1),
            });
        }

        self.set_geometry(cols, rows);
        if self.too_small {
            return;
        }

        // The cursor must fit the new shape even when no anchor exists.
        {
            let st = self.active_mut();
            st.cursor.x = st.cursor.x.clamp(0, st.width - 1);
            st.cursor.y = st.cursor.y.clamp(0, st.height - 1);
        }

        if let Some(anchor) = self.anchor.take() {
            match self.view {
                View::Grid => {
                    let st = &mut self.grid;
                    let before =
                        (self.zoom as u64) * (st.cursor.y * st.width + st.cursor.x) as u64;
                    if anchor >= before {
                        self.page_offset = anchor - before;
                    } else {
                        self.page_offset = 0;
                        let cell = anchor / self.zoom as u64;
                        let width = st.width as u64;
                        st.cursor.x = (cell % width) as i64;
                        st.cursor.y = ((cell / width).min(st.height as u64 - 1)) as i64;
                    }
                }
                View::Hex => {
                    let st = &mut self.hex;
                    let before = (st.cursor.y * st.width + st.cursor.x) as u64;
                    let linear = if anchor >= before {
                        anchor - before
                    } else {
                        let width = st.width as u64;
                        st.cursor.x = (anchor % width) as i64;
                        st.cursor.y = 0;
                        anchor - anchor % width
                    };
                    self.page_offset = linear / self.page_size;
                    self.byte_offset = linear % self.page_size;
                }
            }
        }

        if page_count > 0 && !self.in_range(page_count) {
            self.snap_to_end(page_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: u64 = 4096;

    /// 57 cols gives a grid width of 40; 12 rows give a height of 10.
    fn viewport() -> Viewport {
        Viewport::new(PAGE, 57, 12, false)
    }

    #[test]
    fn test_horizontal_wrap_forward() {
        let mut vp = viewport();
        vp.apply(Intent::Move(39, 0), 100_000);
        assert_eq!(vp.cursor(), (39, 0));
        vp.apply(Intent::Move(1, 0), 100_000);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn test_horizontal_wrap_backward() {
        let mut vp = viewport();
        vp.apply(Intent::Move(0, 1), 100_000);
        vp.apply(Intent::Move(-1, 0), 100_000);
        assert_eq!(vp.cursor(), (39, 0));
    }

    #[test]
    fn test_home_end_home_idempotent() {
        let mut vp = viewport();
        vp.apply(Intent::Move(7, 3), 100_000);
        vp.apply(Intent::Home, 100_000);
        vp.apply(Intent::End, 100_000);
        vp.apply(Intent::Home, 100_000);
        assert_eq!(vp.cursor(), (0, 0));
        assert_eq!(vp.page_offset(), 0);
        assert_eq!(vp.byte_offset(), 0);
    }

    #[test]
    fn test_end_lands_on_last_page() {
        let mut vp = viewport();
        vp.apply(Intent::End, 100_000);
        assert_eq!(vp.grid_index(), 99_999);
    }

    #[test]
    fn test_end_small_space_no_scroll() {
        let mut vp = viewport();
        vp.apply(Intent::End, 50);
        assert_eq!(vp.page_offset(), 0);
        assert_eq!(vp.cursor(), (9, 1));
        assert_eq!(vp.grid_index(), 49);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = viewport();
        vp.apply(Intent::ZoomOut, 100_000);
        assert_eq!(vp.zoom(), MIN_ZOOM);
        vp.apply(Intent::ZoomMax, 100_000);
        assert_eq!(vp.zoom(), MAX_ZOOM);
        vp.apply(Intent::ZoomIn, 100_000);
        assert_eq!(vp.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_zoom_out_at_min_is_noop() {
        let mut vp = viewport();
        vp.apply(Intent::Move(5, 2), 100_000);
        vp.apply(Intent::ZoomOut, 100_000);
        // No zoom change, so no origin reset either.
        assert_eq!(vp.cursor(), (5, 2));
    }

    #[test]
    fn test_zoom_change_resets_origin() {
        let mut vp = viewport();
        vp.apply(Intent::Move(5, 2), 100_000);
        vp.apply(Intent::ZoomIn, 100_000);
        assert_eq!(vp.zoom(), 2);
        assert_eq!(vp.cursor(), (0, 0));
        assert_eq!(vp.page_offset(), 0);
    }

    #[test]
    fn test_zoom_snap_disables_auto_zoom() {
        let mut vp = Viewport::new(PAGE, 57, 12, true);
        assert!(vp.auto_zoom());
        vp.apply(Intent::ZoomMin, 100_000);
        assert!(!vp.auto_zoom());
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_grid_zoom_stride() {
        let mut vp = viewport();
        vp.apply(Intent::ZoomIn, 100_000);
        vp.apply(Intent::ZoomIn, 100_000);
        assert_eq!(vp.zoom(), 3);
        vp.apply(Intent::Move(2, 1), 100_000);
        // index = zoom * (x + y * width)
        assert_eq!(vp.grid_index(), 3 * (2 + 40));
    }

    #[test]
    fn test_move_past_end_rolls_back() {
        let mut vp = viewport();
        vp.apply(Intent::Move(10, 0), 5);
        assert_eq!(vp.cursor(), (0, 0));
        vp.apply(Intent::Move(4, 0), 5);
        assert_eq!(vp.grid_index(), 4);
        vp.apply(Intent::Move(1, 0), 5);
        assert_eq!(vp.grid_index(), 4);
    }

    #[test]
    fn test_page_down_scrolls_offset() {
        let mut vp = viewport();
        // height 10: PageDown moves the cursor by 5 rows
        vp.apply(Intent::PageDown, 1_000_000);
        assert_eq!(vp.cursor(), (0, 5));
        vp.apply(Intent::PageDown, 1_000_000);
        // row 10 is one past the edge: one row's worth scrolls into the offset
        assert_eq!(vp.cursor(), (0, 9));
        assert_eq!(vp.page_offset(), 40);
    }

    #[test]
    fn test_page_up_clamps_at_origin() {
        let mut vp = viewport();
        vp.apply(Intent::PageDown, 1_000_000);
        vp.apply(Intent::PageUp, 1_000_000);
        vp.apply(Intent::PageUp, 1_000_000);
        assert_eq!(vp.cursor(), (0, 0));
        assert_eq!(vp.page_offset(), 0);
    }

    #[test]
    fn test_cursor_never_past_end_under_intent_storm() {
        let mut vp = viewport();
        let page_count = 123;
        let intents = [
            Intent::PageDown,
            Intent::Move(13, 0),
            Intent::Move(0, 7),
            Intent::PageDown,
            Intent::Move(-1, -1),
            Intent::End,
            Intent::Move(1, 0),
            Intent::PageDown,
            Intent::Resize(30, 8),
            Intent::Move(5, 5),
            Intent::Resize(80, 30),
            Intent::PageUp,
            Intent::Move(200, 0),
        ];
        for intent in intents {
            vp.apply(intent, page_count);
            assert!(
                vp.grid_index() < page_count,
                "cursor past end after {:?}",
                intent
            );
        }
    }

    #[test]
    fn test_shrink_resnaps_to_last_page() {
        let mut vp = viewport();
        vp.apply(Intent::End, 100_000);
        assert_eq!(vp.grid_index(), 99_999);
        // The mapping set shrank drastically between samples.
        vp.revalidate(50);
        assert_eq!(vp.grid_index(), 49);
        assert_eq!(vp.cursor(), (9, 1));
    }

    #[test]
    fn test_switch_view_resets_cursor_keeps_page_offset() {
        let mut vp = viewport();
        vp.apply(Intent::Move(0, 30), 100_000);
        let offset = vp.page_offset();
        assert!(offset > 0);
        vp.apply(Intent::SwitchView, 100_000);
        assert_eq!(vp.view(), View::Hex);
        assert_eq!(vp.cursor(), (0, 0));
        assert_eq!(vp.page_offset(), offset);
        assert_eq!(vp.byte_offset(), 0);
    }

    #[test]
    fn test_hex_scroll_carries_into_page_offset() {
        let mut vp = viewport();
        vp.apply(Intent::SwitchView, 100_000);
        // hex width is (57 - 17) / 3 = 13 bytes per row
        assert_eq!(vp.dims().0, 13);
        // Scroll far enough that byte_offset crosses a page boundary:
        // 400 rows below the window edge -> 400 * 13 = 5200 bytes scrolled.
        vp.apply(Intent::Move(0, 409), 100_000);
        assert_eq!(vp.page_offset(), 5200 / PAGE);
        assert_eq!(vp.byte_offset(), 5200 % PAGE);
        assert!(vp.byte_offset() < PAGE);
        assert_eq!(vp.cursor(), (0, 9));
    }

    #[test]
    fn test_hex_end_is_last_byte() {
        let mut vp = viewport();
        vp.apply(Intent::SwitchView, 100_000);
        vp.apply(Intent::End, 100_000);
        assert_eq!(vp.hex_linear(), 100_000 * PAGE - 1);
        vp.apply(Intent::Move(1, 0), 100_000);
        assert_eq!(vp.hex_linear(), 100_000 * PAGE - 1);
    }

    #[test]
    fn test_hex_scroll_back_to_origin() {
        let mut vp = viewport();
        vp.apply(Intent::SwitchView, 100_000);
        vp.apply(Intent::Move(0, 409), 100_000);
        vp.apply(Intent::Home, 100_000);
        assert_eq!(vp.page_offset(), 0);
        assert_eq!(vp.byte_offset(), 0);
        assert_eq!(vp.cursor(), (0, 0));
    }

    #[test]
    fn test_too_small_rejects_intents() {
        let mut vp = viewport();
        vp.apply(Intent::Move(3, 1), 100_000);
        vp.apply(Intent::Resize(10, 3), 100_000);
        assert!(vp.too_small());
        let before = vp.cursor();
        vp.apply(Intent::Move(1, 1), 100_000);
        assert_eq!(vp.cursor(), before);
        // Geometry restored, intents work again.
        vp.apply(Intent::Resize(57, 12), 100_000);
        assert!(!vp.too_small());
        vp.apply(Intent::Move(1, 0), 100_000);
    }

    #[test]
    fn test_resize_through_too_small_window() {
        let mut vp = viewport();
        vp.apply(Intent::Move(39, 3), 160);
        assert_eq!(vp.grid_index(), 159);
        // Shrink below the minimum geometry, then restore to a wider shape.
        vp.apply(Intent::Resize(10, 3), 160);
        assert!(vp.too_small());
        vp.apply(Intent::Resize(80, 12), 160);
        assert!(!vp.too_small());
        assert!(vp.grid_index() < 160);
        // The page under the cursor before the excursion is back under it.
        assert_eq!(vp.grid_index(), 159);
    }

    #[test]
    fn test_hex_anchor_survives_too_small_excursion() {
        let mut vp = viewport();
        vp.apply(Intent::SwitchView, 100);
        vp.apply(Intent::Move(5, 2), 100);
        let linear = vp.hex_linear();
        vp.apply(Intent::Resize(12, 4), 100);
        assert!(vp.too_small());
        vp.apply(Intent::Resize(57, 12), 100);
        assert_eq!(vp.hex_linear(), linear);
    }

    #[test]
    fn test_resize_from_too_small_never_exceeds_end() {
        let mut vp = viewport();
        vp.apply(Intent::Move(39, 3), 160);
        vp.apply(Intent::Resize(10, 3), 160);
        // The space shrank while the window was unusable; recovery must
        // still respect the new end of memory.
        vp.apply(Intent::Resize(80, 12), 20);
        assert!(vp.grid_index() < 20);
    }

    #[test]
    fn test_resize_preserves_cursor_page() {
        let mut vp = viewport();
        vp.apply(Intent::Move(0, 25), 100_000);
        let index = vp.grid_index();
        vp.apply(Intent::Resize(80, 24), 100_000);
        assert_eq!(vp.grid_index(), index);
        vp.apply(Intent::Resize(40, 10), 100_000);
        assert_eq!(vp.grid_index(), index);
    }

    #[test]
    fn test_empty_address_space_is_inert() {
        let mut vp = viewport();
        vp.apply(Intent::Move(1, 1), 0);
        vp.apply(Intent::End, 0);
        assert_eq!(vp.cursor(), (0, 0));
        assert_eq!(vp.page_offset(), 0);
    }

    #[test]
    fn test_auto_zoom_fits_address_space() {
        let mut vp = Viewport::new(PAGE, 57, 12, true);
        // 40 * 10 = 400 cells for 100_000 pages -> stride 250
        vp.apply_auto_zoom(100_000);
        assert_eq!(vp.zoom(), 250);
        // Huge space clamps at the maximum stride.
        vp.apply_auto_zoom(u64::MAX / PAGE);
        assert_eq!(vp.zoom(), MAX_ZOOM);
        // Tiny space clamps at 1.
        vp.apply_auto_zoom(10);
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_auto_zoom_disabled_is_inert() {
        let mut vp = viewport();
        vp.apply_auto_zoom(100_000);
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_toggle_auto_zoom() {
        let mut vp = viewport();
        vp.apply(Intent::ToggleAutoZoom, 100_000);
        assert!(vp.auto_zoom());
        vp.apply_auto_zoom(100_000);
        assert_eq!(vp.zoom(), 250);
    }

    #[test]
    fn test_switch_view_resets_blink() {
        let mut vp = viewport();
        vp.tick_blink();
        assert!(!vp.blink_on());
        vp.apply(Intent::SwitchView, 100_000);
        assert!(vp.blink_on());
    }
}
