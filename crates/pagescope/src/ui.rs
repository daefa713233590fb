//! Terminal presenter — draws render snapshots with ratatui.
//!
//! Strictly display-only: all navigation logic lives in the viewport
//! engine, and everything drawn here comes out of one [`Snapshot`].

use crate::snapshot::{HexRow, PageState, Rows, Snapshot};
use crate::viewport::View;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::io::{self, stdout, Stdout};

/// Owns the terminal for the session; restores it on drop.
pub struct Presenter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Presenter {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Presenter { terminal })
    }

    pub fn draw(&mut self, snapshot: &Snapshot, pid: i32) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, snapshot, pid))?;
        Ok(())
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

fn title_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(Color::Blue)
        .add_modifier(Modifier::BOLD)
}

fn gutter_style() -> Style {
    Style::default().fg(Color::Black).bg(Color::White)
}

fn state_style(state: PageState) -> Style {
    match state {
        PageState::Unknown => Style::default().fg(Color::DarkGray).bg(Color::White),
        PageState::NotPresent => gutter_style(),
        PageState::Present => Style::default().fg(Color::White).bg(Color::Yellow),
        PageState::Swapped => Style::default().fg(Color::White).bg(Color::Green),
        PageState::FileShared => Style::default().fg(Color::White).bg(Color::Red),
        PageState::SoftDirty => Style::default().fg(Color::White).bg(Color::Cyan),
    }
}

fn cursor_style(blink_on: bool) -> Style {
    let bg = if blink_on { Color::Yellow } else { Color::Red };
    Style::default()
        .fg(Color::Black)
        .bg(bg)
        .add_modifier(Modifier::BOLD)
}

fn render(frame: &mut Frame, snapshot: &Snapshot, pid: i32) {
    let area = frame.size();
    if snapshot.too_small {
        frame.render_widget(Paragraph::new("[window too small]"), area);
        return;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);
    lines.push(title_line(snapshot, pid, area.width));
    match &snapshot.rows {
        Rows::Grid(rows) => {
            for (y, row) in rows.iter().enumerate() {
                let mut spans = vec![Span::styled(format!("{:016x} ", row.addr), gutter_style())];
                for (x, state) in row.cells.iter().enumerate() {
                    let style = if (x as u16, y as u16) == snapshot.cursor {
                        cursor_style(snapshot.blink_on)
                    } else {
                        state_style(*state)
                    };
                    spans.push(Span::styled(state.glyph().to_string(), style));
                }
                lines.push(Line::from(spans));
            }
        }
        Rows::Hex(rows) => {
            for (y, row) in rows.iter().enumerate() {
                lines.push(hex_line(row, y as u16, snapshot));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
    // The real frame can be shorter than the geometry the viewport was
    // last told about; never underflow on a degenerate area.
    if area.height > 1 {
        frame.render_widget(legend(), Rect::new(0, area.height - 1, area.width, 1));
    }

    if let Some(detail) = &snapshot.detail {
        render_detail(frame, area, detail);
    }
}

fn title_line(snapshot: &Snapshot, pid: i32, width: u16) -> Line<'static> {
    let position = match &snapshot.summary {
        Some(s) => format!(
            "0x{:016x} {} {} {:<20.20}",
            s.addr, s.perms, s.device, s.name
        ),
        None => "not mapped".to_owned(),
    };
    let zoom = match snapshot.view {
        View::Grid if snapshot.auto_zoom => format!("Zoom x{:<3} auto", snapshot.zoom),
        View::Grid => format!("Zoom x{:<3}", snapshot.zoom),
        View::Hex => match cursor_byte(snapshot) {
            Some(b) => format!("Hex {:02x} '{}'", b, HexRow::printable(Some(b))),
            None => "Hex ??".to_owned(),
        },
    };
    let text = format!(
        "pagescope {pid} {position} {zoom} {:5.1}%",
        snapshot.percent
    );
    Line::from(Span::styled(
        format!("{text:<width$}", width = width as usize),
        title_style(),
    ))
}

/// The byte under the hex cursor, if it was readable.
fn cursor_byte(snapshot: &Snapshot) -> Option<u8> {
    let (x, y) = snapshot.cursor;
    match &snapshot.rows {
        Rows::Hex(rows) => rows.get(y as usize)?.bytes.get(x as usize).copied().flatten(),
        Rows::Grid(_) => None,
    }
}

fn hex_line(row: &HexRow, y: u16, snapshot: &Snapshot) -> Line<'static> {
    let mut spans = vec![Span::styled(format!("{:016x} ", row.addr), gutter_style())];
    for (x, byte) in row.bytes.iter().enumerate() {
        let style = if (x as u16, y) == snapshot.cursor {
            cursor_style(snapshot.blink_on)
        } else {
            gutter_style()
        };
        let cell = match byte {
            Some(b) => format!("{b:02x} "),
            None => "?? ".to_owned(),
        };
        spans.push(Span::styled(cell, style));
    }
    Line::from(spans)
}

fn legend() -> Paragraph<'static> {
    let blue = Style::default().fg(Color::White).bg(Color::Blue);
    let spans = vec![
        Span::styled("KEY: ", blue.add_modifier(Modifier::BOLD)),
        Span::styled("M", state_style(PageState::FileShared)),
        Span::styled(" mapped file/shared, ", blue),
        Span::styled("R", state_style(PageState::Present)),
        Span::styled(" in RAM, ", blue),
        Span::styled("D", state_style(PageState::SoftDirty)),
        Span::styled(" dirty, ", blue),
        Span::styled("S", state_style(PageState::Swapped)),
        Span::styled(" swap, ", blue),
        Span::styled(".", gutter_style()),
        Span::styled(" not in RAM  [tab detail, space view, +/- zoom, q quit]", blue),
    ];
    Paragraph::new(Line::from(spans))
}

fn render_detail(frame: &mut Frame, area: Rect, detail: &crate::snapshot::PageDetail) {
    let width = 52.min(area.width.saturating_sub(4));
    let height = 12.min(area.height.saturating_sub(3));
    if width < 30 || height < 8 {
        return;
    }
    let rect = Rect::new(4, 2, width, height);

    let yes_no = |set: bool| if set { "Yes" } else { "No" };
    let (raw, flags) = match detail.entry {
        Some(entry) => (format!("0x{:016x}", entry.0), Some(entry.flags())),
        None => ("unavailable".to_owned(), None),
    };
    let mut lines = vec![
        Line::from(format!(" Page:   0x{:016x}", detail.addr)),
        Line::from(format!(" Map:    0x{:x}-0x{:x}", detail.begin, detail.end)),
        Line::from(format!(" Device: {}", detail.device)),
        Line::from(format!(" Prot:   {}", detail.perms)),
        Line::from(format!(" File:   {:<20.20}", detail.name)),
        Line::from(format!(" Flags:  {raw}")),
    ];
    if let Some(flags) = flags {
        lines.push(Line::from(format!(
            "   Present in RAM:      {}",
            yes_no(flags.present)
        )));
        lines.push(Line::from(format!(
            "   Present in Swap:     {}",
            yes_no(flags.swapped)
        )));
        lines.push(Line::from(format!(
            "   File or Shared Anon: {}",
            yes_no(flags.file_or_shared_anon)
        )));
        lines.push(Line::from(format!(
            "   Soft-dirty PTE:      {}",
            yes_no(flags.soft_dirty)
        )));
    }

    let panel = Paragraph::new(lines)
        .style(title_style())
        .block(Block::default().borders(Borders::ALL).title("Page"));
    frame.render_widget(Clear, rect);
    frame.render_widget(panel, rect);
}
