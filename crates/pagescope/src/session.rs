//! Session — the cooperative polling loop driving one monitored process.
//!
//! One tick: consume pending terminal events (resize coalesced, at most one
//! key), re-sample the mapping model, apply the intent, build a snapshot,
//! draw. The page array is replaced wholesale on rebuild and handed out as
//! an immutable borrow for the rest of the tick, so nothing ever observes a
//! half-updated address space.

use crate::snapshot;
use crate::ui::Presenter;
use crate::viewport::{Intent, Viewport};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pagemap::{AddressSpaceModel, AddressSpaceReader, PagemapResult, ProcProcess};
use std::time::Duration;
use tracing::debug;

/// Session configuration, fixed at startup.
pub struct Config {
    /// Poll interval between ticks.
    pub tick: Duration,
    /// Clear soft-dirty bits every N ticks; 0 disables.
    pub clear_refs_ticks: u32,
    /// Ceiling on the total page count.
    pub max_pages: u64,
    pub page_size: u64,
    /// Start with auto-zoom enabled.
    pub auto_zoom: bool,
}

/// What a key press asks the session to do.
enum KeyAction {
    Quit,
    ToggleDetail,
    Navigate(Intent),
}

pub struct Session {
    proc: ProcProcess,
    model: AddressSpaceModel,
    reader: AddressSpaceReader,
    viewport: Viewport,
    cfg: Config,
    show_detail: bool,
    tick: u64,
}

impl Session {
    pub fn new(pid: i32, cfg: Config) -> PagemapResult<Self> {
        let proc = ProcProcess::new(pid)?;
        let reader = proc.open_reader(cfg.page_size)?;
        let model = AddressSpaceModel::new(cfg.page_size, cfg.max_pages);
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(cfg.page_size, cols, rows, cfg.auto_zoom);
        Ok(Session {
            proc,
            model,
            reader,
            viewport,
            cfg,
            show_detail: false,
            tick: 0,
        })
    }

    /// Run ticks until quit or a fatal error.
    pub fn run(&mut self, presenter: &mut Presenter) -> PagemapResult<()> {
        loop {
            // Pending events first: multiple resizes collapse to the last
            // one, and at most one navigation key is consumed per tick.
            let timeout = if self.tick == 0 {
                Duration::ZERO
            } else {
                self.cfg.tick
            };
            let mut resize: Option<(u16, u16)> = None;
            let mut action: Option<KeyAction> = None;
            let mut waited = event::poll(timeout)?;
            while waited {
                match event::read()? {
                    Event::Resize(cols, rows) => resize = Some((cols, rows)),
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if action.is_none() {
                            action = map_key(key);
                        }
                    }
                    _ => {}
                }
                waited = event::poll(Duration::ZERO)?;
            }

            if !self.proc.alive() {
                return Err(pagemap::PagemapError::NoProcess(self.proc.pid()));
            }

            let maps = self.proc.read_maps()?;
            let outcome = self.model.refresh(&maps, false)?;
            debug!(?outcome, tick = self.tick, "sampled mappings");

            let count = self.model.page_count();
            if let Some((cols, rows)) = resize {
                self.viewport.apply(Intent::Resize(cols, rows), count);
            }
            // A shrink since the last sample may have stranded the cursor.
            self.viewport.revalidate(count);
            self.viewport.apply_auto_zoom(count);

            match action {
                Some(KeyAction::Quit) => return Ok(()),
                Some(KeyAction::ToggleDetail) => self.show_detail = !self.show_detail,
                Some(KeyAction::Navigate(intent)) => self.viewport.apply(intent, count),
                None => {}
            }
            self.viewport.tick_blink();

            self.tick += 1;
            if self.cfg.clear_refs_ticks > 0
                && self.tick % self.cfg.clear_refs_ticks as u64 == 0
            {
                self.proc.clear_soft_dirty();
            }

            let snap = snapshot::build(&self.model, &self.reader, &self.viewport, self.show_detail);
            presenter.draw(&snap, self.proc.pid())?;
        }
    }
}

/// Translate a key press into a session action.
fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Tab => KeyAction::ToggleDetail,
        KeyCode::Char(' ') => KeyAction::Navigate(Intent::SwitchView),
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::Navigate(Intent::ZoomIn),
        KeyCode::Char('-') => KeyAction::Navigate(Intent::ZoomOut),
        KeyCode::Char('[') => KeyAction::Navigate(Intent::ZoomMin),
        KeyCode::Char(']') => KeyAction::Navigate(Intent::ZoomMax),
        KeyCode::Char('a') => KeyAction::Navigate(Intent::ToggleAutoZoom),
        KeyCode::Up => KeyAction::Navigate(Intent::Move(0, -1)),
        KeyCode::Down => KeyAction::Navigate(Intent::Move(0, 1)),
        KeyCode::Left => KeyAction::Navigate(Intent::Move(-1, 0)),
        KeyCode::Right => KeyAction::Navigate(Intent::Move(1, 0)),
        KeyCode::PageUp => KeyAction::Navigate(Intent::PageUp),
        KeyCode::PageDown => KeyAction::Navigate(Intent::PageDown),
        KeyCode::Home => KeyAction::Navigate(Intent::Home),
        KeyCode::End => KeyAction::Navigate(Intent::End),
        _ => return None,
    };
    Some(action)
}
