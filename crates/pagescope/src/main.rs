//! pagescope: live page-table monitor for a running Linux process.
//!
//! Renders the target's address space as a scrollable grid of page-state
//! glyphs (or a raw hex view of memory contents), refreshed every tick
//! from `/proc/<pid>/{maps,pagemap,mem}`.

mod session;
mod snapshot;
mod ui;
mod viewport;

use clap::Parser;
use pagemap::PagemapResult;
use session::{Config, Session};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ui::Presenter;

#[derive(Parser, Debug)]
#[command(name = "pagescope", version, about = "Monitor page residency of a running process")]
struct Args {
    /// Pid of the process to monitor
    pid: i32,

    /// Refresh interval in milliseconds
    #[arg(short = 't', long, default_value_t = 100)]
    interval: u64,

    /// Clear the target's soft-dirty bits every N ticks (0 disables)
    #[arg(long, default_value_t = 10)]
    clear_refs: u32,

    /// Page size in bytes, overriding the system page size
    #[arg(short, long)]
    page_size: Option<u64>,

    /// Give up on address spaces with more pages than this
    #[arg(long, default_value_t = 1 << 32)]
    max_pages: u64,

    /// Start with the zoom fitted to the whole address space
    #[arg(short, long)]
    auto_zoom: bool,
}

fn main() {
    // Logs go to stderr so the alternate screen stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let page_size = args.page_size.unwrap_or_else(pagemap::system_page_size);
    if !page_size.is_power_of_two() {
        eprintln!("pagescope: page size {page_size} is not a power of two");
        std::process::exit(1);
    }

    let cfg = Config {
        tick: Duration::from_millis(args.interval.max(1)),
        clear_refs_ticks: args.clear_refs,
        max_pages: args.max_pages,
        page_size,
        auto_zoom: args.auto_zoom,
    };

    match run(args.pid, cfg) {
        Ok(()) => {}
        Err(err) => {
            // The presenter has already restored the terminal by now.
            eprintln!("pagescope: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(pid: i32, cfg: Config) -> PagemapResult<()> {
    let mut session = Session::new(pid, cfg)?;
    let mut presenter = Presenter::new()?;
    session.run(&mut presenter)
}
