//! Terminal user interface for burrow.
//!
//! An interactive disk-usage explorer built with ratatui.
//!
//! # Overview
//!
//! - **Overview** - Coarse sizes of well-known roots, served from a cache
//! - **Listing** - Direct children of a directory, sized live, largest first
//! - **Large files** - The biggest files under a root
//! - **Deletion** - Multi-select, confirm, delete with live progress
//!
//! # Usage
//!
//! ```rust,no_run
//! use burrow_tui::TuiConfig;
//!
//! // Start on the overview screen
//! burrow_tui::run(TuiConfig::default()).unwrap();
//! ```
//!
//! # Keyboard Navigation
//!
//! - `j`/`k` - Move down/up
//! - `Enter` - Drill into directory
//! - `Backspace` - Navigate back
//! - `l` - Large-file spotlight
//! - `Space` - Select
//! - `d` - Delete selection
//! - `?` - Help
//! - `q` - Quit

pub mod app;
mod event;
mod opener;
mod theme;
mod ui;

use std::path::PathBuf;

pub use app::{App, AppResult};
pub use theme::{Theme, ThemeVariant};

/// Startup options for the TUI.
#[derive(Debug, Clone, Default)]
pub struct TuiConfig {
    /// Start directly in a listing of this directory instead of the overview.
    pub start_path: Option<PathBuf>,
    /// Ignore cached overview sizes for this session.
    pub no_cache: bool,
}

/// Run the TUI application.
pub fn run(config: TuiConfig) -> AppResult<()> {
    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    let terminal = ratatui::init();
    let result = rt.block_on(App::new(config).run(terminal));
    ratatui::restore();

    // Scanner threads are blocking tasks; do not wait for them
    rt.shutdown_timeout(std::time::Duration::from_millis(100));

    result
}
