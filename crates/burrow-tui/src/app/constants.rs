//! Application-wide constants for the TUI.

use std::time::Duration;

/// Interval between progress samples while work is running.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Rows taken by everything except the list body: header, location,
/// progress line, the list block's two borders, status and footer.
pub const CHROME_ROWS: usize = 7;

/// Bounds on visible list rows.
pub const MIN_VIEWPORT_ROWS: usize = 3;
pub const MAX_VIEWPORT_ROWS: usize = 200;

/// Completed listings kept for instant back navigation.
pub const RETAINED_LISTINGS: usize = 32;

/// Width of the inline size bar column.
pub const BAR_WIDTH: u16 = 16;

/// Frames for the scanning spinner.
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
