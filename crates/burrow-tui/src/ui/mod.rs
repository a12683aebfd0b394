//! UI components and widgets.

mod help;
pub mod listing;
pub mod modals;
mod size_bar;

pub use help::HelpOverlay;
pub use listing::{ListRow, ListView, RowKind, row_metrics};
pub use size_bar::SizeBar;

use std::time::{Duration, SystemTime};

use ratatui::layout::Rect;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format a byte size in human-readable form (powers of 1000).
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::DECIMAL)
}

/// Format a duration in human-readable form.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Format a timestamp relative to `now`.
pub fn format_relative_time(time: SystemTime, now: SystemTime) -> String {
    match now.duration_since(time) {
        Ok(duration) => {
            let secs = duration.as_secs();
            if secs < 60 {
                "just now".to_string()
            } else if secs < 3600 {
                format!("{}m ago", secs / 60)
            } else if secs < 86400 {
                format!("{}h ago", secs / 3600)
            } else if secs < 2592000 {
                format!("{}d ago", secs / 86400)
            } else if secs < 31536000 {
                format!("{}mo ago", secs / 2592000)
            } else {
                format!("{}y ago", secs / 31536000)
            }
        }
        Err(_) => "in future".to_string(),
    }
}

/// Cut `text` to at most `width` terminal columns, ending in `…` when cut.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Keep the end of `text`, e.g. the tail of a long path.
pub fn truncate_left(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut tail: Vec<char> = Vec::new();
    let mut used = 0;
    for ch in text.chars().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        tail.push(ch);
        used += w;
    }
    std::iter::once('…').chain(tail.into_iter().rev()).collect()
}

/// A centered popup of at most `width` x `height` inside `area`.
pub fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_is_decimal() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(10_000_000), "10 MB");
        assert_eq!(format_size(2_000_000_000), "2 GB");
    }

    #[test]
    fn test_relative_time() {
        let now = SystemTime::now();
        assert_eq!(format_relative_time(now, now), "just now");
        assert_eq!(
            format_relative_time(now - Duration::from_secs(3 * 86400), now),
            "3d ago"
        );
        assert_eq!(
            format_relative_time(now + Duration::from_secs(60), now),
            "in future"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("node_modules", 20), "node_modules");
        assert_eq!(truncate_to_width("node_modules", 5), "node…");
        assert_eq!(truncate_to_width("日本語のファイル", 5), "日本…");
        assert_eq!(truncate_left("/a/very/long/path", 6), "…/path");
    }

    #[test]
    fn test_popup_area_fits() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = popup_area(area, 60, 20);
        assert!(popup.width <= area.width && popup.height <= area.height);
        assert_eq!(popup.x, 2);
    }
}
