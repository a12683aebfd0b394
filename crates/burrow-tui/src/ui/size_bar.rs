//! Size bar widget for visualizing relative sizes.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

/// Block characters for 0 to 8 eighths of a cell.
const EIGHTHS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// A horizontal bar showing a size relative to the largest sibling.
///
/// Fills in eighths of a cell. While the size is still growing the fill uses
/// a shaded glyph so partial sums read differently from final ones.
pub struct SizeBar {
    /// Value to display (0.0 - 1.0).
    ratio: f64,
    style: Style,
    track_style: Style,
    pending: bool,
}

impl SizeBar {
    pub fn new(ratio: f64) -> Self {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            ratio,
            style: Style::default(),
            track_style: Style::default(),
            pending: false,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Style for the unfilled track.
    pub fn track_style(mut self, style: Style) -> Self {
        self.track_style = style;
        self
    }

    /// Mark the size as still being computed.
    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }
}

impl Widget for SizeBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let eighths = (area.width as f64 * 8.0 * self.ratio).round() as u16;
        let full = eighths / 8;
        let partial = (eighths % 8) as usize;

        for x in 0..area.width {
            let cell = &mut buf[(area.x + x, area.y)];
            if x < full {
                let glyph = if self.pending { '▒' } else { EIGHTHS[8] };
                cell.set_char(glyph).set_style(self.style);
            } else if x == full && partial > 0 && !self.pending {
                cell.set_char(EIGHTHS[partial]).set_style(self.style);
            } else {
                cell.set_char('·').set_style(self.track_style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(bar: SizeBar, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_full_and_empty() {
        assert_eq!(render(SizeBar::new(1.0), 4), "████");
        assert_eq!(render(SizeBar::new(0.0), 4), "····");
    }

    #[test]
    fn test_partial_cell() {
        // 0.5 of 3 cells is 12 eighths: one full cell and a half block.
        assert_eq!(render(SizeBar::new(0.5), 3), "█▌·");
    }

    #[test]
    fn test_pending_uses_shade() {
        assert_eq!(render(SizeBar::new(0.5).pending(true), 4), "▒▒··");
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        assert_eq!(render(SizeBar::new(3.0), 2), "██");
        assert_eq!(render(SizeBar::new(f64::NAN), 2), "··");
    }
}
