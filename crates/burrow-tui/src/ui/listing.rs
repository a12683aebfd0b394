//! Sized list rows: name, size, bar and share of total.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use burrow_core::EntrySize;

use crate::app::constants::BAR_WIDTH;
use crate::theme::Theme;

use super::{SizeBar, format_size, truncate_to_width};

const MARK_WIDTH: u16 = 2;
const SIZE_WIDTH: u16 = 12;
const SHARE_WIDTH: u16 = 8;

/// What a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Directory,
    /// Directory sized as a whole and never entered.
    Folded,
    File,
}

/// One display row, already derived from its entry.
#[derive(Debug, Clone)]
pub struct ListRow {
    pub name: String,
    pub kind: RowKind,
    pub size: EntrySize,
    /// Fill of the size bar, relative to the largest row.
    pub bar: f64,
    /// Share of the total, when the rows add up to one.
    pub share: Option<f64>,
    pub color: Color,
    pub selected: bool,
    pub note: Option<&'static str>,
}

/// Bar fill and share of total for one size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetric {
    pub bar: f64,
    pub share: f64,
}

/// Bars are relative to the largest size, shares to the sum.
pub fn row_metrics(sizes: &[u64]) -> Vec<RowMetric> {
    let largest = sizes.iter().copied().max().unwrap_or(0);
    let total: u64 = sizes.iter().sum();
    sizes
        .iter()
        .map(|&size| RowMetric {
            bar: ratio(size, largest),
            share: ratio(size, total),
        })
        .collect()
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Size column text.
pub fn size_label(size: EntrySize) -> String {
    match size {
        EntrySize::Known(bytes) => format_size(bytes),
        EntrySize::Pending(0) => "pending…".to_string(),
        EntrySize::Pending(bytes) => format!("{}…", format_size(bytes)),
        EntrySize::Unknown => "?".to_string(),
    }
}

/// The visible slice of a list.
pub struct ListView<'a> {
    rows: &'a [ListRow],
    /// Cursor position within `rows`.
    cursor: Option<usize>,
    theme: &'a Theme,
}

impl<'a> ListView<'a> {
    pub fn new(rows: &'a [ListRow], cursor: Option<usize>, theme: &'a Theme) -> Self {
        Self {
            rows,
            cursor,
            theme,
        }
    }

    fn render_row(&self, row: &ListRow, is_cursor: bool, area: Rect, buf: &mut Buffer) {
        if is_cursor {
            buf.set_style(area, self.theme.selected);
        }

        let name_width = area
            .width
            .saturating_sub(MARK_WIDTH + SIZE_WIDTH + BAR_WIDTH + 1 + SHARE_WIDTH);

        let mark = if row.selected {
            Span::styled("● ", self.theme.marked)
        } else {
            Span::raw("  ")
        };

        let (name, name_style) = match row.kind {
            RowKind::Directory => (format!("{}/", row.name), self.theme.directory),
            RowKind::Folded => (format!("{}/", row.name), self.theme.folded),
            RowKind::File => (row.name.clone(), self.theme.file),
        };
        let note = row.note.map(|n| format!(" [{n}]")).unwrap_or_default();
        let name = truncate_to_width(&name, (name_width as usize).saturating_sub(note.len()));
        let name_style = if row.selected {
            name_style.patch(self.theme.marked)
        } else {
            name_style
        };

        let size_style = if row.size.is_pending() {
            self.theme.pending
        } else {
            Style::new().fg(row.color)
        };

        let head = Line::from(vec![
            mark,
            Span::styled(name, name_style),
            Span::styled(note, Style::new().fg(self.theme.muted)),
        ]);
        buf.set_line(area.x, area.y, &head, MARK_WIDTH + name_width);

        let size_x = area.x + MARK_WIDTH + name_width;
        let size = Line::from(Span::styled(
            format!("{:>width$} ", size_label(row.size), width = SIZE_WIDTH as usize - 1),
            size_style,
        ));
        buf.set_line(size_x, area.y, &size, SIZE_WIDTH);

        let bar_x = size_x + SIZE_WIDTH;
        let bar_width = BAR_WIDTH.min(area.right().saturating_sub(bar_x));
        let bar_area = Rect::new(bar_x, area.y, bar_width, 1);
        SizeBar::new(row.bar)
            .style(Style::new().fg(row.color))
            .track_style(self.theme.progress_bg)
            .pending(row.size.is_pending())
            .render(bar_area, buf);

        if let Some(share) = row.share {
            let share_x = bar_x + BAR_WIDTH + 1;
            if share_x < area.right() {
                let text = Line::from(Span::styled(
                    format!("{:>6.1}%", share * 100.0),
                    Style::new().fg(self.theme.muted),
                ));
                buf.set_line(share_x, area.y, &text, area.right() - share_x);
            }
        }
    }
}

impl Widget for ListView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        for (i, row) in self.rows.iter().take(area.height as usize).enumerate() {
            let row_area = Rect::new(area.x, area.y + i as u16, area.width, 1);
            self.render_row(row, self.cursor == Some(i), row_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u64 = 10_000_000;
    const B: u64 = 5_000_000;
    const C: u64 = 2_000_000_000;

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_metrics_relative_to_largest_and_total() {
        let metrics = row_metrics(&[C, A, B]);
        assert_eq!(metrics[0].bar, 1.0);
        assert!((metrics[1].bar - 0.005).abs() < 1e-12);
        assert!((metrics[2].bar - 0.0025).abs() < 1e-12);

        let total = (A + B + C) as f64;
        assert!((metrics[0].share - C as f64 / total).abs() < 1e-12);
        assert!((metrics[0].share * 100.0 - 99.256).abs() < 0.001);
        let sum: f64 = metrics.iter().map(|m| m.share).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_all_zero() {
        let metrics = row_metrics(&[0, 0]);
        assert!(metrics.iter().all(|m| m.bar == 0.0 && m.share == 0.0));
        assert!(row_metrics(&[]).is_empty());
    }

    #[test]
    fn test_size_labels() {
        assert_eq!(size_label(EntrySize::Pending(0)), "pending…");
        assert_eq!(size_label(EntrySize::Pending(2_000)), "2 kB…");
        assert_eq!(size_label(EntrySize::Known(C)), "2 GB");
        assert_eq!(size_label(EntrySize::Unknown), "?");
    }

    #[test]
    fn test_render_rows() {
        let theme = Theme::dark();
        let rows = vec![
            ListRow {
                name: "C".into(),
                kind: RowKind::Folded,
                size: EntrySize::Known(C),
                bar: 1.0,
                share: Some(0.9926),
                color: theme.size_huge,
                selected: false,
                note: Some("folded"),
            },
            ListRow {
                name: "B".into(),
                kind: RowKind::File,
                size: EntrySize::Known(B),
                bar: 0.0025,
                share: Some(0.0025),
                color: theme.size_tiny,
                selected: true,
                note: None,
            },
        ];
        let area = Rect::new(0, 0, 70, 3);
        let mut buf = Buffer::empty(area);
        ListView::new(&rows, Some(0), &theme).render(area, &mut buf);

        let first = line(&buf, 0);
        assert!(first.contains("C/ [folded]"));
        assert!(first.contains("2 GB"));
        assert!(first.contains("99.3%"));
        assert_eq!(buf[(0, 0)].bg, theme.selected.bg.unwrap());

        let second = line(&buf, 1);
        assert!(second.starts_with("● B"));
        assert!(line(&buf, 2).trim().is_empty());
    }
}
