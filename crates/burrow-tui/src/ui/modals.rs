//! Modal dialog widgets.

use std::time::SystemTime;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::app::state::{ActiveDeletion, FileInfo, PendingDelete};
use crate::theme::Theme;

use super::listing::size_label;
use super::{format_relative_time, format_size, popup_area, truncate_left};

/// Confirmation dialog for deletion.
pub struct DeleteConfirmModal<'a> {
    theme: &'a Theme,
    pending: &'a PendingDelete,
    to_trash: bool,
}

impl<'a> DeleteConfirmModal<'a> {
    pub fn new(theme: &'a Theme, pending: &'a PendingDelete, to_trash: bool) -> Self {
        Self {
            theme,
            pending,
            to_trash,
        }
    }
}

impl Widget for DeleteConfirmModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let count = self.pending.items.len();
        let rows = u16::try_from(count).unwrap_or(u16::MAX).saturating_add(8);
        let popup = popup_area(area, 64, rows);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Confirm Deletion ")
            .title_style(
                Style::default()
                    .fg(self.theme.error)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.error));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let verb = if self.to_trash {
            "Move to trash"
        } else {
            "Permanently delete"
        };
        let noun = if count == 1 { "item" } else { "items" };
        let mut lines = vec![
            Line::styled(
                format!(
                    "{verb} {count} {noun} ({})?",
                    format_size(self.pending.total_size())
                ),
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::raw(""),
        ];

        let max_items = (inner.height as usize).saturating_sub(5);
        let path_width = (inner.width as usize).saturating_sub(14);
        for (path, size) in self.pending.items.iter().take(max_items) {
            lines.push(Line::from(vec![
                Span::styled(format!("{:>10}  ", format_size(*size)), self.theme.help_desc),
                Span::raw(truncate_left(&path.display().to_string(), path_width)),
            ]));
        }
        if count > max_items {
            lines.push(Line::styled(
                format!("  … and {} more", count - max_items),
                Style::default().fg(self.theme.muted),
            ));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(" y/Enter ", self.theme.help_key),
            Span::raw("Confirm  "),
            Span::styled(" n/Esc ", self.theme.help_key),
            Span::raw("Cancel"),
        ]));

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Progress dialog for a running deletion batch.
pub struct DeletionProgressModal<'a> {
    theme: &'a Theme,
    deletion: &'a ActiveDeletion,
}

impl<'a> DeletionProgressModal<'a> {
    pub fn new(theme: &'a Theme, deletion: &'a ActiveDeletion) -> Self {
        Self { theme, deletion }
    }
}

impl Widget for DeletionProgressModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = popup_area(area, 56, 10);
        Clear.render(popup, buf);

        let title = if self.deletion.interrupted {
            " Interrupting... "
        } else {
            " Deleting... "
        };
        let block = Block::default()
            .title(title)
            .title_style(
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.warning));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let progress = &self.deletion.progress;
        let pct = progress.percentage();
        let bar_width = (inner.width as usize).saturating_sub(10);
        let filled = (pct as usize * bar_width) / 100;
        let empty = bar_width.saturating_sub(filled);

        let mut lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("  ["),
                Span::styled("█".repeat(filled), Style::default().fg(self.theme.info)),
                Span::styled("░".repeat(empty), Style::default().fg(self.theme.muted)),
                Span::raw(format!("] {pct}%")),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::styled("  Removed:  ", self.theme.help_desc),
                Span::raw(format!(
                    "{} of {}",
                    self.deletion.removed_count(),
                    progress.total
                )),
            ]),
            Line::from(vec![
                Span::styled("  Freed:    ", self.theme.help_desc),
                Span::raw(format_size(progress.bytes_freed)),
            ]),
        ];

        if progress.failed > 0 {
            lines.push(Line::from(vec![
                Span::styled("  Failed:   ", Style::default().fg(self.theme.error)),
                Span::styled(
                    progress.failed.to_string(),
                    Style::default().fg(self.theme.error),
                ),
            ]));
        }

        if let Some(current) = &progress.current {
            let width = (inner.width as usize).saturating_sub(4);
            lines.push(Line::styled(
                format!("  {}", truncate_left(&current.display().to_string(), width)),
                Style::default().fg(self.theme.muted),
            ));
        }

        lines.push(Line::from(vec![
            Span::styled(" Esc ", self.theme.help_key),
            Span::raw("Stop after running deletions"),
        ]));

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Details for one path, including its last access time.
pub struct FileInfoModal<'a> {
    theme: &'a Theme,
    info: &'a FileInfo,
    now: SystemTime,
}

impl<'a> FileInfoModal<'a> {
    pub fn new(theme: &'a Theme, info: &'a FileInfo, now: SystemTime) -> Self {
        Self { theme, info, now }
    }
}

impl Widget for FileInfoModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = popup_area(area, 64, 9);
        Clear.render(popup, buf);

        let name = self
            .info
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.info.path.display().to_string());
        let block = Block::default()
            .title(format!(" {name} "))
            .title_style(self.theme.title)
            .borders(Borders::ALL)
            .border_style(self.theme.border);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let kind = match (self.info.is_dir, self.info.folded) {
            (true, true) => "Directory (folded, not explored)",
            (true, false) => "Directory",
            (false, _) => "File",
        };
        let last_access = match self.info.last_access {
            None => "looking up…".to_string(),
            Some(None) => "unknown".to_string(),
            Some(Some(time)) => format_relative_time(time, self.now),
        };
        let width = (inner.width as usize).saturating_sub(12);

        let field = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<9} "), self.theme.help_desc),
                Span::raw(value),
            ])
        };
        let lines = vec![
            Line::raw(""),
            field("Path", truncate_left(&self.info.path.display().to_string(), width)),
            field("Type", kind.to_string()),
            field("Size", size_label(self.info.size)),
            field("Last used", last_access),
            Line::raw(""),
            Line::from(vec![
                Span::styled(" Esc ", self.theme.help_key),
                Span::raw("Close"),
            ]),
        ];

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use burrow_core::EntrySize;

    use crate::app::state::Screen;

    fn text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.y..area.bottom())
            .map(|y| {
                (area.x..area.right())
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_confirm_shows_count_and_total() {
        let theme = Theme::dark();
        let pending = PendingDelete {
            items: vec![
                (PathBuf::from("/r/a"), 1_500_000),
                (PathBuf::from("/r/b"), 500_000),
            ],
            root: PathBuf::from("/r"),
            origin: Screen::Listing,
        };
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        DeleteConfirmModal::new(&theme, &pending, false).render(area, &mut buf);

        let rendered = text(&buf);
        assert!(rendered.contains("Permanently delete 2 items (2 MB)?"));
        assert!(rendered.contains("/r/a"));
        assert!(rendered.contains("y/Enter"));
    }

    #[test]
    fn test_confirm_with_huge_selection_fits_area() {
        let theme = Theme::dark();
        let pending = PendingDelete {
            items: (0..65_530)
                .map(|i| (PathBuf::from(format!("/r/{i}")), 1_000))
                .collect(),
            root: PathBuf::from("/r"),
            origin: Screen::Listing,
        };
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        DeleteConfirmModal::new(&theme, &pending, true).render(area, &mut buf);

        let rendered = text(&buf);
        assert!(rendered.contains("Move to trash 65530 items"));
        assert!(rendered.contains("… and 65519 more"));
        assert!(rendered.contains("/r/0"));
    }

    #[test]
    fn test_file_info_pending_lookup() {
        let theme = Theme::light();
        let info = FileInfo {
            path: PathBuf::from("/r/node_modules"),
            size: EntrySize::Known(42_000),
            is_dir: true,
            folded: true,
            last_access: None,
        };
        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        FileInfoModal::new(&theme, &info, SystemTime::now()).render(area, &mut buf);

        let rendered = text(&buf);
        assert!(rendered.contains("folded"));
        assert!(rendered.contains("42 kB"));
        assert!(rendered.contains("looking up"));
    }
}
