//! Application rendering.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use itertools::Itertools;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Widget};

use burrow_core::{LargeFileEntry, OverviewEntry};
use burrow_scan::ScanProgress;

use crate::theme::Theme;
use crate::ui::modals::{DeleteConfirmModal, DeletionProgressModal, FileInfoModal};
use crate::ui::{
    HelpOverlay, ListRow, ListView, RowKind, format_duration, format_size, row_metrics,
    truncate_left,
};

use super::navigation::Viewport;
use super::state::{ActiveDeletion, FileInfo, Listing, Mode, PendingDelete, Screen};

/// Render context containing all the state needed for rendering.
pub struct RenderContext<'a> {
    pub mode: Mode,
    pub screen: Screen,
    pub theme: &'a Theme,
    pub overview: &'a [OverviewEntry],
    pub overview_view: &'a Viewport,
    pub listing: &'a Listing,
    pub listing_view: &'a Viewport,
    /// Listing levels above the current one.
    pub depth: usize,
    pub large_root: &'a Path,
    pub large_files: &'a [LargeFileEntry],
    pub large_view: &'a Viewport,
    pub selected: &'a HashSet<PathBuf>,
    pub progress: &'a ScanProgress,
    pub spinner: char,
    pub completion: Option<u8>,
    pub pending_delete: Option<&'a PendingDelete>,
    pub deletion: Option<&'a ActiveDeletion>,
    pub to_trash: bool,
    pub show_help: bool,
    pub file_info: Option<&'a FileInfo>,
    pub message: Option<&'a (bool, String)>,
    pub now: SystemTime,
}

impl RenderContext<'_> {
    fn viewport(&self) -> &Viewport {
        match self.screen {
            Screen::Overview => self.overview_view,
            Screen::Listing => self.listing_view,
            Screen::LargeFiles => self.large_view,
        }
    }

    /// Number of rows and their combined size on the current screen.
    fn totals(&self) -> (usize, u64) {
        match self.screen {
            Screen::Overview => (
                self.overview.len(),
                self.overview.iter().map(|o| o.entry.bytes()).sum(),
            ),
            Screen::Listing => (
                self.listing.entries.len(),
                self.listing.entries.iter().map(|e| e.bytes()).sum(),
            ),
            Screen::LargeFiles => (
                self.large_files.len(),
                self.large_files.iter().map(|f| f.size).sum(),
            ),
        }
    }

    fn selected_size(&self) -> u64 {
        match self.screen {
            Screen::Overview => 0,
            Screen::Listing => self
                .listing
                .entries
                .iter()
                .filter(|e| self.selected.contains(&e.path))
                .map(|e| e.bytes())
                .sum(),
            Screen::LargeFiles => self
                .large_files
                .iter()
                .filter(|f| self.selected.contains(&f.path))
                .map(|f| f.size)
                .sum(),
        }
    }
}

/// Main render function for the application.
pub fn render_app(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let base_style = Style::default()
        .bg(ctx.theme.background)
        .fg(ctx.theme.foreground);
    buf.set_style(area, base_style);

    let [header, location, progress, body, status, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(ctx, header, buf);
    render_location(ctx, location, buf);
    render_progress(ctx, progress, buf);
    render_body(ctx, body, buf);
    render_status(ctx, status, buf);
    render_footer(ctx, footer, buf);

    match ctx.mode {
        Mode::ConfirmDelete => {
            if let Some(pending) = ctx.pending_delete {
                DeleteConfirmModal::new(ctx.theme, pending, ctx.to_trash).render(area, buf);
            }
        }
        Mode::Deleting => {
            if let Some(deletion) = ctx.deletion {
                DeletionProgressModal::new(ctx.theme, deletion).render(area, buf);
            }
        }
        _ => {}
    }

    if let Some(info) = ctx.file_info {
        FileInfoModal::new(ctx.theme, info, ctx.now).render(area, buf);
    }
    if ctx.show_help {
        HelpOverlay::new(ctx.theme).render(area, buf);
    }
}

fn render_header(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, ctx.theme.header);

    let (count, total) = ctx.totals();
    let noun = match ctx.screen {
        Screen::LargeFiles => "files",
        _ => "items",
    };
    let line = Line::from(vec![
        Span::styled(" burrow ", ctx.theme.title.add_modifier(Modifier::BOLD)),
        Span::styled(format!("· {} ", ctx.screen), ctx.theme.header),
        Span::styled(
            format!(" {} in {count} {noun} ", format_size(total)),
            ctx.theme.header.add_modifier(Modifier::BOLD),
        ),
    ]);
    buf.set_line(area.x, area.y, &line, area.width);
}

/// `/Users/me/Library` as `/ › Users › me › Library`.
fn breadcrumbs(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some("/".to_string()),
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir | Component::ParentDir => None,
        })
        .join(" › ")
}

fn render_location(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let place = match ctx.screen {
        Screen::Overview => "Well-known locations".to_string(),
        Screen::Listing => breadcrumbs(&ctx.listing.root),
        Screen::LargeFiles => format!("Largest files under {}", ctx.large_root.display()),
    };

    let mut spans = Vec::new();
    if !ctx.selected.is_empty() {
        spans.push(Span::styled(
            format!(
                " ● {} selected ({}) ",
                ctx.selected.len(),
                format_size(ctx.selected_size())
            ),
            ctx.theme.marked,
        ));
    }
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let width = (area.width as usize).saturating_sub(used + 1);
    spans.insert(
        0,
        Span::styled(
            format!(" {}", truncate_left(&place, width)),
            Style::default().fg(ctx.theme.info),
        ),
    );
    buf.set_line(area.x, area.y, &Line::from(spans), area.width);
}

fn render_progress(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let p = ctx.progress;
    let muted = Style::default().fg(ctx.theme.muted);

    let line = if ctx.mode.is_scanning() {
        let verb = match ctx.screen {
            Screen::LargeFiles => "Searching",
            _ => "Scanning",
        };
        let mut spans = vec![
            Span::styled(format!(" {} {verb} ", ctx.spinner), ctx.theme.progress_bar),
            Span::raw(format!(
                "{} files · {} dirs · {}",
                p.files_scanned,
                p.dirs_scanned,
                format_size(p.bytes_scanned)
            )),
            Span::styled(format!(" · {:.0}/s", p.files_per_second()), muted),
        ];
        if p.errors_count > 0 {
            spans.push(Span::styled(
                format!(" · {} unreadable", p.errors_count),
                Style::default().fg(ctx.theme.warning),
            ));
        }
        if let Some(pct) = ctx.completion {
            spans.push(Span::styled(
                format!(" · {pct}%"),
                ctx.theme.progress_bar.add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    } else {
        let text = match ctx.screen {
            Screen::Overview => {
                let cached = ctx.overview.iter().filter(|o| o.cached).count();
                format!(" {cached} of {} sizes from cache · r to rescan", ctx.overview.len())
            }
            Screen::Listing if ctx.listing.complete => {
                let mut text = format!(" Scanned in {}", format_duration(p.elapsed));
                if ctx.listing.errors > 0 {
                    text.push_str(&format!(" · {} unreadable", ctx.listing.errors));
                }
                text
            }
            Screen::Listing => " Incomplete · r to rescan".to_string(),
            Screen::LargeFiles => format!(" {} files found", ctx.large_files.len()),
        };
        Line::styled(text, muted)
    };
    buf.set_line(area.x, area.y, &line, area.width);
}

fn overview_rows(ctx: &RenderContext) -> Vec<ListRow> {
    let sizes: Vec<u64> = ctx.overview.iter().map(|o| o.entry.bytes()).collect();
    let metrics = row_metrics(&sizes);
    ctx.overview_view
        .visible_range()
        .map(|i| {
            let item = &ctx.overview[i];
            ListRow {
                name: format!("{}  {}", item.label, item.entry.path.display()),
                kind: RowKind::Directory,
                size: item.entry.size,
                bar: metrics[i].bar,
                share: Some(metrics[i].share),
                color: ctx.theme.size_color(metrics[i].share),
                selected: false,
                note: item.cached.then_some("cached"),
            }
        })
        .collect()
}

fn listing_rows(ctx: &RenderContext) -> Vec<ListRow> {
    let entries = &ctx.listing.entries;
    let sizes: Vec<u64> = entries.iter().map(|e| e.bytes()).collect();
    let metrics = row_metrics(&sizes);
    ctx.listing_view
        .visible_range()
        .map(|i| {
            let entry = &entries[i];
            let kind = match (entry.is_dir, entry.folded) {
                (true, true) => RowKind::Folded,
                (true, false) => RowKind::Directory,
                (false, _) => RowKind::File,
            };
            ListRow {
                name: entry.name.to_string(),
                kind,
                size: entry.size,
                bar: metrics[i].bar,
                share: Some(metrics[i].share),
                color: ctx.theme.size_color(metrics[i].share),
                selected: ctx.selected.contains(&entry.path),
                note: entry.folded.then_some("folded"),
            }
        })
        .collect()
}

fn large_rows(ctx: &RenderContext) -> Vec<ListRow> {
    let largest = ctx.large_files.first().map_or(0, |f| f.size);
    ctx.large_view
        .visible_range()
        .map(|i| {
            let file = &ctx.large_files[i];
            let shown = file.path.strip_prefix(ctx.large_root).unwrap_or(&file.path);
            ListRow {
                name: shown.display().to_string(),
                kind: RowKind::File,
                size: burrow_core::EntrySize::Known(file.size),
                bar: if largest == 0 {
                    0.0
                } else {
                    file.size as f64 / largest as f64
                },
                share: None,
                color: ctx.theme.tier_color(file.size),
                selected: ctx.selected.contains(&file.path),
                note: None,
            }
        })
        .collect()
}

fn render_body(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let viewport = ctx.viewport();
    let (page, pages) = viewport.page();
    let title = match ctx.screen {
        Screen::Overview => " Overview ".to_string(),
        Screen::Listing => {
            let name = ctx
                .listing
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| ctx.listing.root.display().to_string());
            format!(" {name} ")
        }
        Screen::LargeFiles => " Large files ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_style(ctx.theme.title)
        .title_bottom(Line::styled(format!(" {page}/{pages} "), ctx.theme.border).right_aligned())
        .borders(Borders::ALL)
        .border_style(ctx.theme.border);
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = match ctx.screen {
        Screen::Overview => overview_rows(ctx),
        Screen::Listing => listing_rows(ctx),
        Screen::LargeFiles => large_rows(ctx),
    };

    if rows.is_empty() {
        let text = if ctx.mode.is_scanning() {
            "Listing…"
        } else {
            match ctx.screen {
                Screen::LargeFiles => "No files above the size threshold",
                _ => "Empty",
            }
        };
        buf.set_line(
            inner.x + 2,
            inner.y,
            &Line::styled(text, Style::default().fg(ctx.theme.muted)),
            inner.width.saturating_sub(2),
        );
        return;
    }

    let cursor = viewport.cursor().checked_sub(viewport.top());
    ListView::new(&rows, cursor, ctx.theme).render(inner, buf);
}

fn render_status(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    let line = match ctx.message {
        Some((success, msg)) => {
            let color = if *success {
                ctx.theme.success
            } else {
                ctx.theme.warning
            };
            Line::styled(format!(" {msg}"), Style::default().fg(color))
        }
        None if ctx.depth > 0 => Line::styled(
            format!(" {} levels deep · Backspace to go up", ctx.depth),
            Style::default().fg(ctx.theme.muted),
        ),
        None => Line::raw(""),
    };
    buf.set_line(area.x, area.y, &line, area.width);
}

fn render_footer(ctx: &RenderContext, area: Rect, buf: &mut Buffer) {
    buf.set_style(area, ctx.theme.footer);

    let mut keys: Vec<(&str, &str)> = match ctx.mode {
        Mode::ConfirmDelete => vec![("y", "Confirm"), ("n", "Cancel")],
        Mode::Deleting => vec![("Esc", "Interrupt")],
        _ => match ctx.screen {
            Screen::Overview => vec![
                ("j/k", "Nav"),
                ("Enter", "Open"),
                ("l", "Large"),
                ("r", "Rescan"),
            ],
            Screen::Listing => {
                let mut v = vec![("j/k", "Nav"), ("Enter", "Open"), ("Bksp", "Back")];
                v.push(if ctx.selected.is_empty() {
                    ("Spc", "Select")
                } else {
                    ("d", "Delete")
                });
                v.extend([("l", "Large"), ("r", "Rescan")]);
                v
            }
            Screen::LargeFiles => {
                let mut v = vec![("j/k", "Nav"), ("l", "Back")];
                v.push(if ctx.selected.is_empty() {
                    ("Spc", "Select")
                } else {
                    ("d", "Delete")
                });
                v.push(("o", "Open"));
                v
            }
        },
    };
    if !matches!(ctx.mode, Mode::ConfirmDelete | Mode::Deleting) {
        keys.extend([("?", "Help"), ("q", "Quit")]);
    }

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(format!(" {key} "), ctx.theme.help_key),
                Span::styled(format!("{desc} "), ctx.theme.help_desc),
            ]
        })
        .collect();
    buf.set_line(area.x, area.y, &Line::from(spans), area.width);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::Phase;
    use burrow_core::{Entry, EntrySize};

    fn rendered(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .join("\n")
    }

    #[test]
    fn test_breadcrumbs() {
        assert_eq!(
            breadcrumbs(Path::new("/Users/me/Library")),
            "/ › Users › me › Library"
        );
    }

    #[test]
    fn test_render_listing_screen() {
        let theme = Theme::dark();
        let mut listing = Listing::new("/data");
        listing.entries = vec![
            Entry::sized("/data/videos", true, false, EntrySize::Known(3_000_000)),
            Entry::sized("/data/node_modules", true, true, EntrySize::Known(1_000_000)),
        ];
        listing.complete = true;
        let mut listing_view = Viewport::new(10);
        listing_view.set_len(listing.entries.len());
        let empty_view = Viewport::default();
        let selected: HashSet<PathBuf> = [PathBuf::from("/data/videos")].into_iter().collect();
        let progress = ScanProgress::default();

        let ctx = RenderContext {
            mode: Mode::Listing(Phase::Ready),
            screen: Screen::Listing,
            theme: &theme,
            overview: &[],
            overview_view: &empty_view,
            listing: &listing,
            listing_view: &listing_view,
            depth: 1,
            large_root: Path::new("/data"),
            large_files: &[],
            large_view: &empty_view,
            selected: &selected,
            progress: &progress,
            spinner: '⠋',
            completion: None,
            pending_delete: None,
            deletion: None,
            to_trash: false,
            show_help: false,
            file_info: None,
            message: None,
            now: SystemTime::now(),
        };

        let area = Rect::new(0, 0, 100, 16);
        let mut buf = Buffer::empty(area);
        render_app(&ctx, area, &mut buf);
        let text = rendered(&buf);

        assert!(text.contains("4 MB in 2 items"));
        assert!(text.contains("/ › data"));
        assert!(text.contains("1 selected (3 MB)"));
        assert!(text.contains("videos"));
        assert!(text.contains("[folded]"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("1 levels deep"));
        assert!(text.contains("Delete"));
    }

    #[test]
    fn test_no_percentage_before_children_listed() {
        let theme = Theme::dark();
        let listing = Listing::new("/huge");
        let view = Viewport::default();
        let selected = HashSet::new();
        let progress = ScanProgress::default();

        let ctx = RenderContext {
            mode: Mode::Listing(Phase::Scanning),
            screen: Screen::Listing,
            theme: &theme,
            overview: &[],
            overview_view: &view,
            listing: &listing,
            listing_view: &view,
            depth: 0,
            large_root: Path::new("/huge"),
            large_files: &[],
            large_view: &view,
            selected: &selected,
            progress: &progress,
            spinner: '⠋',
            completion: listing.completion(),
            pending_delete: None,
            deletion: None,
            to_trash: false,
            show_help: false,
            file_info: None,
            message: None,
            now: SystemTime::now(),
        };

        let area = Rect::new(0, 0, 100, 12);
        let mut buf = Buffer::empty(area);
        render_app(&ctx, area, &mut buf);
        let text = rendered(&buf);

        let progress_line = text.lines().nth(2).unwrap_or_default();
        assert!(progress_line.contains("Scanning"));
        assert!(!progress_line.contains('%'));
        assert!(text.contains("Listing…"));
    }
}
