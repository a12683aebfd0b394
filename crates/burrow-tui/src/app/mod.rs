//! Main application state and logic.

pub(crate) mod constants;
mod deletion;
mod navigation;
mod render;
mod scanning;
pub mod state;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use burrow_core::{
    Entry, EntrySize, LargeFileEntry, OverviewEntry, PathSets, ScanConfig, ScanError,
    sort_entries,
};
use burrow_ops::{DEFAULT_CONCURRENCY, DeleteMode, DeletionItem, DeletionOutcome, DeletionRequest};
use burrow_scan::{
    DirScanner, LargeFileScanner, ScanProgress, ScanSummary, SizeCache, completion_percent,
    default_roots, plan_overview, roots_from_paths,
};

use crate::TuiConfig;
use crate::event::KeyAction;
use crate::opener;
use crate::theme::Theme;

use self::constants::{SPINNER_FRAMES, TICK_INTERVAL};
use self::deletion::{deletion_message, shrink_containing, spawn_deletion};
use self::navigation::{ListNavigator, Viewport};
use self::render::{RenderContext, render_app};
use self::scanning::{
    ScanJob, start_file_info, start_listing_scan, start_overview_scan, start_spotlight,
};
use self::state::{
    ActiveDeletion, AppEvent, FileInfo, Generations, Listing, Mode, NavFrame, PendingDelete,
    Phase, RetainedListings, Screen, UserSettings,
};

/// Application result type.
pub type AppResult<T> = color_eyre::Result<T>;

/// Main application state.
pub struct App {
    mode: Mode,
    theme: Theme,
    settings: UserSettings,
    sets: Arc<PathSets>,
    scanner: Arc<DirScanner>,
    spotlight: Arc<LargeFileScanner>,
    cache: SizeCache,
    /// Ignore cached overview sizes this session.
    no_cache: bool,
    /// Directory to open first instead of the overview.
    start_path: Option<PathBuf>,

    overview: Vec<OverviewEntry>,
    overview_cells: HashMap<PathBuf, Arc<AtomicU64>>,
    overview_view: Viewport,

    listing: Listing,
    listing_view: Viewport,
    /// Levels above the current listing, innermost last.
    history: Vec<NavFrame>,
    retained: RetainedListings,
    /// Position to apply once a rescanned level has been listed.
    pending_restore: Option<(usize, usize)>,

    large_root: PathBuf,
    large_files: Vec<LargeFileEntry>,
    large_view: Viewport,
    spotlight_origin: Screen,

    /// Paths selected on the current screen.
    selected: HashSet<PathBuf>,

    generations: Generations,
    /// Running overview or listing scan, and which screen it feeds.
    scan_job: Option<(ScanJob, Screen)>,
    spotlight_job: Option<ScanJob>,
    progress: ScanProgress,
    spinner: usize,

    pending_delete: Option<PendingDelete>,
    deletion: Option<ActiveDeletion>,

    show_help: bool,
    file_info: Option<FileInfo>,
    /// Status line message, success flag first.
    message: Option<(bool, String)>,

    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
    needs_redraw: bool,
}

impl App {
    /// Create a new application from startup options and saved settings.
    pub fn new(config: TuiConfig) -> Self {
        let settings = UserSettings::load();
        let sets = Arc::new(settings.path_sets());
        let scanner = Arc::new(DirScanner::new(ScanConfig::default(), Arc::clone(&sets)));
        let spotlight = Arc::new(LargeFileScanner::new(
            settings.spotlight_config(),
            Arc::clone(&sets),
        ));
        let cache_path = SizeCache::default_path()
            .unwrap_or_else(|| std::env::temp_dir().join("burrow-overview-sizes.json"));
        let cache = SizeCache::load(cache_path, settings.cache_config());
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            mode: Mode::Overview(Phase::Ready),
            theme: Theme::from_variant(settings.theme),
            settings,
            sets,
            scanner,
            spotlight,
            cache,
            no_cache: config.no_cache,
            start_path: config.start_path.clone(),

            overview: Vec::new(),
            overview_cells: HashMap::new(),
            overview_view: Viewport::default(),

            listing: Listing::new(config.start_path.unwrap_or_default()),
            listing_view: Viewport::default(),
            history: Vec::new(),
            retained: RetainedListings::default(),
            pending_restore: None,

            large_root: PathBuf::new(),
            large_files: Vec::new(),
            large_view: Viewport::default(),
            spotlight_origin: Screen::Listing,

            selected: HashSet::new(),

            generations: Generations::default(),
            scan_job: None,
            spotlight_job: None,
            progress: ScanProgress::default(),
            spinner: 0,

            pending_delete: None,
            deletion: None,

            show_help: false,
            file_info: None,
            message: None,

            tx,
            rx,
            needs_redraw: true,
        }
    }

    /// Run the application event loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        let size = terminal.size()?;
        self.resize(size.height);

        info!(start = ?self.start_path, no_cache = self.no_cache, "session started");
        match self.start_path.clone() {
            Some(path) => self.open_listing(path),
            None => self.start_overview(false),
        }

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        let mut events = EventStream::new();

        while self.mode != Mode::Quit {
            if self.needs_redraw {
                terminal.draw(|frame| self.render(frame))?;
                self.needs_redraw = false;
            }

            tokio::select! {
                biased;

                Some(Ok(event)) = events.next() => {
                    self.handle_terminal_event(event);

                    // Drain any additional pending events
                    while self.mode != Mode::Quit
                        && crossterm::event::poll(std::time::Duration::ZERO)?
                    {
                        let event = crossterm::event::read()?;
                        self.handle_terminal_event(event);
                    }
                    self.needs_redraw = true;
                }

                Some(event) = self.rx.recv() => {
                    self.handle_app_event(event);
                    while let Ok(event) = self.rx.try_recv() {
                        self.handle_app_event(event);
                    }
                    self.needs_redraw = true;
                }

                _ = interval.tick() => {
                    self.on_tick();
                }
            }
        }

        self.cancel_jobs();
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let ctx = RenderContext {
            mode: self.mode,
            screen: self.screen(),
            theme: &self.theme,
            overview: &self.overview,
            overview_view: &self.overview_view,
            listing: &self.listing,
            listing_view: &self.listing_view,
            depth: self.history.len(),
            large_root: &self.large_root,
            large_files: &self.large_files,
            large_view: &self.large_view,
            selected: &self.selected,
            progress: &self.progress,
            spinner: SPINNER_FRAMES[self.spinner % SPINNER_FRAMES.len()],
            completion: self.completion(),
            pending_delete: self.pending_delete.as_ref(),
            deletion: self.deletion.as_ref(),
            to_trash: self.settings.use_trash,
            show_help: self.show_help,
            file_info: self.file_info.as_ref(),
            message: self.message.as_ref(),
            now: SystemTime::now(),
        };
        render_app(&ctx, frame.area(), frame.buffer_mut());
    }

    fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_action(KeyAction::from_key_event(key));
            }
            Event::Resize(_, height) => self.resize(height),
            _ => {}
        }
    }

    fn resize(&mut self, height: u16) {
        let rows = Viewport::rows_for_height(height);
        self.overview_view.set_rows(rows);
        self.listing_view.set_rows(rows);
        self.large_view.set_rows(rows);
        self.needs_redraw = true;
    }

    /// The list screen currently shown, or under a dialog.
    fn screen(&self) -> Screen {
        match self.mode {
            Mode::Overview(_) => Screen::Overview,
            Mode::Listing(_) => Screen::Listing,
            Mode::LargeFiles(_) => Screen::LargeFiles,
            Mode::ConfirmDelete => self
                .pending_delete
                .as_ref()
                .map_or(Screen::Listing, |p| p.origin),
            Mode::Deleting => self.deletion.as_ref().map_or(Screen::Listing, |d| d.origin),
            Mode::Quit => Screen::Listing,
        }
    }

    fn phase_of(&self, screen: Screen) -> Phase {
        let running = match screen {
            Screen::LargeFiles => self.spotlight_job.is_some(),
            _ => matches!(&self.scan_job, Some((_, target)) if *target == screen),
        };
        if running { Phase::Scanning } else { Phase::Ready }
    }

    /// Show a list screen with its current phase.
    fn enter(&mut self, screen: Screen) {
        self.mode = screen.mode(self.phase_of(screen));
    }

    /// Refresh the phase of `screen` if it is showing.
    fn settle(&mut self, screen: Screen) {
        if matches!(self.mode, Mode::Overview(_) | Mode::Listing(_) | Mode::LargeFiles(_))
            && self.screen() == screen
        {
            self.enter(screen);
        }
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        match self.screen() {
            Screen::Overview => &mut self.overview_view,
            Screen::Listing => &mut self.listing_view,
            Screen::LargeFiles => &mut self.large_view,
        }
    }

    /// Completion percentage of the job feeding the current screen.
    fn completion(&self) -> Option<u8> {
        match self.screen() {
            Screen::Overview => Some(completion_percent(
                self.overview.iter().filter(|o| o.entry.size.is_final()).count(),
                self.overview.len(),
            )),
            Screen::Listing => self.listing.completion(),
            Screen::LargeFiles => None,
        }
    }

    fn set_message(&mut self, success: bool, message: impl Into<String>) {
        self.message = Some((success, message.into()));
    }

    // ----------------------------------------------------------------------
    // Key handling
    // ----------------------------------------------------------------------

    fn handle_action(&mut self, action: KeyAction) {
        if action == KeyAction::ForceQuit {
            self.quit();
            return;
        }

        if self.show_help {
            if matches!(
                action,
                KeyAction::ToggleHelp | KeyAction::Cancel | KeyAction::Quit
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.file_info.is_some() {
            if matches!(
                action,
                KeyAction::Info | KeyAction::Cancel | KeyAction::Quit | KeyAction::DrillDown
            ) {
                self.file_info = None;
            }
            return;
        }

        match self.mode {
            Mode::ConfirmDelete => match action {
                KeyAction::Confirm | KeyAction::DrillDown => self.confirm_delete(),
                KeyAction::Cancel | KeyAction::Quit => self.cancel_delete(),
                _ => {}
            },
            Mode::Deleting => {
                if matches!(action, KeyAction::Cancel | KeyAction::Quit) {
                    self.interrupt_deletion();
                }
            }
            Mode::Quit => {}
            Mode::Overview(_) | Mode::Listing(_) | Mode::LargeFiles(_) => {
                self.handle_screen_action(action)
            }
        }
    }

    fn handle_screen_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::MoveUp => self.viewport_mut().move_up(1),
            KeyAction::MoveDown => self.viewport_mut().move_down(1),
            KeyAction::PageUp => self.viewport_mut().page_up(),
            KeyAction::PageDown => self.viewport_mut().page_down(),
            KeyAction::JumpToTop => self.viewport_mut().jump_to_top(),
            KeyAction::JumpToBottom => self.viewport_mut().jump_to_bottom(),
            KeyAction::DrillDown => self.drill_down(),
            KeyAction::NavigateBack => self.navigate_back(),
            KeyAction::Refresh => self.refresh(),
            KeyAction::Spotlight => self.toggle_spotlight(),
            KeyAction::ToggleSelect => self.toggle_select(),
            KeyAction::Delete => self.request_delete(),
            KeyAction::Open => {
                if let Some(entry) = self.cursor_entry() {
                    if let Err(err) = opener::open_path(&entry.path) {
                        self.set_message(false, err);
                    }
                }
            }
            KeyAction::Reveal => {
                if let Some(entry) = self.cursor_entry() {
                    opener::reveal_path(&entry.path);
                }
            }
            KeyAction::Info => self.show_file_info(),
            KeyAction::ToggleHelp => self.show_help = true,
            KeyAction::ToggleTheme => {
                self.theme = self.theme.toggle();
                self.settings.theme = self.theme.variant;
                if let Err(err) = self.settings.save() {
                    warn!(error = %err, "failed to save settings");
                }
            }
            KeyAction::Cancel => {
                if !self.selected.is_empty() {
                    self.selected.clear();
                } else {
                    self.message = None;
                }
            }
            KeyAction::Quit => self.quit(),
            KeyAction::Confirm | KeyAction::ForceQuit | KeyAction::None => {}
        }
    }

    fn quit(&mut self) {
        if let Some(deletion) = &self.deletion {
            deletion.cancel.cancel();
        }
        self.cancel_jobs();
        self.mode = Mode::Quit;
    }

    fn cancel_jobs(&mut self) {
        self.cancel_scan();
        self.cancel_spotlight();
    }

    fn cancel_scan(&mut self) {
        if let Some((job, target)) = self.scan_job.take() {
            debug!(?target, "cancelling scan");
            job.cancel.cancel();
        }
    }

    fn cancel_spotlight(&mut self) {
        if let Some(job) = self.spotlight_job.take() {
            job.cancel.cancel();
        }
    }

    /// The entry under the cursor on the current screen.
    fn cursor_entry(&self) -> Option<Entry> {
        match self.screen() {
            Screen::Overview => self
                .overview
                .get(self.overview_view.cursor())
                .map(|o| o.entry.clone()),
            Screen::Listing => self.listing.entries.get(self.listing_view.cursor()).cloned(),
            Screen::LargeFiles => self.large_files.get(self.large_view.cursor()).map(|f| {
                Entry::sized(f.path.clone(), false, false, EntrySize::Known(f.size))
            }),
        }
    }

    // ----------------------------------------------------------------------
    // Navigation
    // ----------------------------------------------------------------------

    fn drill_down(&mut self) {
        let Some(entry) = self.cursor_entry() else {
            return;
        };
        if !entry.is_explorable() {
            if entry.folded {
                self.set_message(false, format!("{} is folded and not explored", entry.name));
            }
            return;
        }

        match self.screen() {
            Screen::Overview => {
                self.history.clear();
                self.open_listing(entry.path);
            }
            Screen::Listing => {
                self.history.push(NavFrame {
                    path: self.listing.root.clone(),
                    top: self.listing_view.top(),
                    cursor: self.listing_view.cursor(),
                });
                self.open_listing(entry.path);
            }
            Screen::LargeFiles => {}
        }
    }

    fn navigate_back(&mut self) {
        match self.screen() {
            Screen::Overview => {}
            Screen::LargeFiles => self.leave_spotlight(),
            Screen::Listing => {
                if let Some(frame) = self.history.pop() {
                    self.cancel_scan();
                    self.selected.clear();
                    if let Some(listing) = self.retained.get(&frame.path).cloned() {
                        debug!(path = %frame.path.display(), "reusing retained listing");
                        self.listing = listing;
                        self.listing_view.set_len(self.listing.entries.len());
                        self.listing_view.restore(frame.top, frame.cursor);
                        self.enter(Screen::Listing);
                    } else {
                        self.rescan_listing(frame.path, Some((frame.top, frame.cursor)));
                    }
                } else if self.start_path.is_none() {
                    self.cancel_scan();
                    self.selected.clear();
                    if self.overview.iter().any(|o| o.entry.size.is_pending()) {
                        self.start_overview(false);
                    } else {
                        self.enter(Screen::Overview);
                    }
                } else {
                    self.set_message(true, "Already at the starting directory");
                }
            }
        }
    }

    fn refresh(&mut self) {
        match self.screen() {
            Screen::Overview => self.start_overview(true),
            Screen::Listing => {
                let root = self.listing.root.clone();
                let position = (self.listing_view.top(), self.listing_view.cursor());
                self.rescan_listing(root, Some(position));
            }
            Screen::LargeFiles => {
                let root = self.large_root.clone();
                self.start_spotlight_for(root, self.spotlight_origin);
            }
        }
    }

    fn toggle_spotlight(&mut self) {
        match self.screen() {
            Screen::LargeFiles => self.leave_spotlight(),
            Screen::Listing => {
                let root = self.listing.root.clone();
                self.start_spotlight_for(root, Screen::Listing);
            }
            Screen::Overview => match self.cursor_entry() {
                Some(entry) if entry.is_explorable() => {
                    self.start_spotlight_for(entry.path, Screen::Overview)
                }
                _ => self.set_message(false, "Select a directory to search for large files"),
            },
        }
    }

    fn toggle_select(&mut self) {
        if self.screen() == Screen::Overview {
            self.set_message(false, "Open a directory to select items");
            return;
        }
        if let Some(entry) = self.cursor_entry() {
            if !self.selected.remove(&entry.path) {
                self.selected.insert(entry.path);
            }
        }
    }

    fn show_file_info(&mut self) {
        let Some(entry) = self.cursor_entry() else {
            return;
        };
        let last_access = entry.last_access.map(Some);
        if last_access.is_none() {
            start_file_info(
                entry.path.clone(),
                self.scanner.config().metadata_timeout(),
                self.tx.clone(),
            );
        }
        self.file_info = Some(FileInfo {
            path: entry.path,
            size: entry.size,
            is_dir: entry.is_dir,
            folded: entry.folded,
            last_access,
        });
    }

    // ----------------------------------------------------------------------
    // Jobs
    // ----------------------------------------------------------------------

    fn start_overview(&mut self, bypass: bool) {
        self.cancel_scan();
        self.selected.clear();

        let roots = if self.settings.overview_roots.is_empty() {
            default_roots(&self.sets)
        } else {
            roots_from_paths(&self.settings.overview_roots, &self.sets)
        };
        let plan = plan_overview(&roots, &self.cache, SystemTime::now(), bypass || self.no_cache);
        debug!(
            cached = plan.cached.len(),
            to_scan = plan.to_scan.len(),
            bypass,
            "overview planned"
        );

        let cached = plan.cached.iter().map(|(root, size)| {
            let mut entry = OverviewEntry::new(root.label.clone(), root.path.clone());
            entry.entry.size = EntrySize::Known(*size);
            entry.cached = true;
            entry
        });
        let pending = plan
            .to_scan
            .iter()
            .map(|root| OverviewEntry::new(root.label.clone(), root.path.clone()));
        self.overview = cached.chain(pending).collect();
        self.overview_cells.clear();
        sort_overview(&mut self.overview);
        self.overview_view.set_len(self.overview.len());

        if !plan.to_scan.is_empty() {
            self.generations.scan += 1;
            let paths = plan.to_scan.into_iter().map(|root| root.path).collect();
            let job = start_overview_scan(
                Arc::clone(&self.scanner),
                paths,
                self.generations.scan,
                self.tx.clone(),
            );
            self.scan_job = Some((job, Screen::Overview));
        }
        self.enter(Screen::Overview);
    }

    /// Drill into a directory with a fresh scan.
    fn open_listing(&mut self, path: PathBuf) {
        self.listing_view = Viewport::new(self.listing_view.rows());
        self.rescan_listing(path, None);
    }

    fn rescan_listing(&mut self, path: PathBuf, restore: Option<(usize, usize)>) {
        self.cancel_scan();
        self.selected.clear();
        self.generations.scan += 1;
        debug!(path = %path.display(), generation = self.generations.scan, "listing scan started");

        self.listing = Listing::new(path.clone());
        self.listing_view.set_len(0);
        self.pending_restore = restore;

        let job = start_listing_scan(
            Arc::clone(&self.scanner),
            path,
            self.generations.scan,
            self.tx.clone(),
        );
        self.scan_job = Some((job, Screen::Listing));
        self.enter(Screen::Listing);
    }

    fn start_spotlight_for(&mut self, root: PathBuf, origin: Screen) {
        self.cancel_spotlight();
        self.selected.clear();
        self.generations.spotlight += 1;
        debug!(root = %root.display(), "spotlight started");

        self.large_root = root.clone();
        self.large_files.clear();
        self.large_view = Viewport::new(self.large_view.rows());
        self.spotlight_origin = origin;

        let job = start_spotlight(
            Arc::clone(&self.spotlight),
            root,
            self.generations.spotlight,
            self.tx.clone(),
        );
        self.spotlight_job = Some(job);
        self.enter(Screen::LargeFiles);
    }

    fn leave_spotlight(&mut self) {
        self.cancel_spotlight();
        self.selected.clear();
        match self.spotlight_origin {
            Screen::Listing if self.listing.stale && self.scan_job.is_none() => {
                let root = self.listing.root.clone();
                let position = (self.listing_view.top(), self.listing_view.cursor());
                self.rescan_listing(root, Some(position));
            }
            origin => self.enter(origin),
        }
    }

    fn on_tick(&mut self) {
        let sampling = match self.screen() {
            Screen::LargeFiles => self.spotlight_job.as_ref(),
            _ => self.scan_job.as_ref().map(|(job, _)| job),
        };
        if let Some(job) = sampling {
            self.progress = job.counters.snapshot();
        }

        let mut changed = false;
        if let Some(target) = self.scan_target() {
            match target {
                Screen::Overview => {
                    for item in &mut self.overview {
                        if let Some(cell) = self.overview_cells.get(&item.entry.path) {
                            let before = item.entry.size;
                            item.entry.size.advance(cell.load(Ordering::Relaxed));
                            changed |= item.entry.size != before;
                        }
                    }
                    if changed {
                        sort_overview(&mut self.overview);
                    }
                }
                _ => {
                    if self.listing.sample_cells() {
                        changed = true;
                        self.resort_listing();
                    }
                }
            }
        }

        let busy = self.mode.is_scanning() || self.deletion.is_some();
        if busy {
            self.spinner = self.spinner.wrapping_add(1);
        }
        self.needs_redraw |= busy || changed;
    }

    /// Re-sort the listing, keeping the cursor on the same entry.
    fn resort_listing(&mut self) {
        let current = self
            .listing
            .entries
            .get(self.listing_view.cursor())
            .map(|e| e.path.clone());
        sort_entries(&mut self.listing.entries);
        let index = current
            .and_then(|path| self.listing.entries.iter().position(|e| e.path == path));
        if let Some(index) = index {
            self.listing_view.set_selected(index);
        }
    }

    // ----------------------------------------------------------------------
    // Background events
    // ----------------------------------------------------------------------

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Listed {
                generation,
                entries,
                cells,
            } if generation == self.generations.scan => self.on_listed(entries, cells),
            AppEvent::Sized {
                generation,
                path,
                size,
            } if generation == self.generations.scan => self.on_sized(&path, size),
            AppEvent::ScanFinished { generation, result }
                if generation == self.generations.scan =>
            {
                self.on_scan_finished(result)
            }
            AppEvent::OverviewFinished { generation, result }
                if generation == self.generations.scan =>
            {
                self.on_overview_finished(result)
            }
            AppEvent::SpotlightFinished { generation, result }
                if generation == self.generations.spotlight =>
            {
                self.on_spotlight_finished(result)
            }
            AppEvent::DeletionProgress {
                generation,
                progress,
            } if generation == self.generations.deletion => {
                if let Some(deletion) = &mut self.deletion {
                    deletion.progress = progress;
                }
            }
            AppEvent::DeletionFinished {
                generation,
                outcome,
            } if generation == self.generations.deletion => self.finish_deletion(outcome),
            AppEvent::FileInfo { path, last_access } => self.on_file_info(path, last_access),
            _ => {}
        }
    }

    fn scan_target(&self) -> Option<Screen> {
        self.scan_job.as_ref().map(|(_, target)| *target)
    }

    fn on_listed(&mut self, entries: Vec<Entry>, cells: Vec<Arc<AtomicU64>>) {
        match self.scan_target() {
            Some(Screen::Overview) => {
                self.overview_cells = entries
                    .into_iter()
                    .zip(cells)
                    .map(|(entry, cell)| (entry.path, cell))
                    .collect();
            }
            Some(Screen::Listing) => {
                self.listing.set_listed(entries, cells);
                self.listing_view.set_len(self.listing.entries.len());
                if let Some((top, cursor)) = self.pending_restore.take() {
                    self.listing_view.restore(top, cursor);
                }
            }
            _ => {}
        }
    }

    fn on_sized(&mut self, path: &Path, size: EntrySize) {
        match self.scan_target() {
            Some(Screen::Overview) => {
                self.overview_cells.remove(path);
                if let Some(item) = self.overview.iter_mut().find(|o| o.entry.path == path) {
                    item.entry.size.finalize(size);
                }
                sort_overview(&mut self.overview);
            }
            Some(Screen::Listing) => {
                if self.listing.set_final(path, size) {
                    self.resort_listing();
                }
            }
            _ => {}
        }
    }

    fn on_scan_finished(&mut self, result: Result<ScanSummary, ScanError>) {
        self.scan_job = None;
        match result {
            Ok(summary) => {
                debug!(
                    root = %summary.root.display(),
                    total = summary.total,
                    errors = summary.errors,
                    elapsed = ?summary.elapsed,
                    "listing scan finished"
                );
                self.listing.complete_with(summary);
                self.listing_view.set_len(self.listing.entries.len());
                if let Some((top, cursor)) = self.pending_restore.take() {
                    self.listing_view.restore(top, cursor);
                }
                self.retained.insert(self.listing.clone());
            }
            Err(ScanError::Cancelled) => {}
            Err(err) => {
                warn!(root = %self.listing.root.display(), error = %err, "listing scan failed");
                self.set_message(false, err.to_string());
            }
        }
        self.settle(Screen::Listing);
    }

    fn on_overview_finished(&mut self, result: Result<Vec<Entry>, ScanError>) {
        self.scan_job = None;
        self.overview_cells.clear();
        match result {
            Ok(entries) => {
                for sized in entries {
                    if let EntrySize::Known(bytes) = sized.size {
                        self.cache.put(&sized.path, bytes);
                    }
                    if let Some(item) = self
                        .overview
                        .iter_mut()
                        .find(|o| o.entry.path == sized.path)
                    {
                        item.entry.size.finalize(sized.size);
                    }
                }
                sort_overview(&mut self.overview);
                self.save_cache();
            }
            Err(ScanError::Cancelled) => {}
            Err(err) => {
                warn!(error = %err, "overview scan failed");
                self.set_message(false, err.to_string());
            }
        }
        self.settle(Screen::Overview);
    }

    fn on_spotlight_finished(&mut self, result: Result<Vec<LargeFileEntry>, ScanError>) {
        self.spotlight_job = None;
        match result {
            Ok(files) => {
                debug!(
                    root = %self.large_root.display(),
                    found = files.len(),
                    "spotlight finished"
                );
                self.large_files = files;
                self.large_view.set_len(self.large_files.len());
            }
            Err(ScanError::Cancelled) => {}
            Err(err) => {
                warn!(root = %self.large_root.display(), error = %err, "spotlight failed");
                self.set_message(false, err.to_string());
            }
        }
        self.settle(Screen::LargeFiles);
    }

    fn on_file_info(&mut self, path: PathBuf, last_access: Option<SystemTime>) {
        if let Some(entry) = self.listing.entries.iter_mut().find(|e| e.path == path) {
            entry.last_access = last_access;
        }
        if let Some(info) = self.file_info.as_mut().filter(|info| info.path == path) {
            info.last_access = Some(last_access);
        }
    }

    fn save_cache(&self) {
        if let Err(err) = self.cache.save() {
            warn!(path = %self.cache.path().display(), error = %err, "failed to save size cache");
        }
    }

    // ----------------------------------------------------------------------
    // Deletion
    // ----------------------------------------------------------------------

    fn request_delete(&mut self) {
        let (items, root) = match self.screen() {
            Screen::Overview => return,
            Screen::Listing => (
                self.listing
                    .entries
                    .iter()
                    .filter(|e| self.selected.contains(&e.path))
                    .map(|e| (e.path.clone(), e.bytes()))
                    .collect::<Vec<_>>(),
                self.listing.root.clone(),
            ),
            Screen::LargeFiles => (
                self.large_files
                    .iter()
                    .filter(|f| self.selected.contains(&f.path))
                    .map(|f| (f.path.clone(), f.size))
                    .collect(),
                self.large_root.clone(),
            ),
        };
        if items.is_empty() {
            self.set_message(false, "Nothing selected (Space to select)");
            return;
        }
        self.pending_delete = Some(PendingDelete {
            items,
            root,
            origin: self.screen(),
        });
        self.mode = Mode::ConfirmDelete;
    }

    fn cancel_delete(&mut self) {
        if let Some(pending) = self.pending_delete.take() {
            self.enter(pending.origin);
        }
    }

    fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        // Partial sizes of an unfinished listing cannot be corrected in place.
        if pending.origin == Screen::Listing && self.scan_target() == Some(Screen::Listing) {
            self.cancel_scan();
            self.listing.stale = true;
        }

        let mode = if self.settings.use_trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Permanent
        };
        let concurrency = self
            .settings
            .deletion_concurrency
            .unwrap_or(DEFAULT_CONCURRENCY);
        let request = DeletionRequest::new(
            pending
                .items
                .iter()
                .map(|(path, size)| DeletionItem::new(path, *size))
                .collect(),
            &pending.root,
            Arc::clone(&self.sets),
        )
        .with_mode(mode)
        .with_concurrency(concurrency);

        self.generations.deletion += 1;
        let total = pending.items.len();
        let (removed, cancel) = spawn_deletion(request, self.generations.deletion, self.tx.clone());
        self.deletion = Some(ActiveDeletion {
            origin: pending.origin,
            sizes: pending.items.into_iter().collect(),
            progress: burrow_ops::DeletionProgress::new(total),
            removed,
            cancel,
            interrupted: false,
        });
        self.mode = Mode::Deleting;
    }

    fn interrupt_deletion(&mut self) {
        if let Some(deletion) = &mut self.deletion {
            deletion.cancel.cancel();
            deletion.interrupted = true;
        }
    }

    fn finish_deletion(&mut self, outcome: DeletionOutcome) {
        let Some(active) = self.deletion.take() else {
            return;
        };
        let removed: HashSet<PathBuf> = outcome.removed.iter().cloned().collect();

        let mut cache_changed = false;
        let mut listing_changed = false;
        for path in &outcome.removed {
            let size = active.sizes.get(path).copied().unwrap_or(0);
            cache_changed |= self.cache.invalidate_ancestors(path) > 0;
            self.retained.discard_ancestors(path);

            for item in &mut self.overview {
                if item.entry.path != *path && path.starts_with(&item.entry.path) {
                    item.entry.size = EntrySize::Known(item.entry.bytes().saturating_sub(size));
                    item.cached = false;
                }
            }
            listing_changed |= shrink_containing(&mut self.listing.entries, path, size);
        }
        if cache_changed {
            self.save_cache();
        }
        sort_overview(&mut self.overview);

        self.listing.remove_paths(&removed);
        if listing_changed {
            self.resort_listing();
        }
        self.listing_view.set_len(self.listing.entries.len());
        self.retained.insert(self.listing.clone());

        self.large_files.retain(|f| !removed.contains(&f.path));
        self.large_view.set_len(self.large_files.len());

        self.selected.clear();
        let (success, message) = deletion_message(&outcome);
        self.set_message(success, message);

        if active.origin == Screen::Listing && self.listing.stale {
            let root = self.listing.root.clone();
            let position = (self.listing_view.top(), self.listing_view.cursor());
            self.rescan_listing(root, Some(position));
        } else {
            self.enter(active.origin);
        }
    }
}

/// Largest first, then by label.
fn sort_overview(entries: &mut [OverviewEntry]) {
    entries.sort_by(|a, b| {
        b.entry
            .bytes()
            .cmp(&a.entry.bytes())
            .then_with(|| a.label.cmp(&b.label))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::AtomicUsize;

    use burrow_core::CacheConfig;
    use burrow_ops::DeletionProgress;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    /// An app with default settings and a cache file under `temp`.
    fn test_app(temp: &TempDir, start_path: Option<PathBuf>) -> App {
        let mut app = App::new(TuiConfig {
            start_path,
            no_cache: false,
        });
        app.settings = UserSettings::default();
        app.sets = Arc::new(app.settings.path_sets());
        app.cache = SizeCache::load(temp.path().join("sizes.json"), CacheConfig::default());
        app
    }

    /// A completed listing of `root` with one directory per `(name, size)`.
    fn show_listing(app: &mut App, root: &Path, children: &[(&str, u64)]) {
        let mut listing = Listing::new(root);
        listing.entries = children
            .iter()
            .map(|(name, size)| Entry::sized(root.join(name), true, false, EntrySize::Known(*size)))
            .collect();
        sort_entries(&mut listing.entries);
        listing.listed = true;
        listing.complete = true;
        app.retained.insert(listing.clone());
        app.listing = listing;
        app.listing_view.set_len(children.len());
        app.mode = Mode::Listing(Phase::Ready);
    }

    fn tree(temp: &TempDir) -> PathBuf {
        let root = temp.path().join("data");
        for name in ["a", "b", "c"] {
            fs::create_dir_all(root.join(name)).unwrap();
            fs::write(root.join(name).join("f"), name).unwrap();
        }
        root
    }

    #[tokio::test]
    async fn test_drill_down_then_back_restores_cursor() {
        let temp = TempDir::new().unwrap();
        let root = tree(&temp);
        let mut app = test_app(&temp, Some(root.clone()));
        show_listing(&mut app, &root, &[("a", 300), ("b", 200), ("c", 100)]);
        app.listing_view.restore(0, 2);

        app.handle_action(KeyAction::DrillDown);
        assert_eq!(app.listing.root, root.join("c"));
        assert_eq!(app.mode, Mode::Listing(Phase::Scanning));
        assert_eq!(app.listing_view.cursor(), 0);
        assert_eq!(
            app.history,
            [NavFrame {
                path: root.clone(),
                top: 0,
                cursor: 2,
            }]
        );

        app.handle_action(KeyAction::NavigateBack);
        assert!(app.history.is_empty());
        assert!(app.scan_job.is_none());
        assert_eq!(app.mode, Mode::Listing(Phase::Ready));
        assert_eq!(app.listing.root, root);
        assert_eq!(app.listing.entries.len(), 3);
        assert_eq!(app.listing_view.cursor(), 2);

        app.handle_action(KeyAction::NavigateBack);
        assert_eq!(app.listing.root, root);
        assert_eq!(
            app.message,
            Some((true, "Already at the starting directory".to_string()))
        );
    }

    #[tokio::test]
    async fn test_superseded_scan_events_are_dropped() {
        let temp = TempDir::new().unwrap();
        let root = tree(&temp);
        let mut app = test_app(&temp, Some(root.clone()));

        app.rescan_listing(root.clone(), None);
        let superseded = app.generations.scan;
        app.rescan_listing(root.clone(), None);
        let current = app.generations.scan;
        assert!(current > superseded);

        app.handle_app_event(AppEvent::Listed {
            generation: superseded,
            entries: vec![Entry::pending(root.join("ghost"), true, false)],
            cells: vec![Arc::new(AtomicU64::new(0))],
        });
        app.handle_app_event(AppEvent::ScanFinished {
            generation: superseded,
            result: Err(ScanError::Cancelled),
        });
        assert!(!app.listing.listed);
        assert!(app.listing.entries.is_empty());
        assert!(app.scan_job.is_some());
        assert_eq!(app.completion(), None);

        app.handle_app_event(AppEvent::Listed {
            generation: current,
            entries: vec![Entry::pending(root.join("a"), true, false)],
            cells: vec![Arc::new(AtomicU64::new(0))],
        });
        assert!(app.listing.listed);
        assert_eq!(app.listing.entries.len(), 1);
        assert_eq!(app.completion(), Some(0));
    }

    #[tokio::test]
    async fn test_delete_needs_a_selection() {
        let temp = TempDir::new().unwrap();
        let root = tree(&temp);
        let mut app = test_app(&temp, Some(root.clone()));
        show_listing(&mut app, &root, &[("a", 300), ("b", 200)]);

        app.handle_action(KeyAction::Delete);
        assert_eq!(app.mode, Mode::Listing(Phase::Ready));
        assert!(app.pending_delete.is_none());
        assert_eq!(
            app.message,
            Some((false, "Nothing selected (Space to select)".to_string()))
        );

        app.handle_action(KeyAction::ToggleSelect);
        app.handle_action(KeyAction::Delete);
        assert_eq!(app.mode, Mode::ConfirmDelete);
        let pending = app.pending_delete.as_ref().unwrap();
        assert_eq!(pending.items, [(root.join("a"), 300)]);
        assert_eq!(pending.origin, Screen::Listing);

        app.handle_action(KeyAction::Cancel);
        assert_eq!(app.mode, Mode::Listing(Phase::Ready));
        assert!(app.pending_delete.is_none());
        assert!(root.join("a").exists());
    }

    #[tokio::test]
    async fn test_finished_deletion_updates_listing() {
        let temp = TempDir::new().unwrap();
        let root = tree(&temp);
        let mut app = test_app(&temp, Some(root.clone()));
        show_listing(&mut app, &root, &[("a", 300), ("b", 200)]);
        app.selected.insert(root.join("a"));

        app.generations.deletion = 3;
        app.deletion = Some(ActiveDeletion {
            origin: Screen::Listing,
            sizes: [(root.join("a"), 300)].into_iter().collect(),
            progress: DeletionProgress::new(1),
            removed: Arc::new(AtomicUsize::new(1)),
            cancel: CancellationToken::new(),
            interrupted: false,
        });
        app.mode = Mode::Deleting;
        let outcome = DeletionOutcome {
            removed: vec![root.join("a")],
            bytes_freed: 300,
            ..Default::default()
        };

        app.handle_app_event(AppEvent::DeletionFinished {
            generation: 2,
            outcome: outcome.clone(),
        });
        assert_eq!(app.mode, Mode::Deleting);
        assert!(app.deletion.is_some());

        app.handle_app_event(AppEvent::DeletionFinished {
            generation: 3,
            outcome,
        });
        assert_eq!(app.mode, Mode::Listing(Phase::Ready));
        assert!(app.deletion.is_none());
        assert!(app.selected.is_empty());
        let names: Vec<_> = app.listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b"]);
        assert_eq!(app.retained.get(&root).map(|l| l.entries.len()), Some(1));
        let (success, message) = app.message.clone().unwrap();
        assert!(success);
        assert!(message.starts_with("Deleted 1 items"));
    }

    #[tokio::test]
    async fn test_refresh_bypasses_fresh_cache() {
        let temp = TempDir::new().unwrap();
        let root = tree(&temp).canonicalize().unwrap();
        let mut app = test_app(&temp, None);
        app.settings.overview_roots = vec![root.clone()];
        app.cache.put(&root, 42);

        app.start_overview(false);
        assert_eq!(app.mode, Mode::Overview(Phase::Ready));
        assert!(app.scan_job.is_none());
        assert_eq!(app.overview.len(), 1);
        assert!(app.overview[0].cached);
        assert_eq!(app.overview[0].entry.size, EntrySize::Known(42));
        assert_eq!(app.completion(), Some(100));

        app.handle_action(KeyAction::Refresh);
        assert_eq!(app.mode, Mode::Overview(Phase::Scanning));
        assert!(matches!(app.scan_job, Some((_, Screen::Overview))));
        assert!(!app.overview[0].cached);
        assert!(app.overview[0].entry.size.is_pending());
        assert_eq!(app.completion(), Some(0));
    }

    #[test]
    fn test_sort_overview() {
        let mut entries = vec![
            OverviewEntry::new("Library", "/Library"),
            OverviewEntry::new("Caches", "/c"),
            OverviewEntry::new("Home", "/h"),
        ];
        entries[1].entry.size = EntrySize::Known(50);
        entries[2].entry.size = EntrySize::Known(900);

        sort_overview(&mut entries);
        let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Home", "Caches", "Library"]);
    }
}
