//! Terminal editor built on `viper-core`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p viper-tui -- [FILE|DIR] [--config PATH] [--encoding LABEL] [--no-wrap]
//! ```
//!
//! Opening a directory starts the file browser. Without a path a scratch buffer is opened;
//! Ctrl+S then asks for a file name.
//!
//! Set `VIPER_LOG=debug` (or any level) to write a log next to the user config.
//!
//! # Keys
//!
//! - Arrows: move the cursor (Shift extends the selection)
//! - Home/End: line start/end
//! - PageUp/PageDown: scroll one screen
//! - Ctrl+Z / Ctrl+Y: undo / redo
//! - Ctrl+S: save
//! - Ctrl+F: find, Ctrl+H: find and replace
//! - F3 / Shift+F3: next / previous match
//! - Ctrl+R / Ctrl+A: replace current / replace all
//! - Alt+C / Alt+R in a prompt: toggle case sensitivity / regex
//! - Ctrl+N / Ctrl+P: next / previous page of a large file
//! - Ctrl+O: browse the file's directory
//! - Ctrl+Q: quit

use std::{
    env,
    fs::{self, OpenOptions},
    io::{self, stdout},
    ops::Range,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use encoding_rs::Encoding;
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use viper_core::{
    EditError, EditorConfig, EditorEvent, EventBus, FileEntry, FileError, FileOptions,
    JsonFileStore, LatestJob, LayoutGeometry, LineEnding, PageSystem, SearchMatch, SearchOptions,
    SearchResult, ShellSession, TextCore, Viewport,
    layout::cell_width_at,
    list_directory, load_file, save_file,
    search::find_matches,
};
use viper_highlight::{ColorCategory, HighlightInfo};

/// Command line of the `viper` binary.
#[derive(Debug, Parser)]
#[command(name = "viper", version, about = "Terminal text editor")]
struct Cli {
    /// File to open, or a directory to browse.
    file: Option<PathBuf>,

    /// Configuration file (TOML). Defaults to `$XDG_CONFIG_HOME/viper/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Decode files with this encoding instead of detecting one.
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Disable soft wrapping.
    #[arg(long)]
    no_wrap: bool,

    /// Program used to read and write files the current user cannot access (e.g. `sudo sh`).
    #[arg(long, value_name = "PROGRAM")]
    shell: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Find,
    ReplaceFind,
    ReplaceWith,
    SaveAs,
    Browse,
}

/// A search waiting for its background job.
struct PendingSearch {
    query: String,
    replacement: Option<String>,
    options: SearchOptions,
}

struct Browser {
    dir: PathBuf,
    entries: Vec<FileEntry>,
    selected: usize,
}

struct App {
    core: TextCore,
    config: EditorConfig,
    file_options: FileOptions,
    /// `None` for a scratch buffer.
    file_path: Option<PathBuf>,
    encoding: &'static Encoding,
    line_ending: LineEnding,
    /// Set when the document is large enough to be split.
    pages: Option<PageSystem>,
    /// An edited page was left without saving.
    dirty_pages: bool,
    history_store: Option<JsonFileStore>,
    events: EventBus,
    /// Last message produced by an event subscriber.
    notice: Arc<Mutex<Option<String>>>,
    status_message: String,
    scroll_row: usize,
    editor_rows: usize,
    search_job: LatestJob<Vec<SearchMatch>>,
    listing_job: LatestJob<(PathBuf, Result<Vec<FileEntry>, FileError>)>,
    pending_search: Option<PendingSearch>,
    search: Option<SearchResult>,
    search_options: SearchOptions,
    search_query: String,
    replace_query: String,
    input_mode: InputMode,
    input_buffer: String,
    browser: Option<Browser>,
    confirm_quit: bool,
    should_quit: bool,
}

impl App {
    fn new(
        config: EditorConfig,
        file_options: FileOptions,
        history_store: Option<JsonFileStore>,
    ) -> Self {
        let mut core = TextCore::with_config("", "", &config);
        let mut events = EventBus::new();
        core.set_event_sender(events.sender());

        let notice = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&notice);
        events.subscribe(move |event| {
            let message = match event {
                EditorEvent::Saved => "Saved".to_string(),
                EditorEvent::SearchFinished { matches: 0 } => "No matches".to_string(),
                EditorEvent::SearchFinished { matches } => format!("{matches} matches"),
                EditorEvent::DocumentLoaded { len } => format!("Loaded {len} characters"),
                EditorEvent::Notice(text) => text.clone(),
                _ => return,
            };
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(message);
            }
        });

        Self {
            core,
            encoding: file_options.default_encoding,
            config,
            file_options,
            file_path: None,
            line_ending: LineEnding::default(),
            pages: None,
            dirty_pages: false,
            history_store,
            events,
            notice,
            status_message: String::new(),
            scroll_row: 0,
            editor_rows: 0,
            search_job: LatestJob::new("search"),
            listing_job: LatestJob::new("listing"),
            pending_search: None,
            search: None,
            search_options: SearchOptions::default(),
            search_query: String::new(),
            replace_query: String::new(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            browser: None,
            confirm_quit: false,
            should_quit: false,
        }
    }

    fn open(&mut self, path: PathBuf) -> Result<(), FileError> {
        let loaded = load_file(&path, &self.file_options)?;
        info!(
            path = %path.display(),
            encoding = loaded.encoding.name(),
            line_ending = %loaded.line_ending,
            "opened file"
        );
        self.encoding = loaded.encoding;
        self.line_ending = loaded.line_ending;

        let pages = PageSystem::new(&loaded.text, self.config.page_system);
        self.core.set_extension(&loaded.extension);
        self.core.load_text(pages.current_page_text());
        self.core.set_starting_real_line(pages.starting_line());
        self.core.set_read_only(self.config.read_only);
        self.pages = (pages.max_page() > 0).then_some(pages);
        self.dirty_pages = false;

        if let Some(store) = &self.history_store {
            if let Err(err) = self
                .core
                .restore_persistent_state(store, &history_key(&path))
            {
                debug!(%err, "stored undo history not restored");
            }
        }

        self.file_path = Some(path);
        self.reset_view();
        Ok(())
    }

    /// Start editing a file that does not exist yet.
    fn open_new(&mut self, path: PathBuf) {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.core.set_extension(&extension);
        self.status_message = format!("New file: {}", path.display());
        self.file_path = Some(path);
    }

    fn reset_view(&mut self) {
        self.scroll_row = 0;
        self.search = None;
        self.pending_search = None;
    }

    fn is_modified(&self) -> bool {
        self.core.is_modified() || self.dirty_pages
    }

    fn file_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "[scratch]".to_string())
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.confirm_quit {
            self.handle_confirm_key(key);
            return;
        }
        match self.input_mode {
            InputMode::Normal => {
                self.status_message.clear();
                self.handle_normal_key(key);
            }
            InputMode::Browse => self.handle_browser_key(key),
            _ => self.handle_prompt_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('q') if ctrl => self.request_quit(),
            KeyCode::Char('s') if ctrl => {
                self.save();
            }
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('y') if ctrl => self.redo(),
            KeyCode::Char('f') if ctrl => self.start_prompt(InputMode::Find, String::new()),
            KeyCode::Char('h') if ctrl => self.start_prompt(InputMode::ReplaceFind, String::new()),
            KeyCode::Char('r') if ctrl => self.replace_current(),
            KeyCode::Char('a') if ctrl => self.replace_all(),
            KeyCode::Char('n') if ctrl => self.turn_page(true),
            KeyCode::Char('p') if ctrl => self.turn_page(false),
            KeyCode::Char('o') if ctrl => {
                let dir = self
                    .file_path
                    .as_deref()
                    .and_then(Path::parent)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .or_else(|| env::current_dir().ok());
                if let Some(dir) = dir {
                    self.open_browser(dir);
                }
            }
            KeyCode::F(3) if shift => self.find_prev(),
            KeyCode::F(3) => self.find_next(),
            KeyCode::Left => self.core.move_left(shift),
            KeyCode::Right => self.core.move_right(shift),
            KeyCode::Up => self.core.move_vertical(-1, shift),
            KeyCode::Down => self.core.move_vertical(1, shift),
            KeyCode::Home => self.core.move_line_start(shift),
            KeyCode::End => self.core.move_line_end(shift),
            KeyCode::PageUp => {
                let rows = self.editor_rows.max(1);
                self.core.move_vertical(-(rows as isize), shift);
                self.scroll_row = self.scroll_row.saturating_sub(rows);
            }
            KeyCode::PageDown => {
                let rows = self.editor_rows.max(1);
                self.core.move_vertical(rows as isize, shift);
                self.scroll_row += rows;
            }
            KeyCode::Enter => self.edit(|core| core.type_text("\n")),
            KeyCode::Tab => {
                let tab = self.config.tab_text.clone();
                self.edit(|core| core.type_text(&tab));
            }
            KeyCode::Backspace => self.edit(TextCore::backspace),
            KeyCode::Delete => self.edit(TextCore::delete_forward),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut buf = [0u8; 4];
                let text = c.encode_utf8(&mut buf);
                self.edit(|core| core.type_text(text));
            }
            _ => {}
        }
    }

    fn handle_paste(&mut self, text: String) {
        match self.input_mode {
            InputMode::Normal => self.edit(|core| core.type_text(&text)),
            InputMode::Browse => {}
            _ => self.input_buffer.push_str(&text),
        }
    }

    /// Run a user edit; any outstanding search is stale afterwards.
    fn edit(&mut self, op: impl FnOnce(&mut TextCore) -> Result<(), EditError>) {
        match op(&mut self.core) {
            Ok(()) => {
                self.search = None;
                self.pending_search = None;
            }
            Err(err) => self.status_message = err.to_string(),
        }
    }

    fn undo(&mut self) {
        if self.core.undo() {
            self.search = None;
        } else {
            self.status_message = "Nothing to undo".to_string();
        }
    }

    fn redo(&mut self) {
        if self.core.redo() {
            self.search = None;
        } else {
            self.status_message = "Nothing to redo".to_string();
        }
    }

    fn request_quit(&mut self) {
        if self.is_modified() {
            self.confirm_quit = true;
        } else {
            self.store_history();
            self.should_quit = true;
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                self.confirm_quit = false;
                if self.save() {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('n' | 'N') => {
                info!("quit without saving");
                self.should_quit = true;
            }
            KeyCode::Esc => self.confirm_quit = false,
            _ => {}
        }
    }

    // ---- Saving ----------------------------------------------------------

    /// Save to the current path. Returns `true` when the file was written.
    fn save(&mut self) -> bool {
        match self.file_path.clone() {
            Some(path) => self.save_to(path),
            None => {
                self.start_prompt(InputMode::SaveAs, String::new());
                false
            }
        }
    }

    fn save_to(&mut self, path: PathBuf) -> bool {
        let text = match &mut self.pages {
            Some(pages) => pages.all_text(&self.core.text()),
            None => self.core.text(),
        };
        match save_file(
            &path,
            &text,
            self.encoding,
            self.line_ending,
            &self.file_options,
        ) {
            Ok(()) => {
                info!(path = %path.display(), chars = text.len(), "saved file");
                if self.file_path.as_ref() != Some(&path) {
                    let extension = path
                        .extension()
                        .map(|ext| ext.to_string_lossy().to_lowercase())
                        .unwrap_or_default();
                    self.core.set_extension(&extension);
                    self.file_path = Some(path);
                }
                self.core.mark_saved();
                self.dirty_pages = false;
                self.store_history();
                true
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.status_message = format!("Save failed: {err}");
                false
            }
        }
    }

    fn store_history(&mut self) {
        let (Some(store), Some(path)) = (self.history_store.as_mut(), self.file_path.as_ref())
        else {
            return;
        };
        self.core.store_persistent_state(store, &history_key(path));
        if let Err(err) = store.flush() {
            warn!(%err, "could not write undo history");
        }
    }

    // ---- Find / replace --------------------------------------------------

    fn start_prompt(&mut self, mode: InputMode, initial: String) {
        self.input_mode = mode;
        self.input_buffer = initial;
    }

    fn search_options_label(&self) -> String {
        let case = if self.search_options.case_sensitive {
            "Aa"
        } else {
            "aa"
        };
        let regex = if self.search_options.regex { ".*" } else { "--" };
        format!("{case} {regex}")
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.input_buffer);
                match self.input_mode {
                    InputMode::Find => {
                        self.input_mode = InputMode::Normal;
                        self.search_query = input;
                        self.start_search(None);
                    }
                    InputMode::ReplaceFind => {
                        self.search_query = input;
                        self.input_mode = InputMode::ReplaceWith;
                        self.input_buffer = self.replace_query.clone();
                    }
                    InputMode::ReplaceWith => {
                        self.input_mode = InputMode::Normal;
                        self.replace_query = input;
                        self.start_search(Some(self.replace_query.clone()));
                    }
                    InputMode::SaveAs => {
                        self.input_mode = InputMode::Normal;
                        if !input.is_empty() {
                            self.save_to(PathBuf::from(input));
                        }
                    }
                    InputMode::Normal | InputMode::Browse => {}
                }
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char('c' | 'C') if alt => {
                self.search_options.case_sensitive = !self.search_options.case_sensitive;
            }
            KeyCode::Char('r' | 'R') if alt => {
                self.search_options.regex = !self.search_options.regex;
            }
            KeyCode::Char(c) => self.input_buffer.push(c),
            _ => {}
        }
    }

    /// Search a snapshot of the text on a worker thread; a newer search supersedes it.
    fn start_search(&mut self, replacement: Option<String>) {
        if self.search_query.is_empty() {
            return;
        }
        let snapshot = self.core.text();
        let query = self.search_query.clone();
        let options = self.search_options;
        match self
            .search_job
            .spawn(move || find_matches(&snapshot, &query, options))
        {
            Ok(generation) => {
                debug!(generation, query = %self.search_query, "search started");
                self.pending_search = Some(PendingSearch {
                    query: self.search_query.clone(),
                    replacement,
                    options,
                });
                self.status_message = "Searching...".to_string();
            }
            Err(err) => self.status_message = format!("Search failed: {err}"),
        }
    }

    fn poll_search(&mut self) {
        let Some(matches) = self.search_job.poll() else {
            return;
        };
        // The text changed after the search started.
        let Some(pending) = self.pending_search.take() else {
            return;
        };
        let count = matches.len();
        let result = SearchResult::new(
            matches,
            pending.query,
            pending.replacement,
            pending.options.regex,
        );
        self.core.select_current(&result);
        self.events
            .sender()
            .send(EditorEvent::SearchFinished { matches: count });
        self.search = Some(result);
    }

    fn find_next(&mut self) {
        let Some(result) = self.search.as_mut() else {
            self.start_search(None);
            return;
        };
        if result.next_match().is_some() {
            self.core.select_current(result);
        } else {
            self.status_message = "No further matches".to_string();
        }
    }

    fn find_prev(&mut self) {
        let Some(result) = self.search.as_mut() else {
            return;
        };
        if result.previous_match().is_some() {
            self.core.select_current(result);
        } else {
            self.status_message = "No earlier matches".to_string();
        }
    }

    fn replace_current(&mut self) {
        let Some(result) = self.search.as_mut().filter(|result| result.is_replace) else {
            self.status_message = "Enter a replacement first (Ctrl+H)".to_string();
            return;
        };
        match self.core.replace_current_match(result) {
            Ok(true) => {}
            Ok(false) => self.status_message = "Nothing left to replace".to_string(),
            Err(err) => self.status_message = err.to_string(),
        }
    }

    fn replace_all(&mut self) {
        let Some(result) = self.search.take().filter(|result| result.is_replace) else {
            self.status_message = "Enter a replacement first (Ctrl+H)".to_string();
            return;
        };
        let options = SearchOptions {
            regex: result.is_regex,
            ..self.search_options
        };
        match self
            .core
            .replace_all(&result.query, &result.replacement, options)
        {
            Ok(count) => {
                self.events.sender().send(EditorEvent::Notice(format!(
                    "Replaced {count} occurrences"
                )));
            }
            Err(err) => self.status_message = err.to_string(),
        }
    }

    // ---- Pages and browsing ----------------------------------------------

    fn turn_page(&mut self, forward: bool) {
        let Some(pages) = self.pages.as_mut() else {
            self.status_message = "Document is not paged".to_string();
            return;
        };
        let possible = if forward {
            pages.can_read_next_page()
        } else {
            pages.can_read_prev_page()
        };
        if !possible {
            return;
        }
        if self.core.is_modified() {
            self.dirty_pages = true;
        }
        pages.save_page(self.core.text());
        let page = if forward {
            pages.next_page()
        } else {
            pages.prev_page()
        };
        self.core.load_text(pages.current_page_text());
        self.core.set_starting_real_line(pages.starting_line());
        info!(page, of = pages.max_page() + 1, "page changed");
        self.reset_view();
    }

    /// List `dir` in the background; the browser opens once the listing arrives.
    fn open_browser(&mut self, dir: PathBuf) {
        let show_hidden = self.config.show_hidden_files;
        let spawned = self.listing_job.spawn(move || {
            let entries = list_directory(&dir, show_hidden);
            (dir, entries)
        });
        if let Err(err) = spawned {
            self.status_message = format!("Cannot list directory: {err}");
        }
    }

    fn poll_listing(&mut self) {
        let Some((dir, listing)) = self.listing_job.poll() else {
            return;
        };
        match listing {
            Ok(entries) => {
                self.browser = Some(Browser {
                    dir,
                    entries,
                    selected: 0,
                });
                self.input_mode = InputMode::Browse;
            }
            Err(err) => {
                self.events.sender().send(EditorEvent::Notice(err.to_string()));
            }
        }
    }

    fn handle_browser_key(&mut self, key: KeyEvent) {
        let Some(browser) = self.browser.as_mut() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.browser = None;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Up => browser.selected = browser.selected.saturating_sub(1),
            KeyCode::Down => {
                browser.selected = (browser.selected + 1).min(browser.entries.len().saturating_sub(1));
            }
            KeyCode::Backspace => {
                if let Some(parent) = browser.dir.parent().map(Path::to_path_buf) {
                    self.open_browser(parent);
                }
            }
            KeyCode::Enter => {
                let Some(entry) = browser.entries.get(browser.selected) else {
                    return;
                };
                let (path, is_dir) = (entry.path.clone(), entry.is_dir);
                if is_dir {
                    self.open_browser(path);
                } else if self.is_modified() {
                    self.status_message = "Save the current file first (Ctrl+S)".to_string();
                } else {
                    match self.open(path) {
                        Ok(()) => {
                            self.browser = None;
                            self.input_mode = InputMode::Normal;
                        }
                        Err(err) => self.status_message = err.to_string(),
                    }
                }
            }
            _ => {}
        }
    }

    // ---- Events ----------------------------------------------------------

    fn dispatch_events(&mut self) {
        if self.events.dispatch() == 0 {
            return;
        }
        if let Ok(mut slot) = self.notice.lock() {
            if let Some(message) = slot.take() {
                self.status_message = message;
            }
        }
    }

    // ---- Rendering -------------------------------------------------------

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        if self.input_mode == InputMode::Browse {
            self.render_browser(frame, chunks[0]);
        } else {
            self.render_editor(frame, chunks[0]);
        }
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    fn gutter_width(&self) -> usize {
        if !self.config.line_numbers {
            return 0;
        }
        let starting = self.pages.as_ref().map_or(0, PageSystem::starting_line);
        let last = starting + self.core.document().len_lines();
        last.to_string().len() + 1
    }

    fn scroll_to_cursor(&mut self) {
        let line_count = self.core.layout().visual_line_count();
        let row = self.core.layout().line_of_offset(self.core.cursor());
        let rows = self.editor_rows.max(1);
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + rows {
            self.scroll_row = row + 1 - rows;
        }
        self.scroll_row = self.scroll_row.min(line_count.saturating_sub(1));
    }

    fn render_editor(&mut self, frame: &mut Frame, area: Rect) {
        let dirty = if self.is_modified() { " [+]" } else { "" };
        let read_only = if self.core.is_read_only() { " [RO]" } else { "" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {}{dirty}{read_only} ", self.file_name()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let gutter = self.gutter_width();
        let text_width = (inner.width as usize).saturating_sub(gutter).max(1);
        self.core.set_wrap(text_width, self.config.wrap_content);
        self.editor_rows = inner.height as usize;
        self.scroll_to_cursor();

        let line_count = self.core.layout().visual_line_count();
        let viewport = Viewport::rows(self.scroll_row, self.editor_rows, line_count);
        if self.core.viewport() != viewport {
            self.core.set_viewport(viewport);
        }

        let first = self.scroll_row;
        let last = (first + self.editor_rows).min(line_count);
        let mut numbers = vec![None; last.saturating_sub(first)];
        if gutter > 0 {
            for (row, real) in self.core.line_map().numbered_lines() {
                if (first..last).contains(&row) {
                    numbers[row - first] = Some(real);
                }
            }
        }

        let layout = self.core.layout();
        let document = self.core.document();
        let selection = self.core.selection().range();
        let tab_width = layout.tab_width();
        let mut lines = Vec::with_capacity(numbers.len());
        for (row, number) in (first..last).zip(&numbers) {
            let start = layout.line_start(row);
            let end = layout.line_end(row);
            let mut spans = Vec::new();
            if gutter > 0 {
                let label = match number {
                    Some(n) => format!("{n:>width$} ", width = gutter - 1),
                    None => " ".repeat(gutter),
                };
                spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
            }
            spans.extend(styled_row(
                &document.slice(start, end),
                start,
                self.core.spans(),
                &selection,
                tab_width,
            ));
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), inner);

        if self.input_mode == InputMode::Normal && !self.confirm_quit {
            let cursor = self.core.cursor();
            let row = layout.line_of_offset(cursor);
            if (first..last).contains(&row) {
                let column = display_width(&document.slice(layout.line_start(row), cursor), tab_width);
                let x = inner.x + (gutter + column).min(inner.width as usize) as u16;
                let y = inner.y + (row - first) as u16;
                frame.set_cursor_position((x, y));
            }
        }
    }

    fn render_browser(&self, frame: &mut Frame, area: Rect) {
        let Some(browser) = &self.browser else {
            return;
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", browser.dir.display()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = (inner.height as usize).max(1);
        let first = browser.selected.saturating_sub(rows - 1);
        let lines: Vec<Line> = browser
            .entries
            .iter()
            .enumerate()
            .skip(first)
            .take(rows)
            .map(|(i, entry)| {
                let text = if entry.is_dir {
                    format!("{}/", entry.name)
                } else {
                    format!("{:<40} {:>10}", entry.name, entry.size)
                };
                let style = if i == browser.selected {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else if entry.is_dir {
                    Style::default().fg(Color::LightBlue)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(text, style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let status_text = match self.input_mode {
            InputMode::Find => format!(
                "Find [{}] > {}  (Enter=Search, Esc=Cancel, Alt+C/R=Options)",
                self.search_options_label(),
                self.input_buffer
            ),
            InputMode::ReplaceFind => format!(
                "Replace: Find [{}] > {}  (Enter=Next, Esc=Cancel)",
                self.search_options_label(),
                self.input_buffer
            ),
            InputMode::ReplaceWith => format!(
                "Replace: With [{}] > {}  (Enter=Search, Esc=Cancel)",
                self.search_options_label(),
                self.input_buffer
            ),
            InputMode::SaveAs => format!("Save as > {}", self.input_buffer),
            _ if !self.status_message.is_empty() => self.status_message.clone(),
            _ => {
                let document = self.core.document();
                let cursor = self.core.cursor();
                let line = document.line_of_char(cursor);
                let column = cursor - document.line_to_char(line);
                let starting = self.pages.as_ref().map_or(0, PageSystem::starting_line);
                let page = self
                    .pages
                    .as_ref()
                    .map(|pages| {
                        format!(" | Page {}/{}", pages.current_page() + 1, pages.max_page() + 1)
                    })
                    .unwrap_or_default();
                let matches = self
                    .search
                    .as_ref()
                    .map(|result| format!(" | {} matches", result.len()))
                    .unwrap_or_default();
                format!(
                    "Ln {} Col {} | {} {}{page}{matches}",
                    starting + line + 1,
                    column + 1,
                    self.encoding.name(),
                    self.line_ending,
                )
            }
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = if self.confirm_quit {
            "Unsaved changes. Y:save and quit  N:quit without saving  Esc:cancel"
        } else if self.input_mode == InputMode::Browse {
            "Up/Down:select  Enter:open  Backspace:parent  Esc:back"
        } else {
            "^S:save  ^Q:quit  ^Z/^Y:undo/redo  ^F/^H:find/replace  F3/S-F3:next/prev  ^R/^A:replace/all  ^N/^P:page  ^O:browse"
        };
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

fn category_style(category: ColorCategory) -> Style {
    let style = Style::default();
    match category {
        ColorCategory::Keyword => style.fg(Color::LightBlue),
        ColorCategory::String => style.fg(Color::Green),
        ColorCategory::Number => style.fg(Color::Yellow),
        ColorCategory::Comment => style.fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ColorCategory::Tag => style.fg(Color::LightRed),
        ColorCategory::Attribute => style.fg(Color::Cyan),
        ColorCategory::AttributeValue => style.fg(Color::LightGreen),
        ColorCategory::Variable => style.fg(Color::Magenta),
        ColorCategory::Default => style,
    }
}

/// Styled spans for one visual row starting at character offset `start`.
fn styled_row(
    text: &str,
    start: usize,
    highlights: &[HighlightInfo],
    selection: &Range<usize>,
    tab_width: usize,
) -> Vec<Span<'static>> {
    let end = start + text.chars().count();
    let visible: Vec<&HighlightInfo> = highlights
        .iter()
        .filter(|info| info.start < end && info.end > start)
        .collect();

    let mut out = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    let mut cells = 0;
    for (i, ch) in text.chars().enumerate() {
        if ch == '\n' {
            break;
        }
        let offset = start + i;
        let mut style = visible
            .iter()
            .find(|info| info.start <= offset && offset < info.end)
            .map_or_else(Style::default, |info| category_style(info.category));
        if selection.contains(&offset) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if style != run_style && !run.is_empty() {
            out.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;

        let width = cell_width_at(ch, cells, tab_width);
        if ch == '\t' {
            run.extend(std::iter::repeat_n(' ', width));
        } else {
            run.push(ch);
        }
        cells += width;
    }
    if !run.is_empty() {
        out.push(Span::styled(run, run_style));
    }
    out
}

fn display_width(text: &str, tab_width: usize) -> usize {
    text.chars()
        .filter(|&ch| ch != '\n')
        .fold(0, |cells, ch| cells + cell_width_at(ch, cells, tab_width))
}

/// Store prefix for a file's undo history.
fn history_key(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn default_config_dir() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(env::temp_dir)
        .join("viper")
}

/// Log to `<state_dir>/viper.log` when `VIPER_LOG` is set; the terminal belongs to the UI.
fn init_logging(state_dir: &Path) -> anyhow::Result<()> {
    let Ok(level) = env::var("VIPER_LOG") else {
        return Ok(());
    };
    fs::create_dir_all(state_dir)?;
    let path = state_dir.join("viper.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::new(format!(
        "viper={level},viper_core={level},viper_highlight={level}"
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(cli: &Cli, config_path: &Path) -> anyhow::Result<(EditorConfig, FileOptions)> {
    let mut config = if cli.config.is_some() || config_path.exists() {
        EditorConfig::load(config_path)
            .with_context(|| format!("loading config {}", config_path.display()))?
    } else {
        EditorConfig::default()
    };
    if let Some(label) = &cli.encoding {
        config.default_encoding = label.clone();
        config.auto_encoding = false;
        config.validate()?;
    }
    if cli.no_wrap {
        config.wrap_content = false;
    }

    let mut file_options = config.file_options()?;
    if let Some(program) = &cli.shell {
        let session = ShellSession::new(program.as_str());
        session.acquire();
        file_options.shell = Some(session);
    }
    Ok((config, file_options))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_dir().join("config.toml"));
    let state_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(default_config_dir, Path::to_path_buf);
    init_logging(&state_dir)?;
    info!(version = env!("CARGO_PKG_VERSION"), "viper starting");

    let (config, file_options) = load_config(&cli, &config_path)?;
    let history_store = match JsonFileStore::open(state_dir.join("history.json")) {
        Ok(store) => Some(store),
        Err(err) => {
            warn!(%err, "undo history will not be persisted");
            None
        }
    };

    let mut app = App::new(config, file_options, history_store);
    match cli.file {
        Some(path) if path.is_dir() => app.open_browser(path),
        Some(path) if path.exists() => app
            .open(path.clone())
            .with_context(|| format!("opening {}", path.display()))?,
        Some(path) => app.open_new(path),
        None => {}
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.poll_search();
        app.poll_listing();
        app.dispatch_events();
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key_event(key),
                Event::Paste(text) => app.handle_paste(text),
                // Resize is picked up by the next draw.
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styled_row_splits_on_category_and_selection() {
        let highlights = [HighlightInfo::new(10, 13, ColorCategory::Keyword)];
        let spans = styled_row("int x;\n", 10, &highlights, &(14..15), 4);
        let texts: Vec<&str> = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(texts, vec!["int", " ", "x", ";"]);
        assert_eq!(spans[0].style, Style::default().fg(Color::LightBlue));
        assert!(spans[2].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_tabs_expand_to_tab_stops() {
        let spans = styled_row("a\tb", 0, &[], &(0..0), 4);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "a   b");
        assert_eq!(display_width("a\t", 4), 4);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["viper", "notes.txt", "--encoding", "latin1", "--no-wrap"])
            .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("notes.txt")));
        assert_eq!(cli.encoding.as_deref(), Some("latin1"));
        assert!(cli.no_wrap);

        let (config, options) = load_config(&cli, Path::new("/nonexistent/viper.toml")).unwrap();
        assert!(!config.wrap_content);
        assert!(!options.auto_encoding);
        assert_eq!(options.default_encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_search_result_arrives_from_worker() {
        let mut app = App::new(EditorConfig::default(), FileOptions::default(), None);
        app.core.load_text("one two one");
        app.search_query = "one".to_string();
        app.start_search(Some("1".to_string()));

        let matches = app.search_job.wait().unwrap();
        let pending = app.pending_search.take().unwrap();
        let result = SearchResult::new(matches, pending.query, pending.replacement, false);
        app.core.select_current(&result);
        app.search = Some(result);
        assert_eq!(app.core.selection().range(), 0..3);

        app.replace_all();
        assert_eq!(app.core.text(), "1 two 1");
        app.dispatch_events();
        assert_eq!(app.status_message, "Replaced 2 occurrences");
    }
}
