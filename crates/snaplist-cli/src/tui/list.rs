//! TUI list view for snaplist.
//!
//! Provides a full-screen terminal UI with:
//! - The filtered, ordered snapshot table with per-row actions
//! - A filter bar mirroring the shareable location
//! - Key bindings: j/k navigate, / search metadata, t pick tags, a add a tag
//!   from the selected row, x clear tags, s cycle sort, m collapse metadata,
//!   r refresh, d delete, Enter open, o download link, q quit

use super::worker::SubmissionWorker;
use crate::cmd::list::single_line;
use crate::cmd::{CmdContext, FilterArgs, Session, TargetArgs, display_location, open_session};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
};
use snaplist_core::actions::{ActionRequest, DELETE_PROMPT, NavigationState};
use snaplist_core::controller::SnapshotListController;
use snaplist_core::prefs::PreferenceStore;
use snaplist_core::query::{History, MemoryHistory};
use snaplist_core::slots::{DefaultSlots, RowAction};
use snaplist_core::sort::SortDirection;
use snaplist_core::view::ListView;
use std::io;
use std::time::{Duration, Instant};

const STATUS_TTL: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Input modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    /// Typing a metadata search query.
    Search,
    /// Tag picker popup is open.
    TagPicker,
    /// Delete confirmation is open.
    ConfirmDelete,
}

/// Where the tag picker draws its choices from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagSource {
    /// Every tag in the collection; Enter toggles.
    Vocabulary,
    /// The selected row's tags; Enter adds.
    Row,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

pub struct ListApp {
    controller: SnapshotListController,
    history: MemoryHistory,
    prefs: Box<dyn PreferenceStore>,
    worker: SubmissionWorker,
    /// Selected row index in display order.
    table_state: TableState,
    input_mode: InputMode,
    search_buf: String,
    /// Query before entering Search mode (for Esc cancel).
    search_prev_query: String,
    tag_source: TagSource,
    tag_cursor: usize,
    status_msg: Option<(String, Instant)>,
    should_quit: bool,
}

impl ListApp {
    pub fn new(session: Session, prefs: Box<dyn PreferenceStore>) -> Self {
        let Session {
            store,
            controller,
            history,
        } = session;
        let worker = SubmissionWorker::spawn(
            store,
            controller.project_id().to_string(),
            controller.kind(),
        );
        let mut app = Self {
            controller,
            history,
            prefs,
            worker,
            table_state: TableState::default(),
            input_mode: InputMode::Normal,
            search_buf: String::new(),
            search_prev_query: String::new(),
            tag_source: TagSource::Vocabulary,
            tag_cursor: 0,
            status_msg: None,
            should_quit: false,
        };
        app.clamp_selection();
        app
    }

    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn location(&self) -> String {
        display_location(self.history.location())
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_msg = Some((msg.into(), Instant::now()));
    }

    fn row_ids(&self) -> Vec<String> {
        self.controller.rows().iter().map(|s| s.id.clone()).collect()
    }

    pub fn selected_id(&self) -> Option<String> {
        let index = self.table_state.selected()?;
        self.row_ids().into_iter().nth(index)
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.rows().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let index = self.table_state.selected().unwrap_or(0).min(len - 1);
        self.table_state.select(Some(index));
    }

    fn select_next(&mut self) {
        let len = self.controller.rows().len();
        if len == 0 {
            return;
        }
        let next = self.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.table_state.select(Some(next));
    }

    fn select_prev(&mut self) {
        let prev = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(prev));
        self.clamp_selection();
    }

    fn select_last(&mut self) {
        let len = self.controller.rows().len();
        self.table_state.select(len.checked_sub(1));
    }

    /// Drain finished submissions from the worker.
    pub fn tick(&mut self) {
        while let Some(done) = self.worker.try_complete() {
            self.controller.complete_submission();
            match done.result {
                Ok(snapshots) => {
                    let noun = self.controller.kind().noun();
                    let msg = match &done.request {
                        ActionRequest::ReloadSnapshots => {
                            format!("reloaded {} {noun}", snapshots.len())
                        }
                        ActionRequest::DeleteSnapshot { snapshot_id } => {
                            format!("deleted {snapshot_id}")
                        }
                    };
                    self.controller.replace_snapshots(snapshots);
                    self.set_status(msg);
                }
                Err(err) => {
                    tracing::warn!(action = done.request.name(), "submission failed: {err}");
                    self.set_status(format!("{} failed: {err}", done.request.name()));
                }
            }
            self.clamp_selection();
        }
    }

    // -----------------------------------------------------------------------
    // Key handling
    // -----------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match self.input_mode {
            InputMode::Search => self.handle_search_key(key),
            InputMode::TagPicker => self.handle_tag_picker_key(key),
            InputMode::ConfirmDelete => self.handle_confirm_key(key),
            InputMode::Normal => self.handle_normal_key(key, ctrl),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,

            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('g') | KeyCode::Home => {
                self.table_state.select(Some(0));
                self.clamp_selection();
            }
            KeyCode::Char('G') | KeyCode::End => self.select_last(),

            KeyCode::Char('/') => {
                self.search_prev_query = self.controller.state().metadata_query.clone();
                self.search_buf = self.search_prev_query.clone();
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('t') => self.open_tag_picker(TagSource::Vocabulary),
            KeyCode::Char('a') => self.open_tag_picker(TagSource::Row),
            KeyCode::Char('x') => {
                self.controller.set_selected_tags(Vec::new(), &mut self.history);
                self.clamp_selection();
            }
            KeyCode::Char('s') => {
                let sort = self.controller.cycle_sort();
                self.set_status(format!("sort: {sort}"));
            }
            KeyCode::Char('m') => match self.controller.toggle_metadata_collapsed(self.prefs.as_mut()) {
                Ok(true) => self.set_status("metadata collapsed"),
                Ok(false) => self.set_status("metadata expanded"),
                Err(err) => self.set_status(format!("could not save preference: {err}")),
            },
            KeyCode::Char('r') => {
                if let Err(err) = self.controller.request_refresh(&mut self.worker) {
                    self.set_status(err.to_string());
                }
            }
            KeyCode::Char('d') => {
                let Some(id) = self.selected_id() else {
                    return;
                };
                match self.controller.begin_delete(&id) {
                    Ok(()) => self.input_mode = InputMode::ConfirmDelete,
                    Err(err) => self.set_status(err.to_string()),
                }
            }
            KeyCode::Enter => self.activate_selected(|action| match action {
                RowAction::View { target, .. } => Some(format!("open {target}")),
                _ => None,
            }),
            KeyCode::Char('o') => self.activate_selected(|action| match action {
                RowAction::Download { link, .. } => Some(format!("download {link}")),
                _ => None,
            }),
            _ => {}
        }
    }

    /// Report the first matching row action, unless it is disabled.
    fn activate_selected(&mut self, pick: impl Fn(&RowAction) -> Option<String>) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(snapshot) = self.controller.snapshots().iter().find(|s| s.id == id) else {
            return;
        };
        let actions = self.controller.row_actions(snapshot, &DefaultSlots);
        let found = actions
            .iter()
            .find_map(|action| pick(action).map(|msg| (msg, action.is_disabled())));
        match found {
            Some((_, true)) => self.set_status("busy: wait for the current submission"),
            Some((msg, false)) => self.set_status(msg),
            None => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_buf = self.search_prev_query.clone();
                self.controller
                    .set_metadata_query(self.search_prev_query.clone(), &mut self.history);
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.search_buf.pop();
                self.controller
                    .set_metadata_query(self.search_buf.clone(), &mut self.history);
            }
            KeyCode::Char(c) => {
                self.search_buf.push(c);
                self.controller
                    .set_metadata_query(self.search_buf.clone(), &mut self.history);
            }
            _ => {}
        }
        self.clamp_selection();
    }

    fn picker_tags(&self) -> Vec<String> {
        match self.tag_source {
            TagSource::Vocabulary => self.controller.all_tags().to_vec(),
            TagSource::Row => self
                .selected_id()
                .and_then(|id| self.controller.snapshots().iter().find(|s| s.id == id))
                .map(|s| s.tags.clone())
                .unwrap_or_default(),
        }
    }

    fn open_tag_picker(&mut self, source: TagSource) {
        self.tag_source = source;
        self.tag_cursor = 0;
        if self.picker_tags().is_empty() {
            self.set_status("no tags");
            return;
        }
        self.input_mode = InputMode::TagPicker;
    }

    fn handle_tag_picker_key(&mut self, key: KeyEvent) {
        let tags = self.picker_tags();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.input_mode = InputMode::Normal,
            KeyCode::Char('j') | KeyCode::Down => {
                self.tag_cursor = (self.tag_cursor + 1).min(tags.len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.tag_cursor = self.tag_cursor.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(tag) = tags.get(self.tag_cursor) else {
                    return;
                };
                let selected = self.controller.state().selected_tags.contains(tag);
                match self.tag_source {
                    TagSource::Vocabulary if selected => {
                        self.controller.remove_tag(tag, &mut self.history);
                    }
                    TagSource::Vocabulary => {
                        self.controller.add_tag(tag, &mut self.history);
                    }
                    TagSource::Row => {
                        if self.controller.add_tag(tag, &mut self.history) {
                            self.set_status(format!("filtering by {tag}"));
                        } else {
                            self.set_status(format!("{tag} already selected"));
                        }
                        self.input_mode = InputMode::Normal;
                    }
                }
                self.clamp_selection();
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y' | 'Y') => true,
            KeyCode::Char('n' | 'N') | KeyCode::Esc => false,
            _ => return,
        };
        self.input_mode = InputMode::Normal;
        if let Err(err) = self.controller.confirm_delete(confirmed, &mut self.worker) {
            self.set_status(err.to_string());
        }
    }

    pub fn render(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        render_into(frame, self, area);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn sort_marker(sort: SortDirection) -> &'static str {
    match sort {
        SortDirection::Descending => " ↓",
        SortDirection::Ascending => " ↑",
        SortDirection::Unset => "",
    }
}

fn action_spans(actions: &[RowAction]) -> Line<'static> {
    let mut spans = Vec::with_capacity(actions.len() * 2);
    for action in actions {
        let style = if action.is_disabled() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(action.label().to_string(), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Owned table contents, built before any widget borrows the app mutably.
enum Body {
    Message(String),
    Rows {
        header: Vec<String>,
        rows: Vec<Row<'static>>,
        hint: Option<&'static str>,
    },
}

fn build_body(app: &ListApp) -> Body {
    match app.controller.view(&DefaultSlots) {
        ListView::Nested => Body::Message(String::new()),
        ListView::Empty(empty) => Body::Message(empty.message),
        ListView::Table(table) => {
            let header = vec![
                table.id_header.to_string(),
                format!("Timestamp{}", sort_marker(table.controls.sort)),
                "Tags".to_string(),
                "Metadata".to_string(),
                "Actions".to_string(),
            ];
            let rows = table
                .rows
                .iter()
                .map(|row| {
                    Row::new(vec![
                        Cell::from(row.snapshot.id.clone()),
                        Cell::from(row.timestamp.clone()),
                        Cell::from(row.snapshot.tags.join(", "))
                            .style(Style::default().fg(Color::Yellow)),
                        Cell::from(single_line(&row.metadata.text)),
                        Cell::from(action_spans(&row.actions)),
                    ])
                })
                .collect();
            Body::Rows {
                header,
                rows,
                hint: table.hint,
            }
        }
    }
}

fn filter_bar(app: &ListApp) -> Vec<Line<'static>> {
    let state = app.controller.state();
    let tags = if state.selected_tags.is_empty() {
        "(any)".to_string()
    } else {
        state.selected_tags.join(", ")
    };
    let search = if app.input_mode == InputMode::Search {
        format!("{}_", app.search_buf)
    } else if state.metadata_query.is_empty() {
        "(none)".to_string()
    } else {
        state.metadata_query.clone()
    };
    let label = Style::default().fg(Color::DarkGray);
    vec![
        Line::from(vec![
            Span::styled("tags ", label),
            Span::styled(tags, Style::default().fg(Color::Yellow)),
            Span::styled("  search ", label),
            Span::raw(search),
            Span::styled("  sort ", label),
            Span::raw(state.sort.as_str()),
            Span::styled("  metadata ", label),
            Span::raw(if state.metadata_collapsed {
                "collapsed"
            } else {
                "full"
            }),
        ]),
        Line::from(Span::styled(app.location(), label)),
    ]
}

fn render_into(frame: &mut ratatui::Frame<'_>, app: &mut ListApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let crumb = app.controller.context().crumb();
    let title = format!(" {} · {} ", crumb.link_text, app.controller.project_id());
    let bar = Paragraph::new(filter_bar(app)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Green))
            .title(title)
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(bar, chunks[0]);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .title(format!(
            " {} of {} ",
            app.controller.rows().len(),
            app.controller.snapshots().len()
        ));

    match build_body(app) {
        Body::Message(message) => {
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(list_block);
            frame.render_widget(paragraph, chunks[1]);
        }
        Body::Rows { hint: Some(hint), rows, .. } if rows.is_empty() => {
            let paragraph = Paragraph::new(hint)
                .alignment(Alignment::Center)
                .block(list_block);
            frame.render_widget(paragraph, chunks[1]);
        }
        Body::Rows { header, rows, .. } => {
            let widths = [
                Constraint::Percentage(18),
                Constraint::Length(24),
                Constraint::Percentage(18),
                Constraint::Min(16),
                Constraint::Length(30),
            ];
            let table = Table::new(rows, widths)
                .header(
                    Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(list_block)
                .row_highlight_style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(table, chunks[1], &mut app.table_state);
        }
    }

    frame.render_widget(Paragraph::new(build_status_bar(app)), chunks[2]);

    match app.input_mode {
        InputMode::TagPicker => render_tag_picker(frame, app, area),
        InputMode::ConfirmDelete => render_confirm(frame, app, area),
        InputMode::Normal | InputMode::Search => {}
    }
}

fn build_status_bar(app: &ListApp) -> Line<'static> {
    if let Some((msg, at)) = &app.status_msg {
        if at.elapsed() < STATUS_TTL {
            return Line::from(Span::styled(
                msg.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }
    }
    if let NavigationState::Submitting(request) = app.controller.navigation() {
        return Line::from(Span::styled(
            format!("{}…", request.name()),
            Style::default().fg(Color::Magenta),
        ));
    }
    let refresh = app.controller.kind().refresh_label();
    Line::from(Span::styled(
        format!(
            "j/k move  / search  t tags  a row tag  x clear  s sort  m metadata  r {refresh}  d delete  q quit"
        ),
        Style::default().fg(Color::DarkGray),
    ))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_tag_picker(frame: &mut ratatui::Frame<'_>, app: &ListApp, area: Rect) {
    let tags = app.picker_tags();
    let selected = &app.controller.state().selected_tags;
    let items: Vec<ListItem<'static>> = tags
        .iter()
        .map(|tag| {
            let mark = if selected.contains(tag) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {tag}"))
        })
        .collect();
    let title = match app.tag_source {
        TagSource::Vocabulary => " tags ",
        TagSource::Row => " add tag from row ",
    };
    let height = u16::try_from(tags.len()).unwrap_or(u16::MAX).saturating_add(2).min(20);
    let popup = centered_rect(40, height, area);
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    state.select(Some(app.tag_cursor));
    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}

fn render_confirm(frame: &mut ratatui::Frame<'_>, app: &ListApp, area: Rect) {
    let id = app.controller.pending_delete().unwrap_or_default();
    let popup = centered_rect(44, 5, area);
    let body = vec![
        Line::from(format!("Delete {id}?")),
        Line::from(Span::styled(
            "y confirm   n cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(body).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Red))
            .title(format!(" {DELETE_PROMPT} ")),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut ListApp) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.render(frame, area);
        })?;
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        app.tick();
        if app.should_quit() {
            return Ok(());
        }
    }
}

/// Run the interactive list. Prints the final location on exit.
pub fn run_list_tui(ctx: &CmdContext, target: &TargetArgs, filters: &FilterArgs) -> Result<()> {
    let session = open_session(ctx, target, filters)?;
    let mut app = ListApp::new(session, ctx.preferences());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    println!("{}", app.location());
    Ok(())
}
