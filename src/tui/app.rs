//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which owns the task store while the
//! UI runs, turns key presses into store operations, advances running
//! stopwatches on every loop iteration, and renders the list, the add/edit
//! form, the help screen and the delete confirmation.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::fields::Priority;
use crate::format::{format_due_relative, format_elapsed, truncate};
use crate::storage::KeyValueStore;
use crate::store::{StoreError, TaskStore};
use crate::task::{Task, TaskId};
use crate::tui::{
    colors::{DARK_RED, GOLD, INDIGO, TIMER_GREEN},
    enums::{AppState, InputMode},
    input::InputField,
    task_form::{FormResult, TaskForm, DUE_ORDER, NAME_ORDER, NOTES_ORDER, PRIORITY_ORDER},
    utils::centered_rect,
};
use crate::view::ViewFilters;

/// Longest the loop waits for input when no stopwatch is due sooner.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Main application state for the terminal user interface.
pub struct App<S> {
    state: AppState,
    store: TaskStore<S>,
    data_dir: PathBuf,
    filters: ViewFilters,
    task_list_state: TableState,
    filtered_tasks: Vec<TaskId>,
    task_form: TaskForm,
    editing: Option<TaskId>,
    input_mode: InputMode,
    status_message: String,
}

impl<S: KeyValueStore> App<S> {
    /// Create a new App around an already loaded store.
    pub fn new(store: TaskStore<S>, data_dir: &Path) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            store,
            data_dir: data_dir.to_path_buf(),
            filters: ViewFilters::default(),
            task_list_state: TableState::default(),
            filtered_tasks: Vec::new(),
            task_form: TaskForm::new(),
            editing: None,
            input_mode: InputMode::None,
            status_message: String::new(),
        };
        app.update_filtered_tasks();
        app
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Ids of the rows currently shown, in display order.
    pub fn visible_tasks(&self) -> &[TaskId] {
        &self.filtered_tasks
    }

    /// Recompute the derived list, keeping the selected task selected when it
    /// is still visible.
    fn update_filtered_tasks(&mut self) {
        let old_selected_id = self.selected_id();

        self.filtered_tasks = self
            .filters
            .apply(self.store.tasks())
            .into_iter()
            .map(|t| t.id)
            .collect();

        let new_idx = old_selected_id
            .and_then(|id| self.filtered_tasks.iter().position(|&x| x == id))
            .or(if self.filtered_tasks.is_empty() { None } else { Some(0) });
        self.task_list_state.select(new_idx);
    }

    /// Id of the highlighted row.
    pub fn selected_id(&self) -> Option<TaskId> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.filtered_tasks.get(idx))
            .copied()
    }

    fn select_task(&mut self, id: TaskId) {
        if let Some(idx) = self.filtered_tasks.iter().position(|&x| x == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    fn move_selection(&mut self, down: bool) {
        if self.filtered_tasks.is_empty() {
            return;
        }
        let last = self.filtered_tasks.len() - 1;
        let current = self.task_list_state.selected().unwrap_or(0);
        let next = if down {
            if current >= last { 0 } else { current + 1 }
        } else if current == 0 {
            last
        } else {
            current - 1
        };
        self.task_list_state.select(Some(next));
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Surface a store error in the status bar. In-memory state is kept.
    fn report<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_status_message(format!("Save failed: {e}"));
                None
            }
        }
    }

    /// Advance running stopwatches to `now`.
    pub fn tick(&mut self, now: Instant) {
        let result = self.store.tick(now);
        self.report(result);
    }

    fn open_add_form(&mut self) {
        self.task_form = TaskForm::new();
        self.editing = None;
        self.state = AppState::AddTask;
    }

    fn open_edit_form(&mut self, id: TaskId) {
        if let Some(task) = self.store.get(id) {
            self.task_form = TaskForm::from_task(task);
            self.editing = Some(id);
            self.state = AppState::EditTask;
        }
    }

    fn close_form(&mut self) {
        self.state = AppState::TaskList;
        self.input_mode = InputMode::None;
        self.editing = None;
    }

    /// Validate the form and hand it to the store.
    fn submit_form(&mut self) {
        let today = Local::now().date_naive();
        let (draft, warning) = match self.task_form.to_draft(today) {
            FormResult::Ready(draft) => (draft, None),
            FormResult::UnparsedDue(draft, raw) => {
                (draft, Some(format!("Ignored unrecognised due date '{raw}'")))
            }
        };
        if !draft.is_valid() {
            self.set_status_message("Task name cannot be blank");
            return;
        }

        match self.editing {
            Some(id) => {
                let result = self.store.update_task(id, draft);
                if self.report(result).is_some() {
                    self.set_status_message(warning.unwrap_or_else(|| "Task updated".into()));
                }
                self.close_form();
                self.update_filtered_tasks();
                self.select_task(id);
            }
            None => {
                let result = self.store.add_task(draft);
                let added = self.report(result).flatten();
                if added.is_some() {
                    self.set_status_message(warning.unwrap_or_else(|| "Task added".into()));
                }
                self.close_form();
                self.update_filtered_tasks();
                if let Some(id) = added {
                    self.select_task(id);
                }
            }
        }
    }

    /// Handle a key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers, now: Instant) -> bool {
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers, now),
            AppState::AddTask | AppState::EditTask => {
                self.handle_form_input(key, modifiers);
                false
            }
            AppState::Help => {
                self.handle_help_input(key);
                false
            }
            AppState::Confirm => {
                self.handle_confirm_input(key);
                false
            }
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_mode = InputMode::None;
                self.filters.search.clear();
                self.update_filtered_tasks();
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::None;
                if self.filters.search.is_empty() {
                    self.set_status_message("Search cleared");
                } else {
                    self.set_status_message(format!(
                        "Search '{}' ({} tasks)",
                        self.filters.search,
                        self.filtered_tasks.len()
                    ));
                }
            }
            KeyCode::Backspace => {
                if self.filters.search.pop().is_some() {
                    self.update_filtered_tasks();
                }
            }
            KeyCode::Char(c) => {
                self.filters.search.push(c);
                self.update_filtered_tasks();
            }
            _ => {}
        }
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Every action addresses the highlighted row by task id.
    fn handle_task_list_input(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> bool {
        if self.input_mode == InputMode::Search {
            self.handle_search_input(key);
            return false;
        }

        match key {
            KeyCode::Char('c') | KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => {
                return true
            }
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if !self.filters.search.is_empty() {
                    self.filters.search.clear();
                    self.update_filtered_tasks();
                    self.set_status_message("Search cleared");
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('a') | KeyCode::Char('n') => self.open_add_form(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.open_edit_form(id);
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('c') => {
                if let Some(id) = self.selected_id() {
                    let result = self.store.toggle_complete(id);
                    if self.report(result).is_some() {
                        let done = self.store.get(id).is_some_and(|t| t.completed);
                        self.set_status_message(if done { "Marked complete" } else { "Marked pending" });
                    }
                    self.update_filtered_tasks();
                }
            }
            KeyCode::Char('t') => {
                if let Some(id) = self.selected_id() {
                    if self.store.is_timer_active(id) {
                        self.store.stop_timer(id);
                        self.set_status_message("Timer stopped");
                    } else if self.store.start_timer(id, now) {
                        self.set_status_message("Timer started");
                    }
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected_id() {
                    if self.store.start_timer(id, now) {
                        self.set_status_message("Timer started");
                    } else {
                        self.set_status_message("Timer already running");
                    }
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    if self.store.stop_timer(id) {
                        self.set_status_message("Timer stopped");
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    if self.store.request_delete(id) {
                        self.state = AppState::Confirm;
                    }
                }
            }
            KeyCode::Char('f') => {
                self.filters.status = self.filters.status.next();
                self.update_filtered_tasks();
                self.set_status_message(format!("Filter: {}", self.filters.status.label()));
            }
            KeyCode::Char('o') => {
                self.filters.sort = self.filters.sort.next();
                self.update_filtered_tasks();
                self.set_status_message(format!("Sort: {}", self.filters.sort.label()));
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_form_input(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Esc => {
                self.close_form();
                self.set_status_message("Cancelled");
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab => self.task_form.next_field(),
            KeyCode::BackTab => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete if modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = self.active_form_field() {
                    field.clear();
                }
            }
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Home => {
                if let Some(field) = self.active_form_field() {
                    field.move_home();
                }
            }
            KeyCode::End => {
                if let Some(field) = self.active_form_field() {
                    field.move_end();
                }
            }
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn active_form_field(&mut self) -> Option<&mut InputField> {
        match self.task_form.current_field {
            NAME_ORDER => Some(&mut self.task_form.name),
            NOTES_ORDER => Some(&mut self.task_form.notes),
            DUE_ORDER => Some(&mut self.task_form.due),
            _ => None,
        }
    }

    /// Handle keyboard input in the delete confirmation dialog.
    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = self.store.confirm_delete();
                if let Some(removed) = self.report(result).flatten() {
                    info!(id = %removed.id, "task deleted from UI");
                    self.set_status_message(format!("Deleted '{}'", removed.name));
                }
                self.state = AppState::TaskList;
                self.update_filtered_tasks();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.store.cancel_delete();
                self.state = AppState::TaskList;
                self.set_status_message("Delete cancelled");
            }
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')) {
            self.state = AppState::TaskList;
        }
    }

    /// Wait for input until the next stopwatch tick is due, then dispatch it.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        let timeout = self
            .store
            .next_tick_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                self.clear_status_message();
                return Ok(self.handle_key(key.code, key.modifiers, Instant::now()));
            }
        }
        Ok(false)
    }

    /// Render the header, filter summary and task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let today = Local::now().date_naive();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let header_text = Line::from(vec![
            Span::styled("STUDY TRACKER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "Filter: {}  Sort: {}",
                    self.filters.status.label(),
                    self.filters.sort.label()
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let header_cells = ["", "Name", "Priority", "Due", "Time", "Notes"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(INDIGO).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .filtered_tasks
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|task| self.task_row(task, today))
            .collect();

        let widths = [
            Constraint::Length(5),  // done + timer
            Constraint::Min(24),    // Name
            Constraint::Length(9),  // Priority
            Constraint::Length(10), // Due
            Constraint::Length(9),  // Time
            Constraint::Min(10),    // Notes
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.filtered_tasks.len(),
                self.store.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    fn task_row(&self, task: &Task, today: chrono::NaiveDate) -> Row<'static> {
        let running = self.store.is_timer_active(task.id);
        let marker = format!(
            "{}{}",
            if task.completed { "[x]" } else { "[ ]" },
            if running { " ▶" } else { "" }
        );
        let priority_style = match task.priority {
            Priority::High => Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
            Priority::Medium => Style::default(),
            Priority::Low => Style::default().fg(Color::DarkGray),
        };
        let style = if task.completed {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else if running {
            Style::default().fg(TIMER_GREEN).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        Row::new(vec![
            Cell::from(marker),
            Cell::from(task.name.clone()),
            Cell::from(task.priority.label()).style(priority_style),
            Cell::from(format_due_relative(task.due_date, today)),
            Cell::from(format_elapsed(task.time_spent)),
            Cell::from(truncate(&task.notes, 40)),
        ])
        .style(style)
    }

    /// Render the add/edit form.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let title = if is_edit { "Edit Task" } else { "Add Task" };
        let outer = Block::default().borders(Borders::ALL).title(title);
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let form = &self.task_form;
        let text_fields = [
            (NAME_ORDER, "Name", &form.name),
            (NOTES_ORDER, "Notes", &form.notes),
            (DUE_ORDER, "Due (YYYY-MM-DD, today, in 3d, next fri)", &form.due),
        ];
        let mut cursor = None;
        for (order, label, field) in text_fields {
            let focused = form.current_field == order;
            let style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let widget = Paragraph::new(field.value.as_str())
                .block(Block::default().borders(Borders::ALL).title(label).border_style(style));
            f.render_widget(widget, chunks[order]);
            if focused {
                let x = chunks[order].x + 1 + field.cursor_column() as u16;
                cursor = Some((x.min(chunks[order].right().saturating_sub(2)), chunks[order].y + 1));
            }
        }

        let selected = form.selected_priority();
        let mut spans = Vec::new();
        for p in Priority::ALL {
            let style = if p == selected {
                Style::default().bg(INDIGO).fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!(" {} ", p.label()), style));
            spans.push(Span::raw(" "));
        }
        let focused = form.current_field == PRIORITY_ORDER;
        let priority = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Priority (←/→)")
                .border_style(if focused { Style::default().fg(Color::Yellow) } else { Style::default() }),
        );
        f.render_widget(priority, chunks[PRIORITY_ORDER]);

        let hints = Paragraph::new("Tab/Shift+Tab: next/prev field  Enter: save  Esc: cancel")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(hints, chunks[4]);

        if let Some(pos) = cursor {
            f.set_cursor_position(pos);
        }
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bindings = [
            ("j/k, ↑/↓", "Move selection"),
            ("a", "Add task"),
            ("e, Enter", "Edit selected task"),
            ("Space, c", "Toggle complete"),
            ("t", "Start/stop timer"),
            ("s / x", "Start / stop timer"),
            ("d, Del", "Delete (asks for confirmation)"),
            ("/", "Search by name"),
            ("f", "Cycle filter: all, completed, pending"),
            ("o", "Cycle sort: priority, due date"),
            ("Esc", "Clear search"),
            ("q, Ctrl+C", "Quit"),
        ];
        let mut text = vec![Line::from("")];
        for (keys, action) in bindings {
            text.push(Line::from(vec![
                Span::styled(format!("{keys:>12}  "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(action),
            ]));
        }
        text.push(Line::from(""));
        text.push(Line::from(format!("Data directory: {}", self.data_dir.display())));

        let help = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }

    /// Render the delete confirmation dialog.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let name = self
            .store
            .pending_delete()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Are you sure you want to delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(name),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.input_mode == InputMode::Search {
            format!("Search: {}_ (Enter to keep, Esc to clear)", self.filters.search)
        } else {
            let search = if self.filters.search.is_empty() {
                String::new()
            } else {
                format!(" | Search: '{}'", self.filters.search)
            };
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {}{} | Timers running: {} | Press 'h' for help",
                    self.filtered_tasks.len(),
                    search,
                    self.store.active_timers()
                ),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Delete".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(INDIGO).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the view for the current state.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask => self.render_task_form(f, chunks[0], false),
            AppState::EditTask => self.render_task_form(f, chunks[0], true),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop: draw, wait for input or the next tick, advance timers.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        info!(tasks = self.store.len(), "ui started");
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
            self.tick(Instant::now());
        }
        if self.store.confirm_visible() {
            self.store.cancel_delete();
        }
        debug!(running = self.store.active_timers(), "ui exiting, timers dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::TaskDraft;
    use ratatui::backend::TestBackend;

    fn app_with(names: &[(&str, Priority)]) -> App<MemoryStore> {
        let mut store = TaskStore::load(MemoryStore::new());
        for (name, priority) in names {
            store
                .add_task(TaskDraft::new(*name).priority(*priority))
                .unwrap();
        }
        App::new(store, Path::new("/tmp/study-test"))
    }

    fn press(app: &mut App<MemoryStore>, key: KeyCode, now: Instant) -> bool {
        app.handle_key(key, KeyModifiers::NONE, now)
    }

    fn type_str(app: &mut App<MemoryStore>, s: &str, now: Instant) {
        for c in s.chars() {
            press(app, KeyCode::Char(c), now);
        }
    }

    fn screen_text(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = app_with(&[]);
        let now = Instant::now();
        press(&mut app, KeyCode::Char('a'), now);
        assert_eq!(app.state(), AppState::AddTask);

        // Blank name keeps the form open and the store empty.
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.state(), AppState::AddTask);
        assert!(app.store().is_empty());

        type_str(&mut app, "Read Chapter 1", now);
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.store().tasks()[0].priority, Priority::Medium);
        assert_eq!(app.selected_id(), Some(app.store().tasks()[0].id));
    }

    #[test]
    fn test_actions_follow_the_highlighted_row_in_sorted_view() {
        let mut app = app_with(&[("Low one", Priority::Low), ("High one", Priority::High)]);
        let now = Instant::now();
        // Priority sort shows "High one" first even though it was added second.
        press(&mut app, KeyCode::Char(' '), now);
        let done: Vec<&str> = app
            .store()
            .tasks()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(done, vec!["High one"]);
    }

    #[test]
    fn test_timer_keys_and_ticks() {
        let mut app = app_with(&[("Study", Priority::Medium)]);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('s'), t0);
        press(&mut app, KeyCode::Char('s'), t0);
        assert_eq!(app.store().active_timers(), 1);

        for s in 1..=3 {
            app.tick(t0 + Duration::from_secs(s));
        }
        press(&mut app, KeyCode::Char('t'), t0 + Duration::from_secs(3));
        app.tick(t0 + Duration::from_secs(10));
        assert_eq!(app.store().tasks()[0].time_spent, 3);
        assert_eq!(app.store().active_timers(), 0);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_with(&[("A", Priority::Medium), ("B", Priority::Medium)]);
        let now = Instant::now();

        press(&mut app, KeyCode::Char('d'), now);
        assert_eq!(app.state(), AppState::Confirm);
        assert!(screen_text(&mut app).contains("Are you sure"));
        // Unrelated keys do nothing while the dialog is up.
        press(&mut app, KeyCode::Char('q'), now);
        assert_eq!(app.state(), AppState::Confirm);
        press(&mut app, KeyCode::Char('n'), now);
        assert_eq!(app.state(), AppState::TaskList);
        assert_eq!(app.store().len(), 2);
        assert!(!app.store().confirm_visible());

        press(&mut app, KeyCode::Char('d'), now);
        press(&mut app, KeyCode::Char('y'), now);
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.store().tasks()[0].name, "B");
    }

    #[test]
    fn test_search_filter_and_sort_keys() {
        let mut app = app_with(&[
            ("Read Chapter 1", Priority::Low),
            ("Lab report", Priority::High),
            ("read notes", Priority::Medium),
        ]);
        let now = Instant::now();

        press(&mut app, KeyCode::Char('/'), now);
        type_str(&mut app, "READ", now);
        assert_eq!(app.visible_tasks().len(), 2);
        press(&mut app, KeyCode::Enter, now);
        press(&mut app, KeyCode::Esc, now);
        assert_eq!(app.visible_tasks().len(), 3);

        press(&mut app, KeyCode::Char(' '), now);
        press(&mut app, KeyCode::Char('f'), now);
        assert_eq!(app.visible_tasks().len(), 1);
        press(&mut app, KeyCode::Char('f'), now);
        assert_eq!(app.visible_tasks().len(), 2);
        press(&mut app, KeyCode::Char('o'), now);
        assert_eq!(app.visible_tasks().len(), 2);
    }

    #[test]
    fn test_edit_keeps_elapsed_time() {
        let mut app = app_with(&[("Draft", Priority::Medium)]);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Char('s'), t0);
        app.tick(t0 + Duration::from_secs(2));

        press(&mut app, KeyCode::Char('e'), t0);
        assert_eq!(app.state(), AppState::EditTask);
        press(&mut app, KeyCode::Char('!'), t0);
        press(&mut app, KeyCode::Enter, t0);

        let task = &app.store().tasks()[0];
        assert_eq!(task.name, "Draft!");
        assert_eq!(task.time_spent, 2);
        assert!(app.store().is_timer_active(task.id));
    }

    #[test]
    fn test_render_list_shows_tasks() {
        let mut app = app_with(&[("Read Chapter 1", Priority::High)]);
        let text = screen_text(&mut app);
        assert!(text.contains("STUDY TRACKER"));
        assert!(text.contains("Read Chapter 1"));
        assert!(text.contains("0:00:00"));
    }

    #[test]
    fn test_quit_key() {
        let mut app = app_with(&[]);
        assert!(press(&mut app, KeyCode::Char('q'), Instant::now()));
    }
}
