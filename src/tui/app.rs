#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use time::Month;

use crate::board::color;
use crate::board::engine::TaskBoardEngine;
use crate::board::handoff;
use crate::board::model::{self, Project, Task, TaskDraft};
use crate::board::schedule::{self, MonthGrid};
use crate::config::Config;
use crate::tui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoardTab {
    Overview,
    Tasks,
    Notes,
    Schedule,
    Status,
}

impl BoardTab {
    const ALL: [BoardTab; 5] = [
        BoardTab::Overview,
        BoardTab::Tasks,
        BoardTab::Notes,
        BoardTab::Schedule,
        BoardTab::Status,
    ];

    fn title(self) -> &'static str {
        match self {
            BoardTab::Overview => "Overview",
            BoardTab::Tasks => "Tasks",
            BoardTab::Notes => "Notes",
            BoardTab::Schedule => "Schedule",
            BoardTab::Status => "Status",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone)]
struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    fn new(initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn insert_char(&mut self, c: char) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        chars.insert(cur, c);
        self.text = chars.into_iter().collect();
        self.cursor = cur + 1;
    }

    fn backspace(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur == 0 {
            return;
        }
        chars.remove(cur - 1);
        self.text = chars.into_iter().collect();
        self.cursor = cur - 1;
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        let len = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(len);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskField {
    Name,
    Progress,
    Departments,
    Deadline,
}

impl TaskField {
    const ALL: [TaskField; 4] = [
        TaskField::Name,
        TaskField::Progress,
        TaskField::Departments,
        TaskField::Deadline,
    ];

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone)]
struct TaskDialog {
    title: &'static str,
    name: TextInput,
    progress: TextInput,
    deadline: TextInput,
    departments: Vec<String>,
    dept_cursor: usize,
    field: TaskField,
    editing: bool,
    // The dialog has no done toggle; an edited task keeps its flag.
    done: bool,
}

impl TaskDialog {
    fn new_task() -> Self {
        Self {
            title: "New Task",
            name: TextInput::new(""),
            progress: TextInput::new("0"),
            deadline: TextInput::new(""),
            departments: Vec::new(),
            dept_cursor: 0,
            field: TaskField::Name,
            editing: false,
            done: false,
        }
    }

    fn edit_task(task: &Task) -> Self {
        Self {
            title: "Edit Task",
            name: TextInput::new(task.name.clone()),
            progress: TextInput::new(task.progress.to_string()),
            deadline: TextInput::new(model::format_date(task.deadline)),
            departments: task.departments.clone(),
            dept_cursor: 0,
            field: TaskField::Name,
            editing: true,
            done: task.done,
        }
    }

    /// Keeps the digits of whatever was typed, clamps to 0..=100, and
    /// treats anything else as 0.
    fn progress_value(&self) -> u8 {
        let digits: String = self
            .progress
            .as_str()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        model::clamp_progress(digits.parse::<i64>().unwrap_or(0))
    }
}

#[derive(Debug, Clone)]
enum NoteDialogKind {
    Add,
    Edit { note_id: String },
}

#[derive(Debug, Clone)]
struct NoteDialog {
    kind: NoteDialogKind,
    input: TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectField {
    Name,
    Description,
    Deadline,
}

impl ProjectField {
    fn next(self) -> Self {
        match self {
            ProjectField::Name => ProjectField::Description,
            ProjectField::Description => ProjectField::Deadline,
            ProjectField::Deadline => ProjectField::Name,
        }
    }
}

#[derive(Debug, Clone)]
struct ProjectDialog {
    name: TextInput,
    description: TextInput,
    deadline: TextInput,
    field: ProjectField,
}

impl ProjectDialog {
    fn for_project(project: &Project) -> Self {
        Self {
            name: TextInput::new(project.name.clone()),
            description: TextInput::new(project.description.clone()),
            deadline: TextInput::new(
                project.deadline.map(model::format_date).unwrap_or_default(),
            ),
            field: ProjectField::Name,
        }
    }
}

/// Home list contents when the session starts.
fn sample_projects() -> Vec<Project> {
    vec![
        Project {
            id: "1".to_owned(),
            name: "Bridge Structural Analysis".to_owned(),
            description: "Finite element modeling of a suspension bridge.".to_owned(),
            deadline: model::parse_date("2025-12-01").ok(),
            budget: None,
            progress: Some(46),
            departments: vec!["Design Mecanic".to_owned()],
        },
        Project {
            id: "2".to_owned(),
            name: "Robotics Automation System".to_owned(),
            description: "Real-time robotic motion planning and AI vision.".to_owned(),
            deadline: model::parse_date("2025-11-15").ok(),
            budget: None,
            progress: Some(72),
            departments: vec!["Software Debug".to_owned()],
        },
        Project {
            id: "3".to_owned(),
            name: "Renewable Energy Grid".to_owned(),
            description: "AI-driven optimization for wind-solar balance.".to_owned(),
            deadline: None,
            budget: None,
            progress: Some(0),
            departments: vec!["Design Electric".to_owned()],
        },
    ]
}

#[derive(Debug)]
struct AppState {
    cfg: Config,

    screen: Screen,
    projects: Vec<Project>,
    home_state: TableState,

    // Board state exists only while a project is open; going home drops it.
    engine: Option<TaskBoardEngine>,
    tab: BoardTab,
    task_state: TableState,
    note_state: TableState,
    month: (i32, Month),

    task_dialog: Option<TaskDialog>,
    note_dialog: Option<NoteDialog>,
    project_dialog: Option<ProjectDialog>,

    should_quit: bool,
}

impl AppState {
    fn new(cfg: Config) -> Self {
        let mut home_state = TableState::default();
        home_state.select(Some(0));
        let mut task_state = TableState::default();
        task_state.select(Some(0));
        let mut note_state = TableState::default();
        note_state.select(Some(0));

        let today = model::today();
        Self {
            cfg,
            screen: Screen::Home,
            projects: sample_projects(),
            home_state,
            engine: None,
            tab: BoardTab::Overview,
            task_state,
            note_state,
            month: (today.year(), today.month()),
            task_dialog: None,
            note_dialog: None,
            project_dialog: None,
            should_quit: false,
        }
    }

    fn open_selected_project(&mut self) {
        let idx = self.home_state.selected().unwrap_or(0);
        let Some(project) = self.projects.get(idx) else {
            return;
        };
        let palette = self.cfg.departments.palette();
        self.engine = Some(TaskBoardEngine::with_warning_ttl(
            project.clone(),
            palette,
            self.cfg.ui.warning_ttl(),
        ));
        self.screen = Screen::Board;
        self.tab = BoardTab::Overview;
        self.task_state.select(Some(0));
        self.note_state.select(Some(0));
    }

    /// Back to the home list. Board state is per-screen and not persisted,
    /// so the engine (tasks, notes) is discarded here.
    fn go_home(&mut self) {
        self.engine = None;
        self.screen = Screen::Home;
        self.task_dialog = None;
        self.note_dialog = None;
        self.project_dialog = None;
    }

    fn move_selection(state: &mut TableState, len: usize, delta: i64) {
        if len == 0 {
            return;
        }
        let cur = i64::try_from(state.selected().unwrap_or(0)).unwrap_or(0);
        let max = i64::try_from(len.saturating_sub(1)).unwrap_or(0);
        let next = (cur + delta).clamp(0, max);
        state.select(Some(usize::try_from(next).unwrap_or(0)));
    }

    fn selected_task_id(&self) -> Option<String> {
        let engine = self.engine.as_ref()?;
        let idx = self.task_state.selected().unwrap_or(0);
        engine.tasks().get(idx).map(|t| t.id.clone())
    }

    fn selected_note_id(&self) -> Option<String> {
        let engine = self.engine.as_ref()?;
        let idx = self.note_state.selected().unwrap_or(0);
        engine.notes().get(idx).map(|n| n.id.clone())
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let mut app = AppState::new(cfg);

    loop {
        if let Some(engine) = app.engine.as_mut() {
            engine.expire_warning(Instant::now());
        }

        {
            let Some(terminal) = guard.terminal.as_mut() else {
                anyhow::bail!("terminal unavailable");
            };
            terminal.draw(|f| draw(f, &mut app))?;
        }

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
        {
            handle_key(key, &mut app);
        }
    }

    Ok(())
}

struct TerminalGuard {
    terminal: Option<ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>>,
}

impl TerminalGuard {
    fn new(
        terminal: ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}

fn handle_key(key: KeyEvent, app: &mut AppState) {
    if app.task_dialog.is_some() {
        handle_task_dialog_key(key, app);
        return;
    }
    if app.note_dialog.is_some() {
        handle_note_dialog_key(key, app);
        return;
    }
    if app.project_dialog.is_some() {
        handle_project_dialog_key(key, app);
        return;
    }

    match app.screen {
        Screen::Home => handle_home_key(key, app),
        Screen::Board => handle_board_key(key, app),
    }
}

fn handle_home_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => {
            AppState::move_selection(&mut app.home_state, app.projects.len(), 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            AppState::move_selection(&mut app.home_state, app.projects.len(), -1);
        }
        KeyCode::Enter => app.open_selected_project(),
        _ => {}
    }
}

fn handle_board_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.go_home();
            return;
        }
        KeyCode::Tab => {
            app.tab = app.tab.next();
            return;
        }
        KeyCode::BackTab => {
            app.tab = app.tab.prev();
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = (c as usize) - ('1' as usize);
            app.tab = BoardTab::ALL[idx];
            return;
        }
        _ => {}
    }

    match app.tab {
        BoardTab::Overview => handle_overview_key(key, app),
        BoardTab::Tasks => handle_tasks_key(key, app),
        BoardTab::Notes => handle_notes_key(key, app),
        BoardTab::Schedule => handle_schedule_key(key, app),
        BoardTab::Status => {}
    }
}

fn handle_overview_key(key: KeyEvent, app: &mut AppState) {
    if key.code == KeyCode::Char('e')
        && let Some(engine) = app.engine.as_ref()
    {
        app.project_dialog = Some(ProjectDialog::for_project(engine.project()));
    }
}

fn handle_tasks_key(key: KeyEvent, app: &mut AppState) {
    let task_len = app.engine.as_ref().map_or(0, |e| e.tasks().len());
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            AppState::move_selection(&mut app.task_state, task_len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            AppState::move_selection(&mut app.task_state, task_len, -1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = app.selected_task_id()
                && let Some(engine) = app.engine.as_mut()
            {
                engine.toggle_task_done(&id);
            }
        }
        KeyCode::Char('a') => app.task_dialog = Some(TaskDialog::new_task()),
        KeyCode::Char('e') => {
            let Some(id) = app.selected_task_id() else {
                return;
            };
            let selected = app
                .engine
                .as_mut()
                .and_then(|engine| engine.select_task_for_edit(&id).ok().cloned());
            if let Some(task) = selected {
                app.task_dialog = Some(TaskDialog::edit_task(&task));
            }
        }
        _ => {}
    }
}

fn handle_notes_key(key: KeyEvent, app: &mut AppState) {
    let note_len = app.engine.as_ref().map_or(0, |e| e.notes().len());
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            AppState::move_selection(&mut app.note_state, note_len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            AppState::move_selection(&mut app.note_state, note_len, -1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = app.selected_note_id()
                && let Some(engine) = app.engine.as_mut()
            {
                engine.toggle_note_checked(&id);
            }
        }
        KeyCode::Char('a') => {
            app.note_dialog = Some(NoteDialog {
                kind: NoteDialogKind::Add,
                input: TextInput::new(""),
            });
        }
        KeyCode::Char('e') => {
            if let Some(id) = app.selected_note_id()
                && let Some(engine) = app.engine.as_ref()
                && let Some(note) = engine.notes().iter().find(|n| n.id == id)
            {
                app.note_dialog = Some(NoteDialog {
                    kind: NoteDialogKind::Edit {
                        note_id: id.clone(),
                    },
                    input: TextInput::new(note.text.clone()),
                });
            }
        }
        _ => {}
    }
}

fn handle_schedule_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('n') | KeyCode::Right => {
            let (year, month) = app.month;
            app.month = match month.next() {
                Month::January => (year + 1, Month::January),
                next => (year, next),
            };
        }
        KeyCode::Char('p') | KeyCode::Left => {
            let (year, month) = app.month;
            app.month = match month.previous() {
                Month::December => (year - 1, Month::December),
                prev => (year, prev),
            };
        }
        KeyCode::Char('a') => app.task_dialog = Some(TaskDialog::new_task()),
        _ => {}
    }
}

fn handle_task_dialog_key(key: KeyEvent, app: &mut AppState) {
    let Some(dialog) = app.task_dialog.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.task_dialog = None;
            if let Some(engine) = app.engine.as_mut() {
                engine.clear_selection();
            }
            return;
        }
        KeyCode::Tab => {
            dialog.field = dialog.field.next();
            return;
        }
        KeyCode::Enter => {
            submit_task_dialog(app);
            return;
        }
        _ => {}
    }

    let dept_names: Vec<String> = app.cfg.departments.order.clone();

    match dialog.field {
        TaskField::Departments => match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !dept_names.is_empty() {
                    dialog.dept_cursor = (dialog.dept_cursor + 1).min(dept_names.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                dialog.dept_cursor = dialog.dept_cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') => {
                if let Some(name) = dept_names.get(dialog.dept_cursor) {
                    if let Some(pos) = dialog.departments.iter().position(|d| d == name) {
                        dialog.departments.remove(pos);
                    } else {
                        dialog.departments.push(name.clone());
                    }
                }
            }
            _ => {}
        },
        TaskField::Name | TaskField::Progress | TaskField::Deadline => {
            let input = match dialog.field {
                TaskField::Name => &mut dialog.name,
                TaskField::Progress => &mut dialog.progress,
                _ => &mut dialog.deadline,
            };
            match key.code {
                KeyCode::Char(c) => input.insert_char(c),
                KeyCode::Backspace => input.backspace(),
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                _ => {}
            }
        }
    }
}

fn submit_task_dialog(app: &mut AppState) {
    let Some(dialog) = app.task_dialog.as_ref() else {
        return;
    };
    let Some(engine) = app.engine.as_mut() else {
        return;
    };

    let deadline = match dialog.deadline.as_str().trim() {
        "" => None,
        raw => match model::parse_date(raw) {
            Ok(date) => Some(date),
            Err(e) => {
                engine.warn(e.to_string());
                return;
            }
        },
    };

    let draft = TaskDraft {
        name: dialog.name.as_str().to_owned(),
        departments: dialog.departments.clone(),
        deadline,
        progress: dialog.progress_value(),
        done: dialog.done,
    };

    let result = if dialog.editing {
        engine.save_edited_task(&draft).map(|_| ())
    } else {
        engine.add_task(&draft).map(|_| ())
    };
    if result.is_ok() {
        app.task_dialog = None;
    }
}

fn handle_note_dialog_key(key: KeyEvent, app: &mut AppState) {
    let Some(dialog) = app.note_dialog.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.note_dialog = None,
        KeyCode::Enter => {
            let Some(engine) = app.engine.as_mut() else {
                return;
            };
            match &dialog.kind {
                NoteDialogKind::Add => {
                    // Empty input just closes the dialog, nothing is stored.
                    engine.add_note(dialog.input.as_str());
                }
                NoteDialogKind::Edit { note_id } => {
                    if let Err(e) = engine.edit_note(note_id, dialog.input.as_str()) {
                        engine.warn(e.to_string());
                    }
                }
            }
            app.note_dialog = None;
        }
        KeyCode::Char(c) => dialog.input.insert_char(c),
        KeyCode::Backspace => dialog.input.backspace(),
        KeyCode::Left => dialog.input.move_left(),
        KeyCode::Right => dialog.input.move_right(),
        _ => {}
    }
}

fn handle_project_dialog_key(key: KeyEvent, app: &mut AppState) {
    let Some(dialog) = app.project_dialog.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.project_dialog = None,
        KeyCode::Tab => dialog.field = dialog.field.next(),
        KeyCode::Enter => submit_project_dialog(app),
        KeyCode::Char(c) => {
            let input = match dialog.field {
                ProjectField::Name => &mut dialog.name,
                ProjectField::Description => &mut dialog.description,
                ProjectField::Deadline => &mut dialog.deadline,
            };
            input.insert_char(c);
        }
        KeyCode::Backspace => {
            let input = match dialog.field {
                ProjectField::Name => &mut dialog.name,
                ProjectField::Description => &mut dialog.description,
                ProjectField::Deadline => &mut dialog.deadline,
            };
            input.backspace();
        }
        _ => {}
    }
}

/// Validates the name, merges the edits into the open project, then
/// navigates home passing the updated record as a percent-encoded payload
/// that the home list merges by id.
fn submit_project_dialog(app: &mut AppState) {
    let Some(dialog) = app.project_dialog.as_ref() else {
        return;
    };
    let Some(engine) = app.engine.as_mut() else {
        return;
    };

    if dialog.name.as_str().trim().is_empty() {
        engine.warn("Project name cannot be empty.");
        return;
    }
    let deadline = match dialog.deadline.as_str().trim() {
        "" => None,
        raw => match model::parse_date(raw) {
            Ok(date) => Some(date),
            Err(e) => {
                engine.warn(e.to_string());
                return;
            }
        },
    };

    {
        let project = engine.project_mut();
        project.name = dialog.name.as_str().trim().to_owned();
        project.description = dialog.description.as_str().to_owned();
        project.deadline = deadline;
    }

    if let Ok(payload) = handoff::encode_project(engine.project()) {
        handoff::apply_update(&mut app.projects, &payload);
    }
    app.project_dialog = None;
    app.go_home();
}

fn draw(f: &mut Frame<'_>, app: &mut AppState) {
    match app.screen {
        Screen::Home => draw_home(f, app),
        Screen::Board => draw_board(f, app),
    }

    if app.task_dialog.is_some() {
        draw_task_dialog(f, app);
    }
    if let Some(dialog) = &app.note_dialog {
        draw_note_dialog(f, dialog);
    }
    if let Some(dialog) = &app.project_dialog {
        draw_project_dialog(f, dialog);
    }
}

fn draw_home(f: &mut Frame<'_>, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new("Projects").style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(title, root[0]);

    let palette = app.cfg.departments.palette();
    let rows: Vec<Row> = app
        .projects
        .iter()
        .map(|p| {
            let dept = p.departments.first().cloned().unwrap_or_default();
            let accent = rgb_color(palette.background_for(&p.departments));
            Row::new(vec![
                Cell::from(p.name.clone()),
                Cell::from(format!("{}%", p.progress.unwrap_or(0))),
                Cell::from(p.deadline.map(model::format_date).unwrap_or_else(|| "-".to_owned())),
                Cell::from(dept).style(Style::default().fg(accent)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Percentage(30),
        ],
    )
    .header(
        Row::new(vec!["NAME", "PROGRESS", "DEADLINE", "DEPARTMENT"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, root[1], &mut app.home_state);

    let footer = Paragraph::new("q quit \u{2022} j/k move \u{2022} Enter open")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, root[2]);
}

fn draw_board(f: &mut Frame<'_>, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_board_tabs(f, root[0], app);

    match app.tab {
        BoardTab::Overview => draw_overview(f, root[1], app),
        BoardTab::Tasks => draw_tasks(f, root[1], app),
        BoardTab::Notes => draw_notes(f, root[1], app),
        BoardTab::Schedule => draw_schedule(f, root[1], app),
        BoardTab::Status => draw_status(f, root[1], app),
    }

    draw_board_footer(f, root[2], app);
}

fn draw_board_tabs(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let titles: Vec<Line> = BoardTab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} [{}]", t.title(), i + 1)))
        .collect();
    let selected = BoardTab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    f.render_widget(tabs, chunks[0]);

    if let Some(engine) = app.engine.as_ref() {
        let name = Paragraph::new(engine.project().name.clone())
            .alignment(Alignment::Right)
            .style(Style::default().add_modifier(Modifier::BOLD));
        f.render_widget(name, chunks[1]);
    }
}

fn draw_board_footer(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Percentage(40)])
        .split(area);

    let hints = match app.tab {
        BoardTab::Overview => "q quit \u{2022} Esc home \u{2022} 1-5 tabs \u{2022} e edit project",
        BoardTab::Tasks => {
            "q quit \u{2022} Esc home \u{2022} j/k move \u{2022} Space toggle done \u{2022} a add \u{2022} e edit"
        }
        BoardTab::Notes => {
            "q quit \u{2022} Esc home \u{2022} j/k move \u{2022} Space check \u{2022} a add \u{2022} e edit"
        }
        BoardTab::Schedule => "q quit \u{2022} Esc home \u{2022} n/p month \u{2022} a add task",
        BoardTab::Status => "q quit \u{2022} Esc home \u{2022} 1-5 tabs",
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[0],
    );

    if let Some(warning) = app.engine.as_ref().and_then(TaskBoardEngine::warning) {
        let warn = Paragraph::new(warning.to_owned())
            .alignment(Alignment::Right)
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
        f.render_widget(warn, chunks[1]);
    }
}

fn draw_overview(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let Some(engine) = app.engine.as_ref() else {
        return;
    };
    let project = engine.project();

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Deadline: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(
                project
                    .deadline
                    .map(model::format_date)
                    .unwrap_or_else(|| "-".to_owned()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Progress: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{}%", engine.progress())),
        ]),
    ];
    if let Some(budget) = project.budget {
        lines.push(Line::from(vec![
            Span::styled("Budget: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{budget:.2}")),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(project.description.clone()));
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "{} tasks, {} notes",
        engine.tasks().len(),
        engine.notes().len()
    )));

    // Recent-notes preview card.
    let preview = app.cfg.ui.notes_preview;
    if !engine.notes().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for note in engine.notes().iter().take(preview) {
            let marker = if note.checked { "[x]" } else { "[ ]" };
            lines.push(Line::from(format!(
                "  {marker} {} ({})",
                note.text,
                model::format_date(note.date)
            )));
        }
        if engine.notes().len() > preview {
            lines.push(Line::from(format!(
                "  +{} more",
                engine.notes().len() - preview
            )));
        }
    }

    let block = Block::default().borders(Borders::ALL).title("Overview");
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn draw_tasks(f: &mut Frame<'_>, area: Rect, app: &mut AppState) {
    let Some(engine) = app.engine.as_ref() else {
        return;
    };

    let rows: Vec<Row> = engine
        .tasks()
        .iter()
        .map(|task| {
            let marker = if task.done { "\u{2713}" } else { " " };
            let dept = task.departments.first().cloned().unwrap_or_default();
            let mut style = Style::default().fg(rgb_color(&task.color));
            if task.done {
                style = style.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
            }
            Row::new(vec![
                Cell::from(marker),
                Cell::from(task.name.clone()),
                Cell::from(dept),
                Cell::from(model::format_date(task.deadline)),
                Cell::from(format!("{}%", task.progress)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Length(5),
        ],
    )
    .header(
        Row::new(vec!["", "TASK", "DEPARTMENT", "DEADLINE", "PROG"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(Block::default().borders(Borders::ALL).title("Tasks"));
    f.render_stateful_widget(table, area, &mut app.task_state);
}

fn draw_notes(f: &mut Frame<'_>, area: Rect, app: &mut AppState) {
    let Some(engine) = app.engine.as_ref() else {
        return;
    };

    let items: Vec<ListItem> = engine
        .notes()
        .iter()
        .map(|note| {
            let marker = if note.checked { "[x]" } else { "[ ]" };
            let line = format!("{marker} {}  {}", note.text, model::format_date(note.date));
            let mut style = Style::default();
            if note.checked {
                style = style
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT);
            }
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default().borders(Borders::ALL).title("Notes"));
    let mut state = ratatui::widgets::ListState::default();
    state.select(app.note_state.selected());
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_schedule(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let Some(engine) = app.engine.as_ref() else {
        return;
    };
    let (year, month) = app.month;
    let Ok(grid) = MonthGrid::new(year, month) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(1)])
        .split(area);

    let marks = schedule::marked_dates(engine.tasks());
    let today = model::today();

    let header = Row::new(vec!["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = grid
        .weeks
        .iter()
        .map(|week| {
            let cells: Vec<Cell> = week
                .iter()
                .map(|slot| match slot {
                    Some(date) => {
                        let count = marks.get(date).copied().unwrap_or(0);
                        let text = if count > 0 {
                            format!("{:>2}\u{2022}", date.day())
                        } else {
                            format!("{:>2}", date.day())
                        };
                        let mut style = Style::default();
                        if *date == today {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        if count > 0 {
                            style = style.add_modifier(Modifier::BOLD);
                        }
                        Cell::from(text).style(style)
                    }
                    None => Cell::from(""),
                })
                .collect();
            Row::new(cells)
        })
        .collect();

    let grid_table = Table::new(rows, [Constraint::Length(4); 7]).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{month} {year}")),
    );
    f.render_widget(grid_table, chunks[0]);

    // Deadline overlay for the visible month, capped per day with "+N".
    let cap = app.cfg.ui.day_task_cap;
    let mut lines: Vec<Line> = Vec::new();
    for (date, _) in marks
        .iter()
        .filter(|(d, _)| d.year() == year && d.month() == month)
    {
        let overlay = schedule::day_overlay(engine.tasks(), *date, cap);
        lines.push(Line::from(Span::styled(
            model::format_date(*date),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for task in &overlay.visible {
            let dept = task.departments.first().map_or("General", String::as_str);
            lines.push(Line::from(Span::styled(
                format!("  {} - {dept}", task.name),
                Style::default().fg(rgb_color(&task.color)),
            )));
        }
        if overlay.hidden > 0 {
            lines.push(Line::from(format!("  +{}", overlay.hidden)));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from("No deadlines this month."));
    }
    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Deadlines"));
    f.render_widget(details, chunks[1]);
}

fn draw_status(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let Some(engine) = app.engine.as_ref() else {
        return;
    };
    let buckets = engine.classified(model::today());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);

    let render = |f: &mut Frame<'_>, area: Rect, title: String, tasks: &[&Task], accent: Color| {
        let items: Vec<ListItem> = if tasks.is_empty() {
            vec![ListItem::new("Nothing here.").style(Style::default().fg(Color::DarkGray))]
        } else {
            tasks
                .iter()
                .map(|task| {
                    let dept = task.departments.first().cloned().unwrap_or_default();
                    ListItem::new(format!("{}\n  {dept}", task.name))
                        .style(Style::default().fg(rgb_color(&task.color)))
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(accent)),
        );
        f.render_widget(list, area);
    };

    render(
        f,
        chunks[0],
        format!("Past Due ({})", buckets.past_due.len()),
        &buckets.past_due,
        Color::Red,
    );
    render(
        f,
        chunks[1],
        format!("In Progress ({})", buckets.in_progress.len()),
        &buckets.in_progress,
        Color::Blue,
    );
    render(
        f,
        chunks[2],
        format!("Done ({})", buckets.done.len()),
        &buckets.done,
        Color::Green,
    );
}

fn draw_task_dialog(f: &mut Frame<'_>, app: &AppState) {
    let Some(dialog) = app.task_dialog.as_ref() else {
        return;
    };
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title(dialog.title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let focus = |field: TaskField| {
        if dialog.field == field {
            "> "
        } else {
            "  "
        }
    };

    let mut lines = vec![
        Line::from(format!("{}Name: {}", focus(TaskField::Name), dialog.name.as_str())),
        Line::from(format!(
            "{}Progress (%): {}",
            focus(TaskField::Progress),
            dialog.progress.as_str()
        )),
        Line::from(format!(
            "{}Deadline (YYYY-MM-DD): {}",
            focus(TaskField::Deadline),
            dialog.deadline.as_str()
        )),
        Line::from(format!("{}Departments:", focus(TaskField::Departments))),
    ];

    let palette = app.cfg.departments.palette();
    for (i, name) in app.cfg.departments.order.iter().enumerate() {
        let checked = if dialog.departments.contains(name) {
            "[x]"
        } else {
            "[ ]"
        };
        let cursor = if dialog.field == TaskField::Departments && dialog.dept_cursor == i {
            ">"
        } else {
            " "
        };
        let color = rgb_color(palette.color_of(name).unwrap_or(palette.fallback()));
        lines.push(Line::from(Span::styled(
            format!("   {cursor} {checked} {name}"),
            Style::default().fg(color),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab field \u{2022} Space toggle department \u{2022} Enter save \u{2022} Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_note_dialog(f: &mut Frame<'_>, dialog: &NoteDialog) {
    let area = centered_rect(70, 25, f.area());
    f.render_widget(Clear, area);
    let title = match dialog.kind {
        NoteDialogKind::Add => "Add Note",
        NoteDialogKind::Edit { .. } => "Edit Note",
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(dialog.input.as_str().to_owned()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter save \u{2022} Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_project_dialog(f: &mut Frame<'_>, dialog: &ProjectDialog) {
    let area = centered_rect(70, 40, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Edit Project");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let focus = |field: ProjectField| {
        if dialog.field == field {
            "> "
        } else {
            "  "
        }
    };
    let lines = vec![
        Line::from(format!(
            "{}Name: {}",
            focus(ProjectField::Name),
            dialog.name.as_str()
        )),
        Line::from(format!(
            "{}Description: {}",
            focus(ProjectField::Description),
            dialog.description.as_str()
        )),
        Line::from(format!(
            "{}Deadline (YYYY-MM-DD): {}",
            focus(ProjectField::Deadline),
            dialog.deadline.as_str()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Tab field \u{2022} Enter save \u{2022} Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn rgb_color(hex: &str) -> Color {
    match color::rgb(hex) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::White,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
