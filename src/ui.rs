use crate::config::Config;
use crate::drag::{DragCoordinator, DropTarget, MoveOutcome};
use crate::model::{Status, Todo};
use crate::period::{Period, PeriodMode};
use crate::storage::{KeyValueStore, StoreLocation};
use crate::todo_list::{Edit, TodoList};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::warn;

pub fn run<S: KeyValueStore>(
    list: TodoList<S>,
    location: StoreLocation,
    config: &Config,
    offset: i64,
) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let today = Local::now().date_naive();
    let mut app = App::new(list, location, config, offset, today);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S> {
    list: TodoList<S>,
    location: StoreLocation,
    drag: DragCoordinator,
    today: NaiveDate,
    offset: i64,
    selected_day: usize,
    /// Equal to the day's length while dragging means "end of the day".
    selected_todo: usize,
    last_save: Instant,
    status: String,
    mode: Mode,
    default_status: Status,
    hits: Vec<(Rect, DropTarget)>,
    mouse_drag: bool,
}

enum Mode {
    Normal,
    Adding { field: FieldValue, status: Status },
    Editing { day: usize, index: usize, field: FieldValue },
    PickingStatus { day: usize, index: usize, choice: Status },
    ConfirmDelete { day: usize, index: usize },
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl<S: KeyValueStore> App<S> {
    fn new(
        list: TodoList<S>,
        location: StoreLocation,
        config: &Config,
        offset: i64,
        today: NaiveDate,
    ) -> Self {
        let status = format!("Loaded {} from {}", list.period().key(), location.dir.display());
        let selected_day = list.period().index_of(today).unwrap_or(0);
        App {
            list,
            location,
            drag: DragCoordinator::new(),
            today,
            offset,
            selected_day,
            selected_todo: 0,
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
            default_status: config.default_status,
            hits: Vec::new(),
            mouse_drag: false,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal if self.drag.is_dragging() => self.handle_drag_key(key),
            Mode::Normal => self.handle_normal_key(key),
            Mode::Adding { .. } | Mode::Editing { .. } => self.handle_input_key(key),
            Mode::PickingStatus { .. } => self.handle_picker_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Left | KeyCode::Char('h') => self.shift_day(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_day(1),
            KeyCode::Char('K') => self.shift_day(-7),
            KeyCode::Char('J') => self.shift_day(7),
            KeyCode::Up | KeyCode::Char('k') => self.prev_todo(),
            KeyCode::Down | KeyCode::Char('j') => self.next_todo(),
            KeyCode::Char('[') => self.shift_period(-1),
            KeyCode::Char(']') => self.shift_period(1),
            KeyCode::Char('t') => self.jump_to_today(),
            KeyCode::Char('m') => self.toggle_mode(),
            KeyCode::Char('n') => {
                self.mode = Mode::Adding {
                    field: FieldValue::new(""),
                    status: self.default_status,
                };
                self.status = format!(
                    "New todo for {} (Tab status, Enter save, Esc cancel)",
                    self.list.period().day_label(self.selected_day)
                );
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.start_editing(self.selected_day, self.selected_todo)
            }
            KeyCode::Char('s') => match self.current_todo().map(Todo::status) {
                Some(status) => {
                    let choice = status.unwrap_or(Status::Procrastinating);
                    self.mode = Mode::PickingStatus {
                        day: self.selected_day,
                        index: self.selected_todo,
                        choice,
                    };
                }
                None => self.status = "No todo selected".into(),
            },
            KeyCode::Char('d') => {
                if self.current_todo().is_some() {
                    self.mode = Mode::ConfirmDelete {
                        day: self.selected_day,
                        index: self.selected_todo,
                    };
                    self.status = "Delete? (y to confirm, n/Esc to cancel)".into();
                } else {
                    self.status = "No todo selected to delete".into();
                }
            }
            KeyCode::Char(' ') => self.grab_selected(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_drag_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.drag.drag_end();
                self.clamp_selection();
                self.status = "Move cancelled".into();
            }
            KeyCode::Left | KeyCode::Char('h') => self.shift_day(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_day(1),
            KeyCode::Char('K') => self.shift_day(-7),
            KeyCode::Char('J') => self.shift_day(7),
            KeyCode::Up | KeyCode::Char('k') => self.prev_todo(),
            KeyCode::Down | KeyCode::Char('j') => self.next_todo(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let target = self.cursor_target();
                self.commit_drop(target)?;
            }
            _ => {}
        }
        if self.drag.is_dragging() {
            self.drag.drag_over(self.cursor_target());
        }
        Ok(false)
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::Adding { field, .. } | Mode::Editing { field, .. } = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Left => field.move_left(),
                KeyCode::Right => field.move_right(),
                KeyCode::Backspace => field.backspace(),
                KeyCode::Enter => close = true,
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    field.insert_char(c)
                }
                _ => {}
            }
        }
        if let (KeyCode::Tab, Mode::Adding { status, .. }) = (key.code, &mut mode) {
            *status = status.next();
        }
        if !close {
            self.mode = mode;
            return Ok(false);
        }
        if key.code == KeyCode::Enter {
            self.submit(mode)?;
        }
        Ok(false)
    }

    fn submit(&mut self, mode: Mode) -> Result<()> {
        match mode {
            Mode::Adding { field, status } => {
                let day = self.selected_day;
                match self.list.add(day, &field.value, status)? {
                    Some(_) => {
                        self.selected_todo = self.list.planner().day_len(day).saturating_sub(1);
                        self.saved(format!("Added to {}", self.list.period().day_label(day)));
                    }
                    None => self.status = "Empty todo not added".into(),
                }
            }
            Mode::Editing { day, index, field } => {
                match self.list.update_text(day, index, &field.value)? {
                    Edit::Updated => self.saved("Updated"),
                    Edit::Deleted => self.saved("Deleted (empty text)"),
                    Edit::Unchanged => self.status = "Todo no longer exists".into(),
                }
                self.clamp_selection();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_picker_key(&mut self, key: KeyEvent) -> Result<bool> {
        let Mode::PickingStatus { day, index, choice } = self.mode else {
            return Ok(false);
        };
        let apply = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.mode = Mode::PickingStatus {
                    day,
                    index,
                    choice: choice.next().next(),
                };
                None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.mode = Mode::PickingStatus {
                    day,
                    index,
                    choice: choice.next(),
                };
                None
            }
            KeyCode::Char('1') => Some(Status::ALL[0]),
            KeyCode::Char('2') => Some(Status::ALL[1]),
            KeyCode::Char('3') => Some(Status::ALL[2]),
            KeyCode::Enter | KeyCode::Char(' ') => Some(choice),
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Canceled".into();
                None
            }
            _ => None,
        };
        if let Some(status) = apply {
            self.mode = Mode::Normal;
            if self.list.update_emoji(day, index, status)? {
                self.saved(format!("Marked {}", status.label()));
            } else {
                self.status = "Todo no longer exists".into();
            }
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let Mode::ConfirmDelete { day, index } = self.mode else {
            return Ok(false);
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = Mode::Normal;
                match self.list.delete(day, index)? {
                    Some(todo) => self.saved(format!("Deleted \"{}\"", todo.text)),
                    None => self.status = "Todo no longer exists".into(),
                }
                self.clamp_selection();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Delete canceled".into();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        let target = self.hit_test(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => match target {
                Some(DropTarget::Todo(id)) => {
                    if let Some((day, index)) = self.list.planner().locate(&id) {
                        self.selected_day = day;
                        self.selected_todo = index;
                        if self.drag.drag_start(&self.list, day, index) {
                            self.mouse_drag = true;
                            self.drag.drag_over(DropTarget::Todo(id));
                        }
                    }
                }
                Some(DropTarget::Day(day)) => {
                    self.selected_day = day;
                    self.selected_todo = 0;
                }
                None => {}
            },
            MouseEventKind::Drag(MouseButton::Left) if self.mouse_drag => match target {
                Some(target) => self.drag.drag_over(target),
                None => {
                    if let Some(hover) = self.drag.hover().cloned() {
                        self.drag.drag_leave(&hover);
                    }
                }
            },
            MouseEventKind::Up(MouseButton::Left) if self.mouse_drag => {
                self.mouse_drag = false;
                match target {
                    // Released on the todo it was pressed on: a click, not a move.
                    Some(DropTarget::Todo(id)) if self.drag.dragged() == Some(&id) => {
                        self.drag.drag_end();
                        if let Some((day, index)) = self.list.planner().locate(&id) {
                            self.start_editing(day, index);
                        }
                    }
                    Some(target) => self.commit_drop(target)?,
                    None => {
                        self.drag.drag_end();
                        self.status = "Move cancelled".into();
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start_editing(&mut self, day: usize, index: usize) {
        let planner = self.list.planner();
        let text = planner
            .id_at(day, index)
            .and_then(|id| planner.todo(id))
            .map(|t| t.text.clone());
        match text {
            Some(text) => {
                self.selected_day = day;
                self.selected_todo = index;
                self.mode = Mode::Editing {
                    day,
                    index,
                    field: FieldValue::new(&text),
                };
                self.status = "Editing (empty text deletes)".into();
            }
            None => self.status = "No todo selected to edit".into(),
        }
    }

    fn grab_selected(&mut self) {
        if self.drag.drag_start(&self.list, self.selected_day, self.selected_todo) {
            self.drag.drag_over(self.cursor_target());
            self.status = "Moving: choose a spot, Space to drop, Esc to cancel".into();
        } else {
            self.status = "No todo selected to move".into();
        }
    }

    fn commit_drop(&mut self, target: DropTarget) -> Result<()> {
        match self.drag.drop(&mut self.list, target)? {
            Some(MoveOutcome { to_day, position, .. }) => {
                self.selected_day = to_day;
                self.selected_todo = position;
                self.saved(format!("Moved to {}", self.list.period().day_label(to_day)));
            }
            None => {
                self.status = "Nothing moved".into();
                self.clamp_selection();
            }
        }
        Ok(())
    }

    fn cursor_target(&self) -> DropTarget {
        match self
            .list
            .planner()
            .id_at(self.selected_day, self.selected_todo)
        {
            Some(id) => DropTarget::Todo(id.clone()),
            None => DropTarget::Day(self.selected_day),
        }
    }

    fn current_todo(&self) -> Option<&Todo> {
        let planner = self.list.planner();
        planner
            .id_at(self.selected_day, self.selected_todo)
            .and_then(|id| planner.todo(id))
    }

    fn shift_day(&mut self, delta: isize) {
        let last = self.list.planner().day_count().saturating_sub(1) as isize;
        let target = (self.selected_day as isize + delta).clamp(0, last) as usize;
        if target == self.selected_day {
            return;
        }
        self.selected_day = target;
        self.selected_todo = if self.drag.is_dragging() {
            self.list.planner().day_len(target)
        } else {
            0
        };
    }

    fn prev_todo(&mut self) {
        if self.selected_todo > 0 {
            self.selected_todo -= 1;
        }
    }

    fn next_todo(&mut self) {
        self.selected_todo += 1;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let days = self.list.planner().day_count();
        self.selected_day = self.selected_day.min(days.saturating_sub(1));
        let len = self.list.planner().day_len(self.selected_day);
        let max = if self.drag.is_dragging() {
            len
        } else {
            len.saturating_sub(1)
        };
        self.selected_todo = self.selected_todo.min(max);
    }

    fn shift_period(&mut self, delta: i64) {
        let mode = self.list.period().mode();
        self.open_period(mode, self.offset.saturating_add(delta));
    }

    fn jump_to_today(&mut self) {
        let mode = self.list.period().mode();
        self.open_period(mode, 0);
    }

    fn toggle_mode(&mut self) {
        let mode = self.list.period().mode().toggled();
        self.open_period(mode, 0);
    }

    fn open_period(&mut self, mode: PeriodMode, offset: i64) {
        let period = match Period::resolve(mode, self.today, offset) {
            Ok(period) => period,
            Err(err) => {
                warn!(error = %err, "cannot open period");
                self.status = err.to_string();
                return;
            }
        };
        self.drag.drag_end();
        self.mouse_drag = false;
        self.list.switch_period(period);
        self.offset = offset;
        self.selected_day = period.index_of(self.today).unwrap_or(0);
        self.selected_todo = 0;
        self.status = format!("Showing {}", period.title());
    }

    fn saved(&mut self, message: impl Into<String>) {
        self.last_save = Instant::now();
        self.status = message.into();
    }

    fn hit_test(&self, column: u16, row: u16) -> Option<DropTarget> {
        self.hits
            .iter()
            .find(|(rect, _)| {
                column >= rect.x
                    && column < rect.x.saturating_add(rect.width)
                    && row >= rect.y
                    && row < rect.y.saturating_add(rect.height)
            })
            .map(|(_, target)| target.clone())
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_grid(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Adding { field, status } => {
                let title = format!(
                    "New todo for {}",
                    self.list.period().day_label(self.selected_day)
                );
                self.draw_input(f, &title, &format!("Todo [{}]", status), field);
            }
            Mode::Editing { day, field, .. } => {
                let title = format!("Edit todo on {}", self.list.period().day_label(*day));
                self.draw_input(f, &title, "Todo", field);
            }
            Mode::PickingStatus { choice, .. } => self.draw_picker(f, *choice),
            Mode::ConfirmDelete { day, index } => self.draw_confirm(f, *day, *index),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let period = self.list.period();
        let title = Line::from(vec![
            Span::styled(
                "dayplan ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(period.title(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", period.mode().prefix()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_grid(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.hits.clear();
        let period = *self.list.period();
        let cells = cell_rects(&period, area);
        let mut day_hits = Vec::with_capacity(cells.len());
        for (day, rect) in cells.into_iter().enumerate() {
            self.draw_day(f, day, rect);
            day_hits.push((rect, DropTarget::Day(day)));
        }
        // Todo rows win over the day cell that contains them.
        self.hits.extend(day_hits);
    }

    fn draw_day(&mut self, f: &mut ratatui::Frame<'_>, day: usize, area: Rect) {
        let period = self.list.period();
        let is_selected_day = day == self.selected_day;
        let hover = self.drag.hover();
        let dragged = self.drag.dragged();

        let mut title = period.day_label(day);
        if period.date_of(day) == Some(self.today) {
            title.push_str(" •");
        }
        let accent = if hover == Some(&DropTarget::Day(day)) {
            Color::Yellow
        } else if is_selected_day {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(accent).add_modifier(if is_selected_day {
                    Modifier::BOLD | Modifier::UNDERLINED
                } else {
                    Modifier::BOLD
                }),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));
        let inner = block.inner(area);
        let width = inner.width as usize;

        let todos = self.list.planner().todos(day);
        let selected = is_selected_day.then_some(self.selected_todo);
        let (first, shown) = visible_window(todos.len(), selected, inner.height as usize);
        let mut lines = Vec::with_capacity(shown + 2);
        let mut rows = Vec::new();
        for (idx, todo) in todos.iter().enumerate().skip(first).take(shown) {
            let mut style = status_style(todo);
            if dragged == Some(&todo.id) {
                style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
            }
            if hover == Some(&DropTarget::Todo(todo.id.clone())) && dragged != Some(&todo.id) {
                lines.push(drop_marker(width));
            }
            if selected == Some(idx) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let marker = if todo.emoji.is_empty() { " " } else { todo.emoji.as_str() };
            let text = truncate_text(&format!("{} {}", marker, todo.text), width);
            lines.push(Line::from(Span::styled(text, style)));
            let row = lines.len() as u16 - 1;
            if row < inner.height {
                rows.push((
                    Rect::new(inner.x, inner.y + row, inner.width, 1),
                    DropTarget::Todo(todo.id.clone()),
                ));
            }
        }
        let hidden = todos.len() - shown;
        if hidden > 0 {
            lines.push(Line::from(Span::styled(
                format!("+{} more", hidden),
                Style::default().fg(Color::DarkGray),
            )));
        }
        if hover == Some(&DropTarget::Day(day)) {
            lines.push(drop_marker(width));
        }
        if todos.is_empty() && hover != Some(&DropTarget::Day(day)) {
            lines.push(Line::from(Span::styled(
                "(empty)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        self.hits.extend(rows);
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::LightCyan));
        if self.drag.is_dragging() {
            return Line::from(vec![
                key("←↑↓→"),
                Span::raw(" choose spot  "),
                key("space"),
                Span::raw(" drop  "),
                key("esc"),
                Span::raw(" cancel"),
            ]);
        }
        Line::from(vec![
            key("←↑↓→ / h j k l"),
            Span::raw(" move  "),
            key("n"),
            Span::raw(" new  "),
            key("e"),
            Span::raw(" edit  "),
            key("s"),
            Span::raw(" status  "),
            key("d"),
            Span::raw(" delete  "),
            key("space"),
            Span::raw(" grab  "),
            key("[ ]"),
            Span::raw(" period  "),
            key("t"),
            Span::raw(" today  "),
            key("m"),
            Span::raw(" week/month  "),
            key("q"),
            Span::raw(" quit"),
        ])
    }

    fn draw_input(&self, f: &mut ratatui::Frame<'_>, title: &str, label: &str, field: &FieldValue) {
        let area = centered_rect(60, 25, f.size());
        let body = vec![
            Line::from(vec![
                Span::styled(
                    format!("{}: ", label),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::BOLD | Modifier::DIM),
                ),
                Span::styled(field.with_caret(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(body)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_picker(&self, f: &mut ratatui::Frame<'_>, choice: Status) {
        let area = centered_rect(40, 20, f.size());
        let mut spans = Vec::new();
        for (idx, status) in Status::ALL.iter().enumerate() {
            let style = if *status == choice {
                Style::default()
                    .bg(Color::Rgb(252, 214, 112))
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(
                format!(" {} {} ", idx + 1, status.emoji()),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        let body = vec![
            Line::from(spans),
            Line::from(Span::styled(
                choice.label(),
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Status",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, day: usize, index: usize) {
        let area = centered_rect(50, 30, f.size());
        let planner = self.list.planner();
        let text = planner
            .id_at(day, index)
            .and_then(|id| planner.todo(id))
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// One rect per day: a single row for weeks, a Monday-first calendar for months.
fn cell_rects(period: &Period, area: Rect) -> Vec<Rect> {
    let count = period.day_count();
    let blanks = match period.mode() {
        PeriodMode::Week => 0,
        PeriodMode::Month => period.leading_blanks(),
    };
    let row_count = (blanks + count).div_ceil(7);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, row_count as u32); row_count])
        .split(area);
    let grid: Vec<Vec<Rect>> = rows
        .iter()
        .map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, 7); 7])
                .split(*row)
                .to_vec()
        })
        .collect();
    (0..count)
        .map(|day| {
            let cell = blanks + day;
            grid[cell / 7][cell % 7]
        })
        .collect()
}

/// First todo index and number of todos that fit in `height` rows, keeping
/// `selected` in view. When not everything fits, the last row is left for a
/// "+N more" line.
fn visible_window(len: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if len <= height {
        return (0, len);
    }
    let room = height.saturating_sub(1);
    if room == 0 {
        return (0, 0);
    }
    let first = match selected {
        Some(sel) if sel >= room => (sel + 1 - room).min(len - room),
        _ => 0,
    };
    (first, room)
}

fn status_style(todo: &Todo) -> Style {
    match todo.status() {
        Some(Status::Completed) => Style::default().fg(Color::LightGreen),
        Some(Status::InProgress) => Style::default().fg(Color::LightRed),
        Some(Status::Procrastinating) => Style::default().fg(Color::Gray),
        None => Style::default(),
    }
}

fn drop_marker(width: usize) -> Line<'static> {
    Line::from(Span::styled(
        "─".repeat(width.max(1)),
        Style::default().fg(Color::Yellow),
    ))
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

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TodoRecord;
    use crate::storage::{MemoryStore, StoreScope, TodoStore};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn app_with(days: &[&[&str]]) -> App<MemoryStore> {
        let period = Period::resolve(PeriodMode::Week, today(), 0).unwrap();
        let mut list = TodoList::open(TodoStore::new(MemoryStore::default()), period);
        for (day, texts) in days.iter().enumerate() {
            for text in *texts {
                list.add(day, text, Status::Procrastinating).unwrap();
            }
        }
        let location = StoreLocation {
            dir: PathBuf::from("/tmp/dayplan-test"),
            scope: StoreScope::Project,
        };
        let mut app = App::new(list, location, &Config::default(), 0, today());
        app.selected_day = 0;
        app
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn typed(app: &mut App<MemoryStore>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn stored_texts(app: &App<MemoryStore>, day: usize) -> Vec<String> {
        app.list
            .store()
            .load(&app.list.period().key())
            .get(&day)
            .map(|r| r.iter().map(|t| t.text.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn starts_on_todays_cell() {
        let period = Period::resolve(PeriodMode::Week, today(), 0).unwrap();
        let list = TodoList::open(TodoStore::new(MemoryStore::default()), period);
        let location = StoreLocation {
            dir: PathBuf::from("/tmp/dayplan-test"),
            scope: StoreScope::Global,
        };
        let app = App::new(list, location, &Config::default(), 0, today());
        assert_eq!(app.selected_day, 4);
    }

    #[test]
    fn keyboard_move_across_days() {
        let mut app = app_with(&[&["x", "y"], &["z"]]);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.drag.is_dragging());
        press(&mut app, KeyCode::Right);
        // entering a day while dragging lands on its end slot
        assert_eq!(app.selected_todo, 1);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);

        assert!(!app.drag.is_dragging());
        assert_eq!(stored_texts(&app, 0), vec!["y"]);
        assert_eq!(stored_texts(&app, 1), vec!["x", "z"]);
        assert_eq!((app.selected_day, app.selected_todo), (1, 0));
    }

    #[test]
    fn escape_cancels_a_move() {
        let mut app = app_with(&[&["a", "b"]]);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Esc);
        assert!(!app.drag.is_dragging());
        assert_eq!(app.list.planner().records(0).len(), 2);
        assert!(app.list.planner().records(1).is_empty());
    }

    #[test]
    fn add_with_status_cycle() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('n'));
        typed(&mut app, "buy milk");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.list.planner().records(0),
            vec![TodoRecord::new("buy milk", "🎯")]
        );
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn editing_to_empty_deletes() {
        let mut app = app_with(&[&["a", "b"]]);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        assert_eq!(stored_texts(&app, 0), vec!["b"]);
        assert_eq!(app.selected_todo, 0);
    }

    #[test]
    fn picker_sets_status() {
        let mut app = app_with(&[&["a"]]);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.list.planner().records(0), vec![TodoRecord::new("a", "🔥")]);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = app_with(&[&["a"]]);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(stored_texts(&app, 0), vec!["a"]);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(stored_texts(&app, 0).is_empty());
    }

    #[test]
    fn period_navigation_reloads_model() {
        let mut app = app_with(&[&["this week"]]);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.list.period().key(), "week-2026-10-19");
        assert!(app.list.planner().records(0).is_empty());
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.list.period().key(), "week-2026-10-12");
        assert_eq!(app.selected_day, 4);
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.list.period().key(), "month-2026-10-01");
        assert_eq!(app.selected_day, 15);
    }

    #[test]
    fn mouse_drag_drops_on_hit_target() {
        let mut app = app_with(&[&["x"], &[]]);
        let x = app.list.planner().id_at(0, 0).cloned().unwrap();
        app.hits = vec![
            (Rect::new(1, 1, 10, 1), DropTarget::Todo(x)),
            (Rect::new(0, 0, 12, 10), DropTarget::Day(0)),
            (Rect::new(12, 0, 12, 10), DropTarget::Day(1)),
        ];
        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2, 1))
            .unwrap();
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 14, 3))
            .unwrap();
        assert_eq!(app.drag.hover(), Some(&DropTarget::Day(1)));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 14, 3))
            .unwrap();
        assert_eq!(stored_texts(&app, 1), vec!["x"]);
        assert!(stored_texts(&app, 0).is_empty());
    }

    #[test]
    fn click_on_a_todo_opens_the_editor() {
        let mut app = app_with(&[&["a", "b"]]);
        let b = app.list.planner().id_at(0, 1).cloned().unwrap();
        app.hits = vec![(Rect::new(1, 2, 10, 1), DropTarget::Todo(b))];
        let mouse = |kind| MouseEvent {
            kind,
            column: 3,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left)))
            .unwrap();
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left)))
            .unwrap();

        assert!(!app.drag.is_dragging());
        assert!(matches!(app.mode, Mode::Editing { day: 0, index: 1, .. }));
        typed(&mut app, "!");
        press(&mut app, KeyCode::Enter);
        assert_eq!(stored_texts(&app, 0), vec!["a", "b!"]);
    }

    #[test]
    fn crowded_cell_keeps_selection_visible() {
        assert_eq!(visible_window(3, Some(2), 5), (0, 3));
        assert_eq!(visible_window(10, None, 4), (0, 3));
        assert_eq!(visible_window(10, Some(2), 4), (0, 3));
        assert_eq!(visible_window(10, Some(5), 4), (3, 3));
        assert_eq!(visible_window(10, Some(9), 4), (7, 3));
        // end slot while dragging
        assert_eq!(visible_window(10, Some(10), 4), (7, 3));
        assert_eq!(visible_window(10, Some(0), 1), (0, 0));
    }

    #[test]
    fn crowded_cell_shows_overflow_and_hits_only_visible_rows() {
        let texts: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut app = app_with(&[refs.as_slice()]);
        app.selected_todo = 7;

        let backend = ratatui::backend::TestBackend::new(140, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let todo_hits: Vec<DropTarget> = app
            .hits
            .iter()
            .filter(|(_, target)| matches!(target, DropTarget::Todo(_)))
            .map(|(_, target)| target.clone())
            .collect();
        assert!(!todo_hits.is_empty());
        assert!(todo_hits.len() < 8);
        let last = app.list.planner().id_at(0, 7).cloned().unwrap();
        assert!(todo_hits.contains(&DropTarget::Todo(last)));

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("more"));
    }

    #[test]
    fn mouse_release_outside_cancels() {
        let mut app = app_with(&[&["x"]]);
        let x = app.list.planner().id_at(0, 0).cloned().unwrap();
        app.hits = vec![(Rect::new(0, 0, 10, 1), DropTarget::Todo(x))];
        let down = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        let up = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 50,
            row: 50,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse(down).unwrap();
        assert!(app.drag.is_dragging());
        app.handle_mouse(up).unwrap();
        assert!(!app.drag.is_dragging());
        assert_eq!(app.list.planner().records(0).len(), 1);
    }

    #[test]
    fn month_cells_follow_the_calendar() {
        let period = Period::resolve(PeriodMode::Month, today(), 0).unwrap();
        let area = Rect::new(0, 0, 70, 50);
        let cells = cell_rects(&period, area);
        assert_eq!(cells.len(), 31);
        // October 2026 starts on a Thursday
        assert_eq!(cells[0].x, 30);
        assert_eq!(cells[0].y, 0);
        assert_eq!(cells[4].x, 0);
        assert!(cells[4].y > 0);
    }

    #[test]
    fn week_cells_share_one_row() {
        let period = Period::resolve(PeriodMode::Week, today(), 0).unwrap();
        let cells = cell_rects(&period, Rect::new(0, 0, 70, 20));
        assert_eq!(cells.len(), 7);
        assert!(cells.iter().all(|c| c.y == 0 && c.height == 20));
    }

    #[test]
    fn field_editing_handles_multibyte() {
        let mut field = FieldValue::new("ab");
        field.insert_char('é');
        field.move_left();
        field.move_left();
        field.backspace();
        assert_eq!(field.value, "bé");
        assert_eq!(field.with_caret(), "▌bé");
    }

    #[test]
    fn truncation_respects_width() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a longer todo", 8), "a lon...");
        assert_eq!(truncate_text("abc", 0), "");
    }
}
