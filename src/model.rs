use crate::storage::Snapshot;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type TodoId = String;

pub const DEFAULT_EMOJI: &str = "💀";

/// Status markers a todo can be given. Stored todos may still carry other
/// markers, which are kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    Completed,
    InProgress,
    #[default]
    Procrastinating,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown status {0:?} (use 🎯/completed, 🔥/in-progress or 💀/procrastinating)")]
pub struct UnknownStatus(pub String);

impl Status {
    pub const ALL: [Status; 3] = [Status::Completed, Status::InProgress, Status::Procrastinating];

    pub fn emoji(&self) -> &'static str {
        match self {
            Status::Completed => "🎯",
            Status::InProgress => "🔥",
            Status::Procrastinating => "💀",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::InProgress => "in progress",
            Status::Procrastinating => "procrastinating",
        }
    }

    /// Unrecognized markers have no status but are kept as-is on the todo.
    pub fn from_emoji(emoji: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.emoji() == emoji.trim())
    }

    /// Accepts the emoji itself or a status name.
    pub fn parse(input: &str) -> Option<Status> {
        let input = input.trim();
        Status::from_emoji(input).or_else(|| match input.to_lowercase().as_str() {
            "completed" | "done" => Some(Status::Completed),
            "in-progress" | "inprogress" | "doing" => Some(Status::InProgress),
            "procrastinating" | "todo" => Some(Status::Procrastinating),
            _ => None,
        })
    }

    pub fn next(self) -> Status {
        match self {
            Status::Completed => Status::InProgress,
            Status::InProgress => Status::Procrastinating,
            Status::Procrastinating => Status::Completed,
        }
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for Status {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.emoji().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

/// Persisted form of a todo. Identity is not stored; order is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub text: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
}

fn default_emoji() -> String {
    DEFAULT_EMOJI.to_string()
}

impl TodoRecord {
    pub fn new(text: impl Into<String>, emoji: impl Into<String>) -> Self {
        TodoRecord {
            text: text.into(),
            emoji: emoji.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub emoji: String,
}

impl Todo {
    pub fn status(&self) -> Option<Status> {
        Status::from_emoji(&self.emoji)
    }

    pub fn record(&self) -> TodoRecord {
        TodoRecord::new(self.text.clone(), self.emoji.clone())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PlannerError {
    #[error("day {0} is not part of this period")]
    DayOutOfRange(usize),
    #[error("no todo at position {index} of day {day}")]
    TodoOutOfRange { day: usize, index: usize },
    #[error("todo not found: {0}")]
    TodoNotFound(TodoId),
    #[error("todo {0} not present in any day")]
    TodoLocationMissing(TodoId),
    #[error("todo text is empty")]
    EmptyText,
}

/// Todos of one period: per-day ordered id lists over a shared record map.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    days: Vec<Vec<TodoId>>,
    todos: HashMap<TodoId, Todo>,
}

impl Planner {
    pub fn with_days(day_count: usize) -> Self {
        Planner {
            days: vec![Vec::new(); day_count],
            todos: HashMap::new(),
        }
    }

    /// Builds a planner from a stored snapshot, assigning fresh ids.
    /// Entries for days outside `0..day_count` are ignored.
    pub fn from_snapshot(day_count: usize, snapshot: &Snapshot) -> Self {
        let mut planner = Planner::with_days(day_count);
        for (day, records) in snapshot.range(0..day_count) {
            for record in records {
                let id = planner.generate_id();
                planner.todos.insert(
                    id.clone(),
                    Todo {
                        id: id.clone(),
                        text: record.text.clone(),
                        emoji: record.emoji.clone(),
                    },
                );
                planner.days[*day].push(id);
            }
        }
        planner
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn day_len(&self, day: usize) -> usize {
        self.days.get(day).map(Vec::len).unwrap_or(0)
    }

    pub fn todos(&self, day: usize) -> Vec<&Todo> {
        self.days
            .get(day)
            .map(|ids| ids.iter().filter_map(|id| self.todos.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        self.todos.get(id)
    }

    pub fn id_at(&self, day: usize, index: usize) -> Option<&TodoId> {
        self.days.get(day).and_then(|ids| ids.get(index))
    }

    /// Day and position currently holding `id`.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.days.iter().enumerate().find_map(|(day, ids)| {
            ids.iter()
                .position(|candidate| candidate == id)
                .map(|pos| (day, pos))
        })
    }

    pub fn records(&self, day: usize) -> Vec<TodoRecord> {
        self.todos(day).into_iter().map(Todo::record).collect()
    }

    pub fn push(&mut self, day: usize, text: &str, status: Status) -> Result<TodoId, PlannerError> {
        self.ensure_day(day)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::EmptyText);
        }
        let id = self.generate_id();
        self.todos.insert(
            id.clone(),
            Todo {
                id: id.clone(),
                text: text.to_string(),
                emoji: status.emoji().to_string(),
            },
        );
        self.days[day].push(id.clone());
        Ok(id)
    }

    pub fn update_todo<F>(&mut self, day: usize, index: usize, f: F) -> Result<(), PlannerError>
    where
        F: FnOnce(&mut Todo),
    {
        let id = self.checked_id(day, index)?;
        let todo = self
            .todos
            .get_mut(&id)
            .ok_or(PlannerError::TodoNotFound(id))?;
        f(todo);
        Ok(())
    }

    pub fn remove(&mut self, day: usize, index: usize) -> Result<Todo, PlannerError> {
        let id = self.checked_id(day, index)?;
        self.days[day].remove(index);
        self.todos
            .remove(&id)
            .ok_or(PlannerError::TodoNotFound(id))
    }

    /// Moves `id` in front of `before`, or to the end of `dest_day` when
    /// `before` is `None`. Returns the origin day and the final position.
    pub fn move_todo(
        &mut self,
        id: &str,
        dest_day: usize,
        before: Option<&str>,
    ) -> Result<(usize, usize), PlannerError> {
        if !self.todos.contains_key(id) {
            return Err(PlannerError::TodoNotFound(id.to_string()));
        }
        self.ensure_day(dest_day)?;
        let (src_day, src_pos) = self
            .locate(id)
            .ok_or_else(|| PlannerError::TodoLocationMissing(id.to_string()))?;
        if before == Some(id) {
            return Ok((src_day, src_pos));
        }
        if let Some(anchor) = before {
            match self.locate(anchor) {
                Some((anchor_day, _)) if anchor_day == dest_day => {}
                Some(_) | None => return Err(PlannerError::TodoNotFound(anchor.to_string())),
            }
        }
        let moved = self.days[src_day].remove(src_pos);
        let position = match before {
            Some(anchor) => self.days[dest_day]
                .iter()
                .position(|candidate| candidate == anchor)
                .unwrap_or(self.days[dest_day].len()),
            None => self.days[dest_day].len(),
        };
        self.days[dest_day].insert(position, moved);
        Ok((src_day, position))
    }

    fn checked_id(&self, day: usize, index: usize) -> Result<TodoId, PlannerError> {
        self.ensure_day(day)?;
        self.id_at(day, index)
            .cloned()
            .ok_or(PlannerError::TodoOutOfRange { day, index })
    }

    fn ensure_day(&self, day: usize) -> Result<(), PlannerError> {
        if day < self.days.len() {
            Ok(())
        } else {
            Err(PlannerError::DayOutOfRange(day))
        }
    }

    fn generate_id(&self) -> TodoId {
        loop {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(8)
                .map(char::from)
                .collect();
            if !self.todos.contains_key(&id) {
                return id;
            }
        }
    }
}
