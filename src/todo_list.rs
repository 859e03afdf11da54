use crate::model::{Planner, PlannerError, Status, Todo, TodoId};
use crate::period::Period;
use crate::storage::{KeyValueStore, TodoStore};
use anyhow::Result;
use tracing::{debug, info};

/// Result of committing an edited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Updated,
    Deleted,
    Unchanged,
}

/// The todos of the displayed period. Every mutation persists the days it
/// touched before returning.
pub struct TodoList<S> {
    period: Period,
    planner: Planner,
    store: TodoStore<S>,
}

impl<S: KeyValueStore> TodoList<S> {
    pub fn open(store: TodoStore<S>, period: Period) -> Self {
        let planner = Planner::from_snapshot(period.day_count(), &store.load(&period.key()));
        debug!(period = %period, "opened period");
        TodoList {
            period,
            planner,
            store,
        }
    }

    pub fn switch_period(&mut self, period: Period) {
        self.planner = Planner::from_snapshot(period.day_count(), &self.store.load(&period.key()));
        self.period = period;
        debug!(period = %self.period, "switched period");
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    #[cfg(test)]
    pub fn store(&self) -> &TodoStore<S> {
        &self.store
    }

    pub fn add(&mut self, day: usize, text: &str, status: Status) -> Result<Option<TodoId>> {
        match self.planner.push(day, text, status) {
            Ok(id) => {
                self.persist_day(day)?;
                info!(period = %self.period, day, "added todo");
                Ok(Some(id))
            }
            Err(err) => {
                debug!(day, error = %err, "add ignored");
                Ok(None)
            }
        }
    }

    /// Replaces the text in place; text that trims to nothing deletes the todo.
    pub fn update_text(&mut self, day: usize, index: usize, text: &str) -> Result<Edit> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(match self.delete(day, index)? {
                Some(_) => Edit::Deleted,
                None => Edit::Unchanged,
            });
        }
        let changed = self.mutate(day, index, |todo| todo.text = text.to_string())?;
        Ok(if changed { Edit::Updated } else { Edit::Unchanged })
    }

    pub fn update_emoji(&mut self, day: usize, index: usize, status: Status) -> Result<bool> {
        self.mutate(day, index, |todo| todo.emoji = status.emoji().to_string())
    }

    pub fn delete(&mut self, day: usize, index: usize) -> Result<Option<Todo>> {
        match self.planner.remove(day, index) {
            Ok(todo) => {
                self.persist_day(day)?;
                info!(period = %self.period, day, index, "deleted todo");
                Ok(Some(todo))
            }
            Err(err) => {
                debug!(day, index, error = %err, "delete ignored");
                Ok(None)
            }
        }
    }

    /// Writes the model's current order for `day` to the store.
    pub(crate) fn persist_day(&mut self, day: usize) -> Result<()> {
        let records = self.planner.records(day);
        self.store.save(&self.period.key(), day, records)
    }

    pub(crate) fn planner_mut(&mut self) -> &mut Planner {
        &mut self.planner
    }

    fn mutate<F>(&mut self, day: usize, index: usize, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Todo),
    {
        match self.planner.update_todo(day, index, f) {
            Ok(()) => {
                self.persist_day(day)?;
                Ok(true)
            }
            Err(err @ (PlannerError::DayOutOfRange(_) | PlannerError::TodoOutOfRange { .. })) => {
                debug!(day, index, error = %err, "update ignored");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
