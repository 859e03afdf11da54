//! Drag-and-drop reordering of todos within and across days.
//!
//! The coordinator owns the drag state. A drop commits the move into the
//! [`TodoList`] model and persists every day the move touched: the
//! destination always, and the origin too when it differs.

use crate::model::TodoId;
use crate::storage::KeyValueStore;
use crate::todo_list::TodoList;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { todo: TodoId, origin_day: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Insert in front of this todo, in whichever day holds it.
    Todo(TodoId),
    /// Append to the end of this day.
    Day(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub todo: TodoId,
    pub from_day: usize,
    pub to_day: usize,
    pub position: usize,
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
    hover: Option<DropTarget>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        DragCoordinator::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn hover(&self) -> Option<&DropTarget> {
        self.hover.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged(&self) -> Option<&TodoId> {
        match &self.state {
            DragState::Dragging { todo, .. } => Some(todo),
            DragState::Idle => None,
        }
    }

    /// Picks up the todo at `index` of `day`. Returns false if there is none.
    pub fn drag_start<S: KeyValueStore>(
        &mut self,
        list: &TodoList<S>,
        day: usize,
        index: usize,
    ) -> bool {
        let Some(todo) = list.planner().id_at(day, index).cloned() else {
            return false;
        };
        debug!(todo = %todo, day, index, "drag started");
        self.state = DragState::Dragging {
            todo,
            origin_day: day,
        };
        self.hover = None;
        true
    }

    pub fn drag_over(&mut self, target: DropTarget) {
        if self.is_dragging() {
            self.hover = Some(target);
        }
    }

    pub fn drag_leave(&mut self, target: &DropTarget) {
        if self.hover.as_ref() == Some(target) {
            self.hover = None;
        }
    }

    /// Abandons the drag without touching any data.
    pub fn drag_end(&mut self) {
        if let DragState::Dragging { todo, .. } = &self.state {
            debug!(todo = %todo, "drag cancelled");
        }
        self.state = DragState::Idle;
        self.hover = None;
    }

    /// Commits the drag onto `target`. Always leaves the coordinator idle.
    ///
    /// Returns `None` when nothing moved: no drag in progress, a drop onto
    /// the dragged todo itself, or a target that no longer exists.
    pub fn drop<S: KeyValueStore>(
        &mut self,
        list: &mut TodoList<S>,
        target: DropTarget,
    ) -> Result<Option<MoveOutcome>> {
        let state = std::mem::take(&mut self.state);
        self.hover = None;
        let DragState::Dragging { todo, origin_day } = state else {
            return Ok(None);
        };

        let (dest_day, before) = match &target {
            DropTarget::Todo(anchor) if *anchor == todo => {
                debug!(todo = %todo, "dropped onto itself");
                return Ok(None);
            }
            DropTarget::Todo(anchor) => match list.planner().locate(anchor) {
                Some((day, _)) => (day, Some(anchor.as_str())),
                None => {
                    debug!(anchor = %anchor, "drop target vanished");
                    return Ok(None);
                }
            },
            DropTarget::Day(day) => (*day, None),
        };

        let (from_day, position) = match list.planner_mut().move_todo(&todo, dest_day, before) {
            Ok(moved) => moved,
            Err(err) => {
                debug!(todo = %todo, error = %err, "drop ignored");
                return Ok(None);
            }
        };
        if from_day != origin_day {
            debug!(todo = %todo, origin_day, from_day, "todo changed day during drag");
        }

        list.persist_day(dest_day)?;
        if from_day != dest_day {
            list.persist_day(from_day)?;
        }
        info!(todo = %todo, from_day, to_day = dest_day, position, "moved todo");
        Ok(Some(MoveOutcome {
            todo,
            from_day,
            to_day: dest_day,
            position,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TodoRecord};
    use crate::period::{Period, PeriodMode};
    use crate::storage::{MemoryStore, TodoStore};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn period() -> Period {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        Period::resolve(PeriodMode::Week, today, 0).unwrap()
    }

    fn list_with(days: &[&[&str]]) -> TodoList<MemoryStore> {
        let mut list = TodoList::open(TodoStore::new(MemoryStore::default()), period());
        for (day, texts) in days.iter().enumerate() {
            for text in *texts {
                list.add(day, text, Status::Procrastinating).unwrap();
            }
        }
        list
    }

    fn stored(list: &TodoList<MemoryStore>, day: usize) -> Vec<String> {
        list.store()
            .load(&period().key())
            .get(&day)
            .map(|records| records.iter().map(|r| r.text.clone()).collect())
            .unwrap_or_default()
    }

    fn raw(list: &TodoList<MemoryStore>) -> Option<String> {
        list.store().backend().get(&period().key()).unwrap()
    }

    #[test]
    fn cross_list_drop_before_todo() {
        let mut list = list_with(&[&["x", "y"], &["z"]]);
        let z = list.planner().id_at(1, 0).cloned().unwrap();
        let mut drag = DragCoordinator::new();

        assert!(drag.drag_start(&list, 0, 0));
        drag.drag_over(DropTarget::Todo(z.clone()));
        let outcome = drag.drop(&mut list, DropTarget::Todo(z)).unwrap().unwrap();

        assert_eq!((outcome.from_day, outcome.to_day, outcome.position), (0, 1, 0));
        assert_eq!(stored(&list, 0), vec!["y"]);
        assert_eq!(stored(&list, 1), vec!["x", "z"]);
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.hover().is_none());
    }

    #[test]
    fn drop_on_empty_day_appends_sole_entry() {
        let mut list = list_with(&[&["a", "b"]]);
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 1);
        let outcome = drag.drop(&mut list, DropTarget::Day(4)).unwrap().unwrap();

        assert_eq!(outcome.to_day, 4);
        assert_eq!(stored(&list, 4), vec!["b"]);
        assert_eq!(stored(&list, 0), vec!["a"]);
    }

    #[test]
    fn dragging_last_todo_away_persists_empty_day() {
        let mut list = list_with(&[&["solo"], &["other"]]);
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 0);
        drag.drop(&mut list, DropTarget::Day(1)).unwrap();

        let snapshot = list.store().load(&period().key());
        assert_eq!(snapshot.get(&0), Some(&Vec::<TodoRecord>::new()));
        assert_eq!(stored(&list, 1), vec!["other", "solo"]);
    }

    #[test]
    fn self_drop_leaves_storage_untouched() {
        let mut list = list_with(&[&["a", "b"], &["c"]]);
        let before = raw(&list);
        let a = list.planner().id_at(0, 0).cloned().unwrap();
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 0);
        assert_eq!(drag.drop(&mut list, DropTarget::Todo(a)).unwrap(), None);
        assert_eq!(raw(&list), before);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drop_without_drag_is_a_noop() {
        let mut list = list_with(&[&["a"]]);
        let before = raw(&list);
        let mut drag = DragCoordinator::new();

        assert_eq!(drag.drop(&mut list, DropTarget::Day(3)).unwrap(), None);
        drag.drag_over(DropTarget::Day(3));
        assert!(drag.hover().is_none());
        assert_eq!(raw(&list), before);
    }

    #[test]
    fn cancel_clears_state_without_mutation() {
        let mut list = list_with(&[&["a", "b"]]);
        let before = raw(&list);
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 0);
        drag.drag_over(DropTarget::Day(2));
        assert_eq!(drag.hover(), Some(&DropTarget::Day(2)));
        drag.drag_end();

        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.hover().is_none());
        assert_eq!(raw(&list), before);
        assert_eq!(drag.drop(&mut list, DropTarget::Day(2)).unwrap(), None);
    }

    #[test]
    fn reorder_within_day() {
        let mut list = list_with(&[&["a", "b", "c"]]);
        let a = list.planner().id_at(0, 0).cloned().unwrap();
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 2);
        let outcome = drag.drop(&mut list, DropTarget::Todo(a)).unwrap().unwrap();
        assert_eq!(outcome.position, 0);
        assert_eq!(stored(&list, 0), vec!["c", "a", "b"]);

        drag.drag_start(&list, 0, 0);
        drag.drop(&mut list, DropTarget::Day(0)).unwrap();
        assert_eq!(stored(&list, 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn moved_todo_keeps_text_and_status() {
        let mut store = TodoStore::new(MemoryStore::default());
        store
            .save(&period().key(), 0, vec![TodoRecord::new("paint", "🦄")])
            .unwrap();
        let mut list = TodoList::open(store, period());
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 0);
        drag.drop(&mut list, DropTarget::Day(6)).unwrap();

        let snapshot = list.store().load(&period().key());
        assert_eq!(snapshot.get(&6), Some(&vec![TodoRecord::new("paint", "🦄")]));
    }

    #[test]
    fn invalid_targets_are_ignored() {
        let mut list = list_with(&[&["a"], &["b"]]);
        let before = raw(&list);
        let mut drag = DragCoordinator::new();

        drag.drag_start(&list, 0, 0);
        assert_eq!(drag.drop(&mut list, DropTarget::Day(7)).unwrap(), None);

        drag.drag_start(&list, 0, 0);
        let missing = DropTarget::Todo("nope".to_string());
        assert_eq!(drag.drop(&mut list, missing).unwrap(), None);
        assert_eq!(raw(&list), before);

        assert!(!drag.drag_start(&list, 1, 5));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drag_leave_only_clears_matching_hover() {
        let list = list_with(&[&["a"]]);
        let mut drag = DragCoordinator::new();
        drag.drag_start(&list, 0, 0);
        drag.drag_over(DropTarget::Day(1));
        drag.drag_leave(&DropTarget::Day(2));
        assert_eq!(drag.hover(), Some(&DropTarget::Day(1)));
        drag.drag_leave(&DropTarget::Day(1));
        assert!(drag.hover().is_none());
    }
}
