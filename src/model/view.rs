use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::task::Status;

/// Status filter applied before search and sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == Status::Pending,
            StatusFilter::Completed => status == Status::Completed,
        }
    }

    pub fn parse(s: &str) -> Option<StatusFilter> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(StatusFilter::All),
            "pending" => Some(StatusFilter::Pending),
            "completed" | "done" => Some(StatusFilter::Completed),
            _ => None,
        }
    }
}

/// Sort key for the projected list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first (default)
    #[default]
    Created,
    /// Urgent first
    Priority,
    /// Soonest first, undated tasks last
    DueDate,
    /// Case-insensitive by title
    Alphabetical,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s.to_ascii_lowercase().as_str() {
            "date" | "created" => Some(SortKey::Created),
            "priority" => Some(SortKey::Priority),
            "due" | "duedate" => Some(SortKey::DueDate),
            "alpha" | "alphabetical" => Some(SortKey::Alphabetical),
            _ => None,
        }
    }
}

/// Transient UI state threaded through the projection.
///
/// Held as a single value and updated only through [`ViewState::reduce`],
/// never as scattered mutable flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: StatusFilter,
    pub search: String,
    pub sort: SortKey,
    /// Selected task ids, in selection order
    pub selection: IndexSet<u64>,
    /// Tasks with their subtask list expanded
    pub expanded: HashSet<u64>,
}

/// A single transition of the UI state
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    SetFilter(StatusFilter),
    SetSearch(String),
    SetSort(SortKey),
    Select(u64),
    Deselect(u64),
    /// Select exactly the given (visible) ids, replacing the current selection
    SelectAll(Vec<u64>),
    ClearSelection,
    ToggleExpanded(u64),
}

impl ViewState {
    /// Pure transition: consumes the current state, returns the next one.
    pub fn reduce(mut self, action: ViewAction) -> ViewState {
        match action {
            ViewAction::SetFilter(f) => self.filter = f,
            ViewAction::SetSearch(q) => self.search = q,
            ViewAction::SetSort(s) => self.sort = s,
            ViewAction::Select(id) => {
                self.selection.insert(id);
            }
            ViewAction::Deselect(id) => {
                self.selection.shift_remove(&id);
            }
            ViewAction::SelectAll(ids) => {
                self.selection = ids.into_iter().collect();
            }
            ViewAction::ClearSelection => self.selection.clear(),
            ViewAction::ToggleExpanded(id) => {
                if !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
            }
        }
        self
    }

    /// Drop a task id from the selection and expanded sets (after deletion)
    pub fn forget(&mut self, id: u64) {
        self.selection.shift_remove(&id);
        self.expanded.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_is_a_pure_value_transition() {
        let state = ViewState::default();
        let next = state
            .clone()
            .reduce(ViewAction::SetFilter(StatusFilter::Pending));
        assert_eq!(state.filter, StatusFilter::All);
        assert_eq!(next.filter, StatusFilter::Pending);
    }

    #[test]
    fn select_all_replaces_selection() {
        let state = ViewState::default()
            .reduce(ViewAction::Select(1))
            .reduce(ViewAction::Select(2))
            .reduce(ViewAction::SelectAll(vec![3, 4]));
        assert_eq!(state.selection.iter().copied().collect::<Vec<_>>(), vec![
            3, 4
        ]);
    }

    #[test]
    fn deselect_and_clear() {
        let state = ViewState::default()
            .reduce(ViewAction::Select(1))
            .reduce(ViewAction::Select(2))
            .reduce(ViewAction::Deselect(1));
        assert_eq!(state.selection.len(), 1);
        let state = state.reduce(ViewAction::ClearSelection);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn toggle_expanded_flips_membership() {
        let state = ViewState::default().reduce(ViewAction::ToggleExpanded(9));
        assert!(state.expanded.contains(&9));
        let state = state.reduce(ViewAction::ToggleExpanded(9));
        assert!(!state.expanded.contains(&9));
    }

    #[test]
    fn forget_removes_from_both_sets() {
        let mut state = ViewState::default()
            .reduce(ViewAction::Select(5))
            .reduce(ViewAction::ToggleExpanded(5));
        state.forget(5);
        assert!(state.selection.is_empty());
        assert!(state.expanded.is_empty());
    }
}
