use crate::model::task::{Priority, Task};
use crate::model::view::{ViewAction, ViewState};
use crate::ops::repo::Repo;
use crate::ops::view::project;

/// Outcome of a bulk operation, for reporting and undo
#[derive(Debug, Default)]
pub struct BulkResult {
    /// Snapshots of tasks as they were before the change
    pub changed: Vec<Task>,
    /// Removed tasks with their former indices (bulk delete only)
    pub removed: Vec<(usize, Task)>,
}

/// Select exactly the currently visible (projected) set.
pub fn select_visible(view: ViewState, tasks: &[Task]) -> ViewState {
    let visible: Vec<u64> = project(tasks, &view).iter().map(|t| t.id).collect();
    view.reduce(ViewAction::SelectAll(visible))
}

/// Complete every selected task that is still pending; completed tasks are
/// left untouched. Clears the selection afterwards.
pub fn bulk_complete(repo: &mut Repo, view: ViewState) -> (ViewState, BulkResult) {
    let mut result = BulkResult::default();
    for id in view.selection.iter().copied() {
        let before = repo.task(id).cloned();
        if repo.complete(id)
            && let Some(before) = before
        {
            result.changed.push(before);
        }
    }
    (view.reduce(ViewAction::ClearSelection), result)
}

/// Delete every selected task (and its subtasks). Clears the selection.
pub fn bulk_delete(repo: &mut Repo, view: ViewState) -> (ViewState, BulkResult) {
    let mut result = BulkResult::default();
    let ids: Vec<u64> = view.selection.iter().copied().collect();
    let mut view = view;
    for id in ids {
        if let Some((idx, task)) = repo.remove(id) {
            view.forget(id);
            result.removed.push((idx, task));
        }
    }
    (view.reduce(ViewAction::ClearSelection), result)
}

/// Set the given priority on every selected task, regardless of status.
/// Clears the selection.
pub fn bulk_set_priority(
    repo: &mut Repo,
    view: ViewState,
    priority: Priority,
) -> (ViewState, BulkResult) {
    let mut result = BulkResult::default();
    for id in view.selection.iter().copied() {
        let before = repo.task(id).cloned();
        if repo.set_priority(id, priority)
            && let Some(before) = before
        {
            result.changed.push(before);
        }
    }
    (view.reduce(ViewAction::ClearSelection), result)
}
