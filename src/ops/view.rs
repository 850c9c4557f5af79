use crate::model::task::Task;
use crate::model::view::{SortKey, ViewState};

/// Compute the visible task list from the raw list and the UI state.
///
/// Pure function of its inputs: status filter, then search, then a stable
/// sort. Search is an additional constraint on the status filter (AND),
/// matched case-insensitively against title, description, and category.
pub fn project<'a>(tasks: &'a [Task], view: &ViewState) -> Vec<&'a Task> {
    let query = view.search.trim().to_lowercase();
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|t| view.filter.matches(t.status))
        .filter(|t| query.is_empty() || matches_search(t, &query))
        .collect();
    sort(&mut visible, view.sort);
    visible
}

fn matches_search(task: &Task, query: &str) -> bool {
    let hay = |s: &str| s.to_lowercase().contains(query);
    hay(&task.title)
        || task.description.as_deref().is_some_and(hay)
        || task.category.as_deref().is_some_and(hay)
}

/// Stable sort of the visible list by the given key.
fn sort(tasks: &mut [&Task], key: SortKey) {
    match key {
        // Newest first
        SortKey::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        // Urgent > High > Medium > Low
        SortKey::Priority => tasks.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        // Dated tasks ascending, undated after all dated
        SortKey::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }),
        SortKey::Alphabetical => {
            tasks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
    }
}
