use serde::{Deserialize, Serialize};

use crate::model::task::{IdGen, Priority, Subtask, Task};

/// Marker appended to a template's title so it is recognizable in listings
pub const TEMPLATE_SUFFIX: &str = " (Template)";

/// A saved task shape used to stamp out new tasks quickly.
///
/// Carries everything a task does except status and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subtask_titles: Vec<String>,
}

impl Template {
    /// Snapshot a task into a template under a fresh identity.
    /// The marker suffix is appended to the title (once).
    pub fn from_task(id: u64, task: &Task) -> Self {
        let title = if task.title.ends_with(TEMPLATE_SUFFIX) {
            task.title.clone()
        } else {
            format!("{}{}", task.title, TEMPLATE_SUFFIX)
        };
        Template {
            id,
            title,
            description: task.description.clone(),
            priority: task.priority,
            category: task.category.clone(),
            subtask_titles: task.subtasks.iter().map(|s| s.title.clone()).collect(),
        }
    }

    /// Instantiate a fresh pending task from this template.
    /// Strips the marker suffix and assigns new ids and a new `created_at`.
    pub fn instantiate(&self, ids: &mut IdGen) -> Task {
        let title = self
            .title
            .strip_suffix(TEMPLATE_SUFFIX)
            .unwrap_or(&self.title)
            .to_string();
        let mut task = Task::new(ids.next(), title);
        task.description = self.description.clone();
        task.priority = self.priority;
        task.category = self.category.clone();
        task.subtasks = self
            .subtask_titles
            .iter()
            .map(|t| Subtask {
                id: ids.next(),
                title: t.clone(),
                completed: false,
            })
            .collect();
        task
    }
}
