use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

/// Task priority, ordered for sorting: Urgent > High > Medium > Low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Numeric rank used by priority sort (higher sorts first)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    /// Parse a priority name (case-insensitive)
    pub fn parse(s: &str) -> Option<Priority> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// A checklist item owned by exactly one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// A user-created unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Local>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default = "Local::now")]
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Local>>,
}

impl Task {
    /// Create a pending task with the given id and title, everything else defaulted
    pub fn new(id: u64, title: String) -> Self {
        Task {
            id,
            title,
            description: None,
            status: Status::Pending,
            priority: Priority::Medium,
            due_date: None,
            category: None,
            subtasks: Vec::new(),
            created_at: Local::now(),
            completed_at: None,
        }
    }

    /// A task is overdue iff its due date has passed and it is still pending
    pub fn is_overdue(&self, now: DateTime<Local>) -> bool {
        match self.due_date {
            Some(due) => due < now && self.status == Status::Pending,
            None => false,
        }
    }
}

/// Monotonic identity source for tasks and subtasks.
///
/// Seeded from the highest id already in use so ids are never reused,
/// even across process restarts or rapid back-to-back creations.
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    /// Seed from an existing task list (scans subtask ids too)
    pub fn seeded_from(tasks: &[Task]) -> Self {
        let max = tasks
            .iter()
            .flat_map(|t| std::iter::once(t.id).chain(t.subtasks.iter().map(|s| s.id)))
            .max()
            .unwrap_or(0);
        IdGen { next: max + 1 }
    }

    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
