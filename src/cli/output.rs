use chrono::{DateTime, Local, NaiveDate};

use crate::model::config::Theme;
use crate::model::task::{Priority, Status, Subtask, Task};
use crate::model::view::{SortKey, StatusFilter};

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// One list row: id, checkbox, title, then any non-default annotations.
pub fn format_task_line(task: &Task, now: DateTime<Local>) -> String {
    let check = if task.status == Status::Completed {
        "x"
    } else {
        " "
    };
    let mut line = format!("{:>4} [{}] {}", task.id, check, task.title);
    if task.priority != Priority::Medium {
        line.push_str(&format!(" ({})", priority_name(task.priority)));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
        if task.is_overdue(now) {
            line.push_str(" OVERDUE");
        }
    }
    if let Some(category) = &task.category {
        line.push_str(&format!(" #{category}"));
    }
    if !task.subtasks.is_empty() {
        let done = task.subtasks.iter().filter(|s| s.completed).count();
        line.push_str(&format!(" [{}/{}]", done, task.subtasks.len()));
    }
    line
}

/// Indented subtask row shown under an expanded task in `tp list`.
pub fn format_subtask_line(sub: &Subtask) -> String {
    let check = if sub.completed { "x" } else { " " };
    format!("       {:>4} [{}] {}", sub.id, check, sub.title)
}

/// Full detail block for `tp show`.
pub fn format_task_detail(task: &Task, now: DateTime<Local>) -> Vec<String> {
    let mut lines = vec![
        format!("{} (#{})", task.title, task.id),
        format!("  status:   {}", status_name(task.status)),
        format!("  priority: {}", priority_name(task.priority)),
    ];
    if let Some(due) = task.due_date {
        let overdue = if task.is_overdue(now) { " (overdue)" } else { "" };
        lines.push(format!("  due:      {}{}", due.format("%Y-%m-%d %H:%M"), overdue));
    }
    if let Some(category) = &task.category {
        lines.push(format!("  category: {category}"));
    }
    lines.push(format!(
        "  created:  {}",
        task.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(completed) = task.completed_at {
        lines.push(format!(
            "  done at:  {}",
            completed.format("%Y-%m-%d %H:%M")
        ));
    }
    if let Some(description) = &task.description {
        lines.push(String::new());
        for text_line in description.lines() {
            lines.push(format!("  {text_line}"));
        }
    }
    if !task.subtasks.is_empty() {
        lines.push(String::new());
        for sub in &task.subtasks {
            let check = if sub.completed { "x" } else { " " };
            lines.push(format!("  {:>4} [{}] {}", sub.id, check, sub.title));
        }
    }
    lines
}

pub fn priority_name(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
        Priority::Urgent => "urgent",
    }
}

pub fn status_name(status: Status) -> &'static str {
    match status {
        Status::Pending => "pending",
        Status::Completed => "completed",
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

pub fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s)
        .ok_or_else(|| format!("unknown priority '{s}' (expected: low, medium, high, urgent)"))
}

pub fn parse_filter(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(s)
        .ok_or_else(|| format!("unknown status filter '{s}' (expected: all, pending, completed)"))
}

pub fn parse_sort(s: &str) -> Result<SortKey, String> {
    SortKey::parse(s)
        .ok_or_else(|| format!("unknown sort key '{s}' (expected: date, priority, due, alpha)"))
}

pub fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::parse(s).ok_or_else(|| format!("unknown theme '{s}' (expected: light, dark)"))
}

/// Parse a due date: RFC3339, or a bare `YYYY-MM-DD` meaning end of that
/// local day.
pub fn parse_due(s: &str) -> Result<DateTime<Local>, String> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(s) {
        return Ok(stamped.with_timezone(&Local));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid due date '{s}' (expected: YYYY-MM-DD or RFC3339)"))?;
    date.and_hms_opt(23, 59, 59)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .ok_or_else(|| format!("invalid due date '{s}'"))
}
