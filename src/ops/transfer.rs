use chrono::Local;
use serde_json::Value;

use crate::model::chat::{ChatExport, ChatMessage};
use crate::model::task::Task;

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import file is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("import file must contain a top-level array of tasks")]
    NotAnArray,
    #[error("import file contains records that are not task-shaped: {0}")]
    BadRecord(serde_json::Error),
}

/// Serialize the entire task list as a downloadable JSON document
/// (a bare array of task records).
pub fn export_tasks(tasks: &[Task]) -> String {
    serde_json::to_string_pretty(tasks).expect("task list serializes")
}

/// Parse an import document. Accepts exactly a top-level array of
/// task-shaped records; anything else is rejected and the caller must leave
/// the current list untouched.
pub fn parse_import(text: &str) -> Result<Vec<Task>, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(ImportError::NotAnArray);
    }
    serde_json::from_value(value).map_err(ImportError::BadRecord)
}

/// Serialize the chat transcript for export: `{messages, exportedAt}`.
pub fn export_chat(messages: &[ChatMessage]) -> String {
    let doc = ChatExport {
        messages: messages.to_vec(),
        exported_at: Local::now(),
    };
    serde_json::to_string_pretty(&doc).expect("chat export serializes")
}
