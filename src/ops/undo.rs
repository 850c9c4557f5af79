use serde::{Deserialize, Serialize};

use crate::io::store::{Store, UNDO_KEY};
use crate::model::task::Task;
use crate::ops::repo::Repo;

const UNDO_STACK_LIMIT: usize = 100;

/// An undo-able mutation, recorded as the information needed to invert it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Operation {
    /// A task was added; undo discards it
    Added { id: u64 },
    /// A task was removed; undo reinserts it at its former index
    Removed { index: usize, task: Task },
    /// A single task was edited or toggled; undo restores the snapshot
    Mutated { before: Task },
    /// Several tasks were edited (bulk complete / set-priority)
    BulkMutated { before: Vec<Task> },
    /// Several tasks were removed (bulk delete)
    BulkRemoved { removed: Vec<(usize, Task)> },
    /// The whole list was replaced (import); undo restores the prior list
    Replaced { before: Vec<Task> },
}

/// Bounded stack of undo-able operations, persisted so undo works across
/// CLI invocations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UndoStack {
    ops: Vec<Operation>,
}

impl UndoStack {
    pub fn load(store: &Store) -> UndoStack {
        store.read(UNDO_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &Store) {
        store.write(UNDO_KEY, self);
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
        if self.ops.len() > UNDO_STACK_LIMIT {
            let excess = self.ops.len() - UNDO_STACK_LIMIT;
            self.ops.drain(..excess);
        }
    }

    pub fn pop(&mut self) -> Option<Operation> {
        self.ops.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Apply the inverse of a recorded operation. Returns a short description
/// of what was undone.
pub fn apply_undo(repo: &mut Repo, op: Operation) -> String {
    match op {
        Operation::Added { id } => {
            repo.discard(id);
            format!("removed task {id}")
        }
        Operation::Removed { index, task } => {
            let id = task.id;
            repo.restore_at(index, task);
            format!("restored task {id}")
        }
        Operation::Mutated { before } => {
            let id = before.id;
            repo.restore(before);
            format!("reverted task {id}")
        }
        Operation::BulkMutated { before } => {
            let n = before.len();
            for snapshot in before {
                repo.restore(snapshot);
            }
            format!("reverted {n} task(s)")
        }
        Operation::BulkRemoved { removed } => {
            let n = removed.len();
            // Reinsert lowest index first so later indices stay meaningful
            let mut removed = removed;
            removed.sort_by_key(|(idx, _)| *idx);
            for (idx, task) in removed {
                repo.restore_at(idx, task);
            }
            format!("restored {n} task(s)")
        }
        Operation::Replaced { before } => {
            let n = before.len();
            repo.replace_all(before);
            format!("restored the previous list of {n} task(s)")
        }
    }
}
