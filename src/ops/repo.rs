use chrono::{DateTime, Local};

use crate::io::store::Store;
use crate::model::task::{IdGen, Priority, Status, Subtask, Task};

/// Title given to a task whose edited title trims to empty
pub const UNTITLED: &str = "Untitled task";

/// Fields of a new task. Only the title is required.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Local>>,
    pub category: Option<String>,
}

/// Partial update applied to an existing task.
///
/// Outer `None` leaves the field alone; for the optional fields the inner
/// `None` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Local>>>,
    pub category: Option<Option<String>>,
}

/// The authoritative in-process copy of the task list.
///
/// Every mutation persists the full list through the store before returning.
/// Writes are cheap local files, so there is no batching.
#[derive(Debug)]
pub struct Repo {
    store: Store,
    tasks: Vec<Task>,
    ids: IdGen,
}

impl Repo {
    /// Load the task list from the store, falling back to the seed examples
    /// when the key is empty or unreadable.
    pub fn load(store: Store) -> Repo {
        let tasks = store.load_tasks().unwrap_or_else(seed_tasks);
        let ids = IdGen::seeded_from(&tasks);
        Repo { store, tasks, ids }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn persist(&self) {
        self.store.save_tasks(&self.tasks);
    }

    /// Create a task and append it to the list.
    /// Silent no-op (returns `None`) when the title trims to empty.
    pub fn add(&mut self, new: NewTask) -> Option<u64> {
        let title = new.title.trim();
        if title.is_empty() {
            return None;
        }
        let id = self.ids.next();
        let mut task = Task::new(id, title.to_string());
        task.description = new.description;
        if let Some(p) = new.priority {
            task.priority = p;
        }
        task.due_date = new.due_date;
        task.category = new.category;
        self.tasks.push(task);
        self.persist();
        Some(id)
    }

    /// Merge the given fields into the task with matching id.
    /// No-op if the id is not found. An empty title is coerced to a placeholder.
    pub fn update(&mut self, id: u64, patch: TaskPatch) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if let Some(title) = patch.title {
            let title = title.trim();
            task.title = if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title.to_string()
            };
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        self.persist();
    }

    /// Flip Pending <-> Completed, stamping or clearing `completed_at`.
    pub fn toggle_status(&mut self, id: u64) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        match task.status {
            Status::Pending => {
                task.status = Status::Completed;
                task.completed_at = Some(Local::now());
            }
            Status::Completed => {
                task.status = Status::Pending;
                task.completed_at = None;
            }
        }
        self.persist();
    }

    /// One-way transition used by bulk complete: pending tasks are completed,
    /// completed tasks are left untouched. Returns true if the task changed.
    pub fn complete(&mut self, id: u64) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if task.status == Status::Completed {
            return false;
        }
        task.status = Status::Completed;
        task.completed_at = Some(Local::now());
        self.persist();
        true
    }

    pub fn set_priority(&mut self, id: u64, priority: Priority) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.priority = priority;
        self.persist();
        true
    }

    /// Delete the task and all of its subtasks together.
    /// Returns the removed task and its former index, for undo.
    pub fn remove(&mut self, id: u64) -> Option<(usize, Task)> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(idx);
        self.persist();
        Some((idx, task))
    }

    /// Move the dragged task so it sits immediately before the target task.
    /// No-op when the ids are equal or either id is unknown.
    pub fn reorder(&mut self, dragged_id: u64, target_id: u64) -> bool {
        if dragged_id == target_id {
            return false;
        }
        let Some(from) = self.tasks.iter().position(|t| t.id == dragged_id) else {
            return false;
        };
        if !self.tasks.iter().any(|t| t.id == target_id) {
            return false;
        }
        let task = self.tasks.remove(from);
        // Target index after the removal shift
        let to = self
            .tasks
            .iter()
            .position(|t| t.id == target_id)
            .expect("target still present");
        self.tasks.insert(to, task);
        self.persist();
        true
    }

    // --- Subtasks ---

    /// Add a subtask. Silent no-op on an unknown task id or blank title.
    pub fn add_subtask(&mut self, task_id: u64, title: &str) -> Option<u64> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        // Reserve the id first so the borrow of tasks stays local
        if !self.tasks.iter().any(|t| t.id == task_id) {
            return None;
        }
        let sub_id = self.ids.next();
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .expect("task present");
        task.subtasks.push(Subtask {
            id: sub_id,
            title: title.to_string(),
            completed: false,
        });
        self.persist();
        Some(sub_id)
    }

    pub fn toggle_subtask(&mut self, task_id: u64, subtask_id: u64) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };
        let Some(sub) = task.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
            return false;
        };
        sub.completed = !sub.completed;
        self.persist();
        true
    }

    pub fn remove_subtask(&mut self, task_id: u64, subtask_id: u64) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask_id);
        let changed = task.subtasks.len() != before;
        if changed {
            self.persist();
        }
        changed
    }

    /// Stamp out a new task from a template, appending it to the list.
    pub fn instantiate_template(&mut self, template: &crate::model::template::Template) -> u64 {
        let task = template.instantiate(&mut self.ids);
        let id = task.id;
        self.tasks.push(task);
        self.persist();
        id
    }

    // --- Wholesale replacement & undo restore hooks ---

    /// Replace the entire list (import). Reseeds the id generator.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.ids = IdGen::seeded_from(&tasks);
        self.tasks = tasks;
        self.persist();
    }

    /// Reinsert a previously removed task at its former index (clamped).
    pub fn restore_at(&mut self, index: usize, task: Task) {
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        self.persist();
    }

    /// Overwrite the task with the same id with the given snapshot.
    pub fn restore(&mut self, snapshot: Task) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == snapshot.id) {
            *task = snapshot;
            self.persist();
        }
    }

    /// Remove a task without yielding it (undo of an add).
    pub fn discard(&mut self, id: u64) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() != before {
            self.persist();
        }
    }
}

/// The two example tasks shown on first run (or when storage is unreadable).
pub fn seed_tasks() -> Vec<Task> {
    let mut welcome = Task::new(1, "Welcome to taskpad".to_string());
    welcome.description = Some("Add your first task with `tp add`".to_string());
    welcome.priority = Priority::High;
    welcome.category = Some("getting-started".to_string());

    let mut chat = Task::new(2, "Try the chat helper".to_string());
    chat.description = Some("Run `tp chat \"what can you do?\"`".to_string());
    chat.category = Some("getting-started".to_string());

    vec![welcome, chat]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repo) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.save_tasks(&[]);
        (dir, Repo::load(store))
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_store_falls_back_to_seeds() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let repo = Repo::load(store);
        assert_eq!(repo.tasks().len(), 2);
        assert_eq!(repo.tasks()[0].title, "Welcome to taskpad");
    }

    #[test]
    fn add_with_defaults() {
        let (_dir, mut repo) = repo();
        let id = repo.add(titled("Study DSA")).unwrap();
        let task = repo.task(id).unwrap();
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.subtasks.is_empty());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn add_blank_title_is_silent_noop() {
        let (_dir, mut repo) = repo();
        assert_eq!(repo.add(titled("   ")), None);
        assert!(repo.tasks().is_empty());
    }

    #[test]
    fn every_mutation_persists() {
        let (_dir, mut repo) = repo();
        let id = repo.add(titled("persist")).unwrap();
        let on_disk = repo.store.load_tasks().unwrap();
        assert_eq!(on_disk, repo.tasks());

        repo.toggle_status(id);
        let on_disk = repo.store.load_tasks().unwrap();
        assert_eq!(on_disk, repo.tasks());
    }

    #[test]
    fn toggle_twice_round_trips_status_and_stamp() {
        let (_dir, mut repo) = repo();
        let id = repo.add(titled("toggle me")).unwrap();

        repo.toggle_status(id);
        let task = repo.task(id).unwrap();
        assert_eq!(task.status, Status::Completed);
        assert!(task.completed_at.is_some());

        repo.toggle_status(id);
        let task = repo.task(id).unwrap();
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let (_dir, mut repo) = repo();
        let id = repo
            .add(NewTask {
                title: "original".into(),
                description: Some("keep me".into()),
                ..Default::default()
            })
            .unwrap();

        repo.update(id, TaskPatch {
            priority: Some(Priority::Urgent),
            ..Default::default()
        });
        let task = repo.task(id).unwrap();
        assert_eq!(task.title, "original");
        assert_eq!(task.description.as_deref(), Some("keep me"));
        assert_eq!(task.priority, Priority::Urgent);
    }

    #[test]
    fn update_empty_title_coerces_to_placeholder() {
        let (_dir, mut repo) = repo();
        let id = repo.add(titled("had a title")).unwrap();
        repo.update(id, TaskPatch {
            title: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(repo.task(id).unwrap().title, UNTITLED);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let (_dir, mut repo) = repo();
        repo.add(titled("a"));
        let before = repo.tasks().to_vec();
        repo.update(999, TaskPatch {
            title: Some("x".into()),
            ..Default::default()
        });
        assert_eq!(repo.tasks(), before.as_slice());
    }

    #[test]
    fn remove_cascades_subtasks_and_spares_others() {
        let (_dir, mut repo) = repo();
        let a = repo.add(titled("a")).unwrap();
        let b = repo.add(titled("b")).unwrap();
        repo.add_subtask(a, "a sub").unwrap();
        let b_sub = repo.add_subtask(b, "b sub").unwrap();

        repo.remove(a);
        assert!(repo.task(a).is_none());
        let b_task = repo.task(b).unwrap();
        assert_eq!(b_task.subtasks.len(), 1);
        assert_eq!(b_task.subtasks[0].id, b_sub);
    }

    #[test]
    fn reorder_inserts_before_target() {
        let (_dir, mut repo) = repo();
        let a = repo.add(titled("a")).unwrap();
        let b = repo.add(titled("b")).unwrap();
        let c = repo.add(titled("c")).unwrap();

        assert!(repo.reorder(c, a));
        let order: Vec<u64> = repo.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn reorder_same_or_unknown_id_is_noop() {
        let (_dir, mut repo) = repo();
        let a = repo.add(titled("a")).unwrap();
        let b = repo.add(titled("b")).unwrap();
        assert!(!repo.reorder(a, a));
        assert!(!repo.reorder(a, 999));
        assert!(!repo.reorder(999, b));
        let order: Vec<u64> = repo.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn subtask_ops_scoped_by_both_ids() {
        let (_dir, mut repo) = repo();
        let a = repo.add(titled("a")).unwrap();
        let sub = repo.add_subtask(a, "step one").unwrap();

        assert!(!repo.toggle_subtask(999, sub));
        assert!(!repo.toggle_subtask(a, 999));
        assert!(repo.toggle_subtask(a, sub));
        assert!(repo.task(a).unwrap().subtasks[0].completed);

        assert!(!repo.remove_subtask(999, sub));
        assert!(repo.remove_subtask(a, sub));
        assert!(repo.task(a).unwrap().subtasks.is_empty());
    }

    #[test]
    fn ids_are_unique_across_tasks_and_subtasks() {
        let (_dir, mut repo) = repo();
        let a = repo.add(titled("a")).unwrap();
        let s1 = repo.add_subtask(a, "s1").unwrap();
        let b = repo.add(titled("b")).unwrap();
        let mut ids = vec![a, s1, b];
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn replace_all_reseeds_id_generator() {
        let (_dir, mut repo) = repo();
        let mut imported = vec![Task::new(41, "imported".into())];
        imported[0].subtasks.push(Subtask {
            id: 42,
            title: "sub".into(),
            completed: false,
        });
        repo.replace_all(imported);
        let next = repo.add(titled("after import")).unwrap();
        assert_eq!(next, 43);
    }
}
