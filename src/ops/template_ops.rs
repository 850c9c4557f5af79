use crate::io::store::Store;
use crate::model::task::Task;
use crate::model::template::Template;
use crate::ops::repo::Repo;

/// The persisted template list, loaded and saved as a unit.
#[derive(Debug, Default)]
pub struct Templates {
    items: Vec<Template>,
}

impl Templates {
    pub fn load(store: &Store) -> Templates {
        Templates {
            items: store.load_templates(),
        }
    }

    pub fn items(&self) -> &[Template] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&Template> {
        self.items.iter().find(|t| t.id == id)
    }

    fn next_id(&self) -> u64 {
        self.items.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Snapshot a task into the template list and persist it.
    pub fn save_from_task(&mut self, store: &Store, task: &Task) -> u64 {
        let id = self.next_id();
        self.items.push(Template::from_task(id, task));
        store.save_templates(&self.items);
        id
    }

    /// Remove a template. Returns false when the id is unknown.
    pub fn remove(&mut self, store: &Store, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        let changed = self.items.len() != before;
        if changed {
            store.save_templates(&self.items);
        }
        changed
    }
}

/// Instantiate a new task from a template into the repository.
/// Returns the new task's id, or `None` when the template id is unknown.
pub fn use_template(repo: &mut Repo, templates: &Templates, template_id: u64) -> Option<u64> {
    let template = templates.get(template_id)?.clone();
    Some(repo.instantiate_template(&template))
}
