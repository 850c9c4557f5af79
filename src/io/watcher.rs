use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the store watcher to whoever is listening.
#[derive(Debug)]
pub enum StoreEvent {
    /// One or more documents in the data directory changed on disk.
    Changed(Vec<PathBuf>),
}

/// Filesystem watcher over the data directory.
///
/// Replaces polling for noticing edits made by another process (a second
/// CLI invocation or a hand-edited file): the OS notifies us on change.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<StoreEvent>,
}

impl StoreWatcher {
    /// Start watching the given data directory.
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let data_dir_owned = data_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let relevant: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| {
                        if !p.starts_with(&data_dir_owned) {
                            return false;
                        }
                        // Skip the lock file and in-flight temp files
                        if let Some(name) = p.file_name().and_then(|n| n.to_str())
                            && (name == ".lock" || name.starts_with(".tmp"))
                        {
                            return false;
                        }
                        matches!(
                            p.extension().and_then(|e| e.to_str()),
                            Some("json") | Some("toml")
                        )
                    })
                    .collect();

                if !relevant.is_empty() {
                    let _ = tx.send(StoreEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending change events.
    pub fn poll(&self) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
