//! Parsed front matter per note, cached until the note changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use syllabus_core::{FrontMatter, NoteKind, read_front_matter};

use crate::store::DocumentStore;

/// Front matter lookup backed by a [`DocumentStore`].
///
/// Entries are dropped by [`MetadataIndex::invalidate`], which the engine
/// calls after its own writes and the coordinator calls for every change
/// notification. A note that cannot be read is never cached.
pub struct MetadataIndex {
    store: Arc<dyn DocumentStore>,
    cache: Mutex<HashMap<PathBuf, Option<FrontMatter>>>,
}

impl MetadataIndex {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Front matter of the note at `path`, or `None` if the note is missing
    /// or has no front matter block.
    pub async fn front_matter(&self, path: &Path) -> Option<FrontMatter> {
        let cached = self.cache.lock().unwrap().get(path).cloned();
        if let Some(cached) = cached {
            return cached;
        }

        let text = match self.store.read(path).await {
            Ok(text) => text,
            Err(e) => {
                debug!("No front matter for {}: {}", path.display(), e);
                return None;
            }
        };

        let parsed = read_front_matter(&text);
        self.cache
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), parsed.clone());
        parsed
    }

    /// Kind of the note at `path`; `None` for anything that is neither a
    /// topic nor a subtopic.
    pub async fn kind(&self, path: &Path) -> Option<NoteKind> {
        NoteKind::of(&self.front_matter(path).await?)
    }

    pub fn invalidate(&self, path: &Path) {
        self.cache.lock().unwrap().remove(path);
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap().clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}
