//! Resolution of declared subtopic and parent links to notes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use syllabus_core::link::{is_vault_relative, link_target, note_path};
use syllabus_core::{SlotState, SubtopicFields, SubtopicSlot};

use crate::index::MetadataIndex;
use crate::store::DocumentStore;

/// Turns link references into vault paths and looks them up.
pub struct Resolver {
    store: Arc<dyn DocumentStore>,
    index: Arc<MetadataIndex>,
    notes_dir: PathBuf,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<MetadataIndex>,
        notes_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            index,
            notes_dir: notes_dir.into(),
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Path a reference points at, whether or not the note exists.
    ///
    /// `None` when the reference has no target or its target would leave
    /// the vault (`[[../Elsewhere]]`, `[[/abs/path]]`).
    pub fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let path = note_path(&self.notes_dir, link_target(reference)?);
        if is_vault_relative(&path) {
            Some(path)
        } else {
            debug!("Reference {reference:?} points outside the vault");
            None
        }
    }

    /// Path of a note given either its name or its vault-relative path.
    pub fn locate(&self, name_or_path: &str) -> PathBuf {
        let is_link = name_or_path.trim_start_matches(['"', '\'']).starts_with("[[");
        let looks_like_path = name_or_path.contains(['/', '\\']) || name_or_path.ends_with(".md");
        if looks_like_path && !is_link {
            PathBuf::from(name_or_path)
        } else {
            self.path_for(name_or_path)
                .unwrap_or_else(|| PathBuf::from(name_or_path))
        }
    }

    /// Resolve every declared reference, in order.
    ///
    /// Nothing is dropped: a reference without a note (or without a usable
    /// target inside the vault) yields a [`SlotState::Missing`] slot.
    pub async fn resolve_subtopics(&self, references: &[String]) -> Vec<SubtopicSlot> {
        let mut slots = Vec::with_capacity(references.len());

        for reference in references {
            let name = link_target(reference).unwrap_or(reference.as_str());
            let Some(path) = self.path_for(reference) else {
                debug!("Unusable subtopic reference {reference:?}");
                slots.push(SubtopicSlot {
                    reference: reference.clone(),
                    name: name.to_string(),
                    path: PathBuf::new(),
                    state: SlotState::Missing,
                });
                continue;
            };

            let state = if self.store.exists(&path).await {
                let fields = self
                    .index
                    .front_matter(&path)
                    .await
                    .map(|fm| SubtopicFields::from_front_matter(&fm));
                SlotState::Present {
                    completed: fields.as_ref().is_some_and(|f| f.completed),
                    completion_date: fields.and_then(|f| f.completion_date),
                }
            } else {
                debug!("Subtopic {} not found at {}", name, path.display());
                SlotState::Missing
            };

            slots.push(SubtopicSlot {
                reference: reference.clone(),
                name: name.to_string(),
                path,
                state,
            });
        }

        slots
    }

    /// Path of the parent topic named by a subtopic's `parent` field, if it
    /// exists.
    pub async fn resolve_parent(&self, parent: Option<&str>) -> Option<PathBuf> {
        let path = self.path_for(parent?)?;
        if self.store.exists(&path).await {
            Some(path)
        } else {
            debug!("Parent topic not found at {}", path.display());
            None
        }
    }
}
