//! Filesystem change feed for a vault.
//!
//! Wraps a `notify` recommended watcher on the vault root and forwards the
//! vault-relative path of every created or modified note into an unbounded
//! channel, the feed consumed by [`crate::coordinator::ChangeCoordinator::run`].
//! Debouncing is left to the coordinator.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use eyre::{Result, WrapErr};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use syllabus_core::link::is_note_path;

/// Health of the watcher, shared with whoever wants to report on it.
#[derive(Debug, Default)]
pub struct WatcherState {
    active: AtomicBool,
    event_count: AtomicU64,
    error: RwLock<Option<String>>,
}

impl WatcherState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_active(&self) {
        self.active.store(true, Ordering::SeqCst);
        *self.error.write().unwrap() = None;
    }

    pub fn mark_failed(&self, error: String) {
        self.active.store(false, Ordering::SeqCst);
        *self.error.write().unwrap() = Some(error);
    }

    pub fn record_event(&self) {
        self.event_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Notes forwarded so far.
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().unwrap().clone()
    }
}

/// A running watcher. Dropping it stops the watch and closes the feed.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    state: Arc<WatcherState>,
}

impl VaultWatcher {
    /// Watch `vault_root` recursively and return the watcher with its feed.
    pub fn start(vault_root: &Path) -> Result<(Self, mpsc::UnboundedReceiver<PathBuf>)> {
        let root = vault_root
            .canonicalize()
            .wrap_err_with(|| format!("Failed to resolve vault root {}", vault_root.display()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let state = WatcherState::new();

        let handler_state = Arc::clone(&state);
        let handler_root = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for path in changed_notes(&handler_root, &event) {
                        handler_state.record_event();
                        debug!("Changed: {}", path.display());
                        if tx.send(path).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("Watch error: {}", e);
                    handler_state.mark_failed(e.to_string());
                }
            }
        })
        .wrap_err("Failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .wrap_err_with(|| format!("Failed to watch {}", root.display()))?;
        state.mark_active();
        info!("Watching {}", root.display());

        Ok((
            Self {
                _watcher: watcher,
                state,
            },
            rx,
        ))
    }

    pub fn state(&self) -> &Arc<WatcherState> {
        &self.state
    }
}

/// Vault-relative note paths touched by a create or modify event.
pub fn changed_notes(root: &Path, event: &Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter_map(|path| relative_note(root, path))
        .collect()
}

/// `path` relative to `root`, if it is a note outside hidden directories.
fn relative_note(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    let hidden = relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden || !is_note_path(relative) {
        return None;
    }
    Some(relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_forwards_notes_relative_to_root() {
        let root = Path::new("/vault");
        let ev = event(
            EventKind::Modify(ModifyKind::Any),
            &["/vault/Rust.md", "/vault/topics/Ownership.md", "/vault/image.png"],
        );
        assert_eq!(
            changed_notes(root, &ev),
            vec![PathBuf::from("Rust.md"), PathBuf::from("topics/Ownership.md")]
        );
    }

    #[test]
    fn test_skips_hidden_dirs_and_removals() {
        let root = Path::new("/vault");
        let hidden = event(
            EventKind::Create(CreateKind::File),
            &["/vault/.obsidian/workspace.md", "/vault/.syllabus/x.md"],
        );
        assert!(changed_notes(root, &hidden).is_empty());

        let removed = event(EventKind::Remove(RemoveKind::File), &["/vault/Rust.md"]);
        assert!(changed_notes(root, &removed).is_empty());

        let outside = event(EventKind::Modify(ModifyKind::Any), &["/elsewhere/Rust.md"]);
        assert!(changed_notes(root, &outside).is_empty());
    }

    #[test]
    fn test_watcher_state_lifecycle() {
        let state = WatcherState::new();
        assert!(!state.is_active());
        assert_eq!(state.event_count(), 0);

        state.mark_active();
        state.record_event();
        assert!(state.is_active());
        assert_eq!(state.event_count(), 1);

        state.mark_failed("gone".to_string());
        assert!(!state.is_active());
        assert_eq!(state.error(), Some("gone".to_string()));

        state.mark_active();
        assert!(state.error().is_none());
    }
}
