//! Document stores: whole-text read and overwrite, addressed by
//! vault-relative path.
//!
//! The engine gets no transactions or locks from a store. Its consistency
//! comes from running one logical update at a time (see [`crate::guard`]).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail};
use tokio::sync::mpsc;
use tracing::debug;

use syllabus_core::link::{is_note_path, is_vault_relative};

/// Storage backend for notes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Full text of the note at `path`. Fails if it does not exist.
    async fn read(&self, path: &Path) -> Result<String>;

    /// Overwrite the note at `path` with `text`, creating it if needed.
    async fn write(&self, path: &Path, text: &str) -> Result<()>;

    async fn exists(&self, path: &Path) -> bool;

    /// Every note in the store, sorted.
    async fn list(&self) -> Result<Vec<PathBuf>>;
}

/// Notes on disk under a vault root.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &Path) -> Result<PathBuf> {
        if !is_vault_relative(path) {
            bail!("{} is outside the vault", path.display());
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read(&self, path: &Path) -> Result<String> {
        let full = self.full_path(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .wrap_err_with(|| format!("Failed to read {}", full.display()))
    }

    async fn write(&self, path: &Path, text: &str) -> Result<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&full, text)
            .await
            .wrap_err_with(|| format!("Failed to write {}", full.display()))
    }

    async fn exists(&self, path: &Path) -> bool {
        let Ok(full) = self.full_path(path) else {
            return false;
        };
        tokio::fs::try_exists(full).await.unwrap_or(false)
    }

    async fn list(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || walk_notes(&root))
            .await
            .wrap_err("Note listing task failed")?
    }
}

/// Walk `root` for notes, honoring .gitignore and skipping hidden
/// directories (`.git`, `.obsidian`, `.syllabus`).
fn walk_notes(root: &Path) -> Result<Vec<PathBuf>> {
    use ignore::WalkBuilder;

    let mut notes = Vec::new();
    let walker = WalkBuilder::new(root)
        .follow_links(true)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build();

    for entry in walker {
        let entry = entry.wrap_err_with(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_note_path(path) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            notes.push(relative.to_path_buf());
        }
    }

    notes.sort();
    debug!("Found {} notes under {}", notes.len(), root.display());
    Ok(notes)
}

/// In-memory store (useful for testing).
///
/// Counts writes per path, can be told to fail writes to chosen paths, and
/// can publish the path of every write on a change feed, the way a watched
/// vault would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<PathBuf, String>>,
    writes: Mutex<HashMap<PathBuf, usize>>,
    failing: Mutex<HashSet<PathBuf>>,
    feed: Mutex<Option<mpsc::UnboundedSender<PathBuf>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note without counting a write or notifying.
    pub fn with(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Seed or replace a note without counting a write or notifying.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.docs.lock().unwrap().insert(path.into(), text.into());
    }

    /// Simulate an edit made outside the engine: replace the text and
    /// publish a change notification.
    pub fn edit(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let path = path.into();
        self.insert(path.clone(), text);
        self.notify(&path);
    }

    /// Current text of a note.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.docs.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Number of successful writes to `path` through [`DocumentStore::write`].
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.writes
            .lock()
            .unwrap()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// Make every later write to `path` fail.
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    /// Start publishing written paths. Replaces any previous subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PathBuf> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.feed.lock().unwrap() = Some(tx);
        rx
    }

    /// Stop publishing; the subscriber's feed closes.
    pub fn unsubscribe(&self) {
        self.feed.lock().unwrap().take();
    }

    fn notify(&self, path: &Path) {
        if let Some(feed) = self.feed.lock().unwrap().as_ref() {
            let _ = feed.send(path.to_path_buf());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &Path) -> Result<String> {
        match self.get(path) {
            Some(text) => Ok(text),
            None => bail!("Note not found: {}", path.display()),
        }
    }

    async fn write(&self, path: &Path, text: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            bail!("Failed to write {}: write rejected", path.display());
        }
        self.insert(path, text);
        *self
            .writes
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.notify(path);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.docs.lock().unwrap().contains_key(path)
    }

    async fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .keys()
            .filter(|p| is_note_path(p))
            .cloned()
            .collect())
    }
}
