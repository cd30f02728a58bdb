//! Change coordinator: turns a stream of change notifications into
//! debounced recompute passes.
//!
//! Notifications are collected in an insertion-ordered set, so a burst of
//! edits to one note collapses into a single entry, and each new
//! notification pushes the deadline back by the debounce period. When the
//! deadline passes, [`ChangeCoordinator::flush`] takes the engine's guard and
//! recomputes every affected topic once, strictly one after another.
//!
//! Writes made during a pass come back as notifications. They wait in the
//! feed until the pass ends and then form the next pass, which finds the
//! topics already up to date and writes nothing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexmap::IndexSet;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use syllabus_core::link::is_note_path;
use syllabus_core::{NoteKind, SubtopicFields};

use crate::engine::{Engine, RecomputeOutcome};

#[derive(Debug, Default)]
struct PendingQueue {
    paths: IndexSet<PathBuf>,
    deadline: Option<Instant>,
}

/// What one drain pass did.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Queued paths looked at.
    pub processed: usize,
    /// Topics recomputed, in order, with their outcome.
    pub recomputed: Vec<(PathBuf, RecomputeOutcome)>,
    /// Paths that were neither a topic nor a subtopic with a resolvable
    /// parent, or whose topic was already handled in this pass.
    pub skipped: Vec<PathBuf>,
    /// Topics whose recompute failed, with the error.
    pub failed: Vec<(PathBuf, String)>,
    /// The guard was held; nothing ran and the queue was kept for later.
    pub deferred: bool,
}

impl DrainReport {
    /// Topics actually rewritten by this pass.
    pub fn updated(&self) -> impl Iterator<Item = &Path> {
        self.recomputed
            .iter()
            .filter(|(_, outcome)| matches!(outcome, RecomputeOutcome::Updated(_)))
            .map(|(path, _)| path.as_path())
    }
}

pub struct ChangeCoordinator {
    engine: Arc<Engine>,
    debounce: Duration,
    pending: Mutex<PendingQueue>,
    passes: AtomicU64,
}

impl ChangeCoordinator {
    pub fn new(engine: Arc<Engine>, debounce: Duration) -> Self {
        Self {
            engine,
            debounce,
            pending: Mutex::new(PendingQueue::default()),
            passes: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Queue a changed note and re-arm the deadline. Returns false for paths
    /// that are not notes.
    pub fn enqueue(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if !is_note_path(&path) {
            return false;
        }
        self.engine.index().invalidate(&path);

        let mut pending = self.pending.lock().unwrap();
        pending.deadline = Some(Instant::now() + self.debounce);
        if pending.paths.insert(path.clone()) {
            debug!("Queued {}", path.display());
        }
        true
    }

    /// Queue every note in the store.
    pub async fn enqueue_all(&self) -> eyre::Result<usize> {
        let notes = self.engine.store().list().await?;
        let count = notes.len();
        for note in notes {
            self.enqueue(note);
        }
        info!("Queued {} notes for a full resync", count);
        Ok(count)
    }

    /// Paths waiting for the next pass, in arrival order.
    pub fn pending(&self) -> Vec<PathBuf> {
        self.pending.lock().unwrap().paths.iter().cloned().collect()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.lock().unwrap().deadline
    }

    /// Number of passes that ran (deferred ones excluded).
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Drain the queue now.
    ///
    /// Per-path failures are recorded in the report and do not stop the pass.
    /// If another update holds the guard, the queue is left as is and the
    /// deadline re-armed.
    pub async fn flush(&self) -> DrainReport {
        let mut report = DrainReport::default();

        let Some(token) = self.engine.guard().try_acquire() else {
            let mut pending = self.pending.lock().unwrap();
            if !pending.paths.is_empty() {
                debug!(
                    "Update in progress, deferring {} queued notes",
                    pending.paths.len()
                );
                pending.deadline = Some(Instant::now() + self.debounce);
            }
            report.deferred = true;
            return report;
        };

        let paths = {
            let mut pending = self.pending.lock().unwrap();
            pending.deadline = None;
            std::mem::take(&mut pending.paths)
        };
        if paths.is_empty() {
            return report;
        }
        self.passes.fetch_add(1, Ordering::SeqCst);
        debug!("Draining {} queued notes", paths.len());

        let mut seen_topics = HashSet::new();
        for path in paths {
            report.processed += 1;

            let Some(topic) = self.topic_for(&path).await else {
                report.skipped.push(path);
                continue;
            };
            if !seen_topics.insert(topic.clone()) {
                report.skipped.push(path);
                continue;
            }

            match self.engine.recompute_with(&token, &topic).await {
                Ok(outcome) => report.recomputed.push((topic, outcome)),
                Err(e) => {
                    warn!("Recompute of {} failed: {:#}", topic.display(), e);
                    report.failed.push((topic, format!("{e:#}")));
                }
            }
        }

        if !report.failed.is_empty() || report.updated().next().is_some() {
            info!(
                "Pass done: {} updated, {} failed",
                report.updated().count(),
                report.failed.len()
            );
        }
        report
    }

    /// Topic a changed note affects: itself for a topic, its parent for a
    /// subtopic.
    async fn topic_for(&self, path: &Path) -> Option<PathBuf> {
        let front_matter = self.engine.index().front_matter(path).await?;
        match NoteKind::of(&front_matter)? {
            NoteKind::Topic => Some(path.to_path_buf()),
            NoteKind::Subtopic => {
                let fields = SubtopicFields::from_front_matter(&front_matter);
                self.engine
                    .resolver()
                    .resolve_parent(fields.parent.as_deref())
                    .await
            }
        }
    }

    /// Consume the change feed until it closes, draining whenever the queue
    /// has been quiet for the debounce period.
    pub async fn run(&self, mut feed: mpsc::UnboundedReceiver<PathBuf>) {
        loop {
            let deadline = self.deadline();
            tokio::select! {
                changed = feed.recv() => match changed {
                    Some(path) => {
                        self.enqueue(path);
                    }
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush().await;
                }
            }
        }

        if !self.pending().is_empty() {
            debug!("Change feed closed, draining what is left");
            self.flush().await;
        }
    }
}
