//! Mutation operations: the only code that rewrites notes.
//!
//! Each public operation takes the engine's [`UpdateGuard`] for its whole
//! duration and declines with [`SkipReason::Busy`] when the guard is already
//! held. Work nested inside one logical update (a toggle recomputing its
//! parent, a coordinator drain recomputing topics) is handed the held
//! [`UpdateToken`] instead of acquiring again.
//!
//! Writes only happen when the new text differs from the old, so recomputing
//! a topic whose subtopics did not change is a no-op. That is what stops the
//! change notification caused by a write from producing another write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Result, WrapErr, bail};
use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, warn};

use syllabus_core::frontmatter::{read_front_matter, write_front_matter};
use syllabus_core::link::{link_target, note_name, wiki_link};
use syllabus_core::note::keys;
use syllabus_core::progress::{format_progress, render_progress, render_subtopic_list};
use syllabus_core::sections::{PROGRESS_HEADING, SUBTOPICS_HEADING, write_section, write_status_line};
use syllabus_core::template::{subtopic_template, topic_template, validate_note_name};
use syllabus_core::{Aggregate, NoteKind, SubtopicFields, TopicFields, aggregate};

use crate::config::Config;
use crate::guard::{UpdateGuard, UpdateToken};
use crate::index::MetadataIndex;
use crate::notice::{LogNotifier, Notifier};
use crate::resolve::Resolver;
use crate::store::DocumentStore;

/// Why an operation declined to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another logical update holds the guard.
    Busy,
    /// The target note does not exist.
    NotFound,
    NotATopic,
    NotASubtopic,
    /// The topic declares no subtopics, so there is nothing to derive.
    NoSubtopics,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecomputeOutcome {
    /// The topic was rewritten.
    Updated(Aggregate),
    /// The topic already reflected its subtopics; nothing was written.
    Unchanged(Aggregate),
    Skipped(SkipReason),
}

impl RecomputeOutcome {
    pub fn aggregate(&self) -> Option<Aggregate> {
        match self {
            Self::Updated(agg) | Self::Unchanged(agg) => Some(*agg),
            Self::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToggleOutcome {
    Toggled {
        /// New value of the subtopic's `completed` flag.
        completed: bool,
        /// Result of recomputing the parent, if the parent resolved.
        parent: Option<RecomputeOutcome>,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The topic was updated. `list_updated` is false when its `subtopics`
    /// value is in an unrecognized form and the append was skipped.
    Attached { list_updated: bool },
    AlreadyAttached,
    Skipped(SkipReason),
}

type Clock = Arc<dyn Fn() -> Date + Send + Sync>;

/// Keeps topic notes consistent with the completion state of their
/// subtopics.
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    index: Arc<MetadataIndex>,
    resolver: Resolver,
    guard: UpdateGuard,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        let index = Arc::new(MetadataIndex::new(Arc::clone(&store)));
        let resolver = Resolver::new(Arc::clone(&store), Arc::clone(&index), config.notes_dir());
        Self {
            store,
            index,
            resolver,
            guard: UpdateGuard::new(),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(|| OffsetDateTime::now_utc().date()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the source of "today" used for completion dates.
    pub fn with_clock(mut self, clock: impl Fn() -> Date + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    /// Path of a note given its name or vault-relative path.
    pub fn locate(&self, name_or_path: &str) -> PathBuf {
        self.resolver.locate(name_or_path)
    }

    fn today(&self) -> String {
        format_date((self.clock)())
    }

    /// Write `new` over `old` unless they are identical. Returns whether a
    /// write happened.
    async fn write_if_changed(&self, path: &Path, old: &str, new: &str) -> Result<bool> {
        if old == new {
            debug!("{} already up to date", path.display());
            return Ok(false);
        }
        let result = self.store.write(path, new).await;
        self.index.invalidate(path);
        result.wrap_err_with(|| format!("Failed to update {}", path.display()))?;
        debug!("Rewrote {}", path.display());
        Ok(true)
    }

    /// Recompute a topic's derived fields and rendered sections.
    ///
    /// Declines when another update is running or the note is not a topic
    /// with at least one declared subtopic.
    pub async fn recompute_topic_progress(&self, topic: &Path) -> Result<RecomputeOutcome> {
        let Some(token) = self.guard.try_acquire() else {
            debug!("Update in progress, skipping recompute of {}", topic.display());
            return Ok(RecomputeOutcome::Skipped(SkipReason::Busy));
        };
        self.recompute_with(&token, topic)
            .await
            .inspect_err(|e| error!("Recompute of {} failed: {:#}", topic.display(), e))
    }

    /// Recompute under a guard that the caller already holds.
    pub(crate) async fn recompute_with(
        &self,
        _token: &UpdateToken<'_>,
        topic: &Path,
    ) -> Result<RecomputeOutcome> {
        if !self.store.exists(topic).await {
            return Ok(RecomputeOutcome::Skipped(SkipReason::NotFound));
        }
        let text = self.store.read(topic).await?;

        let Some(mut front_matter) = read_front_matter(&text) else {
            return Ok(RecomputeOutcome::Skipped(SkipReason::NotATopic));
        };
        if NoteKind::of(&front_matter) != Some(NoteKind::Topic) {
            return Ok(RecomputeOutcome::Skipped(SkipReason::NotATopic));
        }

        let fields = TopicFields::from_front_matter(&front_matter);
        if fields.subtopics.is_empty() {
            return Ok(RecomputeOutcome::Skipped(SkipReason::NoSubtopics));
        }

        let slots = self.resolver.resolve_subtopics(&fields.subtopics).await;
        let agg = aggregate(&slots);

        front_matter.set(keys::PROGRESS, &format_progress(agg.progress));
        front_matter.set(keys::COMPLETED_SUBTOPICS, &agg.completed.to_string());
        front_matter.set(keys::TOTAL_SUBTOPICS, &agg.total.to_string());

        let updated = write_front_matter(&text, &front_matter);
        let updated = write_section(&updated, PROGRESS_HEADING, &render_progress(&agg));
        let updated = write_section(&updated, SUBTOPICS_HEADING, &render_subtopic_list(&slots));

        if self.write_if_changed(topic, &text, &updated).await? {
            info!(
                "{}: {}/{} subtopics complete",
                topic.display(),
                agg.completed,
                agg.total
            );
            Ok(RecomputeOutcome::Updated(agg))
        } else {
            Ok(RecomputeOutcome::Unchanged(agg))
        }
    }

    /// Flip a subtopic's completion flag, then recompute its parent topic.
    ///
    /// `completion_date` is stamped on the transition to completed and left
    /// alone on the way back.
    pub async fn toggle_subtopic_completion(&self, subtopic: &Path) -> Result<ToggleOutcome> {
        let Some(token) = self.guard.try_acquire() else {
            self.notifier
                .notice("Another update is in progress, try again in a moment");
            return Ok(ToggleOutcome::Skipped(SkipReason::Busy));
        };

        self.toggle_with(&token, subtopic).await.inspect_err(|e| {
            error!("Toggle of {} failed: {:#}", subtopic.display(), e);
            self.notifier
                .notice(&format!("Failed to update {}: {}", note_name(subtopic), e));
        })
    }

    async fn toggle_with(&self, token: &UpdateToken<'_>, subtopic: &Path) -> Result<ToggleOutcome> {
        let name = note_name(subtopic);
        if !self.store.exists(subtopic).await {
            self.notifier.notice(&format!("Subtopic {name} not found"));
            return Ok(ToggleOutcome::Skipped(SkipReason::NotFound));
        }
        let text = self.store.read(subtopic).await?;

        let Some(mut front_matter) = read_front_matter(&text)
            .filter(|fm| NoteKind::of(fm) == Some(NoteKind::Subtopic))
        else {
            self.notifier.notice(&format!("{name} is not a subtopic"));
            return Ok(ToggleOutcome::Skipped(SkipReason::NotASubtopic));
        };

        let fields = SubtopicFields::from_front_matter(&front_matter);
        let completed = !fields.completed;
        front_matter.set(keys::COMPLETED, if completed { "true" } else { "false" });
        if completed {
            front_matter.set(keys::COMPLETION_DATE, &self.today());
        }

        let updated = write_status_line(&write_front_matter(&text, &front_matter), completed);
        self.write_if_changed(subtopic, &text, &updated).await?;

        let parent = match self.resolver.resolve_parent(fields.parent.as_deref()).await {
            Some(parent) => Some(self.recompute_with(token, &parent).await?),
            None => {
                if fields.parent.is_some() {
                    warn!("Parent of {} does not resolve", subtopic.display());
                }
                None
            }
        };

        self.notifier.notice(&format!(
            "{name} marked as {}",
            if completed { "completed" } else { "not completed" }
        ));
        Ok(ToggleOutcome::Toggled { completed, parent })
    }

    /// Add `subtopic` to the `subtopics` list of the topic named `topic` and
    /// re-render its Subtopics section. Attaching twice is a no-op.
    ///
    /// `subtopic` may be a bare name or a `[[Name]]` link; either way the
    /// list gains `[[Name]]`. Names that cannot round-trip through a link
    /// are rejected before the topic is touched.
    pub async fn attach_subtopic_to_parent(
        &self,
        topic: &str,
        subtopic: &str,
    ) -> Result<AttachOutcome> {
        let Some(token) = self.guard.try_acquire() else {
            self.notifier
                .notice("Another update is in progress, try again in a moment");
            return Ok(AttachOutcome::Skipped(SkipReason::Busy));
        };

        self.attach_with(&token, topic, subtopic)
            .await
            .inspect_err(|e| {
                error!("Attaching {subtopic} to {topic} failed: {:#}", e);
                self.notifier
                    .notice(&format!("Failed to attach {subtopic} to {topic}: {e}"));
            })
    }

    async fn attach_with(
        &self,
        _token: &UpdateToken<'_>,
        topic: &str,
        subtopic: &str,
    ) -> Result<AttachOutcome> {
        let subtopic = link_target(subtopic).unwrap_or(subtopic);
        validate_note_name(subtopic)?;

        let path = self.locate(topic);
        if !self.store.exists(&path).await {
            self.notifier
                .notice(&format!("Parent topic {topic} not found"));
            return Ok(AttachOutcome::Skipped(SkipReason::NotFound));
        }
        let text = self.store.read(&path).await?;

        let Some(mut front_matter) =
            read_front_matter(&text).filter(|fm| NoteKind::of(fm) == Some(NoteKind::Topic))
        else {
            self.notifier.notice(&format!("{topic} is not a topic"));
            return Ok(AttachOutcome::Skipped(SkipReason::NotATopic));
        };

        let fields = TopicFields::from_front_matter(&front_matter);
        if fields
            .subtopics
            .iter()
            .any(|reference| link_target(reference) == Some(subtopic))
        {
            debug!("{subtopic} already attached to {}", path.display());
            return Ok(AttachOutcome::AlreadyAttached);
        }

        let reference = wiki_link(subtopic);
        let mut references = fields.subtopics.clone();
        let list_updated = front_matter.push_list_item(keys::SUBTOPICS, &reference);
        if list_updated {
            references.push(reference);
            front_matter.set(
                keys::TOTAL_SUBTOPICS,
                &(fields.total_subtopics + 1).to_string(),
            );
        } else {
            warn!(
                "Subtopics of {} are in an unrecognized form, leaving the list untouched",
                path.display()
            );
        }

        let slots = self.resolver.resolve_subtopics(&references).await;
        let updated = write_front_matter(&text, &front_matter);
        let updated = write_section(&updated, SUBTOPICS_HEADING, &render_subtopic_list(&slots));
        self.write_if_changed(&path, &text, &updated).await?;

        self.notifier
            .notice(&format!("Attached {subtopic} to {}", note_name(&path)));
        Ok(AttachOutcome::Attached { list_updated })
    }

    /// Create a topic note from the template. Refuses to overwrite.
    pub async fn create_topic(&self, name: &str) -> Result<PathBuf> {
        let text = topic_template(name)?;
        let path = self.locate(name);
        if self.store.exists(&path).await {
            bail!("{} already exists", path.display());
        }
        self.store.write(&path, &text).await?;
        self.index.invalidate(&path);
        self.notifier.notice(&format!("Created topic {name}"));
        Ok(path)
    }

    /// Create a subtopic note owned by `topic` and attach it there.
    pub async fn create_subtopic(&self, topic: &str, name: &str) -> Result<(PathBuf, AttachOutcome)> {
        let parent_name = link_target(topic).unwrap_or(topic).to_string();
        let text = subtopic_template(name, &parent_name)?;
        let path = self.locate(name);
        if self.store.exists(&path).await {
            bail!("{} already exists", path.display());
        }
        self.store.write(&path, &text).await?;
        self.index.invalidate(&path);
        self.notifier.notice(&format!("Created subtopic {name}"));

        let outcome = self.attach_subtopic_to_parent(&parent_name, name).await?;
        Ok((path, outcome))
    }
}

/// `YYYY-MM-DD`
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_format_date() {
        let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
        assert_eq!(format_date(date), "2024-03-07");
    }
}
