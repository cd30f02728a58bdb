//! Markdown progress reports. Read-only: nothing here writes to the store.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use eyre::{Result, bail};

use syllabus_core::link::note_name;
use syllabus_core::progress::{percent, progress_bar, render_progress};
use syllabus_core::{Aggregate, NoteKind, SubtopicSlot, TopicFields, aggregate};

use crate::engine::Engine;

/// A topic with its resolved subtopics.
#[derive(Debug, Clone)]
pub struct TopicSummary {
    pub name: String,
    pub path: PathBuf,
    pub slots: Vec<SubtopicSlot>,
    pub aggregate: Aggregate,
}

/// Resolve the topic at `path`, or `None` if it is not a topic.
pub async fn summarize_topic(engine: &Engine, path: &Path) -> Option<TopicSummary> {
    let front_matter = engine.index().front_matter(path).await?;
    if NoteKind::of(&front_matter) != Some(NoteKind::Topic) {
        return None;
    }
    let fields = TopicFields::from_front_matter(&front_matter);
    let slots = engine.resolver().resolve_subtopics(&fields.subtopics).await;
    Some(TopicSummary {
        name: note_name(path),
        path: path.to_path_buf(),
        aggregate: aggregate(&slots),
        slots,
    })
}

/// Report for a single topic: title, progress, then one line per subtopic.
pub async fn topic_report(engine: &Engine, path: &Path) -> Result<String> {
    let Some(summary) = summarize_topic(engine, path).await else {
        bail!("{} is not a topic", path.display());
    };
    Ok(render_topic_report(&summary))
}

pub fn render_topic_report(summary: &TopicSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", summary.name);
    out.push('\n');
    out.push_str(&render_progress(&summary.aggregate));
    out.push('\n');

    if summary.slots.is_empty() {
        out.push_str("\n_No subtopics yet._\n");
        return out;
    }

    out.push('\n');
    for slot in &summary.slots {
        let glyph = if slot.is_completed() { "[x]" } else { "[ ]" };
        let _ = write!(out, "- {glyph} [[{}]]", slot.name);
        if slot.is_missing() {
            out.push_str(" (missing)");
        } else if let Some(date) = slot.completion_date().filter(|_| slot.is_completed()) {
            let _ = write!(out, " (completed {date})");
        }
        out.push('\n');
    }
    out
}

/// Report over every topic in the store, sorted by name.
pub async fn overall_report(engine: &Engine) -> Result<String> {
    let mut summaries = Vec::new();
    for path in engine.store().list().await? {
        if let Some(summary) = summarize_topic(engine, &path).await {
            summaries.push(summary);
        }
    }
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    Ok(render_overall_report(&summaries))
}

pub fn render_overall_report(summaries: &[TopicSummary]) -> String {
    let mut out = String::from("# Progress\n\n");
    if summaries.is_empty() {
        out.push_str("_No topics yet._\n");
        return out;
    }

    let name_width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut completed = 0;
    let mut total = 0;
    for summary in summaries {
        let agg = &summary.aggregate;
        completed += agg.completed;
        total += agg.total;
        let _ = writeln!(
            out,
            "- {:<name_width$} {} {:>3}% ({}/{})",
            summary.name,
            progress_bar(agg.progress),
            agg.percent(),
            agg.completed,
            agg.total
        );
    }

    let overall = if total > 0 {
        completed as f64 / total as f64
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "\nTotal: {completed}/{total} subtopics complete across {} topics ({}%)",
        summaries.len(),
        percent(overall)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus_core::SlotState;

    fn summary(name: &str, slots: Vec<SubtopicSlot>) -> TopicSummary {
        TopicSummary {
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.md")),
            aggregate: aggregate(&slots),
            slots,
        }
    }

    fn slot(name: &str, state: SlotState) -> SubtopicSlot {
        SubtopicSlot {
            reference: format!("[[{name}]]"),
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.md")),
            state,
        }
    }

    #[test]
    fn test_topic_report_lines() {
        let report = render_topic_report(&summary(
            "Rust",
            vec![
                slot(
                    "Ownership",
                    SlotState::Present {
                        completed: true,
                        completion_date: Some("2024-03-01".into()),
                    },
                ),
                slot(
                    "Lifetimes",
                    SlotState::Present {
                        completed: false,
                        completion_date: Some("2024-01-01".into()),
                    },
                ),
                slot("Macros", SlotState::Missing),
            ],
        ));
        assert!(report.starts_with("# Rust\n\n33% complete\n"));
        assert!(report.contains("- [x] [[Ownership]] (completed 2024-03-01)\n"));
        assert!(report.contains("- [ ] [[Lifetimes]]\n"));
        assert!(report.contains("- [ ] [[Macros]] (missing)\n"));
    }

    #[test]
    fn test_overall_report_totals() {
        let done = SlotState::Present {
            completed: true,
            completion_date: None,
        };
        let report = render_overall_report(&[
            summary("Go", vec![slot("A", done.clone())]),
            summary("Rust", vec![slot("B", done), slot("C", SlotState::Missing)]),
        ]);
        assert!(report.contains("100% (1/1)"));
        assert!(report.contains(" 50% (1/2)"));
        assert!(report.contains("Total: 2/3 subtopics complete across 2 topics (67%)"));
        assert_eq!(render_overall_report(&[]), "# Progress\n\n_No topics yet._\n");
    }
}
