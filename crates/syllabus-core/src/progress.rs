//! Completion aggregation and the rendered progress regions.

use std::path::PathBuf;

/// Width of the ASCII progress bar, in cells.
pub const BAR_WIDTH: usize = 20;

/// What a declared subtopic reference resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// No note exists at the resolved path.
    Missing,
    /// The note exists; `completed` is its front matter flag.
    Present {
        completed: bool,
        completion_date: Option<String>,
    },
}

/// One declared subtopic of a topic, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicSlot {
    /// The reference exactly as declared (unquoted), e.g. `[[Borrowing]]`.
    pub reference: String,
    /// Bare note name the reference points at.
    pub name: String,
    /// Vault-relative path the name resolves to.
    pub path: PathBuf,
    pub state: SlotState,
}

impl SubtopicSlot {
    pub fn is_missing(&self) -> bool {
        matches!(self.state, SlotState::Missing)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SlotState::Present { completed: true, .. })
    }

    pub fn completion_date(&self) -> Option<&str> {
        match &self.state {
            SlotState::Present {
                completion_date, ..
            } => completion_date.as_deref(),
            SlotState::Missing => None,
        }
    }
}

/// Derived completion figures of a topic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub completed: usize,
    /// Every declared slot, missing ones included.
    pub total: usize,
    /// `completed / total`, or `0` without subtopics.
    pub progress: f64,
}

impl Aggregate {
    /// Progress as a whole percentage, rounded to nearest.
    pub fn percent(&self) -> u32 {
        percent(self.progress)
    }
}

/// Count completed slots against all declared slots.
///
/// Missing slots count toward the total but never as completed.
pub fn aggregate(slots: &[SubtopicSlot]) -> Aggregate {
    let total = slots.len();
    let completed = slots.iter().filter(|s| s.is_completed()).count();
    let progress = if total > 0 {
        completed as f64 / total as f64
    } else {
        0.0
    };
    Aggregate {
        completed,
        total,
        progress,
    }
}

pub fn percent(progress: f64) -> u32 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Front matter representation of a progress ratio.
pub fn format_progress(progress: f64) -> String {
    format!("{:.2}", progress.clamp(0.0, 1.0))
}

/// `[#####---------------]` with `BAR_WIDTH` cells.
pub fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Content of the `## Progress` section.
pub fn render_progress(aggregate: &Aggregate) -> String {
    format!(
        "{}% complete\n{} {}/{}",
        aggregate.percent(),
        progress_bar(aggregate.progress),
        aggregate.completed,
        aggregate.total
    )
}

/// Content of the `## Subtopics` section: one checkbox line per slot.
pub fn render_subtopic_list(slots: &[SubtopicSlot]) -> String {
    if slots.is_empty() {
        return "_No subtopics yet._".to_string();
    }
    slots
        .iter()
        .map(|slot| {
            let glyph = if slot.is_completed() { "[x]" } else { "[ ]" };
            let missing = if slot.is_missing() { " (missing)" } else { "" };
            format!("- {glyph} [[{}]]{missing}", slot.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Glyph and label of a subtopic status line.
pub fn status_label(completed: bool) -> &'static str {
    if completed {
        "✅ Completed"
    } else {
        "⬜ Not completed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, state: SlotState) -> SubtopicSlot {
        SubtopicSlot {
            reference: format!("[[{name}]]"),
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.md")),
            state,
        }
    }

    fn present(completed: bool) -> SlotState {
        SlotState::Present {
            completed,
            completion_date: None,
        }
    }

    #[test]
    fn test_aggregate_counts_missing_in_total_only() {
        let slots = vec![slot("A", present(true)), slot("Gone", SlotState::Missing)];
        let agg = aggregate(&slots);
        assert_eq!(agg.total, 2);
        assert_eq!(agg.completed, 1);
        assert_eq!(agg.progress, 0.5);
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = aggregate(&[]);
        assert_eq!((agg.completed, agg.total), (0, 0));
        assert_eq!(agg.progress, 0.0);
    }

    #[test]
    fn test_render_progress() {
        let agg = Aggregate {
            completed: 1,
            total: 2,
            progress: 0.5,
        };
        assert_eq!(
            render_progress(&agg),
            "50% complete\n[##########----------] 1/2"
        );
        assert_eq!(format_progress(agg.progress), "0.50");
        assert_eq!(percent(2.0 / 3.0), 67);
        assert_eq!(progress_bar(1.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_render_subtopic_list() {
        let slots = vec![
            slot("A", present(true)),
            slot("B", present(false)),
            slot("C", SlotState::Missing),
        ];
        assert_eq!(
            render_subtopic_list(&slots),
            "- [x] [[A]]\n- [ ] [[B]]\n- [ ] [[C]] (missing)"
        );
        assert_eq!(render_subtopic_list(&[]), "_No subtopics yet._");
    }
}
