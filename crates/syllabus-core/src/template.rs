//! Templates for freshly created notes.
//!
//! New notes start with every derived field at its default and with the
//! regions the engine rewrites already in place, since sections are only
//! ever updated and never created.

use eyre::{Result, bail};

use crate::frontmatter::quote;
use crate::link::wiki_link;
use crate::note::keys;
use crate::progress::{Aggregate, format_progress, render_progress, render_subtopic_list, status_label};
use crate::sections::{PROGRESS_HEADING, STATUS_PREFIX, SUBTOPICS_HEADING, write_section};

/// Reject names that cannot round-trip through a wiki link or a quoted
/// front matter value.
pub fn validate_note_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("note name is empty");
    }
    if trimmed != name {
        bail!("note name {name:?} has leading or trailing whitespace");
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '[' | ']' | '|' | '#' | '/' | '\\' | '"')) {
        bail!("note name {name:?} contains the reserved character {c:?}");
    }
    Ok(())
}

/// A topic note with no subtopics.
pub fn topic_template(name: &str) -> Result<String> {
    validate_note_name(name)?;
    let empty = Aggregate {
        completed: 0,
        total: 0,
        progress: 0.0,
    };

    let skeleton = format!(
        "---\n\
         {}: topic\n\
         {}: {}\n\
         {}: []\n\
         {}: 0\n\
         {}: 0\n\
         ---\n\
         \n\
         # {name}\n\
         \n\
         {PROGRESS_HEADING}\n\
         {SUBTOPICS_HEADING}\n\
         ## Notes\n",
        keys::TYPE,
        keys::PROGRESS,
        format_progress(0.0),
        keys::SUBTOPICS,
        keys::TOTAL_SUBTOPICS,
        keys::COMPLETED_SUBTOPICS,
    );

    let text = write_section(&skeleton, PROGRESS_HEADING, &render_progress(&empty));
    Ok(write_section(&text, SUBTOPICS_HEADING, &render_subtopic_list(&[])))
}

/// A not-yet-completed subtopic owned by `parent`.
pub fn subtopic_template(name: &str, parent: &str) -> Result<String> {
    validate_note_name(name)?;
    validate_note_name(parent)?;
    Ok(format!(
        "---\n\
         {}: subtopic\n\
         {}: {}\n\
         {}: false\n\
         ---\n\
         \n\
         # {name}\n\
         \n\
         {STATUS_PREFIX} {}\n\
         \n\
         ## Notes\n",
        keys::TYPE,
        keys::PARENT,
        quote(&wiki_link(parent)),
        keys::COMPLETED,
        status_label(false),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::read_front_matter;
    use crate::note::{NoteKind, SubtopicFields, TopicFields};
    use crate::sections::{read_section, read_status_line};

    #[test]
    fn test_topic_template() {
        let text = topic_template("Rust").unwrap();
        let fm = read_front_matter(&text).unwrap();
        assert_eq!(NoteKind::of(&fm), Some(NoteKind::Topic));
        let fields = TopicFields::from_front_matter(&fm);
        assert!(fields.subtopics.is_empty());
        assert_eq!(
            read_section(&text, PROGRESS_HEADING),
            Some("\n0% complete\n[--------------------] 0/0\n\n")
        );
        assert_eq!(
            read_section(&text, SUBTOPICS_HEADING),
            Some("\n_No subtopics yet._\n\n")
        );
        assert!(text.contains("# Rust\n"));
    }

    #[test]
    fn test_subtopic_template() {
        let text = subtopic_template("Borrowing", "Rust").unwrap();
        let fm = read_front_matter(&text).unwrap();
        assert_eq!(NoteKind::of(&fm), Some(NoteKind::Subtopic));
        let fields = SubtopicFields::from_front_matter(&fm);
        assert_eq!(fields.parent.as_deref(), Some("[[Rust]]"));
        assert!(!fields.completed);
        assert_eq!(fields.completion_date, None);
        assert_eq!(read_status_line(&text), Some(false));
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(topic_template("").is_err());
        assert!(topic_template("a|b").is_err());
        assert!(subtopic_template("ok", "[[x]]").is_err());
        assert!(subtopic_template(" padded", "Rust").is_err());
    }

    #[test]
    fn test_rejects_quote_characters() {
        assert!(validate_note_name(r#"The "Book""#).is_err());
        assert!(validate_note_name(r"C:\x").is_err());
        assert!(subtopic_template("Borrowing", r#"Say "hi""#).is_err());
        // Single quotes survive the double-quoted parent value.
        let text = subtopic_template("Borrowing", "Rust's book").unwrap();
        let fm = read_front_matter(&text).unwrap();
        let fields = SubtopicFields::from_front_matter(&fm);
        assert_eq!(fields.parent.as_deref(), Some("[[Rust's book]]"));
    }
}
