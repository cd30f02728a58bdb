//! Typed views over topic and subtopic front matter.
//!
//! Every accessor substitutes a zero value for an absent or malformed field;
//! nothing here fails.

use crate::frontmatter::{FrontMatter, ListEncoding};

/// Front matter keys read or written by the engine.
pub mod keys {
    pub const TYPE: &str = "type";
    pub const PROGRESS: &str = "progress";
    pub const SUBTOPICS: &str = "subtopics";
    pub const TOTAL_SUBTOPICS: &str = "total_subtopics";
    pub const COMPLETED_SUBTOPICS: &str = "completed_subtopics";
    pub const PARENT: &str = "parent";
    pub const COMPLETED: &str = "completed";
    pub const COMPLETION_DATE: &str = "completion_date";
}

/// The two kinds of note the engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Topic,
    Subtopic,
}

impl NoteKind {
    /// Classify a note by its `type` field.
    pub fn of(front_matter: &FrontMatter) -> Option<Self> {
        match front_matter.get(keys::TYPE)? {
            "topic" => Some(Self::Topic),
            "subtopic" => Some(Self::Subtopic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Subtopic => "subtopic",
        }
    }
}

/// Fields of a topic note.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicFields {
    pub progress: f64,
    /// Declared references, unquoted, in order.
    pub subtopics: Vec<String>,
    /// `None` when `subtopics` is not declared at all.
    pub encoding: Option<ListEncoding>,
    pub total_subtopics: u64,
    pub completed_subtopics: u64,
}

impl TopicFields {
    pub fn from_front_matter(front_matter: &FrontMatter) -> Self {
        let list = front_matter.list(keys::SUBTOPICS);
        Self {
            progress: front_matter.get_f64(keys::PROGRESS).unwrap_or(0.0),
            encoding: list.as_ref().map(|l| l.encoding),
            subtopics: list.map(|l| l.items).unwrap_or_default(),
            total_subtopics: front_matter.get_u64(keys::TOTAL_SUBTOPICS).unwrap_or(0),
            completed_subtopics: front_matter
                .get_u64(keys::COMPLETED_SUBTOPICS)
                .unwrap_or(0),
        }
    }
}

/// Fields of a subtopic note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicFields {
    pub parent: Option<String>,
    pub completed: bool,
    pub completion_date: Option<String>,
}

impl SubtopicFields {
    pub fn from_front_matter(front_matter: &FrontMatter) -> Self {
        Self {
            parent: front_matter.get(keys::PARENT).map(str::to_string),
            completed: front_matter.get_bool(keys::COMPLETED).unwrap_or(false),
            completion_date: front_matter
                .get(keys::COMPLETION_DATE)
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::read_front_matter;

    #[test]
    fn test_classify() {
        let topic = read_front_matter("---\ntype: topic\n---\n").unwrap();
        let sub = read_front_matter("---\ntype: \"subtopic\"\n---\n").unwrap();
        let other = read_front_matter("---\ntype: journal\n---\n").unwrap();
        assert_eq!(NoteKind::of(&topic), Some(NoteKind::Topic));
        assert_eq!(NoteKind::of(&sub), Some(NoteKind::Subtopic));
        assert_eq!(NoteKind::of(&other), None);
    }

    #[test]
    fn test_topic_defaults() {
        let fm = read_front_matter("---\ntype: topic\nprogress: lots\n---\n").unwrap();
        let fields = TopicFields::from_front_matter(&fm);
        assert_eq!(fields.progress, 0.0);
        assert!(fields.subtopics.is_empty());
        assert_eq!(fields.encoding, None);
        assert_eq!(fields.total_subtopics, 0);
    }

    #[test]
    fn test_subtopic_fields() {
        let fm = read_front_matter(
            "---\ntype: subtopic\nparent: \"[[Rust]]\"\ncompleted: true\ncompletion_date: 2024-03-01\n---\n",
        )
        .unwrap();
        let fields = SubtopicFields::from_front_matter(&fm);
        assert_eq!(fields.parent.as_deref(), Some("[[Rust]]"));
        assert!(fields.completed);
        assert_eq!(fields.completion_date.as_deref(), Some("2024-03-01"));
    }
}
