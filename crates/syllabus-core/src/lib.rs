//! syllabus-core - text codecs for learning-progress notes
//!
//! A vault holds two kinds of markdown note:
//!
//! - **topics**, whose front matter declares a list of subtopic links and
//!   carries derived `progress`, `completed_subtopics` and `total_subtopics`
//!   fields, mirrored in a `## Progress` and a `## Subtopics` section;
//! - **subtopics**, which carry the authoritative `completed` flag and a
//!   `Status:` line mirroring it.
//!
//! Everything in this crate is a pure string transform. Reading and writing
//! notes, and deciding when to recompute, lives in the `syllabus` crate.
//!
//! ```
//! use syllabus_core::frontmatter::{read_front_matter, write_front_matter};
//! use syllabus_core::sections::{PROGRESS_HEADING, write_section};
//!
//! let note = "---\ntype: topic\nprogress: 0.00\n---\n\n## Progress\n\n## Notes\n";
//!
//! let mut fm = read_front_matter(note).unwrap();
//! fm.set("progress", "0.50");
//! let note = write_front_matter(note, &fm);
//! let note = write_section(&note, PROGRESS_HEADING, "50% complete");
//!
//! assert!(note.contains("progress: 0.50\n"));
//! assert!(note.contains("## Progress\n\n50% complete\n\n## Notes\n"));
//! ```

pub mod frontmatter;
pub mod link;
pub mod note;
pub mod progress;
pub mod sections;
pub mod template;

pub use frontmatter::{FrontMatter, ListEncoding, ListValue, read_front_matter, write_front_matter};
pub use link::{link_target, note_name, note_path, wiki_link};
pub use note::{NoteKind, SubtopicFields, TopicFields};
pub use progress::{Aggregate, SlotState, SubtopicSlot, aggregate};
pub use sections::{
    PROGRESS_HEADING, SUBTOPICS_HEADING, read_section, read_status_line, write_section,
    write_status_line,
};
