//! Named body sections and the subtopic status line.
//!
//! Sections are only ever updated, never created: when a heading is missing
//! the text comes back unchanged and the caller decides what that means.

use std::ops::Range;

use crate::frontmatter::body_offset;
use crate::progress::status_label;

pub const PROGRESS_HEADING: &str = "## Progress";
pub const SUBTOPICS_HEADING: &str = "## Subtopics";

/// Prefix of the status line in subtopic notes.
pub const STATUS_PREFIX: &str = "Status:";

/// A line of the document body with its byte range (terminator included).
struct BodyLine<'a> {
    text: &'a str,
    range: Range<usize>,
    in_fence: bool,
}

/// Lines after the front matter, flagged when inside a fenced code block.
fn body_lines(text: &str) -> Vec<BodyLine<'_>> {
    let mut offset = body_offset(text);
    let mut in_fence = false;
    let mut lines = Vec::new();

    for line in text[offset..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        let is_fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");
        if is_fence {
            in_fence = !in_fence;
        }
        lines.push(BodyLine {
            text: line,
            range: offset..offset + line.len(),
            in_fence: in_fence || is_fence,
        });
        offset += line.len();
    }

    lines
}

fn is_heading(line: &str) -> bool {
    let hashes = line.len() - line.trim_start_matches('#').len();
    hashes > 0 && line[hashes..].starts_with([' ', '\t'])
}

/// Where a section's heading ends and its body lies.
struct SectionSpan {
    /// The heading line has no terminator (it is the last line).
    heading_unterminated: bool,
    body: Range<usize>,
    /// Another heading follows the body.
    followed: bool,
}

fn find_section(text: &str, heading: &str) -> Option<SectionSpan> {
    let lines = body_lines(text);
    let heading = heading.trim_end();

    let index = lines
        .iter()
        .position(|l| !l.in_fence && l.text.trim_end() == heading)?;
    let heading_line = &lines[index];

    let next = lines[index + 1..]
        .iter()
        .find(|l| !l.in_fence && is_heading(l.text));

    Some(SectionSpan {
        heading_unterminated: !heading_line.text.ends_with('\n'),
        body: heading_line.range.end..next.map_or(text.len(), |l| l.range.start),
        followed: next.is_some(),
    })
}

/// Body of the section under `heading`, up to the next heading or the end.
pub fn read_section<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    find_section(text, heading).map(|span| &text[span.body])
}

/// Replace the body under `heading` with `content`.
///
/// The content is framed by one blank line after the heading, and one blank
/// line before the following heading when there is one, so writing the same
/// content twice yields identical text. Missing headings leave `text` as is.
pub fn write_section(text: &str, heading: &str, content: &str) -> String {
    let Some(span) = find_section(text, heading) else {
        return text.to_string();
    };

    let content = content.trim_end_matches('\n');
    let mut out = String::with_capacity(text.len() + content.len());
    out.push_str(&text[..span.body.start]);
    if span.heading_unterminated {
        out.push('\n');
    }
    out.push('\n');
    if !content.is_empty() {
        out.push_str(content);
        out.push('\n');
    }
    if span.followed {
        out.push('\n');
    }
    out.push_str(&text[span.body.end..]);
    out
}

const COMPLETED_GLYPH: char = '✅';
const PENDING_GLYPH: char = '⬜';

/// Glyph-and-label part of a status line, e.g. `✅ Completed`.
fn status_value(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(STATUS_PREFIX)?.trim_start();
    rest.starts_with([COMPLETED_GLYPH, PENDING_GLYPH]).then_some(rest)
}

/// First line outside code fences that reads `Status: <glyph> <label>`.
/// Other `Status:` lines are ordinary prose.
fn find_status_line(text: &str) -> Option<BodyLine<'_>> {
    body_lines(text)
        .into_iter()
        .find(|l| !l.in_fence && status_value(l.text).is_some())
}

/// Completion state shown by the status line, if the note has one.
pub fn read_status_line(text: &str) -> Option<bool> {
    let line = find_status_line(text)?;
    status_value(line.text).map(|value| value.starts_with(COMPLETED_GLYPH))
}

/// Rewrite the status line to reflect `completed`. Notes without a status
/// line are returned unchanged.
pub fn write_status_line(text: &str, completed: bool) -> String {
    let Some(line) = find_status_line(text) else {
        return text.to_string();
    };

    let indent = &line.text[..line.text.len() - line.text.trim_start().len()];
    let content = line.text.trim_end_matches(['\r', '\n']);
    let terminator = &line.text[content.len()..];

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..line.range.start]);
    out.push_str(indent);
    out.push_str(STATUS_PREFIX);
    out.push(' ');
    out.push_str(status_label(completed));
    out.push_str(terminator);
    out.push_str(&text[line.range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const NOTE: &str = indoc! {"
        ---
        type: topic
        ---

        # Rust

        ## Progress
        old progress

        ## Subtopics
        - [ ] [[A]]

        ```
        ## Progress
        ```

        ## Notes
        keep me
    "};

    #[test]
    fn test_read_section() {
        assert_eq!(read_section(NOTE, PROGRESS_HEADING), Some("old progress\n\n"));
        assert!(
            read_section(NOTE, SUBTOPICS_HEADING)
                .unwrap()
                .contains("## Progress\n```")
        );
        assert_eq!(read_section(NOTE, "## Missing"), None);
    }

    #[test]
    fn test_write_section_is_idempotent() {
        let once = write_section(NOTE, PROGRESS_HEADING, "50% complete");
        assert!(once.contains("## Progress\n\n50% complete\n\n## Subtopics"));
        assert!(once.ends_with("## Notes\nkeep me\n"));
        assert_eq!(write_section(&once, PROGRESS_HEADING, "50% complete"), once);
    }

    #[test]
    fn test_write_section_at_end_of_document() {
        let text = "# T\n\n## Subtopics";
        let once = write_section(text, SUBTOPICS_HEADING, "- [x] [[A]]");
        assert_eq!(once, "# T\n\n## Subtopics\n\n- [x] [[A]]\n");
        assert_eq!(write_section(&once, SUBTOPICS_HEADING, "- [x] [[A]]"), once);
    }

    #[test]
    fn test_write_section_missing_heading_is_noop() {
        assert_eq!(write_section(NOTE, "## Elsewhere", "x"), NOTE);
    }

    #[test]
    fn test_heading_in_front_matter_ignored() {
        let text = "---\n## Progress: nope\n---\n## Progress\nbody\n";
        assert_eq!(read_section(text, PROGRESS_HEADING), Some("body\n"));
    }

    #[test]
    fn test_prose_status_line_left_alone() {
        let text = "# A\n\nStatus: waiting on review\n\nStatus: ⬜ Not completed\n";
        assert_eq!(read_status_line(text), Some(false));
        let done = write_status_line(text, true);
        assert_eq!(
            done,
            "# A\n\nStatus: waiting on review\n\nStatus: ✅ Completed\n"
        );

        let prose_only = "# A\nStatus: blocked\n";
        assert_eq!(read_status_line(prose_only), None);
        assert_eq!(write_status_line(prose_only, true), prose_only);
    }

    #[test]
    fn test_status_line() {
        let text = "---\ncompleted: false\n---\n# A\n\n  Status: ⬜ Not completed\r\nmore\n";
        assert_eq!(read_status_line(text), Some(false));
        let done = write_status_line(text, true);
        assert!(done.contains("  Status: ✅ Completed\r\nmore\n"));
        assert_eq!(read_status_line(&done), Some(true));
        assert_eq!(write_status_line(&done, true), done);
        assert_eq!(write_status_line("no status here\n", true), "no status here\n");
    }
}
