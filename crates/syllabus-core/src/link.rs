//! Wiki-style links (`[[Name]]`) and the note paths they resolve to.

use std::path::{Component, Path, PathBuf};

use crate::frontmatter::unquote;

/// File extension of every note.
pub const NOTE_EXTENSION: &str = "md";

/// Bare note name referenced by `reference`.
///
/// Accepts `[[Name]]`, `[[Name|Alias]]`, `[[Name#Heading]]`, any of those
/// quoted, or a bare `Name`. Returns `None` for an empty target.
pub fn link_target(reference: &str) -> Option<&str> {
    let reference = unquote(reference);
    let inner = reference
        .strip_prefix("[[")
        .and_then(|r| r.strip_suffix("]]"))
        .unwrap_or(reference);
    let target = inner
        .split(['|', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    if target.is_empty() { None } else { Some(target) }
}

/// Wrap a note name in link decoration.
pub fn wiki_link(name: &str) -> String {
    format!("[[{name}]]")
}

/// Every `[[...]]` token in `text`, brackets included, in order.
pub fn find_links(text: &str) -> Vec<&str> {
    let mut links = Vec::new();
    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find("[[") {
        let Some(close) = rest[open + 2..].find("]]") else {
            break;
        };
        let end = open + 2 + close + 2;
        links.push(&text[offset + open..offset + end]);
        offset += end;
        rest = &text[offset..];
    }
    links
}

/// Vault-relative path of the note called `name`.
///
/// Names are looked up under `notes_dir`; a name that already carries the
/// `.md` extension is not suffixed a second time.
pub fn note_path(notes_dir: &Path, name: &str) -> PathBuf {
    let file = if Path::new(name)
        .extension()
        .is_some_and(|ext| ext == NOTE_EXTENSION)
    {
        name.to_string()
    } else {
        format!("{name}.{NOTE_EXTENSION}")
    };
    if notes_dir.as_os_str().is_empty() || notes_dir == Path::new(".") {
        PathBuf::from(file)
    } else {
        notes_dir.join(file)
    }
}

/// Whether `path` stays inside the vault it is relative to: no root, no
/// drive prefix, no `..`.
pub fn is_vault_relative(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Note name of a vault-relative path (the file stem).
pub fn note_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Whether `path` looks like a note.
pub fn is_note_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_target_forms() {
        assert_eq!(link_target("[[Rust]]"), Some("Rust"));
        assert_eq!(link_target("\"[[Rust]]\""), Some("Rust"));
        assert_eq!(link_target("[[Rust|the language]]"), Some("Rust"));
        assert_eq!(link_target("[[Rust#Ownership]]"), Some("Rust"));
        assert_eq!(link_target("Rust"), Some("Rust"));
        assert_eq!(link_target("[[ ]]"), None);
        assert_eq!(link_target(""), None);
    }

    #[test]
    fn test_find_links() {
        assert_eq!(find_links("see [[A]] and [[B|b]]"), vec!["[[A]]", "[[B|b]]"]);
        assert!(find_links("no links [[unterminated").is_empty());
    }

    #[test]
    fn test_note_path() {
        assert_eq!(note_path(Path::new("."), "Rust"), PathBuf::from("Rust.md"));
        assert_eq!(
            note_path(Path::new("learning"), "Rust"),
            PathBuf::from("learning/Rust.md")
        );
        assert_eq!(
            note_path(Path::new("learning"), "Rust.md"),
            PathBuf::from("learning/Rust.md")
        );
    }

    #[test]
    fn test_vault_relative_paths() {
        assert!(is_vault_relative(Path::new("Rust.md")));
        assert!(is_vault_relative(Path::new("./learning/Rust.md")));
        assert!(!is_vault_relative(Path::new("../Outside.md")));
        assert!(!is_vault_relative(Path::new("learning/../../Outside.md")));
        assert!(!is_vault_relative(Path::new("/etc/passwd.md")));
        assert!(!is_vault_relative(Path::new("")));
        assert!(!is_vault_relative(&note_path(Path::new("."), "../Outside")));
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(Path::new("learning/Rust.md")), "Rust");
        assert!(is_note_path(Path::new("a/b.md")));
        assert!(!is_note_path(Path::new("a/b.txt")));
    }
}
