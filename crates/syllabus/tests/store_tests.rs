//! Integration tests for the filesystem store and vault configuration.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::*;
use syllabus::engine::RecomputeOutcome;
use syllabus::{DocumentStore, Engine, FsStore, load_config};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

#[tokio::test]
async fn test_fs_store_read_write_list() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FsStore::new(temp.path());

    store
        .write(Path::new("deep/nested/Note.md"), "hello")
        .await
        .unwrap();
    assert_eq!(
        store.read(Path::new("deep/nested/Note.md")).await.unwrap(),
        "hello"
    );
    assert!(store.exists(Path::new("deep/nested/Note.md")).await);
    assert!(!store.exists(Path::new("Missing.md")).await);
    assert!(store.read(Path::new("Missing.md")).await.is_err());

    write(temp.path(), "A.md", "a");
    write(temp.path(), "image.png", "");
    write(temp.path(), ".syllabus/Hidden.md", "");

    assert_eq!(
        store.list().await.unwrap(),
        vec![PathBuf::from("A.md"), PathBuf::from("deep/nested/Note.md")]
    );
}

#[tokio::test]
async fn test_fs_store_stays_under_root() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write(temp.path(), "Outside.md", "secret");
    let vault = temp.path().join("vault");
    std::fs::create_dir_all(&vault).unwrap();
    let store = FsStore::new(&vault);

    let escape = Path::new("../Outside.md");
    assert!(!store.exists(escape).await);
    assert!(store.read(escape).await.is_err());
    assert!(store.write(escape, "overwritten").await.is_err());
    assert!(store.write(Path::new("/tmp/Abs.md"), "x").await.is_err());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("Outside.md")).unwrap(),
        "secret"
    );
}

#[tokio::test]
async fn test_vault_with_notes_dir() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let root = temp.path();
    write(root, ".syllabus/config.yaml", "notes_dir: notes\n");
    write(
        root,
        "notes/Rust.md",
        &topic(r#"["[[Ownership]]", "[[Lifetimes]]"]"#),
    );
    write(root, "notes/Ownership.md", &subtopic("Ownership", "Rust", true));
    write(root, "notes/Lifetimes.md", &subtopic("Lifetimes", "Rust", false));

    let config = load_config(root).unwrap();
    let engine = Engine::new(Arc::new(FsStore::new(root)), &config).with_clock(today);

    let topic_path = engine.locate("Rust");
    assert_eq!(topic_path, Path::new("notes/Rust.md"));
    let outcome = engine.recompute_topic_progress(&topic_path).await.unwrap();
    assert!(matches!(outcome, RecomputeOutcome::Updated(_)));

    let text = std::fs::read_to_string(root.join("notes/Rust.md")).unwrap();
    assert!(text.contains("progress: 0.50\n"));
    assert!(text.contains("50% complete"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write(temp.path(), ".syllabus/config.yaml", "debounce_ms: [not, a, number]\n");
    assert!(load_config(temp.path()).is_err());
}
