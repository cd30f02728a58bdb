//! Common test utilities.

#![allow(dead_code)]

use std::sync::Arc;

use syllabus::notice::RecordingNotifier;
use syllabus::{Config, Engine, MemoryStore};
use time::{Date, Month};

pub const TOPIC: &str = "Rust.md";
pub const OWNERSHIP: &str = "Ownership.md";
pub const LIFETIMES: &str = "Lifetimes.md";

/// A topic declaring `subtopics` (raw YAML value), with stale derived fields.
pub fn topic(subtopics: &str) -> String {
    format!(
        "---\n\
         type: topic\n\
         progress: 0.00\n\
         subtopics: {subtopics}\n\
         total_subtopics: 0\n\
         completed_subtopics: 0\n\
         ---\n\
         \n\
         # Rust\n\
         \n\
         ## Progress\n\
         \n\
         0% complete\n\
         \n\
         ## Subtopics\n\
         \n\
         _No subtopics yet._\n\
         \n\
         ## Notes\n\
         Keep this.\n"
    )
}

pub fn subtopic(name: &str, parent: &str, completed: bool) -> String {
    let status = if completed {
        "✅ Completed"
    } else {
        "⬜ Not completed"
    };
    format!(
        "---\n\
         type: subtopic\n\
         parent: \"[[{parent}]]\"\n\
         completed: {completed}\n\
         ---\n\
         \n\
         # {name}\n\
         \n\
         Status: {status}\n"
    )
}

/// Topic `Rust` with `Ownership` (completed) and `Lifetimes` (not completed).
pub fn vault() -> MemoryStore {
    MemoryStore::new()
        .with(TOPIC, topic(r#"["[[Ownership]]", "[[Lifetimes]]"]"#))
        .with(OWNERSHIP, subtopic("Ownership", "Rust", true))
        .with(LIFETIMES, subtopic("Lifetimes", "Rust", false))
}

pub fn today() -> Date {
    Date::from_calendar_date(2024, Month::March, 7).expect("valid date")
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notices: Arc<RecordingNotifier>,
    pub engine: Arc<Engine>,
}

pub fn harness(store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let notices = Arc::new(RecordingNotifier::new());
    let engine = Engine::new(store.clone(), &Config::default())
        .with_notifier(notices.clone())
        .with_clock(today);
    Harness {
        store,
        notices,
        engine: Arc::new(engine),
    }
}
