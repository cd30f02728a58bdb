//! syllabus library - keep topic notes in sync with their subtopics
//!
//! This library exposes the engine behind the `syllabus` binary for testing
//! and embedding purposes. Text handling lives in `syllabus-core`; this
//! crate adds storage, the mutation operations and the change coordinator.

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod guard;
pub mod index;
pub mod notice;
pub mod report;
pub mod resolve;
pub mod store;
pub mod watcher;

pub use config::{Config, load_config};
pub use coordinator::{ChangeCoordinator, DrainReport};
pub use engine::{AttachOutcome, Engine, RecomputeOutcome, SkipReason, ToggleOutcome};
pub use store::{DocumentStore, FsStore, MemoryStore};
