//! User-visible notices.

use std::sync::Mutex;

use owo_colors::OwoColorize;
use tracing::info;

/// Receives short messages meant for the person driving the vault.
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// Logs notices (used by the long-running watcher).
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, message: &str) {
        info!(target: "syllabus::notice", "{message}");
    }
}

/// Prints notices to stderr (used by one-shot commands).
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        eprintln!("{} {}", "->".blue().bold(), message);
    }
}

/// Keeps every notice, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
