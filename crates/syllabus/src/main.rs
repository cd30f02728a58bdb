//! syllabus - keep learning-progress notes in sync
//!
//! Topic notes list their subtopics; subtopic notes carry a `completed` flag.
//! `syllabus watch` keeps every topic's progress fields and sections up to
//! date as the vault changes; the other commands run one operation and exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use syllabus::engine::{AttachOutcome, RecomputeOutcome, SkipReason, ToggleOutcome};
use syllabus::notice::{ConsoleNotifier, LogNotifier};
use syllabus::report::{overall_report, topic_report};
use syllabus::watcher::VaultWatcher;
use syllabus::{ChangeCoordinator, Config, Engine, FsStore, load_config};

/// Keeps topic progress in a vault of markdown notes in sync with its subtopics
#[derive(Parser, Debug)]
#[command(name = "syllabus", version)]
struct Args {
    /// Vault root (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the vault and recompute topics as notes change
    Watch,

    /// Flip a subtopic between completed and not completed
    Toggle {
        /// Subtopic name or vault-relative path
        subtopic: String,
    },

    /// Attach an existing subtopic to a topic
    Attach {
        /// Topic name or vault-relative path
        topic: String,
        /// Subtopic name
        subtopic: String,
    },

    /// Recompute a topic's progress from its subtopics
    Recompute {
        /// Topic name or vault-relative path
        topic: String,
    },

    /// Create a topic note
    NewTopic { name: String },

    /// Create a subtopic note and attach it to its topic
    NewSubtopic { topic: String, name: String },

    /// Print progress for one topic, or for every topic
    Report { topic: Option<String> },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syllabus=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args.vault)?;

    match args.command {
        Command::Watch => watch(&args.vault, &config).await,
        command => run(&args.vault, &config, command).await,
    }
}

async fn watch(vault: &Path, config: &Config) -> Result<()> {
    let store = Arc::new(FsStore::new(vault));
    let engine = Arc::new(Engine::new(store, config).with_notifier(Arc::new(LogNotifier)));
    let coordinator = ChangeCoordinator::new(engine, config.debounce());

    let (watcher, feed) = VaultWatcher::start(vault)?;
    coordinator.enqueue_all().await?;
    // Resync before the first notification arrives.
    let report = coordinator.flush().await;
    if !report.failed.is_empty() {
        eprintln!(
            "{} {} topics failed to update on startup",
            "!".yellow().bold(),
            report.failed.len()
        );
    }

    eprintln!("{} Watching {}", "->".blue().bold(), vault.display());
    tokio::select! {
        _ = coordinator.run(feed) => {}
        result = tokio::signal::ctrl_c() => {
            result.wrap_err("Failed to listen for Ctrl-C")?;
        }
    }

    if let Some(error) = watcher.state().error() {
        eprintln!("{} Watcher error: {}", "!".yellow().bold(), error);
    }
    // Anything still queued gets written before exit.
    coordinator.flush().await;
    Ok(())
}

/// One-shot commands; `watch` runs its own engine with a log notifier.
async fn run(vault: &Path, config: &Config, command: Command) -> Result<()> {
    let store = Arc::new(FsStore::new(vault));
    let engine = Engine::new(store, config).with_notifier(Arc::new(ConsoleNotifier));

    match command {
        Command::Watch => {}
        Command::Toggle { subtopic } => {
            let path = engine.locate(&subtopic);
            match engine.toggle_subtopic_completion(&path).await? {
                ToggleOutcome::Toggled { completed, parent } => {
                    let status = if completed {
                        "completed".green().to_string()
                    } else {
                        "not completed".yellow().to_string()
                    };
                    println!("{} is now {}", path.display(), status);
                    if let Some(agg) = parent.and_then(|p| p.aggregate()) {
                        println!("Parent topic at {}%", agg.percent());
                    }
                }
                ToggleOutcome::Skipped(reason) => print_skipped(&path, reason),
            }
        }
        Command::Attach { topic, subtopic } => {
            match engine.attach_subtopic_to_parent(&topic, &subtopic).await? {
                AttachOutcome::Attached { list_updated: true } => {
                    println!("{} {} -> {}", "Attached".green(), subtopic, topic);
                }
                AttachOutcome::Attached { list_updated: false } => {
                    println!(
                        "{} {}: its subtopics list is in an unrecognized form",
                        "Could not add to".yellow(),
                        topic
                    );
                }
                AttachOutcome::AlreadyAttached => {
                    println!("{} is already attached to {}", subtopic, topic);
                }
                AttachOutcome::Skipped(reason) => print_skipped(&engine.locate(&topic), reason),
            }
        }
        Command::Recompute { topic } => {
            let path = engine.locate(&topic);
            match engine.recompute_topic_progress(&path).await? {
                RecomputeOutcome::Updated(agg) => println!(
                    "{} {}: {}% ({}/{})",
                    "Updated".green(),
                    path.display(),
                    agg.percent(),
                    agg.completed,
                    agg.total
                ),
                RecomputeOutcome::Unchanged(agg) => println!(
                    "{} already up to date: {}% ({}/{})",
                    path.display(),
                    agg.percent(),
                    agg.completed,
                    agg.total
                ),
                RecomputeOutcome::Skipped(reason) => print_skipped(&path, reason),
            }
        }
        Command::NewTopic { name } => {
            let path = engine.create_topic(&name).await?;
            println!("{} {}", "Created".green(), path.display());
        }
        Command::NewSubtopic { topic, name } => {
            let (path, outcome) = engine.create_subtopic(&topic, &name).await?;
            println!("{} {}", "Created".green(), path.display());
            if let AttachOutcome::Skipped(reason) = outcome {
                print_skipped(&engine.locate(&topic), reason);
            }
        }
        Command::Report { topic } => {
            let report = match topic {
                Some(topic) => topic_report(&engine, &engine.locate(&topic)).await?,
                None => overall_report(&engine).await?,
            };
            print!("{report}");
        }
    }

    Ok(())
}

fn print_skipped(path: &Path, reason: SkipReason) {
    let why = match reason {
        SkipReason::Busy => "another update is in progress",
        SkipReason::NotFound => "not found",
        SkipReason::NotATopic => "not a topic",
        SkipReason::NotASubtopic => "not a subtopic",
        SkipReason::NoSubtopics => "no subtopics declared",
    };
    println!("{} {}: {}", "Skipped".yellow(), path.display(), why);
}
