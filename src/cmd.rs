//! Command implementations for the CLI interface.
//!
//! Each handler works against a loaded [`TaskStore`]; the interactive
//! stopwatch only exists inside the TUI, so there are no timer commands.

use std::path::Path;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::Cli;
use crate::fields::{Priority, SortKey, StatusFilter};
use crate::format::{parse_due_input, print_table};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::TaskDraft;
use crate::tui::run::run_tui;
use crate::view::ViewFilters;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (default).
    Ui,

    /// Add a new study task.
    Add {
        /// Task name.
        name: String,
        /// Free-form notes.
        #[arg(long)]
        notes: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "next friday", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },

    /// List tasks with optional search, filter and sort.
    List {
        /// Case-insensitive text to match against task names.
        #[arg(long)]
        search: Option<String>,
        /// Status filter: all | completed | pending.
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
        /// Sort key: priority | due-date.
        #[arg(long, value_enum, default_value_t = SortKey::Priority)]
        sort: SortKey,
    },

    /// Mark a task as completed.
    Complete {
        /// Task id or unique id prefix.
        id: String,
    },

    /// Mark a completed task as pending again.
    Reopen {
        /// Task id or unique id prefix.
        id: String,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui<S: KeyValueStore>(store: TaskStore<S>, data_dir: &Path) -> anyhow::Result<()> {
    run_tui(store, data_dir).context("UI error")
}

/// Add a new task.
pub fn cmd_add<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    name: String,
    notes: Option<String>,
    due: Option<String>,
    priority: Priority,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let due_date = match due.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match parse_due_input(raw, today) {
            Some(d) => Some(d),
            None => bail!("could not understand due date '{raw}'"),
        },
        None => None,
    };

    let draft = TaskDraft {
        name,
        notes: notes.unwrap_or_default(),
        due_date,
        priority,
    };
    match store.add_task(draft)? {
        Some(id) => {
            let short = store.get(id).map(|t| t.short_id()).unwrap_or_default();
            println!("Added task {short}");
            Ok(())
        }
        None => bail!("task name cannot be blank"),
    }
}

/// List tasks through the same view pipeline the TUI uses.
pub fn cmd_list<S: KeyValueStore>(
    store: &TaskStore<S>,
    search: Option<String>,
    filter: StatusFilter,
    sort: SortKey,
) {
    let filters = ViewFilters {
        search: search.unwrap_or_default(),
        status: filter,
        sort,
    };
    let view = filters.apply(store.tasks());
    if view.is_empty() {
        println!("No tasks.");
        return;
    }
    print_table(&view, Local::now().date_naive());
}

/// Set a task's completion flag to `completed`, toggling only if needed.
pub fn cmd_set_completed<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    reference: &str,
    completed: bool,
) -> anyhow::Result<()> {
    let id = store.resolve(reference)?;
    let Some(task) = store.get(id) else {
        bail!("task {reference} not found");
    };
    let short = task.short_id();
    if task.completed == completed {
        println!("Task {short} already {}", if completed { "completed" } else { "pending" });
        return Ok(());
    }
    store.toggle_complete(id)?;
    info!(%id, completed, "completion changed from CLI");
    println!("{} {short}", if completed { "Completed" } else { "Reopened" });
    Ok(())
}

/// Print a completion script for `shell` to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
