//! # Study Tracker
//!
//! A terminal study task tracker: create study tasks with notes, a due date
//! and a priority, mark them complete, run a per-task stopwatch, and search,
//! filter and sort the list.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI
//! study
//!
//! # Add a task from the shell
//! study add "Read Chapter 1" --due "next friday" --priority high
//!
//! # List pending tasks by due date
//! study list --filter pending --sort due-date
//! ```
//!
//! ## Storage
//!
//! Tasks live in `~/.study-tracker/tasks.json` (override with `--dir` or
//! `STUDY_TRACKER_DIR`). Every change is written straight through to that
//! file. Interactive sessions log to `study.log` in the same directory.
//!
//! ## Key Modules
//!
//! - `store` - the task list, write-through persistence and delete flow
//! - `timer` - per-task stopwatch tick sources
//! - `view` - search, status filter and sort over the list
//! - `tui` - the ratatui interface

use anyhow::Context;
use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod fields;
pub mod format;
pub mod logging;
pub mod storage;
pub mod store;
pub mod task;
pub mod timer;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use storage::FileStore;
use store::TaskStore;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir();

    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return Ok(());
    }

    let storage = FileStore::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    logging::init_tracing(cli.verbose, interactive.then_some(storage.dir()))?;

    let mut store = TaskStore::load(storage);

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => cmd_ui(store, &data_dir),
        Commands::Add { name, notes, due, priority } => {
            cmd_add(&mut store, name, notes, due, priority)
        }
        Commands::List { search, filter, sort } => {
            cmd_list(&store, search, filter, sort);
            Ok(())
        }
        Commands::Complete { id } => cmd_set_completed(&mut store, &id, true),
        Commands::Reopen { id } => cmd_set_completed(&mut store, &id, false),
        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
