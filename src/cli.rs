use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Study task tracker with per-task stopwatches.
/// Data is stored under ~/.study-tracker or the directory passed via --dir.
#[derive(Parser)]
#[command(name = "study", version, about = "Track study tasks and the time spent on them")]
pub struct Cli {
    /// Directory holding the task store and log file.
    #[arg(long, global = true, env = "STUDY_TRACKER_DIR")]
    pub dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Defaults to `ui` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolve the data directory, falling back to `$HOME/.study-tracker`.
    pub fn data_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".study-tracker")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_explicit_dir_wins() {
        let cli = Cli::parse_from(["study", "--dir", "/tmp/st", "-vv"]);
        assert_eq!(cli.data_dir(), PathBuf::from("/tmp/st"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }
}
