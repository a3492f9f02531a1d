//! TUI entry point and terminal setup.

use std::{io, panic, path::Path};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::tui::app::App;

/// Leave raw mode and the alternate screen.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

/// Initialise the terminal, run the app until it exits, then restore the terminal.
pub fn run_tui<S: KeyValueStore>(store: TaskStore<S>, data_dir: &Path) -> io::Result<()> {
    // A panic must not leave the shell in raw mode.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, data_dir);
    let result = app.run(&mut terminal);

    restore_terminal()?;
    terminal.show_cursor()?;

    result
}
