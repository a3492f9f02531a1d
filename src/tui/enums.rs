//! Enumerations for TUI state management.

/// Which screen the terminal user interface is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// Whether key presses go to a text entry or to list shortcuts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    None,
    Search,
}
