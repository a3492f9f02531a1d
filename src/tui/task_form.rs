//! Task form handling for the terminal user interface.
//!
//! The form backs both the add and edit screens: three text inputs (name,
//! notes, due date) and a priority selector.

use chrono::NaiveDate;

use crate::fields::Priority;
use crate::format::parse_due_input;
use crate::task::{Task, TaskDraft};
use crate::tui::input::InputField;

/// Field order for Tab navigation.
pub const NAME_ORDER: usize = 0;
pub const NOTES_ORDER: usize = 1;
pub const DUE_ORDER: usize = 2;
pub const PRIORITY_ORDER: usize = 3;

const FIELD_COUNT: usize = 4;

/// Outcome of turning the form into a draft.
#[derive(Debug, PartialEq, Eq)]
pub enum FormResult {
    Ready(TaskDraft),
    /// The due date text was not understood; it is dropped from the draft.
    UnparsedDue(TaskDraft, String),
}

pub struct TaskForm {
    pub name: InputField,
    pub notes: InputField,
    pub due: InputField,
    pub priority: usize,
    pub current_field: usize,
}

impl TaskForm {
    /// Empty form with the default priority selected.
    pub fn new() -> Self {
        Self {
            name: InputField::new(),
            notes: InputField::new(),
            due: InputField::new(),
            priority: Self::priority_index(Priority::default()),
            current_field: NAME_ORDER,
        }
    }

    /// Form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self::new();
        form.name = InputField::with_value(&task.name);
        form.notes = InputField::with_value(&task.notes);
        form.due = InputField::with_value(
            &task.due_date.map(|d| d.to_string()).unwrap_or_default());
        form.priority = Self::priority_index(task.priority);
        form
    }

    fn priority_index(p: Priority) -> usize {
        Priority::ALL.iter().position(|&x| x == p).unwrap_or(1)
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            NAME_ORDER => Some(&mut self.name),
            NOTES_ORDER => Some(&mut self.notes),
            DUE_ORDER => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_delete();
        }
    }

    /// Left/right move the cursor, or cycle the priority selector.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == PRIORITY_ORDER {
            let n = Priority::ALL.len();
            self.priority = if right {
                (self.priority + 1) % n
            } else {
                (self.priority + n - 1) % n
            };
            return;
        }
        if let Some(field) = self.active_input() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }

    /// Build a draft from the current field values.
    pub fn to_draft(&self, today: NaiveDate) -> FormResult {
        let due_text = self.due.value.trim();
        let due_date = if due_text.is_empty() {
            None
        } else {
            parse_due_input(due_text, today)
        };
        let draft = TaskDraft {
            name: self.name.value.trim().to_string(),
            notes: self.notes.value.trim().to_string(),
            due_date,
            priority: self.selected_priority(),
        };
        if !due_text.is_empty() && due_date.is_none() {
            FormResult::UnparsedDue(draft, due_text.to_string())
        } else {
            FormResult::Ready(draft)
        }
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}
