//! Task data structure and related functionality.
//!
//! This module defines the core `Task` record persisted by the store, and
//! `TaskDraft`, the user-supplied fields used to create or edit a task.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::fields::Priority;

/// Stable task identifier, assigned once at creation.
pub type TaskId = Uuid;

/// A study task with its accumulated elapsed time.
///
/// Whether the stopwatch is running is not part of the record: that state
/// lives in the timer registry and is always stopped after a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Build a fresh task from a draft. Callers validate the name first.
    pub fn from_draft(draft: TaskDraft) -> Self {
        Task {
            id: Uuid::new_v4(),
            name: draft.name,
            notes: draft.notes,
            due_date: draft.due_date,
            priority: draft.priority,
            time_spent: 0,
            completed: false,
        }
    }

    /// Short form of the id, as shown in tables.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// User-editable task fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub notes: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        TaskDraft {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn due(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// A draft is only accepted when its trimmed name is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Due dates are stored as `YYYY-MM-DD`, or `""` when unset.
/// Values that fail to parse load as unset.
mod due_date_format {
    use super::*;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), FORMAT).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_starts_clean() {
        let draft = TaskDraft::new("Read Chapter 1").priority(Priority::High);
        let task = Task::from_draft(draft);
        assert_eq!(task.name, "Read Chapter 1");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.time_spent, 0);
        assert!(!task.completed);
    }

    #[test]
    fn test_blank_draft_is_invalid() {
        assert!(!TaskDraft::new("").is_valid());
        assert!(!TaskDraft::new("   \t").is_valid());
        assert!(TaskDraft::new(" x ").is_valid());
    }

    #[test]
    fn test_serialized_shape_uses_camel_case() {
        let task = Task::from_draft(
            TaskDraft::new("Essay").due(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], "2026-03-01");
        assert_eq!(value["timeSpent"], 0);
        assert_eq!(value["priority"], "Medium");
        assert!(value.get("timerActive").is_none());
    }

    #[test]
    fn test_legacy_record_without_id_loads() {
        let json = r#"{"name":"Old","notes":"","dueDate":"","priority":"Low",
                       "timeSpent":12,"completed":true,"timer":null}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.name, "Old");
        assert_eq!(task.due_date, None);
        assert_eq!(task.time_spent, 12);
        assert!(task.completed);
    }

    #[test]
    fn test_unparseable_due_date_loads_as_none() {
        let json = r#"{"id":"6f1c2a4e-9d3b-4a51-8e2f-0b7c5d9e1a23","name":"X","dueDate":"someday"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::Medium);
    }
}
