//! Task store: the single owner of the task list.
//!
//! `TaskStore` holds tasks in insertion order, the live stopwatch tick
//! sources, and the pending delete target. Every change to persisted task
//! data is written through to the injected [`KeyValueStore`] before the
//! call returns.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, StorageError};
use crate::task::{Task, TaskDraft, TaskId};
use crate::timer::Timers;

/// Key under which the serialized task list is stored.
pub const TASKS_KEY: &str = "tasks";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize task list: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no task found matching '{0}'")]
    NotFound(String),

    #[error("'{reference}' matches {count} tasks, use a longer id")]
    Ambiguous { reference: String, count: usize },
}

/// In-memory task list mirrored to key-value storage.
pub struct TaskStore<S> {
    tasks: Vec<Task>,
    timers: Timers,
    pending_delete: Option<TaskId>,
    storage: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load the task list from storage.
    ///
    /// A missing or unparseable record yields an empty store. All timers
    /// start stopped. Records saved without an id are given one, and the
    /// list is written back once so those ids survive the next load.
    pub fn load(storage: S) -> Self {
        let (tasks, assigned) = match storage.get(TASKS_KEY) {
            None => {
                info!("no saved tasks, starting empty");
                (Vec::new(), 0)
            }
            Some(raw) => match parse_tasks(&raw) {
                Ok((tasks, assigned)) => {
                    info!(count = tasks.len(), "loaded tasks");
                    (tasks, assigned)
                }
                Err(e) => {
                    warn!(error = %e, "saved tasks failed to parse, starting empty");
                    (Vec::new(), 0)
                }
            },
        };

        let mut store = TaskStore {
            tasks,
            timers: Timers::new(),
            pending_delete: None,
            storage,
        };

        if assigned > 0 {
            info!(count = assigned, "assigned ids to tasks saved without one");
            // save() logs the failure; the ids still hold for this session.
            let _ = store.save();
        }
        store
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Serialize the full list and write it to storage.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let data = serde_json::to_string(&self.tasks)?;
        if let Err(e) = self.storage.set(TASKS_KEY, &data) {
            warn!(error = %e, "failed to persist tasks");
            return Err(e.into());
        }
        Ok(())
    }

    /// Append a task built from `draft`.
    ///
    /// Returns `Ok(None)` without touching the store when the name is blank.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<Option<TaskId>, StoreError> {
        if !draft.is_valid() {
            debug!("rejected task with blank name");
            return Ok(None);
        }
        let task = Task::from_draft(draft);
        let id = task.id;
        info!(%id, name = %task.name, "added task");
        self.tasks.push(task);
        self.save()?;
        Ok(Some(id))
    }

    /// Replace the editable fields of a task.
    ///
    /// Elapsed time, completion and the stopwatch are left alone. Returns
    /// false when the id is unknown or the new name is blank.
    pub fn update_task(&mut self, id: TaskId, draft: TaskDraft) -> Result<bool, StoreError> {
        if !draft.is_valid() {
            debug!(%id, "rejected edit with blank name");
            return Ok(false);
        }
        let Some(task) = self.get_mut(id) else {
            return Ok(false);
        };
        task.name = draft.name;
        task.notes = draft.notes;
        task.due_date = draft.due_date;
        task.priority = draft.priority;
        debug!(%id, "updated task");
        self.save()?;
        Ok(true)
    }

    /// Flip the completion flag of exactly one task.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let Some(task) = self.get_mut(id) else {
            return Ok(false);
        };
        task.completed = !task.completed;
        debug!(%id, completed = task.completed, "toggled completion");
        self.save()?;
        Ok(true)
    }

    /// Mark a task as the pending delete target. Unknown ids are ignored.
    pub fn request_delete(&mut self, id: TaskId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    /// The task awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&Task> {
        self.pending_delete.and_then(|id| self.get(id))
    }

    /// Whether a delete confirmation is outstanding.
    pub fn confirm_visible(&self) -> bool {
        self.pending_delete.is_some()
    }

    /// Remove the pending delete target, cancelling its stopwatch.
    ///
    /// Returns the removed task, or `None` when nothing was pending.
    pub fn confirm_delete(&mut self) -> Result<Option<Task>, StoreError> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };
        self.timers.stop(id);
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let removed = self.tasks.remove(idx);
        info!(%id, name = %removed.name, "deleted task");
        self.save()?;
        Ok(Some(removed))
    }

    /// Drop the pending delete target without touching the list.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Start the stopwatch for a task. No-op when already running or unknown.
    pub fn start_timer(&mut self, id: TaskId, now: Instant) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let started = self.timers.start(id, now);
        if started {
            debug!(%id, "timer started");
        }
        started
    }

    /// Stop the stopwatch for a task, keeping its elapsed time.
    pub fn stop_timer(&mut self, id: TaskId) -> bool {
        let stopped = self.timers.stop(id);
        if stopped {
            debug!(%id, "timer stopped");
        }
        stopped
    }

    pub fn is_timer_active(&self, id: TaskId) -> bool {
        self.timers.is_running(id)
    }

    pub fn active_timers(&self) -> usize {
        self.timers.active_count()
    }

    /// Earliest pending tick, used to bound event loop waits.
    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Apply every tick due by `now`, adding one second per tick.
    ///
    /// Returns the number of seconds added across all tasks; the list is
    /// persisted only when something changed.
    pub fn tick(&mut self, now: Instant) -> Result<u64, StoreError> {
        let fired = self.timers.poll(now);
        let mut added = 0;
        for (id, ticks) in fired {
            if let Some(task) = self.get_mut(id) {
                task.time_spent += ticks;
                added += ticks;
            }
        }
        if added > 0 {
            self.save()?;
        }
        Ok(added)
    }

    /// Resolve a full id or a unique id prefix to a task.
    pub fn resolve(&self, reference: &str) -> Result<TaskId, ResolveError> {
        let needle = reference.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(ResolveError::NotFound(reference.to_string()));
        }
        let matches: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle))
            .map(|t| t.id)
            .collect();

        match matches.as_slice() {
            [] => Err(ResolveError::NotFound(reference.to_string())),
            [id] => Ok(*id),
            _ => Err(ResolveError::Ambiguous {
                reference: reference.to_string(),
                count: matches.len(),
            }),
        }
    }
}

/// Parse a saved task list, returning how many records lacked an id.
fn parse_tasks(raw: &str) -> Result<(Vec<Task>, usize), serde_json::Error> {
    let records: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let missing_ids = records.iter().filter(|r| r.get("id").is_none()).count();
    let tasks = serde_json::from_value(serde_json::Value::Array(records))?;
    Ok((tasks, missing_ids))
}
