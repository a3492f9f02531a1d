//! Derived list view: search, status filter and sort.
//!
//! Nothing here mutates the store; `apply` returns a fresh ordering of
//! borrowed tasks.

use std::cmp::Ordering;

use crate::fields::{SortKey, StatusFilter};
use crate::task::Task;

/// Current list view settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilters {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl ViewFilters {
    /// Case-insensitive substring match on the task name.
    pub fn matches_search(&self, task: &Task) -> bool {
        if self.search.is_empty() {
            return true;
        }
        task.name
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    /// Filter then sort `tasks`. The sort is stable, so ties keep store order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut out: Vec<&Task> = tasks
            .iter()
            .filter(|t| self.matches_search(t))
            .filter(|t| self.status.matches(t.completed))
            .collect();
        out.sort_by(|a, b| compare(self.sort, a, b));
        out
    }
}

/// Ordering for a sort key. Tasks without a due date sort after dated ones.
pub fn compare(key: SortKey, a: &Task, b: &Task) -> Ordering {
    match key {
        SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::TaskDraft;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn sample() -> Vec<Task> {
        let mut tasks = vec![
            Task::from_draft(TaskDraft::new("Read Chapter 1").priority(Priority::Low).due(date(5, 3))),
            Task::from_draft(TaskDraft::new("Lab report").priority(Priority::High)),
            Task::from_draft(TaskDraft::new("read notes").due(date(4, 20))),
            Task::from_draft(TaskDraft::new("Flashcards").priority(Priority::High).due(date(6, 1))),
        ];
        tasks[1].completed = true;
        tasks[3].completed = true;
        tasks
    }

    fn names(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tasks = sample();
        let filters = ViewFilters {
            search: "READ".into(),
            ..Default::default()
        };
        let view = filters.apply(&tasks);
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|t| t.name.to_lowercase().contains("read")));
    }

    #[test]
    fn test_status_filters() {
        let tasks = sample();
        let mut filters = ViewFilters::default();

        filters.status = StatusFilter::Completed;
        assert!(filters.apply(&tasks).iter().all(|t| t.completed));
        assert_eq!(filters.apply(&tasks).len(), 2);

        filters.status = StatusFilter::Pending;
        assert!(filters.apply(&tasks).iter().all(|t| !t.completed));
        assert_eq!(filters.apply(&tasks).len(), 2);

        filters.status = StatusFilter::All;
        assert_eq!(filters.apply(&tasks).len(), tasks.len());
    }

    #[test]
    fn test_priority_sort_uses_severity_and_is_stable() {
        let tasks = sample();
        let view = ViewFilters::default().apply(&tasks);
        assert_eq!(
            names(&view),
            vec!["Lab report", "Flashcards", "read notes", "Read Chapter 1"]
        );
    }

    #[test]
    fn test_due_date_sort_is_non_decreasing_with_undated_last() {
        let tasks = sample();
        let filters = ViewFilters {
            sort: SortKey::DueDate,
            ..Default::default()
        };
        let view = filters.apply(&tasks);
        let dated: Vec<NaiveDate> = view.iter().filter_map(|t| t.due_date).collect();
        assert!(dated.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(view.last().map(|t| t.name.as_str()), Some("Lab report"));
    }

    #[test]
    fn test_apply_does_not_reorder_source() {
        let tasks = sample();
        let before = tasks.clone();
        let filters = ViewFilters {
            sort: SortKey::DueDate,
            status: StatusFilter::Pending,
            search: "r".into(),
        };
        let _ = filters.apply(&tasks);
        assert_eq!(tasks, before);
    }
}
