//! Enumerations and field types for study tasks.
//!
//! This module defines the priority levels attached to tasks and the
//! selector values used by the list view (status filter and sort key).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
///
/// Serialized with the capitalised labels ("Low", "Medium", "High") so that
/// saved task lists stay readable and compatible with older blobs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl Priority {
    /// Every priority in selector order.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Severity rank used for sorting; lower ranks sort first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Completion status filter for the task list.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    /// Whether a task with the given completion flag passes this filter.
    pub fn matches(self, completed: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => completed,
            StatusFilter::Pending => !completed,
        }
    }

    /// Next filter in the TUI cycle.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Tasks",
            StatusFilter::Completed => "Completed",
            StatusFilter::Pending => "Pending",
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Priority,
    DueDate,
}

impl SortKey {
    /// Next sort key in the TUI cycle.
    pub fn next(self) -> Self {
        match self {
            SortKey::Priority => SortKey::DueDate,
            SortKey::DueDate => SortKey::Priority,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Priority => "Priority",
            SortKey::DueDate => "Due Date",
        }
    }
}
