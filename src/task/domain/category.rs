//! Closed set of task categories.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Household cleaning.
    Cleaning,
    /// Moving and lifting.
    Moving,
    /// Small repairs and assembly.
    Handyman,
    /// Shopping and delivery.
    Groceries,
    /// Anything else.
    Other,
}

impl TaskCategory {
    /// Every category in display order.
    pub const ALL: [Self; 5] = [
        Self::Cleaning,
        Self::Moving,
        Self::Handyman,
        Self::Groceries,
        Self::Other,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cleaning => "cleaning",
            Self::Moving => "moving",
            Self::Handyman => "handyman",
            Self::Groceries => "groceries",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| TaskDomainError::UnknownCategory(value.to_owned()))
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
