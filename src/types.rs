//! Core types for the task board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle status of a task.
///
/// The set is closed; any other label is rejected at the validation
/// boundary before it reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planning,
    InProgress,
    OnHold,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Planning => "planning",
            Status::InProgress => "in_progress",
            Status::OnHold => "on_hold",
            Status::Done => "done",
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Status::Planning),
            "in_progress" => Ok(Status::InProgress),
            "on_hold" => Ok(Status::OnHold),
            "done" => Ok(Status::Done),
            other => Err(Error::validation(format!("invalid status: {other}"))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task on the board, with its tag set attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub tags: Vec<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update: only supplied fields are touched.
///
/// A supplied `tags` value, even an empty list, replaces the whole tag set;
/// an absent one leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// One page of the archived-task view.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedPage {
    pub items: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in [
            Status::Planning,
            Status::InProgress,
            Status::OnHold,
            Status::Done,
        ] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("shipped".parse::<Status>().is_err());
        assert!("Planning".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn test_patch_distinguishes_absent_from_empty() {
        let patch: TaskPatch = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert_eq!(patch.tags, Some(Vec::new()));
        assert!(patch.title.is_none());

        let patch: TaskPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.tags.is_none());
    }
}
