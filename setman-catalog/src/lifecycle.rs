//! Cut production status and its audit history
//!
//! Status changes are recorded, never validated: any status may follow any
//! other. The one gated transition, delivery to `up`, is enforced by
//! [`crate::catalog::DoneCut`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use setman_common::{time, Code, Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    Started,
    InProgress,
    Finishing,
    Done,
    /// Delivered to the episode's up folder
    Up,
    Null,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::Started => "started",
            Status::InProgress => "in_progress",
            Status::Finishing => "finishing",
            Status::Done => "done",
            Status::Up => "up",
            Status::Null => "null",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not_started" => Ok(Status::NotStarted),
            "started" => Ok(Status::Started),
            "in_progress" => Ok(Status::InProgress),
            "finishing" => Ok(Status::Finishing),
            "done" => Ok(Status::Done),
            "up" => Ok(Status::Up),
            "null" => Ok(Status::Null),
            other => Err(Error::with_message(
                Code::ParseFailed,
                format!("Unknown cut status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: Status,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only status log; the current status is the last entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<StatusEntry>,
}

impl History {
    /// Fresh history starting at `not_started`
    pub fn new() -> Self {
        Self {
            entries: vec![StatusEntry {
                status: Status::NotStarted,
                recorded_at: time::now(),
            }],
        }
    }

    /// Restore a stored log. An empty log starts fresh.
    pub fn from_entries(entries: Vec<StatusEntry>) -> Self {
        if entries.is_empty() {
            return Self::new();
        }
        Self { entries }
    }

    pub fn record(&mut self, status: Status) {
        self.entries.push(StatusEntry {
            status,
            recorded_at: time::now(),
        });
    }

    pub fn current(&self) -> Status {
        self.last().status
    }

    pub fn last(&self) -> &StatusEntry {
        // Never empty: both constructors seed at least one entry
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_starts_not_started() {
        let history = History::new();
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Status::NotStarted);
    }

    #[test]
    fn test_record_appends_and_updates_current() {
        let mut history = History::new();
        let sequence = [
            Status::Started,
            Status::InProgress,
            Status::Started,
            Status::Done,
            Status::Finishing,
        ];
        let mut previous_len = history.len();
        for status in sequence {
            history.record(status);
            assert!(history.len() > previous_len);
            previous_len = history.len();
            assert_eq!(history.current(), status);
        }
        assert_eq!(history.len(), 6);
        assert_eq!(history.entries()[1].status, Status::Started);
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let mut history = History::new();
        history.record(Status::Started);
        history.record(Status::Done);
        let entries = history.entries();
        assert!(entries.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
    }

    #[test]
    fn test_from_empty_entries_starts_fresh() {
        let history = History::from_entries(Vec::new());
        assert_eq!(history.current(), Status::NotStarted);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            Status::NotStarted,
            Status::Started,
            Status::InProgress,
            Status::Finishing,
            Status::Done,
            Status::Up,
            Status::Null,
        ] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert_eq!("later".parse::<Status>().unwrap_err().code(), Code::ParseFailed);
    }
}
