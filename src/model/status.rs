// File: ./src/model/status.rs
//! Temporal status of a task relative to a reference day.
//!
//! The classifier is a short-circuit scan over a caller supplied order:
//! the first status whose predicate holds wins, and `unplanned` is the
//! fallthrough when nothing in the order matches.
use crate::model::item::{Status, TaskRecord};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;

pub const DEFAULT_STATUS_ORDER: [Status; 8] = [
    Status::Overdue,
    Status::Due,
    Status::Scheduled,
    Status::Start,
    Status::Process,
    Status::Unplanned,
    Status::Done,
    Status::Cancelled,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct StatusOrder(Vec<Status>);

impl Default for StatusOrder {
    fn default() -> Self {
        Self(DEFAULT_STATUS_ORDER.to_vec())
    }
}

impl StatusOrder {
    /// Builds an order from statuses, dropping repeats.
    pub fn new(statuses: impl IntoIterator<Item = Status>) -> Self {
        let mut out = Vec::new();
        for s in statuses {
            if !out.contains(&s) {
                out.push(s);
            }
        }
        Self(out)
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let statuses = names
            .iter()
            .map(|n| {
                let name = n.as_ref().trim();
                Status::from_str(&name.to_lowercase())
                    .map_err(|_| anyhow!("Unknown task status '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(statuses))
    }

    pub fn as_slice(&self) -> &[Status] {
        &self.0
    }

    /// Position of a status in this order; statuses not listed sort last.
    pub fn rank(&self, status: Status) -> usize {
        self.0
            .iter()
            .position(|s| *s == status)
            .unwrap_or(self.0.len())
    }

    /// True when every status appears exactly once.
    pub fn is_total(&self) -> bool {
        Status::iter().all(|s| self.0.contains(&s))
    }
}

impl TryFrom<Vec<String>> for StatusOrder {
    type Error = anyhow::Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::from_names(&names)
    }
}

impl From<StatusOrder> for Vec<String> {
    fn from(order: StatusOrder) -> Self {
        order.0.iter().map(|s| s.to_string()).collect()
    }
}

/// Whether `status` describes `task` on `today`, independent of any order.
pub fn holds(status: Status, task: &TaskRecord, today: NaiveDate) -> bool {
    let open = !task.completed;
    match status {
        Status::Done => task.completed && !task.is_cancelled(),
        Status::Cancelled => task.completed && task.is_cancelled(),
        Status::Overdue => open && task.due().is_some_and(|d| d < today),
        Status::Due => open && task.due() == Some(today),
        Status::Scheduled => open && task.scheduled().is_some_and(|d| d <= today),
        Status::Start => open && task.start().is_some_and(|d| d <= today),
        // Dated, but nothing is pending yet (future dates or only created/done).
        Status::Process => {
            open && task.has_dates()
                && ![Status::Overdue, Status::Due, Status::Scheduled, Status::Start]
                    .into_iter()
                    .any(|s| holds(s, task, today))
        }
        Status::Unplanned => open && !task.has_dates(),
    }
}

pub fn classify(task: &TaskRecord, today: NaiveDate, order: &StatusOrder) -> Status {
    order
        .as_slice()
        .iter()
        .copied()
        .find(|s| holds(*s, task, today))
        .unwrap_or(Status::Unplanned)
}
