// File: src/store.rs
use crate::model::TaskRecord;
use crate::model::filter::{by_date_range, by_priorities};
use crate::model::Priority;
use crate::timeline::{Timeline, TimelineOptions, aggregate};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub type Snapshot = Arc<Vec<TaskRecord>>;

/// Handle for one extraction pass. Only the newest pass may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassTicket(u64);

impl PassTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Pre-aggregation narrowing, applied to the snapshot before bucketing.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub priorities: Vec<Option<Priority>>,
    pub query: Option<String>,
}

impl ViewFilter {
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.priorities.is_empty()
            && self.query.as_deref().is_none_or(|q| q.trim().is_empty())
    }

    pub fn apply(&self, tasks: &[TaskRecord], today: NaiveDate) -> Vec<TaskRecord> {
        let in_priorities = by_priorities(&self.priorities);
        tasks
            .iter()
            .filter(|t| {
                self.date_range
                    .is_none_or(|(start, end)| by_date_range(start, end)(t))
            })
            .filter(|t| in_priorities(t))
            .filter(|t| {
                self.query
                    .as_deref()
                    .is_none_or(|q| t.matches_query_on(q, today))
            })
            .cloned()
            .collect()
    }
}

/// Holds the current task list. Replacement is a single atomic swap, so
/// subscribers see either the old list or the new one.
#[derive(Debug)]
pub struct TaskStore {
    tx: watch::Sender<Snapshot>,
    issued: AtomicU64,
    // Newest published ticket. Held across the send so check and swap are one step.
    published: Mutex<u64>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self {
            tx,
            issued: AtomicU64::new(0),
            published: Mutex::new(0),
        }
    }

    pub fn begin_pass(&self) -> PassTicket {
        PassTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publishes a finished pass. Returns false, dropping the list, when a
    /// newer pass has already been published.
    pub fn publish(&self, ticket: PassTicket, tasks: Vec<TaskRecord>) -> bool {
        let mut published = self
            .published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if ticket.0 <= *published {
            log::debug!(
                "Discarding stale pass {} (already at {})",
                ticket.0,
                *published
            );
            return false;
        }
        log::debug!("Publishing pass {} with {} tasks", ticket.0, tasks.len());
        *published = ticket.0;
        self.tx.send_replace(Arc::new(tasks));
        true
    }

    /// Unconditional replace, outside the ticket protocol.
    pub fn replace(&self, tasks: Vec<TaskRecord>) {
        let ticket = self.begin_pass();
        self.publish(ticket, tasks);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view(
        &self,
        today: NaiveDate,
        filter: &ViewFilter,
        options: &TimelineOptions,
    ) -> Timeline {
        let snapshot = self.snapshot();
        if filter.is_empty() {
            return aggregate(&snapshot, today, options);
        }
        let narrowed = filter.apply(&snapshot, today);
        aggregate(&narrowed, today, options)
    }
}
