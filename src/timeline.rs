// File: ./src/timeline.rs
//! Date-bucketed view over a task snapshot.
//!
//! Every call is a full recompute: statuses are classified once per pass,
//! then tasks are bucketed per involved day and counted globally.
use crate::model::filter::{SortSpec, by_exact_date, by_year};
use crate::model::{Status, StatusOrder, TaskRecord, classify};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The counter a status is tallied under. `Todo` collects every status
/// that has no counter of its own.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CounterKind {
    Todo,
    Overdue,
    Unplanned,
    Done,
    Cancelled,
}

impl CounterKind {
    pub fn of(status: Status) -> Self {
        match status {
            Status::Overdue => CounterKind::Overdue,
            Status::Unplanned => CounterKind::Unplanned,
            Status::Done => CounterKind::Done,
            Status::Cancelled => CounterKind::Cancelled,
            Status::Due | Status::Scheduled | Status::Start | Status::Process => CounterKind::Todo,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineOptions {
    pub status_order: StatusOrder,
    pub sort: SortSpec,
    /// Hide overdue tasks on every day except today.
    pub forward: bool,
    /// Restrict bucket contents to one counter; counters themselves are unaffected.
    pub counter_filter: Option<CounterKind>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total: usize,
    pub todo: usize,
    pub overdue: usize,
    pub unplanned: usize,
    pub done: usize,
    pub cancelled: usize,
}

impl Counters {
    pub fn from_statuses(statuses: &[Status]) -> Self {
        let count = |wanted: Status| statuses.iter().filter(|s| **s == wanted).count();
        let total = statuses.len();
        let overdue = count(Status::Overdue);
        let unplanned = count(Status::Unplanned);
        let done = count(Status::Done);
        let cancelled = count(Status::Cancelled);
        Self {
            total,
            // Complement, not a classified status.
            todo: total - (unplanned + done + cancelled + overdue),
            overdue,
            unplanned,
            done,
            cancelled,
        }
    }

    pub fn get(&self, kind: CounterKind) -> usize {
        match kind {
            CounterKind::Todo => self.todo,
            CounterKind::Overdue => self.overdue,
            CounterKind::Unplanned => self.unplanned,
            CounterKind::Done => self.done,
            CounterKind::Cancelled => self.cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub task: Arc<TaskRecord>,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub is_today: bool,
    pub entries: Vec<TimelineEntry>,
    pub statuses: BTreeSet<Status>,
}

impl DayBucket {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.entries.iter().map(|e| e.task.as_ref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct YearView {
    pub year: i32,
    pub is_current: bool,
    pub days: Vec<NaiveDate>,
    pub task_count: usize,
    pub statuses: BTreeSet<Status>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub today: NaiveDate,
    pub years: Vec<i32>,
    pub year_views: Vec<YearView>,
    pub days: BTreeMap<NaiveDate, DayBucket>,
    pub counters: Counters,
}

impl Timeline {
    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.days.get(&date)
    }

    pub fn today_bucket(&self) -> Option<&DayBucket> {
        self.days.get(&self.today)
    }
}

/// Every populated date of every task, plus `today`.
pub fn involved_dates(tasks: &[TaskRecord], today: NaiveDate) -> BTreeSet<NaiveDate> {
    let mut dates: BTreeSet<NaiveDate> = tasks.iter().flat_map(|t| t.all_dates()).collect();
    dates.insert(today);
    dates
}

/// Inclusive, gap-free year range spanning the given dates.
pub fn year_range(dates: &BTreeSet<NaiveDate>) -> Vec<i32> {
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (first.year()..=last.year()).collect(),
        _ => Vec::new(),
    }
}

pub fn aggregate(tasks: &[TaskRecord], today: NaiveDate, options: &TimelineOptions) -> Timeline {
    let statuses: Vec<Status> = tasks
        .iter()
        .map(|t| classify(t, today, &options.status_order))
        .collect();
    let shared: Vec<Arc<TaskRecord>> = tasks.iter().cloned().map(Arc::new).collect();
    let counters = Counters::from_statuses(&statuses);

    let dates = involved_dates(tasks, today);
    let years = year_range(&dates);

    let mut days = BTreeMap::new();
    for &date in &dates {
        let on_date = by_exact_date(date);
        let mut entries: Vec<TimelineEntry> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| on_date(t))
            .map(|(idx, _)| TimelineEntry {
                task: Arc::clone(&shared[idx]),
                status: statuses[idx],
            })
            .collect();

        if options.forward && date != today {
            entries.retain(|e| e.status != Status::Overdue);
        }
        if let Some(kind) = options.counter_filter {
            entries.retain(|e| CounterKind::of(e.status) == kind);
        }
        entries.sort_by(|a, b| {
            options
                .status_order
                .rank(a.status)
                .cmp(&options.status_order.rank(b.status))
                .then_with(|| options.sort.compare(&a.task, &b.task))
        });

        let bucket_statuses = entries.iter().map(|e| e.status).collect();
        days.insert(
            date,
            DayBucket {
                date,
                is_today: date == today,
                entries,
                statuses: bucket_statuses,
            },
        );
    }

    let year_views = years
        .iter()
        .map(|&year| {
            let in_year = by_year(year);
            let mut task_count = 0;
            let mut year_statuses = BTreeSet::new();
            for (idx, task) in tasks.iter().enumerate() {
                if in_year(task) {
                    task_count += 1;
                    year_statuses.insert(statuses[idx]);
                }
            }
            YearView {
                year,
                is_current: year == today.year(),
                days: dates.iter().copied().filter(|d| d.year() == year).collect(),
                task_count,
                statuses: year_statuses,
            }
        })
        .collect();

    log::debug!(
        "Aggregated {} tasks into {} day buckets over {} years",
        tasks.len(),
        days.len(),
        years.len()
    );

    Timeline {
        today,
        years,
        year_views,
        days,
        counters,
    }
}
