// File: ./src/model/item.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// File-level header metadata, passed through untouched.
pub type FrontMatter = BTreeMap<String, serde_json::Value>;

pub const DONE_SYMBOL: char = 'x';
pub const CANCELLED_SYMBOL: char = '-';
pub const TODO_SYMBOL: char = ' ';

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
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
pub enum Status {
    Overdue,
    Due,
    Scheduled,
    Start,
    Process,
    Unplanned,
    Done,
    Cancelled,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

// Declaration order is urgency order: Highest sorts first.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
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
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
    Lowest,
}

impl Priority {
    pub fn sigil(&self) -> &'static str {
        match self {
            Priority::Highest => "🔺",
            Priority::High => "⏫",
            Priority::Medium => "🔼",
            Priority::Low => "🔽",
            Priority::Lowest => "⏬",
        }
    }

    pub fn from_sigil(s: &str) -> Option<Self> {
        match s {
            "🔺" => Some(Priority::Highest),
            "⏫" => Some(Priority::High),
            "🔼" => Some(Priority::Medium),
            "🔽" => Some(Priority::Low),
            "⏬" => Some(Priority::Lowest),
            _ => None,
        }
    }

    /// Rank used for sorting where "no priority" sits between medium and low.
    pub fn rank(p: Option<Priority>) -> u8 {
        match p {
            Some(Priority::Highest) => 0,
            Some(Priority::High) => 1,
            Some(Priority::Medium) => 2,
            None => 3,
            Some(Priority::Low) => 4,
            Some(Priority::Lowest) => 5,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
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
pub enum DateKind {
    Created,
    Start,
    Scheduled,
    Due,
    #[strum(to_string = "done", serialize = "completion")]
    Done,
}

impl DateKind {
    /// Canonical sigil written back when a date is serialized.
    pub fn sigil(&self) -> &'static str {
        match self {
            DateKind::Created => "➕",
            DateKind::Start => "🛫",
            DateKind::Scheduled => "⏳",
            DateKind::Due => "📅",
            DateKind::Done => "✅",
        }
    }

    /// Accepts the canonical sigil and the variants other editors emit.
    pub fn from_sigil(s: &str) -> Option<Self> {
        match s {
            "➕" => Some(DateKind::Created),
            "🛫" => Some(DateKind::Start),
            "⏳" | "⌛" => Some(DateKind::Scheduled),
            "📅" | "📆" | "🗓" => Some(DateKind::Due),
            "✅" => Some(DateKind::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Position {
    pub fn single_line(line: usize, width: usize) -> Self {
        Self {
            start_line: line,
            start_col: 0,
            end_line: line,
            end_col: width,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Nearest enclosing heading of a list item.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub heading: String,
    pub level: u8,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub raw_text: String,
    pub display_text: String,
    pub list_marker: String,
    pub status_marker: char,
    pub completed: bool,
    pub priority: Option<Priority>,
    pub recurrence: Option<String>,
    #[serde(default)]
    pub dates: BTreeMap<DateKind, NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub block_id: Option<String>,
    pub path: String,
    pub position: Position,
    pub section: Option<SectionRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_links: Vec<String>,
    #[serde(default)]
    pub front_matter: FrontMatter,
    #[serde(default)]
    pub order: f64,
}

impl TaskRecord {
    pub fn is_completed_marker(marker: char) -> bool {
        marker == DONE_SYMBOL || marker == CANCELLED_SYMBOL
    }

    pub fn is_cancelled(&self) -> bool {
        self.status_marker == CANCELLED_SYMBOL
    }

    pub fn date(&self, kind: DateKind) -> Option<NaiveDate> {
        self.dates.get(&kind).copied()
    }

    pub fn due(&self) -> Option<NaiveDate> {
        self.date(DateKind::Due)
    }

    pub fn scheduled(&self) -> Option<NaiveDate> {
        self.date(DateKind::Scheduled)
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.date(DateKind::Start)
    }

    pub fn has_dates(&self) -> bool {
        !self.dates.is_empty()
    }

    /// Every populated date, in DateKind order. May repeat a day.
    pub fn all_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.values().copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.all_dates().map(|d| d.year())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.trim_start_matches('#');
        self.tags
            .iter()
            .any(|t| t.trim_start_matches('#').eq_ignore_ascii_case(needle))
    }

    /// Line number of the task in its source file (0-based, as supplied).
    pub fn line(&self) -> usize {
        self.position.start_line
    }
}
