// File: ./src/model/filter.rs
//! Composable predicates over task records and the sort-key expression.
use crate::model::item::{DateKind, Priority, TaskRecord};
use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub fn by_exact_date(day: NaiveDate) -> impl Fn(&TaskRecord) -> bool {
    move |t| t.all_dates().any(|d| d == day)
}

/// Inclusive on both ends. A reversed range is normalized rather than empty.
pub fn by_date_range(start: NaiveDate, end: NaiveDate) -> impl Fn(&TaskRecord) -> bool {
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    move |t| t.all_dates().any(|d| d >= lo && d <= hi)
}

pub fn by_year(year: i32) -> impl Fn(&TaskRecord) -> bool {
    move |t| t.all_dates().any(|d| d.year() == year)
}

/// `None` in the list selects tasks without a priority.
pub fn by_priorities(priorities: &[Option<Priority>]) -> impl Fn(&TaskRecord) -> bool + '_ {
    move |t| priorities.is_empty() || priorities.contains(&t.priority)
}

/// Relative terms in `query` (`due:<today`, `due:>-7d`) resolve against `today`.
pub fn by_query(query: &str, today: NaiveDate) -> impl Fn(&TaskRecord) -> bool + '_ {
    move |t| t.matches_query_on(query, today)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Order,
    Priority,
    Date(DateKind),
    Text,
    Path,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Comma separated sort keys, e.g. `order, -priority, due`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            keys: vec![SortKey {
                field: SortField::Order,
                descending: false,
            }],
        }
    }
}

impl SortSpec {
    pub fn parse(expr: &str) -> Result<Self> {
        let mut keys = Vec::new();
        for raw in expr.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (descending, name) = match raw.strip_prefix('-') {
                Some(rest) => (true, rest.trim()),
                None => (false, raw.strip_prefix('+').unwrap_or(raw).trim()),
            };
            let field = match name.to_lowercase().as_str() {
                "order" => SortField::Order,
                "priority" => SortField::Priority,
                "text" | "description" => SortField::Text,
                "path" | "file" => SortField::Path,
                "line" => SortField::Line,
                other => match other.parse::<DateKind>() {
                    Ok(kind) => SortField::Date(kind),
                    Err(_) => return Err(anyhow!("Unknown sort key '{}'", name)),
                },
            };
            keys.push(SortKey { field, descending });
        }
        if keys.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self { keys })
    }

    pub fn compare(&self, a: &TaskRecord, b: &TaskRecord) -> Ordering {
        for key in &self.keys {
            let ord = compare_field(key.field, a, b);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable: equal keys keep their input order.
    pub fn sort(&self, tasks: &mut [TaskRecord]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|k| {
                let name = match k.field {
                    SortField::Order => "order".to_string(),
                    SortField::Priority => "priority".to_string(),
                    SortField::Date(kind) => kind.to_string(),
                    SortField::Text => "text".to_string(),
                    SortField::Path => "path".to_string(),
                    SortField::Line => "line".to_string(),
                };
                if k.descending {
                    format!("-{}", name)
                } else {
                    name
                }
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

fn compare_field(field: SortField, a: &TaskRecord, b: &TaskRecord) -> Ordering {
    match field {
        SortField::Order => a.order.total_cmp(&b.order),
        SortField::Priority => Priority::rank(a.priority).cmp(&Priority::rank(b.priority)),
        // Undated tasks go after dated ones.
        SortField::Date(kind) => match (a.date(kind), b.date(kind)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Text => a
            .display_text
            .to_lowercase()
            .cmp(&b.display_text.to_lowercase()),
        SortField::Path => a.path.cmp(&b.path),
        SortField::Line => a.line().cmp(&b.line()),
    }
}
