// File: ./src/model/display.rs
use crate::model::item::{Status, TaskRecord};
use crate::model::parser::RECURRENCE_SIGIL;
use chrono::NaiveDate;
use std::fmt::Write;

pub trait TaskDisplay {
    fn checkbox_symbol(&self) -> String;
    fn to_line(&self) -> String;
}

impl TaskDisplay for TaskRecord {
    fn checkbox_symbol(&self) -> String {
        format!("[{}]", self.status_marker)
    }

    /// Rebuilds a canonical task line: text, priority, recurrence, dates, block id.
    fn to_line(&self) -> String {
        let mut s = format!("{} {} {}", self.list_marker, self.checkbox_symbol(), self.display_text);
        if let Some(p) = self.priority {
            let _ = write!(s, " {}", p.sigil());
        }
        if let Some(r) = &self.recurrence {
            let _ = write!(s, " {} {}", RECURRENCE_SIGIL, r);
        }
        for (kind, date) in &self.dates {
            let _ = write!(s, " {} {}", kind.sigil(), date.format("%Y-%m-%d"));
        }
        if let Some(id) = &self.block_id {
            let _ = write!(s, " ^{}", id);
        }
        s.trim_end().to_string()
    }
}

/// Short human label for a date relative to `today` ("today", "in 3 days", ...).
pub fn relative_label(date: NaiveDate, today: NaiveDate) -> String {
    let diff = (date - today).num_days();
    match diff {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d > 1 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    }
}

pub fn status_glyph(status: Status) -> &'static str {
    match status {
        Status::Overdue => "!",
        Status::Due => "*",
        Status::Scheduled => ">",
        Status::Start => "~",
        Status::Process => ".",
        Status::Unplanned => "?",
        Status::Done => "✔",
        Status::Cancelled => "✘",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineContext, Position, parse_line};

    #[test]
    fn test_to_line_is_canonical() {
        let line = "- [ ] Pay rent 📆 2024-02-01 ⏫ ➕ 2024-01-01 ^rent";
        let t = parse_line(line, &LineContext::new("a.md", Position::default())).unwrap();
        assert_eq!(t.to_line(), "- [ ] Pay rent ⏫ ➕ 2024-01-01 📅 2024-02-01 ^rent");
        assert_eq!(t.checkbox_symbol(), "[ ]");
    }

    #[test]
    fn test_relative_label() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(relative_label(today, today), "today");
        assert_eq!(relative_label(today.succ_opt().unwrap(), today), "tomorrow");
        assert_eq!(relative_label(NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(), today), "3 days ago");
        assert!(Status::Done.is_terminal());
        assert!(!Status::Overdue.is_terminal());
    }
}
