// File: ./src/quick_entry.rs
//! Shorthand for typing tasks: `Call mom due friday repeat every week`
//! becomes `Call mom 📅 2024-01-19 🔁 every week`.
//!
//! Keywords (`due`, `start`, `scheduled`, `done`, `created`, optionally
//! written `due:`) take a date expression: `today`, `tomorrow`,
//! `yesterday`, `YYYY-MM-DD`, a weekday name, `next <weekday|week|month|year>`
//! or `in N <unit>`. `repeat`/`recurring` take the rest of the words up to
//! the next keyword. A leading backslash keeps a word literal (`\due`).
use crate::model::DateKind;
use crate::model::parser::{RECURRENCE_SIGIL, parse_date};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

pub fn task_line(text: &str) -> String {
    format!("- [ ] {}", text.trim())
}

fn date_keyword(word: &str) -> Option<DateKind> {
    let lower = word.to_lowercase();
    match lower.strip_suffix(':').unwrap_or(lower.as_str()) {
        "due" => Some(DateKind::Due),
        "start" | "starts" => Some(DateKind::Start),
        "scheduled" => Some(DateKind::Scheduled),
        "done" => Some(DateKind::Done),
        "created" => Some(DateKind::Created),
        _ => None,
    }
}

fn is_recurrence_keyword(word: &str) -> bool {
    let lower = word.to_lowercase();
    matches!(
        lower.strip_suffix(':').unwrap_or(lower.as_str()),
        "repeat" | "recurring"
    )
}

fn is_keyword(word: &str) -> bool {
    date_keyword(word).is_some() || is_recurrence_keyword(word)
}

pub fn expand(input: &str, today: NaiveDate) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        let word = words[i];

        if let Some(literal) = word.strip_prefix('\\')
            && !literal.is_empty()
        {
            out.push(literal.to_string());
            i += 1;
            continue;
        }

        if let Some(kind) = date_keyword(word)
            && let Some((date, used)) = parse_date_expr(&words[i + 1..], today)
        {
            out.push(format!("{} {}", kind.sigil(), date.format("%Y-%m-%d")));
            i += 1 + used;
            continue;
        }

        if is_recurrence_keyword(word) {
            let rule: Vec<&str> = words[i + 1..]
                .iter()
                .take_while(|w| !is_keyword(w))
                .copied()
                .collect();
            if !rule.is_empty() {
                out.push(format!("{} {}", RECURRENCE_SIGIL, rule.join(" ")));
                i += 1 + rule.len();
                continue;
            }
        }

        out.push(word.to_string());
        i += 1;
    }
    out.join(" ")
}

/// Parses a date expression at the start of `words`, returning the date and
/// how many words it spans.
pub fn parse_date_expr(words: &[&str], today: NaiveDate) -> Option<(NaiveDate, usize)> {
    let first = words.first()?.to_lowercase();
    match first.as_str() {
        "today" => return Some((today, 1)),
        "tomorrow" => return Some((today.succ_opt()?, 1)),
        "yesterday" => return Some((today.pred_opt()?, 1)),
        "next" => {
            let unit = words.get(1)?.to_lowercase();
            let date = match unit.as_str() {
                "week" => today.checked_add_days(Days::new(7))?,
                "month" => today.checked_add_months(Months::new(1))?,
                "year" => today.checked_add_months(Months::new(12))?,
                other => next_weekday(today, parse_weekday(other)?)?,
            };
            return Some((date, 2));
        }
        "in" => {
            let amount = words.get(1)?.parse::<u32>().ok()?;
            let unit = words.get(2)?;
            return Some((add_amount(today, amount, unit)?, 3));
        }
        _ => {}
    }
    if let Some(date) = parse_date(&first) {
        return Some((date, 1));
    }
    if let Some(day) = parse_weekday(&first) {
        return Some((next_weekday(today, day)?, 1));
    }
    None
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

// Strictly after `from`: asking for today's weekday gives next week.
fn next_weekday(from: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + target.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(if ahead == 0 { 7 } else { ahead.into() }))
}

fn add_amount(from: NaiveDate, amount: u32, unit: &str) -> Option<NaiveDate> {
    match unit.to_lowercase().as_str() {
        "d" | "day" | "days" => from.checked_add_days(Days::new(amount.into())),
        "w" | "week" | "weeks" => from.checked_add_days(Days::new(amount.checked_mul(7)?.into())),
        "mo" | "month" | "months" => from.checked_add_months(Months::new(amount)),
        "y" | "year" | "years" => from.checked_add_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_weekday_is_strictly_after() {
        // 2024-01-15 is a Monday
        let monday = day(2024, 1, 15);
        assert_eq!(next_weekday(monday, Weekday::Mon), Some(day(2024, 1, 22)));
        assert_eq!(next_weekday(monday, Weekday::Wed), Some(day(2024, 1, 17)));
        assert_eq!(next_weekday(monday, Weekday::Sun), Some(day(2024, 1, 21)));
    }

    #[test]
    fn test_month_arithmetic_clamps() {
        assert_eq!(add_amount(day(2024, 1, 31), 1, "month"), Some(day(2024, 2, 29)));
        assert_eq!(add_amount(day(2024, 1, 31), 2, "fortnights"), None);
    }

    #[test]
    fn test_out_of_range_amounts_give_none() {
        let from = day(2024, 1, 15);
        assert_eq!(add_amount(from, 100_000_000, "days"), None);
        assert_eq!(add_amount(from, u32::MAX, "weeks"), None);
        assert_eq!(add_amount(from, u32::MAX, "years"), None);
    }
}
