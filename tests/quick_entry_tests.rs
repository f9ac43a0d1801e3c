// Tests for the quick entry shorthand.
use chrono::NaiveDate;
use taskline::model::{LineContext, Position, parse_line};
use taskline::quick_entry::{expand, parse_date_expr, task_line};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// A Monday
fn today() -> NaiveDate {
    day(2024, 1, 15)
}

#[test]
fn test_keywords_become_sigils() {
    assert_eq!(
        expand("Buy milk due tomorrow #shop", today()),
        "Buy milk 📅 2024-01-16 #shop"
    );
    assert_eq!(expand("Report due: friday", today()), "Report 📅 2024-01-19");
    assert_eq!(
        expand("Trip start next month scheduled in 2 weeks", today()),
        "Trip 🛫 2024-02-15 ⏳ 2024-01-29"
    );
    assert_eq!(
        expand("Logged created yesterday done today", today()),
        "Logged ➕ 2024-01-14 ✅ 2024-01-15"
    );
}

#[test]
fn test_recurrence_runs_to_next_keyword() {
    assert_eq!(
        expand("Water plants repeat every week due 2024-03-03", today()),
        "Water plants 🔁 every week 📅 2024-03-03"
    );
    assert_eq!(expand("Nothing to repeat", today()), "Nothing to repeat");
}

#[test]
fn test_unparsed_keywords_are_left_alone() {
    assert_eq!(expand("Get it done soon", today()), "Get it done soon");
    assert_eq!(expand("due", today()), "due");
    assert_eq!(expand("\\due tomorrow", today()), "due tomorrow");
}

#[test]
fn test_out_of_range_offsets_are_left_alone() {
    assert_eq!(
        expand("Ship due in 100000000 days", today()),
        "Ship due in 100000000 days"
    );
    assert_eq!(
        expand("Ship due in 4000000000 weeks", today()),
        "Ship due in 4000000000 weeks"
    );
    assert_eq!(parse_date_expr(&["tomorrow"], NaiveDate::MAX), None);
    assert_eq!(parse_date_expr(&["friday"], NaiveDate::MAX), None);
}

#[test]
fn test_date_expressions() {
    let t = today();
    assert_eq!(parse_date_expr(&["monday"], t), Some((day(2024, 1, 22), 1)));
    assert_eq!(parse_date_expr(&["Wed"], t), Some((day(2024, 1, 17), 1)));
    assert_eq!(parse_date_expr(&["next", "week"], t), Some((day(2024, 1, 22), 2)));
    assert_eq!(parse_date_expr(&["next", "year"], t), Some((day(2025, 1, 15), 2)));
    assert_eq!(parse_date_expr(&["in", "1", "year"], t), Some((day(2025, 1, 15), 3)));
    assert_eq!(parse_date_expr(&["in", "3", "days"], t), Some((day(2024, 1, 18), 3)));
    assert_eq!(parse_date_expr(&["2024-02-29"], t), Some((day(2024, 2, 29), 1)));
    assert_eq!(parse_date_expr(&["in", "three", "days"], t), None);
    assert_eq!(parse_date_expr(&[], t), None);
}

#[test]
fn test_expanded_line_parses() {
    let line = task_line(&expand("Pay rent due in 1 month repeat every month", today()));
    assert_eq!(line, "- [ ] Pay rent 📅 2024-02-15 🔁 every month");

    let t = parse_line(&line, &LineContext::new("Inbox.md", Position::default())).unwrap();
    assert_eq!(t.due(), Some(day(2024, 2, 15)));
    assert_eq!(t.recurrence.as_deref(), Some("every month"));
    assert_eq!(t.display_text, "Pay rent");
}
