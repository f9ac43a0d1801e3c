// File: src/model/parser.rs
use crate::model::item::{DateKind, FrontMatter, Position, Priority, SectionRef, TaskRecord};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

pub const RECURRENCE_SIGIL: &str = "🔁";
const VARIATION_SELECTOR: char = '\u{FE0F}';

// indentation (incl. callout quotes), list marker, checkbox, body
static TASK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\s>]*)([-*+]|[0-9]+[.)]) +\[(.)\] *(.*)$").expect("task line regex")
});

static BLOCK_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \^[a-zA-Z0-9-]+$").expect("block link regex"));

/// Everything the host knows about a line besides its text.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub path: &'a str,
    pub section: Option<&'a SectionRef>,
    pub position: Position,
    pub out_links: &'a [String],
    pub front_matter: Option<&'a FrontMatter>,
    pub tags: &'a [String],
}

impl<'a> LineContext<'a> {
    pub fn new(path: &'a str, position: Position) -> Self {
        Self {
            path,
            section: None,
            position,
            out_links: &[],
            front_matter: None,
            tags: &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub text: String,
    pub dates: BTreeMap<DateKind, NaiveDate>,
    pub priority: Option<Priority>,
    pub recurrence: Option<String>,
    pub tags: Vec<String>,
}

/// Parses one list line. Returns `None` unless the line is a checkbox item.
pub fn parse_line(line: &str, ctx: &LineContext<'_>) -> Option<TaskRecord> {
    let caps = TASK_LINE.captures(line.trim_end_matches(['\r', '\n']))?;
    let list_marker = caps.get(2)?.as_str().to_string();
    let status_marker = caps.get(3)?.as_str().chars().next()?;
    let mut body = caps.get(4).map_or("", |m| m.as_str()).trim();

    let mut block_id = None;
    if let Some(m) = BLOCK_LINK.find(body) {
        block_id = Some(m.as_str().trim_start()[1..].to_string());
        body = body[..m.start()].trim_end();
    }

    let annotations = extract_annotations(body);

    let mut tags: Vec<String> = Vec::new();
    for tag in ctx.tags {
        push_unique(&mut tags, with_tag_sigil(tag));
    }
    for tag in annotations.tags {
        push_unique(&mut tags, tag);
    }
    if let Some(fm) = ctx.front_matter {
        for tag in front_matter_tags(fm) {
            push_unique(&mut tags, tag);
        }
    }

    let order = ctx
        .front_matter
        .and_then(|fm| fm.get("order"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Some(TaskRecord {
        raw_text: line.to_string(),
        display_text: annotations.text,
        list_marker,
        status_marker,
        completed: TaskRecord::is_completed_marker(status_marker),
        priority: annotations.priority,
        recurrence: annotations.recurrence,
        dates: annotations.dates,
        tags,
        block_id,
        path: ctx.path.to_string(),
        position: ctx.position,
        section: ctx.section.cloned(),
        out_links: ctx.out_links.to_vec(),
        front_matter: ctx.front_matter.cloned().unwrap_or_default(),
        order,
    })
}

/// Strips date, priority and recurrence tokens from a task body.
///
/// Tokens may appear in any order; a sigil can be glued to its value or
/// separated by whitespace. Anything that does not parse cleanly stays in the
/// text untouched. Tags are collected but kept in the text.
pub fn extract_annotations(body: &str) -> Annotations {
    let words: Vec<&str> = body.split_whitespace().collect();
    let mut ann = Annotations::default();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    let mut consumed_any = false;

    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        let (sigil, rest) = split_sigil(word);
        let mut consumed = 1;

        // 1. Dates
        if let Some(kind) = DateKind::from_sigil(sigil) {
            let (value, extra) = if rest.is_empty() {
                (words.get(i + 1).copied().unwrap_or(""), 1)
            } else {
                (rest, 0)
            };
            if let Some(date) = parse_date(value) {
                ann.dates.insert(kind, date);
                consumed += extra;
                consumed_any = true;
            } else {
                kept.push(word);
            }
        }
        // 2. Recurrence runs until the next recognized token
        else if sigil == RECURRENCE_SIGIL {
            let mut parts: Vec<&str> = Vec::new();
            if !rest.is_empty() {
                parts.push(rest);
            }
            let mut j = i + 1;
            while j < words.len() && !starts_token(words[j]) {
                parts.push(words[j]);
                j += 1;
            }
            if parts.is_empty() {
                kept.push(word);
            } else {
                ann.recurrence = Some(parts.join(" "));
                consumed = j - i;
                consumed_any = true;
            }
        }
        // 3. Priority glyphs stand alone
        else if let Some(p) = Priority::from_sigil(sigil)
            && rest.is_empty()
        {
            ann.priority = Some(p);
            consumed_any = true;
        }
        // 4. Tags and plain text
        else {
            if let Some(tag) = parse_tag(word) {
                push_unique(&mut ann.tags, tag);
            }
            kept.push(word);
        }
        i += consumed;
    }

    ann.text = if consumed_any {
        kept.join(" ")
    } else {
        body.trim().to_string()
    };
    ann
}

/// Tags declared in front matter, normalized to carry a leading `#`.
pub fn front_matter_tags(fm: &FrontMatter) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(Value::String(tag)) = fm.get("tag") {
        if !tag.trim().is_empty() {
            out.push(with_tag_sigil(tag));
        }
    }
    match fm.get("tags") {
        Some(Value::Array(items)) => {
            for tag in items.iter().filter_map(Value::as_str) {
                if !tag.trim().is_empty() {
                    push_unique(&mut out, with_tag_sigil(tag));
                }
            }
        }
        Some(Value::String(list)) => {
            for tag in list.split([',', ' ']).filter(|t| !t.trim().is_empty()) {
                push_unique(&mut out, with_tag_sigil(tag));
            }
        }
        _ => {}
    }
    out
}

pub fn with_tag_sigil(tag: &str) -> String {
    let tag = tag.trim();
    if tag.starts_with('#') {
        tag.to_string()
    } else {
        format!("#{}", tag)
    }
}

/// Parses an inline tag such as `#work` or `#area/home,` (trailing punctuation dropped).
pub fn parse_tag(word: &str) -> Option<String> {
    let body = word.strip_prefix('#')?;
    let end = body
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '/')))
        .map_or(body.len(), |(idx, _)| idx);
    let name = &body[..end];
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("#{}", name))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn split_sigil(word: &str) -> (&str, &str) {
    let Some(first) = word.chars().next() else {
        return ("", "");
    };
    let sigil_len = first.len_utf8();
    let rest = &word[sigil_len..];
    (
        &word[..sigil_len],
        rest.strip_prefix(VARIATION_SELECTOR).unwrap_or(rest),
    )
}

fn starts_token(word: &str) -> bool {
    let (sigil, rest) = split_sigil(word);
    DateKind::from_sigil(sigil).is_some()
        || sigil == RECURRENCE_SIGIL
        || (rest.is_empty() && Priority::from_sigil(sigil).is_some())
        || parse_tag(word).is_some()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sigil_variation_selector() {
        assert_eq!(split_sigil("🗓\u{FE0F}2024-05-01"), ("🗓", "2024-05-01"));
        assert_eq!(split_sigil("📅"), ("📅", ""));
        assert_eq!(split_sigil(""), ("", ""));
    }

    #[test]
    fn test_parse_tag_edges() {
        assert_eq!(parse_tag("#work"), Some("#work".to_string()));
        assert_eq!(parse_tag("#area/home,"), Some("#area/home".to_string()));
        assert_eq!(parse_tag("#123"), None);
        assert_eq!(parse_tag("#"), None);
        assert_eq!(parse_tag("word"), None);
    }

    #[test]
    fn test_parse_date_is_strict() {
        assert!(parse_date("2024-01-10").is_some());
        assert!(parse_date("2024-1-10").is_none());
        assert!(parse_date("2024-02-30").is_none());
        assert!(parse_date("tomorrow").is_none());
    }

    #[test]
    fn test_recurrence_stops_at_next_token() {
        let ann = extract_annotations("Water plants 🔁 every week on Sunday 📅 2024-03-03 #home");
        assert_eq!(ann.recurrence.as_deref(), Some("every week on Sunday"));
        assert_eq!(ann.text, "Water plants #home");
        assert_eq!(ann.tags, vec!["#home".to_string()]);
    }
}
