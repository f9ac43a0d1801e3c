// File: ./src/cli.rs
//! Shared command-line logic: argument parsing, help and text rendering.
use crate::config::Config;
use crate::model::display::{TaskDisplay, relative_label, status_glyph};
use crate::model::TaskRecord;
use crate::timeline::Timeline;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    /// `file` of `None` means the configured default entry note.
    Add { file: Option<String>, text: String },
    /// `line` is 1-based, as printed by `Show`.
    Toggle { file: String, line: usize },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub root: Option<PathBuf>,
    pub vault: Option<PathBuf>,
    pub today: Option<NaiveDate>,
    pub json: bool,
    pub query: Option<String>,
    pub verbose: u8,
    pub command: Command,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            root: None,
            vault: None,
            today: None,
            json: false,
            query: None,
            verbose: 0,
            command: Command::Show,
        }
    }
}

/// Parses `std::env::args()` minus the binary name.
pub fn parse_args(args: &[String]) -> Result<Args> {
    let mut out = Args::default();
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = |name: &str| -> Result<String> {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| anyhow!("{} expects a value", name))
        };
        match arg {
            "--help" | "-h" | "help" => {
                out.command = Command::Help;
                return Ok(out);
            }
            "--root" | "-r" => out.root = Some(value(arg)?.into()),
            "--vault" => out.vault = Some(value(arg)?.into()),
            "--today" => {
                let raw = value(arg)?;
                out.today = Some(
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .with_context(|| format!("Invalid --today date '{}'", raw))?,
                );
            }
            "--query" | "-q" => out.query = Some(value(arg)?),
            "--json" => out.json = true,
            "-v" | "--verbose" => out.verbose += 1,
            "-vv" => out.verbose += 2,
            other if other.starts_with("--") => bail!("Unknown option '{}'", other),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    out.command = match positional.first().map(String::as_str) {
        None => Command::Show,
        Some("add") => {
            let file = positional
                .get(1)
                .ok_or_else(|| anyhow!("add expects <file> <text...>"))?;
            let text = positional[2..].join(" ");
            if text.trim().is_empty() {
                bail!("add expects task text");
            }
            Command::Add {
                file: (file != "-").then(|| file.clone()),
                text,
            }
        }
        Some("toggle") => {
            let (Some(file), Some(line)) = (positional.get(1), positional.get(2)) else {
                bail!("toggle expects <file> <line>");
            };
            let line: usize = line
                .parse()
                .with_context(|| format!("Invalid line number '{}'", line))?;
            if line == 0 {
                bail!("Line numbers start at 1");
            }
            Command::Toggle {
                file: file.clone(),
                line,
            }
        }
        Some(other) => bail!("Unknown command '{}'", other),
    };
    Ok(out)
}

pub fn print_help(binary_name: &str) {
    println!(
        "Taskline v{} - tasks from Markdown notes on a timeline",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS]                     Print the timeline", binary_name);
    println!("    {} add <file|-> <text...>        Append a task", binary_name);
    println!("    {} toggle <file> <line>          Toggle a task's completion", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    --vault <dir>         Notes folder (overrides the config file).");
    println!("    --today <YYYY-MM-DD>  Pretend today is this day.");
    println!("    -q, --query <expr>    Only show tasks matching the expression.");
    println!("    --json                Print the timeline as JSON.");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, -vv               More logging on stderr.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("QUICK ENTRY (add):");
    println!("    due|start|scheduled|done|created <date>");
    println!("                      today, tomorrow, friday, next week, in 3 days, 2024-05-01");
    println!("    repeat <rule>     Recurrence text (repeat every week)");
    println!("    \\word             Keep a keyword literal");
    println!("    Use '-' as file to write to the inbox or today's daily note.");
    println!();
    println!("QUERY SYNTAX:");
    println!("    #tag  !high  !<=medium  due:<today  start:>=2024-01-01  done:2024-05-02!");
    println!("    is:done  is:open  is:overdue  path:work  section:inbox  \"exact phrase\"");
    println!("    a b (and)   a | b (or)   -a (not)   (a | b) c (grouping)");
}

fn format_day(date: NaiveDate, fmt: &str) -> String {
    let mut s = String::new();
    if write!(s, "{}", date.format(fmt)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    s
}

fn task_summary(task: &TaskRecord, config: &Config, today: NaiveDate) -> String {
    let mut s = config.strip_hidden_tags(&task.display_text);
    if let Some(p) = task.priority {
        let _ = write!(s, " {}", p.sigil());
    }
    if task.recurrence.is_some() {
        s.push_str(" 🔁");
    }
    if let Some(due) = task.due()
        && !task.completed
    {
        let _ = write!(s, " ({})", relative_label(due, today));
    }
    s
}

/// Plain text rendering: counters, then every non-empty day grouped by
/// year. Today is always printed.
pub fn render_text(timeline: &Timeline, config: &Config) -> String {
    let c = &timeline.counters;
    let mut out = format!(
        "{} tasks: {} todo, {} overdue, {} unplanned, {} done, {} cancelled\n",
        c.total, c.todo, c.overdue, c.unplanned, c.done, c.cancelled
    );
    for year in &timeline.year_views {
        let days: Vec<_> = year
            .days
            .iter()
            .filter_map(|d| timeline.day(*d))
            .filter(|b| b.is_today || !b.is_empty())
            .collect();
        if days.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n== {} ==", year.year);
        for bucket in days {
            let marker = if bucket.is_today { " (today)" } else { "" };
            let _ = writeln!(out, "{}{}", format_day(bucket.date, &config.date_format), marker);
            for entry in &bucket.entries {
                let task = &entry.task;
                let _ = writeln!(
                    out,
                    "  {} {} {}  [{}:{}]",
                    status_glyph(entry.status),
                    task.checkbox_symbol(),
                    task_summary(task, config, timeline.today),
                    task.path,
                    task.line() + 1
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_show_with_options() {
        let parsed = parse_args(&args("--vault notes --today 2024-01-15 --json -v")).unwrap();
        assert_eq!(parsed.vault, Some(PathBuf::from("notes")));
        assert_eq!(parsed.today, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert!(parsed.json);
        assert_eq!(parsed.verbose, 1);
        assert_eq!(parsed.command, Command::Show);
    }

    #[test]
    fn test_parse_add_and_toggle() {
        let parsed = parse_args(&args("add Inbox.md Buy milk due tomorrow")).unwrap();
        assert_eq!(
            parsed.command,
            Command::Add {
                file: Some("Inbox.md".into()),
                text: "Buy milk due tomorrow".into()
            }
        );
        let parsed = parse_args(&args("add - Call mom")).unwrap();
        assert_eq!(
            parsed.command,
            Command::Add {
                file: None,
                text: "Call mom".into()
            }
        );
        let parsed = parse_args(&args("toggle Inbox.md 3")).unwrap();
        assert_eq!(
            parsed.command,
            Command::Toggle {
                file: "Inbox.md".into(),
                line: 3
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args("--today 15/01/2024")).is_err());
        assert!(parse_args(&args("toggle Inbox.md 0")).is_err());
        assert!(parse_args(&args("add Inbox.md")).is_err());
        assert!(parse_args(&args("--vault")).is_err());
        assert!(parse_args(&args("frobnicate")).is_err());
    }
}
