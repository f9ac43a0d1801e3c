// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::filter::SortSpec;
use crate::model::StatusOrder;
use crate::timeline::TimelineOptions;
use crate::vault::{ScanOptions, atomic_write, with_lock};
use anyhow::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;

fn default_sort() -> String {
    "order".to_string()
}
fn default_date_format() -> String {
    "%a, %b %-d".to_string()
}
fn default_true() -> bool {
    true
}
fn default_section() -> String {
    "## Tasks".to_string()
}
fn default_daily_note_format() -> String {
    "%Y-%m-%d".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Vault root. Relative paths resolve against the working directory.
    #[serde(default)]
    pub vault: Option<String>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    #[serde(default)]
    pub status_order: StatusOrder,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_true")]
    pub forward: bool,
    /// Extra notes offered as quick entry targets.
    #[serde(default)]
    pub task_files: Vec<String>,
    #[serde(default)]
    pub inbox: Option<String>,
    #[serde(default = "default_section")]
    pub section_for_new_tasks: String,
    #[serde(default)]
    pub daily_note_folder: String,
    #[serde(default = "default_daily_note_format")]
    pub daily_note_format: String,
    /// Tags stripped from rendered text.
    #[serde(default)]
    pub hide_tags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault: None,
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            status_order: StatusOrder::default(),
            sort: default_sort(),
            date_format: default_date_format(),
            forward: true,
            task_files: Vec::new(),
            inbox: None,
            section_for_new_tasks: default_section(),
            daily_note_folder: String::new(),
            daily_note_format: default_daily_note_format(),
            hide_tags: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        Self::from_toml_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        // Surface a bad sort expression at load time rather than on first render.
        SortSpec::parse(&config.sort)?;
        Ok(config)
    }

    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }
        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
        })
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            atomic_write(&path, toml_str)?;
            Ok(())
        })
    }

    pub fn status_order(&self) -> &StatusOrder {
        &self.status_order
    }

    /// Falls back to the default sort when the stored expression is invalid.
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::parse(&self.sort).unwrap_or_else(|e| {
            log::warn!("{}; sorting by order", e);
            SortSpec::default()
        })
    }

    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            status_order: self.status_order.clone(),
            sort: self.sort_spec(),
            forward: self.forward,
            counter_filter: None,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_paths: self.include_paths.clone(),
            exclude_paths: self.exclude_paths.clone(),
            include_tags: self.include_tags.clone(),
            exclude_tags: self.exclude_tags.clone(),
        }
    }

    /// Path of the daily note for `today`, or `None` when daily notes are off.
    pub fn daily_note_path(&self, today: NaiveDate) -> Option<String> {
        if self.daily_note_format.trim().is_empty() {
            return None;
        }
        let folder = self.daily_note_folder.trim_end_matches('/');
        let mut name = String::new();
        // chrono reports a bad format string as a fmt error
        if write!(name, "{}.md", today.format(&self.daily_note_format)).is_err() {
            log::warn!("Invalid daily note format '{}'", self.daily_note_format);
            return None;
        }
        if folder.is_empty() {
            Some(name)
        } else {
            Some(format!("{}/{}", folder, name))
        }
    }

    /// Notes a quick entry can target: task files, then the inbox, then
    /// today's daily note. No duplicates.
    pub fn quick_entry_files(&self, today: NaiveDate) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        let candidates = self
            .task_files
            .iter()
            .cloned()
            .chain(self.inbox.clone().filter(|i| !i.trim().is_empty()))
            .chain(self.daily_note_path(today));
        for file in candidates {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// Default quick entry target: the inbox if set, else the first candidate.
    pub fn default_entry_file(&self, today: NaiveDate) -> Option<String> {
        self.inbox
            .clone()
            .filter(|i| !i.trim().is_empty())
            .or_else(|| self.quick_entry_files(today).into_iter().next())
    }

    /// Removes hidden tags from a rendered line and tidies the spacing.
    pub fn strip_hidden_tags(&self, text: &str) -> String {
        if self.hide_tags.is_empty() {
            return text.to_string();
        }
        text.split_whitespace()
            .filter(|w| {
                !self
                    .hide_tags
                    .iter()
                    .any(|h| crate::model::parser::with_tag_sigil(h) == *w)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use crate::model::Status;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.date_format, "%a, %b %-d");
        assert!(config.forward);
    }

    #[test]
    fn test_status_order_and_sort_parse() {
        let config = Config::from_toml_str(
            r#"
status_order = ["done", "overdue"]
sort = "-priority, due"
"#,
        )
        .unwrap();
        assert_eq!(config.status_order().as_slice(), &[Status::Done, Status::Overdue]);
        assert_eq!(config.sort_spec().to_string(), "-priority, due");
    }

    #[test]
    fn test_rejects_unknown_status_and_sort_key() {
        assert!(Config::from_toml_str(r#"status_order = ["later"]"#).is_err());
        assert!(Config::from_toml_str(r#"sort = "colour""#).is_err());
    }

    #[test]
    fn test_quick_entry_files_dedup_and_daily_note() {
        let config = Config {
            task_files: vec!["Tasks.md".into(), "Inbox.md".into()],
            inbox: Some("Inbox.md".into()),
            daily_note_folder: "Daily/".into(),
            ..Config::default()
        };
        let today = day(2024, 3, 1);
        assert_eq!(
            config.quick_entry_files(today),
            vec!["Tasks.md", "Inbox.md", "Daily/2024-03-01.md"]
        );
        assert_eq!(config.default_entry_file(today).as_deref(), Some("Inbox.md"));
    }

    #[test]
    fn test_save_then_load() {
        let ctx = TestContext::new();
        assert!(Config::is_missing_config_error(&Config::load(&ctx).unwrap_err()));

        let config = Config {
            vault: Some("/notes".into()),
            hide_tags: vec!["#task".into()],
            ..Config::default()
        };
        config.save(&ctx).unwrap();
        assert_eq!(Config::load(&ctx).unwrap(), config);
    }

    #[test]
    fn test_strip_hidden_tags() {
        let config = Config {
            hide_tags: vec!["task".into()],
            ..Config::default()
        };
        assert_eq!(config.strip_hidden_tags("Buy #task milk #shop"), "Buy milk #shop");
    }
}
