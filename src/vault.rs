// File: ./src/vault.rs
// Filesystem collaborator: finds tasks in a folder of Markdown notes and
// writes new or toggled tasks back.
use crate::model::parser::{front_matter_tags, parse_tag, with_tag_sigil};
use crate::model::{DateKind, FrontMatter, LineContext, Position, SectionRef, TaskRecord, parse_line};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("heading regex"));

static WIKI_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|#]+)(?:[#|][^\]]*)?\]\]").expect("wiki link regex"));

static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").expect("markdown link regex"));

// prefix up to and including '[', the marker, the rest of the line
static CHECKBOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\s>]*(?:[-*+]|[0-9]+[.)]) +\[)(.)(\].*)$").expect("checkbox regex")
});

static DONE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*✅\u{FE0F}?\s*\d{4}-\d{2}-\d{2}").expect("done date regex")
});

static TRAILING_BLOCK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \^[a-zA-Z0-9-]+$").expect("block id regex"));

/// Which notes take part in a scan. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
}

impl ScanOptions {
    pub fn accepts_path(&self, path: &str) -> bool {
        (self.include_paths.is_empty()
            || self.include_paths.iter().any(|p| is_path_prefix(p, path)))
            && !self.exclude_paths.iter().any(|p| is_path_prefix(p, path))
    }

    pub fn accepts_tags(&self, file_tags: &[String]) -> bool {
        let has = |tag: &String| {
            let wanted = with_tag_sigil(tag);
            file_tags.iter().any(|t| *t == wanted)
        };
        (self.include_tags.is_empty() || self.include_tags.iter().any(has))
            && !self.exclude_tags.iter().any(has)
    }
}

/// `a/b` is a prefix of `a/b/c.md`, but not of `a/bc.md`.
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return true;
    }
    let mut segments = path.split('/');
    prefix.split('/').all(|p| segments.next() == Some(p))
}

/// Metadata of one note plus the tasks found in it.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub path: String,
    pub front_matter: FrontMatter,
    pub headings: Vec<SectionRef>,
    /// Body tags and front matter tags, `#` prefixed.
    pub tags: Vec<String>,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault-relative `/` separated paths of every note, sorted.
    pub fn markdown_files(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        collect_md_files(&self.root, &mut found)
            .with_context(|| format!("Failed to walk vault {:?}", self.root))?;
        let mut paths: Vec<String> = found
            .iter()
            .filter_map(|p| p.strip_prefix(&self.root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Runs one extraction pass over the vault. A note that cannot be read
    /// is logged and skipped.
    pub fn scan(&self, options: &ScanOptions) -> Result<Vec<TaskRecord>> {
        let mut tasks = Vec::new();
        let mut files = 0;
        for rel in self.markdown_files()? {
            if !options.accepts_path(&rel) {
                continue;
            }
            let content = match fs::read_to_string(self.root.join(&rel)) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Skipping unreadable note {}: {}", rel, e);
                    continue;
                }
            };
            let parsed = Self::parse_file(&rel, &content);
            if !options.accepts_tags(&parsed.tags) {
                continue;
            }
            files += 1;
            tasks.extend(parsed.tasks);
        }
        log::debug!("Scanned {} notes, found {} tasks", files, tasks.len());
        Ok(tasks)
    }

    /// Pure per-note step: builds the host caches and feeds every list line
    /// through the line parser.
    pub fn parse_file(path: &str, content: &str) -> ParsedFile {
        let lines: Vec<&str> = content.lines().collect();
        let (front_matter, body_start) = split_front_matter(path, &lines);

        let mut parsed = ParsedFile {
            path: path.to_string(),
            front_matter: front_matter.unwrap_or_default(),
            ..Default::default()
        };
        for tag in front_matter_tags(&parsed.front_matter) {
            push_unique(&mut parsed.tags, tag);
        }
        let fm = if parsed.front_matter.is_empty() {
            None
        } else {
            Some(parsed.front_matter.clone())
        };

        let mut fence: Option<&str> = None;
        let mut section: Option<SectionRef> = None;
        for (idx, line) in lines.iter().enumerate().skip(body_start) {
            let trimmed = line.trim_start();
            if let Some(open) = fence {
                if trimmed.starts_with(open) {
                    fence = None;
                }
                continue;
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
                continue;
            }
            if trimmed.starts_with("~~~") {
                fence = Some("~~~");
                continue;
            }
            if let Some(caps) = HEADING.captures(line) {
                let heading = SectionRef {
                    heading: caps[2].to_string(),
                    level: caps[1].len() as u8,
                    line: idx,
                };
                parsed.headings.push(heading.clone());
                section = Some(heading);
                continue;
            }

            let tags_here = line_tags(line);
            for tag in &tags_here {
                push_unique(&mut parsed.tags, tag.clone());
            }
            let links = line_links(line);
            let ctx = LineContext {
                path,
                section: section.as_ref(),
                position: Position::single_line(idx, line.chars().count()),
                out_links: &links,
                front_matter: fm.as_ref(),
                tags: &tags_here,
            };
            if let Some(task) = parse_line(line, &ctx) {
                parsed.tasks.push(task);
            }
        }
        parsed
    }

    /// Adds `- [ ] text` below `section` (a full heading line such as
    /// `## Tasks`). A missing heading is appended; a missing note is created.
    pub fn append_task(&self, path: &str, section: &str, text: &str) -> Result<()> {
        let full = self.root.join(path);
        let task = crate::quick_entry::task_line(text);
        let section = section.trim();

        if !full.exists() {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
            let content = if section.is_empty() {
                format!("{}\n", task)
            } else {
                format!("{}\n{}\n", section, task)
            };
            log::info!("Creating {} for new task", path);
            return with_lock(&full, || atomic_write(&full, content));
        }

        with_lock(&full, || {
            let content = fs::read_to_string(&full)
                .with_context(|| format!("Failed to read {:?}", full))?;
            let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
            let trailing_newline = lines.last().is_some_and(|l| l.is_empty());
            if trailing_newline {
                lines.pop();
            }

            let heading_at = if section.is_empty() {
                None
            } else {
                lines.iter().position(|l| l.trim_end_matches('\r').trim() == section)
            };
            match heading_at {
                Some(idx) => lines.insert(idx + 1, task.clone()),
                None => {
                    if !section.is_empty() {
                        lines.push(section.to_string());
                    }
                    lines.push(task.clone());
                }
            }

            let mut out = lines.join("\n");
            out.push('\n');
            atomic_write(&full, out)
        })
    }

    /// Flips the checkbox on `line` (0-based). Completing stamps today's done
    /// date; reopening removes it. Returns the rewritten line.
    pub fn toggle_task(&self, path: &str, line: usize, today: NaiveDate) -> Result<String> {
        let full = self.root.join(path);
        with_lock(&full, || {
            let content = fs::read_to_string(&full)
                .with_context(|| format!("Failed to read {:?}", full))?;
            let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
            let target = lines
                .get(line)
                .ok_or_else(|| anyhow::anyhow!("{} has no line {}", path, line))?;
            let toggled = toggle_line(target, today)
                .ok_or_else(|| anyhow::anyhow!("Line {} of {} is not a task", line, path))?;
            lines[line] = toggled.clone();
            atomic_write(&full, lines.join("\n"))?;
            log::debug!("Toggled {}:{}", path, line);
            Ok(toggled)
        })
    }
}

/// Toggle rule on a single line, keeping any `\r` ending in place.
pub fn toggle_line(line: &str, today: NaiveDate) -> Option<String> {
    let (line, cr) = match line.strip_suffix('\r') {
        Some(l) => (l, "\r"),
        None => (line, ""),
    };
    let caps = CHECKBOX.captures(line)?;
    let prefix = &caps[1];
    let marker = caps[2].chars().next()?;
    let rest = &caps[3];

    let toggled = if TaskRecord::is_completed_marker(marker) {
        let rest = DONE_DATE.replace_all(rest, "");
        format!("{} {}", prefix, rest)
    } else {
        let stamp = format!(" {} {}", DateKind::Done.sigil(), today.format("%Y-%m-%d"));
        let (body, block) = match TRAILING_BLOCK_ID.find(rest) {
            Some(m) => (&rest[..m.start()], m.as_str()),
            None => (rest, ""),
        };
        format!("{}x{}{}{}", prefix, body.trim_end(), stamp, block)
    };
    Some(format!("{}{}", toggled, cr))
}

fn split_front_matter(path: &str, lines: &[&str]) -> (Option<FrontMatter>, usize) {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return (None, 0);
    }
    let Some(end) = lines
        .iter()
        .skip(1)
        .position(|l| matches!(l.trim_end(), "---" | "..."))
    else {
        return (None, 0);
    };
    let end = end + 1;
    let yaml = lines[1..end].join("\n");
    if yaml.trim().is_empty() {
        return (Some(FrontMatter::new()), end + 1);
    }
    let parsed = serde_yaml::from_str::<serde_yaml::Value>(&yaml)
        .map_err(anyhow::Error::from)
        .and_then(|v| Ok(serde_json::to_value(v)?));
    match parsed {
        Ok(serde_json::Value::Object(map)) => (Some(map.into_iter().collect()), end + 1),
        Ok(_) => (Some(FrontMatter::new()), end + 1),
        Err(e) => {
            log::warn!("Ignoring malformed front matter in {}: {}", path, e);
            (None, end + 1)
        }
    }
}

fn line_tags(line: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for word in line.split_whitespace() {
        if let Some(tag) = parse_tag(word) {
            push_unique(&mut tags, tag);
        }
    }
    tags
}

fn line_links(line: &str) -> Vec<String> {
    let mut links = Vec::new();
    for caps in WIKI_LINK.captures_iter(line) {
        push_unique(&mut links, caps[1].trim().to_string());
    }
    for caps in MD_LINK.captures_iter(line) {
        push_unique(&mut links, caps[1].to_string());
    }
    links
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn collect_md_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_md_files(&path, out)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("md") {
            out.push(path);
        }
    }
    Ok(())
}

fn lock_path(file_path: &Path) -> PathBuf {
    let mut lock_path = file_path.to_path_buf();
    if let Some(ext) = lock_path.extension() {
        let mut new_ext = ext.to_os_string();
        new_ext.push(".lock");
        lock_path.set_extension(new_ext);
    } else {
        lock_path.set_extension("lock");
    }
    lock_path
}

/// Runs `f` while holding an exclusive advisory lock next to `file_path`.
pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let lock_path = lock_path(file_path);
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock {:?}", lock_path))?;

    file.lock_exclusive()?;
    let result = f();
    file.unlock()?;
    result
}

/// Atomic write: write to a sibling tmp file, then rename over the target.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).with_context(|| format!("Failed to write {:?}", tmp_path))?;
    fs::rename(&tmp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_path_prefix_is_segment_based() {
        assert!(is_path_prefix("work", "work/a.md"));
        assert!(is_path_prefix("work/", "work/sub/a.md"));
        assert!(!is_path_prefix("work", "workshop/a.md"));
        assert!(is_path_prefix("", "anything.md"));
    }

    #[test]
    fn test_toggle_line_completes_before_block_id() {
        let out = toggle_line("- [ ] Pay rent 📅 2024-03-01 ^rent", day(2024, 3, 2)).unwrap();
        assert_eq!(out, "- [x] Pay rent 📅 2024-03-01 ✅ 2024-03-02 ^rent");
    }

    #[test]
    fn test_toggle_line_reopens_and_strips_done_date() {
        let out = toggle_line("  * [x] Pay rent ✅ 2024-03-02\r", day(2024, 3, 5)).unwrap();
        assert_eq!(out, "  * [ ] Pay rent\r");
        assert_eq!(toggle_line("plain text", day(2024, 3, 5)), None);
    }

    #[test]
    fn test_links_are_collected() {
        let links = line_links("- [ ] read [[Books/Dune|Dune]] and [notes](notes.md)");
        assert_eq!(links, vec!["Books/Dune".to_string(), "notes.md".to_string()]);
    }
}
