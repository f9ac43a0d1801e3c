// Tests for scanning a notes folder and writing tasks back to it.
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use taskline::vault::{ScanOptions, Vault};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const PROJECT_NOTE: &str = "---
tags: [work]
order: 2
---
# Alpha

Intro text with a [[Roadmap]] link.

## Inbox
- [ ] Draft spec 📅 2024-01-20 #writing
- not a task
```
- [ ] inside a fence
```
1. [x] Kickoff ✅ 2024-01-02
";

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "projects/alpha.md", PROJECT_NOTE);
    write(root, "home.md", "- [ ] Fix sink #home\n- [ ] Read [[Books/Dune|Dune]]\n");
    write(root, "archive/old.md", "- [ ] ancient 📅 2019-01-01\n");
    write(root, ".obsidian/cache.md", "- [ ] hidden\n");
    write(root, "projects/readme.txt", "- [ ] not markdown\n");
    dir
}

#[test]
fn test_scan_collects_tasks_in_path_order() {
    let dir = fixture();
    let vault = Vault::open(dir.path());
    let tasks = vault.scan(&ScanOptions::default()).unwrap();

    let seen: Vec<(&str, &str)> = tasks
        .iter()
        .map(|t| (t.path.as_str(), t.display_text.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("archive/old.md", "ancient"),
            ("home.md", "Fix sink #home"),
            ("home.md", "Read [[Books/Dune|Dune]]"),
            ("projects/alpha.md", "Draft spec #writing"),
            ("projects/alpha.md", "Kickoff"),
        ]
    );
}

#[test]
fn test_scan_fills_host_caches() {
    let dir = fixture();
    let tasks = Vault::open(dir.path())
        .scan(&ScanOptions {
            include_paths: vec!["projects".into()],
            ..ScanOptions::default()
        })
        .unwrap();
    assert_eq!(tasks.len(), 2);

    let draft = &tasks[0];
    assert_eq!(draft.line(), 9);
    let section = draft.section.as_ref().unwrap();
    assert_eq!(section.heading, "Inbox");
    assert_eq!(section.level, 2);
    assert_eq!(section.line, 8);
    assert_eq!(draft.tags, vec!["#writing", "#work"]);
    assert_eq!(draft.order, 2.0);

    let kickoff = &tasks[1];
    assert!(kickoff.completed);
    assert_eq!(kickoff.list_marker, "1.");
}

#[test]
fn test_scan_filters() {
    let dir = fixture();
    let vault = Vault::open(dir.path());

    let excluded = vault
        .scan(&ScanOptions {
            exclude_paths: vec!["archive".into(), "projects/alpha.md".into()],
            ..ScanOptions::default()
        })
        .unwrap();
    assert!(excluded.iter().all(|t| t.path == "home.md"));

    let tagged = vault
        .scan(&ScanOptions {
            include_tags: vec!["work".into()],
            ..ScanOptions::default()
        })
        .unwrap();
    assert!(tagged.iter().all(|t| t.path == "projects/alpha.md"));
    assert_eq!(tagged.len(), 2);

    let untagged = vault
        .scan(&ScanOptions {
            exclude_tags: vec!["#home".into()],
            ..ScanOptions::default()
        })
        .unwrap();
    assert!(untagged.iter().all(|t| t.path != "home.md"));
}

#[test]
fn test_parse_file_links_and_headings() {
    let parsed = Vault::parse_file("home.md", "# Top\n- [ ] Read [[Books/Dune|Dune]] and [x](notes.md)\n");
    assert_eq!(parsed.headings.len(), 1);
    assert_eq!(parsed.tasks.len(), 1);
    assert_eq!(parsed.tasks[0].out_links, vec!["Books/Dune", "notes.md"]);
    assert_eq!(parsed.tasks[0].section.as_ref().unwrap().heading, "Top");
}

#[test]
fn test_bad_front_matter_is_ignored() {
    let parsed = Vault::parse_file("x.md", "---\ntags: [unclosed\n---\n- [ ] still parsed\n");
    assert!(parsed.front_matter.is_empty());
    assert_eq!(parsed.tasks.len(), 1);
    assert_eq!(parsed.tasks[0].line(), 3);
}

#[test]
fn test_unreadable_note_is_skipped() {
    let dir = fixture();
    fs::write(dir.path().join("broken.md"), [0xff, 0xfe, 0xfd]).unwrap();
    let tasks = Vault::open(dir.path()).scan(&ScanOptions::default()).unwrap();
    assert_eq!(tasks.len(), 5);
}

#[test]
fn test_missing_vault_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::open(dir.path().join("nope"));
    assert!(vault.scan(&ScanOptions::default()).is_err());
}

#[test]
fn test_append_under_existing_heading() {
    let dir = fixture();
    let vault = Vault::open(dir.path());
    vault.append_task("projects/alpha.md", "## Inbox", "New idea").unwrap();

    let content = fs::read_to_string(dir.path().join("projects/alpha.md")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[8], "## Inbox");
    assert_eq!(lines[9], "- [ ] New idea");
    assert_eq!(lines[10], "- [ ] Draft spec 📅 2024-01-20 #writing");
}

#[test]
fn test_append_adds_missing_heading_and_file() {
    let dir = fixture();
    let vault = Vault::open(dir.path());

    vault.append_task("home.md", "## Tasks", "Call mom").unwrap();
    let content = fs::read_to_string(dir.path().join("home.md")).unwrap();
    assert!(content.ends_with("## Tasks\n- [ ] Call mom\n"));

    vault.append_task("daily/2024-01-15.md", "## Tasks", "Stretch").unwrap();
    let created = fs::read_to_string(dir.path().join("daily/2024-01-15.md")).unwrap();
    assert_eq!(created, "## Tasks\n- [ ] Stretch\n");

    let rescanned = vault.scan(&ScanOptions::default()).unwrap();
    assert!(rescanned.iter().any(|t| t.display_text == "Stretch"));
}

#[test]
fn test_toggle_round_trip() {
    let dir = fixture();
    let vault = Vault::open(dir.path());

    let done = vault.toggle_task("home.md", 0, day(2024, 1, 15)).unwrap();
    assert_eq!(done, "- [x] Fix sink #home ✅ 2024-01-15");

    let reopened = vault.toggle_task("home.md", 0, day(2024, 1, 16)).unwrap();
    assert_eq!(reopened, "- [ ] Fix sink #home");

    let content = fs::read_to_string(dir.path().join("home.md")).unwrap();
    assert_eq!(content, "- [ ] Fix sink #home\n- [ ] Read [[Books/Dune|Dune]]\n");
}

#[test]
fn test_toggle_rejects_non_tasks() {
    let dir = fixture();
    let vault = Vault::open(dir.path());
    assert!(vault.toggle_task("projects/alpha.md", 4, day(2024, 1, 15)).is_err());
    assert!(vault.toggle_task("home.md", 99, day(2024, 1, 15)).is_err());
}
