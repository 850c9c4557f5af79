//! End-to-end tests driving the `tp` binary as a subprocess against a
//! throwaway data directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn tp(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tp"))
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("tp runs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn add_show_and_list() {
    let dir = TempDir::new().unwrap();
    // The two seed tasks take ids 1 and 2
    let out = tp(dir.path(), &["add", "Buy milk", "--priority", "high"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out).trim(), "3");

    let out = tp(dir.path(), &["show", "3"]);
    let text = stdout(&out);
    assert!(text.contains("Buy milk (#3)"));
    assert!(text.contains("priority: high"));

    let out = tp(dir.path(), &["list", "--search", "milk"]);
    let text = stdout(&out);
    assert!(text.contains("Buy milk"));
    assert!(!text.contains("Welcome"));
}

#[test]
fn toggle_done_and_undo() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "one thing"]);

    let out = tp(dir.path(), &["toggle", "3"]);
    assert_eq!(stdout(&out).trim(), "task 3 is now completed");

    let out = tp(dir.path(), &["list", "--status", "completed"]);
    assert!(stdout(&out).contains("one thing"));

    let out = tp(dir.path(), &["undo"]);
    assert!(stdout(&out).contains("undid:"));
    let out = tp(dir.path(), &["list", "--status", "completed"]);
    assert!(!stdout(&out).contains("one thing"));
}

#[test]
fn bulk_done_reports_only_real_changes() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "a"]);
    tp(dir.path(), &["add", "b"]);
    tp(dir.path(), &["toggle", "3"]);

    // 3 already completed, 99 unknown: only 4 actually changes
    let out = tp(dir.path(), &["done", "3", "4", "99"]);
    assert_eq!(stdout(&out).trim(), "completed 1 task(s)");
}

#[test]
fn bulk_all_flag_targets_the_current_view() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "write slides"]);
    tp(dir.path(), &["add", "book flights"]);
    tp(dir.path(), &["toggle", "3"]);

    // --all with a status narrows to the projection: the two seeds plus
    // "book flights" are pending, "write slides" is already done
    let out = tp(dir.path(), &["done", "--all", "--status", "pending"]);
    assert_eq!(stdout(&out).trim(), "completed 3 task(s)");
    let out = tp(dir.path(), &["list", "--status", "pending"]);
    assert_eq!(stdout(&out).trim(), "");

    // --all with a search deletes only the matching tasks
    let out = tp(dir.path(), &["rm", "--all", "--search", "welcome"]);
    assert_eq!(stdout(&out).trim(), "deleted 1 task(s)");
    let out = tp(dir.path(), &["list"]);
    assert!(!stdout(&out).contains("Welcome"));
    assert!(stdout(&out).contains("book flights"));

    // Naming ids and --all together is a usage error
    let out = tp(dir.path(), &["done", "3", "--all"]);
    assert!(!out.status.success());
}

#[test]
fn priority_all_flag_reprioritizes_the_view() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "sharpen pencils"]);

    let out = tp(dir.path(), &["priority", "urgent", "--all"]);
    assert_eq!(stdout(&out).trim(), "set urgent on 3 task(s)");
    let out = tp(dir.path(), &["show", "3"]);
    assert!(stdout(&out).contains("priority: urgent"));
}

#[test]
fn list_expand_shows_subtasks_inline() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "plan offsite"]);
    tp(dir.path(), &["sub", "add", "3", "pick a venue"]);

    let out = tp(dir.path(), &["list"]);
    assert!(!stdout(&out).contains("pick a venue"));

    let out = tp(dir.path(), &["list", "--expand", "3"]);
    let text = stdout(&out);
    assert!(text.contains("plan offsite"));
    assert!(text.contains("pick a venue"));
}

#[test]
fn unknown_ids_fail_with_an_error() {
    let dir = TempDir::new().unwrap();
    let out = tp(dir.path(), &["show", "42"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("error: no task with id 42"));

    let out = tp(dir.path(), &["edit", "42", "--title", "x"]);
    assert!(!out.status.success());
}

#[test]
fn export_import_round_trip_and_rejection() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "exported task"]);
    let file = dir.path().join("dump.json");
    let file = file.to_str().unwrap();

    let out = tp(dir.path(), &["export", file]);
    assert!(out.status.success(), "{}", stderr(&out));

    // Wipe via import of an empty list, then restore from the dump
    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, "[]").unwrap();
    tp(dir.path(), &["import", empty.to_str().unwrap()]);
    let out = tp(dir.path(), &["list"]);
    assert!(!stdout(&out).contains("exported task"));

    let out = tp(dir.path(), &["import", file]);
    assert!(out.status.success());
    let out = tp(dir.path(), &["list"]);
    assert!(stdout(&out).contains("exported task"));

    // A non-array document is rejected and changes nothing
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"not":"an array"}"#).unwrap();
    let out = tp(dir.path(), &["import", bad.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("top-level array"));
    let out = tp(dir.path(), &["list"]);
    assert!(stdout(&out).contains("exported task"));
}

#[test]
fn template_save_use_list() {
    let dir = TempDir::new().unwrap();
    tp(dir.path(), &["add", "Sprint planning", "--category", "work"]);
    tp(dir.path(), &["sub", "add", "3", "book the room"]);

    let out = tp(dir.path(), &["template", "save", "3"]);
    assert_eq!(stdout(&out).trim(), "1");

    let out = tp(dir.path(), &["template", "list"]);
    assert!(stdout(&out).contains("Sprint planning (Template)"));

    let out = tp(dir.path(), &["template", "use", "1"]);
    let new_id: u64 = stdout(&out).trim().parse().unwrap();
    let out = tp(dir.path(), &["show", &new_id.to_string()]);
    let text = stdout(&out);
    assert!(text.contains("Sprint planning"));
    assert!(!text.contains("(Template)"));
    assert!(text.contains("book the room"));
}

#[test]
fn theme_defaults_and_persists() {
    let dir = TempDir::new().unwrap();
    let out = tp(dir.path(), &["theme"]);
    assert_eq!(stdout(&out).trim(), "light");

    tp(dir.path(), &["theme", "dark"]);
    let out = tp(dir.path(), &["theme"]);
    assert_eq!(stdout(&out).trim(), "dark");

    let out = tp(dir.path(), &["theme", "mauve"]);
    assert!(!out.status.success());
}

#[test]
fn json_output_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let out = tp(dir.path(), &["add", "json me", "--json"]);
    let task: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(task["title"], "json me");
    assert_eq!(task["status"], "pending");

    let out = tp(dir.path(), &["list", "--json"]);
    let tasks: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 3);
}
