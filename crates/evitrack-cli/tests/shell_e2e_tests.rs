//! End-to-end tests for `evitrack tree` and `evitrack shell`
//!
//! The shell reads commands from piped stdin, so each test scripts a whole
//! session and checks what it printed and saved.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn evitrack(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("evitrack").unwrap();
    cmd.current_dir(dir.path())
        .env("EVITRACK_DATA_DIR", dir.path().join("data"))
        .env("EVITRACK_DOWNLOAD_DIR", dir.path().join("downloads"))
        .env_remove("EVITRACK_CATALOG")
        .env_remove("EVITRACK_LOG_LEVEL")
        .env("NO_COLOR", "1");
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

// ============================================================================
// Tree
// ============================================================================

#[test]
fn test_tree_collapsed_shows_roots() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["tree", "--variant", "clauses"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leadership"))
        .stdout(predicate::str::contains("Board-Minutes-Q1.pdf").not());
}

#[test]
fn test_tree_expand_all_shows_seed_evidence() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["tree", "--variant", "controls", "--expand-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Information-Security-Policy-v3.pdf"))
        .stdout(predicate::str::contains("preloaded"));
}

#[test]
fn test_tree_from_catalog_file() {
    let dir = TempDir::new().unwrap();
    let catalog = write_file(
        &dir,
        "catalog.yaml",
        b"variant: controls\nnodes:\n  - id: \"A.1\"\n    title: Custom control\n    evidence:\n      - name: Custom-Evidence.pdf\n        date: Jan 2, 2026\n        shared_by: Auditor\n",
    );

    evitrack(&dir)
        .env("EVITRACK_CATALOG", &catalog)
        .args(["tree", "--expand-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Custom control"))
        .stdout(predicate::str::contains("Custom-Evidence.pdf"));
}

#[test]
fn test_tree_with_missing_catalog_file_fails() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .env("EVITRACK_CATALOG", dir.path().join("missing.yaml"))
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ============================================================================
// Shell
// ============================================================================

#[test]
fn test_shell_controls_protects_preloaded_evidence() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "fileA.pdf", b"scan");
    let script = format!("attach 5.1 {}\ndelete 5.1 0\ntoggle 5\ntree\nquit\n", file);

    evitrack(&dir)
        .args(["shell", "--variant", "controls", "--yes"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file attached to 5.1"))
        .stderr(predicate::str::contains("cannot be deleted"))
        .stdout(predicate::str::contains("[2] fileA.pdf"));
}

#[test]
fn test_shell_attaches_quoted_path_with_spaces() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "Risk Register Q3.xlsx", b"rows");
    let script = format!("attach 5.3 \"{}\"\ntoggle 5\ntree\n", file);

    evitrack(&dir)
        .args(["shell", "--variant", "controls"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file attached to 5.3"))
        .stdout(predicate::str::contains("Risk Register Q3.xlsx"));
}

#[test]
fn test_shell_deletes_uploaded_evidence() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "fileA.pdf", b"scan");
    let script = format!("attach 5.1 {}\ndelete 5.1 2\ntoggle 5\ntree\n", file);

    evitrack(&dir)
        .args(["shell", "--variant", "controls", "--yes"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 'fileA.pdf' from 5.1"))
        .stdout(predicate::str::contains("[2] fileA.pdf").not());
}

#[test]
fn test_shell_clauses_deletes_preloaded_evidence() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["shell", "--variant", "clauses", "--yes"])
        .write_stdin("delete 5.1 0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 'Board-Minutes-Q1.pdf' from 5.1"));
}

#[test]
fn test_shell_delete_without_confirmation_is_cancelled() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["shell", "--variant", "clauses"])
        .write_stdin("delete 5.1 0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deletion cancelled"));
}

#[test]
fn test_shell_download_saves_uploaded_bytes() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "report.txt", b"quarterly numbers");
    let script = format!("attach 9.1 {}\ndownload 9.1 0\n", file);

    evitrack(&dir)
        .args(["shell", "--variant", "clauses", "--yes"])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 'report.txt'"));

    let saved = dir.path().join("downloads").join("report.txt");
    assert_eq!(std::fs::read(saved).unwrap(), b"quarterly numbers");
}

#[test]
fn test_shell_download_preloaded_is_simulated() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["shell", "--variant", "controls"])
        .write_stdin("download 5.1 0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download initiated for 'Information-Security-Policy-v3.pdf'"));

    assert!(!dir.path().join("downloads").exists());
}

#[test]
fn test_shell_reports_bad_lines_and_keeps_going() {
    let dir = TempDir::new().unwrap();

    evitrack(&dir)
        .args(["shell", "--yes"])
        .write_stdin("frobnicate\nledger add Policy.pdf\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("could not understand"))
        .stdout(predicate::str::contains("Added 'Policy.pdf'"));
}

#[test]
fn test_shell_uploads_are_not_persisted() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "fileA.pdf", b"scan");

    evitrack(&dir)
        .args(["shell", "--variant", "controls", "--yes"])
        .write_stdin(format!("attach 5.3 {}\n", file))
        .assert()
        .success();

    evitrack(&dir)
        .args(["shell", "--variant", "controls"])
        .write_stdin("toggle 5\ntoggle 5.3\ntree\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("fileA.pdf").not());
}
