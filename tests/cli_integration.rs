//! CLI integration tests.
//!
//! These run the `specstack` binary against real git repositories and
//! check stdout, stderr, and exit codes.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-q", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-q", "-m", "Initial commit"]);
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The binary, isolated from the user's global config.
    fn specstack(&self) -> Command {
        let mut cmd = Command::cargo_bin("specstack").unwrap();
        cmd.current_dir(self.path())
            .env("SPECSTACK_CONFIG", self.path().join("no-such-config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn commit_on(&self, branch: &str, message: &str) {
        let file = format!("{}.txt", branch.replace('/', "-"));
        run_git(self.path(), &["checkout", "-q", branch]);
        std::fs::write(self.path().join(&file), message).unwrap();
        run_git(self.path(), &["add", &file]);
        run_git(self.path(), &["commit", "-q", "-m", message]);
        run_git(self.path(), &["checkout", "-q", "main"]);
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

#[test]
fn create_without_remote_exits_with_warning_code() {
    let repo = TestRepo::new();

    repo.specstack()
        .args(["create", "feature/db", "--spec", "001-user-auth"])
        .assert()
        .code(11)
        .stdout(predicate::str::contains("Created 'feature/db' on 'main'"))
        .stderr(predicate::str::contains("No remote configured"))
        .stderr(predicate::str::contains("git remote add origin"));

    assert!(repo.path().join(".specstack/dependencies.json").exists());
}

#[test]
fn stacked_create_prints_suggestion() {
    let repo = TestRepo::new();
    run_git(
        repo.path(),
        &["remote", "add", "origin", "https://example.invalid/r.git"],
    );

    repo.specstack()
        .args(["create", "feature/db", "--spec", "001-user-auth"])
        .assert()
        .code(0);
    repo.commit_on("feature/db", "Add users table");

    repo.specstack()
        .args([
            "create",
            "feature/api",
            "--spec",
            "001-user-auth",
            "--base",
            "feature/db",
        ])
        .assert()
        .code(10)
        .stdout(predicate::str::contains("base:  main"))
        .stdout(predicate::str::contains("title: Add users table"));
}

#[test]
fn json_output_carries_signal_and_suggestion() {
    let repo = TestRepo::new();
    run_git(
        repo.path(),
        &["remote", "add", "origin", "https://example.invalid/r.git"],
    );
    repo.specstack()
        .args(["create", "feature/db", "--spec", "001-user-auth"])
        .assert()
        .success();
    repo.commit_on("feature/db", "Add users table");

    let output = repo
        .specstack()
        .args([
            "--json",
            "create",
            "feature/api",
            "--spec",
            "001-user-auth",
            "--base",
            "feature/db",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(10));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["signal"], "created_with_suggestion");
    assert_eq!(value["exitCode"], 10);
    assert_eq!(value["result"]["suggestion"]["base"], "main");
    assert_eq!(value["result"]["entry"]["baseBranch"], "feature/db");
}

#[test]
fn foreign_base_is_rejected_with_alternatives() {
    let repo = TestRepo::new();

    repo.specstack()
        .args([
            "create",
            "feature/ui",
            "--spec",
            "001-user-auth",
            "--base",
            "feature/db-from-other-repo",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Alternatives:"))
        .stderr(predicate::str::contains("manual coordination"));

    assert!(!repo.path().join(".specstack/dependencies.json").exists());
}

#[test]
fn invalid_spec_id_is_rejected() {
    let repo = TestRepo::new();
    repo.specstack()
        .args(["create", "feature/db", "--spec", "UserAuth"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("NNN-kebab-name"));
}

#[test]
fn corrupt_document_is_a_failure() {
    let repo = TestRepo::new();
    std::fs::create_dir_all(repo.path().join(".specstack")).unwrap();
    std::fs::write(repo.path().join(".specstack/dependencies.json"), "{oops").unwrap();

    repo.specstack()
        .args(["status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn workspace_status_with_corrupt_child_fails() {
    let repo = TestRepo::new();
    let web = repo.path().join("web");
    std::fs::create_dir_all(web.join(".specstack")).unwrap();
    run_git(&web, &["init", "-q", "-b", "main"]);
    std::fs::write(web.join(".specstack/dependencies.json"), "not json").unwrap();
    std::fs::create_dir_all(repo.path().join(".specstack")).unwrap();
    std::fs::write(
        repo.path().join(".specstack/workspace.toml"),
        "children = [\"web\"]\n",
    )
    .unwrap();

    repo.specstack()
        .args(["status", "--workspace"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("child: web\n  unavailable:"))
        .stderr(predicate::str::contains("child 'web' is unreadable"));

    let output = repo
        .specstack()
        .args(["--json", "status", "--workspace"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["signal"], "failure");
    assert_eq!(value["result"]["children"][0]["status"]["state"], "unreadable");
}

#[test]
fn status_and_mark() {
    let repo = TestRepo::new();
    repo.specstack()
        .args(["-q", "create", "feature/db", "--spec", "001-user-auth"])
        .assert()
        .code(11)
        .stdout(predicate::str::is_empty());

    repo.specstack()
        .args(["mark", "feature/db", "--pr", "42", "--status", "submitted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feature/db [submitted] #42"));

    repo.specstack()
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("001-user-auth"))
        .stdout(predicate::str::contains(
            "└── feature/db [submitted] #42 (base: main)",
        ));
}

#[test]
fn mark_untracked_branch_is_rejected() {
    let repo = TestRepo::new();
    repo.specstack()
        .args(["mark", "feature/nope", "--pr", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not tracked"));
}

#[test]
fn import_lists_then_applies() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["branch", "feature/003-search"]);
    repo.commit_on("feature/003-search", "Search index");

    repo.specstack()
        .args(["import"])
        .assert()
        .code(12)
        .stdout(predicate::str::contains("feature/003-search  base: main  spec: 003-search"));
    assert!(!repo.path().join(".specstack").exists());

    repo.specstack()
        .args(["import", "--batch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 'feature/003-search'"));

    repo.specstack()
        .args(["import", "--batch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No untracked branches"));
}

#[test]
fn status_outside_a_repository_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("specstack")
        .unwrap()
        .current_dir(dir.path())
        .env("SPECSTACK_CONFIG", dir.path().join("none.toml"))
        .args(["status"])
        .assert()
        .code(1);
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("specstack")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("specstack"));
}
