//! Integration tests for engine operations.
//!
//! These tests run create, mark, import, and status against real git
//! repositories created with tempfile, through the git2-backed gateway.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use specstack::core::config::Config;
use specstack::core::metadata::BranchStatus;
use specstack::core::paths::ToolPaths;
use specstack::core::types::{BranchName, SpecId};
use specstack::engine::{
    self, CreateRequest, EngineError, ImportMode, ImportOutcome, MarkRequest, RepoHandle, RepoRole,
    Signal, Warning,
};
use specstack::git::{Git, RepositoryGateway};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A real git repository with an initial commit on main.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        init_repo(dir.path());
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn handle(&self) -> RepoHandle<Git> {
        handle_at(self.path())
    }

    fn add_remote(&self) {
        run_git(
            self.path(),
            &["remote", "add", "origin", "https://example.invalid/repo.git"],
        );
    }

    fn commit_on(&self, branch: &str, file: &str, message: &str) {
        run_git(self.path(), &["checkout", "-q", branch]);
        std::fs::write(self.path().join(file), message).unwrap();
        run_git(self.path(), &["add", file]);
        run_git(self.path(), &["commit", "-q", "-m", message]);
        run_git(self.path(), &["checkout", "-q", "main"]);
    }
}

fn init_repo(path: &Path) {
    std::fs::create_dir_all(path).unwrap();
    run_git(path, &["init", "-q", "-b", "main"]);
    run_git(path, &["config", "user.email", "test@example.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    std::fs::write(path.join("README.md"), "# Test Repo\n").unwrap();
    run_git(path, &["add", "README.md"]);
    run_git(path, &["commit", "-q", "-m", "Initial commit"]);
}

/// Open a handle without reading the user's global config.
fn handle_at(path: &Path) -> RepoHandle<Git> {
    let git = Git::open(path).expect("failed to open test repo");
    let root = git.work_dir().unwrap();
    let role = RepoRole::detect(&root).unwrap();
    let config = Config::load_from(None, Some(&ToolPaths::new(root.clone()))).unwrap();
    RepoHandle::from_parts(root, git, role, config)
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn req(name: &str, spec: &str, base: Option<&str>) -> CreateRequest {
    CreateRequest {
        name: name.into(),
        spec_id: spec.into(),
        base: base.map(str::to_string),
        ..Default::default()
    }
}

fn b(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

// =============================================================================
// create
// =============================================================================

#[test]
fn create_without_remote_warns_and_succeeds() {
    let repo = TestRepo::new();
    let handle = repo.handle();

    let outcome = engine::create(&handle, &req("feature/db", "001-user-auth", Some("main"))).unwrap();

    assert_eq!(outcome.signal(), Signal::CreatedWithWarning);
    let Warning::NoRemote { hint, .. } = &outcome.warnings[0] else {
        panic!("expected NoRemote warning, got {:?}", outcome.warnings[0]);
    };
    assert!(hint.contains("git remote add"));
    assert!(outcome.warnings[0].to_string().contains("No remote configured"));
    assert!(handle.gateway().ref_exists(&b("feature/db")));
    assert_eq!(handle.read().unwrap().branches.len(), 1);
}

#[test]
fn stacked_create_suggests_pr_against_trunk() {
    let repo = TestRepo::new();
    repo.add_remote();
    let handle = repo.handle();

    engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap();
    repo.commit_on("feature/db", "schema.sql", "feat(db): add users table");
    repo.commit_on("feature/db", "index.sql", "Index email column");

    let outcome =
        engine::create(&handle, &req("feature/api", "001-user-auth", Some("feature/db"))).unwrap();

    assert_eq!(outcome.signal(), Signal::CreatedWithSuggestion);
    let suggestion = outcome.suggestion.unwrap();
    assert_eq!(suggestion.base, "main");
    assert_eq!(suggestion.head, "feature/db");
    assert_eq!(suggestion.title, "Index email column");
    assert!(suggestion
        .body
        .starts_with("- feat(db): add users table\n- Index email column"));
    assert!(suggestion.body.contains("Stack: main -> feature/db"));
}

#[test]
fn no_suggestion_once_base_is_submitted() {
    let repo = TestRepo::new();
    repo.add_remote();
    let handle = repo.handle();

    engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap();
    repo.commit_on("feature/db", "schema.sql", "Add users table");
    engine::mark(
        &handle,
        &MarkRequest {
            name: "feature/db".into(),
            status: Some(BranchStatus::Submitted),
            pr: Some(3),
        },
    )
    .unwrap();

    let outcome =
        engine::create(&handle, &req("feature/api", "001-user-auth", Some("feature/db"))).unwrap();
    assert_eq!(outcome.signal(), Signal::Created);
    assert!(outcome.suggestion.is_none());
}

#[test]
fn cross_repository_base_rejected_with_alternatives() {
    let repo = TestRepo::new();
    let handle = repo.handle();
    engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap();
    engine::create(&handle, &req("feature/api", "001-user-auth", Some("feature/db"))).unwrap();
    let before = handle.read().unwrap();

    let err = engine::create(
        &handle,
        &req("feature/ui", "001-user-auth", Some("feature/db-from-other-repo")),
    )
    .unwrap_err();

    assert_eq!(err.signal(), Signal::ValidationRejected);
    let EngineError::InvalidBase(invalid) = &err else {
        panic!("expected InvalidBase, got {err:?}");
    };
    assert!(invalid.alternatives.len() >= 3);
    let message = err.to_string().to_lowercase();
    assert!(message.contains("merge to main"));
    assert!(message.contains("manual coordination"));

    assert_eq!(handle.read().unwrap(), before);
    assert!(!handle.gateway().ref_exists(&b("feature/ui")));
}

#[test]
fn duplicate_name_rejected() {
    let repo = TestRepo::new();
    let handle = repo.handle();
    engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap();

    let err = engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(handle.read().unwrap().branches.len(), 1);
}

#[test]
fn checkout_switches_head() {
    let repo = TestRepo::new();
    let handle = repo.handle();
    let mut request = req("feature/db", "001-user-auth", None);
    request.checkout = true;

    engine::create(&handle, &request).unwrap();
    assert_eq!(
        handle.gateway().current_branch().unwrap(),
        Some(b("feature/db"))
    );
}

#[test]
fn same_branch_name_in_two_repositories() {
    let one = TestRepo::new();
    let two = TestRepo::new();

    engine::create(&one.handle(), &req("api-v2", "001-one", None)).unwrap();
    engine::create(&two.handle(), &req("api-v2", "002-two", None)).unwrap();

    assert_eq!(one.handle().read().unwrap().branches[0].spec_id.as_str(), "001-one");
    assert_eq!(two.handle().read().unwrap().branches[0].spec_id.as_str(), "002-two");
}

// =============================================================================
// Workspace
// =============================================================================

struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Root repo listing `api` and `web` children (plus a missing `docs`).
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        init_repo(root);
        init_repo(&root.join("api"));
        init_repo(&root.join("web"));
        std::fs::create_dir_all(root.join(".specstack")).unwrap();
        std::fs::write(
            root.join(".specstack/workspace.toml"),
            "children = [\"api\", \"web\", \"docs\"]\n",
        )
        .unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }
}

#[test]
fn child_titles_are_prefixed_and_parent_spec_recorded() {
    let ws = TestWorkspace::new();
    let api = ws.root().join("api");
    run_git(
        &api,
        &["remote", "add", "origin", "https://example.invalid/api.git"],
    );
    let handle = handle_at(&api);
    assert_eq!(handle.role().short_name(), Some("api"));

    let mut first = req("feature/db", "004-api-auth", None);
    first.parent_spec_id = Some("001-user-auth".into());
    let created = engine::create(&handle, &first).unwrap();
    assert_eq!(
        created.entry.parent_spec_id.as_ref().map(|s| s.as_str()),
        Some("001-user-auth")
    );

    run_git(&api, &["checkout", "-q", "feature/db"]);
    std::fs::write(api.join("db.sql"), "create table users;").unwrap();
    run_git(&api, &["add", "db.sql"]);
    run_git(&api, &["commit", "-q", "-m", "Add users table"]);

    let outcome =
        engine::create(&handle, &req("feature/api", "004-api-auth", Some("feature/db"))).unwrap();
    assert_eq!(outcome.suggestion.unwrap().title, "[api] Add users table");
}

#[test]
fn workspace_status_lists_every_child() {
    let ws = TestWorkspace::new();
    let root = handle_at(ws.root());
    engine::create(&root, &req("feature/contract", "001-user-auth", None)).unwrap();
    engine::create(&handle_at(&ws.root().join("api")), &req("feature/db", "004-api-auth", None))
        .unwrap();

    let report = engine::workspace_status(&root).unwrap();
    let text = engine::render_workspace(&report.root, &report.children);

    assert!(text.contains("feature/contract [active]"));
    assert!(text.contains("child: api\n004-api-auth\n└── feature/db [active] (base: main)"));
    assert!(text.contains("child: web\n  no tracked branches"));
    assert!(text.contains("child: docs\n  unavailable:"));
    assert_eq!(report.signal(), Signal::Created);
}

#[test]
fn workspace_status_reports_corrupt_child() {
    let ws = TestWorkspace::new();
    let web = ws.root().join("web/.specstack");
    std::fs::create_dir_all(&web).unwrap();
    std::fs::write(web.join("dependencies.json"), "not json").unwrap();

    let report = engine::workspace_status(&handle_at(ws.root())).unwrap();
    let text = engine::render_workspace(&report.root, &report.children);
    assert!(text.contains("child: web\n  unavailable:"));
    assert_eq!(report.unreadable().count(), 1);
    assert_eq!(report.signal(), Signal::Failure);
}

#[test]
fn parent_spec_rejected_in_standalone_repo() {
    let repo = TestRepo::new();
    let mut request = req("feature/db", "001-user-auth", None);
    request.parent_spec_id = Some("002-other".into());

    let err = engine::create(&repo.handle(), &request).unwrap_err();
    assert_eq!(err.signal(), Signal::ValidationRejected);
}

// =============================================================================
// import
// =============================================================================

#[test]
fn import_infers_stack_from_history() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["branch", "feature/002-billing"]);
    repo.commit_on("feature/002-billing", "a.txt", "Billing model");
    run_git(repo.path(), &["branch", "feature/invoices", "feature/002-billing"]);
    repo.commit_on("feature/invoices", "b.txt", "Invoices");

    let handle = repo.handle();
    let interactive = engine::import(&handle, &ImportMode::Interactive).unwrap();
    assert_eq!(interactive.signal(), Signal::NeedsDisambiguation);
    assert!(!handle.store().path().exists());

    let outcome = engine::import(
        &handle,
        &ImportMode::Batch {
            default_spec: None,
            assignments: [(b("feature/invoices"), SpecId::new("002-billing").unwrap())]
                .into_iter()
                .collect(),
        },
    )
    .unwrap();
    let ImportOutcome::Imported { entries } = outcome else {
        panic!("expected entries");
    };
    assert_eq!(entries.len(), 2);

    let doc = handle.read().unwrap();
    assert_eq!(doc.get(&b("feature/002-billing")).unwrap().base_branch, b("main"));
    assert_eq!(
        doc.get(&b("feature/invoices")).unwrap().base_branch,
        b("feature/002-billing")
    );
}

#[test]
fn status_renders_single_repository() {
    let repo = TestRepo::new();
    let handle = repo.handle();
    engine::create(&handle, &req("feature/db", "001-user-auth", None)).unwrap();
    engine::create(&handle, &req("feature/api", "001-user-auth", Some("feature/db"))).unwrap();

    let section = engine::repository_status(&handle).unwrap();
    let text = engine::render_repository(&section.name, &section.document);
    assert!(text.contains("└── feature/db [active] (base: main)\n    └── feature/api [active]"));
}
