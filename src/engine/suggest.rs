//! engine::suggest
//!
//! PR suggestions for branches about to be superseded by a stacked branch.
//!
//! When a new branch is stacked on a tracked entry that is still `active`,
//! has no PR, and carries commits of its own, that entry is ready to be
//! reviewed. The suggestion targets the entry's *own* base, so a deep
//! stack becomes a sequence of correctly targeted PRs. Nothing here talks
//! to a code host.

use serde::Serialize;

use crate::core::config::DEFAULT_MAX_BODY_COMMITS;
use crate::core::metadata::{BranchEntry, DependencyDocument};
use crate::core::stack::resolve_stack;

/// Suggested pull request content. Never submitted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PRSuggestion {
    /// Branch the PR would be opened from.
    pub head: String,
    pub title: String,
    pub body: String,
    /// Branch the PR would merge into.
    pub base: String,
}

/// What the suggestion builder needs to know about the repository.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    /// Set only for a child repository of a workspace.
    pub short_name: Option<String>,
    /// Subjects between the superseded entry's base and its tip, oldest first.
    pub commit_subjects: Vec<String>,
    pub max_body_commits: usize,
    pub stack_footer: bool,
}

impl Default for RepoMetadata {
    fn default() -> Self {
        Self {
            short_name: None,
            commit_subjects: Vec::new(),
            max_body_commits: DEFAULT_MAX_BODY_COMMITS,
            stack_footer: true,
        }
    }
}

/// Whether stacking on `superseded` should produce a suggestion.
///
/// `before` is the document as it was before the new branch was added. A
/// base that already had a branch stacked on it had its suggestion then.
pub fn should_suggest(
    before: &DependencyDocument,
    superseded: &BranchEntry,
    commit_subjects: &[String],
) -> bool {
    superseded.is_unsubmitted()
        && !commit_subjects.is_empty()
        && !before.branches.iter().any(|e| e.base_branch == superseded.name)
}

/// Build the suggestion for `superseded`.
///
/// # Example
///
/// ```
/// use specstack::core::metadata::DependencyDocument;
/// use specstack::core::stack::create_entry;
/// use specstack::core::types::{BranchName, SpecId};
/// use specstack::engine::suggest::{suggest, RepoMetadata};
///
/// let main = BranchName::new("main").unwrap();
/// let db = BranchName::new("feature/db").unwrap();
/// let spec = SpecId::new("001-user-auth").unwrap();
/// let doc = create_entry(&DependencyDocument::empty(), db.clone(), spec, main, None).unwrap();
///
/// let meta = RepoMetadata {
///     commit_subjects: vec!["feat(db): add users table".into()],
///     ..Default::default()
/// };
/// let s = suggest(&doc, &meta, doc.get(&db).unwrap());
/// assert_eq!(s.title, "Add users table");
/// assert_eq!(s.base, "main");
/// ```
pub fn suggest(
    doc: &DependencyDocument,
    meta: &RepoMetadata,
    superseded: &BranchEntry,
) -> PRSuggestion {
    let summary = summarize(&meta.commit_subjects)
        .unwrap_or_else(|| humanize_branch(superseded.name.leaf()));
    let title = match &meta.short_name {
        Some(short) => format!("[{}] {}", short, summary),
        None => summary,
    };

    PRSuggestion {
        head: superseded.name.to_string(),
        title,
        body: body(doc, meta, superseded),
        base: superseded.base_branch.to_string(),
    }
}

fn body(doc: &DependencyDocument, meta: &RepoMetadata, superseded: &BranchEntry) -> String {
    let limit = meta.max_body_commits.max(1);
    let mut lines: Vec<String> = meta
        .commit_subjects
        .iter()
        .take(limit)
        .map(|s| format!("- {}", s))
        .collect();
    if meta.commit_subjects.len() > limit {
        lines.push(format!(
            "- ...and {} more commits",
            meta.commit_subjects.len() - limit
        ));
    }

    if meta.stack_footer {
        let chain = resolve_stack(doc, &superseded.name);
        let root = chain
            .first()
            .map(|e| e.base_branch.to_string())
            .unwrap_or_else(|| superseded.base_branch.to_string());
        let stack: Vec<String> = std::iter::once(root)
            .chain(chain.iter().map(|e| e.name.to_string()))
            .collect();

        lines.push(String::new());
        lines.push(format!("Spec: {}", superseded.spec_id));
        lines.push(format!("Stack: {}", stack.join(" -> ")));
    }

    lines.join("\n")
}

/// Human summary of the most recent substantial subject.
fn summarize(subjects: &[String]) -> Option<String> {
    subjects
        .iter()
        .rev()
        .map(|s| s.trim())
        .find(|s| is_substantial(s))
        .map(|s| capitalize(strip_conventional_prefix(s)))
        .filter(|s| !s.is_empty())
}

fn is_substantial(subject: &str) -> bool {
    let lower = subject.to_ascii_lowercase();
    !(subject.is_empty()
        || lower.starts_with("fixup!")
        || lower.starts_with("squash!")
        || lower.starts_with("amend!")
        || lower.starts_with("merge ")
        || lower == "wip"
        || lower.starts_with("wip ")
        || lower.starts_with("wip:"))
}

/// `feat(api)!: add endpoint` -> `add endpoint`
fn strip_conventional_prefix(subject: &str) -> &str {
    let Some((prefix, rest)) = subject.split_once(": ") else {
        return subject;
    };
    let prefix = prefix.strip_suffix('!').unwrap_or(prefix);
    let kind = match prefix.split_once('(') {
        Some((kind, scope)) if scope.ends_with(')') => kind,
        Some(_) => return subject,
        None => prefix,
    };
    if !kind.is_empty() && kind.chars().all(|c| c.is_ascii_lowercase()) {
        rest.trim()
    } else {
        subject
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `001-user-auth_flow` -> `User auth flow`
fn humanize_branch(leaf: &str) -> String {
    let without_number = match leaf.split_once('-') {
        Some((num, rest)) if num.len() == 3 && num.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => leaf,
    };
    capitalize(&without_number.replace(['-', '_'], " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack::create_entry;
    use crate::core::types::{BranchName, SpecId};

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    fn chain_doc() -> DependencyDocument {
        let spec = SpecId::new("001-user-auth").unwrap();
        let doc = DependencyDocument::empty();
        let doc = create_entry(&doc, b("feature/db"), spec.clone(), b("main"), None).unwrap();
        create_entry(&doc, b("feature/api"), spec, b("feature/db"), None).unwrap()
    }

    fn meta(subjects: &[&str]) -> RepoMetadata {
        RepoMetadata {
            commit_subjects: subjects.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn base_is_superseded_entrys_own_base() {
        let doc = chain_doc();
        let api = doc.get(&b("feature/api")).unwrap();
        let s = suggest(&doc, &meta(&["Add endpoints"]), api);
        assert_eq!(s.base, "feature/db");
        assert_eq!(s.head, "feature/api");

        let db = doc.get(&b("feature/db")).unwrap();
        assert_eq!(suggest(&doc, &meta(&["x"]), db).base, "main");
    }

    #[test]
    fn title_prefix_only_for_child_repos() {
        let doc = chain_doc();
        let db = doc.get(&b("feature/db")).unwrap();

        let standalone = suggest(&doc, &meta(&["Add users table"]), db);
        assert_eq!(standalone.title, "Add users table");

        let mut child = meta(&["Add users table"]);
        child.short_name = Some("api".into());
        assert_eq!(suggest(&doc, &child, db).title, "[api] Add users table");
    }

    #[test]
    fn title_skips_noise_and_strips_prefix() {
        let doc = chain_doc();
        let db = doc.get(&b("feature/db")).unwrap();
        let m = meta(&[
            "fix(db): index email column",
            "fixup! fix(db): index email column",
            "Merge branch 'main' into feature/db",
            "WIP",
        ]);
        assert_eq!(suggest(&doc, &m, db).title, "Index email column");
    }

    #[test]
    fn title_falls_back_to_branch_name() {
        let doc = chain_doc();
        let db = doc.get(&b("feature/db")).unwrap();
        assert_eq!(suggest(&doc, &meta(&["wip"]), db).title, "Db");
        assert_eq!(humanize_branch("001-user-auth_flow"), "User auth flow");
    }

    #[test]
    fn body_lists_subjects_oldest_first_with_footer() {
        let doc = chain_doc();
        let api = doc.get(&b("feature/api")).unwrap();
        let s = suggest(&doc, &meta(&["First", "Second"]), api);

        assert_eq!(
            s.body,
            "- First\n- Second\n\nSpec: 001-user-auth\nStack: main -> feature/db -> feature/api"
        );
    }

    #[test]
    fn body_respects_limit_and_footer_toggle() {
        let doc = chain_doc();
        let db = doc.get(&b("feature/db")).unwrap();
        let mut m = meta(&["a", "b", "c"]);
        m.max_body_commits = 2;
        m.stack_footer = false;

        assert_eq!(suggest(&doc, &m, db).body, "- a\n- b\n- ...and 1 more commits");
    }

    #[test]
    fn non_conventional_colon_kept() {
        assert_eq!(strip_conventional_prefix("Fix: the thing"), "Fix: the thing");
        assert_eq!(strip_conventional_prefix("feat!: breaking"), "breaking");
        assert_eq!(strip_conventional_prefix("docs(readme): typo"), "typo");
    }

    #[test]
    fn trigger_requires_commits_and_unsubmitted() {
        let spec = SpecId::new("001-user-auth").unwrap();
        let before =
            create_entry(&DependencyDocument::empty(), b("feature/db"), spec, b("main"), None)
                .unwrap();
        let mut db = before.get(&b("feature/db")).unwrap().clone();
        assert!(should_suggest(&before, &db, &["x".into()]));
        assert!(!should_suggest(&before, &db, &[]));

        db.pr = Some(4);
        assert!(!should_suggest(&before, &db, &["x".into()]));
    }

    #[test]
    fn base_with_a_stacked_branch_already_had_its_turn() {
        let doc = chain_doc();
        let db = doc.get(&b("feature/db")).unwrap();
        assert!(!should_suggest(&doc, db, &["x".into()]));
    }
}
