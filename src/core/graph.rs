//! core::graph
//!
//! Base-branch graph over tracked entries.
//!
//! # Architecture
//!
//! - Nodes are branch names (tracked entries plus the refs they stack on)
//! - Edges point from an entry to its base branch
//! - Anything that is never itself a child is a root (trunk, or an
//!   untracked local branch)
//!
//! Children sets are kept in insertion order so rendering follows creation
//! order.

use std::collections::{HashMap, HashSet};

use super::types::BranchName;

/// The base-branch graph derived from a dependency document.
#[derive(Debug, Default)]
pub struct StackGraph {
    /// Base pointer for each tracked branch
    parents: HashMap<BranchName, BranchName>,
    /// Children in insertion order (derived from parents)
    children: HashMap<BranchName, Vec<BranchName>>,
    /// Tracked branches in insertion order
    order: Vec<BranchName>,
}

impl StackGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `child` is based on `parent`.
    ///
    /// Re-adding a child replaces its previous edge.
    pub fn add_edge(&mut self, child: BranchName, parent: BranchName) {
        if let Some(old) = self.parents.insert(child.clone(), parent.clone()) {
            if let Some(kids) = self.children.get_mut(&old) {
                kids.retain(|k| k != &child);
            }
        } else {
            self.order.push(child.clone());
        }
        self.children.entry(parent).or_default().push(child);
    }

    /// Get the branches based directly on `branch`, in insertion order.
    pub fn children(&self, branch: &BranchName) -> &[BranchName] {
        self.children.get(branch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether following base pointers ever revisits a branch.
    ///
    /// Returns `Some(branch)` naming a branch from which a cycle is reachable.
    pub fn find_cycle(&self) -> Option<BranchName> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for branch in &self.order {
            if self.has_cycle_from(branch, &mut visited, &mut path) {
                return Some(branch.clone());
            }
        }
        None
    }

    fn has_cycle_from(
        &self,
        branch: &BranchName,
        visited: &mut HashSet<BranchName>,
        path: &mut HashSet<BranchName>,
    ) -> bool {
        if path.contains(branch) {
            return true;
        }
        if !visited.insert(branch.clone()) {
            return false;
        }

        path.insert(branch.clone());
        if let Some(parent) = self.parents.get(branch) {
            if self.has_cycle_from(parent, visited, path) {
                return true;
            }
        }
        path.remove(branch);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        assert!(StackGraph::new().find_cycle().is_none());
    }

    #[test]
    fn linear_chain_has_no_cycles() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("a"), b("main"));
        graph.add_edge(b("b"), b("a"));

        assert!(graph.find_cycle().is_none());
        assert_eq!(graph.children(&b("a")), &[b("b")]);
    }

    #[test]
    fn two_node_cycle_detected() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("a"), b("b"));
        graph.add_edge(b("b"), b("a"));
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn self_loop_detected() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("a"), b("a"));
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn cycle_behind_a_tail_detected() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("tail"), b("a"));
        graph.add_edge(b("a"), b("b"));
        graph.add_edge(b("b"), b("c"));
        graph.add_edge(b("c"), b("a"));
        assert_eq!(graph.find_cycle(), Some(b("tail")));
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("z"), b("main"));
        graph.add_edge(b("a"), b("main"));
        graph.add_edge(b("m"), b("main"));

        assert_eq!(graph.children(&b("main")), &[b("z"), b("a"), b("m")]);
        assert!(graph.children(&b("a")).is_empty());
    }

    #[test]
    fn re_adding_edge_moves_child() {
        let mut graph = StackGraph::new();
        graph.add_edge(b("x"), b("main"));
        graph.add_edge(b("x"), b("dev"));

        assert!(graph.children(&b("main")).is_empty());
        assert_eq!(graph.children(&b("dev")), &[b("x")]);
    }
}
