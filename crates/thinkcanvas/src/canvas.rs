use crate::compress::DEFAULT_COMPRESSION_LENGTH;
use crate::history::{History, Snapshot};
use crate::types::{Node, now_iso8601};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The full thinking graph: every node, the root pointer, and the focus path.
///
/// `nodes` is the sole owner of node data. `root_id`, `active_path`, and
/// every relational field on a node are id keys into it.
///
/// Invariants after every public call:
///
/// - at most one [`NodeKind::Root`](crate::types::NodeKind::Root) node;
/// - `n.parent_id == Some(p)` implies `p` exists and lists `n` in
///   `children_ids`, and the reverse;
/// - `active_path` is empty or a parent-linked chain starting at `root_id`;
/// - deleting a node removes its whole subtree.
///
/// The canvas is a single-writer structure with no internal locking; callers
/// serialize mutations themselves.
///
/// # JSON shape
///
/// ```json
/// {
///   "name": "todo-app",
///   "nodes": { "3f9a0c12": { "id": "3f9a0c12", "type": "root", … } },
///   "root_id": "3f9a0c12",
///   "active_path": ["3f9a0c12"],
///   "created_at": "2026-01-29T10:00:00Z",
///   "compress_length": 100
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub name: String,
    #[serde(default)]
    pub nodes: IndexMap<String, Node>,
    #[serde(default)]
    pub root_id: Option<String>,
    #[serde(default)]
    pub active_path: Vec<String>,
    #[serde(default = "now_iso8601")]
    pub created_at: String,
    #[serde(default = "default_compress_length")]
    pub compress_length: usize,
    /// Directory the root content was imported from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,
    /// File the root content was imported from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip)]
    history: History,
}

fn default_compress_length() -> usize {
    DEFAULT_COMPRESSION_LENGTH
}

impl Canvas {
    /// Create an empty canvas with no root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            root_id: None,
            active_path: Vec::new(),
            created_at: now_iso8601(),
            compress_length: DEFAULT_COMPRESSION_LENGTH,
            source_directory: None,
            source_file: None,
            history: History::default(),
        }
    }

    /// Set the preview length used when node content is edited or reloaded.
    pub fn with_compress_length(mut self, compress_length: usize) -> Self {
        self.compress_length = compress_length;
        self
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.root_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    // ── Undo/redo ──────────────────────────────────────────────────────

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            root_id: self.root_id.clone(),
            active_path: self.active_path.clone(),
        }
    }

    fn restore(&mut self, state: Snapshot) {
        self.nodes = state.nodes;
        self.root_id = state.root_id;
        self.active_path = state.active_path;
    }

    fn push_undo(&mut self) {
        let before = self.snapshot();
        self.history.record(before);
    }

    /// Restore the state before the most recent recorded mutation.
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                tracing::debug!(canvas = %self.name, "undo");
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone mutation.
    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                tracing::debug!(canvas = %self.name, "redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Node lifecycle ─────────────────────────────────────────────────

    /// Insert a node, appending it to its parent's children.
    ///
    /// A root node becomes `root_id` and resets the focus to itself.
    /// Returns `false` (and changes nothing) for a duplicate id, a second
    /// root, or a non-root node whose parent is not on the canvas.
    ///
    /// Re-adding an id already on the canvas is a no-op rather than a
    /// replacing insert: the stored node is kept as is, the parent's
    /// `children_ids` never gains a second entry, and no undo step is
    /// recorded.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            tracing::warn!(node_id = %node.id, "rejected node with duplicate id");
            return false;
        }
        if node.kind.is_root() {
            if self.root().is_some() {
                tracing::warn!(node_id = %node.id, "rejected second root node");
                return false;
            }
        } else if !node
            .parent_id
            .as_deref()
            .is_some_and(|p| self.nodes.contains_key(p))
        {
            tracing::warn!(node_id = %node.id, parent_id = ?node.parent_id, "rejected node without a parent on the canvas");
            return false;
        }

        self.push_undo();

        if let Some(parent) = node
            .parent_id
            .as_deref()
            .and_then(|p| self.nodes.get_mut(p))
            && !parent.children_ids.contains(&node.id)
        {
            parent.children_ids.push(node.id.clone());
        }
        if node.kind.is_root() {
            self.root_id = Some(node.id.clone());
            self.active_path = vec![node.id.clone()];
        }
        tracing::debug!(node_id = %node.id, kind = %node.kind, "added node");
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Delete a node and its entire subtree.
    ///
    /// Returns the id the focus should move to (the deleted node's parent),
    /// or `None` when nothing was deleted: the id is unknown or is the root.
    /// If the deleted node was on the active path the focus moves there.
    /// Cross-links pointing into the deleted subtree are pruned.
    pub fn delete_node(&mut self, node_id: &str) -> Option<String> {
        let node = self.nodes.get(node_id)?;
        if node.kind.is_root() || self.root_id.as_deref() == Some(node_id) {
            return None;
        }
        let parent_id = node.parent_id.clone();

        self.push_undo();

        let mut doomed: HashSet<String> = self.collect_descendants(node_id).into_iter().collect();
        doomed.insert(node_id.to_string());

        if let Some(parent) = parent_id.as_deref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children_ids.retain(|c| !doomed.contains(c));
        }
        self.nodes.retain(|id, _| !doomed.contains(id));
        for remaining in self.nodes.values_mut() {
            remaining.links_to.retain(|l| !doomed.contains(l));
        }

        if self.active_path.iter().any(|id| id == node_id) {
            let refocus = parent_id.clone().or_else(|| self.root_id.clone());
            match refocus {
                Some(target) => {
                    self.set_focus(&target);
                }
                None => self.active_path.clear(),
            }
        }

        tracing::debug!(node_id, removed = doomed.len(), "deleted subtree");
        parent_id
    }

    /// All descendant ids of `node_id` (exclusive), via an explicit worklist.
    pub fn collect_descendants(&self, node_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = match self.nodes.get(node_id) {
            Some(node) => node.children_ids.iter().map(String::as_str).collect(),
            None => return result,
        };

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            result.push(id.to_string());
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children_ids.iter().map(String::as_str));
            }
        }

        result
    }

    /// Replace a node's content and re-derive its preview.
    pub fn edit_node(&mut self, node_id: &str, new_content: impl Into<String>) -> bool {
        if !self.nodes.contains_key(node_id) {
            return false;
        }
        self.push_undo();
        let compress_length = self.compress_length;
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.update_content(new_content, compress_length);
        }
        tracing::debug!(node_id, "edited node");
        true
    }

    /// Flip a node's `excluded` flag, returning the new value.
    pub fn toggle_excluded(&mut self, node_id: &str) -> Option<bool> {
        if !self.nodes.contains_key(node_id) {
            return None;
        }
        self.push_undo();
        let node = self.nodes.get_mut(node_id)?;
        node.excluded = !node.excluded;
        tracing::debug!(node_id, excluded = node.excluded, "toggled exclusion");
        Some(node.excluded)
    }

    // ── Focus ──────────────────────────────────────────────────────────

    /// Rebuild `active_path` as the chain from the root down to `node_id`.
    ///
    /// Focus is navigation state and is not recorded for undo.
    /// Returns `false` (and changes nothing) if the id is unknown.
    pub fn set_focus(&mut self, node_id: &str) -> bool {
        if !self.nodes.contains_key(node_id) {
            return false;
        }
        let mut path = self.ancestor_chain(node_id);
        path.reverse();
        self.active_path = path;
        true
    }

    /// The node at the end of the active path.
    pub fn focus_node(&self) -> Option<&Node> {
        self.active_path.last().and_then(|id| self.nodes.get(id))
    }

    /// Ids from `node_id` up to its topmost ancestor, in that order.
    pub(crate) fn ancestor_chain(&self, node_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.nodes.get(node_id);
        while let Some(node) = current {
            if !seen.insert(node.id.as_str()) {
                break;
            }
            chain.push(node.id.clone());
            current = node.parent_id.as_deref().and_then(|p| self.nodes.get(p));
        }
        chain
    }

    /// Number of nodes from `node_id` to the top of its chain, inclusive.
    pub fn depth_of(&self, node_id: &str) -> usize {
        self.ancestor_chain(node_id).len()
    }

    // ── Siblings ───────────────────────────────────────────────────────

    fn parent_of(&self, node_id: &str) -> Option<&Node> {
        let node = self.nodes.get(node_id)?;
        self.nodes.get(node.parent_id.as_deref()?)
    }

    /// Other children of the same parent, in `children_ids` order.
    pub fn get_siblings(&self, node_id: &str) -> Vec<&Node> {
        let Some(parent) = self.parent_of(node_id) else {
            return Vec::new();
        };
        parent
            .children_ids
            .iter()
            .filter(|c| c.as_str() != node_id)
            .filter_map(|c| self.nodes.get(c))
            .collect()
    }

    pub fn get_next_sibling(&self, node_id: &str) -> Option<&Node> {
        let parent = self.parent_of(node_id)?;
        let idx = parent.children_ids.iter().position(|c| c == node_id)?;
        self.nodes.get(parent.children_ids.get(idx + 1)?)
    }

    pub fn get_prev_sibling(&self, node_id: &str) -> Option<&Node> {
        let parent = self.parent_of(node_id)?;
        let idx = parent.children_ids.iter().position(|c| c == node_id)?;
        self.nodes.get(parent.children_ids.get(idx.checked_sub(1)?)?)
    }

    // ── Cross-links ────────────────────────────────────────────────────

    /// Add a directed cross-link. Both ids must exist and differ.
    /// Returns `false` if rejected or already present.
    pub fn add_link(&mut self, from_id: &str, to_id: &str) -> bool {
        if !self.link_endpoints_valid(from_id, to_id) {
            return false;
        }
        self.push_undo();
        let added = self
            .nodes
            .get_mut(from_id)
            .is_some_and(|node| node.add_link(to_id));
        tracing::debug!(from_id, to_id, added, "add link");
        added
    }

    /// Remove a directed cross-link. Returns `false` if rejected or absent.
    pub fn remove_link(&mut self, from_id: &str, to_id: &str) -> bool {
        if !self.link_endpoints_valid(from_id, to_id) {
            return false;
        }
        self.push_undo();
        let removed = self
            .nodes
            .get_mut(from_id)
            .is_some_and(|node| node.remove_link(to_id));
        tracing::debug!(from_id, to_id, removed, "remove link");
        removed
    }

    fn link_endpoints_valid(&self, from_id: &str, to_id: &str) -> bool {
        from_id != to_id && self.nodes.contains_key(from_id) && self.nodes.contains_key(to_id)
    }

    /// Nodes `node_id` links to. Entries that no longer resolve are skipped.
    pub fn get_linked_nodes(&self, node_id: &str) -> Vec<&Node> {
        let Some(node) = self.nodes.get(node_id) else {
            return Vec::new();
        };
        node.links_to
            .iter()
            .filter_map(|l| self.nodes.get(l))
            .collect()
    }

    /// Nodes that link to `node_id`. A full scan; cross-links are sparse.
    pub fn get_backlinks(&self, node_id: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.links_to.iter().any(|l| l == node_id))
            .collect()
    }
}
