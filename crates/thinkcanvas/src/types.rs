use crate::compress::{DEFAULT_COMPRESSION_LENGTH, compress};
use serde::{Deserialize, Serialize};

/// Operation label stamped on synthesized plan nodes.
pub const PLAN_OPERATION: &str = "plan";

// ============================================================================
// Node kind
// ============================================================================

/// The role a node plays in the canvas.
///
/// Only plan nodes carry extra data (the ids that contributed to the
/// synthesis). On disk the kind is flattened back into the node object as a
/// `"type"` string plus an always-present `"source_ids"` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The starting goal or question.
    Root,
    /// The result of an analytical operation.
    Operation,
    /// A free-form user note.
    User,
    /// A plan synthesized from several source nodes.
    Plan { source_ids: Vec<String> },
}

impl NodeKind {
    /// Lowercase label used on disk and in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Operation => "operation",
            NodeKind::User => "user",
            NodeKind::Plan { .. } => "plan",
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NodeKind::Root)
    }

    /// Contributing ids for plan nodes; empty for every other kind.
    pub fn source_ids(&self) -> &[String] {
        match self {
            NodeKind::Plan { source_ids } => source_ids,
            _ => &[],
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindTag {
    Root,
    Operation,
    User,
    Plan,
}

// ============================================================================
// Bookkeeping
// ============================================================================

/// Token and cost counters reported by the LLM client for one invocation.
///
/// Purely additive bookkeeping: graph algorithms never read these.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cost_usd: f64,
}

/// What was run, and on what.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// The content that was passed as input.
    pub target: Option<String>,
    /// For chat: the user's prompt. For skills: the skill name.
    pub prompt: Option<String>,
    pub used_web_search: bool,
}

// ============================================================================
// Node
// ============================================================================

/// A single unit of content in the canvas.
///
/// Every relational field (`parent_id`, `children_ids`, `links_to`) is an id
/// key into [`Canvas::nodes`](crate::canvas::Canvas::nodes); the canvas keeps
/// them consistent, never the node alone.
///
/// # Builder API
///
/// ```
/// use thinkcanvas::v1::{Node, Usage};
///
/// let root = Node::create_root("build a todo app");
/// let op = Node::create_operation("@excavate", "hidden assumptions", &root.id, vec![root.id.clone()])
///     .with_usage(Usage { input_tokens: 120, output_tokens: 40, ..Default::default() });
///
/// assert_eq!(op.parent_id.as_deref(), Some(root.id.as_str()));
/// assert_eq!(op.usage.input_tokens, 120);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub content_compressed: String,
    pub content_full: String,
    pub parent_id: Option<String>,
    pub operation: Option<String>,
    pub children_ids: Vec<String>,
    pub created_at: String,
    /// Directed cross-references, independent of the tree.
    pub links_to: Vec<String>,
    /// Ids supplied as input context when this node was produced.
    pub context_snapshot: Vec<String>,
    /// Excluded nodes (and their subtrees) are skipped by synthesis folds.
    pub excluded: bool,
    pub invocation: Invocation,
    pub usage: Usage,
}

impl Node {
    fn new(kind: NodeKind, content: impl Into<String>, parent_id: Option<String>) -> Self {
        let content_full = content.into();
        Self {
            id: generate_id(),
            kind,
            content_compressed: compress(&content_full, DEFAULT_COMPRESSION_LENGTH),
            content_full,
            parent_id,
            operation: None,
            children_ids: Vec::new(),
            created_at: now_iso8601(),
            links_to: Vec::new(),
            context_snapshot: Vec::new(),
            excluded: false,
            invocation: Invocation::default(),
            usage: Usage::default(),
        }
    }

    /// Create a root node holding the initial goal or question.
    pub fn create_root(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Root, content, None)
    }

    /// Create the result node of an analytical operation.
    pub fn create_operation(
        operation: impl Into<String>,
        content: impl Into<String>,
        parent_id: impl Into<String>,
        context_snapshot: Vec<String>,
    ) -> Self {
        let mut node = Self::new(NodeKind::Operation, content, Some(parent_id.into()));
        node.operation = Some(operation.into());
        node.context_snapshot = context_snapshot;
        node
    }

    /// Create a user note.
    pub fn create_note(content: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::new(NodeKind::User, content, Some(parent_id.into()))
    }

    /// Create a plan node synthesized from `source_ids`.
    pub fn create_plan(
        content: impl Into<String>,
        parent_id: impl Into<String>,
        source_ids: Vec<String>,
    ) -> Self {
        let mut node = Self::new(
            NodeKind::Plan { source_ids },
            content,
            Some(parent_id.into()),
        );
        node.operation = Some(PLAN_OPERATION.to_string());
        node
    }

    /// Attach usage counters
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Attach invocation metadata
    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = invocation;
        self
    }

    /// Replace the full content and re-derive the preview.
    pub fn update_content(&mut self, new_content: impl Into<String>, compress_length: usize) {
        self.content_full = new_content.into();
        self.recompress(compress_length);
    }

    pub(crate) fn recompress(&mut self, compress_length: usize) {
        self.content_compressed = compress(&self.content_full, compress_length);
    }

    /// Label used in exports: the operation when present, else the kind.
    pub fn label(&self) -> &str {
        self.operation.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Add a cross-link. Returns `false` if it was already present.
    pub(crate) fn add_link(&mut self, target_id: &str) -> bool {
        if self.links_to.iter().any(|l| l == target_id) {
            return false;
        }
        self.links_to.push(target_id.to_string());
        true
    }

    /// Remove a cross-link. Returns `false` if it was not present.
    pub(crate) fn remove_link(&mut self, target_id: &str) -> bool {
        let before = self.links_to.len();
        self.links_to.retain(|l| l != target_id);
        self.links_to.len() != before
    }
}

/// Short random hex token; collision-free for interactive graph sizes.
pub(crate) fn generate_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

pub(crate) fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// On-disk shape
// ============================================================================

/// Flat persisted form of a [`Node`]. Missing bookkeeping fields default so
/// older documents still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    kind: KindTag,
    #[serde(default)]
    content_compressed: String,
    content_full: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    children_ids: Vec<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    links_to: Vec<String>,
    #[serde(default)]
    context_snapshot: Vec<String>,
    #[serde(default)]
    excluded: bool,
    #[serde(default)]
    source_ids: Vec<String>,
    #[serde(default)]
    invocation_target: Option<String>,
    #[serde(default)]
    invocation_prompt: Option<String>,
    #[serde(default)]
    used_web_search: bool,
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_read_tokens: u64,
    #[serde(default)]
    cache_creation_tokens: u64,
    #[serde(default)]
    cost_usd: f64,
}

impl From<NodeRecord> for Node {
    fn from(r: NodeRecord) -> Self {
        let kind = match r.kind {
            KindTag::Root => NodeKind::Root,
            KindTag::Operation => NodeKind::Operation,
            KindTag::User => NodeKind::User,
            KindTag::Plan => NodeKind::Plan {
                source_ids: r.source_ids,
            },
        };
        Self {
            id: r.id,
            kind,
            content_compressed: r.content_compressed,
            content_full: r.content_full,
            parent_id: r.parent_id,
            operation: r.operation,
            children_ids: r.children_ids,
            created_at: r.created_at,
            links_to: r.links_to,
            context_snapshot: r.context_snapshot,
            excluded: r.excluded,
            invocation: Invocation {
                target: r.invocation_target,
                prompt: r.invocation_prompt,
                used_web_search: r.used_web_search,
            },
            usage: Usage {
                input_tokens: r.input_tokens,
                output_tokens: r.output_tokens,
                cache_read_tokens: r.cache_read_tokens,
                cache_creation_tokens: r.cache_creation_tokens,
                cost_usd: r.cost_usd,
            },
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(n: Node) -> Self {
        let (kind, source_ids) = match n.kind {
            NodeKind::Root => (KindTag::Root, Vec::new()),
            NodeKind::Operation => (KindTag::Operation, Vec::new()),
            NodeKind::User => (KindTag::User, Vec::new()),
            NodeKind::Plan { source_ids } => (KindTag::Plan, source_ids),
        };
        Self {
            id: n.id,
            kind,
            content_compressed: n.content_compressed,
            content_full: n.content_full,
            parent_id: n.parent_id,
            operation: n.operation,
            children_ids: n.children_ids,
            created_at: n.created_at,
            links_to: n.links_to,
            context_snapshot: n.context_snapshot,
            excluded: n.excluded,
            source_ids,
            invocation_target: n.invocation.target,
            invocation_prompt: n.invocation.prompt,
            used_web_search: n.invocation.used_web_search,
            input_tokens: n.usage.input_tokens,
            output_tokens: n.usage.output_tokens,
            cache_read_tokens: n.usage.cache_read_tokens,
            cache_creation_tokens: n.usage.cache_creation_tokens,
            cost_usd: n.usage.cost_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // ── Factories ──────────────────────────────────────────────────────

    #[test]
    fn test_create_root() {
        let node = Node::create_root("what should we build?");
        assert_eq!(node.kind, NodeKind::Root);
        assert!(node.parent_id.is_none());
        assert!(node.operation.is_none());
        assert_eq!(node.content_full, "what should we build?");
        assert_eq!(node.content_compressed, "what should we build?");
        assert_eq!(node.id.len(), 8);
    }

    #[test]
    fn test_create_operation() {
        let node = Node::create_operation("@excavate", "assumptions found", "p1", vec!["p1".into()]);
        assert_eq!(node.kind, NodeKind::Operation);
        assert_eq!(node.operation.as_deref(), Some("@excavate"));
        assert_eq!(node.parent_id.as_deref(), Some("p1"));
        assert_eq!(node.context_snapshot, vec!["p1".to_string()]);
        assert_eq!(node.usage, Usage::default());
    }

    #[test]
    fn test_create_note() {
        let node = Node::create_note("remember the latency budget", "p1");
        assert_eq!(node.kind, NodeKind::User);
        assert!(node.operation.is_none());
        assert_eq!(node.label(), "user");
    }

    #[test]
    fn test_create_plan() {
        let node = Node::create_plan("# Plan", "r", vec!["a".into(), "b".into()]);
        assert_eq!(node.kind.as_str(), "plan");
        assert_eq!(node.operation.as_deref(), Some(PLAN_OPERATION));
        assert_eq!(node.kind.source_ids(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unique_ids() {
        let ids: HashSet<String> = (0..100).map(|_| Node::create_root("x").id).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_with_usage_and_invocation() {
        let node = Node::create_operation("@diverge", "options", "p", vec![])
            .with_usage(Usage {
                input_tokens: 100,
                output_tokens: 50,
                cache_read_tokens: 10,
                cache_creation_tokens: 5,
                cost_usd: 0.25,
            })
            .with_invocation(Invocation {
                target: Some("the goal".into()),
                prompt: Some("@diverge".into()),
                used_web_search: true,
            });
        assert_eq!(node.usage.output_tokens, 50);
        assert!(node.invocation.used_web_search);
    }

    #[test]
    fn test_update_content_recompresses() {
        let mut node = Node::create_root("original");
        node.update_content("x".repeat(200), 100);
        assert!(node.content_compressed.len() <= 100);
        assert!(node.content_compressed.ends_with("..."));
    }

    // ── Links ──────────────────────────────────────────────────────────

    #[test]
    fn test_node_links_idempotent() {
        let mut node = Node::create_root("r");
        assert!(node.add_link("a"));
        assert!(!node.add_link("a"));
        assert_eq!(node.links_to, vec!["a".to_string()]);
        assert!(node.remove_link("a"));
        assert!(!node.remove_link("a"));
    }

    // ── Serialization ──────────────────────────────────────────────────

    #[test]
    fn test_serialized_shape_is_flat() {
        let node = Node::create_operation("@stressify", "failure modes", "abc", vec!["abc".into()])
            .with_usage(Usage {
                input_tokens: 7,
                ..Default::default()
            });
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "operation");
        assert_eq!(value["operation"], "@stressify");
        assert_eq!(value["input_tokens"], 7);
        assert_eq!(value["source_ids"], serde_json::json!([]));
        assert_eq!(value["invocation_target"], serde_json::Value::Null);
        assert!(value.get("kind").is_none());
        assert!(value.get("usage").is_none());
    }

    #[test]
    fn test_roundtrip() {
        let node = Node::create_plan("the plan", "r", vec!["r".into(), "x".into()]).with_usage(
            Usage {
                cost_usd: 1.5,
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&node).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_missing_bookkeeping_fields_default() {
        let json = r#"{
            "id": "abcd1234",
            "type": "operation",
            "content_compressed": "test",
            "content_full": "test content",
            "parent_id": "root1234",
            "operation": "@excavate",
            "children_ids": [],
            "created_at": "2024-01-01T00:00:00"
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.usage, Usage::default());
        assert!(node.links_to.is_empty());
        assert!(!node.excluded);
        assert!(node.invocation.target.is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"id": "a", "type": "mystery", "content_full": ""}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }
}
