//! Read-only projections of a canvas: markdown, mermaid, plain outline, and
//! the canonical JSON document.
//!
//! The text renderings walk the tree from the root in `children_ids` order.
//!
//! # Example
//!
//! ```
//! use thinkcanvas::v1::{Canvas, Node};
//!
//! let mut canvas = Canvas::new("todo");
//! let root = Node::create_root("build a todo app");
//! let root_id = root.id.clone();
//! canvas.add_node(root);
//! canvas.add_node(Node::create_operation("@excavate", "users expect offline sync", &root_id, vec![]));
//!
//! let outline = canvas.export_outline();
//! assert_eq!(outline, "1. build a todo app\n    - [@excavate] users expect offline sync");
//!
//! assert!(canvas.export_mermaid().starts_with("flowchart TD"));
//! ```

use crate::canvas::Canvas;
use crate::types::Node;

/// Full-content lines quoted under each non-root node in markdown.
const MARKDOWN_PREVIEW_LINES: usize = 5;

/// Characters of preview kept in a mermaid node label.
const MERMAID_LABEL_LEN: usize = 30;

impl Canvas {
    /// Nodes reachable from the root, pre-order, with their depth.
    fn preorder(&self) -> Vec<(&Node, usize)> {
        let mut out = Vec::new();
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            out.push((node, depth));
            for child_id in node.children_ids.iter().rev() {
                if let Some(child) = self.nodes.get(child_id) {
                    stack.push((child, depth + 1));
                }
            }
        }
        out
    }

    /// Markdown outline: `# ` for the root, indented `- ` bullets below,
    /// each labeled with its operation or kind. Non-root nodes quote up to
    /// five lines of full content when it differs from the preview.
    pub fn export_markdown(&self) -> String {
        let mut lines = Vec::new();
        for (node, depth) in self.preorder() {
            let prefix = "  ".repeat(depth);
            let marker = if depth > 0 { "- " } else { "# " };
            lines.push(format!(
                "{prefix}{marker}**[{}]** {}",
                node.label(),
                node.content_compressed
            ));
            if depth > 0 && node.content_full != node.content_compressed {
                for line in node.content_full.split('\n').take(MARKDOWN_PREVIEW_LINES) {
                    lines.push(format!("{prefix}  > {line}"));
                }
            }
        }
        lines.join("\n")
    }

    /// Mermaid flowchart: one declaration per node, solid edges for the
    /// tree, dotted edges for cross-links that still resolve.
    pub fn export_mermaid(&self) -> String {
        if self.root_id.is_none() {
            return "flowchart TD\n  empty[No nodes]".to_string();
        }

        let mut lines = vec!["flowchart TD".to_string()];

        for (id, node) in &self.nodes {
            lines.push(format!(
                "  {}[\"{}: {}\"]",
                mermaid_id(id),
                sanitize_label(node.label(), usize::MAX),
                sanitize_label(&node.content_compressed, MERMAID_LABEL_LEN)
            ));
        }

        for (id, node) in &self.nodes {
            for child in node.children_ids.iter().filter(|c| self.nodes.contains_key(*c)) {
                lines.push(format!("  {} --> {}", mermaid_id(id), mermaid_id(child)));
            }
        }

        for (id, node) in &self.nodes {
            for target in node.links_to.iter().filter(|l| self.nodes.contains_key(*l)) {
                lines.push(format!("  {} -.-> {}", mermaid_id(id), mermaid_id(target)));
            }
        }

        lines.join("\n")
    }

    /// Plain outline: the root numbered, descendants dash-bulleted and
    /// indented four spaces per level, `[operation] ` prefixed where set.
    pub fn export_outline(&self) -> String {
        let mut lines = Vec::new();
        for (node, depth) in self.preorder() {
            let prefix = "    ".repeat(depth);
            let bullet = if depth == 0 { "1." } else { "-" };
            let label = match &node.operation {
                Some(op) => format!("[{op}] "),
                None => String::new(),
            };
            lines.push(format!(
                "{prefix}{bullet} {label}{}",
                node.content_compressed
            ));
        }
        lines.join("\n")
    }

    /// The canonical document as a JSON value. Undo history is never included.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Rebuild a canvas from its canonical JSON value, with empty history.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parse a canvas from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Quote-safe, single-line label cut to `max_chars`.
fn sanitize_label(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| match c {
            '"' => '\'',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

/// Node ids are short hex tokens; anything else is mapped onto `[A-Za-z0-9_]`.
fn mermaid_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Canvas, String, String, String) {
        let mut canvas = Canvas::new("export");
        let root = Node::create_root("build a todo app");
        let r = root.id.clone();
        canvas.add_node(root);

        let op = Node::create_operation(
            "@excavate",
            "I'll apply excavate.\nusers expect offline sync\nand \"fast\" search",
            &r,
            vec![r.clone()],
        );
        let o = op.id.clone();
        canvas.add_node(op);

        let note = Node::create_note("check the sync conflict policy", &o);
        let n = note.id.clone();
        canvas.add_node(note);

        (canvas, r, o, n)
    }

    // ── Markdown ───────────────────────────────────────────────────────

    #[test]
    fn test_export_markdown() {
        let (canvas, _, _, _) = sample();
        let md = canvas.export_markdown();
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "# **[root]** build a todo app");
        assert_eq!(lines[1], "  - **[@excavate]** users expect offline sync");
        assert_eq!(lines[2], "    > I'll apply excavate.");
        assert_eq!(lines[3], "    > users expect offline sync");
        assert_eq!(lines[4], "    > and \"fast\" search");
        assert_eq!(lines[5], "    - **[user]** check the sync conflict policy");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_export_markdown_limits_quoted_lines() {
        let (mut canvas, _, o, _) = sample();
        canvas.edit_node(&o, "line one is long enough\n2\n3\n4\n5\n6\n7");
        let md = canvas.export_markdown();
        assert_eq!(md.matches("  > ").count(), 5);
        assert!(!md.contains("> 6"));
    }

    #[test]
    fn test_export_markdown_empty() {
        assert_eq!(Canvas::new("empty").export_markdown(), "");
    }

    // ── Mermaid ────────────────────────────────────────────────────────

    #[test]
    fn test_export_mermaid() {
        let (mut canvas, r, o, n) = sample();
        canvas.add_link(&n, &r);
        let mermaid = canvas.export_mermaid();
        let lines: Vec<&str> = mermaid.lines().collect();
        assert_eq!(lines[0], "flowchart TD");
        assert_eq!(lines[1], format!("  {r}[\"root: build a todo app\"]"));
        assert_eq!(
            lines[2],
            format!("  {o}[\"@excavate: users expect offline sync\"]")
        );
        assert!(lines.contains(&format!("  {r} --> {o}").as_str()));
        assert!(lines.contains(&format!("  {o} --> {n}").as_str()));
        assert_eq!(*lines.last().unwrap(), format!("  {n} -.-> {r}"));
    }

    #[test]
    fn test_export_mermaid_sanitizes_labels() {
        let (mut canvas, r, _, _) = sample();
        canvas.edit_node(&r, "a \"quoted\" goal that runs well past thirty chars");
        let mermaid = canvas.export_mermaid();
        assert!(mermaid.contains(&format!("  {r}[\"root: a 'quoted' goal that runs well\"]")));
    }

    #[test]
    fn test_export_mermaid_skips_dangling_links() {
        let (mut canvas, r, _, _) = sample();
        canvas
            .nodes
            .get_mut(&r)
            .unwrap()
            .links_to
            .push("ghost".into());
        assert!(!canvas.export_mermaid().contains("ghost"));
    }

    #[test]
    fn test_export_mermaid_empty() {
        assert_eq!(
            Canvas::new("empty").export_mermaid(),
            "flowchart TD\n  empty[No nodes]"
        );
    }

    #[test]
    fn test_mermaid_id() {
        assert_eq!(mermaid_id("3fa9c0de"), "3fa9c0de");
        assert_eq!(mermaid_id("a-b c"), "a_b_c");
    }

    // ── Outline ────────────────────────────────────────────────────────

    #[test]
    fn test_export_outline() {
        let (canvas, _, _, _) = sample();
        assert_eq!(
            canvas.export_outline(),
            "1. build a todo app\n    - [@excavate] users expect offline sync\n        - check the sync conflict policy"
        );
    }

    #[test]
    fn test_export_outline_sibling_order() {
        let (mut canvas, r, o, _) = sample();
        let second = Node::create_note("second branch of thought", &r);
        canvas.add_node(second);
        let outline = canvas.export_outline();
        let excavate_at = outline.find("[@excavate]").unwrap();
        let second_at = outline.find("second branch").unwrap();
        assert!(excavate_at < second_at);
        assert!(canvas.nodes[&r].children_ids[0] == o);
    }

    // ── Canonical JSON ─────────────────────────────────────────────────

    #[test]
    fn test_to_value_shape() {
        let (canvas, r, _, _) = sample();
        let value = canvas.to_value().unwrap();
        assert_eq!(value["name"], "export");
        assert_eq!(value["root_id"], r.as_str());
        assert_eq!(value["active_path"], serde_json::json!([r]));
        assert_eq!(value["compress_length"], 100);
        assert_eq!(value["nodes"].as_object().unwrap().len(), 3);
        assert_eq!(value["nodes"][&r]["type"], "root");
        assert!(value.get("source_directory").is_none());
        assert!(value.get("history").is_none());
    }

    #[test]
    fn test_value_roundtrip() {
        let (mut canvas, _, o, _) = sample();
        canvas.set_focus(&o);
        canvas.source_file = Some("notes/goal.md".into());
        let restored = Canvas::from_value(canvas.to_value().unwrap()).unwrap();
        assert_eq!(restored.nodes, canvas.nodes);
        assert_eq!(restored.root_id, canvas.root_id);
        assert_eq!(restored.active_path, canvas.active_path);
        assert_eq!(restored.source_file.as_deref(), Some("notes/goal.md"));
        assert!(!restored.can_undo());
    }

    #[test]
    fn test_from_json_defaults() {
        let canvas = Canvas::from_json(r#"{"name": "bare"}"#).unwrap();
        assert!(canvas.nodes.is_empty());
        assert!(canvas.root_id.is_none());
        assert_eq!(canvas.compress_length, 100);
        assert!(!canvas.created_at.is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(Canvas::from_json("not json").is_err());
        assert!(Canvas::from_json(r#"{"nodes": {}}"#).is_err());
    }
}
