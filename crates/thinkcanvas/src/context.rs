//! Context gathering: which nodes feed the next operation, and how their
//! content is laid out for the prompt builder.

use crate::canvas::Canvas;
use crate::types::Node;
use std::collections::HashSet;

/// Separator placed between node contents in a formatted context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Characters of each node's content kept by the synthesis fold.
pub const SYNTHESIS_CONTENT_LIMIT: usize = 500;

/// The excluded-aware fold of a canvas that feeds plan synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisTree {
    /// Indented `[label]` blocks, one per contributing node.
    pub text: String,
    /// Contributing node ids, in visit order.
    pub source_ids: Vec<String>,
}

impl Canvas {
    /// Context for running an operation on `node_id`.
    ///
    /// Returns the prefix of `active_path` that precedes `node_id`, followed
    /// by the node itself. This is relative to the current focus path, not
    /// the structural ancestry: when `node_id` is not on the active path the
    /// result is just `[node_id]`. Unknown ids yield an empty context.
    pub fn get_context_for_operation(&self, node_id: &str) -> Vec<&Node> {
        let Some(target) = self.nodes.get(node_id) else {
            return Vec::new();
        };
        let mut context: Vec<&Node> = match self.active_path.iter().position(|id| id == node_id) {
            Some(pos) => self.active_path[..pos]
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .collect(),
            None => Vec::new(),
        };
        context.push(target);
        context
    }

    /// [`get_context_for_operation`](Self::get_context_for_operation) followed
    /// by every resolvable cross-link of `node_id` not already included.
    pub fn get_context_for_operation_with_links(&self, node_id: &str) -> Vec<&Node> {
        let mut context = self.get_context_for_operation(node_id);
        let mut seen: HashSet<&str> = context.iter().map(|n| n.id.as_str()).collect();
        for linked in self.get_linked_nodes(node_id) {
            if seen.insert(linked.id.as_str()) {
                context.push(linked);
            }
        }
        context
    }

    /// Context for an operation over several selected nodes.
    ///
    /// Selected ids still on the canvas are ordered by depth, shallowest
    /// first (ties keep selection order). The ancestor chain of the
    /// shallowest selection, minus the selected ids themselves, comes first;
    /// then every selected node in depth order. No id appears twice.
    ///
    /// The shared prefix is a heuristic, not a lowest common ancestor.
    pub fn get_context_for_multiple_nodes<S: AsRef<str>>(&self, node_ids: &[S]) -> Vec<&Node> {
        let mut by_depth: Vec<(&str, usize)> = node_ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| self.nodes.contains_key(*id))
            .map(|id| (id, self.depth_of(id)))
            .collect();
        by_depth.sort_by_key(|&(_, depth)| depth);

        let Some(&(shallowest, _)) = by_depth.first() else {
            return Vec::new();
        };
        let requested: HashSet<&str> = by_depth.iter().map(|&(id, _)| id).collect();

        let mut chain = self.ancestor_chain(shallowest);
        chain.reverse();

        let mut context = Vec::new();
        let mut added: HashSet<&str> = HashSet::new();

        for id in &chain {
            if requested.contains(id.as_str()) {
                continue;
            }
            if let Some(node) = self.nodes.get(id)
                && added.insert(node.id.as_str())
            {
                context.push(node);
            }
        }

        for (id, _) in by_depth {
            if let Some(node) = self.nodes.get(id)
                && added.insert(node.id.as_str())
            {
                context.push(node);
            }
        }

        context
    }

    /// Fold the tree from the root for plan synthesis.
    ///
    /// Excluded nodes are skipped together with their subtrees. Returns
    /// `None` when the canvas has no root.
    pub fn gather_synthesis_tree(&self) -> Option<SynthesisTree> {
        let root = self.root()?;
        let mut blocks = Vec::new();
        let mut source_ids = Vec::new();
        let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = stack.pop() {
            if node.excluded {
                continue;
            }
            source_ids.push(node.id.clone());

            let indent = "  ".repeat(depth);
            let label = match &node.operation {
                Some(op) => format!("[{}]", op),
                None => format!("[{}]", node.kind),
            };
            let content = clip(&node.content_full, SYNTHESIS_CONTENT_LIMIT);
            blocks.push(format!("{indent}{label}\n{indent}{content}"));

            for child_id in node.children_ids.iter().rev() {
                if let Some(child) = self.nodes.get(child_id) {
                    stack.push((child, depth + 1));
                }
            }
        }

        Some(SynthesisTree {
            text: blocks.join("\n\n"),
            source_ids,
        })
    }
}

/// Render context nodes as prompt text, operation-labeled where known.
///
/// # Examples
///
/// ```
/// use thinkcanvas::v1::{Node, format_context};
///
/// let root = Node::create_root("build a todo app");
/// let op = Node::create_operation("@excavate", "users want sync", &root.id, vec![]);
///
/// let text = format_context(&[&root, &op]);
/// assert_eq!(text, "build a todo app\n\n---\n\n[@excavate]\nusers want sync");
/// ```
pub fn format_context(nodes: &[&Node]) -> String {
    nodes
        .iter()
        .map(|node| match &node.operation {
            Some(op) => format!("[{}]\n{}", op, node.content_full),
            None => node.content_full.clone(),
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tree {
        canvas: Canvas,
        root: String,
        a: String,
        a1: String,
        a2: String,
        b: String,
    }

    /// root ─┬─ a ─┬─ a1
    ///       │     └─ a2
    ///       └─ b
    fn tree() -> Tree {
        let mut canvas = Canvas::new("ctx");
        let root = Node::create_root("goal");
        let root_id = root.id.clone();
        canvas.add_node(root);

        let mut add = |parent: &str, op: &str, content: &str| {
            let node = Node::create_operation(op, content, parent, vec![parent.to_string()]);
            let id = node.id.clone();
            canvas.add_node(node);
            id
        };
        let a = add(&root_id, "@excavate", "assumptions");
        let a1 = add(&a, "@stressify", "failure modes");
        let a2 = add(&a, "@diverge", "alternatives");
        let b = add(&root_id, "@simulate", "forward trace");

        Tree {
            canvas,
            root: root_id,
            a,
            a1,
            a2,
            b,
        }
    }

    fn ids(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    // ── Single node ────────────────────────────────────────────────────

    #[test]
    fn test_context_follows_active_path() {
        let mut t = tree();
        t.canvas.set_focus(&t.a1);
        let ctx = t.canvas.get_context_for_operation(&t.a1);
        assert_eq!(ids(&ctx), vec![t.root.clone(), t.a.clone(), t.a1.clone()]);
    }

    #[test]
    fn test_context_for_mid_path_node() {
        let mut t = tree();
        t.canvas.set_focus(&t.a1);
        let ctx = t.canvas.get_context_for_operation(&t.a);
        assert_eq!(ids(&ctx), vec![t.root.clone(), t.a.clone()]);
    }

    #[test]
    fn test_context_off_path_is_node_alone() {
        let mut t = tree();
        t.canvas.set_focus(&t.a1);
        let ctx = t.canvas.get_context_for_operation(&t.b);
        assert_eq!(ids(&ctx), vec![t.b.clone()]);
    }

    #[test]
    fn test_context_unknown_node() {
        let t = tree();
        assert!(t.canvas.get_context_for_operation("missing").is_empty());
    }

    #[test]
    fn test_context_with_links() {
        let mut t = tree();
        t.canvas.set_focus(&t.a1);
        t.canvas.add_link(&t.a1, &t.b);
        t.canvas.add_link(&t.a1, &t.root);
        let ctx = t.canvas.get_context_for_operation_with_links(&t.a1);
        assert_eq!(
            ids(&ctx),
            vec![t.root.clone(), t.a.clone(), t.a1.clone(), t.b.clone()]
        );
    }

    // ── Multiple nodes ─────────────────────────────────────────────────

    #[test]
    fn test_multi_siblings_share_parent_chain() {
        let t = tree();
        let ctx = t.canvas.get_context_for_multiple_nodes(&[&t.a2, &t.a1]);
        assert_eq!(
            ids(&ctx),
            vec![t.root.clone(), t.a.clone(), t.a2.clone(), t.a1.clone()]
        );
    }

    #[test]
    fn test_multi_orders_by_depth() {
        let t = tree();
        let ctx = t.canvas.get_context_for_multiple_nodes(&[&t.a1, &t.b]);
        assert_eq!(ids(&ctx), vec![t.root.clone(), t.b.clone(), t.a1.clone()]);
    }

    #[test]
    fn test_multi_selected_ancestor_not_duplicated() {
        let t = tree();
        let ctx = t
            .canvas
            .get_context_for_multiple_nodes(&[&t.a1, &t.a, &t.a1, &t.root]);
        assert_eq!(ids(&ctx), vec![t.root.clone(), t.a.clone(), t.a1.clone()]);
    }

    #[test]
    fn test_multi_skips_unknown_ids() {
        let t = tree();
        let ctx = t.canvas.get_context_for_multiple_nodes(&["ghost", t.b.as_str()]);
        assert_eq!(ids(&ctx), vec![t.root.clone(), t.b.clone()]);
        let none: &[&str] = &["ghost"];
        assert!(t.canvas.get_context_for_multiple_nodes(none).is_empty());
        let empty: &[String] = &[];
        assert!(t.canvas.get_context_for_multiple_nodes(empty).is_empty());
    }

    // ── Formatting ─────────────────────────────────────────────────────

    #[test]
    fn test_format_context() {
        let mut t = tree();
        t.canvas.set_focus(&t.a);
        let ctx = t.canvas.get_context_for_operation(&t.a);
        assert_eq!(format_context(&ctx), "goal\n\n---\n\n[@excavate]\nassumptions");
        assert_eq!(format_context(&[]), "");
    }

    // ── Synthesis ──────────────────────────────────────────────────────

    #[test]
    fn test_synthesis_tree_preorder() {
        let t = tree();
        let synth = t.canvas.gather_synthesis_tree().unwrap();
        assert_eq!(
            synth.source_ids,
            vec![t.root.clone(), t.a.clone(), t.a1.clone(), t.a2.clone(), t.b.clone()]
        );
        assert!(synth.text.starts_with("[root]\ngoal\n\n  [@excavate]\n  assumptions"));
        assert!(synth.text.contains("    [@stressify]\n    failure modes"));
    }

    #[test]
    fn test_synthesis_skips_excluded_subtree() {
        let mut t = tree();
        t.canvas.toggle_excluded(&t.a);
        let synth = t.canvas.gather_synthesis_tree().unwrap();
        assert_eq!(synth.source_ids, vec![t.root.clone(), t.b.clone()]);
        assert!(!synth.text.contains("failure modes"));
    }

    #[test]
    fn test_synthesis_clips_long_content() {
        let mut t = tree();
        t.canvas.edit_node(&t.b, "z".repeat(600));
        let synth = t.canvas.gather_synthesis_tree().unwrap();
        let expected = format!("{}...", "z".repeat(500));
        assert!(synth.text.ends_with(&expected));
    }

    #[test]
    fn test_synthesis_without_root() {
        assert!(Canvas::new("empty").gather_synthesis_tree().is_none());
    }
}
