//! Search and statistics over a canvas.

use crate::canvas::Canvas;
use crate::types::Node;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts over every node on a canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_nodes: usize,
    /// Longest root-to-leaf edge count; 0 with no root.
    pub max_depth: usize,
    /// Nodes with more than one child.
    pub branch_count: usize,
    /// Nodes with no children.
    pub leaf_count: usize,
    pub node_types: BTreeMap<String, usize>,
    pub operations_used: BTreeMap<String, usize>,
    /// Token totals saturate at `u64::MAX`.
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cache_read_tokens: u64,
    pub total_cache_creation_tokens: u64,
    pub total_cost_usd: f64,
}

impl Canvas {
    /// Nodes whose full content contains `query`.
    ///
    /// Comparison is case-insensitive unless `case_sensitive` is set.
    pub fn search(&self, query: &str, case_sensitive: bool) -> Vec<&Node> {
        if case_sensitive {
            return self
                .nodes
                .values()
                .filter(|n| n.content_full.contains(query))
                .collect();
        }
        let needle = query.to_lowercase();
        self.nodes
            .values()
            .filter(|n| n.content_full.to_lowercase().contains(&needle))
            .collect()
    }

    /// Nodes whose full content matches `pattern`, case-insensitively.
    ///
    /// An invalid pattern yields no results rather than an error.
    pub fn search_regex(&self, pattern: &str) -> Vec<&Node> {
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(e) => {
                tracing::debug!(pattern, error = %e, "invalid search pattern");
                return Vec::new();
            }
        };
        self.nodes
            .values()
            .filter(|n| regex.is_match(&n.content_full))
            .collect()
    }

    /// Fold every node into counts, histograms, and usage totals.
    pub fn get_statistics(&self) -> Statistics {
        let mut stats = Statistics {
            total_nodes: self.nodes.len(),
            max_depth: self.max_depth(),
            ..Default::default()
        };

        for node in self.nodes.values() {
            *stats
                .node_types
                .entry(node.kind.as_str().to_string())
                .or_default() += 1;
            if let Some(op) = &node.operation {
                *stats.operations_used.entry(op.clone()).or_default() += 1;
            }
            match node.children_ids.len() {
                0 => stats.leaf_count += 1,
                1 => {}
                _ => stats.branch_count += 1,
            }
            let usage = &node.usage;
            stats.total_input_tokens = stats.total_input_tokens.saturating_add(usage.input_tokens);
            stats.total_output_tokens = stats.total_output_tokens.saturating_add(usage.output_tokens);
            stats.total_cache_read_tokens = stats
                .total_cache_read_tokens
                .saturating_add(usage.cache_read_tokens);
            stats.total_cache_creation_tokens = stats
                .total_cache_creation_tokens
                .saturating_add(usage.cache_creation_tokens);
            stats.total_cost_usd += usage.cost_usd;
        }

        stats
    }

    /// Deepest edge count below the root, walked with an explicit stack.
    fn max_depth(&self) -> usize {
        let Some(root) = self.root_id.as_deref() else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(node) = self.nodes.get(id) {
                for child in &node.children_ids {
                    if self.nodes.contains_key(child) {
                        stack.push((child.as_str(), depth + 1));
                    }
                }
            }
        }
        deepest
    }
}
