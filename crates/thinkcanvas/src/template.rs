//! Built-in starting points for new canvases.

use crate::canvas::Canvas;
use crate::types::Node;
use serde::Serialize;

/// A predefined canvas shape: root content plus suggested first operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasTemplate {
    /// Lookup key, e.g. `"bug"`.
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub root_content: &'static str,
    /// `(operation, parent index)` pairs, where index 0 is the root and
    /// later indexes follow creation order.
    pub operations: &'static [(&'static str, usize)],
}

const BUILTIN_TEMPLATES: &[CanvasTemplate] = &[
    CanvasTemplate {
        key: "blank",
        name: "Blank",
        description: "Empty canvas with just a root goal",
        root_content: "",
        operations: &[],
    },
    CanvasTemplate {
        key: "feature",
        name: "Feature Spec",
        description: "Plan a new feature: goal → requirements → edge cases → implementation",
        root_content: "Feature: [describe the feature you want to build]",
        operations: &[("@excavate", 0)],
    },
    CanvasTemplate {
        key: "bug",
        name: "Bug Investigation",
        description: "Investigate a bug: symptom → hypotheses → tests → fix",
        root_content: "Bug: [describe the unexpected behavior]",
        operations: &[("@excavate", 0), ("@stressify", 0)],
    },
    CanvasTemplate {
        key: "decision",
        name: "Decision Analysis",
        description: "Analyze a decision: options → tradeoffs → recommendation",
        root_content: "Decision: [describe what you need to decide]",
        operations: &[("@diverge", 0), ("@dimensionalize", 0)],
    },
    CanvasTemplate {
        key: "refactor",
        name: "Refactoring Plan",
        description: "Plan a refactor: current state → problems → approach → risks",
        root_content: "Refactor: [describe what code needs refactoring and why]",
        operations: &[("@excavate", 0), ("@stressify", 0), ("@simulate", 0)],
    },
];

pub fn list_templates() -> &'static [CanvasTemplate] {
    BUILTIN_TEMPLATES
}

pub fn get_template(key: &str) -> Option<&'static CanvasTemplate> {
    BUILTIN_TEMPLATES.iter().find(|t| t.key == key)
}

impl Canvas {
    /// A fresh canvas whose root carries the template's root content.
    ///
    /// Suggested operations are not run; they need an external model.
    /// Returns `None` for an unknown template key.
    pub fn from_template(name: impl Into<String>, key: &str) -> Option<Self> {
        let template = get_template(key)?;
        let mut canvas = Canvas::new(name);
        canvas.add_node(Node::create_root(template.root_content));
        tracing::debug!(canvas = %canvas.name, template = key, "canvas from template");
        Some(canvas)
    }
}
