use crate::workspace::{Workspace, read_content};
use anyhow::{Context, Result};
use std::collections::HashSet;
use thinkcanvas::v1::{Canvas, Node, template};

pub fn run_new(
    ws: &Workspace,
    name: String,
    template_key: Option<String>,
    text: Option<String>,
) -> Result<()> {
    let mut canvas = match template_key.as_deref() {
        Some(key) => Canvas::from_template(&name, key)
            .with_context(|| format!("unknown template: {key}"))?,
        None => {
            let goal = read_content(text.clone())?;
            let mut canvas = Canvas::new(&name);
            canvas.add_node(Node::create_root(goal));
            canvas
        }
    };

    if template_key.is_some()
        && let Some(text) = text
        && let Some(root_id) = canvas.root_id.clone()
    {
        canvas.edit_node(&root_id, text);
    }

    let dir = ws
        .store()
        .ensure_dir()
        .context("failed to create canvas directory")?;
    let path = ws
        .store()
        .unique_path(&name)
        .with_context(|| format!("failed to pick a file name in {}", dir.display()))?;
    ws.save(&path, &canvas)?;
    println!("{}", path.display());
    Ok(())
}

pub fn run_list(ws: &Workspace, json: bool) -> Result<()> {
    let saved = ws
        .store()
        .list_saved()
        .context("failed to list saved canvases")?;

    if json {
        return ws.print_json(&saved);
    }
    if saved.is_empty() {
        println!("No saved canvases.");
        return Ok(());
    }
    for s in &saved {
        println!(
            "{} | {} nodes | created {} | modified {} | {}",
            s.name,
            s.node_count,
            s.created_at,
            s.modified_at.format("%Y-%m-%d %H:%M"),
            s.path.display(),
        );
    }
    Ok(())
}

pub fn run_templates() -> Result<()> {
    for t in template::list_templates() {
        println!("{:<10} {} - {}", t.key, t.name, t.description);
    }
    Ok(())
}

pub fn run_show(ws: &Workspace) -> Result<()> {
    let (_, canvas) = ws.load()?;
    println!("{}", render_tree(&canvas));
    Ok(())
}

/// One line per node: focus marker, id, label, preview. Nodes on the active
/// path are starred; excluded nodes are marked.
fn render_tree(canvas: &Canvas) -> String {
    let Some(root) = canvas.root() else {
        return format!("{} (empty)", canvas.name);
    };
    let on_path: HashSet<&str> = canvas.active_path.iter().map(String::as_str).collect();

    let mut lines = vec![canvas.name.clone()];
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let marker = if on_path.contains(node.id.as_str()) { "*" } else { " " };
        let excluded = if node.excluded { " (excluded)" } else { "" };
        lines.push(format!(
            "{marker} {}{} [{}] {}{excluded}",
            "  ".repeat(depth),
            node.id,
            node.label(),
            node.content_compressed,
        ));
        for child in node.children_ids.iter().rev() {
            if let Some(child) = canvas.get_node(child) {
                stack.push((child, depth + 1));
            }
        }
    }
    lines.join("\n")
}
