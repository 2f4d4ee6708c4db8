use crate::workspace::{Workspace, read_content, require_node};
use anyhow::{Context, Result, bail};
use clap::Args;
use thinkcanvas::v1::{Canvas, Invocation, Node, Usage};

// ============================================================================
// CLI argument types
// ============================================================================

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Parent node ID (default: the focused node)
    #[arg(long)]
    pub parent: Option<String>,

    /// Content (default: read stdin)
    #[arg(long)]
    pub text: Option<String>,

    /// Move the focus to the new node
    #[arg(long)]
    pub focus: bool,
}

#[derive(Args, Debug, Default)]
pub struct UsageArgs {
    #[arg(long, default_value_t = 0)]
    pub input_tokens: u64,

    #[arg(long, default_value_t = 0)]
    pub output_tokens: u64,

    #[arg(long, default_value_t = 0)]
    pub cache_read_tokens: u64,

    #[arg(long, default_value_t = 0)]
    pub cache_creation_tokens: u64,

    #[arg(long, default_value_t = 0.0)]
    pub cost_usd: f64,

    /// Model or tool the operation was sent to
    #[arg(long)]
    pub target: Option<String>,

    /// Prompt that produced the content
    #[arg(long)]
    pub prompt: Option<String>,

    /// The operation used web search
    #[arg(long)]
    pub web_search: bool,
}

impl UsageArgs {
    fn usage(&self) -> Usage {
        Usage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cache_read_tokens: self.cache_read_tokens,
            cache_creation_tokens: self.cache_creation_tokens,
            cost_usd: self.cost_usd,
        }
    }

    fn invocation(&self) -> Invocation {
        Invocation {
            target: self.target.clone(),
            prompt: self.prompt.clone(),
            used_web_search: self.web_search,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parent_or_focus(canvas: &Canvas, parent: Option<String>) -> Result<String> {
    match parent {
        Some(id) => Ok(require_node(canvas, &id)?.id.clone()),
        None => canvas
            .focus_node()
            .map(|n| n.id.clone())
            .context("canvas has no focused node; pass --parent"),
    }
}

/// Insert `node`, optionally focus it, save, and print its id.
fn commit_new_node(
    ws: &Workspace,
    path: &std::path::Path,
    mut canvas: Canvas,
    node: Node,
    focus: bool,
) -> Result<()> {
    let id = node.id.clone();
    if !canvas.add_node(node) {
        bail!("node was rejected by the canvas: {id}");
    }
    if focus {
        canvas.set_focus(&id);
    }
    ws.save(path, &canvas)?;
    println!("{id}");
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

pub fn run_note(ws: &Workspace, add: AddArgs) -> Result<()> {
    let (path, canvas) = ws.load()?;
    let parent = parent_or_focus(&canvas, add.parent)?;
    let content = read_content(add.text)?;
    let node = Node::create_note(content, parent);
    commit_new_node(ws, &path, canvas, node, add.focus)
}

pub fn run_op(ws: &Workspace, operation: String, add: AddArgs, usage: UsageArgs) -> Result<()> {
    let (path, canvas) = ws.load()?;
    let parent = parent_or_focus(&canvas, add.parent)?;
    let snapshot: Vec<String> = canvas
        .get_context_for_operation(&parent)
        .iter()
        .map(|n| n.id.clone())
        .collect();
    let content = read_content(add.text)?;
    let node = Node::create_operation(operation, content, parent, snapshot)
        .with_usage(usage.usage())
        .with_invocation(usage.invocation());
    commit_new_node(ws, &path, canvas, node, add.focus)
}

pub fn run_plan(ws: &Workspace, add: AddArgs, usage: UsageArgs) -> Result<()> {
    let (path, canvas) = ws.load()?;
    let parent = parent_or_focus(&canvas, add.parent)?;
    let synthesis = canvas
        .gather_synthesis_tree()
        .context("canvas has no root to synthesize from")?;
    let content = read_content(add.text)?;
    let node = Node::create_plan(content, parent, synthesis.source_ids)
        .with_usage(usage.usage())
        .with_invocation(usage.invocation());
    commit_new_node(ws, &path, canvas, node, add.focus)
}

pub fn run_edit(ws: &Workspace, id: String, text: Option<String>) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    require_node(&canvas, &id)?;
    let content = read_content(text)?;
    canvas.edit_node(&id, content);
    ws.save(&path, &canvas)?;
    println!("{}", canvas.nodes[&id].content_compressed);
    Ok(())
}

/// Delete `id` and its subtree, returning the removed count and the parent.
fn delete_subtree(canvas: &mut Canvas, id: &str) -> Result<(usize, Option<String>)> {
    if require_node(canvas, id)?.kind.is_root() || canvas.root_id.as_deref() == Some(id) {
        bail!("cannot delete the root node: {id}");
    }
    let removed = canvas.collect_descendants(id).len() + 1;
    let parent = canvas.delete_node(id);
    Ok((removed, parent))
}

pub fn run_delete(ws: &Workspace, id: String) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    let (removed, parent) = delete_subtree(&mut canvas, &id)?;
    ws.save(&path, &canvas)?;
    match parent {
        Some(parent) => println!("deleted {removed} node(s); parent {parent}"),
        None => println!("deleted {removed} node(s)"),
    }
    Ok(())
}

pub fn run_focus(ws: &Workspace, id: String) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    if !canvas.set_focus(&id) {
        bail!("node not found: {id}");
    }
    ws.save(&path, &canvas)?;
    println!("{}", canvas.active_path.join(" > "));
    Ok(())
}

pub fn run_link(ws: &Workspace, from: String, to: String) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    require_node(&canvas, &from)?;
    require_node(&canvas, &to)?;
    if from == to {
        bail!("a node cannot link to itself: {from}");
    }
    if !canvas.add_link(&from, &to) {
        println!("already linked: {from} -> {to}");
        return Ok(());
    }
    ws.save(&path, &canvas)?;
    println!("{from} -> {to}");
    Ok(())
}

pub fn run_unlink(ws: &Workspace, from: String, to: String) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    require_node(&canvas, &from)?;
    require_node(&canvas, &to)?;
    if !canvas.remove_link(&from, &to) {
        bail!("no link from {from} to {to}");
    }
    ws.save(&path, &canvas)?;
    println!("unlinked {from} -> {to}");
    Ok(())
}

pub fn run_exclude(ws: &Workspace, id: String) -> Result<()> {
    let (path, mut canvas) = ws.load()?;
    let excluded = canvas
        .toggle_excluded(&id)
        .with_context(|| format!("node not found: {id}"))?;
    ws.save(&path, &canvas)?;
    println!("{}", if excluded { "excluded" } else { "included" });
    Ok(())
}
