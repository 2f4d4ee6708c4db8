use crate::workspace::{Workspace, require_node};
use anyhow::{Context, Result};
use clap::Args;
use thinkcanvas::v1::{Canvas, Node, format_context};

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Node IDs (default: the focused node). Several IDs gather a shared
    /// context for all of them.
    pub ids: Vec<String>,

    /// Append cross-linked nodes (single node only)
    #[arg(long)]
    pub links: bool,

    /// Print the plan-synthesis fold of the whole canvas instead
    #[arg(long, conflicts_with_all = ["ids", "links"])]
    pub synthesis: bool,

    /// Output the context nodes as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text (or pattern with --regex) to look for in full node content
    pub query: String,

    /// Treat the query as a case-insensitive regular expression
    #[arg(long, conflicts_with = "case_sensitive")]
    pub regex: bool,

    /// Match case exactly
    #[arg(long)]
    pub case_sensitive: bool,

    /// Output matching nodes as JSON
    #[arg(long)]
    pub json: bool,
}

fn gather<'a>(canvas: &'a Canvas, ids: &[String], links: bool) -> Result<Vec<&'a Node>> {
    match ids {
        [] => {
            let focus = canvas
                .focus_node()
                .context("canvas has no focused node")?;
            Ok(single(canvas, &focus.id, links))
        }
        [id] => {
            require_node(canvas, id)?;
            Ok(single(canvas, id, links))
        }
        many => {
            for id in many {
                require_node(canvas, id)?;
            }
            Ok(canvas.get_context_for_multiple_nodes(many))
        }
    }
}

fn single<'a>(canvas: &'a Canvas, id: &str, links: bool) -> Vec<&'a Node> {
    if links {
        canvas.get_context_for_operation_with_links(id)
    } else {
        canvas.get_context_for_operation(id)
    }
}

pub fn run_context(ws: &Workspace, args: ContextArgs) -> Result<()> {
    let (_, canvas) = ws.load()?;

    if args.synthesis {
        let synthesis = canvas
            .gather_synthesis_tree()
            .context("canvas has no root")?;
        if args.json {
            return ws.print_json(&serde_json::json!({
                "text": synthesis.text,
                "source_ids": synthesis.source_ids,
            }));
        }
        println!("{}", synthesis.text);
        return Ok(());
    }

    let context = gather(&canvas, &args.ids, args.links)?;
    if args.json {
        return ws.print_json(&context);
    }
    println!("{}", format_context(&context));
    Ok(())
}

pub fn run_search(ws: &Workspace, args: SearchArgs) -> Result<()> {
    let (_, canvas) = ws.load()?;
    let hits = if args.regex {
        canvas.search_regex(&args.query)
    } else {
        canvas.search(&args.query, args.case_sensitive)
    };

    if args.json {
        return ws.print_json(&hits);
    }
    for node in hits {
        println!("{} [{}] {}", node.id, node.label(), node.content_compressed);
    }
    Ok(())
}

pub fn run_stats(ws: &Workspace) -> Result<()> {
    let (_, canvas) = ws.load()?;
    ws.print_json(&canvas.get_statistics())
}
