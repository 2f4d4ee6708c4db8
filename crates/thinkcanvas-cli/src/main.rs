mod cmd_canvas;
mod cmd_export;
mod cmd_node;
mod cmd_query;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use workspace::Workspace;

#[derive(Parser, Debug)]
#[command(name = "canvas")]
#[command(about = "Build, navigate, and export branching thinking canvases")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Canvas directory (default: ~/.thinkcanvas)
    #[arg(long, global = true, env = "THINKCANVAS_DIR")]
    dir: Option<PathBuf>,

    /// Canvas to operate on: a name in the canvas directory or a path to a
    /// .json file (default: most recently modified)
    #[arg(short, long, global = true)]
    canvas: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a canvas; reads the root goal from --text or stdin
    New {
        /// Canvas name
        name: String,

        /// Start from a built-in template
        #[arg(long)]
        template: Option<String>,

        /// Root content
        #[arg(long)]
        text: Option<String>,
    },
    /// List saved canvases, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List built-in templates
    Templates,
    /// Print the canvas tree with node ids
    Show,
    /// Add a user note; reads content from --text or stdin
    Note(cmd_node::AddArgs),
    /// Record the result of an operation; reads content from --text or stdin
    Op {
        /// Operation name (e.g. "@excavate")
        operation: String,

        #[command(flatten)]
        add: cmd_node::AddArgs,

        #[command(flatten)]
        usage: cmd_node::UsageArgs,
    },
    /// Record a plan synthesized from every non-excluded node
    Plan {
        #[command(flatten)]
        add: cmd_node::AddArgs,

        #[command(flatten)]
        usage: cmd_node::UsageArgs,
    },
    /// Replace a node's content; reads content from --text or stdin
    Edit {
        /// Node ID
        id: String,

        /// New content
        #[arg(long)]
        text: Option<String>,
    },
    /// Delete a node and its subtree
    Delete {
        /// Node ID
        id: String,
    },
    /// Move the focus to a node
    Focus {
        /// Node ID
        id: String,
    },
    /// Add a cross-link between two nodes
    Link { from: String, to: String },
    /// Remove a cross-link between two nodes
    Unlink { from: String, to: String },
    /// Toggle whether a node and its subtree feed plan synthesis
    Exclude {
        /// Node ID
        id: String,
    },
    /// Print the context an operation would receive
    Context(cmd_query::ContextArgs),
    /// Search node content
    Search(cmd_query::SearchArgs),
    /// Print canvas statistics as JSON
    Stats,
    /// Export the canvas to another format
    Export {
        #[command(subcommand)]
        format: cmd_export::ExportFormat,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let ws = Workspace::new(cli.dir, cli.canvas, cli.pretty);

    match cli.command {
        Commands::New {
            name,
            template,
            text,
        } => cmd_canvas::run_new(&ws, name, template, text),
        Commands::List { json } => cmd_canvas::run_list(&ws, json),
        Commands::Templates => cmd_canvas::run_templates(),
        Commands::Show => cmd_canvas::run_show(&ws),
        Commands::Note(add) => cmd_node::run_note(&ws, add),
        Commands::Op {
            operation,
            add,
            usage,
        } => cmd_node::run_op(&ws, operation, add, usage),
        Commands::Plan { add, usage } => cmd_node::run_plan(&ws, add, usage),
        Commands::Edit { id, text } => cmd_node::run_edit(&ws, id, text),
        Commands::Delete { id } => cmd_node::run_delete(&ws, id),
        Commands::Focus { id } => cmd_node::run_focus(&ws, id),
        Commands::Link { from, to } => cmd_node::run_link(&ws, from, to),
        Commands::Unlink { from, to } => cmd_node::run_unlink(&ws, from, to),
        Commands::Exclude { id } => cmd_node::run_exclude(&ws, id),
        Commands::Context(args) => cmd_query::run_context(&ws, args),
        Commands::Search(args) => cmd_query::run_search(&ws, args),
        Commands::Stats => cmd_query::run_stats(&ws),
        Commands::Export { format } => cmd_export::run(&ws, format),
    }
}
