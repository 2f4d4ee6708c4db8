use crate::workspace::Workspace;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;
use thinkcanvas::v1::Canvas;

#[derive(Subcommand, Debug)]
pub enum ExportFormat {
    /// Markdown outline with quoted full content
    Markdown {
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Mermaid flowchart (tree edges solid, cross-links dotted)
    Mermaid {
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Plain indented outline
    Outline {
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// The canonical canvas document
    Json {
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn render(canvas: &Canvas, format: &ExportFormat, pretty: bool) -> Result<String> {
    Ok(match format {
        ExportFormat::Markdown { .. } => canvas.export_markdown(),
        ExportFormat::Mermaid { .. } => canvas.export_mermaid(),
        ExportFormat::Outline { .. } => canvas.export_outline(),
        ExportFormat::Json { .. } if pretty => canvas.to_json_pretty()?,
        ExportFormat::Json { .. } => canvas.to_json()?,
    })
}

pub fn run(ws: &Workspace, format: ExportFormat) -> Result<()> {
    let (_, canvas) = ws.load()?;
    let rendered = render(&canvas, &format, ws.pretty)?;

    let output = match format {
        ExportFormat::Markdown { output }
        | ExportFormat::Mermaid { output }
        | ExportFormat::Outline { output }
        | ExportFormat::Json { output } => output,
    };

    match output {
        Some(out) => {
            std::fs::write(&out, format!("{rendered}\n"))
                .with_context(|| format!("failed to write to {}", out.display()))?;
            eprintln!("Wrote {}", out.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
