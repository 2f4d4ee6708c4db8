//! Shared plumbing: locating, loading, and saving the canvas a command
//! operates on.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thinkcanvas::v1::{Canvas, CanvasStore, Node};

pub struct Workspace {
    store: CanvasStore,
    canvas: Option<String>,
    pub pretty: bool,
}

impl Workspace {
    pub fn new(dir: Option<PathBuf>, canvas: Option<String>, pretty: bool) -> Self {
        let store = match dir {
            Some(dir) => CanvasStore::new().with_dir(dir),
            None => CanvasStore::new(),
        };
        Self {
            store,
            canvas,
            pretty,
        }
    }

    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    /// The file behind `--canvas`, or the most recent canvas when omitted.
    pub fn canvas_path(&self) -> Result<PathBuf> {
        match self.canvas.as_deref() {
            Some(arg) => resolve_canvas_arg(&self.store, arg),
            None => self
                .store
                .most_recent()
                .context("failed to scan canvas directory")?
                .context("no saved canvases; create one with `canvas new`"),
        }
    }

    pub fn load(&self) -> Result<(PathBuf, Canvas)> {
        let path = self.canvas_path()?;
        tracing::debug!(path = %path.display(), "resolved canvas");
        let canvas = Canvas::load(&path)
            .with_context(|| format!("failed to load canvas: {}", path.display()))?;
        Ok((path, canvas))
    }

    pub fn save(&self, path: &Path, canvas: &Canvas) -> Result<()> {
        canvas
            .save(path)
            .with_context(|| format!("failed to save canvas: {}", path.display()))
    }

    /// Print a value as JSON, honoring `--pretty`.
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{json}");
        Ok(())
    }
}

fn resolve_canvas_arg(store: &CanvasStore, arg: &str) -> Result<PathBuf> {
    let as_path = PathBuf::from(arg);
    if arg.ends_with(".json") || as_path.exists() {
        return Ok(as_path);
    }
    store
        .path_for(arg)
        .context("failed to resolve canvas directory")
}

/// `--text` when given, otherwise all of stdin.
pub fn read_content(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf.trim_end_matches('\n').to_string())
}

pub fn require_node<'a>(canvas: &'a Canvas, id: &str) -> Result<&'a Node> {
    canvas
        .get_node(id)
        .with_context(|| format!("node not found: {id}"))
}
