//! Persistence: canvas documents on disk and the directory that holds them.

use crate::canvas::Canvas;
use crate::error::{CanvasError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the canvas directory.
pub const CANVAS_DIR_ENV: &str = "THINKCANVAS_DIR";

/// Directory name under the home directory used when no override is set.
pub const DEFAULT_DIR_NAME: &str = ".thinkcanvas";

impl Canvas {
    /// Write the canonical document as pretty JSON, creating parent
    /// directories as needed. The write is atomic: a temp file in the same
    /// directory is persisted over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&tmp, self)?;
        tmp.persist(path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), nodes = self.nodes.len(), "saved canvas");
        Ok(())
    }

    /// Read a canvas document and re-derive every preview from full content.
    ///
    /// Stored previews are not trusted: the compression heuristic may have
    /// changed since the file was written.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CanvasError::CanvasNotFound(path.to_path_buf()),
            _ => CanvasError::Io(e),
        })?;
        let mut canvas = Canvas::from_json(&data)?;
        canvas.recompute_compressed();
        tracing::debug!(path = %path.display(), nodes = canvas.nodes.len(), "loaded canvas");
        Ok(canvas)
    }

    /// Recompute every node's preview with the canvas' compress length.
    pub fn recompute_compressed(&mut self) {
        let compress_length = self.compress_length;
        for node in self.nodes.values_mut() {
            node.recompress(compress_length);
        }
    }
}

/// Listing entry for a saved canvas file.
#[derive(Debug, Clone, Serialize)]
pub struct CanvasSummary {
    pub name: String,
    pub path: PathBuf,
    pub created_at: String,
    pub node_count: usize,
    pub modified_at: DateTime<Utc>,
}

/// Resolves where canvases live and enumerates them.
#[derive(Debug, Clone)]
pub struct CanvasStore {
    home_dir: Option<PathBuf>,
    canvas_dir: Option<PathBuf>,
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    /// Resolve from `$THINKCANVAS_DIR`, falling back to `~/.thinkcanvas`.
    pub fn new() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            canvas_dir: std::env::var_os(CANVAS_DIR_ENV).map(PathBuf::from),
        }
    }

    pub fn with_home<P: Into<PathBuf>>(mut self, home: P) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.canvas_dir = Some(dir.into());
        self
    }

    pub fn dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.canvas_dir {
            return Ok(dir.clone());
        }
        let home = self.home_dir.as_deref().ok_or(CanvasError::NoHomeDirectory)?;
        Ok(home.join(DEFAULT_DIR_NAME))
    }

    /// The canvas directory, created if missing.
    pub fn ensure_dir(&self) -> Result<PathBuf> {
        let dir = self.dir()?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// `<dir>/<sanitized name>.json`, whether or not it exists.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir()?.join(format!("{}.json", sanitize_file_stem(name))))
    }

    /// A path for `name` that does not exist yet, suffixing `-2`, `-3`, …
    pub fn unique_path(&self, name: &str) -> Result<PathBuf> {
        let dir = self.dir()?;
        let stem = sanitize_file_stem(name);
        let base = dir.join(format!("{stem}.json"));
        if !base.exists() {
            return Ok(base);
        }
        let mut counter = 2;
        loop {
            let candidate = dir.join(format!("{stem}-{counter}.json"));
            if !candidate.exists() {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    /// Every readable canvas in the directory, most recently modified first.
    /// Hidden files and files that fail to parse are skipped.
    pub fn list_saved(&self) -> Result<Vec<CanvasSummary>> {
        let dir = self.dir()?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut canvases = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name.starts_with('.') || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            match summarize(&path) {
                Ok(summary) => canvases.push(summary),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable canvas");
                }
            }
        }

        canvases.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(canvases)
    }

    /// Path of the most recently modified canvas, if any.
    pub fn most_recent(&self) -> Result<Option<PathBuf>> {
        Ok(self.list_saved()?.into_iter().next().map(|s| s.path))
    }
}

fn summarize(path: &Path) -> Result<CanvasSummary> {
    let data = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&data)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let modified = fs::metadata(path)?.modified()?;

    Ok(CanvasSummary {
        name: value
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(stem),
        path: path.to_path_buf(),
        created_at: value
            .get("created_at")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        node_count: value
            .get("nodes")
            .and_then(|v| v.as_object())
            .map_or(0, |m| m.len()),
        modified_at: DateTime::<Utc>::from(modified),
    })
}

/// Keep alphanumerics, `-` and `_`; everything else becomes `-`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
