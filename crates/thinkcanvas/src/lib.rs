#![doc = include_str!("../README.md")]

mod canvas;
mod compress;
mod context;
mod error;
mod export;
mod history;
mod query;
mod store;
mod template;
mod types;

pub mod v1 {
    //! Versioned public API for thinking canvases.
    //!
    //! Everything you need is re-exported from this module.
    //!
    //! # Graph
    //!
    //! - [`Canvas`]: the node arena plus its focus path and undo history
    //! - [`Node`]: one thought, with its full content and derived preview
    //! - [`NodeKind`]: root, operation, user note, or synthesized plan
    //! - [`Usage`], [`Invocation`]: bookkeeping attached by whoever ran the
    //!   operation that produced a node
    //!
    //! # Reading a canvas
    //!
    //! - [`compress`]: derive a node preview from full content
    //! - [`format_context`]: lay out gathered context nodes as prompt text
    //! - [`SynthesisTree`]: the excluded-aware fold used for plan nodes
    //! - [`Statistics`]: counts and usage totals
    //!
    //! # Persistence
    //!
    //! - [`CanvasStore`]: where canvases live; listing and naming
    //! - [`CanvasSummary`]: one entry of a listing
    //! - [`CanvasError`], [`Result`]
    //!
    //! # Example: branch, focus, and gather context
    //!
    //! ```
    //! use thinkcanvas::v1::*;
    //!
    //! let mut canvas = Canvas::new("todo-app");
    //! let root = Node::create_root("Build a todo app");
    //! let root_id = root.id.clone();
    //! canvas.add_node(root);
    //!
    //! let op = Node::create_operation(
    //!     "@excavate",
    //!     "Assumes a single user per device",
    //!     &root_id,
    //!     vec![root_id.clone()],
    //! );
    //! let op_id = op.id.clone();
    //! canvas.add_node(op);
    //! canvas.set_focus(&op_id);
    //!
    //! let context = canvas.get_context_for_operation(&op_id);
    //! assert_eq!(context.len(), 2);
    //!
    //! let prompt = format_context(&context);
    //! assert!(prompt.starts_with("Build a todo app"));
    //! assert!(prompt.ends_with("[@excavate]\nAssumes a single user per device"));
    //!
    //! assert!(canvas.undo());
    //! assert_eq!(canvas.nodes.len(), 1);
    //! ```

    /// Built-in starting points for new canvases.
    pub mod template {
        pub use crate::template::{CanvasTemplate, get_template, list_templates};
    }

    pub use crate::canvas::Canvas;
    pub use crate::compress::{DEFAULT_COMPRESSION_LENGTH, compress};
    pub use crate::context::{CONTEXT_SEPARATOR, SynthesisTree, format_context};
    pub use crate::error::{CanvasError, Result};
    pub use crate::history::MAX_UNDO_HISTORY;
    pub use crate::query::Statistics;
    pub use crate::store::{CANVAS_DIR_ENV, CanvasStore, CanvasSummary, sanitize_file_stem};
    pub use crate::types::{Invocation, Node, NodeKind, PLAN_OPERATION, Usage};
}
