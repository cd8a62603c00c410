//! Markdown renderer for streamed evaluation text.
//!
//! The model delivers markdown in arbitrary pieces, so block structure is
//! re-derived from the whole accumulated text on every update:
//!
//! - [`render`] — pure, full re-parse of the accumulated text
//! - [`IncrementalRenderer`] — same output, re-parsing only the trailing
//!   partial line
//!
//! # Example
//!
//! ```rust
//! use mitra_render::{render, DocumentNode, InlineSpan};
//!
//! let nodes = render("## Verdict\nA **strong** answer\n");
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(
//!     nodes[1],
//!     DocumentNode::Paragraph {
//!         spans: vec![
//!             InlineSpan::Plain("A ".into()),
//!             InlineSpan::Emphasized("strong".into()),
//!             InlineSpan::Plain(" answer".into()),
//!         ],
//!     }
//! );
//! ```

mod block;
mod incremental;
mod inline;

pub use block::render;
pub use incremental::IncrementalRenderer;
pub use inline::split_emphasis;

use serde::Serialize;

/// One run of text inside a heading, paragraph or list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum InlineSpan {
    Plain(String),
    Emphasized(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Plain(text) | InlineSpan::Emphasized(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// A structural unit of the rendered evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentNode {
    /// Level is always 1, 2 or 3.
    Heading { level: u8, spans: Vec<InlineSpan> },
    Paragraph { spans: Vec<InlineSpan> },
    List { kind: ListKind, items: Vec<Vec<InlineSpan>> },
    Rule,
    Spacer,
}

impl DocumentNode {
    /// Text content with emphasis markers removed. Lists join items with newlines.
    pub fn plain_text(&self) -> String {
        fn join(spans: &[InlineSpan]) -> String {
            spans.iter().map(InlineSpan::text).collect()
        }

        match self {
            DocumentNode::Heading { spans, .. } | DocumentNode::Paragraph { spans } => join(spans),
            DocumentNode::List { items, .. } => items
                .iter()
                .map(|item| join(item))
                .collect::<Vec<_>>()
                .join("\n"),
            DocumentNode::Rule | DocumentNode::Spacer => String::new(),
        }
    }
}
