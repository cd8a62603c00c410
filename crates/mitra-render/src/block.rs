//! Line-oriented block parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inline::split_emphasis;
use crate::{DocumentNode, InlineSpan, ListKind};

static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.\s").expect("ordered item pattern is valid"));

/// Renders the full accumulated text into document nodes.
///
/// Pure: the same input always yields the same nodes, and a trailing newline
/// does not add an extra empty line.
pub fn render(text: &str) -> Vec<DocumentNode> {
    let mut parser = BlockParser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

enum Line<'a> {
    Heading(u8, &'a str),
    Rule,
    Item(ListKind, &'a str),
    Blank,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("### ") {
        Line::Heading(3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        Line::Heading(2, rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        Line::Heading(1, rest)
    } else if line.starts_with("---") {
        Line::Rule
    } else if let Some(rest) = line.strip_prefix("* ") {
        Line::Item(ListKind::Unordered, rest)
    } else if let Some(marker) = ORDERED_ITEM.find(line) {
        Line::Item(ListKind::Ordered, &line[marker.end()..])
    } else if line.is_empty() {
        Line::Blank
    } else {
        Line::Text(line)
    }
}

/// Parser state between lines: finished nodes plus the open list, if any.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockParser {
    nodes: Vec<DocumentNode>,
    list: Option<(ListKind, Vec<Vec<InlineSpan>>)>,
}

impl BlockParser {
    pub(crate) fn feed(&mut self, line: &str) {
        let node = match classify(line) {
            Line::Item(kind, text) => {
                self.push_item(kind, text);
                return;
            }
            Line::Heading(level, text) => DocumentNode::Heading {
                level,
                spans: split_emphasis(text),
            },
            Line::Rule => DocumentNode::Rule,
            Line::Blank => DocumentNode::Spacer,
            Line::Text(text) => DocumentNode::Paragraph {
                spans: split_emphasis(text),
            },
        };

        self.flush_list();
        self.nodes.push(node);
    }

    pub(crate) fn finish(mut self) -> Vec<DocumentNode> {
        self.flush_list();
        self.nodes
    }

    fn push_item(&mut self, kind: ListKind, text: &str) {
        if self.list.as_ref().map(|(open, _)| *open) != Some(kind) {
            self.flush_list();
        }
        self.list
            .get_or_insert_with(|| (kind, Vec::new()))
            .1
            .push(split_emphasis(text));
    }

    fn flush_list(&mut self) {
        if let Some((kind, items)) = self.list.take() {
            if !items.is_empty() {
                self.nodes.push(DocumentNode::List { kind, items });
            }
        }
    }
}
