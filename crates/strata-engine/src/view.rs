//! Line-oriented view over a discovered document.
//!
//! [`DocumentView`] pairs the text with an `xi_rope::Rope` used as a line
//! index, and answers the questions a pager asks: which section is this
//! line in, where does an anchor point, what are the neighbouring sections.
//! Replacing the content reruns discovery and discards every [`NodeId`]
//! handed out before.

use std::collections::BTreeSet;

use strata_syntax::{Span, TextFormat};
use xi_rope::{LinesMetric, Rope};

use crate::anchors::to_anchor_string;
use crate::attr_line::StyledText;
use crate::discover::{DiscoveryOptions, discover};
use crate::sections::{Metadata, NodeId, SectionKey, decode_path};

/// Listing anchors stops once more than this many were collected.
pub const MAX_ANCHORS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// One level of the section path at a line, with the names it could be
/// switched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub key: SectionKey,
    pub possibilities: Vec<String>,
}

pub struct DocumentView {
    rope: Rope,
    text: StyledText,
    metadata: Metadata,
    format: TextFormat,
    options: DiscoveryOptions,
}

impl DocumentView {
    pub fn new(content: &str, format: TextFormat, options: DiscoveryOptions) -> Self {
        let mut text = StyledText::new(content);
        let metadata = discover(&mut text)
            .with_text_format(format)
            .with_options(options)
            .perform();
        Self {
            rope: Rope::from(content),
            text,
            metadata,
            format,
            options,
        }
    }

    /// Swaps in new content and rediscovers its structure.
    pub fn replace_content(&mut self, content: &str) {
        *self = Self::new(content, self.format, self.options);
    }

    pub fn text(&self) -> &StyledText {
        &self.text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn line_count(&self) -> usize {
        self.rope.measure::<LinesMetric>() + 1
    }

    /// Byte range of `line`, excluding its line terminator.
    pub fn line_range(&self, line: usize) -> Option<Span> {
        if line >= self.line_count() {
            return None;
        }
        let start = self.rope.offset_of_line(line);
        let end = self.rope.offset_of_line(line + 1);
        let body = self.rope.slice_to_cow(start..end);
        let trimmed = body.trim_end_matches(['\n', '\r']);
        Some(Span::new(start, start + trimmed.len()))
    }

    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.line_of_offset(offset.min(self.rope.len()))
    }

    /// Anchor of the innermost named section on `line`. Lines whose
    /// innermost section is unnamed have none.
    pub fn anchor_for_line(&self, line: usize) -> Option<String> {
        let span = self.line_range(line)?;
        let interval = self.metadata.intervals_overlapping(span).last()?;
        interval.key.as_name().map(to_anchor_string)
    }

    /// First line of the section an anchor points to.
    ///
    /// Accepts either a name anchor (`#getting-started`) or an encoded
    /// section path (`#/server/0`). For name anchors the first section in
    /// document order wins.
    pub fn line_for_anchor(&self, anchor: &str) -> Option<usize> {
        let tree = self.metadata.tree()?;

        if let Some(encoded) = anchor.strip_prefix('#').filter(|rest| rest.starts_with('/')) {
            let path = decode_path(encoded).ok()?;
            let id = tree.lookup_path(tree.root(), &path)?;
            return Some(tree.node(id).line_number);
        }

        tree.iter_depth_first(tree.root())
            .map(|id| tree.node(id))
            .find(|node| {
                node.key()
                    .and_then(SectionKey::as_name)
                    .is_some_and(|name| to_anchor_string(name) == anchor)
            })
            .map(|node| node.line_number)
    }

    /// Anchors of the named sections.
    pub fn anchors(&self) -> BTreeSet<String> {
        let mut anchors = BTreeSet::new();
        let Some(tree) = self.metadata.tree() else {
            return anchors;
        };

        tree.depth_first(tree.root(), |_, node| {
            if anchors.len() > MAX_ANCHORS {
                return;
            }
            for (name, _) in node.named_children() {
                anchors.insert(to_anchor_string(name));
            }
        });
        anchors
    }

    /// Section path at `line`, outermost first.
    pub fn breadcrumbs(&self, line: usize) -> Vec<Breadcrumb> {
        let Some(offset) = self.line_point(line) else {
            return Vec::new();
        };
        let path = self.metadata.path_for_range(offset, offset);
        (0..path.len())
            .map(|depth| Breadcrumb {
                key: path[depth].clone(),
                possibilities: self.metadata.possibility_provider(&path[..=depth]),
            })
            .collect()
    }

    /// Line of the section to jump to from `line`.
    pub fn adjacent_section(&self, line: usize, direction: Direction) -> Option<usize> {
        let tree = self.metadata.tree()?;
        let offset = self.line_point(line)?;
        let node = self.metadata.node_for_range(offset, offset)?;

        let neighbors = match tree.node(node).parent() {
            Some(parent) => tree.child_neighbors(parent, node, offset)?,
            None => tree.line_neighbors(node, line)?,
        };
        let target: Option<NodeId> = match direction {
            Direction::Previous => neighbors.previous,
            Direction::Next => neighbors.next,
        };
        target.map(|id| tree.node(id).line_number)
    }

    /// First non-blank byte of `line`, or its start when the line is blank.
    fn line_point(&self, line: usize) -> Option<usize> {
        let span = self.line_range(line)?;
        let body = self.text.substr(span);
        let indent = body.len() - body.trim_start().len();
        Some(if indent == body.len() {
            span.start
        } else {
            span.start + indent
        })
    }
}
