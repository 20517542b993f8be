//! Heading-driven section discovery and assembly of the final [`Metadata`].

use std::collections::{BTreeSet, HashSet};

use strata_syntax::{Span, TextFormat};

use super::{Metadata, NodeId, SectionKey, SectionTree, TypeInterval};
use crate::attr_line::{AttrValue, Role, StyledText};

/// Builds the outline of `text` from its heading attributes alone.
///
/// Headings nest by level: a heading closes every open heading at the same
/// or a deeper level. Headings inside quoted text are ignored.
pub fn discover_metadata(text: &StyledText) -> Metadata {
    MetadataBuilder::new(TextFormat::Unknown).build(text)
}

/// Collects the pieces of a discovery run and turns them into
/// [`Metadata`].
pub(crate) struct MetadataBuilder {
    structure: Option<SectionTree>,
    type_intervals: Vec<TypeInterval>,
    indents: BTreeSet<usize>,
    text_format: TextFormat,
}

impl MetadataBuilder {
    pub(crate) fn new(text_format: TextFormat) -> Self {
        Self {
            structure: None,
            type_intervals: Vec::new(),
            indents: BTreeSet::new(),
            text_format,
        }
    }

    pub(crate) fn with_structure(
        mut self,
        tree: SectionTree,
        type_intervals: Vec<TypeInterval>,
        indents: BTreeSet<usize>,
    ) -> Self {
        self.structure = Some(tree);
        self.type_intervals = type_intervals;
        self.indents = indents;
        self
    }

    /// Runs the header pass over `text`, merges it with any token-driven
    /// structure, collapses a lone root child and maps offsets back to the
    /// source.
    pub(crate) fn build(self, text: &StyledText) -> Metadata {
        let merged = match (self.structure, header_tree(text)) {
            (Some(body), Some(headers)) => Some(graft(headers, &body)),
            (body, headers) => body.or(headers),
        };

        let mut tree = merged
            .filter(|tree| !tree.node(tree.root()).is_leaf())
            .map(collapse_root);

        let mut type_intervals = self.type_intervals;
        if has_origin_offsets(text) {
            if let Some(tree) = tree.as_mut() {
                tree.for_each_node_mut(|node| {
                    node.start = text.origin_start(node.start);
                    node.stop = text.origin_stop(node.stop);
                });
            }
            for interval in &mut type_intervals {
                interval.start = text.origin_start(interval.start);
                interval.stop = text.origin_stop(interval.stop);
            }
        }

        Metadata::new(tree, type_intervals, self.indents, self.text_format)
    }
}

fn has_origin_offsets(text: &StyledText) -> bool {
    text.attrs()
        .iter()
        .any(|attr| matches!(attr.value, AttrValue::OriginOffset(_)))
}

/// Makes the only child the root when the root is just a wrapper.
fn collapse_root(tree: SectionTree) -> SectionTree {
    let root = tree.node(tree.root());
    match root.children() {
        [only] if root.named_children().next().is_none() => tree.compacted(*only),
        _ => tree.compacted(tree.root()),
    }
}

fn header_tree(text: &StyledText) -> Option<SectionTree> {
    let quoted: Vec<Span> = text.ranges_with_role(Role::QuotedText).collect();
    let mut headings: Vec<(Span, u8)> = text
        .headings()
        .filter(|(range, _)| !quoted.iter().any(|q| q.contains(range.start)))
        .collect();
    if headings.is_empty() {
        return None;
    }
    headings.sort_by_key(|(range, _)| (range.start, range.end));

    let lines = LineIndex::new(text.text());
    let mut tree = SectionTree::with_root(0, text.len(), 0);
    let mut open: Vec<(u8, NodeId)> = Vec::new();

    for (range, level) in headings {
        while let Some(&(open_level, id)) = open.last()
            && open_level >= level
        {
            tree.node_mut(id).stop = range.start;
            open.pop();
        }

        if range.is_empty() {
            continue;
        }

        let parent = open.last().map_or(tree.root(), |(_, id)| *id);
        let node = tree.alloc(range.start, text.len(), lines.line_of(range.start));
        let name = heading_name(text.substr(range));
        let key = if name.is_empty() {
            SectionKey::Index(tree.node(parent).children().len())
        } else {
            SectionKey::Name(name.to_string())
        };
        tree.attach(parent, node, key);
        open.push((level, node));
    }

    Some(tree)
}

/// First line of the heading text without `#` markers or surrounding
/// whitespace.
fn heading_name(heading: &str) -> &str {
    heading
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches('#')
        .trim_end_matches('#')
        .trim()
}

/// Moves each top-level node of `body` under the deepest heading that fully
/// contains it. Nodes straddling a heading boundary are dropped.
fn graft(mut headers: SectionTree, body: &SectionTree) -> SectionTree {
    let header_ids: HashSet<NodeId> = headers.iter_depth_first(headers.root()).collect();
    let mut receivers = BTreeSet::new();

    for &child in body.node(body.root()).children() {
        let node = body.node(child);
        let Some(target) = enclosing_header(&headers, &header_ids, node.span()) else {
            continue;
        };
        let key = node.key().cloned().unwrap_or(SectionKey::Index(0));
        headers.copy_subtree(target, body, child, key);
        receivers.insert(target);
    }

    for id in receivers {
        headers.sort_children(id);
    }
    headers
}

fn enclosing_header(
    tree: &SectionTree,
    header_ids: &HashSet<NodeId>,
    span: Span,
) -> Option<NodeId> {
    let mut current = tree.root();
    'descend: loop {
        for &child in tree.node(current).children() {
            if !header_ids.contains(&child) {
                continue;
            }
            let header = tree.node(child).span();
            if header.encloses(span) {
                current = child;
                continue 'descend;
            }
            if header.overlaps(span) {
                return None;
            }
        }
        return Some(current);
    }
}

/// Byte offsets of line starts.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|start| *start <= offset).saturating_sub(1)
    }
}
