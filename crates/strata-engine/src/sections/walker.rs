//! Token-driven section discovery.
//!
//! A single forward pass over [`Scanner`] tokens. Open brackets and tags
//! push a [`Frame`]; each frame collects a "pending child" from the values
//! seen since the last separator, naming it after a preceding `key:` or
//! `key=`. Closing a group attaches its node to the enclosing frame. The
//! state lives on an explicit stack, so deeply nested input cannot exhaust
//! the call stack.
//!
//! Headings found along the way are not handled here: they are added to
//! the [`StyledText`] as heading roles and picked up by the header pass in
//! [`super::headers`].

use std::collections::BTreeSet;

use log::{debug, trace};
use strata_syntax::{DataToken, Scanner, Span, TextFormat, Token};

use super::headers::MetadataBuilder;
use super::{Metadata, NodeId, SectionKey, SectionTree, SectionType, TypeInterval};
use crate::attr_line::{AttrValue, Role, StringAttr, StyledText};
use crate::discover::DiscoveryOptions;

/// Discovers brackets, tags, `key: value` groups and headings in `range`
/// of `text`.
///
/// Heading, comment and string roles are added to `text` as a side effect.
/// Malformed input never fails: unbalanced closers are treated as values,
/// unterminated groups end at the last token, and scanning stops once more
/// than [`DiscoveryOptions::garbage_limit`] garbage tokens were seen.
pub fn discover_structure(
    text: &mut StyledText,
    range: Span,
    format: TextFormat,
    options: &DiscoveryOptions,
) -> Metadata {
    let walk = StructureWalker::new(text.text(), range, format, options).walk();
    text.extend_attrs(walk.attrs);

    MetadataBuilder::new(format)
        .with_structure(walk.tree, walk.type_intervals, walk.indents)
        .build(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Closer {
    Curly,
    Square,
    Paren,
    Tag(String),
}

impl Closer {
    /// Groups that read as a scalar when they open and close on one line,
    /// e.g. `(pid 42, uid 7)` in a log message.
    fn collapses_on_one_line(&self) -> bool {
        matches!(self, Closer::Paren | Closer::Square)
    }
}

#[derive(Debug, Default)]
struct PendingChild {
    start: Option<usize>,
    line_number: usize,
    name: Option<String>,
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    /// `None` only for the root frame.
    closer: Option<Closer>,
    pending: PendingChild,
}

#[derive(Debug, Clone, Copy)]
struct Value {
    kind: DataToken,
    capture: Span,
    inner: Span,
    line_number: usize,
}

pub(crate) struct WalkOutput {
    pub tree: SectionTree,
    pub type_intervals: Vec<TypeInterval>,
    pub indents: BTreeSet<usize>,
    pub attrs: Vec<StringAttr>,
}

struct StructureWalker<'a> {
    text: &'a str,
    range: Span,
    format: TextFormat,
    options: DiscoveryOptions,
    tree: SectionTree,
    frames: Vec<Frame>,
    values: Vec<Value>,
    line_number: usize,
    at_line_start: bool,
    last_end: usize,
    garbage: usize,
    indents: BTreeSet<usize>,
    type_intervals: Vec<TypeInterval>,
    attrs: Vec<StringAttr>,
}

impl<'a> StructureWalker<'a> {
    fn new(text: &'a str, range: Span, format: TextFormat, options: &DiscoveryOptions) -> Self {
        let end = range.end.min(text.len());
        let start = range.start.min(end);
        let bytes = text.as_bytes();
        let line_number = bytes[..start].iter().filter(|b| **b == b'\n').count();
        let tree = SectionTree::with_root(start, end, line_number);
        let root = tree.root();

        Self {
            text,
            range: Span::new(start, end),
            format,
            options: *options,
            tree,
            frames: vec![Frame {
                node: root,
                closer: None,
                pending: PendingChild::default(),
            }],
            values: Vec::new(),
            line_number,
            at_line_start: start == 0 || bytes[start - 1] == b'\n',
            last_end: start,
            garbage: 0,
            indents: BTreeSet::new(),
            type_intervals: Vec::new(),
            attrs: Vec::new(),
        }
    }

    fn walk(mut self) -> WalkOutput {
        let scanner = Scanner::new(self.text, self.range, self.format);
        for token in scanner {
            trace!("{:?} {:?}", token.kind, token.text);
            self.last_end = token.capture.end;
            if !self.on_token(&token) {
                debug!(
                    "stopped scanning at offset {} after {} garbage tokens",
                    token.capture.start, self.garbage
                );
                break;
            }
        }
        self.finish()
    }

    /// Returns false once the garbage limit is exceeded.
    fn on_token(&mut self, token: &Token<'_>) -> bool {
        let structured = self.format.is_structured();

        match token.kind {
            DataToken::Whitespace => {
                if self.at_line_start && self.options.indent_guides {
                    self.indents.insert(indent_width(token.text));
                }
            }
            DataToken::Line => self.line_number += 1,
            DataToken::CurlyOpen if structured => self.open_group(token, Closer::Curly, None),
            DataToken::SquareOpen if structured => self.open_group(token, Closer::Square, None),
            DataToken::ParenOpen if structured => self.open_group(token, Closer::Paren, None),
            DataToken::CurlyClose if structured => self.close_group(token, Closer::Curly),
            DataToken::SquareClose if structured => self.close_group(token, Closer::Square),
            DataToken::ParenClose if structured => self.close_group(token, Closer::Paren),
            DataToken::XmlOpenTag => {
                let name = self.slice(token.inner).to_string();
                self.open_group(token, Closer::Tag(name.clone()), Some(name));
            }
            DataToken::XmlCloseTag => {
                let name = self.slice(token.inner).to_string();
                self.close_group(token, Closer::Tag(name));
            }
            DataToken::Comma if structured && self.frames.len() > 1 => {
                let terminator = self.flush_values();
                self.complete_value_child(terminator);
            }
            DataToken::Heading(level) => self.add_role(token.capture, Role::Heading(level)),
            DataToken::DiffFileHeader => self.add_role(token.inner, Role::Heading(1)),
            DataToken::DiffHunkHeading => self.add_role(token.capture, Role::Heading(2)),
            DataToken::Comment => {
                self.add_type_interval(token.capture, SectionType::Comment);
                self.add_role(token.capture, Role::Comment);
            }
            DataToken::QuotedString => {
                if token.text.contains('\n') {
                    self.add_type_interval(token.capture, SectionType::MultilineString);
                    self.add_role(token.capture, Role::String);
                }
                self.push_value(token);
            }
            DataToken::ZeroWidthSpace => {}
            DataToken::Garbage => {
                self.garbage += 1;
                if self.garbage > self.options.garbage_limit {
                    return false;
                }
                self.push_value(token);
            }
            _ => self.push_value(token),
        }

        if token.kind != DataToken::Line {
            self.line_number += token.text.matches('\n').count();
        }
        self.at_line_start = token.kind == DataToken::Line;
        true
    }

    fn slice(&self, span: Span) -> &'a str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    fn add_role(&mut self, range: Span, role: Role) {
        self.attrs.push(StringAttr {
            range,
            value: AttrValue::Role(role),
        });
    }

    fn add_type_interval(&mut self, range: Span, kind: SectionType) {
        self.type_intervals.push(TypeInterval {
            start: range.start,
            stop: range.end,
            kind,
        });
    }

    fn push_value(&mut self, token: &Token<'_>) {
        self.values.push(Value {
            kind: token.kind,
            capture: token.capture,
            inner: token.inner,
            line_number: self.line_number,
        });
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Folds buffered values into the pending child of the innermost frame
    /// and returns the span of the last one.
    fn flush_values(&mut self) -> Option<Span> {
        let terminator = self.values.last()?.capture;
        let values = std::mem::take(&mut self.values);
        let text = self.text;
        let pending = &mut self.top().pending;

        if pending.start.is_none() {
            pending.start = Some(values[0].capture.start);
            pending.line_number = values[0].line_number;
        }

        let mut key: Option<Value> = None;
        for value in &values {
            match value.kind {
                kind if kind.can_be_key() => key = Some(*value),
                DataToken::Colon | DataToken::Equals => {
                    if let Some(key) = key.take() {
                        let name = text.get(key.inner.start..key.inner.end).unwrap_or("").trim();
                        if !name.is_empty() {
                            pending.name = Some(name.to_string());
                            pending.start = Some(key.capture.start);
                            pending.line_number = key.line_number;
                        }
                    }
                }
                _ => {}
            }
        }

        Some(terminator)
    }

    /// Turns the pending child of the innermost frame into a leaf ending at
    /// `terminator`. Values outside of any group produce no node.
    fn complete_value_child(&mut self, terminator: Option<Span>) {
        let depth = self.frames.len() - 1;
        let frame = self.top();
        let pending = std::mem::take(&mut frame.pending);
        let parent = frame.node;

        if depth == 0 {
            return;
        }
        let (Some(start), Some(terminator)) = (pending.start, terminator) else {
            return;
        };
        let node = self.tree.alloc(start, terminator.end, pending.line_number);
        self.attach(parent, node, pending.name);
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, name: Option<String>) {
        let key = match name {
            Some(name) => SectionKey::Name(name),
            None => SectionKey::Index(self.tree.node(parent).children().len()),
        };
        self.tree.attach(parent, node, key);
    }

    fn open_group(&mut self, token: &Token<'_>, closer: Closer, name: Option<String>) {
        self.flush_values();

        let line_number = self.line_number;
        let pending = &mut self.top().pending;
        pending.start = Some(token.capture.start);
        pending.line_number = line_number;
        if name.is_some() {
            pending.name = name;
        }

        let node = self
            .tree
            .alloc(token.capture.start, token.capture.end, line_number);
        self.frames.push(Frame {
            node,
            closer: Some(closer),
            pending: PendingChild::default(),
        });
    }

    fn close_group(&mut self, token: &Token<'_>, closer: Closer) {
        let Some(matched) = self
            .frames
            .iter()
            .rposition(|frame| frame.closer.as_ref() == Some(&closer))
        else {
            // Nothing open for this closer to close.
            self.push_value(token);
            return;
        };

        let terminator = self.flush_values();
        self.complete_value_child(terminator);

        // Every group closed here, matched or not, collapses when nothing
        // between its start and the closer's end breaks the line.
        let collapse_until = Some(token.capture.end);
        while self.frames.len() > matched + 1 {
            let collapses = self
                .frames
                .last()
                .and_then(|frame| frame.closer.as_ref())
                .is_some_and(Closer::collapses_on_one_line);
            self.pop_frame(token.capture.start, collapse_until.filter(|_| collapses));
        }
        self.pop_frame(
            token.capture.end,
            collapse_until.filter(|_| closer.collapses_on_one_line()),
        );
    }

    /// Closes the innermost frame at `stop` and attaches its node to the
    /// enclosing frame under that frame's pending name or next index.
    ///
    /// With `collapse_until`, the node loses its children when the text from
    /// its start up to that offset holds no newline.
    fn pop_frame(&mut self, stop: usize, collapse_until: Option<usize>) {
        if self.frames.len() < 2 {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let pending = std::mem::take(&mut self.top().pending);
        let parent = self.top().node;

        let node = self.tree.node_mut(frame.node);
        if let Some(start) = pending.start {
            node.start = start;
            node.line_number = pending.line_number;
        }
        node.stop = stop.max(node.start);
        let start = node.start;

        self.attach(parent, frame.node, pending.name);

        if let Some(until) = collapse_until {
            let single_line = self
                .text
                .get(start..until.max(start))
                .is_some_and(|span| !span.contains('\n'));
            if single_line {
                self.tree.clear_children(frame.node);
            }
        }
    }

    fn finish(mut self) -> WalkOutput {
        let terminator = self.flush_values();
        self.complete_value_child(terminator);

        let end = self.last_end;
        while self.frames.len() > 1 {
            self.pop_frame(end, None);
        }

        if let Some(&smallest) = self.indents.first() {
            if smallest == 1 {
                self.indents.clear();
            } else {
                self.indents.retain(|indent| indent % smallest == 0);
            }
        }

        WalkOutput {
            tree: self.tree,
            type_intervals: self.type_intervals,
            indents: self.indents,
            attrs: self.attrs,
        }
    }
}

/// Display width of leading whitespace, with tabs advancing to the next
/// multiple of eight.
fn indent_width(whitespace: &str) -> usize {
    whitespace.chars().fold(0, |column, ch| {
        if ch == '\t' {
            (column / 8 + 1) * 8
        } else {
            column + 1
        }
    })
}
