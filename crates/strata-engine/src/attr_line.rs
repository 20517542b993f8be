//! Text with attached style attributes.
//!
//! A [`StyledText`] is the input to section discovery: the displayed text
//! plus `(range, attribute)` pairs. Heading and quoted-text roles drive the
//! header pass; origin offsets map displayed positions back to positions in
//! the source the text was rendered from.

use serde::{Deserialize, Serialize};
use strata_syntax::Span;

/// Semantic role of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Heading at the given level, `1` being outermost.
    Heading(u8),
    /// Literal text (code blocks, block quotes); headings inside it are not
    /// structure.
    QuotedText,
    Comment,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    Role(Role),
    /// Signed correction from displayed offsets to source offsets.
    OriginOffset(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringAttr {
    pub range: Span,
    pub value: AttrValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    text: String,
    attrs: Vec<StringAttr>,
}

impl StyledText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attrs(&self) -> &[StringAttr] {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn add_attr(&mut self, range: Span, value: AttrValue) {
        self.attrs.push(StringAttr { range, value });
    }

    /// Builder form of [`StyledText::add_attr`].
    #[must_use]
    pub fn with_attr(mut self, range: Span, value: AttrValue) -> Self {
        self.add_attr(range, value);
        self
    }

    pub fn extend_attrs(&mut self, attrs: impl IntoIterator<Item = StringAttr>) {
        self.attrs.extend(attrs);
    }

    /// The text covered by `span`, empty when out of bounds.
    pub fn substr(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// All attributes carrying `role`, in insertion order.
    pub fn ranges_with_role(&self, role: Role) -> impl Iterator<Item = Span> + '_ {
        self.attrs
            .iter()
            .filter(move |attr| attr.value == AttrValue::Role(role))
            .map(|attr| attr.range)
    }

    /// Heading attributes as `(range, level)`.
    pub fn headings(&self) -> impl Iterator<Item = (Span, u8)> + '_ {
        self.attrs.iter().filter_map(|attr| match attr.value {
            AttrValue::Role(Role::Heading(level)) => Some((attr.range, level)),
            _ => None,
        })
    }

    /// The origin offset in effect at `pos`. When several origin-offset
    /// attributes contain `pos` the last one added wins.
    pub fn origin_offset_at(&self, pos: usize) -> i64 {
        self.attrs
            .iter()
            .rev()
            .find_map(|attr| match attr.value {
                AttrValue::OriginOffset(delta) if attr.range.contains(pos) => Some(delta),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Maps a displayed start offset to the source.
    pub fn origin_start(&self, start: usize) -> usize {
        apply_delta(start, self.origin_offset_at(start))
    }

    /// Maps a displayed exclusive end offset to the source, using the
    /// attribute that covers the last byte of the range.
    pub fn origin_stop(&self, stop: usize) -> usize {
        match stop.checked_sub(1) {
            Some(last) => apply_delta(stop, self.origin_offset_at(last)),
            None => stop,
        }
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for StyledText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

fn apply_delta(pos: usize, delta: i64) -> usize {
    if delta >= 0 {
        pos.saturating_add(delta.unsigned_abs() as usize)
    } else {
        pos.saturating_sub(delta.unsigned_abs() as usize)
    }
}
