//! Markdown rendering roles.
//!
//! Markdown is outlined from what a renderer would show rather than from
//! raw tokens: pulldown-cmark decides what is a heading, and code blocks
//! and block quotes are marked as quoted text so `#` lines inside them do
//! not open sections.

use pulldown_cmark::{Event, Parser, Tag};
use strata_syntax::Span;

use crate::attr_line::{AttrValue, Role, StringAttr, StyledText};

/// Heading and quoted-text roles for `source`, in document order.
pub fn markdown_roles(source: &str) -> Vec<StringAttr> {
    Parser::new(source)
        .into_offset_iter()
        .filter_map(|(event, range)| {
            let role = match event {
                Event::Start(Tag::Heading { level, .. }) => Role::Heading(level as u8),
                Event::Start(Tag::CodeBlock(_) | Tag::BlockQuote(_)) => Role::QuotedText,
                _ => return None,
            };
            Some(StringAttr {
                range: trim_line_ending(source, Span::from(range)),
                value: AttrValue::Role(role),
            })
        })
        .collect()
}

pub fn apply_markdown_roles(text: &mut StyledText) {
    let roles = markdown_roles(text.text());
    text.extend_attrs(roles);
}

fn trim_line_ending(source: &str, span: Span) -> Span {
    let body = source.get(span.start..span.end).unwrap_or("");
    let trimmed = body.trim_end_matches(['\n', '\r']);
    Span::new(span.start, span.start + trimmed.len())
}
