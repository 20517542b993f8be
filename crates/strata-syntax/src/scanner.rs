//! # Scanner - tokenizing arbitrary displayed text
//!
//! This module breaks a text buffer into data tokens using the [Logos]
//! lexer generator, then layers a few format-aware rules on top:
//!
//! - Line-start constructs (Markdown ATX headings, man page section names,
//!   diff file headers and hunk headings) are recognised before the lexer
//!   sees the line.
//! - Comments and markup tags are only tokens in formats that have them.
//!   Elsewhere the first character is emitted as punctuation and lexing
//!   restarts one character later.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The lossless guarantee
//!
//! Every byte in the scanned range appears in exactly one token, so
//! concatenating token texts reproduces the input:
//!
//! ```
//! use strata_syntax::{TextFormat, scanner::tokens};
//!
//! let input = "{\"a\": [1, 2]}\n# done\n";
//! let text: String = tokens(input, TextFormat::Unknown).iter().map(|t| t.text).collect();
//! assert_eq!(text, input);
//! ```
//!
//! Bytes the lexer cannot classify become [`DataToken::Garbage`]; callers
//! decide how much garbage they are willing to look at.

use std::sync::OnceLock;

use logos::Logos;
use regex::Regex;

use crate::span::Span;
use crate::text_format::TextFormat;

/// Raw token kinds produced by the Logos lexer.
///
/// Overlapping patterns carry explicit priorities; longer matches always
/// win first.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n")]
    Newline,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token(";")]
    Semicolon,

    #[token("{")]
    CurlyOpen,

    #[token("}")]
    CurlyClose,

    #[token("[")]
    SquareOpen,

    #[token("]")]
    SquareClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    /// Double quoted strings may span lines.
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    SingleQuoted,

    /// An unmatched quote character.
    #[regex(r#"["']"#)]
    Quote,

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r"0[xX][0-9a-fA-F]+", priority = 6)]
    HexNumber,

    #[regex(
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}([T ][0-9]{2}:[0-9]{2}(:[0-9]{2}([.,][0-9]+)?)?(Z|[+-][0-9]{2}:?[0-9]{2})?)?",
        priority = 6
    )]
    #[regex(r"[0-9]{2}:[0-9]{2}:[0-9]{2}([.,][0-9]+)?", priority = 6)]
    Timestamp,

    #[regex(r#"[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s"'<>\[\]{}(),]*"#, priority = 7)]
    Url,

    #[regex(r"[A-Z][A-Z0-9_]+", priority = 5)]
    Constant,

    #[regex(
        r"[a-zA-Z_$\u{80}-\u{10FFFF}][a-zA-Z0-9_$.\-/@\u{80}-\u{10FFFF}]*",
        priority = 3
    )]
    Symbol,

    #[token("\u{200B}", priority = 10)]
    ZeroWidthSpace,

    #[regex(r"[!%&*+\-./?@\\^`|~<>]")]
    Punct,

    #[regex(r"#[^\n]*", priority = 3)]
    HashComment,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"<\?[a-zA-Z][^<>]*\?>", priority = 9)]
    XmlDecl,

    #[regex(r"<[a-zA-Z][a-zA-Z0-9_:.\-]*(\s[^<>]*)?>", priority = 7)]
    XmlOpenTag,

    #[regex(r"<[a-zA-Z][a-zA-Z0-9_:.\-]*(\s[^<>]*)?/>", priority = 8)]
    XmlEmptyTag,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9_:.\-]*\s*>")]
    XmlCloseTag,
}

/// Token kinds handed to consumers of the [`Scanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataToken {
    Whitespace,
    Line,
    Comma,
    Colon,
    Equals,
    Semicolon,
    CurlyOpen,
    CurlyClose,
    SquareOpen,
    SquareClose,
    ParenOpen,
    ParenClose,
    QuotedString,
    Number,
    HexNumber,
    Timestamp,
    Url,
    Constant,
    Symbol,
    Punct,
    XmlDecl,
    XmlOpenTag,
    XmlCloseTag,
    XmlEmptyTag,
    /// A heading line; `1` is outermost.
    Heading(u8),
    /// `--- a/file` / `+++ b/file` pair; the inner span is the file name.
    DiffFileHeader,
    /// `@@ -l,s +l,s @@ context` line.
    DiffHunkHeading,
    Comment,
    ZeroWidthSpace,
    Garbage,
}

impl DataToken {
    /// Tokens that can name the value following a `:` or `=`.
    pub fn can_be_key(self) -> bool {
        matches!(
            self,
            DataToken::Symbol | DataToken::Constant | DataToken::QuotedString
        )
    }
}

/// A scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: DataToken,
    /// Full extent of the token in the scanned text.
    pub capture: Span,
    /// The interesting part: string contents without quotes, tag names,
    /// heading text, diff file names. Equal to `capture` otherwise.
    pub inner: Span,
    pub text: &'a str,
}

/// Lazy, restartable token stream over a range of a text buffer.
///
/// Offsets in returned tokens are absolute positions in the full text, not
/// relative to the scanned range.
pub struct Scanner<'a> {
    text: &'a str,
    end: usize,
    base: usize,
    lexer: logos::Lexer<'a, RawToken>,
    format: TextFormat,
    at_line_start: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, range: Span, format: TextFormat) -> Self {
        let end = char_boundary_at_or_before(text, range.end.min(text.len()));
        let start = char_boundary_at_or_before(text, range.start.min(end));
        Self {
            text,
            end,
            base: start,
            lexer: RawToken::lexer(&text[start..end]),
            format,
            at_line_start: start == 0 || text.as_bytes()[start - 1] == b'\n',
        }
    }

    /// Scans all of `text`.
    pub fn whole(text: &'a str, format: TextFormat) -> Self {
        Self::new(text, Span::new(0, text.len()), format)
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    /// Absolute offset of the next unscanned byte.
    pub fn offset(&self) -> usize {
        self.base + self.lexer.span().end
    }

    /// Resumes scanning at `offset`, discarding any lexer state.
    pub fn restart_at(&mut self, offset: usize) {
        let offset = char_boundary_at_or_before(self.text, offset.min(self.end));
        self.lexer = RawToken::lexer(&self.text[offset..self.end]);
        self.base = offset;
    }

    /// Text covered by `span`, or an empty string if the span is out of
    /// bounds.
    pub fn slice(&self, span: Span) -> &'a str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    fn token(&self, kind: DataToken, capture: Span, inner: Span) -> Token<'a> {
        Token {
            kind,
            capture,
            inner,
            text: self.slice(capture),
        }
    }

    /// Emits the first character of `capture` as punctuation and resumes
    /// right after it.
    fn split_first(&mut self, capture: Span) -> Token<'a> {
        let width = self
            .slice(capture)
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        let first = Span::new(capture.start, capture.start + width);
        self.restart_at(first.end);
        self.token(DataToken::Punct, first, first)
    }

    fn line_start_token(&mut self) -> Option<Token<'a>> {
        let pos = self.offset();
        let rest = &self.text[pos..self.end];
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let line = rest[..line_len].trim_end_matches('\r');
        if line.is_empty() {
            return None;
        }

        let token = if self.format.has_markdown_headings()
            && let Some(caps) = markdown_heading_re().captures(line)
        {
            let level = caps.get(1).map_or(1, |m| m.len()) as u8;
            let inner = caps
                .get(2)
                .map_or(Span::new(pos + line.len(), pos + line.len()), |m| {
                    Span::new(pos + m.start(), pos + m.end())
                });
            self.token(DataToken::Heading(level), Span::new(pos, pos + line.len()), inner)
        } else if self.format.has_man_headings() && man_heading_re().is_match(line) {
            let capture = Span::new(pos, pos + line.len());
            self.token(DataToken::Heading(1), capture, capture)
        } else if self.format.has_diff_headings() && line.starts_with("--- ") {
            self.diff_file_header(pos, line)?
        } else if self.format.has_diff_headings() && hunk_heading_re().is_match(line) {
            let capture = Span::new(pos, pos + line.len());
            self.token(DataToken::DiffHunkHeading, capture, capture)
        } else {
            return None;
        };

        self.restart_at(token.capture.end);
        Some(token)
    }

    fn diff_file_header(&self, pos: usize, first: &str) -> Option<Token<'a>> {
        let second_start = pos + first.len() + self.text[pos + first.len()..].find('\n')? + 1;
        let rest = self.text.get(second_start..self.end)?;
        let second = rest[..rest.find('\n').unwrap_or(rest.len())].trim_end_matches('\r');
        if !second.starts_with("+++ ") {
            return None;
        }

        let old_name = path_word(first, 4);
        let new_name = path_word(second, 4);
        let old = first[old_name.clone()].trim_start_matches("a/");
        let new_stripped = new_name.start
            + usize::from(second[new_name.clone()].starts_with("b/")) * 2;
        let new = &second[new_stripped..new_name.end];

        let inner = if old == "/dev/null" || old == new {
            Span::new(second_start + new_stripped, second_start + new_name.end)
        } else {
            let old_stripped =
                old_name.start + usize::from(first[old_name.clone()].starts_with("a/")) * 2;
            Span::new(pos + old_stripped, pos + old_name.end)
        };
        Some(self.token(
            DataToken::DiffFileHeader,
            Span::new(pos, second_start + second.len()),
            inner,
        ))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.at_line_start {
            self.at_line_start = false;
            if let Some(token) = self.line_start_token() {
                return Some(token);
            }
        }

        let result = self.lexer.next()?;
        let range = self.lexer.span();
        let capture = Span::new(self.base + range.start, self.base + range.end);
        let Ok(raw) = result else {
            return Some(self.token(DataToken::Garbage, capture, capture));
        };

        let kind = match raw {
            RawToken::Whitespace => DataToken::Whitespace,
            RawToken::Newline => {
                self.at_line_start = true;
                DataToken::Line
            }
            RawToken::Comma => DataToken::Comma,
            RawToken::Colon => DataToken::Colon,
            RawToken::Equals => DataToken::Equals,
            RawToken::Semicolon => DataToken::Semicolon,
            RawToken::CurlyOpen => DataToken::CurlyOpen,
            RawToken::CurlyClose => DataToken::CurlyClose,
            RawToken::SquareOpen => DataToken::SquareOpen,
            RawToken::SquareClose => DataToken::SquareClose,
            RawToken::ParenOpen => DataToken::ParenOpen,
            RawToken::ParenClose => DataToken::ParenClose,
            RawToken::DoubleQuoted | RawToken::SingleQuoted => {
                let inner = Span::new(capture.start + 1, capture.end - 1);
                return Some(self.token(DataToken::QuotedString, capture, inner));
            }
            RawToken::Quote | RawToken::Punct => DataToken::Punct,
            RawToken::Number => DataToken::Number,
            RawToken::HexNumber => DataToken::HexNumber,
            RawToken::Timestamp => DataToken::Timestamp,
            RawToken::Url => DataToken::Url,
            RawToken::Constant => DataToken::Constant,
            RawToken::Symbol => DataToken::Symbol,
            RawToken::ZeroWidthSpace => DataToken::ZeroWidthSpace,
            RawToken::HashComment if self.format.has_hash_comments() => DataToken::Comment,
            RawToken::LineComment | RawToken::BlockComment
                if self.format.has_slash_comments() =>
            {
                DataToken::Comment
            }
            RawToken::HashComment | RawToken::LineComment | RawToken::BlockComment => {
                return Some(self.split_first(capture));
            }
            RawToken::XmlDecl | RawToken::XmlOpenTag | RawToken::XmlEmptyTag
            | RawToken::XmlCloseTag
                if !self.format.has_markup_tags() =>
            {
                return Some(self.split_first(capture));
            }
            RawToken::XmlDecl => DataToken::XmlDecl,
            RawToken::XmlOpenTag | RawToken::XmlEmptyTag | RawToken::XmlCloseTag => {
                let kind = match raw {
                    RawToken::XmlOpenTag => DataToken::XmlOpenTag,
                    RawToken::XmlEmptyTag => DataToken::XmlEmptyTag,
                    _ => DataToken::XmlCloseTag,
                };
                let inner = tag_name(self.slice(capture), capture.start);
                return Some(self.token(kind, capture, inner));
            }
        };
        Some(self.token(kind, capture, capture))
    }
}

/// Lex all of `input` into a vector.
pub fn tokens(input: &str, format: TextFormat) -> Vec<Token<'_>> {
    Scanner::whole(input, format).collect()
}

fn char_boundary_at_or_before(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Byte range of the whitespace-delimited word starting at `from`.
fn path_word(line: &str, from: usize) -> std::ops::Range<usize> {
    let from = from.min(line.len());
    let len = line[from..]
        .find(char::is_whitespace)
        .unwrap_or(line.len() - from);
    from..from + len
}

fn tag_name(tag: &str, offset: usize) -> Span {
    let start = if tag.starts_with("</") { 2 } else { 1 };
    let len = tag[start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')))
        .unwrap_or(tag.len() - start);
    Span::new(offset + start, offset + start + len)
}

fn markdown_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(#{1,6})(?:[ \t]+(.*?))?[ \t]*$").expect("Invalid heading regex")
    })
}

fn man_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z](?:[A-Z0-9 _\-]*[A-Z0-9])?$").expect("Invalid man heading regex")
    })
}

fn hunk_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -[0-9]+(?:,[0-9]+)? \+[0-9]+(?:,[0-9]+)? @@").expect("Invalid hunk regex")
    })
}
