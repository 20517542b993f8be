//! Entry point for running section discovery over a [`StyledText`].

use log::debug;
use serde::{Deserialize, Serialize};
use strata_syntax::{Span, TextFormat};

use crate::attr_line::StyledText;
use crate::markdown::apply_markdown_roles;
use crate::sections::{Metadata, discover_structure, headers::MetadataBuilder};

pub const DEFAULT_GARBAGE_LIMIT: usize = 1000;

/// Knobs for a discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Scanning stops once more than this many unrecognised tokens were
    /// seen.
    pub garbage_limit: usize,
    /// Record indentation widths for guide rendering.
    pub indent_guides: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            garbage_limit: DEFAULT_GARBAGE_LIMIT,
            indent_guides: true,
        }
    }
}

/// Starts a discovery run over `text`.
///
/// ```
/// use strata_engine::{StyledText, discover};
/// use strata_syntax::TextFormat;
///
/// let mut text = StyledText::new(r#"{"a": {"b": 1}, "c": 2}"#);
/// let meta = discover(&mut text).with_text_format(TextFormat::Json).perform();
/// assert!(meta.lookup_path(&["a".into(), "b".into()]).is_some());
/// ```
pub fn discover(text: &mut StyledText) -> Discover<'_> {
    let len = text.len();
    Discover {
        text,
        range: Span::new(0, len),
        text_format: TextFormat::Unknown,
        options: DiscoveryOptions::default(),
    }
}

pub struct Discover<'a> {
    text: &'a mut StyledText,
    range: Span,
    text_format: TextFormat,
    options: DiscoveryOptions,
}

impl Discover<'_> {
    #[must_use]
    pub fn with_text_format(mut self, text_format: TextFormat) -> Self {
        self.text_format = text_format;
        self
    }

    /// Restricts scanning to `range`. Line numbers stay absolute.
    #[must_use]
    pub fn with_range(mut self, range: Span) -> Self {
        let end = range.end.min(self.text.len());
        self.range = Span::new(range.start.min(end), end);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    /// Markdown is outlined from its rendered heading roles; binary data is
    /// not scanned; everything else goes through the token walker.
    pub fn perform(self) -> Metadata {
        let metadata = match self.text_format {
            TextFormat::Binary => Metadata::empty(TextFormat::Binary),
            TextFormat::Markdown => {
                apply_markdown_roles(self.text);
                MetadataBuilder::new(TextFormat::Markdown).build(self.text)
            }
            format => discover_structure(self.text, self.range, format, &self.options),
        };

        debug!(
            "discovered {} sections, {} type intervals in {} bytes of {}",
            metadata.intervals().len(),
            metadata.type_intervals().len(),
            self.range.len(),
            self.text_format,
        );
        metadata
    }
}
