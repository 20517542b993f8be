//! Text formats and content sniffing.
//!
//! The format decides which lexical conventions the [`Scanner`] honours
//! (comment syntax, markup tags, heading styles) and whether bracket
//! groups are treated as structure at all.
//!
//! [`Scanner`]: crate::scanner::Scanner

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kinds of text the scanner knows how to treat specially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    Binary,
    CLike,
    Java,
    Json,
    Log,
    Makefile,
    Man,
    Markdown,
    Python,
    Pcre,
    Rust,
    Sql,
    Xml,
    Yaml,
    Toml,
    Diff,
    Shell,
    LnavScript,
    Rst,
    PlainText,
    #[default]
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized text format: {0}")]
pub struct UnknownTextFormat(pub String);

const ALL_FORMATS: [TextFormat; 20] = [
    TextFormat::Binary,
    TextFormat::CLike,
    TextFormat::Java,
    TextFormat::Json,
    TextFormat::Log,
    TextFormat::Makefile,
    TextFormat::Man,
    TextFormat::Markdown,
    TextFormat::Python,
    TextFormat::Pcre,
    TextFormat::Rust,
    TextFormat::Sql,
    TextFormat::Xml,
    TextFormat::Yaml,
    TextFormat::Toml,
    TextFormat::Diff,
    TextFormat::Shell,
    TextFormat::LnavScript,
    TextFormat::Rst,
    TextFormat::PlainText,
];

const COMPRESSION_EXTS: [&str; 5] = ["bz2", "gz", "lzma", "xz", "zst"];

impl TextFormat {
    /// MIME-like name used when formats are shown or configured.
    pub fn mime(self) -> &'static str {
        match self {
            TextFormat::Binary => "application/octet-stream",
            TextFormat::CLike => "text/c",
            TextFormat::Java => "text/java",
            TextFormat::Json => "application/json",
            TextFormat::Log => "text/log",
            TextFormat::Makefile => "text/x-makefile",
            TextFormat::Man => "text/man",
            TextFormat::Markdown => "text/markdown",
            TextFormat::Python => "text/python",
            TextFormat::Pcre => "application/x-pcre",
            TextFormat::Rust => "text/rust",
            TextFormat::Sql => "application/sql",
            TextFormat::Xml => "text/xml",
            TextFormat::Yaml => "application/yaml",
            TextFormat::Toml => "application/toml",
            TextFormat::Diff => "text/x-diff",
            TextFormat::Shell => "text/x-shellscript",
            TextFormat::LnavScript => "text/x-lnav-script",
            TextFormat::Rst => "text/x-rst",
            TextFormat::PlainText => "text/plain",
            TextFormat::Unknown => "text/unknown",
        }
    }

    /// Formats whose bracket groups and commas describe structure.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            TextFormat::Json
                | TextFormat::Yaml
                | TextFormat::Toml
                | TextFormat::Log
                | TextFormat::Unknown
        )
    }

    pub fn has_hash_comments(self) -> bool {
        matches!(
            self,
            TextFormat::Python
                | TextFormat::Shell
                | TextFormat::Yaml
                | TextFormat::Toml
                | TextFormat::Makefile
        )
    }

    pub fn has_slash_comments(self) -> bool {
        matches!(self, TextFormat::CLike | TextFormat::Java | TextFormat::Rust)
    }

    pub fn has_markup_tags(self) -> bool {
        matches!(self, TextFormat::Xml | TextFormat::Unknown)
    }

    pub fn has_markdown_headings(self) -> bool {
        matches!(
            self,
            TextFormat::Markdown | TextFormat::PlainText | TextFormat::Unknown
        )
    }

    pub fn has_man_headings(self) -> bool {
        self == TextFormat::Man
    }

    pub fn has_diff_headings(self) -> bool {
        matches!(self, TextFormat::Diff | TextFormat::Unknown)
    }

    /// Guesses the format of `content`, consulting the file name first.
    ///
    /// Compression suffixes are peeled off before the extension is checked,
    /// so `app.json.gz` is still JSON. When the name says nothing useful the
    /// content is sniffed with a handful of line-anchored patterns.
    pub fn detect(content: &str, path: Option<&Path>) -> TextFormat {
        if let Some(format) = path.and_then(Self::from_path) {
            return format;
        }

        if looks_like_json(content) {
            return TextFormat::Json;
        }

        content_matchers()
            .iter()
            .find(|(_, re)| re.is_match(content))
            .map(|(format, _)| *format)
            .unwrap_or(TextFormat::Unknown)
    }

    fn from_path(path: &Path) -> Option<TextFormat> {
        let mut name = path.file_name()?.to_str()?;
        while let Some((stem, ext)) = name.rsplit_once('.')
            && COMPRESSION_EXTS.contains(&ext)
        {
            name = stem;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (name, ""),
        };

        let format = match ext {
            "md" | "markdown" => TextFormat::Markdown,
            "h" | "hh" | "hpp" | "c" | "cc" | "cpp" | "tpp" => TextFormat::CLike,
            "py" => TextFormat::Python,
            "rs" => TextFormat::Rust,
            "sql" => TextFormat::Sql,
            "toml" => TextFormat::Toml,
            "java" => TextFormat::Java,
            "yaml" | "yml" => TextFormat::Yaml,
            "xml" => TextFormat::Xml,
            "sh" => TextFormat::Shell,
            "lnav" => TextFormat::LnavScript,
            "rst" => TextFormat::Rst,
            "json" => TextFormat::Json,
            _ if stem == "Makefile" => TextFormat::Makefile,
            _ => return None,
        };
        Some(format)
    }
}

impl fmt::Display for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for TextFormat {
    type Err = UnknownTextFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FORMATS
            .iter()
            .chain(std::iter::once(&TextFormat::Unknown))
            .find(|format| format.mime() == s)
            .copied()
            .ok_or_else(|| UnknownTextFormat(s.to_string()))
    }
}

/// A single top-level object or array whose outer bracket only closes at
/// the very end of the content.
fn looks_like_json(content: &str) -> bool {
    let trimmed = content.trim();
    if !matches!(
        (trimmed.chars().next(), trimmed.chars().next_back()),
        (Some('{'), Some('}')) | (Some('['), Some(']'))
    ) {
        return false;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in trimmed.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = match depth.checked_sub(1) {
                    Some(depth) => depth,
                    None => return false,
                };
                if depth == 0 && idx + ch.len_utf8() != trimmed.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_string
}

fn content_matchers() -> &'static [(TextFormat, Regex)] {
    static MATCHERS: OnceLock<Vec<(TextFormat, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        [
            (TextFormat::Diff, r"(?m)^--- .*\n\+\+\+ .*\n"),
            (TextFormat::Shell, r"(?m)^#!.+sh\b"),
            (TextFormat::Man, r"(?m)^[A-Za-z][A-Za-z\-_+0-9]+\(\d\)\s+"),
            (
                TextFormat::Python,
                r"(?m)^\s*def\s+\w+\([^)]*\):[^\n]*$|^\s*try:[^\n]*$",
            ),
            (
                TextFormat::Rust,
                r"(?m)^\s*use\s+[\w+:{}]+;$|^\s*(?:pub enum|pub const|(?:pub )?fn)\s+\w+.*$|^\s*impl\s+\w+.*$",
            ),
            (
                TextFormat::Java,
                r"(?m)^package\s+|^import\s+|^\s*(?:public)?\s*class\s*(?:\w+\s+)*\s*\{",
            ),
            (
                TextFormat::CLike,
                r"(?m)^#\s*include\s+|^#\s*define\s+|^\s*if\s+\([^)]+\)[^\n]*$|^\s*(?:\w+\s+)*class \w+ \{",
            ),
            (TextFormat::LnavScript, r"(?mi)^;SELECT\s+|^:[a-z0-9\-]+\s+"),
            (
                TextFormat::Sql,
                r"(?mi)create\s+table\s+|select\s+.+\s+from\s+|insert\s+into\s+.+\s+values",
            ),
            (
                TextFormat::Xml,
                r#"(?mi)<\?xml(?:\s+\w+\s*=\s*"[^"]*")*\?>|</?\w+(?:\s+\w+\s*=\s*"[^"]*")*\s*>"#,
            ),
        ]
        .into_iter()
        .map(|(format, pattern)| {
            (
                format,
                Regex::new(pattern).expect("Invalid text format regex"),
            )
        })
        .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("notes.md", TextFormat::Markdown)]
    #[case("README.markdown", TextFormat::Markdown)]
    #[case("main.cpp", TextFormat::CLike)]
    #[case("lib.rs", TextFormat::Rust)]
    #[case("Cargo.toml", TextFormat::Toml)]
    #[case("config.yml", TextFormat::Yaml)]
    #[case("build.sh", TextFormat::Shell)]
    #[case("Makefile", TextFormat::Makefile)]
    #[case("events.json.gz", TextFormat::Json)]
    #[case("query.sql.xz.gz", TextFormat::Sql)]
    fn detects_by_extension(#[case] name: &str, #[case] expected: TextFormat) {
        assert_eq!(TextFormat::detect("", Some(Path::new(name))), expected);
    }

    #[test]
    fn extension_wins_over_content() {
        let content = "{\"a\": 1}";
        assert_eq!(
            TextFormat::detect(content, Some(Path::new("x.py"))),
            TextFormat::Python
        );
    }

    #[rstest]
    #[case("{\"a\": [1, 2]}\n", TextFormat::Json)]
    #[case("[1, 2, 3]", TextFormat::Json)]
    #[case("--- a/NEWS\n+++ b/NEWS\n@@ -1 +1 @@\n", TextFormat::Diff)]
    #[case("#!/bin/bash\necho hi\n", TextFormat::Shell)]
    #[case("LS(1)    User Commands    LS(1)\n\nNAME\n", TextFormat::Man)]
    #[case("def main(argv):\n    pass\n", TextFormat::Python)]
    #[case("pub fn main() {\n}\n", TextFormat::Rust)]
    #[case("package com.example;\n", TextFormat::Java)]
    #[case("#include <stdio.h>\n", TextFormat::CLike)]
    #[case("SELECT * FROM users", TextFormat::Sql)]
    #[case("<?xml version=\"1.0\"?>\n<a/>", TextFormat::Xml)]
    #[case("just some words\n", TextFormat::Unknown)]
    fn detects_by_content(#[case] content: &str, #[case] expected: TextFormat) {
        assert_eq!(TextFormat::detect(content, None), expected);
    }

    #[test]
    fn bracketed_log_line_is_not_json() {
        let content = "[2024-01-15 10:00:00] started [main]";
        assert_eq!(TextFormat::detect(content, None), TextFormat::Unknown);
    }

    #[test]
    fn mime_names_parse_back() {
        for format in ALL_FORMATS {
            assert_eq!(format.mime().parse::<TextFormat>(), Ok(format));
        }
        assert_eq!(
            "text/nope".parse::<TextFormat>(),
            Err(UnknownTextFormat("text/nope".to_string()))
        );
    }
}
