//! # strata-syntax
//!
//! The lexical layer of strata: a format-aware [`Scanner`] that turns any
//! displayed text into data tokens with byte spans, plus [`TextFormat`]
//! detection.
//!
//! ```text
//! Text + TextFormat → Scanner → Token { kind, capture, inner, text }
//!                     (Logos + line-start rules)
//! ```
//!
//! The scanner never fails. Bytes it cannot classify come out as
//! [`DataToken::Garbage`] and the consumer decides when to give up.
//!
//! ## Module Structure
//!
//! ```text
//! strata-syntax/
//! ├── lib.rs          # This file - public API
//! ├── span.rs         # Byte ranges
//! ├── text_format.rs  # TextFormat, detection by name and content
//! └── scanner.rs      # Logos lexer and format-aware Scanner
//! ```

pub mod scanner;
pub mod span;
pub mod text_format;

pub use scanner::{DataToken, Scanner, Token};
pub use span::Span;
pub use text_format::{TextFormat, UnknownTextFormat};
