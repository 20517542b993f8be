//! String form of section paths.
//!
//! A path is written like a JSON pointer: `""` is the root, otherwise each
//! key is prefixed by `/`. Indices are plain decimals. Names are escaped
//! (`~` as `~0`, `/` as `~1`) and then percent-encoded, and a name made only
//! of digits gets its first digit percent-encoded so it cannot be read back
//! as an index.

use thiserror::Error;

use super::SectionKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("section path must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("invalid percent-encoding in section path segment {segment:?}")]
    InvalidEncoding { segment: String },
}

pub fn encode_path(path: &[SectionKey]) -> String {
    let mut encoded = String::new();
    for key in path {
        encoded.push('/');
        match key {
            SectionKey::Index(index) => encoded.push_str(&index.to_string()),
            SectionKey::Name(name) => encoded.push_str(&encode_name(name)),
        }
    }
    encoded
}

pub fn decode_path(encoded: &str) -> Result<Vec<SectionKey>, PathError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = encoded.strip_prefix('/') else {
        return Err(PathError::MissingLeadingSlash(encoded.to_string()));
    };

    rest.split('/').map(decode_segment).collect()
}

fn encode_name(name: &str) -> String {
    let escaped = name.replace('~', "~0").replace('/', "~1");
    let encoded = urlencoding::encode(&escaped).into_owned();
    if is_index(&encoded) {
        format!("%{:02X}{}", encoded.as_bytes()[0], &encoded[1..])
    } else {
        encoded
    }
}

fn decode_segment(segment: &str) -> Result<SectionKey, PathError> {
    if is_index(segment)
        && let Ok(index) = segment.parse()
    {
        return Ok(SectionKey::Index(index));
    }

    let decoded = urlencoding::decode(segment).map_err(|_| PathError::InvalidEncoding {
        segment: segment.to_string(),
    })?;
    Ok(SectionKey::Name(
        decoded.replace("~1", "/").replace("~0", "~"),
    ))
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn name(s: &str) -> SectionKey {
        SectionKey::Name(s.to_string())
    }

    #[test]
    fn root_is_empty_string() {
        assert_eq!(encode_path(&[]), "");
        assert_eq!(decode_path(""), Ok(Vec::new()));
    }

    #[rstest]
    #[case(vec![name("a"), SectionKey::Index(3)], "/a/3")]
    #[case(vec![name("a/b")], "/a~1b")]
    #[case(vec![name("~x")], "/~0x")]
    #[case(vec![name("two words")], "/two%20words")]
    #[case(vec![name("42")], "/%342")]
    #[case(vec![name("")], "/")]
    fn encodes(#[case] path: Vec<SectionKey>, #[case] expected: &str) {
        assert_eq!(encode_path(&path), expected);
        assert_eq!(decode_path(expected), Ok(path));
    }

    #[test]
    fn literal_escape_sequences_survive() {
        let path = vec![name("~1 and ~0"), name("100%"), name("caf\u{e9}")];
        assert_eq!(decode_path(&encode_path(&path)), Ok(path));
    }

    #[test]
    fn rejects_relative_paths() {
        assert_eq!(
            decode_path("a/b"),
            Err(PathError::MissingLeadingSlash("a/b".to_string()))
        );
    }

    #[test]
    fn rejects_bad_utf8_escapes() {
        assert!(matches!(
            decode_path("/%FF"),
            Err(PathError::InvalidEncoding { .. })
        ));
    }
}
