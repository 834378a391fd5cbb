//! Record naming.
//!
//! Records are addressed by a zero-based index. The index is shifted by one
//! and rendered as a fixed-width decimal identifier (`0` -> `"000001"`), and
//! the identifier is combined with a kind tag to form the store key
//! (`"image_000001"`, `"annotation_000001"`).
//!
//! The width is fixed, so the codec can name at most [`MAX_RECORDS`] records.
//! Indices past that are rejected rather than truncated.

use std::fmt;

use thiserror::Error;

/// Number of decimal digits in an identifier.
pub const IDENTIFIER_WIDTH: usize = 6;

/// Largest identifier number representable in [`IDENTIFIER_WIDTH`] digits.
pub const MAX_RECORDS: usize = 999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("index {index} has no 6-digit identifier (largest index is 999998)")]
    IdentifierOverflow { index: usize },
}

/// Fixed-width record identifier. Stores `index + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u32);

impl Identifier {
    pub fn from_index(index: usize) -> Result<Self, KeyError> {
        match index.checked_add(1) {
            Some(number) if number <= MAX_RECORDS => Ok(Self(number as u32)),
            _ => Err(KeyError::IdentifierOverflow { index }),
        }
    }

    /// The one-based number rendered by this identifier.
    pub const fn number(self) -> u32 {
        self.0
    }

    /// The zero-based index this identifier was derived from.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Parse a rendered identifier. Accepts exactly [`IDENTIFIER_WIDTH`]
    /// ASCII digits naming a number in `1..=MAX_RECORDS`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != IDENTIFIER_WIDTH || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u32 = text.parse().ok()?;
        (number >= 1).then_some(Self(number))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = IDENTIFIER_WIDTH)
    }
}

/// The two blobs stored per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Image,
    Annotation,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Image, RecordKind::Annotation];

    /// Key prefix for this kind.
    pub const fn tag(self) -> &'static str {
        match self {
            RecordKind::Image => "image",
            RecordKind::Annotation => "annotation",
        }
    }

    /// File extension used when records live in a plain directory.
    pub const fn extension(self) -> &'static str {
        match self {
            RecordKind::Image => "jpg",
            RecordKind::Annotation => "json",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        RecordKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A store key: `{kind}_{identifier}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub kind: RecordKind,
    pub id: Identifier,
}

impl RecordKey {
    pub fn new(kind: RecordKind, index: usize) -> Result<Self, KeyError> {
        Ok(Self {
            kind,
            id: Identifier::from_index(index)?,
        })
    }

    /// UTF-8 bytes used as the key in the store.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Recognise a raw store key. Returns `None` for anything that is not
    /// exactly `{tag}_{6 digits}`.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(raw).ok()?;
        let (tag, id) = text.rsplit_once('_')?;
        Some(Self {
            kind: RecordKind::from_tag(tag)?,
            id: Identifier::parse(id)?,
        })
    }

    /// `base_dir + identifier + "." + extension`.
    ///
    /// Plain concatenation: `base_dir` must carry its own trailing separator.
    pub fn file_path(&self, base_dir: &str) -> String {
        format!("{base_dir}{}", self.file_name())
    }

    /// `{identifier}.{extension}`, the directory-mode file name.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.kind.extension())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.tag(), self.id)
    }
}

/// Identifier for a zero-based index.
pub fn identifier_of(index: usize) -> Result<Identifier, KeyError> {
    Identifier::from_index(index)
}

pub fn image_key(index: usize) -> Result<Vec<u8>, KeyError> {
    Ok(RecordKey::new(RecordKind::Image, index)?.to_bytes())
}

pub fn annotation_key(index: usize) -> Result<Vec<u8>, KeyError> {
    Ok(RecordKey::new(RecordKind::Annotation, index)?.to_bytes())
}

/// Path of a record's image when the dataset is a directory of files.
pub fn image_path(base_dir: &str, index: usize) -> Result<String, KeyError> {
    Ok(RecordKey::new(RecordKind::Image, index)?.file_path(base_dir))
}

/// Path of a record's annotation JSON when the dataset is a directory of files.
pub fn annotation_path(base_dir: &str, index: usize) -> Result<String, KeyError> {
    Ok(RecordKey::new(RecordKind::Annotation, index)?.file_path(base_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_index_is_one_padded() {
        assert_eq!(identifier_of(0).unwrap().to_string(), "000001");
        assert_eq!(identifier_of(41).unwrap().to_string(), "000042");
        assert_eq!(identifier_of(999_998).unwrap().to_string(), "999999");
    }

    #[test]
    fn overflow_is_rejected() {
        assert_eq!(
            identifier_of(999_999),
            Err(KeyError::IdentifierOverflow { index: 999_999 })
        );
        assert!(identifier_of(usize::MAX).is_err());
    }

    #[test]
    fn keys_are_tagged() {
        assert_eq!(image_key(0).unwrap(), b"image_000001".to_vec());
        assert_eq!(annotation_key(41).unwrap(), b"annotation_000042".to_vec());
    }

    #[test]
    fn paths_concatenate_base_dir() {
        assert_eq!(image_path("data/", 9).unwrap(), "data/000010.jpg");
        assert_eq!(annotation_path("data/", 9).unwrap(), "data/000010.json");
        assert_eq!(image_path("", 0).unwrap(), "000001.jpg");
        let key = RecordKey::new(RecordKind::Image, 9).unwrap();
        assert_eq!(key.file_name(), "000010.jpg");
    }

    #[test]
    fn record_key_parses_back() {
        let key = RecordKey::new(RecordKind::Annotation, 123).unwrap();
        assert_eq!(RecordKey::parse(&key.to_bytes()), Some(key));
        assert_eq!(key.id.index(), 123);
    }

    #[test]
    fn record_key_rejects_foreign_keys() {
        assert_eq!(RecordKey::parse(b"image_1"), None);
        assert_eq!(RecordKey::parse(b"image_000000"), None);
        assert_eq!(RecordKey::parse(b"mask_000001"), None);
        assert_eq!(RecordKey::parse(b"image_00000a"), None);
        assert_eq!(RecordKey::parse(b"\xff\xfe"), None);
    }
}
