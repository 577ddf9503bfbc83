//! Input line preprocessing for builds.
//!
//! The file format stores only post-hash buckets, so how item bytes are
//! obtained from a text line is purely a property of the build invocation:
//! either the line bytes are used as-is, or the line is hex-decoded first.
//! Hex failures abort a build with the offending line number.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// How a build turns an input line into item bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// Use the line bytes as-is.
    #[default]
    Raw,
    /// Decode pairs of hex digits to bytes; odd-length or non-hex lines and
    /// empty lines are rejected.
    Hex,
}

impl LineFormat {
    /// Returns the item bytes for `line`, or [`Error::BadInputLine`] carrying
    /// the 1-based `line_no`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gcset::input::LineFormat;
    ///
    /// assert_eq!(LineFormat::Raw.item_bytes("ab", 1).unwrap().as_ref(), b"ab");
    /// assert_eq!(LineFormat::Hex.item_bytes("0aFF", 1).unwrap().as_ref(), &[0x0a, 0xff]);
    /// assert!(LineFormat::Hex.item_bytes("0aF", 7).is_err());
    /// ```
    pub fn item_bytes<'a>(self, line: &'a str, line_no: u64) -> Result<Cow<'a, [u8]>> {
        match self {
            Self::Raw => Ok(Cow::Borrowed(line.as_bytes())),
            Self::Hex => {
                if line.is_empty() {
                    return Err(Error::BadInputLine {
                        line: line_no,
                        reason: "empty line in hex mode".into(),
                    });
                }
                let bytes = hex::decode(line).map_err(|err| Error::BadInputLine {
                    line: line_no,
                    reason: err.to_string(),
                })?;
                Ok(Cow::Owned(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_passes_bytes_through() {
        let out = LineFormat::Raw.item_bytes("héllo", 3).unwrap();
        assert_eq!(out.as_ref(), "héllo".as_bytes());
        // Raw mode accepts empty lines; the empty string is a legal item.
        assert_eq!(LineFormat::Raw.item_bytes("", 4).unwrap().as_ref(), b"");
    }

    #[test]
    fn hex_decodes_case_insensitively() {
        let out = LineFormat::Hex.item_bytes("DeadBEEF", 1).unwrap();
        assert_eq!(out.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn hex_rejects_odd_length() {
        let err = LineFormat::Hex.item_bytes("abc", 12).unwrap_err();
        match err {
            Error::BadInputLine { line, .. } => assert_eq!(line, 12),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn hex_rejects_invalid_digits() {
        assert!(LineFormat::Hex.item_bytes("zz", 1).is_err());
        assert!(LineFormat::Hex.item_bytes("0x42", 1).is_err());
    }

    #[test]
    fn hex_rejects_empty_lines() {
        assert!(LineFormat::Hex.item_bytes("", 1).is_err());
    }
}
