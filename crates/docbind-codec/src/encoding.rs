//! The set of encodings docbind can decode.
//!
//! Everything in the WHATWG Encoding Standard comes from `encoding_rs`.
//! UTF-32 is not part of that standard, so its two byte orders are handled
//! by this crate's own decoder.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use std::fmt;

/// A decodable text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// Any encoding from the WHATWG registry
    Whatwg(&'static Encoding),
    Utf32Le,
    Utf32Be,
}

impl TextEncoding {
    /// UTF-8, the universal default
    pub fn utf8() -> Self {
        Self::Whatwg(UTF_8)
    }

    /// Resolve a label such as `"Shift_JIS"`, `"latin1"` or `"utf-32le"`.
    pub fn for_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utf-32le" | "utf32le" => Some(Self::Utf32Le),
            "utf-32be" | "utf32be" => Some(Self::Utf32Be),
            _ => Encoding::for_label(trimmed.as_bytes()).map(Self::Whatwg),
        }
    }

    /// Recognise a byte-order mark at the start of `bytes`.
    ///
    /// Returns the encoding and the BOM length. UTF-32 marks are checked
    /// before UTF-16 because `FF FE 00 00` also starts with the UTF-16LE mark.
    pub fn for_bom(bytes: &[u8]) -> Option<(Self, usize)> {
        match bytes {
            [0xFF, 0xFE, 0x00, 0x00, ..] => Some((Self::Utf32Le, 4)),
            [0x00, 0x00, 0xFE, 0xFF, ..] => Some((Self::Utf32Be, 4)),
            [0xEF, 0xBB, 0xBF, ..] => Some((Self::Whatwg(UTF_8), 3)),
            [0xFF, 0xFE, ..] => Some((Self::Whatwg(UTF_16LE), 2)),
            [0xFE, 0xFF, ..] => Some((Self::Whatwg(UTF_16BE), 2)),
            _ => None,
        }
    }

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Self::Whatwg(encoding) => encoding.name(),
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        }
    }

    /// Whether a decoder exists for this encoding.
    ///
    /// The WHATWG `replacement` encoding maps every input to a single U+FFFD
    /// and is treated as having no usable decoder.
    pub fn has_decoder(self) -> bool {
        match self {
            Self::Whatwg(encoding) => encoding != encoding_rs::REPLACEMENT,
            Self::Utf32Le | Self::Utf32Be => true,
        }
    }

    /// Whether `label` names this same encoding
    pub fn matches_label(self, label: &str) -> bool {
        Self::for_label(label) == Some(self)
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_label() {
        assert_eq!(
            TextEncoding::for_label("Shift_JIS"),
            Some(TextEncoding::Whatwg(encoding_rs::SHIFT_JIS))
        );
        assert_eq!(
            TextEncoding::for_label(" latin1 "),
            Some(TextEncoding::Whatwg(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(TextEncoding::for_label("UTF-32BE"), Some(TextEncoding::Utf32Be));
        assert_eq!(TextEncoding::for_label("klingon"), None);
    }

    #[test]
    fn test_for_bom() {
        assert_eq!(
            TextEncoding::for_bom(&[0xFF, 0xFE, 0x00, 0x00, 0x41]),
            Some((TextEncoding::Utf32Le, 4))
        );
        assert_eq!(
            TextEncoding::for_bom(&[0xFF, 0xFE, 0x41, 0x00]),
            Some((TextEncoding::Whatwg(UTF_16LE), 2))
        );
        assert_eq!(
            TextEncoding::for_bom(b"\xEF\xBB\xBFhi"),
            Some((TextEncoding::utf8(), 3))
        );
        assert_eq!(
            TextEncoding::for_bom(&[0x00, 0x00, 0xFE, 0xFF]),
            Some((TextEncoding::Utf32Be, 4))
        );
        assert_eq!(TextEncoding::for_bom(b"plain"), None);
        assert_eq!(TextEncoding::for_bom(&[0xFF]), None);
    }

    #[test]
    fn test_names_and_decoders() {
        assert_eq!(TextEncoding::utf8().name(), "UTF-8");
        assert_eq!(TextEncoding::Utf32Le.to_string(), "UTF-32LE");
        assert!(TextEncoding::utf8().has_decoder());
        assert!(!TextEncoding::Whatwg(encoding_rs::REPLACEMENT).has_decoder());
        assert!(TextEncoding::Whatwg(encoding_rs::SHIFT_JIS).matches_label("sjis"));
    }
}
