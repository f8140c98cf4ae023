//! Stateful, chunk-boundary-safe decoding to UTF-8.
//!
//! A [`StreamDecoder`] is bound to one encoding for the lifetime of one load.
//! Multi-byte sequences split across chunks are held back and completed by
//! the next call, so feeding a byte stream in any chunking produces exactly
//! the same text as decoding it in one piece. Invalid input never fails the
//! decode: it becomes U+FFFD.

use crate::encoding::TextEncoding;
use encoding_rs::CoderResult;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

enum Inner {
    Whatwg(encoding_rs::Decoder),
    Utf32(Utf32Decoder),
}

/// Incremental decoder producing UTF-8 text.
pub struct StreamDecoder {
    inner: Inner,
    had_replacements: bool,
    finished: bool,
}

impl StreamDecoder {
    /// Create a decoder for `encoding`.
    ///
    /// A leading byte-order mark is consumed rather than emitted. For WHATWG
    /// encodings a UTF-8 or UTF-16 BOM overrides `encoding`, which is how
    /// `encoding_rs` sniffs.
    pub fn new(encoding: TextEncoding) -> Self {
        let inner = match encoding {
            TextEncoding::Whatwg(encoding) => Inner::Whatwg(encoding.new_decoder()),
            TextEncoding::Utf32Le => Inner::Utf32(Utf32Decoder::new(false)),
            TextEncoding::Utf32Be => Inner::Utf32(Utf32Decoder::new(true)),
        };
        Self {
            inner,
            had_replacements: false,
            finished: false,
        }
    }

    /// The encoding currently in effect (may differ from the requested one
    /// after BOM sniffing)
    pub fn encoding(&self) -> TextEncoding {
        match &self.inner {
            Inner::Whatwg(decoder) => TextEncoding::Whatwg(decoder.encoding()),
            Inner::Utf32(decoder) if decoder.big_endian => TextEncoding::Utf32Be,
            Inner::Utf32(_) => TextEncoding::Utf32Le,
        }
    }

    /// Decode the next chunk of the stream.
    ///
    /// A trailing partial sequence is buffered internally and is not part of
    /// the returned text.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.run(chunk, false)
    }

    /// Flush the end of the stream.
    ///
    /// A dangling partial sequence becomes U+FFFD. After this call the
    /// decoder is spent and further calls return empty strings.
    pub fn finish(&mut self) -> String {
        self.run(&[], true)
    }

    /// Whether any invalid or truncated sequence has been replaced so far
    pub fn had_replacements(&self) -> bool {
        self.had_replacements
    }

    fn run(&mut self, chunk: &[u8], last: bool) -> String {
        if self.finished {
            log::warn!("decoder used after finish(); {} bytes ignored", chunk.len());
            return String::new();
        }
        self.finished = last;

        match &mut self.inner {
            Inner::Whatwg(decoder) => decode_whatwg(decoder, chunk, last, &mut self.had_replacements),
            Inner::Utf32(decoder) => decoder.decode(chunk, last, &mut self.had_replacements),
        }
    }
}

/// Decode a complete byte string in one call.
///
/// Returns the text and whether any replacement happened.
pub fn decode_all(encoding: TextEncoding, bytes: &[u8]) -> (String, bool) {
    let mut decoder = StreamDecoder::new(encoding);
    let mut text = decoder.decode(bytes);
    text.push_str(&decoder.finish());
    (text, decoder.had_replacements())
}

fn decode_whatwg(
    decoder: &mut encoding_rs::Decoder,
    mut src: &[u8],
    last: bool,
    replaced: &mut bool,
) -> String {
    let mut out = String::with_capacity(utf8_capacity(decoder, src.len()));
    loop {
        let (result, read, had_errors) = decoder.decode_to_string(src, &mut out, last);
        *replaced |= had_errors;
        src = &src[read..];
        match result {
            CoderResult::InputEmpty => return out,
            CoderResult::OutputFull => {
                let extra = utf8_capacity(decoder, src.len());
                out.reserve(extra);
            }
        }
    }
}

fn utf8_capacity(decoder: &encoding_rs::Decoder, len: usize) -> usize {
    decoder
        .max_utf8_buffer_length(len)
        .unwrap_or_else(|| len.saturating_mul(3))
        .max(16)
}

/// UTF-32 in either byte order.
struct Utf32Decoder {
    big_endian: bool,
    pending: [u8; 4],
    pending_len: usize,
    at_start: bool,
}

impl Utf32Decoder {
    fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            pending: [0; 4],
            pending_len: 0,
            at_start: true,
        }
    }

    fn decode(&mut self, mut src: &[u8], last: bool, replaced: &mut bool) -> String {
        let mut out = String::with_capacity(src.len());

        if self.pending_len > 0 {
            let take = (4 - self.pending_len).min(src.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&src[..take]);
            self.pending_len += take;
            src = &src[take..];
            if self.pending_len == 4 {
                self.pending_len = 0;
                let unit = self.pending;
                self.push_unit(unit, &mut out, replaced);
            }
        }

        // Pending is either empty now or src was fully absorbed into it.
        if self.pending_len == 0 {
            let mut units = src.chunks_exact(4);
            for unit in &mut units {
                self.push_unit([unit[0], unit[1], unit[2], unit[3]], &mut out, replaced);
            }
            let rest = units.remainder();
            self.pending[..rest.len()].copy_from_slice(rest);
            self.pending_len = rest.len();
        }

        if last && self.pending_len > 0 {
            self.pending_len = 0;
            out.push(REPLACEMENT_CHAR);
            *replaced = true;
        }

        out
    }

    fn push_unit(&mut self, bytes: [u8; 4], out: &mut String, replaced: &mut bool) {
        let value = if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        };

        if self.at_start {
            self.at_start = false;
            if value == 0xFEFF {
                return;
            }
        }

        match char::from_u32(value) {
            Some(c) => out.push(c),
            None => {
                out.push(REPLACEMENT_CHAR);
                *replaced = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{GBK, SHIFT_JIS, UTF_8, UTF_16LE, WINDOWS_1252};
    use proptest::prelude::*;

    fn decode_in_chunks(encoding: TextEncoding, bytes: &[u8], chunk_size: usize) -> (String, bool) {
        let mut decoder = StreamDecoder::new(encoding);
        let mut text = String::new();
        for chunk in bytes.chunks(chunk_size.max(1)) {
            text.push_str(&decoder.decode(chunk));
        }
        text.push_str(&decoder.finish());
        (text, decoder.had_replacements())
    }

    fn utf32le(text: &str) -> Vec<u8> {
        text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect()
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let bytes = "héllo wörld €".as_bytes();
        let mut decoder = StreamDecoder::new(TextEncoding::utf8());

        // 'é' is C3 A9; split between them
        let first = decoder.decode(&bytes[..2]);
        assert_eq!(first, "h");
        let rest = decoder.decode(&bytes[2..]);
        assert_eq!(format!("{first}{rest}"), "héllo wörld €");
        assert_eq!(decoder.finish(), "");
        assert!(!decoder.had_replacements());
    }

    #[test]
    fn test_shift_jis_one_byte_at_a_time() {
        let (bytes, _, _) = SHIFT_JIS.encode("日本語のテキスト");
        let (text, replaced) = decode_in_chunks(TextEncoding::Whatwg(SHIFT_JIS), &bytes, 1);
        assert_eq!(text, "日本語のテキスト");
        assert!(!replaced);
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let (text, replaced) = decode_all(TextEncoding::utf8(), b"ok \xFF\xFE ok");
        assert_eq!(text, "ok \u{FFFD}\u{FFFD} ok");
        assert!(replaced);
    }

    #[test]
    fn test_truncated_tail_replaced_on_finish() {
        let mut decoder = StreamDecoder::new(TextEncoding::utf8());
        assert_eq!(decoder.decode(b"a\xE2\x82"), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(decoder.had_replacements());
        assert_eq!(decoder.decode(b"more"), "");
    }

    #[test]
    fn test_utf8_bom_is_consumed() {
        let (text, _) = decode_all(TextEncoding::utf8(), b"\xEF\xBB\xBFhello");
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_utf16_bom_overrides_requested_encoding() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("hi".encode_utf16().flat_map(|u| u.to_le_bytes()));

        let mut decoder = StreamDecoder::new(TextEncoding::Whatwg(WINDOWS_1252));
        let text = decoder.decode(&bytes) + &decoder.finish();
        assert_eq!(text, "hi");
        assert_eq!(decoder.encoding(), TextEncoding::Whatwg(UTF_16LE));
    }

    #[test]
    fn test_utf32_with_bom_and_split_units() {
        let mut bytes = vec![0xFF, 0xFE, 0x00, 0x00];
        bytes.extend(utf32le("a😀b"));
        let (text, replaced) = decode_in_chunks(TextEncoding::Utf32Le, &bytes, 3);
        assert_eq!(text, "a😀b");
        assert!(!replaced);
    }

    #[test]
    fn test_utf32_big_endian_and_invalid_scalar() {
        let mut bytes: Vec<u8> = "Z".chars().flat_map(|c| (c as u32).to_be_bytes()).collect();
        bytes.extend(0xD800u32.to_be_bytes());
        bytes.extend([0x00, 0x00]);
        let (text, replaced) = decode_all(TextEncoding::Utf32Be, &bytes);
        assert_eq!(text, "Z\u{FFFD}\u{FFFD}");
        assert!(replaced);
    }

    #[test]
    fn test_empty_stream() {
        let (text, replaced) = decode_all(TextEncoding::Whatwg(GBK), b"");
        assert!(text.is_empty());
        assert!(!replaced);
    }

    fn any_encoding() -> impl Strategy<Value = TextEncoding> {
        prop_oneof![
            Just(TextEncoding::Whatwg(UTF_8)),
            Just(TextEncoding::Whatwg(SHIFT_JIS)),
            Just(TextEncoding::Whatwg(GBK)),
            Just(TextEncoding::Whatwg(UTF_16LE)),
            Just(TextEncoding::Whatwg(WINDOWS_1252)),
            Just(TextEncoding::Utf32Le),
            Just(TextEncoding::Utf32Be),
        ]
    }

    proptest! {
        #[test]
        fn prop_chunking_never_changes_output(
            encoding in any_encoding(),
            bytes in proptest::collection::vec(any::<u8>(), 0..512),
            chunk_size in 1usize..64,
        ) {
            let whole = decode_all(encoding, &bytes);
            let chunked = decode_in_chunks(encoding, &bytes, chunk_size);
            prop_assert_eq!(whole, chunked);
        }

        #[test]
        fn prop_valid_text_survives_any_split(
            text in "\\PC{0,64}",
            split in 0usize..256,
        ) {
            let bytes = text.as_bytes();
            let split = split.min(bytes.len());
            let mut decoder = StreamDecoder::new(TextEncoding::utf8());
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());
            prop_assert_eq!(out, text);
            prop_assert!(!decoder.had_replacements());
        }
    }
}
