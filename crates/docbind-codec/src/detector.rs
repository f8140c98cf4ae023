//! Best-guess encoding detection over a byte sample.
//!
//! Detection runs in two stages:
//! 1) A statistical pass. A leading BOM is authoritative; otherwise
//!    `chardetng` scores the sample.
//! 2) If that yields nothing usable (empty sample, pass disabled, or an
//!    encoding without a decoder) a UTF heuristic looks at the first 2-4
//!    bytes for a BOM and otherwise answers UTF-8.
//!
//! The second stage cannot fail, so a load always gets a decoder.

use crate::encoding::TextEncoding;
use docbind_core::{DetectionConfig, DetectionSource};

/// Outcome of [`detect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub encoding: TextEncoding,
    pub source: DetectionSource,
}

/// Guess the encoding of `sample`, normally the first chunk of a file.
pub fn detect(sample: &[u8], config: &DetectionConfig) -> Detection {
    if let Some(detection) = statistical_pass(sample, config) {
        if is_available(detection.encoding, config) {
            log::info!(
                "Encoding detected as {} ({:?})",
                detection.encoding,
                detection.source
            );
            return detection;
        }
        log::warn!("No available decoder for \"{}\"", detection.encoding);
        log::warn!("Falling back to UTF detection");
    }

    let detection = utf_fallback(sample);
    log::info!("Using {} ({:?})", detection.encoding, detection.source);
    detection
}

fn statistical_pass(sample: &[u8], config: &DetectionConfig) -> Option<Detection> {
    if !config.statistical {
        log::debug!("statistical detection disabled");
        return None;
    }

    if sample.is_empty() {
        log::warn!("statistical detection skipped: empty sample");
        return None;
    }

    if let Some((encoding, _)) = TextEncoding::for_bom(sample) {
        return Some(Detection {
            encoding,
            source: DetectionSource::Bom,
        });
    }

    let mut detector = chardetng::EncodingDetector::new();
    // The sample is usually a prefix of the file and may end inside a
    // character, so it is never fed as the end of the stream.
    detector.feed(sample, false);
    let tld = config.tld_hint.as_deref().and_then(sanitize_tld);
    let guess = detector.guess(tld.as_deref().map(str::as_bytes), config.allow_utf8);

    Some(Detection {
        encoding: TextEncoding::Whatwg(guess),
        source: DetectionSource::Statistical,
    })
}

/// BOM/heuristic UTF detection. Always answers.
pub fn utf_fallback(sample: &[u8]) -> Detection {
    match TextEncoding::for_bom(sample) {
        Some((encoding, _)) => Detection {
            encoding,
            source: DetectionSource::Fallback,
        },
        None => Detection {
            encoding: TextEncoding::utf8(),
            source: DetectionSource::Fallback,
        },
    }
}

fn is_available(encoding: TextEncoding, config: &DetectionConfig) -> bool {
    encoding.has_decoder()
        && !config
            .disabled_encodings
            .iter()
            .any(|label| encoding.matches_label(label))
}

// chardetng panics on dots and upper case in the TLD.
fn sanitize_tld(raw: &str) -> Option<String> {
    let tld = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    if !tld.is_empty() && tld.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        Some(tld)
    } else {
        log::warn!("ignoring malformed TLD hint {:?}", raw);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_16BE};

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    #[test]
    fn test_ascii_is_utf8_compatible() {
        let detection = detect(b"plain ascii text\n", &config());
        assert_eq!(detection.source, DetectionSource::Statistical);
        assert!(matches!(
            detection.encoding,
            TextEncoding::Whatwg(encoding) if encoding.is_ascii_compatible()
        ));
        let (text, _) = crate::decode_all(detection.encoding, b"plain ascii text\n");
        assert_eq!(text, "plain ascii text\n");
    }

    #[test]
    fn test_utf8_multibyte_detected() {
        let sample = "Grüße aus Köln, naïve café, déjà vu — ☃".repeat(20);
        let detection = detect(sample.as_bytes(), &config());
        assert_eq!(detection.encoding, TextEncoding::utf8());
    }

    #[test]
    fn test_shift_jis_detected() {
        let text = "日本語の文章です。これはテストのためのテキストで、ひらがなとカタカナと漢字を含みます。".repeat(10);
        let (bytes, _, _) = SHIFT_JIS.encode(&text);
        let detection = detect(&bytes, &config());
        assert_eq!(detection.encoding, TextEncoding::Whatwg(SHIFT_JIS));
        assert_eq!(detection.source, DetectionSource::Statistical);
    }

    #[test]
    fn test_bom_wins_over_statistics() {
        let detection = detect(&[0xFE, 0xFF, 0x00, 0x41], &config());
        assert_eq!(detection.encoding, TextEncoding::Whatwg(UTF_16BE));
        assert_eq!(detection.source, DetectionSource::Bom);
    }

    #[test]
    fn test_empty_sample_falls_back_to_utf8() {
        let detection = detect(b"", &config());
        assert_eq!(detection.encoding, TextEncoding::utf8());
        assert_eq!(detection.source, DetectionSource::Fallback);
    }

    #[test]
    fn test_disabled_statistics_uses_heuristics() {
        let mut config = config();
        config.statistical = false;

        let detection = detect(&[0xFF, 0xFE, 0x00, 0x00, 0x41, 0, 0, 0], &config);
        assert_eq!(detection.encoding, TextEncoding::Utf32Le);
        assert_eq!(detection.source, DetectionSource::Fallback);

        let detection = detect("caf\u{e9}".as_bytes(), &config);
        assert_eq!(detection.encoding, TextEncoding::utf8());
    }

    #[test]
    fn test_unavailable_guess_falls_back() {
        let sample = b"caf\xE9 cr\xE8me br\xFBl\xE9e";
        let first = detect(sample, &config());
        assert_eq!(first.source, DetectionSource::Statistical);
        assert_ne!(first.encoding, TextEncoding::utf8());

        let mut config = config();
        config.disabled_encodings = vec![first.encoding.name().to_string()];

        let detection = detect(sample, &config);
        assert_eq!(detection.source, DetectionSource::Fallback);
        assert_eq!(detection.encoding, TextEncoding::utf8());
    }

    #[test]
    fn test_sanitize_tld() {
        assert_eq!(sanitize_tld(".JP").as_deref(), Some("jp"));
        assert_eq!(sanitize_tld("co.uk"), None);
        assert_eq!(sanitize_tld(""), None);
    }
}
