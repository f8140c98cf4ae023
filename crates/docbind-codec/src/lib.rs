//! # docbind codec
//!
//! Byte-to-text conversion for documents of unknown encoding.
//!
//! - [`detector`] guesses an encoding from the first chunk of a file
//! - [`decoder`] converts a byte stream to UTF-8 incrementally, tolerating
//!   chunk boundaries inside multi-byte characters
//! - [`encoding`] is the registry of decodable encodings
//!
//! ```
//! use docbind_codec::{StreamDecoder, detect};
//! use docbind_core::DetectionConfig;
//!
//! let bytes = "naïve café".as_bytes();
//! let detection = detect(bytes, &DetectionConfig::default());
//!
//! let mut decoder = StreamDecoder::new(detection.encoding);
//! let mut text = decoder.decode(&bytes[..3]);
//! text.push_str(&decoder.decode(&bytes[3..]));
//! text.push_str(&decoder.finish());
//! assert_eq!(text, "naïve café");
//! ```

pub mod decoder;
pub mod detector;
pub mod encoding;

pub use decoder::{StreamDecoder, decode_all};
pub use detector::{Detection, detect, utf_fallback};
pub use encoding::TextEncoding;
