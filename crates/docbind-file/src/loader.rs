//! Chunked loading of a file into a [`TextBuffer`].
//!
//! The file is read in fixed-size chunks. The encoding is detected once, on
//! the first chunk, and a single [`StreamDecoder`] carries state across all
//! chunks so characters split by a chunk boundary come out whole. Undo
//! recording and change notifications stay suspended for the whole load.

use docbind_codec::{Detection, StreamDecoder, detect};
use docbind_core::prelude::*;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Load `path` into `buffer`, appending after any existing content.
///
/// On a mid-stream read error the text decoded so far stays in the buffer
/// and the error reports how many bytes were applied.
pub fn load_file<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    path: &Path,
    config: &DocumentConfig,
) -> Result<LoadReport> {
    if !path.exists() {
        log::warn!("Cannot read \"{}\": doesn't exist", path.display());
        return Err(Error::not_found(path));
    }

    let file = File::open(path).map_err(|e| {
        log::warn!("Cannot open \"{}\": {}", path.display(), e);
        Error::open_error(path, e)
    })?;

    let metadata = file.metadata().map_err(|e| Error::open_error(path, e))?;
    if metadata.is_dir() {
        return Err(Error::open_error(
            path,
            io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
        ));
    }

    log::info!(
        "Loading \"{}\" ({} bytes)",
        path.display(),
        metadata.len()
    );

    load_from_reader(buffer, file, metadata.len(), config).map_err(|e| match e {
        Error::ReadError {
            path: None,
            bytes_applied,
            source,
        } => Error::read_error(Some(path.to_path_buf()), bytes_applied, source),
        other => other,
    })
}

/// Load from any reader. `size_hint` pre-sizes the buffer.
pub fn load_from_reader<B, R>(
    buffer: &mut B,
    mut reader: R,
    size_hint: u64,
    config: &DocumentConfig,
) -> Result<LoadReport>
where
    B: TextBuffer + ?Sized,
    R: Read,
{
    buffer.allocate(usize::try_from(size_hint).unwrap_or(usize::MAX));

    let mut buffer = SuspendGuard::new(buffer);
    let mut chunk = vec![0u8; config.chunk_size.max(1)];
    let mut state: Option<(StreamDecoder, Detection)> = None;
    let mut bytes_read = 0u64;
    let mut chunks = 0usize;
    let mut text_len = 0usize;

    loop {
        let n = match fill_chunk(&mut reader, &mut chunk) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("Read failed after {} bytes: {}", bytes_read, e);
                return Err(Error::read_error(None, bytes_read, e));
            }
        };
        if n == 0 {
            break;
        }

        let data = &chunk[..n];
        log::debug!("Read {} bytes", n);

        let (decoder, _) = state.get_or_insert_with(|| {
            let detection = detect(data, &config.detection);
            (StreamDecoder::new(detection.encoding), detection)
        });

        let text = decoder.decode(data);
        text_len += text.len();
        buffer.append_text(&text);
        ensure_healthy(&*buffer)?;

        bytes_read += n as u64;
        chunks += 1;
    }

    let (mut decoder, detection) = state.unwrap_or_else(|| {
        let detection = detect(&[], &config.detection);
        (StreamDecoder::new(detection.encoding), detection)
    });

    let tail = decoder.finish();
    if !tail.is_empty() {
        text_len += tail.len();
        buffer.append_text(&tail);
        ensure_healthy(&*buffer)?;
    }

    if decoder.had_replacements() {
        log::warn!(
            "Invalid {} sequences were replaced with U+FFFD",
            decoder.encoding()
        );
    }

    Ok(LoadReport {
        encoding: decoder.encoding().name().to_string(),
        detection_source: detection.source,
        bytes_read,
        chunks,
        text_len,
        had_replacements: decoder.had_replacements(),
    })
}

/// Read until `chunk` is full or the reader is exhausted.
fn fill_chunk<R: Read>(reader: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < chunk.len() {
        match reader.read(&mut chunk[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn ensure_healthy<B: TextBuffer + ?Sized>(buffer: &B) -> Result<()> {
    match buffer.status() {
        BufferStatus::Ok => Ok(()),
        status => {
            log::warn!("something bad happened in append_text(): {:?}", status);
            Err(Error::buffer_error(format!("bulk insert failed: {:?}", status)))
        }
    }
}
