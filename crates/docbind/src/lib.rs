//! # docbind
//!
//! Document persistence for text editors.
//!
//! docbind binds an editing buffer to a file on disk. It loads files of
//! unknown encoding in fixed-size chunks, saves atomically so a crash never
//! leaves a half-written file, and tracks external modification, deletion
//! and restoration of the bound file.
//!
//! This crate re-exports the workspace crates:
//! - [`docbind_core`] - errors, configuration, data model, buffer interface
//! - [`docbind_codec`] - encoding detection and streaming decoding
//! - [`docbind_file`] - loader, atomic writer, tracker, watcher, document
//!
//! ## Quick Start
//!
//! ```no_run
//! use docbind::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::new_temporary("new 1", MemoryBuffer::new(), DocumentConfig::default());
//! doc.buffer_mut().insert("hello\n");
//! doc.save_as(Path::new("/tmp/hello.txt"))?;
//!
//! match doc.check_for_state_change() {
//!     FileStateChange::Modified => println!("changed on disk"),
//!     FileStateChange::Deleted => println!("deleted on disk"),
//!     _ => {}
//! }
//! # Ok(())
//! # }
//! ```

pub use docbind_codec as codec;
pub use docbind_core as core;
pub use docbind_file as file;

use chrono::{DateTime, Utc};
use docbind_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Summary of a file as docbind would load it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectReport {
    pub path: PathBuf,
    pub encoding: String,
    pub detection_source: DetectionSource,
    pub bytes: u64,
    pub chunks: usize,
    pub chars: usize,
    pub had_replacements: bool,
    pub modified: Option<DateTime<Utc>>,
}

/// Load `path` into a scratch buffer and describe the result.
pub fn inspect(path: &Path, config: &DocumentConfig) -> Result<InspectReport> {
    let document =
        docbind_file::Document::open(path, MemoryBuffer::new(), config.clone())?;
    let report = document
        .last_load_report()
        .cloned()
        .ok_or_else(|| Error::other("document opened without a load report"))?;

    Ok(InspectReport {
        path: document
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.to_path_buf()),
        encoding: report.encoding,
        detection_source: report.detection_source,
        bytes: report.bytes_read,
        chunks: report.chunks,
        chars: document.buffer().text().chars().count(),
        had_replacements: report.had_replacements,
        modified: document.last_known_modified_time().map(DateTime::<Utc>::from),
    })
}

/// Pick the configuration for a run.
///
/// An explicit config file wins, then a named profile, then a profile
/// recommended for `file_size`.
pub fn resolve_config(
    config_path: Option<&Path>,
    profile: Option<ConfigProfile>,
    file_size: Option<u64>,
) -> Result<DocumentConfig> {
    if let Some(path) = config_path {
        log::debug!("Loading config from {}", path.display());
        return DocumentConfig::load(path);
    }

    let profile = profile.unwrap_or_else(|| match file_size {
        Some(size) => ConfigProfile::recommend(size),
        None => ConfigProfile::Desktop,
    });
    log::debug!("Using {} profile", profile);
    let config = profile.create_config();
    config.validate()?;
    Ok(config)
}

/// Tick counter for watch loops that rely on a file watcher.
///
/// With a watcher running, a loop polls only when signalled. Every
/// `interval` ticks a full poll is due anyway, which catches changes the
/// watcher missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    interval: u32,
    since_full: u32,
}

impl PollSchedule {
    /// An `interval` of 0 is treated as 1: every tick polls.
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            since_full: 0,
        }
    }

    /// Advance one tick; true when a full poll is due on this tick.
    pub fn full_poll_due(&mut self) -> bool {
        self.since_full += 1;
        if self.since_full >= self.interval {
            self.since_full = 0;
            true
        } else {
            false
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{InspectReport, PollSchedule, inspect, resolve_config};
    pub use docbind_codec::{Detection, StreamDecoder, TextEncoding, decode_all, detect};
    pub use docbind_file::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_reports_encoding_and_chars() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("note.txt");
        std::fs::write(&path, "añb✓\n").unwrap();

        let report = inspect(&path, &DocumentConfig::default()).unwrap();
        assert_eq!(report.encoding, "UTF-8");
        assert_eq!(report.chars, 5);
        assert_eq!(report.bytes, 8);
        assert!(report.modified.is_some());

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"encoding\":\"UTF-8\""));
    }

    #[test]
    fn test_poll_schedule_spaces_full_polls() {
        let mut schedule = PollSchedule::new(3);
        let due: Vec<bool> = (0..7).map(|_| schedule.full_poll_due()).collect();
        assert_eq!(due, vec![false, false, true, false, false, true, false]);

        let mut every_tick = PollSchedule::new(0);
        assert!(every_tick.full_poll_due());
        assert!(every_tick.full_poll_due());
    }

    #[test]
    fn test_resolve_config_precedence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docbind.yaml");
        std::fs::write(&path, "chunk_size: 4096\n").unwrap();

        let from_file = resolve_config(Some(&path), Some(ConfigProfile::Minimal), None).unwrap();
        assert_eq!(from_file.chunk_size, 4096);

        let from_profile = resolve_config(None, Some(ConfigProfile::Minimal), None).unwrap();
        assert_eq!(from_profile, ConfigProfile::Minimal.create_config());

        let recommended = resolve_config(None, None, Some(1 << 40)).unwrap();
        assert_eq!(recommended, ConfigProfile::LargeFiles.create_config());

        let small = resolve_config(None, None, Some(4096)).unwrap();
        assert!(!small.write.direct_write_fallback);
    }
}
