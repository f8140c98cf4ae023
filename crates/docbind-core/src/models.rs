//! Core data models shared by the codec and file crates.
//!
//! These types are designed to be:
//! - **Serializable**: reports and events derive Serialize/Deserialize
//! - **Type-Safe**: enums replace flag combinations and magic strings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Relationship between a document's buffer and the disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Never saved; no backing path
    Temporary,
    /// Backed by a file that existed at the last check
    File,
    /// Backed by a path whose file has disappeared
    FileMissing,
}

impl BufferType {
    /// True for the two path-backed variants
    pub fn is_backed(self) -> bool {
        matches!(self, Self::File | Self::FileMissing)
    }
}

impl fmt::Display for BufferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Temporary => "Temporary",
            Self::File => "File",
            Self::FileMissing => "FileMissing",
        };
        f.write_str(name)
    }
}

/// Result of one poll of the file-state tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FileStateChange {
    /// Nothing to report
    NoChange,
    /// The file's modification time moved since the last load/save
    Modified,
    /// The file disappeared
    Deleted,
    /// A missing file is back
    Restored,
}

impl fmt::Display for FileStateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoChange => "no change",
            Self::Modified => "modified externally",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
        };
        f.write_str(name)
    }
}

/// Lifecycle notifications emitted by a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A write is about to start
    AboutToSave,
    /// Buffer content was persisted and the save point set
    Saved,
    /// The document's effective path changed
    Renamed {
        from: Option<PathBuf>,
        to: PathBuf,
    },
    /// The document was closed by its owner
    Closed,
    /// The save-point indicator changed outside a save (e.g. file deleted)
    SavePointChanged { saved: bool },
    /// A poll reported something other than [`FileStateChange::NoChange`]
    StateChanged(FileStateChange),
}

/// How the encoding used for a load was chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DetectionSource {
    /// A byte-order mark at the start of the sample
    Bom,
    /// The statistical detector's guess
    Statistical,
    /// UTF heuristics after the statistical pass gave nothing usable
    Fallback,
}

/// Summary of a completed chunked load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadReport {
    /// Canonical name of the encoding the file was decoded with
    pub encoding: String,
    /// How that encoding was picked
    pub detection_source: DetectionSource,
    /// Raw bytes consumed from disk
    pub bytes_read: u64,
    /// Number of non-empty chunks read
    pub chunks: usize,
    /// Length in bytes of the UTF-8 text appended to the buffer
    pub text_len: usize,
    /// Whether any invalid sequence was replaced with U+FFFD
    pub had_replacements: bool,
}
