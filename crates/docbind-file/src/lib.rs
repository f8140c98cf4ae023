//! # docbind file
//!
//! The disk side of a document: loading, saving, and noticing when someone
//! else touched the file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docbind_file::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::open(
//!     Path::new("/path/to/notes.txt"),
//!     MemoryBuffer::new(),
//!     DocumentConfig::default(),
//! )?;
//! let mut events = doc.subscribe();
//!
//! doc.buffer_mut().insert("one more line\n");
//! doc.save()?;
//!
//! while let Ok(event) = events.try_recv() {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! ### Loader
//!
//! [`loader::load_file`] streams a file into a buffer in fixed-size chunks,
//! detecting the encoding on the first chunk and decoding with one stateful
//! decoder so multi-byte characters survive chunk boundaries.
//!
//! ### Atomic Writer
//!
//! [`atomic::AtomicWriter`] replaces a file through a sibling temp file and
//! a rename. An interrupted save leaves the old content in place.
//!
//! ### Tracker and Watcher
//!
//! [`tracker::FileStateTracker`] polls the bound file and reports
//! `Modified`, `Deleted` and `Restored`. [`watcher::FileWatcher`] is an
//! optional push hint that tells the owner when polling is worthwhile.
//!
//! ### Document
//!
//! [`document::Document`] ties a buffer to a path and implements save,
//! save-as, rename, reload, trash and close with change events.

pub mod atomic;
pub mod document;
pub mod loader;
pub mod tracker;
pub mod watcher;

pub use atomic::{AtomicWriter, StagedWrite, WriteOutcome};
pub use document::{Document, ReloadOutcome, RenameOutcome};
pub use loader::{load_file, load_from_reader};
pub use tracker::{Binding, FileStateTracker, TrackedState};
pub use watcher::{FileWatcher, WatchEvent};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::atomic::{AtomicWriter, StagedWrite, WriteOutcome};
    pub use crate::document::{Document, ReloadOutcome, RenameOutcome};
    pub use crate::loader::{load_file, load_from_reader};
    pub use crate::tracker::{Binding, FileStateTracker, TrackedState};
    pub use crate::watcher::{FileWatcher, WatchEvent};
    pub use docbind_core::prelude::*;
}
