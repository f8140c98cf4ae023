//! Binding of a document to a path, and polling for external changes.
//!
//! The tracker holds the only copy of the binding state. Timestamps always
//! come from file-system metadata, so a clock change on the host never
//! produces a spurious [`FileStateChange::Modified`].

use docbind_core::{BufferType, FileStateChange};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The file a backed document is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub path: PathBuf,
    /// mtime observed at the last load or save
    pub modified: Option<SystemTime>,
}

impl Binding {
    fn observe(path: PathBuf) -> Self {
        let modified = modified_time(&path);
        Self { path, modified }
    }
}

/// Where a document's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedState {
    /// Never saved; no path
    Temporary,
    /// Bound to an existing file
    File(Binding),
    /// Bound to a path whose file has disappeared
    FileMissing(Binding),
}

/// Polls the bound file and applies the state transitions.
#[derive(Debug, Clone)]
pub struct FileStateTracker {
    state: TrackedState,
}

impl FileStateTracker {
    /// Tracker for a document that has no file yet
    pub fn temporary() -> Self {
        Self {
            state: TrackedState::Temporary,
        }
    }

    /// Tracker bound to `path`. The path is canonicalized when it exists.
    pub fn bound(path: impl Into<PathBuf>) -> Self {
        let mut tracker = Self::temporary();
        tracker.rebind(path.into());
        tracker
    }

    pub fn state(&self) -> &TrackedState {
        &self.state
    }

    pub fn buffer_type(&self) -> BufferType {
        match self.state {
            TrackedState::Temporary => BufferType::Temporary,
            TrackedState::File(_) => BufferType::File,
            TrackedState::FileMissing(_) => BufferType::FileMissing,
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        match &self.state {
            TrackedState::Temporary => None,
            TrackedState::File(b) | TrackedState::FileMissing(b) => Some(b),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.binding().map(|b| b.path.as_path())
    }

    pub fn last_known_modified_time(&self) -> Option<SystemTime> {
        self.binding().and_then(|b| b.modified)
    }

    /// Bind to `path` as a file, reading its current mtime.
    ///
    /// Used after a successful save, save-as or rename. Binding never goes
    /// back to `Temporary`.
    pub fn rebind(&mut self, path: PathBuf) {
        let path = fs::canonicalize(&path).unwrap_or(path);
        let binding = Binding::observe(path);
        self.state = if binding.path.exists() {
            TrackedState::File(binding)
        } else {
            TrackedState::FileMissing(binding)
        };
    }

    /// Take the file's current mtime as the known one.
    pub fn refresh_modified_time(&mut self) {
        if let TrackedState::File(binding) | TrackedState::FileMissing(binding) = &mut self.state
        {
            binding.modified = modified_time(&binding.path);
        }
    }

    /// Compare the binding against the file system.
    ///
    /// `Modified` is reported on every poll until the caller reloads or
    /// saves; the known mtime is not advanced here. `Restored` does not
    /// reload content either.
    pub fn check_for_state_change(&mut self) -> FileStateChange {
        let (next, change) = match std::mem::replace(&mut self.state, TrackedState::Temporary) {
            TrackedState::Temporary => (TrackedState::Temporary, FileStateChange::NoChange),
            TrackedState::File(binding) => {
                if !binding.path.exists() {
                    (TrackedState::FileMissing(binding), FileStateChange::Deleted)
                } else if modified_time(&binding.path) != binding.modified {
                    (TrackedState::File(binding), FileStateChange::Modified)
                } else {
                    (TrackedState::File(binding), FileStateChange::NoChange)
                }
            }
            TrackedState::FileMissing(binding) => {
                if binding.path.exists() {
                    (TrackedState::File(binding), FileStateChange::Restored)
                } else {
                    (TrackedState::FileMissing(binding), FileStateChange::NoChange)
                }
            }
        };
        self.state = next;

        if change != FileStateChange::NoChange {
            log::info!("File state change: {}", change);
        }
        change
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
