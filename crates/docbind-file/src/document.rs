//! Document lifecycle: open, save, save-as, rename, reload, trash, close.
//!
//! A [`Document`] owns an editing buffer and the binding of that buffer to a
//! file. Every operation returns a `Result`, and state changes (binding,
//! timestamp, save point) only happen once the disk side has succeeded.
//!
//! Observers subscribe to [`DocumentEvent`]s. Channels are unbounded and
//! `send` never blocks, so a document can be driven without an async runtime.

use crate::atomic::{AtomicWriter, WriteOutcome};
use crate::loader::load_file;
use crate::tracker::{FileStateTracker, TrackedState};
use crate::watcher::{FileWatcher, WatchEvent};
use docbind_core::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::instrument;

/// Result of [`Document::rename`]
#[derive(Debug)]
pub struct RenameOutcome {
    pub write: WriteOutcome,
    /// The old file could not be removed. The rename itself succeeded and
    /// the document is bound to the new path.
    pub cleanup_warning: Option<io::Error>,
}

/// Result of [`Document::reload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Content was replaced with the file's current bytes
    Reloaded(LoadReport),
    /// The file no longer exists; nothing changed
    Skipped,
}

/// An editing buffer bound (or not yet bound) to a file.
pub struct Document<B: TextBuffer> {
    name: String,
    language: Option<String>,
    buffer: B,
    tracker: FileStateTracker,
    config: DocumentConfig,
    writer: AtomicWriter,
    last_load: Option<LoadReport>,
    subscribers: Vec<UnboundedSender<DocumentEvent>>,
}

impl<B: TextBuffer> Document<B> {
    /// A document that has never been saved.
    pub fn new_temporary(name: impl Into<String>, buffer: B, config: DocumentConfig) -> Self {
        let writer = AtomicWriter::new(config.write.clone());
        Self {
            name: name.into(),
            language: None,
            buffer,
            tracker: FileStateTracker::temporary(),
            config,
            writer,
            last_load: None,
            subscribers: Vec::new(),
        }
    }

    /// Load `path` into `buffer` and bind the document to it.
    #[instrument(skip(buffer, config), name = "document_open")]
    pub fn open(path: &Path, mut buffer: B, config: DocumentConfig) -> Result<Self> {
        let report = load_file(&mut buffer, path, &config)?;
        buffer.empty_undo_buffer();
        buffer.set_save_point();

        let mut document = Self::new_temporary(String::new(), buffer, config);
        document.bind(path);
        document.last_load = Some(report);

        log::info!("Opened {}", document.name);
        Ok(document)
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<DocumentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Language identifier chosen by the owner; carries no behavior here
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    /// The bound path, canonicalized when the file existed at bind time
    pub fn path(&self) -> Option<&Path> {
        self.tracker.path()
    }

    pub fn buffer_type(&self) -> BufferType {
        self.tracker.buffer_type()
    }

    /// Whether the document is bound to a path (present or missing)
    pub fn is_file(&self) -> bool {
        self.buffer_type().is_backed()
    }

    pub fn last_known_modified_time(&self) -> Option<SystemTime> {
        self.tracker.last_known_modified_time()
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    /// Report of the most recent successful load or reload
    pub fn last_load_report(&self) -> Option<&LoadReport> {
        self.last_load.as_ref()
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Content matches the bound file and the file exists.
    pub fn is_saved_to_disk(&self) -> bool {
        self.buffer_type() != BufferType::FileMissing && !self.buffer.is_dirty()
    }

    /// Write the buffer to its bound path.
    ///
    /// Saving a `FileMissing` document re-creates the file.
    #[instrument(skip(self), fields(file = ?self.path()), name = "document_save")]
    pub fn save(&mut self) -> Result<WriteOutcome> {
        let path = self
            .tracker
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::invalid_state("save", self.buffer_type()))?;

        let was_saved = self.is_saved_to_disk();
        self.emit(DocumentEvent::AboutToSave);

        let outcome = self.writer.write(self.buffer.raw_bytes(), &path)?;
        log::info!("Saved {} bytes to {}", outcome.bytes_written, path.display());

        self.bind(&path);
        self.mark_saved(was_saved);
        self.emit(DocumentEvent::Saved);
        Ok(outcome)
    }

    /// Write the buffer to `new_path` and bind the document to it.
    ///
    /// `Renamed` follows `Saved` when the effective path changed, which
    /// includes every save of a temporary document.
    #[instrument(skip(self), fields(from = ?self.path()), name = "document_save_as")]
    pub fn save_as(&mut self, new_path: &Path) -> Result<WriteOutcome> {
        let from = self.tracker.path().map(Path::to_path_buf);
        let was_saved = self.is_saved_to_disk();
        self.emit(DocumentEvent::AboutToSave);

        let outcome = self.writer.write(self.buffer.raw_bytes(), new_path)?;
        log::info!(
            "Saved {} bytes as {}",
            outcome.bytes_written,
            new_path.display()
        );

        let to = self.bind(new_path);
        self.mark_saved(was_saved);
        self.emit(DocumentEvent::Saved);
        if from.as_deref() != Some(to.as_path()) {
            self.emit(DocumentEvent::Renamed { from, to });
        }
        Ok(outcome)
    }

    /// Write the buffer to `path` leaving the document untouched.
    #[instrument(skip(self), name = "document_save_copy_as")]
    pub fn save_copy_as(&self, path: &Path) -> Result<WriteOutcome> {
        let outcome = self.writer.write(self.buffer.raw_bytes(), path)?;
        log::info!("Saved a copy to {}", path.display());
        Ok(outcome)
    }

    /// Move the document to `new_path`: write there, then delete the old file.
    ///
    /// Failing to delete the old file does not fail the rename; it comes
    /// back as [`RenameOutcome::cleanup_warning`]. A temporary document has
    /// no old file, so renaming it is a plain save-as.
    #[instrument(skip(self), fields(from = ?self.path()), name = "document_rename")]
    pub fn rename(&mut self, new_path: &Path) -> Result<RenameOutcome> {
        let old = self.tracker.path().map(Path::to_path_buf);

        let was_saved = self.is_saved_to_disk();
        self.emit(DocumentEvent::AboutToSave);

        let write = self.save_copy_as(new_path)?;

        let target = fs::canonicalize(new_path).unwrap_or_else(|_| new_path.to_path_buf());
        let cleanup_warning = match old.as_deref() {
            Some(old) if old != target.as_path() => match fs::remove_file(old) {
                Ok(()) => None,
                Err(e) => {
                    log::warn!("Could not remove old file {}: {}", old.display(), e);
                    Some(e)
                }
            },
            _ => None,
        };

        let to = self.bind(new_path);
        self.mark_saved(was_saved);
        self.emit(DocumentEvent::Saved);
        self.emit(DocumentEvent::Renamed { from: old, to });

        Ok(RenameOutcome {
            write,
            cleanup_warning,
        })
    }

    /// Replace the buffer content with the file's current content.
    ///
    /// If the fresh load fails and `restore_on_failed_reload` is set, the
    /// previous text is put back; the timestamp and save point stay as they
    /// were either way.
    #[instrument(skip(self), fields(file = ?self.path()), name = "document_reload")]
    pub fn reload(&mut self) -> Result<ReloadOutcome> {
        let path = match self.tracker.state() {
            TrackedState::File(binding) => binding.path.clone(),
            _ => return Err(Error::invalid_state("reload", self.buffer_type())),
        };

        if !path.exists() {
            log::info!("Not reloading {}: file is gone", path.display());
            return Ok(ReloadOutcome::Skipped);
        }

        let was_dirty = self.buffer.is_dirty();
        let previous = self
            .config
            .restore_on_failed_reload
            .then(|| self.buffer.raw_bytes().to_vec());

        {
            let mut buffer = SuspendGuard::new(&mut self.buffer);
            buffer.clear_all();
        }

        match load_file(&mut self.buffer, &path, &self.config) {
            Ok(report) => {
                self.buffer.empty_undo_buffer();
                self.tracker.refresh_modified_time();
                self.mark_saved(!was_dirty);
                self.last_load = Some(report.clone());
                log::info!("Reloaded {}", path.display());
                Ok(ReloadOutcome::Reloaded(report))
            }
            Err(e) => {
                log::warn!("Reload of {} failed: {}", path.display(), e);
                if let Some(previous) = previous {
                    let mut buffer = SuspendGuard::new(&mut self.buffer);
                    buffer.clear_all();
                    buffer.append_text(&String::from_utf8_lossy(&previous));
                    if !was_dirty {
                        buffer.set_save_point();
                    }
                }
                Err(e)
            }
        }
    }

    /// Send the bound file to the platform trash.
    ///
    /// Returns `Ok(false)` when there is no file to trash. The binding is
    /// not changed; the next state check reports the deletion.
    #[instrument(skip(self), fields(file = ?self.path()), name = "document_move_to_trash")]
    pub fn move_to_trash(&self) -> Result<bool> {
        let Some(path) = self.tracker.path() else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }

        trash::delete(path).map_err(|e| Error::trash_error(path, e.to_string()))?;
        log::info!("Moved {} to trash", path.display());
        Ok(true)
    }

    /// Poll the bound file for external changes.
    pub fn check_for_state_change(&mut self) -> FileStateChange {
        let change = self.tracker.check_for_state_change();
        if change == FileStateChange::Deleted {
            self.emit(DocumentEvent::SavePointChanged { saved: false });
        }
        if change != FileStateChange::NoChange {
            self.emit(DocumentEvent::StateChanged(change));
        }
        change
    }

    /// Poll only if the watcher has signalled since the last call.
    pub fn check_if_signalled(
        &mut self,
        events: &mut UnboundedReceiver<WatchEvent>,
    ) -> FileStateChange {
        let mut signalled = false;
        while let Ok(event) = events.try_recv() {
            log::trace!("watch event {:?}", event);
            signalled = true;
        }

        if signalled {
            self.check_for_state_change()
        } else {
            FileStateChange::NoChange
        }
    }

    /// Start a watcher on the bound file.
    ///
    /// `None` for temporary documents or when watching is disabled.
    pub fn watch(&self) -> Result<Option<(FileWatcher, UnboundedReceiver<WatchEvent>)>> {
        let Some(path) = self.tracker.path() else {
            return Ok(None);
        };
        if !self.config.watch.enabled {
            return Ok(None);
        }

        let (mut watcher, rx) = FileWatcher::new(path, self.config.watch.clone())?;
        watcher.start()?;
        Ok(Some((watcher, rx)))
    }

    /// Close the document and hand back its buffer.
    pub fn close(mut self) -> B {
        self.emit(DocumentEvent::Closed);
        log::debug!("Closed {}", self.name);
        self.buffer
    }

    /// Bind to `path`, refresh its timestamp and take its file name.
    fn bind(&mut self, path: &Path) -> PathBuf {
        self.tracker.rebind(path.to_path_buf());
        let bound = self
            .tracker
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.to_path_buf());
        if let Some(name) = bound.file_name() {
            self.name = name.to_string_lossy().into_owned();
        }
        bound
    }

    fn mark_saved(&mut self, was_saved: bool) {
        self.buffer.set_save_point();
        if !was_saved {
            self.emit(DocumentEvent::SavePointChanged { saved: true });
        }
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl<B: TextBuffer> std::fmt::Debug for Document<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("state", self.tracker.state())
            .field("dirty", &self.buffer.is_dirty())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
