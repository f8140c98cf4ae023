//! The editing-buffer collaborator interface.
//!
//! docbind never implements the text data structure itself. It talks to an
//! editing widget through [`TextBuffer`], pushing decoded UTF-8 text in and
//! reading raw bytes back out. [`MemoryBuffer`] is a plain `String`-backed
//! implementation used by the CLI and the tests.

use std::ops::{Deref, DerefMut};

/// Health of the buffer after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferStatus {
    Ok,
    /// An allocation or bulk insert failed
    OutOfMemory,
    /// Any other collaborator-specific failure code
    Failure(i32),
}

/// Operations docbind needs from an editing buffer.
pub trait TextBuffer {
    /// Reserve storage for roughly `bytes` bytes. A hint, not a bound.
    fn allocate(&mut self, bytes: usize);

    /// Append already-decoded text at the end of the buffer.
    fn append_text(&mut self, text: &str);

    /// Remove all text.
    fn clear_all(&mut self);

    /// Enable or disable undo history recording.
    fn set_undo_collection(&mut self, enabled: bool);

    /// Whether undo history is currently being recorded.
    fn undo_collection(&self) -> bool;

    /// Enable or disable change-notification delivery.
    fn set_notifications(&mut self, enabled: bool);

    /// Whether change notifications are currently delivered.
    fn notifications(&self) -> bool;

    /// Drop all undo history.
    fn empty_undo_buffer(&mut self);

    /// Mark the current content as matching what is on disk.
    fn set_save_point(&mut self);

    /// Raw UTF-8 bytes of the whole buffer.
    fn raw_bytes(&self) -> &[u8];

    /// Whether content differs from the last save point.
    fn is_dirty(&self) -> bool;

    /// Status after the most recent mutation.
    fn status(&self) -> BufferStatus;
}

/// Scoped suspension of undo recording and change notifications.
///
/// Created around bulk mutations (loading, clearing). The previous flags are
/// restored when the guard drops, on every exit path including early error
/// returns and panics unwinding through the load.
pub struct SuspendGuard<'a, B: TextBuffer + ?Sized> {
    buffer: &'a mut B,
    undo_was: bool,
    notify_was: bool,
}

impl<'a, B: TextBuffer + ?Sized> SuspendGuard<'a, B> {
    /// Suspend undo collection and notifications on `buffer`
    pub fn new(buffer: &'a mut B) -> Self {
        let undo_was = buffer.undo_collection();
        let notify_was = buffer.notifications();
        buffer.set_undo_collection(false);
        buffer.set_notifications(false);
        log::trace!("buffer suspended (undo was {undo_was}, notify was {notify_was})");
        Self {
            buffer,
            undo_was,
            notify_was,
        }
    }
}

impl<B: TextBuffer + ?Sized> Deref for SuspendGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> DerefMut for SuspendGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> Drop for SuspendGuard<'_, B> {
    fn drop(&mut self) {
        self.buffer.set_notifications(self.notify_was);
        self.buffer.set_undo_collection(self.undo_was);
        log::trace!("buffer resumed");
    }
}

/// `String`-backed [`TextBuffer`].
///
/// The buffer is dirty whenever any mutation happened after the last save
/// point. An
/// optional capacity limit makes bulk inserts fail with
/// [`BufferStatus::OutOfMemory`], which is how tests exercise the loader's
/// buffer-error path.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    text: String,
    undo_enabled: bool,
    notify_enabled: bool,
    dirty: bool,
    status: BufferStatus,
    limit: Option<usize>,
    undo_steps: usize,
    notifications_sent: usize,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self {
            text: String::new(),
            undo_enabled: true,
            notify_enabled: true,
            dirty: false,
            status: BufferStatus::Ok,
            limit: None,
            undo_steps: 0,
            notifications_sent: 0,
        }
    }
}

impl MemoryBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text`, dirty (never saved)
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let dirty = !text.is_empty();
        Self {
            text,
            dirty,
            ..Self::default()
        }
    }

    /// Refuse to grow beyond `max_bytes`
    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        self.limit = Some(max_bytes);
        self
    }

    /// Current content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Simulate a user edit: inserts at the end, records undo, marks dirty.
    pub fn insert(&mut self, text: &str) {
        self.append_text(text);
    }

    /// Number of mutations recorded in undo history
    pub fn undo_steps(&self) -> usize {
        self.undo_steps
    }

    /// Number of change notifications delivered
    pub fn notifications_sent(&self) -> usize {
        self.notifications_sent
    }

    fn record_change(&mut self) {
        self.dirty = true;
        if self.undo_enabled {
            self.undo_steps += 1;
        }
        if self.notify_enabled {
            self.notifications_sent += 1;
        }
    }
}

impl TextBuffer for MemoryBuffer {
    fn allocate(&mut self, bytes: usize) {
        let wanted = self.limit.map_or(bytes, |limit| bytes.min(limit));
        self.text.reserve(wanted.saturating_sub(self.text.len()));
    }

    fn append_text(&mut self, text: &str) {
        if let Some(limit) = self.limit
            && self.text.len() + text.len() > limit
        {
            self.status = BufferStatus::OutOfMemory;
            return;
        }
        self.text.push_str(text);
        self.status = BufferStatus::Ok;
        self.record_change();
    }

    fn clear_all(&mut self) {
        self.text.clear();
        self.status = BufferStatus::Ok;
        self.record_change();
    }

    fn set_undo_collection(&mut self, enabled: bool) {
        self.undo_enabled = enabled;
    }

    fn undo_collection(&self) -> bool {
        self.undo_enabled
    }

    fn set_notifications(&mut self, enabled: bool) {
        self.notify_enabled = enabled;
    }

    fn notifications(&self) -> bool {
        self.notify_enabled
    }

    fn empty_undo_buffer(&mut self) {
        self.undo_steps = 0;
    }

    fn set_save_point(&mut self) {
        self.dirty = false;
    }

    fn raw_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn status(&self) -> BufferStatus {
        self.status
    }
}
