//! File system watcher for a single document file.
//!
//! Push notifications only say "look again". Every event is a hint for the
//! owner to run [`FileStateTracker::check_for_state_change`]; the watcher
//! never changes document state itself.
//!
//! The parent directory is watched rather than the file, because an atomic
//! save replaces the file's inode and a watch on the old inode goes quiet.
//!
//! [`FileStateTracker::check_for_state_change`]: crate::tracker::FileStateTracker::check_for_state_change

use docbind_core::{Error, Result, WatchConfig};
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What happened to the watched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file appeared, including by being renamed into place
    Created,
    /// The file's content or metadata changed
    Modified,
    /// The file went away, including by being renamed elsewhere
    Removed,
}

/// Watches one file and reports changes over a channel.
pub struct FileWatcher {
    config: WatchConfig,
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    event_tx: UnboundedSender<WatchEvent>,
}

impl FileWatcher {
    /// Create a watcher for `path` and the receiver its events arrive on.
    ///
    /// Nothing is watched until [`start`](Self::start).
    pub fn new(
        path: impl Into<PathBuf>,
        config: WatchConfig,
    ) -> Result<(Self, UnboundedReceiver<WatchEvent>)> {
        let path = path.into();
        if path.file_name().is_none() {
            return Err(Error::watch_error(format!(
                "{} does not name a file",
                path.display()
            )));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            config,
            path,
            watcher: None,
            event_tx,
        };
        Ok((watcher, event_rx))
    }

    /// The watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching
    pub fn start(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Err(Error::watch_error("Watcher already started"));
        }

        let (dir, file_name) = self.split_path()?;
        let event_tx = self.event_tx.clone();
        let debounce = Duration::from_millis(self.config.debounce_ms);
        let mut last: Option<(WatchEvent, Instant)> = None;

        let mut notify_watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("watch error: {}", e);
                        return;
                    }
                };
                for watch_event in convert_event(&event, &file_name) {
                    // Bursts of the same kind collapse; a kind change always goes through.
                    let now = Instant::now();
                    if let Some((prev, at)) = last
                        && prev == watch_event
                        && now.duration_since(at) < debounce
                    {
                        continue;
                    }
                    last = Some((watch_event, now));
                    // Receiver may be gone; the document was closed.
                    let _ = event_tx.send(watch_event);
                }
            },
            Config::default(),
        )
        .map_err(|e| Error::watch_error(e.to_string()))?;

        notify_watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::watch_error(format!("cannot watch {}: {}", dir.display(), e)))?;

        log::debug!("Watching {}", self.path.display());
        self.watcher = Some(notify_watcher);
        Ok(())
    }

    /// Stop watching. Dropping the notify watcher ends its thread.
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            log::debug!("Stopped watching {}", self.path.display());
        }
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    fn split_path(&self) -> Result<(PathBuf, OsString)> {
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| Error::watch_error("path has no file name"))?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((dir, file_name))
    }
}

/// Map a raw notify event on the parent directory to events for `file_name`.
fn convert_event(event: &Event, file_name: &OsString) -> Vec<WatchEvent> {
    let is_target = |p: &PathBuf| p.file_name() == Some(file_name.as_os_str());

    match event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .filter(|p| is_target(p))
            .map(|_| WatchEvent::Created)
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .filter(|p| is_target(p))
            .map(|_| WatchEvent::Removed)
            .collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => {
            let mut events = Vec::new();
            match mode {
                RenameMode::From => {
                    if event.paths.iter().any(is_target) {
                        events.push(WatchEvent::Removed);
                    }
                }
                RenameMode::To => {
                    if event.paths.iter().any(is_target) {
                        events.push(WatchEvent::Created);
                    }
                }
                RenameMode::Both => {
                    if event.paths.first().is_some_and(is_target) {
                        events.push(WatchEvent::Removed);
                    }
                    if event.paths.get(1).is_some_and(is_target) {
                        events.push(WatchEvent::Created);
                    }
                }
                _ => {
                    if event.paths.iter().any(is_target) {
                        events.push(WatchEvent::Modified);
                    }
                }
            }
            events
        }
        EventKind::Modify(_) | EventKind::Any => event
            .paths
            .iter()
            .filter(|p| is_target(p))
            .map(|_| WatchEvent::Modified)
            .collect(),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn name(s: &str) -> OsString {
        OsString::from(s)
    }

    #[test]
    fn test_convert_filters_to_watched_file() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/docs/other.txt"))
            .add_path(PathBuf::from("/docs/notes.txt"));
        assert_eq!(
            convert_event(&event, &name("notes.txt")),
            vec![WatchEvent::Created]
        );
        assert!(convert_event(&event, &name("missing.txt")).is_empty());
    }

    #[test]
    fn test_convert_kinds() {
        let path = PathBuf::from("/docs/notes.txt");
        let modify = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.clone());
        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path.clone());
        let access = Event::new(EventKind::Access(AccessKind::Read)).add_path(path.clone());

        assert_eq!(convert_event(&modify, &name("notes.txt")), vec![WatchEvent::Modified]);
        assert_eq!(convert_event(&remove, &name("notes.txt")), vec![WatchEvent::Removed]);
        assert!(convert_event(&access, &name("notes.txt")).is_empty());
    }

    #[test]
    fn test_convert_atomic_replace_rename() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/docs/.notes.txt.abc123.tmp"))
            .add_path(PathBuf::from("/docs/notes.txt"));
        assert_eq!(
            convert_event(&event, &name("notes.txt")),
            vec![WatchEvent::Created]
        );

        let away = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from("/docs/notes.txt"));
        assert_eq!(convert_event(&away, &name("notes.txt")), vec![WatchEvent::Removed]);
    }

    #[test]
    fn test_start_stop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        fs::write(&path, "x").unwrap();

        let (mut watcher, _rx) = FileWatcher::new(&path, WatchConfig::default()).unwrap();
        assert!(!watcher.is_running());

        watcher.start().unwrap();
        assert!(watcher.is_running());
        assert!(watcher.start().is_err());

        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_missing_directory_fails_to_start() {
        let temp = TempDir::new().unwrap();
        let (mut watcher, _rx) =
            FileWatcher::new(temp.path().join("gone/doc.txt"), WatchConfig::default()).unwrap();
        assert!(matches!(watcher.start(), Err(Error::WatchError { .. })));
    }

    #[test]
    fn test_removal_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        fs::write(&path, "x").unwrap();

        let (mut watcher, mut rx) = FileWatcher::new(&path, WatchConfig::default()).unwrap();
        watcher.start().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        fs::remove_file(&path).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = false;
        while Instant::now() < deadline && !seen {
            while let Ok(event) = rx.try_recv() {
                seen |= event == WatchEvent::Removed;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(seen, "Did not receive Removed event");

        watcher.stop();
    }
}
