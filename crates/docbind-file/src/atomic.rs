//! All-or-nothing file replacement.
//!
//! Bytes go to a temp file next to the target, are flushed (and optionally
//! fsynced), take over the target's permissions, and then replace the target
//! in one rename. A reader of the target sees either the old bytes or the
//! new bytes, never a mix.
//!
//! Saving is split into two steps, [`AtomicWriter::stage`] and
//! [`StagedWrite::commit`], so the window between them can be observed.
//! Dropping a staged write removes the temp file and leaves the target as it
//! was.

use docbind_core::{Error, Result, WriteConfig};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Result of a completed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes now in the target
    pub bytes_written: u64,
    /// The target was written in place rather than replaced
    pub direct_fallback: bool,
}

/// A fully written temp file waiting to replace its target.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
    bytes: u64,
}

impl StagedWrite {
    /// Path of the temp file holding the new content
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// File that [`commit`](Self::commit) will replace
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace the target with the staged bytes.
    pub fn commit(self) -> Result<WriteOutcome> {
        let bytes = self.bytes;
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| Error::write_error(&target, e.error))?;

        log::debug!("Committed {} bytes to {}", bytes, target.display());
        Ok(WriteOutcome {
            bytes_written: bytes,
            direct_fallback: false,
        })
    }
}

/// Writer that replaces files atomically.
#[derive(Debug, Clone, Default)]
pub struct AtomicWriter {
    config: WriteConfig,
}

impl AtomicWriter {
    pub fn new(config: WriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// Replace `target` with `bytes`.
    ///
    /// When the temp file cannot be created or renamed into place because of
    /// permissions or a device boundary, and `direct_write_fallback` is on,
    /// the target is truncated and written in place instead. That path is
    /// not atomic and is reported through [`WriteOutcome::direct_fallback`].
    pub fn write(&self, bytes: &[u8], target: &Path) -> Result<WriteOutcome> {
        let target = resolve_target(target);
        self.replace(bytes, &target)
            .or_else(|e| self.fall_back_or(e, bytes, &target))
    }

    fn replace(&self, bytes: &[u8], target: &Path) -> io::Result<WriteOutcome> {
        let staged = self.stage_resolved(bytes, target.to_path_buf())?;
        let len = staged.bytes;
        // On failure the temp file is dropped (and deleted) with the PersistError.
        staged.temp.persist(target).map_err(|e| e.error)?;

        log::debug!("Committed {} bytes to {}", len, target.display());
        Ok(WriteOutcome {
            bytes_written: len,
            direct_fallback: false,
        })
    }

    /// Write `bytes` to a temp file beside `target` without touching it.
    pub fn stage(&self, bytes: &[u8], target: &Path) -> Result<StagedWrite> {
        let target = resolve_target(target);
        self.stage_resolved(bytes, target.clone())
            .map_err(|e| Error::write_error(target, e))
    }

    fn stage_resolved(&self, bytes: &[u8], target: PathBuf) -> io::Result<StagedWrite> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let prefix = temp_prefix(&target);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".tmp");
        // New files get the usual 0666 & !umask instead of tempfile's 0600.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }

        let mut temp = builder.tempfile_in(&parent)?;
        temp.write_all(bytes)?;
        temp.flush()?;
        if self.config.sync_data {
            temp.as_file().sync_all()?;
        }

        if self.config.preserve_permissions
            && let Ok(metadata) = fs::metadata(&target)
        {
            temp.as_file().set_permissions(metadata.permissions())?;
        }

        log::trace!(
            "Staged {} bytes for {} in {}",
            bytes.len(),
            target.display(),
            temp.path().display()
        );

        Ok(StagedWrite {
            temp,
            target,
            bytes: bytes.len() as u64,
        })
    }

    fn fall_back_or(&self, err: io::Error, bytes: &[u8], target: &Path) -> Result<WriteOutcome> {
        if !self.config.direct_write_fallback || !allows_direct_fallback(&err) {
            log::warn!("Atomic write to {} failed: {}", target.display(), err);
            return Err(Error::write_error(target, err));
        }

        log::warn!(
            "Atomic write to {} impossible ({}), writing in place",
            target.display(),
            err
        );
        self.write_direct(bytes, target)
            .map_err(|e| Error::write_error(target, e))?;

        Ok(WriteOutcome {
            bytes_written: bytes.len() as u64,
            direct_fallback: true,
        })
    }

    fn write_direct(&self, bytes: &[u8], target: &Path) -> io::Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(target)?;
        file.write_all(bytes)?;
        if self.config.sync_data {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Errors for which an in-place write can still succeed.
fn allows_direct_fallback(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::CrossesDevices
    )
}

/// Writes through a symbolic link land on the file it points at.
fn resolve_target(target: &Path) -> PathBuf {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf())
        }
        _ => target.to_path_buf(),
    }
}

fn temp_prefix(target: &Path) -> String {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "docbind".to_string());
    format!(".{name}.")
}
