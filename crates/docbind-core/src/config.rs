//! Configuration types for document loading, saving and watching.
//!
//! Follows a builder pattern for complex configuration with validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default chunk size for streaming loads (4 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Largest chunk size accepted by validation (256 MiB)
pub const MAX_CHUNK_SIZE: usize = 256 * 1024 * 1024;

/// Encoding detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Run the statistical detector; when off, only BOM/UTF heuristics are used
    pub statistical: bool,
    /// Let the statistical detector answer UTF-8
    pub allow_utf8: bool,
    /// Top-level domain hint for the statistical detector (e.g. "jp", "ru")
    pub tld_hint: Option<String>,
    /// Encoding labels treated as having no decoder available
    pub disabled_encodings: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            statistical: true,
            allow_utf8: true,
            tld_hint: None,
            disabled_encodings: Vec::new(),
        }
    }
}

/// Atomic writer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WriteConfig {
    /// Write the target in place when a sibling temp file cannot be used
    pub direct_write_fallback: bool,
    /// Copy the existing target's permissions onto the replacement
    pub preserve_permissions: bool,
    /// fsync the temp file before it replaces the target
    pub sync_data: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            direct_write_fallback: false,
            preserve_permissions: true,
            sync_data: true,
        }
    }
}

/// File watcher settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether callers should attach a watcher to opened documents
    pub enabled: bool,
    /// Ignore events arriving within this many milliseconds of the last one
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
        }
    }
}

/// Top-level configuration for documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentConfig {
    /// Bytes read per chunk during a load
    pub chunk_size: usize,
    pub detection: DetectionConfig,
    pub write: WriteConfig,
    pub watch: WatchConfig,
    /// Put the previous content back if a reload fails after clearing
    pub restore_on_failed_reload: bool,
    /// Log level used by the CLI when RUST_LOG is not set
    pub log_level: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            detection: DetectionConfig::default(),
            write: WriteConfig::default(),
            watch: WatchConfig::default(),
            restore_on_failed_reload: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl DocumentConfig {
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a validated builder
    pub fn builder() -> DocumentConfigBuilder {
        DocumentConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config_error("chunk_size must be greater than zero"));
        }

        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::config_error(format!(
                "chunk_size {} exceeds the maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }

        if log::LevelFilter::from_str(&self.log_level).is_err() {
            return Err(Error::config_error(format!(
                "Unknown log level: {}",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Load configuration from a YAML file.
    ///
    /// A leading `~` is expanded. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_path(path);
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as YAML, replacing the file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let path = expand_path(path);
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(Error::io)?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(Error::io)?;
        temp.write_all(yaml.as_bytes()).map_err(Error::io)?;
        temp.persist(&path).map_err(|e| {
            Error::config_error(format!(
                "Failed to save config to {}: {}",
                path.display(),
                e.error
            ))
        })?;
        Ok(())
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Builder for DocumentConfig
pub struct DocumentConfigBuilder {
    config: DocumentConfig,
}

impl DocumentConfigBuilder {
    /// Create a new builder seeded with the defaults
    pub fn new() -> Self {
        Self {
            config: DocumentConfig::default(),
        }
    }

    /// Set the load chunk size
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Enable or disable the statistical detector
    pub fn statistical_detection(mut self, enabled: bool) -> Self {
        self.config.detection.statistical = enabled;
        self
    }

    /// Set the detector's top-level domain hint
    pub fn tld_hint(mut self, tld: impl Into<String>) -> Self {
        self.config.detection.tld_hint = Some(tld.into());
        self
    }

    /// Treat an encoding label as unavailable
    pub fn disable_encoding(mut self, label: impl Into<String>) -> Self {
        self.config.detection.disabled_encodings.push(label.into());
        self
    }

    /// Allow in-place writes when atomic replacement is impossible
    pub fn direct_write_fallback(mut self, allow: bool) -> Self {
        self.config.write.direct_write_fallback = allow;
        self
    }

    /// Toggle fsync before commit
    pub fn sync_data(mut self, sync: bool) -> Self {
        self.config.write.sync_data = sync;
        self
    }

    /// Toggle restoring the old content when a reload fails
    pub fn restore_on_failed_reload(mut self, restore: bool) -> Self {
        self.config.restore_on_failed_reload = restore;
        self
    }

    /// Set the log level name
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<DocumentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for DocumentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DocumentConfig::default();
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert!(config.detection.statistical);
        assert!(!config.write.direct_write_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        let config = DocumentConfig::builder()
            .chunk_size(16)
            .direct_write_fallback(true)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 16);
        assert!(config.write.direct_write_fallback);

        assert!(DocumentConfig::builder().chunk_size(0).build().is_err());
        assert!(
            DocumentConfig::builder()
                .chunk_size(MAX_CHUNK_SIZE + 1)
                .build()
                .is_err()
        );
        assert!(DocumentConfig::builder().log_level("LOUD").build().is_err());
    }

    #[test]
    fn test_yaml_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/docbind.yaml");

        let config = DocumentConfig::builder()
            .chunk_size(1024)
            .tld_hint("jp")
            .build()
            .unwrap();
        config.save(&path).unwrap();

        let loaded = DocumentConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = DocumentConfig::load(&temp.path().join("absent.yaml")).unwrap();
        assert_eq!(loaded, DocumentConfig::default());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.yaml");
        std::fs::write(&path, "chunk_size: 2048\nwrite:\n  direct_write_fallback: true\n").unwrap();

        let loaded = DocumentConfig::load(&path).unwrap();
        assert_eq!(loaded.chunk_size, 2048);
        assert!(loaded.write.direct_write_fallback);
        assert!(loaded.write.preserve_permissions);
        assert!(loaded.detection.statistical);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yaml");
        std::fs::write(&path, "chunk_size: 0\n").unwrap();
        assert!(matches!(
            DocumentConfig::load(&path),
            Err(Error::ConfigError { .. })
        ));
    }
}
