//! Pre-configured profiles for common editor setups
//!
//! - Desktop: interactive editor defaults with the file watcher on
//! - Strict: never writes in place, always fsyncs
//! - LargeFiles: bigger read chunks for multi-gigabyte logs
//! - Minimal: BOM/UTF heuristics only, no watcher, quiet logging

use crate::config::DocumentConfig;
use crate::error::{Error, Result};
use std::str::FromStr;

/// Profile selector for pre-configured setups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigProfile {
    /// Interactive editing on a local disk
    Desktop,
    /// Data-safety first: atomic replacement or nothing
    Strict,
    /// Tuned for very large files
    LargeFiles,
    /// Bare essentials only
    Minimal,
}

impl ConfigProfile {
    /// Create a DocumentConfig from this profile
    pub fn create_config(self) -> DocumentConfig {
        let mut config = DocumentConfig::new();

        match self {
            Self::Desktop => {
                config.log_level = "INFO".to_string();
                config.write.direct_write_fallback = false;
                config.watch.enabled = true;
            }

            Self::Strict => {
                config.log_level = "DEBUG".to_string();
                config.write.direct_write_fallback = false;
                config.write.sync_data = true;
                config.write.preserve_permissions = true;
                config.restore_on_failed_reload = true;
            }

            Self::LargeFiles => {
                config.log_level = "WARN".to_string();
                config.chunk_size = 16 * 1024 * 1024; // 16 MiB
                config.watch.debounce_ms = 500;
            }

            Self::Minimal => {
                config.log_level = "ERROR".to_string();
                config.detection.statistical = false;
                config.watch.enabled = false;
                config.write.sync_data = false;
            }
        }

        config
    }

    /// Recommend a profile based on file size in bytes
    pub fn recommend(file_size: u64) -> Self {
        match file_size {
            0..=67_108_864 => Self::Desktop,
            _ => Self::LargeFiles,
        }
    }

    /// Get profile name
    pub fn name(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Strict => "strict",
            Self::LargeFiles => "large-files",
            Self::Minimal => "minimal",
        }
    }

    /// Get profile description
    pub fn description(self) -> &'static str {
        match self {
            Self::Desktop => "Interactive editing with file watching",
            Self::Strict => "Atomic replacement only, fsync on every save",
            Self::LargeFiles => "16 MiB read chunks for very large files",
            Self::Minimal => "UTF heuristics only, no watcher",
        }
    }
}

impl std::fmt::Display for ConfigProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConfigProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "strict" => Ok(Self::Strict),
            "large-files" | "large" => Ok(Self::LargeFiles),
            "minimal" => Ok(Self::Minimal),
            other => Err(Error::config_error(format!("Unknown profile: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_profile() {
        let config = ConfigProfile::Desktop.create_config();
        assert_eq!(config.log_level, "INFO");
        assert!(!config.write.direct_write_fallback);
        assert!(config.watch.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recommended_profiles_never_write_in_place() {
        for size in [0, 1024, 64 * 1024 * 1024, 2 * 1024 * 1024 * 1024] {
            let config = ConfigProfile::recommend(size).create_config();
            assert!(!config.write.direct_write_fallback, "size {size}");
        }
    }

    #[test]
    fn test_strict_profile() {
        let config = ConfigProfile::Strict.create_config();
        assert!(!config.write.direct_write_fallback);
        assert!(config.write.sync_data);
    }

    #[test]
    fn test_large_files_profile() {
        let config = ConfigProfile::LargeFiles.create_config();
        assert_eq!(config.chunk_size, 16 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_profile() {
        let config = ConfigProfile::Minimal.create_config();
        assert_eq!(config.log_level, "ERROR");
        assert!(!config.detection.statistical);
        assert!(!config.watch.enabled);
    }

    #[test]
    fn test_recommend() {
        assert_eq!(ConfigProfile::recommend(1024), ConfigProfile::Desktop);
        assert_eq!(
            ConfigProfile::recommend(2 * 1024 * 1024 * 1024),
            ConfigProfile::LargeFiles
        );
    }

    #[test]
    fn test_profile_round_trips_through_name() {
        for profile in [
            ConfigProfile::Desktop,
            ConfigProfile::Strict,
            ConfigProfile::LargeFiles,
            ConfigProfile::Minimal,
        ] {
            assert_eq!(profile.name().parse::<ConfigProfile>().unwrap(), profile);
            assert!(!profile.description().is_empty());
        }
        assert!("turbo".parse::<ConfigProfile>().is_err());
    }
}
