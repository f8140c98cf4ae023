//! # docbind core
//!
//! Error types, configuration, the shared data model and the buffer
//! collaborator interface for the docbind document-persistence layer.
//! Every other docbind crate depends on these types.
//!
//! ## Core Modules
//!
//! - [`error`] - The error taxonomy and `Result` alias
//! - [`config`] - Load/save/watch configuration with YAML persistence
//! - [`profiles`] - Pre-tuned configurations
//! - [`models`] - Buffer types, state changes, lifecycle events, load reports
//! - [`buffer`] - The [`TextBuffer`] trait, [`SuspendGuard`] and [`MemoryBuffer`]
//!
//! ## Usage Examples
//!
//! ### Bulk mutation without polluting undo history
//!
//! ```
//! use docbind_core::prelude::*;
//!
//! let mut buffer = MemoryBuffer::new();
//! {
//!     let mut guard = SuspendGuard::new(&mut buffer);
//!     guard.append_text("loaded from disk");
//! }
//! assert!(buffer.undo_collection());
//! assert_eq!(buffer.undo_steps(), 0);
//! ```
//!
//! ### Configuration
//!
//! ```
//! use docbind_core::prelude::*;
//!
//! let config = DocumentConfig::builder()
//!     .chunk_size(1024 * 1024)
//!     .direct_write_fallback(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.chunk_size, 1024 * 1024);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod models;
pub mod profiles;

pub use buffer::{BufferStatus, MemoryBuffer, SuspendGuard, TextBuffer};
pub use config::*;
pub use error::{Error, Result};
pub use models::*;
pub use profiles::ConfigProfile;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffer::{BufferStatus, MemoryBuffer, SuspendGuard, TextBuffer};
    pub use crate::config::{DetectionConfig, DocumentConfig, WatchConfig, WriteConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        BufferType, DetectionSource, DocumentEvent, FileStateChange, LoadReport,
    };
    pub use crate::profiles::ConfigProfile;
}
