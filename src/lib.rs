//! cainiao-tracker: track Cainiao parcels from the terminal.
//!
//! Keeps two ordered lists of parcels (active and archived) in a local
//! JSON store, opens Cainiao's public tracking page for a code, and checks
//! a GitHub repository for newer releases.
//!
//! # Quick Start
//!
//! ```rust
//! use cainiao_tracker::model::ListKind;
//! use cainiao_tracker::tracker::Tracker;
//!
//! fn main() -> cainiao_tracker::Result<()> {
//!     let mut tracker = Tracker::in_memory();
//!     let shoes = tracker.add("Shoes", "LP00123456789")?;
//!
//!     tracker.archive(shoes.id)?;
//!     assert_eq!(tracker.list(ListKind::Archived).len(), 1);
//!
//!     // The last archive/unarchive/delete can be undone once.
//!     tracker.undo()?;
//!     assert_eq!(tracker.list(ListKind::Active)[0].code, "LP00123456789");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`model`]: Parcel items, ids and list kinds
//! - [`store`]: Key-value persistence of the two lists
//! - [`tracker`]: List state manager, undo and filtering
//! - [`view`]: List projection used by the TUI and CLI
//! - [`viewer`]: Tracking page URLs, navigation policy and browser launch
//! - [`update`]: Release check and package download
//! - [`cli`]: Command-line interface
//! - [`tui`]: Terminal user interface
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling

#![doc(html_root_url = "https://docs.rs/cainiao-tracker/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod tracker;
pub mod tui;
pub mod update;
pub mod util;
pub mod view;
pub mod viewer;

// Re-export commonly used types at the crate root
pub use error::{Result, TrackerError};
pub use model::{ItemId, ListKind, TrackingItem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, TrackerError};
    pub use crate::model::{ItemId, ListKind, TrackingItem};
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore, Persistence};
    pub use crate::tracker::{Tracker, UndoCommand};
    pub use crate::update::{UpdateChecker, UpdateStatus};
    pub use crate::view::{ListView, ViewMode};
    pub use crate::viewer::{SystemBrowser, TrackingViewer};
}
