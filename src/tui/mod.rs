//! Terminal User Interface for cainiao-tracker.
//!
//! Two tabs over the same tracker:
//! - Home: active parcels, opened in the browser on Enter
//! - Archived: parcels set aside, unarchived with `x`
//!
//! Built with ratatui for cross-platform terminal support.

mod app;
mod components;
mod events;
mod state;
mod theme;

pub use app::{handle_key, run, KeyOutcome};
pub use events::KeyBindings;
pub use state::{AppState, InputMode, MessageKind, StatusMessage};
pub use theme::{available_themes, Theme};
