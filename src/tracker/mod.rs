//! Tracking-list state: the two ordered lists, their mutations, undo and
//! filtering.
//!
//! Data flows one way: an event mutates the [`Tracker`], the tracker writes
//! both lists through the store, and callers take a fresh filtered snapshot
//! with [`Tracker::visible`] to hand to a view.

pub mod filter;
pub mod state;
pub mod undo;

pub use filter::filter;
pub use state::Tracker;
pub use undo::{apply_inverse, UndoCommand, UndoKind};
