//! TUI application state.
//!
//! Holds the tracker, one list view per tab and the transient UI state
//! (input prompts, undo window, status line). All mutations go through the
//! tracker first; the views are then handed fresh snapshots.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::Config;
use crate::model::ListKind;
use crate::store::KeyValueStore;
use crate::tracker::{Tracker, UndoCommand};
use crate::update::UpdateStatus;
use crate::view::{Activation, ListView, RowAction, ViewMode};
use crate::viewer::{Browser, TrackingViewer};

use super::theme::Theme;

/// What the keyboard is currently feeding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal list navigation.
    #[default]
    Normal,
    /// Typing the filter query.
    Search,
    /// Add dialog, first field.
    AddName,
    /// Add dialog, second field.
    AddCode,
}

/// Tone of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Neutral information.
    Info,
    /// Something went wrong.
    Error,
}

/// One-shot status line message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Message text.
    pub text: String,
    /// Tone.
    pub kind: MessageKind,
}

/// Application state.
pub struct AppState<S: KeyValueStore, B: Browser> {
    tracker: Tracker<S>,
    viewer: TrackingViewer<B>,
    /// Home tab view.
    pub home: ListView,
    /// Archived tab view.
    pub archived: ListView,
    /// Visible tab.
    pub tab: ViewMode,
    /// Keyboard target.
    pub input_mode: InputMode,
    /// Name typed in the add dialog.
    pub add_name: String,
    /// Code typed in the add dialog.
    pub add_code: String,
    /// Show help overlay.
    pub show_help: bool,
    /// Last status message.
    pub status_message: Option<StatusMessage>,
    /// A release check is running.
    pub update_in_flight: bool,
    /// Current theme.
    pub theme: Theme,
    undo_window: Duration,
    undo_deadline: Option<Instant>,
}

impl<S: KeyValueStore, B: Browser> AppState<S, B> {
    /// Create app state around an opened tracker.
    pub fn new(tracker: Tracker<S>, viewer: TrackingViewer<B>, config: &Config, theme: Theme) -> Self {
        let mut state = Self {
            tracker,
            viewer,
            home: ListView::new(ViewMode::Home),
            archived: ListView::new(ViewMode::Archived),
            tab: ViewMode::Home,
            input_mode: InputMode::Normal,
            add_name: String::new(),
            add_code: String::new(),
            show_help: false,
            status_message: None,
            update_in_flight: false,
            theme,
            undo_window: Duration::from_secs(config.tui.undo_window_secs),
            undo_deadline: None,
        };
        state.refresh();
        state
    }

    /// The underlying tracker.
    pub fn tracker(&self) -> &Tracker<S> {
        &self.tracker
    }

    /// Hand both views a fresh filtered snapshot.
    pub fn refresh(&mut self) {
        self.home.replace(self.tracker.visible(ListKind::Active));
        self.archived.replace(self.tracker.visible(ListKind::Archived));
    }

    /// The view of the visible tab.
    pub fn current_view(&self) -> &ListView {
        match self.tab {
            ViewMode::Home => &self.home,
            ViewMode::Archived => &self.archived,
        }
    }

    /// The view of the visible tab, mutably.
    pub fn current_view_mut(&mut self) -> &mut ListView {
        match self.tab {
            ViewMode::Home => &mut self.home,
            ViewMode::Archived => &mut self.archived,
        }
    }

    /// Show the given tab.
    pub fn switch_tab(&mut self, tab: ViewMode) {
        self.tab = tab;
    }

    /// Show the other tab.
    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            ViewMode::Home => ViewMode::Archived,
            ViewMode::Archived => ViewMode::Home,
        };
    }

    /// Item counts per list, unfiltered.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.tracker.list(ListKind::Active).len(),
            self.tracker.list(ListKind::Archived).len(),
        )
    }

    /// Set an informational status message.
    pub fn info(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            kind: MessageKind::Info,
        });
    }

    /// Set an error status message.
    pub fn error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            kind: MessageKind::Error,
        });
    }

    /// Activate the selected row.
    pub fn activate_selected(&mut self) {
        match self.current_view().activate() {
            Some(Activation::OpenTracking(code)) => match self.viewer.open_code(&code) {
                Ok(_) => self.info(format!("Opened tracking page for {code}")),
                Err(e) => self.error(format!("Error: {e}")),
            },
            Some(Activation::Notice(notice)) => self.info(notice),
            None => {}
        }
    }

    /// Archive or unarchive the selected row.
    pub fn toggle_selected(&mut self, now: Instant) {
        if let Some(action) = self.current_view().toggle_action() {
            self.apply(action, now);
        }
    }

    /// Delete the selected row.
    pub fn delete_selected(&mut self, now: Instant) {
        if let Some(action) = self.current_view().delete_action() {
            self.apply(action, now);
        }
    }

    /// Apply a row action and open the undo window for it.
    pub fn apply(&mut self, action: RowAction, now: Instant) {
        let result = match action {
            RowAction::Archive(id) => self.tracker.archive(id),
            RowAction::Unarchive(id) => self.tracker.unarchive(id),
            RowAction::Delete(kind, id) => self.tracker.delete(kind, id),
        };

        match result {
            Ok(Some(command)) => {
                self.undo_deadline = Some(now + self.undo_window);
                self.info(format!("{} {}", command.item.name, command.verb()));
            }
            Ok(None) => debug!(?action, "Row action had no effect"),
            Err(e) => {
                warn!(error = %e, "Failed to persist lists");
                self.error(format!("Error: {e}"));
            }
        }
        self.refresh();
    }

    /// The action `u` would reverse, while the window is open.
    pub fn undo_available(&self, now: Instant) -> Option<&UndoCommand> {
        match self.undo_deadline {
            Some(deadline) if now < deadline => self.tracker.pending_undo(),
            _ => None,
        }
    }

    /// Seconds left in the undo window, rounded up.
    pub fn undo_seconds_left(&self, now: Instant) -> Option<u64> {
        self.undo_available(now)?;
        let left = self.undo_deadline?.saturating_duration_since(now);
        Some(left.as_secs() + u64::from(left.subsec_nanos() > 0))
    }

    /// Reverse the pending action if the window is still open.
    pub fn undo(&mut self, now: Instant) {
        if self.undo_available(now).is_none() {
            self.expire_undo();
            return;
        }
        self.undo_deadline = None;

        match self.tracker.undo() {
            Ok(Some(command)) => self.info(format!("Restored {}", command.item.name)),
            Ok(None) => {}
            Err(e) => self.error(format!("Error: {e}")),
        }
        self.refresh();
    }

    /// Close the undo window once its deadline passes.
    pub fn tick(&mut self, now: Instant) {
        if matches!(self.undo_deadline, Some(deadline) if now >= deadline) {
            self.expire_undo();
        }
    }

    fn expire_undo(&mut self) {
        self.undo_deadline = None;
        self.tracker.clear_undo();
    }

    /// Start typing a search query.
    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    /// Current filter text.
    pub fn query(&self) -> &str {
        self.tracker.query()
    }

    /// Append to the query and re-filter.
    pub fn search_input(&mut self, c: char) {
        let mut query = self.tracker.query().to_string();
        query.push(c);
        self.set_query(query);
    }

    /// Remove the last query character and re-filter.
    pub fn search_backspace(&mut self) {
        let mut query = self.tracker.query().to_string();
        query.pop();
        self.set_query(query);
    }

    /// Stop typing but keep the filter.
    pub fn confirm_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Clear the filter and stop typing.
    pub fn clear_search(&mut self) {
        self.set_query(String::new());
        self.input_mode = InputMode::Normal;
    }

    fn set_query(&mut self, query: String) {
        self.tracker.set_query(query);
        self.refresh();
    }

    /// Open the add dialog.
    pub fn start_add(&mut self) {
        self.add_name.clear();
        self.add_code.clear();
        self.input_mode = InputMode::AddName;
    }

    /// Type into the focused add field.
    pub fn add_input(&mut self, c: char) {
        match self.input_mode {
            InputMode::AddName => self.add_name.push(c),
            InputMode::AddCode => self.add_code.push(c),
            _ => {}
        }
    }

    /// Delete from the focused add field.
    pub fn add_backspace(&mut self) {
        match self.input_mode {
            InputMode::AddName => {
                self.add_name.pop();
            }
            InputMode::AddCode => {
                self.add_code.pop();
            }
            _ => {}
        }
    }

    /// Advance the add dialog: name, then code, then create the item.
    pub fn add_confirm(&mut self) {
        match self.input_mode {
            InputMode::AddName => {
                if self.add_name.trim().is_empty() {
                    self.error("Name must not be blank");
                } else {
                    self.input_mode = InputMode::AddCode;
                }
            }
            InputMode::AddCode => match self.tracker.add(&self.add_name, &self.add_code) {
                Ok(item) => {
                    self.input_mode = InputMode::Normal;
                    self.tab = ViewMode::Home;
                    self.info(format!("Added {}", item.name));
                    self.refresh();
                    self.home.select(0);
                }
                Err(e) => self.error(format!("Error: {e}")),
            },
            _ => {}
        }
    }

    /// Close the add dialog without adding.
    pub fn cancel_add(&mut self) {
        self.add_name.clear();
        self.add_code.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Record the outcome of a background release check.
    pub fn on_update_result(&mut self, result: Result<UpdateStatus, String>) {
        self.update_in_flight = false;
        match result {
            Ok(UpdateStatus::UpToDate { latest }) => {
                self.info(format!("Up to date (latest {latest})"));
            }
            Ok(UpdateStatus::Available { latest, asset }) => self.info(format!(
                "Update {latest} available ({}); run 'cainiao update download'",
                asset.name
            )),
            Ok(UpdateStatus::MissingAsset { latest }) => {
                self.error(format!("Release {latest} has no downloadable package"));
            }
            Err(e) => self.error(format!("Update check failed: {e}")),
        }
    }
}
