//! Presentation adapter: a list view over an immutable snapshot.
//!
//! The view never owns or mutates tracker state. Callers hand it a fresh
//! snapshot after every mutation or query change via [`ListView::replace`],
//! and row interactions come back as [`RowAction`] / [`Activation`] values
//! for the caller to apply.

use crate::model::{ItemId, ListKind, TrackingItem};

/// Message shown when an archived row is activated.
pub const ARCHIVED_NOTICE: &str = "Unarchive the parcel to track it.";

/// Which list the view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Active parcels; rows can be opened and archived.
    #[default]
    Home,
    /// Archived parcels; rows can be unarchived.
    Archived,
}

impl ViewMode {
    /// The list this mode displays.
    #[must_use]
    pub const fn list_kind(self) -> ListKind {
        match self {
            Self::Home => ListKind::Active,
            Self::Archived => ListKind::Archived,
        }
    }

    /// Tab title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Archived => "Archived",
        }
    }

    /// Label of the per-row move affordance.
    #[must_use]
    pub const fn toggle_label(self) -> &'static str {
        match self {
            Self::Home => "archive",
            Self::Archived => "unarchive",
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Tracking code.
    pub code: String,
    /// Label of the archive/unarchive affordance.
    pub toggle_label: &'static str,
}

/// Result of activating (tapping) a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Open the tracking page for this code.
    OpenTracking(String),
    /// Show an informational message instead of navigating.
    Notice(&'static str),
}

/// A row-level mutation request for the caller to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Archive the item.
    Archive(ItemId),
    /// Unarchive the item.
    Unarchive(ItemId),
    /// Delete the item from the given list.
    Delete(ListKind, ItemId),
}

/// Scrollable list projection with a cursor.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    mode: ViewMode,
    items: Vec<TrackingItem>,
    selected: Option<usize>,
}

impl ListView {
    /// Create an empty view in the given mode.
    #[must_use]
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            selected: None,
        }
    }

    /// Display mode.
    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Replace the snapshot and re-render from scratch.
    ///
    /// The cursor stays on the same position, clamped to the new length.
    pub fn replace(&mut self, snapshot: Vec<TrackingItem>) {
        self.items = snapshot;
        self.selected = match (self.items.len(), self.selected) {
            (0, _) => None,
            (len, Some(i)) => Some(i.min(len - 1)),
            (_, None) => Some(0),
        };
    }

    /// Rows to draw, in snapshot order.
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        self.items
            .iter()
            .map(|item| Row {
                id: item.id,
                name: item.name.clone(),
                code: item.code.clone(),
                toggle_label: self.mode.toggle_label(),
            })
            .collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor position.
    #[must_use]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Item under the cursor.
    #[must_use]
    pub fn selected(&self) -> Option<&TrackingItem> {
        self.selected.and_then(|i| self.items.get(i))
    }

    /// Move the cursor to `index` if it is in range.
    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = Some(index);
        }
    }

    /// Move the cursor down one row.
    pub fn next(&mut self) {
        if let Some(selected) = self.selected {
            if selected + 1 < self.items.len() {
                self.selected = Some(selected + 1);
            }
        }
    }

    /// Move the cursor up one row.
    pub fn previous(&mut self) {
        if let Some(selected) = self.selected {
            if selected > 0 {
                self.selected = Some(selected - 1);
            }
        }
    }

    /// Activate the row under the cursor.
    #[must_use]
    pub fn activate(&self) -> Option<Activation> {
        let item = self.selected()?;
        Some(match self.mode {
            ViewMode::Home => Activation::OpenTracking(item.code.clone()),
            ViewMode::Archived => Activation::Notice(ARCHIVED_NOTICE),
        })
    }

    /// The archive/unarchive request for the row under the cursor.
    #[must_use]
    pub fn toggle_action(&self) -> Option<RowAction> {
        let id = self.selected()?.id;
        Some(match self.mode {
            ViewMode::Home => RowAction::Archive(id),
            ViewMode::Archived => RowAction::Unarchive(id),
        })
    }

    /// The delete request for the row under the cursor.
    #[must_use]
    pub fn delete_action(&self) -> Option<RowAction> {
        let id = self.selected()?.id;
        Some(RowAction::Delete(self.mode.list_kind(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: usize) -> Vec<TrackingItem> {
        (0..n)
            .map(|i| TrackingItem::new(format!("item {i}"), format!("CODE{i}")))
            .collect()
    }

    #[test]
    fn test_replace_selects_first_row() {
        let mut view = ListView::new(ViewMode::Home);
        assert!(view.selected().is_none());

        view.replace(snapshot(3));
        assert_eq!(view.selected_index(), Some(0));
        assert_eq!(view.rows().len(), 3);
    }

    #[test]
    fn test_replace_clamps_cursor() {
        let mut view = ListView::new(ViewMode::Home);
        view.replace(snapshot(3));
        view.select(2);

        view.replace(snapshot(2));
        assert_eq!(view.selected_index(), Some(1));

        view.replace(Vec::new());
        assert_eq!(view.selected_index(), None);
        assert!(view.activate().is_none());
    }

    #[test]
    fn test_cursor_bounds() {
        let mut view = ListView::new(ViewMode::Home);
        view.replace(snapshot(2));
        view.previous();
        assert_eq!(view.selected_index(), Some(0));
        view.next();
        view.next();
        assert_eq!(view.selected_index(), Some(1));
        view.select(5);
        assert_eq!(view.selected_index(), Some(1));
    }

    #[test]
    fn test_home_activation_opens_tracking() {
        let mut view = ListView::new(ViewMode::Home);
        view.replace(snapshot(1));
        assert_eq!(
            view.activate(),
            Some(Activation::OpenTracking("CODE0".to_string()))
        );
        assert!(matches!(view.toggle_action(), Some(RowAction::Archive(_))));
        assert_eq!(view.rows()[0].toggle_label, "archive");
    }

    #[test]
    fn test_archived_activation_shows_notice() {
        let mut view = ListView::new(ViewMode::Archived);
        let items = snapshot(1);
        let id = items[0].id;
        view.replace(items);

        assert_eq!(view.activate(), Some(Activation::Notice(ARCHIVED_NOTICE)));
        assert_eq!(view.toggle_action(), Some(RowAction::Unarchive(id)));
        assert_eq!(
            view.delete_action(),
            Some(RowAction::Delete(ListKind::Archived, id))
        );
    }
}
