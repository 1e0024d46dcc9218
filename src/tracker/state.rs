//! The tracking-list state manager.

use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::model::{ItemId, ListKind, TrackingItem};
use crate::store::{KeyValueStore, MemoryStore, Persistence};

use super::filter::filter;
use super::undo::{apply_inverse, ListsMut, UndoCommand, UndoKind};

/// Owns the active and archived lists for one session.
///
/// Each successful mutation rewrites both lists through the persistence
/// gateway. Operations on an id that is not present are silent no-ops and
/// do not write.
#[derive(Debug)]
pub struct Tracker<S: KeyValueStore = MemoryStore> {
    active: Vec<TrackingItem>,
    archived: Vec<TrackingItem>,
    query: String,
    pending_undo: Option<UndoCommand>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> ListsMut for Tracker<S> {
    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<TrackingItem> {
        match kind {
            ListKind::Active => &mut self.active,
            ListKind::Archived => &mut self.archived,
        }
    }
}

impl Tracker<MemoryStore> {
    /// A tracker backed by an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            active: Vec::new(),
            archived: Vec::new(),
            query: String::new(),
            pending_undo: None,
            persistence: Persistence::new(MemoryStore::new()),
        }
    }
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load both lists from `persistence`.
    ///
    /// Items stored without an id are given one, and that id is saved so
    /// later sessions see the same value.
    pub fn open(mut persistence: Persistence<S>) -> Result<Self> {
        let (active, archived) = persistence.load_and_assign_ids()?;
        Ok(Self {
            active,
            archived,
            query: String::new(),
            pending_undo: None,
            persistence,
        })
    }

    /// Replace the in-memory lists with what is stored.
    ///
    /// Drops any pending undo, since its indices refer to the old lists.
    pub fn reload(&mut self) -> Result<()> {
        let (active, archived) = self.persistence.load_and_assign_ids()?;
        self.active = active;
        self.archived = archived;
        self.pending_undo = None;
        Ok(())
    }

    /// The persistence gateway.
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Full list of the given kind, unfiltered.
    #[must_use]
    pub fn list(&self, kind: ListKind) -> &[TrackingItem] {
        match kind {
            ListKind::Active => &self.active,
            ListKind::Archived => &self.archived,
        }
    }

    /// Current filter text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Set the filter text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The list of the given kind after applying the current query.
    #[must_use]
    pub fn visible(&self, kind: ListKind) -> Vec<TrackingItem> {
        filter(self.list(kind), &self.query)
    }

    /// The action that the next [`undo`](Self::undo) would reverse.
    #[must_use]
    pub fn pending_undo(&self) -> Option<&UndoCommand> {
        self.pending_undo.as_ref()
    }

    /// Drop the pending undo, closing the undo window.
    pub fn clear_undo(&mut self) {
        self.pending_undo = None;
    }

    /// Add a new item at the front of the active list.
    ///
    /// Name and code are trimmed; either being blank is rejected and leaves
    /// the lists unchanged. Adding does not open an undo window.
    pub fn add(&mut self, name: &str, code: &str) -> Result<TrackingItem> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid_argument("name", "must not be blank"));
        }
        if code.is_empty() {
            return Err(TrackerError::invalid_argument("code", "must not be blank"));
        }

        let item = TrackingItem::new(name, code);
        self.active.insert(0, item.clone());
        debug!(id = %item.id, code = %item.code, "Added item");
        self.persist()?;
        Ok(item)
    }

    /// Move an item from active to the front of archived.
    pub fn archive(&mut self, id: ItemId) -> Result<Option<UndoCommand>> {
        self.transfer(id, UndoKind::Archive)
    }

    /// Move an item from archived to the front of active.
    pub fn unarchive(&mut self, id: ItemId) -> Result<Option<UndoCommand>> {
        self.transfer(id, UndoKind::Unarchive)
    }

    /// Remove an item from the given list.
    pub fn delete(&mut self, kind: ListKind, id: ItemId) -> Result<Option<UndoCommand>> {
        self.transfer(id, UndoKind::Delete(kind))
    }

    /// Reverse the pending action, if any.
    ///
    /// Returns the command that was reversed. Nothing is written when the
    /// item is no longer where the action left it.
    pub fn undo(&mut self) -> Result<Option<UndoCommand>> {
        let Some(command) = self.pending_undo.take() else {
            return Ok(None);
        };
        if !apply_inverse(self, &command) {
            debug!(id = %command.item.id, "Undo target moved, nothing to reverse");
            return Ok(None);
        }
        debug!(id = %command.item.id, kind = ?command.kind, "Undid action");
        self.persist()?;
        Ok(Some(command))
    }

    /// Resolve a user-typed selector against the visible list.
    ///
    /// A number is a 1-based position; anything else is an id prefix.
    pub fn resolve(&self, kind: ListKind, selector: &str) -> Result<ItemId> {
        let selector = selector.trim();
        let visible = self.visible(kind);

        if let Ok(position) = selector.parse::<usize>() {
            if let Some(item) = position.checked_sub(1).and_then(|i| visible.get(i)) {
                return Ok(item.id);
            }
        }

        let matches: Vec<_> = visible
            .iter()
            .filter(|item| item.id.matches_prefix(selector))
            .collect();
        match matches.as_slice() {
            [item] => Ok(item.id),
            [] => Err(TrackerError::ItemNotFound {
                selector: selector.to_string(),
            }),
            many => Err(TrackerError::AmbiguousSelector {
                selector: selector.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Look up an item by id in either list.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<(ListKind, &TrackingItem)> {
        [ListKind::Active, ListKind::Archived]
            .into_iter()
            .find_map(|kind| self.list(kind).iter().find(|i| i.id == id).map(|i| (kind, i)))
    }

    fn transfer(&mut self, id: ItemId, kind: UndoKind) -> Result<Option<UndoCommand>> {
        let source = match kind {
            UndoKind::Archive => ListKind::Active,
            UndoKind::Unarchive => ListKind::Archived,
            UndoKind::Delete(from) => from,
        };

        let list = self.list_mut(source);
        let Some(original_index) = list.iter().position(|i| i.id == id) else {
            debug!(%id, list = %source, "Item not present, ignoring");
            return Ok(None);
        };
        let item = list.remove(original_index);

        let command = UndoCommand {
            kind,
            item,
            original_index,
        };
        if let Some(dest) = command.destination() {
            self.list_mut(dest).insert(0, command.item.clone());
        }
        debug!(%id, kind = ?kind, original_index, "Applied action");

        // An unsaved move is rolled back, leaving nothing to undo.
        if let Err(e) = self.persist() {
            apply_inverse(self, &command);
            self.pending_undo = None;
            return Err(e);
        }
        self.pending_undo = Some(command.clone());
        Ok(Some(command))
    }

    fn persist(&mut self) -> Result<()> {
        self.persistence.save(&self.active, &self.archived)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker_with(names: &[&str]) -> Tracker {
        let mut tracker = Tracker::in_memory();
        // Added in reverse so the final order matches `names`.
        for name in names.iter().rev() {
            tracker.add(name, &format!("{name}-code")).unwrap();
        }
        tracker
    }

    fn names(items: &[TrackingItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_add_inserts_at_front() {
        let mut tracker = Tracker::in_memory();
        tracker.add("first", "1").unwrap();
        tracker.add("second", "2").unwrap();
        assert_eq!(names(tracker.list(ListKind::Active)), vec!["second", "first"]);
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let mut tracker = tracker_with(&["a"]);
        assert!(tracker.add("   ", "CODE").is_err());
        assert!(tracker.add("name", "").is_err());
        assert_eq!(tracker.list(ListKind::Active).len(), 1);
    }

    #[test]
    fn test_add_allows_duplicates() {
        let mut tracker = Tracker::in_memory();
        let first = tracker.add("Shoes", "AB12").unwrap();
        let second = tracker.add("Shoes", "AB12").unwrap();
        assert_ne!(first.id, second.id);

        tracker.delete(ListKind::Active, first.id).unwrap();
        let remaining = tracker.list(ListKind::Active);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }

    #[test]
    fn test_archive_moves_to_front_of_archived() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let b = tracker.list(ListKind::Active)[1].id;
        let c = tracker.list(ListKind::Active)[2].id;

        let command = tracker.archive(c).unwrap().unwrap();
        assert_eq!(command.original_index, 2);
        tracker.archive(b).unwrap();

        assert_eq!(names(tracker.list(ListKind::Active)), vec!["a"]);
        assert_eq!(names(tracker.list(ListKind::Archived)), vec!["b", "c"]);
    }

    #[test]
    fn test_archive_then_unarchive_lands_at_front() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let c = tracker.list(ListKind::Active)[2].id;

        tracker.archive(c).unwrap();
        tracker.unarchive(c).unwrap();

        assert_eq!(names(tracker.list(ListKind::Active)), vec!["c", "a", "b"]);
        assert!(tracker.list(ListKind::Archived).is_empty());
    }

    #[test]
    fn test_delete_then_undo_restores_exact_list() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let before = tracker.list(ListKind::Active).to_vec();
        let b = before[1].id;

        tracker.delete(ListKind::Active, b).unwrap();
        assert_eq!(names(tracker.list(ListKind::Active)), vec!["a", "c"]);

        let undone = tracker.undo().unwrap().unwrap();
        assert_eq!(undone.kind, UndoKind::Delete(ListKind::Active));
        assert_eq!(tracker.list(ListKind::Active), before.as_slice());
    }

    #[test]
    fn test_undo_archive_returns_to_original_index() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let before = tracker.list(ListKind::Active).to_vec();

        tracker.archive(before[1].id).unwrap();
        tracker.undo().unwrap();

        assert_eq!(tracker.list(ListKind::Active), before.as_slice());
        assert!(tracker.list(ListKind::Archived).is_empty());
    }

    #[test]
    fn test_undo_unarchive_returns_to_archived_index() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let ids: Vec<_> = tracker.list(ListKind::Active).iter().map(|i| i.id).collect();
        for id in &ids {
            tracker.archive(*id).unwrap();
        }
        // Archived is now c, b, a.
        let archived_before = tracker.list(ListKind::Archived).to_vec();

        tracker.unarchive(archived_before[1].id).unwrap();
        tracker.undo().unwrap();

        assert_eq!(tracker.list(ListKind::Archived), archived_before.as_slice());
        assert!(tracker.list(ListKind::Active).is_empty());
    }

    #[test]
    fn test_delete_from_archived() {
        let mut tracker = tracker_with(&["a"]);
        let a = tracker.list(ListKind::Active)[0].id;
        tracker.archive(a).unwrap();

        // Deleting from the wrong list is a no-op.
        assert!(tracker.delete(ListKind::Active, a).unwrap().is_none());
        assert!(tracker.delete(ListKind::Archived, a).unwrap().is_some());
        assert!(tracker.list(ListKind::Archived).is_empty());
    }

    #[test]
    fn test_repeated_delete_is_harmless() {
        let mut tracker = tracker_with(&["a", "b"]);
        let a = tracker.list(ListKind::Active)[0].id;

        assert!(tracker.delete(ListKind::Active, a).unwrap().is_some());
        assert!(tracker.delete(ListKind::Active, a).unwrap().is_none());
        assert_eq!(names(tracker.list(ListKind::Active)), vec!["b"]);
    }

    #[test]
    fn test_missing_item_keeps_pending_undo() {
        let mut tracker = tracker_with(&["a", "b"]);
        let a = tracker.list(ListKind::Active)[0].id;
        tracker.delete(ListKind::Active, a).unwrap();

        tracker.archive(ItemId::new()).unwrap();

        assert!(tracker.pending_undo().is_some());
    }

    #[test]
    fn test_new_action_replaces_undo_window() {
        let mut tracker = tracker_with(&["a", "b"]);
        let a = tracker.list(ListKind::Active)[0].id;
        let b = tracker.list(ListKind::Active)[1].id;

        tracker.delete(ListKind::Active, a).unwrap();
        tracker.archive(b).unwrap();
        let undone = tracker.undo().unwrap().unwrap();

        assert_eq!(undone.kind, UndoKind::Archive);
        assert!(tracker.undo().unwrap().is_none());
        assert_eq!(names(tracker.list(ListKind::Active)), vec!["b"]);
    }

    #[test]
    fn test_visible_uses_query() {
        let mut tracker = Tracker::in_memory();
        tracker.add("Shoes", "AB12").unwrap();
        tracker.add("Phone", "LP99").unwrap();

        tracker.set_query("ab");
        assert_eq!(names(&tracker.visible(ListKind::Active)), vec!["Shoes"]);

        tracker.set_query("");
        assert_eq!(tracker.visible(ListKind::Active).len(), 2);
    }

    #[test]
    fn test_resolve_by_position_and_prefix() {
        let tracker = tracker_with(&["a", "b"]);
        let b = tracker.list(ListKind::Active)[1].id;

        assert_eq!(tracker.resolve(ListKind::Active, "2").unwrap(), b);
        assert_eq!(tracker.resolve(ListKind::Active, &b.short()).unwrap(), b);
        assert!(matches!(
            tracker.resolve(ListKind::Active, "9"),
            Err(TrackerError::ItemNotFound { .. })
        ));
        assert!(tracker.resolve(ListKind::Archived, "1").is_err());
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut tracker = tracker_with(&["a", "b"]);
        let a = tracker.list(ListKind::Active)[0].id;
        tracker.archive(a).unwrap();

        let (active, archived) = tracker.persistence().load().unwrap();
        assert_eq!(names(&active), vec!["b"]);
        assert_eq!(names(&archived), vec!["a"]);
    }

    #[test]
    fn test_reload_discards_undo() {
        let mut tracker = tracker_with(&["a"]);
        let a = tracker.list(ListKind::Active)[0].id;
        tracker.delete(ListKind::Active, a).unwrap();

        tracker.reload().unwrap();

        assert!(tracker.pending_undo().is_none());
        assert!(tracker.list(ListKind::Active).is_empty());
    }

    #[test]
    fn test_get_reports_list() {
        let mut tracker = tracker_with(&["a"]);
        let a = tracker.list(ListKind::Active)[0].id;
        assert_eq!(tracker.get(a).map(|(k, _)| k), Some(ListKind::Active));
        tracker.archive(a).unwrap();
        assert_eq!(tracker.get(a).map(|(k, _)| k), Some(ListKind::Archived));
    }

    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<()> {
            if self.fail.get() {
                return Err(TrackerError::io("write failed", std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_save_rolls_back_and_drops_undo() {
        let fail = Rc::new(Cell::new(false));
        let store = FlakyStore {
            inner: MemoryStore::new(),
            fail: Rc::clone(&fail),
        };
        let mut tracker = Tracker::open(Persistence::new(store)).unwrap();
        tracker.add("b", "2").unwrap();
        tracker.add("a", "1").unwrap();
        let a = tracker.list(ListKind::Active)[0].id;
        let b = tracker.list(ListKind::Active)[1].id;
        tracker.archive(a).unwrap();
        assert!(tracker.pending_undo().is_some());

        fail.set(true);
        assert!(tracker.delete(ListKind::Active, b).is_err());

        assert_eq!(names(tracker.list(ListKind::Active)), vec!["b"]);
        assert_eq!(names(tracker.list(ListKind::Archived)), vec!["a"]);
        assert!(tracker.pending_undo().is_none());
        assert!(tracker.undo().unwrap().is_none());
    }
}
