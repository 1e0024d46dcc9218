//! Pending undo as an explicit command value.
//!
//! Each mutation records what moved, from where and at which index. A single
//! [`apply_inverse`] reverses any of them, so the do and undo paths cannot
//! drift apart.

use serde::{Deserialize, Serialize};

use crate::model::{ListKind, TrackingItem};

/// What the reversible operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoKind {
    /// Moved from active to the front of archived.
    Archive,
    /// Moved from archived to the front of active.
    Unarchive,
    /// Removed from the given list.
    Delete(ListKind),
}

/// A reversible mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoCommand {
    /// Operation performed.
    pub kind: UndoKind,
    /// Item affected.
    pub item: TrackingItem,
    /// Index the item occupied in its source list.
    pub original_index: usize,
}

impl UndoCommand {
    /// List the item was taken from.
    #[must_use]
    pub const fn source(&self) -> ListKind {
        match self.kind {
            UndoKind::Archive => ListKind::Active,
            UndoKind::Unarchive => ListKind::Archived,
            UndoKind::Delete(kind) => kind,
        }
    }

    /// List the item was placed into, `None` for a delete.
    #[must_use]
    pub const fn destination(&self) -> Option<ListKind> {
        match self.kind {
            UndoKind::Archive => Some(ListKind::Archived),
            UndoKind::Unarchive => Some(ListKind::Active),
            UndoKind::Delete(_) => None,
        }
    }

    /// Short past-tense label for status messages.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self.kind {
            UndoKind::Archive => "archived",
            UndoKind::Unarchive => "unarchived",
            UndoKind::Delete(_) => "removed",
        }
    }
}

/// Mutable access to both lists by kind.
pub trait ListsMut {
    /// The list of the given kind.
    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<TrackingItem>;
}

/// Reverse `command` on `lists`.
///
/// The item is taken back out of its destination list (if it moved to one)
/// and re-inserted into its source list at the recorded index, clamped to the
/// current length. Returns `false` without touching anything if the item is
/// no longer where the command left it.
pub fn apply_inverse(lists: &mut impl ListsMut, command: &UndoCommand) -> bool {
    let id = command.item.id;

    let item = match command.destination() {
        Some(dest) => {
            let list = lists.list_mut(dest);
            let Some(pos) = list.iter().position(|i| i.id == id) else {
                return false;
            };
            list.remove(pos)
        }
        None => command.item.clone(),
    };

    let source = lists.list_mut(command.source());
    if source.iter().any(|i| i.id == id) {
        return false;
    }
    let index = command.original_index.min(source.len());
    source.insert(index, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pair {
        active: Vec<TrackingItem>,
        archived: Vec<TrackingItem>,
    }

    impl ListsMut for Pair {
        fn list_mut(&mut self, kind: ListKind) -> &mut Vec<TrackingItem> {
            match kind {
                ListKind::Active => &mut self.active,
                ListKind::Archived => &mut self.archived,
            }
        }
    }

    #[test]
    fn test_source_and_destination() {
        let item = TrackingItem::new("a", "1");
        let archive = UndoCommand { kind: UndoKind::Archive, item: item.clone(), original_index: 0 };
        assert_eq!(archive.source(), ListKind::Active);
        assert_eq!(archive.destination(), Some(ListKind::Archived));

        let delete = UndoCommand {
            kind: UndoKind::Delete(ListKind::Archived),
            item,
            original_index: 0,
        };
        assert_eq!(delete.source(), ListKind::Archived);
        assert_eq!(delete.destination(), None);
    }

    #[test]
    fn test_inverse_of_delete_reinserts_at_index() {
        let a = TrackingItem::new("a", "1");
        let b = TrackingItem::new("b", "2");
        let c = TrackingItem::new("c", "3");
        let mut lists = Pair { active: vec![a.clone(), c.clone()], ..Pair::default() };

        let command = UndoCommand {
            kind: UndoKind::Delete(ListKind::Active),
            item: b.clone(),
            original_index: 1,
        };
        assert!(apply_inverse(&mut lists, &command));
        assert_eq!(lists.active, vec![a, b, c]);
    }

    #[test]
    fn test_inverse_of_archive_moves_back() {
        let a = TrackingItem::new("a", "1");
        let b = TrackingItem::new("b", "2");
        let mut lists = Pair { active: vec![a.clone()], archived: vec![b.clone()] };

        let command = UndoCommand { kind: UndoKind::Archive, item: b.clone(), original_index: 1 };
        assert!(apply_inverse(&mut lists, &command));
        assert_eq!(lists.active, vec![a, b]);
        assert!(lists.archived.is_empty());
    }

    #[test]
    fn test_inverse_clamps_index() {
        let a = TrackingItem::new("a", "1");
        let mut lists = Pair::default();
        let command = UndoCommand {
            kind: UndoKind::Delete(ListKind::Active),
            item: a.clone(),
            original_index: 7,
        };
        assert!(apply_inverse(&mut lists, &command));
        assert_eq!(lists.active, vec![a]);
    }

    #[test]
    fn test_inverse_skips_when_item_moved_on() {
        let a = TrackingItem::new("a", "1");
        let mut lists = Pair::default();
        let command = UndoCommand { kind: UndoKind::Unarchive, item: a, original_index: 0 };
        assert!(!apply_inverse(&mut lists, &command));
        assert!(lists.archived.is_empty());
    }
}
