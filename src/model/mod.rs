//! Data model for tracked parcels.
//!
//! A [`TrackingItem`] is a display name plus a Cainiao tracking code. Each item
//! also carries a synthetic [`ItemId`] so that two entries with the same name
//! and code stay distinguishable in every list operation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned to an item when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used for display in lists.
    #[must_use]
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }

    /// Whether this id starts with `prefix`, ignoring case and hyphens.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let wanted: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        !wanted.is_empty() && self.0.simple().to_string().starts_with(&wanted)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parcel being tracked.
///
/// Field order on the wire is `name`, `code`, then the fields added later.
/// Lists written before `id` and `added_at` existed still decode: a missing
/// id is replaced by a fresh one and a missing timestamp stays `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingItem {
    /// Display name chosen by the user.
    #[serde(default)]
    pub name: String,
    /// Tracking code as entered.
    #[serde(default)]
    pub code: String,
    /// Synthetic identifier.
    #[serde(default)]
    pub id: ItemId,
    /// When the item was added, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl TrackingItem {
    /// Create a new item with a fresh id, stamped with the current time.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            id: ItemId::new(),
            added_at: Some(Utc::now()),
        }
    }
}

/// Which of the two persisted sequences an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Parcels currently being tracked.
    Active,
    /// Parcels set aside but not deleted.
    Archived,
}

impl ListKind {
    /// The other list.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Active => Self::Archived,
            Self::Archived => Self::Active,
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_order() {
        let item = TrackingItem::new("Shoes", "AB12");
        let json = serde_json::to_string(&item).unwrap();
        let name_at = json.find("\"name\"").unwrap();
        let code_at = json.find("\"code\"").unwrap();
        let id_at = json.find("\"id\"").unwrap();
        assert!(name_at < code_at);
        assert!(code_at < id_at);
    }

    #[test]
    fn test_legacy_item_without_id_decodes() {
        let items: Vec<TrackingItem> =
            serde_json::from_str(r#"[{"name":"Shoes","code":"AB12"},{"name":"Shoes","code":"AB12"}]"#)
                .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Shoes");
        assert!(items[0].added_at.is_none());
        // Legacy duplicates become distinguishable once loaded.
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let item: TrackingItem = serde_json::from_str("{}").unwrap();
        assert!(item.name.is_empty());
        assert!(item.code.is_empty());
    }

    #[test]
    fn test_id_prefix_matching() {
        let id = ItemId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.matches_prefix(&short));
        assert!(id.matches_prefix(&short.to_uppercase()));
        assert!(id.matches_prefix(&id.to_string()));
        assert!(!id.matches_prefix(""));
    }

    #[test]
    fn test_list_kind_other() {
        assert_eq!(ListKind::Active.other(), ListKind::Archived);
        assert_eq!(ListKind::Archived.other(), ListKind::Active);
    }
}
