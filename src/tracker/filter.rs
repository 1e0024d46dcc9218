//! Case-insensitive substring filter over name and code.

use crate::model::TrackingItem;

/// Return the items whose name or code contains `query`, ignoring case.
///
/// A blank query returns every item. Output order matches input order and
/// the input is never modified.
#[must_use]
pub fn filter(items: &[TrackingItem], query: &str) -> Vec<TrackingItem> {
    let query = query.trim();
    if query.is_empty() {
        return items.to_vec();
    }

    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| matches(item, &needle))
        .cloned()
        .collect()
}

/// Whether `item` matches an already-lowercased needle.
fn matches(item: &TrackingItem, needle: &str) -> bool {
    item.name.to_lowercase().contains(needle) || item.code.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shoes() -> Vec<TrackingItem> {
        vec![TrackingItem::new("Shoes", "AB12")]
    }

    #[test]
    fn test_empty_query_returns_input() {
        let items = vec![
            TrackingItem::new("Shoes", "AB12"),
            TrackingItem::new("Phone", "LP00"),
        ];
        assert_eq!(filter(&items, ""), items);
        assert_eq!(filter(&items, "   "), items);
    }

    #[test]
    fn test_code_match_is_case_insensitive() {
        let items = shoes();
        assert_eq!(filter(&items, "ab"), items);
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let items = shoes();
        assert_eq!(filter(&items, "SHO"), items);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter(&shoes(), "zz").is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let items = vec![
            TrackingItem::new("Blue shoes", "X1"),
            TrackingItem::new("Phone", "X2"),
            TrackingItem::new("Red shoes", "X3"),
        ];
        let names: Vec<_> = filter(&items, "shoes").into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Blue shoes", "Red shoes"]);
    }

    #[test]
    fn test_unicode_lowercasing() {
        let items = vec![TrackingItem::new("ÓCULOS", "BR1")];
        assert_eq!(filter(&items, "óculos").len(), 1);
    }
}
