//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod add;
pub mod config;
pub mod list;
pub mod manage;
pub mod open;
pub mod tui;
pub mod update;

use serde::Serialize;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::model::{ListKind, TrackingItem};
use crate::store::{FileStore, Persistence};
use crate::tracker::Tracker;

/// Load configuration and open the tracker on the selected store.
pub fn open_tracker(cli: &Cli) -> Result<(Config, Tracker<FileStore>)> {
    let config = cli.load_config()?;
    let path = cli.store_path(&config)?;
    let policy = config.storage.on_corrupt;
    let store = FileStore::open_with_policy(path, policy)?;
    let persistence = Persistence::new(store).with_policy(policy);
    let tracker = Tracker::open(persistence)?;
    Ok((config, tracker))
}

/// JSON shape of a listed parcel.
#[derive(Debug, Serialize)]
pub struct ItemOutput<'a> {
    /// 1-based position in the listed sequence.
    pub position: usize,
    /// List the parcel is in.
    pub list: ListKind,
    /// The parcel.
    #[serde(flatten)]
    pub item: &'a TrackingItem,
}

/// Print one-line confirmation or a JSON object for a mutation.
pub fn print_mutation(cli: &Cli, action: &str, item: &TrackingItem, list: ListKind) -> Result<()> {
    if cli.json {
        let value = serde_json::json!({
            "action": action,
            "list": list,
            "item": item,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {} ({}) [{}]", capitalize(action), item.name, item.code, item.id.short());
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("archived"), "Archived");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_item_output_flattens_item() {
        let item = TrackingItem::new("Shoes", "AB12");
        let output = ItemOutput {
            position: 1,
            list: ListKind::Active,
            item: &item,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["position"], 1);
        assert_eq!(value["list"], "active");
        assert_eq!(value["name"], "Shoes");
        assert_eq!(value["code"], "AB12");
    }
}
