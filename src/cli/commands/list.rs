//! List command implementation.
//!
//! Prints the active or archived parcels, optionally filtered by a query.

use std::io::Write;

use crate::cli::{Cli, ListArgs};
use crate::error::Result;
use crate::model::{ListKind, TrackingItem};
use crate::tracker::filter;
use crate::util::truncate_display;

use super::{open_tracker, ItemOutput};

/// Widest name shown before truncation.
const NAME_WIDTH: usize = 32;

/// Run the list command.
pub fn run(cli: &Cli, args: &ListArgs) -> Result<()> {
    let (_config, tracker) = open_tracker(cli)?;
    let kind = if args.archived {
        ListKind::Archived
    } else {
        ListKind::Active
    };

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    write_list(
        &mut writer,
        tracker.list(kind),
        kind,
        args.query.as_deref().unwrap_or_default(),
        cli.json,
        args.full_ids,
    )
}

/// Render `items` filtered by `query`.
///
/// Positions always refer to the unfiltered list so they can be passed back
/// as selectors.
fn write_list<W: Write>(
    writer: &mut W,
    items: &[TrackingItem],
    kind: ListKind,
    query: &str,
    json: bool,
    full_ids: bool,
) -> Result<()> {
    let shown = filter(items, query);
    let rows: Vec<ItemOutput<'_>> = shown
        .iter()
        .filter_map(|item| {
            let position = items.iter().position(|i| i.id == item.id)? + 1;
            Some(ItemOutput {
                position,
                list: kind,
                item,
            })
        })
        .collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    if rows.is_empty() {
        if query.trim().is_empty() {
            writeln!(writer, "No {kind} parcels.")?;
        } else {
            writeln!(writer, "No {kind} parcels match '{}'.", query.trim())?;
        }
        return Ok(());
    }

    let title = match kind {
        ListKind::Active => "Active",
        ListKind::Archived => "Archived",
    };
    writeln!(writer, "{title} parcels ({} shown):", rows.len())?;
    writeln!(writer)?;

    for row in &rows {
        let id = if full_ids {
            row.item.id.to_string()
        } else {
            row.item.id.short()
        };
        writeln!(
            writer,
            "  {:>3}  {}  {:<width$}  {}",
            row.position,
            id,
            truncate_display(&row.item.name, NAME_WIDTH),
            row.item.code,
            width = NAME_WIDTH
        )?;
    }

    Ok(())
}
