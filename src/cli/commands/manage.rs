//! Archive, unarchive and delete commands.
//!
//! Each resolves a selector against one list and applies a single move.
//! There is no undo across invocations; the TUI keeps the undo window.

use crate::cli::{Cli, DeleteArgs, SelectArgs};
use crate::error::Result;
use crate::model::ListKind;
use crate::tracker::UndoCommand;

use super::{open_tracker, print_mutation};

/// Run the archive command.
pub fn archive(cli: &Cli, args: &SelectArgs) -> Result<()> {
    let (_config, mut tracker) = open_tracker(cli)?;
    let id = tracker.resolve(ListKind::Active, &args.selector)?;
    report(cli, tracker.archive(id)?)
}

/// Run the unarchive command.
pub fn unarchive(cli: &Cli, args: &SelectArgs) -> Result<()> {
    let (_config, mut tracker) = open_tracker(cli)?;
    let id = tracker.resolve(ListKind::Archived, &args.selector)?;
    report(cli, tracker.unarchive(id)?)
}

/// Run the delete command.
pub fn delete(cli: &Cli, args: &DeleteArgs) -> Result<()> {
    let kind = if args.archived {
        ListKind::Archived
    } else {
        ListKind::Active
    };
    let (_config, mut tracker) = open_tracker(cli)?;
    let id = tracker.resolve(kind, &args.selector)?;
    report(cli, tracker.delete(kind, id)?)
}

fn report(cli: &Cli, command: Option<UndoCommand>) -> Result<()> {
    match command {
        Some(command) => print_mutation(
            cli,
            command.verb(),
            &command.item,
            command.destination().unwrap_or(command.source()),
        ),
        None => Ok(()),
    }
}
