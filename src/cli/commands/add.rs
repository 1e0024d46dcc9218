//! Add command implementation.

use crate::cli::{AddArgs, Cli};
use crate::error::Result;
use crate::model::ListKind;

use super::{open_tracker, print_mutation};

/// Run the add command.
pub fn run(cli: &Cli, args: &AddArgs) -> Result<()> {
    let (_config, mut tracker) = open_tracker(cli)?;
    let item = tracker.add(&args.name, &args.code)?;
    print_mutation(cli, "added", &item, ListKind::Active)
}
