//! TUI launcher command.
//!
//! Launches the interactive TUI interface.

use crate::cli::{Cli, TuiArgs};
use crate::error::Result;

use super::open_tracker;

/// Run the TUI command.
pub fn run(cli: &Cli, args: &TuiArgs) -> Result<()> {
    let (config, tracker) = open_tracker(cli)?;
    crate::tui::run(tracker, &config, args.theme.as_deref())
}
