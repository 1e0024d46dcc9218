//! Open and url commands.
//!
//! `open` goes through the list view so archived parcels get the same
//! notice as in the TUI. `url` works on a bare code.

use crate::cli::{Cli, SelectArgs, UrlArgs};
use crate::error::Result;
use crate::model::ListKind;
use crate::view::{Activation, ListView, ViewMode};
use crate::viewer::{SystemBrowser, TrackingViewer};

use super::open_tracker;

/// Run the open command.
pub fn run(cli: &Cli, args: &SelectArgs) -> Result<()> {
    let (config, tracker) = open_tracker(cli)?;

    // Archived parcels are never opened; say why instead of "not found".
    let (mode, id) = match tracker.resolve(ListKind::Active, &args.selector) {
        Ok(id) => (ViewMode::Home, id),
        Err(active_err) => match tracker.resolve(ListKind::Archived, &args.selector) {
            Ok(id) if !is_position(&args.selector) => (ViewMode::Archived, id),
            _ => return Err(active_err),
        },
    };

    let snapshot = tracker.visible(mode.list_kind());
    let mut view = ListView::new(mode);
    view.replace(snapshot);
    if let Some(index) = view.rows().iter().position(|row| row.id == id) {
        view.select(index);
    }

    match view.activate() {
        Some(Activation::OpenTracking(code)) => {
            let viewer = TrackingViewer::new(&config.tracking, SystemBrowser);
            let url = viewer.open_code(&code)?;
            print_url(cli, &code, &url)
        }
        Some(Activation::Notice(notice)) => {
            println!("{notice}");
            Ok(())
        }
        None => Ok(()),
    }
}

/// Run the url command.
pub fn url(cli: &Cli, args: &UrlArgs) -> Result<()> {
    let config = cli.load_config()?;
    let viewer = TrackingViewer::new(&config.tracking, SystemBrowser);
    let url = if args.open {
        viewer.open_code(&args.code)?
    } else {
        viewer.url_for(&args.code)
    };
    print_url(cli, args.code.trim(), &url)
}

fn print_url(cli: &Cli, code: &str, url: &str) -> Result<()> {
    if cli.json {
        let value = serde_json::json!({ "code": code, "url": url });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{url}");
    }
    Ok(())
}

fn is_position(selector: &str) -> bool {
    selector.trim().parse::<usize>().is_ok()
}
