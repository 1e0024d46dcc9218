//! Update command implementation.
//!
//! `check` reports whether a newer release exists. `download` fetches its
//! package after confirmation and can hand it to the system opener.

use std::io::{self, IsTerminal};
use std::time::Duration;

use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{Cli, UpdateAction, UpdateArgs};
use crate::error::{Result, TrackerError};
use crate::update::{UpdateChecker, UpdateStatus, CURRENT_VERSION};
use crate::util::format_bytes;
use crate::viewer::{Browser, SystemBrowser};

/// Run the update command.
pub fn run(cli: &Cli, args: &UpdateArgs) -> Result<()> {
    let config = cli.load_config()?;
    let checker = UpdateChecker::new(&config.update)?;

    match &args.action {
        UpdateAction::Check => {
            let status = checker.check(CURRENT_VERSION)?;
            print_status(cli, &status)
        }
        UpdateAction::Download { yes, dir, open } => {
            let status = checker.check(CURRENT_VERSION)?;
            let (latest, asset) = match &status {
                UpdateStatus::Available { latest, asset } => (latest, asset),
                UpdateStatus::MissingAsset { latest } => {
                    return Err(TrackerError::MissingAsset {
                        tag: latest.clone(),
                        suffix: config.update.asset_suffix.clone(),
                    })
                }
                UpdateStatus::UpToDate { .. } => return print_status(cli, &status),
            };

            if !*yes && !confirm(&format!("Download {} ({latest})?", asset.name))? {
                println!("Download cancelled.");
                return Ok(());
            }

            let dest_dir = match dir {
                Some(dir) => dir.clone(),
                None => config.download_dir()?,
            };
            let progress = DownloadProgress::new(cli.json, &asset.name);
            let path = checker.download(asset, &dest_dir, |done, total| {
                progress.update(done, total);
            })?;
            progress.finish();

            if cli.json {
                let value = serde_json::json!({
                    "status": "downloaded",
                    "latest": latest,
                    "path": path,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Downloaded {} to {}", asset.name, path.display());
            }

            if *open {
                SystemBrowser.open(&path.display().to_string())?;
            }
            Ok(())
        }
    }
}

fn print_status(cli: &Cli, status: &UpdateStatus) -> Result<()> {
    if cli.json {
        let value = match status {
            UpdateStatus::UpToDate { latest } => serde_json::json!({
                "status": "up_to_date",
                "current": CURRENT_VERSION,
                "latest": latest,
            }),
            UpdateStatus::Available { latest, asset } => serde_json::json!({
                "status": "available",
                "current": CURRENT_VERSION,
                "latest": latest,
                "asset": asset,
            }),
            UpdateStatus::MissingAsset { latest } => serde_json::json!({
                "status": "missing_asset",
                "current": CURRENT_VERSION,
                "latest": latest,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match status {
        UpdateStatus::UpToDate { latest } => {
            println!("Up to date (current {CURRENT_VERSION}, latest {latest}).");
        }
        UpdateStatus::Available { latest, asset } => {
            println!("Update available: {latest} (current {CURRENT_VERSION}).");
            match asset.size {
                Some(size) => println!("Package: {} ({})", asset.name, format_bytes(size)),
                None => println!("Package: {}", asset.name),
            }
            println!("Run 'cainiao update download' to fetch it.");
        }
        UpdateStatus::MissingAsset { latest } => {
            println!("Release {latest} is newer but has no downloadable package.");
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Err(TrackerError::invalid_argument(
            "--yes",
            "required when stdin is not a terminal",
        ));
    }

    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(true)
        .interact_opt()
        .map_err(|e| match e {
            dialoguer::Error::IO(err) if err.kind() == io::ErrorKind::Interrupted => {
                TrackerError::Interrupted
            }
            other => TrackerError::invalid_argument("confirmation", other.to_string()),
        })?;
    Ok(answer.unwrap_or(false))
}

/// Byte progress on stderr, hidden for JSON output or a non-terminal.
struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    fn new(json: bool, name: &str) -> Self {
        if json || !io::stderr().is_terminal() {
            return Self { bar: None };
        }
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(name.to_string());
        Self { bar: Some(bar) }
    }

    fn update(&self, done: u64, total: Option<u64>) {
        let Some(bar) = &self.bar else {
            return;
        };
        if let Some(total) = total {
            if bar.length() != Some(total) {
                bar.set_length(total);
                let style = ProgressStyle::with_template(
                    "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                bar.set_style(style.progress_chars("=> "));
            }
        }
        bar.set_position(done);
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
