//! Release check and manual package download.
//!
//! Polls the latest-release endpoint of a GitHub repository, compares its tag
//! against the running version and, on request, downloads the first asset
//! whose name ends with the configured package suffix. Network calls are
//! blocking; interactive callers run them on a worker thread.

use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::UpdateConfig;
use crate::error::{Result, TrackerError};
use crate::util::atomic_write_with;

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dot-separated numeric version.
///
/// Comparison pads the shorter version with zeros, so `2.0` equals `2.0.0`.
#[derive(Debug, Clone)]
pub struct Version(Vec<u64>);

impl Version {
    /// Numeric components as parsed.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for Version {
    type Err = TrackerError;

    /// Accepts an optional `v`/`V` prefix and ignores any `-pre` or `+build`
    /// suffix. Every remaining component must be a decimal number.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TrackerError::InvalidVersion {
            version: s.to_string(),
        };

        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = trimmed.split(['-', '+']).next().unwrap_or_default();
        if core.is_empty() {
            return Err(invalid());
        }

        core.split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Whether `new` is strictly newer than `current`.
pub fn is_version_greater(new: &str, current: &str) -> Result<bool> {
    Ok(new.parse::<Version>()? > current.parse::<Version>()?)
}

/// A downloadable release asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
    /// Size in bytes, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Release metadata as returned by the releases API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Tag, e.g. `v1.2.0`.
    pub tag_name: String,
    /// Attached files.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Release page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl Release {
    /// First asset whose name ends with `suffix`.
    #[must_use]
    pub fn package_asset(&self, suffix: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name.ends_with(suffix))
    }
}

/// Outcome of a release check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Running the latest (or a newer) version.
    UpToDate {
        /// Latest published tag.
        latest: String,
    },
    /// A newer release with a matching package exists.
    Available {
        /// Latest published tag.
        latest: String,
        /// Package to download.
        asset: Asset,
    },
    /// A newer release exists but has no matching package.
    MissingAsset {
        /// Latest published tag.
        latest: String,
    },
}

/// Client for the releases API.
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    client: Client,
    endpoint: String,
    asset_suffix: String,
}

impl UpdateChecker {
    /// Build a checker from configuration.
    pub fn new(config: &UpdateConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TrackerError::network("Failed to build HTTP client", e))?;
        Ok(Self::from_client(
            client,
            config.latest_release_url(),
            config.asset_suffix.clone(),
        ))
    }

    /// Build a checker around an existing client and endpoint.
    pub fn from_client(
        client: Client,
        endpoint: impl Into<String>,
        asset_suffix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            asset_suffix: asset_suffix.into(),
        }
    }

    /// Fetch the latest release metadata.
    pub fn latest_release(&self) -> Result<Release> {
        debug!(endpoint = %self.endpoint, "Fetching latest release");
        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()
            .map_err(|e| TrackerError::network("Release check failed", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TrackerError::Http {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        response
            .json::<Release>()
            .map_err(|e| TrackerError::network("Invalid release metadata", e))
    }

    /// Compare the latest release against `current`.
    pub fn check(&self, current: &str) -> Result<UpdateStatus> {
        let release = self.latest_release()?;
        let latest = release.tag_name.clone();

        if !is_version_greater(&latest, current)? {
            info!(%latest, current, "Already on the latest version");
            return Ok(UpdateStatus::UpToDate { latest });
        }

        match release.package_asset(&self.asset_suffix) {
            Some(asset) => {
                info!(%latest, asset = %asset.name, "Update available");
                Ok(UpdateStatus::Available {
                    latest,
                    asset: asset.clone(),
                })
            }
            None => {
                warn!(%latest, suffix = %self.asset_suffix, "Release has no matching package");
                Ok(UpdateStatus::MissingAsset { latest })
            }
        }
    }

    /// Download `asset` into `dest_dir`, returning the written file.
    ///
    /// `on_progress` receives `(downloaded, total)` after each chunk. The file
    /// is written atomically; an empty download is an error and leaves no file.
    pub fn download<F>(&self, asset: &Asset, dest_dir: &Path, mut on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(u64, Option<u64>),
    {
        let file_name = Path::new(&asset.name)
            .file_name()
            .ok_or_else(|| TrackerError::download(format!("invalid asset name '{}'", asset.name)))?;
        let dest = dest_dir.join(file_name);

        info!(url = %asset.browser_download_url, dest = %dest.display(), "Downloading package");
        let mut response = self
            .client
            .get(&asset.browser_download_url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .map_err(|e| TrackerError::network("Download failed", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TrackerError::Http {
                status: status.as_u16(),
                url: asset.browser_download_url.clone(),
            });
        }

        let total = response.content_length().or(asset.size);
        let mut downloaded = 0_u64;
        let written = atomic_write_with(&dest, |writer| {
            let mut buffer = [0_u8; 8192];
            loop {
                let read = response.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                writer.write_all(&buffer[..read])?;
                downloaded += read as u64;
                on_progress(downloaded, total);
            }
            // Failing here drops the temp file, so an existing package survives.
            if downloaded == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty download"));
            }
            Ok(())
        });

        match written {
            Ok(()) => {}
            Err(TrackerError::IoError { source, .. })
                if downloaded == 0 && source.kind() == io::ErrorKind::UnexpectedEof =>
            {
                return Err(TrackerError::download("the downloaded file is empty"));
            }
            Err(e) => return Err(e),
        }

        info!(bytes = downloaded, dest = %dest.display(), "Download complete");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("v1.2.0", "1.1.9", true)]
    #[case("2.0", "1.9.9", true)]
    #[case("1.0.0", "1.0.0", false)]
    #[case("1.0", "1.0.0", false)]
    #[case("1.0.1", "1.0", true)]
    #[case("1.9", "1.10", false)]
    #[case("V3", "2.99.99", true)]
    #[case("1.2.0-beta", "1.1.0", true)]
    fn test_is_version_greater(#[case] new: &str, #[case] current: &str, #[case] expected: bool) {
        assert_eq!(is_version_greater(new, current).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("v")]
    #[case("1..2")]
    #[case("one.two")]
    fn test_invalid_versions(#[case] version: &str) {
        assert!(matches!(
            version.parse::<Version>(),
            Err(TrackerError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_version_display_and_equality() {
        let a: Version = "v2.0".parse().unwrap();
        let b: Version = "2.0.0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2.0");
    }

    fn release(assets: &[&str]) -> Release {
        Release {
            tag_name: "v9.9.9".to_string(),
            assets: assets
                .iter()
                .map(|name| Asset {
                    name: (*name).to_string(),
                    browser_download_url: format!("https://example.invalid/{name}"),
                    size: None,
                })
                .collect(),
            html_url: None,
        }
    }

    #[test]
    fn test_package_asset_picks_first_match() {
        let release = release(&["notes.txt", "app-release.apk", "app-debug.apk"]);
        assert_eq!(release.package_asset(".apk").unwrap().name, "app-release.apk");
        assert!(release.package_asset(".deb").is_none());
    }

    #[test]
    fn test_release_ignores_unknown_fields() {
        let json = r#"{
            "tag_name": "v1.3.0",
            "name": "Release 1.3.0",
            "draft": false,
            "assets": [{"name": "app.apk", "browser_download_url": "https://x/app.apk", "size": 42, "id": 7}]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.3.0");
        assert_eq!(release.assets[0].size, Some(42));
    }

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status: &str, content_type: &str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        let content_type = content_type.to_string();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });

        format!("http://{addr}/")
    }

    fn checker(endpoint: String) -> UpdateChecker {
        let client = Client::builder().no_proxy().build().unwrap();
        UpdateChecker::from_client(client, endpoint, ".apk")
    }

    #[test]
    fn test_check_reports_available_update() {
        let body = br#"{"tag_name":"v1.2.0","assets":[{"name":"app.apk","browser_download_url":"https://x/app.apk"}]}"#;
        let endpoint = serve_once("200 OK", "application/json", body.to_vec());

        let status = checker(endpoint).check("1.1.9").unwrap();

        match status {
            UpdateStatus::Available { latest, asset } => {
                assert_eq!(latest, "v1.2.0");
                assert_eq!(asset.name, "app.apk");
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_check_up_to_date() {
        let body = br#"{"tag_name":"1.0.0","assets":[]}"#;
        let endpoint = serve_once("200 OK", "application/json", body.to_vec());

        let status = checker(endpoint).check("1.0.0").unwrap();

        assert_eq!(status, UpdateStatus::UpToDate { latest: "1.0.0".to_string() });
    }

    #[test]
    fn test_check_missing_asset() {
        let body = br#"{"tag_name":"5.0","assets":[{"name":"src.zip","browser_download_url":"https://x/src.zip"}]}"#;
        let endpoint = serve_once("200 OK", "application/json", body.to_vec());

        let status = checker(endpoint).check("1.0").unwrap();

        assert_eq!(status, UpdateStatus::MissingAsset { latest: "5.0".to_string() });
    }

    #[test]
    fn test_check_surfaces_http_status() {
        let endpoint = serve_once("404 Not Found", "application/json", b"{}".to_vec());

        let err = checker(endpoint).check("1.0").unwrap_err();

        assert!(matches!(err, TrackerError::Http { status: 404, .. }));
    }

    #[test]
    fn test_download_writes_file_and_reports_progress() {
        let payload = vec![7_u8; 20_000];
        let url = serve_once("200 OK", "application/octet-stream", payload.clone());
        let dir = tempfile::tempdir().unwrap();
        let asset = Asset {
            name: "app.apk".to_string(),
            browser_download_url: url,
            size: None,
        };

        let mut last = (0, None);
        let path = checker(String::new())
            .download(&asset, dir.path(), |done, total| last = (done, total))
            .unwrap();

        assert_eq!(path, dir.path().join("app.apk"));
        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert_eq!(last, (20_000, Some(20_000)));
    }

    #[test]
    fn test_empty_download_is_an_error() {
        let url = serve_once("200 OK", "application/octet-stream", Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let asset = Asset {
            name: "app.apk".to_string(),
            browser_download_url: url,
            size: None,
        };

        let err = checker(String::new())
            .download(&asset, dir.path(), |_, _| {})
            .unwrap_err();

        assert!(matches!(err, TrackerError::Download { .. }));
        assert!(!dir.path().join("app.apk").exists());
    }

    #[test]
    fn test_empty_download_keeps_previous_package() {
        let url = serve_once("200 OK", "application/octet-stream", Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let previous = dir.path().join("app.apk");
        std::fs::write(&previous, b"previous package").unwrap();
        let asset = Asset {
            name: "app.apk".to_string(),
            browser_download_url: url,
            size: None,
        };

        let err = checker(String::new())
            .download(&asset, dir.path(), |_, _| {})
            .unwrap_err();

        assert!(matches!(err, TrackerError::Download { .. }));
        assert_eq!(std::fs::read(&previous).unwrap(), b"previous package");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
