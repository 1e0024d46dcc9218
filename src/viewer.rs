//! External tracking viewer.
//!
//! Builds the Cainiao detail-page URL for a code and opens it in the system
//! browser. Navigation is checked against a single allowed domain; links
//! outside it are handed to the default browser as external links, and
//! anything that is not an http(s) URL is refused.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use tracing::{debug, info};

use crate::config::TrackingConfig;
use crate::error::{Result, TrackerError};

/// Characters escaped in a query value: everything except RFC 3986 unreserved.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the tracking page URL for `code`.
///
/// ```
/// use cainiao_tracker::viewer::tracking_url;
///
/// assert_eq!(
///     tracking_url("https://global.cainiao.com/newDetail.htm", "LP00 1"),
///     "https://global.cainiao.com/newDetail.htm?mailNoList=LP00%201&otherMailNoList="
/// );
/// ```
#[must_use]
pub fn tracking_url(base_url: &str, code: &str) -> String {
    let encoded = utf8_percent_encode(code.trim(), QUERY_VALUE);
    format!("{base_url}?mailNoList={encoded}&otherMailNoList=")
}

/// Where a navigation request should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Inside the allowed domain.
    Stay,
    /// Outside the allowed domain; open in the default browser.
    External,
    /// Not a web URL; do not open.
    Reject,
}

/// Single-domain navigation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPolicy {
    allowed_domain: String,
}

impl NavigationPolicy {
    /// Allow `domain` and its subdomains.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            allowed_domain: domain.into().trim().trim_end_matches('.').to_ascii_lowercase(),
        }
    }

    /// Classify `url`.
    #[must_use]
    pub fn decide(&self, url: &str) -> Navigation {
        let Ok(parsed) = Url::parse(url) else {
            return Navigation::Reject;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return Navigation::Reject;
        }
        let Some(host) = parsed.host_str() else {
            return Navigation::Reject;
        };

        let host = host.to_ascii_lowercase();
        let inside = host == self.allowed_domain
            || host
                .strip_suffix(&self.allowed_domain)
                .is_some_and(|rest| rest.ends_with('.'));
        if inside {
            Navigation::Stay
        } else {
            Navigation::External
        }
    }
}

/// Something that can display a URL.
pub trait Browser {
    /// Open `url`.
    fn open(&self, url: &str) -> Result<()>;
}

/// The platform's default browser, launched detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let mut command = opener_command(url);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        spawn_reaped(&mut command)
            .map(|_| ())
            .map_err(|e| TrackerError::Browser {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Start `command` and wait for it on a background thread.
///
/// Spawn errors are returned directly; the opener's exit status is only
/// logged. Waiting keeps finished openers from lingering as zombies.
fn spawn_reaped(command: &mut Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || {
        let status = child.wait();
        match &status {
            Ok(status) if !status.success() => debug!(%status, "Opener exited with failure"),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Failed to wait for opener"),
        }
        status
    }))
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/c", "start", "", url]);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

/// Opens tracking pages for codes, enforcing the navigation policy.
#[derive(Debug, Clone)]
pub struct TrackingViewer<B> {
    base_url: String,
    policy: NavigationPolicy,
    browser: B,
}

impl<B: Browser> TrackingViewer<B> {
    /// Build a viewer from configuration.
    pub fn new(config: &TrackingConfig, browser: B) -> Self {
        Self {
            base_url: config.base_url.clone(),
            policy: NavigationPolicy::new(&config.allowed_domain),
            browser,
        }
    }

    /// URL that [`open_code`](Self::open_code) would open.
    #[must_use]
    pub fn url_for(&self, code: &str) -> String {
        tracking_url(&self.base_url, code)
    }

    /// Open the tracking page for `code`, returning the URL opened.
    pub fn open_code(&self, code: &str) -> Result<String> {
        let url = self.url_for(code);
        if self.policy.decide(&url) != Navigation::Stay {
            return Err(TrackerError::Browser {
                url,
                reason: "tracking page is outside the allowed domain".to_string(),
            });
        }
        info!(%url, "Opening tracking page");
        self.browser.open(&url)?;
        Ok(url)
    }

    /// Follow an arbitrary link according to the policy.
    pub fn follow(&self, url: &str) -> Result<Navigation> {
        let decision = self.policy.decide(url);
        match decision {
            Navigation::Stay => {
                debug!(url, "Following link inside allowed domain");
                self.browser.open(url)?;
            }
            Navigation::External => {
                info!(url, "Opening external link in default browser");
                self.browser.open(url)?;
            }
            Navigation::Reject => {
                return Err(TrackerError::Browser {
                    url: url.to_string(),
                    reason: "not an http(s) URL".to_string(),
                });
            }
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingBrowser {
        opened: RefCell<Vec<String>>,
    }

    impl Browser for &RecordingBrowser {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_tracking_url_template() {
        assert_eq!(
            tracking_url("https://global.cainiao.com/newDetail.htm", "LP00123"),
            "https://global.cainiao.com/newDetail.htm?mailNoList=LP00123&otherMailNoList="
        );
    }

    #[test]
    fn test_tracking_url_escapes_code() {
        let url = tracking_url("https://global.cainiao.com/newDetail.htm", "a&b=c");
        assert!(url.contains("mailNoList=a%26b%3Dc&"));
    }

    #[test]
    fn test_policy_allows_domain_and_subdomains() {
        let policy = NavigationPolicy::new("global.cainiao.com");
        assert_eq!(policy.decide("https://global.cainiao.com/x"), Navigation::Stay);
        assert_eq!(policy.decide("https://m.global.cainiao.com/"), Navigation::Stay);
        assert_eq!(policy.decide("https://GLOBAL.cainiao.com/"), Navigation::Stay);
    }

    #[test]
    fn test_policy_sends_other_hosts_out() {
        let policy = NavigationPolicy::new("global.cainiao.com");
        assert_eq!(policy.decide("https://example.com/"), Navigation::External);
        // Substring of the domain in another host is not inside it.
        assert_eq!(
            policy.decide("https://evilglobal.cainiao.com.example.net/"),
            Navigation::External
        );
        assert_eq!(
            policy.decide("https://example.com/?r=global.cainiao.com"),
            Navigation::External
        );
    }

    #[test]
    fn test_policy_rejects_non_web_urls() {
        let policy = NavigationPolicy::new("global.cainiao.com");
        assert_eq!(policy.decide("javascript:alert(1)"), Navigation::Reject);
        assert_eq!(policy.decide("file:///etc/passwd"), Navigation::Reject);
        assert_eq!(policy.decide("not a url"), Navigation::Reject);
    }

    #[test]
    fn test_open_code_uses_browser() {
        let browser = RecordingBrowser::default();
        let viewer = TrackingViewer::new(&TrackingConfig::default(), &browser);

        let url = viewer.open_code("AB12").unwrap();

        assert_eq!(*browser.opened.borrow(), vec![url]);
    }

    #[test]
    fn test_open_code_refuses_misconfigured_base() {
        let browser = RecordingBrowser::default();
        let config = TrackingConfig {
            base_url: "https://example.com/track".to_string(),
            ..TrackingConfig::default()
        };
        let viewer = TrackingViewer::new(&config, &browser);

        assert!(viewer.open_code("AB12").is_err());
        assert!(browser.opened.borrow().is_empty());
    }

    #[test]
    fn test_follow_routes_by_policy() {
        let browser = RecordingBrowser::default();
        let viewer = TrackingViewer::new(&TrackingConfig::default(), &browser);

        assert_eq!(viewer.follow("https://example.com/").unwrap(), Navigation::External);
        assert!(viewer.follow("mailto:x@example.com").is_err());
        assert_eq!(browser.opened.borrow().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_opener_is_waited_for() {
        let handle = spawn_reaped(&mut Command::new("true")).unwrap();
        let status = handle.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_missing_opener_is_a_spawn_error() {
        let result = spawn_reaped(&mut Command::new("cainiao-no-such-opener"));
        assert!(result.is_err());
    }
}
