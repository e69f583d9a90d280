//! The browser-facing seam of the upload workflow.
//!
//! [`Portal`] is implemented over a live DevTools session by `naukri-browser`
//! and by scripted fakes in tests. Methods report "element not present" as
//! `Ok(false)` and reserve `Err` for transport failures.

use crate::Result;
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::time::Duration;

/// Profile page hosting the "Update resume" control
pub const PROFILE_URL: &str = "https://www.naukri.com/mnjuser/profile?id=&altresid";

/// Login form, opened directly to avoid dynamic redirects
pub const LOGIN_URL: &str = "https://www.naukri.com/nlogin/login";

pub const EMAIL_SELECTORS: &[&str] = &[
    r#"input[name="email"]"#,
    r#"input[name="emailId"]"#,
    "input#eLoginNew",
    r#"input[placeholder*="Email"]"#,
    r#"input[placeholder*="Username"]"#,
    r#"input[type="text"]"#,
];

pub const PASSWORD_SELECTORS: &[&str] = &[
    r#"input[name="password"]"#,
    "input#pwd1",
    r#"input[type="password"]"#,
];

pub const FILE_INPUT_SELECTORS: &[&str] = &[r#"input[type="file"]"#, "input[type=file]"];

#[async_trait]
pub trait Portal: Send {
    /// Navigate and wait for the load event
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Wait, up to `timeout`, for pending navigation to finish. Never fails.
    async fn settle(&mut self, timeout: Duration);

    /// Current rendered HTML
    async fn content(&mut self) -> Result<String>;

    /// Set `file` on the first matching file input, hidden or not
    async fn attach_via_input(&mut self, selectors: &[&str], file: &Path) -> Result<bool>;

    /// Click the button labelled `label` and feed `file` to the chooser it opens
    async fn attach_via_chooser(
        &mut self,
        label: &Regex,
        file: &Path,
        timeout: Duration,
    ) -> Result<bool>;

    /// Replace the value of the first matching input with `value`
    async fn fill_first(&mut self, selectors: &[&str], value: &str) -> Result<bool>;

    /// Click the first button or link whose label matches
    async fn click_button(&mut self, label: &Regex, timeout: Duration) -> Result<bool>;

    /// Press Enter in the focused element
    async fn press_enter(&mut self) -> Result<bool>;

    /// Wait up to `timeout` for a button whose label matches
    async fn has_button(&mut self, label: &Regex, timeout: Duration) -> Result<bool>;

    /// Persist the current cookie state
    async fn save_session(&mut self) -> Result<()>;
}
