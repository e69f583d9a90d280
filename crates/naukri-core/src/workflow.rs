//! Upload, login fallback and confirmation polling.
//!
//! The sequence is strictly linear. Every browser step is best-effort: a
//! failed step is logged and the next strategy is tried, so the run always
//! ends in an [`UploadOutcome`] rather than an error.

use crate::indicators::{self, LOGIN_LABEL, UPDATE_RESUME_LABEL};
use crate::portal::{
    EMAIL_SELECTORS, FILE_INPUT_SELECTORS, LOGIN_URL, PASSWORD_SELECTORS, PROFILE_URL, Portal,
};
use crate::{Credentials, UploadOutcome};
use std::path::Path;
use std::time::Duration;

/// Timeouts and polling used by a run
#[derive(Debug, Clone)]
pub struct AttemptPolicy {
    pub navigation_timeout: Duration,
    pub chooser_timeout: Duration,
    /// Wait for the page to go quiet after the file is attached
    pub upload_settle: Duration,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    pub login_click_timeout: Duration,
    pub login_settle: Duration,
    /// Wait for the upload button when confirming a login
    pub login_probe: Duration,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            chooser_timeout: Duration::from_secs(10),
            upload_settle: Duration::from_secs(15),
            poll_attempts: 10,
            poll_interval: Duration::from_secs(1),
            login_click_timeout: Duration::from_secs(5),
            login_settle: Duration::from_secs(15),
            login_probe: Duration::from_secs(5),
        }
    }
}

impl AttemptPolicy {
    /// Lighter profile for probing several headless engines in a row
    pub fn quick() -> Self {
        Self {
            chooser_timeout: Duration::from_secs(8),
            upload_settle: Duration::from_secs(10),
            poll_attempts: 5,
            ..Self::default()
        }
    }
}

/// Result of the form login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    /// Email or password field missing
    FormNotFound,
    /// No submit button and Enter could not be sent
    SubmitFailed,
    /// Portal asked for a one-time password
    OtpRequired,
    /// Form submitted but the profile never showed a logged-in marker
    NotConfirmed,
}

/// How the resume reached the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMethod {
    FileInput,
    FileChooser,
}

pub struct UploadWorkflow<'a, P: Portal> {
    portal: &'a mut P,
    credentials: Option<&'a Credentials>,
    policy: AttemptPolicy,
}

impl<'a, P: Portal> UploadWorkflow<'a, P> {
    pub fn new(portal: &'a mut P) -> Self {
        Self {
            portal,
            credentials: None,
            policy: AttemptPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<&'a Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_policy(mut self, policy: AttemptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Upload `resume` and report whether the portal confirmed it
    pub async fn run(&mut self, resume: &Path) -> UploadOutcome {
        tracing::info!("Opening profile page...");
        self.open_profile().await;

        let mut attached = self.attach(resume).await;

        if attached.is_none() {
            if let Some(credentials) = self.credentials {
                tracing::info!("Could not find upload controls; attempting credential login...");
                let login = self.login(credentials).await;
                if login == LoginOutcome::LoggedIn {
                    if let Err(e) = self.portal.save_session().await {
                        tracing::warn!("Could not save session: {}", e);
                    }
                    tracing::info!("Retrying upload after login...");
                    self.open_profile().await;
                    attached = self.attach(resume).await;
                } else {
                    tracing::warn!("Login did not complete: {:?}", login);
                }
            }
        }

        let Some(method) = attached else {
            tracing::error!(
                "Could not access upload controls. You may need to re-run setup or the site layout changed."
            );
            return UploadOutcome::ControlsUnavailable;
        };

        tracing::debug!("Resume attached via {:?}", method);
        if self.verify().await {
            tracing::info!("Resume upload appears to have succeeded.");
            UploadOutcome::Uploaded
        } else {
            tracing::warn!("Could not confirm success from the page. Please verify manually.");
            UploadOutcome::Unconfirmed
        }
    }

    /// Fill and submit the login form, then confirm on the profile page
    pub async fn login(&mut self, credentials: &Credentials) -> LoginOutcome {
        if let Err(e) = self.portal.open(LOGIN_URL).await {
            tracing::warn!("Could not open login page: {}", e);
        }

        if !self.fill(EMAIL_SELECTORS, &credentials.username).await {
            return LoginOutcome::FormNotFound;
        }
        if !self.fill(PASSWORD_SELECTORS, &credentials.password).await {
            return LoginOutcome::FormNotFound;
        }

        if !self.submit_login().await {
            return LoginOutcome::SubmitFailed;
        }

        self.portal.settle(self.policy.login_settle).await;

        let content = self.portal.content().await.unwrap_or_default();
        if indicators::requires_otp(&content) {
            tracing::warn!("Portal requested an OTP; cannot continue non-interactively");
            return LoginOutcome::OtpRequired;
        }

        self.open_profile().await;

        match self
            .portal
            .has_button(&UPDATE_RESUME_LABEL, self.policy.login_probe)
            .await
        {
            Ok(true) => return LoginOutcome::LoggedIn,
            Ok(false) => {}
            Err(e) => tracing::debug!("Upload button probe failed: {}", e),
        }

        let content = self.portal.content().await.unwrap_or_default();
        if indicators::shows_logout(&content) {
            LoginOutcome::LoggedIn
        } else {
            LoginOutcome::NotConfirmed
        }
    }

    async fn open_profile(&mut self) {
        let navigation = tokio::time::timeout(
            self.policy.navigation_timeout,
            self.portal.open(PROFILE_URL),
        )
        .await;

        match navigation {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Could not open profile page: {}", e),
            Err(_) => tracing::warn!(
                "Profile page did not load within {}s",
                self.policy.navigation_timeout.as_secs()
            ),
        }
    }

    async fn attach(&mut self, resume: &Path) -> Option<AttachMethod> {
        tracing::info!("Attempting to set the file on the hidden input...");
        match self
            .portal
            .attach_via_input(FILE_INPUT_SELECTORS, resume)
            .await
        {
            Ok(true) => return Some(AttachMethod::FileInput),
            Ok(false) => {}
            Err(e) => tracing::debug!("File input attach failed: {}", e),
        }

        tracing::info!("Falling back to clicking the Update resume button and using file chooser...");
        match self
            .portal
            .attach_via_chooser(&UPDATE_RESUME_LABEL, resume, self.policy.chooser_timeout)
            .await
        {
            Ok(true) => Some(AttachMethod::FileChooser),
            Ok(false) => None,
            Err(e) => {
                tracing::debug!("File chooser attach failed: {}", e);
                None
            }
        }
    }

    async fn fill(&mut self, selectors: &[&str], value: &str) -> bool {
        match self.portal.fill_first(selectors, value).await {
            Ok(filled) => filled,
            Err(e) => {
                tracing::debug!("Filling {:?} failed: {}", selectors.first(), e);
                false
            }
        }
    }

    async fn submit_login(&mut self) -> bool {
        match self
            .portal
            .click_button(&LOGIN_LABEL, self.policy.login_click_timeout)
            .await
        {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => tracing::debug!("Login button click failed: {}", e),
        }

        tracing::debug!("No login button; pressing Enter in the password field");
        self.portal.press_enter().await.unwrap_or(false)
    }

    /// Scan once after the page settles, then poll for a success marker
    async fn verify(&mut self) -> bool {
        self.portal.settle(self.policy.upload_settle).await;

        if self.page_shows_success().await {
            return true;
        }

        for attempt in 1..=self.policy.poll_attempts {
            tracing::debug!(
                "Waiting for upload confirmation ({}/{})",
                attempt,
                self.policy.poll_attempts
            );
            if self.page_shows_success().await {
                return true;
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }

        false
    }

    async fn page_shows_success(&mut self) -> bool {
        match self.portal.content().await {
            Ok(html) => indicators::shows_upload_success(&html),
            Err(e) => {
                tracing::debug!("Could not read page content: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use regex::Regex;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    /// Portal whose answers are scripted up front
    #[derive(Default)]
    struct ScriptedPortal {
        input_results: VecDeque<bool>,
        chooser_results: VecDeque<bool>,
        fill_results: VecDeque<bool>,
        login_button: bool,
        enter_works: bool,
        upload_button_after_login: bool,
        pages: VecDeque<String>,
        last_page: String,
        opened: Vec<String>,
        filled: Vec<String>,
        attached: Vec<PathBuf>,
        saves: usize,
        fail_save: bool,
    }

    impl ScriptedPortal {
        fn with_pages(mut self, pages: &[&str]) -> Self {
            self.pages = pages.iter().map(|p| p.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl Portal for ScriptedPortal {
        async fn open(&mut self, url: &str) -> Result<()> {
            self.opened.push(url.to_string());
            Ok(())
        }

        async fn settle(&mut self, _timeout: Duration) {}

        async fn content(&mut self) -> Result<String> {
            if let Some(page) = self.pages.pop_front() {
                self.last_page = page;
            }
            Ok(self.last_page.clone())
        }

        async fn attach_via_input(&mut self, _selectors: &[&str], file: &Path) -> Result<bool> {
            let ok = self.input_results.pop_front().unwrap_or(false);
            if ok {
                self.attached.push(file.to_path_buf());
            }
            Ok(ok)
        }

        async fn attach_via_chooser(
            &mut self,
            _label: &Regex,
            file: &Path,
            _timeout: Duration,
        ) -> Result<bool> {
            match self.chooser_results.pop_front() {
                Some(true) => {
                    self.attached.push(file.to_path_buf());
                    Ok(true)
                }
                Some(false) => Ok(false),
                None => Err(Error::Portal("chooser never opened".to_string())),
            }
        }

        async fn fill_first(&mut self, _selectors: &[&str], value: &str) -> Result<bool> {
            let ok = self.fill_results.pop_front().unwrap_or(false);
            if ok {
                self.filled.push(value.to_string());
            }
            Ok(ok)
        }

        async fn click_button(&mut self, _label: &Regex, _timeout: Duration) -> Result<bool> {
            Ok(self.login_button)
        }

        async fn press_enter(&mut self) -> Result<bool> {
            Ok(self.enter_works)
        }

        async fn has_button(&mut self, _label: &Regex, _timeout: Duration) -> Result<bool> {
            Ok(self.upload_button_after_login)
        }

        async fn save_session(&mut self) -> Result<()> {
            self.saves += 1;
            if self.fail_save {
                return Err(Error::Portal("disk full".to_string()));
            }
            Ok(())
        }
    }

    fn fast_policy() -> AttemptPolicy {
        AttemptPolicy {
            poll_attempts: 3,
            poll_interval: Duration::from_millis(1),
            ..AttemptPolicy::default()
        }
    }

    fn creds() -> Credentials {
        Credentials::new("me@example.com", "secret")
    }

    #[tokio::test]
    async fn test_direct_input_upload_confirmed() {
        let mut portal = ScriptedPortal {
            input_results: VecDeque::from([true]),
            ..Default::default()
        }
        .with_pages(&["<p>Resume uploaded successfully</p>"]);

        let outcome = UploadWorkflow::new(&mut portal)
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(portal.opened, vec![PROFILE_URL.to_string()]);
        assert_eq!(portal.attached, vec![PathBuf::from("/tmp/cv.pdf")]);
    }

    #[tokio::test]
    async fn test_chooser_fallback_and_late_confirmation() {
        let mut portal = ScriptedPortal {
            input_results: VecDeque::from([false]),
            chooser_results: VecDeque::from([true]),
            ..Default::default()
        }
        .with_pages(&["<p>uploading</p>", "<p>uploading</p>", "<p>Uploaded on today</p>"]);

        let outcome = UploadWorkflow::new(&mut portal)
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(portal.attached.len(), 1);
    }

    #[tokio::test]
    async fn test_unconfirmed_when_no_marker_appears() {
        let mut portal = ScriptedPortal {
            input_results: VecDeque::from([true]),
            ..Default::default()
        }
        .with_pages(&["<p>profile</p>"]);

        let outcome = UploadWorkflow::new(&mut portal)
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::Unconfirmed);
    }

    #[tokio::test]
    async fn test_no_controls_and_no_credentials() {
        let mut portal = ScriptedPortal::default();

        let outcome = UploadWorkflow::new(&mut portal)
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::ControlsUnavailable);
        assert!(!portal.opened.contains(&LOGIN_URL.to_string()));
    }

    #[tokio::test]
    async fn test_login_then_retry_upload() {
        let mut portal = ScriptedPortal {
            input_results: VecDeque::from([false, true]),
            chooser_results: VecDeque::from([false]),
            fill_results: VecDeque::from([true, true]),
            login_button: true,
            upload_button_after_login: true,
            ..Default::default()
        }
        .with_pages(&["<p>Welcome</p>", "<p>Uploaded on 1 Jan</p>"]);
        let credentials = creds();

        let outcome = UploadWorkflow::new(&mut portal)
            .with_credentials(Some(&credentials))
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(portal.filled, vec!["me@example.com", "secret"]);
        assert_eq!(portal.saves, 1);
        assert_eq!(
            portal.opened,
            vec![PROFILE_URL, LOGIN_URL, PROFILE_URL, PROFILE_URL]
        );
    }

    #[tokio::test]
    async fn test_save_failure_does_not_stop_retry() {
        let mut portal = ScriptedPortal {
            input_results: VecDeque::from([false, true]),
            chooser_results: VecDeque::from([false]),
            fill_results: VecDeque::from([true, true]),
            login_button: true,
            upload_button_after_login: true,
            fail_save: true,
            ..Default::default()
        }
        .with_pages(&["<p>Welcome</p>", "<p>Success</p>"]);
        let credentials = creds();

        let outcome = UploadWorkflow::new(&mut portal)
            .with_credentials(Some(&credentials))
            .with_policy(fast_policy())
            .run(Path::new("/tmp/cv.pdf"))
            .await;

        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(portal.saves, 1);
    }

    #[tokio::test]
    async fn test_login_stops_on_otp() {
        let mut portal = ScriptedPortal {
            fill_results: VecDeque::from([true, true]),
            login_button: true,
            ..Default::default()
        }
        .with_pages(&["Enter the OTP we sent"]);
        let credentials = creds();

        let login = UploadWorkflow::new(&mut portal)
            .with_policy(fast_policy())
            .login(&credentials)
            .await;

        assert_eq!(login, LoginOutcome::OtpRequired);
        assert_eq!(portal.opened, vec![LOGIN_URL]);
    }

    #[tokio::test]
    async fn test_login_missing_password_field() {
        let mut portal = ScriptedPortal {
            fill_results: VecDeque::from([true, false]),
            ..Default::default()
        };
        let credentials = creds();

        let login = UploadWorkflow::new(&mut portal).login(&credentials).await;

        assert_eq!(login, LoginOutcome::FormNotFound);
    }

    #[tokio::test]
    async fn test_login_falls_back_to_enter() {
        let mut portal = ScriptedPortal {
            fill_results: VecDeque::from([true, true]),
            login_button: false,
            enter_works: true,
            ..Default::default()
        }
        .with_pages(&["<p>Home</p>", "<a>Logout</a>"]);
        let credentials = creds();

        let login = UploadWorkflow::new(&mut portal).login(&credentials).await;

        assert_eq!(login, LoginOutcome::LoggedIn);
    }

    #[tokio::test]
    async fn test_login_submit_failure() {
        let mut portal = ScriptedPortal {
            fill_results: VecDeque::from([true, true]),
            ..Default::default()
        };
        let credentials = creds();

        let login = UploadWorkflow::new(&mut portal).login(&credentials).await;

        assert_eq!(login, LoginOutcome::SubmitFailed);
    }

    #[tokio::test]
    async fn test_login_not_confirmed() {
        let mut portal = ScriptedPortal {
            fill_results: VecDeque::from([true, true]),
            login_button: true,
            ..Default::default()
        }
        .with_pages(&["<p>Home</p>", "<p>Sign in</p>"]);
        let credentials = creds();

        let login = UploadWorkflow::new(&mut portal).login(&credentials).await;

        assert_eq!(login, LoginOutcome::NotConfirmed);
    }

    #[test]
    fn test_quick_policy_is_lighter() {
        let quick = AttemptPolicy::quick();
        let full = AttemptPolicy::default();

        assert!(quick.chooser_timeout < full.chooser_timeout);
        assert!(quick.upload_settle < full.upload_settle);
        assert!(quick.poll_attempts < full.poll_attempts);
        assert_eq!(quick.navigation_timeout, full.navigation_timeout);
    }
}
