//! Best-effort outcome notifications.
//!
//! Desktop banners and emails are fire-and-forget: delivery failures are
//! logged and never change the exit status.

mod desktop;
mod mail;

pub use desktop::{DesktopBanner, DesktopNotifier};
pub use mail::{MailApp, Mailer, MailerKind, Sendmail, applescript_escape};

use crate::{Report, UploadOutcome};

/// Rendered text for one outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub email_subject: String,
    pub email_body: String,
}

impl Notice {
    pub fn for_report(report: &Report) -> Self {
        let ts = report.timestamp();
        match report.outcome {
            UploadOutcome::Uploaded => {
                let message = match &report.engine {
                    Some(engine) if report.probed_engines => {
                        format!("Headless {} upload done", engine)
                    }
                    _ => format!("Resume uploaded at {}", ts),
                };
                Self::new(
                    "Naukri uploader succeeded",
                    message,
                    "Naukri resume upload: success",
                    format!("Upload completed successfully at {}.", ts),
                )
            }
            UploadOutcome::Unconfirmed if report.probed_engines => Self::new(
                "Naukri uploader warning",
                "Headless engines failed; consider enabling --background",
                "Naukri resume upload: warning",
                "Headless upload attempts could not be confirmed. Please check your Naukri profile or re-run with --background.",
            ),
            UploadOutcome::Unconfirmed => Self::new(
                "Naukri uploader warning",
                "Upload not confirmed. Please verify on Naukri.",
                "Naukri resume upload: warning",
                "Upload not confirmed. Please check your Naukri profile.",
            ),
            UploadOutcome::ResumeUnavailable => Self::new(
                "Naukri uploader failed",
                "Cannot access resume folder/file. Grant Full Disk Access or move resume outside protected folders.",
                "Naukri resume upload: failed",
                format!(
                    "Cannot access resume path: {}. Grant Full Disk Access or choose a different folder.",
                    report.resume_path.display()
                ),
            ),
            UploadOutcome::ControlsUnavailable => Self::new(
                "Naukri uploader failed",
                "Could not access upload controls. Try re-running setup.",
                "Naukri resume upload: failed",
                "Could not access upload controls. You may need to re-run setup.",
            ),
            UploadOutcome::BrowserUnavailable => Self::new(
                "Naukri uploader failed",
                "No supported browser could be started.",
                "Naukri resume upload: failed",
                "No supported browser could be started. Install Chromium or Google Chrome, or pass --chrome-path.",
            ),
        }
    }

    fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        email_subject: impl Into<String>,
        email_body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            email_subject: email_subject.into(),
            email_body: email_body.into(),
        }
    }
}

/// When to send email, and to whom
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    pub to: String,
    pub on_success: bool,
    pub on_failure: bool,
}

impl EmailPolicy {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            on_success: false,
            on_failure: true,
        }
    }

    pub fn applies_to(&self, outcome: UploadOutcome) -> bool {
        if outcome.is_success() {
            self.on_success
        } else {
            self.on_failure
        }
    }
}

/// Fan-out to the configured channels
#[derive(Default)]
pub struct Notifications {
    desktop: Option<Box<dyn DesktopNotifier>>,
    mailer: Option<Box<dyn Mailer>>,
    email: Option<EmailPolicy>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_desktop(mut self, desktop: Box<dyn DesktopNotifier>) -> Self {
        self.desktop = Some(desktop);
        self
    }

    pub fn with_email(mut self, mailer: Box<dyn Mailer>, policy: EmailPolicy) -> Self {
        self.mailer = Some(mailer);
        self.email = Some(policy);
        self
    }

    /// Send whatever the policy allows; failures are logged and dropped
    pub fn dispatch(&self, report: &Report) {
        let notice = Notice::for_report(report);

        if let Some(desktop) = &self.desktop {
            if let Err(e) = desktop.notify(&notice.title, &notice.message) {
                tracing::warn!("Desktop notification failed: {}", e);
            }
        }

        let (Some(mailer), Some(policy)) = (&self.mailer, &self.email) else {
            return;
        };
        if !policy.applies_to(report.outcome) {
            return;
        }

        tracing::debug!("Emailing {} via {}", policy.to, mailer.name());
        if let Err(e) = mailer.send(&policy.to, &notice.email_subject, &notice.email_body) {
            tracing::warn!("Email notification via {} failed: {}", mailer.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct RecordingDesktop(Log);

    impl DesktopNotifier for RecordingDesktop {
        fn notify(&self, title: &str, message: &str) -> Result<()> {
            self.0.lock().unwrap().push(format!("{}|{}", title, message));
            Ok(())
        }
    }

    struct RecordingMailer(Log);

    impl Mailer for RecordingMailer {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
            self.0.lock().unwrap().push(format!("{}|{}", to, subject));
            Ok(())
        }
    }

    struct BrokenMailer;

    impl Mailer for BrokenMailer {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            Err(Error::Notify("no mail client".to_string()))
        }
    }

    fn setup(policy: EmailPolicy) -> (Notifications, Log, Log) {
        let banners = Log::default();
        let mails = Log::default();
        let notifications = Notifications::new()
            .with_desktop(Box::new(RecordingDesktop(banners.clone())))
            .with_email(Box::new(RecordingMailer(mails.clone())), policy);
        (notifications, banners, mails)
    }

    #[test]
    fn test_success_skips_email_by_default() {
        let (notifications, banners, mails) = setup(EmailPolicy::new("me@example.com"));

        notifications.dispatch(&Report::new(UploadOutcome::Uploaded, "/tmp/cv.pdf"));

        let banners = banners.lock().unwrap();
        assert_eq!(banners.len(), 1);
        assert!(banners[0].starts_with("Naukri uploader succeeded|Resume uploaded at "));
        assert!(mails.lock().unwrap().is_empty());
    }

    #[test]
    fn test_success_email_when_enabled() {
        let mut policy = EmailPolicy::new("me@example.com");
        policy.on_success = true;
        let (notifications, _, mails) = setup(policy);

        notifications.dispatch(&Report::new(UploadOutcome::Uploaded, "/tmp/cv.pdf"));

        assert_eq!(
            *mails.lock().unwrap(),
            vec!["me@example.com|Naukri resume upload: success"]
        );
    }

    #[test]
    fn test_failure_email_can_be_disabled() {
        let mut policy = EmailPolicy::new("me@example.com");
        policy.on_failure = false;
        let (notifications, banners, mails) = setup(policy);

        notifications.dispatch(&Report::new(UploadOutcome::ControlsUnavailable, "/tmp/cv.pdf"));

        assert_eq!(
            *banners.lock().unwrap(),
            vec!["Naukri uploader failed|Could not access upload controls. Try re-running setup."]
        );
        assert!(mails.lock().unwrap().is_empty());
    }

    #[test]
    fn test_warning_email_on_unconfirmed() {
        let (notifications, _, mails) = setup(EmailPolicy::new("me@example.com"));

        notifications.dispatch(&Report::new(UploadOutcome::Unconfirmed, "/tmp/cv.pdf"));

        assert_eq!(
            *mails.lock().unwrap(),
            vec!["me@example.com|Naukri resume upload: warning"]
        );
    }

    #[test]
    fn test_mailer_errors_are_swallowed() {
        let notifications = Notifications::new()
            .with_email(Box::new(BrokenMailer), EmailPolicy::new("me@example.com"));

        notifications.dispatch(&Report::new(UploadOutcome::Unconfirmed, "/tmp/cv.pdf"));
    }

    #[test]
    fn test_resume_notice_names_path() {
        let notice = Notice::for_report(&Report::new(
            UploadOutcome::ResumeUnavailable,
            "/Users/me/Documents/resume",
        ));

        assert_eq!(notice.title, "Naukri uploader failed");
        assert!(notice.email_body.contains("/Users/me/Documents/resume"));
    }

    #[test]
    fn test_probed_engine_notices() {
        let report = Report::new(UploadOutcome::Uploaded, "/tmp/cv.pdf")
            .with_engine("Chromium")
            .with_probed_engines();
        assert_eq!(
            Notice::for_report(&report).message,
            "Headless Chromium upload done"
        );

        let report = Report::new(UploadOutcome::Unconfirmed, "/tmp/cv.pdf").with_probed_engines();
        assert!(Notice::for_report(&report).message.contains("--background"));
    }
}
