use crate::{EngineChoice, MailerChoice};
use anyhow::Result;
use clap::Args;
use console::style;
use naukri_browser::{BrowserLauncher, ChromeFinder, LocatedBrowser, SessionStore};
use naukri_core::notify::{DesktopBanner, EmailPolicy, MailerKind, Notifications};
use naukri_core::resume::resolve_resume_path;
use naukri_core::{
    AttemptPolicy, Credentials, KeychainLookup, PasswordSources, Report, UploadOutcome,
    UploadWorkflow, paths,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Resume file or folder (pdf/doc/docx/rtf); for a folder the most recently
    /// modified supported file is used [default: ~/naukri_job/resume]
    #[arg(long, value_name = "PATH")]
    pub resume_path: Option<PathBuf>,

    /// Session file with saved cookies [default: ~/naukri_job/storage_state.json]
    #[arg(long, value_name = "FILE")]
    pub storage: Option<PathBuf>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Run headed but keep the browser window out of sight (best-effort)
    #[arg(long)]
    pub background: bool,

    /// Browser engine; auto probes installed engines headless one after another
    #[arg(long, value_enum, default_value = "auto")]
    pub engine: EngineChoice,

    /// Path to a Chromium-family browser binary
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Login email
    #[arg(long, env = "NAUKRI_USERNAME")]
    pub username: Option<String>,

    /// Login password (prefer the environment variable or keychain)
    #[arg(long)]
    pub password: Option<String>,

    /// Name of the environment variable holding the password
    #[arg(long, default_value = "NAUKRI_PASSWORD", value_name = "VAR")]
    pub password_env: String,

    /// Keychain service to read the password from when the env var is unset
    #[arg(long, default_value = "com.naukri.uploader.password", value_name = "SERVICE")]
    pub password_keychain_service: String,

    /// Address for email notifications [default: the login email]
    #[arg(long, env = "NAUKRI_NOTIFY_TO", value_name = "ADDRESS")]
    pub email_to: Option<String>,

    /// Send email on success as well
    #[arg(long)]
    pub email_on_success: bool,

    /// Disable email on failure
    #[arg(long)]
    pub no_email_on_failure: bool,

    /// Mail client used for email notifications
    #[arg(long, value_enum, default_value = "auto")]
    pub mailer: MailerChoice,

    /// Disable the desktop notification
    #[arg(long)]
    pub no_desktop_notify: bool,
}

pub fn execute(args: UploadArgs) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(args));

    runtime.shutdown_timeout(std::time::Duration::from_millis(100));

    result
}

async fn run(args: UploadArgs) -> Result<ExitCode> {
    let requested = match &args.resume_path {
        Some(path) => path.clone(),
        None => paths::default_resume_path()?,
    };
    let storage = match &args.storage {
        Some(path) => path.clone(),
        None => paths::default_storage_path()?,
    };
    let notifications = build_notifications(&args);

    let resume = match resolve_resume_path(&requested) {
        Ok(resume) => resume,
        Err(e) => {
            tracing::error!("{}", e);
            let report = Report::new(UploadOutcome::ResumeUnavailable, &requested);
            return Ok(finish(&report, &notifications));
        }
    };
    println!("📄 Resume: {}", resume.display());

    let credentials = resolve_credentials(&args);
    if credentials.is_none() {
        tracing::debug!("No credentials available; login fallback disabled");
    }

    let store = SessionStore::new(storage);
    let finder = ChromeFinder::new(args.chrome_path.clone());
    let attempt = Attempt {
        store: &store,
        resume: &resume,
        credentials: credentials.as_ref(),
    };

    let report = if args.engine == EngineChoice::Auto && !args.headed && !args.background {
        probe_headless(&finder, &attempt, &requested).await
    } else {
        match finder.find(args.engine.engine()) {
            Ok(browser) => {
                let engine = browser.engine;
                let headless = !(args.headed || args.background);
                let outcome = attempt
                    .run(browser, headless, args.background, AttemptPolicy::default())
                    .await;
                Report::new(outcome, &requested).with_engine(engine.as_str())
            }
            Err(e) => {
                tracing::error!("{}", e);
                Report::new(UploadOutcome::BrowserUnavailable, &requested)
            }
        }
    };

    Ok(finish(&report, &notifications))
}

/// Everything one browser run needs
struct Attempt<'a> {
    store: &'a SessionStore,
    resume: &'a Path,
    credentials: Option<&'a Credentials>,
}

impl Attempt<'_> {
    async fn run(
        &self,
        browser: LocatedBrowser,
        headless: bool,
        background: bool,
        policy: AttemptPolicy,
    ) -> UploadOutcome {
        let engine = browser.engine;
        let session = match BrowserLauncher::new(browser)
            .headless(headless)
            .background(background)
            .launch()
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("{}", e);
                return UploadOutcome::BrowserUnavailable;
            }
        };

        let outcome = match session.open_portal(self.store.clone()).await {
            Ok(mut portal) => {
                UploadWorkflow::new(&mut portal)
                    .with_credentials(self.credentials)
                    .with_policy(policy)
                    .run(self.resume)
                    .await
            }
            Err(e) => {
                tracing::error!("Could not open a page in {}: {}", engine, e);
                UploadOutcome::BrowserUnavailable
            }
        };

        if let Err(e) = session.close().await {
            tracing::debug!("Closing {} failed: {}", engine, e);
        }

        outcome
    }
}

/// Try each installed engine headless until one confirms the upload
async fn probe_headless(finder: &ChromeFinder, attempt: &Attempt<'_>, requested: &Path) -> Report {
    let installed = finder.installed();
    if installed.is_empty() {
        tracing::error!("No Chromium-family browser found. Use --chrome-path to specify one.");
        return Report::new(UploadOutcome::BrowserUnavailable, requested);
    }

    let mut any_launched = false;
    for browser in installed {
        let engine = browser.engine;
        tracing::info!("Trying headless {}...", engine);

        let outcome = attempt.run(browser, true, false, AttemptPolicy::quick()).await;
        if outcome.is_success() {
            return Report::new(outcome, requested)
                .with_engine(engine.as_str())
                .with_probed_engines();
        }

        tracing::warn!("Headless {} finished with: {}", engine, outcome.as_str());
        any_launched |= outcome != UploadOutcome::BrowserUnavailable;
    }

    no_engine_confirmed(any_launched, requested)
}

/// Report once every headless engine has run without confirming the upload
fn no_engine_confirmed(any_launched: bool, requested: &Path) -> Report {
    if any_launched {
        tracing::warn!("Headless engines failed; consider enabling --background");
        Report::new(UploadOutcome::Unconfirmed, requested).with_probed_engines()
    } else {
        tracing::error!("No installed browser could be launched");
        Report::new(UploadOutcome::BrowserUnavailable, requested)
    }
}

fn resolve_credentials(args: &UploadArgs) -> Option<Credentials> {
    PasswordSources {
        explicit: args.password.clone(),
        env_var: &args.password_env,
        keychain: Some(KeychainLookup::new(&args.password_keychain_service)),
    }
    .credentials_for(args.username.clone())
}

fn build_notifications(args: &UploadArgs) -> Notifications {
    let mut notifications = Notifications::new();

    if !args.no_desktop_notify {
        notifications = notifications.with_desktop(Box::new(DesktopBanner));
    }

    let recipient = args.email_to.clone().or_else(|| args.username.clone());
    let mailer = MailerKind::from(args.mailer).build();
    match (recipient, mailer) {
        (Some(to), Some(mailer)) => {
            let mut policy = EmailPolicy::new(to);
            policy.on_success = args.email_on_success;
            policy.on_failure = !args.no_email_on_failure;
            notifications = notifications.with_email(mailer, policy);
        }
        (None, Some(_)) => tracing::debug!("No email recipient configured"),
        _ => {}
    }

    notifications
}

fn finish(report: &Report, notifications: &Notifications) -> ExitCode {
    let engine = report
        .engine
        .as_deref()
        .map(|e| format!(" ({})", e))
        .unwrap_or_default();

    match report.outcome {
        UploadOutcome::Uploaded => {
            println!("{} Resume uploaded{}", style("✅").green(), engine)
        }
        UploadOutcome::Unconfirmed => println!(
            "{} Upload not confirmed{}. Please verify on Naukri.",
            style("⚠️ ").yellow(),
            engine
        ),
        other => eprintln!("{} Upload failed: {}", style("❌").red(), other.as_str()),
    }

    notifications.dispatch(report);
    ExitCode::from(report.outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engines_without_confirmation_are_unconfirmed() {
        let report = no_engine_confirmed(true, Path::new("/tmp/resume.pdf"));

        assert_eq!(report.outcome, UploadOutcome::Unconfirmed);
        assert_eq!(report.outcome.exit_code(), 1);
        assert!(report.probed_engines);
        assert!(report.engine.is_none());
    }

    #[test]
    fn test_no_engine_launched_is_browser_unavailable() {
        let report = no_engine_confirmed(false, Path::new("/tmp/resume.pdf"));

        assert_eq!(report.outcome, UploadOutcome::BrowserUnavailable);
        assert_eq!(report.outcome.exit_code(), 4);
    }
}
