//! First-time login.
//!
//! Opens a visible browser on the profile page so the user can complete
//! login, OTP and CAPTCHA by hand, then saves the resulting cookies for
//! unattended runs.

use crate::EngineChoice;
use anyhow::{Result, anyhow};
use clap::Args;
use console::Term;
use naukri_browser::{BrowserLauncher, ChromeFinder, PortalPage, SessionStore};
use naukri_core::indicators::UPDATE_RESUME_LABEL;
use naukri_core::portal::PROFILE_URL;
use naukri_core::{Portal, paths};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::Instant;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const PROBE_PAUSE: Duration = Duration::from_secs(1);

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Detect login success automatically instead of waiting for Enter
    #[arg(long)]
    pub auto: bool,

    /// Seconds to wait for the profile page in --auto mode
    #[arg(long, default_value_t = 600, value_name = "SECS", requires = "auto")]
    pub timeout: u64,

    /// Session file to write [default: ~/naukri_job/storage_state.json]
    #[arg(long, value_name = "FILE")]
    pub storage: Option<PathBuf>,

    /// Browser engine (auto picks the first installed one)
    #[arg(long, value_enum, default_value = "auto")]
    pub engine: EngineChoice,

    /// Path to a Chromium-family browser binary
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,
}

pub fn execute(args: SetupArgs) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(args));

    runtime.shutdown_timeout(Duration::from_millis(100));

    result
}

async fn run(args: SetupArgs) -> Result<ExitCode> {
    let storage = match args.storage {
        Some(path) => path,
        None => paths::default_storage_path()?,
    };

    println!("🔍 Locating browser...");
    let browser = ChromeFinder::new(args.chrome_path).find(args.engine.engine())?;
    println!("✅ Found {} at: {}", browser.engine, browser.path.display());

    let session = BrowserLauncher::new(browser).headless(false).launch().await?;
    let mut portal = session.open_portal(SessionStore::new(storage)).await?;
    portal.open(PROFILE_URL).await?;

    let saved = if args.auto {
        println!(
            "🔐 Log in and complete OTP/CAPTCHA in the browser. The session is saved once your profile loads."
        );
        wait_for_profile(&mut portal, Duration::from_secs(args.timeout)).await
    } else {
        println!("🔐 Please complete login/OTP in the browser window.");
        wait_for_enter().await?;
        true
    };

    let code = if saved {
        portal.save_session().await?;
        println!("✅ Session saved");
        ExitCode::SUCCESS
    } else {
        eprintln!("❌ Timed out waiting for profile page. Session not saved.");
        ExitCode::FAILURE
    };

    if let Err(e) = session.close().await {
        tracing::debug!("Closing browser failed: {}", e);
    }

    Ok(code)
}

/// Poll until the "Update resume" button shows up or `timeout` passes
async fn wait_for_profile(portal: &mut PortalPage, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        portal.settle(PROBE_TIMEOUT).await;
        match portal.has_button(&UPDATE_RESUME_LABEL, PROBE_TIMEOUT).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => tracing::debug!("Profile probe failed: {}", e),
        }
        tokio::time::sleep(PROBE_PAUSE).await;
    }

    false
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let term = Term::stdout();
        term.write_str("Press Enter here after the page shows your profile...")?;
        term.read_line()
    })
    .await
    .map_err(|e| anyhow!("Prompt task failed: {}", e))??;
    Ok(())
}
