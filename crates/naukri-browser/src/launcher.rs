use crate::{BrowserSession, Error, LocatedBrowser, ProfileDir, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;

const WINDOW_WIDTH: u32 = 1366;
const WINDOW_HEIGHT: u32 = 850;

/// Desktop user agent presented instead of the headless default
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Configures and starts a browser over the DevTools protocol
pub struct BrowserLauncher {
    browser: LocatedBrowser,
    headless: bool,
    background: bool,
}

impl BrowserLauncher {
    pub fn new(browser: LocatedBrowser) -> Self {
        Self {
            browser,
            headless: true,
            background: false,
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Headed, but kept out of sight
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Launch the browser and start processing protocol messages
    pub async fn launch(&self) -> Result<BrowserSession> {
        let profile = ProfileDir::temporary()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.browser.path)
            .user_data_dir(profile.path())
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .viewport(Viewport {
                width: WINDOW_WIDTH,
                height: WINDOW_HEIGHT,
                ..Viewport::default()
            })
            .args(self.build_args());

        if !self.headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(Error::Browser)?;

        tracing::info!(
            "Launching {} ({})...",
            self.browser.engine,
            if self.headless { "headless" } else { "headed" }
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch {}: {}", self.browser.engine, e)))?;

        // The handler must be polled for any command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        if self.background && !self.headless {
            hide_windows(&self.browser);
        }

        Ok(BrowserSession::new(
            browser,
            handler_task,
            profile,
            self.browser.engine,
        ))
    }

    /// Extra command-line switches on top of the protocol defaults
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--user-agent={}", DESKTOP_USER_AGENT),
            "--lang=en-US".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];

        if self.background && !self.headless {
            args.push("--window-position=-2400,-2400".to_string());
        }

        args
    }
}

/// Hide the browser's windows (best-effort, macOS only)
fn hide_windows(browser: &LocatedBrowser) {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        let script = format!(
            r#"tell application "System Events" to set visible of process "{}" to false"#,
            browser.engine.process_name()
        );
        if let Err(e) = Command::new("osascript").arg("-e").arg(script).output() {
            tracing::debug!("Could not hide {}: {}", browser.engine, e);
        }
    }

    #[cfg(not(target_os = "macos"))]
    tracing::debug!(
        "Window hiding not supported here; {} runs off-screen instead",
        browser.engine
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrowserEngine;
    use std::path::PathBuf;

    fn launcher() -> BrowserLauncher {
        BrowserLauncher::new(LocatedBrowser {
            engine: BrowserEngine::Chromium,
            path: PathBuf::from("/usr/bin/chromium"),
        })
    }

    #[test]
    fn test_launcher_masks_automation() {
        let args = launcher().build_args();

        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--lang=en-US".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
        assert!(!args.iter().any(|a| a.starts_with("--window-position")));
    }

    #[test]
    fn test_background_moves_window_off_screen() {
        let args = launcher().headless(false).background(true).build_args();
        assert!(args.contains(&"--window-position=-2400,-2400".to_string()));

        let args = launcher().headless(true).background(true).build_args();
        assert!(!args.iter().any(|a| a.starts_with("--window-position")));
    }
}
