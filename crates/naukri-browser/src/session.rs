use crate::{BrowserEngine, PortalPage, ProfileDir, Result, SessionStore};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::SetCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use tokio::task::JoinHandle;

/// Hides the automation flag from page scripts
const WEBDRIVER_MASK: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// A running browser and everything that must outlive it
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    _profile: ProfileDir,
    engine: BrowserEngine,
}

impl BrowserSession {
    pub(crate) fn new(
        browser: Browser,
        handler_task: JoinHandle<()>,
        profile: ProfileDir,
        engine: BrowserEngine,
    ) -> Self {
        Self {
            browser,
            handler_task,
            _profile: profile,
            engine,
        }
    }

    pub fn engine(&self) -> BrowserEngine {
        self.engine
    }

    /// Open a page primed with the saved cookies
    pub async fn open_portal(&self, store: SessionStore) -> Result<PortalPage> {
        let page = self.browser.new_page("about:blank").await?;

        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(WEBDRIVER_MASK))
            .await
        {
            tracing::debug!("Could not install webdriver mask: {}", e);
        }

        match store.load() {
            Ok(Some(session)) => {
                let now = chrono::Utc::now().timestamp() as f64;
                let cookies = session.cookie_params(now)?;
                tracing::info!(
                    "Restoring {} cookies from {}",
                    cookies.len(),
                    store.path().display()
                );
                if !cookies.is_empty() {
                    page.execute(SetCookiesParams::new(cookies)).await?;
                }
            }
            Ok(None) => tracing::info!("No saved session at {}", store.path().display()),
            Err(e) => tracing::warn!(
                "Ignoring unreadable session file {}: {}",
                store.path().display(),
                e
            ),
        }

        PortalPage::attach(page, store).await
    }

    /// Close the browser and stop the protocol handler
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for {} to exit failed: {}", self.engine, e);
        }
        self.handler_task.abort();
        closed?;
        Ok(())
    }
}
