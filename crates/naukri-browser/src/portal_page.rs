use crate::network_idle::NetworkMonitor;
use crate::{Error, Result, SessionStore, StoredSession};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::{BackendNodeId, SetFileInputFilesParams};
use chromiumoxide::cdp::browser_protocol::network::GetCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventFileChooserOpened, SetInterceptFileChooserDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use naukri_core::portal::{LOGIN_URL, PROFILE_URL};
use naukri_core::Portal;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Elements that can carry a clickable label, buttons first
const CLICKABLE_SELECTORS: &[&str] = &[
    "button, [role=button], input[type=button], input[type=submit]",
    "a",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The portal as seen through a live DevTools page
pub struct PortalPage {
    page: Page,
    store: SessionStore,
    network: NetworkMonitor,
}

impl PortalPage {
    /// Wrap `page`, tracking its network traffic from here on
    pub async fn attach(page: Page, store: SessionStore) -> Result<Self> {
        let network = NetworkMonitor::watch(&page).await?;
        Ok(Self {
            page,
            store,
            network,
        })
    }

    async fn set_files(&self, node: BackendNodeId, file: &Path) -> Result<()> {
        let params = SetFileInputFilesParams::builder()
            .files(vec![file.display().to_string()])
            .backend_node_id(node)
            .build()
            .map_err(Error::Browser)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn first_match(&self, selectors: &[&str]) -> Option<Element> {
        for selector in selectors {
            match self.page.find_elements(*selector).await {
                Ok(elements) => {
                    if let Some(element) = elements.into_iter().next() {
                        return Some(element);
                    }
                }
                Err(e) => tracing::debug!("Selector {} not usable: {}", selector, e),
            }
        }
        None
    }

    /// First button or link whose visible text, value or aria-label matches
    async fn find_labelled(&self, label: &Regex) -> Result<Option<Element>> {
        for selector in CLICKABLE_SELECTORS {
            for element in self.page.find_elements(*selector).await? {
                if element_label(&element).await.is_some_and(|text| label.is_match(&text)) {
                    return Ok(Some(element));
                }
            }
        }
        Ok(None)
    }

    /// Poll for a labelled element, since buttons often render after load
    async fn wait_for_labelled(&self, label: &Regex, timeout: Duration) -> Result<Option<Element>> {
        poll_until(timeout, POLL_INTERVAL, || self.find_labelled(label)).await
    }

    async fn chooser_upload(&self, label: &Regex, file: &Path, timeout: Duration) -> Result<bool> {
        let mut chooser_events = self.page.event_listener::<EventFileChooserOpened>().await?;

        let Some(button) = self.wait_for_labelled(label, timeout).await? else {
            tracing::debug!("No button labelled {} within {}s", label, timeout.as_secs());
            return Ok(false);
        };
        button.click().await?;

        let event = match tokio::time::timeout(timeout, chooser_events.next()).await {
            Ok(Some(event)) => event,
            Ok(None) | Err(_) => {
                tracing::debug!("File chooser did not open within {}s", timeout.as_secs());
                return Ok(false);
            }
        };

        let node = event.backend_node_id.clone().ok_or_else(|| {
            Error::Browser("file chooser opened without an input element".to_string())
        })?;
        self.set_files(node, file).await?;
        Ok(true)
    }

    async fn fill(&self, element: &Element, value: &str) -> Result<()> {
        element.click().await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn collect_session(&self) -> Result<StoredSession> {
        let params = GetCookiesParams {
            urls: Some(cookie_urls()),
        };
        let cookies = self.page.execute(params).await?.result.cookies;
        Ok(StoredSession::from_cookies(&cookies))
    }
}

/// Retry `check` every `interval` until it finds something or `timeout`
/// has passed; always checks at least once.
async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(found) = check().await? {
            return Ok(Some(found));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Pages whose cookies make up the logged-in state
fn cookie_urls() -> Vec<String> {
    let mut urls: Vec<String> = [PROFILE_URL, LOGIN_URL]
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .map(|url| url.origin().ascii_serialization())
        .collect();
    urls.push(PROFILE_URL.to_string());
    urls.sort();
    urls.dedup();
    urls
}

async fn element_label(element: &Element) -> Option<String> {
    if let Ok(Some(text)) = element.inner_text().await {
        if !text.trim().is_empty() {
            return Some(text);
        }
    }
    for attribute in ["value", "aria-label", "title"] {
        if let Ok(Some(text)) = element.attribute(attribute).await {
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
    }
    None
}

#[async_trait]
impl Portal for PortalPage {
    async fn open(&mut self, url: &str) -> naukri_core::Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(Error::from)?;
        Ok(())
    }

    async fn settle(&mut self, timeout: Duration) {
        self.network.settle(timeout).await;
    }

    async fn content(&mut self) -> naukri_core::Result<String> {
        Ok(self.page.content().await.map_err(Error::from)?)
    }

    async fn attach_via_input(
        &mut self,
        selectors: &[&str],
        file: &Path,
    ) -> naukri_core::Result<bool> {
        let Some(input) = self.first_match(selectors).await else {
            return Ok(false);
        };
        self.set_files(input.backend_node_id.clone(), file).await?;
        Ok(true)
    }

    async fn attach_via_chooser(
        &mut self,
        label: &Regex,
        file: &Path,
        timeout: Duration,
    ) -> naukri_core::Result<bool> {
        self.page
            .execute(SetInterceptFileChooserDialogParams::new(true))
            .await
            .map_err(Error::from)?;

        let attached = self.chooser_upload(label, file, timeout).await;

        if let Err(e) = self
            .page
            .execute(SetInterceptFileChooserDialogParams::new(false))
            .await
        {
            tracing::debug!("Could not restore file chooser dialogs: {}", e);
        }

        Ok(attached?)
    }

    async fn fill_first(&mut self, selectors: &[&str], value: &str) -> naukri_core::Result<bool> {
        for selector in selectors {
            let elements = match self.page.find_elements(*selector).await {
                Ok(elements) => elements,
                Err(_) => continue,
            };
            let Some(element) = elements.first() else {
                continue;
            };
            match self.fill(element, value).await {
                Ok(()) => return Ok(true),
                Err(e) => tracing::debug!("Could not fill {}: {}", selector, e),
            }
        }
        Ok(false)
    }

    async fn click_button(&mut self, label: &Regex, timeout: Duration) -> naukri_core::Result<bool> {
        let Some(button) = self.wait_for_labelled(label, timeout).await? else {
            return Ok(false);
        };
        button.click().await.map_err(Error::from)?;
        Ok(true)
    }

    async fn press_enter(&mut self) -> naukri_core::Result<bool> {
        let Ok(focused) = self.page.find_element(":focus").await else {
            return Ok(false);
        };
        focused.press_key("Enter").await.map_err(Error::from)?;
        Ok(true)
    }

    async fn has_button(&mut self, label: &Regex, timeout: Duration) -> naukri_core::Result<bool> {
        Ok(self.wait_for_labelled(label, timeout).await?.is_some())
    }

    async fn save_session(&mut self) -> naukri_core::Result<()> {
        let session = self.collect_session().await?;
        tracing::debug!("Collected {} cookies", session.cookies.len());
        self.store.save_keeping_origins(session)?;
        Ok(())
    }
}
