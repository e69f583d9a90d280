//! Waiting for a page's network traffic to go quiet.
//!
//! A navigation wait returns as soon as the main frame has loaded, which says
//! nothing about requests fired later by page scripts (form logins, upload
//! XHRs). This tracks in-flight requests from the Network domain events and
//! waits until none have been open for a quiet window.

use crate::Result;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long the network must stay idle to count as settled
pub const QUIET_WINDOW: Duration = Duration::from_millis(500);

const CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Requests currently open on a page
#[derive(Debug)]
pub struct NetworkActivity {
    in_flight: HashSet<String>,
    last_change: Instant,
}

impl NetworkActivity {
    pub fn new() -> Self {
        Self {
            in_flight: HashSet::new(),
            last_change: Instant::now(),
        }
    }

    pub fn started(&mut self, request_id: String) {
        self.in_flight.insert(request_id);
        self.last_change = Instant::now();
    }

    pub fn finished(&mut self, request_id: &str) {
        if self.in_flight.remove(request_id) {
            self.last_change = Instant::now();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// No open requests and nothing changed since `since` for `window`
    pub fn is_quiet(&self, since: Instant, window: Duration) -> bool {
        let idle_from = self.last_change.max(since);
        self.in_flight.is_empty() && Instant::now().duration_since(idle_from) >= window
    }
}

impl Default for NetworkActivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until `activity` has been quiet for `window`, giving up after `timeout`.
///
/// The window is counted from the call at the earliest, so a request fired
/// just before the call still has time to show up. Returns whether the page
/// went quiet.
pub async fn wait_for_quiet(
    activity: &Mutex<NetworkActivity>,
    window: Duration,
    timeout: Duration,
) -> bool {
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        let quiet = match activity.lock() {
            Ok(activity) => activity.is_quiet(start, window),
            Err(_) => return false,
        };
        if quiet {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(CHECK_INTERVAL.min(deadline - Instant::now())).await;
    }
}

/// Background task feeding a page's network events into [`NetworkActivity`]
pub struct NetworkMonitor {
    activity: Arc<Mutex<NetworkActivity>>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    pub async fn watch(page: &Page) -> Result<Self> {
        page.execute(EnableParams::default()).await?;

        let mut request_events = page.event_listener::<EventRequestWillBeSent>().await?;
        let mut finished_events = page.event_listener::<EventLoadingFinished>().await?;
        let mut failed_events = page.event_listener::<EventLoadingFailed>().await?;

        let activity = Arc::new(Mutex::new(NetworkActivity::new()));
        let shared = Arc::clone(&activity);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = request_events.next() => {
                        if let Ok(mut activity) = shared.lock() {
                            activity.started(event.request_id.inner().to_string());
                        }
                    }
                    Some(event) = finished_events.next() => {
                        if let Ok(mut activity) = shared.lock() {
                            activity.finished(event.request_id.inner());
                        }
                    }
                    Some(event) = failed_events.next() => {
                        if let Ok(mut activity) = shared.lock() {
                            activity.finished(event.request_id.inner());
                        }
                    }
                    else => break,
                }
            }
        });

        Ok(Self { activity, task })
    }

    /// Best-effort wait for the network to go idle
    pub async fn settle(&self, timeout: Duration) -> bool {
        let quiet = wait_for_quiet(&self.activity, QUIET_WINDOW, timeout).await;
        if !quiet {
            let open = self.activity.lock().map(|a| a.in_flight()).unwrap_or_default();
            tracing::debug!(
                "Network still busy after {}s ({} requests open)",
                timeout.as_secs(),
                open
            );
        }
        quiet
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_open_request_to_finish() {
        let activity = Arc::new(Mutex::new(NetworkActivity::new()));
        activity.lock().unwrap().started("login-xhr".to_string());

        let shared = Arc::clone(&activity);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            shared.lock().unwrap().finished("login-xhr");
        });

        let start = Instant::now();
        let quiet = wait_for_quiet(&activity, QUIET_WINDOW, Duration::from_secs(15)).await;

        assert!(quiet);
        assert!(start.elapsed() >= Duration::from_secs(3) + QUIET_WINDOW);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_page_still_waits_one_window() {
        let activity = Mutex::new(NetworkActivity::new());
        tokio::time::sleep(Duration::from_secs(10)).await;

        let start = Instant::now();
        let quiet = wait_for_quiet(&activity, QUIET_WINDOW, Duration::from_secs(15)).await;

        assert!(quiet);
        assert!(start.elapsed() >= QUIET_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_right_after_call_is_waited_for() {
        let activity = Arc::new(Mutex::new(NetworkActivity::new()));

        let shared = Arc::clone(&activity);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shared.lock().unwrap().started("upload".to_string());
            tokio::time::sleep(Duration::from_secs(2)).await;
            shared.lock().unwrap().finished("upload");
        });

        let start = Instant::now();
        assert!(wait_for_quiet(&activity, QUIET_WINDOW, Duration::from_secs(15)).await);
        assert!(start.elapsed() >= Duration::from_millis(2_200) + QUIET_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_timeout() {
        let activity = Mutex::new(NetworkActivity::new());
        activity.lock().unwrap().started("long-poll".to_string());

        let start = Instant::now();
        let quiet = wait_for_quiet(&activity, QUIET_WINDOW, Duration::from_secs(15)).await;

        assert!(!quiet);
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(start.elapsed() < Duration::from_secs(16));
    }

    #[test]
    fn test_unknown_request_finishing_is_ignored() {
        let mut activity = NetworkActivity::new();
        activity.started("a".to_string());
        activity.finished("b");
        assert_eq!(activity.in_flight(), 1);

        activity.finished("a");
        assert_eq!(activity.in_flight(), 0);
    }
}
