mod chrome_finder;
mod error;
mod launcher;
mod network_idle;
mod portal_page;
mod profile;
mod session;
mod session_store;

pub use chrome_finder::{BrowserEngine, ChromeFinder, LocatedBrowser};
pub use error::{Error, Result};
pub use launcher::BrowserLauncher;
pub use network_idle::{NetworkActivity, NetworkMonitor, QUIET_WINDOW, wait_for_quiet};
pub use portal_page::PortalPage;
pub use profile::ProfileDir;
pub use session::BrowserSession;
pub use session_store::{SessionStore, StoredCookie, StoredSession};
