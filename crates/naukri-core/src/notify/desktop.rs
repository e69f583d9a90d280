use crate::{Error, Result};
use notify_rust::Notification;

/// Shows a short banner on the local desktop
pub trait DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Native notification center (macOS, freedesktop or Windows toast)
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopBanner;

impl DesktopNotifier for DesktopBanner {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        Notification::new()
            .summary(title)
            .body(message)
            .show()
            .map(|_| ())
            .map_err(|e| Error::Notify(e.to_string()))
    }
}
