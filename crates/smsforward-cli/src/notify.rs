use anyhow::Result;
use smsforward_config::{NotificationBackend, NotificationsConfig};

pub const FAILURE_TITLE: &str = "smsforward: forward failed";

pub trait Notifier {
    fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Writes notices to stderr so stdout stays free for the outbox.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        eprintln!("{title}: {body}");
        Ok(())
    }
}

#[cfg(feature = "desktop-notify")]
pub struct DesktopNotifier;

#[cfg(feature = "desktop-notify")]
impl Notifier for DesktopNotifier {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .show()?;
        Ok(())
    }
}

pub fn notifier_for(config: &NotificationsConfig) -> Result<Option<Box<dyn Notifier>>> {
    if !config.enabled {
        return Ok(None);
    }
    match config.backend {
        NotificationBackend::Console => Ok(Some(Box::new(ConsoleNotifier))),
        #[cfg(feature = "desktop-notify")]
        NotificationBackend::Desktop => Ok(Some(Box::new(DesktopNotifier))),
        #[cfg(not(feature = "desktop-notify"))]
        NotificationBackend::Desktop => Err(crate::error::invalid_input(
            "desktop notifications require the desktop-notify feature",
        )),
    }
}
