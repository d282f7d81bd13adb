use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

/// Best-effort side-channel alert
///
/// Delivery failures are swallowed: a notification that cannot be shown
/// must never take the batch down with it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str);
}

/// A shared reference to a notifier
pub type SharedNotifier = Arc<dyn Notifier>;

/// Desktop notifications via the `notify-send` command
#[derive(Debug, Clone)]
pub struct NotifySend {
    /// Display duration in milliseconds
    timeout_ms: u32,
}

impl NotifySend {
    pub fn new() -> Self {
        Self { timeout_ms: 10_000 }
    }

    pub fn shared() -> SharedNotifier {
        Arc::new(Self::new())
    }
}

impl Default for NotifySend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifySend {
    async fn notify(&self, title: &str, message: &str) {
        let _ = Command::new("notify-send")
            .arg("-t")
            .arg(self.timeout_ms.to_string())
            .arg(title)
            .arg(message)
            .status()
            .await;
    }
}

/// A notifier that silently drops all notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _title: &str, _message: &str) {
        // Intentionally empty
    }
}

impl NoopNotifier {
    pub fn shared() -> SharedNotifier {
        Arc::new(Self)
    }
}
