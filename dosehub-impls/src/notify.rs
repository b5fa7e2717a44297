use async_trait::async_trait;
use log::info;

use dosehub_core::{Notification, NotificationSink};

/// A sink that prints notifications to the log instead of a device.
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn request_permission(&self) {
        info!("Notifications will be shown in this log");
    }

    async fn push(&self, notification: Notification) {
        info!("{}: {}", notification.title, notification.body);
    }
}
