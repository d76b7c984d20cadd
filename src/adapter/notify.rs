use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Assignment,
    DeliveryUpdate,
    Dispatch,
    OrderCancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_id: Uuid,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),

    #[error("notification to {0} timed out")]
    Timeout(Uuid),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Sends one notification, bounded by `limit`.
pub async fn deliver(
    notifier: &dyn Notifier,
    notification: Notification,
    limit: Duration,
) -> Result<(), NotifyError> {
    let recipient = notification.recipient_id;
    match tokio::time::timeout(limit, notifier.notify(notification)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(NotifyError::Timeout(recipient)),
    }
}

/// Writes alerts to the log. Used when no push provider is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient_id = %notification.recipient_id,
            category = ?notification.category,
            related_id = %notification.related_id,
            title = %notification.title,
            "notification"
        );
        Ok(())
    }
}

/// Keeps every notification in memory; handy for tests and local inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
