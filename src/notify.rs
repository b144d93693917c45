//! Best-effort notifications.
//!
//! Notifications accompany a primary operation (an approval run, a closed
//! ticket) and must never fail it: delivery problems are logged and dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::CobranzaError;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An approval run finished.
    InvoicesApproved,
    /// A special configuration was stored or replaced.
    ConfigurationSaved,
    /// A helpdesk ticket was closed.
    TicketClosed,
}

/// Notification payload as the backend's messaging endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "tipo")]
    pub kind: NotificationKind,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "mensaje")]
    pub message: String,
    /// Ids of the records the notification refers to.
    #[serde(rename = "referencias", default)]
    pub references: Vec<i64>,
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// `CobranzaError::Notification` when delivery failed.
    async fn notify(&self, notification: &Notification) -> Result<(), CobranzaError>;
}

/// Send a notification, logging instead of failing.
///
/// Returns whether the notification was delivered.
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: &Notification) -> bool {
    match notifier.notify(notification).await {
        Ok(()) => true,
        Err(e) => {
            warn!(kind = ?notification.kind, error = %e, "notification dropped");
            false
        }
    }
}
