//! Notification port: fire-and-forget event emission on publish,
//! reschedule, and cancel. No delivery guarantee; the consumer is external.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    SchedulePublished,
    GameRescheduled,
    GameCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub event: NotificationEvent,
    pub tenant_id: Uuid,
    pub season_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub message: String,
}

pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[derive(Default)]
pub struct NullNotifier;

impl NotificationPort for NullNotifier {
    fn notify(&self, notification: Notification) {
        log::debug!("dropping notification (no-op port): {:?}", notification.event);
    }
}
