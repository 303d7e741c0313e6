use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

string_enum! {
    pub enum NotificationType ("notification type") {
        JobPosted => "job_posted",
        ApplicationReceived => "application_received",
        ApplicationStatusChanged => "application_status_changed",
        InterviewScheduled => "interview_scheduled",
        Announcement => "announcement",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub link: Option<String>,
}
