use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::approval::{ApprovalState, LifecycleStatus};

string_enum! {
    pub enum EventType ("event type") {
        Workshop => "workshop",
        Seminar => "seminar",
        InfoSession => "info_session",
        CareerFair => "career_fair",
        Networking => "networking",
        Other => "other",
    }
}

impl EventType {
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Workshop => "Workshop",
            EventType::Seminar => "Seminar",
            EventType::InfoSession => "Information Session",
            EventType::CareerFair => "Career Fair",
            EventType::Networking => "Networking Event",
            EventType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampusEvent {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub venue: String,
    pub organizer: String,
    pub max_participants: Option<i32>,
    pub registration_required: bool,
    pub status: LifecycleStatus,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampusEvent {
    pub fn is_approved(&self) -> bool {
        self.approval_status.is_approved()
    }

    /// `None` capacity means unlimited seats.
    pub fn has_seat_for(&self, registered: i64) -> bool {
        match self.max_participants {
            Some(max) => registered < i64::from(max),
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCampusEvent {
    pub company_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub venue: String,
    pub organizer: String,
    pub max_participants: Option<i32>,
    pub registration_required: bool,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub attended: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEventRegistration {
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub notes: Option<String>,
}
