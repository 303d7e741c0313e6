use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::event::EventType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventPayload {
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(length(min = 1))]
    pub venue: String,
    #[validate(length(min = 1))]
    pub organizer: String,
    #[validate(range(min = 0))]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub registration_required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEventPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    pub event_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    #[validate(length(min = 1))]
    pub venue: Option<String>,
    #[validate(length(min = 1))]
    pub organizer: Option<String>,
    #[validate(range(min = 0))]
    pub max_participants: Option<i32>,
    pub registration_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EventRegistrationPayload {
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}
