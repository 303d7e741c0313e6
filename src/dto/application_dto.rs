use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    pub job_id: Uuid,
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    pub status: Option<ApplicationStatus>,
    pub interview_date: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub interview_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationListQuery {
    pub job_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}
