use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::approval::LifecycleStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDrivePayload {
    /// Required when staff schedule a drive for a company.
    pub company_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub drive_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(length(min = 1))]
    pub venue: String,
    pub coordinator_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDrivePayload {
    pub job_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub drive_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    #[validate(length(min = 1))]
    pub venue: Option<String>,
    pub coordinator_notes: Option<String>,
}

/// Operational status change for a drive or event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecyclePayload {
    pub status: LifecycleStatus,
}
