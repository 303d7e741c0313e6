use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::approval::{ApprovalState, LifecycleStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecruitmentDrive {
    pub id: Uuid,
    pub company_id: Uuid,
    pub job_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub drive_date: DateTime<Utc>,
    pub location: String,
    pub venue: String,
    pub coordinator_notes: Option<String>,
    pub status: LifecycleStatus,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecruitmentDrive {
    pub fn is_approved(&self) -> bool {
        self.approval_status.is_approved()
    }
}

#[derive(Debug, Clone)]
pub struct NewRecruitmentDrive {
    pub company_id: Uuid,
    pub job_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub drive_date: DateTime<Utc>,
    pub location: String,
    pub venue: String,
    pub coordinator_notes: Option<String>,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
}
