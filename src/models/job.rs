use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::approval::ApprovalState;

string_enum! {
    pub enum JobType ("job type") {
        FullTime => "full_time",
        PartTime => "part_time",
        Internship => "internship",
        Contract => "contract",
    }
}

impl JobType {
    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full Time",
            JobType::PartTime => "Part Time",
            JobType::Internship => "Internship",
            JobType::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub job_type: JobType,
    pub department: String,
    pub required_skills: Vec<String>,
    pub min_cgpa: Option<Decimal>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub location: String,
    pub application_deadline: DateTime<Utc>,
    pub is_active: bool,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Combined view of approval and activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    PendingApproval,
    ApprovedActive,
    ApprovedInactive,
    Rejected,
}

impl JobPosting {
    pub fn is_approved(&self) -> bool {
        self.approval_status.is_approved()
    }

    pub fn state(&self) -> JobState {
        match (self.approval_status, self.is_active) {
            (ApprovalState::Pending, _) => JobState::PendingApproval,
            (ApprovalState::Approved, true) => JobState::ApprovedActive,
            (ApprovalState::Approved, false) => JobState::ApprovedInactive,
            (ApprovalState::Rejected, _) => JobState::Rejected,
        }
    }

    /// Students only ever see approved, active postings.
    pub fn is_open(&self) -> bool {
        self.state() == JobState::ApprovedActive
    }
}

#[derive(Debug, Clone)]
pub struct NewJobPosting {
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub job_type: JobType,
    pub department: String,
    pub required_skills: Vec<String>,
    pub min_cgpa: Option<Decimal>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub location: String,
    pub application_deadline: DateTime<Utc>,
    pub is_active: bool,
    pub approval_status: ApprovalState,
    pub created_by: Option<Uuid>,
}
