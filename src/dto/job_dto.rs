use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::job::{JobPosting, JobState, JobType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    /// Required when staff post on a company's behalf; ignored for company accounts.
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub job_type: JobType,
    #[validate(length(min = 1))]
    pub department: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub min_cgpa: Option<Decimal>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(min = 1))]
    pub location: String,
    pub application_deadline: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub job_type: Option<JobType>,
    #[validate(length(min = 1))]
    pub department: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub min_cgpa: Option<Decimal>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListQuery {
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: JobPosting,
    pub state: JobState,
}

impl From<JobPosting> for JobResponse {
    fn from(job: JobPosting) -> Self {
        Self {
            state: job.state(),
            job,
        }
    }
}

/// An open posting ranked against the calling student's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecommendation {
    #[serde(flatten)]
    pub job: JobPosting,
    pub match_score: u32,
}
