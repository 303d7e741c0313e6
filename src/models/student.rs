use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub enrollment_number: String,
    pub department: String,
    pub course: String,
    pub year: i32,
    pub cgpa: Option<Decimal>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudentProfile {
    pub user_id: Uuid,
    pub enrollment_number: String,
    pub department: String,
    pub course: String,
    pub year: i32,
    pub cgpa: Option<Decimal>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
}

impl NewStudentProfile {
    /// Profile provisioned at sign-up; the student fills in real values later.
    pub fn placeholder(user_id: Uuid) -> Self {
        let suffix = user_id.simple().to_string();
        Self {
            user_id,
            enrollment_number: format!("TEMP-{}", &suffix[..12]),
            department: "Not specified".to_string(),
            course: "Not specified".to_string(),
            year: 1,
            cgpa: None,
            phone: None,
            skills: Vec::new(),
        }
    }
}

/// Lower-cases, trims and de-duplicates a skill list, preserving first-seen order.
pub fn normalize_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for skill in skills {
        let skill = skill.as_ref().trim().to_lowercase();
        if !skill.is_empty() && !out.contains(&skill) {
            out.push(skill);
        }
    }
    out
}
