use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub industry: String,
    pub website: Option<String>,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub user_id: Uuid,
    pub company_name: String,
    pub industry: String,
    pub website: Option<String>,
    pub description: String,
    pub address: String,
    pub phone: String,
}

impl NewCompany {
    pub fn placeholder(user_id: Uuid, display_name: &str) -> Self {
        Self {
            user_id,
            company_name: display_name.to_string(),
            industry: "Not specified".to_string(),
            website: None,
            description: String::new(),
            address: String::new(),
            phone: String::new(),
        }
    }
}
