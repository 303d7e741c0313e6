use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_target_role() -> String {
    "student".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncementPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    /// `student`, `company`, `all`, or any other role name.
    #[serde(default = "default_target_role")]
    pub target_role: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementResponse {
    pub message: String,
    pub sent_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
