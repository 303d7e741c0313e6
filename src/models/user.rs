use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

string_enum! {
    pub enum Role ("role") {
        Student => "student",
        Company => "company",
        PlacementCoordinator => "placement_coordinator",
        CollegeManagement => "college_management",
    }
}

impl Role {
    /// Coordinators and college management share approval authority.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::PlacementCoordinator | Role::CollegeManagement)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_superuser: bool,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_superuser: bool,
    pub is_approved: bool,
}

/// The authenticated identity performing an operation. Resolved by the transport
/// layer and passed explicitly into every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub is_superuser: bool,
    pub is_approved: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            is_superuser: user.is_superuser,
            is_approved: user.is_approved,
        }
    }
}
