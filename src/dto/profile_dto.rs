use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudentProfilePayload {
    #[validate(length(min = 1, max = 50))]
    pub enrollment_number: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[validate(length(min = 1))]
    pub course: String,
    #[validate(range(min = 1, max = 6))]
    pub year: i32,
    pub cgpa: Option<Decimal>,
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStudentProfilePayload {
    #[validate(length(min = 1, max = 50))]
    pub enrollment_number: Option<String>,
    #[validate(length(min = 1))]
    pub department: Option<String>,
    #[validate(length(min = 1))]
    pub course: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub year: Option<i32>,
    pub cgpa: Option<Decimal>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyPayload {
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    #[validate(length(min = 1))]
    pub industry: String,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, max = 200))]
    pub company_name: Option<String>,
    #[validate(length(min = 1))]
    pub industry: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}
