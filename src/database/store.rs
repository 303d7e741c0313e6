//! Directory Store contract.
//!
//! Every engine operation opens one unit of work with [`DirectoryStore::begin`],
//! performs its reads and writes through the returned [`DirectoryTx`], and calls
//! [`DirectoryTx::commit`] exactly once. Dropping a unit of work without committing
//! discards all of its writes.
//!
//! Uniqueness is enforced by the store itself, not only by callers checking first:
//! a duplicate insert fails with [`StoreError::Conflict`] naming one of the
//! constraint constants below.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    audit_log::NewAuditLog,
    company::{Company, NewCompany},
    drive::{NewRecruitmentDrive, RecruitmentDrive},
    event::{CampusEvent, EventRegistration, NewCampusEvent, NewEventRegistration},
    job::{JobPosting, NewJobPosting},
    notification::{NewNotification, Notification},
    student::{NewStudentProfile, StudentProfile},
    user::{NewUser, Role, User},
};

pub const APPLICATION_UNIQUE: &str = "applications_student_job_key";
pub const REGISTRATION_UNIQUE: &str = "event_registrations_student_event_key";
pub const ENROLLMENT_UNIQUE: &str = "student_profiles_enrollment_number_key";
pub const STUDENT_OWNER_UNIQUE: &str = "student_profiles_user_id_key";
pub const COMPANY_OWNER_UNIQUE: &str = "companies_user_id_key";
pub const USERNAME_UNIQUE: &str = "users_username_key";
pub const EMAIL_UNIQUE: &str = "users_email_key";

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict_on(&self, name: &str) -> bool {
        matches!(self, StoreError::Conflict { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Narrows listings of jobs, drives and events.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingFilter {
    pub company_id: Option<Uuid>,
    pub approved_only: bool,
    /// Only meaningful for job postings.
    pub active_only: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationFilter {
    pub student_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    /// Applications to any job owned by this company.
    pub company_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationFilter {
    pub event_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
}

/// Directory-wide counters for staff dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DirectoryTotals {
    pub students: i64,
    pub companies: i64,
    pub jobs: i64,
    pub active_jobs: i64,
    pub pending_jobs: i64,
    pub applications: i64,
    pub placed_students: i64,
}

/// The slice of the store the notification fanout needs: recipient lookup and an
/// all-or-nothing batch insert.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationWriter: Send {
    /// Ids of approved users, optionally narrowed to one role.
    async fn approved_user_ids(&mut self, role: Option<Role>) -> StoreResult<Vec<Uuid>>;

    /// Inserts the whole batch or nothing; returns the number of rows written.
    async fn insert_notifications(&mut self, batch: &[NewNotification]) -> StoreResult<u64>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn DirectoryTx>>;
}

/// One unit of work against the directory.
///
/// `lock_*` methods return the row and hold it against concurrent writers until the
/// unit of work ends; they are used wherever a read decides a subsequent write.
#[async_trait]
pub trait DirectoryTx: NotificationWriter {
    // users
    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<User>>;
    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User>;
    async fn set_user_approved(&mut self, id: Uuid) -> StoreResult<Option<User>>;
    async fn pending_users(&mut self) -> StoreResult<Vec<User>>;
    async fn count_users(&mut self) -> StoreResult<i64>;
    /// Removes a user and everything that depends on it, in this unit of work:
    /// - student: event registrations, applications, profile;
    /// - company: applications to its jobs, its drives, its jobs, its profile; events
    ///   it was attached to are kept with `company_id` cleared;
    /// - every role: notifications addressed to the user; listings the user authored
    ///   are kept with `created_by` cleared.
    ///
    /// Returns false when no such user exists.
    async fn delete_user(&mut self, id: Uuid) -> StoreResult<bool>;

    // profiles
    async fn student_profile_for_user(&mut self, user_id: Uuid)
        -> StoreResult<Option<StudentProfile>>;
    async fn get_student_profile(&mut self, id: Uuid) -> StoreResult<Option<StudentProfile>>;
    async fn insert_student_profile(
        &mut self,
        profile: NewStudentProfile,
    ) -> StoreResult<StudentProfile>;
    async fn update_student_profile(
        &mut self,
        profile: &StudentProfile,
    ) -> StoreResult<StudentProfile>;
    async fn company_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Company>>;
    async fn get_company(&mut self, id: Uuid) -> StoreResult<Option<Company>>;
    async fn insert_company(&mut self, company: NewCompany) -> StoreResult<Company>;
    async fn update_company(&mut self, company: &Company) -> StoreResult<Company>;

    // job postings
    async fn insert_job(&mut self, job: NewJobPosting) -> StoreResult<JobPosting>;
    async fn get_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>>;
    async fn lock_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>>;
    async fn list_jobs(&mut self, filter: ListingFilter) -> StoreResult<Vec<JobPosting>>;
    async fn update_job(&mut self, job: &JobPosting) -> StoreResult<JobPosting>;
    /// Deletes the posting and its applications; drives pointing at it are unlinked.
    async fn delete_job(&mut self, id: Uuid) -> StoreResult<bool>;

    // applications
    async fn application_exists(&mut self, student_id: Uuid, job_id: Uuid) -> StoreResult<bool>;
    async fn insert_application(&mut self, application: NewApplication)
        -> StoreResult<Application>;
    async fn get_application(&mut self, id: Uuid) -> StoreResult<Option<Application>>;
    async fn lock_application(&mut self, id: Uuid) -> StoreResult<Option<Application>>;
    async fn list_applications(&mut self, filter: ApplicationFilter)
        -> StoreResult<Vec<Application>>;
    async fn update_application(&mut self, application: &Application)
        -> StoreResult<Application>;

    // recruitment drives
    async fn insert_drive(&mut self, drive: NewRecruitmentDrive) -> StoreResult<RecruitmentDrive>;
    async fn get_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>>;
    async fn lock_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>>;
    async fn list_drives(&mut self, filter: ListingFilter) -> StoreResult<Vec<RecruitmentDrive>>;
    async fn update_drive(&mut self, drive: &RecruitmentDrive) -> StoreResult<RecruitmentDrive>;
    async fn delete_drive(&mut self, id: Uuid) -> StoreResult<bool>;

    // campus events and registrations
    async fn insert_event(&mut self, event: NewCampusEvent) -> StoreResult<CampusEvent>;
    async fn get_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>>;
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>>;
    async fn list_events(&mut self, filter: ListingFilter) -> StoreResult<Vec<CampusEvent>>;
    async fn update_event(&mut self, event: &CampusEvent) -> StoreResult<CampusEvent>;
    /// Deletes the event and its registrations.
    async fn delete_event(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn registration_exists(&mut self, student_id: Uuid, event_id: Uuid)
        -> StoreResult<bool>;
    async fn count_registrations(&mut self, event_id: Uuid) -> StoreResult<i64>;
    async fn insert_registration(
        &mut self,
        registration: NewEventRegistration,
    ) -> StoreResult<EventRegistration>;
    async fn list_registrations(
        &mut self,
        filter: RegistrationFilter,
    ) -> StoreResult<Vec<EventRegistration>>;

    // notifications (read side)
    async fn list_notifications(&mut self, recipient_id: Uuid) -> StoreResult<Vec<Notification>>;
    async fn get_notification(&mut self, id: Uuid) -> StoreResult<Option<Notification>>;
    async fn mark_notification_read(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&mut self, recipient_id: Uuid) -> StoreResult<u64>;
    async fn count_unread_notifications(&mut self, recipient_id: Uuid) -> StoreResult<i64>;

    // audit + reporting
    async fn insert_audit(&mut self, entry: NewAuditLog) -> StoreResult<()>;
    async fn directory_totals(&mut self) -> StoreResult<DirectoryTotals>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
