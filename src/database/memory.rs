//! In-process Directory Store.
//!
//! All tables sit behind one async mutex. A unit of work takes the lock for its whole
//! lifetime and edits a private copy, so concurrent units of work are serialized and
//! an uncommitted one leaves no trace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::store::{
    ApplicationFilter, DirectoryStore, DirectoryTotals, DirectoryTx, ListingFilter,
    NotificationWriter, RegistrationFilter, StoreError, StoreResult, APPLICATION_UNIQUE,
    COMPANY_OWNER_UNIQUE, EMAIL_UNIQUE, ENROLLMENT_UNIQUE, REGISTRATION_UNIQUE,
    STUDENT_OWNER_UNIQUE, USERNAME_UNIQUE,
};
use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    approval::{ApprovalState, LifecycleStatus},
    audit_log::{AuditLog, NewAuditLog},
    company::{Company, NewCompany},
    drive::{NewRecruitmentDrive, RecruitmentDrive},
    event::{CampusEvent, EventRegistration, NewCampusEvent, NewEventRegistration},
    job::{JobPosting, NewJobPosting},
    notification::{NewNotification, Notification},
    student::{NewStudentProfile, StudentProfile},
    user::{NewUser, Role, User},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    students: HashMap<Uuid, StudentProfile>,
    companies: HashMap<Uuid, Company>,
    jobs: HashMap<Uuid, JobPosting>,
    applications: HashMap<Uuid, Application>,
    drives: HashMap<Uuid, RecruitmentDrive>,
    events: HashMap<Uuid, CampusEvent>,
    registrations: HashMap<Uuid, EventRegistration>,
    notifications: HashMap<Uuid, Notification>,
    audit_logs: Vec<AuditLog>,
}

#[derive(Clone, Default)]
pub struct MemoryDirectoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_notification_writes: Arc<AtomicBool>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent notification batch fail, for exercising rollback paths.
    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail_notification_writes.store(fail, Ordering::SeqCst);
    }

    /// Committed audit entries, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditLog> {
        self.tables.lock().await.audit_logs.clone()
    }

    /// Number of committed notification rows.
    pub async fn notification_count(&self) -> usize {
        self.tables.lock().await.notifications.len()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn DirectoryTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            work,
            fail_notification_writes: self.fail_notification_writes.load(Ordering::SeqCst),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    fail_notification_writes: bool,
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict {
        constraint: constraint.to_string(),
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

impl MemoryTx {
    fn listing_matches(
        filter: &ListingFilter,
        company_id: Option<Uuid>,
        approval: ApprovalState,
    ) -> bool {
        if let Some(wanted) = filter.company_id {
            if company_id != Some(wanted) {
                return false;
            }
        }
        !filter.approved_only || approval.is_approved()
    }

    fn application_matches(&self, filter: &ApplicationFilter, app: &Application) -> bool {
        if filter.student_id.is_some_and(|id| app.student_id != id) {
            return false;
        }
        if filter.job_id.is_some_and(|id| app.job_id != id) {
            return false;
        }
        if filter.status.is_some_and(|status| app.status != status) {
            return false;
        }
        if let Some(company_id) = filter.company_id {
            let owned = self
                .work
                .jobs
                .get(&app.job_id)
                .is_some_and(|job| job.company_id == company_id);
            if !owned {
                return false;
            }
        }
        true
    }

    fn check_student_uniques(&self, profile_id: Uuid, user_id: Uuid, enrollment: &str) -> StoreResult<()> {
        for other in self.work.students.values() {
            if other.id == profile_id {
                continue;
            }
            if other.enrollment_number == enrollment {
                return Err(conflict(ENROLLMENT_UNIQUE));
            }
            if other.user_id == user_id {
                return Err(conflict(STUDENT_OWNER_UNIQUE));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationWriter for MemoryTx {
    async fn approved_user_ids(&mut self, role: Option<Role>) -> StoreResult<Vec<Uuid>> {
        let mut users: Vec<&User> = self
            .work
            .users
            .values()
            .filter(|user| user.is_approved && role.map_or(true, |role| user.role == role))
            .collect();
        users.sort_by_key(|user| user.created_at);
        Ok(users.into_iter().map(|user| user.id).collect())
    }

    async fn insert_notifications(&mut self, batch: &[NewNotification]) -> StoreResult<u64> {
        if self.fail_notification_writes {
            return Err(StoreError::Unavailable(
                "notification writes are disabled".to_string(),
            ));
        }
        if let Some(missing) = batch
            .iter()
            .find(|draft| !self.work.users.contains_key(&draft.recipient_id))
        {
            return Err(StoreError::Unavailable(format!(
                "recipient {} does not exist",
                missing.recipient_id
            )));
        }
        let now = Utc::now();
        for draft in batch {
            let row = Notification {
                id: Uuid::new_v4(),
                recipient_id: draft.recipient_id,
                title: draft.title.clone(),
                message: draft.message.clone(),
                notification_type: draft.notification_type,
                link: draft.link.clone(),
                is_read: false,
                created_at: now,
            };
            self.work.notifications.insert(row.id, row);
        }
        Ok(batch.len() as u64)
    }
}

#[async_trait]
impl DirectoryTx for MemoryTx {
    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        for other in self.work.users.values() {
            if other.username == user.username {
                return Err(conflict(USERNAME_UNIQUE));
            }
            if other.email.eq_ignore_ascii_case(&user.email) {
                return Err(conflict(EMAIL_UNIQUE));
            }
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_superuser: user.is_superuser,
            is_approved: user.is_approved,
            created_at: now,
            updated_at: now,
        };
        self.work.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_user_approved(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.work.users.get_mut(&id).map(|user| {
            user.is_approved = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn pending_users(&mut self) -> StoreResult<Vec<User>> {
        let users = self
            .work
            .users
            .values()
            .filter(|user| !user.is_approved)
            .cloned()
            .collect();
        Ok(newest_first(users, |user| user.created_at))
    }

    async fn count_users(&mut self) -> StoreResult<i64> {
        Ok(self.work.users.len() as i64)
    }

    async fn delete_user(&mut self, id: Uuid) -> StoreResult<bool> {
        let Some(user) = self.work.users.remove(&id) else {
            return Ok(false);
        };

        let student_ids: Vec<Uuid> = self
            .work
            .students
            .values()
            .filter(|profile| profile.user_id == user.id)
            .map(|profile| profile.id)
            .collect();
        for student_id in &student_ids {
            self.work
                .registrations
                .retain(|_, reg| reg.student_id != *student_id);
            self.work
                .applications
                .retain(|_, app| app.student_id != *student_id);
            self.work.students.remove(student_id);
        }

        let company_ids: Vec<Uuid> = self
            .work
            .companies
            .values()
            .filter(|company| company.user_id == user.id)
            .map(|company| company.id)
            .collect();
        for company_id in &company_ids {
            let job_ids: Vec<Uuid> = self
                .work
                .jobs
                .values()
                .filter(|job| job.company_id == *company_id)
                .map(|job| job.id)
                .collect();
            self.work
                .applications
                .retain(|_, app| !job_ids.contains(&app.job_id));
            self.work
                .drives
                .retain(|_, drive| drive.company_id != *company_id);
            self.work.jobs.retain(|_, job| job.company_id != *company_id);
            for event in self.work.events.values_mut() {
                if event.company_id == Some(*company_id) {
                    event.company_id = None;
                }
            }
            self.work.companies.remove(company_id);
        }

        for job in self.work.jobs.values_mut() {
            if job.created_by == Some(user.id) {
                job.created_by = None;
            }
        }
        for drive in self.work.drives.values_mut() {
            if drive.created_by == Some(user.id) {
                drive.created_by = None;
            }
        }
        for event in self.work.events.values_mut() {
            if event.created_by == Some(user.id) {
                event.created_by = None;
            }
        }

        self.work
            .notifications
            .retain(|_, notification| notification.recipient_id != user.id);
        Ok(true)
    }

    async fn student_profile_for_user(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Option<StudentProfile>> {
        Ok(self
            .work
            .students
            .values()
            .find(|profile| profile.user_id == user_id)
            .cloned())
    }

    async fn get_student_profile(&mut self, id: Uuid) -> StoreResult<Option<StudentProfile>> {
        Ok(self.work.students.get(&id).cloned())
    }

    async fn insert_student_profile(
        &mut self,
        profile: NewStudentProfile,
    ) -> StoreResult<StudentProfile> {
        let id = Uuid::new_v4();
        self.check_student_uniques(id, profile.user_id, &profile.enrollment_number)?;
        let now = Utc::now();
        let row = StudentProfile {
            id,
            user_id: profile.user_id,
            enrollment_number: profile.enrollment_number,
            department: profile.department,
            course: profile.course,
            year: profile.year,
            cgpa: profile.cgpa,
            phone: profile.phone,
            skills: profile.skills,
            created_at: now,
            updated_at: now,
        };
        self.work.students.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_student_profile(
        &mut self,
        profile: &StudentProfile,
    ) -> StoreResult<StudentProfile> {
        if !self.work.students.contains_key(&profile.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        self.check_student_uniques(profile.id, profile.user_id, &profile.enrollment_number)?;
        let mut row = profile.clone();
        row.updated_at = Utc::now();
        self.work.students.insert(row.id, row.clone());
        Ok(row)
    }

    async fn company_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self
            .work
            .companies
            .values()
            .find(|company| company.user_id == user_id)
            .cloned())
    }

    async fn get_company(&mut self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.work.companies.get(&id).cloned())
    }

    async fn insert_company(&mut self, company: NewCompany) -> StoreResult<Company> {
        if self
            .work
            .companies
            .values()
            .any(|other| other.user_id == company.user_id)
        {
            return Err(conflict(COMPANY_OWNER_UNIQUE));
        }
        let now = Utc::now();
        let row = Company {
            id: Uuid::new_v4(),
            user_id: company.user_id,
            company_name: company.company_name,
            industry: company.industry,
            website: company.website,
            description: company.description,
            address: company.address,
            phone: company.phone,
            created_at: now,
            updated_at: now,
        };
        self.work.companies.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_company(&mut self, company: &Company) -> StoreResult<Company> {
        if !self.work.companies.contains_key(&company.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let mut row = company.clone();
        row.updated_at = Utc::now();
        self.work.companies.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_job(&mut self, job: NewJobPosting) -> StoreResult<JobPosting> {
        let now = Utc::now();
        let row = JobPosting {
            id: Uuid::new_v4(),
            company_id: job.company_id,
            title: job.title,
            description: job.description,
            job_type: job.job_type,
            department: job.department,
            required_skills: job.required_skills,
            min_cgpa: job.min_cgpa,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            location: job.location,
            application_deadline: job.application_deadline,
            is_active: job.is_active,
            approval_status: job.approval_status,
            created_by: job.created_by,
            created_at: now,
            updated_at: now,
        };
        self.work.jobs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        Ok(self.work.jobs.get(&id).cloned())
    }

    async fn lock_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        self.get_job(id).await
    }

    async fn list_jobs(&mut self, filter: ListingFilter) -> StoreResult<Vec<JobPosting>> {
        let jobs = self
            .work
            .jobs
            .values()
            .filter(|job| {
                Self::listing_matches(&filter, Some(job.company_id), job.approval_status)
                    && (!filter.active_only || job.is_active)
            })
            .cloned()
            .collect();
        Ok(newest_first(jobs, |job| job.created_at))
    }

    async fn update_job(&mut self, job: &JobPosting) -> StoreResult<JobPosting> {
        if !self.work.jobs.contains_key(&job.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let mut row = job.clone();
        row.updated_at = Utc::now();
        self.work.jobs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_job(&mut self, id: Uuid) -> StoreResult<bool> {
        if self.work.jobs.remove(&id).is_none() {
            return Ok(false);
        }
        self.work.applications.retain(|_, app| app.job_id != id);
        for drive in self.work.drives.values_mut() {
            if drive.job_id == Some(id) {
                drive.job_id = None;
            }
        }
        Ok(true)
    }

    async fn application_exists(&mut self, student_id: Uuid, job_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .work
            .applications
            .values()
            .any(|app| app.student_id == student_id && app.job_id == job_id))
    }

    async fn insert_application(
        &mut self,
        application: NewApplication,
    ) -> StoreResult<Application> {
        if self
            .application_exists(application.student_id, application.job_id)
            .await?
        {
            return Err(conflict(APPLICATION_UNIQUE));
        }
        let now = Utc::now();
        let row = Application {
            id: Uuid::new_v4(),
            student_id: application.student_id,
            job_id: application.job_id,
            status: ApplicationStatus::Applied,
            cover_letter: application.cover_letter,
            interview_date: None,
            interview_location: None,
            notes: None,
            applied_at: now,
            updated_at: now,
        };
        self.work.applications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_application(&mut self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.work.applications.get(&id).cloned())
    }

    async fn lock_application(&mut self, id: Uuid) -> StoreResult<Option<Application>> {
        self.get_application(id).await
    }

    async fn list_applications(
        &mut self,
        filter: ApplicationFilter,
    ) -> StoreResult<Vec<Application>> {
        let apps = self
            .work
            .applications
            .values()
            .filter(|app| self.application_matches(&filter, app))
            .cloned()
            .collect();
        Ok(newest_first(apps, |app| app.applied_at))
    }

    async fn update_application(
        &mut self,
        application: &Application,
    ) -> StoreResult<Application> {
        if !self.work.applications.contains_key(&application.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let mut row = application.clone();
        row.updated_at = Utc::now();
        self.work.applications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_drive(&mut self, drive: NewRecruitmentDrive) -> StoreResult<RecruitmentDrive> {
        let now = Utc::now();
        let row = RecruitmentDrive {
            id: Uuid::new_v4(),
            company_id: drive.company_id,
            job_id: drive.job_id,
            title: drive.title,
            description: drive.description,
            drive_date: drive.drive_date,
            location: drive.location,
            venue: drive.venue,
            coordinator_notes: drive.coordinator_notes,
            status: LifecycleStatus::Scheduled,
            approval_status: drive.approval_status,
            created_by: drive.created_by,
            created_at: now,
            updated_at: now,
        };
        self.work.drives.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>> {
        Ok(self.work.drives.get(&id).cloned())
    }

    async fn lock_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>> {
        self.get_drive(id).await
    }

    async fn list_drives(&mut self, filter: ListingFilter) -> StoreResult<Vec<RecruitmentDrive>> {
        let drives = self
            .work
            .drives
            .values()
            .filter(|drive| {
                Self::listing_matches(&filter, Some(drive.company_id), drive.approval_status)
            })
            .cloned()
            .collect();
        Ok(newest_first(drives, |drive| drive.drive_date))
    }

    async fn update_drive(&mut self, drive: &RecruitmentDrive) -> StoreResult<RecruitmentDrive> {
        if !self.work.drives.contains_key(&drive.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let mut row = drive.clone();
        row.updated_at = Utc::now();
        self.work.drives.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_drive(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(self.work.drives.remove(&id).is_some())
    }

    async fn insert_event(&mut self, event: NewCampusEvent) -> StoreResult<CampusEvent> {
        let now = Utc::now();
        let row = CampusEvent {
            id: Uuid::new_v4(),
            company_id: event.company_id,
            title: event.title,
            description: event.description,
            event_type: event.event_type,
            event_date: event.event_date,
            location: event.location,
            venue: event.venue,
            organizer: event.organizer,
            max_participants: event.max_participants,
            registration_required: event.registration_required,
            status: LifecycleStatus::Scheduled,
            approval_status: event.approval_status,
            created_by: event.created_by,
            created_at: now,
            updated_at: now,
        };
        self.work.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>> {
        Ok(self.work.events.get(&id).cloned())
    }

    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>> {
        self.get_event(id).await
    }

    async fn list_events(&mut self, filter: ListingFilter) -> StoreResult<Vec<CampusEvent>> {
        let events = self
            .work
            .events
            .values()
            .filter(|event| Self::listing_matches(&filter, event.company_id, event.approval_status))
            .cloned()
            .collect();
        Ok(newest_first(events, |event| event.event_date))
    }

    async fn update_event(&mut self, event: &CampusEvent) -> StoreResult<CampusEvent> {
        if !self.work.events.contains_key(&event.id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let mut row = event.clone();
        row.updated_at = Utc::now();
        self.work.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_event(&mut self, id: Uuid) -> StoreResult<bool> {
        if self.work.events.remove(&id).is_none() {
            return Ok(false);
        }
        self.work.registrations.retain(|_, reg| reg.event_id != id);
        Ok(true)
    }

    async fn registration_exists(&mut self, student_id: Uuid, event_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .work
            .registrations
            .values()
            .any(|reg| reg.student_id == student_id && reg.event_id == event_id))
    }

    async fn count_registrations(&mut self, event_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .work
            .registrations
            .values()
            .filter(|reg| reg.event_id == event_id)
            .count() as i64)
    }

    async fn insert_registration(
        &mut self,
        registration: NewEventRegistration,
    ) -> StoreResult<EventRegistration> {
        if self
            .registration_exists(registration.student_id, registration.event_id)
            .await?
        {
            return Err(conflict(REGISTRATION_UNIQUE));
        }
        let row = EventRegistration {
            id: Uuid::new_v4(),
            event_id: registration.event_id,
            student_id: registration.student_id,
            registered_at: Utc::now(),
            attended: false,
            notes: registration.notes,
        };
        self.work.registrations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_registrations(
        &mut self,
        filter: RegistrationFilter,
    ) -> StoreResult<Vec<EventRegistration>> {
        let regs = self
            .work
            .registrations
            .values()
            .filter(|reg| {
                filter.event_id.map_or(true, |id| reg.event_id == id)
                    && filter.student_id.map_or(true, |id| reg.student_id == id)
            })
            .cloned()
            .collect();
        Ok(newest_first(regs, |reg| reg.registered_at))
    }

    async fn list_notifications(&mut self, recipient_id: Uuid) -> StoreResult<Vec<Notification>> {
        let rows = self
            .work
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |n| n.created_at))
    }

    async fn get_notification(&mut self, id: Uuid) -> StoreResult<Option<Notification>> {
        Ok(self.work.notifications.get(&id).cloned())
    }

    async fn mark_notification_read(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(self
            .work
            .notifications
            .get_mut(&id)
            .map(|n| n.is_read = true)
            .is_some())
    }

    async fn mark_all_notifications_read(&mut self, recipient_id: Uuid) -> StoreResult<u64> {
        let mut changed = 0;
        for n in self.work.notifications.values_mut() {
            if n.recipient_id == recipient_id && !n.is_read {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn count_unread_notifications(&mut self, recipient_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .work
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn insert_audit(&mut self, entry: NewAuditLog) -> StoreResult<()> {
        self.work.audit_logs.push(AuditLog {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action.to_string(),
            entity_type: entry.entity_type.to_string(),
            entity_id: entry.entity_id,
            changes: entry.changes,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn directory_totals(&mut self) -> StoreResult<DirectoryTotals> {
        let jobs = &self.work.jobs;
        let mut placed: Vec<Uuid> = self
            .work
            .applications
            .values()
            .filter(|app| app.status.is_placed())
            .map(|app| app.student_id)
            .collect();
        placed.sort();
        placed.dedup();
        Ok(DirectoryTotals {
            students: self.work.students.len() as i64,
            companies: self.work.companies.len() as i64,
            jobs: jobs.len() as i64,
            active_jobs: jobs.values().filter(|job| job.is_active).count() as i64,
            pending_jobs: jobs
                .values()
                .filter(|job| job.approval_status == ApprovalState::Pending)
                .count() as i64,
            applications: self.work.applications.len() as i64,
            placed_students: placed.len() as i64,
        })
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx {
            mut guard, work, ..
        } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{event::EventType, job::JobType, notification::NotificationType};

    fn new_user(name: &str, role: Role) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@campus.test"),
            first_name: name.into(),
            last_name: String::new(),
            role,
            is_superuser: false,
            is_approved: true,
        }
    }

    fn new_job(company_id: Uuid, created_by: Uuid) -> NewJobPosting {
        NewJobPosting {
            company_id,
            title: "Platform Engineer".into(),
            description: String::new(),
            job_type: JobType::FullTime,
            department: "Engineering".into(),
            required_skills: Vec::new(),
            min_cgpa: None,
            salary_min: None,
            salary_max: None,
            location: "Remote".into(),
            application_deadline: Utc::now(),
            is_active: true,
            approval_status: ApprovalState::Approved,
            created_by: Some(created_by),
        }
    }

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let store = MemoryDirectoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(new_user("ghost", Role::Student)).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicates_fail_with_the_named_constraint() {
        let store = MemoryDirectoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(new_user("asha", Role::Student)).await.unwrap();

        let err = tx
            .insert_user(new_user("asha", Role::Student))
            .await
            .unwrap_err();
        assert!(err.is_conflict_on(USERNAME_UNIQUE));

        let err = tx
            .insert_user(NewUser {
                username: "asha2".into(),
                email: "ASHA@campus.test".into(),
                ..new_user("asha2", Role::Student)
            })
            .await
            .unwrap_err();
        assert!(err.is_conflict_on(EMAIL_UNIQUE));
    }

    #[tokio::test]
    async fn deleting_a_company_account_follows_the_ownership_policy() {
        let store = MemoryDirectoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let student = tx.insert_user(new_user("asha", Role::Student)).await.unwrap();
        let profile = tx
            .insert_student_profile(NewStudentProfile::placeholder(student.id))
            .await
            .unwrap();
        let owner = tx.insert_user(new_user("acme", Role::Company)).await.unwrap();
        let company = tx
            .insert_company(NewCompany::placeholder(owner.id, "Acme"))
            .await
            .unwrap();
        let job = tx.insert_job(new_job(company.id, owner.id)).await.unwrap();
        tx.insert_application(NewApplication {
            student_id: profile.id,
            job_id: job.id,
            cover_letter: None,
        })
        .await
        .unwrap();
        let event = tx
            .insert_event(NewCampusEvent {
                company_id: Some(company.id),
                title: "Tech Talk".into(),
                description: String::new(),
                event_type: EventType::Seminar,
                event_date: Utc::now(),
                location: "Auditorium".into(),
                venue: "Main".into(),
                organizer: "Acme".into(),
                max_participants: None,
                registration_required: false,
                approval_status: ApprovalState::Approved,
                created_by: Some(owner.id),
            })
            .await
            .unwrap();
        tx.insert_notifications(&[NewNotification {
            recipient_id: owner.id,
            title: "Welcome".into(),
            message: "Hello".into(),
            notification_type: NotificationType::Announcement,
            link: None,
        }])
        .await
        .unwrap();

        assert!(tx.delete_user(owner.id).await.unwrap());
        assert!(!tx.delete_user(owner.id).await.unwrap());

        assert!(tx.get_company(company.id).await.unwrap().is_none());
        assert!(tx.get_job(job.id).await.unwrap().is_none());
        assert!(!tx.application_exists(profile.id, job.id).await.unwrap());
        assert!(tx.list_notifications(owner.id).await.unwrap().is_empty());

        let kept = tx.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(kept.company_id, None);
        assert_eq!(kept.created_by, None);
        assert!(tx.get_student_profile(profile.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn notification_batches_are_all_or_nothing() {
        let store = MemoryDirectoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(new_user("asha", Role::Student)).await.unwrap();

        let note = |recipient_id| NewNotification {
            recipient_id,
            title: "Hi".into(),
            message: "There".into(),
            notification_type: NotificationType::Announcement,
            link: None,
        };
        let result = tx
            .insert_notifications(&[note(user.id), note(Uuid::new_v4())])
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(tx.list_notifications(user.id).await.unwrap().is_empty());
    }
}
