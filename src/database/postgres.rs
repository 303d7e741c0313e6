use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::store::{
    ApplicationFilter, DirectoryStore, DirectoryTotals, DirectoryTx, ListingFilter,
    NotificationWriter, RegistrationFilter, StoreError, StoreResult,
};
use crate::models::{
    application::{Application, NewApplication},
    audit_log::NewAuditLog,
    company::{Company, NewCompany},
    drive::{NewRecruitmentDrive, RecruitmentDrive},
    event::{CampusEvent, EventRegistration, NewCampusEvent, NewEventRegistration},
    job::{JobPosting, NewJobPosting},
    notification::{NewNotification, Notification},
    student::{NewStudentProfile, StudentProfile},
    user::{NewUser, Role, User},
};

#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn DirectoryTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl NotificationWriter for PgTx {
    async fn approved_user_ids(&mut self, role: Option<Role>) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE is_approved AND ($1::text IS NULL OR role = $1)
            ORDER BY created_at
            "#,
        )
        .bind(role)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }

    async fn insert_notifications(&mut self, batch: &[NewNotification]) -> StoreResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut recipients = Vec::with_capacity(batch.len());
        let mut titles = Vec::with_capacity(batch.len());
        let mut messages = Vec::with_capacity(batch.len());
        let mut types = Vec::with_capacity(batch.len());
        let mut links = Vec::with_capacity(batch.len());
        for n in batch {
            recipients.push(n.recipient_id);
            titles.push(n.title.clone());
            messages.push(n.message.clone());
            types.push(n.notification_type.as_str().to_string());
            links.push(n.link.clone());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, title, message, notification_type, link)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[])
            "#,
        )
        .bind(&recipients)
        .bind(&titles)
        .bind(&messages)
        .bind(&types)
        .bind(&links)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DirectoryTx for PgTx {
    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, role, is_superuser, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(user.is_superuser)
        .bind(user.is_approved)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn set_user_approved(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_approved = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn pending_users(&mut self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE NOT is_approved ORDER BY created_at DESC",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(users)
    }

    async fn count_users(&mut self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn delete_user(&mut self, id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        // student side
        sqlx::query(
            r#"
            DELETE FROM event_registrations
            WHERE student_id IN (SELECT id FROM student_profiles WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query(
            r#"
            DELETE FROM applications
            WHERE student_id IN (SELECT id FROM student_profiles WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query("DELETE FROM student_profiles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        // company side
        sqlx::query(
            r#"
            DELETE FROM applications
            WHERE job_id IN (
                SELECT j.id FROM job_postings j
                JOIN companies c ON c.id = j.company_id
                WHERE c.user_id = $1
            )
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query(
            r#"
            DELETE FROM recruitment_drives
            WHERE company_id IN (SELECT id FROM companies WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query(
            r#"
            DELETE FROM job_postings
            WHERE company_id IN (SELECT id FROM companies WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query(
            r#"
            UPDATE campus_events SET company_id = NULL
            WHERE company_id IN (SELECT id FROM companies WHERE user_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        sqlx::query("DELETE FROM companies WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        // authored listings outlive their author
        for table in ["job_postings", "recruitment_drives", "campus_events"] {
            sqlx::query(&format!(
                "UPDATE {} SET created_by = NULL WHERE created_by = $1",
                table
            ))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        }

        sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn student_profile_for_user(
        &mut self,
        user_id: Uuid,
    ) -> StoreResult<Option<StudentProfile>> {
        let profile =
            sqlx::query_as::<_, StudentProfile>("SELECT * FROM student_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(profile)
    }

    async fn get_student_profile(&mut self, id: Uuid) -> StoreResult<Option<StudentProfile>> {
        let profile =
            sqlx::query_as::<_, StudentProfile>("SELECT * FROM student_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(profile)
    }

    async fn insert_student_profile(
        &mut self,
        profile: NewStudentProfile,
    ) -> StoreResult<StudentProfile> {
        let row = sqlx::query_as::<_, StudentProfile>(
            r#"
            INSERT INTO student_profiles
                (user_id, enrollment_number, department, course, year, cgpa, phone, skills)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.enrollment_number)
        .bind(&profile.department)
        .bind(&profile.course)
        .bind(profile.year)
        .bind(profile.cgpa)
        .bind(&profile.phone)
        .bind(&profile.skills)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_student_profile(
        &mut self,
        profile: &StudentProfile,
    ) -> StoreResult<StudentProfile> {
        let row = sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE student_profiles
            SET enrollment_number = $2, department = $3, course = $4, year = $5,
                cgpa = $6, phone = $7, skills = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.enrollment_number)
        .bind(&profile.department)
        .bind(&profile.course)
        .bind(profile.year)
        .bind(profile.cgpa)
        .bind(&profile.phone)
        .bind(&profile.skills)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn company_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(company)
    }

    async fn get_company(&mut self, id: Uuid) -> StoreResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(company)
    }

    async fn insert_company(&mut self, company: NewCompany) -> StoreResult<Company> {
        let row = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies
                (user_id, company_name, industry, website, description, address, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company.user_id)
        .bind(&company.company_name)
        .bind(&company.industry)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.address)
        .bind(&company.phone)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_company(&mut self, company: &Company) -> StoreResult<Company> {
        let row = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET company_name = $2, industry = $3, website = $4, description = $5,
                address = $6, phone = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(company.id)
        .bind(&company.company_name)
        .bind(&company.industry)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.address)
        .bind(&company.phone)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_job(&mut self, job: NewJobPosting) -> StoreResult<JobPosting> {
        let row = sqlx::query_as::<_, JobPosting>(
            r#"
            INSERT INTO job_postings (
                company_id, title, description, job_type, department, required_skills,
                min_cgpa, salary_min, salary_max, location, application_deadline,
                is_active, approval_status, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(job.company_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.job_type)
        .bind(&job.department)
        .bind(&job.required_skills)
        .bind(job.min_cgpa)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.location)
        .bind(job.application_deadline)
        .bind(job.is_active)
        .bind(job.approval_status)
        .bind(job.created_by)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn get_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let job = sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(job)
    }

    async fn lock_job(&mut self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let job = sqlx::query_as::<_, JobPosting>(
            "SELECT * FROM job_postings WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(job)
    }

    async fn list_jobs(&mut self, filter: ListingFilter) -> StoreResult<Vec<JobPosting>> {
        let jobs = sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT * FROM job_postings
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND (NOT $2 OR approval_status = 'approved')
              AND (NOT $3 OR is_active)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.approved_only)
        .bind(filter.active_only)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(jobs)
    }

    async fn update_job(&mut self, job: &JobPosting) -> StoreResult<JobPosting> {
        let row = sqlx::query_as::<_, JobPosting>(
            r#"
            UPDATE job_postings
            SET title = $2, description = $3, job_type = $4, department = $5,
                required_skills = $6, min_cgpa = $7, salary_min = $8, salary_max = $9,
                location = $10, application_deadline = $11, is_active = $12,
                approval_status = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.job_type)
        .bind(&job.department)
        .bind(&job.required_skills)
        .bind(job.min_cgpa)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.location)
        .bind(job.application_deadline)
        .bind(job.is_active)
        .bind(job.approval_status)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_job(&mut self, id: Uuid) -> StoreResult<bool> {
        sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("UPDATE recruitment_drives SET job_id = NULL WHERE job_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        let result = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn application_exists(&mut self, student_id: Uuid, job_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE student_id = $1 AND job_id = $2)",
        )
        .bind(student_id)
        .bind(job_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_application(
        &mut self,
        application: NewApplication,
    ) -> StoreResult<Application> {
        let row = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (student_id, job_id, cover_letter)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(application.student_id)
        .bind(application.job_id)
        .bind(&application.cover_letter)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn get_application(&mut self, id: Uuid) -> StoreResult<Option<Application>> {
        let app = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(app)
    }

    async fn lock_application(&mut self, id: Uuid) -> StoreResult<Option<Application>> {
        let app = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(app)
    }

    async fn list_applications(
        &mut self,
        filter: ApplicationFilter,
    ) -> StoreResult<Vec<Application>> {
        let apps = sqlx::query_as::<_, Application>(
            r#"
            SELECT a.* FROM applications a
            JOIN job_postings j ON j.id = a.job_id
            WHERE ($1::uuid IS NULL OR a.student_id = $1)
              AND ($2::uuid IS NULL OR a.job_id = $2)
              AND ($3::uuid IS NULL OR j.company_id = $3)
              AND ($4::text IS NULL OR a.status = $4)
            ORDER BY a.applied_at DESC
            "#,
        )
        .bind(filter.student_id)
        .bind(filter.job_id)
        .bind(filter.company_id)
        .bind(filter.status)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(apps)
    }

    async fn update_application(
        &mut self,
        application: &Application,
    ) -> StoreResult<Application> {
        let row = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = $2, interview_date = $3, interview_location = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.status)
        .bind(application.interview_date)
        .bind(&application.interview_location)
        .bind(&application.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn insert_drive(&mut self, drive: NewRecruitmentDrive) -> StoreResult<RecruitmentDrive> {
        let row = sqlx::query_as::<_, RecruitmentDrive>(
            r#"
            INSERT INTO recruitment_drives (
                company_id, job_id, title, description, drive_date, location, venue,
                coordinator_notes, approval_status, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(drive.company_id)
        .bind(drive.job_id)
        .bind(&drive.title)
        .bind(&drive.description)
        .bind(drive.drive_date)
        .bind(&drive.location)
        .bind(&drive.venue)
        .bind(&drive.coordinator_notes)
        .bind(drive.approval_status)
        .bind(drive.created_by)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn get_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>> {
        let drive =
            sqlx::query_as::<_, RecruitmentDrive>("SELECT * FROM recruitment_drives WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(drive)
    }

    async fn lock_drive(&mut self, id: Uuid) -> StoreResult<Option<RecruitmentDrive>> {
        let drive = sqlx::query_as::<_, RecruitmentDrive>(
            "SELECT * FROM recruitment_drives WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(drive)
    }

    async fn list_drives(&mut self, filter: ListingFilter) -> StoreResult<Vec<RecruitmentDrive>> {
        let drives = sqlx::query_as::<_, RecruitmentDrive>(
            r#"
            SELECT * FROM recruitment_drives
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND (NOT $2 OR approval_status = 'approved')
            ORDER BY drive_date DESC
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.approved_only)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(drives)
    }

    async fn update_drive(&mut self, drive: &RecruitmentDrive) -> StoreResult<RecruitmentDrive> {
        let row = sqlx::query_as::<_, RecruitmentDrive>(
            r#"
            UPDATE recruitment_drives
            SET job_id = $2, title = $3, description = $4, drive_date = $5, location = $6,
                venue = $7, coordinator_notes = $8, status = $9, approval_status = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(drive.id)
        .bind(drive.job_id)
        .bind(&drive.title)
        .bind(&drive.description)
        .bind(drive.drive_date)
        .bind(&drive.location)
        .bind(&drive.venue)
        .bind(&drive.coordinator_notes)
        .bind(drive.status)
        .bind(drive.approval_status)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_drive(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recruitment_drives WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_event(&mut self, event: NewCampusEvent) -> StoreResult<CampusEvent> {
        let row = sqlx::query_as::<_, CampusEvent>(
            r#"
            INSERT INTO campus_events (
                company_id, title, description, event_type, event_date, location, venue,
                organizer, max_participants, registration_required, approval_status, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(event.company_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type)
        .bind(event.event_date)
        .bind(&event.location)
        .bind(&event.venue)
        .bind(&event.organizer)
        .bind(event.max_participants)
        .bind(event.registration_required)
        .bind(event.approval_status)
        .bind(event.created_by)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn get_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>> {
        let event = sqlx::query_as::<_, CampusEvent>("SELECT * FROM campus_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(event)
    }

    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<CampusEvent>> {
        let event = sqlx::query_as::<_, CampusEvent>(
            "SELECT * FROM campus_events WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(event)
    }

    async fn list_events(&mut self, filter: ListingFilter) -> StoreResult<Vec<CampusEvent>> {
        let events = sqlx::query_as::<_, CampusEvent>(
            r#"
            SELECT * FROM campus_events
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND (NOT $2 OR approval_status = 'approved')
            ORDER BY event_date DESC
            "#,
        )
        .bind(filter.company_id)
        .bind(filter.approved_only)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(events)
    }

    async fn update_event(&mut self, event: &CampusEvent) -> StoreResult<CampusEvent> {
        let row = sqlx::query_as::<_, CampusEvent>(
            r#"
            UPDATE campus_events
            SET title = $2, description = $3, event_type = $4, event_date = $5, location = $6,
                venue = $7, organizer = $8, max_participants = $9, registration_required = $10,
                status = $11, approval_status = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type)
        .bind(event.event_date)
        .bind(&event.location)
        .bind(&event.venue)
        .bind(&event.organizer)
        .bind(event.max_participants)
        .bind(event.registration_required)
        .bind(event.status)
        .bind(event.approval_status)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_event(&mut self, id: Uuid) -> StoreResult<bool> {
        sqlx::query("DELETE FROM event_registrations WHERE event_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        let result = sqlx::query("DELETE FROM campus_events WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn registration_exists(&mut self, student_id: Uuid, event_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM event_registrations WHERE student_id = $1 AND event_id = $2)",
        )
        .bind(student_id)
        .bind(event_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn count_registrations(&mut self, event_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_registration(
        &mut self,
        registration: NewEventRegistration,
    ) -> StoreResult<EventRegistration> {
        let row = sqlx::query_as::<_, EventRegistration>(
            r#"
            INSERT INTO event_registrations (event_id, student_id, notes)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(registration.event_id)
        .bind(registration.student_id)
        .bind(&registration.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn list_registrations(
        &mut self,
        filter: RegistrationFilter,
    ) -> StoreResult<Vec<EventRegistration>> {
        let regs = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT * FROM event_registrations
            WHERE ($1::uuid IS NULL OR event_id = $1)
              AND ($2::uuid IS NULL OR student_id = $2)
            ORDER BY registered_at DESC
            "#,
        )
        .bind(filter.event_id)
        .bind(filter.student_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(regs)
    }

    async fn list_notifications(&mut self, recipient_id: Uuid) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn get_notification(&mut self, id: Uuid) -> StoreResult<Option<Notification>> {
        let row = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn mark_notification_read(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_all_notifications_read(&mut self, recipient_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_unread_notifications(&mut self, recipient_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_audit(&mut self, entry: NewAuditLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.changes)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn directory_totals(&mut self) -> StoreResult<DirectoryTotals> {
        let row: (i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM student_profiles),
                (SELECT COUNT(*) FROM companies),
                (SELECT COUNT(*) FROM job_postings),
                (SELECT COUNT(*) FROM job_postings WHERE is_active),
                (SELECT COUNT(*) FROM job_postings WHERE approval_status = 'pending'),
                (SELECT COUNT(*) FROM applications),
                (SELECT COUNT(DISTINCT student_id) FROM applications
                    WHERE status IN ('offer', 'accepted'))
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(DirectoryTotals {
            students: row.0,
            companies: row.1,
            jobs: row.2,
            active_jobs: row.3,
            pending_jobs: row.4,
            applications: row.5,
            placed_students: row.6,
        })
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await.map_err(StoreError::from)
    }
}
