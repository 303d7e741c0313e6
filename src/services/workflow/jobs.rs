use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use super::{
    ensure, ensure_can_browse, ensure_visible, is_staff, listing_company, not_found, own_company,
    own_student_profile, WorkflowEngine,
};
use crate::database::store::{DirectoryTx, ListingFilter};
use crate::dto::job_dto::{CreateJobPayload, JobListQuery, JobRecommendation, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::{
    approval::{ApprovalState, ApprovalTransition},
    job::{JobPosting, NewJobPosting},
    student::{normalize_skills, StudentProfile},
    user::{Actor, Role},
};
use crate::services::{
    audit_service::{self, ACTION_APPROVED, ACTION_AUTO_APPROVED, ACTION_DELETED, ACTION_REJECTED},
    authorization::{Action, ListingScope, Resource},
    notification_service::{fanout, FanoutEvent},
};

const ENTITY: &str = "job_posting";
const MAX_RECOMMENDATIONS: usize = 10;

async fn job_resource(tx: &mut dyn DirectoryTx, job: &JobPosting) -> Result<Resource> {
    let owner = tx.get_company(job.company_id).await?.map(|c| c.user_id);
    Ok(Resource::JobPosting(ListingScope {
        owner,
        approval: job.approval_status,
        active: job.is_active,
    }))
}

fn check_terms(
    min_cgpa: Option<Decimal>,
    salary_min: Option<Decimal>,
    salary_max: Option<Decimal>,
) -> Result<()> {
    if let Some(cgpa) = min_cgpa {
        if cgpa < Decimal::ZERO || cgpa > Decimal::TEN {
            return Err(Error::ValidationFailed(
                "min_cgpa must be between 0 and 10".to_string(),
            ));
        }
    }
    if let (Some(low), Some(high)) = (salary_min, salary_max) {
        if low > high {
            return Err(Error::ValidationFailed(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }
    Ok(())
}

impl WorkflowEngine {
    pub async fn create_job(&self, actor: &Actor, payload: CreateJobPayload) -> Result<JobPosting> {
        check_terms(payload.min_cgpa, payload.salary_min, payload.salary_max)?;

        let mut tx = self.begin().await?;
        let company = listing_company(tx.as_mut(), actor, payload.company_id).await?;
        let auto_approved = is_staff(actor);
        let approval = ApprovalState::initial(auto_approved);
        ensure(
            actor,
            Action::Create,
            &Resource::JobPosting(ListingScope {
                owner: Some(company.user_id),
                approval,
                active: payload.is_active,
            }),
        )?;

        let job = tx
            .insert_job(NewJobPosting {
                company_id: company.id,
                title: payload.title,
                description: payload.description,
                job_type: payload.job_type,
                department: payload.department,
                required_skills: normalize_skills(&payload.required_skills),
                min_cgpa: payload.min_cgpa,
                salary_min: payload.salary_min,
                salary_max: payload.salary_max,
                location: payload.location,
                application_deadline: payload.application_deadline,
                is_active: payload.is_active,
                approval_status: approval,
                created_by: Some(actor.id),
            })
            .await?;

        if auto_approved {
            audit_service::record(
                tx.as_mut(),
                actor,
                ACTION_AUTO_APPROVED,
                ENTITY,
                job.id,
                Some(json!({ "role": actor.role })),
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            job_id = %job.id,
            company_id = %company.id,
            approval = %job.approval_status,
            "job posting created"
        );
        Ok(job)
    }

    pub async fn get_job(&self, actor: &Actor, id: Uuid) -> Result<JobPosting> {
        let mut tx = self.begin().await?;
        let job = tx.get_job(id).await?.ok_or_else(|| not_found("Job posting"))?;
        let resource = job_resource(tx.as_mut(), &job).await?;
        ensure_visible(actor, &resource, "Job posting")?;
        Ok(job)
    }

    pub async fn list_jobs(&self, actor: &Actor, query: JobListQuery) -> Result<Vec<JobPosting>> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;
        let filter = if is_staff(actor) {
            ListingFilter {
                company_id: query.company_id,
                ..ListingFilter::default()
            }
        } else {
            match actor.role {
                Role::Student => ListingFilter {
                    company_id: query.company_id,
                    approved_only: true,
                    active_only: true,
                },
                Role::Company => ListingFilter {
                    company_id: Some(own_company(tx.as_mut(), actor).await?.id),
                    ..ListingFilter::default()
                },
                Role::PlacementCoordinator | Role::CollegeManagement => ListingFilter::default(),
            }
        };
        Ok(tx.list_jobs(filter).await?)
    }

    /// Open postings ranked for the calling student, best match first.
    pub async fn recommended_jobs(&self, actor: &Actor) -> Result<Vec<JobRecommendation>> {
        ensure_can_browse(actor)?;
        if actor.role != Role::Student {
            return Err(Error::AuthorizationDenied(
                "only students receive job recommendations".to_string(),
            ));
        }
        let mut tx = self.begin().await?;
        let profile = own_student_profile(tx.as_mut(), actor).await?;
        let jobs = tx
            .list_jobs(ListingFilter {
                approved_only: true,
                active_only: true,
                ..ListingFilter::default()
            })
            .await?;

        let mut ranked: Vec<JobRecommendation> = jobs
            .into_iter()
            .filter(JobPosting::is_open)
            .filter_map(|job| {
                let score = match_score(&profile, &job);
                (score > 0).then_some(JobRecommendation {
                    job,
                    match_score: score,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        ranked.truncate(MAX_RECOMMENDATIONS);

        tracing::debug!(actor_id = %actor.id, count = ranked.len(), "job recommendations built");
        Ok(ranked)
    }

    pub async fn update_job(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateJobPayload,
    ) -> Result<JobPosting> {
        let mut tx = self.begin().await?;
        let mut job = tx.lock_job(id).await?.ok_or_else(|| not_found("Job posting"))?;
        let resource = job_resource(tx.as_mut(), &job).await?;
        ensure(actor, Action::Update, &resource)?;

        if let Some(title) = payload.title {
            job.title = title;
        }
        if let Some(description) = payload.description {
            job.description = description;
        }
        if let Some(job_type) = payload.job_type {
            job.job_type = job_type;
        }
        if let Some(department) = payload.department {
            job.department = department;
        }
        if let Some(skills) = payload.required_skills {
            job.required_skills = normalize_skills(&skills);
        }
        if payload.min_cgpa.is_some() {
            job.min_cgpa = payload.min_cgpa;
        }
        if payload.salary_min.is_some() {
            job.salary_min = payload.salary_min;
        }
        if payload.salary_max.is_some() {
            job.salary_max = payload.salary_max;
        }
        if let Some(location) = payload.location {
            job.location = location;
        }
        if let Some(deadline) = payload.application_deadline {
            job.application_deadline = deadline;
        }
        if let Some(active) = payload.is_active {
            job.is_active = active;
        }
        check_terms(job.min_cgpa, job.salary_min, job.salary_max)?;

        let job = tx.update_job(&job).await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, job_id = %job.id, "job posting updated");
        Ok(job)
    }

    pub async fn delete_job(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let mut tx = self.begin().await?;
        let job = tx.lock_job(id).await?.ok_or_else(|| not_found("Job posting"))?;
        let resource = job_resource(tx.as_mut(), &job).await?;
        ensure(actor, Action::Delete, &resource)?;

        tx.delete_job(job.id).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_DELETED,
            ENTITY,
            job.id,
            Some(json!({ "title": job.title })),
        )
        .await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, job_id = %job.id, "job posting deleted");
        Ok(())
    }

    /// pending -> approved. The first approval notifies every approved student; any later
    /// approval of the same posting changes nothing and notifies no one.
    pub async fn approve_job(&self, actor: &Actor, id: Uuid) -> Result<JobPosting> {
        let mut tx = self.begin().await?;
        let mut job = tx.lock_job(id).await?.ok_or_else(|| not_found("Job posting"))?;
        let resource = job_resource(tx.as_mut(), &job).await?;
        ensure(actor, Action::Approve, &resource)?;

        let transition = job
            .approval_status
            .approve()
            .map_err(|e| Error::ValidationFailed(e.to_string()))?;
        let ApprovalTransition::Changed { from, to } = transition else {
            tracing::debug!(job_id = %job.id, "job posting already approved");
            return Ok(job);
        };

        job.approval_status = to;
        let job = tx.update_job(&job).await?;
        let company_name = tx
            .get_company(job.company_id)
            .await?
            .map(|c| c.company_name)
            .unwrap_or_default();
        let notified = fanout(
            tx.as_mut(),
            &FanoutEvent::JobApproved {
                job: &job,
                company_name: &company_name,
            },
        )
        .await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_APPROVED,
            ENTITY,
            job.id,
            Some(json!({ "from": from, "to": to, "notified": notified })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            job_id = %job.id,
            recipients = notified,
            "job posting approved"
        );
        Ok(job)
    }

    /// pending | approved -> rejected. A rejected posting is also closed.
    pub async fn reject_job(&self, actor: &Actor, id: Uuid) -> Result<JobPosting> {
        let mut tx = self.begin().await?;
        let mut job = tx.lock_job(id).await?.ok_or_else(|| not_found("Job posting"))?;
        let resource = job_resource(tx.as_mut(), &job).await?;
        ensure(actor, Action::Reject, &resource)?;

        let ApprovalTransition::Changed { from, to } = job.approval_status.reject() else {
            return Ok(job);
        };
        job.approval_status = to;
        job.is_active = false;
        let job = tx.update_job(&job).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_REJECTED,
            ENTITY,
            job.id,
            Some(json!({ "from": from, "to": to })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, job_id = %job.id, "job posting rejected");
        Ok(job)
    }
}

/// Fails unless `job` currently accepts applications.
pub(super) fn accepting_applications(job: &JobPosting) -> Result<()> {
    if !job.is_open() {
        return Err(Error::ValidationFailed(
            "This job posting is not open for applications".to_string(),
        ));
    }
    if job.application_deadline < Utc::now() {
        return Err(Error::ValidationFailed(
            "The application deadline for this job has passed".to_string(),
        ));
    }
    Ok(())
}

/// 10 per shared skill, 20 when the departments overlap, 15 when the cgpa clears the minimum.
fn match_score(profile: &StudentProfile, job: &JobPosting) -> u32 {
    let skills = normalize_skills(&profile.skills);
    let shared = normalize_skills(&job.required_skills)
        .iter()
        .filter(|skill| skills.contains(skill))
        .count() as u32;
    let mut score = shared * 10;

    let mine = profile.department.trim().to_lowercase();
    let theirs = job.department.trim().to_lowercase();
    if !mine.is_empty() && !theirs.is_empty() && (mine.contains(&theirs) || theirs.contains(&mine)) {
        score += 20;
    }

    if let (Some(cgpa), Some(min_cgpa)) = (profile.cgpa, job.min_cgpa) {
        if cgpa >= min_cgpa {
            score += 15;
        }
    }
    score
}
