use serde_json::json;
use uuid::Uuid;

use super::{
    ensure, ensure_can_browse, ensure_visible, is_staff, jobs::accepting_applications, not_found,
    own_company, own_student_profile, WorkflowEngine,
};
use crate::database::store::{ApplicationFilter, DirectoryTx};
use crate::dto::application_dto::{ApplicationListQuery, ApplyPayload, UpdateApplicationPayload};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, NewApplication},
    user::{Actor, Role},
};
use crate::services::{
    audit_service::{self, ACTION_STATUS_CHANGED},
    authorization::{Action, Resource},
    capacity_guard::reserve_application_slot,
    notification_service::{fanout, FanoutEvent},
};

/// Parties to an application, as user ids.
struct Parties {
    student: Uuid,
    /// Account owning the job's company.
    recruiter: Option<Uuid>,
}

impl Parties {
    async fn of(tx: &mut dyn DirectoryTx, app: &Application) -> Result<Self> {
        let student = tx
            .get_student_profile(app.student_id)
            .await?
            .map(|p| p.user_id)
            .ok_or_else(|| not_found("Student profile"))?;
        let recruiter = match tx.get_job(app.job_id).await? {
            Some(job) => tx.get_company(job.company_id).await?.map(|c| c.user_id),
            None => None,
        };
        Ok(Self { student, recruiter })
    }

    fn resource(&self) -> Resource {
        Resource::Application {
            student: self.student,
            recruiter: self.recruiter,
        }
    }
}

impl WorkflowEngine {
    /// Files an application for the acting student and tells the recruiting company.
    pub async fn apply(&self, actor: &Actor, payload: ApplyPayload) -> Result<Application> {
        ensure(
            actor,
            Action::Create,
            &Resource::Application {
                student: actor.id,
                recruiter: None,
            },
        )?;

        let mut tx = self.begin().await?;
        let profile = own_student_profile(tx.as_mut(), actor).await?;
        let job = tx
            .get_job(payload.job_id)
            .await?
            .ok_or_else(|| not_found("Job posting"))?;
        accepting_applications(&job)?;

        let application = reserve_application_slot(
            tx.as_mut(),
            NewApplication {
                student_id: profile.id,
                job_id: job.id,
                cover_letter: payload.cover_letter,
            },
        )
        .await?;

        let company = tx
            .get_company(job.company_id)
            .await?
            .ok_or_else(|| not_found("Company"))?;
        let student_name = tx
            .get_user(actor.id)
            .await?
            .map(|u| u.full_name())
            .unwrap_or_default();
        fanout(
            tx.as_mut(),
            &FanoutEvent::ApplicationSubmitted {
                job: &job,
                recruiter: company.user_id,
                student_name: &student_name,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            application_id = %application.id,
            job_id = %job.id,
            "application submitted"
        );
        Ok(application)
    }

    pub async fn get_application(&self, actor: &Actor, id: Uuid) -> Result<Application> {
        let mut tx = self.begin().await?;
        let app = tx
            .get_application(id)
            .await?
            .ok_or_else(|| not_found("Application"))?;
        let parties = Parties::of(tx.as_mut(), &app).await?;
        ensure_visible(actor, &parties.resource(), "Application")?;
        Ok(app)
    }

    pub async fn list_applications(
        &self,
        actor: &Actor,
        query: ApplicationListQuery,
    ) -> Result<Vec<Application>> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;
        let mut filter = ApplicationFilter {
            job_id: query.job_id,
            status: query.status,
            ..ApplicationFilter::default()
        };
        if !is_staff(actor) {
            match actor.role {
                Role::Student => {
                    filter.student_id = Some(own_student_profile(tx.as_mut(), actor).await?.id)
                }
                Role::Company => filter.company_id = Some(own_company(tx.as_mut(), actor).await?.id),
                Role::PlacementCoordinator | Role::CollegeManagement => {}
            }
        }
        Ok(tx.list_applications(filter).await?)
    }

    /// Records interview details and moves the application to a new status. A real
    /// status change notifies the student; re-sending the current status does not.
    pub async fn update_application(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateApplicationPayload,
    ) -> Result<Application> {
        let mut tx = self.begin().await?;
        let mut app = tx
            .lock_application(id)
            .await?
            .ok_or_else(|| not_found("Application"))?;
        let parties = Parties::of(tx.as_mut(), &app).await?;
        ensure(actor, Action::ChangeStatus, &parties.resource())?;

        let previous = app.status;
        if let Some(next) = payload.status {
            if next != previous
                && self.settings.strict_application_transitions
                && !previous.can_transition_to(next)
            {
                return Err(Error::ValidationFailed(format!(
                    "cannot move an application from {} to {}",
                    previous, next
                )));
            }
            app.status = next;
        }
        if payload.interview_date.is_some() {
            app.interview_date = payload.interview_date;
        }
        if payload.interview_location.is_some() {
            app.interview_location = payload.interview_location;
        }
        if payload.notes.is_some() {
            app.notes = payload.notes;
        }

        let app = tx.update_application(&app).await?;
        if app.status != previous {
            let job = tx
                .get_job(app.job_id)
                .await?
                .ok_or_else(|| not_found("Job posting"))?;
            let company_name = tx
                .get_company(job.company_id)
                .await?
                .map(|c| c.company_name)
                .unwrap_or_default();
            fanout(
                tx.as_mut(),
                &FanoutEvent::ApplicationStatusChanged {
                    application: &app,
                    job: &job,
                    company_name: &company_name,
                    student: parties.student,
                },
            )
            .await?;
            audit_service::record(
                tx.as_mut(),
                actor,
                ACTION_STATUS_CHANGED,
                "application",
                app.id,
                Some(json!({ "from": previous, "to": app.status })),
            )
            .await?;
            tracing::info!(
                actor_id = %actor.id,
                application_id = %app.id,
                from = %previous,
                to = %app.status,
                "application status changed"
            );
        }
        tx.commit().await?;
        Ok(app)
    }
}
