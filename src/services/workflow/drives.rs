use serde_json::json;
use uuid::Uuid;

use super::{
    ensure, ensure_can_browse, ensure_visible, is_staff, listing_company, not_found, own_company,
    WorkflowEngine,
};
use crate::database::store::{DirectoryTx, ListingFilter};
use crate::dto::drive_dto::{CreateDrivePayload, UpdateDrivePayload};
use crate::error::{Error, Result};
use crate::models::{
    approval::{ApprovalState, ApprovalTransition, LifecycleStatus},
    drive::{NewRecruitmentDrive, RecruitmentDrive},
    user::{Actor, Role},
};
use crate::services::{
    audit_service::{self, ACTION_APPROVED, ACTION_AUTO_APPROVED, ACTION_DELETED, ACTION_REJECTED},
    authorization::{Action, ListingScope, Resource},
    notification_service::{fanout, FanoutEvent},
};

const ENTITY: &str = "recruitment_drive";

async fn drive_resource(tx: &mut dyn DirectoryTx, drive: &RecruitmentDrive) -> Result<Resource> {
    let owner = tx.get_company(drive.company_id).await?.map(|c| c.user_id);
    Ok(Resource::RecruitmentDrive(ListingScope {
        owner,
        approval: drive.approval_status,
        active: true,
    }))
}

/// A drive may only point at a posting of the same company.
async fn check_linked_job(
    tx: &mut dyn DirectoryTx,
    company_id: Uuid,
    job_id: Option<Uuid>,
) -> Result<()> {
    let Some(job_id) = job_id else {
        return Ok(());
    };
    let job = tx
        .get_job(job_id)
        .await?
        .ok_or_else(|| not_found("Job posting"))?;
    if job.company_id != company_id {
        return Err(Error::ValidationFailed(
            "the linked job posting belongs to a different company".to_string(),
        ));
    }
    Ok(())
}

impl WorkflowEngine {
    pub async fn create_drive(
        &self,
        actor: &Actor,
        payload: CreateDrivePayload,
    ) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let company = listing_company(tx.as_mut(), actor, payload.company_id).await?;
        let auto_approved = is_staff(actor);
        let approval = ApprovalState::initial(auto_approved);
        ensure(
            actor,
            Action::Create,
            &Resource::RecruitmentDrive(ListingScope {
                owner: Some(company.user_id),
                approval,
                active: true,
            }),
        )?;
        check_linked_job(tx.as_mut(), company.id, payload.job_id).await?;

        let drive = tx
            .insert_drive(NewRecruitmentDrive {
                company_id: company.id,
                job_id: payload.job_id,
                title: payload.title,
                description: payload.description,
                drive_date: payload.drive_date,
                location: payload.location,
                venue: payload.venue,
                coordinator_notes: payload.coordinator_notes,
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
                drive.id,
                Some(json!({ "role": actor.role })),
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            drive_id = %drive.id,
            approval = %drive.approval_status,
            "recruitment drive created"
        );
        Ok(drive)
    }

    pub async fn get_drive(&self, actor: &Actor, id: Uuid) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let drive = tx
            .get_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure_visible(actor, &resource, "Recruitment drive")?;
        Ok(drive)
    }

    pub async fn list_drives(&self, actor: &Actor) -> Result<Vec<RecruitmentDrive>> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;
        let filter = match actor.role {
            _ if is_staff(actor) => ListingFilter::default(),
            Role::Student => ListingFilter {
                approved_only: true,
                ..ListingFilter::default()
            },
            Role::Company => ListingFilter {
                company_id: Some(own_company(tx.as_mut(), actor).await?.id),
                ..ListingFilter::default()
            },
            Role::PlacementCoordinator | Role::CollegeManagement => ListingFilter::default(),
        };
        Ok(tx.list_drives(filter).await?)
    }

    pub async fn update_drive(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateDrivePayload,
    ) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let mut drive = tx
            .lock_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure(actor, Action::Update, &resource)?;

        if payload.job_id.is_some() {
            check_linked_job(tx.as_mut(), drive.company_id, payload.job_id).await?;
            drive.job_id = payload.job_id;
        }
        if let Some(title) = payload.title {
            drive.title = title;
        }
        if let Some(description) = payload.description {
            drive.description = description;
        }
        if let Some(date) = payload.drive_date {
            drive.drive_date = date;
        }
        if let Some(location) = payload.location {
            drive.location = location;
        }
        if let Some(venue) = payload.venue {
            drive.venue = venue;
        }
        if payload.coordinator_notes.is_some() {
            drive.coordinator_notes = payload.coordinator_notes;
        }

        let drive = tx.update_drive(&drive).await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, drive_id = %drive.id, "recruitment drive updated");
        Ok(drive)
    }

    /// Moves a drive between scheduled, ongoing, completed and cancelled.
    pub async fn set_drive_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: LifecycleStatus,
    ) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let mut drive = tx
            .lock_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure(actor, Action::Update, &resource)?;
        if drive.approval_status == ApprovalState::Rejected && status.is_open() {
            return Err(Error::ValidationFailed(
                "a rejected drive cannot be reopened".to_string(),
            ));
        }
        if drive.status == status {
            return Ok(drive);
        }

        drive.status = status;
        let drive = tx.update_drive(&drive).await?;
        tx.commit().await?;
        tracing::info!(
            actor_id = %actor.id,
            drive_id = %drive.id,
            status = %drive.status,
            "recruitment drive status changed"
        );
        Ok(drive)
    }

    pub async fn delete_drive(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let mut tx = self.begin().await?;
        let drive = tx
            .lock_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure(actor, Action::Delete, &resource)?;

        tx.delete_drive(drive.id).await?;
        audit_service::record(tx.as_mut(), actor, ACTION_DELETED, ENTITY, drive.id, None).await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, drive_id = %drive.id, "recruitment drive deleted");
        Ok(())
    }

    /// pending -> approved, announcing the drive to every approved student once.
    pub async fn approve_drive(&self, actor: &Actor, id: Uuid) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let mut drive = tx
            .lock_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure(actor, Action::Approve, &resource)?;

        let transition = drive
            .approval_status
            .approve()
            .map_err(|e| Error::ValidationFailed(e.to_string()))?;
        let ApprovalTransition::Changed { from, to } = transition else {
            return Ok(drive);
        };

        drive.approval_status = to;
        let drive = tx.update_drive(&drive).await?;
        let company_name = tx
            .get_company(drive.company_id)
            .await?
            .map(|c| c.company_name)
            .unwrap_or_default();
        let notified = fanout(
            tx.as_mut(),
            &FanoutEvent::DriveApproved {
                drive: &drive,
                company_name: &company_name,
            },
        )
        .await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_APPROVED,
            ENTITY,
            drive.id,
            Some(json!({ "from": from, "to": to, "notified": notified })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            drive_id = %drive.id,
            recipients = notified,
            "recruitment drive approved"
        );
        Ok(drive)
    }

    /// pending | approved -> rejected; the drive is cancelled with it.
    pub async fn reject_drive(&self, actor: &Actor, id: Uuid) -> Result<RecruitmentDrive> {
        let mut tx = self.begin().await?;
        let mut drive = tx
            .lock_drive(id)
            .await?
            .ok_or_else(|| not_found("Recruitment drive"))?;
        let resource = drive_resource(tx.as_mut(), &drive).await?;
        ensure(actor, Action::Reject, &resource)?;

        let ApprovalTransition::Changed { from, to } = drive.approval_status.reject() else {
            return Ok(drive);
        };
        drive.approval_status = to;
        drive.status = LifecycleStatus::Cancelled;
        let drive = tx.update_drive(&drive).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_REJECTED,
            ENTITY,
            drive.id,
            Some(json!({ "from": from, "to": to })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, drive_id = %drive.id, "recruitment drive rejected");
        Ok(drive)
    }
}
