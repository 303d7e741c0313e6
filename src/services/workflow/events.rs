use serde_json::json;
use uuid::Uuid;

use super::{
    company_owner, ensure, ensure_can_browse, ensure_visible, is_staff, not_found, own_company,
    own_student_profile, WorkflowEngine,
};
use crate::database::store::{DirectoryTx, ListingFilter, RegistrationFilter};
use crate::dto::event_dto::{CreateEventPayload, EventRegistrationPayload, UpdateEventPayload};
use crate::error::{Error, Result};
use crate::models::{
    approval::{ApprovalState, ApprovalTransition, LifecycleStatus},
    event::{CampusEvent, EventRegistration, NewCampusEvent, NewEventRegistration},
    user::{Actor, Role},
};
use crate::services::{
    audit_service::{self, ACTION_APPROVED, ACTION_AUTO_APPROVED, ACTION_DELETED, ACTION_REJECTED},
    authorization::{authorize, Action, ListingScope, Resource},
    capacity_guard::reserve_event_seat,
    notification_service::{fanout, FanoutEvent},
};

const ENTITY: &str = "campus_event";

async fn event_resource(tx: &mut dyn DirectoryTx, event: &CampusEvent) -> Result<Resource> {
    Ok(Resource::CampusEvent(ListingScope {
        owner: company_owner(tx, event.company_id).await?,
        approval: event.approval_status,
        active: true,
    }))
}

impl WorkflowEngine {
    /// Companies host events under their own profile; staff may host campus-wide events
    /// with no company attached.
    pub async fn create_event(&self, actor: &Actor, payload: CreateEventPayload) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let company_id = if actor.role == Role::Company {
            Some(own_company(tx.as_mut(), actor).await?.id)
        } else {
            payload.company_id
        };
        let auto_approved = is_staff(actor);
        let approval = ApprovalState::initial(auto_approved);
        ensure(
            actor,
            Action::Create,
            &Resource::CampusEvent(ListingScope {
                owner: company_owner(tx.as_mut(), company_id).await?,
                approval,
                active: true,
            }),
        )?;
        if let Some(id) = company_id {
            tx.get_company(id).await?.ok_or_else(|| not_found("Company"))?;
        }

        let event = tx
            .insert_event(NewCampusEvent {
                company_id,
                title: payload.title,
                description: payload.description,
                event_type: payload.event_type,
                event_date: payload.event_date,
                location: payload.location,
                venue: payload.venue,
                organizer: payload.organizer,
                max_participants: payload.max_participants,
                registration_required: payload.registration_required,
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
                event.id,
                Some(json!({ "role": actor.role })),
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            event_id = %event.id,
            approval = %event.approval_status,
            "campus event created"
        );
        Ok(event)
    }

    pub async fn get_event(&self, actor: &Actor, id: Uuid) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let event = tx.get_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure_visible(actor, &resource, "Campus event")?;
        Ok(event)
    }

    pub async fn list_events(&self, actor: &Actor) -> Result<Vec<CampusEvent>> {
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
        Ok(tx.list_events(filter).await?)
    }

    pub async fn update_event(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateEventPayload,
    ) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let mut event = tx.lock_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure(actor, Action::Update, &resource)?;

        if let Some(title) = payload.title {
            event.title = title;
        }
        if let Some(description) = payload.description {
            event.description = description;
        }
        if let Some(event_type) = payload.event_type {
            event.event_type = event_type;
        }
        if let Some(date) = payload.event_date {
            event.event_date = date;
        }
        if let Some(location) = payload.location {
            event.location = location;
        }
        if let Some(venue) = payload.venue {
            event.venue = venue;
        }
        if let Some(organizer) = payload.organizer {
            event.organizer = organizer;
        }
        if let Some(max) = payload.max_participants {
            let registered = tx.count_registrations(event.id).await?;
            if i64::from(max) < registered {
                return Err(Error::ValidationFailed(format!(
                    "max_participants cannot drop below the {} students already registered",
                    registered
                )));
            }
            event.max_participants = Some(max);
        }
        if let Some(required) = payload.registration_required {
            event.registration_required = required;
        }

        let event = tx.update_event(&event).await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, event_id = %event.id, "campus event updated");
        Ok(event)
    }

    pub async fn set_event_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: LifecycleStatus,
    ) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let mut event = tx.lock_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure(actor, Action::Update, &resource)?;
        if event.approval_status == ApprovalState::Rejected && status.is_open() {
            return Err(Error::ValidationFailed(
                "a rejected event cannot be reopened".to_string(),
            ));
        }
        if event.status == status {
            return Ok(event);
        }

        event.status = status;
        let event = tx.update_event(&event).await?;
        tx.commit().await?;
        tracing::info!(
            actor_id = %actor.id,
            event_id = %event.id,
            status = %event.status,
            "campus event status changed"
        );
        Ok(event)
    }

    pub async fn delete_event(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let mut tx = self.begin().await?;
        let event = tx.lock_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure(actor, Action::Delete, &resource)?;

        tx.delete_event(event.id).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_DELETED,
            ENTITY,
            event.id,
            Some(json!({ "title": event.title })),
        )
        .await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, event_id = %event.id, "campus event deleted");
        Ok(())
    }

    /// pending -> approved. Students are told about the event only when it takes
    /// registrations.
    pub async fn approve_event(&self, actor: &Actor, id: Uuid) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let mut event = tx.lock_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure(actor, Action::Approve, &resource)?;

        let transition = event
            .approval_status
            .approve()
            .map_err(|e| Error::ValidationFailed(e.to_string()))?;
        let ApprovalTransition::Changed { from, to } = transition else {
            return Ok(event);
        };

        event.approval_status = to;
        let event = tx.update_event(&event).await?;
        let notified = if event.registration_required {
            fanout(tx.as_mut(), &FanoutEvent::EventApproved { event: &event }).await?
        } else {
            0
        };
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_APPROVED,
            ENTITY,
            event.id,
            Some(json!({ "from": from, "to": to, "notified": notified })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            event_id = %event.id,
            recipients = notified,
            "campus event approved"
        );
        Ok(event)
    }

    pub async fn reject_event(&self, actor: &Actor, id: Uuid) -> Result<CampusEvent> {
        let mut tx = self.begin().await?;
        let mut event = tx.lock_event(id).await?.ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure(actor, Action::Reject, &resource)?;

        let ApprovalTransition::Changed { from, to } = event.approval_status.reject() else {
            return Ok(event);
        };
        event.approval_status = to;
        event.status = LifecycleStatus::Cancelled;
        let event = tx.update_event(&event).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_REJECTED,
            ENTITY,
            event.id,
            Some(json!({ "from": from, "to": to })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, event_id = %event.id, "campus event rejected");
        Ok(event)
    }

    /// Takes a seat at an approved, open event for the acting student.
    ///
    /// The event row stays locked from the capacity check to the insert, so two students
    /// racing for the last seat cannot both get it.
    pub async fn register_for_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
        payload: EventRegistrationPayload,
    ) -> Result<EventRegistration> {
        ensure(
            actor,
            Action::Create,
            &Resource::EventRegistration { student: actor.id },
        )?;

        let mut tx = self.begin().await?;
        let profile = own_student_profile(tx.as_mut(), actor).await?;
        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or_else(|| not_found("Campus event"))?;
        if !event.is_approved() {
            return Err(Error::ValidationFailed(
                "This event is not open for registration".to_string(),
            ));
        }
        if !event.status.is_open() {
            return Err(Error::ValidationFailed(format!(
                "This event is {} and no longer takes registrations",
                event.status
            )));
        }

        let registration = reserve_event_seat(
            tx.as_mut(),
            &event,
            NewEventRegistration {
                event_id: event.id,
                student_id: profile.id,
                notes: payload.notes,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            event_id = %event.id,
            registration_id = %registration.id,
            "event registration created"
        );
        Ok(registration)
    }

    /// Registrations for one event the actor can see, narrowed to the rows they may read.
    pub async fn list_event_registrations(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<Vec<EventRegistration>> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;
        let event = tx
            .get_event(event_id)
            .await?
            .ok_or_else(|| not_found("Campus event"))?;
        let resource = event_resource(tx.as_mut(), &event).await?;
        ensure_visible(actor, &resource, "Campus event")?;

        let rows = tx
            .list_registrations(RegistrationFilter {
                event_id: Some(event.id),
                student_id: None,
            })
            .await?;
        let mut visible = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(student) = tx.get_student_profile(row.student_id).await? else {
                continue;
            };
            let resource = Resource::EventRegistration {
                student: student.user_id,
            };
            if authorize(actor, Action::Read, &resource).is_allowed() {
                visible.push(row);
            }
        }
        Ok(visible)
    }

    pub async fn my_registrations(&self, actor: &Actor) -> Result<Vec<EventRegistration>> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;
        let profile = own_student_profile(tx.as_mut(), actor).await?;
        Ok(tx
            .list_registrations(RegistrationFilter {
                event_id: None,
                student_id: Some(profile.id),
            })
            .await?)
    }
}
